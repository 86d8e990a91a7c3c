//! Error types for figure refreshes.

use crate::spec::Identity;
use thiserror::Error;

/// Errors that abort a single figure refresh.
///
/// A refresh that fails with any of these leaves the previously rendered
/// scene untouched.
#[derive(Debug, Error)]
pub enum FigureError {
    /// Two incoming records resolved to the same identity.
    #[error("duplicate identity {identity} at positions {first} and {second}")]
    DuplicateIdentity {
        identity: Identity,
        first: usize,
        second: usize,
    },

    /// The key rule could not derive an identity for a record.
    #[error("record {index} has no {rule} to derive an identity from")]
    MissingKey { index: usize, rule: &'static str },

    /// A field required by the figure variant is absent.
    #[error("record {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// A strict caller required data but the refresh carried none.
    #[error("no data to derive a domain from")]
    EmptyDomain,

    /// The figure spec could not be decoded.
    #[error("invalid figure spec: {0}")]
    InvalidSpec(#[from] serde_json::Error),

    /// The external flow layout rejected its input.
    #[error("flow layout failed: {0}")]
    Layout(String),
}
