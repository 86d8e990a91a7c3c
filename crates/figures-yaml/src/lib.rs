//! YAML dashboard configuration for figures.
//!
//! A dashboard lists its figures with their per-variant constants: size,
//! margins, zoom limit, transition duration, page size and key rule.

mod config;
mod error;

pub use config::{DashboardConfig, EdgeColor, FigureConfig, FigureKind};
pub use error::ConfigError;
