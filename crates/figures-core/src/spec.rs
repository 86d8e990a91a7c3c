//! Wire model of a figure refresh: [`FigureSpec`] and its [`Element`]s.
//!
//! A spec is produced fresh by the data source on every refresh and is never
//! mutated afterwards; the next refresh supersedes it.

use crate::error::FigureError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable identity matching a record to its visual element across refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Identity {
    Number(i64),
    Text(String),
}

impl Identity {
    /// Text identity.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Identity of a numeric field. Integral values stay numeric so that
    /// `1700000000` and `1700000000.0` match.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            Self::Number(value as i64)
        } else {
            Self::Text(value.to_string())
        }
    }
}

/// Numeric wire keys go through [`Identity::from_f64`], the same path
/// timestamps take.
impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Integer(i64),
            Float(f64),
            Text(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Integer(n) => Self::Number(n),
            Wire::Float(v) => Self::from_f64(v),
            Wire::Text(s) => Self::Text(s),
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<i64> for Identity {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// One data record of a figure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    pub key: Option<Identity>,
    /// Unix seconds
    pub timestamp: Option<f64>,
    /// Bucket width in seconds
    pub timestep: Option<f64>,
    pub value: f64,
    pub label: Option<String>,
    pub tooltip: Option<String>,
    #[serde(alias = "css")]
    pub classes: Vec<String>,
    pub url: Option<String>,
    /// Column name of a heat-map cell
    pub x: Option<String>,
    /// Row name of a heat-map cell
    pub y: Option<String>,
}

impl Element {
    /// Element with an identity and a value.
    #[must_use]
    pub fn keyed(key: impl Into<Identity>, value: f64) -> Self {
        Self {
            key: Some(key.into()),
            value,
            ..Self::default()
        }
    }

    /// Time-bucket element.
    #[must_use]
    pub fn bucket(timestamp: f64, timestep: f64, value: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            timestep: Some(timestep),
            value,
            ..Self::default()
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the tooltip.
    #[must_use]
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Set the URL opened on click.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Append a presentation class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Place the element in a heat-map cell.
    #[must_use]
    pub fn at_cell(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x = Some(x.into());
        self.y = Some(y.into());
        self
    }
}

/// Display switches sent along with the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    #[serde(alias = "showPercentage")]
    pub show_percentage: bool,
}

/// Everything one refresh delivers to one figure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureSpec {
    pub title: Option<String>,
    pub ylabel: Option<String>,
    pub elements: Vec<Element>,
    #[serde(alias = "displayOptions")]
    pub display_options: DisplayOptions,
    #[serde(alias = "groupedElements")]
    pub grouped_elements: Vec<Element>,
    /// Explicit heat-map columns
    #[serde(alias = "xAxis")]
    pub x_axis: Option<Vec<String>>,
    /// Explicit heat-map rows
    #[serde(alias = "yAxis")]
    pub y_axis: Option<Vec<String>>,
    /// Weighted edges of a flow diagram
    pub links: Vec<FlowRecord>,
    /// Header texts of a cell table
    pub headers: Vec<String>,
    /// Ready-made rows of a cell table
    pub rows: Vec<TableRow>,
}

impl FigureSpec {
    /// Spec holding only elements.
    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Decode a spec from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, FigureError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One weighted edge between two named flow nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowRecord {
    pub source: String,
    pub target: String,
    pub value: f64,
}

impl FlowRecord {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

/// One row of a cell table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRow {
    #[serde(alias = "css")]
    pub classes: Vec<String>,
    pub cells: Vec<TableCell>,
}

impl TableRow {
    #[must_use]
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            classes: Vec::new(),
            cells,
        }
    }
}

/// One cell of a cell table row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCell {
    pub content: Option<String>,
    #[serde(alias = "css")]
    pub classes: Vec<String>,
    /// Columns covered, 1 when absent
    pub colspan: Option<usize>,
    /// Rows covered, 1 when absent
    pub rowspan: Option<usize>,
}

impl TableCell {
    /// Cell showing `content`.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn spanning(mut self, colspan: usize, rowspan: usize) -> Self {
        self.colspan = Some(colspan);
        self.rowspan = Some(rowspan);
        self
    }
}

/// How an identity is derived from an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRule {
    /// The explicit `key` field
    #[default]
    Key,
    /// The `label` field
    Label,
    /// The `timestamp` field
    Timestamp,
    /// Position in the incoming sequence
    Position,
}

impl KeyRule {
    /// Name used in error messages and configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Label => "label",
            Self::Timestamp => "timestamp",
            Self::Position => "position",
        }
    }

    /// Derive the identity of the element at `index`.
    pub fn extract(self, index: usize, element: &Element) -> Result<Identity, FigureError> {
        let missing = || FigureError::MissingKey {
            index,
            rule: self.name(),
        };
        match self {
            Self::Key => element.key.clone().ok_or_else(missing),
            Self::Label => element.label.as_deref().map(Identity::text).ok_or_else(missing),
            Self::Timestamp => element.timestamp.map(Identity::from_f64).ok_or_else(missing),
            Self::Position => Ok(Identity::Number(index as i64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_full_shape() {
        let json = r#"{
            "title": "CPU load",
            "ylabel": "load",
            "elements": [
                {"timestamp": 1700000000, "timestep": 60, "value": 1.5,
                 "tooltip": "1.5", "classes": ["warn"], "url": "/x"},
                {"key": "b", "value": 2}
            ],
            "displayOptions": {"showPercentage": true},
            "groupedElements": [{"timestamp": 1700000000, "timestep": 300, "value": 3}]
        }"#;
        let spec = FigureSpec::from_json(json).unwrap();
        assert_eq!(spec.title.as_deref(), Some("CPU load"));
        assert_eq!(spec.elements.len(), 2);
        assert_eq!(spec.elements[0].classes, vec!["warn".to_string()]);
        assert_eq!(spec.elements[1].key, Some(Identity::text("b")));
        assert!(spec.display_options.show_percentage);
        assert_eq!(spec.grouped_elements.len(), 1);
    }

    #[test]
    fn test_from_json_missing_elements_is_empty() {
        let spec = FigureSpec::from_json("{}").unwrap();
        assert!(spec.elements.is_empty());
        assert!(spec.title.is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = FigureSpec::from_json("[1, 2").unwrap_err();
        assert!(matches!(err, FigureError::InvalidSpec(_)));
    }

    #[test]
    fn test_numeric_and_text_keys() {
        let spec = FigureSpec::from_json(r#"{"elements":[{"key":7},{"key":"seven"}]}"#).unwrap();
        assert_eq!(spec.elements[0].key, Some(Identity::Number(7)));
        assert_eq!(spec.elements[1].key, Some(Identity::text("seven")));
    }

    #[test]
    fn test_fractional_keys_match_timestamp_identities() {
        let spec =
            FigureSpec::from_json(r#"{"elements":[{"key":1.5},{"key":60.0},{"key":-2}]}"#).unwrap();
        assert_eq!(spec.elements[0].key, Some(Identity::from_f64(1.5)));
        assert_eq!(spec.elements[1].key, Some(Identity::Number(60)));
        assert_eq!(spec.elements[2].key, Some(Identity::Number(-2)));
    }

    #[test]
    fn test_css_alias_for_classes() {
        let spec = FigureSpec::from_json(r#"{"elements":[{"css":["a","b"]}]}"#).unwrap();
        assert_eq!(spec.elements[0].classes.len(), 2);
    }

    #[test]
    fn test_key_rule_extract() {
        let e = Element::bucket(1_700_000_000.0, 60.0, 1.0).with_label("cpu");
        assert_eq!(
            KeyRule::Timestamp.extract(0, &e).unwrap(),
            Identity::Number(1_700_000_000)
        );
        assert_eq!(KeyRule::Label.extract(0, &e).unwrap(), Identity::text("cpu"));
        assert_eq!(KeyRule::Position.extract(4, &e).unwrap(), Identity::Number(4));
    }

    #[test]
    fn test_key_rule_missing_field() {
        let err = KeyRule::Key.extract(3, &Element::default()).unwrap_err();
        assert!(matches!(
            err,
            FigureError::MissingKey {
                index: 3,
                rule: "key"
            }
        ));
    }

    #[test]
    fn test_flow_links() {
        let spec = FigureSpec::from_json(
            r#"{"links":[{"source":"web 1","target":"db","value":3}]}"#,
        )
        .unwrap();
        assert_eq!(spec.links, vec![FlowRecord::new("web 1", "db", 3.0)]);
    }

    #[test]
    fn test_table_rows() {
        let spec = FigureSpec::from_json(
            r#"{"headers":["host","state"],"rows":[
                {"classes":["odd"],"cells":[{"content":"web","colspan":2},{"content":"OK","css":["ok"]}]},
                {"cells":[]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(spec.headers, ["host", "state"]);
        assert_eq!(spec.rows.len(), 2);
        assert_eq!(spec.rows[0].classes, ["odd"]);
        assert_eq!(spec.rows[0].cells[0].colspan, Some(2));
        assert_eq!(spec.rows[0].cells[0].rowspan, None);
        assert_eq!(spec.rows[0].cells[1], {
            let mut cell = TableCell::text("OK");
            cell.classes.push("ok".into());
            cell
        });
    }

    #[test]
    fn test_fractional_timestamp_identity() {
        assert_eq!(Identity::from_f64(1.5), Identity::text("1.5"));
        assert_eq!(Identity::from_f64(60.0), Identity::Number(60));
    }
}
