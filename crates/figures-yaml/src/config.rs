//! Dashboard configuration loaded from `dashboard.yaml`.

use crate::error::ConfigError;
use figures_core::{KeyRule, Margin, Size, DEFAULT_MAX_ZOOM, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// The closed set of figure variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureKind {
    BarChart,
    BarbarChart,
    HeatMap,
    HeatBucket,
    PieChart,
    SankeyDiagram,
    DcTable,
    /// Ready-made rows and cells
    Table,
}

impl FigureKind {
    /// Registry name of the variant.
    #[must_use]
    pub const fn ident(self) -> &'static str {
        match self {
            Self::BarChart => "bar_chart",
            Self::BarbarChart => "barbar_chart",
            Self::HeatMap => "heat_map",
            Self::HeatBucket => "heat_bucket",
            Self::PieChart => "pie_chart",
            Self::SankeyDiagram => "sankey_diagram",
            Self::DcTable => "dc_table",
            Self::Table => "table",
        }
    }

    /// Transition duration used when the configuration gives none.
    #[must_use]
    pub const fn default_transition_ms(self) -> u64 {
        match self {
            Self::HeatMap | Self::HeatBucket | Self::SankeyDiagram => 1800,
            _ => 1000,
        }
    }

    /// Margin used when the configuration gives none.
    #[must_use]
    pub const fn default_margin(self) -> Margin {
        match self {
            Self::BarChart | Self::BarbarChart => Margin {
                top: 20.0,
                right: 20.0,
                bottom: 50.0,
                left: 40.0,
            },
            Self::HeatMap | Self::HeatBucket => Margin::uniform(20.0),
            Self::PieChart | Self::SankeyDiagram | Self::DcTable | Self::Table => {
                Margin::uniform(0.0)
            }
        }
    }

    /// Key rule used when the configuration gives none.
    #[must_use]
    pub const fn default_key(self) -> KeyRule {
        match self {
            Self::BarChart | Self::BarbarChart => KeyRule::Timestamp,
            Self::HeatMap | Self::HeatBucket | Self::PieChart | Self::SankeyDiagram => {
                KeyRule::Label
            }
            Self::DcTable => KeyRule::Key,
            Self::Table => KeyRule::Position,
        }
    }
}

/// How flow links are stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeColor {
    /// Colour of the source node
    Input,
    /// Colour of the target node
    Output,
    /// Gradient from source to target colour
    #[default]
    Path,
    /// Neutral grey
    None,
}

/// One figure of a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureConfig {
    /// Figure id, unique within the dashboard
    pub id: String,
    /// Widget variant
    pub kind: FigureKind,
    /// Outer width in pixels
    pub width: f64,
    /// Outer height in pixels
    pub height: f64,
    /// Outer margins (defaults per kind)
    #[serde(default)]
    pub margin: Option<Margin>,
    /// Largest zoom factor
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    /// Transition duration (defaults per kind)
    #[serde(default)]
    pub transition_ms: Option<u64>,
    /// Rows per page of a table
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Identity rule (defaults per kind)
    #[serde(default)]
    pub key: Option<KeyRule>,
    /// Pie label percentages
    #[serde(default)]
    pub show_percentage: bool,
    /// Flow link colouring
    #[serde(default)]
    pub edge_color: EdgeColor,
}

const fn default_max_zoom() -> f64 {
    DEFAULT_MAX_ZOOM
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl FigureConfig {
    /// Configuration with every optional field at its default.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: FigureKind, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            width,
            height,
            margin: None,
            max_zoom: DEFAULT_MAX_ZOOM,
            transition_ms: None,
            page_size: DEFAULT_PAGE_SIZE,
            key: None,
            show_percentage: false,
            edge_color: EdgeColor::default(),
        }
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn margin(&self) -> Margin {
        self.margin.unwrap_or_else(|| self.kind.default_margin())
    }

    #[must_use]
    pub fn transition(&self) -> Duration {
        Duration::from_millis(
            self.transition_ms
                .unwrap_or_else(|| self.kind.default_transition_ms()),
        )
    }

    #[must_use]
    pub fn key_rule(&self) -> KeyRule {
        self.key.unwrap_or_else(|| self.kind.default_key())
    }

    /// Check the values of this figure.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} figure without id",
                self.kind.ident()
            )));
        }
        let field = |name: &str| format!("{}.{name}", self.id);
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(
                    &field(name),
                    format!("must be positive, got {value}"),
                ));
            }
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= 1.0) {
            return Err(ConfigError::invalid(
                &field("max_zoom"),
                format!("must be at least 1, got {}", self.max_zoom),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::invalid(&field("page_size"), "must be at least 1"));
        }
        if let Some(margin) = self.margin {
            let sides = [margin.top, margin.right, margin.bottom, margin.left];
            if sides.iter().any(|s| !s.is_finite() || *s < 0.0) {
                return Err(ConfigError::invalid(&field("margin"), "must be non-negative"));
            }
        }
        Ok(())
    }
}

/// All figures of one dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Figures in display order
    #[serde(default)]
    pub figures: Vec<FigureConfig>,
}

impl DashboardConfig {
    /// Parse and validate a dashboard from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a value is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        log::debug!("loaded dashboard with {} figures", config.figures.len());
        Ok(config)
    }

    /// Serialize the dashboard to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check every figure and the uniqueness of ids.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for figure in &self.figures {
            figure.validate()?;
            if !seen.insert(figure.id.as_str()) {
                return Err(ConfigError::DuplicateFigure(figure.id.clone()));
            }
        }
        Ok(())
    }

    /// Look up a figure by id.
    #[must_use]
    pub fn figure(&self, id: &str) -> Option<&FigureConfig> {
        self.figures.iter().find(|f| f.id == id)
    }
}
