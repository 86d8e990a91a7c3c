//! Figure registry: builds widget variants from dashboard configuration.

use crate::{BarChart, CellTable, FlowDiagram, HeatMap, PaginatedTable, PieChart};
use figures_core::{FigureError, FigureHost, FigureSpec, GestureEvent, RenderSurface, Size};
use figures_yaml::{DashboardConfig, FigureConfig, FigureKind};
use std::time::Duration;

/// Host of any registered widget variant.
#[derive(Debug)]
pub enum AnyFigure {
    Bar(FigureHost<BarChart>),
    Heat(FigureHost<HeatMap>),
    Pie(FigureHost<PieChart>),
    Flow(FigureHost<FlowDiagram>),
    Table(FigureHost<PaginatedTable>),
    Cells(FigureHost<CellTable>),
}

macro_rules! dispatch {
    ($self:expr, $host:ident => $body:expr) => {
        match $self {
            AnyFigure::Bar($host) => $body,
            AnyFigure::Heat($host) => $body,
            AnyFigure::Pie($host) => $body,
            AnyFigure::Flow($host) => $body,
            AnyFigure::Table($host) => $body,
            AnyFigure::Cells($host) => $body,
        }
    };
}

impl AnyFigure {
    /// Build the variant named by `config.kind`.
    #[must_use]
    pub fn from_config(config: &FigureConfig) -> Self {
        let size = config.size();
        let margin = config.margin();
        let transition = config.transition();
        let key = config.key_rule();
        match config.kind {
            FigureKind::BarChart | FigureKind::BarbarChart => {
                let chart = if config.kind == FigureKind::BarbarChart {
                    BarChart::grouped(size, margin)
                } else {
                    BarChart::new(size, margin)
                };
                Self::Bar(FigureHost::new(
                    chart
                        .with_max_zoom(config.max_zoom)
                        .with_transition(transition)
                        .with_key(key),
                ))
            }
            FigureKind::HeatMap | FigureKind::HeatBucket => {
                let map = if config.kind == FigureKind::HeatBucket {
                    HeatMap::bucketed(size, margin)
                } else {
                    HeatMap::new(size, margin)
                };
                Self::Heat(FigureHost::new(map.with_transition(transition).with_key(key)))
            }
            FigureKind::PieChart => Self::Pie(FigureHost::new(
                PieChart::new(size)
                    .with_transition(transition)
                    .with_key(key)
                    .with_percentage(config.show_percentage),
            )),
            FigureKind::SankeyDiagram => Self::Flow(FigureHost::new(
                FlowDiagram::new(size)
                    .with_transition(transition)
                    .with_edge_color(config.edge_color),
            )),
            FigureKind::DcTable => Self::Table(FigureHost::new(
                PaginatedTable::new(config.page_size)
                    .with_transition(transition)
                    .with_key(key),
            )),
            FigureKind::Table => {
                Self::Cells(FigureHost::new(CellTable::new(size).with_transition(transition)))
            }
        }
    }

    /// Registry name of the variant.
    #[must_use]
    pub fn ident(&self) -> &'static str {
        dispatch!(self, host => figures_core::Figure::ident(host.figure()))
    }

    /// Number of refreshes rejected so far.
    #[must_use]
    pub fn failures(&self) -> u64 {
        dispatch!(self, host => host.failures())
    }

    #[must_use]
    pub fn data(&self) -> Option<&FigureSpec> {
        dispatch!(self, host => host.data())
    }

    pub fn setup(&mut self, surface: &mut dyn RenderSurface) {
        dispatch!(self, host => host.setup(surface));
    }

    pub fn refresh(
        &mut self,
        spec: FigureSpec,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        dispatch!(self, host => host.refresh(spec, now, surface))
    }

    pub fn refresh_json(
        &mut self,
        json: &str,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        dispatch!(self, host => host.refresh_json(json, now, surface))
    }

    pub fn on_gesture(
        &mut self,
        event: GestureEvent,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<bool, FigureError> {
        dispatch!(self, host => host.on_gesture(event, now, surface))
    }

    pub fn resize(
        &mut self,
        size: Size,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        dispatch!(self, host => host.resize(size, now, surface))
    }

    pub fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        dispatch!(self, host => host.tick(now, surface))
    }

    /// The paginated table, if this is one.
    pub fn as_table_mut(&mut self) -> Option<&mut PaginatedTable> {
        match self {
            Self::Table(host) => Some(host.figure_mut()),
            _ => None,
        }
    }
}

/// Independent figures of one dashboard, in configuration order.
#[derive(Debug, Default)]
pub struct Dashboard {
    figures: Vec<(String, AnyFigure)>,
}

impl Dashboard {
    /// Build every configured figure.
    #[must_use]
    pub fn from_config(config: &DashboardConfig) -> Self {
        let figures = config
            .figures
            .iter()
            .map(|c| (c.id.clone(), AnyFigure::from_config(c)))
            .collect::<Vec<_>>();
        log::debug!("dashboard built with {} figures", figures.len());
        Self { figures }
    }

    pub fn len(&self) -> usize {
        self.figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.figures.iter().map(|(id, _)| id.as_str())
    }

    pub fn figure(&self, id: &str) -> Option<&AnyFigure> {
        self.figures.iter().find(|(i, _)| i == id).map(|(_, f)| f)
    }

    pub fn figure_mut(&mut self, id: &str) -> Option<&mut AnyFigure> {
        self.figures
            .iter_mut()
            .find(|(i, _)| i == id)
            .map(|(_, f)| f)
    }

    /// Advance every figure. Returns whether any still animates.
    pub fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        self.figures
            .iter_mut()
            .fold(false, |animating, (_, f)| f.tick(now, surface) || animating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figures_core::{Element, RecordingSurface};
    use figures_yaml::EdgeColor;

    #[test]
    fn test_kinds_map_to_variants() {
        let cases = [
            (FigureKind::BarChart, "bar_chart"),
            (FigureKind::BarbarChart, "barbar_chart"),
            (FigureKind::HeatMap, "heat_map"),
            (FigureKind::HeatBucket, "heat_bucket"),
            (FigureKind::PieChart, "pie_chart"),
            (FigureKind::SankeyDiagram, "sankey_diagram"),
            (FigureKind::DcTable, "dc_table"),
            (FigureKind::Table, "table"),
        ];
        for (kind, ident) in cases {
            let figure = AnyFigure::from_config(&FigureConfig::new("f", kind, 300.0, 200.0));
            assert_eq!(figure.ident(), ident, "{kind:?}");
        }
    }

    #[test]
    fn test_config_reaches_widget() {
        let mut config = FigureConfig::new("flows", FigureKind::SankeyDiagram, 300.0, 200.0);
        config.edge_color = EdgeColor::Input;
        let AnyFigure::Flow(host) = AnyFigure::from_config(&config) else {
            panic!("expected a flow diagram");
        };
        assert_eq!(host.figure().edge_color(), EdgeColor::Input);

        let mut config = FigureConfig::new("t", FigureKind::DcTable, 300.0, 200.0);
        config.page_size = 5;
        let mut figure = AnyFigure::from_config(&config);
        let table = figure.as_table_mut().unwrap();
        assert_eq!(table.query().state().page_size, 5);
    }

    #[test]
    fn test_dashboard_figures_are_independent() {
        let yaml = r"
figures:
  - id: pie
    kind: pie_chart
    width: 200
    height: 200
  - id: table
    kind: dc_table
    width: 400
    height: 300
";
        let config = DashboardConfig::from_yaml(yaml).unwrap();
        let mut dashboard = Dashboard::from_config(&config);
        assert_eq!(dashboard.ids().collect::<Vec<_>>(), vec!["pie", "table"]);

        let (mut pie_surface, mut table_surface) = (RecordingSurface::new(), RecordingSurface::new());
        let dup = FigureSpec::new(vec![
            Element::keyed("a", 1.0).with_label("x"),
            Element::keyed("b", 2.0).with_label("x"),
        ]);
        assert!(dashboard
            .figure_mut("pie")
            .unwrap()
            .refresh(dup, Duration::ZERO, &mut pie_surface)
            .is_err());

        let rows = FigureSpec::new(vec![Element::keyed("a", 1.0), Element::keyed("b", 2.0)]);
        dashboard
            .figure_mut("table")
            .unwrap()
            .refresh(rows, Duration::ZERO, &mut table_surface)
            .unwrap();

        assert_eq!(dashboard.figure("pie").unwrap().failures(), 1);
        assert_eq!(dashboard.figure("table").unwrap().failures(), 0);
        assert!(!dashboard.figure_mut("pie").unwrap().tick(Duration::from_millis(10), &mut pie_surface));
        assert!(dashboard
            .figure_mut("table")
            .unwrap()
            .tick(Duration::from_millis(10), &mut table_surface));
        assert_eq!(table_surface.layer("rows").len(), 2);
        assert_eq!(pie_surface.layer("slices").len(), 0);
    }
}
