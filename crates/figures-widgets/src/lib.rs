//! Widget variants of the dashboard figures.
//!
//! Every variant implements [`figures_core::Figure`] and is driven by a
//! [`figures_core::FigureHost`]. [`AnyFigure`] builds one from its YAML
//! configuration.

pub mod bar_chart;
pub mod cell_table;
pub mod heat_map;
pub mod pie_chart;
pub mod registry;
pub mod sankey;
pub mod table;

pub use bar_chart::{AxisModel, AxisTick, BarChart, BarScales};
pub use cell_table::{cell_identity, CellSlot, CellTable, TableGrid};
pub use heat_map::{GridArrangement, HeatMap, HeatScales};
pub use pie_chart::{PieChart, PieLayout};
pub use registry::{AnyFigure, Dashboard};
pub use sankey::{
    node_names, ColumnLayout, FlowDiagram, FlowLayout, FlowLayoutEngine, FlowLink, FlowNode,
    FlowSettings, NodeAlign,
};
pub use table::{PaginatedTable, ReplaceRecords, TableColumn, ROW_HEIGHT};
