//! Integration tests for figures-yaml.

use figures_core::KeyRule;
use figures_yaml::{ConfigError, DashboardConfig, EdgeColor, FigureKind};
use std::time::Duration;

const DASHBOARD: &str = r"
figures:
  - id: host_load
    kind: barbar_chart
    width: 600
    height: 250
    max_zoom: 24
  - id: services
    kind: heat_map
    width: 400
    height: 400
    margin: { top: 10, left: 60 }
  - id: flows
    kind: sankey_diagram
    width: 800
    height: 400
    edge_color: none
    transition_ms: 500
  - id: events
    kind: dc_table
    width: 800
    height: 500
    page_size: 50
    key: label
";

#[test]
fn test_full_dashboard() {
    let config = DashboardConfig::from_yaml(DASHBOARD).unwrap();
    assert_eq!(config.figures.len(), 4);

    let load = config.figure("host_load").unwrap();
    assert_eq!(load.kind, FigureKind::BarbarChart);
    assert_eq!(load.max_zoom, 24.0);
    assert_eq!(load.key_rule(), KeyRule::Timestamp);
    assert_eq!(load.margin().bottom, 50.0);

    // Sides missing from a partial margin keep the usual 20.
    let services = config.figure("services").unwrap();
    let margin = services.margin();
    assert_eq!((margin.top, margin.left), (10.0, 60.0));
    assert_eq!((margin.right, margin.bottom), (20.0, 20.0));
    assert_eq!(services.transition(), Duration::from_millis(1800));

    let flows = config.figure("flows").unwrap();
    assert_eq!(flows.edge_color, EdgeColor::None);
    assert_eq!(flows.transition(), Duration::from_millis(500));

    let events = config.figure("events").unwrap();
    assert_eq!(events.page_size, 50);
    assert_eq!(events.key_rule(), KeyRule::Label);

    assert!(config.figure("missing").is_none());
}

#[test]
fn test_reparsed_dashboard_is_identical() {
    let config = DashboardConfig::from_yaml(DASHBOARD).unwrap();
    let yaml = config.to_yaml().unwrap();
    assert_eq!(DashboardConfig::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_rejections() {
    let zero_page = r"
figures:
  - id: t
    kind: dc_table
    width: 100
    height: 100
    page_size: 0
";
    assert!(matches!(
        DashboardConfig::from_yaml(zero_page),
        Err(ConfigError::InvalidValue { .. })
    ));

    let duplicate = r"
figures:
  - { id: a, kind: pie_chart, width: 10, height: 10 }
  - { id: a, kind: dc_table, width: 10, height: 10 }
";
    let err = DashboardConfig::from_yaml(duplicate).unwrap_err();
    assert_eq!(err.to_string(), "Duplicate figure id: a");

    let missing_size = "figures:\n  - { id: a, kind: pie_chart }\n";
    assert!(matches!(
        DashboardConfig::from_yaml(missing_size),
        Err(ConfigError::Yaml(_))
    ));
}

#[test]
fn test_empty_dashboard() {
    let config = DashboardConfig::from_yaml("figures: []").unwrap();
    assert!(config.figures.is_empty());
}
