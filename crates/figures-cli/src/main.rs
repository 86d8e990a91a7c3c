//! Figures CLI - validate figure specs, replay refreshes, page through tables.

#![allow(
    clippy::needless_pass_by_value,
    clippy::uninlined_format_args,
    clippy::disallowed_methods,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

use clap::{Parser, Subcommand, ValueEnum};
use figures_core::{
    compute_domains, DomainKind, FigureHost, FigureSpec, JoinPlan, KeyRule, RecordingSurface,
    SurfaceOp,
};
use figures_widgets::{Dashboard, PaginatedTable, TableColumn};
use figures_yaml::DashboardConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Frame interval used while replaying transitions.
const FRAME: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "figures")]
#[command(about = "Dashboard figure rendering engine CLI")]
#[command(version)]
struct Cli {
    /// Log debug output (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check figure spec JSON files
    Validate {
        /// Spec files to check
        #[arg(required = true)]
        specs: Vec<PathBuf>,

        /// Key rule used to derive element identities
        #[arg(short, long, value_enum, default_value = "key")]
        key: KeyArg,

        /// Strict mode - reject specs without data
        #[arg(long)]
        strict: bool,
    },

    /// Replay a sequence of refreshes against one dashboard figure
    Replay {
        /// Dashboard configuration (YAML)
        dashboard: PathBuf,

        /// Figure id within the dashboard
        figure: String,

        /// Spec files, one per refresh, in order
        #[arg(required = true)]
        specs: Vec<PathBuf>,

        /// Time between refreshes in milliseconds
        #[arg(short, long, default_value = "1000")]
        interval: u64,
    },

    /// Page through a table spec
    Paginate {
        /// Spec file whose elements become table rows
        spec: PathBuf,

        /// Rows per page
        #[arg(short, long, default_value = "20")]
        page_size: usize,

        /// Stop after this many pages
        #[arg(long)]
        pages: Option<usize>,

        /// Key rule used to derive row identities
        #[arg(short, long, value_enum, default_value = "key")]
        key: KeyArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KeyArg {
    Key,
    Label,
    Timestamp,
    Position,
}

impl From<KeyArg> for KeyRule {
    fn from(arg: KeyArg) -> Self {
        match arg {
            KeyArg::Key => Self::Key,
            KeyArg::Label => Self::Label,
            KeyArg::Timestamp => Self::Timestamp,
            KeyArg::Position => Self::Position,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate { specs, key, strict } => {
            validate(&specs, key.into(), strict);
        }
        Commands::Replay {
            dashboard,
            figure,
            specs,
            interval,
        } => {
            replay(&dashboard, &figure, &specs, Duration::from_millis(interval));
        }
        Commands::Paginate {
            spec,
            page_size,
            pages,
            key,
        } => {
            paginate(&spec, page_size, pages, key.into());
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn read(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => fail(format!("Failed to read {}: {}", path.display(), e)),
    }
}

fn load_spec(path: &Path) -> FigureSpec {
    match FigureSpec::from_json(&read(path)) {
        Ok(spec) => spec,
        Err(e) => fail(format!("{}: {}", path.display(), e)),
    }
}

/// Domain a spec's elements would be scaled over.
fn domain_kind(spec: &FigureSpec, key: KeyRule) -> DomainKind {
    if spec.x_axis.is_some() || spec.y_axis.is_some() {
        DomainKind::Grid {
            columns: spec.x_axis.clone(),
            rows: spec.y_axis.clone(),
        }
    } else if key == KeyRule::Timestamp {
        DomainKind::Time
    } else {
        DomainKind::Magnitude
    }
}

fn check_spec(spec: &FigureSpec, key: KeyRule, strict: bool) -> Result<String, String> {
    JoinPlan::new(spec.elements.clone(), |i, e| key.extract(i, e)).map_err(|e| e.to_string())?;
    let domains = compute_domains(&spec.elements, &domain_kind(spec, key)).map_err(|e| e.to_string())?;
    let domains = if strict {
        domains.non_empty().map_err(|e| e.to_string())?
    } else {
        domains
    };
    Ok(format!(
        "{} elements, {} grouped, {} links, values [{}, {}]",
        spec.elements.len(),
        spec.grouped_elements.len(),
        spec.links.len(),
        domains.value[0],
        domains.value[1]
    ))
}

fn validate(specs: &[PathBuf], key: KeyRule, strict: bool) {
    let mut failed = 0;
    for path in specs {
        let result = FigureSpec::from_json(&read(path))
            .map_err(|e| e.to_string())
            .and_then(|spec| check_spec(&spec, key, strict));
        match result {
            Ok(summary) => println!("{}: ok ({})", path.display(), summary),
            Err(e) => {
                eprintln!("{}: invalid: {}", path.display(), e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        fail(format!("{} of {} specs invalid", failed, specs.len()));
    }
}

/// Created, updated and removed node counts.
fn count_ops(ops: &[SurfaceOp]) -> (usize, usize, usize) {
    ops.iter().fold((0, 0, 0), |(c, u, r), op| match op {
        SurfaceOp::Create { .. } => (c + 1, u, r),
        SurfaceOp::Update { .. } => (c, u + 1, r),
        SurfaceOp::Remove { .. } => (c, u, r + 1),
        _ => (c, u, r),
    })
}

fn replay(dashboard: &Path, id: &str, specs: &[PathBuf], interval: Duration) {
    let config = match DashboardConfig::from_yaml(&read(dashboard)) {
        Ok(config) => config,
        Err(e) => fail(format!("{}: {}", dashboard.display(), e)),
    };
    let mut dashboard = Dashboard::from_config(&config);
    let Some(figure) = dashboard.figure_mut(id) else {
        fail(format!("No figure '{}' in dashboard", id));
    };
    println!("Replaying {} refreshes into {} ({})", specs.len(), id, figure.ident());

    let mut surface = RecordingSurface::new();
    figure.setup(&mut surface);
    surface.take_ops();
    let mut now = Duration::ZERO;
    for (i, path) in specs.iter().enumerate() {
        let due = interval * i as u32;
        while now + FRAME <= due {
            now += FRAME;
            figure.tick(now, &mut surface);
        }
        now = due;
        let spec = load_spec(path);
        match figure.refresh(spec, now, &mut surface) {
            Ok(()) => {
                let (created, updated, removed) = count_ops(&surface.take_ops());
                println!(
                    "  refresh {} at {:?}: +{} ~{} -{}",
                    i + 1,
                    now,
                    created,
                    updated,
                    removed
                );
            }
            Err(e) => println!("  refresh {} at {:?}: rejected: {}", i + 1, now, e),
        }
    }

    while figure.tick(now, &mut surface) {
        now += FRAME;
    }
    let (_, frames, removed) = count_ops(&surface.take_ops());
    println!("Settled at {:?} after {} frame updates, {} removals", now, frames, removed);
    for layer in surface.layer_names() {
        println!("  {}: {} nodes", layer, surface.layer(layer).len());
    }
    if figure.failures() > 0 {
        println!("  {} refreshes rejected", figure.failures());
    }
}

fn paginate(path: &Path, page_size: usize, pages: Option<usize>, key: KeyRule) {
    let spec = load_spec(path);
    let mut surface = RecordingSurface::new();
    let mut host = FigureHost::new(
        PaginatedTable::new(page_size)
            .with_key(key)
            .with_transition(Duration::ZERO),
    );
    if let Err(e) = host.refresh(spec, Duration::ZERO, &mut surface) {
        fail(format!("{}: {}", path.display(), e));
    }

    let columns = [TableColumn::Key, TableColumn::Label, TableColumn::Value];
    let table = host.figure_mut();
    let limit = pages.unwrap_or(usize::MAX);
    for page in 0..limit {
        println!("{}", table.page_label());
        for row in table.query().rows() {
            let cells: Vec<String> = columns.iter().map(|c| c.cell(&row)).collect();
            println!("  {}", cells.join("\t"));
        }
        if page + 1 == limit || !table.next_enabled() {
            break;
        }
        if let Err(e) = table.next(Duration::ZERO, &mut surface) {
            fail(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figures_core::{Element, NodeId};

    #[test]
    fn test_domain_kind_selection() {
        let mut spec = FigureSpec::default();
        assert_eq!(domain_kind(&spec, KeyRule::Key), DomainKind::Magnitude);
        assert_eq!(domain_kind(&spec, KeyRule::Timestamp), DomainKind::Time);
        spec.x_axis = Some(vec!["a".to_string()]);
        assert!(matches!(
            domain_kind(&spec, KeyRule::Timestamp),
            DomainKind::Grid { .. }
        ));
    }

    #[test]
    fn test_check_spec_reports_duplicates() {
        let spec = FigureSpec::new(vec![Element::keyed("a", 1.0), Element::keyed("a", 2.0)]);
        let err = check_spec(&spec, KeyRule::Key, false).unwrap_err();
        assert!(err.contains("duplicate identity a"));
    }

    #[test]
    fn test_check_spec_strict_rejects_empty() {
        let spec = FigureSpec::default();
        assert!(check_spec(&spec, KeyRule::Key, false).is_ok());
        assert!(check_spec(&spec, KeyRule::Key, true).is_err());
    }

    #[test]
    fn test_count_ops() {
        let node = NodeId::new("bars", 1);
        let ops = [
            SurfaceOp::AddLayer("bars"),
            SurfaceOp::Create { node, index: 0 },
            SurfaceOp::Update { node },
            SurfaceOp::Update { node },
            SurfaceOp::Remove { node },
        ];
        assert_eq!(count_ops(&ops), (1, 2, 1));
    }

    #[test]
    fn test_key_arg_conversion() {
        assert_eq!(KeyRule::from(KeyArg::Label), KeyRule::Label);
        assert_eq!(KeyRule::from(KeyArg::Position), KeyRule::Position);
    }
}
