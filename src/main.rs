use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui::{Pos2, Rect, vec2};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use graph_drift::{
    Dataset, EdgeType, Filters, GraphMetrics, HighlightMode, LayoutEngine, NodeType,
    SchedulerState, SimulationConfig,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Dataset JSON with `nodes` and `edges`.
    dataset: PathBuf,

    /// Simulation config JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_delimiter = ',')]
    node_types: Vec<NodeType>,

    #[arg(long, value_delimiter = ',')]
    edge_types: Vec<EdgeType>,

    #[arg(long, default_value_t = 0)]
    min_connections: usize,

    #[arg(long)]
    max_connections: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    max_ticks: Option<u64>,

    /// Many-body repulsion strength.
    #[arg(long)]
    charge: Option<f32>,

    /// `id=x,y`; repeatable.
    #[arg(long = "pin", value_parser = parse_pin)]
    pins: Vec<PinArg>,

    #[arg(long)]
    highlight: Option<String>,

    /// Fuzzy label matching for --highlight.
    #[arg(long)]
    fuzzy: bool,

    #[arg(long, default_value_t = 1.0)]
    zoom: f32,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pan_x: f32,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pan_y: f32,

    #[arg(long, default_value_t = 1440.0)]
    width: f32,

    #[arg(long, default_value_t = 920.0)]
    height: f32,

    /// Report destination; stdout when omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, short)]
    verbose: bool,

    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Debug)]
struct PinArg {
    node_id: String,
    x: f32,
    y: f32,
}

fn parse_pin(raw: &str) -> Result<PinArg, String> {
    let (node_id, coords) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected id=x,y, got `{raw}`"))?;
    let (x, y) = coords
        .split_once(',')
        .ok_or_else(|| format!("expected x,y after `=`, got `{coords}`"))?;
    let x = x.trim().parse::<f32>().map_err(|err| format!("bad x `{x}`: {err}"))?;
    let y = y.trim().parse::<f32>().map_err(|err| format!("bad y `{y}`: {err}"))?;

    if node_id.is_empty() {
        return Err("pin is missing a node id".to_owned());
    }
    Ok(PinArg {
        node_id: node_id.to_owned(),
        x,
        y,
    })
}

#[derive(Serialize)]
struct LayoutReport {
    state: SchedulerState,
    ticks: u64,
    alpha: f32,
    degenerate_recoveries: usize,
    metrics: GraphMetrics,
    viewport: ViewportReport,
    nodes: Vec<NodeReport>,
}

#[derive(Serialize)]
struct ViewportReport {
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
    width: f32,
    height: f32,
}

#[derive(Serialize)]
struct NodeReport {
    id: String,
    #[serde(rename = "type")]
    node_type: NodeType,
    label: String,
    x: f32,
    y: f32,
    screen_x: f32,
    screen_y: f32,
    connections: usize,
    pinned: bool,
    highlighted: bool,
}

fn init_tracing(args: &Args) {
    let fallback = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn simulation_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_ticks) = args.max_ticks {
        config.max_ticks = max_ticks;
    }
    if let Some(charge) = args.charge {
        config.forces.charge_strength = charge;
    }
    Ok(config)
}

fn filters(args: &Args) -> Filters {
    let mut filters =
        Filters::default().with_connections(args.min_connections, args.max_connections);
    if !args.node_types.is_empty() {
        filters = filters.with_node_types(args.node_types.iter().copied());
    }
    if !args.edge_types.is_empty() {
        filters = filters.with_edge_types(args.edge_types.iter().copied());
    }
    filters
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let config = simulation_config(&args)?;
    let snapshot = Dataset::load(&args.dataset)?.into_snapshot()?;
    info!(
        nodes = snapshot.metrics.total_nodes,
        edges = snapshot.metrics.total_edges,
        clusters = snapshot.clusters.len(),
        "loaded {}",
        args.dataset.display()
    );

    let mut engine = LayoutEngine::new(snapshot, config, filters(&args))
        .context("filter flags are inconsistent")?;

    let mode = if args.fuzzy {
        HighlightMode::Fuzzy
    } else {
        HighlightMode::Substring
    };
    engine.interaction_mut().set_highlight_mode(mode);
    engine
        .interaction_mut()
        .set_viewport(args.zoom, vec2(args.pan_x, args.pan_y))
        .context("invalid viewport")?;

    for pin in &args.pins {
        if engine.subgraph().is_none_or(|subgraph| !subgraph.contains(&pin.node_id)) {
            warn!(node = %pin.node_id, "pinned node is not in the filtered graph");
        }
        engine
            .interaction()
            .pin(&pin.node_id, pin.x, pin.y)
            .with_context(|| format!("cannot pin {}", pin.node_id))?;
    }
    if let Some(query) = &args.highlight {
        let matched = engine.highlight(query);
        info!(query = %query, matched, "highlighted nodes");
    }

    let warnings = engine.run_until_settled();
    let scheduler = engine.scheduler();
    info!(
        ticks = scheduler.tick(),
        alpha = scheduler.alpha(),
        state = ?scheduler.state(),
        "layout settled"
    );

    let rect = Rect::from_min_size(Pos2::ZERO, vec2(args.width, args.height));
    let viewport = *engine.interaction().viewport();
    let metrics = engine
        .subgraph()
        .map(|subgraph| subgraph.metrics)
        .unwrap_or_default();
    let nodes = scheduler
        .nodes()
        .into_iter()
        .map(|node| {
            let world = vec2(node.x.unwrap_or(0.0), node.y.unwrap_or(0.0));
            let screen = viewport.world_to_screen(rect, world);
            NodeReport {
                pinned: node.pin().is_some(),
                id: node.id,
                node_type: node.node_type,
                label: node.label,
                x: world.x,
                y: world.y,
                screen_x: screen.x,
                screen_y: screen.y,
                connections: node.connections,
                highlighted: node.highlighted,
            }
        })
        .collect();

    let report = LayoutReport {
        state: scheduler.state(),
        ticks: scheduler.tick(),
        alpha: scheduler.alpha(),
        degenerate_recoveries: warnings.len(),
        metrics,
        viewport: ViewportReport {
            zoom: viewport.zoom(),
            pan_x: viewport.pan().x,
            pan_y: viewport.pan().y,
            width: args.width,
            height: args.height,
        },
        nodes,
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_report(BufWriter::new(file), &report)?;
            info!("wrote layout to {}", path.display());
        }
        None => write_report(BufWriter::new(io::stdout().lock()), &report)?,
    }
    Ok(())
}

fn write_report(mut writer: impl Write, report: &LayoutReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).context("failed to serialize layout")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
