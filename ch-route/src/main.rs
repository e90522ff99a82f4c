#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    clippy::missing_docs_in_private_items,
)]
//! `ch-route` command line interface
//!
//! Loads a graph, contracts it into a hierarchy, exports the augmented graph and benchmarks plain
//! Dijkstra, bidirectional search and bidirectional search on the hierarchy against each other.
//! See binary --help for more information

use std::fs::File;
use std::path::{
    Path,
    PathBuf,
};
use std::time::{
    Duration,
    Instant,
};

use anyhow::{
    Context,
    Result,
};
use ch_route::bench::{
    random_pairs,
    Benchmark,
    BenchmarkReport,
    DEFAULT_SEED,
};
use ch_route::{
    io,
    AugmentedGraph,
    ContractionConfig,
    ContractionResult,
    Contractor,
    EdgeFilter,
    Graph,
};
use clap::Parser;
use indicatif::{
    ProgressBar,
    ProgressFinish,
    ProgressStyle,
};
use tracing::{
    info,
    warn,
};

/// ch-route command-line interface: contraction hierarchy preprocessing and query benchmarking
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Graph file: `<vertices> <edges>`, then `<id> <longitude> <latitude>` per vertex and
    /// `<from> <to> <cost>` per edge.
    #[arg(short, long)]
    graph: PathBuf,

    /// Where to write the augmented graph.
    #[arg(short, long, default_value = "augmented_graph.txt")]
    output: PathBuf,

    /// Number of random query pairs to benchmark.
    #[arg(short, long, default_value_t = 1000)]
    queries: usize,

    /// Seed for the random query pairs.
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Contractions between two lazy reprioritization passes.
    #[arg(short, long, default_value_t = ContractionConfig::default().batch_size, value_parser = parse_batch_size)]
    batch_size: usize,

    /// Which original edges to keep in the augmented graph.
    #[arg(short, long, value_enum, default_value_t = EdgeFilter::KeepAll)]
    edge_filter: EdgeFilter,

    /// Optional path for a JSON copy of the benchmark report.
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Logging verbosity level (`trace`, `debug`, `info`, `warn`, `error`).
    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

/// Custom parser for `batch_size` to reject zero
fn parse_batch_size(s: &str) -> Result<usize, String> {
    let val: usize = s.parse().map_err(|_| format!("'{s}' isn't a valid batch size"))?;
    if val == 0 {
        Err("batch size must be at least 1".to_string())
    } else {
        Ok(val)
    }
}

/// Contract `graph` in place behind a progress bar, returning the hierarchy and the time it took.
fn contract_graph(graph: &mut Graph, config: ContractionConfig) -> Result<(ContractionResult, Duration)> {
    let total = graph.vertex_count();
    let pb = ProgressBar::new(total as u64)
        .with_style(ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.yellow/blue}] {pos}/{len} contractions ({percent}%) {msg}",
        )?)
        .with_message(format!("Contraction phase (batch size {})", config.batch_size))
        .with_finish(ProgressFinish::AndLeave);
    pb.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let result = Contractor::with_config(graph, config).preprocess_with_progress(|i| pb.set_position(i as u64));
    let elapsed = start.elapsed();
    pb.finish_using_style();

    Ok((result, elapsed))
}

/// Write the report as pretty JSON.
fn write_report(path: &Path, report: &BenchmarkReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating report file {}", path.display()))?;
    serde_json::to_writer_pretty(file, report).context("serializing benchmark report")?;
    info!("Wrote benchmark report to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Conform to crate-standard logging.
    ch_core::logging::setup(&args.verbosity);

    let plain = io::read_graph_file(&args.graph).with_context(|| format!("loading {}", args.graph.display()))?;
    let mut contracted = plain.clone();

    let config = ContractionConfig { batch_size: args.batch_size, ..ContractionConfig::default() };
    let (result, elapsed) = contract_graph(&mut contracted, config)?;
    info!(
        seconds = elapsed.as_secs_f64(),
        shortcuts = result.shortcut_count(),
        contracted = result.contracted_count(),
        "Contraction finished"
    );

    let augmented = AugmentedGraph::build_with(&contracted, &result, args.edge_filter)
        .context("assembling the augmented graph")?;
    if !augmented.export(&args.output) {
        warn!("Continuing without an exported augmented graph");
    }

    let pairs = random_pairs(&plain, args.queries, args.seed);
    info!("Comparing performance of algorithms on {} query pairs", pairs.len());
    let report = Benchmark::new(&plain, &augmented).run(&pairs);
    report.log();

    if let Some(path) = &args.report {
        write_report(path, &report)?;
    }
    Ok(())
}
