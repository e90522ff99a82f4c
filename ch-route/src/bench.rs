//! Query benchmarking: plain Dijkstra vs. bidirectional search on the plain graph vs. bidirectional
//! search on the augmented graph, over a reproducible set of random vertex pairs.

use std::time::{
    Duration,
    Instant,
};

use ch_core::VertexId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{
    info,
    instrument,
    warn,
};

use crate::contraction_hierarchies::AugmentedGraph;
use crate::graph::Graph;
use crate::search::{
    bidirectional_search,
    dijkstra,
    QueryResult,
};

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 314_159;

/// `count` `(source, target)` pairs drawn uniformly, with replacement, from the vertex ids of
/// `graph`. The same seed always yields the same pairs; an empty graph yields none.
#[must_use]
pub fn random_pairs(graph: &Graph, count: usize, seed: u64) -> Vec<(VertexId, VertexId)> {
    let ids: Vec<VertexId> = graph.vertex_ids().collect();
    if ids.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .filter_map(|_| Some((*ids.choose(&mut rng)?, *ids.choose(&mut rng)?)))
        .collect()
}

/// Aggregate figures for one algorithm.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AlgorithmStats {
    /// Queries answered.
    pub queries: usize,
    /// Mean wall-clock time per query, in milliseconds.
    pub average_ms: f64,
    /// Mean relaxed-edge count per query.
    pub average_relaxed_edges: f64,
    /// Queries whose distance differed from plain Dijkstra.
    pub mismatches: usize,
}

/// Running totals for one algorithm.
#[derive(Default)]
struct Tally {
    /// Time spent in queries.
    elapsed: Duration,
    /// Relaxed edges over all queries.
    relaxed: u64,
    /// Disagreements with the reference distance.
    mismatches: usize,
}

impl Tally {
    /// Time `query`, record its counters and return its result.
    fn measure(&mut self, query: impl FnOnce() -> QueryResult) -> QueryResult {
        let start = Instant::now();
        let result = query();
        self.elapsed += start.elapsed();
        self.relaxed += result.relaxed_edges;
        result
    }

    /// Averages over `queries`.
    #[allow(clippy::cast_precision_loss)] // counts stay far below 2^52
    fn finish(self, queries: usize) -> AlgorithmStats {
        if queries == 0 {
            return AlgorithmStats::default();
        }
        AlgorithmStats {
            queries,
            average_ms: self.elapsed.as_secs_f64() * 1000.0 / queries as f64,
            average_relaxed_edges: self.relaxed as f64 / queries as f64,
            mismatches: self.mismatches,
        }
    }
}

/// Results of a benchmark run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BenchmarkReport {
    /// Plain Dijkstra on the input graph; the reference distances.
    pub dijkstra: AlgorithmStats,
    /// Bidirectional search on the input graph.
    pub bidirectional: AlgorithmStats,
    /// Bidirectional search on the augmented graph.
    pub contraction_hierarchy: AlgorithmStats,
}

impl BenchmarkReport {
    /// Log one line per algorithm, and a warning for every algorithm that disagreed with Dijkstra.
    pub fn log(&self) {
        for (name, stats) in [
            ("dijkstra", &self.dijkstra),
            ("bidirectional", &self.bidirectional),
            ("contraction hierarchy", &self.contraction_hierarchy),
        ] {
            info!(
                queries = stats.queries,
                average_ms = stats.average_ms,
                average_relaxed_edges = stats.average_relaxed_edges,
                "{name}"
            );
            if stats.mismatches > 0 {
                warn!(mismatches = stats.mismatches, "{name} disagreed with dijkstra");
            }
        }
    }
}

/// The graphs a benchmark runs against.
pub struct Benchmark<'a> {
    /// Input graph, without shortcuts.
    plain: &'a Graph,
    /// Query graph produced by preprocessing.
    augmented: &'a AugmentedGraph,
}

impl<'a> Benchmark<'a> {
    /// Compare queries on `plain` with queries on `augmented`.
    ///
    /// `plain` must not carry the shortcuts preprocessing appended; keep a copy from before the pass.
    #[must_use]
    pub const fn new(plain: &'a Graph, augmented: &'a AugmentedGraph) -> Self {
        Self { plain, augmented }
    }

    /// Answer every pair with all three algorithms.
    #[instrument(skip_all, fields(pairs = pairs.len()))]
    pub fn run(&self, pairs: &[(VertexId, VertexId)]) -> BenchmarkReport {
        let mut reference = Tally::default();
        let mut plain = Tally::default();
        let mut accelerated = Tally::default();

        for &(source, target) in pairs {
            let expected = reference.measure(|| dijkstra(self.plain, source, target)).distance;

            if plain.measure(|| bidirectional_search(self.plain, source, target)).distance != expected {
                plain.mismatches += 1;
            }
            if accelerated.measure(|| self.augmented.query(source, target)).distance != expected {
                accelerated.mismatches += 1;
            }
        }

        BenchmarkReport {
            dijkstra: reference.finish(pairs.len()),
            bidirectional: plain.finish(pairs.len()),
            contraction_hierarchy: accelerated.finish(pairs.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::contraction_hierarchies::preprocess;
    use crate::graph::Coordinates;

    /// Undirected cycle over ids `0..n` with costs `1..=n`.
    fn ring(n: VertexId) -> Graph {
        let mut graph = Graph::new();
        for id in 0..n {
            graph.add_vertex(id, Coordinates::default());
        }
        for id in 0..n {
            let next = (id + 1) % n;
            graph.add_edge(id, next, id + 1).unwrap();
            graph.add_edge(next, id, id + 1).unwrap();
        }
        graph
    }

    #[rstest]
    fn test_random_pairs_are_reproducible() {
        let graph = ring(10);
        let pairs = random_pairs(&graph, 25, DEFAULT_SEED);
        assert_eq!(pairs.len(), 25);
        assert_eq!(pairs, random_pairs(&graph, 25, DEFAULT_SEED));
        assert!(pairs.iter().all(|&(s, t)| graph.contains_vertex(s) && graph.contains_vertex(t)));
    }

    #[rstest]
    fn test_random_pairs_on_empty_graph() {
        assert!(random_pairs(&Graph::new(), 10, 1).is_empty());
    }

    #[rstest]
    fn test_benchmark_agrees_with_dijkstra() {
        let plain = ring(12);
        let mut contracted = plain.clone();
        let result = preprocess(&mut contracted);
        let augmented = AugmentedGraph::build(&contracted, &result).unwrap();

        let pairs = random_pairs(&plain, 50, 7);
        let report = Benchmark::new(&plain, &augmented).run(&pairs);

        assert_eq!(report.dijkstra.queries, 50);
        assert_eq!(report.dijkstra.mismatches, 0);
        assert_eq!(report.bidirectional.mismatches, 0);
        assert_eq!(report.contraction_hierarchy.mismatches, 0);
    }

    #[rstest]
    fn test_empty_benchmark() {
        let plain = Graph::new();
        let augmented = AugmentedGraph::build(&plain, &Default::default()).unwrap();
        let report = Benchmark::new(&plain, &augmented).run(&[]);
        assert_eq!(report, BenchmarkReport::default());
    }

    #[rstest]
    fn test_report_serializes() {
        let report = BenchmarkReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["contraction_hierarchy"]["mismatches"], 0);
    }
}
