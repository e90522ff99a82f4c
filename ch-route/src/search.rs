//! Point-to-point least-cost searches.
//!
//! Both searches borrow the graph immutably and allocate their working state per call, so any
//! number of queries can run against the same graph concurrently.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ch_core::{
    Cost,
    VertexId,
};
use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use tracing::debug;

use crate::graph::Graph;

/// Outcome of a single query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    /// Least total cost, or `None` when the target is unreachable.
    pub distance: Option<Cost>,
    /// Arcs that improved a tentative distance, summed over both directions.
    pub relaxed_edges: u64,
}

impl QueryResult {
    /// Result for a target that cannot be reached.
    #[must_use]
    pub const fn unreachable(relaxed_edges: u64) -> Self {
        Self { distance: None, relaxed_edges }
    }

    /// Whether a path was found.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        self.distance.is_some()
    }
}

/// One direction of a search. `Cost::MAX` stands for an infinite tentative distance.
struct Frontier {
    /// Tentative distance per slot.
    dist: Vec<Cost>,
    /// Whether each slot is settled on this side.
    settled: Vec<bool>,
    /// Least-distance-first queue; entries whose distance is outdated are skipped when popped.
    queue: BinaryHeap<Reverse<(Cost, NodeIndex)>>,
    /// Arcs that improved a tentative distance on this side.
    relaxed: u64,
}

impl Frontier {
    /// A frontier over `bound` slots rooted at `origin`.
    fn new(bound: usize, origin: NodeIndex) -> Self {
        let mut dist = vec![Cost::MAX; bound];
        dist[origin.index()] = 0;
        Self {
            dist,
            settled: vec![false; bound],
            queue: BinaryHeap::from([Reverse((0, origin))]),
            relaxed: 0,
        }
    }

    /// Distance at the head of the queue, or `Cost::MAX` if it is empty.
    fn head(&self) -> Cost {
        self.queue.peek().map_or(Cost::MAX, |Reverse((d, _))| *d)
    }

    /// Improve the tentative distance of `node`, returning whether it changed.
    fn relax(&mut self, node: NodeIndex, candidate: Cost) -> bool {
        if candidate < self.dist[node.index()] {
            self.dist[node.index()] = candidate;
            self.queue.push(Reverse((candidate, node)));
            self.relaxed += 1;
            true
        } else {
            false
        }
    }
}

/// Least total cost from `source` to `target`, alternating a forward frontier rooted at `source`
/// with a backward frontier rooted at `target`.
///
/// Both frontiers follow outgoing arcs. This is exact when every arc has a reverse twin of the same
/// cost, which the augmented graph guarantees for shortcuts; on an arbitrary directed graph the
/// backward side explores the wrong direction and the result is only an approximation.
///
/// The search stops once the smaller of the two queue heads reaches the best meeting distance seen
/// so far. A vertex settled on either side is never expanded again.
#[must_use]
pub fn bidirectional_search(graph: &Graph, source: VertexId, target: VertexId) -> QueryResult {
    if source == target {
        return QueryResult { distance: Some(0), relaxed_edges: 0 };
    }
    let (Some(s), Some(t)) = (graph.node(source), graph.node(target)) else {
        debug!(source, target, "Query endpoint is not a vertex");
        return QueryResult::unreachable(0);
    };

    let bound = graph.node_bound();
    let mut forward = Frontier::new(bound, s);
    let mut backward = Frontier::new(bound, t);
    let mut best = Cost::MAX;

    while forward.head().min(backward.head()) < best {
        let (this, other) = if forward.head() <= backward.head() {
            (&mut forward, &mut backward)
        } else {
            (&mut backward, &mut forward)
        };
        let Some(Reverse((d, node))) = this.queue.pop() else { break };
        if this.settled[node.index()] || other.settled[node.index()] {
            continue;
        }
        this.settled[node.index()] = true;

        for (next, cost) in graph.arcs(node) {
            let candidate = d.saturating_add(cost);
            if this.relax(next, candidate) && other.dist[next.index()] != Cost::MAX {
                best = best.min(candidate.saturating_add(other.dist[next.index()]));
            }
        }
    }

    let relaxed_edges = forward.relaxed + backward.relaxed;
    if best == Cost::MAX {
        QueryResult::unreachable(relaxed_edges)
    } else {
        QueryResult { distance: Some(best), relaxed_edges }
    }
}

/// Least total cost from `source` to `target` by plain Dijkstra, stopping once `target` is settled.
#[must_use]
pub fn dijkstra(graph: &Graph, source: VertexId, target: VertexId) -> QueryResult {
    if source == target {
        return QueryResult { distance: Some(0), relaxed_edges: 0 };
    }
    let (Some(s), Some(t)) = (graph.node(source), graph.node(target)) else {
        debug!(source, target, "Query endpoint is not a vertex");
        return QueryResult::unreachable(0);
    };

    let mut frontier = Frontier::new(graph.node_bound(), s);
    while let Some(Reverse((d, node))) = frontier.queue.pop() {
        if frontier.settled[node.index()] {
            continue;
        }
        if node == t {
            return QueryResult { distance: Some(d), relaxed_edges: frontier.relaxed };
        }
        frontier.settled[node.index()] = true;
        for (next, cost) in graph.arcs(node) {
            frontier.relax(next, d.saturating_add(cost));
        }
    }
    QueryResult::unreachable(frontier.relaxed)
}
