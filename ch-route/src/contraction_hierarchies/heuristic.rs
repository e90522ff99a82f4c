use petgraph::stable_graph::NodeIndex;

use crate::graph::Graph;

/// Contraction desirability score; lower scores are contracted first.
pub type Priority = i64;

/// Local topology of a vertex relative to the contraction done so far.
///
/// Both counts come from a single pass over the vertex's outgoing arcs, so estimating a priority
/// is `O(degree)` and never looks past the immediate neighbourhood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighborhood {
    /// Outgoing arcs whose target is still pending.
    pub active_edges: usize,
    /// Outgoing arcs whose target has already been contracted.
    pub contracted_neighbors: usize,
}

impl Neighborhood {
    /// Inspect the outgoing arcs of `node`. `contracted` is indexed by arena slot.
    pub(crate) fn of(graph: &Graph, node: NodeIndex, contracted: &[bool]) -> Self {
        graph.arcs(node).fold(Self::default(), |mut acc, (target, _)| {
            if contracted[target.index()] {
                acc.contracted_neighbors += 1;
            } else {
                acc.active_edges += 1;
            }
            acc
        })
    }

    /// Static proxy for the net shortcut cost of contracting the vertex.
    ///
    /// This is not an exact "shortcuts added minus edges removed" count; it only grows with the
    /// size of the neighbourhood.
    #[must_use]
    pub const fn edge_difference(self) -> usize {
        self.active_edges + self.contracted_neighbors
    }

    /// Neighbours already contracted.
    #[must_use]
    pub const fn deleted_neighbors(self) -> usize {
        self.contracted_neighbors
    }

    /// `edge_difference + weight * deleted_neighbors`, truncated toward zero.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation
    )] // vertex degrees are far below 2^52, and truncation is the intended rounding
    pub fn priority(self, deleted_neighbor_weight: f64) -> Priority {
        deleted_neighbor_weight.mul_add(self.deleted_neighbors() as f64, self.edge_difference() as f64) as Priority
    }
}
