//! Vertex/edge storage with adjacency lookup.
//!
//! The store is an index-addressed arena: vertices live in a [`StableDiGraph`] and are referenced
//! by [`NodeIndex`] everywhere inside the crate, while callers address them by their external
//! [`VertexId`]. A `BTreeMap` translates between the two and keeps iteration in id order, which
//! makes contraction and export deterministic.

use std::collections::BTreeMap;

use ch_core::{
    Cost,
    GraphError,
    VertexId,
};
use petgraph::stable_graph::{
    NodeIndex,
    StableDiGraph,
};
use petgraph::visit::{
    EdgeRef,
    IntoEdgeReferences,
    NodeIndexable,
};
use tracing::debug;

/// Positional attributes of a vertex. Carried through untouched; no algorithm reads them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coordinates {
    /// Longitude as read from the graph file.
    pub longitude: f64,
    /// Latitude as read from the graph file.
    pub latitude: f64,
}

/// A stored vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    /// External id.
    pub id: VertexId,
    /// Opaque position.
    pub coordinates: Coordinates,
}

/// Payload of a stored arc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Arc {
    /// Traversal cost.
    pub(crate) cost: Cost,
    /// The contracted vertex a shortcut summarizes; `None` for edges of the input graph.
    pub(crate) via: Option<VertexId>,
}

/// A directed edge as seen from outside the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    /// Source vertex.
    pub from: VertexId,
    /// Target vertex.
    pub to: VertexId,
    /// Traversal cost.
    pub cost: Cost,
    /// For shortcuts, the contracted vertex the arc bypasses.
    pub via: Option<VertexId>,
}

impl Edge {
    /// Whether this edge was inserted by contraction rather than loaded from the input.
    #[must_use]
    pub const fn is_shortcut(&self) -> bool {
        self.via.is_some()
    }
}

/// Directed multigraph with non-negative integer costs.
///
/// Parallel arcs between the same ordered pair are kept as-is; lookups that need a single cost
/// take the cheapest one.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    /// Arena holding vertices and arcs.
    inner: StableDiGraph<Vertex, Arc>,
    /// External id to arena slot.
    index: BTreeMap<VertexId, NodeIndex>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex, or overwrite the attributes of an existing one (its edges are kept).
    pub fn add_vertex(&mut self, id: VertexId, coordinates: Coordinates) {
        if let Some(&node) = self.index.get(&id) {
            self.inner[node].coordinates = coordinates;
            return;
        }
        let node = self.inner.add_node(Vertex { id, coordinates });
        self.index.insert(id, node);
    }

    /// Append a directed edge `from -> to`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if either endpoint has not been added.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, cost: Cost) -> Result<(), GraphError> {
        self.add_tagged_edge(from, to, cost, None)
    }

    /// Whether at least one arc `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.edge_cost(from, to).is_some()
    }

    /// Cheapest cost among the arcs `from -> to`, or `None` when there is no such arc.
    #[must_use]
    pub fn edge_cost(&self, from: VertexId, to: VertexId) -> Option<Cost> {
        let (a, b) = self.endpoints(from, to).ok()?;
        self.arc_cost(a, b)
    }

    /// Delete a vertex together with every edge that starts or ends at it.
    ///
    /// Returns the removed vertex, or `None` if it did not exist.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<Vertex> {
        let node = self.index.remove(&id)?;
        let removed = self.inner.remove_node(node);
        debug!(id, "removed vertex and its incident edges");
        removed
    }

    /// Look up a vertex by id.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.index.get(&id).map(|&node| &self.inner[node])
    }

    /// Whether `id` is stored.
    #[must_use]
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.index.contains_key(&id)
    }

    /// All vertices, ascending by id.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.index.values().map(|&node| &self.inner[node])
    }

    /// All vertex ids, ascending.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.index.keys().copied()
    }

    /// The flat edge list, shortcuts included.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.inner.edge_references().map(|e| Edge {
            from: self.inner[e.source()].id,
            to: self.inner[e.target()].id,
            cost: e.weight().cost,
            via: e.weight().via,
        })
    }

    /// Outgoing edges of `id`, or `None` if the vertex does not exist.
    pub fn outgoing(&self, id: VertexId) -> Option<impl Iterator<Item = Edge> + '_> {
        let &node = self.index.get(&id)?;
        Some(self.inner.edges(node).map(move |e| Edge {
            from: id,
            to: self.inner[e.target()].id,
            cost: e.weight().cost,
            via: e.weight().via,
        }))
    }

    /// Number of stored vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of stored arcs, shortcuts included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Whether the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // Index-level access used by contraction and search.

    /// Arena slot of `id`.
    pub(crate) fn node(&self, id: VertexId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    /// External id of an arena slot.
    pub(crate) fn id_of(&self, node: NodeIndex) -> VertexId {
        self.inner[node].id
    }

    /// Slots in ascending id order.
    pub(crate) fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.index.values().copied()
    }

    /// Exclusive upper bound on slot indices, for sizing index-addressed side tables.
    pub(crate) fn node_bound(&self) -> usize {
        NodeIndexable::node_bound(&self.inner)
    }

    /// `(target, cost)` of every outgoing arc of `node`.
    pub(crate) fn arcs(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, Cost)> + '_ {
        self.inner.edges(node).map(|e| (e.target(), e.weight().cost))
    }

    /// Cheapest arc cost `a -> b`.
    pub(crate) fn arc_cost(&self, a: NodeIndex, b: NodeIndex) -> Option<Cost> {
        self.inner.edges(a).filter(|e| e.target() == b).map(|e| e.weight().cost).min()
    }

    /// [`Graph::add_edge`], optionally marking the edge as a shortcut through `via`.
    pub(crate) fn add_tagged_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        cost: Cost,
        via: Option<VertexId>,
    ) -> Result<(), GraphError> {
        let (a, b) = self.endpoints(from, to)?;
        self.add_arc(a, b, cost, via);
        Ok(())
    }

    /// Append an arc between slots that are known to exist.
    pub(crate) fn add_arc(&mut self, a: NodeIndex, b: NodeIndex, cost: Cost, via: Option<VertexId>) {
        self.inner.add_edge(a, b, Arc { cost, via });
    }

    /// Resolve both endpoints of a prospective edge.
    fn endpoints(&self, from: VertexId, to: VertexId) -> Result<(NodeIndex, NodeIndex), GraphError> {
        let a = self.node(from).ok_or(GraphError::UnknownVertex { from, to, missing: from })?;
        let b = self.node(to).ok_or(GraphError::UnknownVertex { from, to, missing: to })?;
        Ok((a, b))
    }
}
