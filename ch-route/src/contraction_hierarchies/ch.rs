use std::cmp::Reverse;
use std::collections::{
    BTreeMap,
    BinaryHeap,
    HashSet,
};

use ch_core::{
    Cost,
    GraphError,
    VertexId,
};
use itertools::Itertools;
use petgraph::stable_graph::NodeIndex;
use tracing::{
    debug,
    info,
    instrument,
};

use super::heuristic::{
    Neighborhood,
    Priority,
};
use crate::graph::Graph;

/// Tuning knobs for a preprocessing pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContractionConfig {
    /// Number of contractions between two lazy reprioritization passes over the dirty vertices.
    pub batch_size: usize,
    /// Weight of the deleted-neighbour term in [`Neighborhood::priority`].
    pub deleted_neighbor_weight: f64,
}

impl Default for ContractionConfig {
    fn default() -> Self {
        Self { batch_size: 50, deleted_neighbor_weight: 0.75 }
    }
}

/// A synthetic arc summarizing the two-hop path `from -> via -> to` through a contracted vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Shortcut {
    /// Tail of the shortcut.
    pub from: VertexId,
    /// Head of the shortcut.
    pub to: VertexId,
    /// Sum of the two arc costs it replaces.
    pub cost: Cost,
    /// The contracted vertex that produced it.
    pub via: VertexId,
}

/// Outcome of a preprocessing pass: the elimination order and the shortcuts it produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractionResult {
    /// Vertices in the order they were contracted.
    order: Vec<VertexId>,
    /// 1-based contraction rank per contracted vertex.
    ranks: BTreeMap<VertexId, usize>,
    /// Every shortcut inserted, in insertion order.
    shortcuts: Vec<Shortcut>,
}

impl ContractionResult {
    /// Vertices in contraction order.
    #[must_use]
    pub fn order(&self) -> &[VertexId] {
        &self.order
    }

    /// 1-based rank of `id`, or `None` if it was never contracted.
    #[must_use]
    pub fn rank(&self, id: VertexId) -> Option<usize> {
        self.ranks.get(&id).copied()
    }

    /// Rank per contracted vertex.
    #[must_use]
    pub const fn ranks(&self) -> &BTreeMap<VertexId, usize> {
        &self.ranks
    }

    /// Whether `id` was contracted during the pass.
    #[must_use]
    pub fn is_contracted(&self, id: VertexId) -> bool {
        self.ranks.contains_key(&id)
    }

    /// Number of vertices contracted.
    #[must_use]
    pub fn contracted_count(&self) -> usize {
        self.order.len()
    }

    /// Shortcuts in insertion order.
    #[must_use]
    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Total number of shortcuts inserted.
    #[must_use]
    pub fn shortcut_count(&self) -> usize {
        self.shortcuts.len()
    }
}

/// A candidate in the contraction queue.
///
/// Field order matters: the derived `Ord` compares priority first and breaks ties by vertex id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    /// Priority at the time the entry was pushed.
    priority: Priority,
    /// External id, for deterministic tie-breaking.
    id: VertexId,
    /// Arena slot of the vertex.
    node: NodeIndex,
    /// Stamp of the vertex when the entry was pushed; a mismatch marks the entry stale.
    generation: u32,
}

/// Bookkeeping for one preprocessing pass. Side tables are indexed by arena slot.
#[derive(Debug)]
struct ContractionState {
    /// Whether each slot has been contracted.
    contracted: Vec<bool>,
    /// Current queue stamp per slot.
    generation: Vec<u32>,
    /// Slots in contraction order.
    order: Vec<NodeIndex>,
    /// Shortcuts inserted so far.
    shortcuts: Vec<Shortcut>,
    /// Unordered slot pairs that already received a shortcut.
    used_pairs: HashSet<(NodeIndex, NodeIndex)>,
    /// Pending vertices whose neighbourhood changed since their priority was last computed.
    dirty: HashSet<NodeIndex>,
}

impl ContractionState {
    /// Empty state sized for `bound` arena slots.
    fn new(bound: usize) -> Self {
        Self {
            contracted: vec![false; bound],
            generation: vec![0; bound],
            order: Vec::new(),
            shortcuts: Vec::new(),
            used_pairs: HashSet::new(),
            dirty: HashSet::new(),
        }
    }

    /// Whether a popped entry still describes its vertex.
    fn is_current(&self, entry: &QueueEntry) -> bool {
        let slot = entry.node.index();
        !self.contracted[slot] && self.generation[slot] == entry.generation
    }
}

/// The preprocessing engine.
///
/// Repeatedly contracts the pending vertex with the lowest [`Priority`], inserting shortcuts
/// between its pending neighbours, and reprioritizes the affected neighbours lazily in batches.
/// The graph is borrowed mutably for the whole pass: shortcuts are appended to it in place.
///
/// Shortcuts are inserted without a witness search. A candidate `u -> w` is skipped only when the
/// unordered pair `{u, w}` already has a shortcut from this pass or an arc `u -> w` at most as
/// expensive already exists, so the pass may produce more shortcuts than strictly necessary.
pub struct Contractor<'g> {
    /// The graph being contracted.
    graph: &'g mut Graph,
    /// Tuning knobs.
    config: ContractionConfig,
    /// Pass-local bookkeeping.
    state: ContractionState,
}

impl<'g> Contractor<'g> {
    /// Prepare a pass over `graph` with the default configuration.
    pub fn new(graph: &'g mut Graph) -> Self {
        Self::with_config(graph, ContractionConfig::default())
    }

    /// Prepare a pass over `graph`.
    pub fn with_config(graph: &'g mut Graph, config: ContractionConfig) -> Self {
        let state = ContractionState::new(graph.node_bound());
        Self { graph, config, state }
    }

    /// Current contraction priority of `id`, or `None` if the vertex does not exist.
    #[must_use]
    pub fn priority(&self, id: VertexId) -> Option<Priority> {
        let node = self.graph.node(id)?;
        Some(self.priority_of(node))
    }

    /// Whether `id` has been contracted in this pass.
    #[must_use]
    pub fn is_contracted(&self, id: VertexId) -> bool {
        self.graph.node(id).is_some_and(|node| self.state.contracted[node.index()])
    }

    /// Shortcuts inserted so far.
    #[must_use]
    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.state.shortcuts
    }

    /// Insert the shortcuts that bypass `id`, returning how many were added.
    ///
    /// This does not mark `id` as contracted; [`Contractor::preprocess`] does that before calling
    /// into the same routine.
    ///
    /// # Errors
    ///
    /// [`GraphError::NoSuchVertex`] if `id` is not in the graph.
    pub fn contract_vertex(&mut self, id: VertexId) -> Result<usize, GraphError> {
        let node = self.graph.node(id).ok_or(GraphError::NoSuchVertex(id))?;
        Ok(self.contract(node))
    }

    /// Contract every vertex and return the resulting hierarchy.
    #[must_use]
    pub fn preprocess(self) -> ContractionResult {
        self.preprocess_with_progress(|_| ())
    }

    /// Same as [`Contractor::preprocess`], calling `progress_callback` with the number of
    /// contractions performed after each one.
    #[instrument(
        skip(self, progress_callback),
        fields(vertices = self.graph.vertex_count(), edges = self.graph.edge_count())
    )]
    pub fn preprocess_with_progress<F>(mut self, mut progress_callback: F) -> ContractionResult
    where
        F: FnMut(usize),
    {
        let total = self.graph.vertex_count();
        info!(total, "Preprocessing started");

        let mut queue: BinaryHeap<Reverse<QueueEntry>> =
            self.graph.nodes().map(|node| Reverse(self.entry(node))).collect();
        let mut since_update = 0;

        while self.state.order.len() < total {
            let Some(Reverse(entry)) = queue.pop() else { break };
            if !self.state.is_current(&entry) {
                continue;
            }

            let node = entry.node;
            self.state.contracted[node.index()] = true;
            self.state.order.push(node);
            self.contract(node);

            let pending: Vec<NodeIndex> = self
                .graph
                .arcs(node)
                .map(|(target, _)| target)
                .filter(|target| !self.state.contracted[target.index()])
                .collect();
            self.state.dirty.extend(pending);

            progress_callback(self.state.order.len());

            since_update += 1;
            if since_update >= self.config.batch_size {
                self.reprioritize(&mut queue);
                since_update = 0;
            }
        }

        info!(
            contracted = self.state.order.len(),
            shortcuts = self.state.shortcuts.len(),
            "Preprocessing complete"
        );
        self.into_result()
    }

    /// Priority of a slot under the current contraction state.
    fn priority_of(&self, node: NodeIndex) -> Priority {
        Neighborhood::of(&*self.graph, node, &self.state.contracted).priority(self.config.deleted_neighbor_weight)
    }

    /// A fresh queue entry for `node` carrying its current stamp.
    fn entry(&self, node: NodeIndex) -> QueueEntry {
        QueueEntry {
            priority: self.priority_of(node),
            id: self.graph.id_of(node),
            node,
            generation: self.state.generation[node.index()],
        }
    }

    /// Recompute the priority of every pending dirty vertex and requeue it under a new stamp,
    /// which turns its previous entries stale.
    fn reprioritize(&mut self, queue: &mut BinaryHeap<Reverse<QueueEntry>>) {
        let dirty = std::mem::take(&mut self.state.dirty);
        let mut requeued = 0_usize;
        for node in dirty {
            if self.state.contracted[node.index()] {
                continue;
            }
            self.state.generation[node.index()] += 1;
            queue.push(Reverse(self.entry(node)));
            requeued += 1;
        }
        debug!(requeued, contracted = self.state.order.len(), "Reprioritized dirty vertices");
    }

    /// Insert shortcuts between every ordered pair of pending neighbours of `node`.
    fn contract(&mut self, node: NodeIndex) -> usize {
        let via = self.graph.id_of(node);

        // Cheapest arc per pending neighbour; parallel arcs collapse to their minimum.
        let mut neighbors: BTreeMap<NodeIndex, Cost> = BTreeMap::new();
        for (target, cost) in self.graph.arcs(node) {
            if target == node || self.state.contracted[target.index()] {
                continue;
            }
            neighbors.entry(target).and_modify(|c| *c = (*c).min(cost)).or_insert(cost);
        }

        let mut added = 0;
        for ((&u, &cost_u), (&w, &cost_w)) in neighbors.iter().cartesian_product(neighbors.iter()) {
            if u == w {
                continue;
            }
            let pair = if u < w { (u, w) } else { (w, u) };
            if self.state.used_pairs.contains(&pair) {
                continue;
            }

            let cost = cost_u.saturating_add(cost_w);
            if self.graph.arc_cost(u, w).is_some_and(|existing| existing <= cost) {
                continue;
            }

            let shortcut = Shortcut { from: self.graph.id_of(u), to: self.graph.id_of(w), cost, via };
            debug!(from = shortcut.from, to = shortcut.to, cost, via, "Adding shortcut");
            self.graph.add_arc(u, w, cost, Some(via));
            self.state.used_pairs.insert(pair);
            self.state.shortcuts.push(shortcut);
            added += 1;
        }
        added
    }

    /// Translate the slot-level state into the id-level result.
    fn into_result(self) -> ContractionResult {
        let order: Vec<VertexId> = self.state.order.iter().map(|&node| self.graph.id_of(node)).collect();
        let ranks = order.iter().enumerate().map(|(i, &id)| (id, i + 1)).collect();
        ContractionResult { order, ranks, shortcuts: self.state.shortcuts }
    }
}

/// Contract every vertex of `graph` with the default configuration.
///
/// Shortcuts are appended to `graph` in place; the returned result describes the hierarchy.
#[must_use]
pub fn preprocess(graph: &mut Graph) -> ContractionResult {
    Contractor::new(graph).preprocess()
}
