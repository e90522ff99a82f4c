use std::collections::BTreeMap;
use std::fs::File;
use std::io::{
    BufWriter,
    Write,
};
use std::path::Path;

use ch_core::{
    GraphError,
    VertexId,
};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{
    error,
    info,
    instrument,
};

use super::ch::{
    ContractionResult,
    Shortcut,
};
use crate::graph::{
    Coordinates,
    Edge,
    Graph,
};
use crate::search::{
    bidirectional_search,
    QueryResult,
};

/// Which original edges survive into the augmented graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeFilter {
    /// Keep every original edge.
    #[default]
    KeepAll,
    /// Keep an original edge only when its target was never contracted. After a complete pass this
    /// drops every original edge and leaves only the shortcuts.
    UncontractedTargets,
}

impl EdgeFilter {
    /// Whether `edge` survives, given the contraction outcome.
    fn keeps(self, edge: &Edge, result: &ContractionResult) -> bool {
        match self {
            Self::KeepAll => true,
            Self::UncontractedTargets => !result.is_contracted(edge.to),
        }
    }
}

/// The read-only query graph assembled after preprocessing: surviving original edges plus every
/// shortcut in both directions, over the same vertex set as the source graph.
#[derive(Clone, Debug)]
pub struct AugmentedGraph {
    /// Arcs the search runs over.
    graph: Graph,
    /// 1-based contraction rank per contracted vertex.
    ranks: BTreeMap<VertexId, usize>,
    /// Original edges that survived the filter, in store order.
    original_edges: Vec<Edge>,
    /// Shortcuts as discovered, one direction each.
    shortcuts: Vec<Shortcut>,
}

impl AugmentedGraph {
    /// Build from a contracted graph with the default [`EdgeFilter`].
    ///
    /// The default keeps every original edge instead of only those whose target was never
    /// contracted. A full pass contracts every vertex, so the target-keyed rule would drop all
    /// originals and leave only shortcuts; [`EdgeFilter::UncontractedTargets`] selects that rule.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if a shortcut references a vertex missing from `graph`.
    pub fn build(graph: &Graph, result: &ContractionResult) -> Result<Self, GraphError> {
        Self::build_with(graph, result, EdgeFilter::default())
    }

    /// Build from a contracted graph, choosing which original edges to keep.
    ///
    /// Shortcut arcs already present in `graph` are ignored; the shortcuts come from `result`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if a shortcut references a vertex missing from `graph`.
    #[instrument(skip_all, fields(vertices = graph.vertex_count(), shortcuts = result.shortcut_count(), filter = ?filter))]
    pub fn build_with(graph: &Graph, result: &ContractionResult, filter: EdgeFilter) -> Result<Self, GraphError> {
        let original_edges: Vec<Edge> =
            graph.edges().filter(|e| !e.is_shortcut() && filter.keeps(e, result)).collect();
        let augmented = Self::from_parts(
            graph.vertices().map(|v| (v.id, v.coordinates)),
            result.ranks().clone(),
            original_edges,
            result.shortcuts().to_vec(),
        )?;
        info!(arcs = augmented.graph.edge_count(), "Built augmented graph");
        Ok(augmented)
    }

    /// Assemble from already-separated parts; shared by the builder and the export parser.
    pub(crate) fn from_parts(
        vertices: impl IntoIterator<Item = (VertexId, Coordinates)>,
        ranks: BTreeMap<VertexId, usize>,
        original_edges: Vec<Edge>,
        shortcuts: Vec<Shortcut>,
    ) -> Result<Self, GraphError> {
        let mut graph = Graph::new();
        for (id, coordinates) in vertices {
            graph.add_vertex(id, coordinates);
        }
        for edge in &original_edges {
            graph.add_tagged_edge(edge.from, edge.to, edge.cost, None)?;
        }
        for s in &shortcuts {
            graph.add_tagged_edge(s.from, s.to, s.cost, Some(s.via))?;
            graph.add_tagged_edge(s.to, s.from, s.cost, Some(s.via))?;
        }
        Ok(Self { graph, ranks, original_edges, shortcuts })
    }

    /// The query graph.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// 1-based rank of `id`, or `None` if it was never contracted.
    #[must_use]
    pub fn rank(&self, id: VertexId) -> Option<usize> {
        self.ranks.get(&id).copied()
    }

    /// Surviving original edges.
    #[must_use]
    pub fn original_edges(&self) -> &[Edge] {
        &self.original_edges
    }

    /// Shortcuts, one direction each.
    #[must_use]
    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Bidirectional search over the query graph.
    #[must_use]
    pub fn query(&self, source: VertexId, target: VertexId) -> QueryResult {
        bidirectional_search(&self.graph, source, target)
    }

    /// Write the text layout: a `<vertices> <edges>` header, one `<id> <rank>` line per vertex
    /// (`-1` when never contracted), one `<from> <to> <cost> -1` line per original edge and one
    /// `<from> <to> <cost> <via>` line per shortcut.
    ///
    /// # Errors
    ///
    /// Propagates write failures as [`GraphError::Io`].
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<(), GraphError> {
        writeln!(out, "{} {}", self.graph.vertex_count(), self.original_edges.len() + self.shortcuts.len())?;
        for id in self.graph.vertex_ids() {
            match self.rank(id) {
                Some(rank) => writeln!(out, "{id} {rank}")?,
                None => writeln!(out, "{id} -1")?,
            }
        }
        for e in &self.original_edges {
            writeln!(out, "{} {} {} -1", e.from, e.to, e.cost)?;
        }
        for s in &self.shortcuts {
            writeln!(out, "{} {} {} {}", s.from, s.to, s.cost, s.via)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Export to `path`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Io`] if the file cannot be created or written.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn try_export(&self, path: &Path) -> Result<(), GraphError> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        info!(
            vertices = self.graph.vertex_count(),
            edges = self.original_edges.len() + self.shortcuts.len(),
            "Exported augmented graph"
        );
        Ok(())
    }

    /// Export to `path`, logging instead of failing. Returns whether the file was written.
    pub fn export(&self, path: &Path) -> bool {
        match self.try_export(path) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to export augmented graph to {}: {}", path.display(), e);
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::contraction_hierarchies::Contractor;

    /// The diamond `1 -> {2, 3} -> 4` after a full pass, alongside its uncontracted copy.
    #[fixture]
    fn contracted_diamond() -> (Graph, ContractionResult) {
        let mut graph = Graph::new();
        for id in 1..=4 {
            graph.add_vertex(id, Coordinates::default());
        }
        for (from, to, cost) in [(1, 2, 10), (1, 3, 20), (2, 4, 30), (3, 4, 40)] {
            graph.add_edge(from, to, cost).unwrap();
        }
        let mut plain = graph.clone();
        let result = Contractor::new(&mut plain).preprocess();
        (graph, result)
    }

    #[rstest]
    fn test_shortcuts_are_bidirectional() {
        // Undirected path 0 - 1 - 2 with two leaves on each end, so 1 goes right after the leaves.
        let mut graph = Graph::new();
        for id in 0..7 {
            graph.add_vertex(id, Coordinates::default());
        }
        for (a, b, cost) in [(0, 1, 4), (1, 2, 6), (0, 3, 1), (0, 4, 1), (2, 5, 1), (2, 6, 1)] {
            graph.add_edge(a, b, cost).unwrap();
            graph.add_edge(b, a, cost).unwrap();
        }
        let result = Contractor::new(&mut graph).preprocess();

        let augmented = AugmentedGraph::build(&graph, &result).unwrap();
        assert_eq!(augmented.shortcuts(), &[Shortcut { from: 0, to: 2, cost: 10, via: 1 }]);
        assert_eq!(augmented.graph().edge_cost(0, 2), Some(10));
        assert_eq!(augmented.graph().edge_cost(2, 0), Some(10));
        assert_eq!(augmented.original_edges().len(), 12);
        assert_eq!(augmented.graph().edge_count(), 14);
    }

    #[rstest]
    fn test_keep_all_keeps_originals(contracted_diamond: (Graph, ContractionResult)) {
        let (graph, result) = contracted_diamond;
        let augmented = AugmentedGraph::build(&graph, &result).unwrap();
        assert_eq!(augmented.original_edges().len(), 4);
        assert_eq!(augmented.graph().vertex_count(), 4);
        assert_eq!(augmented.rank(4), Some(1));
    }

    #[rstest]
    fn test_uncontracted_targets_drops_everything_after_full_pass(contracted_diamond: (Graph, ContractionResult)) {
        let (graph, result) = contracted_diamond;
        let augmented = AugmentedGraph::build_with(&graph, &result, EdgeFilter::UncontractedTargets).unwrap();
        assert!(augmented.original_edges().is_empty());
        assert_eq!(augmented.graph().vertex_count(), 4);
    }

    #[rstest]
    fn test_write_layout() {
        let augmented = AugmentedGraph::from_parts(
            [(7, Coordinates::default()), (8, Coordinates::default()), (9, Coordinates::default())],
            BTreeMap::from([(7, 1), (9, 2)]),
            vec![Edge { from: 7, to: 8, cost: 3, via: None }],
            vec![Shortcut { from: 8, to: 9, cost: 5, via: 7 }],
        )
        .unwrap();

        let mut buf = Vec::new();
        augmented.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "3 2\n7 1\n8 -1\n9 2\n7 8 3 -1\n8 9 5 7\n");
    }

    #[rstest]
    fn test_from_parts_rejects_unknown_shortcut_endpoint() {
        let err = AugmentedGraph::from_parts(
            [(1, Coordinates::default())],
            BTreeMap::new(),
            vec![],
            vec![Shortcut { from: 1, to: 2, cost: 1, via: 3 }],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::UnknownVertex { missing: 2, .. }));
    }

    #[rstest]
    fn test_export_to_missing_directory_degrades(contracted_diamond: (Graph, ContractionResult)) {
        let (graph, result) = contracted_diamond;
        let augmented = AugmentedGraph::build(&graph, &result).unwrap();
        let path = Path::new("/nonexistent-directory/for/augmented.txt");
        assert!(matches!(augmented.try_export(path), Err(GraphError::Io(_))));
        assert!(!augmented.export(path));
    }
}
