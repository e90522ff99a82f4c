use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;

use assertables::*;
use ch_core::{
    Cost,
    VertexId,
};
use ch_route::io::read_augmented;
use ch_route::search::{
    bidirectional_search,
    dijkstra,
};
use ch_route::{
    preprocess,
    AugmentedGraph,
    Contractor,
    Coordinates,
    EdgeFilter,
    Graph,
    QueryResult,
    Shortcut,
};
use rstest::*;

fn graph_from(vertices: impl IntoIterator<Item = VertexId>, edges: &[(VertexId, VertexId, Cost)]) -> Graph {
    let mut graph = Graph::new();
    for id in vertices {
        graph.add_vertex(id, Coordinates::default());
    }
    for &(from, to, cost) in edges {
        graph.add_edge(from, to, cost).unwrap();
    }
    graph
}

fn undirected(vertices: impl IntoIterator<Item = VertexId>, edges: &[(VertexId, VertexId, Cost)]) -> Graph {
    let both: Vec<_> = edges.iter().flat_map(|&(a, b, c)| [(a, b, c), (b, a, c)]).collect();
    graph_from(vertices, &both)
}

fn contract(plain: &Graph) -> AugmentedGraph {
    let mut contracted = plain.clone();
    let result = preprocess(&mut contracted);
    AugmentedGraph::build(&contracted, &result).unwrap()
}

#[fixture]
fn cycle() -> Graph {
    graph_from(1..=5, &[(1, 2, 10), (1, 3, 15), (2, 4, 20), (3, 4, 25), (4, 5, 30), (5, 1, 35)])
}

#[fixture]
fn diamond() -> Graph {
    graph_from(1..=4, &[(1, 2, 10), (1, 3, 20), (2, 4, 30), (3, 4, 40)])
}

#[rstest]
fn plain_and_contracted_agree_on_cycle(cycle: Graph) {
    assert_eq!(bidirectional_search(&cycle, 1, 4).distance, Some(30));
    assert_eq!(dijkstra(&cycle, 1, 4).distance, Some(30));
    assert_eq!(contract(&cycle).query(1, 4).distance, Some(30));
}

#[rstest]
fn literal_target_filter_loses_the_cycle_route(cycle: Graph) {
    let mut contracted = cycle.clone();
    let result = preprocess(&mut contracted);
    let augmented = AugmentedGraph::build_with(&contracted, &result, EdgeFilter::UncontractedTargets).unwrap();
    assert!(augmented.original_edges().is_empty());
    assert!(!augmented.query(1, 4).is_reachable());
}

#[rstest]
fn contracting_the_diamond_top_adds_one_shortcut(mut diamond: Graph) {
    let mut contractor = Contractor::new(&mut diamond);
    assert_eq!(contractor.contract_vertex(1).unwrap(), 1);
    assert_eq!(contractor.contract_vertex(1).unwrap(), 0);
    assert_eq!(contractor.shortcuts(), &[Shortcut { from: 2, to: 3, cost: 30, via: 1 }]);
}

#[rstest]
fn same_endpoint_on_both_graphs(cycle: Graph) {
    let expected = QueryResult { distance: Some(0), relaxed_edges: 0 };
    let augmented = contract(&cycle);
    for id in 1..=5 {
        assert_eq!(bidirectional_search(&cycle, id, id), expected);
        assert_eq!(augmented.query(id, id), expected);
    }
}

#[rstest]
fn separate_components_are_unreachable() {
    let plain = undirected(1..=6, &[(1, 2, 3), (2, 3, 4), (4, 5, 1), (5, 6, 2)]);
    let augmented = contract(&plain);
    for (s, t) in [(1, 6), (3, 4), (6, 2)] {
        assert!(!bidirectional_search(&plain, s, t).is_reachable());
        assert!(!augmented.query(s, t).is_reachable());
    }
    assert_eq!(augmented.query(1, 3).distance, Some(7));
}

#[rstest]
fn every_vertex_gets_a_rank(diamond: Graph) {
    let mut contracted = diamond.clone();
    let result = preprocess(&mut contracted);
    assert_eq!(result.contracted_count(), diamond.vertex_count());

    let mut ranks: Vec<usize> = diamond.vertex_ids().filter_map(|id| result.rank(id)).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
}

#[rstest]
fn empty_graph_contracts_to_nothing() {
    let mut graph = Graph::new();
    let result = preprocess(&mut graph);
    assert_eq!(result.contracted_count(), 0);
    assert_eq!(result.shortcut_count(), 0);
    assert!(AugmentedGraph::build(&graph, &result).unwrap().graph().is_empty());
}

#[rstest]
fn shortcut_pairs_are_unique() {
    let plain = undirected(0..8, &[(0, 1, 2), (1, 2, 2), (2, 3, 2), (3, 0, 2), (0, 4, 1), (1, 5, 1), (2, 6, 1), (3, 7, 1), (0, 2, 9)]);
    let mut contracted = plain.clone();
    let result = preprocess(&mut contracted);

    let mut pairs = HashSet::new();
    for s in result.shortcuts() {
        assert!(pairs.insert((s.from.min(s.to), s.from.max(s.to))), "duplicate shortcut for {s:?}");
    }
}

#[rstest]
fn export_then_reparse_round_trips() {
    let plain = undirected(0..7, &[(0, 1, 4), (1, 2, 6), (0, 3, 1), (0, 4, 1), (2, 5, 1), (2, 6, 1)]);
    let augmented = contract(&plain);
    assert_gt!(augmented.shortcuts().len(), 0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("augmented.txt");
    assert!(augmented.export(&path));

    let reparsed = read_augmented(BufReader::new(File::open(&path).unwrap())).unwrap();
    for id in plain.vertex_ids() {
        assert_eq!(reparsed.rank(id), augmented.rank(id));
    }
    assert_eq!(reparsed.original_edges(), augmented.original_edges());
    assert_eq!(reparsed.shortcuts(), augmented.shortcuts());

    let mut expected: Vec<_> = augmented.graph().edges().collect();
    let mut actual: Vec<_> = reparsed.graph().edges().collect();
    expected.sort_unstable();
    actual.sort_unstable();
    assert_eq!(actual, expected);

    for s in plain.vertex_ids() {
        for t in plain.vertex_ids() {
            assert_eq!(reparsed.query(s, t).distance, augmented.query(s, t).distance);
        }
    }
}

#[rstest]
fn failed_export_is_logged_not_fatal(diamond: Graph) {
    let augmented = contract(&diamond);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("augmented.txt");
    assert!(!augmented.export(&path));
    assert!(!path.exists());
}
