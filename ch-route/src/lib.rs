#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    clippy::missing_docs_in_private_items,
)]

//! # ch-route – Contraction hierarchy preprocessing and shortest-distance queries
//!
//! ch-route answers point-to-point shortest-distance queries on static, non-negatively weighted
//! directed graphs. It contracts the graph into a hierarchy once and then answers queries with a
//! bidirectional search that examines far fewer edges than a plain search.
//!
//! ## Pipeline overview
//! 1. Loading ([`io::read_graph`]) – Parse a text graph into a [`Graph`].
//! 2. Preprocessing ([`Contractor`]) – Contract vertices in priority order, appending shortcut
//!    arcs to the graph and recording the contraction order.
//! 3. Assembly ([`AugmentedGraph::build`]) – Combine the original edges with every shortcut in both
//!    directions into a read-only query graph, which can be exported and read back
//!    ([`io::read_augmented`]).
//! 4. Querying ([`search::bidirectional_search`]) – Meet-in-the-middle search over either graph;
//!    [`search::dijkstra`] is the unidirectional baseline.
//! 5. Benchmarking ([`bench::Benchmark`]) – Compare the three on reproducible random pairs.
//!
//! Preprocessing and assembly are annotated with [`tracing`] spans so that callers can observe
//! progress and timing.

pub mod bench;
pub mod contraction_hierarchies;
pub mod graph;
pub mod io;
pub mod search;

pub use contraction_hierarchies::{
    preprocess,
    AugmentedGraph,
    ContractionConfig,
    ContractionResult,
    Contractor,
    EdgeFilter,
    Shortcut,
};
pub use graph::{
    Coordinates,
    Edge,
    Graph,
    Vertex,
};
pub use search::QueryResult;
