//! Contraction Hierarchies speed up shortest-distance queries on weighted directed graphs,
//! conventionally road networks.
//!
//! Contraction Hierarchies have two stages:
//! 1. Preprocessing:
//!     * Repeatedly pick the pending vertex with the lowest priority (see [`Neighborhood`]) and
//!       contract it, adding a shortcut between every pair of its pending neighbours so that the
//!       distances the vertex used to carry are preserved.
//!     * Neighbours of a contracted vertex are marked dirty and reprioritized lazily in batches;
//!       queue entries made obsolete by a reprioritization are discarded when popped.
//! 2. Querying:
//!     * Build the [`AugmentedGraph`]: the original edges plus every shortcut in both directions.
//!     * Run a bidirectional search over it (see [`crate::search`]).
//!
//! No witness search is performed before a shortcut is inserted, so the hierarchy can carry more
//! shortcuts than strictly necessary.

/// Assembly and export of the post-contraction query graph
mod augmented;
/// Core preprocessing loop and vertex contraction
mod ch;
/// Local priority estimate driving the contraction order
mod heuristic;

pub use augmented::{
    AugmentedGraph,
    EdgeFilter,
};
pub use ch::{
    preprocess,
    ContractionConfig,
    ContractionResult,
    Contractor,
    Shortcut,
};
pub use heuristic::{
    Neighborhood,
    Priority,
};
