#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    clippy::missing_docs_in_private_items,
)]

//! # ch-core – shared plumbing for the contraction hierarchy tools
//!
//! Holds the pieces every other crate in the workspace leans on: the primitive id and cost types,
//! the typed [`GraphError`](errors::GraphError), and the crate-standard `tracing` subscriber setup
//! in [`logging`].

pub mod errors;
pub mod logging;

pub use errors::GraphError;

/// Identifier of a vertex as it appears in graph files and query requests.
pub type VertexId = u64;

/// Non-negative arc cost, and by extension path distance.
pub type Cost = u64;
