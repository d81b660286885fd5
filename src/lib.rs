#![warn(missing_docs)]

//! # `isthmus`
//!
//! Connectivity constraints for grid logic puzzles solved through Boolean satisfiability.
//! Region-drawing, loop, island and path puzzles all share one rule which is awkward to state to a SAT solver: the marked cells (or edges) form a single connected piece.
//! This crate turns that rule into a fixed set of clauses over the membership variables a puzzle encoder already owns.
//!
//! Start with a [`Model`], create one membership variable per node (for grids, see [`Grid::membership`]), fix a [`NodeOrder`], and hand all of it to a [`ConnectivityEncoder`].
//! The encoder adds its own variables and clauses to the same model and returns the [`RootHandles`] of the region.
//! Solve with [`ModelSolver`], or with any other SAT solver fed [`Model::formula`].
//!
//! # Internals
//! The solver never runs a graph search; it only sees clauses built once, before solving.
//! Both encoders anchor the region at a root chosen deterministically from the assignment: the earliest active node in the [`NodeOrder`].
//! That root is described by a prefix chain of "nothing active so far" variables, see [`select_root`].
//!
//! From the root, two strategies are available:
//! 1. [`ParentPointer`]: every active node other than the root picks an active neighbor as its parent, and ranks strictly decrease along parent edges.
//! Following parents from any active node must then end at the root.
//! This is the cheaper encoding and the default.
//! 2. [`Percolation`]: a flood fill from the root unrolled into layers, each layer reaching the active neighbors of the last.
//! Every active node must be reached by the last layer.
//! Its auxiliary variables are a function of the membership variables, which makes it easy to stack many independent checks in one model.
//!
//! When several interchangeable regions are carved from one board, [`order_roots`] orders them by root position so every partition is found only once.
//! [`PartitionBuilder`] puts all of this together for Palisade-style grid partitions.

pub use adjacency::{Adjacency, GridAdjacency, SharedEndpoint};
pub use builder::{PartitionBuilder, PartitionInvalidReason};
pub use connectivity::{ConnectivityEncoder, EncodeError, Encoding, Node};
pub use grid::Grid;
pub use location::{Dimension, Location};
pub use model::Model;
pub use order::{select_root, NodeOrder, RootHandles};
pub use parent::{ParentPointer, SpanningTree};
pub use partition::{Partition, SolvedPartition};
pub use percolation::{Percolation, ReachLayers};
pub use solver::{Assignment, ModelSolver, SolveStatus, Solutions, SolverFailure};
pub use symmetry::order_roots;

mod tests;
pub mod adjacency;
pub mod builder;
pub mod connectivity;
pub mod grid;
pub(crate) mod location;
pub mod logic;
pub mod model;
pub mod order;
pub mod parent;
pub mod partition;
pub mod percolation;
pub mod shape;
pub mod solver;
pub mod symmetry;
