use std::fmt::{Display, Formatter};
use std::hash::Hash;

use strum::{Display as StrumDisplay, EnumString, VariantArray};
use varisat::Var;

use crate::adjacency::Adjacency;
use crate::model::Model;
use crate::order::{NodeOrder, RootHandles};
use crate::parent::ParentPointer;
use crate::percolation::Percolation;

/// Anything usable as a graph vertex: a grid cell, a grid edge, or any other cheap hashable key.
pub trait Node: Copy + Eq + Hash {}

impl<T> Node for T where T: Copy + Eq + Hash {}

/// Contract violations detected while building constraints.
///
/// Every check runs before the first clause is added, so a failed call leaves the [`Model`] untouched.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncodeError {
    /// A node order must contain at least one node.
    EmptyOrder,
    /// The same node appears twice in a node order; the position at which it reappears is given.
    DuplicateNode { position: usize },
    /// The membership slice does not line up with the node order.
    MembershipMismatch { nodes: usize, membership: usize },
    /// The adjacency relation refers to a node that the order omits.
    NodeMissingFromOrder,
    /// Regions compared against one another were built over node orders of different lengths.
    RegionLengthMismatch { expected: usize, found: usize },
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOrder => write!(f, "node order is empty"),
            Self::DuplicateNode { position } => write!(f, "node at position {position} already appears earlier in the order"),
            Self::MembershipMismatch { nodes, membership } =>
                write!(f, "{membership} membership variables given for {nodes} nodes"),
            Self::NodeMissingFromOrder => write!(f, "adjacency refers to a node missing from the order"),
            Self::RegionLengthMismatch { expected, found } =>
                write!(f, "region has {found} root indicators, expected {expected}"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// A strategy for forcing the active nodes of a graph into a single connected component.
///
/// Implementors add variables and clauses to `model` and return the root indicators, which are always the output of [`select_root`](crate::order::select_root).
/// In every satisfying assignment, `{n : membership[n]}` is non-empty, connected under `adjacency`, and contains the root.
pub trait ConnectivityEncoder<N: Node> {
    fn encode<A: Adjacency<N>>(
        &self,
        model: &mut Model,
        order: &NodeOrder<N>,
        membership: &[Var],
        adjacency: &A,
    ) -> Result<RootHandles, EncodeError>;
}

/// Selects a [`ConnectivityEncoder`] at runtime, e.g. from a configuration string such as `"percolation"`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, StrumDisplay, EnumString, VariantArray)]
#[strum(serialize_all = "kebab-case")]
pub enum Encoding {
    /// [`ParentPointer`]: a spanning tree of parent edges. Cheaper; the default for a single check.
    #[default]
    ParentPointer,
    /// [`Percolation`]: layered flood fill. Costlier but every check is self-contained.
    Percolation,
}

impl<N: Node> ConnectivityEncoder<N> for Encoding {
    fn encode<A: Adjacency<N>>(
        &self,
        model: &mut Model,
        order: &NodeOrder<N>,
        membership: &[Var],
        adjacency: &A,
    ) -> Result<RootHandles, EncodeError> {
        match self {
            Self::ParentPointer => ParentPointer.encode(model, order, membership, adjacency),
            Self::Percolation => Percolation::default().encode(model, order, membership, adjacency),
        }
    }
}
