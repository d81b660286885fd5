use petgraph::graphmap::{NodeTrait, UnGraphMap};
use unordered_pair::UnorderedPair;

use crate::connectivity::Node;
use crate::location::Location;
use crate::order::NodeOrder;

/// A symmetric, irreflexive neighbor relation over nodes of type `N`.
///
/// Symmetry is a caller obligation: the connectivity proof of every encoder relies on it.
/// Encoders check it with [`check_symmetric`] in debug builds.
pub trait Adjacency<N: Node> {
    fn is_neighbor(&self, a: &N, b: &N) -> bool;

    /// Every node this relation knows about, if it knows its node set at all.
    /// Encoders use this to reject node orders which omit part of the graph.
    fn referenced_nodes(&self) -> Option<Vec<N>> {
        None
    }
}

impl<N, F> Adjacency<N> for F
where
    N: Node,
    F: Fn(&N, &N) -> bool,
{
    fn is_neighbor(&self, a: &N, b: &N) -> bool {
        self(a, b)
    }
}

impl<N, E> Adjacency<N> for UnGraphMap<N, E>
where
    N: NodeTrait,
{
    fn is_neighbor(&self, a: &N, b: &N) -> bool {
        a != b && self.contains_edge(*a, *b)
    }

    fn referenced_nodes(&self) -> Option<Vec<N>> {
        Some(self.nodes().collect())
    }
}

/// 4-neighbor adjacency between grid cells, the relation nearly every region puzzle uses.
#[derive(Copy, Clone, Debug, Default)]
pub struct GridAdjacency;

impl Adjacency<Location> for GridAdjacency {
    fn is_neighbor(&self, a: &Location, b: &Location) -> bool {
        a.manhattan(b) == 1
    }
}

/// Adjacency between grid edges: two distinct edges are neighbors when they share an endpoint.
///
/// Loop and path puzzles mark edges rather than cells; connecting the marked edges under this relation forces a single loop or path.
#[derive(Copy, Clone, Debug, Default)]
pub struct SharedEndpoint;

impl Adjacency<UnorderedPair<Location>> for SharedEndpoint {
    fn is_neighbor(&self, a: &UnorderedPair<Location>, b: &UnorderedPair<Location>) -> bool {
        a != b && [a.0, a.1].iter().any(|end| *end == b.0 || *end == b.1)
    }
}

/// Find a pair in `order` on which `adjacency` disagrees with itself, if any.
pub fn check_symmetric<N: Node, A: Adjacency<N>>(order: &NodeOrder<N>, adjacency: &A) -> Option<(usize, usize)> {
    let nodes = order.nodes();
    (0..nodes.len())
        .flat_map(|i| (i + 1..nodes.len()).map(move |j| (i, j)))
        .find(|&(i, j)| adjacency.is_neighbor(&nodes[i], &nodes[j]) != adjacency.is_neighbor(&nodes[j], &nodes[i]))
}
