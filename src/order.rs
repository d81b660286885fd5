use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use varisat::Var;

use crate::adjacency::{check_symmetric, Adjacency};
use crate::connectivity::{EncodeError, Node};
use crate::logic::{and_equiv, at_least_one};
use crate::model::Model;
use crate::solver::Assignment;

/// An explicit total order on the nodes of a graph.
///
/// The order decides which active node becomes the root (the earliest one), so it must be reproducible; it is exactly the order in which nodes were given, never a hash order.
#[derive(Clone, Debug)]
pub struct NodeOrder<N: Node> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
}

impl<N: Node> NodeOrder<N> {
    pub fn new(nodes: impl IntoIterator<Item = N>) -> Result<Self, EncodeError> {
        let nodes = nodes.into_iter().collect_vec();
        if nodes.is_empty() {
            return Err(EncodeError::EmptyOrder);
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(*node, position).is_some() {
                return Err(EncodeError::DuplicateNode { position });
            }
        }

        Ok(Self { nodes, index })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn index_of(&self, node: &N) -> Option<usize> {
        self.index.get(node).copied()
    }

    /// Validate `membership` and `adjacency` against this order.
    ///
    /// This is the common precondition of every encoder and runs before anything is added to a model.
    pub(crate) fn check<A: Adjacency<N>>(&self, membership: &[Var], adjacency: &A) -> Result<(), EncodeError> {
        if membership.len() != self.len() {
            return Err(EncodeError::MembershipMismatch { nodes: self.len(), membership: membership.len() });
        }

        if let Some(referenced) = adjacency.referenced_nodes() {
            if referenced.iter().any(|node| !self.index.contains_key(node)) {
                return Err(EncodeError::NodeMissingFromOrder);
            }
        }

        debug_assert_eq!(check_symmetric(self, adjacency), None, "adjacency relation is not symmetric");
        Ok(())
    }

    /// For every position, the positions of its neighbors in increasing order.
    pub(crate) fn neighbor_lists<A: Adjacency<N>>(&self, adjacency: &A) -> Vec<Vec<usize>> {
        self.nodes.iter()
            .enumerate()
            .map(|(i, a)| self.nodes.iter()
                .enumerate()
                .filter(|(j, b)| i != *j && adjacency.is_neighbor(a, b))
                .map(|(j, _)| j)
                .collect_vec())
            .collect_vec()
    }
}

/// The unique-root indicators of one membership set, as created by [`select_root`].
///
/// `roots()[i]` is true exactly when node `i` is the earliest active node.
/// `none_active_before()[i]` is true exactly when every node before `i` is inactive.
#[derive(Clone, Debug)]
pub struct RootHandles {
    pub(crate) roots: Vec<Var>,
    pub(crate) none_active_before: Vec<Var>,
}

impl RootHandles {
    pub fn roots(&self) -> &[Var] {
        &self.roots
    }

    pub fn none_active_before(&self) -> &[Var] {
        &self.none_active_before
    }

    /// The position of the root in a solved `assignment`, if any root is set.
    pub fn root_index(&self, assignment: &Assignment) -> Option<usize> {
        self.roots.iter().position(|root| assignment.value(*root))
    }
}

/// Derive the root indicators of the active set `membership`, positionally matching some [`NodeOrder`].
///
/// For every `i`:
/// - `none_active_before[0]` holds,
/// - `none_active_before[i] <=> none_active_before[i - 1] * !x[i - 1]`,
/// - `root[i] <=> x[i] * none_active_before[i]`,
///
/// and at least one root is set.
/// At most one root follows from the prefix chain: a later root would need every earlier node inactive, including the earlier root.
///
/// An empty active set therefore makes the model infeasible.
/// Callers which allow empty regions must not call this.
pub fn select_root(model: &mut Model, membership: &[Var]) -> Result<RootHandles, EncodeError> {
    if membership.is_empty() {
        return Err(EncodeError::EmptyOrder);
    }

    let clauses_before = model.clause_count();
    let roots = model.new_vars(membership.len());
    let none_active_before = model.new_vars(membership.len());

    model.fix(none_active_before[0].positive());
    for i in 1..membership.len() {
        model.add_clauses(and_equiv(
            none_active_before[i].positive(),
            &[none_active_before[i - 1].positive(), membership[i - 1].negative()],
        ));
    }

    for (i, x) in membership.iter().enumerate() {
        model.add_clauses(and_equiv(roots[i].positive(), &[x.positive(), none_active_before[i].positive()]));
    }

    model.add_clauses(at_least_one(&roots.iter().map(|root| root.positive()).collect_vec()));

    debug!(
        "root selector over {} nodes: {} variables, {} clauses",
        membership.len(),
        roots.len() + none_active_before.len(),
        model.clause_count() - clauses_before,
    );

    Ok(RootHandles { roots, none_active_before })
}
