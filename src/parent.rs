use itertools::Itertools;
use log::debug;
use varisat::Var;

use crate::adjacency::Adjacency;
use crate::connectivity::{ConnectivityEncoder, EncodeError, Node};
use crate::logic::at_most_one;
use crate::model::Model;
use crate::order::{select_root, NodeOrder, RootHandles};
use crate::solver::Assignment;

/// Connectivity through an implicit spanning tree rooted at the unique root.
///
/// # Logical setup
/// Let the nodes be ordered and let `x` be the membership variables.
/// The root is the earliest active node, see [`select_root`].
///
/// Every ordered pair of neighbors `(v, u)` gets a parent edge variable `P(v, u)`, meaning "`u` is the parent of `v`".
/// - `P(v, u)` implies both `v` and `u` are active and `v` is not the root.
/// - An active non-root `v` has exactly one parent; the root and inactive nodes have none.
///
/// Parent pointers alone allow cycles, so every node also carries a rank `R(v)` in `0..n`, order-encoded as `n - 1` variables `R(v) > k`.
/// `P(v, u)` implies `R(u) < R(v)`, and the root and inactive nodes sit at rank 0.
///
/// Following parents from an active node strictly decreases the rank, so the walk ends, and it can only end at an active node without a parent: the root.
/// Hence every active node is joined to the root through active nodes.
/// Conversely, a breadth-first tree from the root of any connected active set, with ranks set to depths, satisfies every clause.
///
/// Which parent an active node picks is not canonical when several would do.
/// Parent edges read back from a solution prove connectivity but should not be relied on as a particular tree.
#[derive(Copy, Clone, Debug, Default)]
pub struct ParentPointer;

/// Variables created by [`ParentPointer::encode_tree`].
#[derive(Clone, Debug)]
pub struct SpanningTree {
    roots: RootHandles,
    // (child, parent, edge variable), grouped by child
    parents: Vec<(usize, usize, Var)>,
    ranks: Vec<Vec<Var>>,
}

impl SpanningTree {
    pub fn roots(&self) -> &RootHandles {
        &self.roots
    }

    /// The variable stating that `parent` is the parent of `child`, if the two are neighbors.
    pub fn parent_var(&self, child: usize, parent: usize) -> Option<Var> {
        self.parents.iter()
            .find(|(c, p, _)| *c == child && *p == parent)
            .map(|(_, _, var)| *var)
    }

    /// The parent chosen for `child` in a solved `assignment`; [`None`] for the root and inactive nodes.
    pub fn parent_of(&self, child: usize, assignment: &Assignment) -> Option<usize> {
        self.parents.iter()
            .find(|(c, _, var)| *c == child && assignment.value(*var))
            .map(|(_, p, _)| *p)
    }

    /// The rank of `node` in a solved `assignment`.
    pub fn rank_of(&self, node: usize, assignment: &Assignment) -> usize {
        self.ranks[node].iter().take_while(|above| assignment.value(**above)).count()
    }
}

impl ParentPointer {
    /// Encode connectivity of `membership` and return every created variable.
    pub fn encode_tree<N: Node, A: Adjacency<N>>(
        &self,
        model: &mut Model,
        order: &NodeOrder<N>,
        membership: &[Var],
        adjacency: &A,
    ) -> Result<SpanningTree, EncodeError> {
        order.check(membership, adjacency)?;
        let n = order.len();
        let neighbors = order.neighbor_lists(adjacency);

        let vars_before = model.var_count();
        let clauses_before = model.clause_count();
        let roots = select_root(model, membership)?;

        // ranks[v][k] <=> R(v) > k
        let ranks = (0..n).map(|_| model.new_vars(n - 1)).collect_vec();
        for v in 0..n {
            for k in 1..ranks[v].len() {
                model.add_clause(&[ranks[v][k].negative(), ranks[v][k - 1].positive()]);
            }
            if let Some(lowest) = ranks[v].first() {
                model.add_clause(&[roots.roots[v].negative(), lowest.negative()]);
                model.add_clause(&[membership[v].positive(), lowest.negative()]);
            }
        }

        let mut parents = Vec::with_capacity(neighbors.iter().map(Vec::len).sum());
        for v in 0..n {
            let x = membership[v];
            let root = roots.roots[v];

            let candidates = neighbors[v].iter()
                .map(|&u| (u, model.new_var()))
                .collect_vec();

            for &(u, edge) in &candidates {
                model.add_clause(&[edge.negative(), x.positive()]);
                model.add_clause(&[edge.negative(), membership[u].positive()]);
                model.add_clause(&[edge.negative(), root.negative()]);

                // R(u) < R(v), i.e. R(v) > 0, R(u) > k => R(v) > k + 1, and R(u) < n - 1
                model.add_clause(&[edge.negative(), ranks[v][0].positive()]);
                for k in 0..n - 2 {
                    model.add_clause(&[edge.negative(), ranks[u][k].negative(), ranks[v][k + 1].positive()]);
                }
                model.add_clause(&[edge.negative(), ranks[u][n - 2].negative()]);

                parents.push((v, u, edge));
            }

            let edges = candidates.iter().map(|(_, edge)| edge.positive()).collect_vec();
            // active and not the root => at least one parent; an isolated active node must be the root
            let mut needs_parent = vec![x.negative(), root.positive()];
            needs_parent.extend(edges.iter().copied());
            model.add_clause(&needs_parent);
            model.add_clauses(at_most_one(&edges));
        }

        debug!(
            "parent-pointer encoding over {} nodes and {} parent edges: {} variables, {} clauses",
            n,
            parents.len(),
            model.var_count() - vars_before,
            model.clause_count() - clauses_before,
        );

        Ok(SpanningTree { roots, parents, ranks })
    }
}

impl<N: Node> ConnectivityEncoder<N> for ParentPointer {
    fn encode<A: Adjacency<N>>(
        &self,
        model: &mut Model,
        order: &NodeOrder<N>,
        membership: &[Var],
        adjacency: &A,
    ) -> Result<RootHandles, EncodeError> {
        self.encode_tree(model, order, membership, adjacency).map(|tree| tree.roots)
    }
}
