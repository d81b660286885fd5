use log::{debug, warn};
use varisat::Var;

use crate::adjacency::Adjacency;
use crate::connectivity::{ConnectivityEncoder, EncodeError, Node};
use crate::logic::implies;
use crate::model::Model;
use crate::order::{select_root, NodeOrder, RootHandles};
use crate::solver::Assignment;

/// Connectivity as a bounded flood fill from the unique root, unrolled into layers.
///
/// # Logical setup
/// Let `L(t, v)` mean "`v` is reached from the root within `t` steps through active nodes", for `t` in `0..=T`.
/// - `L(0, v)` is the root indicator of `v`.
/// - `L(t + 1, v) <=> L(t, v) + x(v) * (L(t, u_1) + L(t, u_2) + ...)` over the neighbors `u_i` of `v`.
///   In particular layers only grow, and only active nodes are ever reached.
/// - `L(T, v) <=> x(v)`: every active node is reached by the last layer.
///
/// A shortest path in a connected set of `n` nodes has at most `n - 1` edges, so `T = n - 1` never rejects a connected set.
/// Every auxiliary variable is a function of `x`, so this encoding adds no solutions of its own and any number of independent checks can share one model.
#[derive(Copy, Clone, Debug, Default)]
pub struct Percolation {
    layers: Option<usize>,
}

/// Variables created by [`Percolation::encode_layers`].
#[derive(Clone, Debug)]
pub struct ReachLayers {
    roots: RootHandles,
    // layers[t][v]; layers[0] is the root indicator
    layers: Vec<Vec<Var>>,
}

impl ReachLayers {
    pub fn roots(&self) -> &RootHandles {
        &self.roots
    }

    pub fn layer(&self, t: usize) -> Option<&[Var]> {
        self.layers.get(t).map(Vec::as_slice)
    }

    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// The first layer which reaches `node` in a solved `assignment`, i.e. its distance from the root through active nodes.
    pub fn first_reached(&self, node: usize, assignment: &Assignment) -> Option<usize> {
        self.layers.iter().position(|layer| assignment.value(layer[node]))
    }
}

impl Percolation {
    /// Unroll only `layers` steps instead of one less than the node count.
    ///
    /// Only safe when every connected active set is known to have a spanning path radius of at most `layers` from its root; otherwise connected sets are rejected too.
    pub fn with_layers(layers: usize) -> Self {
        Self { layers: Some(layers) }
    }

    /// Encode connectivity of `membership` and return every created variable.
    pub fn encode_layers<N: Node, A: Adjacency<N>>(
        &self,
        model: &mut Model,
        order: &NodeOrder<N>,
        membership: &[Var],
        adjacency: &A,
    ) -> Result<ReachLayers, EncodeError> {
        order.check(membership, adjacency)?;
        let n = order.len();
        let depth = match self.layers {
            Some(layers) => {
                if layers < n - 1 {
                    warn!("percolating only {} layers over {} nodes; connected sets of larger radius will be rejected", layers, n);
                }
                layers
            }
            None => n - 1,
        };
        let neighbors = order.neighbor_lists(adjacency);

        let vars_before = model.var_count();
        let clauses_before = model.clause_count();
        let roots = select_root(model, membership)?;

        let mut layers = Vec::with_capacity(depth + 1);
        layers.push(roots.roots.clone());
        for _ in 0..depth {
            let previous = layers.last().cloned().unwrap_or_default();
            let current = model.new_vars(n);

            for v in 0..n {
                let x = membership[v];
                let reached = current[v];

                // monotone and capped
                model.add_clause(&implies(&[previous[v].positive()], reached.positive()));
                model.add_clause(&implies(&[reached.positive()], x.positive()));

                // spreads from any reached neighbor into an active node
                for &u in &neighbors[v] {
                    model.add_clause(&implies(&[x.positive(), previous[u].positive()], reached.positive()));
                }

                // and from nowhere else
                let mut sources = vec![reached.negative(), previous[v].positive()];
                sources.extend(neighbors[v].iter().map(|&u| previous[u].positive()));
                model.add_clause(&sources);
            }

            layers.push(current);
        }

        if let Some(last) = layers.last() {
            for v in 0..n {
                model.add_clause(&implies(&[membership[v].positive()], last[v].positive()));
            }
        }

        debug!(
            "percolation encoding over {} nodes with {} layers: {} variables, {} clauses",
            n,
            depth,
            model.var_count() - vars_before,
            model.clause_count() - clauses_before,
        );

        Ok(ReachLayers { roots, layers })
    }
}

impl<N: Node> ConnectivityEncoder<N> for Percolation {
    fn encode<A: Adjacency<N>>(
        &self,
        model: &mut Model,
        order: &NodeOrder<N>,
        membership: &[Var],
        adjacency: &A,
    ) -> Result<RootHandles, EncodeError> {
        self.encode_layers(model, order, membership, adjacency).map(|reach| reach.roots)
    }
}
