use std::fmt::{Display, Formatter};

use itertools::Itertools;
use ndarray::Array2;
use varisat::Var;

use crate::grid::Grid;
use crate::location::Location;
use crate::model::Model;
use crate::order::{NodeOrder, RootHandles};
use crate::solver::{Assignment, ModelSolver, SolveStatus, SolverFailure};

/// A grid partition encoded and ready to solve. Build one with a [`PartitionBuilder`](crate::builder::PartitionBuilder).
pub struct Partition {
    grid: Grid,
    model: Model,
    order: NodeOrder<Location>,
    // membership[region][cell]
    membership: Vec<Vec<Var>>,
    roots: Vec<RootHandles>,
}

impl Partition {
    pub(crate) fn new(grid: Grid, model: Model, order: NodeOrder<Location>, membership: Vec<Vec<Var>>, roots: Vec<RootHandles>) -> Self {
        Self { grid, model, order, membership, roots }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The root indicators of every region, positionally matching the remaining cells in row-major order.
    pub fn roots(&self) -> &[RootHandles] {
        &self.roots
    }

    /// Find any one partition.
    pub fn solve(&self) -> Result<Option<SolvedPartition>, SolverFailure> {
        let assignment = ModelSolver::from(&self.model)
            .project(self.membership.iter().flatten().copied())
            .solve_one()?;
        Ok(assignment.map(|assignment| self.read(&assignment)))
    }

    /// Enumerate partitions, stopping after `limit` if given.
    pub fn solve_all(&self, limit: Option<usize>) -> Result<(Vec<SolvedPartition>, SolveStatus), SolverFailure> {
        let mut solver = ModelSolver::from(&self.model)
            .project(self.membership.iter().flatten().copied());
        if let Some(limit) = limit {
            solver = solver.limit(limit);
        }

        let solutions = solver.solve_all(|_| {})?;
        let partitions = solutions.assignments.iter()
            .map(|assignment| self.read(assignment))
            .collect_vec();
        Ok((partitions, solutions.status))
    }

    fn read(&self, assignment: &Assignment) -> SolvedPartition {
        let mut regions = Array2::from_elem((self.grid.height(), self.grid.width()), None);
        for (cell, location) in self.order.nodes().iter().enumerate() {
            regions[location.as_index()] = self.membership.iter()
                .position(|region| assignment.value(region[cell]));
        }
        SolvedPartition { regions }
    }
}

/// A solved partition: the region of every cell, or [`None`] for dropped cells.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SolvedPartition {
    regions: Array2<Option<usize>>,
}

impl SolvedPartition {
    pub fn region_of(&self, location: Location) -> Option<usize> {
        self.regions.get(location.as_index()).copied().flatten()
    }

    /// Relabel regions in order of first appearance, row-major, so that partitions differing only by labels compare equal.
    pub fn canonical(&self) -> Self {
        let mut relabel = Vec::new();
        let regions = self.regions.map(|region| region.map(|region| {
            match relabel.iter().position(|seen| *seen == region) {
                Some(label) => label,
                None => {
                    relabel.push(region);
                    relabel.len() - 1
                }
            }
        }));
        Self { regions }
    }
}

impl Display for SolvedPartition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Grid::print(&self.regions.map(|region| match region {
            Some(region) => (b'a'..=b'z').map(char::from).nth(*region).unwrap_or('?'),
            None => '.',
        })))
    }
}
