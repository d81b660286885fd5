use std::fmt::{Display, Formatter};

use itertools::Itertools;
use log::{debug, info};
use varisat::{ExtendFormula, Lit, Solver, Var};

use crate::model::Model;

/// Reasons a [`ModelSolver`] may fail.
///
/// An unsatisfiable model is not a failure; it is reported as [`SolveStatus::Infeasible`].
#[derive(Debug)]
pub enum SolverFailure {
    /// The SAT backend reported an error, rendered here since the backend's error type is not part of this API.
    Backend(String),
    /// The SAT backend claimed satisfiability but produced no model.
    /// This should probably never happen.
    NoModel,
}

impl Display for SolverFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(reason) => write!(f, "SAT backend failed: {reason}"),
            Self::NoModel => write!(f, "SAT backend reported success without a model"),
        }
    }
}

impl std::error::Error for SolverFailure {}

/// How an enumeration ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SolveStatus {
    /// No assignment satisfies the model.
    Infeasible,
    /// Every solution (distinct on the projection) was found.
    Exhausted,
    /// Enumeration stopped at the caller's limit; more solutions may exist.
    LimitReached,
}

/// A complete assignment of every variable in a [`Model`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Assignment(Vec<bool>);

impl Assignment {
    pub(crate) fn from_model(var_count: usize, model: &[Lit]) -> Self {
        let mut values = vec![false; var_count];
        for lit in model {
            if let Some(value) = values.get_mut(lit.index()) {
                *value = lit.is_positive();
            }
        }
        Self(values)
    }

    /// Build an assignment directly, e.g. to check a hand-written candidate.
    pub fn from_values(values: Vec<bool>) -> Self {
        Self(values)
    }

    /// The value of `var`. Variables unknown to this assignment read as false.
    pub fn value(&self, var: Var) -> bool {
        self.0.get(var.index()).copied().unwrap_or(false)
    }

    pub fn lit(&self, lit: Lit) -> bool {
        self.value(lit.var()) == lit.is_positive()
    }

    fn blocking_clause(&self, projection: &[Var]) -> Vec<Lit> {
        projection.iter()
            .map(|var| var.lit(!self.value(*var)))
            .collect_vec()
    }
}

/// Solutions found by [`ModelSolver::solve_all`].
#[derive(Debug)]
pub struct Solutions {
    pub assignments: Vec<Assignment>,
    pub status: SolveStatus,
}

/// The generic solve-and-enumerate driver: accepts a finished [`Model`] and returns satisfying assignments.
///
/// Enumeration works by adding a blocking clause over the projected variables after every solution, so two reported solutions always differ on the projection.
/// Auxiliary variables outside the projection (roots, parents, layers) are free to take any consistent value and never cause duplicates.
pub struct ModelSolver<'a> {
    model: &'a Model,
    projection: Vec<Var>,
    assumptions: Vec<Lit>,
    limit: Option<usize>,
}

impl<'a> From<&'a Model> for ModelSolver<'a> {
    fn from(model: &'a Model) -> Self {
        Self {
            model,
            projection: (0..model.var_count()).map(Var::from_index).collect_vec(),
            assumptions: Vec::new(),
            limit: None,
        }
    }
}

impl ModelSolver<'_> {
    /// Only distinguish solutions by the values of `vars`. Defaults to every variable in the model.
    pub fn project(mut self, vars: impl IntoIterator<Item = Var>) -> Self {
        self.projection = vars.into_iter().collect_vec();
        self
    }

    /// Assume `lits` hold, without adding them to the model.
    pub fn assume(mut self, lits: impl IntoIterator<Item = Lit>) -> Self {
        self.assumptions.extend(lits);
        self
    }

    /// Stop after `limit` solutions.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Find a single solution, or [`None`] if the model is infeasible.
    pub fn solve_one(self) -> Result<Option<Assignment>, SolverFailure> {
        let solutions = self.limit(1).solve_all(|_| {})?;
        Ok(solutions.assignments.into_iter().next())
    }

    /// Enumerate solutions, calling `callback` on each as it is found.
    pub fn solve_all(&self, mut callback: impl FnMut(&Assignment)) -> Result<Solutions, SolverFailure> {
        let mut solver = Solver::new();
        solver.add_formula(self.model.formula());
        solver.assume(&self.assumptions);

        let mut assignments = Vec::new();
        let status = loop {
            if self.limit.is_some_and(|limit| assignments.len() >= limit) {
                break SolveStatus::LimitReached;
            }

            let satisfiable = solver.solve().map_err(|err| SolverFailure::Backend(format!("{err:?}")))?;
            if !satisfiable {
                break if assignments.is_empty() { SolveStatus::Infeasible } else { SolveStatus::Exhausted };
            }

            let model = solver.model().ok_or(SolverFailure::NoModel)?;
            let assignment = Assignment::from_model(self.model.var_count(), &model);
            callback(&assignment);

            let blocking = assignment.blocking_clause(&self.projection);
            assignments.push(assignment);
            if blocking.is_empty() {
                // nothing to distinguish further solutions by
                break SolveStatus::Exhausted;
            }
            solver.add_clause(&blocking);
            debug!("found solution {}", assignments.len());
        };

        info!("enumeration ended with {:?} after {} solution(s)", status, assignments.len());
        Ok(Solutions { assignments, status })
    }
}
