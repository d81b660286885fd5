use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Var};

/// The constraint model shared between a puzzle encoder and every connectivity encoder it calls.
///
/// A [`Model`] is a growing CNF formula. Variables are handed out densely from index 0, so a [`Var`] obtained here can be used directly with [`Assignment`](crate::solver::Assignment).
/// Nothing in this crate removes clauses; encoders only append.
pub struct Model {
    formula: CnfFormula,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// An empty model.
    pub fn new() -> Self {
        Self { formula: CnfFormula::new() }
    }

    /// Register a fresh Boolean decision variable.
    pub fn new_var(&mut self) -> Var {
        self.formula.new_var()
    }

    /// Register `count` fresh variables, in order.
    pub fn new_vars(&mut self, count: usize) -> Vec<Var> {
        (0..count).map(|_| self.new_var()).collect()
    }

    /// Add a single clause, i.e. the disjunction of `lits`.
    pub fn add_clause(&mut self, lits: &[Lit]) {
        self.formula.add_clause(lits);
    }

    /// Add every clause of a gadget from [`logic`](crate::logic).
    pub fn add_clauses(&mut self, clauses: Vec<Vec<Lit>>) {
        clauses.iter().for_each(|clause| self.add_clause(clause));
    }

    /// Force `lit` to hold in every solution.
    pub fn fix(&mut self, lit: Lit) {
        self.add_clause(&[lit]);
    }

    /// Force exactly `k` of `lits` to hold, through a sequential counter.
    ///
    /// After `i` literals, `row[j]` holds exactly when at least `j + 1` of them hold, for `j` in `0..=k`.
    /// The last row must reach `k` but not `k + 1`.
    pub fn add_exactly(&mut self, lits: &[Lit], k: usize) {
        let truth = self.new_var().positive();
        self.fix(truth);

        let mut row = vec![!truth; k + 1];
        for lit in lits {
            let next = self.new_vars(k + 1).into_iter().map(|var| var.positive()).collect_vec();
            for (j, count) in next.iter().copied().enumerate() {
                let carried = row[j];
                let below = if j == 0 { truth } else { row[j - 1] };

                // count <=> carried + below * lit
                self.add_clause(&[!carried, count]);
                self.add_clause(&[!below, !*lit, count]);
                self.add_clause(&[!count, carried, below]);
                self.add_clause(&[!count, carried, *lit]);
            }
            row = next;
        }

        if k > 0 {
            self.fix(row[k - 1]);
        }
        self.fix(!row[k]);
    }

    pub fn var_count(&self) -> usize {
        self.formula.var_count()
    }

    pub fn clause_count(&self) -> usize {
        self.formula.len()
    }

    pub fn formula(&self) -> &CnfFormula {
        &self.formula
    }
}
