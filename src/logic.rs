//! Clause gadgets. Each function returns the clauses rather than adding them, so callers can inspect or batch them.

use itertools::Itertools;
use varisat::Lit;

pub fn at_least_one(lits: &[Lit]) -> Vec<Vec<Lit>> {
    vec![lits.to_vec()]
}

pub fn at_most_one(lits: &[Lit]) -> Vec<Vec<Lit>> {
    // no two are true; (!A + !B) * (!A + !C) * ...
    lits.iter()
        .tuple_combinations()
        .map(|(a, b)| vec![!*a, !*b])
        .collect_vec()
}

pub fn exactly_one(lits: &[Lit]) -> Vec<Vec<Lit>> {
    let mut clauses = at_most_one(lits);
    clauses.extend(at_least_one(lits));
    clauses
}

/// `target <=> (lits[0] * lits[1] * ...)`. With no `lits`, `target` is forced true.
pub fn and_equiv(target: Lit, lits: &[Lit]) -> Vec<Vec<Lit>> {
    // T => L_i for every i
    let mut clauses = lits.iter().map(|lit| vec![!target, *lit]).collect_vec();
    // L_0 * L_1 * ... => T = !L_0 + !L_1 + ... + T
    let mut back = lits.iter().map(|lit| !*lit).collect_vec();
    back.push(target);
    clauses.push(back);
    clauses
}

/// `target <=> (lits[0] + lits[1] + ...)`. With no `lits`, `target` is forced false.
pub fn or_equiv(target: Lit, lits: &[Lit]) -> Vec<Vec<Lit>> {
    // L_i => T for every i
    let mut clauses = lits.iter().map(|lit| vec![!*lit, target]).collect_vec();
    // T => L_0 + L_1 + ...
    let mut forward = vec![!target];
    forward.extend_from_slice(lits);
    clauses.push(forward);
    clauses
}

/// `(guards[0] * guards[1] * ...) => lit`, the reified form of "only enforce `lit` if every guard holds".
pub fn implies(guards: &[Lit], lit: Lit) -> Vec<Lit> {
    let mut clause = guards.iter().map(|guard| !*guard).collect_vec();
    clause.push(lit);
    clause
}
