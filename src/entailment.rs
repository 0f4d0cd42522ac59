// ### Entailment ###
//
// `premise` entails `conclusion` iff `premise & ~conclusion` is unsatisfiable.
// The checker is tiered: structural identity, then a truth table for few atoms,
// then bounded resolution refutation on the CNF.  Resolution that runs out of
// budget answers "no", so large inputs may give false negatives.

use std::cmp;

use itertools::Itertools;
use log::{debug, trace, warn};

use crate::formula::{
    cnf_to_clauses, Clause, ClauseSet, CnfError, Formula, CNF_CLAUSE_LIMIT, CNF_DEPTH_LIMIT,
};
use crate::propositional_logic::get_all_valuations;

/// Numeric bounds of the entailment procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Decide by truth table when premise and conclusion mention at most this many atoms.
    pub truth_table_max_variables: usize,
    /// Above this many clauses only the literal-collision scan is run.
    pub collision_scan_threshold: usize,
    pub max_iterations: usize,
    /// The working clause set may grow to `max(min_clause_ceiling, clause_ceiling_factor * n)`
    /// where `n` is the number of input clauses.
    pub min_clause_ceiling: usize,
    pub clause_ceiling_factor: usize,
    /// Number of smallest clauses paired against the working set in each iteration.
    pub small_clause_count: usize,
    pub max_pairs: usize,
    pub cnf_depth_limit: usize,
    pub cnf_clause_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            truth_table_max_variables: 5,
            collision_scan_threshold: 50,
            max_iterations: 100,
            min_clause_ceiling: 1000,
            clause_ceiling_factor: 10,
            small_clause_count: 20,
            max_pairs: 1000,
            cnf_depth_limit: CNF_DEPTH_LIMIT,
            cnf_clause_limit: CNF_CLAUSE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntailmentChecker {
    limits: Limits,
}

impl EntailmentChecker {
    pub fn new() -> EntailmentChecker {
        EntailmentChecker::default()
    }

    pub fn with_limits(limits: Limits) -> EntailmentChecker {
        EntailmentChecker { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn entails(&self, premise: &Formula, conclusion: &Formula) -> bool {
        if premise == conclusion {
            debug!("Entailment by identity: {premise}");
            return true;
        }

        let variables = &premise.get_variables() | &conclusion.get_variables();
        if variables.len() <= self.limits.truth_table_max_variables {
            debug!("Deciding entailment by truth table over {} atoms", variables.len());
            return get_all_valuations(&variables)
                .iter()
                .all(|val| !premise.evaluate(val) || conclusion.evaluate(val));
        }

        // The refutation is built and converted recursively, so anything deeper
        // than the CNF guard goes straight to the fallback.
        let depth = 1 + cmp::max(premise.depth(), 1 + conclusion.depth());
        let cnf = if depth > self.limits.cnf_depth_limit {
            Err(CnfError::DepthLimit(self.limits.cnf_depth_limit))
        } else {
            Formula::and(premise, &Formula::not(conclusion))
                .to_cnf_bounded(self.limits.cnf_depth_limit, self.limits.cnf_clause_limit)
        };
        match cnf {
            Ok(cnf) => {
                let clauses = cnf_to_clauses(&cnf);
                debug!(
                    "Deciding entailment by resolution over {} atoms and {} clauses",
                    variables.len(),
                    clauses.len()
                );
                self.is_unsatisfiable(&clauses)
            }
            Err(err) => {
                warn!("{err}; falling back to textual containment");
                textual_containment(premise, conclusion)
            }
        }
    }

    pub fn is_unsatisfiable(&self, clauses: &ClauseSet) -> bool {
        if clauses.contains(&Clause::new()) {
            return true;
        }

        if clauses.len() > self.limits.collision_scan_threshold {
            debug!(
                "{} clauses exceed {}; scanning for complementary literals only",
                clauses.len(),
                self.limits.collision_scan_threshold
            );
            return clauses.iter().any(has_complementary_pair);
        }

        let ceiling = cmp::max(
            self.limits.min_clause_ceiling,
            self.limits.clause_ceiling_factor * clauses.len(),
        );
        let mut working = clauses.clone();
        let mut iteration = 0;
        let mut added = true;

        while added && iteration < self.limits.max_iterations && working.len() < ceiling {
            iteration += 1;
            added = false;

            // Pairs are drawn from the clauses present at the start of the iteration.
            let snapshot = working.clone();
            let small_clauses: Vec<&Clause> = snapshot
                .iter()
                .sorted_by_key(|clause| clause.len())
                .take(self.limits.small_clause_count)
                .collect();
            let pairs: Vec<(&Clause, &Clause)> = small_clauses
                .iter()
                .flat_map(|&c1| {
                    snapshot
                        .iter()
                        .filter(move |&c2| c2 != c1)
                        .map(move |c2| (c1, c2))
                })
                .take(self.limits.max_pairs)
                .collect();
            trace!(
                "Resolution iteration {iteration}: {} clauses, {} pairs",
                working.len(),
                pairs.len()
            );

            for (c1, c2) in pairs {
                for resolvent in resolve(c1, c2) {
                    if resolvent.is_empty() {
                        debug!("Empty clause derived in iteration {iteration}");
                        return true;
                    }
                    // Subsumed by (or equal to) a clause we already hold.
                    if working.iter().any(|existing| existing.is_subset(&resolvent)) {
                        continue;
                    }
                    working.insert(resolvent);
                    added = true;
                }
            }
        }
        debug!(
            "No refutation after {iteration} iterations with {} clauses",
            working.len()
        );
        false
    }
}

fn textual_containment(premise: &Formula, conclusion: &Formula) -> bool {
    // Availability guard only; this answer is not sound.
    premise.to_string().contains(&conclusion.to_string())
}

fn has_complementary_pair(clause: &Clause) -> bool {
    clause
        .iter()
        .any(|literal| matches!(literal, Formula::Not(inner) if clause.contains(inner.as_ref())))
}

pub fn complement(literal: &Formula) -> Option<Formula> {
    match literal {
        Formula::Atom(_) => Some(Formula::not(literal)),
        Formula::Not(inner) => match inner.as_ref() {
            Formula::Atom(_) => Some(inner.as_ref().clone()),
            _ => None,
        },
        _ => None,
    }
}

pub fn resolve(clause1: &Clause, clause2: &Clause) -> Vec<Clause> {
    // One resolvent per literal of `clause1` whose complement occurs in `clause2`.
    clause1
        .iter()
        .filter_map(|literal| {
            let complementary = complement(literal)?;
            if !clause2.contains(&complementary) {
                return None;
            }
            let mut resolvent: Clause = clause1.union(clause2).cloned().collect();
            resolvent.remove(literal);
            resolvent.remove(&complementary);
            Some(resolvent)
        })
        .collect()
}
