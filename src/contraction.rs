// ### Partial meet contraction ###
//
// contract(B, phi) is the meet of the best remainder sets of B with respect to phi,
// where a remainder set is a maximal subset of B not entailing phi and
// "best" means the highest sum of priorities.

use std::cmp;

use itertools::Itertools;
use log::{debug, warn};
use priority_queue::PriorityQueue;

use crate::belief_base::{BeliefBase, Priority};
use crate::entailment::EntailmentChecker;
use crate::formula::Formula;

// Remainder sets come from the power set of the base.
pub const REMAINDER_WARNING_THRESHOLD: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialMeetContraction {
    checker: EntailmentChecker,
}

impl PartialMeetContraction {
    pub fn new() -> PartialMeetContraction {
        PartialMeetContraction::default()
    }

    pub fn with_checker(checker: EntailmentChecker) -> PartialMeetContraction {
        PartialMeetContraction { checker }
    }

    pub fn checker(&self) -> &EntailmentChecker {
        &self.checker
    }

    pub fn contract(&self, base: &BeliefBase, formula: &Formula) -> BeliefBase {
        if !self.checker.entails(&base.conjunction(), formula) {
            debug!("Contraction by {formula} is vacuous");
            return base.copy();
        }

        let remainders = self.remainder_sets(base, formula);
        if remainders.is_empty() {
            // Even the empty subset entails `formula`.
            debug!("No remainder sets for {formula}");
            return BeliefBase::new();
        }

        let selected = select_remainder_sets(&remainders);
        debug!(
            "Contraction by {formula}: {} remainder sets, {} selected",
            remainders.len(),
            selected.len()
        );
        intersect_remainder_sets(&selected)
    }

    pub fn remainder_sets(&self, base: &BeliefBase, formula: &Formula) -> Vec<BeliefBase> {
        if base.len() > REMAINDER_WARNING_THRESHOLD {
            warn!(
                "Enumerating the power set of a belief base with {} formulas",
                base.len()
            );
        }

        let candidates: Vec<BeliefBase> = base
            .iter()
            .powerset()
            .map(|subset| {
                subset
                    .into_iter()
                    .map(|(f, &priority)| (f.clone(), priority))
                    .collect::<BeliefBase>()
            })
            .filter(|candidate| !self.checker.entails(&candidate.conjunction(), formula))
            .collect();

        candidates
            .iter()
            .filter(|candidate| {
                !candidates
                    .iter()
                    .any(|other| is_proper_subset(candidate, other))
            })
            .cloned()
            .collect()
    }
}

fn is_proper_subset(smaller: &BeliefBase, larger: &BeliefBase) -> bool {
    smaller.len() < larger.len() && smaller.iter().all(|(f, _)| larger.contains(f))
}

fn score(remainder: &BeliefBase) -> u64 {
    remainder
        .iter()
        .map(|(_, &priority)| u64::from(priority))
        .sum()
}

/// Every remainder set whose priority sum is maximal.  Ties are all kept.
pub fn select_remainder_sets(remainders: &[BeliefBase]) -> Vec<&BeliefBase> {
    let mut queue: PriorityQueue<usize, u64> = remainders
        .iter()
        .enumerate()
        .map(|(index, remainder)| (index, score(remainder)))
        .collect();

    let mut selected = Vec::new();
    let best = match queue.peek() {
        Some((_, &best)) => best,
        None => return selected,
    };
    while let Some((index, score)) = queue.pop() {
        if score < best {
            break;
        }
        selected.push(&remainders[index]);
    }
    selected
}

/// Formulas common to all `selected` sets, each at the highest priority it holds among them.
pub fn intersect_remainder_sets(selected: &[&BeliefBase]) -> BeliefBase {
    let (first, rest) = match selected.split_first() {
        Some(split) => split,
        None => return BeliefBase::new(),
    };
    first
        .iter()
        .filter(|(formula, _)| rest.iter().all(|remainder| remainder.contains(formula)))
        .map(|(formula, &priority)| {
            let priority: Priority = rest
                .iter()
                .filter_map(|remainder| remainder.get_priority(formula))
                .fold(priority, cmp::max);
            (formula.clone(), priority)
        })
        .collect()
}

#[cfg(test)]
mod contraction_tests {
    use super::*;
    use crate::propositional_logic::parse_formula;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn f(input: &str) -> Formula {
        parse_formula(input).unwrap()
    }

    fn base(beliefs: &[(&str, Priority)]) -> BeliefBase {
        beliefs.iter().map(|(s, p)| (f(s), *p)).collect()
    }

    fn scenario() -> BeliefBase {
        base(&[("p -> q", 3), ("p", 2), ("q -> r", 2)])
    }

    #[test]
    fn test_vacuous_contraction() {
        init();
        let b = scenario();
        let contracted = PartialMeetContraction::new().contract(&b, &f("s"));
        assert_eq!(contracted, b);
    }

    #[test]
    fn test_contract_removes_belief() {
        init();
        let contraction = PartialMeetContraction::new();
        let contracted = contraction.contract(&scenario(), &f("p"));
        assert_eq!(contracted, base(&[("p -> q", 3), ("q -> r", 2)]));
        assert!(!contraction
            .checker()
            .entails(&contracted.conjunction(), &f("p")));
    }

    #[test]
    fn test_contract_keeps_heaviest_remainder() {
        // {p, q -> r} scores 4, {p -> q, q -> r} scores 5.
        let contraction = PartialMeetContraction::new();
        let remainders = contraction.remainder_sets(&scenario(), &f("q"));
        assert_eq!(remainders.len(), 2);
        let contracted = contraction.contract(&scenario(), &f("q"));
        assert_eq!(contracted, base(&[("p -> q", 3), ("q -> r", 2)]));
    }

    #[test]
    fn test_ties_are_intersected() {
        let contraction = PartialMeetContraction::new();
        let b = base(&[("p", 1), ("q", 1), ("s", 3)]);
        let remainders = contraction.remainder_sets(&b, &f("p & q"));
        assert_eq!(remainders.len(), 2);
        assert_eq!(select_remainder_sets(&remainders).len(), 2);
        assert_eq!(contraction.contract(&b, &f("p & q")), base(&[("s", 3)]));

        let b = base(&[("p", 1), ("q", 1)]);
        assert!(contraction.contract(&b, &f("p & q")).is_empty());
    }

    #[test]
    fn test_tautology_leaves_nothing() {
        let contraction = PartialMeetContraction::new();
        let b = base(&[("p", 1), ("q", 2)]);
        assert!(contraction.remainder_sets(&b, &f("p | ~p")).is_empty());
        assert!(contraction.contract(&b, &f("p | ~p")).is_empty());
    }

    #[test]
    fn test_remainder_sets_are_maximal() {
        let contraction = PartialMeetContraction::new();
        let b = base(&[("p", 1), ("q", 1), ("r", 1)]);
        let remainders = contraction.remainder_sets(&b, &f("p | q"));
        assert_eq!(remainders, vec![base(&[("r", 1)])]);

        let remainders = contraction.remainder_sets(&b, &f("p & q"));
        let mut desired = vec![base(&[("p", 1), ("r", 1)]), base(&[("q", 1), ("r", 1)])];
        let mut remainders = remainders;
        remainders.sort_by_key(|r| r.get_all_formulas());
        desired.sort_by_key(|r| r.get_all_formulas());
        assert_eq!(remainders, desired);
    }

    #[test]
    fn test_select_remainder_sets() {
        assert!(select_remainder_sets(&[]).is_empty());
        let remainders = vec![base(&[("p", 2)]), base(&[("q", 1), ("r", 1)]), base(&[("s", 1)])];
        let selected = select_remainder_sets(&remainders);
        assert_eq!(selected.len(), 2);
        assert!(!selected.contains(&&remainders[2]));
    }

    #[test]
    fn test_intersect_takes_max_priority() {
        let first = base(&[("p", 1), ("q", 4)]);
        let second = base(&[("p", 3), ("r", 2)]);
        assert_eq!(intersect_remainder_sets(&[&first, &second]), base(&[("p", 3)]));
        assert_eq!(intersect_remainder_sets(&[&first]), first);
        assert!(intersect_remainder_sets(&[]).is_empty());
    }

    #[test]
    fn test_result_is_subset_of_base() {
        let contraction = PartialMeetContraction::new();
        let b = base(&[("p -> q", 1), ("q -> r", 1), ("p", 1), ("r | s", 2)]);
        for target in ["r", "q", "p", "r & s", "p -> r"] {
            let contracted = contraction.contract(&b, &f(target));
            for (formula, priority) in &contracted {
                assert_eq!(b.get_priority(formula), Some(*priority));
            }
            assert!(!contraction
                .checker()
                .entails(&contracted.conjunction(), &f(target)));
        }
    }
}
