// ### Expansion and revision ###

use log::{debug, info};

use crate::belief_base::{BeliefBase, Priority, DEFAULT_PRIORITY};
use crate::contraction::PartialMeetContraction;
use crate::entailment::EntailmentChecker;
use crate::formula::Formula;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expansion {
    checker: EntailmentChecker,
}

impl Expansion {
    pub fn new() -> Expansion {
        Expansion::default()
    }

    pub fn with_checker(checker: EntailmentChecker) -> Expansion {
        Expansion { checker }
    }

    /// Add `formula` at `priority` with no consistency check.
    pub fn expand(&self, base: &BeliefBase, formula: &Formula, priority: Priority) -> BeliefBase {
        let mut result = base.copy();
        result.add(formula.clone(), priority);
        result
    }

    /// As `expand`, but an expansion that would be inconsistent yields `base` unchanged.
    pub fn safe_expand(
        &self,
        base: &BeliefBase,
        formula: &Formula,
        priority: Priority,
    ) -> BeliefBase {
        let result = self.expand(base, formula, priority);
        if result.is_consistent(&self.checker) {
            result
        } else {
            debug!("Expansion by {formula} is inconsistent; keeping the base");
            base.copy()
        }
    }
}

// Revision by the Levi identity: (B - ~phi) + phi.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revision {
    checker: EntailmentChecker,
    contraction: PartialMeetContraction,
    expansion: Expansion,
}

impl Revision {
    pub fn new() -> Revision {
        Revision::default()
    }

    pub fn with_checker(checker: EntailmentChecker) -> Revision {
        Revision {
            checker,
            contraction: PartialMeetContraction::with_checker(checker),
            expansion: Expansion::with_checker(checker),
        }
    }

    pub fn revise(&self, base: &BeliefBase, formula: &Formula, priority: Priority) -> BeliefBase {
        let contracted = self.contraction.contract(base, &Formula::not(formula));
        let revised = self.expansion.expand(&contracted, formula, priority);
        if revised.is_consistent(&self.checker) {
            return revised;
        }
        info!("Revision by {formula} is inconsistent; keeping only {formula}");
        let mut fallback = BeliefBase::new();
        fallback.add(formula.clone(), priority);
        fallback
    }

    /// Revise by each formula in turn.  `priorities` pairs up with `formulas`
    /// (the shorter of the two decides the length); `None` means the default priority.
    pub fn iterative_revision(
        &self,
        base: &BeliefBase,
        formulas: &[Formula],
        priorities: Option<&[Priority]>,
    ) -> BeliefBase {
        let defaults = vec![DEFAULT_PRIORITY; formulas.len()];
        let priorities = priorities.unwrap_or(&defaults);
        formulas
            .iter()
            .zip(priorities)
            .fold(base.copy(), |result, (formula, &priority)| {
                self.revise(&result, formula, priority)
            })
    }
}

#[cfg(test)]
mod revision_tests {
    use super::*;
    use crate::entailment::Limits;
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

    #[test]
    fn test_expand() {
        let b = base(&[("p", 2)]);
        let expanded = Expansion::new().expand(&b, &f("~p"), 1);
        assert_eq!(expanded, base(&[("p", 2), ("~p", 1)]));
        // The input is untouched.
        assert_eq!(b, base(&[("p", 2)]));

        let expanded = Expansion::new().expand(&b, &f("p"), 5);
        assert_eq!(expanded.get_priority(&f("p")), Some(5));
    }

    #[test]
    fn test_safe_expand() {
        init();
        let b = base(&[("p", 2), ("p -> q", 1)]);
        let expansion = Expansion::new();
        assert_eq!(expansion.safe_expand(&b, &f("~q"), 1), b);
        assert_eq!(
            expansion.safe_expand(&b, &f("r"), 1),
            base(&[("p", 2), ("p -> q", 1), ("r", 1)])
        );
    }

    #[test]
    fn test_revise_success() {
        init();
        let checker = EntailmentChecker::new();
        let b = base(&[("p", 2), ("p -> q", 1)]);
        let revised = Revision::new().revise(&b, &f("~p"), 3);
        assert!(revised.contains(&f("~p")));
        assert_eq!(revised.get_priority(&f("~p")), Some(3));
        assert!(checker.entails(&revised.conjunction(), &f("~p")));
        assert!(revised.is_consistent(&checker));
        assert_eq!(revised, base(&[("~p", 3), ("p -> q", 1)]));
    }

    #[test]
    fn test_revise_without_conflict_is_expansion() {
        let b = base(&[("p", 2), ("p -> q", 1)]);
        let revised = Revision::new().revise(&b, &f("r"), 1);
        assert_eq!(revised, Expansion::new().expand(&b, &f("r"), 1));
    }

    #[test]
    fn test_revise_by_contradiction_falls_back() {
        init();
        let b = base(&[("p", 2), ("q", 1)]);
        let revised = Revision::new().revise(&b, &f("r & ~r"), 4);
        assert_eq!(revised, base(&[("r & ~r", 4)]));
    }

    #[test]
    fn test_iterative_revision() {
        init();
        let b = base(&[("p", 2), ("p -> q", 1)]);
        let revision = Revision::new();
        let formulas = [f("~p"), f("p")];

        let revised = revision.iterative_revision(&b, &formulas, Some(&[3, 4][..]));
        let stepwise = revision.revise(&revision.revise(&b, &formulas[0], 3), &formulas[1], 4);
        assert_eq!(revised, stepwise);
        assert_eq!(revised.get_priority(&f("p")), Some(4));
        assert!(!revised.contains(&f("~p")));

        let revised = revision.iterative_revision(&b, &formulas[..1], None);
        assert_eq!(revised.get_priority(&f("~p")), Some(DEFAULT_PRIORITY));

        // Unpaired formulas are ignored.
        let revised = revision.iterative_revision(&b, &formulas, Some(&[3][..]));
        assert!(revised.contains(&f("~p")));
        assert!(!revised.contains(&f("p")));
    }

    #[test]
    fn test_with_checker() {
        let checker = EntailmentChecker::with_limits(Limits {
            max_iterations: 10,
            ..Limits::default()
        });
        let revision = Revision::with_checker(checker);
        let b = base(&[("p", 2)]);
        assert_eq!(revision.revise(&b, &f("~p"), 1), base(&[("~p", 1)]));
    }
}
