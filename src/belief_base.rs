// ### Belief bases ###
//
// A belief base maps formulas to priorities; higher priorities are held more
// firmly.  Keys use canonical formula equality, so `p & q` and `q & p` name
// the same belief.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::entailment::EntailmentChecker;
use crate::formula::Formula;

pub type Priority = u32;

pub const DEFAULT_PRIORITY: Priority = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeliefBase {
    beliefs: BTreeMap<Formula, Priority>,
}

impl BeliefBase {
    pub fn new() -> BeliefBase {
        BeliefBase::default()
    }

    /// Insert `formula`, overwriting its priority if it is already held.
    pub fn add(&mut self, formula: Formula, priority: Priority) {
        self.beliefs.insert(formula, priority);
    }

    pub fn remove(&mut self, formula: &Formula) -> bool {
        self.beliefs.remove(formula).is_some()
    }

    pub fn contains(&self, formula: &Formula) -> bool {
        self.beliefs.contains_key(formula)
    }

    pub fn get_priority(&self, formula: &Formula) -> Option<Priority> {
        self.beliefs.get(formula).copied()
    }

    pub fn get_all_formulas(&self) -> Vec<Formula> {
        self.beliefs.keys().cloned().collect()
    }

    /// Formulas whose priority lies in the inclusive range; `None` leaves that side open.
    pub fn get_formulas_by_priority(
        &self,
        min_priority: Option<Priority>,
        max_priority: Option<Priority>,
    ) -> Vec<Formula> {
        self.beliefs
            .iter()
            .filter(|(_, &priority)| min_priority.map_or(true, |min| priority >= min))
            .filter(|(_, &priority)| max_priority.map_or(true, |max| priority <= max))
            .map(|(formula, _)| formula.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Formula, Priority> {
        self.beliefs.iter()
    }

    pub fn copy(&self) -> BeliefBase {
        self.clone()
    }

    /// All beliefs as one balanced conjunction; the atom `True` when empty.
    pub fn conjunction(&self) -> Formula {
        Formula::balanced_and(&self.get_all_formulas())
    }

    pub fn is_consistent(&self, checker: &EntailmentChecker) -> bool {
        if self.is_empty() {
            return true;
        }
        // Anything unsatisfiable entails this, whichever atoms the base uses.
        let p = Formula::atom("p");
        let contradiction = Formula::and(&p, &Formula::not(&p));
        !checker.entails(&self.conjunction(), &contradiction)
    }
}

impl FromIterator<(Formula, Priority)> for BeliefBase {
    fn from_iter<I: IntoIterator<Item = (Formula, Priority)>>(iter: I) -> Self {
        BeliefBase {
            beliefs: BTreeMap::from_iter(iter),
        }
    }
}

impl<'a> IntoIterator for &'a BeliefBase {
    type Item = (&'a Formula, &'a Priority);
    type IntoIter = btree_map::Iter<'a, Formula, Priority>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for BeliefBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Empty belief base");
        }
        let mut sorted = Vec::from_iter(self.iter());
        // Stable, so equal priorities keep the canonical formula order.
        sorted.sort_by(|(_, a), (_, b)| b.cmp(a));
        writeln!(f, "Belief base:")?;
        for (formula, priority) in sorted {
            writeln!(f, "  {formula} (priority: {priority})")?;
        }
        Ok(())
    }
}
