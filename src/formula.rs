// The `Formula` type and the functionality that does not depend on the concrete
// text grammar: builders, canonical equality, printing, evaluation and normal forms.
// See `propositional_logic` for parsing and truth tables.

use std::cmp::{self, Ordering};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Write};
use std::mem;

use itertools::iproduct;

//### Formula AST ###
#[derive(Debug, Clone)]
pub enum Formula {
    Atom(String),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Equivalent(Box<Formula>, Box<Formula>),
}

// Atom names standing in for the empty conjunction and the empty disjunction.
// These are ordinary atoms; there are no propositional constants.
pub const TRUE_NAME: &str = "True";
pub const FALSE_NAME: &str = "False";

// Atoms missing from a valuation are false.
pub type Valuation = BTreeMap<String, bool>;

// General Builders and utilities.
impl Formula {
    pub fn atom(name: &str) -> Formula {
        Formula::Atom(String::from(name))
    }

    pub fn not(formula: &Formula) -> Formula {
        Formula::Not(Box::new(formula.to_owned()))
    }

    pub fn and(formula1: &Formula, formula2: &Formula) -> Formula {
        Formula::And(Box::new(formula1.to_owned()), Box::new(formula2.to_owned()))
    }

    pub fn or(formula1: &Formula, formula2: &Formula) -> Formula {
        Formula::Or(Box::new(formula1.to_owned()), Box::new(formula2.to_owned()))
    }

    pub fn implies(formula1: &Formula, formula2: &Formula) -> Formula {
        Formula::Implies(Box::new(formula1.to_owned()), Box::new(formula2.to_owned()))
    }

    pub fn equivalent(formula1: &Formula, formula2: &Formula) -> Formula {
        Formula::Equivalent(Box::new(formula1.to_owned()), Box::new(formula2.to_owned()))
    }

    pub fn operands(&self) -> Option<(&Formula, &Formula)> {
        match self {
            Formula::And(p, q)
            | Formula::Or(p, q)
            | Formula::Implies(p, q)
            | Formula::Equivalent(p, q) => Some((p.as_ref(), q.as_ref())),
            _ => None,
        }
    }

    pub fn over_atoms<Agg>(&self, combine: &dyn Fn(&str, Agg) -> Agg, aggregate: Agg) -> Agg {
        // Apply an aggregator `combine` across all atoms of `self`, keeping the result
        // in `aggregate`.  Atoms are visited right to left.
        let mut aggregate = aggregate;
        let mut stack = vec![self];
        while let Some(formula) = stack.pop() {
            match formula {
                Formula::Atom(name) => aggregate = combine(name, aggregate),
                Formula::Not(p) => stack.push(p.as_ref()),
                Formula::And(p, q)
                | Formula::Or(p, q)
                | Formula::Implies(p, q)
                | Formula::Equivalent(p, q) => {
                    stack.push(p.as_ref());
                    stack.push(q.as_ref());
                }
            }
        }
        aggregate
    }

    pub fn get_variables(&self) -> BTreeSet<String> {
        let combine: &dyn Fn(&str, BTreeSet<String>) -> BTreeSet<String> = &|name, mut agg| {
            agg.insert(name.to_string());
            agg
        };
        self.over_atoms(combine, BTreeSet::new())
    }

    pub fn negate(&self) -> Formula {
        match self {
            Formula::Not(p) => *p.clone(),
            _ => Formula::not(self),
        }
    }

    pub fn is_literal(&self) -> bool {
        match self {
            Formula::Atom(_) => true,
            Formula::Not(p) => matches!(**p, Formula::Atom(_)),
            _ => false,
        }
    }

    fn post_order(&self) -> Vec<&Formula> {
        // Every sub-formula after its operands, left operand first.
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(formula) = stack.pop() {
            result.push(formula);
            match formula {
                Formula::Atom(_) => {}
                Formula::Not(p) => stack.push(p.as_ref()),
                Formula::And(p, q)
                | Formula::Or(p, q)
                | Formula::Implies(p, q)
                | Formula::Equivalent(p, q) => {
                    stack.push(p.as_ref());
                    stack.push(q.as_ref());
                }
            }
        }
        result.reverse();
        result
    }

    /// Height of the formula tree, counting an atom as 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((formula, depth)) = stack.pop() {
            deepest = cmp::max(deepest, depth);
            match formula {
                Formula::Atom(_) => {}
                Formula::Not(p) => stack.push((p.as_ref(), depth + 1)),
                Formula::And(p, q)
                | Formula::Or(p, q)
                | Formula::Implies(p, q)
                | Formula::Equivalent(p, q) => {
                    stack.push((p.as_ref(), depth + 1));
                    stack.push((q.as_ref(), depth + 1));
                }
            }
        }
        deepest
    }

    pub fn evaluate(&self, valuation: &Valuation) -> bool {
        let mut values: Vec<bool> = Vec::new();
        for formula in self.post_order() {
            let value = match formula {
                Formula::Atom(name) => valuation.get(name).copied().unwrap_or(false),
                Formula::Not(_) => !values.pop().unwrap_or_default(),
                _ => {
                    let (p, q) = pop_pair(&mut values);
                    match formula {
                        Formula::And(_, _) => p && q,
                        Formula::Or(_, _) => p || q,
                        Formula::Implies(_, _) => !p || q,
                        _ => p == q,
                    }
                }
            };
            values.push(value);
        }
        values.pop().unwrap_or_default()
    }
}

// Operands of a binary node when walking in post-order: the right one is on top.
fn pop_pair<T: Default>(values: &mut Vec<T>) -> (T, T) {
    let right = values.pop().unwrap_or_default();
    let left = values.pop().unwrap_or_default();
    (left, right)
}

// ### Canonical equality ###
//
// `And`, `Or` and `Equivalent` are commutative for equality, ordering and hashing:
// `p & q` and `q & p` are the same key.  Formulas compare as if the operands of
// every commutative node were sorted, without building the sorted copy.  The sort
// key is a fingerprint that ignores commutative operand order, and a full
// comparison breaks ties, so colliding fingerprints never make unequal formulas
// equal.  All walks use explicit stacks.

impl Formula {
    fn rank(&self) -> u8 {
        match self {
            Formula::Atom(_) => 0,
            Formula::Not(_) => 1,
            Formula::And(_, _) => 2,
            Formula::Or(_, _) => 3,
            Formula::Implies(_, _) => 4,
            Formula::Equivalent(_, _) => 5,
        }
    }

    pub fn canonical(&self) -> Formula {
        // A copy with the operands of each commutative node in canonical order.
        let mut prints = Fingerprints::default();
        let mut result = self.clone();
        let mut stack = vec![&mut result];
        while let Some(formula) = stack.pop() {
            match formula {
                Formula::Atom(_) => {}
                Formula::Not(p) => stack.push(&mut **p),
                Formula::Implies(p, q) => {
                    stack.push(&mut **p);
                    stack.push(&mut **q);
                }
                Formula::And(p, q) | Formula::Or(p, q) | Formula::Equivalent(p, q) => {
                    if prints.compare(&**p, &**q) == Ordering::Greater {
                        mem::swap(p, q);
                    }
                    stack.push(&mut **p);
                    stack.push(&mut **q);
                }
            }
        }
        result
    }
}

fn mix(rank: u8, left: u64, right: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    (rank, left, right).hash(&mut hasher);
    hasher.finish()
}

// Fingerprints of sub-formulas, memoized by address.  Only valid while the
// formulas it has seen are borrowed and unchanged, so it lives for one comparison.
#[derive(Default)]
struct Fingerprints {
    known: HashMap<*const Formula, u64>,
}

impl Fingerprints {
    fn of(&mut self, formula: &Formula) -> u64 {
        let mut stack = vec![(formula, false)];
        let mut values: Vec<u64> = Vec::new();
        while let Some((node, operands_done)) = stack.pop() {
            let key: *const Formula = node;
            if let Some(&value) = self.known.get(&key) {
                values.push(value);
                continue;
            }
            if !operands_done {
                stack.push((node, true));
                match node {
                    Formula::Atom(_) => {}
                    Formula::Not(p) => stack.push((p.as_ref(), false)),
                    Formula::And(p, q)
                    | Formula::Or(p, q)
                    | Formula::Implies(p, q)
                    | Formula::Equivalent(p, q) => {
                        stack.push((q.as_ref(), false));
                        stack.push((p.as_ref(), false));
                    }
                }
                continue;
            }
            let value = match node {
                Formula::Atom(name) => {
                    let mut hasher = DefaultHasher::new();
                    name.hash(&mut hasher);
                    hasher.finish()
                }
                Formula::Not(_) => mix(1, values.pop().unwrap_or_default(), 0),
                Formula::Implies(_, _) => {
                    let (p, q) = pop_pair(&mut values);
                    mix(4, p, q)
                }
                _ => {
                    let (p, q) = pop_pair(&mut values);
                    mix(node.rank(), cmp::min(p, q), cmp::max(p, q))
                }
            };
            self.known.insert(key, value);
            values.push(value);
        }
        values.pop().unwrap_or_default()
    }

    fn compare(&mut self, p: &Formula, q: &Formula) -> Ordering {
        let (left, right) = (self.of(p), self.of(q));
        match left.cmp(&right) {
            Ordering::Equal => canonical_cmp(p, q, self),
            ordering => ordering,
        }
    }

    fn sorted<'a>(&mut self, p: &'a Formula, q: &'a Formula) -> (&'a Formula, &'a Formula) {
        if self.compare(p, q) == Ordering::Greater {
            (q, p)
        } else {
            (p, q)
        }
    }
}

fn canonical_cmp<'a>(a: &'a Formula, b: &'a Formula, prints: &mut Fingerprints) -> Ordering {
    // Lexicographic over both formulas in pre-order, commutative operands sorted.
    let mut pending = vec![(a, b)];
    while let Some((x, y)) = pending.pop() {
        let ordering = x.rank().cmp(&y.rank());
        if ordering != Ordering::Equal {
            return ordering;
        }
        match (x, y) {
            (Formula::Atom(m), Formula::Atom(n)) => {
                let ordering = m.cmp(n);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Formula::Not(p), Formula::Not(q)) => pending.push((p.as_ref(), q.as_ref())),
            (Formula::Implies(p1, q1), Formula::Implies(p2, q2)) => {
                pending.push((q1.as_ref(), q2.as_ref()));
                pending.push((p1.as_ref(), p2.as_ref()));
            }
            _ => {
                // Same rank, so both are the same commutative connective.
                if let (Some((p1, q1)), Some((p2, q2))) = (x.operands(), y.operands()) {
                    let (low1, high1) = prints.sorted(p1, q1);
                    let (low2, high2) = prints.sorted(p2, q2);
                    pending.push((high1, high2));
                    pending.push((low1, low2));
                }
            }
        }
    }
    Ordering::Equal
}

impl PartialEq for Formula {
    fn eq(&self, other: &Formula) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Formula {}

impl PartialOrd for Formula {
    fn partial_cmp(&self, other: &Formula) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Formula {
    fn cmp(&self, other: &Formula) -> Ordering {
        match (self, other) {
            (Formula::Atom(a), Formula::Atom(b)) => a.cmp(b),
            _ if self.rank() != other.rank() => self.rank().cmp(&other.rank()),
            _ => canonical_cmp(self, other, &mut Fingerprints::default()),
        }
    }
}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Fingerprints::default().of(self).hash(state);
    }
}


// ### Formula Prettifying ###
//
// Printing uses the same ASCII syntax the parser reads, with as few brackets as
// the precedences allow.  All binary connectives associate to the right.

enum Piece<'a> {
    Node(&'a Formula, u32),
    Text(&'static str),
}

impl Formula {
    fn infix(&self) -> (u32, &'static str) {
        match self {
            Formula::And(_, _) => (8, " & "),
            Formula::Or(_, _) => (6, " | "),
            Formula::Implies(_, _) => (4, " -> "),
            _ => (2, " <-> "),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pieces still to be written, next one on top.  A node carries the
        // precedence of its enclosing operator.
        let mut pending = vec![Piece::Node(self, 0)];
        while let Some(piece) = pending.pop() {
            let (formula, prec) = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(formula, prec) => (formula, prec),
            };
            match formula {
                Formula::Atom(name) => f.write_str(name)?,
                Formula::Not(p) => {
                    if prec > 10 {
                        f.write_str("(")?;
                        pending.push(Piece::Text(")"));
                    }
                    f.write_str("~")?;
                    pending.push(Piece::Node(p.as_ref(), 10));
                }
                Formula::And(p, q)
                | Formula::Or(p, q)
                | Formula::Implies(p, q)
                | Formula::Equivalent(p, q) => {
                    let (own, symbol) = formula.infix();
                    if prec > own {
                        f.write_str("(")?;
                        pending.push(Piece::Text(")"));
                    }
                    pending.push(Piece::Node(q.as_ref(), own));
                    pending.push(Piece::Text(symbol));
                    pending.push(Piece::Node(p.as_ref(), own + 1));
                }
            }
        }
        Ok(())
    }
}

impl Formula {
    pub fn pprint<W: Write>(&self, dest: &mut W) -> io::Result<()> {
        writeln!(dest, "<<{self}>>")
    }
}


// ### Normal Forms ###

// A clause is a disjunction of literals; a `ClauseSet` is the conjunction of
// its clauses.  Clauses produced from badly normalized input may hold
// non-literal fragments.  The empty clause is a contradiction.
pub type Clause = BTreeSet<Formula>;
pub type ClauseSet = BTreeSet<Clause>;

pub const CNF_DEPTH_LIMIT: usize = 1000;
pub const CNF_CLAUSE_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CnfError {
    DepthLimit(usize),
    ClauseLimit(usize),
}

impl fmt::Display for CnfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CnfError::DepthLimit(limit) => {
                write!(f, "CNF conversion exceeded the depth limit of {limit}")
            }
            CnfError::ClauseLimit(limit) => {
                write!(f, "CNF conversion exceeded the limit of {limit} clauses")
            }
        }
    }
}

impl std::error::Error for CnfError {}

struct CnfBounds {
    depth_limit: usize,
    clause_limit: usize,
}

fn and_operands(formula: &Formula) -> Option<(&Formula, &Formula)> {
    match formula {
        Formula::And(p, q) => Some((p.as_ref(), q.as_ref())),
        _ => None,
    }
}

fn or_operands(formula: &Formula) -> Option<(&Formula, &Formula)> {
    match formula {
        Formula::Or(p, q) => Some((p.as_ref(), q.as_ref())),
        _ => None,
    }
}

impl Formula {
    fn collect_chain(&self, split: fn(&Formula) -> Option<(&Formula, &Formula)>) -> Vec<&Formula> {
        // Leaves of the maximal same-connective subtree at `self`, left to right.
        // Iterative, so long chains do not grow the stack.
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(formula) = stack.pop() {
            match split(formula) {
                Some((p, q)) => {
                    stack.push(q);
                    stack.push(p);
                }
                None => result.push(formula),
            }
        }
        result
    }

    pub fn conjuncts(&self) -> Vec<&Formula> {
        self.collect_chain(and_operands)
    }

    pub fn disjuncts(&self) -> Vec<&Formula> {
        self.collect_chain(or_operands)
    }

    fn balanced(
        formulas: &[Formula],
        empty_name: &str,
        join: fn(Box<Formula>, Box<Formula>) -> Formula,
    ) -> Formula {
        match formulas {
            [] => Formula::atom(empty_name),
            [single] => single.clone(),
            _ => {
                let mid = formulas.len() / 2;
                let left = Formula::balanced(&formulas[..mid], empty_name, join);
                let right = Formula::balanced(&formulas[mid..], empty_name, join);
                join(Box::new(left), Box::new(right))
            }
        }
    }

    pub fn balanced_and(formulas: &[Formula]) -> Formula {
        // Conjunction of `formulas` as a tree of logarithmic depth.
        Formula::balanced(formulas, TRUE_NAME, Formula::And)
    }

    pub fn balanced_or(formulas: &[Formula]) -> Formula {
        Formula::balanced(formulas, FALSE_NAME, Formula::Or)
    }

    fn distribute(left: &Formula, right: &Formula, bounds: &CnfBounds) -> Result<Formula, CnfError> {
        // For CNF `left` = A1 & ... & An and `right` = B1 & ... & Bm,
        // `left | right` is the conjunction of all Ai | Bj.
        let left_conjuncts = left.conjuncts();
        let right_conjuncts = right.conjuncts();
        if left_conjuncts.len() * right_conjuncts.len() > bounds.clause_limit {
            return Err(CnfError::ClauseLimit(bounds.clause_limit));
        }
        let clauses: Vec<Formula> = iproduct!(left_conjuncts.iter(), right_conjuncts.iter())
            .map(|(a, b)| {
                let literals: Vec<Formula> = a
                    .disjuncts()
                    .into_iter()
                    .chain(b.disjuncts())
                    .cloned()
                    .collect();
                Formula::balanced_or(&literals)
            })
            .collect();
        Ok(Formula::balanced_and(&clauses))
    }

    fn cnf_inner(&self, depth: usize, bounds: &CnfBounds) -> Result<Formula, CnfError> {
        if depth > bounds.depth_limit {
            return Err(CnfError::DepthLimit(bounds.depth_limit));
        }
        let next = depth + 1;
        match self {
            Formula::Atom(_) => Ok(self.clone()),
            Formula::Not(inner) => match inner.as_ref() {
                Formula::Atom(_) => Ok(self.clone()),
                Formula::Not(p) => p.cnf_inner(next, bounds),
                Formula::And(p, q) => {
                    Formula::or(&Formula::not(p), &Formula::not(q)).cnf_inner(next, bounds)
                }
                Formula::Or(p, q) => {
                    Formula::and(&Formula::not(p), &Formula::not(q)).cnf_inner(next, bounds)
                }
                Formula::Implies(p, q) => Formula::and(p, &Formula::not(q)).cnf_inner(next, bounds),
                Formula::Equivalent(p, q) => Formula::or(
                    &Formula::and(p, &Formula::not(q)),
                    &Formula::and(&Formula::not(p), q),
                )
                .cnf_inner(next, bounds),
            },
            Formula::Implies(p, q) => Formula::or(&Formula::not(p), q).cnf_inner(next, bounds),
            Formula::Equivalent(p, q) => Formula::and(
                &Formula::or(&Formula::not(p), q),
                &Formula::or(&Formula::not(q), p),
            )
            .cnf_inner(next, bounds),
            Formula::And(p, q) => {
                let left = p.cnf_inner(next, bounds)?;
                let right = q.cnf_inner(next, bounds)?;
                let conjuncts: Vec<Formula> = left
                    .conjuncts()
                    .into_iter()
                    .chain(right.conjuncts())
                    .cloned()
                    .collect();
                Ok(Formula::balanced_and(&conjuncts))
            }
            Formula::Or(p, q) => {
                let left = p.cnf_inner(next, bounds)?;
                let right = q.cnf_inner(next, bounds)?;
                Formula::distribute(&left, &right, bounds)
            }
        }
    }

    pub fn to_cnf_bounded(
        &self,
        depth_limit: usize,
        clause_limit: usize,
    ) -> Result<Formula, CnfError> {
        // Conversion recurses on the formula, so refuse deep input up front.
        if self.depth() > depth_limit {
            return Err(CnfError::DepthLimit(depth_limit));
        }
        let bounds = CnfBounds {
            depth_limit,
            clause_limit,
        };
        self.cnf_inner(0, &bounds)
    }

    pub fn to_cnf(&self) -> Result<Formula, CnfError> {
        self.to_cnf_bounded(CNF_DEPTH_LIMIT, CNF_CLAUSE_LIMIT)
    }

    fn is_disjunction_of_literals(&self) -> bool {
        self.disjuncts().iter().all(|f| f.is_literal())
    }

    pub fn is_cnf(&self) -> bool {
        self.conjuncts()
            .iter()
            .all(|f| f.is_disjunction_of_literals())
    }
}

pub fn cnf_to_clauses(formula: &Formula) -> ClauseSet {
    // Each conjunct of a CNF formula becomes one clause holding its disjuncts.
    // Conjuncts that are neither a literal nor a disjunction are kept whole as
    // singleton clauses.
    formula
        .conjuncts()
        .into_iter()
        .map(|conjunct| match conjunct {
            Formula::Or(_, _) => conjunct.disjuncts().into_iter().cloned().collect(),
            _ => Clause::from([conjunct.clone()]),
        })
        .collect()
}

#[cfg(test)]
mod normal_form_tests {
    use super::*;
    use crate::propositional_logic::get_all_valuations;

    fn atom(name: &str) -> Formula {
        Formula::atom(name)
    }

    fn semantically_equal(f: &Formula, g: &Formula) -> bool {
        let atoms: BTreeSet<String> = &f.get_variables() | &g.get_variables();
        get_all_valuations(&atoms)
            .iter()
            .all(|v| f.evaluate(v) == g.evaluate(v))
    }

    fn sample_formulas() -> Vec<Formula> {
        let (p, q, r, s) = (atom("p"), atom("q"), atom("r"), atom("s"));
        vec![
            p.clone(),
            Formula::not(&Formula::not(&p)),
            Formula::implies(&p, &q),
            Formula::equivalent(&p, &q),
            Formula::not(&Formula::equivalent(&p, &q)),
            Formula::not(&Formula::implies(&p, &Formula::or(&q, &r))),
            Formula::or(&Formula::and(&p, &q), &Formula::and(&r, &s)),
            Formula::or(&Formula::and(&p, &q), &Formula::or(&r, &Formula::and(&s, &p))),
            Formula::equivalent(&Formula::and(&p, &q), &Formula::or(&r, &Formula::not(&s))),
            Formula::not(&Formula::and(&Formula::or(&p, &q), &Formula::implies(&r, &s))),
        ]
    }

    #[test]
    fn test_balanced_builders() {
        let items: Vec<Formula> = ["a", "b", "c", "d", "e"].iter().map(|n| atom(n)).collect();
        assert_eq!(Formula::balanced_and(&[]), atom(TRUE_NAME));
        assert_eq!(Formula::balanced_or(&[]), atom(FALSE_NAME));
        assert_eq!(Formula::balanced_and(&items[..1]), atom("a"));
        assert_eq!(
            Formula::balanced_and(&items[..2]),
            Formula::and(&atom("a"), &atom("b"))
        );
        // Split at the midpoint: (a & b) & (c & (d & e)).
        let desired = Formula::and(
            &Formula::and(&atom("a"), &atom("b")),
            &Formula::and(&atom("c"), &Formula::and(&atom("d"), &atom("e"))),
        );
        assert_eq!(Formula::balanced_and(&items), desired);
    }

    #[test]
    fn test_conjuncts_of_deep_chain() {
        // A deep left-leaning chain is flattened without recursion.
        let mut formula = atom("x0");
        for i in 1..2000 {
            formula = Formula::And(Box::new(formula), Box::new(atom(&format!("x{i}"))));
        }
        let conjuncts = formula.conjuncts();
        assert_eq!(conjuncts.len(), 2000);
        assert_eq!(*conjuncts[0], atom("x0"));
        assert_eq!(*conjuncts[1999], atom("x1999"));
    }

    #[test]
    fn test_cnf_implies_and_equivalent() {
        let (p, q) = (atom("p"), atom("q"));
        assert_eq!(
            Formula::implies(&p, &q).to_cnf().unwrap(),
            Formula::or(&Formula::not(&p), &q)
        );
        assert_eq!(
            Formula::equivalent(&p, &q).to_cnf().unwrap(),
            Formula::and(
                &Formula::or(&Formula::not(&p), &q),
                &Formula::or(&Formula::not(&q), &p)
            )
        );
    }

    #[test]
    fn test_cnf_de_morgan() {
        let (p, q) = (atom("p"), atom("q"));
        assert_eq!(Formula::not(&Formula::not(&p)).to_cnf().unwrap(), p);
        assert_eq!(
            Formula::not(&Formula::and(&p, &q)).to_cnf().unwrap(),
            Formula::or(&Formula::not(&p), &Formula::not(&q))
        );
        assert_eq!(
            Formula::not(&Formula::or(&p, &q)).to_cnf().unwrap(),
            Formula::and(&Formula::not(&p), &Formula::not(&q))
        );
        assert_eq!(
            Formula::not(&Formula::implies(&p, &q)).to_cnf().unwrap(),
            Formula::and(&p, &Formula::not(&q))
        );
    }

    #[test]
    fn test_cnf_distributes_or_over_and() {
        let (p, q, r) = (atom("p"), atom("q"), atom("r"));
        let formula = Formula::or(&Formula::and(&p, &q), &r);
        let desired = Formula::and(&Formula::or(&p, &r), &Formula::or(&q, &r));
        assert_eq!(formula.to_cnf().unwrap(), desired);
    }

    #[test]
    fn test_cnf_is_cnf_and_equivalent() {
        for formula in sample_formulas() {
            let cnf = formula.to_cnf().unwrap();
            assert!(cnf.is_cnf(), "{cnf} is not in CNF");
            assert!(semantically_equal(&formula, &cnf), "{formula} vs {cnf}");
        }
    }

    #[test]
    fn test_cnf_idempotence() {
        for formula in sample_formulas() {
            let once = formula.to_cnf().unwrap();
            let twice = once.to_cnf().unwrap();
            assert!(semantically_equal(&once, &twice));
        }
    }

    #[test]
    fn test_cnf_depth_limit() {
        let mut formula = atom("p");
        for _ in 0..50 {
            formula = Formula::not(&Formula::not(&formula));
        }
        assert_eq!(formula.to_cnf_bounded(10, 100), Err(CnfError::DepthLimit(10)));
        assert_eq!(formula.to_cnf().unwrap(), atom("p"));
    }

    #[test]
    fn test_cnf_refuses_deep_input() {
        let mut formula = atom("p");
        for i in 0..5000 {
            formula = Formula::Or(Box::new(atom(&format!("q{i}"))), Box::new(formula));
        }
        assert_eq!(formula.to_cnf(), Err(CnfError::DepthLimit(CNF_DEPTH_LIMIT)));
    }

    #[test]
    fn test_cnf_clause_limit() {
        // (a1 & b1) | (a2 & b2) | ... distributes to 2^n clauses.
        let disjuncts: Vec<Formula> = (0..8)
            .map(|i| Formula::and(&atom(&format!("a{i}")), &atom(&format!("b{i}"))))
            .collect();
        let formula = Formula::balanced_or(&disjuncts);
        assert_eq!(formula.to_cnf_bounded(100, 64), Err(CnfError::ClauseLimit(64)));
        let cnf = formula.to_cnf().unwrap();
        assert_eq!(cnf.conjuncts().len(), 256);
    }

    #[test]
    fn test_is_cnf() {
        let (a, b, c) = (atom("A"), atom("B"), atom("C"));
        assert!(Formula::and(&Formula::not(&a), &b).is_cnf());
        assert!(Formula::or(&Formula::not(&a), &b).is_cnf());
        assert!(!Formula::or(&Formula::and(&a, &c), &b).is_cnf());
        assert!(!Formula::implies(&a, &b).is_cnf());
        assert!(Formula::and(&Formula::or(&Formula::or(&a, &b), &c), &b).is_cnf());
    }

    #[test]
    fn test_cnf_to_clauses() {
        let (p, q, r) = (atom("p"), atom("q"), atom("r"));
        let formula = Formula::and(
            &Formula::or(&p, &Formula::or(&Formula::not(&q), &r)),
            &Formula::and(&Formula::not(&p), &q),
        );
        let desired = ClauseSet::from([
            Clause::from([p.clone(), Formula::not(&q), r.clone()]),
            Clause::from([Formula::not(&p)]),
            Clause::from([q.clone()]),
        ]);
        assert_eq!(cnf_to_clauses(&formula), desired);
    }

    #[test]
    fn test_cnf_to_clauses_keeps_fragments() {
        // Non-literal conjuncts and disjuncts are kept as they are.
        let (p, q) = (atom("p"), atom("q"));
        let fragment = Formula::implies(&p, &q);
        let formula = Formula::and(&fragment, &Formula::or(&Formula::and(&p, &q), &p));
        let desired = ClauseSet::from([
            Clause::from([fragment.clone()]),
            Clause::from([Formula::and(&p, &q), p.clone()]),
        ]);
        assert_eq!(cnf_to_clauses(&formula), desired);
    }

    #[test]
    fn test_cnf_to_clauses_merges_duplicates() {
        let (p, q) = (atom("p"), atom("q"));
        let formula = Formula::and(&Formula::or(&p, &q), &Formula::or(&q, &p));
        assert_eq!(cnf_to_clauses(&formula).len(), 1);
    }
}
