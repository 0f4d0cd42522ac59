// ### PROPOSITIONAL LOGIC ###
// The concrete formula grammar, valuations and truth tables.
//
// Grammar, loosest binding first (every binary connective is right-associative):
//
//   iff   := imp ("<->" iff)?
//   imp   := or ("->" imp)?
//   or    := and ("|" or)?
//   and   := unary ("&" and)?
//   unary := "~" unary | "(" iff ")" | identifier

use std::cmp;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::parse::{
    generic_parser, parse_bracketed, parse_right_infix, MaybePartialParseResult, MaybeSubparser,
    ParseError,
};
use crate::token::{is_identifier, AND, IFF, IMP, NOT, OR};

pub use crate::formula::{Formula, Valuation};

fn make_iff(p: Formula, q: Formula) -> Formula {
    Formula::Equivalent(Box::new(p), Box::new(q))
}

fn make_imp(p: Formula, q: Formula) -> Formula {
    Formula::Implies(Box::new(p), Box::new(q))
}

fn make_or(p: Formula, q: Formula) -> Formula {
    Formula::Or(Box::new(p), Box::new(q))
}

fn make_and(p: Formula, q: Formula) -> Formula {
    Formula::And(Box::new(p), Box::new(q))
}

impl Formula {
    fn _parse_iff(input: &[String]) -> MaybePartialParseResult<'_, Formula> {
        parse_right_infix(
            IFF,
            make_iff,
            MaybeSubparser {
                fun: &Formula::_parse_imp,
            },
            input,
        )
    }

    fn _parse_imp(input: &[String]) -> MaybePartialParseResult<'_, Formula> {
        parse_right_infix(
            IMP,
            make_imp,
            MaybeSubparser {
                fun: &Formula::_parse_or,
            },
            input,
        )
    }

    fn _parse_or(input: &[String]) -> MaybePartialParseResult<'_, Formula> {
        parse_right_infix(
            OR,
            make_or,
            MaybeSubparser {
                fun: &Formula::_parse_and,
            },
            input,
        )
    }

    fn _parse_and(input: &[String]) -> MaybePartialParseResult<'_, Formula> {
        parse_right_infix(
            AND,
            make_and,
            MaybeSubparser {
                fun: &Formula::_parse_unary,
            },
            input,
        )
    }

    fn _parse_unary(input: &[String]) -> MaybePartialParseResult<'_, Formula> {
        match input {
            [head, ..] if head == NOT => {
                // Runs of negations are counted rather than recursed into.
                let negations = input.iter().take_while(|token| *token == NOT).count();
                let (inner, rest) = Formula::_parse_unary(&input[negations..])?;
                let negated = (0..negations).fold(inner, |f, _| Formula::Not(Box::new(f)));
                Ok((negated, rest))
            }
            [head, rest @ ..] if head == "(" => parse_bracketed(
                MaybeSubparser {
                    fun: &Formula::_parse_iff,
                },
                rest,
            ),
            [head, ..] if head == ")" => Err(ParseError::UnmatchedClosingBracket),
            [head, rest @ ..] if is_identifier(head) => Ok((Formula::atom(head), rest)),
            [head, ..] => Err(ParseError::UnexpectedToken(head.clone())),
            [] => Err(ParseError::UnexpectedEnd),
        }
    }

    pub fn parse(input: &str) -> Result<Formula, ParseError> {
        generic_parser(Formula::_parse_iff, input)
    }
}

pub fn parse_formula(input: &str) -> Result<Formula, ParseError> {
    Formula::parse(input)
}


// ### Eval / Truth tables ###

pub fn get_all_valuations(atoms: &BTreeSet<String>) -> Vec<Valuation> {
    // Initialize result to the singleton with the empty valuation.
    // WARNING, running time/space is Theta(exp(|atoms|))

    let mut result = vec![BTreeMap::new()];
    for atom in atoms {
        let mut new_result = Vec::new();
        for val in result {
            let mut positive = val.clone();
            positive.insert(atom.clone(), true);
            new_result.push(positive);
            let mut negative = val;
            negative.insert(atom.clone(), false);
            new_result.push(negative)
        }
        result = new_result;
    }
    result
}

impl Formula {
    pub fn print_truthtable(&self, dest: &mut impl Write) -> io::Result<()> {
        let atoms = self.get_variables();
        let sorted_atoms = Vec::from_iter(&atoms);
        let column_width = 1 + cmp::max(5, atoms.iter().map(|x| x.len()).max().unwrap_or(0));
        // Pad String `s` with enough spaces to be `column_width`.
        let pad = |s: String| format!("{s:<column_width$}");
        let truth_string = |value: bool| {
            if value {
                String::from("true")
            } else {
                String::from("false")
            }
        };
        let make_row = |val: &Valuation| {
            let input_string = String::from_iter(
                sorted_atoms
                    .iter()
                    .map(|x| val[*x])
                    .map(truth_string)
                    .map(pad),
            );
            let output_string = truth_string(self.evaluate(val));
            format!("{input_string}| {output_string}\n")
        };
        let body = String::from_iter(get_all_valuations(&atoms).iter().map(make_row));

        let header_lhs = String::from_iter(sorted_atoms.iter().map(|p| p.to_string()).map(pad));
        let header = format!("{header_lhs}| formula");
        let separator = "-".repeat(header.len());
        write!(dest, "{header}\n{separator}\n{body}{separator}\n")
    }

    // The following are exhaustive over all valuations of the formula's atoms.

    pub fn tautology(&self) -> bool {
        get_all_valuations(&self.get_variables())
            .iter()
            .all(|val| self.evaluate(val))
    }

    pub fn unsatisfiable(&self) -> bool {
        Formula::not(self).tautology()
    }

    pub fn satisfiable(&self) -> bool {
        !self.unsatisfiable()
    }

    pub fn logically_equivalent(&self, formula: &Formula) -> bool {
        Formula::equivalent(self, formula).tautology()
    }
}
