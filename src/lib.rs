pub mod belief_base;
pub mod contraction;
pub mod entailment;
pub mod formula;
pub mod parse;
pub mod propositional_logic;
pub mod revision;
mod token;
pub mod utils;
