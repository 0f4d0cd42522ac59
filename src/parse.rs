// General parsing utilities independent of the particular grammar.

use std::fmt;

use log::debug;

use crate::token::lex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnrecognizedCharacter(char),
    UnexpectedEnd,
    UnexpectedToken(String),
    UnclosedBracket,
    UnmatchedClosingBracket,
    TrailingInput(Vec<String>),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnrecognizedCharacter(c) => write!(f, "unrecognized character {c:?}"),
            ParseError::UnexpectedEnd => write!(f, "unexpected end of input"),
            ParseError::UnexpectedToken(token) => write!(f, "unexpected token {token:?}"),
            ParseError::UnclosedBracket => write!(f, "closing bracket expected"),
            ParseError::UnmatchedClosingBracket => write!(f, "closing bracket without opening"),
            ParseError::TrailingInput(rest) => write!(f, "unparsed input {rest:?}"),
        }
    }
}

impl std::error::Error for ParseError {}

// Parsing functions below take the form of parsing a piece off the front
// of a [String], returning the parsed piece and the remaining input.
pub type PartialParseResult<'a, AST> = (AST, &'a [String]);
pub type MaybePartialParseResult<'a, AST> = Result<PartialParseResult<'a, AST>, ParseError>;

// Subparsers are passed as trait objects so that the recursive builders below
// do not instantiate an unbounded number of function instances.
// See https://github.com/rust-lang/rust/issues/43520
pub type MaybeSubparserFuncType<'c, T> =
    &'c dyn for<'b> Fn(&'b [String]) -> MaybePartialParseResult<'b, T>;

pub struct MaybeSubparser<'a, AST> {
    pub fun: MaybeSubparserFuncType<'a, AST>,
}

impl<'a, AST> MaybeSubparser<'a, AST> {
    fn call<'b>(&self, input: &'b [String]) -> MaybePartialParseResult<'b, AST> {
        (self.fun)(input)
    }
}

impl<'a, AST> Clone for MaybeSubparser<'a, AST> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, AST> Copy for MaybeSubparser<'a, AST> {}

// ### Abstract parser builders

pub fn parse_right_infix<'a, AST>(
    op_symbol: &str,
    op_constructor: fn(AST, AST) -> AST,
    subparser: MaybeSubparser<AST>,
    input: &'a [String],
) -> MaybePartialParseResult<'a, AST> {
    // Parser builder for right-associative infix operations: `a op b op c` is
    // read as `a op (b op c)`.  `op_constructor` builds the AST for `op_symbol`.
    // The chain is read in a loop, so its length does not grow the stack.
    let (mut ast, mut rest) = subparser.call(input)?;
    let mut left_operands = Vec::new();
    while let [head, tail @ ..] = rest {
        if head != op_symbol {
            break;
        }
        let (next, after) = subparser.call(tail)?;
        left_operands.push(ast);
        ast = next;
        rest = after;
    }
    let ast = left_operands
        .into_iter()
        .rev()
        .fold(ast, |right, left| op_constructor(left, right));
    Ok((ast, rest))
}

pub fn parse_bracketed<'a, AST>(
    subparser: MaybeSubparser<AST>,
    input: &'a [String],
) -> MaybePartialParseResult<'a, AST> {
    // To be called after an opening bracket has been read.
    // The `subparser` should parse all the way to the closing bracket.
    debug!("parse_bracketed called on input {input:?}");
    let (ast, rest) = subparser.call(input)?;

    match rest {
        [head, tail @ ..] if head == ")" => Ok((ast, tail)),
        _ => Err(ParseError::UnclosedBracket),
    }
}

pub fn generic_parser<AST>(
    inner: for<'b> fn(&'b [String]) -> MaybePartialParseResult<'b, AST>,
    input: &str,
) -> Result<AST, ParseError> {
    // Tokenize, call the parser on the result and insist that it consumes
    // every token.
    let lexed = lex(input)?;
    debug!("generic_parser called on tokens {lexed:?}");
    let (expr, rest) = inner(&lexed[..])?;
    match rest {
        [] => Ok(expr),
        [head, ..] if head == ")" => Err(ParseError::UnmatchedClosingBracket),
        _ => Err(ParseError::TrailingInput(rest.to_vec())),
    }
}
