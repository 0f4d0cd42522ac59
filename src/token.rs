// ### Token constants and lexing library. ###

use regex::Regex;

use crate::parse::ParseError;

// A single token at the very start of the (already left-trimmed) input.
// `<->` has to be tried before `->`.
const TOKEN_PATTERN: &str = r"^(<->|->|↔|→|[~¬&∧|∨()]|[A-Za-z][A-Za-z0-9_]*)";

pub const NOT: &str = "~";
pub const AND: &str = "&";
pub const OR: &str = "|";
pub const IMP: &str = "->";
pub const IFF: &str = "<->";

fn normalize(token: &str) -> &str {
    // Unicode connectives are lexed to their ASCII spelling so that the
    // parser only ever sees one symbol per connective.
    match token {
        "¬" => NOT,
        "∧" => AND,
        "∨" => OR,
        "→" => IMP,
        "↔" => IFF,
        _ => token,
    }
}

pub fn is_identifier(token: &str) -> bool {
    token
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic())
}

pub fn lex(input: &str) -> Result<Vec<String>, ParseError> {
    // Read one token off the front of the input at a time until only
    // whitespace is left.
    let re = Regex::new(TOKEN_PATTERN).expect("TOKEN_PATTERN is a valid regex");
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        let head = match trimmed.chars().next() {
            Some(c) => c,
            None => return Ok(tokens),
        };
        match re.captures(trimmed).and_then(|caps| caps.get(1)) {
            Some(token) => {
                tokens.push(normalize(token.as_str()).to_string());
                rest = &trimmed[token.end()..];
            }
            None => return Err(ParseError::UnrecognizedCharacter(head)),
        }
    }
}
