//! Fixed opcode/directive/register vocabulary and identifier legality (spec 4.2)

use std::collections::HashSet;

use crate::error::{Error, IdentifierProblem};

/// The 16 opcode mnemonics, in their numbering order
pub const OPCODES: [&str; 16] = [
    "mov", "cmp", "add", "sub", "lea", "clr", "not", "inc", "dec", "jmp", "bne", "jsr", "red", "prn", "rts", "stop",
];

/// Directive names without their leading dot
pub const DIRECTIVE_NAMES: [&str; 5] = ["data", "string", "mat", "entry", "extern"];

/// The two macro keywords
pub const MACRO_KEYWORDS: [&str; 2] = ["mcro", "mcroend"];

/// `r0`..`r7`, nothing else
pub fn is_register(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 2 && bytes[0] == b'r' && (b'0'..=b'7').contains(&bytes[1])
}

/// The union of opcode mnemonics, macro keywords and bare directive names
pub fn is_reserved(name: &str) -> bool {
    OPCODES.contains(&name) || DIRECTIVE_NAMES.contains(&name) || MACRO_KEYWORDS.contains(&name)
}

fn identifier_problem(name: &str, macro_names: &HashSet<String>) -> Option<IdentifierProblem> {
    if name.is_empty() || !name.chars().next().unwrap().is_ascii_alphabetic() {
        return Some(IdentifierProblem::Malformed);
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some(IdentifierProblem::Malformed);
    }
    if name.len() > 30 {
        return Some(IdentifierProblem::TooLong);
    }
    if is_reserved(name) {
        return Some(IdentifierProblem::Reserved);
    }
    if is_register(name) {
        return Some(IdentifierProblem::Register);
    }
    if macro_names.contains(name) {
        return Some(IdentifierProblem::MacroName);
    }
    None
}

/// Whether `name` obeys the label grammar of spec 3
pub fn is_identifier(name: &str, macro_names: &HashSet<String>) -> bool {
    identifier_problem(name, macro_names).is_none()
}

/// Validate an identifier, producing the specific diagnostic spec 3 calls for
pub fn validate_identifier(name: &str, line: usize, macro_names: &HashSet<String>) -> Result<(), Error> {
    match identifier_problem(name, macro_names) {
        None => Ok(()),
        Some(problem) => Err(Error::InvalidIdentifier { line, name: name.to_string(), problem }),
    }
}
