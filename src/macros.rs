//! Macro preprocessor: parses `mcro`/`mcroend` and expands invocations into
//! a plain instruction/directive stream (spec 4.1)
//!
//! Note on spelling: the documentation this assembler was modeled after
//! writes `.mcro`/`.mcroend`, but the grammar actually recognized is the
//! undotted `mcro`/`mcroend` (spec 9, open question (i)); this is the
//! spelling implemented here.

use std::collections::{HashMap, HashSet};

use crate::error::Error;
use crate::lex;
use crate::names;

const MAX_LINE_LENGTH: usize = 80;

#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub body: Vec<String>,
}

/// Result of preprocessing one file: the expanded stream plus every error
/// encountered along the way (scanning continues past errors; per spec 4.1
/// the caller discards `lines` entirely if `errors` is non-empty)
pub struct Expansion {
    pub lines: Vec<String>,
    pub macro_names: HashSet<String>,
    pub errors: Vec<Error>,
}

struct State {
    macros: HashMap<String, Macro>,
    macro_names: HashSet<String>,
    open: Option<Macro>,
    out: Vec<String>,
    errors: Vec<Error>,
}

/// Expand every macro invocation in `source`, removing macro definitions
pub fn preprocess(source: &str) -> Expansion {
    let mut state = State {
        macros: HashMap::new(),
        macro_names: HashSet::new(),
        open: None,
        out: Vec::new(),
        errors: Vec::new(),
    };

    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        if raw_line.chars().count() > MAX_LINE_LENGTH {
            state.errors.push(Error::LineTooLong { line: line_number, length: raw_line.chars().count() });
            continue;
        }
        process_line(&mut state, raw_line, line_number);
    }

    if let Some(open) = &state.open {
        state.errors.push(Error::MacroUnclosedDefinition { line: source.lines().count(), name: open.name.clone() });
    }

    Expansion { lines: state.out, macro_names: state.macro_names, errors: state.errors }
}

fn process_line(state: &mut State, raw_line: &str, line_number: usize) {
    let trimmed = raw_line.trim_start();

    // inside a definition every line is appended verbatim to the body,
    // blank and comment lines included, so they replay at every invocation
    // site instead of leaking into the expanded stream at definition time
    if let Some(open) = &mut state.open {
        if trimmed.is_empty() || trimmed.starts_with(';') {
            open.body.push(raw_line.to_string());
            return;
        }

        let (first, rest) = lex::split_first_token(trimmed);
        if first == "mcroend" {
            if !rest.is_empty() {
                state.errors.push(Error::MacroSyntax { line: line_number });
                return;
            }
            let finished = state.open.take().unwrap();
            if finished.body.is_empty() {
                state.errors.push(Error::MacroEmptyBody { line: line_number, name: finished.name.clone() });
                return;
            }
            state.macros.insert(finished.name.clone(), finished);
            return;
        }
        if first == "mcro" {
            state.errors.push(Error::MacroNestedDefinition { line: line_number });
            return;
        }
        open.body.push(raw_line.to_string());
        return;
    }

    if trimmed.is_empty() || trimmed.starts_with(';') {
        state.out.push(raw_line.to_string());
        return;
    }

    let (first, rest) = lex::split_first_token(trimmed);

    if first == "mcro" {
        begin_definition(state, rest, line_number);
        return;
    }
    if first == "mcroend" {
        state.errors.push(Error::MacroEndWithoutBegin { line: line_number });
        return;
    }
    if let Some(found) = state.macros.get(first) {
        state.out.extend(found.body.iter().cloned());
        return;
    }
    state.out.push(raw_line.to_string());
}

fn begin_definition(state: &mut State, rest: &str, line_number: usize) {
    let (name, trailing) = lex::split_first_token(rest);
    if name.is_empty() || !trailing.is_empty() {
        state.errors.push(Error::MacroSyntax { line: line_number });
        return;
    }
    if names::is_reserved(name) {
        state.errors.push(Error::MacroIllegalName {
            line: line_number,
            name: name.to_string(),
            problem: crate::error::IdentifierProblem::Reserved,
        });
        return;
    }
    if names::is_register(name) {
        state.errors.push(Error::MacroIllegalName {
            line: line_number,
            name: name.to_string(),
            problem: crate::error::IdentifierProblem::Register,
        });
        return;
    }
    if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        || !name.chars().all(|c| c.is_ascii_alphanumeric())
        || name.len() > 30
    {
        state.errors.push(Error::MacroIllegalName {
            line: line_number,
            name: name.to_string(),
            problem: crate::error::IdentifierProblem::Malformed,
        });
        return;
    }
    if state.macros.contains_key(name) {
        state.errors.push(Error::MacroDuplicateName { line: line_number, name: name.to_string() });
        return;
    }
    state.macro_names.insert(name.to_string());
    state.open = Some(Macro { name: name.to_string(), body: Vec::new() });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_plain_source() {
        let result = preprocess("mov r1, r2\nstop\n");
        assert!(result.errors.is_empty());
        assert_eq!(result.lines, vec!["mov r1, r2", "stop"]);
    }

    #[test]
    fn expands_two_invocations() {
        let source = "mcro FOO\nadd r1,r2\nmcroend\nFOO\nFOO\n";
        let result = preprocess(source);
        assert!(result.errors.is_empty());
        assert_eq!(result.lines, vec!["add r1,r2", "add r1,r2"]);
        assert!(result.macro_names.contains("FOO"));
    }

    #[test]
    fn comments_and_blanks_pass_through_untouched() {
        let result = preprocess("; a comment\n\nmov r1, r2\n");
        assert!(result.errors.is_empty());
        assert_eq!(result.lines, vec!["; a comment", "", "mov r1, r2"]);
    }

    #[test]
    fn blank_and_comment_lines_inside_a_macro_body_replay_on_invocation() {
        let source = "mcro FOO\nadd r1,r2\n; a comment\n\nsub r1,r2\nmcroend\nFOO\n";
        let result = preprocess(source);
        assert!(result.errors.is_empty());
        // none of the body's blank/comment lines leak out at definition time
        assert_eq!(result.lines, vec!["add r1,r2", "; a comment", "", "sub r1,r2"]);
    }

    #[test]
    fn unclosed_definition_is_an_error() {
        let result = preprocess("mcro FOO\nadd r1, r2\n");
        assert!(matches!(result.errors.as_slice(), [Error::MacroUnclosedDefinition { .. }]));
    }

    #[test]
    fn empty_body_is_an_error() {
        let result = preprocess("mcro FOO\nmcroend\n");
        assert!(matches!(result.errors.as_slice(), [Error::MacroEmptyBody { .. }]));
    }

    #[test]
    fn nested_definition_is_an_error() {
        let result = preprocess("mcro FOO\nmcro BAR\nmcroend\nmcroend\n");
        assert!(result.errors.iter().any(|e| matches!(e, Error::MacroNestedDefinition { .. })));
    }

    #[test]
    fn reserved_macro_name_is_rejected() {
        let result = preprocess("mcro mov\nadd r1, r2\nmcroend\n");
        assert!(matches!(result.errors.as_slice(), [Error::MacroIllegalName { .. }]));
    }

    #[test]
    fn duplicate_macro_name_is_rejected() {
        let result = preprocess("mcro FOO\nadd r1, r2\nmcroend\nmcro FOO\nadd r1, r2\nmcroend\n");
        assert!(result.errors.iter().any(|e| matches!(e, Error::MacroDuplicateName { .. })));
    }

    #[test]
    fn line_too_long_is_rejected() {
        let long_line = "a".repeat(81);
        let result = preprocess(&long_line);
        assert!(matches!(result.errors.as_slice(), [Error::LineTooLong { .. }]));
    }
}
