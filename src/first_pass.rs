//! First pass: lexes and parses the expanded stream, builds the symbol
//! table, and produces the instruction/data images with unresolved label
//! placeholders plus the list of pending fix-ups (spec 4.3)

use crate::context::AssemblyContext;
use crate::directive;
use crate::error::Error;
use crate::instruction;
use crate::lex;
use crate::names;
use crate::symbol::Section;

const MAX_LINE_LENGTH: usize = 80;

/// Split a leading `label:` off the front of a line, if one is present
fn strip_label(line: &str) -> (Option<&str>, &str) {
    let trimmed = line.trim_start();
    let (first, rest) = lex::split_first_token(trimmed);
    if let Some(name) = first.strip_suffix(':') {
        (Some(name), rest)
    } else {
        (None, trimmed)
    }
}

/// Run the first pass over every line of the macro-expanded stream,
/// accumulating errors in `ctx` rather than stopping at the first one
/// (spec 7: "processing of the offending line stops, scanning continues")
pub fn run(lines: &[String], ctx: &mut AssemblyContext) {
    for (index, raw_line) in lines.iter().enumerate() {
        if ctx.is_fatal() {
            return;
        }
        let line_number = index + 1;
        process_line(ctx, raw_line, line_number);
    }
    if ctx.is_fatal() {
        return;
    }
    check_unresolved_entries(ctx);
}

fn check_unresolved_entries(ctx: &mut AssemblyContext) {
    let unresolved: Vec<(String, usize)> = ctx
        .symbols
        .iter()
        .filter(|s| s.section == Section::Unresolved)
        .map(|s| (s.name.clone(), s.offset as usize))
        .collect();
    for (name, line) in unresolved {
        ctx.push_error(Error::UnresolvedEntry { line, name });
    }
}

fn process_line(ctx: &mut AssemblyContext, raw_line: &str, line_number: usize) {
    if raw_line.chars().count() > MAX_LINE_LENGTH {
        ctx.push_error(Error::LineTooLong { line: line_number, length: raw_line.chars().count() });
        return;
    }

    let trimmed = raw_line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with(';') {
        return;
    }

    let (label, rest) = strip_label(trimmed);
    if rest.is_empty() {
        ctx.push_error(Error::Syntax { line: line_number, message: "expected a directive or instruction after the label".to_string() });
        return;
    }

    let (head, args) = lex::split_first_token(rest);

    if let Some(directive_name) = head.strip_prefix('.') {
        process_directive(ctx, label, directive_name, args, line_number);
    } else {
        process_instruction(ctx, label, head, args, line_number);
    }
}

fn bind_label(ctx: &mut AssemblyContext, label: &str, section: Section, offset: usize, line_number: usize) -> Result<(), Error> {
    names::validate_identifier(label, line_number, &ctx.macro_names)?;
    ctx.symbols.define(label, section, offset.min(u8::MAX as usize) as u8, line_number)
}

fn process_directive(ctx: &mut AssemblyContext, label: Option<&str>, name: &str, args: &str, line_number: usize) {
    match name {
        "entry" => {
            // a label preceding `.entry`/`.extern` is silently ignored (spec 4.3)
            let (target, _) = lex::split_first_token(args);
            if let Err(e) = ctx.symbols.declare_entry(target, line_number) {
                ctx.push_error(e);
            }
        }
        "extern" => {
            let (target, _) = lex::split_first_token(args);
            if let Err(e) = names::validate_identifier(target, line_number, &ctx.macro_names) {
                ctx.push_error(e);
                return;
            }
            if let Err(e) = ctx.symbols.declare_extern(target, line_number) {
                ctx.push_error(e);
            }
        }
        "data" => {
            if let Some(label) = label {
                if let Err(e) = bind_label(ctx, label, Section::Data, ctx.data.len(), line_number) {
                    ctx.push_error(e);
                    return;
                }
            }
            if let Err(e) = directive::encode_data(args, line_number, ctx) {
                ctx.push_error(e);
            }
        }
        "string" => {
            if let Some(label) = label {
                if let Err(e) = bind_label(ctx, label, Section::Data, ctx.data.len(), line_number) {
                    ctx.push_error(e);
                    return;
                }
            }
            if let Err(e) = directive::encode_string(args, line_number, ctx) {
                ctx.push_error(e);
            }
        }
        "mat" => {
            if let Some(label) = label {
                if let Err(e) = bind_label(ctx, label, Section::Data, ctx.data.len(), line_number) {
                    ctx.push_error(e);
                    return;
                }
            }
            if let Err(e) = directive::encode_mat(args, line_number, ctx) {
                ctx.push_error(e);
            }
        }
        _ => ctx.push_error(Error::UnknownDirective { line: line_number, name: name.to_string() }),
    }
}

fn process_instruction(ctx: &mut AssemblyContext, label: Option<&str>, mnemonic: &str, args: &str, line_number: usize) {
    if let Some(label) = label {
        if let Err(e) = bind_label(ctx, label, Section::Ins, ctx.instructions.len(), line_number) {
            ctx.push_error(e);
            return;
        }
    }
    if let Err(e) = instruction::encode(mnemonic, args, line_number, ctx) {
        ctx.push_error(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn binds_label_before_instruction() {
        let mut ctx = AssemblyContext::new("t");
        run(&lines("MAIN: mov r3, r7\nstop\n"), &mut ctx);
        assert!(!ctx.has_errors());
        assert_eq!(ctx.instructions.len(), 3);
        let sym = ctx.symbols.get("MAIN").unwrap();
        assert_eq!(sym.section, Section::Ins);
        assert_eq!(sym.offset, 0);
    }

    #[test]
    fn entry_before_definition_resolves() {
        let mut ctx = AssemblyContext::new("t");
        run(&lines(".entry LAB\nLAB: .data 1\n"), &mut ctx);
        assert!(!ctx.has_errors());
        assert_eq!(ctx.symbols.get("LAB").unwrap().section, Section::Data);
    }

    #[test]
    fn entry_never_defined_is_an_error() {
        let mut ctx = AssemblyContext::new("t");
        run(&lines(".entry LAB\n"), &mut ctx);
        assert!(ctx.errors.iter().any(|e| matches!(e, Error::UnresolvedEntry { .. })));
    }

    #[test]
    fn lea_immediate_source_is_a_non_fatal_error_and_scanning_continues() {
        let mut ctx = AssemblyContext::new("t");
        run(&lines("lea #5, r3\nstop\n"), &mut ctx);
        assert!(ctx.errors.iter().any(|e| matches!(e, Error::InvalidAddressingMode { .. })));
        assert_eq!(ctx.instructions.last().copied(), Some(15 << 6));
    }

    #[test]
    fn label_before_entry_is_silently_ignored() {
        let mut ctx = AssemblyContext::new("t");
        // the `IGNORED:` label attached to `.entry` is dropped rather than
        // bound; `LAB` is only ever defined by the second line
        run(&lines("IGNORED: .entry LAB\nLAB: .data 1\n"), &mut ctx);
        assert!(!ctx.has_errors());
        assert!(ctx.symbols.get("IGNORED").is_none());
        assert_eq!(ctx.symbols.get("LAB").unwrap().section, Section::Data);
    }

    #[test]
    fn matrix_directive_pads_and_counts_words() {
        let mut ctx = AssemblyContext::new("t");
        run(&lines("M: .mat [2][2], 1, 2\nstop\n"), &mut ctx);
        assert!(!ctx.has_errors());
        assert_eq!(ctx.data, vec![1, 2, 0, 0]);
    }

    #[test]
    fn memory_budget_is_fatal() {
        let mut ctx = AssemblyContext::new("t");
        let mut source = String::new();
        for _ in 0..160 {
            source.push_str(".data 1\n");
        }
        run(&lines(&source), &mut ctx);
        assert!(ctx.is_fatal());
    }
}
