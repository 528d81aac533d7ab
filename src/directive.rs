//! `.data`, `.string` and `.mat` payload encoders (spec 4.3)

use regex::Regex;

use crate::context::AssemblyContext;
use crate::error::Error;
use crate::lex::{self, IntKind};

fn bracket_pair_regex() -> Regex {
    Regex::new(r"^\[([^\[\]]*)\]\[([^\[\]]*)\]$").unwrap()
}

/// Mask a signed 10-bit data value into its two's-complement word
fn data_word(value: i32) -> u16 {
    (value as i16 as u16) & 0x3FF
}

pub fn encode_data(args: &str, line: usize, ctx: &mut AssemblyContext) -> Result<(), Error> {
    let values = lex::split_operands(args, line)?;
    for value in values {
        let n = lex::parse_int(&value, IntKind::Data, line)?;
        ctx.push_data(data_word(n), line);
    }
    Ok(())
}

pub fn encode_string(args: &str, line: usize, ctx: &mut AssemblyContext) -> Result<(), Error> {
    let trimmed = args.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        return Err(Error::UnterminatedString { line });
    }
    let text = &trimmed[1..trimmed.len() - 1];
    for ch in text.chars() {
        if !(ch as u32 > 31 && (ch as u32) < 127) {
            return Err(Error::InvalidStringChar { line, ch });
        }
        ctx.push_data(ch as u16, line);
    }
    ctx.push_data(0, line);
    Ok(())
}

/// Parse the `[R][C]` dimension prefix off a `.mat` directive's argument
/// text, returning the dimensions and the remaining comma-separated values
fn parse_dimensions<'a>(args: &'a str, line: usize) -> Result<((usize, usize), &'a str), Error> {
    let trimmed = args.trim_start();
    let end = trimmed.find(']').and_then(|_| {
        // find the end of the second bracket group
        let mut depth = 0;
        for (i, ch) in trimmed.char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 && trimmed[i + 1..].chars().next() != Some('[') {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        None
    });
    let end = end.ok_or(Error::MatrixDimensionInvalid { line })?;
    let (dims, rest) = trimmed.split_at(end);
    let captures = bracket_pair_regex().captures(dims).ok_or(Error::MatrixDimensionInvalid { line })?;
    let rows: usize = captures[1].trim().parse().map_err(|_| Error::MatrixDimensionInvalid { line })?;
    let cols: usize = captures[2].trim().parse().map_err(|_| Error::MatrixDimensionInvalid { line })?;
    if rows * cols == 0 {
        return Err(Error::MatrixDimensionInvalid { line });
    }
    let rest = rest.trim_start().trim_start_matches(',');
    Ok(((rows, cols), rest))
}

pub fn encode_mat(args: &str, line: usize, ctx: &mut AssemblyContext) -> Result<(), Error> {
    let ((rows, cols), rest) = parse_dimensions(args, line)?;
    let cells = rows * cols;
    let values = lex::split_operands(rest, line)?;
    if values.len() > cells {
        return Err(Error::MatrixValueOverflow { line, expected: cells, found: values.len() });
    }
    for value in &values {
        let n = lex::parse_int(value, IntKind::Data, line)?;
        ctx.push_data(data_word(n), line);
    }
    for _ in values.len()..cells {
        ctx.push_data(0, line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AssemblyContext {
        AssemblyContext::new("t")
    }

    #[test]
    fn data_encodes_each_value() {
        let mut c = ctx();
        encode_data("5, -3, 511, -512", 1, &mut c).unwrap();
        assert_eq!(c.data.len(), 4);
        assert_eq!(c.data[0], 5);
        assert_eq!(c.data[2], 511);
        assert_eq!(c.data[3] & 0x3FF, data_word(-512));
    }

    #[test]
    fn string_terminates_with_zero_word() {
        let mut c = ctx();
        encode_string("\"hi\"", 1, &mut c).unwrap();
        assert_eq!(c.data, vec!['h' as u16, 'i' as u16, 0]);
    }

    #[test]
    fn string_requires_both_quotes() {
        let mut c = ctx();
        assert!(matches!(encode_string("\"hi", 1, &mut c), Err(Error::UnterminatedString { .. })));
    }

    #[test]
    fn mat_pads_with_zero() {
        let mut c = ctx();
        encode_mat("[2][3], 1,2,3,4", 1, &mut c).unwrap();
        assert_eq!(c.data, vec![1, 2, 3, 4, 0, 0]);
    }

    #[test]
    fn mat_rejects_excess_values() {
        let mut c = ctx();
        let err = encode_mat("[2][3], 1,2,3,4,5,6,7", 1, &mut c).unwrap_err();
        assert!(matches!(err, Error::MatrixValueOverflow { expected: 6, found: 7, .. }));
    }

    #[test]
    fn mat_rejects_zero_dimension() {
        let mut c = ctx();
        assert!(matches!(encode_mat("[0][3], 1", 1, &mut c), Err(Error::MatrixDimensionInvalid { .. })));
    }
}
