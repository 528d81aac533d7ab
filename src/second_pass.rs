//! Second pass: resolves fix-ups, assigns absolute addresses, and formats
//! the object/entry/external textual artifacts (spec 4.4)

use crate::base4;
use crate::context::{AssemblyContext, ORIGIN};
use crate::error::Error;
use crate::symbol::{Linkage, Section};

const ADDR_WIDTH: usize = 4;
const WORD_WIDTH: usize = 5;

/// A/R/E tag placed in a word's low 2 bits (GLOSSARY)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Are {
    Absolute = 0,
    External = 1,
    Relocatable = 2,
}

/// One line of the external listing: a use site of an external symbol
pub struct ExternalUse {
    pub name: String,
    pub address: usize,
}

/// One line of the entry listing
pub struct EntryRecord {
    pub name: String,
    pub address: usize,
}

pub struct Output {
    pub header: String,
    pub body: Vec<String>,
    pub entries: Vec<EntryRecord>,
    pub externals: Vec<ExternalUse>,
}

fn address_of(section: Section, offset: u8, ic_final: usize) -> usize {
    match section {
        Section::Ins => ORIGIN + offset as usize,
        Section::Data => ORIGIN + ic_final + offset as usize,
        // only reachable for a symbol that first_pass already flagged as an
        // error (spec 4.3); the value is never emitted in that case
        Section::Unresolved => ORIGIN,
    }
}

/// Patch every pending operand word with the address (or external tag) of
/// the symbol it references, reporting missing symbols and 8-bit overflow
/// as non-fatal errors on `ctx` (spec 4.4)
fn resolve_fixups(ctx: &mut AssemblyContext, ic_final: usize) -> (Vec<u16>, Vec<ExternalUse>) {
    let mut instructions = ctx.instructions.clone();
    let mut externals = Vec::new();
    let fixups = ctx.fixups.clone();

    for fixup in fixups {
        let symbol = match ctx.symbols.get(&fixup.label).cloned() {
            Some(symbol) => symbol,
            None => {
                ctx.push_error(Error::MissingFixupSymbol { line: fixup.line, name: fixup.label.clone() });
                continue;
            }
        };

        if symbol.linkage == Linkage::External {
            instructions[fixup.index] = Are::External as u16;
            externals.push(ExternalUse { name: symbol.name, address: ORIGIN + fixup.index });
        } else {
            let absolute = address_of(symbol.section, symbol.offset, ic_final);
            if absolute > 0xFF {
                ctx.push_error(Error::AddressOverflow { line: fixup.line, name: symbol.name.clone(), value: absolute });
            }
            instructions[fixup.index] = ((absolute as u16 & 0xFF) << 2) | (Are::Relocatable as u16);
        }
    }

    (instructions, externals)
}

/// Run the second pass: patch fix-ups, then format the header, body, entry
/// listing and external listing. Always runs so later diagnostics surface
/// even when the first pass already flagged an error (spec 4.3); the caller
/// is responsible for discarding the result in that case (spec 7).
pub fn run(ctx: &mut AssemblyContext) -> Output {
    let ic_final = ctx.instructions.len();
    let dc_final = ctx.data.len();
    let (patched_instructions, externals) = resolve_fixups(ctx, ic_final);

    let mut body = Vec::with_capacity(ic_final + dc_final);
    for (i, word) in patched_instructions.iter().enumerate() {
        let address = ORIGIN + i;
        body.push(format!("{}\t{}", base4::encode(address as u32, ADDR_WIDTH), base4::encode(*word as u32, WORD_WIDTH)));
    }
    for (j, word) in ctx.data.iter().enumerate() {
        let address = ORIGIN + ic_final + j;
        body.push(format!("{}\t{}", base4::encode(address as u32, ADDR_WIDTH), base4::encode(*word as u32, WORD_WIDTH)));
    }

    let entries = ctx
        .symbols
        .iter()
        .filter(|s| s.linkage == Linkage::Entry && s.section != Section::Unresolved)
        .map(|s| EntryRecord { name: s.name.clone(), address: address_of(s.section, s.offset, ic_final) })
        .collect();

    let header = format!(" {} {}", base4::encode(ic_final as u32, ADDR_WIDTH), base4::encode(dc_final as u32, ADDR_WIDTH));

    Output { header, body, entries, externals }
}
