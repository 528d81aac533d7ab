//! Symbol table: insert, look up, mark entry/extern, reconcile forward
//! declarations (spec 3)

use std::collections::HashMap;

use crate::error::{ConflictReason, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Data,
    Ins,
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Regular,
    Entry,
    External,
}

/// A named location in the instruction or data segment. `offset` is 8 bits
/// wide per spec 3 / design note (ii): it bounds addressable per-section
/// offsets to 255, which is safe under the 156-word memory budget but would
/// need widening if that budget ever grows. While `section == Unresolved`,
/// `offset` instead holds the (truncated) source line of the `.entry` that
/// forward-declared this symbol, for the eventual "never defined" diagnostic.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub section: Section,
    pub linkage: Linkage,
    pub offset: u8,
}

/// Insertion-ordered so entry/external listings come out in a stable,
/// file-defined order rather than hash-map order
#[derive(Debug, Default)]
pub struct SymbolTable {
    order: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.order[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter()
    }

    /// Bind a label to `section`/`offset`, reconciling a forward `.entry`
    /// placeholder if one exists under this name
    pub fn define(&mut self, name: &str, section: Section, offset: u8, line: usize) -> Result<(), Error> {
        if let Some(&i) = self.index.get(name) {
            let existing = &mut self.order[i];
            if existing.section == Section::Unresolved {
                existing.section = section;
                existing.offset = offset;
                existing.linkage = Linkage::Entry;
                return Ok(());
            }
            let reason = if existing.linkage == Linkage::External {
                ConflictReason::AlreadyExternal
            } else {
                ConflictReason::AlreadyDefined
            };
            return Err(Error::SymbolConflict { line, name: name.to_string(), reason });
        }
        self.index.insert(name.to_string(), self.order.len());
        self.order.push(Symbol { name: name.to_string(), section, linkage: Linkage::Regular, offset });
        Ok(())
    }

    /// `.extern NAME`: insert as an external symbol, rejecting a name
    /// already defined (regular, entry, forward-entry, or external again)
    pub fn declare_extern(&mut self, name: &str, line: usize) -> Result<(), Error> {
        if self.index.contains_key(name) {
            return Err(Error::SymbolConflict { line, name: name.to_string(), reason: ConflictReason::AlreadyDefined });
        }
        self.index.insert(name.to_string(), self.order.len());
        self.order.push(Symbol { name: name.to_string(), section: Section::Ins, linkage: Linkage::External, offset: 0 });
        Ok(())
    }

    /// `.entry NAME`: mark a known symbol as exported, or insert an
    /// unresolved placeholder for a name not yet seen
    pub fn declare_entry(&mut self, name: &str, line: usize) -> Result<(), Error> {
        if let Some(&i) = self.index.get(name) {
            let existing = &mut self.order[i];
            if existing.linkage == Linkage::External {
                return Err(Error::SymbolConflict {
                    line,
                    name: name.to_string(),
                    reason: ConflictReason::AlreadyExternal,
                });
            }
            existing.linkage = Linkage::Entry;
            return Ok(());
        }
        self.index.insert(name.to_string(), self.order.len());
        self.order.push(Symbol {
            name: name.to_string(),
            section: Section::Unresolved,
            linkage: Linkage::Entry,
            offset: line.min(u8::MAX as usize) as u8,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_and_looks_up() {
        let mut table = SymbolTable::new();
        table.define("LOOP", Section::Ins, 3, 1).unwrap();
        let sym = table.get("LOOP").unwrap();
        assert_eq!(sym.section, Section::Ins);
        assert_eq!(sym.offset, 3);
        assert_eq!(sym.linkage, Linkage::Regular);
    }

    #[test]
    fn duplicate_definition_is_a_conflict() {
        let mut table = SymbolTable::new();
        table.define("LOOP", Section::Ins, 3, 1).unwrap();
        assert!(matches!(
            table.define("LOOP", Section::Ins, 5, 2),
            Err(Error::SymbolConflict { reason: ConflictReason::AlreadyDefined, .. })
        ));
    }

    #[test]
    fn entry_before_definition_is_reconciled() {
        let mut table = SymbolTable::new();
        table.declare_entry("LAB", 1).unwrap();
        assert_eq!(table.get("LAB").unwrap().section, Section::Unresolved);
        table.define("LAB", Section::Data, 2, 5).unwrap();
        let sym = table.get("LAB").unwrap();
        assert_eq!(sym.section, Section::Data);
        assert_eq!(sym.offset, 2);
        assert_eq!(sym.linkage, Linkage::Entry);
    }

    #[test]
    fn extern_then_entry_conflicts() {
        let mut table = SymbolTable::new();
        table.declare_extern("X", 1).unwrap();
        assert!(matches!(
            table.declare_entry("X", 2),
            Err(Error::SymbolConflict { reason: ConflictReason::AlreadyExternal, .. })
        ));
    }

    #[test]
    fn extern_rejects_already_defined_name() {
        let mut table = SymbolTable::new();
        table.define("X", Section::Ins, 0, 1).unwrap();
        assert!(table.declare_extern("X", 2).is_err());
    }

    #[test]
    fn preserves_insertion_order() {
        let mut table = SymbolTable::new();
        table.define("B", Section::Ins, 0, 1).unwrap();
        table.define("A", Section::Ins, 1, 2).unwrap();
        let names: Vec<_> = table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
