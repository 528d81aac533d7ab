//! Per-file assembly context: the explicit struct that replaces the
//! original implementation's global `ic`/`dc`/`error`/current-file-name
//! counters (spec 9), so nothing about one file's assembly leaks into the
//! next and independent files can be processed in parallel workers.

use std::collections::HashSet;

use crate::error::Error;
use crate::fixup::PendingFixup;
use crate::symbol::SymbolTable;

/// Total instruction + data words a single file may occupy (spec 3)
pub const MEMORY_BUDGET: usize = 156;

/// Absolute address of the first instruction/data word (spec 3, "Origin")
pub const ORIGIN: usize = 100;

pub struct AssemblyContext {
    pub file_name: String,
    pub instructions: Vec<u16>,
    pub data: Vec<u16>,
    pub symbols: SymbolTable,
    pub fixups: Vec<PendingFixup>,
    pub macro_names: HashSet<String>,
    pub errors: Vec<Error>,
    pub fatal: Option<Error>,
}

impl AssemblyContext {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            instructions: Vec::new(),
            data: Vec::new(),
            symbols: SymbolTable::new(),
            fixups: Vec::new(),
            macro_names: HashSet::new(),
            errors: Vec::new(),
            fatal: None,
        }
    }

    pub fn push_error(&mut self, error: Error) {
        if error.is_fatal() {
            self.fatal = Some(error);
        } else {
            self.errors.push(error);
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.fatal.is_some() || !self.errors.is_empty()
    }

    fn words_used(&self) -> usize {
        self.instructions.len() + self.data.len()
    }

    fn check_budget(&mut self, line: usize) {
        if self.words_used() > MEMORY_BUDGET {
            self.push_error(Error::MemoryBudgetExceeded { used: self.words_used(), limit: MEMORY_BUDGET });
            let _ = line;
        }
    }

    /// Append one word to the instruction image, enforcing the memory budget
    pub fn push_instruction(&mut self, word: u16, line: usize) {
        self.instructions.push(word);
        self.check_budget(line);
    }

    /// Append one word to the data image, enforcing the memory budget
    pub fn push_data(&mut self, word: u16, line: usize) {
        self.data.push(word);
        self.check_budget(line);
    }
}
