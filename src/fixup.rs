//! Pending fix-ups: operand words that reference a label, to be patched in
//! by the second pass once every symbol is known (spec 3, 4.4)

/// Record of one operand word that references a label and must be patched
/// once the symbol is resolved
#[derive(Debug, Clone)]
pub struct PendingFixup {
    /// name of the referenced label
    pub label: String,
    /// index into the instruction image of the word to patch
    pub index: usize,
    /// source line of the reference, for diagnostics
    pub line: usize,
}
