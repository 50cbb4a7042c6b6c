//! Position arithmetic and line helpers.
//!
//! Everything here is pure: the functions see offsets and strings, never a
//! tree. Callers decide which ranges to hand over.

pub mod edits;
pub mod position;

pub use edits::{
    Placement, Replacement, TextEdit, TextRange, apply_replacements, classify, grow, grow_through,
    shift, shift_range, shift_through, sort_replacements,
};
pub use position::{LineCol, line_col, line_indentation, line_start, reindent, starts_line};
