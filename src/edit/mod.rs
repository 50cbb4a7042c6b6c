//! Edit planning: manipulation requests become edit descriptors.

pub mod descriptor;
pub mod indent;
pub mod planner;
pub mod printer;
pub mod rename;

pub use crate::config::RenameScope;
pub use descriptor::{EditDescriptor, ManipulationKind, Strategy};
pub use indent::{child_indent, is_multiline, line_indent_of};
pub use printer::{DefaultPrinter, IndentContext, Printer, StructuredContent};
pub use rename::{RenameLocation, RenameOptions};
