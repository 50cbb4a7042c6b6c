pub mod ast;
pub mod config;
pub mod edit;
pub mod error;
pub mod project;
pub mod reconcile;
pub mod references;
pub mod syntax;
pub mod text;
pub mod wrapper;

pub use config::{NodekeepSettings, Settings, load_settings};
pub use edit::{
    DefaultPrinter, EditDescriptor, IndentContext, ManipulationKind, Printer, RenameLocation,
    RenameOptions, RenameScope, Strategy, StructuredContent,
};
pub use error::{Error, Result};
pub use project::{
    Diagnostic, DiagnosticKind, EditResult, FileEvent, FileId, Project, Severity, SourceFile,
    SubscriptionId,
};
pub use references::{FileReferences, KindReferenceExtractor, ReferenceExtractor};
pub use syntax::{
    BraceKind, BraceParser, NodeIndex, SourceParser, SyntaxKind, SyntaxTree, TreeBuilder,
    TreeSitterParser,
};
pub use text::{TextEdit, TextRange};
pub use wrapper::{WrapperId, WrapperState};
