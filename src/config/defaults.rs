//! Built-in defaults, the lowest configuration layer.

use super::settings::{
    EditSection, FormatSection, NodekeepSettings, ReconcileSection, ReferencesSection,
    RenameScope, RenameSection,
};
use crate::syntax::BraceKind;

/// Returns the default settings, tuned for the bundled brace language.
pub fn default_settings() -> NodekeepSettings {
    NodekeepSettings {
        format: Some(FormatSection {
            indent_width: Some(4),
            use_tabs: Some(false),
            newline: Some("\n".to_string()),
        }),
        reconcile: Some(ReconcileSection {
            candidate_search: Some(true),
            max_candidate_distance: None,
        }),
        references: Some(ReferencesSection {
            import_kinds: Some(vec![BraceKind::ImportDeclaration.name().to_string()]),
            export_kinds: Some(vec![BraceKind::ExportDeclaration.name().to_string()]),
            extensions: Some(vec!["brace".to_string()]),
        }),
        rename: Some(RenameSection {
            default_scope: Some(RenameScope::File),
            kinds: Some(vec![BraceKind::Identifier.name().to_string()]),
        }),
        edit: Some(EditSection {
            list_kinds: Some(vec![BraceKind::MemberList.name().to_string()]),
        }),
    }
}
