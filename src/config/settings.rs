use serde::{Deserialize, Serialize};

/// Scope searched when renaming a token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameScope {
    #[default]
    File,
    Project,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatSection {
    pub indent_width: Option<usize>,
    pub use_tabs: Option<bool>,
    pub newline: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSection {
    pub candidate_search: Option<bool>,
    pub max_candidate_distance: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencesSection {
    pub import_kinds: Option<Vec<String>>,
    pub export_kinds: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSection {
    pub list_kinds: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSection {
    pub default_scope: Option<RenameScope>,
    pub kinds: Option<Vec<String>>,
}

/// Contents of one `nodekeep.toml` layer; every field is optional so layers
/// can be merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodekeepSettings {
    pub format: Option<FormatSection>,
    pub reconcile: Option<ReconcileSection>,
    pub references: Option<ReferencesSection>,
    pub rename: Option<RenameSection>,
    pub edit: Option<EditSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSettings {
    pub indent_width: usize,
    pub use_tabs: bool,
    pub newline: String,
}

impl FormatSettings {
    /// One level of indentation
    pub fn indent_unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.indent_width)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Look for moved nodes by kind and overlap when their path changed
    pub candidate_search: bool,
    /// Largest position delta a candidate may have
    pub max_candidate_distance: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSettings {
    pub import_kinds: Vec<String>,
    pub export_kinds: Vec<String>,
    /// Extensions a specifier may resolve to by file stem; empty means any
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSettings {
    pub default_scope: RenameScope,
    /// Leaf kinds that may be renamed; empty means any non-error leaf
    pub kinds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSettings {
    /// Kinds accepted as targets of child insertion and removal, besides the root
    pub list_kinds: Vec<String>,
}

impl EditSettings {
    pub fn is_list_kind(&self, kind: &str) -> bool {
        self.list_kinds.iter().any(|list| list == kind)
    }
}

/// Fully resolved settings used by a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub format: FormatSettings,
    pub reconcile: ReconcileSettings,
    pub references: ReferenceSettings,
    pub rename: RenameSettings,
    pub edit: EditSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from(super::defaults::default_settings())
    }
}

impl From<NodekeepSettings> for Settings {
    fn from(settings: NodekeepSettings) -> Self {
        Settings::from(&settings)
    }
}

impl From<&NodekeepSettings> for Settings {
    fn from(settings: &NodekeepSettings) -> Self {
        let format = settings.format.clone().unwrap_or_default();
        let reconcile = settings.reconcile.clone().unwrap_or_default();
        let references = settings.references.clone().unwrap_or_default();
        let rename = settings.rename.clone().unwrap_or_default();
        let edit = settings.edit.clone().unwrap_or_default();

        Settings {
            format: FormatSettings {
                indent_width: format.indent_width.unwrap_or(4),
                use_tabs: format.use_tabs.unwrap_or(false),
                newline: format.newline.unwrap_or_else(|| "\n".to_string()),
            },
            reconcile: ReconcileSettings {
                candidate_search: reconcile.candidate_search.unwrap_or(true),
                max_candidate_distance: reconcile.max_candidate_distance,
            },
            references: ReferenceSettings {
                import_kinds: references.import_kinds.unwrap_or_default(),
                export_kinds: references.export_kinds.unwrap_or_default(),
                extensions: references.extensions.unwrap_or_default(),
            },
            rename: RenameSettings {
                default_scope: rename.default_scope.unwrap_or_default(),
                kinds: rename.kinds.unwrap_or_default(),
            },
            edit: EditSettings {
                list_kinds: edit.list_kinds.unwrap_or_default(),
            },
        }
    }
}
