//! Layered configuration.
//!
//! Layers, lowest precedence first: built-in defaults, the user file, the
//! project's `nodekeep.toml`, and an explicit override. Layers merge field
//! by field; a layer that fails to load is skipped with a warning event.

pub mod defaults;
pub mod settings;
pub mod user;

use std::fs;
use std::path::Path;

pub use settings::{
    EditSection, EditSettings, FormatSection, FormatSettings, NodekeepSettings, ReconcileSection,
    ReconcileSettings, ReferenceSettings, ReferencesSection, RenameScope, RenameSection,
    RenameSettings, Settings,
};
pub use user::{
    CONFIG_FILE_NAME, UserConfigError, UserConfigResult, load_user_config, user_config_path,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct SettingsLoadOutcome {
    pub settings: Settings,
    pub events: Vec<SettingsEvent>,
}

impl SettingsLoadOutcome {
    pub fn warnings(&self) -> impl Iterator<Item = &SettingsEvent> {
        self.events
            .iter()
            .filter(|event| event.kind == SettingsEventKind::Warning)
    }
}

/// Merge all layers in order; later layers override earlier ones
pub fn merge_all(configs: &[Option<NodekeepSettings>]) -> Option<NodekeepSettings> {
    configs.iter().cloned().reduce(merge_settings).flatten()
}

/// Merge two NodekeepSettings, preferring values from `primary` over `fallback`
pub fn merge_settings(
    fallback: Option<NodekeepSettings>,
    primary: Option<NodekeepSettings>,
) -> Option<NodekeepSettings> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) => Some(settings),
        (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(NodekeepSettings {
            format: merge_section(fallback.format, primary.format, |fallback, primary| {
                FormatSection {
                    indent_width: primary.indent_width.or(fallback.indent_width),
                    use_tabs: primary.use_tabs.or(fallback.use_tabs),
                    newline: primary.newline.or(fallback.newline),
                }
            }),
            reconcile: merge_section(fallback.reconcile, primary.reconcile, |fallback, primary| {
                ReconcileSection {
                    candidate_search: primary.candidate_search.or(fallback.candidate_search),
                    max_candidate_distance: primary
                        .max_candidate_distance
                        .or(fallback.max_candidate_distance),
                }
            }),
            references: merge_section(
                fallback.references,
                primary.references,
                |fallback, primary| ReferencesSection {
                    import_kinds: primary.import_kinds.or(fallback.import_kinds),
                    export_kinds: primary.export_kinds.or(fallback.export_kinds),
                    extensions: primary.extensions.or(fallback.extensions),
                },
            ),
            rename: merge_section(fallback.rename, primary.rename, |fallback, primary| {
                RenameSection {
                    default_scope: primary.default_scope.or(fallback.default_scope),
                    kinds: primary.kinds.or(fallback.kinds),
                }
            }),
            edit: merge_section(fallback.edit, primary.edit, |fallback, primary| EditSection {
                list_kinds: primary.list_kinds.or(fallback.list_kinds),
            }),
        }),
    }
}

fn merge_section<T>(fallback: Option<T>, primary: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (fallback, primary) {
        (Some(fallback), Some(primary)) => Some(merge(fallback, primary)),
        (fallback, primary) => primary.or(fallback),
    }
}

/// Parse one `nodekeep.toml` document
pub fn parse_settings(contents: &str) -> crate::error::Result<NodekeepSettings> {
    toml::from_str(contents).map_err(|err| crate::error::Error::config(err.to_string()))
}

/// Read and parse one `nodekeep.toml` file
pub fn read_settings_file(path: &Path) -> crate::error::Result<NodekeepSettings> {
    let contents = fs::read_to_string(path)?;
    parse_settings(&contents)
}

/// Resolve settings from every layer.
///
/// `root_path` is the project directory holding an optional `nodekeep.toml`;
/// `override_settings` has the highest precedence.
pub fn load_settings(
    root_path: Option<&Path>,
    override_settings: Option<NodekeepSettings>,
) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let defaults = Some(defaults::default_settings());
    let user_config = load_user_config_with_events(&mut events);
    let project_settings = load_project_settings(root_path, &mut events);

    let merged = merge_all(&[defaults, user_config, project_settings, override_settings]);
    let settings = merged.map(Settings::from).unwrap_or_default();

    for event in &events {
        match event.kind {
            SettingsEventKind::Info => log::debug!(target: "nodekeep::config", "{}", event.message),
            SettingsEventKind::Warning => log::warn!(target: "nodekeep::config", "{}", event.message),
        }
    }
    SettingsLoadOutcome { settings, events }
}

fn load_user_config_with_events(events: &mut Vec<SettingsEvent>) -> Option<NodekeepSettings> {
    match load_user_config() {
        Ok(Some(settings)) => {
            events.push(SettingsEvent::info("Loaded user config"));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load user config: {}",
                err
            )));
            None
        }
    }
}

fn load_project_settings(
    root_path: Option<&Path>,
    events: &mut Vec<SettingsEvent>,
) -> Option<NodekeepSettings> {
    let config_path = root_path?.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return None;
    }

    match read_settings_file(&config_path) {
        Ok(settings) => {
            events.push(SettingsEvent::info(format!(
                "Loaded {}",
                config_path.display()
            )));
            Some(settings)
        }
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load {}: {}",
                config_path.display(),
                err
            )));
            None
        }
    }
}
