use crate::config::ReferenceSettings;
use crate::syntax::{NodeIndex, SyntaxTree};

/// Import and export specifiers found in one file, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReferences {
    pub imports: Vec<String>,
    pub exports: Vec<String>,
}

/// Reads reference specifiers out of a parsed file
pub trait ReferenceExtractor: Send + Sync {
    fn extract(&self, tree: &SyntaxTree, text: &str) -> FileReferences;
}

/// Extractor keyed on node kinds.
///
/// Every node whose kind is listed as an import or export kind contributes
/// the text of its first identifier-like or string child, quotes stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindReferenceExtractor {
    import_kinds: Vec<String>,
    export_kinds: Vec<String>,
}

impl KindReferenceExtractor {
    pub fn new(settings: &ReferenceSettings) -> Self {
        Self {
            import_kinds: settings.import_kinds.clone(),
            export_kinds: settings.export_kinds.clone(),
        }
    }

    fn specifier(tree: &SyntaxTree, text: &str, index: NodeIndex) -> Option<String> {
        tree[index]
            .children()
            .iter()
            .map(|child| &tree[*child])
            .filter(|child| !child.is_error())
            .find(|child| {
                let name = child.kind().name();
                name.ends_with("identifier") || name.starts_with("string")
            })
            .and_then(|child| text.get(child.range().start..child.range().end))
            .map(|raw| raw.trim_matches(|ch| ch == '"' || ch == '\'').to_string())
            .filter(|specifier| !specifier.is_empty())
    }
}

impl ReferenceExtractor for KindReferenceExtractor {
    fn extract(&self, tree: &SyntaxTree, text: &str) -> FileReferences {
        let mut references = FileReferences::default();
        for index in tree.indices() {
            let kind = tree[index].kind().name();
            let is_import = self.import_kinds.iter().any(|k| k == kind);
            let is_export = self.export_kinds.iter().any(|k| k == kind);
            if !is_import && !is_export {
                continue;
            }
            let Some(specifier) = Self::specifier(tree, text, index) else {
                continue;
            };
            if is_import {
                references.imports.push(specifier.clone());
            }
            if is_export {
                references.exports.push(specifier);
            }
        }
        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::project::FileId;
    use crate::syntax::{BraceParser, SourceParser};

    #[test]
    fn test_extracts_imports_and_exports_in_order() {
        let text = "import util;\nexport \"lib/shared\";\nimport broken\nlet x = 1;";
        let tree = BraceParser.parse(text, &FileId::new("a.brace"));
        let extractor = KindReferenceExtractor::new(&Settings::default().references);

        let references = extractor.extract(&tree, text);
        assert_eq!(references.imports, vec!["util", "broken"]);
        assert_eq!(references.exports, vec!["lib/shared"]);
    }

    #[test]
    fn test_empty_kinds_extract_nothing() {
        let text = "import util;";
        let tree = BraceParser.parse(text, &FileId::new("a.brace"));
        let extractor = KindReferenceExtractor::default();
        assert_eq!(extractor.extract(&tree, text), FileReferences::default());
    }
}
