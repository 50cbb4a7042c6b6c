use crate::text::reindent;

/// Structured description of code to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredContent {
    /// Literal text, re-indented on continuation lines
    Text(String),
    /// `header {` followed by indented members and a closing brace
    Block {
        header: String,
        members: Vec<StructuredContent>,
    },
    /// Several siblings, one per line
    Sequence(Vec<StructuredContent>),
}

impl StructuredContent {
    pub fn text(text: impl Into<String>) -> Self {
        StructuredContent::Text(text.into())
    }

    pub fn block(header: impl Into<String>, members: Vec<StructuredContent>) -> Self {
        StructuredContent::Block {
            header: header.into(),
            members,
        }
    }

    /// Number of sibling nodes this content contributes to a list
    pub fn item_count(&self) -> usize {
        match self {
            StructuredContent::Text(_) | StructuredContent::Block { .. } => 1,
            StructuredContent::Sequence(items) => items.iter().map(Self::item_count).sum(),
        }
    }
}

/// Indentation in effect at the insertion point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentContext {
    /// Indentation of the lines the content is placed on
    pub base: String,
    /// One indentation level
    pub unit: String,
    pub newline: String,
}

impl IndentContext {
    pub fn new(base: impl Into<String>, unit: impl Into<String>, newline: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            unit: unit.into(),
            newline: newline.into(),
        }
    }

    pub fn nested(&self) -> Self {
        Self {
            base: format!("{}{}", self.base, self.unit),
            unit: self.unit.clone(),
            newline: self.newline.clone(),
        }
    }
}

/// Turns structured content into text.
///
/// The first line of the output is not indented since it lands at the
/// insertion point; every following line carries its full indentation.
pub trait Printer: Send + Sync {
    fn print(&self, content: &StructuredContent, indent: &IndentContext) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrinter;

impl Printer for DefaultPrinter {
    fn print(&self, content: &StructuredContent, indent: &IndentContext) -> String {
        match content {
            StructuredContent::Text(text) => reindent(text, &indent.base, &indent.newline),
            StructuredContent::Block { header, members } => {
                if members.is_empty() {
                    return format!("{header} {{}}");
                }
                let nested = indent.nested();
                let mut out = format!("{header} {{");
                for member in members {
                    out.push_str(&indent.newline);
                    out.push_str(&nested.base);
                    out.push_str(&self.print(member, &nested));
                }
                out.push_str(&indent.newline);
                out.push_str(&indent.base);
                out.push('}');
                out
            }
            StructuredContent::Sequence(items) => {
                let separator = format!("{}{}", indent.newline, indent.base);
                items
                    .iter()
                    .map(|item| self.print(item, indent))
                    .collect::<Vec<_>>()
                    .join(&separator)
            }
        }
    }
}
