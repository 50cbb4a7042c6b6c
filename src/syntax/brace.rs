//! Parser for a small brace-delimited declaration language.
//!
//! ```text
//! import a;            export b;
//! class C { a; let x = 1; class D { } }
//! let x = "one";       x;
//! ```
//!
//! The parser is total: unexpected tokens become `error` nodes and absent
//! tokens become zero-width `error` nodes flagged missing.

use crate::project::FileId;
use crate::text::TextRange;

use super::parser::SourceParser;
use super::tree::{SyntaxKind, SyntaxTree, TreeBuilder};

/// Every node kind the brace language produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum BraceKind {
    SourceFile,
    ImportDeclaration,
    ExportDeclaration,
    ClassDeclaration,
    MemberList,
    LetStatement,
    ExpressionStatement,
    Identifier,
    NumberLiteral,
    StringLiteral,
    ClassKeyword,
    ImportKeyword,
    ExportKeyword,
    LetKeyword,
    LBrace,
    RBrace,
    Semicolon,
    Equals,
    Error,
}

impl BraceKind {
    pub const ALL: [BraceKind; 19] = [
        BraceKind::SourceFile,
        BraceKind::ImportDeclaration,
        BraceKind::ExportDeclaration,
        BraceKind::ClassDeclaration,
        BraceKind::MemberList,
        BraceKind::LetStatement,
        BraceKind::ExpressionStatement,
        BraceKind::Identifier,
        BraceKind::NumberLiteral,
        BraceKind::StringLiteral,
        BraceKind::ClassKeyword,
        BraceKind::ImportKeyword,
        BraceKind::ExportKeyword,
        BraceKind::LetKeyword,
        BraceKind::LBrace,
        BraceKind::RBrace,
        BraceKind::Semicolon,
        BraceKind::Equals,
        BraceKind::Error,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BraceKind::SourceFile => "source_file",
            BraceKind::ImportDeclaration => "import_declaration",
            BraceKind::ExportDeclaration => "export_declaration",
            BraceKind::ClassDeclaration => "class_declaration",
            BraceKind::MemberList => "member_list",
            BraceKind::LetStatement => "let_statement",
            BraceKind::ExpressionStatement => "expression_statement",
            BraceKind::Identifier => "identifier",
            BraceKind::NumberLiteral => "number_literal",
            BraceKind::StringLiteral => "string_literal",
            BraceKind::ClassKeyword => "class",
            BraceKind::ImportKeyword => "import",
            BraceKind::ExportKeyword => "export",
            BraceKind::LetKeyword => "let",
            BraceKind::LBrace => "{",
            BraceKind::RBrace => "}",
            BraceKind::Semicolon => ";",
            BraceKind::Equals => "=",
            BraceKind::Error => "error",
        }
    }

    pub const fn kind(self) -> SyntaxKind {
        SyntaxKind::new(self as u16, self.name())
    }

    /// Map a tree kind back to the brace language, if it belongs to it
    pub fn from_kind(kind: SyntaxKind) -> Option<Self> {
        Self::ALL
            .get(kind.id() as usize)
            .copied()
            .filter(|candidate| candidate.name() == kind.name())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub const fn is_token(self) -> bool {
        matches!(
            self,
            BraceKind::Identifier
                | BraceKind::NumberLiteral
                | BraceKind::StringLiteral
                | BraceKind::ClassKeyword
                | BraceKind::ImportKeyword
                | BraceKind::ExportKeyword
                | BraceKind::LetKeyword
                | BraceKind::LBrace
                | BraceKind::RBrace
                | BraceKind::Semicolon
                | BraceKind::Equals
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    kind: BraceKind,
    range: TextRange,
    malformed: bool,
}

fn keyword(word: &str) -> Option<BraceKind> {
    match word {
        "class" => Some(BraceKind::ClassKeyword),
        "import" => Some(BraceKind::ImportKeyword),
        "export" => Some(BraceKind::ExportKeyword),
        "let" => Some(BraceKind::LetKeyword),
        _ => None,
    }
}

fn lex(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        if ch.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        if text[pos..].starts_with("//") {
            pos = text[pos..].find('\n').map_or(bytes.len(), |nl| pos + nl);
            continue;
        }

        let start = pos;
        let (kind, malformed) = match ch {
            b'{' => (BraceKind::LBrace, false),
            b'}' => (BraceKind::RBrace, false),
            b';' => (BraceKind::Semicolon, false),
            b'=' => (BraceKind::Equals, false),
            b'"' => {
                pos += 1;
                let mut closed = false;
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    match bytes[pos] {
                        b'\\' => {
                            pos += 1 + text[pos + 1..].chars().next().map_or(0, char::len_utf8);
                        }
                        b'"' => {
                            pos += 1;
                            closed = true;
                            break;
                        }
                        _ => pos += 1,
                    }
                }
                pos = pos.min(bytes.len());
                tokens.push(Token {
                    kind: BraceKind::StringLiteral,
                    range: TextRange::new(start, pos),
                    malformed: !closed,
                });
                continue;
            }
            b'0'..=b'9' => {
                while pos < bytes.len() && bytes[pos].is_ascii_alphanumeric() {
                    pos += 1;
                }
                let malformed = !text[start..pos].bytes().all(|b| b.is_ascii_digit());
                tokens.push(Token {
                    kind: BraceKind::NumberLiteral,
                    range: TextRange::new(start, pos),
                    malformed,
                });
                continue;
            }
            c if c == b'_' || c.is_ascii_alphabetic() => {
                while pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphanumeric())
                {
                    pos += 1;
                }
                let word = &text[start..pos];
                tokens.push(Token {
                    kind: keyword(word).unwrap_or(BraceKind::Identifier),
                    range: TextRange::new(start, pos),
                    malformed: false,
                });
                continue;
            }
            _ => (BraceKind::Error, true),
        };

        // single character tokens, including one full char of garbage
        let width = text[pos..].chars().next().map_or(1, char::len_utf8);
        pos += width;
        tokens.push(Token {
            kind,
            range: TextRange::new(start, pos),
            malformed,
        });
    }
    tokens
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    prev_end: usize,
    builder: TreeBuilder,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            prev_end: 0,
            builder: TreeBuilder::new(),
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn at(&self, kind: BraceKind) -> bool {
        self.peek().is_some_and(|token| token.kind == kind)
    }

    fn bump(&mut self) {
        if let Some(token) = self.peek() {
            let index = self.builder.token(token.kind.kind(), token.range);
            if token.malformed {
                self.builder.mark_error(index);
            }
            self.prev_end = token.range.end;
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: BraceKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.builder.missing(BraceKind::Error.kind(), self.prev_end);
            false
        }
    }

    fn start(&mut self, kind: BraceKind) {
        let start = self.peek().map_or(self.prev_end, |token| token.range.start);
        self.builder.start_node(kind.kind(), start);
    }

    fn finish(&mut self) {
        self.builder.finish_node(self.prev_end);
    }

    fn items(&mut self, nested: bool) {
        while let Some(token) = self.peek() {
            if nested && token.kind == BraceKind::RBrace {
                return;
            }
            self.item();
        }
    }

    fn item(&mut self) {
        let Some(token) = self.peek() else {
            return;
        };
        match token.kind {
            BraceKind::ImportKeyword => self.simple_declaration(BraceKind::ImportDeclaration),
            BraceKind::ExportKeyword => self.simple_declaration(BraceKind::ExportDeclaration),
            BraceKind::ClassKeyword => self.class_declaration(),
            BraceKind::LetKeyword => self.let_statement(),
            BraceKind::Identifier | BraceKind::NumberLiteral | BraceKind::StringLiteral => {
                self.start(BraceKind::ExpressionStatement);
                self.bump();
                self.expect(BraceKind::Semicolon);
                self.finish();
            }
            _ => self.error_token(),
        }
    }

    fn error_token(&mut self) {
        if let Some(token) = self.peek() {
            let index = self.builder.token(BraceKind::Error.kind(), token.range);
            self.builder.mark_error(index);
            self.prev_end = token.range.end;
            self.pos += 1;
        }
    }

    fn simple_declaration(&mut self, kind: BraceKind) {
        self.start(kind);
        self.bump();
        if self.at(BraceKind::StringLiteral) {
            self.bump();
        } else {
            self.expect(BraceKind::Identifier);
        }
        self.expect(BraceKind::Semicolon);
        self.finish();
    }

    fn class_declaration(&mut self) {
        self.start(BraceKind::ClassDeclaration);
        self.bump();
        self.expect(BraceKind::Identifier);
        if self.expect(BraceKind::LBrace) {
            self.builder
                .start_node(BraceKind::MemberList.kind(), self.prev_end);
            self.items(true);
            let end = self
                .peek()
                .filter(|token| token.kind == BraceKind::RBrace)
                .map_or(self.prev_end, |token| token.range.start);
            self.builder.finish_node(end);
        } else {
            self.builder
                .start_node(BraceKind::MemberList.kind(), self.prev_end);
            self.builder.finish_node(self.prev_end);
        }
        self.expect(BraceKind::RBrace);
        self.finish();
    }

    fn let_statement(&mut self) {
        self.start(BraceKind::LetStatement);
        self.bump();
        self.expect(BraceKind::Identifier);
        self.expect(BraceKind::Equals);
        if self.peek().is_some_and(|token| {
            matches!(
                token.kind,
                BraceKind::Identifier | BraceKind::NumberLiteral | BraceKind::StringLiteral
            )
        }) {
            self.bump();
        } else {
            self.builder.missing(BraceKind::Error.kind(), self.prev_end);
        }
        self.expect(BraceKind::Semicolon);
        self.finish();
    }
}

/// Parser for the bundled brace language
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceParser;

impl BraceParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for BraceParser {
    fn parse(&self, text: &str, _file: &FileId) -> SyntaxTree {
        let tokens = lex(text);
        let mut parser = Parser::new(&tokens);
        parser
            .builder
            .start_node(BraceKind::SourceFile.kind(), 0);
        parser.items(false);
        parser.builder.finish_node(text.len());
        parser.builder.finish(BraceKind::SourceFile.kind(), text.len())
    }

    fn name(&self) -> &str {
        "brace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::NodeIndex;

    fn parse(text: &str) -> SyntaxTree {
        BraceParser.parse(text, &FileId::new("test.brace"))
    }

    #[test]
    fn test_class_tree_shape() {
        let text = "class C { a; }";
        let tree = parse(text);
        insta::assert_snapshot!(tree.dump(text), @r#"
        source_file 0..14
          class_declaration 0..14
            class 0..5 "class"
            identifier 6..7 "C"
            { 8..9 "{"
            member_list 9..13
              expression_statement 10..12
                identifier 10..11 "a"
                ; 11..12 ";"
            } 13..14 "}"
        "#);
    }

    #[test]
    fn test_member_list_of_empty_class_is_zero_width_leaf() {
        let tree = parse("class C {}");
        let list = tree.node_at_path(&[0, 3]).unwrap();
        assert_eq!(tree[list].kind(), BraceKind::MemberList.kind());
        assert_eq!(tree[list].range(), TextRange::new(9, 9));
        assert!(!tree.has_errors());
    }

    #[test]
    fn test_root_spans_whole_text_including_trivia() {
        let text = "  // header\nimport a;\n\n";
        let tree = parse(text);
        assert_eq!(tree[NodeIndex::ROOT].range(), TextRange::new(0, text.len()));
        assert_eq!(tree[NodeIndex::ROOT].children().len(), 1);
    }

    #[test]
    fn test_missing_semicolon_becomes_zero_width_error() {
        let tree = parse("let x = 1");
        let missing: Vec<_> = tree
            .indices()
            .filter(|&index| tree[index].is_missing())
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(tree[missing[0]].range(), TextRange::new(9, 9));
        assert_eq!(tree[missing[0]].kind(), BraceKind::Error.kind());
    }

    #[test]
    fn test_stray_tokens_become_error_nodes() {
        let tree = parse("= import a;");
        let root = &tree[NodeIndex::ROOT];
        assert_eq!(root.children().len(), 2);
        assert!(tree[root.children()[0]].is_error());
        assert_eq!(
            tree[root.children()[1]].kind(),
            BraceKind::ImportDeclaration.kind()
        );
    }

    #[test]
    fn test_unterminated_class_recovers() {
        let tree = parse("class C { a;");
        assert!(tree.has_errors());
        let class = tree.node_at_path(&[0]).unwrap();
        assert_eq!(tree[class].range(), TextRange::new(0, 12));
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in BraceKind::ALL {
            assert_eq!(BraceKind::from_kind(kind.kind()), Some(kind));
            assert_eq!(BraceKind::from_name(kind.name()), Some(kind));
        }
    }
}
