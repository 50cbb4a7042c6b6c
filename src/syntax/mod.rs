//! Immutable parse trees and the parsers that produce them.
//!
//! A [`SyntaxTree`] is one parse result stored as a preorder arena. Trees
//! never change after construction; an edit produces a new tree with a new
//! [`TreeGeneration`].

pub mod brace;
pub mod parser;
pub mod tree;
pub mod treesitter;

pub use brace::{BraceKind, BraceParser};
pub use parser::SourceParser;
pub use tree::{
    NativeKey, NativeNode, NodeIndex, SyntaxKind, SyntaxTree, TreeBuilder, TreeGeneration,
};
pub use treesitter::TreeSitterParser;
