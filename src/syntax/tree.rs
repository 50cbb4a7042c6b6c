use std::fmt::{self, Write as _};
use std::ops::Index;

use crate::text::TextRange;

/// Kind tag of a native node: numeric id plus the grammar's name for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxKind {
    id: u16,
    name: &'static str,
}

impl SyntaxKind {
    pub const fn new(id: u16, name: &'static str) -> Self {
        Self { id, name }
    }

    pub const fn id(&self) -> u16 {
        self.id
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Project-unique stamp of one parse result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeGeneration(pub(crate) u64);

impl TreeGeneration {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TreeGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Position of a node in its tree's arena. Nodes are stored in preorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub const ROOT: NodeIndex = NodeIndex(0);

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Identity of a native node across the whole project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeKey {
    pub generation: TreeGeneration,
    pub index: NodeIndex,
}

impl NativeKey {
    pub const fn new(generation: TreeGeneration, index: NodeIndex) -> Self {
        Self { generation, index }
    }
}

/// One immutable node produced by a parser
#[derive(Debug, Clone)]
pub struct NativeNode {
    kind: SyntaxKind,
    range: TextRange,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    index_in_parent: usize,
    depth: usize,
    subtree_end: u32,
    is_error: bool,
    is_missing: bool,
}

impl NativeNode {
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn index_in_parent(&self) -> usize {
        self.index_in_parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn is_missing(&self) -> bool {
        self.is_missing
    }
}

/// Immutable arena of native nodes for one parse of one file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    generation: TreeGeneration,
    nodes: Vec<NativeNode>,
}

impl SyntaxTree {
    pub fn generation(&self) -> TreeGeneration {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: TreeGeneration) {
        self.generation = generation;
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: NodeIndex) -> Option<&NativeNode> {
        self.nodes.get(index.as_usize())
    }

    pub fn key(&self, index: NodeIndex) -> NativeKey {
        NativeKey::new(self.generation, index)
    }

    /// All node indices in preorder
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.nodes.len() as u32).map(NodeIndex)
    }

    /// Child positions leading from the root to `index`
    pub fn path(&self, index: NodeIndex) -> Vec<usize> {
        let mut path = Vec::with_capacity(self[index].depth);
        let mut current = index;
        while let Some(parent) = self[current].parent {
            path.push(self[current].index_in_parent);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<NodeIndex> {
        path.iter().try_fold(self.root(), |current, &step| {
            self.get(current)?.children.get(step).copied()
        })
    }

    /// Proper ancestors of `index`, nearest first
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self[index].parent, move |current| self[*current].parent)
    }

    pub fn is_ancestor_or_self(&self, ancestor: NodeIndex, index: NodeIndex) -> bool {
        ancestor <= index && index.0 < self[ancestor].subtree_end
    }

    /// Half-open preorder bounds of the subtree rooted at `index`
    pub fn subtree_bounds(&self, index: NodeIndex) -> (NodeIndex, NodeIndex) {
        (index, NodeIndex(self[index].subtree_end))
    }

    /// `index` and all of its descendants in preorder
    pub fn subtree(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + use<> {
        (index.0..self[index].subtree_end).map(NodeIndex)
    }

    /// Deepest node whose range encloses `range`.
    ///
    /// For an empty `range` the descent only enters children that contain the
    /// point strictly inside, so an insertion at a boundary stays with the
    /// parent of the two touching siblings.
    pub fn smallest_containing(&self, range: TextRange) -> NodeIndex {
        let mut current = self.root();
        'descend: loop {
            for &child in &self[current].children {
                let child_range = self[child].range;
                let enters = if range.is_empty() {
                    child_range.start < range.start && range.end < child_range.end
                } else {
                    child_range.contains_range(range)
                };
                if enters {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Deepest node touching `offset`, preferring the one that starts there
    pub fn node_at_offset(&self, offset: usize) -> NodeIndex {
        let mut current = self.root();
        'descend: loop {
            let children = &self[current].children;
            let hit = children
                .iter()
                .find(|&&child| {
                    let range = self[child].range;
                    range.start <= offset && offset < range.end
                })
                .or_else(|| {
                    children
                        .iter()
                        .find(|&&child| self[child].range.contains_inclusive(offset))
                });
            match hit {
                Some(&child) => {
                    current = child;
                    continue 'descend;
                }
                None => return current,
            }
        }
    }

    /// Error or missing nodes whose range touches `range`
    pub fn errors_touching(&self, range: TextRange) -> impl Iterator<Item = NodeIndex> + '_ {
        self.indices().filter(move |&index| {
            let node = &self[index];
            (node.is_error || node.is_missing) && node.range.touches(range)
        })
    }

    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|node| node.is_error || node.is_missing)
    }

    /// Indented outline of the tree, leaves annotated with their text
    pub fn dump(&self, text: &str) -> String {
        let mut out = String::new();
        for index in self.indices() {
            let node = &self[index];
            let indent = "  ".repeat(node.depth);
            let _ = write!(out, "{indent}{} {}", node.kind, node.range);
            if node.children.is_empty() {
                let snippet = text.get(node.range.start..node.range.end).unwrap_or("");
                let _ = write!(out, " {snippet:?}");
            }
            if node.is_missing {
                out.push_str(" (missing)");
            } else if node.is_error {
                out.push_str(" (error)");
            }
            out.push('\n');
        }
        out
    }
}

impl Index<NodeIndex> for SyntaxTree {
    type Output = NativeNode;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.as_usize()]
    }
}

/// Preorder builder used by parser implementations
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NativeNode>,
    stack: Vec<NodeIndex>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: SyntaxKind, range: TextRange) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        let (index_in_parent, depth) = match parent {
            Some(parent) => {
                let parent_node = &mut self.nodes[parent.as_usize()];
                parent_node.children.push(index);
                (parent_node.children.len() - 1, parent_node.depth + 1)
            }
            None => (0, 0),
        };
        self.nodes.push(NativeNode {
            kind,
            range,
            parent,
            children: Vec::new(),
            index_in_parent,
            depth,
            subtree_end: index.0 + 1,
            is_error: false,
            is_missing: false,
        });
        index
    }

    /// Open a composite node; its end is fixed by [`finish_node`](Self::finish_node)
    pub fn start_node(&mut self, kind: SyntaxKind, start: usize) -> NodeIndex {
        let index = self.push(kind, TextRange::empty(start));
        self.stack.push(index);
        index
    }

    pub fn finish_node(&mut self, end: usize) {
        if let Some(index) = self.stack.pop() {
            let subtree_end = self.nodes.len() as u32;
            let node = &mut self.nodes[index.as_usize()];
            node.range.end = end.max(node.range.start);
            node.subtree_end = subtree_end;
        }
    }

    pub fn token(&mut self, kind: SyntaxKind, range: TextRange) -> NodeIndex {
        self.push(kind, range)
    }

    /// Zero-width placeholder for an expected but absent token
    pub fn missing(&mut self, kind: SyntaxKind, at: usize) -> NodeIndex {
        let index = self.push(kind, TextRange::empty(at));
        let node = &mut self.nodes[index.as_usize()];
        node.is_missing = true;
        node.is_error = true;
        index
    }

    pub fn mark_error(&mut self, index: NodeIndex) {
        if let Some(node) = self.nodes.get_mut(index.as_usize()) {
            node.is_error = true;
        }
    }

    pub fn mark_missing(&mut self, index: NodeIndex) {
        if let Some(node) = self.nodes.get_mut(index.as_usize()) {
            node.is_missing = true;
        }
    }

    /// Close every open node and normalize the root to `[0, text_len]`.
    pub fn finish(mut self, root_kind: SyntaxKind, text_len: usize) -> SyntaxTree {
        while self.stack.len() > 1 {
            let end = self
                .nodes
                .last()
                .map_or(text_len, |node| node.range.end);
            self.finish_node(end);
        }
        if self.nodes.is_empty() {
            self.start_node(root_kind, 0);
        }
        self.stack.clear();
        let subtree_end = self.nodes.len() as u32;
        let root = &mut self.nodes[0];
        root.range = TextRange::new(0, text_len);
        root.subtree_end = subtree_end;
        SyntaxTree {
            generation: TreeGeneration::default(),
            nodes: self.nodes,
        }
    }
}
