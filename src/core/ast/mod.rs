//! Arena-backed syntax trees consumed by context extraction.
//!
//! Nodes live in one flat `Vec` and refer to each other through [`NodeId`]
//! indices, so parent and child links never form ownership cycles. Trees are
//! produced by a language adapter (see [`crate::lang`]) or assembled by hand
//! with [`FileBuilder`].

use serde::{Deserialize, Serialize};

mod builder;

pub use builder::FileBuilder;

#[cfg(test)]
mod tests;

/// Syntactic type of the transparent "custom block" wrapper.
///
/// A custom block's first child is its start marker and its last child its end
/// marker; everything in between is its meaningful range.
pub const CUSTOM_BLOCK_KIND: &str = "custom_block";

/// Hidden node a language adapter may wrap a custom block's content in.
///
/// When it is the only node between the markers, its children form the
/// meaningful range.
pub const CUSTOM_BLOCK_BODY_KIND: &str = "custom_block_body";

/// Index of a node inside its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Location of a node in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// One-based line of the start offset
    pub start_line: usize,
}

impl SourceSpan {
    /// Create a span
    pub fn new(start: usize, end: usize, start_line: usize) -> Self {
        Self {
            start,
            end,
            start_line,
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no text
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-node flags set by the grammar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeFlags {
    /// Semantically significant node (unit of type matching and ancestry)
    pub is_land: bool,
    /// Weight of the node inside a header context; non-positive nodes are skipped
    pub priority: f64,
    /// Header values of this node must match literally
    pub exact_match: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            is_land: false,
            priority: 1.0,
            exact_match: false,
        }
    }
}

impl NodeFlags {
    /// Flags of a landmark node
    pub fn land() -> Self {
        Self {
            is_land: true,
            ..Self::default()
        }
    }

    /// Flags of a node excluded from headers
    pub fn hidden() -> Self {
        Self {
            priority: 0.0,
            ..Self::default()
        }
    }

    /// Override the priority
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Override exact matching
    pub fn with_exact_match(mut self, exact_match: bool) -> Self {
        self.exact_match = exact_match;
        self
    }
}

/// One node of the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    /// Syntactic type
    pub kind: String,
    /// Literal tokens carried by the node (usually leaves only)
    pub value: Vec<String>,
    /// Child links in source order
    pub children: Vec<NodeId>,
    /// Parent link, `None` for the root
    pub parent: Option<NodeId>,
    /// Source location, absent for synthetic nodes
    pub span: Option<SourceSpan>,
    /// Grammar flags
    pub flags: NodeFlags,
}

impl AstNode {
    /// Whether the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether the node carries literal tokens
    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }

    /// Whether the node is the transparent custom block wrapper
    pub fn is_custom_block(&self) -> bool {
        self.kind == CUSTOM_BLOCK_KIND
    }

    /// Start line of the node, 0 when it has no location
    pub fn line(&self) -> usize {
        self.span.map(|span| span.start_line).unwrap_or(0)
    }
}

/// Flat syntax tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<AstNode>,
    root: NodeId,
}

impl SyntaxTree {
    /// Create a tree holding only its root
    pub fn new(root_kind: impl Into<String>, root_span: Option<SourceSpan>) -> Self {
        let root = AstNode {
            kind: root_kind.into(),
            value: Vec::new(),
            children: Vec::new(),
            parent: None,
            span: root_span,
            flags: NodeFlags::default(),
        };

        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Root node id
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Node by id, `None` for foreign ids
    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.index())
    }

    /// Node by id
    ///
    /// # Panics
    /// Panics when `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.index()]
    }

    /// Mutable node by id
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut AstNode> {
        self.nodes.get_mut(id.index())
    }

    /// Append a child under `parent`
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: impl Into<String>,
        flags: NodeFlags,
        span: Option<SourceSpan>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(AstNode {
            kind: kind.into(),
            value: Vec::new(),
            children: Vec::new(),
            parent: Some(parent),
            span,
            flags,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Set the literal tokens of a node
    pub fn set_value(&mut self, id: NodeId, value: Vec<String>) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.value = value;
        }
    }

    /// Set the span of a node
    pub fn set_span(&mut self, id: NodeId, span: SourceSpan) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.span = Some(span);
        }
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Meaningful children of a custom block (markers and body wrapper
    /// stripped), or all children for any other node
    pub fn custom_block_range(&self, id: NodeId) -> &[NodeId] {
        let children = self.children(id);
        match self.get(id) {
            Some(node) if node.is_custom_block() => {
                let between: &[NodeId] = if children.len() <= 2 {
                    &[]
                } else {
                    &children[1..children.len() - 1]
                };
                match between {
                    [body] if self.node(*body).kind == CUSTOM_BLOCK_BODY_KIND => {
                        self.children(*body)
                    }
                    _ => between,
                }
            }
            _ => children,
        }
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Pre-order traversal of the subtree rooted at `id` (including `id`)
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }

        order
    }

    /// All nodes of the given kind in pre-order
    pub fn nodes_of_kind(&self, kind: &str) -> Vec<NodeId> {
        self.preorder(self.root)
            .into_iter()
            .filter(|id| self.node(*id).kind == kind)
            .collect()
    }

    /// All landmark nodes in pre-order
    pub fn landmarks(&self) -> Vec<NodeId> {
        self.preorder(self.root)
            .into_iter()
            .filter(|id| self.node(*id).flags.is_land)
            .collect()
    }
}

/// A parsed source file: its name, text and tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    /// File name used for identity and local-scope matching
    pub name: String,
    /// Full source text
    pub text: String,
    /// Parsed tree
    pub tree: SyntaxTree,
}

impl ParsedFile {
    /// Bundle a parsed tree with its source
    pub fn new(name: impl Into<String>, text: impl Into<String>, tree: SyntaxTree) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            tree,
        }
    }

    /// Source text covered by a node, empty when it has no location
    pub fn node_text(&self, id: NodeId) -> &str {
        self.tree
            .get(id)
            .and_then(|node| node.span)
            .and_then(|span| self.span_text(span))
            .unwrap_or("")
    }

    /// Source text covered by a span
    pub fn span_text(&self, span: SourceSpan) -> Option<&str> {
        self.text.get(span.start..span.end)
    }

    /// Number of lines in the text
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Last line covered by a node
    pub fn end_line(&self, id: NodeId) -> usize {
        let node = self.tree.node(id);
        node.line() + self.node_text(id).matches('\n').count()
    }

    /// Innermost landmark covering `line`, optionally restricted to a kind
    pub fn innermost_landmark_at_line(&self, line: usize, kind: Option<&str>) -> Option<NodeId> {
        self.tree
            .landmarks()
            .into_iter()
            .filter(|id| {
                let node = self.tree.node(*id);
                kind.map_or(true, |k| node.kind == k)
                    && node.span.is_some()
                    && (node.line()..=self.end_line(*id)).contains(&line)
            })
            .min_by_key(|id| self.tree.node(*id).span.map(|s| s.len()).unwrap_or(usize::MAX))
    }
}
