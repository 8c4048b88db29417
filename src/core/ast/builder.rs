//! Incremental construction of a [`ParsedFile`] together with its text.

use super::{NodeFlags, NodeId, ParsedFile, SourceSpan, SyntaxTree};

/// Builds a tree and its source text in one pass.
///
/// Leaves append their tokens to the text; `open`/`close` pairs record the
/// span of everything appended in between.
#[derive(Debug)]
pub struct FileBuilder {
    name: String,
    text: String,
    line: usize,
    tree: SyntaxTree,
}

impl FileBuilder {
    /// Start a file whose root has kind `file`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            line: 1,
            tree: SyntaxTree::new("file", None),
        }
    }

    /// Root node id
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Open an inner node; its span starts at the current position
    pub fn open(&mut self, parent: NodeId, kind: &str, flags: NodeFlags) -> NodeId {
        let start = self.text.len();
        self.tree.add_child(
            parent,
            kind,
            flags,
            Some(SourceSpan::new(start, start, self.line)),
        )
    }

    /// Close a node opened with [`FileBuilder::open`]
    pub fn close(&mut self, id: NodeId) {
        let end = self.text.trim_end().len();
        if let Some(node) = self.tree.node_mut(id) {
            if let Some(span) = node.span.as_mut() {
                span.end = end.max(span.start);
            }
        }
    }

    /// Append a leaf carrying one token
    pub fn leaf(&mut self, parent: NodeId, kind: &str, token: &str) -> NodeId {
        self.leaf_with(parent, kind, &[token], NodeFlags::default())
    }

    /// Append a leaf carrying several tokens with explicit flags
    pub fn leaf_with(
        &mut self,
        parent: NodeId,
        kind: &str,
        tokens: &[&str],
        flags: NodeFlags,
    ) -> NodeId {
        let start = self.text.len();
        let line = self.line;
        let joined = tokens.join(" ");
        self.push_text(&joined);
        let end = self.text.len();
        self.push_text(" ");

        let id = self
            .tree
            .add_child(parent, kind, flags, Some(SourceSpan::new(start, end, line)));
        self.tree
            .set_value(id, tokens.iter().map(|t| t.to_string()).collect());
        id
    }

    /// Append raw text that belongs to no leaf (punctuation, layout)
    pub fn text(&mut self, text: &str) {
        self.push_text(text);
    }

    /// Append a line break
    pub fn newline(&mut self) {
        self.push_text("\n");
    }

    /// Finish the file; the root spans the whole text
    pub fn finish(mut self) -> ParsedFile {
        let root = self.tree.root();
        self.tree
            .set_span(root, SourceSpan::new(0, self.text.len(), 1));
        ParsedFile::new(self.name, self.text, self.tree)
    }

    fn push_text(&mut self, text: &str) {
        self.line += text.matches('\n').count();
        self.text.push_str(text);
    }
}
