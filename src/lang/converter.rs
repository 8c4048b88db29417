//! Conversion of tree-sitter trees into arena syntax trees.
//!
//! Only named nodes are kept. A named node without convertible named children
//! becomes a leaf whose value is its whitespace-separated text. Comments are
//! dropped unless they carry a custom block marker; a start marker opens a
//! [`CUSTOM_BLOCK_KIND`] node that collects the following siblings until the
//! matching end marker (or the end of the enclosing node).

use std::path::Path;

use tracing::debug;
use tree_sitter::{Node, Parser};

use super::profile::GrammarProfile;
use super::registry;
use crate::core::ast::{
    NodeFlags, NodeId, ParsedFile, SourceSpan, SyntaxTree, CUSTOM_BLOCK_BODY_KIND,
    CUSTOM_BLOCK_KIND,
};
use crate::core::config::ContextConfig;
use crate::core::errors::{ReanchorError, Result};

/// Leaf opening a custom block; its value is the block name
pub const CUSTOM_BLOCK_START_KIND: &str = "custom_block_start";

/// Leaf closing a custom block
pub const CUSTOM_BLOCK_END_KIND: &str = "custom_block_end";

/// Parses source text of one language into [`ParsedFile`]s
pub struct TreeConverter {
    profile: &'static GrammarProfile,
    parser: Parser,
    markers: ContextConfig,
}

impl std::fmt::Debug for TreeConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeConverter")
            .field("language", &self.profile.key)
            .field("markers", &self.markers)
            .finish()
    }
}

impl TreeConverter {
    /// Converter for a language key or alias
    pub fn new(language: &str, markers: ContextConfig) -> Result<Self> {
        let profile = registry::grammar_profile(language)?;
        let parser = registry::create_parser_for_language(language)?;
        Ok(Self {
            profile,
            parser,
            markers,
        })
    }

    /// Converter chosen by file extension
    pub fn for_path(path: &Path, markers: ContextConfig) -> Result<Self> {
        let key = registry::language_key_for_path(path).ok_or_else(|| {
            ReanchorError::unsupported(format!(
                "Could not determine language for file: {}",
                path.display()
            ))
        })?;
        Self::new(&key, markers)
    }

    /// Grammar profile in use
    pub fn profile(&self) -> &GrammarProfile {
        self.profile
    }

    /// Parse `text` and convert it
    pub fn parse(&mut self, name: &str, text: &str) -> Result<ParsedFile> {
        let tree = self.parser.parse(text, None).ok_or_else(|| {
            ReanchorError::parse_in_file(self.profile.key, "parser produced no tree", name)
        })?;

        let root = tree.root_node();
        if root.has_error() {
            debug!("{} contains syntax errors, converting the recovered tree", name);
        }

        let mut syntax = SyntaxTree::new(root.kind(), Some(span_of(&root)));
        let root_id = syntax.root();
        Conversion {
            profile: self.profile,
            markers: &self.markers,
            source: text,
            tree: &mut syntax,
        }
        .children(&root, root_id);

        Ok(ParsedFile::new(name, text, syntax))
    }
}

enum Marker {
    Start(Vec<String>),
    End,
}

struct OpenBlock {
    node: NodeId,
    body: NodeId,
    start: usize,
    line: usize,
    marker_end: usize,
}

struct Conversion<'a> {
    profile: &'static GrammarProfile,
    markers: &'a ContextConfig,
    source: &'a str,
    tree: &'a mut SyntaxTree,
}

impl Conversion<'_> {
    fn children(&mut self, node: &Node<'_>, parent: NodeId) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        let mut open: Vec<OpenBlock> = Vec::new();

        for child in &children {
            let target = open.last().map_or(parent, |block| block.body);

            if self.profile.is_comment(child.kind()) {
                match self.marker(child) {
                    Some(Marker::Start(name)) => {
                        let block = self.open_block(child, target, name);
                        open.push(block);
                    }
                    Some(Marker::End) => {
                        if let Some(block) = open.pop() {
                            self.close_block(block, Some(child));
                        }
                    }
                    None => {}
                }
                continue;
            }

            if self.profile.is_skipped(child.kind()) {
                continue;
            }
            self.node(child, target);
        }

        while let Some(block) = open.pop() {
            self.close_block(block, None);
        }
    }

    fn node(&mut self, node: &Node<'_>, parent: NodeId) {
        let kind = node.kind();
        let id = self
            .tree
            .add_child(parent, kind, self.profile.flags(kind), Some(span_of(node)));

        let mut cursor = node.walk();
        let convertible = node.named_children(&mut cursor).any(|child| {
            let kind = child.kind();
            !self.profile.is_skipped(kind)
                && (!self.profile.is_comment(kind) || self.marker(&child).is_some())
        });

        if convertible {
            self.children(node, id);
        } else {
            let value: Vec<String> = self
                .text(node)
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if !value.is_empty() {
                self.tree.set_value(id, value);
            }
        }
    }

    fn open_block(&mut self, marker: &Node<'_>, parent: NodeId, name: Vec<String>) -> OpenBlock {
        let span = span_of(marker);
        let node = self
            .tree
            .add_child(parent, CUSTOM_BLOCK_KIND, NodeFlags::land(), Some(span));

        let start = self.tree.add_child(
            node,
            CUSTOM_BLOCK_START_KIND,
            NodeFlags::default(),
            Some(span),
        );
        if !name.is_empty() {
            self.tree.set_value(start, name);
        }

        let body = self
            .tree
            .add_child(node, CUSTOM_BLOCK_BODY_KIND, NodeFlags::hidden(), None);

        OpenBlock {
            node,
            body,
            start: span.start,
            line: span.start_line,
            marker_end: span.end,
        }
    }

    fn close_block(&mut self, block: OpenBlock, end_marker: Option<&Node<'_>>) {
        let content = self.tree.children(block.body);
        let first = content.first().and_then(|id| self.tree.node(*id).span);
        let last = content.last().and_then(|id| self.tree.node(*id).span);

        let body_span = match (first, last) {
            (Some(first), Some(last)) => SourceSpan::new(first.start, last.end, first.start_line),
            _ => SourceSpan::new(block.marker_end, block.marker_end, block.line),
        };
        self.tree.set_span(block.body, body_span);

        // unbalanced blocks get a zero-width end leaf so the content stays
        // strictly between the two markers
        let end_span = match end_marker {
            Some(marker) => span_of(marker),
            None => SourceSpan::new(body_span.end, body_span.end, body_span.start_line),
        };
        self.tree.add_child(
            block.node,
            CUSTOM_BLOCK_END_KIND,
            NodeFlags::hidden(),
            Some(end_span),
        );

        self.tree.set_span(
            block.node,
            SourceSpan::new(block.start, end_span.end, block.line),
        );
    }

    fn marker(&self, node: &Node<'_>) -> Option<Marker> {
        if !self.profile.is_comment(node.kind()) {
            return None;
        }

        let body = self
            .text(node)
            .trim()
            .trim_start_matches(['/', '*', '!'])
            .trim_end_matches(['/', '*'])
            .trim();

        let rest_after = |marker: &str| {
            body.strip_prefix(marker)
                .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        };

        if rest_after(&self.markers.custom_block_end).is_some() {
            return Some(Marker::End);
        }
        rest_after(&self.markers.custom_block_start)
            .map(|rest| Marker::Start(rest.split_whitespace().map(str::to_string).collect()))
    }

    fn text(&self, node: &Node<'_>) -> &str {
        self.source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or("")
    }
}

fn span_of(node: &Node<'_>) -> SourceSpan {
    SourceSpan::new(
        node.start_byte(),
        node.end_byte(),
        node.start_position().row + 1,
    )
}

#[cfg(test)]
#[path = "converter_tests.rs"]
mod tests;
