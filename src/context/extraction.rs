//! Derivation of contexts from a parsed file.

use std::sync::Arc;

use super::{
    AncestorsContextElement, FileContext, HeaderContextElement, PointContext, SiblingsContext,
    TextOrHash,
};
use crate::core::ast::{AstNode, NodeId, ParsedFile};

/// Extracts contexts for nodes of one file
#[derive(Debug, Clone)]
pub struct ContextExtractor<'a> {
    file: &'a ParsedFile,
    file_context: Arc<FileContext>,
}

impl<'a> ContextExtractor<'a> {
    /// Extractor computing the file context itself
    pub fn new(file: &'a ParsedFile) -> Self {
        Self::with_file_context(file, Arc::new(file_context(file)))
    }

    /// Extractor reusing an already computed file context
    pub fn with_file_context(file: &'a ParsedFile, file_context: Arc<FileContext>) -> Self {
        Self { file, file_context }
    }

    /// The file context shared by every extracted point
    pub fn file_context(&self) -> &Arc<FileContext> {
        &self.file_context
    }

    /// Header, inner, ancestors and file context
    pub fn core_context(&self, node: NodeId) -> PointContext {
        let ast = self.file.tree.node(node);
        PointContext::new(
            ast.kind.clone(),
            ast.line(),
            self.header(node),
            self.inner(node),
            self.ancestors(node),
            Arc::clone(&self.file_context),
        )
    }

    /// Core context extended with siblings
    pub fn context_with_siblings(&self, node: NodeId) -> PointContext {
        let mut context = self.core_context(node);
        context.siblings = self.siblings(node);
        context
    }

    /// Naming tokens of a node
    pub fn header(&self, node: NodeId) -> Vec<HeaderContextElement> {
        let tree = &self.file.tree;
        let ast = tree.node(node);

        if ast.has_value() {
            return vec![HeaderContextElement {
                kind: ast.kind.clone(),
                priority: 1.0,
                exact_match: ast.flags.exact_match,
                value: ast.value.clone(),
            }];
        }

        let mut header = Vec::new();
        let mut stack: Vec<NodeId> = tree.children(node).iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            let child = tree.node(current);

            if child.is_custom_block() {
                stack.extend(tree.custom_block_range(current).iter().rev().copied());
                continue;
            }

            if child.flags.priority <= 0.0 {
                continue;
            }

            if child.is_leaf() {
                header.push(header_element(child));
            } else {
                stack.extend(tree.children(current).iter().rev().copied());
            }
        }

        header
    }

    /// Enclosing landmarks, nearest first
    pub fn ancestors(&self, node: NodeId) -> Vec<AncestorsContextElement> {
        let tree = &self.file.tree;
        tree.ancestors(node)
            .filter(|id| {
                let ancestor = tree.node(*id);
                ancestor.flags.is_land && !ancestor.is_custom_block()
            })
            .map(|id| AncestorsContextElement {
                kind: tree.node(id).kind.clone(),
                header: self.header(id),
            })
            .collect()
    }

    /// Text of every inner descendant
    pub fn inner(&self, node: NodeId) -> TextOrHash {
        let tree = &self.file.tree;
        let mut fragments: Vec<&str> = Vec::new();
        let mut stack: Vec<NodeId> = tree.children(node).iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            let child = tree.node(current);

            if child.is_custom_block() {
                stack.extend(tree.custom_block_range(current).iter().rev().copied());
            } else if !child.is_leaf() {
                if let Some(text) = child.span.and_then(|span| self.file.span_text(span)) {
                    fragments.push(text);
                }
            }
        }

        TextOrHash::new(&fragments.join(" "))
    }

    /// Neighbours inside the nearest enclosing landmark
    pub fn siblings(&self, node: NodeId) -> Option<SiblingsContext> {
        let tree = &self.file.tree;
        let island = tree.ancestors(node).find(|id| {
            let ancestor = tree.node(*id);
            ancestor.flags.is_land && !ancestor.is_custom_block()
        })?;

        let mut flattened = Vec::new();
        self.flatten(tree.children(island), &mut flattened);
        let position = flattened.iter().position(|id| *id == node)?;

        Some(SiblingsContext {
            before: self.joined_text(&flattened[..position]),
            after: self.joined_text(&flattened[position + 1..]),
        })
    }

    fn flatten(&self, children: &[NodeId], out: &mut Vec<NodeId>) {
        let tree = &self.file.tree;
        for child in children {
            let ast = tree.node(*child);
            if ast.flags.is_land && !ast.is_custom_block() {
                out.push(*child);
            } else {
                self.flatten(tree.children(*child), out);
            }
        }
    }

    fn joined_text(&self, nodes: &[NodeId]) -> TextOrHash {
        let text = nodes
            .iter()
            .map(|id| self.file.node_text(*id))
            .collect::<Vec<_>>()
            .join(" ");
        TextOrHash::new(&text)
    }
}

/// File name, line count and fuzzy content of a file
pub fn file_context(file: &ParsedFile) -> FileContext {
    FileContext {
        name: file.name.clone(),
        line_count: file.line_count(),
        content: TextOrHash::new(&file.text),
    }
}

fn header_element(node: &AstNode) -> HeaderContextElement {
    HeaderContextElement {
        kind: node.kind.clone(),
        priority: node.flags.priority,
        exact_match: node.flags.exact_match,
        value: node.value.clone(),
    }
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
