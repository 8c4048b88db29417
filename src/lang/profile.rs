//! Per-language grammar profiles.
//!
//! A profile decides how tree-sitter node kinds map onto arena flags: which
//! kinds are landmarks, which are left out of headers, which compare exactly
//! and which weigh less than a plain token.

use crate::core::ast::NodeFlags;

/// Flag assignment for one tree-sitter grammar
#[derive(Debug, Clone, Copy)]
pub struct GrammarProfile {
    /// Canonical language key
    pub key: &'static str,
    /// Kinds a user can pin and that act as ancestors/islands
    pub landmarks: &'static [&'static str],
    /// Kinds excluded from headers (bodies, secondary clauses)
    pub hidden: &'static [&'static str],
    /// Header priority overrides for leaf kinds
    pub priorities: &'static [(&'static str, f64)],
    /// Leaf kinds whose values only match when identical
    pub exact_match: &'static [&'static str],
    /// Comment kinds; scanned for custom block markers, otherwise dropped
    pub comments: &'static [&'static str],
    /// Punctuation-like named kinds carrying no information
    pub skipped: &'static [&'static str],
}

impl GrammarProfile {
    /// Arena flags for a node kind
    pub fn flags(&self, kind: &str) -> NodeFlags {
        let mut flags = if self.hidden.contains(&kind) {
            NodeFlags::hidden()
        } else {
            NodeFlags::default()
        };

        if self.landmarks.contains(&kind) {
            flags.is_land = true;
        }
        if let Some((_, priority)) = self.priorities.iter().find(|(k, _)| *k == kind) {
            flags.priority = *priority;
        }
        flags.exact_match = self.exact_match.contains(&kind);
        flags
    }

    /// Whether the kind is a comment
    pub fn is_comment(&self, kind: &str) -> bool {
        self.comments.contains(&kind)
    }

    /// Whether nodes of this kind are left out of the arena
    pub fn is_skipped(&self, kind: &str) -> bool {
        self.skipped.contains(&kind)
    }
}

/// tree-sitter-python
pub const PYTHON: GrammarProfile = GrammarProfile {
    key: "py",
    landmarks: &[
        "class_definition",
        "function_definition",
        "if_statement",
        "for_statement",
        "while_statement",
        "with_statement",
        "try_statement",
    ],
    hidden: &[
        "block",
        "elif_clause",
        "else_clause",
        "except_clause",
        "finally_clause",
        "decorator",
    ],
    priorities: &[("string_content", 0.5), ("none", 0.5)],
    exact_match: &["integer", "float", "true", "false"],
    comments: &["comment"],
    skipped: &["string_start", "string_end", "line_continuation"],
};

/// tree-sitter-rust
pub const RUST: GrammarProfile = GrammarProfile {
    key: "rs",
    landmarks: &[
        "function_item",
        "function_signature_item",
        "impl_item",
        "trait_item",
        "struct_item",
        "enum_item",
        "union_item",
        "mod_item",
        "macro_definition",
        "const_item",
        "static_item",
        "type_item",
        "if_expression",
        "match_expression",
        "for_expression",
        "while_expression",
        "loop_expression",
        "closure_expression",
    ],
    hidden: &[
        "block",
        "declaration_list",
        "field_declaration_list",
        "enum_variant_list",
        "match_block",
        "else_clause",
        "token_tree",
        "macro_rule",
    ],
    priorities: &[
        ("visibility_modifier", 0.5),
        ("lifetime", 0.5),
        ("mutable_specifier", 0.5),
        ("self", 0.5),
    ],
    exact_match: &[
        "visibility_modifier",
        "mutable_specifier",
        "integer_literal",
        "boolean_literal",
    ],
    comments: &["line_comment", "block_comment"],
    skipped: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmarks_keep_header_priority() {
        let flags = PYTHON.flags("function_definition");
        assert!(flags.is_land);
        assert_eq!(flags.priority, 1.0);
    }

    #[test]
    fn test_bodies_are_hidden() {
        assert_eq!(PYTHON.flags("block").priority, 0.0);
        assert_eq!(RUST.flags("declaration_list").priority, 0.0);
        assert!(!RUST.flags("block").is_land);
    }

    #[test]
    fn test_overrides_apply_to_leaves() {
        let flags = RUST.flags("visibility_modifier");
        assert_eq!(flags.priority, 0.5);
        assert!(flags.exact_match);
        assert!(!RUST.flags("identifier").exact_match);
    }

    #[test]
    fn test_comments_and_skipped_kinds() {
        assert!(PYTHON.is_comment("comment"));
        assert!(RUST.is_comment("line_comment"));
        assert!(PYTHON.is_skipped("string_start"));
        assert!(!RUST.is_skipped("identifier"));
    }
}
