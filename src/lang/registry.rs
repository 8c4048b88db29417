//! Factory utilities and metadata for the built-in grammars.

use std::path::Path;
use tree_sitter::Language;

use super::profile::{GrammarProfile, PYTHON, RUST};
use crate::core::errors::{ReanchorError, Result};

/// Metadata describing one of the built-in grammars.
#[derive(Debug, Clone, Copy)]
pub struct LanguageInfo {
    /// Canonical short key (matches CLI/config usage, e.g. "py").
    pub key: &'static str,
    /// Human-friendly display name.
    pub name: &'static str,
    /// Supported file extensions (without leading dots).
    pub extensions: &'static [&'static str],
}

const REGISTERED_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        key: "py",
        name: "Python",
        extensions: &["py", "pyi"],
    },
    LanguageInfo {
        key: "rs",
        name: "Rust",
        extensions: &["rs"],
    },
];

/// Return the languages that are compiled into this build.
pub fn registered_languages() -> &'static [LanguageInfo] {
    REGISTERED_LANGUAGES
}

/// Identify the canonical language key for a file path.
pub fn language_key_for_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    if ext.is_empty() {
        return None;
    }

    find_language_by_extension(&ext).map(|info| info.key.to_string())
}

/// Grammar profile for a language key or alias
pub fn grammar_profile(language: &str) -> Result<&'static GrammarProfile> {
    match normalize_language_key(language) {
        Some("py") => Ok(&PYTHON),
        Some("rs") => Ok(&RUST),
        _ => Err(ReanchorError::unsupported(format!(
            "No grammar profile for '{}'",
            language
        ))),
    }
}

/// Get tree-sitter language for a given language key
pub fn get_tree_sitter_language(language_key: &str) -> Result<Language> {
    match normalize_language_key(language_key) {
        Some("py") => Ok(tree_sitter_python::LANGUAGE.into()),
        Some("rs") => Ok(tree_sitter_rust::LANGUAGE.into()),
        _ => Err(ReanchorError::unsupported(format!(
            "No tree-sitter grammar for: {}",
            language_key
        ))),
    }
}

/// Create a new parser for the given language
pub fn create_parser_for_language(language_key: &str) -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    let tree_sitter_language = get_tree_sitter_language(language_key)?;
    parser.set_language(&tree_sitter_language).map_err(|e| {
        ReanchorError::parse(
            language_key,
            format!("Failed to set parser language: {}", e),
        )
    })?;
    Ok(parser)
}

/// Check whether a file extension (with or without leading dot) is supported.
pub fn extension_is_supported(ext: &str) -> bool {
    find_language_by_extension(ext).is_some()
}

/// Whether a path has a supported extension
pub fn path_is_supported(path: &Path) -> bool {
    language_key_for_path(path).is_some()
}

fn find_language_by_extension(ext: &str) -> Option<&'static LanguageInfo> {
    let target = ext.trim_start_matches('.').to_ascii_lowercase();
    registered_languages().iter().find(|info| {
        info.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&target))
    })
}

fn normalize_language_key(language: &str) -> Option<&'static str> {
    match language.to_ascii_lowercase().as_str() {
        "py" | "pyi" | "python" => Some("py"),
        "rs" | "rust" => Some("rs"),
        _ => None,
    }
}
