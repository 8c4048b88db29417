//! Language adapters producing arena syntax trees from tree-sitter parses.

pub mod converter;
pub mod profile;
pub mod registry;
pub mod resolver;

pub use converter::{TreeConverter, CUSTOM_BLOCK_END_KIND, CUSTOM_BLOCK_START_KIND};
pub use profile::GrammarProfile;
pub use registry::{
    create_parser_for_language, extension_is_supported, get_tree_sitter_language,
    grammar_profile, language_key_for_path, path_is_supported, registered_languages,
    LanguageInfo,
};
pub use resolver::{read_source, FsResolver};
