//! Command Execution Logic
//!
//! Loads configuration and pins, builds search areas over a source root and
//! drives the re-anchoring engine.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};
use tracing::{debug, info};

use reanchor_rs::lang::{registered_languages, FsResolver};
use reanchor_rs::remap::FileResolver;
use reanchor_rs::{
    ContextExtractor, ContextFinder, PointStore, ReanchorConfig, SearchArea,
    SearchScope,
};

use crate::cli::args::*;
use crate::cli::output::*;

/// Load the configuration file, or the defaults when none is given
pub fn load_configuration(config_path: Option<&Path>) -> anyhow::Result<ReanchorConfig> {
    match config_path {
        Some(path) => ReanchorConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(ReanchorConfig::default()),
    }
}

fn source_area(root: &Path, config: &ReanchorConfig) -> anyhow::Result<SearchArea> {
    let resolver = FsResolver::discover(root, config.context.clone())?;
    debug!(
        "Search area over {} holds {} file(s)",
        root.display(),
        resolver.file_names().len()
    );
    Ok(SearchArea::new(Arc::new(resolver)))
}

fn file_name(raw: &str) -> String {
    raw.trim_start_matches("./").replace('\\', "/")
}

/// Pin the innermost landmark covering a line
pub fn pin_command(args: PinArgs, config: ReanchorConfig) -> anyhow::Result<()> {
    let name = file_name(&args.file);
    let area = source_area(&args.root, &config)?;
    let file = area.file(&name).ok_or_else(|| {
        anyhow!(
            "{} could not be found or parsed under {}",
            name,
            args.root.display()
        )
    })?;

    let node = file
        .parsed
        .innermost_landmark_at_line(args.line, args.kind.as_deref())
        .ok_or_else(|| anyhow!("No landmark covers line {} of {}", args.line, name))?;

    let finder = ContextFinder::new(config)?;
    let point = finder.pin(args.name.as_str(), &file, node, &area);

    let mut store = PointStore::load_or_default(&args.store.store)?;
    let kind = point.kind().to_string();
    let line = point.context.line;
    let closest = point.context.closest_contexts().len();
    let id = store.add(point);
    store.save(&args.store.store)?;

    info!("Pinned {} ({} closest context(s))", id, closest);
    println!(
        "{} {} {} {}:{} {}",
        "Pinned".bright_green().bold(),
        args.name.cyan(),
        "to".dimmed(),
        name,
        line,
        kind.dimmed()
    );
    Ok(())
}

/// Relocate every stored pin
pub fn relocate_command(args: RelocateArgs, config: ReanchorConfig) -> anyhow::Result<()> {
    let store_path = &args.store.store;
    if !store_path.exists() {
        return Err(anyhow!(
            "No point store at {}; pin something first",
            store_path.display()
        ));
    }

    let mut store = PointStore::load(store_path)?;
    if store.is_empty() {
        println!("{}", "No points stored".dimmed());
        return Ok(());
    }

    let scope = if args.global {
        SearchScope::Global
    } else {
        SearchScope::Local
    };

    let area = source_area(&args.root, &config)?;
    let finder = ContextFinder::new(config)?;
    let result = finder.find(&store.points, &area, scope);

    let report = RelocationReport::new(&store, &result, scope, args.top);
    match args.format {
        OutputFormat::Table => print_relocation_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if args.update {
        let mut updated = 0;
        for (id, candidates) in &result {
            if let Some(winner) = candidates.first().filter(|c| c.is_auto) {
                if let Some(point) = store.get_mut(*id) {
                    finder.rebind(point, winner, &area);
                    updated += 1;
                }
            }
        }

        store.save(store_path)?;
        eprintln!(
            "{} {} point(s) in {}",
            "Updated".bright_green().bold(),
            updated,
            store_path.display()
        );
    }

    Ok(())
}

/// List the landmarks of one file
pub fn landmarks_command(args: LandmarksArgs, config: ReanchorConfig) -> anyhow::Result<()> {
    let name = file_name(&args.file);
    let resolver = FsResolver::with_files(&args.root, [name.clone()], config.context.clone());
    let area = SearchArea::new(Arc::new(resolver));
    let file = area
        .file(&name)
        .ok_or_else(|| anyhow!("{} could not be found or parsed", name))?;

    let extractor = ContextExtractor::with_file_context(&file.parsed, Arc::clone(&file.context));
    let rows = file
        .parsed
        .tree
        .landmarks()
        .into_iter()
        .map(|id| LandmarkRow {
            line: file.parsed.tree.node(id).line(),
            end_line: file.parsed.end_line(id),
            kind: file.parsed.tree.node(id).kind.clone(),
            header: header_summary(&extractor.header(id)),
        })
        .collect();

    print_landmarks(&name, rows);
    Ok(())
}

/// Print default configuration in YAML format
pub fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default reanchor configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!("{}", "# Usage: reanchor --config your-config.yml relocate".dimmed());
    println!();

    let yaml_output = serde_yaml::to_string(&ReanchorConfig::default())?;
    println!("{}", yaml_output);
    Ok(())
}

/// Validate a configuration file
pub fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "Validating configuration:".bright_blue().bold(),
        args.file.display().to_string().cyan()
    );

    let config = match load_configuration(Some(&args.file)) {
        Ok(config) => {
            println!("{}", "Configuration file is valid!".bright_green().bold());
            config
        }
        Err(e) => {
            eprintln!("{} {:#}", "Configuration validation failed:".red(), e);
            eprintln!(
                "{}",
                "Tip: use 'reanchor print-default-config' to see the valid format".dimmed()
            );
            return Err(e);
        }
    };

    if args.detailed {
        println!();
        display_config_summary(&config);
    }
    Ok(())
}

/// List supported programming languages
pub fn list_languages() -> anyhow::Result<()> {
    #[derive(Tabled)]
    struct LanguageRow {
        key: String,
        language: String,
        extensions: String,
    }

    let rows: Vec<LanguageRow> = registered_languages()
        .iter()
        .map(|info| LanguageRow {
            key: info.key.to_string(),
            language: info.name.to_string(),
            extensions: info
                .extensions
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();

    println!("{}", "Supported Programming Languages".bright_blue().bold());
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
    Ok(())
}
