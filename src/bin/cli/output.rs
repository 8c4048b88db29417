//! Console and JSON rendering of command results.

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{settings::Style as TableStyle, Table, Tabled};
use uuid::Uuid;

use reanchor_rs::core::config::ReanchorConfig;
use reanchor_rs::{ConcernPoint, PointStore, RemapCandidateInfo, RemapResult, SearchScope};

/// Outcome of one relocation run
#[derive(Debug, Serialize)]
pub struct RelocationReport {
    pub scope: SearchScope,
    pub points: Vec<PointReport>,
}

#[derive(Debug, Serialize)]
pub struct PointReport {
    pub id: Uuid,
    pub name: String,
    pub origin: String,
    pub status: PointStatus,
    pub candidates: Vec<CandidateReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    /// Confidently relocated
    Relocated,
    /// Candidates exist but none was accepted
    Ambiguous,
    /// No candidate at all
    Lost,
}

#[derive(Debug, Serialize)]
pub struct CandidateReport {
    pub file: String,
    pub line: usize,
    pub kind: String,
    pub header: String,
    pub similarity: f64,
}

impl CandidateReport {
    fn from_candidate(candidate: &RemapCandidateInfo) -> Self {
        Self {
            file: candidate.file_name().to_string(),
            line: candidate.line(),
            kind: candidate.context.kind.clone(),
            header: header_summary(&candidate.context.header),
            similarity: candidate.similarity_or_zero(),
        }
    }
}

impl RelocationReport {
    /// Summarise `result`, keeping at most `top` candidates per point
    pub fn new(store: &PointStore, result: &RemapResult, scope: SearchScope, top: usize) -> Self {
        let points = store
            .points
            .iter()
            .map(|point| {
                let candidates = result.get(&point.id).map(Vec::as_slice).unwrap_or(&[]);
                let status = match candidates.first() {
                    Some(first) if first.is_auto => PointStatus::Relocated,
                    Some(_) => PointStatus::Ambiguous,
                    None => PointStatus::Lost,
                };

                PointReport {
                    id: point.id,
                    name: point.name.clone(),
                    origin: origin(point),
                    status,
                    candidates: candidates
                        .iter()
                        .take(top.max(1))
                        .map(CandidateReport::from_candidate)
                        .collect(),
                }
            })
            .collect();

        Self { scope, points }
    }

    /// Number of points with the given status
    pub fn count(&self, status: PointStatus) -> usize {
        self.points.iter().filter(|p| p.status == status).count()
    }
}

fn origin(point: &ConcernPoint) -> String {
    format!("{}:{}", point.file_name, point.context.line)
}

/// Header tokens of a context, joined for display
pub fn header_summary(header: &[reanchor_rs::context::HeaderContextElement]) -> String {
    header
        .iter()
        .map(|element| element.joined_value())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_relocation_table(report: &RelocationReport) {
    #[derive(Tabled)]
    struct RelocationRow {
        point: String,
        status: String,
        was: String,
        now: String,
        similarity: String,
    }

    let mut rows = Vec::new();
    for point in &report.points {
        let status = match point.status {
            PointStatus::Relocated => "relocated".green().to_string(),
            PointStatus::Ambiguous => "ambiguous".yellow().to_string(),
            PointStatus::Lost => "lost".red().to_string(),
        };

        if point.candidates.is_empty() {
            rows.push(RelocationRow {
                point: point.name.clone(),
                status,
                was: point.origin.clone(),
                now: "-".to_string(),
                similarity: "-".to_string(),
            });
            continue;
        }

        for (rank, candidate) in point.candidates.iter().enumerate() {
            let first = rank == 0;
            rows.push(RelocationRow {
                point: if first { point.name.clone() } else { String::new() },
                status: if first { status.clone() } else { String::new() },
                was: if first { point.origin.clone() } else { String::new() },
                now: format!("{}:{} {}", candidate.file, candidate.line, candidate.header),
                similarity: format!("{:.3}", candidate.similarity),
            });
        }
    }

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
    println!(
        "{} relocated, {} ambiguous, {} lost ({} scope)",
        report.count(PointStatus::Relocated).to_string().green(),
        report.count(PointStatus::Ambiguous).to_string().yellow(),
        report.count(PointStatus::Lost).to_string().red(),
        match report.scope {
            SearchScope::Local => "local",
            SearchScope::Global => "global",
        }
    );
}

/// One pinnable node of a file
pub struct LandmarkRow {
    pub line: usize,
    pub end_line: usize,
    pub kind: String,
    pub header: String,
}

pub fn print_landmarks(file: &str, landmarks: Vec<LandmarkRow>) {
    #[derive(Tabled)]
    struct Row {
        lines: String,
        kind: String,
        header: String,
    }

    println!("{} {}", "Landmarks of".bright_blue().bold(), file.cyan());
    let rows: Vec<Row> = landmarks
        .into_iter()
        .map(|landmark| Row {
            lines: format!("{}-{}", landmark.line, landmark.end_line),
            kind: landmark.kind,
            header: landmark.header,
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}

pub fn display_config_summary(config: &ReanchorConfig) {
    #[derive(Tabled)]
    struct ConfigRow {
        setting: String,
        value: String,
    }

    let matching = &config.matching;
    let heuristics = &config.heuristics;
    let rows = vec![
        ConfigRow {
            setting: "Acceptance Threshold".to_string(),
            value: format!("{:.2}", matching.acceptance_threshold),
        },
        ConfigRow {
            setting: "Distinctiveness Factor".to_string(),
            value: format!("{:.2}", matching.distinctiveness_factor),
        },
        ConfigRow {
            setting: "File Similarity Threshold".to_string(),
            value: format!("{:.2}", matching.file_similarity_threshold),
        },
        ConfigRow {
            setting: "Sibling Tie-Break".to_string(),
            value: matching.use_siblings.to_string(),
        },
        ConfigRow {
            setting: "Closest Contexts".to_string(),
            value: format!(
                "{} (min {:.2})",
                matching.closest_count, matching.closest_min_similarity
            ),
        },
        ConfigRow {
            setting: "Default Weights (header/ancestors/inner)".to_string(),
            value: format!(
                "{}/{}/{}",
                heuristics.default_weights.header,
                heuristics.default_weights.ancestors,
                heuristics.default_weights.inner
            ),
        },
        ConfigRow {
            setting: "Custom Block Markers".to_string(),
            value: format!(
                "{} ... {}",
                config.context.custom_block_start, config.context.custom_block_end
            ),
        },
    ];

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}
