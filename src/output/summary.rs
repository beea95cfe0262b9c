use super::candidates::format_distance;
use crate::error::OutputError;
use crate::planner::{CollectSource, PlanRequest, SessionReport};
use crate::place::PlaceRecord;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub timestamp: String,
    pub anchor: String,
    pub companion: String,
    pub radius_m: u32,
    pub duration_sec: f64,
    pub categories: Vec<CategorySummary>,
    pub degraded: usize,
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub status: String,
    pub places: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateEntry {
    pub index: usize,
    #[serde(flatten)]
    pub place: PlaceRecord,
}

/// Write `<session>.json` and `<session>.md` into `output_dir`
pub fn write_summary(
    output_dir: &Path,
    request: &PlanRequest,
    report: &SessionReport,
) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(output_dir).map_err(OutputError::CreateDir)?;

    let summary = build_summary(request, report);

    let json_path = output_dir.join(format!("{}.json", summary.session_id));
    let json = serde_json::to_string_pretty(&summary)?;
    fs::write(&json_path, json).map_err(OutputError::Write)?;

    let md_path = output_dir.join(format!("{}.md", summary.session_id));
    fs::write(&md_path, build_summary_markdown(&summary)).map_err(OutputError::Write)?;

    Ok(json_path)
}

pub fn build_summary(request: &PlanRequest, report: &SessionReport) -> SessionSummary {
    let categories = report
        .outcomes
        .iter()
        .map(|outcome| {
            let (status, error) = match &outcome.source {
                CollectSource::Cached => ("cached", None),
                CollectSource::Fresh => ("fresh", None),
                CollectSource::Stale { error } => ("stale", Some(error.clone())),
                CollectSource::Failed { error } => ("failed", Some(error.clone())),
            };
            CategorySummary {
                category: outcome.category.clone(),
                status: status.to_string(),
                places: outcome.places,
                error,
            }
        })
        .collect();

    let candidates = report
        .candidates
        .indexed()
        .map(|(index, place)| CandidateEntry {
            index,
            place: place.clone(),
        })
        .collect();

    SessionSummary {
        session_id: report.session_id.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        anchor: request.anchor.to_string(),
        companion: request.companion.clone(),
        radius_m: request.radius_m,
        duration_sec: report.duration.as_secs_f64(),
        categories,
        degraded: report.degraded(),
        candidates,
    }
}

fn build_summary_markdown(summary: &SessionSummary) -> String {
    let mut md = String::new();

    md.push_str("# daytrip candidates\n\n");
    md.push_str(&format!("**Generated:** {}\n", summary.timestamp));
    md.push_str(&format!("**Session:** {}\n", summary.session_id));
    md.push_str(&format!(
        "**Anchor:** {} (radius {}m)\n",
        summary.anchor, summary.radius_m
    ));
    md.push_str(&format!("**Companion:** {}\n", summary.companion));
    md.push_str(&format!("**Duration:** {:.1}s\n\n", summary.duration_sec));

    md.push_str("## Categories\n\n");
    md.push_str("| Category | Status | Places |\n");
    md.push_str("|----------|--------|--------|\n");
    for category in &summary.categories {
        let status_icon = match category.status.as_str() {
            "fresh" => "✅",
            "cached" => "💾",
            "stale" => "⚠️",
            "failed" => "❌",
            _ => "❓",
        };
        let status = match &category.error {
            Some(error) => format!("{} {} ({})", status_icon, category.status, error),
            None => format!("{} {}", status_icon, category.status),
        };
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            category.category, status, category.places
        ));
    }

    md.push_str("\n## Candidates\n\n");
    md.push_str("| # | Name | Category | Distance |\n");
    md.push_str("|---|------|----------|----------|\n");
    for entry in &summary.candidates {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            entry.index,
            entry.place.name,
            entry.place.category,
            format_distance(entry.place.distance_from_anchor)
        ));
    }

    md
}
