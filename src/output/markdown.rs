//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including run information, fetch statistics, data quality and the
//! repository table.

use crate::crawler::CrawlReport;
use crate::output::traits::{CrawlSummary, ExportResult};
use crate::record::RepositoryRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary file for a finished crawl
///
/// # Arguments
///
/// * `report` - The crawl report
/// * `config_hash` - Hash of the configuration file, if the crawl used one
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    report: &CrawlReport,
    config_hash: Option<&str>,
    output_path: &Path,
) -> ExportResult<()> {
    let mut summary = CrawlSummary::from_report(report);
    if let Some(hash) = config_hash {
        summary = summary.with_config_hash(hash);
    }
    let markdown = render_markdown(&summary, &report.records);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    render_markdown(&CrawlSummary::from_report(report), &report.records)
}

fn render_markdown(summary: &CrawlSummary, records: &[RepositoryRecord]) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Repository Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.duration_seconds
    ));
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Fetch statistics
    md.push_str("## Fetch Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages Fetched | {} |\n", summary.pages_fetched));
    md.push_str(&format!("| Listing Pages | {} |\n", summary.listing_pages));
    md.push_str(&format!("| Fetch Failures | {} |\n", summary.fetch_failures));
    md.push_str(&format!("| Retries | {} |\n", summary.retries));
    md.push_str(&format!(
        "| Duplicates Dropped | {} |\n",
        summary.duplicates_dropped
    ));
    md.push_str(&format!(
        "| Degraded Records | {} |\n",
        summary.degraded_records
    ));
    if summary.abandoned > 0 {
        md.push_str(&format!("| Abandoned on Stop | {} |\n", summary.abandoned));
    }
    md.push_str(&format!(
        "\n- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    // Data quality
    md.push_str("## Data Quality\n\n");
    md.push_str(&format!(
        "- **Repositories**: {}\n",
        summary.total_repositories
    ));
    md.push_str(&format!(
        "- **Without Description**: {}\n",
        summary.without_description
    ));
    md.push_str(&format!(
        "- **Without Languages**: {}\n",
        summary.without_languages
    ));
    md.push_str(&format!(
        "- **Without Update Date**: {}\n\n",
        summary.without_date
    ));

    // Languages
    if !summary.language_breakdown.is_empty() {
        md.push_str("## Languages\n\n");
        md.push_str("| Language | Repositories |\n");
        md.push_str("|----------|--------------|\n");
        for (lang, count) in summary.language_breakdown.iter().take(20) {
            md.push_str(&format!("| {} | {} |\n", escape_cell(lang), count));
        }
        md.push('\n');
    }

    // Repositories
    md.push_str("## Repositories\n\n");
    if records.is_empty() {
        md.push_str("No repositories found.\n");
    } else {
        md.push_str("| Name | Last Updated | Languages | Commits | About |\n");
        md.push_str("|------|--------------|-----------|---------|-------|\n");
        for record in records {
            md.push_str(&format!(
                "| [{}]({}) | {} | {} | {} | {} |\n",
                escape_cell(&record.name),
                record.url,
                record.last_updated,
                escape_cell(&record.languages.join(", ")),
                record.commits,
                escape_cell(&record.about)
            ));
        }
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
