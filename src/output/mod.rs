//! Output module for collecting and exporting crawl results
//!
//! This module handles:
//! - Aggregating finished records without duplicates
//! - Exporting records as YAML or JSON
//! - Generating markdown summaries and console statistics

mod aggregator;
mod json;
mod markdown;
pub mod stats;
mod traits;
mod yaml;

pub use aggregator::Aggregator;
pub use json::JsonExporter;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::print_statistics;
pub use traits::{CrawlSummary, ExportDocument, ExportError, ExportResult, Exporter};
pub use yaml::YamlExporter;

use crate::config::ExportFormat;
use crate::record::RepositoryRecord;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Returns the exporter for a configured format
pub fn exporter_for(format: ExportFormat) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Yaml => Box::new(YamlExporter),
        ExportFormat::Json => Box::new(JsonExporter),
    }
}

/// Writes the export document to a file
///
/// Parent directories are created as needed. An empty record set still
/// produces a valid document.
///
/// # Arguments
///
/// * `path` - Destination file
/// * `format` - Document format
/// * `records` - Records in discovery order
pub fn write_export(
    path: &Path,
    format: ExportFormat,
    records: &[RepositoryRecord],
) -> ExportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    exporter_for(format).export(records, &mut writer)?;

    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
