//! YAML export, the default document format

use crate::output::traits::{ExportDocument, ExportResult, Exporter};
use crate::record::RepositoryRecord;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlExporter;

impl Exporter for YamlExporter {
    fn export(&self, records: &[RepositoryRecord], writer: &mut dyn Write) -> ExportResult<()> {
        let document = ExportDocument {
            repositories: records,
        };
        serde_yaml::to_writer(&mut *writer, &document)?;
        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "yaml"
    }
}
