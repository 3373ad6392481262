use crate::output::traits::{ExportDocument, ExportResult, Exporter};
use crate::record::RepositoryRecord;
use std::io::Write;

/// Pretty-printed JSON with the same shape as the YAML document
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn export(&self, records: &[RepositoryRecord], writer: &mut dyn Write) -> ExportResult<()> {
        let document = ExportDocument {
            repositories: records,
        };
        serde_json::to_writer_pretty(&mut *writer, &document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
