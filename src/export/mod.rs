//! Export module
//!
//! Projects report rows into records and renders them as a downloadable
//! spreadsheet or document table. Artifacts are built fully in memory, so
//! memory use grows linearly with the number of report rows.

mod document;
mod error;
pub mod projection;
mod spreadsheet;
pub mod value;

use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

pub use error::ExportError;
pub use projection::{project, Attributes, ExportRecord, RowSource};
pub use value::{ExportValue, RawValue};

/// Target file format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Single-sheet xlsx workbook
    Spreadsheet,
    /// Paginated pdf with one table
    Document,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::Document => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Document => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Spreadsheet),
            "pdf" => Ok(ExportFormat::Document),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Which formats this process can render, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportCapabilities {
    pub document: bool,
}

impl ExportCapabilities {
    /// Document export needs both the compiled-in backend and configuration consent
    pub fn detect(document_enabled: bool) -> Self {
        Self {
            document: document::compiled_in() && document_enabled,
        }
    }

    pub fn spreadsheet_only() -> Self {
        Self { document: false }
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        match format {
            ExportFormat::Spreadsheet => true,
            ExportFormat::Document => self.document,
        }
    }
}

/// A rendered export, ready to be sent as a download
#[derive(Debug, Clone)]
pub struct Artifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `{report_name}_{YYYYMMDD_HHMMSS}.{ext}`
pub fn artifact_filename(report_name: &str, format: ExportFormat, at: NaiveDateTime) -> String {
    format!(
        "{}_{}.{}",
        report_name,
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Renders report rows in any format the process is capable of.
#[derive(Debug, Clone, Copy)]
pub struct Exporter {
    capabilities: ExportCapabilities,
}

impl Exporter {
    pub fn new(capabilities: ExportCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> ExportCapabilities {
        self.capabilities
    }

    /// Project `source` onto `headers` and render it.
    pub fn export(
        &self,
        report_name: &str,
        format: ExportFormat,
        headers: &[&str],
        source: RowSource,
    ) -> Result<Artifact, ExportError> {
        // Checked before projecting so a disabled format costs nothing.
        self.ensure_supported(format)?;
        let records = project(source, headers);
        self.render(report_name, format, headers, &records)
    }

    /// Render already-projected records.
    pub fn render(
        &self,
        report_name: &str,
        format: ExportFormat,
        headers: &[&str],
        records: &[ExportRecord],
    ) -> Result<Artifact, ExportError> {
        self.ensure_supported(format)?;

        let bytes = match format {
            ExportFormat::Spreadsheet => spreadsheet::write_workbook(headers, records)?,
            ExportFormat::Document => {
                document::write_document(&report_title(report_name), headers, records)?
            }
        };

        let filename = artifact_filename(report_name, format, Local::now().naive_local());

        tracing::debug!(
            report = report_name,
            format = %format,
            rows = records.len(),
            bytes = bytes.len(),
            "Export rendered"
        );

        Ok(Artifact {
            filename,
            mime_type: format.mime_type(),
            bytes,
        })
    }

    fn ensure_supported(&self, format: ExportFormat) -> Result<(), ExportError> {
        if self.capabilities.supports(format) {
            Ok(())
        } else {
            Err(ExportError::CapabilityUnavailable(format))
        }
    }
}

fn report_title(report_name: &str) -> String {
    report_name.replace('_', " ")
}
