//! Export errors

use super::ExportFormat;

/// Errors raised while choosing or rendering an export format
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The format parsed but this process cannot render it
    #[error("{0} export capability unavailable")]
    CapabilityUnavailable(ExportFormat),

    /// The caller asked for a format that does not exist
    #[error("{0} export not yet implemented")]
    UnsupportedFormat(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Report exceeds format limits: {0}")]
    TooLarge(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_display() {
        let err = ExportError::CapabilityUnavailable(ExportFormat::Document);
        assert_eq!(err.to_string(), "pdf export capability unavailable");

        let err = ExportError::UnsupportedFormat("csv".to_string());
        assert_eq!(err.to_string(), "csv export not yet implemented");
    }
}
