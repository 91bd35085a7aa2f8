//! Collections back-office library
//!
//! Re-exports modules for the server binary, the key tool and integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod export;
pub mod reporting;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{DomainError, Principal, RequestContext, Role};
pub use export::{ExportCapabilities, ExportFormat, Exporter};
pub use reporting::{ReportDimension, ReportService, TimeWindow};
