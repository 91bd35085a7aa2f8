//! Reporting module
//!
//! Grouped count/sum queries over the transaction ledger, plus the listing
//! queries behind the dashboard and outstanding-payment reports.

mod dimension;
mod rows;
mod service;

use chrono::NaiveDate;

use crate::domain::DomainError;

pub use dimension::{DateBucket, ReportDimension, TimeWindow};
pub use rows::{
    aggregate_source, AggregateRow, CustomerLookup, CustomerTransaction, DashboardSummary,
    MonitoringLogView, PrintLogView, SettlementView, TransactionView, WaLogView,
    UNASSIGNED_OFFICER,
};
pub use service::{ReportService, DASHBOARD_WINDOW_DAYS};

/// Report query errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Unknown report: {0}")]
    UnknownDimension(String),

    #[error("Invalid time window: {from} is after {to}")]
    InvalidWindow { from: NaiveDate, to: NaiveDate },
}
