//! Report row types

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{PaymentType, SettlementStatus, TransactionStatus, WaStatus};
use crate::export::{Attributes, RawValue, RowSource};

/// One group of an aggregate report: (label, count, sum).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    /// Group label; `None` when the grouped column is null (e.g. no rbm_code)
    pub label: Option<String>,
    pub count: i64,
    pub total: Decimal,
}

impl From<AggregateRow> for Vec<RawValue> {
    fn from(row: AggregateRow) -> Self {
        vec![row.label.into(), row.count.into(), row.total.into()]
    }
}

/// Aggregate rows are positional tuples for export purposes
pub fn aggregate_source(rows: Vec<AggregateRow>) -> RowSource {
    RowSource::Tuples(rows.into_iter().map(Vec::from).collect())
}

/// A transaction joined with its officer's username
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    pub id: i64,
    pub idpel: String,
    pub periode: NaiveDate,
    pub total: Decimal,
    pub payment_type: PaymentType,
    pub status: TransactionStatus,
    pub officer_name: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TransactionView {
    /// Columns of the transaction list export
    pub const HEADERS: [&'static str; 8] = [
        "id",
        "idpel",
        "periode",
        "total",
        "payment_type",
        "status",
        "officer_name",
        "created_at",
    ];

    /// Officer username, or "N/A" when the transaction has no officer
    pub fn officer_label(&self) -> &str {
        self.officer_name.as_deref().unwrap_or(UNASSIGNED_OFFICER)
    }
}

/// Shown in place of a missing officer username
pub const UNASSIGNED_OFFICER: &str = "N/A";

impl Attributes for TransactionView {
    fn attribute(&self, name: &str) -> Option<RawValue> {
        let value: RawValue = match name {
            "id" => self.id.into(),
            "idpel" => self.idpel.as_str().into(),
            "periode" => self.periode.into(),
            "total" => self.total.into(),
            "payment_type" => self.payment_type.as_str().into(),
            "status" => self.status.as_str().into(),
            "officer_name" => self.officer_label().into(),
            "created_at" => self.created_at.into(),
            _ => return None,
        };
        Some(value)
    }
}

/// A daily settlement with its officer's username
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementView {
    pub id: i64,
    pub date: NaiveDate,
    pub total_amount: Decimal,
    pub officer_id: i64,
    pub officer_name: String,
    pub status: SettlementStatus,
    pub created_at: NaiveDateTime,
    pub verified_at: Option<NaiveDateTime>,
}

/// A WhatsApp payment notice and its delivery timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaLogView {
    pub id: i64,
    pub idpel: String,
    pub message: Option<String>,
    pub status: WaStatus,
    pub sent_at: NaiveDateTime,
    pub delivered_at: Option<NaiveDateTime>,
    pub read_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// An application event, with the acting user when there is one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringLogView {
    pub id: i64,
    pub module_name: String,
    pub event_type: String,
    pub details: Option<String>,
    pub username: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A Bluetooth receipt print joined to the transaction it printed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintLogView {
    pub id: i64,
    pub transaction_id: i64,
    pub idpel: String,
    pub total: Decimal,
    pub printed_by: String,
    pub file_path: Option<String>,
    pub printed_at: NaiveDateTime,
}

/// One transaction of a customer lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerTransaction {
    pub id: i64,
    pub periode: NaiveDate,
    pub total: Decimal,
    pub payment_type: PaymentType,
    pub status: TransactionStatus,
    /// Officer username, "N/A" when unassigned
    pub officer_name: String,
    pub created_at: NaiveDateTime,
}

impl From<TransactionView> for CustomerTransaction {
    fn from(view: TransactionView) -> Self {
        let officer_name = view.officer_label().to_string();
        Self {
            id: view.id,
            periode: view.periode,
            total: view.total,
            payment_type: view.payment_type,
            status: view.status,
            officer_name,
            created_at: view.created_at,
        }
    }
}

/// Every transaction recorded against one customer id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerLookup {
    pub idpel: String,
    pub transactions: Vec<CustomerTransaction>,
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_transactions: i64,
    pub completed_transactions: i64,
    pub pending_transactions: i64,
    /// Per-month count and sum over the trailing window
    pub monthly: Vec<AggregateRow>,
    pub recent_transactions: Vec<TransactionView>,
}
