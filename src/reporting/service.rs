//! Report Service
//!
//! Read-only grouped queries over the transaction ledger.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{PaymentType, SettlementStatus, TransactionStatus, WaStatus};

use super::dimension::{DateBucket, ReportDimension, TimeWindow};
use super::rows::{
    AggregateRow, CustomerLookup, CustomerTransaction, DashboardSummary, MonitoringLogView,
    PrintLogView, SettlementView, TransactionView, WaLogView,
};
use super::ReportError;

/// Trailing window of the dashboard's monthly series
pub const DASHBOARD_WINDOW_DAYS: i64 = 180;

/// Number of transactions listed on the dashboard
const RECENT_LIMIT: i64 = 5;

type TransactionTuple = (
    i64,
    String,
    NaiveDate,
    Decimal,
    String,
    String,
    Option<String>,
    NaiveDateTime,
);

type SettlementTuple = (
    i64,
    NaiveDate,
    Decimal,
    i64,
    String,
    String,
    NaiveDateTime,
    Option<NaiveDateTime>,
);

type WaLogTuple = (
    i64,
    String,
    Option<String>,
    String,
    NaiveDateTime,
    Option<NaiveDateTime>,
    Option<NaiveDateTime>,
    NaiveDateTime,
);

const TRANSACTION_VIEW_SELECT: &str = r#"
    SELECT t.id, t.idpel, t.periode, t.total, t.payment_type, t.status,
           u.username AS officer_name, t.created_at
    FROM transactions t
    LEFT JOIN officers o ON o.id = t.officer_id
    LEFT JOIN users u ON u.id = o.user_id
"#;

/// Report Service for aggregate and listing queries
#[derive(Debug, Clone)]
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    /// Create a new ReportService
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count and sum transactions per group of `dimension`.
    ///
    /// Groups without any transaction inside `window` do not appear. Rows
    /// come back ordered by label.
    pub async fn aggregate(
        &self,
        dimension: ReportDimension,
        window: TimeWindow,
    ) -> Result<Vec<AggregateRow>, ReportError> {
        let window = window.validate()?;
        let sql = aggregate_sql(dimension);

        let rows: Vec<(Option<String>, i64, Decimal)> = sqlx::query_as(&sql)
            .bind(window.from)
            .bind(window.to)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            dimension = dimension.slug(),
            from = ?window.from,
            to = ?window.to,
            groups = rows.len(),
            "Aggregate report queried"
        );

        Ok(rows
            .into_iter()
            .map(|(label, count, total)| AggregateRow { label, count, total })
            .collect())
    }

    /// Pending ("tunggakan") transactions, oldest period first
    pub async fn outstanding_transactions(&self) -> Result<Vec<TransactionView>, ReportError> {
        let sql = format!(
            "{} WHERE t.status = $1 ORDER BY t.periode, t.id",
            TRANSACTION_VIEW_SELECT
        );

        let rows: Vec<TransactionTuple> = sqlx::query_as(&sql)
            .bind(TransactionStatus::Pending.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(transaction_view).collect()
    }

    /// Most recently created transactions
    pub async fn recent_transactions(&self, limit: i64) -> Result<Vec<TransactionView>, ReportError> {
        let sql = format!(
            "{} ORDER BY t.created_at DESC, t.id DESC LIMIT $1",
            TRANSACTION_VIEW_SELECT
        );

        let rows: Vec<TransactionTuple> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(transaction_view).collect()
    }

    /// Daily settlements inside `window`, newest first
    pub async fn daily_settlements(
        &self,
        window: TimeWindow,
    ) -> Result<Vec<SettlementView>, ReportError> {
        let window = window.validate()?;

        let rows: Vec<SettlementTuple> = sqlx::query_as(
            r#"
            SELECT s.id, s.date, s.total_amount, s.officer_id, u.username,
                   s.status, s.created_at, s.verified_at
            FROM daily_settlements s
            JOIN officers o ON o.id = s.officer_id
            JOIN users u ON u.id = o.user_id
            WHERE ($1::date IS NULL OR s.date >= $1)
              AND ($2::date IS NULL OR s.date <= $2)
            ORDER BY s.date DESC, s.id DESC
            "#,
        )
        .bind(window.from)
        .bind(window.to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(id, date, total_amount, officer_id, officer_name, status, created_at, verified_at)|
                 -> Result<SettlementView, ReportError> {
                    Ok(SettlementView {
                        id,
                        date,
                        total_amount,
                        officer_id,
                        officer_name,
                        status: status.parse::<SettlementStatus>()?,
                        created_at,
                        verified_at,
                    })
                },
            )
            .collect()
    }

    /// WhatsApp notices, newest first
    pub async fn wa_logs(&self) -> Result<Vec<WaLogView>, ReportError> {
        let rows: Vec<WaLogTuple> = sqlx::query_as(
            r#"
            SELECT id, idpel, message, status, sent_at, delivered_at, read_at, created_at
            FROM wa_logs
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(id, idpel, message, status, sent_at, delivered_at, read_at, created_at)|
                 -> Result<WaLogView, ReportError> {
                    Ok(WaLogView {
                        id,
                        idpel,
                        message,
                        status: status.parse::<WaStatus>()?,
                        sent_at,
                        delivered_at,
                        read_at,
                        created_at,
                    })
                },
            )
            .collect()
    }

    /// Application events, newest first
    pub async fn monitoring_logs(&self) -> Result<Vec<MonitoringLogView>, ReportError> {
        let rows: Vec<(i64, String, String, Option<String>, Option<String>, NaiveDateTime)> =
            sqlx::query_as(
                r#"
                SELECT m.id, m.module_name, m.event_type, m.details, u.username, m.created_at
                FROM monitoring_logs m
                LEFT JOIN users u ON u.id = m.user_id
                ORDER BY m.created_at DESC, m.id DESC
                "#,
            )
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, module_name, event_type, details, username, created_at)| MonitoringLogView {
                    id,
                    module_name,
                    event_type,
                    details,
                    username,
                    created_at,
                },
            )
            .collect())
    }

    /// Receipt prints with their transaction, most recent print first
    pub async fn print_logs(&self) -> Result<Vec<PrintLogView>, ReportError> {
        let rows: Vec<(i64, i64, String, Decimal, String, Option<String>, NaiveDateTime)> =
            sqlx::query_as(
                r#"
                SELECT p.id, p.transaction_id, t.idpel, t.total, u.username,
                       p.file_path, p.printed_at
                FROM print_logs p
                JOIN transactions t ON t.id = p.transaction_id
                JOIN users u ON u.id = p.printed_by
                ORDER BY p.printed_at DESC, p.id DESC
                "#,
            )
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, transaction_id, idpel, total, printed_by, file_path, printed_at)| {
                    PrintLogView {
                        id,
                        transaction_id,
                        idpel,
                        total,
                        printed_by,
                        file_path,
                        printed_at,
                    }
                },
            )
            .collect())
    }

    /// Every transaction of one customer, latest period first
    pub async fn customer_lookup(&self, idpel: &str) -> Result<CustomerLookup, ReportError> {
        let sql = format!(
            "{} WHERE t.idpel = $1 ORDER BY t.periode DESC, t.id DESC",
            TRANSACTION_VIEW_SELECT
        );

        let rows: Vec<TransactionTuple> = sqlx::query_as(&sql)
            .bind(idpel)
            .fetch_all(&self.pool)
            .await?;

        let transactions = rows
            .into_iter()
            .map(|row| transaction_view(row).map(CustomerTransaction::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CustomerLookup {
            idpel: idpel.to_string(),
            transactions,
        })
    }

    /// Record that `user_id` downloaded an export; returns the audit row id.
    pub async fn record_export(
        &self,
        user_id: i64,
        report_type: &str,
        file_path: &str,
    ) -> Result<i64, ReportError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO report_exports (user_id, report_type, file_path)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(report_type)
        .bind(file_path)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id, user_id, report_type, file_path, "Report export recorded");

        Ok(id)
    }

    /// Dashboard headline counts, monthly series and recent activity
    pub async fn dashboard(&self, today: NaiveDate) -> Result<DashboardSummary, ReportError> {
        let (total, completed, pending): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'completed'),
                COUNT(*) FILTER (WHERE status = 'pending')
            FROM transactions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let monthly = self
            .aggregate(
                ReportDimension::Date(DateBucket::Month),
                TimeWindow::trailing(today, DASHBOARD_WINDOW_DAYS),
            )
            .await?;

        let recent_transactions = self.recent_transactions(RECENT_LIMIT).await?;

        Ok(DashboardSummary {
            total_transactions: total,
            completed_transactions: completed,
            pending_transactions: pending,
            monthly,
            recent_transactions,
        })
    }
}

/// Grouped COUNT/SUM statement for a dimension; `$1`/`$2` are the window bounds.
pub(crate) fn aggregate_sql(dimension: ReportDimension) -> String {
    let (label, joins, group) = dimension.sql_parts();
    format!(
        r#"
        SELECT {label} AS label, COUNT(t.id) AS count, COALESCE(SUM(t.total), 0) AS total
        FROM transactions t
        {joins}
        WHERE ($1::date IS NULL OR t.periode >= $1)
          AND ($2::date IS NULL OR t.periode <= $2)
        GROUP BY {group}
        ORDER BY {label}
        "#
    )
}

fn transaction_view(row: TransactionTuple) -> Result<TransactionView, ReportError> {
    let (id, idpel, periode, total, payment_type, status, officer_name, created_at) = row;

    Ok(TransactionView {
        id,
        idpel,
        periode,
        total,
        payment_type: payment_type.parse::<PaymentType>()?,
        status: status.parse::<TransactionStatus>()?,
        officer_name,
        created_at,
    })
}
