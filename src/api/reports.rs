//! Report routes
//!
//! Aggregate reports, the outstanding-payment list and their exports,
//! plus the notification, print and event logs. Every route here sits
//! behind the coordinator gate.

use axum::{
    extract::{Extension, OriginalUri, Path, Query, State},
    http::{header, HeaderName, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sqlx::PgPool;

use crate::domain::RequestContext;
use crate::error::{AppError, AppResult};
use crate::export::{Artifact, ExportError, ExportFormat, Exporter, RowSource};
use crate::reporting::{
    aggregate_source, AggregateRow, MonitoringLogView, PrintLogView, ReportDimension,
    ReportService, SettlementView, TimeWindow, TransactionView, WaLogView,
};

use super::AppState;

/// Report name used in the outstanding-payment export filename
const OUTSTANDING_REPORT: &str = "transactions";

const FLASH_WARNING: HeaderName = HeaderName::from_static("x-flash-warning");

#[derive(Debug, Serialize)]
pub struct AggregateReportResponse {
    pub report: String,
    pub headers: Vec<&'static str>,
    /// One object per group, keyed by `headers`
    pub rows: Vec<Map<String, Value>>,
}

/// Routes mounted under the coordinator gate
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/tunggakan", get(outstanding_report))
        .route(
            "/reports/tunggakan/export/:format",
            get(export_outstanding_report),
        )
        .route("/reports/daily-settlement", get(daily_settlement_report))
        .route("/reports/wa-monitoring", get(wa_monitoring_report))
        .route("/reports/log-monitoring", get(log_monitoring_report))
        .route("/reports/bluetooth-print", get(bluetooth_print_report))
        .route("/reports/:dimension", get(aggregate_report))
        .route(
            "/reports/:dimension/export/:format",
            get(export_aggregate_report),
        )
}

// =========================================================================
// GET /reports/:dimension
// =========================================================================

async fn aggregate_report(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
    Query(window): Query<TimeWindow>,
) -> AppResult<Json<AggregateReportResponse>> {
    let dimension = ReportDimension::from_slug(&slug)?;
    let rows = ReportService::new(pool).aggregate(dimension, window).await?;

    let headers = dimension.headers();

    Ok(Json(AggregateReportResponse {
        report: dimension.report_name(),
        headers: headers.to_vec(),
        rows: keyed_rows(headers, rows),
    }))
}

// =========================================================================
// GET /reports/:dimension/export/:format
// =========================================================================

async fn export_aggregate_report(
    State(pool): State<PgPool>,
    State(exporter): State<Exporter>,
    Extension(context): Extension<RequestContext>,
    OriginalUri(uri): OriginalUri,
    Path((slug, format)): Path<(String, String)>,
    Query(window): Query<TimeWindow>,
) -> AppResult<Response> {
    let dimension = ReportDimension::from_slug(&slug)?;

    let format = match choose_format(exporter, &format) {
        Ok(format) => format,
        Err(ExportError::UnsupportedFormat(raw)) => return Ok(format_warning(&uri, &raw)),
        Err(e) => return Err(e.into()),
    };

    let service = ReportService::new(pool);
    let rows = service.aggregate(dimension, window).await?;

    let report_name = dimension.report_name();
    let artifact = render(
        exporter,
        report_name.clone(),
        format,
        dimension.headers(),
        aggregate_source(rows),
    )
    .await?;
    record_download(&service, &context, &report_name, &artifact).await?;

    Ok(download(artifact))
}

// =========================================================================
// GET /reports/tunggakan
// =========================================================================

async fn outstanding_report(State(pool): State<PgPool>) -> AppResult<Json<Vec<TransactionView>>> {
    let transactions = ReportService::new(pool).outstanding_transactions().await?;

    Ok(Json(transactions))
}

async fn export_outstanding_report(
    State(pool): State<PgPool>,
    State(exporter): State<Exporter>,
    Extension(context): Extension<RequestContext>,
    OriginalUri(uri): OriginalUri,
    Path(format): Path<String>,
) -> AppResult<Response> {
    let format = match choose_format(exporter, &format) {
        Ok(format) => format,
        Err(ExportError::UnsupportedFormat(raw)) => return Ok(format_warning(&uri, &raw)),
        Err(e) => return Err(e.into()),
    };

    let service = ReportService::new(pool);
    let transactions = service.outstanding_transactions().await?;

    let artifact = render(
        exporter,
        OUTSTANDING_REPORT.to_string(),
        format,
        &TransactionView::HEADERS,
        RowSource::records(transactions),
    )
    .await?;
    record_download(&service, &context, OUTSTANDING_REPORT, &artifact).await?;

    Ok(download(artifact))
}

// =========================================================================
// GET /reports/daily-settlement
// =========================================================================

async fn daily_settlement_report(
    State(pool): State<PgPool>,
    Query(window): Query<TimeWindow>,
) -> AppResult<Json<Vec<SettlementView>>> {
    let settlements = ReportService::new(pool).daily_settlements(window).await?;

    Ok(Json(settlements))
}

// =========================================================================
// GET /reports/wa-monitoring, /reports/log-monitoring, /reports/bluetooth-print
// =========================================================================

async fn wa_monitoring_report(State(pool): State<PgPool>) -> AppResult<Json<Vec<WaLogView>>> {
    Ok(Json(ReportService::new(pool).wa_logs().await?))
}

async fn log_monitoring_report(
    State(pool): State<PgPool>,
) -> AppResult<Json<Vec<MonitoringLogView>>> {
    Ok(Json(ReportService::new(pool).monitoring_logs().await?))
}

async fn bluetooth_print_report(
    State(pool): State<PgPool>,
) -> AppResult<Json<Vec<PrintLogView>>> {
    Ok(Json(ReportService::new(pool).print_logs().await?))
}

// =========================================================================
// Helpers
// =========================================================================

/// Key each aggregate row by the dimension's column names.
fn keyed_rows(headers: &[&str], rows: Vec<AggregateRow>) -> Vec<Map<String, Value>> {
    rows.into_iter()
        .map(|row| {
            let values = [json!(row.label), json!(row.count), json!(row.total)];
            headers
                .iter()
                .map(|h| h.to_string())
                .zip(values)
                .collect()
        })
        .collect()
}

/// Parse the path format and make sure this process can render it.
fn choose_format(exporter: Exporter, raw: &str) -> Result<ExportFormat, ExportError> {
    let format: ExportFormat = raw.parse()?;

    if !exporter.capabilities().supports(format) {
        return Err(ExportError::CapabilityUnavailable(format));
    }

    Ok(format)
}

/// Render off the async runtime; workbook and page layout are CPU-bound.
async fn render(
    exporter: Exporter,
    report_name: String,
    format: ExportFormat,
    headers: &'static [&'static str],
    source: RowSource,
) -> AppResult<Artifact> {
    let artifact = tokio::task::spawn_blocking(move || {
        exporter.export(&report_name, format, headers, source)
    })
    .await
    .map_err(|e| AppError::Internal(format!("export task failed: {}", e)))??;

    tracing::info!(
        filename = %artifact.filename,
        bytes = artifact.bytes.len(),
        "Report exported"
    );

    Ok(artifact)
}

/// Audit row for a rendered export. Anonymous callers never pass the gate.
async fn record_download(
    service: &ReportService,
    context: &RequestContext,
    report_type: &str,
    artifact: &Artifact,
) -> AppResult<()> {
    if let Some(user_id) = context.principal.user_id() {
        service
            .record_export(user_id, report_type, &artifact.filename)
            .await?;
    }
    Ok(())
}

fn download(artifact: Artifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, artifact.mime_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.filename),
            ),
        ],
        artifact.bytes,
    )
        .into_response()
}

/// `/api/v1/reports/officer/export/csv` -> `/api/v1/reports/officer`
fn report_path(export_path: &str) -> &str {
    export_path.rsplitn(3, '/').nth(2).filter(|p| !p.is_empty()).unwrap_or("/")
}

/// Send the caller back to the report, filters intact, with a warning
/// instead of a file.
fn format_warning(uri: &Uri, raw: &str) -> Response {
    let printable: String = raw.chars().filter(|c| c.is_ascii_graphic()).collect();
    let warning = ExportError::UnsupportedFormat(printable).to_string();

    tracing::warn!(uri = %uri, "{}", warning);

    let location = match uri.query() {
        Some(query) => format!("{}?{}", report_path(uri.path()), query),
        None => report_path(uri.path()).to_string(),
    };

    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location),
            (FLASH_WARNING, warning),
        ],
    )
        .into_response()
}
