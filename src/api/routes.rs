//! API Routes
//!
//! HTTP endpoint definitions. Each route group is wrapped in a role gate.

use axum::{
    extract::{Extension, Path, Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::{AnomalyStatus, RequestContext, Role, TalanganStatus};
use crate::error::{AppError, AppResult};
use crate::reporting::{CustomerLookup, DashboardSummary, ReportService};

use super::middleware::require_role;
use super::{reports, AppState};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CoordinatorResponse {
    pub id: i64,
    pub username: String,
    pub area_code: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OfficerResponse {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub rbm_code: Option<String>,
    pub coordinator_id: Option<i64>,
    pub coordinator_name: Option<String>,
    pub active: bool,
    pub imei: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OfficerStatusResponse {
    pub officer_id: i64,
    pub active: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TalanganResponse {
    pub id: i64,
    pub idpel: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub status: TalanganStatus,
    pub officer_id: i64,
    pub officer_name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnomalyResponse {
    pub id: i64,
    pub idpel: String,
    pub anomaly_type: String,
    pub description: Option<String>,
    pub status: AnomalyStatus,
    pub reported_by: String,
    pub resolved_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub resolved_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnomalyMasterResponse {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CustomerLookupParams {
    pub idpel: Option<String>,
}

impl CustomerLookupParams {
    /// The trimmed customer id; blank or missing is a bad request.
    fn idpel(&self) -> AppResult<&str> {
        self.idpel
            .as_deref()
            .map(str::trim)
            .filter(|idpel| !idpel.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("idpel is required".to_string()))
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    let admin = Router::new()
        .route("/master-data/coordinators", get(list_coordinators))
        .route("/master-data/officers", get(list_officers))
        .route(
            "/master-data/officers/:officer_id/toggle",
            post(toggle_officer_active),
        )
        .route(
            "/master-data/officers/:officer_id/reset-imei",
            post(reset_officer_imei),
        )
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role));

    let coordinator = reports::router()
        .route_layer(middleware::from_fn_with_state(Role::Coordinator, require_role));

    let field_officer = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/talangan/transactions", get(list_talangan))
        .route("/anomaly/daily-reports", get(list_anomalies))
        .route("/anomaly/master-data", get(list_anomaly_master))
        .route("/information/customer-lookup", get(customer_lookup))
        .route_layer(middleware::from_fn_with_state(
            Role::FieldOfficer,
            require_role,
        ));

    Router::new()
        .merge(admin)
        .merge(coordinator)
        .merge(field_officer)
}

// =========================================================================
// GET /dashboard
// =========================================================================

async fn dashboard(State(pool): State<PgPool>) -> AppResult<Json<DashboardSummary>> {
    let summary = ReportService::new(pool)
        .dashboard(Local::now().date_naive())
        .await?;

    Ok(Json(summary))
}

// =========================================================================
// GET /information/customer-lookup?idpel=
// =========================================================================

async fn customer_lookup(
    State(pool): State<PgPool>,
    Query(params): Query<CustomerLookupParams>,
) -> AppResult<Json<CustomerLookup>> {
    let idpel = params.idpel()?;
    let lookup = ReportService::new(pool).customer_lookup(idpel).await?;

    Ok(Json(lookup))
}

// =========================================================================
// Master data (admin)
// =========================================================================

async fn list_coordinators(
    State(pool): State<PgPool>,
) -> AppResult<Json<Vec<CoordinatorResponse>>> {
    let rows: Vec<(i64, String, Option<String>, bool, NaiveDateTime, Option<NaiveDateTime>)> =
        sqlx::query_as(
            r#"
            SELECT id, username, area_code, active, created_at, last_login
            FROM users
            WHERE role = $1
            ORDER BY username
            "#,
        )
        .bind(Role::Coordinator.as_str())
        .fetch_all(&pool)
        .await?;

    let coordinators = rows
        .into_iter()
        .map(
            |(id, username, area_code, active, created_at, last_login)| CoordinatorResponse {
                id,
                username,
                area_code,
                active,
                created_at,
                last_login,
            },
        )
        .collect();

    Ok(Json(coordinators))
}

type OfficerTuple = (
    i64,
    i64,
    String,
    Option<String>,
    Option<i64>,
    Option<String>,
    bool,
    Option<String>,
    NaiveDateTime,
    NaiveDateTime,
);

async fn list_officers(State(pool): State<PgPool>) -> AppResult<Json<Vec<OfficerResponse>>> {
    let rows: Vec<OfficerTuple> = sqlx::query_as(
        r#"
        SELECT o.id, o.user_id, u.username, o.rbm_code, o.coordinator_id, c.username,
               o.active, o.imei, o.created_at, o.updated_at
        FROM officers o
        JOIN users u ON u.id = o.user_id
        LEFT JOIN users c ON c.id = o.coordinator_id
        ORDER BY o.id
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let officers = rows
        .into_iter()
        .map(
            |(
                id,
                user_id,
                username,
                rbm_code,
                coordinator_id,
                coordinator_name,
                active,
                imei,
                created_at,
                updated_at,
            )| OfficerResponse {
                id,
                user_id,
                username,
                rbm_code,
                coordinator_id,
                coordinator_name,
                active,
                imei,
                created_at,
                updated_at,
            },
        )
        .collect();

    Ok(Json(officers))
}

/// Flip an officer's active flag
async fn toggle_officer_active(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Path(officer_id): Path<i64>,
) -> AppResult<Json<OfficerStatusResponse>> {
    let active: Option<bool> = sqlx::query_scalar(
        r#"
        UPDATE officers
        SET active = NOT active, updated_at = NOW()
        WHERE id = $1
        RETURNING active
        "#,
    )
    .bind(officer_id)
    .fetch_optional(&pool)
    .await?;

    let active = active.ok_or_else(|| AppError::not_found("Officer", officer_id))?;

    tracing::info!(
        officer_id,
        active,
        by = ?context.principal.user_id(),
        "Officer status toggled"
    );

    Ok(Json(OfficerStatusResponse {
        officer_id,
        active,
        message: format!(
            "Officer status updated to {}",
            if active { "active" } else { "inactive" }
        ),
    }))
}

/// Clear the device binding of an officer and its user account
async fn reset_officer_imei(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Path(officer_id): Path<i64>,
) -> AppResult<Json<OfficerStatusResponse>> {
    let mut tx = pool.begin().await?;

    let officer: Option<(i64, bool)> = sqlx::query_as(
        r#"
        UPDATE officers
        SET imei = NULL, updated_at = NOW()
        WHERE id = $1
        RETURNING user_id, active
        "#,
    )
    .bind(officer_id)
    .fetch_optional(&mut *tx)
    .await?;

    // Dropping tx without commit rolls back.
    let (user_id, active) = officer.ok_or_else(|| AppError::not_found("Officer", officer_id))?;

    sqlx::query("UPDATE users SET imei = NULL WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        officer_id,
        user_id,
        by = ?context.principal.user_id(),
        "Officer IMEI reset"
    );

    Ok(Json(OfficerStatusResponse {
        officer_id,
        active,
        message: "Officer IMEI reset successfully".to_string(),
    }))
}

// =========================================================================
// Talangan and anomalies (field officer)
// =========================================================================

async fn list_talangan(State(pool): State<PgPool>) -> AppResult<Json<Vec<TalanganResponse>>> {
    let rows: Vec<(i64, String, Decimal, NaiveDate, String, i64, String, NaiveDateTime)> =
        sqlx::query_as(
            r#"
            SELECT tt.id, tt.idpel, tt.amount, tt.date, tt.status, tt.officer_id,
                   u.username, tt.created_at
            FROM talangan_transactions tt
            JOIN officers o ON o.id = tt.officer_id
            JOIN users u ON u.id = o.user_id
            ORDER BY tt.date DESC, tt.id DESC
            "#,
        )
        .fetch_all(&pool)
        .await?;

    let transactions = rows
        .into_iter()
        .map(
            |(id, idpel, amount, date, status, officer_id, officer_name, created_at)|
             -> AppResult<TalanganResponse> {
                Ok(TalanganResponse {
                    id,
                    idpel,
                    amount,
                    date,
                    status: status.parse()?,
                    officer_id,
                    officer_name,
                    created_at,
                })
            },
        )
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(transactions))
}

type AnomalyTuple = (
    i64,
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    NaiveDateTime,
    Option<NaiveDateTime>,
);

async fn list_anomalies(State(pool): State<PgPool>) -> AppResult<Json<Vec<AnomalyResponse>>> {
    let rows: Vec<AnomalyTuple> = sqlx::query_as(
        r#"
        SELECT a.id, a.idpel, a.anomaly_type, a.description, a.status,
               r.username, s.username, a.created_at, a.resolved_at
        FROM anomalies a
        JOIN users r ON r.id = a.reported_by
        LEFT JOIN users s ON s.id = a.resolved_by
        ORDER BY a.created_at DESC, a.id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let anomalies = rows
        .into_iter()
        .map(
            |(
                id,
                idpel,
                anomaly_type,
                description,
                status,
                reported_by,
                resolved_by,
                created_at,
                resolved_at,
            )|
             -> AppResult<AnomalyResponse> {
                Ok(AnomalyResponse {
                    id,
                    idpel,
                    anomaly_type,
                    description,
                    status: status.parse()?,
                    reported_by,
                    resolved_by,
                    created_at,
                    resolved_at,
                })
            },
        )
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(anomalies))
}

async fn list_anomaly_master(
    State(pool): State<PgPool>,
) -> AppResult<Json<Vec<AnomalyMasterResponse>>> {
    let rows: Vec<(i64, String, Option<String>, Option<String>, bool, NaiveDateTime)> =
        sqlx::query_as(
            r#"
            SELECT id, code, description, category, active, created_at
            FROM anomaly_master
            ORDER BY code
            "#,
        )
        .fetch_all(&pool)
        .await?;

    let entries = rows
        .into_iter()
        .map(
            |(id, code, description, category, active, created_at)| AnomalyMasterResponse {
                id,
                code,
                description,
                category,
                active,
                created_at,
            },
        )
        .collect();

    Ok(Json(entries))
}
