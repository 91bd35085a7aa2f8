//! Database module
//!
//! Connectivity and schema checks. The schema itself lives in
//! `migrations/0001_schema.sql`.

use sqlx::PgPool;

/// Tables the API reads or writes
pub const REQUIRED_TABLES: &[&str] = &[
    "areas",
    "users",
    "api_keys",
    "officers",
    "transactions",
    "talangan_transactions",
    "anomalies",
    "anomaly_master",
    "daily_settlements",
    "wa_logs",
    "print_logs",
    "monitoring_logs",
    "report_exports",
];

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(*table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    let admins: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin' AND active")
            .fetch_one(pool)
            .await?;

    if admins == 0 {
        tracing::warn!("No active admin user exists; master data routes are unreachable");
    }

    Ok(true)
}
