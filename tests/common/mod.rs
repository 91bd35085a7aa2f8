//! Common test utilities
//!
//! Database tests need a Postgres `DATABASE_URL` and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/collections_test cargo test -- --ignored
//! ```

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

use collections_backoffice::api::{self, keys::hash_api_key, AppState};
use collections_backoffice::{ExportCapabilities, Exporter};

pub const ADMIN_KEY: &str = "cbo_test_admin";
pub const COORDINATOR_KEY: &str = "cbo_test_coordinator";
pub const OFFICER_KEY: &str = "cbo_test_officer";
pub const INACTIVE_USER_KEY: &str = "cbo_test_inactive";

/// Test binaries share one database; tests truncate it, so they take turns.
static DB_LOCK: Mutex<()> = Mutex::new(());

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Create the schema, truncate every table and seed the fixture below.
///
/// | officer | user       | area | rbm   | transactions (periode, total, status)              |
/// |---------|------------|------|-------|-----------------------------------------------------|
/// | 1       | petugas_01 | A01  | RBM01 | 2024-01-10 100.25 completed, 2024-02-15 250.25 pending |
/// | 2       | petugas_02 | A02  | -     | 2024-03-01 75.00 pending                            |
/// | 3       | petugas_03 | A02  | RBM02 | none                                                |
///
/// Transactions get ids 1..3 in the order listed. Two WhatsApp notices,
/// two receipt prints (transactions 1 and 3) and two monitoring events are
/// seeded as well.
pub async fn setup_test_db() -> TestDb {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    pool.execute(include_str!("../../migrations/0001_schema.sql"))
        .await
        .expect("Failed to apply schema");

    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    (&mut *tx).execute(
        r#"
        TRUNCATE TABLE report_exports, monitoring_logs, print_logs, wa_logs,
                       daily_settlements, anomalies, anomaly_master, talangan_transactions,
                       transactions, officers, api_keys, users, areas
        RESTART IDENTITY CASCADE
        "#,
    )
    .await
    .expect("Failed to clean up DB");

    (&mut *tx).execute(
        r#"
        INSERT INTO areas (code, name) VALUES ('A01', 'Area Utara'), ('A02', 'Area Selatan');

        INSERT INTO users (id, username, role, area_code, active) VALUES
            (1, 'admin', 'admin', NULL, TRUE),
            (2, 'koordinator_01', 'coordinator', 'A01', TRUE),
            (3, 'petugas_01', 'field_officer', 'A01', TRUE),
            (4, 'petugas_02', 'field_officer', 'A02', TRUE),
            (5, 'petugas_03', 'field_officer', 'A02', TRUE),
            (6, 'koordinator_lama', 'coordinator', 'A02', FALSE);

        INSERT INTO officers (id, user_id, rbm_code, coordinator_id, imei) VALUES
            (1, 3, 'RBM01', 2, '356938035643809'),
            (2, 4, NULL, 2, NULL),
            (3, 5, 'RBM02', NULL, NULL);

        INSERT INTO transactions (idpel, periode, total, payment_type, officer_id, status, created_at) VALUES
            ('532100000001', '2024-01-10', 100.25, 'cash', 1, 'completed', '2024-01-10 09:00:00'),
            ('532100000002', '2024-02-15', 250.25, 'transfer', 1, 'pending', '2024-02-15 10:30:00'),
            ('532100000003', '2024-03-01', 75.00, 'installment', 2, 'pending', '2024-03-01 08:15:00');

        INSERT INTO talangan_transactions (idpel, amount, date, status, officer_id) VALUES
            ('532100000002', 250.25, '2024-02-16', 'approved', 1);

        INSERT INTO anomaly_master (code, description, category) VALUES
            ('METER_RUSAK', 'Meter rusak', 'meter');

        INSERT INTO anomalies (idpel, anomaly_type, description, status, reported_by) VALUES
            ('532100000003', 'METER_RUSAK', 'Segel putus', 'reported', 4);

        INSERT INTO daily_settlements (date, total_amount, officer_id, status) VALUES
            ('2024-01-10', 100.25, 1, 'verified'),
            ('2024-03-01', 75.00, 2, 'pending');

        INSERT INTO wa_logs (idpel, message, status, sent_at, delivered_at, created_at) VALUES
            ('532100000001', 'Terima kasih', 'delivered', '2024-01-10 09:05:00', '2024-01-10 09:06:00', '2024-01-10 09:05:00'),
            ('532100000002', 'Tagihan jatuh tempo', 'failed', '2024-02-20 08:00:00', NULL, '2024-02-20 08:00:00');

        INSERT INTO print_logs (transaction_id, printed_by, file_path, printed_at) VALUES
            (1, 3, 'receipts/1.txt', '2024-01-10 09:01:00'),
            (3, 4, NULL, '2024-03-01 08:20:00');

        INSERT INTO monitoring_logs (module_name, event_type, details, user_id, created_at) VALUES
            ('auth', 'login', 'petugas_01 signed in', 3, '2024-03-01 07:00:00'),
            ('sync', 'error', 'upload timed out', NULL, '2024-03-02 07:00:00');
        "#,
    )
    .await
    .expect("Failed to seed fixture");

    for (user_id, key) in [
        (1_i64, ADMIN_KEY),
        (2, COORDINATOR_KEY),
        (3, OFFICER_KEY),
        (6, INACTIVE_USER_KEY),
    ] {
        sqlx::query("INSERT INTO api_keys (user_id, key_hash) VALUES ($1, $2)")
            .bind(user_id)
            .bind(hash_api_key(key))
            .execute(&mut *tx)
            .await
            .expect("Failed to seed API key");
    }

    tx.commit().await.expect("Failed to commit fixture");

    TestDb {
        pool,
        _guard: guard,
    }
}

/// The full application router over `pool`
pub fn app(pool: PgPool, capabilities: ExportCapabilities) -> Router {
    api::build_router(AppState::new(pool, Exporter::new(capabilities)))
}
