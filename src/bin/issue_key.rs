//! API key issuing tool
//!
//! Run with: cargo run --bin issue_key -- --username coordinator_01
//!
//! Prints the new key once; only its hash is stored.

use sqlx::postgres::PgPoolOptions;

use collections_backoffice::api::keys::{generate_api_key, hash_api_key};
use collections_backoffice::Role;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let username = args
        .iter()
        .position(|a| a == "--username")
        .and_then(|i| args.get(i + 1))
        .ok_or_else(|| anyhow::anyhow!("usage: issue_key --username <username>"))?;

    let database_url = std::env::var("DATABASE_URL")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    let user: Option<(i64, String, bool)> =
        sqlx::query_as("SELECT id, role, active FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&pool)
            .await?;

    let (user_id, role, active) =
        user.ok_or_else(|| anyhow::anyhow!("user '{}' does not exist", username))?;
    let role: Role = role.parse()?;

    if !active {
        anyhow::bail!("user '{}' is inactive", username);
    }

    let api_key = generate_api_key();

    sqlx::query("INSERT INTO api_keys (user_id, key_hash) VALUES ($1, $2)")
        .bind(user_id)
        .bind(hash_api_key(&api_key))
        .execute(&pool)
        .await?;

    println!("Issued {} key for {} (user id {})", role, username, user_id);
    println!("{}", api_key);
    println!("Store it now; it cannot be shown again.");

    pool.close().await;

    Ok(())
}
