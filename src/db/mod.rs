pub mod pool;

pub use pool::create_pool;

use sqlx::PgPool;

use crate::error::Result;

/// Create or update the schema
///
/// Migrations live in `./migrations` and are embedded at compile time, so a
/// fresh database is bootstrapped on first start.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations complete");
    Ok(())
}
