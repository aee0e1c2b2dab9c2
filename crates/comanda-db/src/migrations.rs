//! # Schema
//!
//! `migrations/sqlite` is embedded at compile time and applied on every
//! [`Database::new`](crate::Database::new).
//!
//! ```text
//! orders      one document per table/delivery order
//!             line_items, payment_breakdown: JSON TEXT
//!             created_at / settled_at / voided_at: RFC 3339 TEXT (UTC)
//! shifts      one document per till session, closing_totals: JSON TEXT
//! menu_items  read-only catalog, loaded by the `seed` binary
//! ```
//!
//! Folio numbers are not unique and nothing limits the number of OPEN
//! shifts; both are conventions of the queries in `repository/`.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies any migration not yet recorded in `_sqlx_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(count = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}
