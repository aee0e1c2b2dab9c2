//! # Comanda Register Library
//!
//! Command layer of the register: every workflow step as an async function
//! over a [`Database`](comanda_db::Database) and an explicitly passed
//! active shift.
//!
//! ## Module Organization
//! ```text
//! comanda_register/
//! ├── lib.rs          ◄─── You are here (logging, startup helpers)
//! ├── config.rs       ◄─── RegisterConfig from COMANDA_* variables
//! ├── error.rs        ◄─── ApiError for commands
//! └── commands/
//!     ├── shift.rs    ◄─── open, folio numbers, two-step close
//!     ├── order.rs    ◄─── submit, void, pending feed, tickets
//!     ├── payment.rs  ◄─── settle, amend tender
//!     ├── report.rs   ◄─── report by date
//!     └── menu.rs     ◄─── catalog
//! ```

pub mod commands;
pub mod config;
pub mod error;

use comanda_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, RegisterConfig};
pub use error::{ApiError, ApiResult, ErrorCode};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=comanda_db=trace` - Trace the storage layer only
/// - Default: `info,comanda=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,comanda=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Opens the configured database and applies migrations.
pub async fn open_database(config: &RegisterConfig) -> anyhow::Result<Database> {
    let path = config.database_path()?;
    info!(path = %path.display(), "Opening register database");

    let db = Database::new(DbConfig::new(path)).await?;
    Ok(db)
}
