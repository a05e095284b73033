//! # billtext-db
//!
//! PostgreSQL database layer for billtext.
//!
//! This crate provides:
//! - Connection pool management with a per-connection session time zone
//! - The attachment repository (watermark, streaming selection, batch update)
//! - Identifier validation for the configurable table name
//!
//! ## Example
//!
//! ```rust,ignore
//! use billtext_db::{Database, PoolConfig, TableName};
//!
//! let table = TableName::parse("councilmatic_core_billdocument")?;
//! let db = Database::connect("postgres://localhost/councilmatic", PoolConfig::default(), table).await?;
//! let watermark = db.attachments.text_watermark().await?;
//! ```
pub mod attachments;
pub mod identifier;
pub mod pool;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use them
pub mod test_fixtures;

// Re-export core types
pub use billtext_core::*;

pub use attachments::PgAttachmentRepository;
pub use identifier::{validate_identifier, TableName};
pub use pool::{create_pool_with_config, log_pool_metrics, PoolConfig};

/// Database context holding the pool and the attachment repository.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Bill attachment repository.
    pub attachments: PgAttachmentRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>, table: TableName) -> Self {
        Self {
            attachments: PgAttachmentRepository::new(pool.clone(), table),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str, config: PoolConfig, table: TableName) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool, table))
    }
}
