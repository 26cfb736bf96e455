//! Shared SQLite database handle.
//!
//! Marketplace entities reference each other (favorites join posts,
//! reports join posts and users), so all repositories share one pool
//! instead of opening their own connections.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::Result;

/// Handle to the backing SQLite database.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn open(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        Ok(Self { pool })
    }

    /// Create an in-memory database for testing.
    ///
    /// A single connection is used so every repository sees the same
    /// memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    /// The underlying connection pool.
    #[must_use]
    pub(crate) const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
