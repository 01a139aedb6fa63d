//! Service global model

use std::path::PathBuf;

use color_eyre::Result;

pub mod auth;
pub mod bookings;
pub mod spaces;
pub mod users;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

use crate::config;
use crate::model::auth::Session;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Invalid SQLite path: {path}")]
    InvalidSQLitePath { path: PathBuf },
}

/// Model shared by all the request handlers
#[derive(Clone)]
pub struct Model {
    /// Database access
    db: sqlx::SqlitePool,
}

impl Model {
    /// Model for testing purposes - using the in-memory SQLite database
    #[cfg(test)]
    pub async fn test() -> Result<Self> {
        Self::in_memory(1).await
    }

    /// Model from configuration
    ///
    /// If the database is created in-memory, the migrations are being executed automatically. If database is
    /// file based migrations would be executed only if requested by configuration.
    pub async fn with_config(config: config::Database) -> Result<Self> {
        use config::Database::*;

        match config {
            Memory { max_connections } => Self::in_memory(max_connections).await,

            SqLite {
                path,
                max_connections,
                migrate,
            } => {
                let filename = path
                    .as_path()
                    .to_str()
                    .ok_or_else(|| Error::InvalidSQLitePath { path: path.clone() })?;

                let opts = SqliteConnectOptions::new()
                    .filename(filename)
                    .create_if_missing(true)
                    .foreign_keys(true);

                let db = SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .connect_lazy_with(opts);

                if migrate {
                    sqlx::migrate!("model/migrations").run(&db).await?;
                }

                Ok(Self { db })
            }
        }
    }

    /// In-memory database kept alive for the whole lifetime of the pool
    async fn in_memory(max_connections: u32) -> Result<Self> {
        // Every `sqlite::memory:` parse yields a distinct shared-cache database
        let opts: SqliteConnectOptions = "sqlite::memory:".parse()?;
        let opts = opts.foreign_keys(true);

        let db = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("model/migrations").run(&db).await?;
        Ok(Self { db })
    }

    /// Accesses the DB pool
    pub fn db(&self) -> &sqlx::SqlitePool {
        &self.db
    }

    /// Performs cleanup on the model
    pub async fn cleanup(&self) -> Result<u64> {
        Session::cleanup(&self.db).await
    }
}
