use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, FromRow};
use std::sync::Arc;
use tracing::{error, info};

#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
#[cfg(feature = "sqlite")]
use std::str::FromStr;

#[cfg(feature = "postgres")]
use sqlx::postgres::{PgPool, PgPoolOptions};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::config::DatabaseConfig;
use crate::errors::{RegistryError, RegistryResult};

/// A single `(licenseKey, hwid)` binding as stored in the `bindings` table.
///
/// `id` is assigned by the database; nothing else is unique.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BindingRecord {
    pub id: i64,
    pub license_key: String,
    pub hwid: String,
}

/// A binding that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBinding {
    pub license_key: String,
    pub hwid: String,
}

impl NewBinding {
    pub fn new(license_key: impl Into<String>, hwid: impl Into<String>) -> Self {
        Self {
            license_key: license_key.into(),
            hwid: hwid.into(),
        }
    }
}

/// Unified database abstraction over SQLite and Postgres.
///
/// Available variants depend on enabled features:
/// - `sqlite` feature enables `Database::SQLite`
/// - `postgres` feature enables `Database::Postgres`
#[derive(Debug, Clone)]
pub enum Database {
    #[cfg(feature = "sqlite")]
    SQLite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

fn storage_error(op: &str, backend: &str, e: sqlx::Error) -> RegistryError {
    error!("{backend} {op} failed: {e}");
    RegistryError::Storage(format!("database error: {e}"))
}

/// Pool options for a SQLite URL.
///
/// An in-memory database lives only as long as its connection, so it gets a
/// single connection that is opened eagerly and never reaped.
#[cfg(feature = "sqlite")]
pub fn sqlite_pool_options(url: &str, max_connections: u32) -> SqlitePoolOptions {
    if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    }
}

impl Database {
    /// Connect to the database named by `config.url`.
    ///
    /// The URL scheme selects the backend. SQLite files are created when
    /// missing; in-memory SQLite is limited to a single connection so every
    /// query sees the same database.
    pub async fn connect(config: &DatabaseConfig) -> RegistryResult<Arc<Self>> {
        let url = config.url.as_str();

        if url.starts_with("sqlite:") {
            Self::connect_sqlite(url, config.max_connections).await
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Self::connect_postgres(url, config.max_connections).await
        } else {
            Err(RegistryError::Config(format!(
                "unsupported database url scheme: {url}"
            )))
        }
    }

    #[cfg(feature = "sqlite")]
    async fn connect_sqlite(url: &str, max_connections: u32) -> RegistryResult<Arc<Self>> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| RegistryError::Config(format!("invalid SQLite url: {e}")))?
            .create_if_missing(true);

        let pool = sqlite_pool_options(url, max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to connect to SQLite: {e}");
                RegistryError::Storage(format!("failed to connect to SQLite: {e}"))
            })?;

        info!("Connected to SQLite");
        Ok(Arc::new(Database::SQLite(pool)))
    }

    #[cfg(not(feature = "sqlite"))]
    async fn connect_sqlite(_url: &str, _max_connections: u32) -> RegistryResult<Arc<Self>> {
        Err(RegistryError::Config(
            "SQLite support not compiled in. Enable the 'sqlite' feature.".to_string(),
        ))
    }

    #[cfg(feature = "postgres")]
    async fn connect_postgres(url: &str, max_connections: u32) -> RegistryResult<Arc<Self>> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {e}");
                RegistryError::Storage(format!("failed to connect to PostgreSQL: {e}"))
            })?;

        info!("Connected to PostgreSQL");
        Ok(Arc::new(Database::Postgres(pool)))
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect_postgres(_url: &str, _max_connections: u32) -> RegistryResult<Arc<Self>> {
        Err(RegistryError::Config(
            "PostgreSQL support not compiled in. Enable the 'postgres' feature.".to_string(),
        ))
    }

    /// Short backend name for logs.
    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Database::Postgres(_) => "postgres",
        }
    }

    /// Create the `bindings` table and its license key index if they do not exist.
    pub async fn ensure_schema(&self) -> RegistryResult<()> {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                query(
                    r#"
                    CREATE TABLE IF NOT EXISTS bindings (
                        id          INTEGER PRIMARY KEY AUTOINCREMENT,
                        license_key TEXT NOT NULL,
                        hwid        TEXT NOT NULL
                    )
                    "#,
                )
                .execute(pool)
                .await
                .map_err(|e| storage_error("ensure_schema", "SQLite", e))?;

                query("CREATE INDEX IF NOT EXISTS idx_bindings_license_key ON bindings (license_key)")
                    .execute(pool)
                    .await
                    .map_err(|e| storage_error("ensure_schema", "SQLite", e))?;
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                query(
                    r#"
                    CREATE TABLE IF NOT EXISTS bindings (
                        id          BIGSERIAL PRIMARY KEY,
                        license_key TEXT NOT NULL,
                        hwid        TEXT NOT NULL
                    )
                    "#,
                )
                .execute(pool)
                .await
                .map_err(|e| storage_error("ensure_schema", "Postgres", e))?;

                query("CREATE INDEX IF NOT EXISTS idx_bindings_license_key ON bindings (license_key)")
                    .execute(pool)
                    .await
                    .map_err(|e| storage_error("ensure_schema", "Postgres", e))?;
            }
        }

        Ok(())
    }

    /// Insert a new binding.
    ///
    /// Always appends: existing bindings for the same license key are left
    /// untouched, so a key can accumulate conflicting HWIDs over time.
    pub async fn insert_binding(&self, binding: &NewBinding) -> RegistryResult<()> {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                query("INSERT INTO bindings (license_key, hwid) VALUES (?, ?)")
                    .bind(&binding.license_key)
                    .bind(&binding.hwid)
                    .execute(pool)
                    .await
                    .map_err(|e| storage_error("insert_binding", "SQLite", e))?;
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                query("INSERT INTO bindings (license_key, hwid) VALUES ($1, $2)")
                    .bind(&binding.license_key)
                    .bind(&binding.hwid)
                    .execute(pool)
                    .await
                    .map_err(|e| storage_error("insert_binding", "Postgres", e))?;
            }
        }

        Ok(())
    }

    /// Fetch every binding in insertion order.
    pub async fn list_bindings(&self) -> RegistryResult<Vec<BindingRecord>> {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_as::<_, BindingRecord>(
                "SELECT id, license_key, hwid FROM bindings ORDER BY id",
            )
            .fetch_all(pool)
            .await
            .map_err(|e| storage_error("list_bindings", "SQLite", e)),
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_as::<_, BindingRecord>(
                "SELECT id, license_key, hwid FROM bindings ORDER BY id",
            )
            .fetch_all(pool)
            .await
            .map_err(|e| storage_error("list_bindings", "Postgres", e)),
        }
    }

    /// Fetch every binding for `license_key` in insertion order.
    ///
    /// Returns an empty vector when the key has never been stored.
    pub async fn find_bindings_by_key(
        &self,
        license_key: &str,
    ) -> RegistryResult<Vec<BindingRecord>> {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_as::<_, BindingRecord>(
                "SELECT id, license_key, hwid FROM bindings WHERE license_key = ? ORDER BY id",
            )
            .bind(license_key)
            .fetch_all(pool)
            .await
            .map_err(|e| storage_error("find_bindings_by_key", "SQLite", e)),
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_as::<_, BindingRecord>(
                "SELECT id, license_key, hwid FROM bindings WHERE license_key = $1 ORDER BY id",
            )
            .bind(license_key)
            .fetch_all(pool)
            .await
            .map_err(|e| storage_error("find_bindings_by_key", "Postgres", e)),
        }
    }
}
