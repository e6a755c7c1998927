//! Driver identifiers and client handles.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::debug;

use super::error::{SessionError, SessionResult};
use crate::backend::Dialect;

/// Default pool size for [`Client::connect`].
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a pooled connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Declared driver identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    Postgres,
    MySql,
    Sqlite,
    /// The ORM layer, whatever database it is connected to.
    SeaOrm,
}

impl Driver {
    /// Canonical identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::MySql => "mysql",
            Driver::Sqlite => "sqlite",
            Driver::SeaOrm => "sea-orm",
        }
    }

    pub fn is_orm(&self) -> bool {
        matches!(self, Driver::SeaOrm)
    }

    /// SQL dialect for raw-SQL drivers, `None` for the ORM.
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            Driver::Postgres => Some(Dialect::Postgres),
            Driver::MySql => Some(Dialect::MySql),
            Driver::Sqlite => Some(Dialect::Sqlite),
            Driver::SeaOrm => None,
        }
    }

    /// Client kind this driver requires.
    pub fn client_kind(&self) -> &'static str {
        if self.is_orm() {
            "orm"
        } else {
            "sql"
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Driver {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "mysql" => Ok(Driver::MySql),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "sea-orm" | "seaorm" | "orm" => Ok(Driver::SeaOrm),
            _ => Err(SessionError::UnsupportedDriver(s.to_string())),
        }
    }
}

/// An underlying persistence client.
#[derive(Debug, Clone)]
pub enum Client {
    /// Raw SQL connection pool.
    Sql(AnyPool),
    /// ORM connection.
    Orm(DatabaseConnection),
}

impl Client {
    /// Open a client for `driver` at `url` with the default pool settings.
    pub async fn connect(driver: Driver, url: &str) -> SessionResult<Self> {
        debug!(%driver, "connecting");
        if driver.is_orm() {
            let mut options = ConnectOptions::new(url.to_string());
            options
                .max_connections(DEFAULT_MAX_CONNECTIONS)
                .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
                .sqlx_logging(false);
            Ok(Client::Orm(Database::connect(options).await?))
        } else {
            sqlx::any::install_default_drivers();
            let pool = AnyPoolOptions::new()
                .max_connections(DEFAULT_MAX_CONNECTIONS)
                .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
                .connect(url)
                .await?;
            Ok(Client::Sql(pool))
        }
    }

    /// `"sql"` or `"orm"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Client::Sql(_) => "sql",
            Client::Orm(_) => "orm",
        }
    }

    /// Close the client and every pooled connection.
    pub async fn close(&self) -> SessionResult<()> {
        match self {
            Client::Sql(pool) => pool.close().await,
            Client::Orm(db) => db.clone().close().await?,
        }
        Ok(())
    }
}

impl From<AnyPool> for Client {
    fn from(pool: AnyPool) -> Self {
        Client::Sql(pool)
    }
}

impl From<DatabaseConnection> for Client {
    fn from(db: DatabaseConnection) -> Self {
        Client::Orm(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_identifiers() {
        assert_eq!("postgres".parse::<Driver>().unwrap(), Driver::Postgres);
        assert_eq!("postgresql".parse::<Driver>().unwrap(), Driver::Postgres);
        assert_eq!("MySQL".parse::<Driver>().unwrap(), Driver::MySql);
        assert_eq!("sqlite3".parse::<Driver>().unwrap(), Driver::Sqlite);
        assert_eq!("seaorm".parse::<Driver>().unwrap(), Driver::SeaOrm);
        assert_eq!("orm".parse::<Driver>().unwrap(), Driver::SeaOrm);

        let err = "mongodb".parse::<Driver>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported driver: mongodb");
    }

    #[test]
    fn test_driver_properties() {
        assert!(Driver::SeaOrm.is_orm());
        assert_eq!(Driver::SeaOrm.dialect(), None);
        assert_eq!(Driver::SeaOrm.client_kind(), "orm");
        assert_eq!(Driver::MySql.dialect(), Some(Dialect::MySql));
        assert_eq!(Driver::Sqlite.client_kind(), "sql");
        assert_eq!(Driver::Postgres.to_string(), "postgres");
    }

    #[tokio::test]
    async fn test_connect_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("db.sqlite").display());

        let sql = Client::connect(Driver::Sqlite, &url).await.unwrap();
        assert_eq!(sql.kind(), "sql");
        sql.close().await.unwrap();

        let orm = Client::connect(Driver::SeaOrm, &url).await.unwrap();
        assert_eq!(orm.kind(), "orm");
        orm.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_bad_url() {
        let err = Client::connect(Driver::Sqlite, "nosuchscheme://x")
            .await
            .unwrap_err();
        assert!(err.is_driver_error());
    }
}
