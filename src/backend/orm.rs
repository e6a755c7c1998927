//! ORM backend using SeaORM.
//!
//! SeaORM renders transaction options for each database itself, so this
//! backend only translates types.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, ExecResult,
    Statement, TransactionTrait, Value,
};

use crate::backend::Backend;
use crate::query::{ExecOutcome, Param, ParamType, Row};
use crate::session::SessionResult;
use crate::transaction::{IsolationLevel, TransactionOptions};

/// Backend over a SeaORM `DatabaseConnection`.
#[derive(Debug, Clone)]
pub struct OrmBackend {
    db: DatabaseConnection,
}

impl OrmBackend {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get the underlying connection for direct use.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn statement(&self, query: &str, params: &[Param]) -> Statement {
        Statement::from_sql_and_values(
            self.db.get_database_backend(),
            query,
            params.iter().map(to_value),
        )
    }

    fn outcome(&self, result: &ExecResult) -> ExecOutcome {
        let last_insert_id = match self.db.get_database_backend() {
            DbBackend::Postgres => None,
            _ => i64::try_from(result.last_insert_id()).ok(),
        };
        ExecOutcome::new(result.rows_affected(), last_insert_id)
    }
}

fn to_value(param: &Param) -> Value {
    match param {
        Param::Null | Param::TypedNull(ParamType::Text) => Value::String(None),
        Param::TypedNull(ParamType::Bool) => Value::Bool(None),
        Param::TypedNull(ParamType::Int) => Value::BigInt(None),
        Param::TypedNull(ParamType::Float) => Value::Double(None),
        Param::TypedNull(ParamType::Bytes) => Value::Bytes(None),
        Param::Bool(v) => Value::from(*v),
        Param::Int(v) => Value::from(*v),
        Param::Float(v) => Value::from(*v),
        Param::Text(v) => Value::from(v.clone()),
        Param::Bytes(v) => Value::from(v.clone()),
    }
}

fn to_orm_isolation(level: IsolationLevel) -> sea_orm::IsolationLevel {
    match level {
        IsolationLevel::ReadUncommitted => sea_orm::IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted => sea_orm::IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead => sea_orm::IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable => sea_orm::IsolationLevel::Serializable,
    }
}

#[async_trait]
impl Backend for OrmBackend {
    type Conn = DatabaseTransaction;

    fn name(&self) -> &'static str {
        "sea-orm"
    }

    async fn begin(&self, options: &TransactionOptions) -> SessionResult<DatabaseTransaction> {
        let isolation = options.isolation.map(to_orm_isolation);
        let access_mode = options.read_only.then_some(AccessMode::ReadOnly);
        Ok(self.db.begin_with_config(isolation, access_mode).await?)
    }

    async fn commit(&self, conn: DatabaseTransaction) -> SessionResult<()> {
        Ok(conn.commit().await?)
    }

    async fn rollback(&self, conn: DatabaseTransaction) -> SessionResult<()> {
        Ok(conn.rollback().await?)
    }

    async fn execute(
        &self,
        conn: Option<&mut DatabaseTransaction>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<ExecOutcome> {
        let statement = self.statement(query, params);
        let result = match conn {
            Some(txn) => txn.execute(statement).await?,
            None => self.db.execute(statement).await?,
        };
        Ok(self.outcome(&result))
    }

    async fn fetch_optional(
        &self,
        conn: Option<&mut DatabaseTransaction>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Option<Row>> {
        let statement = self.statement(query, params);
        let row = match conn {
            Some(txn) => txn.query_one(statement).await?,
            None => self.db.query_one(statement).await?,
        };
        Ok(row.map(Row::from))
    }

    async fn fetch_all(
        &self,
        conn: Option<&mut DatabaseTransaction>,
        query: &str,
        params: &[Param],
    ) -> SessionResult<Vec<Row>> {
        let statement = self.statement(query, params);
        let rows = match conn {
            Some(txn) => txn.query_all(statement).await?,
            None => self.db.query_all(statement).await?,
        };
        Ok(rows.into_iter().map(Row::from).collect())
    }
}
