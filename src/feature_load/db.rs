use postgres::{Client, NoTls};
use thiserror::Error;

use crate::feature_load::config::DbConfig;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Postgres(#[from] postgres::Error),
    /// Session failures raised by non-libpq implementations (test fakes).
    #[error("{0}")]
    Session(String),
}

/// The few statement shapes the pipeline needs from a database session.
/// `postgres::Client` implements it for real runs; tests substitute a
/// recording fake.
pub trait SqlSession {
    /// Run one or more statements with no parameters (DDL, transaction and
    /// savepoint bookkeeping).
    fn batch_execute(&mut self, sql: &str) -> Result<(), DbError>;

    /// Run the parameterized feature insert: `$1` is the name, `$2` the
    /// geometry as GeoJSON text.
    fn insert_row(&mut self, sql: &str, name: &str, geometry: &str) -> Result<u64, DbError>;

    /// Run a query returning a single bigint, as `SELECT COUNT(*)` does.
    fn count(&mut self, sql: &str) -> Result<i64, DbError>;
}

impl SqlSession for Client {
    fn batch_execute(&mut self, sql: &str) -> Result<(), DbError> {
        Ok(Client::batch_execute(self, sql)?)
    }

    fn insert_row(&mut self, sql: &str, name: &str, geometry: &str) -> Result<u64, DbError> {
        Ok(self.execute(sql, &[&name, &geometry])?)
    }

    fn count(&mut self, sql: &str) -> Result<i64, DbError> {
        let row = self.query_one(sql, &[])?;
        Ok(row.get(0))
    }
}

impl<T: SqlSession> SqlSession for &mut T {
    fn batch_execute(&mut self, sql: &str) -> Result<(), DbError> {
        (**self).batch_execute(sql)
    }

    fn insert_row(&mut self, sql: &str, name: &str, geometry: &str) -> Result<u64, DbError> {
        (**self).insert_row(sql, name, geometry)
    }

    fn count(&mut self, sql: &str) -> Result<i64, DbError> {
        (**self).count(sql)
    }
}

/// Open a session from the five environment-derived parameters. The client
/// is dropped, and with it the connection, on every exit path of a run.
pub fn connect(config: &DbConfig) -> Result<Client, DbError> {
    let client = postgres::Config::new()
        .host(&config.host)
        .port(config.port)
        .dbname(&config.dbname)
        .user(&config.user)
        .password(&config.password)
        .connect(NoTls)?;
    Ok(client)
}
