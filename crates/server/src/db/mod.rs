//! Database collaborator: schema description and raw SQL execution

mod format;
mod postgres;

pub use format::{ColumnInfo, ResultFormat, SampleRows, TableInfo, TextRow, render_table};
pub use postgres::PgDatabase;

use async_trait::async_trait;
use claimbeaver_core::InquiryError;
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;

/// The operations the inquiry pipeline needs from a relational database
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    /// Textual description of every table the model may query
    async fn table_info(&self) -> Result<String, InquiryError>;

    /// Execute SQL verbatim and render the rows as text
    async fn run(&self, sql: &str) -> Result<String, InquiryError>;

    /// Cheap connectivity check
    async fn ping(&self) -> Result<(), InquiryError>;
}

/// Create a connection pool from a database URL
pub fn create_pool(database_url: &str) -> Result<Pool, deadpool_postgres::CreatePoolError> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
}
