use async_trait::async_trait;
use claimbeaver_core::InquiryError;
use deadpool_postgres::Pool;
use tokio_postgres::SimpleQueryMessage;

use super::format::{ColumnInfo, ResultFormat, SampleRows, TableInfo, TextRow, render_table};
use super::SqlDatabase;

const COLUMNS_SQL: &str = "
    SELECT c.relname::text, a.attname::text, format_type(a.atttypid, a.atttypmod), a.attnotnull
    FROM pg_catalog.pg_attribute a
    JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1
      AND c.relkind IN ('r', 'v', 'm', 'p')
      AND a.attnum > 0
      AND NOT a.attisdropped
    ORDER BY c.relname, a.attnum";

const PRIMARY_KEYS_SQL: &str = "
    SELECT c.relname::text, a.attname::text
    FROM pg_catalog.pg_index i
    JOIN pg_catalog.pg_class c ON c.oid = i.indrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey)
    WHERE n.nspname = $1 AND i.indisprimary
    ORDER BY c.relname, a.attnum";

/// PostgreSQL implementation of [`SqlDatabase`] backed by a connection pool
#[derive(Clone)]
pub struct PgDatabase {
    pool: Pool,
    schema: String,
    sample_rows: usize,
    format: ResultFormat,
}

impl PgDatabase {
    pub fn new(pool: Pool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
            sample_rows: 3,
            format: ResultFormat::default(),
        }
    }

    /// Number of sample rows appended to each table description (0 disables)
    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    pub fn with_result_format(mut self, format: ResultFormat) -> Self {
        self.format = format;
        self
    }

    /// Load column and primary key metadata for every table in the schema
    async fn load_tables(&self) -> Result<Vec<TableInfo>, InquiryError> {
        let client = self.pool.get().await.map_err(db_error)?;

        let column_rows = client
            .query(COLUMNS_SQL, &[&self.schema])
            .await
            .map_err(db_error)?;
        let key_rows = client
            .query(PRIMARY_KEYS_SQL, &[&self.schema])
            .await
            .map_err(db_error)?;

        let mut tables: Vec<TableInfo> = Vec::new();
        for row in column_rows {
            let table: String = row.get(0);
            let column = ColumnInfo {
                name: row.get(1),
                data_type: row.get(2),
                not_null: row.get(3),
            };
            match tables.last_mut() {
                Some(last) if last.name == table => last.columns.push(column),
                _ => tables.push(TableInfo {
                    name: table,
                    columns: vec![column],
                    primary_key: Vec::new(),
                }),
            }
        }

        for row in key_rows {
            let table: String = row.get(0);
            if let Some(info) = tables.iter_mut().find(|t| t.name == table) {
                info.primary_key.push(row.get(1));
            }
        }

        Ok(tables)
    }

    async fn sample(&self, table: &str) -> Result<SampleRows, InquiryError> {
        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {}",
            quote_ident(&self.schema),
            quote_ident(table),
            self.sample_rows
        );
        Ok(SampleRows {
            rows: self.simple_rows(&sql).await?,
        })
    }

    /// Run SQL over the simple query protocol, collecting every row as text
    async fn simple_rows(&self, sql: &str) -> Result<Vec<TextRow>, InquiryError> {
        let client = self.pool.get().await.map_err(db_error)?;
        let messages = client.simple_query(sql).await.map_err(db_error)?;

        let rows: Vec<TextRow> = messages
            .iter()
            .filter_map(|msg| match msg {
                SimpleQueryMessage::Row(row) => Some(
                    (0..row.len())
                        .map(|i| row.get(i).map(String::from))
                        .collect(),
                ),
                _ => None,
            })
            .collect();

        Ok(rows)
    }
}

#[async_trait]
impl SqlDatabase for PgDatabase {
    async fn table_info(&self) -> Result<String, InquiryError> {
        let tables = self.load_tables().await?;

        let mut blocks = Vec::with_capacity(tables.len());
        for table in &tables {
            let sample = if self.sample_rows > 0 {
                match self.sample(&table.name).await {
                    Ok(sample) => Some(sample),
                    Err(e) => {
                        tracing::warn!(table = %table.name, error = %e, "Could not sample table rows");
                        None
                    }
                }
            } else {
                None
            };
            blocks.push(render_table(table, sample.as_ref()));
        }

        Ok(blocks.join("\n\n"))
    }

    async fn run(&self, sql: &str) -> Result<String, InquiryError> {
        let rows = self.simple_rows(sql).await?;
        Ok(self.format.render_rows(&rows))
    }

    async fn ping(&self) -> Result<(), InquiryError> {
        let client = self.pool.get().await.map_err(db_error)?;
        client.query_one("SELECT 1", &[]).await.map_err(db_error)?;
        Ok(())
    }
}

fn db_error(err: impl std::fmt::Display) -> InquiryError {
    InquiryError::Database(err.to_string())
}

/// Quote an identifier for interpolation into SQL text
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
