//! PostgreSQL record store
//!
//! `name` is the primary key and `block` carries a UNIQUE constraint, so a
//! plain INSERT is the conditional write: a concurrent writer that loses the
//! race gets a unique violation instead of a lost update.

use super::{PutOutcome, RecordStore};
use crate::config::{validate_table_name, PostgresConfig};
use crate::models::AllocationRecord;
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    name: String,
    block: String,
}

impl From<RecordRow> for AllocationRecord {
    fn from(row: RecordRow) -> Self {
        AllocationRecord {
            name: row.name,
            block: row.block,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    table: String,
}

impl PgRecordStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }

    /// Open a connection pool from configuration
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to connect to database: {}", e)))?;

        Self::new(pool, config.table.clone())
    }

    pub fn inner(&self) -> &PgPool {
        &self.pool
    }

    /// Create the records table if it does not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                name  TEXT PRIMARY KEY,
                block TEXT NOT NULL,
                CONSTRAINT {table}_block_key UNIQUE (block)
            )
            "#,
            table = self.table
        );

        sqlx::query(&ddl).execute(&self.pool).await?;

        tracing::info!(table = %self.table, "Record table ready");
        Ok(())
    }
}

/// Map the constraint named by a unique violation to the taken field
///
/// `table` is a validated lowercase identifier short enough that neither
/// derived name is truncated, so both compare exactly.
fn outcome_for_constraint(table: &str, constraint: Option<&str>) -> PutOutcome {
    let block_key = format!("{}_block_key", table);
    let primary_key = format!("{}_pkey", table);

    match constraint {
        Some(name) if name == block_key => PutOutcome::BlockTaken,
        Some(name) if name == primary_key => PutOutcome::NameTaken,
        other => {
            tracing::warn!(constraint = ?other, table = %table, "Unexpected unique violation");
            PutOutcome::NameTaken
        }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_all(&self) -> Result<Vec<AllocationRecord>> {
        let query = format!("SELECT name, block FROM {}", self.table);

        let rows = sqlx::query_as::<_, RecordRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to scan records: {}", e)))?;

        Ok(rows.into_iter().map(AllocationRecord::from).collect())
    }

    async fn put_if_absent(&self, record: &AllocationRecord) -> Result<PutOutcome> {
        let query = format!("INSERT INTO {} (name, block) VALUES ($1, $2)", self.table);

        let result = sqlx::query(&query)
            .bind(&record.name)
            .bind(&record.block)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(PutOutcome::Created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(outcome_for_constraint(&self.table, db_err.constraint()))
            }
            Err(e) => Err(Error::StoreUnavailable(format!(
                "failed to put record: {}",
                e
            ))),
        }
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        let query = format!("DELETE FROM {} WHERE name = $1", self.table);

        let result = sqlx::query(&query)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to delete record: {}", e)))?;

        tracing::debug!(name = %name, rows = result.rows_affected(), "Deleted record");
        Ok(())
    }
}
