//! Persistence of the latest analysis per repository.

use std::collections::HashMap;
use std::sync::RwLock;

use diesel::prelude::*;
use log::debug;
use repoinsight_core::AnalysisResult;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool, init_pool};
use crate::models::{AnalysisRecord, NewAnalysisRecord};
use crate::schema::repository_analyses;

/// Errors raised by an [`AnalysisStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection pool failure.
    #[error("database pool error: {0}")]
    Pool(String),
    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),
    /// Query failure.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    /// Stored payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// In-memory lock was poisoned.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Keeps the most recent analysis per repository; re-analysis overwrites.
pub trait AnalysisStore: Send + Sync {
    /// Insert or replace the analysis for `result.repository`.
    fn upsert(&self, result: &AnalysisResult) -> Result<(), StoreError>;
    /// Latest analysis for `owner/name`, if any.
    fn latest(&self, full_name: &str) -> Result<Option<AnalysisResult>, StoreError>;
}

/// GitHub names are case-insensitive.
fn store_key(full_name: &str) -> String {
    full_name.to_lowercase()
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: DbPool,
}

impl PgAnalysisStore {
    /// Wrap an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and run migrations.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_pool(database_url)?))
    }

    fn conn(&self) -> Result<DbConnection, StoreError> {
        self.pool
            .get()
            .map_err(|err| StoreError::Pool(err.to_string()))
    }
}

impl AnalysisStore for PgAnalysisStore {
    fn upsert(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let record = NewAnalysisRecord {
            full_name: store_key(&result.repository),
            id: Uuid::new_v4().to_string(),
            result_json: serde_json::to_string(result)?,
            analyzed_at: result.analyzed_at.naive_utc(),
        };
        diesel::insert_into(repository_analyses::table)
            .values(&record)
            .on_conflict(repository_analyses::full_name)
            .do_update()
            .set((
                repository_analyses::id.eq(&record.id),
                repository_analyses::result_json.eq(&record.result_json),
                repository_analyses::analyzed_at.eq(record.analyzed_at),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn latest(&self, full_name: &str) -> Result<Option<AnalysisResult>, StoreError> {
        let mut conn = self.conn()?;
        let record = repository_analyses::table
            .find(store_key(full_name))
            .select(AnalysisRecord::as_select())
            .first::<AnalysisRecord>(&mut conn)
            .optional()?;
        let Some(record) = record else {
            return Ok(None);
        };
        debug!(
            "loaded analysis {} for {} from {}",
            record.id, record.full_name, record.analyzed_at
        );
        Ok(Some(serde_json::from_str(&record.result_json)?))
    }
}

/// Process-local store used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryAnalysisStore {
    entries: RwLock<HashMap<String, AnalysisResult>>,
}

impl MemoryAnalysisStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalysisStore for MemoryAnalysisStore {
    fn upsert(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(store_key(&result.repository), result.clone());
        Ok(())
    }

    fn latest(&self, full_name: &str) -> Result<Option<AnalysisResult>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(&store_key(full_name)).cloned())
    }
}
