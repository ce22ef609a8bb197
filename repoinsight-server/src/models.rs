//! Database models for the RepoInsight server.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::repository_analyses;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = repository_analyses)]
#[diesel(primary_key(full_name))]
/// Latest stored analysis of a repository.
pub struct AnalysisRecord {
    /// Lowercased `owner/name`.
    pub full_name: String,
    /// Identifier of the analysis run.
    pub id: String,
    /// Serialized `AnalysisResult`.
    pub result_json: String,
    /// When the analysis ran.
    pub analyzed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = repository_analyses)]
/// Insertable analysis record.
pub struct NewAnalysisRecord {
    /// Lowercased `owner/name`.
    pub full_name: String,
    /// Identifier of the analysis run.
    pub id: String,
    /// Serialized `AnalysisResult`.
    pub result_json: String,
    /// When the analysis ran.
    pub analyzed_at: NaiveDateTime,
}
