//! Two-stage question answering: question -> SQL -> rows -> answer

use std::sync::Arc;
use std::time::Instant;

use claimbeaver_core::{ANSWER_PROMPT, InquiryError, SQL_PROMPT, SQL_STOP_SEQUENCE, extract_sql};

use crate::db::SqlDatabase;
use crate::llm::{ChatModel, UNAVAILABLE_MESSAGE};

/// Fetch the schema description shown to the model
pub async fn get_schema(db: &dyn SqlDatabase) -> Result<String, InquiryError> {
    db.table_info().await
}

/// Execute an already-cleaned query and return its text result
pub async fn run_query(db: &dyn SqlDatabase, sql: &str) -> Result<String, InquiryError> {
    tracing::info!(sql = %sql, "Running generated query");
    db.run(sql).await
}

/// Healthcare claims inquiry agent.
///
/// Holds the process-wide model and database handles; built once at startup
/// and shared by every request.
#[derive(Clone)]
pub struct InquiryAgent {
    llm: Arc<dyn ChatModel>,
    db: Arc<dyn SqlDatabase>,
}

impl InquiryAgent {
    pub fn new(llm: Arc<dyn ChatModel>, db: Arc<dyn SqlDatabase>) -> Self {
        Self { llm, db }
    }

    pub fn llm(&self) -> &dyn ChatModel {
        self.llm.as_ref()
    }

    pub fn database(&self) -> &dyn SqlDatabase {
        self.db.as_ref()
    }

    /// Stage 1: ask the model for SQL and strip any markdown fencing
    pub async fn generate_sql(&self, question: &str) -> Result<String, InquiryError> {
        let started = Instant::now();
        let schema = get_schema(self.database()).await?;
        let messages = SQL_PROMPT.format_messages(&[("schema", schema.as_str()), ("question", question)])?;

        let raw = self
            .llm
            .complete_with_stop(&messages, &[SQL_STOP_SEQUENCE])
            .await?;
        record_stage("generate_sql", started);
        tracing::debug!(raw = %raw, "Model produced SQL");

        Ok(extract_sql(&raw))
    }

    /// Answer a natural-language question about the claims database.
    ///
    /// Any model or database failure is returned as-is; nothing is retried.
    pub async fn answer(&self, question: &str) -> Result<String, InquiryError> {
        if !self.llm.is_available() {
            tracing::warn!("No LLM backend configured, returning unavailability notice");
            return Ok(UNAVAILABLE_MESSAGE.to_string());
        }

        let query = self.generate_sql(question).await?;
        tracing::debug!(query = %query, "Cleaned SQL");

        let started = Instant::now();
        let response = run_query(self.database(), &query).await?;
        record_stage("run_query", started);

        let started = Instant::now();
        let schema = get_schema(self.database()).await?;
        let messages = ANSWER_PROMPT.format_messages(&[
            ("schema", schema.as_str()),
            ("question", question),
            ("query", query.as_str()),
            ("response", response.as_str()),
        ])?;
        let answer = self.llm.complete(&messages).await?;
        record_stage("answer", started);

        Ok(answer)
    }
}

fn record_stage(stage: &'static str, started: Instant) {
    metrics::histogram!("inquiry_stage_duration_seconds", "stage" => stage)
        .record(started.elapsed().as_secs_f64());
}
