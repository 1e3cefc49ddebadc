//! Analysis record model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::models::RiskComponents;
use crate::risk::{Decision, InputKind, RiskOutcome, UnrecognizedDecision, UnrecognizedInputKind};

pub const STATUS_COMPLETED: &str = "COMPLETED";

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Persisted analysis. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub input_type: String,
    pub input_hash: String,
    pub risk_score: f64,
    pub risk_level: String,
    pub decision: String,
    pub details: Option<serde_json::Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewAnalysis {
    pub user_id: Uuid,
    pub kind: InputKind,
    pub input_hash: String,
    pub outcome: RiskOutcome,
    pub details: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct TextAnalysisRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct UrlAnalysisRequest {
    #[validate(url(message = "Invalid URL"))]
    pub url: String,
}

/// History query string. Tags are parsed case-insensitively by the handler
/// so bad values get the JSON error body.
#[derive(Debug, Deserialize, Default)]
pub struct AnalysisFilter {
    pub input_type: Option<String>,
    pub decision: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AnalysisFilter {
    pub fn input_kind(&self) -> Result<Option<InputKind>, UnrecognizedInputKind> {
        self.input_type.as_deref().map(str::parse).transpose()
    }

    pub fn decision(&self) -> Result<Option<Decision>, UnrecognizedDecision> {
        self.decision.as_deref().map(str::parse).transpose()
    }

    /// (limit, offset) with defaults and bounds applied
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub status: String,
    pub input_type: String,
    pub input_hash: String,
    pub risk_score: f64,
    pub risk_level: String,
    pub decision: String,
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_components: Option<RiskComponents>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub async fn create<'e, E>(executor: E, data: NewAnalysis) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, AnalysisRecord>(
            r#"
            INSERT INTO analysis_logs (user_id, input_type, input_hash, risk_score, risk_level, decision, details, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#
        )
        .bind(data.user_id)
        .bind(data.kind.as_str())
        .bind(&data.input_hash)
        .bind(data.outcome.risk_score)
        .bind(data.outcome.risk_level.as_str())
        .bind(data.outcome.decision.as_str())
        .bind(&data.details)
        .bind(STATUS_COMPLETED)
        .fetch_one(executor)
        .await
    }

    /// A record owned by `user_id`
    pub async fn find_for_user(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AnalysisRecord>(
            "SELECT * FROM analysis_logs WHERE id = $1 AND user_id = $2"
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// The user's records, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        input_type: Option<InputKind>,
        decision: Option<Decision>,
        (limit, offset): (i64, i64),
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AnalysisRecord>(
            r#"
            SELECT * FROM analysis_logs
            WHERE user_id = $1
              AND ($2::TEXT IS NULL OR input_type = $2)
              AND ($3::TEXT IS NULL OR decision = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        )
        .bind(user_id)
        .bind(input_type.map(|k| k.as_str()))
        .bind(decision.map(|d| d.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub fn to_response(&self, risk_components: Option<RiskComponents>) -> AnalysisResponse {
        AnalysisResponse {
            id: self.id,
            status: self.status.clone(),
            input_type: self.input_type.clone(),
            input_hash: self.input_hash.clone(),
            risk_score: self.risk_score,
            risk_level: self.risk_level.clone(),
            decision: self.decision.clone(),
            details: self.details.clone(),
            risk_components,
            created_at: self.created_at,
        }
    }
}
