//! Alert model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::risk::InputKind;

pub const ALERT_PENDING: &str = "PENDING";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub alert_type: String,
    pub sent_to: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AlertFilter {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

impl Alert {
    /// Alert type for a blocked submission of `kind`
    pub fn type_for(kind: InputKind) -> String {
        format!("HIGH_RISK_{}", kind.as_str())
    }

    pub async fn create<'e, E>(executor: E, analysis_id: Uuid, kind: InputKind) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Alert>(
            r#"
            INSERT INTO alerts (analysis_id, alert_type, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#
        )
        .bind(analysis_id)
        .bind(Self::type_for(kind))
        .bind(ALERT_PENDING)
        .fetch_one(executor)
        .await
    }

    pub async fn list(pool: &PgPool, filter: AlertFilter) -> Result<Vec<Self>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(50).clamp(1, 200);
        let status = filter.status.map(|s| s.to_ascii_uppercase());

        sqlx::query_as::<_, Alert>(
            r#"
            SELECT * FROM alerts
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(status)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_type_per_kind() {
        assert_eq!(Alert::type_for(InputKind::Text), "HIGH_RISK_TEXT");
        assert_eq!(Alert::type_for(InputKind::Document), "HIGH_RISK_DOCUMENT");
    }
}
