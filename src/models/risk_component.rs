//! Risk component breakdown

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::risk::rules::{
    FRAUD_PROBABILITY, MALWARE_PROBABILITY, METADATA_SUSPICION, PHISHING_PROBABILITY,
    STEGANOGRAPHY_SCORE,
};
use crate::risk::SignalBundle;

/// Signals that fed one analysis, one column per signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RiskComponents {
    pub text_score: f64,
    pub url_score: f64,
    pub malware_score: f64,
    pub metadata_score: f64,
    pub steganography_score: f64,
}

impl RiskComponents {
    pub fn from_signals(signals: &SignalBundle) -> Self {
        Self {
            text_score: signals.get(FRAUD_PROBABILITY),
            url_score: signals.get(PHISHING_PROBABILITY),
            malware_score: signals.get(MALWARE_PROBABILITY),
            metadata_score: signals.get(METADATA_SUSPICION),
            steganography_score: signals.get(STEGANOGRAPHY_SCORE),
        }
    }

    pub async fn create<'e, E>(executor: E, analysis_id: Uuid, components: &Self) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO risk_components (analysis_id, text_score, url_score, malware_score, metadata_score, steganography_score)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#
        )
        .bind(analysis_id)
        .bind(components.text_score)
        .bind(components.url_score)
        .bind(components.malware_score)
        .bind(components.metadata_score)
        .bind(components.steganography_score)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_analysis(pool: &PgPool, analysis_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RiskComponents>(
            r#"
            SELECT text_score, url_score, malware_score, metadata_score, steganography_score
            FROM risk_components WHERE analysis_id = $1
            "#
        )
        .bind(analysis_id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_components() {
        let signals = SignalBundle::new()
            .with("metadata_suspicion", 0.5)
            .with("steganography_score", 0.1);
        let components = RiskComponents::from_signals(&signals);
        assert_eq!(components.metadata_score, 0.5);
        assert_eq!(components.steganography_score, 0.1);
        assert_eq!(components.text_score, 0.0);
        assert_eq!(components.malware_score, 0.0);
    }

    #[test]
    fn test_unrelated_signals_ignored() {
        let signals = SignalBundle::new().with("sentiment_score", 0.9);
        let components = RiskComponents::from_signals(&signals);
        assert_eq!(components, RiskComponents::from_signals(&SignalBundle::new()));
    }
}
