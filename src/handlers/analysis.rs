//! Analysis handlers
//!
//! Submission → analyzer → risk engine → persistence. Logging happens here,
//! around the call into the scoring core.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::analyzer::{self, AnalysisInput, SignalReport};
use crate::middleware::auth::UserContext;
use crate::models::{
    Alert, AnalysisFilter, AnalysisRecord, AnalysisResponse, AuditLog, NewAnalysis,
    RiskComponents, TextAnalysisRequest, UrlAnalysisRequest, ACTION_ANALYSIS,
};
use crate::risk::{self, Decision, InputKind, RiskOutcome};

/// Multipart field carrying the upload
const UPLOAD_FIELD: &str = "file";

/// Scored submission, ready to persist
#[derive(Debug)]
pub struct Assessment {
    pub kind: InputKind,
    pub input_hash: String,
    pub outcome: RiskOutcome,
    pub components: RiskComponents,
    pub details: serde_json::Value,
}

impl Assessment {
    /// BLOCK decisions raise a pending alert alongside the record
    pub fn raises_alert(&self) -> bool {
        self.outcome.decision == Decision::Block
    }
}

/// Score an analyzer report for a submission. Pure.
pub fn assess(input: &AnalysisInput, report: &SignalReport) -> Assessment {
    let kind = input.kind();
    Assessment {
        kind,
        input_hash: input.content_hash(),
        outcome: risk::evaluate(kind, &report.signals),
        components: RiskComponents::from_signals(&report.signals),
        details: report.to_details(),
    }
}

/// POST /analyze/text
pub async fn analyze_text(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<TextAnalysisRequest>,
) -> AppResult<Json<AnalysisResponse>> {
    run_analysis(&state, &user, AnalysisInput::Text { content: req.content }).await
}

/// POST /analyze/url
pub async fn analyze_url(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<UrlAnalysisRequest>,
) -> AppResult<Json<AnalysisResponse>> {
    req.validate()?;
    run_analysis(&state, &user, AnalysisInput::Url { url: req.url }).await
}

/// POST /analyze/file (multipart, field `file`)
pub async fn analyze_file(
    State(state): State<AppState>,
    user: UserContext,
    multipart: Multipart,
) -> AppResult<Json<AnalysisResponse>> {
    let (filename, bytes) = read_upload(multipart).await?;
    run_analysis(&state, &user, AnalysisInput::Document { filename, bytes }).await
}

/// POST /analyze/image (multipart, field `file`)
pub async fn analyze_image(
    State(state): State<AppState>,
    user: UserContext,
    multipart: Multipart,
) -> AppResult<Json<AnalysisResponse>> {
    let (filename, bytes) = read_upload(multipart).await?;
    run_analysis(&state, &user, AnalysisInput::Image { filename, bytes }).await
}

/// GET /analyze/history
pub async fn history(
    State(state): State<AppState>,
    user: UserContext,
    Query(filter): Query<AnalysisFilter>,
) -> AppResult<Json<Vec<AnalysisResponse>>> {
    let input_type = filter.input_kind()?;
    let decision = filter.decision()?;

    let records = AnalysisRecord::list_for_user(
        &state.pool,
        user.user_id,
        input_type,
        decision,
        filter.page(),
    ).await?;
    Ok(Json(records.iter().map(|r| r.to_response(None)).collect()))
}

/// GET /analyze/:id
pub async fn get(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AnalysisResponse>> {
    let record = AnalysisRecord::find_for_user(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Analysis not found".to_string()))?;

    let components = RiskComponents::find_by_analysis(&state.pool, record.id).await?;
    Ok(Json(record.to_response(components)))
}

async fn run_analysis(
    state: &AppState,
    user: &UserContext,
    input: AnalysisInput,
) -> AppResult<Json<AnalysisResponse>> {
    if input.is_empty() {
        return Err(AppError::ValidationError("Submission content is empty".to_string()));
    }

    let kind = input.kind();
    tracing::info!("{} analysis requested by {}", kind, user.email);

    let report = analyzer::analyze(state.analyzer.as_ref(), &input).await?;
    let assessment = assess(&input, &report);

    tracing::info!(
        "{} analysis scored: score={:.4}, level={}, decision={}",
        kind,
        assessment.outcome.risk_score,
        assessment.outcome.risk_level,
        assessment.outcome.decision
    );

    let (record, components) = persist(state, user, assessment).await?;

    AuditLog::record_best_effort(
        &state.pool,
        Some(user.user_id),
        ACTION_ANALYSIS,
        Some(record.id),
        user.ip_address.as_deref(),
    ).await;

    Ok(Json(record.to_response(Some(components))))
}

/// Record + components (+ alert on BLOCK) in one transaction
async fn persist(
    state: &AppState,
    user: &UserContext,
    assessment: Assessment,
) -> AppResult<(AnalysisRecord, RiskComponents)> {
    let mut tx = state.pool.begin().await?;
    let raises_alert = assessment.raises_alert();

    let record = AnalysisRecord::create(
        &mut *tx,
        NewAnalysis {
            user_id: user.user_id,
            kind: assessment.kind,
            input_hash: assessment.input_hash,
            outcome: assessment.outcome,
            details: assessment.details,
        },
    ).await?;

    RiskComponents::create(&mut *tx, record.id, &assessment.components).await?;

    if raises_alert {
        let alert = Alert::create(&mut *tx, record.id, assessment.kind).await?;
        tracing::warn!("Alert {} raised for blocked {} analysis {}", alert.id, assessment.kind, record.id);
    }

    tx.commit().await?;

    Ok((record, assessment.components))
}

/// First `file` field of a multipart body
async fn read_upload(mut multipart: Multipart) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await?;
        return Ok((filename, bytes.to_vec()));
    }

    Err(AppError::ValidationError(format!("Missing multipart field '{}'", UPLOAD_FIELD)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::types::RiskLevel;
    use crate::risk::SignalBundle;

    #[test]
    fn test_assess_text_submission() {
        let input = AnalysisInput::Text { content: "Urgent: verify your account".to_string() };
        let report = SignalReport::new(SignalBundle::new().with("fraud_probability", 0.95))
            .attribute("sentiment", "negative");

        let assessment = assess(&input, &report);
        assert_eq!(assessment.kind, InputKind::Text);
        assert_eq!(assessment.outcome.risk_score, 0.95);
        assert_eq!(assessment.outcome.risk_level, RiskLevel::High);
        assert_eq!(assessment.outcome.decision, Decision::Block);
        assert_eq!(assessment.components.text_score, 0.95);
        assert_eq!(assessment.details["sentiment"], "negative");
        assert_eq!(assessment.input_hash.len(), 64);
    }

    #[test]
    fn test_only_blocked_assessments_raise_alerts() {
        let input = AnalysisInput::Url { url: "http://evil.com/login".to_string() };
        for (phishing, expected) in [(0.81, true), (0.8, false), (0.5, false), (0.1, false)] {
            let report = SignalReport::new(SignalBundle::new().with("phishing_probability", phishing));
            let assessment = assess(&input, &report);
            assert_eq!(assessment.raises_alert(), expected, "phishing={}", phishing);
        }
    }

    #[test]
    fn test_assess_image_submission() {
        let input = AnalysisInput::Image {
            filename: "receipt.jpg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        };
        let report = SignalReport::new(
            SignalBundle::new()
                .with("metadata_suspicion", 0.5)
                .with("steganography_score", 0.1),
        );

        let assessment = assess(&input, &report);
        assert_eq!(assessment.outcome.risk_score, 0.34);
        assert_eq!(assessment.outcome.decision, Decision::Allow);
        assert_eq!(assessment.components.metadata_score, 0.5);
    }

    #[test]
    fn test_assess_document_with_empty_report() {
        let input = AnalysisInput::Document {
            filename: "notes.txt".to_string(),
            bytes: b"quarterly numbers".to_vec(),
        };
        let assessment = assess(&input, &SignalReport::default());
        assert_eq!(assessment.kind, InputKind::Document);
        assert_eq!(assessment.outcome.risk_score, 0.0);
        assert_eq!(assessment.outcome.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_same_content_same_hash() {
        let report = SignalReport::default();
        let a = assess(&AnalysisInput::Url { url: "http://evil.com".into() }, &report);
        let b = assess(&AnalysisInput::Url { url: "http://evil.com".into() }, &report);
        assert_eq!(a.input_hash, b.input_hash);
    }
}
