//! Alert handlers

use axum::{extract::{Query, State}, Json};

use crate::{AppState, AppResult};
use crate::middleware::auth::{require_alert_reviewer, UserContext};
use crate::models::{Alert, AlertFilter};

/// List alerts raised for blocked submissions
pub async fn list(
    State(state): State<AppState>,
    user: UserContext,
    Query(filter): Query<AlertFilter>,
) -> AppResult<Json<Vec<Alert>>> {
    require_alert_reviewer(&user)?;

    let alerts = Alert::list(&state.pool, filter).await?;
    Ok(Json(alerts))
}
