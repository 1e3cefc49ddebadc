//! Audit log

use sqlx::PgPool;
use uuid::Uuid;

pub const ACTION_REGISTER: &str = "USER_REGISTERED";
pub const ACTION_LOGIN: &str = "USER_LOGIN";
pub const ACTION_ANALYSIS: &str = "ANALYSIS_COMPLETED";

pub struct AuditLog;

impl AuditLog {
    pub async fn record(
        pool: &PgPool,
        user_id: Option<Uuid>,
        action: &str,
        resource_id: Option<Uuid>,
        ip_address: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, resource_id, ip_address)
            VALUES ($1, $2, $3, $4)
            "#
        )
        .bind(user_id)
        .bind(action)
        .bind(resource_id)
        .bind(ip_address)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Record, logging instead of failing the request on error
    pub async fn record_best_effort(
        pool: &PgPool,
        user_id: Option<Uuid>,
        action: &str,
        resource_id: Option<Uuid>,
        ip_address: Option<&str>,
    ) {
        if let Err(e) = Self::record(pool, user_id, action, resource_id, ip_address).await {
            tracing::warn!("Failed to write audit entry {}: {}", action, e);
        }
    }
}
