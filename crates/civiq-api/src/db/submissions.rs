//! Submission persistence.

use chrono::{DateTime, Utc};
use civiq_delivery::{DeliveryStatus, SecurityRejection, Submission};
use sqlx::PgPool;
use uuid::Uuid;

/// Save a submission (upsert). Called after every lifecycle mutation.
pub async fn save_submission(pool: &PgPool, submission: &Submission) -> Result<(), sqlx::Error> {
    let envelope = serde_json::to_value(&submission.envelope)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize envelope: {e}")))?;
    let attempts = serde_json::to_value(&submission.attempts)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize attempts: {e}")))?;

    sqlx::query(
        "INSERT INTO submissions (id, idempotency_key, status, envelope, attempts, security_rejection, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            attempts = EXCLUDED.attempts,
            security_rejection = EXCLUDED.security_rejection,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(*submission.id.as_uuid())
    .bind(&submission.idempotency_key)
    .bind(status_str(submission.status))
    .bind(&envelope)
    .bind(&attempts)
    .bind(submission.security_rejection.map(rejection_str))
    .bind(submission.created_at)
    .bind(submission.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all submissions for hydration.
pub async fn load_all_submissions(pool: &PgPool) -> Result<Vec<Submission>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SubmissionRow>(
        "SELECT id, idempotency_key, status, envelope, attempts, security_rejection, created_at, updated_at
         FROM submissions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let envelope = serde_json::from_value(row.envelope).map_err(|e| {
            sqlx::Error::Protocol(format!("corrupt envelope in submission {}: {e}", row.id))
        })?;
        let attempts = serde_json::from_value(row.attempts).map_err(|e| {
            sqlx::Error::Protocol(format!("corrupt attempts in submission {}: {e}", row.id))
        })?;
        records.push(Submission {
            id: row.id.into(),
            envelope,
            attempts,
            status: parse_status(&row.status),
            idempotency_key: row.idempotency_key,
            security_rejection: row.security_rejection.as_deref().and_then(parse_rejection),
            created_at: row.created_at,
            updated_at: row.updated_at,
        });
    }
    Ok(records)
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    idempotency_key: String,
    status: String,
    envelope: serde_json::Value,
    attempts: serde_json::Value,
    security_rejection: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn status_str(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Pending => "pending",
        DeliveryStatus::Processing => "processing",
        DeliveryStatus::Delivered => "delivered",
        DeliveryStatus::Partial => "partial",
        DeliveryStatus::Failed => "failed",
    }
}

fn parse_status(s: &str) -> DeliveryStatus {
    match s {
        "pending" => DeliveryStatus::Pending,
        // A crash mid-processing leaves "processing" in the database;
        // hydrate it as failed so the terminal audit state is explicit.
        "processing" => DeliveryStatus::Failed,
        "delivered" => DeliveryStatus::Delivered,
        "partial" => DeliveryStatus::Partial,
        "failed" => DeliveryStatus::Failed,
        other => {
            tracing::warn!(value = other, "unrecognized submission status in database, treating as failed");
            DeliveryStatus::Failed
        }
    }
}

fn rejection_str(rejection: SecurityRejection) -> &'static str {
    match rejection {
        SecurityRejection::Authentication => "authentication",
        SecurityRejection::NullifierCollision => "nullifier_collision",
    }
}

fn parse_rejection(s: &str) -> Option<SecurityRejection> {
    match s {
        "authentication" => Some(SecurityRejection::Authentication),
        "nullifier_collision" => Some(SecurityRejection::NullifierCollision),
        other => {
            tracing::warn!(value = other, "unrecognized security rejection in database");
            None
        }
    }
}
