//! Nullifier persistence.
//!
//! The table's primary key enforces the uniqueness invariant; recording
//! is one `INSERT ... ON CONFLICT DO NOTHING` statement, never a
//! read-then-write pair.

use civiq_crypto::Nullifier;
use sqlx::PgPool;
use uuid::Uuid;

/// Record a nullifier. Returns `false` when it already existed.
pub async fn save_nullifier(
    pool: &PgPool,
    nullifier: &Nullifier,
    submission_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO nullifiers (nullifier, submission_id)
         VALUES ($1, $2)
         ON CONFLICT (nullifier) DO NOTHING",
    )
    .bind(nullifier.to_hex())
    .bind(submission_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Load all recorded nullifiers for hydration.
pub async fn load_all_nullifiers(pool: &PgPool) -> Result<Vec<(Nullifier, Uuid)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, Uuid)>(
        "SELECT nullifier, submission_id FROM nullifiers ORDER BY recorded_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for (hex, submission_id) in rows {
        let nullifier = Nullifier::from_hex(&hex)
            .map_err(|e| sqlx::Error::Protocol(format!("corrupt nullifier {hex}: {e}")))?;
        records.push((nullifier, submission_id));
    }
    Ok(records)
}
