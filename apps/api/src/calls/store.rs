//! Persistence for conversation (call) records.
//! Every status change appends a `HistoryEntry`; the history is never rewritten.

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::conversation::{CallStatus, ConversationRow, HistoryEntry};

pub async fn create_conversation(
    pool: &PgPool,
    job_id: i64,
    applicant_email: &str,
) -> Result<ConversationRow, sqlx::Error> {
    let history = vec![HistoryEntry::now(CallStatus::Initiating.as_str(), None)];
    let conversation = sqlx::query_as::<_, ConversationRow>(
        r#"
        INSERT INTO conversations (id, applicant_email, job_id, history, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(applicant_email)
    .bind(job_id)
    .bind(Json(&history))
    .bind(CallStatus::Initiating.as_str())
    .fetch_one(pool)
    .await?;

    info!(
        "Created conversation {} for {applicant_email} on listing {job_id}",
        conversation.id
    );
    Ok(conversation)
}

pub async fn get_conversation(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ConversationRow>, sqlx::Error> {
    sqlx::query_as::<_, ConversationRow>("SELECT * FROM conversations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Most recently updated conversation for a listing, optionally narrowed to one applicant.
pub async fn latest_conversation(
    pool: &PgPool,
    job_id: i64,
    applicant_email: Option<&str>,
) -> Result<Option<ConversationRow>, sqlx::Error> {
    sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT * FROM conversations
        WHERE job_id = $1 AND ($2::TEXT IS NULL OR lower(applicant_email) = lower($2))
        ORDER BY updated_at DESC
        LIMIT 1
        "#,
    )
    .bind(job_id)
    .bind(applicant_email)
    .fetch_optional(pool)
    .await
}

/// Records the provider's call SID once the call request was accepted.
/// A status callback may have landed first; the status is then left alone.
pub async fn mark_initiated(
    pool: &PgPool,
    id: Uuid,
    call_sid: &str,
    provider_status: &str,
) -> Result<ConversationRow, sqlx::Error> {
    let entry = HistoryEntry::now(
        CallStatus::Initiated.as_str(),
        Some(format!("call_sid={call_sid} provider_status={provider_status}")),
    );
    sqlx::query_as::<_, ConversationRow>(
        r#"
        UPDATE conversations
        SET status = CASE WHEN status = $1 THEN $2 ELSE status END,
            call_sid = $3,
            history = history || $4,
            updated_at = NOW()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(CallStatus::Initiating.as_str())
    .bind(CallStatus::Initiated.as_str())
    .bind(call_sid)
    .bind(Json(vec![entry]))
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn mark_failed(pool: &PgPool, id: Uuid, reason: &str) -> Result<(), sqlx::Error> {
    let entry = HistoryEntry::now(CallStatus::Failed.as_str(), Some(reason.to_string()));
    sqlx::query(
        r#"
        UPDATE conversations
        SET status = $1, history = history || $2, updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(CallStatus::Failed.as_str())
    .bind(Json(vec![entry]))
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Status a conversation moves to after a callback: `next` when the
/// transition is forward, otherwise `None` (the status stays put).
fn advanced_status(current: &str, next: Option<CallStatus>) -> Option<CallStatus> {
    match (CallStatus::parse(current), next) {
        (Some(from), Some(to)) if from.can_transition_to(to) => Some(to),
        _ => None,
    }
}

/// Applies a provider status callback.
///
/// The conversation is found by `call_sid`, or by `conversation_id` when the
/// callback beat `mark_initiated` and no SID is stored yet (the SID is then
/// recorded). The event is always appended to history; the status only moves
/// forward. Returns `None` when nothing matches.
pub async fn apply_callback(
    pool: &PgPool,
    call_sid: &str,
    conversation_id: Option<Uuid>,
    provider_status: &str,
    next: Option<CallStatus>,
    detail: Option<String>,
) -> Result<Option<ConversationRow>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT * FROM conversations
        WHERE call_sid = $1 OR (call_sid IS NULL AND id = $2)
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(call_sid)
    .bind(conversation_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(current) = current else {
        return Ok(None);
    };

    let new_status = match advanced_status(&current.status, next) {
        Some(to) => to.as_str(),
        None => {
            warn!(
                "Conversation {}: ignoring status '{provider_status}' while '{}'",
                current.id, current.status
            );
            current.status.as_str()
        }
    };

    let entry = HistoryEntry::now(provider_status, detail);
    let updated = sqlx::query_as::<_, ConversationRow>(
        r#"
        UPDATE conversations
        SET status = $1,
            call_sid = COALESCE(call_sid, $2),
            history = history || $3,
            updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(new_status)
    .bind(call_sid)
    .bind(Json(vec![entry]))
    .bind(current.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(
        "Conversation {} is now '{}' (provider: {provider_status})",
        updated.id, updated.status
    );
    Ok(Some(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::store as listing_store;

    async fn conversation(pool: &PgPool) -> ConversationRow {
        let listing = listing_store::create_listing(pool, "Backend Engineer", "Rust and Postgres")
            .await
            .unwrap();
        create_conversation(pool, listing.job_id, "ada@example.com")
            .await
            .unwrap()
    }

    fn events(conversation: &ConversationRow) -> Vec<&str> {
        conversation.history.iter().map(|h| h.event.as_str()).collect()
    }

    #[test]
    fn test_advanced_status_only_moves_forward() {
        assert_eq!(
            advanced_status("initiated", Some(CallStatus::Ringing)),
            Some(CallStatus::Ringing)
        );
        assert_eq!(advanced_status("answered", Some(CallStatus::Ringing)), None);
        assert_eq!(advanced_status("completed", Some(CallStatus::Failed)), None);
        assert_eq!(advanced_status("initiated", None), None);
        assert_eq!(advanced_status("garbled", Some(CallStatus::Ringing)), None);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires Postgres (DATABASE_URL)"]
    async fn test_stale_callback_is_recorded_but_status_holds(pool: PgPool) {
        let conv = conversation(&pool).await;
        mark_initiated(&pool, conv.id, "CA100", "queued").await.unwrap();

        let done = apply_callback(
            &pool,
            "CA100",
            None,
            "completed",
            Some(CallStatus::Completed),
            Some("duration=42s".to_string()),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(done.status, "completed");

        let stale = apply_callback(&pool, "CA100", None, "ringing", Some(CallStatus::Ringing), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stale.status, "completed");
        assert_eq!(
            events(&stale),
            vec!["initiating", "initiated", "completed", "ringing"]
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires Postgres (DATABASE_URL)"]
    async fn test_callback_before_sid_is_stored_matches_conversation(pool: PgPool) {
        let conv = conversation(&pool).await;

        let early = apply_callback(
            &pool,
            "CA200",
            Some(conv.id),
            "ringing",
            Some(CallStatus::Ringing),
            None,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(early.id, conv.id);
        assert_eq!(early.status, "ringing");
        assert_eq!(early.call_sid.as_deref(), Some("CA200"));

        let acked = mark_initiated(&pool, conv.id, "CA200", "queued").await.unwrap();
        assert_eq!(acked.status, "ringing");
        assert_eq!(events(&acked), vec!["initiating", "ringing", "initiated"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires Postgres (DATABASE_URL)"]
    async fn test_unknown_call_sid_matches_nothing(pool: PgPool) {
        let conv = conversation(&pool).await;
        mark_initiated(&pool, conv.id, "CA300", "queued").await.unwrap();

        let other_id = apply_callback(
            &pool,
            "CA999",
            Some(conv.id),
            "ringing",
            Some(CallStatus::Ringing),
            None,
        )
        .await
        .unwrap();
        assert!(other_id.is_none());

        let unchanged = get_conversation(&pool, conv.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, "initiated");
    }
}
