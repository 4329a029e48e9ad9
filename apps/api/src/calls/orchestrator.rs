//! Call Orchestrator: picks the applicant, records the conversation and asks
//! the telephony provider to dial.
//!
//! State machine: `initiating -> initiated -> (ringing | answered | completed)`.
//! Only `initiating` and the `initiated` acknowledgement are set here; later
//! states come from provider callbacks (`store::apply_callback`).

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calls::store;
use crate::calls::twilio::{normalize_phone, Telephony, TelephonyError};
use crate::errors::AppError;
use crate::listings::handlers::load_listing;
use crate::listings::store as listing_store;
use crate::models::applicant::ApplicantRow;
use crate::models::conversation::{CallStatus, ConversationRow};

pub fn script_url(public_base_url: &str, conversation: &ConversationRow) -> String {
    format!(
        "{public_base_url}/api/v1/calls/script?conversation_id={}",
        conversation.id
    )
}

/// Carries the conversation id so callbacks that arrive before the call SID
/// is stored can still be matched.
pub fn status_callback_url(public_base_url: &str, conversation: &ConversationRow) -> String {
    format!(
        "{public_base_url}/api/v1/calls/status?conversation_id={}",
        conversation.id
    )
}

/// Resolves the applicant to call: the named one, or the best-ranked.
async fn resolve_applicant(
    db: &PgPool,
    job_id: i64,
    applicant_email: Option<&str>,
) -> Result<ApplicantRow, AppError> {
    let applicant = match applicant_email {
        Some(email) => listing_store::find_applicant(db, job_id, email).await?,
        None => listing_store::top_applicant(db, job_id).await?,
    };
    applicant.ok_or_else(|| match applicant_email {
        Some(email) => {
            AppError::NotFound(format!("Applicant {email} not found for listing {job_id}"))
        }
        None => AppError::NotFound(format!("Listing {job_id} has no scored applicants")),
    })
}

/// Places a call for a listing. Lookup failures return before any
/// conversation is created.
pub async fn initiate_call(
    db: &PgPool,
    telephony: &dyn Telephony,
    public_base_url: &str,
    job_id: i64,
    applicant_email: Option<&str>,
) -> Result<ConversationRow, AppError> {
    load_listing(db, job_id).await?;
    let applicant = resolve_applicant(db, job_id, applicant_email).await?;
    normalize_phone(&applicant.phone).map_err(|e| AppError::Validation(e.to_string()))?;

    let conversation = store::create_conversation(db, job_id, &applicant.email).await?;

    let placed = telephony
        .place_call(
            &applicant.phone,
            &script_url(public_base_url, &conversation),
            &status_callback_url(public_base_url, &conversation),
        )
        .await;

    match placed {
        Ok(call) => {
            let conversation =
                store::mark_initiated(db, conversation.id, &call.sid, &call.status).await?;
            info!(
                "Call {} placed to {} for listing {job_id}",
                call.sid, applicant.email
            );
            Ok(conversation)
        }
        Err(e) => {
            warn!("Call for conversation {} failed: {e}", conversation.id);
            store::mark_failed(db, conversation.id, &e.to_string()).await?;
            Err(telephony_error(e))
        }
    }
}

fn telephony_error(e: TelephonyError) -> AppError {
    match e {
        TelephonyError::InvalidNumber(_) => AppError::Validation(e.to_string()),
        other => AppError::Telephony(other.to_string()),
    }
}

/// Handles one provider status callback. Unknown provider statuses are kept
/// in history without moving the state machine.
pub async fn handle_status_callback(
    db: &PgPool,
    conversation_id: Option<Uuid>,
    call_sid: &str,
    provider_status: &str,
    duration_secs: Option<u32>,
) -> Result<ConversationRow, AppError> {
    let next = CallStatus::from_provider(provider_status);
    let detail = duration_secs.map(|d| format!("duration={d}s"));
    store::apply_callback(db, call_sid, conversation_id, provider_status, next, detail)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No conversation for call {call_sid}")))
}
