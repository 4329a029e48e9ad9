//! Axum route handlers for outbound calls and conversation status.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::calls::orchestrator::{handle_status_callback, initiate_call};
use crate::calls::script::render_call_script;
use crate::calls::store;
use crate::errors::AppError;
use crate::listings::handlers::{load_listing, require_job_id};
use crate::listings::questions::placeholder_questions;
use crate::listings::store as listing_store;
use crate::models::conversation::ConversationRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitiateCallRequest {
    pub job_id: Option<i64>,
    pub applicant_email: Option<String>,
}

/// Twilio's status callback form. Twilio sends many more fields; these are the ones we use.
#[derive(Debug, Deserialize)]
pub struct StatusCallbackForm {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "CallStatus")]
    pub call_status: String,
    #[serde(rename = "CallDuration")]
    pub call_duration: Option<String>,
}

/// `?conversation_id=` on the provider-facing webhook URLs.
#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationStatusQuery {
    pub job_id: Option<i64>,
    pub applicant_email: Option<String>,
}

/// POST /api/v1/calls
///
/// Body: `{ "job_id": 12, "applicant_email": "optional" }`.
/// Calls the named applicant, or the best-ranked one.
pub async fn handle_initiate_call(
    State(state): State<AppState>,
    Json(request): Json<InitiateCallRequest>,
) -> Result<Json<ConversationRow>, AppError> {
    let job_id = require_job_id(request.job_id)?;
    let email = request
        .applicant_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let conversation = initiate_call(
        &state.db,
        state.telephony.as_ref(),
        &state.config.public_base_url,
        job_id,
        email,
    )
    .await?;
    Ok(Json(conversation))
}

/// POST /api/v1/calls/status?conversation_id=: telephony status webhook (form-encoded).
pub async fn handle_call_status(
    State(state): State<AppState>,
    Query(params): Query<ConversationQuery>,
    Form(form): Form<StatusCallbackForm>,
) -> Result<Json<ConversationRow>, AppError> {
    let duration = form
        .call_duration
        .as_deref()
        .and_then(|d| d.trim().parse::<u32>().ok());
    let conversation = handle_status_callback(
        &state.db,
        params.conversation_id,
        &form.call_sid,
        &form.call_status,
        duration,
    )
    .await?;
    Ok(Json(conversation))
}

/// GET|POST /api/v1/calls/script?conversation_id=
///
/// TwiML fetched by the provider once the callee picks up.
pub async fn handle_call_script(
    State(state): State<AppState>,
    Query(params): Query<ConversationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = params
        .conversation_id
        .ok_or_else(|| AppError::Validation("conversation_id is required".to_string()))?;
    let conversation = store::get_conversation(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {id} not found")))?;
    let listing = load_listing(&state.db, conversation.job_id).await?;

    let applicant_name = listing_store::find_applicant(
        &state.db,
        conversation.job_id,
        &conversation.applicant_email,
    )
    .await?
    .map(|a| a.name)
    .unwrap_or_default();

    let questions = if listing.questions.is_empty() {
        placeholder_questions()
    } else {
        listing.questions
    };

    let twiml = render_call_script(&applicant_name, &listing.name, &questions);
    Ok(([(header::CONTENT_TYPE, "text/xml")], twiml))
}

/// GET /api/v1/conversations/status?job_id=&applicant_email=
pub async fn handle_conversation_status(
    State(state): State<AppState>,
    Query(params): Query<ConversationStatusQuery>,
) -> Result<Json<ConversationRow>, AppError> {
    let job_id = require_job_id(params.job_id)?;
    let email = params
        .applicant_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let conversation = store::latest_conversation(&state.db, job_id, email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No conversation for listing {job_id}")))?;
    Ok(Json(conversation))
}
