//! Axum route handlers for listings: upload, upload status, phone settings, phone list.

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info};

use crate::errors::AppError;
use crate::listings::archive::archive_upload;
use crate::listings::csv_reader::read_applicants;
use crate::listings::questions::{generate_questions, normalize_questions, MAX_QUESTIONS};
use crate::listings::store;
use crate::models::applicant::ApplicantRow;
use crate::models::listing::{ListingRow, UploadStatus};
use crate::scoring::score_listing;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub job_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: i64,
    pub upload_status: UploadStatus,
    pub received: usize,
    pub applicants: Vec<ApplicantRow>,
}

#[derive(Debug, Serialize)]
pub struct UploadStatusResponse {
    pub job_id: i64,
    pub upload_status: String,
    pub finished: bool,
}

#[derive(Debug, Deserialize)]
pub struct PhoneSettingsRequest {
    pub job_id: Option<i64>,
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PhoneSettingsResponse {
    pub job_id: i64,
    pub listing_name: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PhoneListResponse {
    pub job_id: i64,
    pub listing_name: String,
    pub applicants: Vec<ApplicantRow>,
}

/// Fields of the upload form once pulled out of the multipart body.
struct UploadForm {
    file_name: String,
    csv: Bytes,
    listing_name: String,
    job_description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/upload
///
/// Multipart form: `csvfile`, `listing_name`, `job_description`.
/// Creates the listing, ranks the applicants and persists the top five.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let form = read_upload_form(multipart).await?;
    let applicants =
        read_applicants(&form.csv).map_err(|e| AppError::Validation(e.to_string()))?;

    let listing =
        store::create_listing(&state.db, &form.listing_name, &form.job_description).await?;
    let job_id = listing.job_id;
    info!(
        "Upload for listing {job_id}: {} applicants in '{}'",
        applicants.len(),
        form.file_name
    );

    archive_upload(
        &state.s3,
        &state.config.s3_bucket,
        job_id,
        &form.file_name,
        form.csv.clone(),
    )
    .await;

    let ranked = match score_listing(
        &listing.name,
        &listing.description,
        &applicants,
        state.embedder.as_ref(),
        state.resumes.as_ref(),
    )
    .await
    {
        Ok(ranked) => ranked,
        Err(e) => {
            fail_listing(&state.db, job_id).await;
            return Err(AppError::Embedding(format!(
                "Listing {job_id} could not be vectorized: {e}"
            )));
        }
    };

    let persisted = match store::complete_listing(
        &state.db,
        job_id,
        &ranked.reference_vector,
        &ranked.applicants,
    )
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            fail_listing(&state.db, job_id).await;
            return Err(AppError::Database(e));
        }
    };

    Ok(Json(UploadResponse {
        job_id,
        upload_status: UploadStatus::Completed,
        received: applicants.len(),
        applicants: persisted,
    }))
}

/// GET /api/v1/upload/status?job_id=
pub async fn handle_upload_status(
    State(state): State<AppState>,
    Query(params): Query<JobQuery>,
) -> Result<Json<UploadStatusResponse>, AppError> {
    let listing = load_listing(&state.db, require_job_id(params.job_id)?).await?;
    let finished = UploadStatus::parse(&listing.upload_status)
        .map(|s| s != UploadStatus::Processing)
        .unwrap_or(false);

    Ok(Json(UploadStatusResponse {
        job_id: listing.job_id,
        upload_status: listing.upload_status,
        finished,
    }))
}

/// GET /api/v1/phone-settings?job_id=
///
/// Returns the listing's interview questions, generating and saving them first
/// if the listing has none yet.
pub async fn handle_get_phone_settings(
    State(state): State<AppState>,
    Query(params): Query<JobQuery>,
) -> Result<Json<PhoneSettingsResponse>, AppError> {
    let mut listing = load_listing(&state.db, require_job_id(params.job_id)?).await?;

    if listing.questions.is_empty() {
        let questions = generate_questions(&state.llm, &listing.name, &listing.description).await;
        listing = store::set_questions(&state.db, listing.job_id, &questions)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", listing.job_id)))?;
    }

    Ok(Json(PhoneSettingsResponse {
        job_id: listing.job_id,
        listing_name: listing.name,
        questions: listing.questions,
    }))
}

/// POST /api/v1/phone-settings
///
/// Body: `{ "job_id": 12, "questions": ["...", "..."] }`. Replaces the questions.
pub async fn handle_post_phone_settings(
    State(state): State<AppState>,
    Json(request): Json<PhoneSettingsRequest>,
) -> Result<Json<PhoneSettingsResponse>, AppError> {
    let job_id = require_job_id(request.job_id)?;
    let questions = normalize_questions(request.questions);
    if questions.is_empty() {
        return Err(AppError::Validation(
            "questions must contain at least one non-empty question".to_string(),
        ));
    }
    if questions.len() > MAX_QUESTIONS {
        return Err(AppError::Validation(format!(
            "at most {MAX_QUESTIONS} questions are allowed"
        )));
    }

    let listing = store::set_questions(&state.db, job_id, &questions)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {job_id} not found")))?;
    info!(
        "Saved {} interview questions for listing {job_id}",
        listing.questions.len()
    );

    Ok(Json(PhoneSettingsResponse {
        job_id: listing.job_id,
        listing_name: listing.name,
        questions: listing.questions,
    }))
}

/// GET /api/v1/phone-list?job_id=
///
/// The persisted shortlist for a listing, best match first.
pub async fn handle_phone_list(
    State(state): State<AppState>,
    Query(params): Query<JobQuery>,
) -> Result<Json<PhoneListResponse>, AppError> {
    let listing = load_listing(&state.db, require_job_id(params.job_id)?).await?;
    let applicants = store::list_applicants(&state.db, listing.job_id).await?;

    Ok(Json(PhoneListResponse {
        job_id: listing.job_id,
        listing_name: listing.name,
        applicants,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

pub fn require_job_id(job_id: Option<i64>) -> Result<i64, AppError> {
    job_id.ok_or_else(|| AppError::Validation("job_id is required".to_string()))
}

pub async fn load_listing(db: &PgPool, job_id: i64) -> Result<ListingRow, AppError> {
    store::get_listing(db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {job_id} not found")))
}

async fn fail_listing(db: &PgPool, job_id: i64) {
    if let Err(e) = store::mark_listing_failed(db, job_id).await {
        error!("Could not mark listing {job_id} as failed: {e}");
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut csv: Option<(String, Bytes)> = None;
    let mut listing_name = None;
    let mut job_description = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("csvfile") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                csv = Some((file_name, data));
            }
            Some("listing_name") => {
                listing_name = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("job_description") => {
                job_description = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (file_name, csv) =
        csv.ok_or_else(|| AppError::Validation("csvfile is required".to_string()))?;
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(AppError::Validation(
            "Please upload a valid .csv file".to_string(),
        ));
    }

    Ok(UploadForm {
        file_name,
        csv,
        listing_name: required_text(listing_name, "listing_name")?,
        job_description: required_text(job_description, "job_description")?,
    })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}
