use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted (top-K) applicant for a listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    /// The listing's `job_id`.
    pub applied_to: i64,
    pub name: String,
    pub email: String,
    pub linkedin: String,
    pub phone: String,
    pub resume_link: String,
    #[serde(skip_serializing)]
    pub resume_text: String,
    #[serde(skip_serializing)]
    pub vector: Vec<f32>,
    pub score: f32,
    /// 1-based position in the ranking; ties keep upload order.
    pub rank: i32,
    pub created_at: DateTime<Utc>,
}

/// One applicant as read from the uploaded CSV, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawApplicant {
    pub name: String,
    pub email: String,
    pub linkedin: String,
    pub phone: String,
    pub resume_link: String,
}
