//! Persistence for listings and their ranked applicants.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::applicant::ApplicantRow;
use crate::models::listing::{ListingRow, UploadStatus};
use crate::scoring::ScoredApplicant;

/// Inserts a new listing in the `processing` state. The database assigns `job_id`.
pub async fn create_listing(
    pool: &PgPool,
    name: &str,
    description: &str,
) -> Result<ListingRow, sqlx::Error> {
    let listing = sqlx::query_as::<_, ListingRow>(
        r#"
        INSERT INTO listings (name, description, upload_status)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(UploadStatus::Processing.as_str())
    .fetch_one(pool)
    .await?;

    info!("Created listing {} ('{}')", listing.job_id, listing.name);
    Ok(listing)
}

pub async fn get_listing(pool: &PgPool, job_id: i64) -> Result<Option<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>("SELECT * FROM listings WHERE job_id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

/// Stores the listing vector and the ranked applicants, then flips the
/// listing to `completed`. All in one transaction.
pub async fn complete_listing(
    pool: &PgPool,
    job_id: i64,
    reference_vector: &[f32],
    ranked: &[ScoredApplicant],
) -> Result<Vec<ApplicantRow>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let mut persisted = Vec::with_capacity(ranked.len());
    for (position, scored) in ranked.iter().enumerate() {
        let a = &scored.applicant;
        let row = sqlx::query_as::<_, ApplicantRow>(
            r#"
            INSERT INTO applicants
                (id, applied_to, name, email, linkedin, phone,
                 resume_link, resume_text, vector, score, rank)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job_id)
        .bind(&a.name)
        .bind(&a.email)
        .bind(&a.linkedin)
        .bind(&a.phone)
        .bind(&a.resume_link)
        .bind(&scored.resume_text)
        .bind(&scored.vector)
        .bind(scored.score)
        .bind(position as i32 + 1)
        .fetch_one(&mut *tx)
        .await?;
        persisted.push(row);
    }

    sqlx::query(
        r#"
        UPDATE listings
        SET reference_vector = $1, upload_status = $2, updated_at = NOW()
        WHERE job_id = $3
        "#,
    )
    .bind(reference_vector)
    .bind(UploadStatus::Completed.as_str())
    .bind(job_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "Listing {job_id} completed with {} applicants",
        persisted.len()
    );
    Ok(persisted)
}

pub async fn mark_listing_failed(pool: &PgPool, job_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE listings SET upload_status = $1, updated_at = NOW() WHERE job_id = $2")
        .bind(UploadStatus::Failed.as_str())
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Replaces the listing's interview questions. Returns `None` if the listing does not exist.
pub async fn set_questions(
    pool: &PgPool,
    job_id: i64,
    questions: &[String],
) -> Result<Option<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>(
        r#"
        UPDATE listings
        SET questions = $1, updated_at = NOW()
        WHERE job_id = $2
        RETURNING *
        "#,
    )
    .bind(questions)
    .bind(job_id)
    .fetch_optional(pool)
    .await
}

/// Persisted applicants for a listing, best score first.
pub async fn list_applicants(pool: &PgPool, job_id: i64) -> Result<Vec<ApplicantRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicantRow>(
        "SELECT * FROM applicants WHERE applied_to = $1 ORDER BY rank ASC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

pub async fn find_applicant(
    pool: &PgPool,
    job_id: i64,
    email: &str,
) -> Result<Option<ApplicantRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicantRow>(
        r#"
        SELECT * FROM applicants
        WHERE applied_to = $1 AND lower(email) = lower($2)
        ORDER BY rank ASC
        LIMIT 1
        "#,
    )
    .bind(job_id)
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn top_applicant(pool: &PgPool, job_id: i64) -> Result<Option<ApplicantRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicantRow>(
        "SELECT * FROM applicants WHERE applied_to = $1 ORDER BY rank ASC LIMIT 1",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await
}
