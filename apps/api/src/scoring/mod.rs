//! Scoring Pipeline: ranks applicants by resume-to-listing semantic similarity.
//!
//! Algorithm:
//! 1. reference text = listing name + description, embedded once
//! 2. per applicant, sequentially: fetch resume text, skip if blank or on any
//!    fetch/embed failure, embed, cosine-score against the reference
//! 3. stable sort by score descending (ties keep input order), keep the top K

use serde::Serialize;
use tracing::{info, warn};

use crate::embedding::{cosine_similarity, Embedder, EmbeddingError};
use crate::models::applicant::RawApplicant;
use crate::resume::ResumeSource;

/// Maximum number of applicants retained per listing.
pub const TOP_K: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ScoredApplicant {
    pub applicant: RawApplicant,
    #[serde(skip_serializing)]
    pub resume_text: String,
    #[serde(skip_serializing)]
    pub vector: Vec<f32>,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct RankedListing {
    pub reference_vector: Vec<f32>,
    pub applicants: Vec<ScoredApplicant>,
}

pub fn reference_text(name: &str, description: &str) -> String {
    format!("{} {}", name.trim(), description.trim())
}

/// Embeds the listing, then ranks the applicants against it.
/// Only a failure to embed the listing itself is fatal.
pub async fn score_listing(
    name: &str,
    description: &str,
    applicants: &[RawApplicant],
    embedder: &dyn Embedder,
    resumes: &dyn ResumeSource,
) -> Result<RankedListing, EmbeddingError> {
    let reference_vector = embedder.embed(&reference_text(name, description)).await?;
    let applicants = rank_applicants(&reference_vector, applicants, embedder, resumes).await;
    Ok(RankedListing {
        reference_vector,
        applicants,
    })
}

pub async fn rank_applicants(
    reference_vector: &[f32],
    applicants: &[RawApplicant],
    embedder: &dyn Embedder,
    resumes: &dyn ResumeSource,
) -> Vec<ScoredApplicant> {
    let mut scored = Vec::with_capacity(applicants.len());

    for applicant in applicants {
        let resume_text = match resumes.fetch_text(&applicant.resume_link).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(
                    "Skipping applicant {}: resume fetch failed: {e}",
                    applicant.email
                );
                continue;
            }
        };
        if resume_text.is_empty() {
            warn!("Skipping applicant {}: resume text is empty", applicant.email);
            continue;
        }

        let vector = match embedder.embed(&resume_text).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Skipping applicant {}: embedding failed: {e}", applicant.email);
                continue;
            }
        };

        let score = cosine_similarity(reference_vector, &vector);
        scored.push(ScoredApplicant {
            applicant: applicant.clone(),
            resume_text,
            vector,
            score,
        });
    }

    let considered = scored.len();
    let ranked = top_k(scored, TOP_K);
    info!(
        "Scored {considered} of {} applicants, kept {}",
        applicants.len(),
        ranked.len()
    );
    ranked
}

/// Stable descending sort by score, truncated to `k`.
pub fn top_k(mut scored: Vec<ScoredApplicant>, k: usize) -> Vec<ScoredApplicant> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}
