use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::calls::twilio::Telephony;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::llm_client::LlmClient;
use crate::resume::ResumeSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub config: Config,
    /// Pluggable embedder. Default: `EmbeddingClient` against the configured API.
    pub embedder: Arc<dyn Embedder>,
    /// Pluggable resume source. Default: `PdfResumeFetcher`.
    pub resumes: Arc<dyn ResumeSource>,
    /// Pluggable call provider. Default: `TwilioClient`.
    pub telephony: Arc<dyn Telephony>,
}
