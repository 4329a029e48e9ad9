//! PDF Extractor: fetches a resume by URL and pulls out plain text.

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid resume URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Resume fetch returned status {0}")]
    Status(u16),

    #[error("PDF parse error: {0}")]
    Pdf(String),
}

/// Source of resume text, keyed by the resume link from the CSV.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ExtractError>;
}

/// Downloads the PDF over HTTP and extracts its text with `pdf-extract`.
#[derive(Clone)]
pub struct PdfResumeFetcher {
    client: Client,
}

impl PdfResumeFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for PdfResumeFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResumeSource for PdfResumeFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ExtractError> {
        let url = parse_resume_url(url)?;
        debug!("Fetching resume: {url}");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        // pdf-extract is CPU-bound and synchronous
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| ExtractError::Pdf(e.to_string()))??;

        debug!("Extracted {} chars of resume text", text.len());
        Ok(text)
    }
}

fn parse_resume_url(raw: &str) -> Result<Url, ExtractError> {
    let url = Url::parse(raw.trim()).map_err(|e| ExtractError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ExtractError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{other}'"
        ))),
    }
}

pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resume_url_accepts_https() {
        let url = parse_resume_url(" https://example.com/cv/jane.pdf ").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_parse_resume_url_rejects_blank() {
        assert!(matches!(
            parse_resume_url(""),
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_parse_resume_url_rejects_file_scheme() {
        assert!(matches!(
            parse_resume_url("file:///etc/passwd"),
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_extract_rejects_non_pdf_bytes() {
        assert!(matches!(
            extract_pdf_text(b"definitely not a pdf"),
            Err(ExtractError::Pdf(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_text_invalid_url_is_error() {
        let fetcher = PdfResumeFetcher::new();
        let result = fetcher.fetch_text("not a url").await;
        assert!(matches!(result, Err(ExtractError::InvalidUrl(_))));
    }
}
