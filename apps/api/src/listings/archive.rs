use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};

pub fn archive_key(job_id: i64, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("uploads/{job_id}/{safe}")
}

/// Keeps a copy of the uploaded CSV in object storage.
/// Best effort: a storage failure is logged and does not fail the upload.
pub async fn archive_upload(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    job_id: i64,
    file_name: &str,
    data: Bytes,
) -> Option<String> {
    let key = archive_key(job_id, file_name);
    match s3
        .put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(data))
        .content_type("text/csv")
        .send()
        .await
    {
        Ok(_) => {
            info!("Archived upload to s3://{bucket}/{key}");
            Some(key)
        }
        Err(e) => {
            warn!("Failed to archive upload for listing {job_id}: {e}");
            None
        }
    }
}
