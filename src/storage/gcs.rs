//! Cloud Storage sink.
//!
//! Objects are written with a single multipart request to the JSON API:
//! the first part carries the object metadata, the second the document.
//! Access tokens come from configuration or, on Google Cloud, from the
//! instance metadata server.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use super::Uploader;
use crate::error::{ExportError, Result};
use crate::utils::truncate_for_log;

const UPLOAD_ENDPOINT: &str = "https://storage.googleapis.com/upload/storage/v1/b";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const BOUNDARY: &str = "stats_export_boundary_7f3a";

/// Object metadata sent with the upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata<'a> {
    name: &'a str,
    content_type: &'a str,
    cache_control: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Uploads objects to one bucket.
#[derive(Debug, Clone)]
pub struct GcsUploader {
    client: reqwest::Client,
    bucket: String,
    access_token: Option<String>,
}

impl GcsUploader {
    pub fn new(bucket: String, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket,
            access_token,
        }
    }

    /// Multipart upload URL; the object is public-read.
    fn upload_url(&self) -> String {
        format!(
            "{UPLOAD_ENDPOINT}/{}/o?uploadType=multipart&predefinedAcl=publicRead",
            urlencoding::encode(&self.bucket)
        )
    }

    async fn token(&self) -> Result<String> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }
        debug!("Requesting access token from metadata server");
        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ExportError::Upload(format!("metadata server unreachable: {e}")))?
            .error_for_status()?;
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// `multipart/related` body with the metadata and the document.
fn multipart_body(key: &str, document: &str) -> Result<String> {
    let metadata = serde_json::to_string(&ObjectMetadata {
        name: key,
        content_type: "text/plain",
        cache_control: "no-cache",
    })
    .map_err(|e| ExportError::Upload(e.to_string()))?;

    Ok(format!(
        "--{BOUNDARY}\r\n\
         Content-Type: application/json; charset=UTF-8\r\n\r\n\
         {metadata}\r\n\
         --{BOUNDARY}\r\n\
         Content-Type: text/plain\r\n\r\n\
         {document}\r\n\
         --{BOUNDARY}--\r\n"
    ))
}

impl Uploader for GcsUploader {
    #[instrument(level = "info", skip_all, fields(bucket = %self.bucket, %key))]
    async fn upload(&self, key: &str, body: String) -> Result<()> {
        let t0 = Instant::now();
        let token = self.token().await?;
        let payload = multipart_body(key, &body)?;

        let response = self
            .client
            .post(self.upload_url())
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(%status, body = %truncate_for_log(&text, 300), "Upload rejected");
            return Err(ExportError::Upload(format!(
                "{status}: {}",
                truncate_for_log(&text, 300)
            )));
        }

        info!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Uploaded document"
        );
        Ok(())
    }
}
