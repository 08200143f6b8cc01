use async_trait::async_trait;
use axum::body::Bytes;
use mime::Mime;
use thiserror::Error;
use tracing::debug;

use crate::models::ImageUpload;

/// Image constraints checked before any network call.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/gif"];
pub const MAX_IMAGE_SIZE_MB: u64 = 5;
pub const MAX_IMAGE_SIZE_BYTES: u64 = MAX_IMAGE_SIZE_MB * 1024 * 1024;

pub fn is_allowed_image_type(mime: &Mime) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&mime.essence_str())
}

#[derive(Debug, Error)]
pub enum ImageStorageError {
    #[error("image host request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected { message: String },

    #[error("image host response did not contain a URL")]
    MissingUrl,
}

/// Where uploaded image bytes go. The production implementation talks to the
/// external image host; tests substitute an in-process recorder.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        mime: &Mime,
    ) -> Result<ImageUpload, ImageStorageError>;
}

/// Client for the hosted image service: a single multipart endpoint taking
/// the file plus an upload preset and a target folder, answering with a
/// secure HTTPS URL. Endpoint and preset come from configuration.
#[derive(Clone)]
pub struct ImageHostClient {
    http: reqwest::Client,
    endpoint: String,
    upload_preset: String,
    folder: String,
}

impl ImageHostClient {
    pub fn new(endpoint: String, upload_preset: String, folder: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            upload_preset,
            folder,
        }
    }
}

#[async_trait]
impl ImageStorage for ImageHostClient {
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        mime: &Mime,
    ) -> Result<ImageUpload, ImageStorageError> {
        let size = bytes.len() as u64;
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime.as_ref())?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone());

        debug!(filename, size, "uploading image to host");
        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .unwrap_or("Upload failed")
                .to_string();
            return Err(ImageStorageError::Rejected { message });
        }

        let url = body
            .get("secure_url")
            .and_then(|v| v.as_str())
            .ok_or(ImageStorageError::MissingUrl)?;

        Ok(ImageUpload {
            url: url.to_string(),
            name: filename.to_string(),
            size,
            mime: mime.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_covers_exactly_the_four_formats() {
        for allowed in ["image/jpeg", "image/png", "image/webp", "image/gif"] {
            let mime: Mime = allowed.parse().unwrap();
            assert!(is_allowed_image_type(&mime), "{allowed} should be allowed");
        }
        for rejected in ["image/svg+xml", "application/pdf", "text/html", "image/bmp"] {
            let mime: Mime = rejected.parse().unwrap();
            assert!(!is_allowed_image_type(&mime), "{rejected} should be rejected");
        }
    }

    #[test]
    fn mime_parameters_do_not_bypass_the_allowlist() {
        let mime: Mime = "image/png; charset=utf-8".parse().unwrap();
        assert!(is_allowed_image_type(&mime));
    }

    #[test]
    fn size_limit_is_five_megabytes() {
        assert_eq!(MAX_IMAGE_SIZE_BYTES, 5 * 1024 * 1024);
    }
}
