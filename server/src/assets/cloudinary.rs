use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{AssetUploader, ImagePayload, UploadError, UploadOptions, UploadedAsset};
use crate::config::AssetStoreConfig;

const DEFAULT_FILE_NAME: &str = "upload";

#[derive(Deserialize)]
struct UploadBody {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signed uploads to Cloudinary's image upload API.
pub struct CloudinaryUploader {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: Secret<String>,
}

impl CloudinaryUploader {
    pub fn new(config: &AssetStoreConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            upload_url: upload_url(&config.api_base, &config.cloud_name),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }
}

fn upload_url(api_base: &str, cloud_name: &str) -> String {
    format!("{}/{}/image/upload", api_base.trim_end_matches('/'), cloud_name)
}

/// Cloudinary request signature: the signed params sorted by name, joined as
/// `k=v` pairs with `&`, suffixed with the API secret, then SHA-256 hex.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha256::digest(format!("{joined}{api_secret}").as_bytes());
    format!("{digest:x}")
}

#[async_trait]
impl AssetUploader for CloudinaryUploader {
    async fn upload(
        &self,
        image: ImagePayload,
        options: &UploadOptions,
    ) -> Result<UploadedAsset, UploadError> {
        let size = image.len();
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", options.category.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            self.api_secret.expose_secret(),
        );

        let mut file = Part::bytes(image.bytes)
            .file_name(image.file_name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()));
        if let Some(content_type) = image.content_type.as_deref() {
            file = file
                .mime_str(content_type)
                .map_err(|e| UploadError::Transport(e.to_string()))?;
        }

        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", options.category.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature)
            .part("file", file);

        debug!(bytes = size, folder = %options.category, "Uploading image to Cloudinary");

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadBody = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;

        info!(public_id = %body.public_id, bytes = size, "Image uploaded");

        Ok(UploadedAsset {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }
}
