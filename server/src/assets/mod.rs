//! Asset store port and its adapters.
//!
//! Event records never carry image bytes; they hold the URL an
//! [`AssetUploader`] hands back after a completed upload.

use async_trait::async_trait;
use thiserror::Error;

pub mod cloudinary;
pub mod memory;

pub use cloudinary::CloudinaryUploader;
pub use memory::InMemoryAssetUploader;

/// A fully buffered image taken from the request body.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl ImagePayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Logical destination, e.g. a Cloudinary folder.
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("asset store rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("asset store unreachable: {0}")]
    Transport(String),

    #[error("unexpected asset store response: {0}")]
    InvalidResponse(String),
}

/// Sends a complete payload to the asset store in a single exchange.
///
/// Either a reference is returned or the upload failed as a whole. Callers
/// must not persist a record pointing at an image unless this returned `Ok`.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(
        &self,
        image: ImagePayload,
        options: &UploadOptions,
    ) -> Result<UploadedAsset, UploadError>;
}
