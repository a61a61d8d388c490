//! In-memory asset store for tests and local runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AssetUploader, ImagePayload, UploadError, UploadOptions, UploadedAsset};

#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetUploader {
    assets: Arc<RwLock<Vec<(String, ImagePayload)>>>,
    failure: Arc<RwLock<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryAssetUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent upload fail as a rejected request.
    pub async fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.write().await = Some(reason.into());
    }

    /// Upload attempts so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn get(&self, url: &str) -> Option<ImagePayload> {
        self.assets
            .read()
            .await
            .iter()
            .find(|(stored, _)| stored == url)
            .map(|(_, payload)| payload.clone())
    }
}

#[async_trait]
impl AssetUploader for InMemoryAssetUploader {
    async fn upload(
        &self,
        image: ImagePayload,
        options: &UploadOptions,
    ) -> Result<UploadedAsset, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.failure.read().await.as_ref() {
            return Err(UploadError::Rejected {
                status: 500,
                message: reason.clone(),
            });
        }

        let mut assets = self.assets.write().await;
        let public_id = format!("{}/{}", options.category, assets.len() + 1);
        let url = format!("memory://{public_id}");
        assets.push((url.clone(), image));

        Ok(UploadedAsset { url, public_id })
    }
}
