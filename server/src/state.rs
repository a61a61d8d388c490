use std::sync::Arc;

use crate::assets::{AssetUploader, UploadOptions};
use crate::storage::EventStore;

/// Capabilities shared by every request. Built once at startup and cloned
/// into each handler invocation.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub uploader: Arc<dyn AssetUploader>,
    pub upload_options: UploadOptions,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EventStore>,
        uploader: Arc<dyn AssetUploader>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            store,
            uploader,
            upload_options: UploadOptions {
                category: category.into(),
            },
        }
    }
}
