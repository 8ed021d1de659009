//! Media service: opaque photo references over a storage backend.
//!
//! The core forwards image blobs to the backend and keeps only the
//! `{url, stored_id}` pair. Forgetting a photo drops the reference;
//! backend deletion is best-effort, never a blocking guarantee.

use std::sync::Arc;

use fixdesk_common::{generate_storage_key, AppResult, StorageBackend};
use fixdesk_db::entities::complaint::PhotoRef;

/// Media service.
#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn StorageBackend>,
}

impl MediaService {
    /// Create a new media service over a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Store a photo blob and return its opaque reference.
    pub async fn store_photo(
        &self,
        owner_id: &str,
        original_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<PhotoRef> {
        let key = generate_storage_key(owner_id, original_name);
        let uploaded = self.storage.upload(&key, data, content_type).await?;

        tracing::debug!(owner = owner_id, key = %uploaded.stored_id, "Photo stored");
        Ok(PhotoRef {
            url: uploaded.url,
            stored_id: uploaded.stored_id,
        })
    }

    /// Forget a photo reference, deleting the backing object
    /// best-effort. A backend failure is logged, not surfaced: the
    /// reference is gone either way.
    pub async fn forget_photo(&self, photo: &PhotoRef) -> AppResult<()> {
        if let Err(e) = self.storage.delete(&photo.stored_id).await {
            tracing::warn!(key = %photo.stored_id, error = %e, "Photo deletion failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixdesk_common::{AppError, UploadedFile};
    use std::sync::Mutex;

    struct MockStorage {
        uploads: Mutex<Vec<String>>,
        fail_delete: bool,
    }

    impl MockStorage {
        fn new(fail_delete: bool) -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
                fail_delete,
            }
        }
    }

    #[async_trait::async_trait]
    impl StorageBackend for MockStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            self.uploads.lock().unwrap().push(key.to_string());
            Ok(UploadedFile {
                stored_id: key.to_string(),
                url: format!("/files/{key}"),
                size: data.len() as u64,
                content_type: content_type.to_string(),
            })
        }

        async fn delete(&self, _key: &str) -> AppResult<()> {
            if self.fail_delete {
                Err(AppError::ExternalService("storage down".to_string()))
            } else {
                Ok(())
            }
        }

        fn public_url(&self, key: &str) -> String {
            format!("/files/{key}")
        }

        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_store_photo_returns_reference() {
        let storage = Arc::new(MockStorage::new(false));
        let svc = MediaService::new(storage.clone());

        let photo = svc
            .store_photo("tech1", "proof.jpg", b"bytes", "image/jpeg")
            .await
            .unwrap();

        assert!(photo.url.starts_with("/files/"));
        assert!(photo.stored_id.ends_with(".jpg"));
        assert_eq!(storage.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_forget_photo_tolerates_backend_failure() {
        let svc = MediaService::new(Arc::new(MockStorage::new(true)));

        let photo = PhotoRef {
            url: "/files/x.jpg".to_string(),
            stored_id: "x.jpg".to_string(),
        };

        // Forgetting never fails the caller.
        svc.forget_photo(&photo).await.unwrap();
    }
}
