//! Rendered document records and their expiry.

use crate::storage::BlobStore;
use crate::store::DocumentStore;
use crate::types::ArtifactKind;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// How long a rendered document stays listed before cleanup may remove it.
pub const DOCUMENT_TTL_DAYS: i64 = 30;

/// A rendered document owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    #[serde(skip)]
    pub storage_key: String,
    pub kind: ArtifactKind,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ArtifactDocument {
    pub fn new(
        user_id: Uuid,
        kind: ArtifactKind,
        title: impl Into<String>,
        storage_key: impl Into<String>,
        url: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            url: url.into(),
            storage_key: storage_key.into(),
            kind,
            title: title.into(),
            created_at: now,
            expires_at: now + Duration::days(DOCUMENT_TTL_DAYS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Result of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CleanupReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Remove `user_id`'s expired documents, blob first and then the record.
///
/// Failures are logged and counted; one bad document does not stop the rest.
/// A record whose blob could not be deleted is kept so a later pass can retry.
pub async fn cleanup_expired(
    documents: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<CleanupReport, crate::store::StoreError> {
    let expired = documents.expired_documents(user_id, now).await?;
    let mut report = CleanupReport::default();

    for document in expired {
        if let Err(e) = blobs.delete(&document.storage_key).await {
            tracing::warn!(
                document_id = %document.id,
                key = %document.storage_key,
                error = %e,
                "Failed to delete expired document blob"
            );
            report.failed += 1;
            continue;
        }
        match documents.delete_document(document.id).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                tracing::warn!(document_id = %document.id, error = %e, "Failed to delete expired document record");
                report.failed += 1;
            }
        }
    }

    tracing::info!(%user_id, deleted = report.deleted, failed = report.failed, "Cleaned up expired documents");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use crate::store::MemoryStore;

    async fn seed(
        store: &MemoryStore,
        blobs: &MemoryBlobStore,
        user: Uuid,
        key: &str,
        created: DateTime<Utc>,
    ) -> ArtifactDocument {
        let url = blobs
            .put(key, b"%PDF".to_vec(), "application/pdf")
            .await
            .unwrap();
        let doc = ArtifactDocument::new(user, ArtifactKind::MealPlan, "Week", key, url, created);
        store.record_document(&doc).await.unwrap();
        doc
    }

    #[test]
    fn test_expires_after_thirty_days() {
        let now = Utc::now();
        let doc = ArtifactDocument::new(Uuid::new_v4(), ArtifactKind::Recipe, "Soup", "k", "u", now);
        assert_eq!(doc.expires_at - doc.created_at, Duration::days(30));
        assert!(!doc.is_expired(now + Duration::days(30)));
        assert!(doc.is_expired(now + Duration::days(30) + Duration::seconds(1)));
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::default();
        let user = Uuid::new_v4();
        let now = Utc::now();

        seed(&store, &blobs, user, "meal-plans/u/old.pdf", now - Duration::days(40)).await;
        let fresh = seed(&store, &blobs, user, "meal-plans/u/new.pdf", now - Duration::days(2)).await;

        let report = cleanup_expired(&store, &blobs, user, now).await.unwrap();
        assert_eq!(report, CleanupReport { deleted: 1, failed: 0 });
        assert_eq!(blobs.keys(), vec!["meal-plans/u/new.pdf".to_string()]);
        assert_eq!(store.list_documents(user).await.unwrap(), vec![fresh]);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_record_when_blob_delete_fails() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::default();
        let user = Uuid::new_v4();
        let now = Utc::now();

        seed(&store, &blobs, user, "meal-plans/u/a.pdf", now - Duration::days(40)).await;
        blobs.set_fail_deletes(true);

        let report = cleanup_expired(&store, &blobs, user, now).await.unwrap();
        assert_eq!(report, CleanupReport { deleted: 0, failed: 1 });
        assert_eq!(store.list_documents(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_ignores_other_users() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::default();
        let now = Utc::now();
        let other = Uuid::new_v4();

        seed(&store, &blobs, other, "meal-plans/o/a.pdf", now - Duration::days(40)).await;

        let report = cleanup_expired(&store, &blobs, Uuid::new_v4(), now).await.unwrap();
        assert_eq!(report, CleanupReport::default());
        assert_eq!(blobs.len(), 1);
    }
}
