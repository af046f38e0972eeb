//! Attachments service
//!
//! Turns uploads into attachment records and serves stored attachments
//! back by id or by note and name.

use super::content_type;
use crate::config::{MAX_FILENAME_LENGTH, UNTITLED_FILENAME};
use crate::database::{Attachment, AttachmentStore, NewAttachment, Upload};
use crate::error::Result;
use sha2::{Digest, Sha256};

/// Service for managing attachments
#[derive(Clone)]
pub struct AttachmentsService {
    store: AttachmentStore,
}

impl AttachmentsService {
    pub fn new(store: AttachmentStore) -> Self {
        Self { store }
    }

    /// Prepare an upload for storage: clean the name, resolve the type, hash the payload
    pub fn ingest(&self, owner_id: i64, upload: Upload) -> NewAttachment {
        let Upload {
            filename,
            declared_type,
            data,
        } = upload;

        let name = sanitize_filename(&filename);
        let mime_type = content_type::resolve(&name, declared_type.as_deref(), &data);
        let blob_hash = calculate_hash(&data);

        tracing::debug!(
            "Ingested upload {} as {} ({} bytes)",
            name,
            mime_type,
            data.len()
        );

        NewAttachment {
            owner_id,
            name,
            mime_type: Some(mime_type),
            blob_hash,
            data,
        }
    }

    pub async fn get_attachment(&self, id: i64) -> Result<Attachment> {
        self.store.fetch_by_id(id).await
    }

    /// A note's document by file name
    pub async fn get_note_attachment(&self, note_id: i64, name: &str) -> Result<Attachment> {
        self.store.fetch_by_parent_and_name(note_id, name).await
    }

    pub async fn list_attachments(&self, note_id: i64) -> Result<Vec<Attachment>> {
        self.store.list_by_parent(note_id).await
    }

    pub async fn delete_attachment(&self, id: i64) -> Result<()> {
        tracing::info!("Deleting attachment: {}", id);
        self.store.delete_by_id(id).await
    }
}

/// Sanitize filename to prevent path traversal attacks
fn sanitize_filename(filename: &str) -> String {
    let name: String = filename
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && *c != '\0')
        .take(MAX_FILENAME_LENGTH)
        .collect();

    if name.trim().is_empty() {
        UNTITLED_FILENAME.to_string()
    } else {
        name
    }
}

/// Calculate SHA-256 hash of data
fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, AttachmentKind};

    async fn create_test_service() -> (AttachmentsService, AttachmentStore, i64) {
        let pool = create_memory_pool().await.unwrap();

        let note_id = sqlx::query(
            "INSERT INTO notes (owner_id, created_at, updated_at) VALUES (3, 'now', 'now')",
        )
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        let store = AttachmentStore::new(pool);
        (AttachmentsService::new(store.clone()), store, note_id)
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("normal.txt"), "normal.txt");
        assert_eq!(sanitize_filename("../../../etc/passwd"), "......etcpasswd");
        assert_eq!(sanitize_filename("file\\name.txt"), "filename.txt");
        assert_eq!(sanitize_filename("//"), "untitled");
        assert_eq!(sanitize_filename(&"a".repeat(300)).len(), 255);
    }

    #[tokio::test]
    async fn test_ingest_infers_pdf_from_extension() {
        let (service, _store, _note_id) = create_test_service().await;

        let attachment = service.ingest(3, Upload::new("report.pdf", b"body".to_vec()));

        assert_eq!(attachment.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(attachment.owner_id, 3);
        assert_eq!(attachment.blob_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_ingest_keeps_declared_type() {
        let (service, _store, _note_id) = create_test_service().await;

        let attachment =
            service.ingest(3, Upload::new("report.pdf", b"body".to_vec()).with_type("text/plain"));

        assert_eq!(attachment.mime_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_ingested_upload_round_trips() {
        let (service, store, note_id) = create_test_service().await;

        let ingested = service.ingest(3, Upload::new("todo.md", b"- milk".to_vec()));
        let id = store
            .create(note_id, AttachmentKind::Content, &ingested)
            .await
            .unwrap();

        let by_id = service.get_attachment(id).await.unwrap();
        assert_eq!(by_id.content_type(), "text/markdown; charset=utf-8");
        assert_eq!(by_id.blob_hash, ingested.blob_hash);

        let by_name = service.get_note_attachment(note_id, "todo.md").await.unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(service.list_attachments(note_id).await.unwrap().len(), 1);

        service.delete_attachment(id).await.unwrap();
        assert!(service.get_attachment(id).await.unwrap_err().is_not_found());
    }
}
