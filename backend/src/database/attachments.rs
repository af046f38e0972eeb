//! Attachment store
//!
//! CRUD over attachment records. The replace operations take a connection
//! so they run inside the caller's transaction; the rest use the pool.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Clone)]
pub struct AttachmentStore {
    pool: SqlitePool,
}

impl AttachmentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a single attachment under `note_id`
    pub async fn create(
        &self,
        note_id: i64,
        kind: AttachmentKind,
        attachment: &NewAttachment,
    ) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, note_id, kind, attachment).await
    }

    /// Swap the note's content attachments for `attachments`.
    ///
    /// Returns the new ids in submission order.
    pub async fn replace_content_attachments(
        &self,
        conn: &mut SqliteConnection,
        note_id: i64,
        attachments: &[NewAttachment],
    ) -> Result<Vec<i64>> {
        let removed = sqlx::query("DELETE FROM attachments WHERE note_id = ? AND kind = ?")
            .bind(note_id)
            .bind(AttachmentKind::Content)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        let mut ids = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            ids.push(insert(conn, note_id, AttachmentKind::Content, attachment).await?);
        }

        tracing::debug!(
            "Replaced content attachments for note {}: {} removed, {} added",
            note_id,
            removed,
            ids.len()
        );

        Ok(ids)
    }

    /// Store `attachment` as the note's background image and drop the previous one.
    pub async fn replace_background_image(
        &self,
        conn: &mut SqliteConnection,
        note_id: i64,
        attachment: &NewAttachment,
    ) -> Result<i64> {
        let previous: Option<i64> =
            sqlx::query_scalar("SELECT background_id FROM notes WHERE id = ?")
                .bind(note_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(AppError::NoteNotFound(note_id))?;

        let id = insert(conn, note_id, AttachmentKind::Background, attachment).await?;

        sqlx::query("UPDATE notes SET background_id = ? WHERE id = ?")
            .bind(id)
            .bind(note_id)
            .execute(&mut *conn)
            .await?;

        if let Some(previous) = previous {
            sqlx::query("DELETE FROM attachments WHERE id = ?")
                .bind(previous)
                .execute(&mut *conn)
                .await?;
        }

        tracing::debug!(
            "Replaced background image for note {}: {:?} -> {}",
            note_id,
            previous,
            id
        );

        Ok(id)
    }

    /// Delete every attachment owned by `note_id`, background included
    pub async fn delete_by_parent(&self, conn: &mut SqliteConnection, note_id: i64) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM attachments WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        tracing::debug!("Deleted {} attachments of note {}", rows, note_id);
        Ok(rows)
    }

    /// Delete one attachment
    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::AttachmentNotFound(id.to_string()));
        }

        tracing::debug!("Deleted attachment: {}", id);
        Ok(())
    }

    pub async fn fetch_by_id(&self, id: i64) -> Result<Attachment> {
        sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::AttachmentNotFound(id.to_string()))
    }

    /// Find a content attachment by exact name.
    ///
    /// Names are not unique; the earliest inserted match wins.
    pub async fn fetch_by_parent_and_name(&self, note_id: i64, name: &str) -> Result<Attachment> {
        sqlx::query_as::<_, Attachment>(
            r#"
            SELECT * FROM attachments
            WHERE note_id = ? AND kind = ? AND name = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(note_id)
        .bind(AttachmentKind::Content)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::AttachmentNotFound(format!("{} in note {}", name, note_id)))
    }

    /// Content attachments of a note, in insertion order
    pub async fn list_by_parent(&self, note_id: i64) -> Result<Vec<Attachment>> {
        let attachments = sqlx::query_as::<_, Attachment>(
            "SELECT * FROM attachments WHERE note_id = ? AND kind = ? ORDER BY id ASC",
        )
        .bind(note_id)
        .bind(AttachmentKind::Content)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }
}

/// Ids of a note's content attachments, in insertion order
pub(crate) async fn content_ids(conn: &mut SqliteConnection, note_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar("SELECT id FROM attachments WHERE note_id = ? AND kind = ? ORDER BY id ASC")
        .bind(note_id)
        .bind(AttachmentKind::Content)
        .fetch_all(&mut *conn)
        .await?;

    Ok(ids)
}

async fn insert(
    conn: &mut SqliteConnection,
    note_id: i64,
    kind: AttachmentKind,
    attachment: &NewAttachment,
) -> Result<i64> {
    let now = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO attachments (owner_id, note_id, kind, name, mime_type, blob_hash, size, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(attachment.owner_id)
    .bind(note_id)
    .bind(kind)
    .bind(&attachment.name)
    .bind(&attachment.mime_type)
    .bind(&attachment.blob_hash)
    .bind(attachment.data.len() as i64)
    .bind(&attachment.data)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    tracing::debug!("Created {:?} attachment {} for note {}", kind, id, note_id);
    Ok(id)
}
