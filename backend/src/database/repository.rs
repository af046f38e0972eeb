//! Note repository
//!
//! CRUD over notes and their attachment links. `save` and `delete` each
//! run in one transaction: a `?` return drops the transaction, which rolls
//! it back, so callers never see a partially applied write.

use super::attachments::{content_ids, AttachmentStore};
use super::models::*;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

/// Repository for note records
#[derive(Clone)]
pub struct NoteRepository {
    pool: SqlitePool,
    attachments: AttachmentStore,
}

/// Parse a client supplied note id. Ids are positive integers.
pub fn parse_note_id(raw: &str) -> Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidInput(format!("Invalid note ID: {:?}", raw))),
    }
}

impl NoteRepository {
    pub fn new(pool: SqlitePool, attachments: AttachmentStore) -> Self {
        Self { pool, attachments }
    }

    /// Load the note named by `id`, or start a fresh draft when no id is given
    pub async fn resolve_or_create(&self, id: Option<&str>) -> Result<NoteDraft> {
        match id.filter(|raw| !raw.trim().is_empty()) {
            None => Ok(NoteDraft::default()),
            Some(raw) => {
                let id = parse_note_id(raw)?;
                Ok(self.get(id).await?.into())
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<Note> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NoteNotFound(id))
    }

    /// Persist `draft` and make `documents` its complete set of content attachments.
    ///
    /// A background image staged on the draft replaces the stored one; without
    /// one the current background is kept.
    pub async fn save(&self, mut draft: NoteDraft, documents: Vec<NewAttachment>) -> Result<NoteDetail> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let fields = &draft.fields;

        let note_id = match draft.id {
            Some(id) => {
                let rows = sqlx::query(
                    r#"
                    UPDATE notes
                    SET owner_id = ?, title = ?, content = ?, tag = ?, mood = ?,
                        fg_color = ?, bg_color = ?, password = ?, reminder_at = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(fields.owner_id)
                .bind(&fields.title)
                .bind(&fields.content)
                .bind(&fields.tag)
                .bind(&fields.mood)
                .bind(&fields.fg_color)
                .bind(&fields.bg_color)
                .bind(&fields.password)
                .bind(fields.reminder_at)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if rows == 0 {
                    return Err(AppError::NoteNotFound(id));
                }
                id
            }
            None => sqlx::query_scalar(
                r#"
                INSERT INTO notes (owner_id, title, content, tag, mood, fg_color, bg_color,
                                   password, reminder_at, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(fields.owner_id)
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.tag)
            .bind(&fields.mood)
            .bind(&fields.fg_color)
            .bind(&fields.bg_color)
            .bind(&fields.password)
            .bind(fields.reminder_at)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?,
        };

        let documents = self
            .attachments
            .replace_content_attachments(&mut tx, note_id, &documents)
            .await?;

        if let Some(background) = draft.staged_background.take() {
            self.attachments
                .replace_background_image(&mut tx, note_id, &background)
                .await?;
        }

        let note = fetch_note(&mut tx, note_id).await?;
        tx.commit().await?;

        tracing::debug!(
            "Saved note {} with {} documents (background: {:?})",
            note_id,
            documents.len(),
            note.background_id
        );

        Ok(NoteDetail { note, documents })
    }

    /// Delete a note with all of its attachments, background image included
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query("UPDATE notes SET background_id = NULL WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NoteNotFound(id));
        }

        let attachments = self.attachments.delete_by_parent(&mut tx, id).await?;

        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Deleted note {} and {} attachments", id, attachments);
        Ok(())
    }

    /// The note and its content attachment ids, read from one snapshot
    pub async fn fetch_with_attachments(&self, id: i64) -> Result<NoteDetail> {
        // Both reads share a read transaction so a concurrent save is seen whole or not at all
        let mut tx = self.pool.begin().await?;
        let note = fetch_note(&mut tx, id).await?;
        let documents = content_ids(&mut tx, id).await?;
        tx.commit().await?;

        Ok(NoteDetail { note, documents })
    }
}

async fn fetch_note(conn: &mut SqliteConnection, id: i64) -> Result<Note> {
    sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NoteNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    async fn create_test_repo() -> (NoteRepository, AttachmentStore, SqlitePool) {
        let pool = create_memory_pool().await.unwrap();
        let store = AttachmentStore::new(pool.clone());
        (NoteRepository::new(pool.clone(), store.clone()), store, pool)
    }

    fn document(name: &str, data: &[u8]) -> NewAttachment {
        NewAttachment {
            owner_id: 1,
            name: name.to_string(),
            mime_type: Some("text/plain".to_string()),
            blob_hash: String::new(),
            data: data.to_vec(),
        }
    }

    fn draft(title: &str) -> NoteDraft {
        NoteDraft {
            fields: NoteFields {
                owner_id: 1,
                title: title.to_string(),
                mood: "happy".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_note_id() {
        assert_eq!(parse_note_id("42").unwrap(), 42);
        assert_eq!(parse_note_id(" 7 ").unwrap(), 7);
        assert!(matches!(parse_note_id("abc"), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_note_id("-3"), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_note_id("0"), Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_resolve_without_id_is_fresh() {
        let (repo, _store, _pool) = create_test_repo().await;

        assert!(repo.resolve_or_create(None).await.unwrap().is_new());
        assert!(repo.resolve_or_create(Some("")).await.unwrap().is_new());
    }

    #[tokio::test]
    async fn test_resolve_errors() {
        let (repo, _store, _pool) = create_test_repo().await;

        let missing = repo.resolve_or_create(Some("99")).await.unwrap_err();
        assert!(matches!(missing, AppError::NoteNotFound(99)));

        let malformed = repo.resolve_or_create(Some("nine")).await.unwrap_err();
        assert!(matches!(malformed, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_insert_then_update_keeps_created_at() {
        let (repo, _store, _pool) = create_test_repo().await;

        let created = repo.save(draft("First"), Vec::new()).await.unwrap();
        let id = created.note.id;

        let mut edit = repo.resolve_or_create(Some(&id.to_string())).await.unwrap();
        edit.fields.title = "Second".to_string();
        let updated = repo.save(edit, Vec::new()).await.unwrap();

        assert_eq!(updated.note.id, id);
        assert_eq!(updated.note.fields.title, "Second");
        assert_eq!(updated.note.created_at, created.note.created_at);
        assert!(updated.note.updated_at >= created.note.updated_at);
    }

    #[tokio::test]
    async fn test_save_replaces_documents() {
        let (repo, store, _pool) = create_test_repo().await;

        let first = repo
            .save(draft("Docs"), vec![document("a.txt", b"a"), document("b.txt", b"b")])
            .await
            .unwrap();
        assert_eq!(first.documents.len(), 2);

        let edit: NoteDraft = repo.get(first.note.id).await.unwrap().into();
        let second = repo.save(edit, vec![document("c.txt", b"c")]).await.unwrap();

        let fetched = repo.fetch_with_attachments(first.note.id).await.unwrap();
        assert_eq!(fetched.documents, second.documents);
        for old in first.documents {
            assert!(store.fetch_by_id(old).await.unwrap_err().is_not_found());
        }
    }

    #[tokio::test]
    async fn test_background_is_sticky_unless_staged() {
        let (repo, store, _pool) = create_test_repo().await;

        let mut new = draft("Wallpaper");
        new.stage_background(document("bg.png", b"one"));
        let saved = repo.save(new, Vec::new()).await.unwrap();
        let original = saved.note.background_id.unwrap();

        let edit: NoteDraft = repo.get(saved.note.id).await.unwrap().into();
        let kept = repo.save(edit, Vec::new()).await.unwrap();
        assert_eq!(kept.note.background_id, Some(original));

        let mut edit: NoteDraft = repo.get(saved.note.id).await.unwrap().into();
        edit.stage_background(document("bg2.png", b"two"));
        let replaced = repo.save(edit, Vec::new()).await.unwrap();
        let current = replaced.note.background_id.unwrap();

        assert_ne!(current, original);
        assert!(store.fetch_by_id(original).await.unwrap_err().is_not_found());
        assert_eq!(store.fetch_by_id(current).await.unwrap().data, b"two");
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let (repo, store, pool) = create_test_repo().await;

        let saved = repo
            .save(draft("Stable"), vec![document("keep.txt", b"keep")])
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TRIGGER reject_explode BEFORE INSERT ON attachments
            WHEN NEW.name = 'explode.bin'
            BEGIN
                SELECT RAISE(ABORT, 'rejected');
            END
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let mut edit: NoteDraft = repo.get(saved.note.id).await.unwrap().into();
        edit.fields.title = "Changed".to_string();
        let result = repo
            .save(edit, vec![document("fine.txt", b"ok"), document("explode.bin", b"x")])
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let after = repo.fetch_with_attachments(saved.note.id).await.unwrap();
        assert_eq!(after.note.fields.title, "Stable");
        assert_eq!(after.documents, saved.documents);
        assert_eq!(store.fetch_by_id(saved.documents[0]).await.unwrap().data, b"keep");
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_no_note() {
        let (repo, _store, pool) = create_test_repo().await;

        sqlx::query(
            r#"
            CREATE TRIGGER reject_explode BEFORE INSERT ON attachments
            WHEN NEW.name = 'explode.bin'
            BEGIN
                SELECT RAISE(ABORT, 'rejected');
            END
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = repo.save(draft("Doomed"), vec![document("explode.bin", b"x")]).await;
        assert!(result.is_err());

        let notes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(notes, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_note_and_attachments() {
        let (repo, store, _pool) = create_test_repo().await;

        let mut new = draft("Doomed");
        new.stage_background(document("bg.png", b"bg"));
        let saved = repo
            .save(new, vec![document("a.txt", b"a"), document("b.txt", b"b")])
            .await
            .unwrap();
        let background = saved.note.background_id.unwrap();

        repo.delete(saved.note.id).await.unwrap();

        assert!(repo.get(saved.note.id).await.unwrap_err().is_not_found());
        for id in saved.documents {
            assert!(store.fetch_by_id(id).await.unwrap_err().is_not_found());
        }
        assert!(store.fetch_by_id(background).await.unwrap_err().is_not_found());

        let again = repo.delete(saved.note.id).await.unwrap_err();
        assert!(matches!(again, AppError::NoteNotFound(_)));
    }
}
