//! Database models
//!
//! Rust structs representing stored records, edit inputs and query results.
//! All models use serde so the HTTP layer can render them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The mutable part of a note, shared by stored notes and drafts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NoteFields {
    pub owner_id: i64,
    pub title: String,
    pub content: String,
    pub tag: String,
    pub mood: String,
    pub fg_color: String,
    pub bg_color: String,
    /// Opaque value, stored and returned verbatim. Nothing in this crate checks it.
    pub password: String,
    pub reminder_at: Option<DateTime<Utc>>,
}

/// A persisted note
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: NoteFields,
    /// Attachment holding the background image, if any
    pub background_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note together with the ids of its content attachments, in insertion order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: Note,
    pub documents: Vec<i64>,
}

/// A note being edited, not yet written back.
///
/// `id` is `None` until the first save. A background image staged here
/// replaces the stored one when the draft is saved; leaving it unset keeps
/// the current background.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub id: Option<i64>,
    pub fields: NoteFields,
    pub background_id: Option<i64>,
    pub staged_background: Option<NewAttachment>,
}

impl NoteDraft {
    pub fn stage_background(&mut self, attachment: NewAttachment) {
        self.staged_background = Some(attachment);
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl From<Note> for NoteDraft {
    fn from(note: Note) -> Self {
        Self {
            id: Some(note.id),
            fields: note.fields,
            background_id: note.background_id,
            staged_background: None,
        }
    }
}

/// Partial field set carried by an edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tag: Option<String>,
    pub mood: Option<String>,
    pub fg_color: Option<String>,
    pub bg_color: Option<String>,
    pub password: Option<String>,
    /// `Some(None)` clears the reminder
    #[serde(default)]
    pub reminder_at: Option<Option<DateTime<Utc>>>,
}

impl NoteInput {
    pub fn apply(self, fields: &mut NoteFields) {
        let Self {
            title,
            content,
            tag,
            mood,
            fg_color,
            bg_color,
            password,
            reminder_at,
        } = self;

        if let Some(title) = title {
            fields.title = title;
        }
        if let Some(content) = content {
            fields.content = content;
        }
        if let Some(tag) = tag {
            fields.tag = tag;
        }
        if let Some(mood) = mood {
            fields.mood = mood;
        }
        if let Some(fg_color) = fg_color {
            fields.fg_color = fg_color;
        }
        if let Some(bg_color) = bg_color {
            fields.bg_color = bg_color;
        }
        if let Some(password) = password {
            fields.password = password;
        }
        if let Some(reminder_at) = reminder_at {
            fields.reminder_at = reminder_at;
        }
    }
}

/// A file received with an edit, before ingestion
#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    pub filename: String,
    /// Content type declared by the transport, if any
    pub declared_type: Option<String>,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            declared_type: None,
            data: data.into(),
        }
    }

    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }
}

/// Create or update a note, replacing its documents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveNoteRequest {
    /// Raw id from the client. Absent or empty creates a new note.
    pub id: Option<String>,
    pub owner_id: i64,
    #[serde(default)]
    pub fields: NoteInput,
    /// Full replacement for the note's content attachments
    #[serde(default)]
    pub documents: Vec<Upload>,
    /// New background image. Absent keeps the current one.
    pub background: Option<Upload>,
}

/// What an attachment is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// One of the note's documents
    Content,
    /// The note's background image
    Background,
}

/// A stored attachment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    pub id: i64,
    pub owner_id: i64,
    pub note_id: i64,
    pub kind: AttachmentKind,
    pub name: String,
    /// `None` when the type was never determined
    pub mime_type: Option<String>,
    /// SHA-256 of `data`, hex encoded
    pub blob_hash: String,
    pub size: i64,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachment {
    /// MIME type to serve the payload with
    pub fn content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .unwrap_or(crate::config::FALLBACK_CONTENT_TYPE)
    }
}

/// An ingested upload ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub owner_id: i64,
    pub name: String,
    pub mime_type: Option<String>,
    pub blob_hash: String,
    pub data: Vec<u8>,
}

/// One page of a filtered note listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotePage {
    pub page: i64,
    pub size: i64,
    /// Matching notes before pagination
    pub total: i64,
    pub notes: Vec<Note>,
}

/// Notes created on one weekday of the reporting window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCount {
    pub weekday: String,
    pub count: i64,
}

/// Notes sharing one mood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MoodCount {
    pub mood: String,
    pub count: i64,
}
