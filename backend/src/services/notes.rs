//! Notes service
//!
//! Runs a single "save note" request end to end:
//! resolve the target note, merge the incoming fields, ingest uploaded
//! documents and the optional background image, then persist everything
//! in one transaction through [`NoteRepository::save`].

use super::AttachmentsService;
use crate::database::{NoteDetail, NoteRepository, SaveNoteRequest};
use crate::error::{AppError, Result};

/// Steps of a note edit, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStage {
    Resolve,
    MergeFields,
    IngestDocuments,
    IngestBackground,
    Persist,
}

/// Service for creating and updating notes
#[derive(Clone)]
pub struct NotesService {
    repo: NoteRepository,
    attachments: AttachmentsService,
}

impl NotesService {
    pub fn new(repo: NoteRepository, attachments: AttachmentsService) -> Self {
        Self { repo, attachments }
    }

    /// Create or update a note.
    ///
    /// The submitted documents replace the note's current ones. The background
    /// image is only replaced when one is submitted. Errors are returned as
    /// produced; on failure nothing is written.
    pub async fn save_note(&self, request: SaveNoteRequest) -> Result<NoteDetail> {
        let SaveNoteRequest {
            id,
            owner_id,
            fields,
            documents,
            background,
        } = request;

        tracing::debug!(stage = ?EditStage::Resolve, "Saving note {:?}", id);
        let mut draft = self
            .repo
            .resolve_or_create(id.as_deref())
            .await
            .map_err(|e| failed(EditStage::Resolve, e))?;

        tracing::debug!(stage = ?EditStage::MergeFields);
        if owner_id <= 0 {
            return Err(failed(
                EditStage::MergeFields,
                AppError::InvalidInput(format!("Invalid user ID: {}", owner_id)),
            ));
        }
        draft.fields.owner_id = owner_id;
        fields.apply(&mut draft.fields);

        tracing::debug!(stage = ?EditStage::IngestDocuments, count = documents.len());
        let documents: Vec<_> = documents
            .into_iter()
            .map(|upload| self.attachments.ingest(owner_id, upload))
            .collect();

        if let Some(upload) = background {
            tracing::debug!(stage = ?EditStage::IngestBackground);
            draft.stage_background(self.attachments.ingest(owner_id, upload));
        }

        tracing::debug!(stage = ?EditStage::Persist);
        let is_new = draft.is_new();
        let saved = self
            .repo
            .save(draft, documents)
            .await
            .map_err(|e| failed(EditStage::Persist, e))?;

        tracing::info!(
            "Note '{}' {} ({}, {} documents)",
            saved.note.fields.title,
            if is_new { "created" } else { "updated" },
            saved.note.id,
            saved.documents.len()
        );

        Ok(saved)
    }
}

fn failed(stage: EditStage, error: AppError) -> AppError {
    tracing::warn!(?stage, "Note edit failed: {}", error);
    error
}
