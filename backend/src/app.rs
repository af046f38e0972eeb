//! Application state and initialization
//!
//! Every component is built once here from a single shared pool and made
//! available through [`AppState`].

use crate::config::AppConfig;
use crate::database::{create_pool, AttachmentStore, NoteQueryEngine, NoteRepository};
use crate::error::Result;
use crate::services::{AttachmentsService, NotesService};
use sqlx::SqlitePool;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pool: SqlitePool,
    pub notes: NoteRepository,
    pub attachments: AttachmentStore,
    pub queries: NoteQueryEngine,
    pub notes_service: NotesService,
    pub attachments_service: AttachmentsService,
}

impl AppState {
    /// Open the database under the configured data directory and wire everything up
    pub async fn initialize(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", config.data_dir);

        std::fs::create_dir_all(&config.data_dir)?;
        let pool = create_pool(&config.database_path()).await?;

        let state = Self::from_pool(config, pool);
        tracing::info!("Application initialized successfully");

        Ok(state)
    }

    /// Wire components around an already migrated pool
    pub fn from_pool(config: AppConfig, pool: SqlitePool) -> Self {
        let attachments = AttachmentStore::new(pool.clone());
        let notes = NoteRepository::new(pool.clone(), attachments.clone());
        let queries = NoteQueryEngine::new(pool.clone());
        let attachments_service = AttachmentsService::new(attachments.clone());
        let notes_service = NotesService::new(notes.clone(), attachments_service.clone());

        Self {
            config,
            pool,
            notes,
            attachments,
            queries,
            notes_service,
            attachments_service,
        }
    }

    pub async fn shutdown(&self) {
        tracing::info!("Closing database pool");
        self.pool.close().await;
    }
}
