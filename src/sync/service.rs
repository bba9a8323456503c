use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::archive::{self, ArchiveError};
use crate::config::SyncSettings;
use crate::notebook::{extract, ExtractError, MetadataSource, NotebookContent};
use crate::processing::{
    CommandTextExtractor, ImageTranscoder, JpegTranscoder, ProcessingError, TextExtractor,
    DEFAULT_OCR_COMMAND,
};
use crate::remote::{flatten_notebooks, NotebookSource, NotebookSummary, RemoteError, ScribeClient};
use crate::render::{render_with, RenderOptions};
use crate::vault::{FsNoteStore, NoteStore, StoreError};

use super::paths::{normalize_folder, parent_folder, NotePathPlanner};
use super::scheduler::{self, SyncScheduler};
use super::status::{NotebookOutcome, NotebookResult, SyncPhase, SyncReport, SyncState, SyncStatus};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("A sync is already running")]
    AlreadyRunning,
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Remote error: {0}")]
    Remote(RemoteError),
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),
}

const SESSION_REJECTED: &str =
    "the session credential was rejected; sign in to the web reader and refresh your session credential";

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::AuthFailed => SyncError::Authentication(SESSION_REJECTED.to_string()),
            other => SyncError::Remote(other),
        }
    }
}

/// Result of a connection check
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub session_valid: bool,
    /// Notebooks visible to the session, when it is valid
    pub notebooks: usize,
}

struct Inner {
    settings: SyncSettings,
    source: Arc<dyn NotebookSource>,
    store: Arc<dyn NoteStore>,
    text_extractor: Option<Arc<dyn TextExtractor>>,
    transcoder: Option<Arc<dyn ImageTranscoder>>,
    running: AtomicBool,
    status: Mutex<SyncStatus>,
}

/// Pulls notebooks from a [`NotebookSource`] and writes them as Markdown
/// into a [`NoteStore`]. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncService {
    inner: Arc<Inner>,
}

/// Builder for [`SyncService`]
pub struct SyncServiceBuilder {
    settings: SyncSettings,
    source: Arc<dyn NotebookSource>,
    store: Arc<dyn NoteStore>,
    text_extractor: Option<Arc<dyn TextExtractor>>,
    transcoder: Option<Arc<dyn ImageTranscoder>>,
}

impl SyncServiceBuilder {
    pub fn text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.text_extractor = Some(extractor);
        self
    }

    pub fn transcoder(mut self, transcoder: Arc<dyn ImageTranscoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn build(self) -> SyncService {
        SyncService {
            inner: Arc::new(Inner {
                settings: self.settings,
                source: self.source,
                store: self.store,
                text_extractor: self.text_extractor,
                transcoder: self.transcoder,
                running: AtomicBool::new(false),
                status: Mutex::new(SyncStatus::default()),
            }),
        }
    }
}

/// Clears the in-flight flag when a pass ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncService {
    pub fn builder(
        settings: SyncSettings,
        source: Arc<dyn NotebookSource>,
        store: Arc<dyn NoteStore>,
    ) -> SyncServiceBuilder {
        SyncServiceBuilder {
            settings,
            source,
            store,
            text_extractor: None,
            transcoder: None,
        }
    }

    /// Wire the web client, the filesystem vault and the processors enabled
    /// in `settings`
    pub fn from_settings(settings: SyncSettings, session_credential: String) -> Result<Self, SyncError> {
        let client = ScribeClient::new(settings.remote.clone(), session_credential, settings.image_quality)?;
        let store = FsNoteStore::new(settings.vault_root.clone());

        let mut builder = Self::builder(settings.clone(), Arc::new(client), Arc::new(store));

        if settings.convert_handwriting {
            let command = settings.ocr_command.as_deref().unwrap_or(DEFAULT_OCR_COMMAND);
            builder = builder.text_extractor(Arc::new(CommandTextExtractor::from_command_line(command)?));
        }
        if settings.transcode_images {
            builder = builder.transcoder(Arc::new(JpegTranscoder));
        }

        Ok(builder.build())
    }

    /// Current status snapshot
    pub fn status(&self) -> SyncStatus {
        self.lock_status().clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    fn lock_status(&self) -> MutexGuard<'_, SyncStatus> {
        self.inner.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: SyncPhase, notebook: Option<&str>) {
        let mut status = self.lock_status();
        status.phase = phase;
        status.current_notebook = notebook.map(str::to_string);
    }

    /// Check that the session credential is accepted
    pub async fn test_connection(&self) -> Result<ConnectionReport, SyncError> {
        if !self.inner.source.verify_session().await? {
            log::warn!("Connection test: session credential rejected");
            return Ok(ConnectionReport {
                session_valid: false,
                notebooks: 0,
            });
        }

        let notebooks = flatten_notebooks(&self.inner.source.list_notebooks().await?).len();
        log::info!("Connection test: session valid, {} notebook(s) visible", notebooks);
        Ok(ConnectionReport {
            session_valid: true,
            notebooks,
        })
    }

    /// Flattened remote notebook listing
    pub async fn list_notebooks(&self) -> Result<Vec<NotebookSummary>, SyncError> {
        let items = self.inner.source.list_notebooks().await?;
        Ok(flatten_notebooks(&items))
    }

    /// Start syncing every `interval` until the returned scheduler is stopped
    pub fn start_recurring(&self, interval: Duration) -> SyncScheduler {
        scheduler::start_sync_scheduler(self.clone(), interval, self.inner.settings.sync_on_startup)
    }

    /// Run one full pass.
    ///
    /// Fails immediately with [`SyncError::AlreadyRunning`] while another pass
    /// is in flight, without touching the status.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SyncError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.inner.running);

        {
            let mut status = self.lock_status();
            status.state = SyncState::Syncing;
            status.phase = SyncPhase::Validating;
            status.current_notebook = None;
        }

        let started_at = Utc::now();
        log::info!("Sync: pass started");
        let result = self.run_pass(started_at).await;

        let mut status = self.lock_status();
        status.phase = SyncPhase::Idle;
        status.current_notebook = None;
        match &result {
            Ok(report) => {
                status.state = SyncState::Success;
                status.last_sync = Some(report.finished_at);
                status.last_error = None;
                status.last_report = Some(report.clone());
                log::info!(
                    "Sync: pass complete in {}ms, created={}, updated={}, unchanged={}, failed={}",
                    report.duration_ms(),
                    report.created(),
                    report.updated(),
                    report.unchanged(),
                    report.failed()
                );
            }
            Err(e) => {
                status.state = SyncState::Error;
                status.last_error = Some(e.to_string());
                log::error!("Sync: pass aborted: {}", e);
            }
        }

        result
    }

    async fn run_pass(&self, started_at: chrono::DateTime<Utc>) -> Result<SyncReport, SyncError> {
        let settings = &self.inner.settings;
        let source = &self.inner.source;

        if !source.verify_session().await? {
            return Err(SyncError::Authentication(SESSION_REJECTED.to_string()));
        }

        self.set_phase(SyncPhase::Listing, None);
        let notebooks = flatten_notebooks(&source.list_notebooks().await?);
        log::info!("Sync: {} notebook(s) listed", notebooks.len());

        let target = normalize_folder(&settings.target_folder);
        if !target.is_empty() && !self.inner.store.exists(&target) {
            self.inner.store.create_folder(&target)?;
            log::info!("Sync: created target folder '{}'", target);
        }

        let eligible: Vec<&NotebookSummary> = notebooks
            .iter()
            .filter(|n| settings.is_selected(&n.id))
            .collect();
        if eligible.is_empty() {
            log::info!("Sync: no notebooks selected");
        }

        let mut planner = NotePathPlanner::new(&settings.target_folder, settings.mirror_remote_folders);
        let mut results = Vec::with_capacity(eligible.len());

        for notebook in &eligible {
            let path = planner.path_for(notebook);

            let outcome = match self.process_notebook(notebook, &path).await {
                Ok(outcome) => outcome,
                Err(e @ SyncError::Authentication(_)) => return Err(e),
                Err(e) => {
                    log::error!("Sync: notebook '{}' ({}) failed: {}", notebook.name, notebook.id, e);
                    NotebookOutcome::Failed(e.to_string())
                }
            };

            results.push(NotebookResult {
                notebook_id: notebook.id.clone(),
                name: notebook.name.clone(),
                path,
                outcome,
            });
        }

        Ok(SyncReport {
            started_at,
            finished_at: Utc::now(),
            listed: notebooks.len(),
            eligible: eligible.len(),
            results,
        })
    }

    async fn process_notebook(
        &self,
        notebook: &NotebookSummary,
        path: &str,
    ) -> Result<NotebookOutcome, SyncError> {
        let settings = &self.inner.settings;
        let source = &self.inner.source;

        self.set_phase(SyncPhase::Fetching, Some(&notebook.id));
        let session = source.open_notebook(&notebook.id).await?;

        let mut content = if session.metadata.total_pages == 0 {
            log::info!("Sync: notebook '{}' has no pages, skipping render", notebook.name);
            NotebookContent {
                metadata: session.metadata.clone(),
                metadata_source: MetadataSource::Remote,
                pages: Vec::new(),
                warnings: Vec::new(),
            }
        } else {
            let bundle = source.fetch_pages(&session).await?;

            self.set_phase(SyncPhase::Decoding, Some(&notebook.id));
            let entries = archive::decode(&bundle)?;
            let mut content = extract(&entries)?;

            // A synthesized timestamp changes every pass
            if content.metadata_source == MetadataSource::Synthesized {
                content.metadata = session.metadata.clone();
                content.metadata_source = MetadataSource::Remote;
            }
            content
        };

        for warning in &content.warnings {
            log::warn!("Sync: notebook '{}': {}", notebook.name, warning);
        }

        self.set_phase(SyncPhase::Rendering, Some(&notebook.id));
        self.process_pages(&mut content).await;
        let markdown = render_with(
            &content,
            &RenderOptions {
                format_recognized_text: settings.enable_markdown_conversion,
            },
        );

        self.set_phase(SyncPhase::Reconciling, Some(&notebook.id));
        let outcome = self.reconcile(path, &markdown)?;
        log::info!("Sync: '{}' -> {} ({:?})", notebook.name, path, outcome);
        Ok(outcome)
    }

    /// Transcode and recognize pages in place. Failures keep the page as is.
    async fn process_pages(&self, content: &mut NotebookContent) {
        let quality = self.inner.settings.image_quality;

        for page in &mut content.pages {
            if let Some(transcoder) = &self.inner.transcoder {
                let transcoder = Arc::clone(transcoder);
                let bytes = page.bytes.clone();
                match tokio::task::spawn_blocking(move || transcoder.transcode(&bytes, quality)).await {
                    Ok(Ok(bytes)) => page.bytes = bytes,
                    Ok(Err(e)) => log::warn!("Sync: page {} kept as is, transcoding failed: {}", page.number, e),
                    Err(e) => log::warn!("Sync: page {} transcoding task failed: {}", page.number, e),
                }
            }

            if let Some(extractor) = &self.inner.text_extractor {
                let extractor = Arc::clone(extractor);
                let bytes = page.bytes.clone();
                match tokio::task::spawn_blocking(move || extractor.extract_text(&bytes)).await {
                    Ok(Ok(text)) if !text.trim().is_empty() => page.recognized_text = Some(text),
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => log::warn!("Sync: page {} text recognition failed: {}", page.number, e),
                    Err(e) => log::warn!("Sync: page {} recognition task failed: {}", page.number, e),
                }
            }
        }
    }

    /// Write `markdown` to `path` only when the file is missing or differs
    fn reconcile(&self, path: &str, markdown: &str) -> Result<NotebookOutcome, SyncError> {
        let store = &self.inner.store;

        if let Some(parent) = parent_folder(path) {
            if !store.exists(parent) {
                store.create_folder(parent)?;
            }
        }

        if !store.exists(path) {
            store.create(path, markdown)?;
            return Ok(NotebookOutcome::Created);
        }

        if store.read(path)? == markdown {
            Ok(NotebookOutcome::Unchanged)
        } else {
            store.modify(path, markdown)?;
            Ok(NotebookOutcome::Updated)
        }
    }
}
