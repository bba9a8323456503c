//! Scripted notebook source for orchestrator tests

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::archive::build_archive;
use crate::notebook::{fake_png, NotebookMetadata};
use crate::remote::{ItemKind, NotebookSource, RemoteError, RemoteItem, RenderSession};

const MODIFIED_AT: i64 = 1_700_000_000;

struct Scripted {
    title: String,
    pages: u32,
}

#[derive(Default)]
pub(crate) struct FakeSource {
    notebooks: Vec<(String, Scripted)>,
    session_valid: Option<bool>,
    failing_fetch: HashSet<String>,
    html_payload: HashSet<String>,
    missing_open_metadata: HashSet<String>,
    omit_metadata: bool,
    gated: bool,
    listing: Notify,
    gate: Notify,
    opened: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
    list_calls: Mutex<usize>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notebook(mut self, id: &str, title: &str, pages: u32) -> Self {
        self.notebooks.push((
            id.to_string(),
            Scripted {
                title: title.to_string(),
                pages,
            },
        ));
        self
    }

    pub fn with_session_valid(mut self, valid: bool) -> Self {
        self.session_valid = Some(valid);
        self
    }

    pub fn failing_fetch(mut self, id: &str) -> Self {
        self.failing_fetch.insert(id.to_string());
        self
    }

    pub fn html_payload(mut self, id: &str) -> Self {
        self.html_payload.insert(id.to_string());
        self
    }

    /// Answer `open_notebook` for `id` the way the client does when the
    /// service returns a token but no metadata
    pub fn missing_open_metadata(mut self, id: &str) -> Self {
        self.missing_open_metadata.insert(id.to_string());
        self
    }

    pub fn without_archive_metadata(mut self) -> Self {
        self.omit_metadata = true;
        self
    }

    /// Block `list_notebooks` until [`FakeSource::release`] is called
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub async fn wait_until_listing(&self) {
        self.listing.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    fn metadata(&self, id: &str) -> NotebookMetadata {
        self.notebooks
            .iter()
            .find(|(nb, _)| nb == id)
            .map(|(_, s)| NotebookMetadata {
                title: s.title.clone(),
                total_pages: s.pages,
                current_page: 1,
                modification_time: MODIFIED_AT,
            })
            .unwrap_or_default()
    }

    fn bundle(&self, metadata: &NotebookMetadata) -> Vec<u8> {
        let metadata_json = serde_json::to_vec(metadata).unwrap();
        let pages: Vec<(String, Vec<u8>)> = (1..=metadata.total_pages)
            .map(|n| (format!("page_{:03}.png", n), fake_png(n as u8)))
            .collect();

        let mut entries: Vec<(&str, &[u8])> = pages
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
            .collect();
        if !self.omit_metadata {
            entries.push(("metadata.json", metadata_json.as_slice()));
        }
        build_archive(&entries)
    }
}

#[async_trait]
impl NotebookSource for FakeSource {
    async fn verify_session(&self) -> Result<bool, RemoteError> {
        Ok(self.session_valid.unwrap_or(true))
    }

    async fn list_notebooks(&self) -> Result<Vec<RemoteItem>, RemoteError> {
        *self.list_calls.lock().unwrap() += 1;
        if self.gated {
            self.listing.notify_one();
            self.gate.notified().await;
        }

        Ok(self
            .notebooks
            .iter()
            .map(|(id, s)| RemoteItem {
                id: id.clone(),
                title: s.title.clone(),
                kind: ItemKind::Notebook,
                parent_id: Some("root".to_string()),
                children: Vec::new(),
            })
            .collect())
    }

    async fn open_notebook(&self, notebook_id: &str) -> Result<RenderSession, RemoteError> {
        self.opened.lock().unwrap().push(notebook_id.to_string());
        if self.missing_open_metadata.contains(notebook_id) {
            return Err(RemoteError::InvalidResponse {
                endpoint: "openNotebook".to_string(),
                message: format!("no metadata returned for notebook {}", notebook_id),
            });
        }
        Ok(RenderSession {
            notebook_id: notebook_id.to_string(),
            rendering_token: format!("token-{}", notebook_id),
            reading_session_id: None,
            metadata: self.metadata(notebook_id),
        })
    }

    async fn fetch_pages(&self, session: &RenderSession) -> Result<Vec<u8>, RemoteError> {
        let id = &session.notebook_id;
        self.fetched.lock().unwrap().push(id.clone());

        if self.failing_fetch.contains(id) {
            return Err(RemoteError::Server {
                status: 500,
                message: "render failed".to_string(),
            });
        }
        if self.html_payload.contains(id) {
            return Ok(b"<html><body>Something went wrong</body></html>".repeat(20));
        }
        Ok(self.bundle(&session.metadata))
    }
}
