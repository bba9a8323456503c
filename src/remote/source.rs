use async_trait::async_trait;

use super::client::{RemoteError, ScribeClient};
use super::models::{RemoteItem, RenderSession};

/// Operations the sync service needs from the notebook service
#[async_trait]
pub trait NotebookSource: Send + Sync {
    async fn verify_session(&self) -> Result<bool, RemoteError>;

    async fn list_notebooks(&self) -> Result<Vec<RemoteItem>, RemoteError>;

    async fn open_notebook(&self, notebook_id: &str) -> Result<RenderSession, RemoteError>;

    /// Raw ustar bundle holding every page of the opened notebook
    async fn fetch_pages(&self, session: &RenderSession) -> Result<Vec<u8>, RemoteError>;
}

#[async_trait]
impl NotebookSource for ScribeClient {
    async fn verify_session(&self) -> Result<bool, RemoteError> {
        ScribeClient::verify_session(self).await
    }

    async fn list_notebooks(&self) -> Result<Vec<RemoteItem>, RemoteError> {
        ScribeClient::list_notebooks(self).await
    }

    async fn open_notebook(&self, notebook_id: &str) -> Result<RenderSession, RemoteError> {
        ScribeClient::open_notebook(self, notebook_id).await
    }

    async fn fetch_pages(&self, session: &RenderSession) -> Result<Vec<u8>, RemoteError> {
        ScribeClient::fetch_pages(self, session).await
    }
}
