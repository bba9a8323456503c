use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::notebook::NotebookMetadata;

/// Kind of node in the remote item tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    Notebook,
    #[serde(other)]
    Other,
}

/// One node of the remote folder/notebook tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Id of the parent folder; absent, empty or `"root"` at the top level
    #[serde(rename = "parentFolder", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "items", default, deserialize_with = "null_as_default")]
    pub children: Vec<RemoteItem>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of the item-listing endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemListResponse {
    pub items_list: Option<Vec<RemoteItem>>,
    #[allow(dead_code)]
    pub response_status: Option<String>,
}

/// Body of the notebook-open endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OpenNotebookResponse {
    pub metadata: Option<NotebookMetadata>,
    pub reading_session_id: Option<String>,
    pub rendering_token: Option<String>,
}

/// A flattened remote notebook
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotebookSummary {
    pub id: String,
    pub name: String,
    /// Ancestor folder titles and the notebook title joined with `/`
    pub derived_path: String,
    /// When the listing was taken; the service sends no timestamps
    pub last_modified: DateTime<Utc>,
}

/// Credentials for one open -> render exchange. Never persisted.
#[derive(Clone)]
pub struct RenderSession {
    pub notebook_id: String,
    pub rendering_token: String,
    pub reading_session_id: Option<String>,
    pub metadata: NotebookMetadata,
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("notebook_id", &self.notebook_id)
            .field("rendering_token", &"<redacted>")
            .field("reading_session_id", &self.reading_session_id)
            .field("metadata", &self.metadata)
            .finish()
    }
}
