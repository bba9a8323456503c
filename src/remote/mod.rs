pub mod client;
pub mod models;
pub mod source;
pub mod tree;

pub use client::{RemoteError, ScribeClient};
pub use models::{ItemKind, NotebookSummary, RemoteItem, RenderSession};
pub use source::NotebookSource;
pub use tree::flatten_notebooks;
