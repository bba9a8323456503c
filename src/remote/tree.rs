//! Flattening of the remote item tree into notebook summaries

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::models::{ItemKind, NotebookSummary, RemoteItem};

const ROOT_FOLDER: &str = "root";

/// Folder id -> (title, resolved parent folder id), built from one full
/// traversal before any path is computed.
struct FolderIndex<'a> {
    folders: HashMap<&'a str, (&'a str, Option<&'a str>)>,
}

impl<'a> FolderIndex<'a> {
    fn build(items: &'a [RemoteItem]) -> Self {
        let mut raw = Vec::new();
        collect_folders(items, None, &mut raw);

        let known: HashSet<&str> = raw.iter().map(|(item, _)| item.id.as_str()).collect();

        let folders = raw
            .into_iter()
            .map(|(item, structural)| {
                let parent = resolve_parent(item.parent_id.as_deref(), structural, &known);
                (item.id.as_str(), (item.title.as_str(), parent))
            })
            .collect();

        Self { folders }
    }

    /// Titles of `folder_id` and its ancestors, outermost first
    fn path_of(&self, folder_id: Option<&'a str>) -> Vec<&'a str> {
        let mut titles = Vec::new();
        let mut visited = HashSet::new();
        let mut current = folder_id;

        while let Some(id) = current {
            if !visited.insert(id) {
                log::warn!("Folder cycle detected at '{}', truncating path", id);
                break;
            }
            let Some((title, parent)) = self.folders.get(id) else {
                break;
            };
            titles.push(if title.is_empty() { id } else { *title });
            current = *parent;
        }

        titles.reverse();
        titles
    }

    fn known_ids(&self) -> HashSet<&'a str> {
        self.folders.keys().copied().collect()
    }
}

fn is_root_reference(parent: &str) -> bool {
    parent.is_empty() || parent == ROOT_FOLDER
}

/// Prefer the declared `parentFolder` when it names a known folder,
/// otherwise the folder the item is nested in.
fn resolve_parent<'a>(
    declared: Option<&'a str>,
    structural: Option<&'a str>,
    known: &HashSet<&str>,
) -> Option<&'a str> {
    match declared {
        Some(parent) if is_root_reference(parent) => structural,
        Some(parent) if known.contains(parent) => Some(parent),
        _ => structural,
    }
}

fn collect_folders<'a>(
    items: &'a [RemoteItem],
    structural: Option<&'a str>,
    out: &mut Vec<(&'a RemoteItem, Option<&'a str>)>,
) {
    for item in items {
        let next = if item.kind == ItemKind::Folder {
            out.push((item, structural));
            Some(item.id.as_str())
        } else {
            structural
        };
        collect_folders(&item.children, next, out);
    }
}

fn collect_notebooks<'a>(
    items: &'a [RemoteItem],
    structural: Option<&'a str>,
    index: &FolderIndex<'a>,
    known: &HashSet<&'a str>,
    listed_at: DateTime<Utc>,
    out: &mut Vec<NotebookSummary>,
) {
    for item in items {
        if item.kind == ItemKind::Notebook {
            let name = if item.title.is_empty() {
                item.id.clone()
            } else {
                item.title.clone()
            };

            let parent = resolve_parent(item.parent_id.as_deref(), structural, known);
            let mut parts = index.path_of(parent);
            parts.push(&name);

            out.push(NotebookSummary {
                id: item.id.clone(),
                derived_path: parts.join("/"),
                name,
                last_modified: listed_at,
            });
        }

        let next = if item.kind == ItemKind::Folder {
            Some(item.id.as_str())
        } else {
            structural
        };
        collect_notebooks(&item.children, next, index, known, listed_at, out);
    }
}

/// Flatten the item tree into one summary per notebook, in pre-order.
///
/// `derived_path` carries the titles of every ancestor folder, resolved
/// through an id -> title map of all folders in the listing.
pub fn flatten_notebooks(items: &[RemoteItem]) -> Vec<NotebookSummary> {
    let index = FolderIndex::build(items);
    let known = index.known_ids();
    let listed_at = Utc::now();

    let mut notebooks = Vec::new();
    collect_notebooks(items, None, &index, &known, listed_at, &mut notebooks);

    log::debug!("Flattened {} notebook(s) from item tree", notebooks.len());
    notebooks
}
