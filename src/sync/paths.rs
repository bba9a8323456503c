use std::collections::HashSet;

use crate::notebook::UNTITLED_NOTEBOOK;
use crate::remote::NotebookSummary;

const NOTE_EXTENSION: &str = "md";
const MAX_NAME_CHARS: usize = 120;

/// Make one path segment safe on every common filesystem
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '#' | '^' | '[' | ']' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .take(MAX_NAME_CHARS)
        .collect();

    let trimmed = cleaned.trim().trim_end_matches('.').trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        UNTITLED_NOTEBOOK.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize the configured target folder into a vault-relative path
pub fn normalize_folder(folder: &str) -> String {
    folder
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect::<Vec<_>>()
        .join("/")
}

fn join(folder: &str, relative: &str) -> String {
    if folder.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", folder, relative)
    }
}

/// Assigns each notebook of a pass its vault path.
///
/// Names that collide (case-insensitively) with an earlier notebook in the
/// same pass get ` (<id>)` appended, so the first notebook in listing order
/// keeps the plain name on every pass. If the suffixed name is taken too, a
/// counter follows the suffix.
pub struct NotePathPlanner {
    folder: String,
    mirror_remote_folders: bool,
    taken: HashSet<String>,
}

impl NotePathPlanner {
    pub fn new(target_folder: &str, mirror_remote_folders: bool) -> Self {
        Self {
            folder: normalize_folder(target_folder),
            mirror_remote_folders,
            taken: HashSet::new(),
        }
    }

    pub fn path_for(&mut self, notebook: &NotebookSummary) -> String {
        let stem = if self.mirror_remote_folders {
            notebook
                .derived_path
                .split('/')
                .map(sanitize_file_name)
                .collect::<Vec<_>>()
                .join("/")
        } else {
            sanitize_file_name(&notebook.name)
        };

        let path = join(&self.folder, &format!("{}.{}", stem, NOTE_EXTENSION));
        if self.taken.insert(path.to_lowercase()) {
            return path;
        }

        // A notebook may literally be named like a suffixed one
        let suffixed = format!("{} ({})", stem, sanitize_file_name(&notebook.id));
        let mut counter = 1;
        loop {
            let candidate = if counter == 1 {
                suffixed.clone()
            } else {
                format!("{} {}", suffixed, counter)
            };
            let path = join(&self.folder, &format!("{}.{}", candidate, NOTE_EXTENSION));
            if self.taken.insert(path.to_lowercase()) {
                return path;
            }
            counter += 1;
        }
    }
}

/// Parent folder of a vault path, if it is not at the root
pub fn parent_folder(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary(id: &str, name: &str, derived_path: &str) -> NotebookSummary {
        NotebookSummary {
            id: id.to_string(),
            name: name.to_string(),
            derived_path: derived_path.to_string(),
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Plans: Q3/Q4?"), "Plans_ Q3_Q4_");
        assert_eq!(sanitize_file_name("  trailing dots... "), "trailing dots");
        assert_eq!(sanitize_file_name(".."), UNTITLED_NOTEBOOK);
        assert_eq!(sanitize_file_name(""), UNTITLED_NOTEBOOK);
        assert_eq!(sanitize_file_name("Tab\there"), "Tab here");
    }

    #[test]
    fn test_normalize_folder() {
        assert_eq!(normalize_folder("/Kindle Notes/"), "Kindle Notes");
        assert_eq!(normalize_folder("Notes\\Scribe/../x"), "Notes/Scribe/x");
        assert_eq!(normalize_folder(""), "");
    }

    #[test]
    fn test_collisions_get_id_suffix() {
        let mut planner = NotePathPlanner::new("Kindle Notes", false);

        assert_eq!(
            planner.path_for(&summary("a", "Journal", "Journal")),
            "Kindle Notes/Journal.md"
        );
        assert_eq!(
            planner.path_for(&summary("b", "journal", "Work/journal")),
            "Kindle Notes/journal (b).md"
        );
        assert_eq!(
            planner.path_for(&summary("c", "Other", "Other")),
            "Kindle Notes/Other.md"
        );
    }

    #[test]
    fn test_suffixed_name_already_taken() {
        let mut planner = NotePathPlanner::new("Kindle Notes", false);

        assert_eq!(
            planner.path_for(&summary("C", "Journal (B)", "Journal (B)")),
            "Kindle Notes/Journal (B).md"
        );
        assert_eq!(
            planner.path_for(&summary("A", "Journal", "Journal")),
            "Kindle Notes/Journal.md"
        );
        assert_eq!(
            planner.path_for(&summary("B", "Journal", "Journal")),
            "Kindle Notes/Journal (B) 2.md"
        );
        assert_eq!(
            planner.path_for(&summary("D", "journal (b) 2", "journal (b) 2")),
            "Kindle Notes/journal (b) 2 (D).md"
        );
    }

    #[test]
    fn test_mirrored_folders() {
        let mut planner = NotePathPlanner::new("Kindle Notes", true);

        let path = planner.path_for(&summary("a", "Standup", "Work/Meetings: 2024/Standup"));
        assert_eq!(path, "Kindle Notes/Work/Meetings_ 2024/Standup.md");
        assert_eq!(parent_folder(&path), Some("Kindle Notes/Work/Meetings_ 2024"));
    }

    #[test]
    fn test_root_target_folder() {
        let mut planner = NotePathPlanner::new("", false);
        let path = planner.path_for(&summary("a", "Diary", "Diary"));
        assert_eq!(path, "Diary.md");
        assert_eq!(parent_folder(&path), None);
    }
}
