//! journal-entries.json persistence
//!
//! The JSON file is the generated artifact, the `stories/` directory is
//! the source of truth. `sync` rereads every story file and rewrites the
//! array wholesale; there are no partial updates and no merge rules.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::logger::Logger;
use crate::story::{StoryEntry, parse_story_file, sort_entries};

pub fn load_entries(path: &Path) -> Result<Vec<StoryEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

pub fn save_entries(path: &Path, entries: &[StoryEntry]) -> Result<()> {
    let payload = serde_json::to_string_pretty(entries)?;
    fs::write(path, payload).with_context(|| format!("failed to write {}", path.display()))
}

/// Read every `*.txt` under the stories directory, newest first. Files
/// that fail to parse are logged and skipped so one bad story never takes
/// the whole sync down.
pub fn collect_stories(stories_dir: &Path, logger: &Logger) -> Result<Vec<StoryEntry>> {
    let mut entries = Vec::new();
    let listing = fs::read_dir(stories_dir)
        .with_context(|| format!("failed to read stories dir {}", stories_dir.display()))?;
    let mut paths: Vec<_> = listing
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("txt"))
        .collect();
    paths.sort();

    for path in paths {
        match parse_story_file(&path) {
            Ok(entry) => entries.push(entry),
            Err(error) => logger.warn(
                "story.parse_failed",
                serde_json::json!({
                    "path": path.display().to_string(),
                    "error": error.to_string(),
                }),
            ),
        }
    }
    sort_entries(&mut entries);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("journal-cms-test-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn sync_collects_sorted_entries_and_skips_bad_files() {
        let dir = temp_dir("collect");
        fs::write(
            dir.join("a.txt"),
            "Title: Older\nDate: 2024-05-01\n\nBody A",
        )
        .unwrap();
        fs::write(
            dir.join("b.txt"),
            "Title: Newer\nDate: 2025-05-01\n\nBody B",
        )
        .unwrap();
        fs::write(dir.join("broken.txt"), "no headers here").unwrap();
        fs::write(dir.join("ignored.md"), "Title: X\nDate: 2025-01-01\n\nx").unwrap();

        let logger = Logger::new("journal-cms-test");
        let entries = collect_stories(&dir, &logger).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Newer");
        assert_eq!(entries[1].title, "Older");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn entries_round_trip_through_json() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("journal-entries.json");
        let entries = vec![StoryEntry {
            id: "one".into(),
            title: "One".into(),
            date: "2025-01-01".into(),
            slug: "one".into(),
            content: "Body".into(),
            tags: vec!["t".into()],
        }];
        save_entries(&path, &entries).unwrap();
        let loaded = load_entries(&path).unwrap();
        assert_eq!(loaded, entries);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_entries_file_is_empty() {
        let dir = temp_dir("missing");
        let loaded = load_entries(&dir.join("nope.json")).unwrap();
        assert!(loaded.is_empty());
        let _ = fs::remove_dir_all(&dir);
    }
}
