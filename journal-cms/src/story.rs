//! Story file parsing
//!
//! Entries live as `stories/*.txt`: a small header block (`Title:`,
//! `Date:`, optional `Tags:`), a blank line, then the markdown body.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::Date;
use time::macros::format_description;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEntry {
    pub id: String,
    pub title: String,
    pub date: String,
    pub slug: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Parse one story file. `Title` and `Date` are required; unknown header
/// keys are ignored so files can carry extra metadata without breaking.
pub fn parse_story_file(path: &Path) -> Result<StoryEntry> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read story file {}", path.display()))?;
    parse_story(&raw).with_context(|| format!("invalid story file {}", path.display()))
}

pub fn parse_story(raw: &str) -> Result<StoryEntry> {
    let mut title: Option<String> = None;
    let mut date: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();

    let mut lines = raw.lines();
    for line in lines.by_ref() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "title" => title = Some(value.to_string()),
            "date" => date = Some(value.to_string()),
            "tags" => {
                tags = value
                    .split(',')
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect();
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| anyhow!("missing Title header"))?;
    let date = date.ok_or_else(|| anyhow!("missing Date header"))?;
    validate_date(&date)?;

    let content = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    let slug = generate_slug(&title);

    Ok(StoryEntry {
        id: slug.clone(),
        title,
        date,
        slug,
        content,
        tags,
    })
}

/// Lowercase, collapse non-alphanumeric runs to a single dash, trim dashes.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn validate_date(value: &str) -> Result<()> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value, &format)
        .map(|_| ())
        .map_err(|_| anyhow!("Date must be YYYY-MM-DD, got {value:?}"))
}

/// Newest first; ties break on title so output order is stable.
pub fn sort_entries(entries: &mut [StoryEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "Title: My Cool Post!\nDate: 2025-03-14\nTags: life, code\n\nFirst paragraph.\n\nSecond paragraph.";

    #[test]
    fn parses_headers_and_body() {
        let entry = parse_story(SAMPLE).unwrap();
        assert_eq!(entry.title, "My Cool Post!");
        assert_eq!(entry.date, "2025-03-14");
        assert_eq!(entry.tags, vec!["life".to_string(), "code".to_string()]);
        assert_eq!(entry.content, "First paragraph.\n\nSecond paragraph.");
        assert_eq!(entry.slug, "my-cool-post");
        assert_eq!(entry.id, entry.slug);
    }

    #[test]
    fn tags_are_optional() {
        let entry = parse_story("Title: A\nDate: 2025-01-01\n\nBody").unwrap();
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn unknown_headers_are_ignored() {
        let entry = parse_story("Title: A\nDate: 2025-01-01\nMood: sleepy\n\nBody").unwrap();
        assert_eq!(entry.title, "A");
    }

    #[test]
    fn missing_title_is_an_error() {
        let error = parse_story("Date: 2025-01-01\n\nBody").unwrap_err();
        assert!(error.to_string().contains("Title"));
    }

    #[test]
    fn missing_date_is_an_error() {
        assert!(parse_story("Title: A\n\nBody").is_err());
    }

    #[test]
    fn bad_date_is_an_error() {
        assert!(parse_story("Title: A\nDate: 14/03/2025\n\nBody").is_err());
    }

    #[test]
    fn slug_examples() {
        assert_eq!(generate_slug("My Cool Post!"), "my-cool-post");
        assert_eq!(generate_slug("  Hello,   World  "), "hello-world");
        assert_eq!(generate_slug("2025 in review"), "2025-in-review");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn sorting_is_newest_first() {
        let mut entries = vec![
            parse_story("Title: Old\nDate: 2024-01-01\n\nx").unwrap(),
            parse_story("Title: New\nDate: 2025-06-01\n\nx").unwrap(),
        ];
        sort_entries(&mut entries);
        assert_eq!(entries[0].title, "New");
    }
}
