//! `content.json` model: the homepage's recent links and current book.
//! The file is read and rewritten wholesale; there is no partial update.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFile {
    #[serde(default)]
    pub recent_links: Vec<RecentLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently_reading: Option<Book>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

pub fn load_content(path: &Path) -> Result<ContentFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_fields() {
        let parsed: ContentFile = serde_json::from_str(
            r#"{
                "recentLinks": [
                    {"title": "A", "url": "https://a.example", "date": "2025-05-01"}
                ],
                "currentlyReading": {"title": "Book", "author": "Someone"}
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.recent_links.len(), 1);
        assert_eq!(parsed.currently_reading.unwrap().author, "Someone");
    }

    #[test]
    fn missing_sections_default() {
        let parsed: ContentFile = serde_json::from_str("{}").unwrap();
        assert!(parsed.recent_links.is_empty());
        assert!(parsed.currently_reading.is_none());
    }
}
