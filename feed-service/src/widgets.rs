//! Widget rendering and caching
//!
//! Each widget fetches its upstream, renders a small HTML fragment, and
//! caches the result. Failures serve the last good value marked stale, or
//! a static fallback fragment when nothing has ever been cached. That is
//! the contract the site's pages rely on: a widget never errors out.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::feed_parse::{FeedItem, parse_atom_entries, parse_rss_items};
use crate::fetch::{FetchLimits, fetch_feed_text};
use crate::logger::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Medium,
    Letterboxd,
    Github,
    Journal,
    Content,
}

impl WidgetKind {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "medium" => Some(WidgetKind::Medium),
            "letterboxd" => Some(WidgetKind::Letterboxd),
            "github" => Some(WidgetKind::Github),
            "journal" => Some(WidgetKind::Journal),
            "content" => Some(WidgetKind::Content),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            WidgetKind::Medium => "medium",
            WidgetKind::Letterboxd => "letterboxd",
            WidgetKind::Github => "github",
            WidgetKind::Journal => "journal",
            WidgetKind::Content => "content",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetPayload {
    pub html: String,
    pub count: usize,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: String,
    pub stale: bool,
}

pub struct WidgetService {
    config: Arc<Config>,
    limits: FetchLimits,
    cache: WidgetCache,
    logger: Logger,
}

impl WidgetService {
    pub fn new(config: Arc<Config>, logger: Logger) -> Self {
        let limits = FetchLimits {
            timeout: config.timeout,
            max_bytes: config.max_feed_bytes,
        };
        let cache = WidgetCache::new(config.cache_ttl);
        Self {
            config,
            limits,
            cache,
            logger,
        }
    }

    pub async fn render(&self, kind: WidgetKind) -> WidgetPayload {
        if let Some(fresh) = self.cache.get_fresh(kind).await {
            return fresh;
        }

        match self.build(kind).await {
            Ok((html, count)) => {
                let payload = WidgetPayload {
                    html,
                    count,
                    fetched_at: now_rfc3339(),
                    stale: false,
                };
                self.cache.put(kind, payload.clone()).await;
                payload
            }
            Err(detail) => {
                self.logger.warn(
                    "widget.refresh_failed",
                    json!({ "widget": kind.slug(), "error": detail }),
                );
                if let Some(stale) = self.cache.get_stale(kind).await {
                    return stale;
                }
                WidgetPayload {
                    html: fallback_html(kind).to_string(),
                    count: 0,
                    fetched_at: now_rfc3339(),
                    stale: true,
                }
            }
        }
    }

    async fn build(&self, kind: WidgetKind) -> Result<(String, usize), String> {
        let limit = self.config.max_items;
        match kind {
            WidgetKind::Medium => {
                let xml = fetch_feed_text(&self.config.medium_feed_url, &self.limits)
                    .await
                    .map_err(|error| error.detail().to_string())?;
                let items = parse_rss_items(&xml, limit);
                require_items(render_posts_list(&items, "medium-posts"), items.len())
            }
            WidgetKind::Letterboxd => {
                let xml = fetch_feed_text(&self.config.letterboxd_feed_url, &self.limits)
                    .await
                    .map_err(|error| error.detail().to_string())?;
                let items = parse_rss_items(&xml, limit);
                require_items(render_films_list(&items), items.len())
            }
            WidgetKind::Github => {
                let xml = fetch_feed_text(&self.config.github_feed_url, &self.limits)
                    .await
                    .map_err(|error| error.detail().to_string())?;
                let items = parse_atom_entries(&xml, limit);
                require_items(render_posts_list(&items, "github-activity"), items.len())
            }
            WidgetKind::Journal => {
                let entries = read_journal_entries(&self.config.data_dir, limit).await?;
                require_items(render_journal_list(&entries), entries.len())
            }
            WidgetKind::Content => {
                let content = read_content_file(&self.config.data_dir).await?;
                let count = content.recent_links.len()
                    + usize::from(content.currently_reading.is_some());
                require_items(render_content(&content), count)
            }
        }
    }
}

fn require_items(html: String, count: usize) -> Result<(String, usize), String> {
    if count == 0 {
        return Err("feed parsed to zero items".to_string());
    }
    Ok((html, count))
}

// --- rendering -----------------------------------------------------------

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_posts_list(items: &[FeedItem], class: &str) -> String {
    let rows = items
        .iter()
        .map(|item| {
            format!(
                "<li><a href=\"{href}\" rel=\"noopener\">{title}</a>{date}</li>",
                href = escape_html(&item.link),
                title = escape_html(&item.title),
                date = short_date_suffix(&item.published),
            )
        })
        .collect::<Vec<_>>()
        .join("");
    format!("<ul class=\"{class}\">{rows}</ul>")
}

fn render_films_list(items: &[FeedItem]) -> String {
    let rows = items
        .iter()
        .map(|item| {
            let rating = item
                .rating
                .as_deref()
                .map(|value| format!(" <span class=\"rating\">{}</span>", escape_html(value)))
                .unwrap_or_default();
            format!(
                "<li><a href=\"{href}\" rel=\"noopener\">{title}</a>{rating}</li>",
                href = escape_html(&item.link),
                title = escape_html(&item.title),
            )
        })
        .collect::<Vec<_>>()
        .join("");
    format!("<ul class=\"letterboxd-films\">{rows}</ul>")
}

fn short_date_suffix(published: &str) -> String {
    if published.is_empty() {
        return String::new();
    }
    format!(" <time>{}</time>", escape_html(published))
}

// --- local data ----------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct JournalEntry {
    title: String,
    date: String,
    slug: String,
}

async fn read_journal_entries(data_dir: &Path, limit: usize) -> Result<Vec<JournalEntry>, String> {
    let path = data_dir.join("journal-entries.json");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|error| format!("read {}: {error}", path.display()))?;
    let mut entries: Vec<JournalEntry> =
        serde_json::from_str(&raw).map_err(|error| format!("parse {}: {error}", path.display()))?;
    entries.truncate(limit);
    Ok(entries)
}

fn render_journal_list(entries: &[JournalEntry]) -> String {
    let rows = entries
        .iter()
        .map(|entry| {
            format!(
                "<li><a href=\"/journal/{slug}.html\">{title}</a> <time>{date}</time></li>",
                slug = escape_html(&entry.slug),
                title = escape_html(&entry.title),
                date = escape_html(&entry.date),
            )
        })
        .collect::<Vec<_>>()
        .join("");
    format!("<ul class=\"journal-latest\">{rows}</ul>")
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentFile {
    #[serde(default)]
    recent_links: Vec<ContentLink>,
    #[serde(default)]
    currently_reading: Option<ContentBook>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentLink {
    title: String,
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBook {
    title: String,
    author: String,
}

async fn read_content_file(data_dir: &Path) -> Result<ContentFile, String> {
    let path = data_dir.join("content.json");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|error| format!("read {}: {error}", path.display()))?;
    serde_json::from_str(&raw).map_err(|error| format!("parse {}: {error}", path.display()))
}

fn render_content(content: &ContentFile) -> String {
    let mut sections = Vec::new();
    if !content.recent_links.is_empty() {
        let rows = content
            .recent_links
            .iter()
            .map(|link| {
                format!(
                    "<li><a href=\"{href}\" rel=\"noopener\">{title}</a></li>",
                    href = escape_html(&link.url),
                    title = escape_html(&link.title),
                )
            })
            .collect::<Vec<_>>()
            .join("");
        sections.push(format!("<ul class=\"recent-links\">{rows}</ul>"));
    }
    if let Some(book) = &content.currently_reading {
        sections.push(format!(
            "<p class=\"currently-reading\">Currently reading: <em>{title}</em> by {author}</p>",
            title = escape_html(&book.title),
            author = escape_html(&book.author),
        ));
    }
    sections.join("\n")
}

pub fn fallback_html(kind: WidgetKind) -> &'static str {
    match kind {
        WidgetKind::Medium => "<p class=\"widget-fallback\">Recent writing lives on <a href=\"https://medium.com\">Medium</a>.</p>",
        WidgetKind::Letterboxd => "<p class=\"widget-fallback\">Film diary temporarily unavailable.</p>",
        WidgetKind::Github => "<p class=\"widget-fallback\">Recent commits temporarily unavailable.</p>",
        WidgetKind::Journal => "<p class=\"widget-fallback\">No journal entries yet.</p>",
        WidgetKind::Content => "<p class=\"widget-fallback\">Nothing to share right now.</p>",
    }
}

fn now_rfc3339() -> String {
    use time::format_description::well_known::Rfc3339;
    let now = time::OffsetDateTime::now_utc();
    now.format(&Rfc3339).unwrap_or_else(|_| now.to_string())
}

// --- cache ---------------------------------------------------------------

struct WidgetCache {
    ttl: Duration,
    store: Mutex<HashMap<WidgetKind, CacheEntry>>,
}

struct CacheEntry {
    payload: WidgetPayload,
    stored_at: Instant,
}

impl WidgetCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: Mutex::new(HashMap::new()),
        }
    }

    async fn get_fresh(&self, kind: WidgetKind) -> Option<WidgetPayload> {
        let store = self.store.lock().await;
        let entry = store.get(&kind)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Expired entries stay around exactly for this: serving marked-stale
    /// content when a refresh fails.
    async fn get_stale(&self, kind: WidgetKind) -> Option<WidgetPayload> {
        let store = self.store.lock().await;
        store.get(&kind).map(|entry| {
            let mut payload = entry.payload.clone();
            payload.stale = true;
            payload
        })
    }

    async fn put(&self, kind: WidgetKind, payload: WidgetPayload) {
        let mut store = self.store.lock().await;
        store.insert(
            kind,
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(title: &str, link: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: link.to_string(),
            published: String::new(),
            rating: None,
        }
    }

    #[test]
    fn posts_list_escapes_upstream_text() {
        let items = vec![item("<script>x</script>", "https://a.example/?q=1&r=2")];
        let html = render_posts_list(&items, "medium-posts");
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("https://a.example/?q=1&amp;r=2"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn films_list_shows_rating_when_present() {
        let mut films = vec![item("Film A", "https://l.example/a")];
        films[0].rating = Some("4.5".into());
        let html = render_films_list(&films);
        assert!(html.contains("<span class=\"rating\">4.5</span>"));
    }

    #[test]
    fn content_renders_links_and_book() {
        let content = ContentFile {
            recent_links: vec![ContentLink {
                title: "A link".into(),
                url: "https://x.example".into(),
            }],
            currently_reading: Some(ContentBook {
                title: "Dune".into(),
                author: "Frank Herbert".into(),
            }),
        };
        let html = render_content(&content);
        assert!(html.contains("A link"));
        assert!(html.contains("Currently reading: <em>Dune</em> by Frank Herbert"));
    }

    #[test]
    fn widget_slugs_round_trip() {
        for kind in [
            WidgetKind::Medium,
            WidgetKind::Letterboxd,
            WidgetKind::Github,
            WidgetKind::Journal,
            WidgetKind::Content,
        ] {
            assert_eq!(WidgetKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(WidgetKind::from_slug("nope"), None);
    }

    #[tokio::test]
    async fn cache_serves_fresh_then_stale() {
        let cache = WidgetCache::new(Duration::from_millis(20));
        let payload = WidgetPayload {
            html: "<ul></ul>".into(),
            count: 1,
            fetched_at: now_rfc3339(),
            stale: false,
        };
        cache.put(WidgetKind::Medium, payload).await;
        assert!(cache.get_fresh(WidgetKind::Medium).await.is_some());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get_fresh(WidgetKind::Medium).await.is_none());
        let stale = cache.get_stale(WidgetKind::Medium).await.unwrap();
        assert!(stale.stale);
    }
}
