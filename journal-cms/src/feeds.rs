//! RSS 2.0 and Atom 1.0 generation
//!
//! Feed items come from `content.json`: one item per recent link plus one
//! for the currently-reading book. Everything interpolated into the XML is
//! escaped; dates are RFC 2822 in RSS and RFC 3339 in Atom.

use anyhow::{Result, anyhow};
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

use crate::content::ContentFile;
use crate::markdown::escape_html;

#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: String,
    pub site_url: String,
    pub feed_url: String,
    pub description: String,
    pub author: String,
}

struct FeedItem {
    title: String,
    url: String,
    description: String,
    date: Option<Date>,
}

fn collect_items(content: &ContentFile) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = content
        .recent_links
        .iter()
        .map(|link| FeedItem {
            title: link.title.clone(),
            url: link.url.clone(),
            description: link
                .description
                .clone()
                .unwrap_or_else(|| format!("Link: {}", link.title)),
            date: parse_date(&link.date),
        })
        .collect();

    if let Some(book) = &content.currently_reading {
        items.push(FeedItem {
            title: format!("Currently reading: {}", book.title),
            url: book.url.clone().unwrap_or_default(),
            description: format!("{} by {}", book.title, book.author),
            date: None,
        });
    }
    items
}

pub fn build_rss(content: &ContentFile, meta: &FeedMeta, now: OffsetDateTime) -> Result<String> {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    xml.push_str("<channel>\n");
    xml.push_str(&format!("  <title>{}</title>\n", escape_html(&meta.title)));
    xml.push_str(&format!("  <link>{}</link>\n", escape_html(&meta.site_url)));
    xml.push_str(&format!(
        "  <description>{}</description>\n",
        escape_html(&meta.description)
    ));
    xml.push_str(&format!(
        "  <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape_html(&meta.feed_url)
    ));
    xml.push_str(&format!(
        "  <lastBuildDate>{}</lastBuildDate>\n",
        rfc2822(now)?
    ));

    for item in collect_items(content) {
        xml.push_str("  <item>\n");
        xml.push_str(&format!(
            "    <title>{}</title>\n",
            escape_html(&item.title)
        ));
        if !item.url.is_empty() {
            xml.push_str(&format!("    <link>{}</link>\n", escape_html(&item.url)));
            xml.push_str(&format!(
                "    <guid isPermaLink=\"true\">{}</guid>\n",
                escape_html(&item.url)
            ));
        }
        xml.push_str(&format!(
            "    <description>{}</description>\n",
            escape_html(&item.description)
        ));
        let published = item.date.map(start_of_day).unwrap_or(now);
        xml.push_str(&format!("    <pubDate>{}</pubDate>\n", rfc2822(published)?));
        xml.push_str("  </item>\n");
    }

    xml.push_str("</channel>\n</rss>\n");
    Ok(xml)
}

pub fn build_atom(content: &ContentFile, meta: &FeedMeta, now: OffsetDateTime) -> Result<String> {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
    xml.push_str(&format!("  <title>{}</title>\n", escape_html(&meta.title)));
    xml.push_str(&format!(
        "  <link href=\"{}\"/>\n",
        escape_html(&meta.site_url)
    ));
    xml.push_str(&format!(
        "  <link href=\"{}\" rel=\"self\"/>\n",
        escape_html(&meta.feed_url)
    ));
    xml.push_str(&format!("  <id>{}</id>\n", escape_html(&meta.site_url)));
    xml.push_str(&format!("  <updated>{}</updated>\n", rfc3339(now)?));
    xml.push_str(&format!(
        "  <author><name>{}</name></author>\n",
        escape_html(&meta.author)
    ));

    for item in collect_items(content) {
        let updated = item.date.map(start_of_day).unwrap_or(now);
        xml.push_str("  <entry>\n");
        xml.push_str(&format!(
            "    <title>{}</title>\n",
            escape_html(&item.title)
        ));
        if !item.url.is_empty() {
            xml.push_str(&format!(
                "    <link href=\"{}\"/>\n",
                escape_html(&item.url)
            ));
            xml.push_str(&format!("    <id>{}</id>\n", escape_html(&item.url)));
        } else {
            xml.push_str(&format!(
                "    <id>{}#reading</id>\n",
                escape_html(&meta.site_url)
            ));
        }
        xml.push_str(&format!("    <updated>{}</updated>\n", rfc3339(updated)?));
        xml.push_str(&format!(
            "    <summary>{}</summary>\n",
            escape_html(&item.description)
        ));
        xml.push_str("  </entry>\n");
    }

    xml.push_str("</feed>\n");
    Ok(xml)
}

fn parse_date(value: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value.trim(), &format).ok()
}

fn start_of_day(date: Date) -> OffsetDateTime {
    PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc()
}

fn rfc2822(value: OffsetDateTime) -> Result<String> {
    value
        .format(&Rfc2822)
        .map_err(|error| anyhow!("date format failed: {error}"))
}

fn rfc3339(value: OffsetDateTime) -> Result<String> {
    value
        .format(&Rfc3339)
        .map_err(|error| anyhow!("date format failed: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Book, RecentLink};
    use time::macros::datetime;

    fn meta() -> FeedMeta {
        FeedMeta {
            title: "Journal & Notes".into(),
            site_url: "https://example.test".into(),
            feed_url: "https://example.test/journal-feed.xml".into(),
            description: "Occasional writing".into(),
            author: "Someone".into(),
        }
    }

    fn content() -> ContentFile {
        ContentFile {
            recent_links: vec![
                RecentLink {
                    title: "Ampersands & <tags>".into(),
                    url: "https://a.example/post?a=1&b=2".into(),
                    date: "2025-02-03".into(),
                    description: Some("A \"quoted\" description".into()),
                },
                RecentLink {
                    title: "Second".into(),
                    url: "https://b.example".into(),
                    date: "".into(),
                    description: None,
                },
            ],
            currently_reading: Some(Book {
                title: "Some Book".into(),
                author: "An Author".into(),
                url: None,
            }),
        }
    }

    #[test]
    fn rss_has_n_plus_one_items() {
        let xml = build_rss(&content(), &meta(), datetime!(2025-06-01 12:00 UTC)).unwrap();
        assert_eq!(xml.matches("<item>").count(), 3);
        assert_eq!(xml.matches("</item>").count(), 3);
    }

    #[test]
    fn atom_has_n_plus_one_entries() {
        let xml = build_atom(&content(), &meta(), datetime!(2025-06-01 12:00 UTC)).unwrap();
        assert_eq!(xml.matches("<entry>").count(), 3);
    }

    #[test]
    fn titles_and_descriptions_are_escaped() {
        let xml = build_rss(&content(), &meta(), datetime!(2025-06-01 12:00 UTC)).unwrap();
        assert!(xml.contains("Ampersands &amp; &lt;tags&gt;"));
        assert!(xml.contains("A &quot;quoted&quot; description"));
        assert!(xml.contains("https://a.example/post?a=1&amp;b=2"));
        assert!(!xml.contains("a=1&b=2"));
    }

    #[test]
    fn dated_links_use_their_date() {
        let xml = build_rss(&content(), &meta(), datetime!(2025-06-01 12:00 UTC)).unwrap();
        assert!(xml.contains("03 Feb 2025"));
    }

    #[test]
    fn empty_content_still_builds_a_channel() {
        let xml = build_rss(
            &ContentFile::default(),
            &meta(),
            datetime!(2025-06-01 12:00 UTC),
        )
        .unwrap();
        assert_eq!(xml.matches("<item>").count(), 0);
        assert!(xml.contains("<channel>"));
    }

    #[test]
    fn atom_updated_is_rfc3339() {
        let xml = build_atom(&content(), &meta(), datetime!(2025-06-01 12:00 UTC)).unwrap();
        assert!(xml.contains("<updated>2025-06-01T12:00:00Z</updated>"));
    }
}
