//! Lightweight RSS/Atom item extraction
//!
//! No XML dependency: a bounded tag scanner pulls `<item>`/`<entry>`
//! blocks and the handful of child elements the widgets render. Malformed
//! blocks are skipped; a feed that parses to nothing is the caller's cue
//! to fall back, not an error.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: String,
    /// Letterboxd member rating, "3.5" style, when present.
    pub rating: Option<String>,
}

/// Extract RSS 2.0 `<item>` blocks.
pub fn parse_rss_items(xml: &str, limit: usize) -> Vec<FeedItem> {
    blocks(xml, "item")
        .into_iter()
        .filter_map(|block| {
            let title = child_text(&block, "title")?;
            let link = child_text(&block, "link").unwrap_or_default();
            Some(FeedItem {
                title,
                link,
                published: child_text(&block, "pubDate").unwrap_or_default(),
                rating: child_text(&block, "letterboxd:memberRating"),
            })
        })
        .take(limit)
        .collect()
}

/// Extract Atom 1.0 `<entry>` blocks. Links live in `href` attributes.
pub fn parse_atom_entries(xml: &str, limit: usize) -> Vec<FeedItem> {
    blocks(xml, "entry")
        .into_iter()
        .filter_map(|block| {
            let title = child_text(&block, "title")?;
            let link = link_href(&block).unwrap_or_default();
            let published = child_text(&block, "published")
                .or_else(|| child_text(&block, "updated"))
                .unwrap_or_default();
            Some(FeedItem {
                title,
                link,
                published,
                rating: None,
            })
        })
        .take(limit)
        .collect()
}

/// All `<tag ...>...</tag>` block bodies, in document order.
fn blocks(xml: &str, tag: &str) -> Vec<String> {
    let open_a = format!("<{tag}>");
    let open_b = format!("<{tag} ");
    let close = format!("</{tag}>");
    let mut result = Vec::new();
    let mut rest = xml;
    loop {
        let open_at = match (rest.find(&open_a), rest.find(&open_b)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        let after_open = &rest[open_at..];
        let Some(body_start) = after_open.find('>') else {
            break;
        };
        let body = &after_open[body_start + 1..];
        let Some(end) = body.find(&close) else {
            break;
        };
        result.push(body[..end].to_string());
        rest = &body[end + close.len()..];
    }
    result
}

/// Text content of the first `<tag>` child, entity-decoded, CDATA unwrapped.
fn child_text(block: &str, tag: &str) -> Option<String> {
    let body = blocks(block, tag).into_iter().next()?;
    let unwrapped = unwrap_cdata(body.trim());
    let decoded = decode_entities(&unwrapped);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First `<link ... href="..."/>` attribute, preferring rel="alternate".
fn link_href(block: &str) -> Option<String> {
    let mut fallback = None;
    let mut rest = block;
    while let Some(at) = rest.find("<link") {
        let tag_rest = &rest[at..];
        let end = tag_rest.find('>')?;
        let tag = &tag_rest[..end];
        let href = attr_value(tag, "href");
        if let Some(href) = href {
            if attr_value(tag, "rel").as_deref().unwrap_or("alternate") == "alternate" {
                return Some(href);
            }
            fallback.get_or_insert(href);
        }
        rest = &tag_rest[end + 1..];
    }
    fallback
}

fn attr_value(tag: &str, name: &str) -> Option<String> {
    let marker = format!("{name}=\"");
    let start = tag.find(&marker)? + marker.len();
    let end = tag[start..].find('"')?;
    Some(decode_entities(&tag[start..start + end]))
}

fn unwrap_cdata(value: &str) -> String {
    value
        .strip_prefix("<![CDATA[")
        .and_then(|inner| inner.strip_suffix("]]>"))
        .unwrap_or(value)
        .to_string()
}

/// Decode the named entities feeds actually use plus numeric references.
pub fn decode_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        let after = &rest[at..];
        let Some(semi) = after.find(';') else {
            out.push_str(after);
            return out;
        };
        let entity = &after[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let decoded = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        // Unknown entity: keep it verbatim.
                        out.push_str(&after[..semi + 1]);
                    }
                }
            }
        }
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:letterboxd="https://letterboxd.com">
<channel>
  <title>Films</title>
  <item>
    <title><![CDATA[Blade Runner, 1982 - ★★★★]]></title>
    <link>https://letterboxd.com/example/film/blade-runner/</link>
    <pubDate>Sat, 01 Feb 2025 12:00:00 +0000</pubDate>
    <letterboxd:memberRating>4.0</letterboxd:memberRating>
  </item>
  <item>
    <title>Tips &amp; Tricks</title>
    <link>https://medium.com/@example/tips</link>
    <pubDate>Mon, 03 Feb 2025 09:00:00 +0000</pubDate>
  </item>
  <item>
    <description>no title, skipped</description>
  </item>
</channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Activity</title>
  <entry>
    <id>tag:github.com,2008:PushEvent/1</id>
    <title>someone pushed to main in someone/repo</title>
    <link type="text/html" rel="alternate" href="https://github.com/someone/repo/compare/a...b"/>
    <published>2025-02-01T10:00:00Z</published>
  </entry>
  <entry>
    <title>starred something</title>
    <link href="https://github.com/other/repo"/>
    <updated>2025-01-30T08:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn rss_items_parse_with_cdata_and_rating() {
        let items = parse_rss_items(RSS, 10);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Blade Runner, 1982 - ★★★★");
        assert_eq!(items[0].rating.as_deref(), Some("4.0"));
        assert_eq!(items[1].title, "Tips & Tricks");
        assert_eq!(items[1].link, "https://medium.com/@example/tips");
    }

    #[test]
    fn rss_limit_applies() {
        assert_eq!(parse_rss_items(RSS, 1).len(), 1);
    }

    #[test]
    fn atom_entries_parse_with_href_links() {
        let entries = parse_atom_entries(ATOM, 10);
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].link,
            "https://github.com/someone/repo/compare/a...b"
        );
        assert_eq!(entries[0].published, "2025-02-01T10:00:00Z");
        assert_eq!(entries[1].published, "2025-01-30T08:00:00Z");
    }

    #[test]
    fn malformed_xml_yields_nothing() {
        assert!(parse_rss_items("<item><title>unclosed", 5).is_empty());
        assert!(parse_atom_entries("not xml at all", 5).is_empty());
    }

    #[test]
    fn entity_decoding() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;i&gt;"), "<i>");
        assert_eq!(decode_entities("&#8212;"), "\u{2014}");
        assert_eq!(decode_entities("&#x2014;"), "\u{2014}");
        assert_eq!(decode_entities("&unknown; stays"), "&unknown; stays");
        assert_eq!(decode_entities("no entities"), "no entities");
    }
}
