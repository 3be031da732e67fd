//! Static page generation
//!
//! One HTML page per entry plus an index, emitted from embedded templates.
//! The layout intentionally stays dependency-free: the site ships as plain
//! files behind the static server.

use crate::markdown::{escape_html, render_markdown};
use crate::story::StoryEntry;

const PAGE_STYLESHEET: &str = "/css/journal.css";

pub fn render_entry_page(entry: &StoryEntry) -> String {
    let tags = if entry.tags.is_empty() {
        String::new()
    } else {
        let joined = entry
            .tags
            .iter()
            .map(|tag| format!("<span class=\"tag\">{}</span>", escape_html(tag)))
            .collect::<Vec<_>>()
            .join(" ");
        format!("<div class=\"tags\">{joined}</div>\n")
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title} — Journal</title>\n\
<link rel=\"stylesheet\" href=\"{stylesheet}\">\n\
<link rel=\"alternate\" type=\"application/rss+xml\" href=\"/journal-feed.xml\">\n\
</head>\n<body>\n<main class=\"journal-entry\">\n\
<a class=\"back\" href=\"/journal/\">&larr; all entries</a>\n\
<h1>{title}</h1>\n<time datetime=\"{date}\">{date}</time>\n{tags}\
<article>\n{body}\n</article>\n</main>\n</body>\n</html>\n",
        title = escape_html(&entry.title),
        date = escape_html(&entry.date),
        stylesheet = PAGE_STYLESHEET,
        tags = tags,
        body = render_markdown(&entry.content),
    )
}

pub fn render_index_page(entries: &[StoryEntry]) -> String {
    let items = entries
        .iter()
        .map(|entry| {
            format!(
                "<li><time datetime=\"{date}\">{date}</time> \
<a href=\"/journal/{slug}.html\">{title}</a></li>",
                date = escape_html(&entry.date),
                slug = entry.slug,
                title = escape_html(&entry.title),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>Journal</title>\n\
<link rel=\"stylesheet\" href=\"{stylesheet}\">\n\
<link rel=\"alternate\" type=\"application/rss+xml\" href=\"/journal-feed.xml\">\n\
</head>\n<body>\n<main class=\"journal-index\">\n<h1>Journal</h1>\n\
<ul class=\"entries\">\n{items}\n</ul>\n</main>\n</body>\n</html>\n",
        stylesheet = PAGE_STYLESHEET,
        items = items,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::parse_story;

    #[test]
    fn entry_page_renders_body_and_escapes_title() {
        let entry =
            parse_story("Title: Tags <& such>\nDate: 2025-01-02\n\n# Hello\n\nBody here").unwrap();
        let html = render_entry_page(&entry);
        assert!(html.contains("<title>Tags &lt;&amp; such&gt; — Journal</title>"));
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>Body here</p>"));
    }

    #[test]
    fn index_links_every_entry() {
        let entries = vec![
            parse_story("Title: One\nDate: 2025-01-01\n\nx").unwrap(),
            parse_story("Title: Two\nDate: 2025-01-02\n\nx").unwrap(),
        ];
        let html = render_index_page(&entries);
        assert!(html.contains("/journal/one.html"));
        assert!(html.contains("/journal/two.html"));
    }

    #[test]
    fn tags_render_when_present() {
        let entry = parse_story("Title: T\nDate: 2025-01-01\nTags: a, b\n\nx").unwrap();
        let html = render_entry_page(&entry);
        assert_eq!(html.matches("class=\"tag\"").count(), 2);
    }
}
