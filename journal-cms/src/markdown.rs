//! Constrained markdown-to-HTML conversion
//!
//! Block-splitting over double newlines: `#`..`###` headings, `- ` lists,
//! fenced code blocks, paragraphs. Inline: bold, italic, code spans,
//! links. Raw HTML in the source is escaped before any conversion, and
//! malformed input always falls through as plain text.

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

pub fn render_markdown(source: &str) -> String {
    let mut html = Vec::new();
    for block in split_blocks(source) {
        match block {
            Block::Code(code) => {
                html.push(format!("<pre><code>{}</code></pre>", escape_html(&code)));
            }
            Block::Text(text) => html.push(render_text_block(&text)),
        }
    }
    html.join("\n")
}

enum Block {
    Text(String),
    Code(String),
}

/// Split on blank lines, keeping fenced code together even when it
/// contains blank lines of its own.
fn split_blocks(source: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    let mut code: Option<Vec<String>> = None;

    for line in source.lines() {
        if let Some(buffer) = code.as_mut() {
            if line.trim_start().starts_with("```") {
                blocks.push(Block::Code(buffer.join("\n")));
                code = None;
            } else {
                buffer.push(line.to_string());
            }
            continue;
        }
        if line.trim_start().starts_with("```") {
            if !current.is_empty() {
                blocks.push(Block::Text(current.join("\n")));
                current = Vec::new();
            }
            code = Some(Vec::new());
            continue;
        }
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(Block::Text(current.join("\n")));
                current = Vec::new();
            }
            continue;
        }
        current.push(line.to_string());
    }
    // An unterminated fence still renders as code rather than disappearing.
    if let Some(buffer) = code {
        blocks.push(Block::Code(buffer.join("\n")));
    }
    if !current.is_empty() {
        blocks.push(Block::Text(current.join("\n")));
    }
    blocks
}

fn render_text_block(block: &str) -> String {
    let lines: Vec<&str> = block.lines().collect();

    if lines.iter().all(|line| line.trim_start().starts_with("- ")) {
        let items: Vec<String> = lines
            .iter()
            .map(|line| {
                let item = line.trim_start().trim_start_matches("- ");
                format!("<li>{}</li>", render_inline(item))
            })
            .collect();
        return format!("<ul>{}</ul>", items.join(""));
    }

    if lines.len() == 1 {
        let line = lines[0].trim_start();
        for (marker, tag) in [("### ", "h3"), ("## ", "h2"), ("# ", "h1")] {
            if let Some(rest) = line.strip_prefix(marker) {
                return format!("<{tag}>{}</{tag}>", render_inline(rest));
            }
        }
    }

    format!("<p>{}</p>", render_inline(&lines.join(" ")))
}

/// Inline spans over escaped text: links first, then bold, italic, code.
fn render_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let linked = render_links(&escaped);
    let bolded = render_delimited(&linked, "**", "strong");
    let coded = render_delimited(&bolded, "`", "code");
    render_delimited(&coded, "*", "em")
}

fn render_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find("](") else {
            break;
        };
        let close = open + close;
        let Some(end) = rest[close..].find(')') else {
            break;
        };
        let end = close + end;
        let label = &rest[open + 1..close];
        let href = &rest[close + 2..end];
        // Escaped text can still smuggle odd schemes; keep only the tame ones.
        if !(href.starts_with("http://") || href.starts_with("https://") || href.starts_with('/')) {
            out.push_str(&rest[..open + 1]);
            rest = &rest[open + 1..];
            continue;
        }
        out.push_str(&rest[..open]);
        out.push_str(&format!("<a href=\"{href}\">{label}</a>"));
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

fn render_delimited(text: &str, delimiter: &str, tag: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(open) = rest.find(delimiter) else {
            break;
        };
        let after = &rest[open + delimiter.len()..];
        let Some(close) = after.find(delimiter) else {
            break;
        };
        let inner = &after[..close];
        if inner.is_empty() {
            out.push_str(&rest[..open + delimiter.len()]);
            rest = after;
            continue;
        }
        out.push_str(&rest[..open]);
        out.push_str(&format!("<{tag}>{inner}</{tag}>"));
        rest = &after[close + delimiter.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        assert_eq!(render_markdown("one\n\ntwo"), "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn multiline_paragraph_joins_with_spaces() {
        assert_eq!(render_markdown("one\ntwo"), "<p>one two</p>");
    }

    #[test]
    fn headings() {
        assert_eq!(render_markdown("# Title"), "<h1>Title</h1>");
        assert_eq!(render_markdown("## Sub"), "<h2>Sub</h2>");
        assert_eq!(render_markdown("### Deep"), "<h3>Deep</h3>");
    }

    #[test]
    fn lists() {
        assert_eq!(
            render_markdown("- a\n- b"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn inline_spans() {
        assert_eq!(render_markdown("**bold**"), "<p><strong>bold</strong></p>");
        assert_eq!(render_markdown("*em*"), "<p><em>em</em></p>");
        assert_eq!(render_markdown("`code`"), "<p><code>code</code></p>");
        assert_eq!(
            render_markdown("[site](https://example.com)"),
            "<p><a href=\"https://example.com\">site</a></p>"
        );
    }

    #[test]
    fn raw_html_is_escaped() {
        assert_eq!(
            render_markdown("<script>alert(1)</script>"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn javascript_links_are_not_rendered() {
        let html = render_markdown("[x](javascript:alert(1))");
        assert!(!html.contains("<a "));
    }

    #[test]
    fn fenced_code_keeps_blank_lines_and_escapes() {
        let html = render_markdown("```\nlet x = 1;\n\nx < 2\n```");
        assert_eq!(html, "<pre><code>let x = 1;\n\nx &lt; 2</code></pre>");
    }

    #[test]
    fn unterminated_fence_still_renders() {
        let html = render_markdown("```\ndangling");
        assert_eq!(html, "<pre><code>dangling</code></pre>");
    }

    #[test]
    fn unbalanced_markers_fall_through() {
        assert_eq!(render_markdown("a ** b"), "<p>a ** b</p>");
        assert_eq!(render_markdown("[broken](link"), "<p>[broken](link</p>");
    }
}
