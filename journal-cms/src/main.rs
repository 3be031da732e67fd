use anyhow::{Context, Result, anyhow};
use journal_cms::content::load_content;
use journal_cms::feeds::{FeedMeta, build_atom, build_rss};
use journal_cms::logger::Logger;
use journal_cms::pages::{render_entry_page, render_index_page};
use journal_cms::store::{collect_stories, save_entries};
use journal_cms::story::generate_slug;
use serde_json::json;
use std::env;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

const USAGE: &str = "Usage: journal-cms <command>

Commands:
  add       Interactively add a new journal entry
  list      List all entries
  generate  Write journal pages and RSS/Atom feeds
  sync      Rebuild journal-entries.json from stories/
  help      Show this message

Environment:
  JOURNAL_ROOT   Base directory (default: current directory)
  SITE_URL       Public site URL used in feeds";

fn main() {
    let logger = Logger::new("journal-cms");
    let command = env::args().nth(1).unwrap_or_default();

    let outcome = match command.as_str() {
        "add" => cmd_add(&logger),
        "list" => cmd_list(&logger),
        "generate" => cmd_generate(&logger),
        "sync" => cmd_sync(&logger).map(|_| ()),
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            Ok(())
        }
        "" => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
        other => {
            eprintln!("Unknown command: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(error) = outcome {
        logger.error(
            "command.failed",
            json!({ "command": command, "error": format!("{error:#}") }),
        );
        std::process::exit(1);
    }
}

struct Layout {
    stories_dir: PathBuf,
    entries_file: PathBuf,
    content_file: PathBuf,
    journal_dir: PathBuf,
    rss_file: PathBuf,
    atom_file: PathBuf,
}

impl Layout {
    fn resolve() -> Self {
        let root = env::var("JOURNAL_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self {
            stories_dir: root.join("stories"),
            entries_file: root.join("journal-entries.json"),
            content_file: root.join("content.json"),
            journal_dir: root.join("journal"),
            rss_file: root.join("journal-feed.xml"),
            atom_file: root.join("journal-atom.xml"),
        }
    }
}

fn feed_meta() -> FeedMeta {
    let site_url = env::var("SITE_URL").unwrap_or_else(|_| "https://example.net".to_string());
    let site_url = site_url.trim_end_matches('/').to_string();
    FeedMeta {
        title: "Journal".to_string(),
        feed_url: format!("{site_url}/journal-feed.xml"),
        description: "Links and notes from around the site".to_string(),
        author: env::var("FEED_AUTHOR").unwrap_or_else(|_| "the editor".to_string()),
        site_url,
    }
}

fn cmd_sync(logger: &Logger) -> Result<Vec<journal_cms::story::StoryEntry>> {
    let layout = Layout::resolve();
    let entries = collect_stories(&layout.stories_dir, logger)?;
    save_entries(&layout.entries_file, &entries)?;
    logger.info(
        "sync.completed",
        json!({
            "entries": entries.len(),
            "output": layout.entries_file.display().to_string(),
        }),
    );
    Ok(entries)
}

fn cmd_list(logger: &Logger) -> Result<()> {
    let layout = Layout::resolve();
    let entries = collect_stories(&layout.stories_dir, logger)?;
    if entries.is_empty() {
        println!("No journal entries yet. Run `journal-cms add` to write one.");
        return Ok(());
    }
    for entry in &entries {
        let tags = if entry.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", entry.tags.join(", "))
        };
        println!("{}  {}  {}{}", entry.date, entry.id, entry.title, tags);
    }
    Ok(())
}

fn cmd_generate(logger: &Logger) -> Result<()> {
    let layout = Layout::resolve();
    let entries = cmd_sync(logger)?;

    fs::create_dir_all(&layout.journal_dir).with_context(|| {
        format!(
            "failed to create journal dir {}",
            layout.journal_dir.display()
        )
    })?;
    for entry in &entries {
        let path = layout.journal_dir.join(format!("{}.html", entry.slug));
        fs::write(&path, render_entry_page(entry))
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    let index_path = layout.journal_dir.join("index.html");
    fs::write(&index_path, render_index_page(&entries))
        .with_context(|| format!("failed to write {}", index_path.display()))?;

    let content = load_content(&layout.content_file)?;
    let meta = feed_meta();
    let now = OffsetDateTime::now_utc();
    fs::write(&layout.rss_file, build_rss(&content, &meta, now)?)
        .with_context(|| format!("failed to write {}", layout.rss_file.display()))?;
    fs::write(&layout.atom_file, build_atom(&content, &meta, now)?)
        .with_context(|| format!("failed to write {}", layout.atom_file.display()))?;

    logger.info(
        "generate.completed",
        json!({
            "pages": entries.len() + 1,
            "feedItems": content.recent_links.len()
                + usize::from(content.currently_reading.is_some()),
        }),
    );
    Ok(())
}

fn cmd_add(logger: &Logger) -> Result<()> {
    let layout = Layout::resolve();
    fs::create_dir_all(&layout.stories_dir).with_context(|| {
        format!(
            "failed to create stories dir {}",
            layout.stories_dir.display()
        )
    })?;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    let title = prompt(&mut lines, "Title: ")?;
    if title.trim().is_empty() {
        return Err(anyhow!("a title is required"));
    }

    let today = OffsetDateTime::now_utc()
        .date()
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default();
    let date = prompt(&mut lines, &format!("Date [{today}]: "))?;
    let date = if date.trim().is_empty() {
        today
    } else {
        date.trim().to_string()
    };

    let tags = prompt(&mut lines, "Tags (comma separated, optional): ")?;

    println!("Body (finish with a single '.' on its own line):");
    let mut body = Vec::new();
    for line in lines.by_ref() {
        let line = line.context("failed to read from stdin")?;
        if line.trim() == "." {
            break;
        }
        body.push(line);
    }

    let slug = generate_slug(title.trim());
    if slug.is_empty() {
        return Err(anyhow!("title produces an empty slug"));
    }
    let path = unique_story_path(&layout.stories_dir, &slug);

    let mut file_body = format!("Title: {}\nDate: {}\n", title.trim(), date);
    if !tags.trim().is_empty() {
        file_body.push_str(&format!("Tags: {}\n", tags.trim()));
    }
    file_body.push('\n');
    file_body.push_str(&body.join("\n"));
    file_body.push('\n');

    fs::write(&path, file_body)
        .with_context(|| format!("failed to write {}", path.display()))?;
    logger.info(
        "add.story_written",
        json!({ "path": path.display().to_string() }),
    );

    cmd_sync(logger).map(|_| ())
}

fn unique_story_path(dir: &Path, slug: &str) -> PathBuf {
    let direct = dir.join(format!("{slug}.txt"));
    if !direct.exists() {
        return direct;
    }
    let mut counter = 2;
    loop {
        let candidate = dir.join(format!("{slug}-{counter}.txt"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn prompt(
    lines: &mut std::io::Lines<std::io::StdinLock<'_>>,
    label: &str,
) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush().ok();
    match lines.next() {
        Some(line) => line.context("failed to read from stdin"),
        None => Err(anyhow!("stdin closed before input was complete")),
    }
}
