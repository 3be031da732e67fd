//! Static file serving
//!
//! Extension-based MIME lookup, gzip for compressible text above a size
//! floor, and clean-URL fallbacks: `/about` tries `about.html` then
//! `about/index.html`. Missing paths serve `404.html` when the web root
//! ships one.

use flate2::{Compression, write::GzEncoder};
use http::{HeaderMap, HeaderValue, StatusCode, header};
use percent_encoding::percent_decode_str;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct ResolvedFile {
    pub body: Vec<u8>,
    pub content_type: String,
    pub status: StatusCode,
}

pub struct ServePlan {
    pub body: Vec<u8>,
    pub content_type: String,
    pub status: StatusCode,
    pub gzipped: bool,
    pub cache_control: &'static str,
}

/// Map a request path onto the web root and read the file, applying the
/// clean-URL rules. Returns `None` when nothing matches (including the
/// missing-404-page case) so the handler can emit a plain not-found.
pub async fn resolve(web_root: &Path, raw_path: &str) -> Option<ResolvedFile> {
    let decoded = percent_decode_str(raw_path.trim_start_matches('/'))
        .decode_utf8()
        .ok()?;
    let relative = decoded.as_ref();
    if !is_safe_path(relative) {
        return not_found_page(web_root).await;
    }

    for candidate in candidates(relative) {
        let path = web_root.join(&candidate);
        if let Some(body) = read_within_root(web_root, &path).await {
            let content_type = content_type_for(&path);
            return Some(ResolvedFile {
                body,
                content_type,
                status: StatusCode::OK,
            });
        }
    }

    not_found_page(web_root).await
}

async fn not_found_page(web_root: &Path) -> Option<ResolvedFile> {
    let path = web_root.join("404.html");
    let body = read_within_root(web_root, &path).await?;
    Some(ResolvedFile {
        body,
        content_type: "text/html; charset=utf-8".to_string(),
        status: StatusCode::NOT_FOUND,
    })
}

/// Candidate relative paths in probe order.
fn candidates(relative: &str) -> Vec<PathBuf> {
    if relative.is_empty() {
        return vec![PathBuf::from("index.html")];
    }
    let mut list = Vec::new();
    let has_extension = Path::new(relative)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some();
    if has_extension {
        list.push(PathBuf::from(relative));
    } else {
        let trimmed = relative.trim_end_matches('/');
        list.push(PathBuf::from(format!("{trimmed}.html")));
        list.push(Path::new(trimmed).join("index.html"));
    }
    list
}

fn is_safe_path(relative: &str) -> bool {
    if relative.contains('\0') {
        return false;
    }
    !Path::new(relative).components().any(|component| {
        matches!(
            component,
            std::path::Component::ParentDir
                | std::path::Component::RootDir
                | std::path::Component::Prefix(_)
        )
    })
}

/// Read a file only if its canonical location stays inside the web root.
async fn read_within_root(web_root: &Path, path: &Path) -> Option<Vec<u8>> {
    let canonical_root = tokio::fs::canonicalize(web_root).await.ok()?;
    let canonical = tokio::fs::canonicalize(path).await.ok()?;
    if !canonical.starts_with(&canonical_root) {
        return None;
    }
    let metadata = tokio::fs::metadata(&canonical).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    tokio::fs::read(&canonical).await.ok()
}

fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

pub fn is_compressible(content_type: &str) -> bool {
    let main = content_type.split(';').next().unwrap_or("").trim();
    main.starts_with("text/")
        || main == "application/json"
        || main == "application/javascript"
        || main == "application/xml"
        || main == "image/svg+xml"
        || main.ends_with("+xml")
        || main.ends_with("+json")
}

pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .any(|token| token.trim().split(';').next() == Some("gzip"))
        })
        .unwrap_or(false)
}

/// Decide encoding and cache headers for a resolved file.
pub fn plan_response(
    file: ResolvedFile,
    headers: &HeaderMap,
    gzip_min_bytes: usize,
    asset_max_age: Duration,
) -> ServePlan {
    let compress = accepts_gzip(headers)
        && is_compressible(&file.content_type)
        && file.body.len() >= gzip_min_bytes;

    let (body, gzipped) = if compress {
        match gzip(&file.body) {
            Some(compressed) => (compressed, true),
            None => (file.body, false),
        }
    } else {
        (file.body, false)
    };

    let cache_control = if file.content_type.starts_with("text/html") {
        "no-cache"
    } else {
        cache_control_max_age(asset_max_age)
    };

    ServePlan {
        body,
        content_type: file.content_type,
        status: file.status,
        gzipped,
        cache_control,
    }
}

fn gzip(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity((bytes.len() / 2).max(256)),
        Compression::fast(),
    );
    encoder.write_all(bytes).ok()?;
    encoder.finish().ok()
}

fn cache_control_max_age(max_age: Duration) -> &'static str {
    // The configured value only varies in tests; a small static table keeps
    // the header a 'static str.
    match max_age.as_secs() {
        604_800 => "public, max-age=604800",
        86_400 => "public, max-age=86400",
        _ => "public, max-age=3600",
    }
}

pub fn content_type_header(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}
