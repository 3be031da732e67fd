use serde::Serialize;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Clone)]
pub struct SiteMetrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    start_time: Instant,
    active_requests: AtomicU64,
    total_requests: AtomicU64,
    not_found_responses: AtomicU64,
    gzip_responses: AtomicU64,
}

#[derive(Debug, Serialize, Clone)]
pub struct SiteStatus {
    pub status: &'static str,
    pub uptime_ms: u64,
    pub active_requests: u64,
    pub total_requests: u64,
    pub not_found_responses: u64,
    pub gzip_responses: u64,
    pub rss_bytes: u64,
}

impl SiteMetrics {
    pub fn new() -> Self {
        SiteMetrics {
            inner: Arc::new(MetricsInner {
                start_time: Instant::now(),
                active_requests: AtomicU64::new(0),
                total_requests: AtomicU64::new(0),
                not_found_responses: AtomicU64::new(0),
                gzip_responses: AtomicU64::new(0),
            }),
        }
    }

    pub fn start_request(&self) {
        self.inner.active_requests.fetch_add(1, Ordering::Relaxed);
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn finish_request(&self) {
        self.inner.active_requests.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.inner.not_found_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gzip(&self) {
        self.inner.gzip_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SiteStatus {
        SiteStatus {
            status: "ok",
            uptime_ms: self.inner.start_time.elapsed().as_millis() as u64,
            active_requests: self.inner.active_requests.load(Ordering::Relaxed),
            total_requests: self.inner.total_requests.load(Ordering::Relaxed),
            not_found_responses: self.inner.not_found_responses.load(Ordering::Relaxed),
            gzip_responses: self.inner.gzip_responses.load(Ordering::Relaxed),
            rss_bytes: current_rss_bytes(),
        }
    }
}

impl Default for SiteMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn current_rss_bytes() -> u64 {
    // Linux-only best effort: read RSS pages from /proc/self/statm.
    if let Ok(contents) = fs::read_to_string("/proc/self/statm")
        && let Some(rss_pages_str) = contents.split_whitespace().nth(1)
        && let Ok(rss_pages) = rss_pages_str.parse::<u64>()
    {
        return rss_pages.saturating_mul(page_size::get() as u64);
    }
    0
}
