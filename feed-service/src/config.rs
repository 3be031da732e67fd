use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 4030;
const DEFAULT_MAX_FEED_BYTES: usize = 1024 * 1024;
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 10 * 60;
const DEFAULT_MAX_ITEMS: usize = 5;

const DEFAULT_MEDIUM_FEED: &str = "https://medium.com/feed/@example";
const DEFAULT_LETTERBOXD_FEED: &str = "https://letterboxd.com/example/rss/";
const DEFAULT_GITHUB_FEED: &str = "https://github.com/example.atom";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub timeout: Duration,
    pub max_feed_bytes: usize,
    pub cache_ttl: Duration,
    pub max_items: usize,
    pub medium_feed_url: String,
    pub letterboxd_feed_url: String,
    pub github_feed_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let port = parse_port(env::var("PORT").ok(), DEFAULT_PORT);

        let timeout_seconds = parse_positive_usize(
            env::var("FEED_TIMEOUT_SECONDS").ok(),
            DEFAULT_TIMEOUT_SECONDS as usize,
        )
        .clamp(1, 60) as u64;
        let timeout = Duration::from_secs(timeout_seconds);

        let max_feed_bytes =
            parse_positive_usize(env::var("FEED_MAX_BYTES").ok(), DEFAULT_MAX_FEED_BYTES)
                .clamp(16 * 1024, 10 * 1024 * 1024);

        let cache_ttl = Duration::from_secs(parse_positive_usize(
            env::var("FEED_CACHE_TTL_SECONDS").ok(),
            DEFAULT_CACHE_TTL_SECONDS as usize,
        ) as u64);

        let max_items = parse_positive_usize(env::var("FEED_MAX_ITEMS").ok(), DEFAULT_MAX_ITEMS)
            .clamp(1, 25);

        let data_dir = PathBuf::from(
            env::var("FEED_DATA_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| ".".to_string()),
        );

        Ok(Self {
            port,
            timeout,
            max_feed_bytes,
            cache_ttl,
            max_items,
            medium_feed_url: url_from_env("MEDIUM_FEED_URL", DEFAULT_MEDIUM_FEED),
            letterboxd_feed_url: url_from_env("LETTERBOXD_FEED_URL", DEFAULT_LETTERBOXD_FEED),
            github_feed_url: url_from_env("GITHUB_FEED_URL", DEFAULT_GITHUB_FEED),
            data_dir,
        })
    }
}

fn url_from_env(name: &str, default_value: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default_value.to_string())
}

fn parse_positive_usize(value: Option<String>, default_value: usize) -> usize {
    value
        .as_deref()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|parsed| *parsed > 0)
        .unwrap_or(default_value)
}

fn parse_port(value: Option<String>, default_value: u16) -> u16 {
    value
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u16>().ok())
        .filter(|parsed| *parsed > 0)
        .unwrap_or(default_value)
}
