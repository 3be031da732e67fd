use crate::logger::Logger;
use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::{env, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WEB_ROOT: &str = "./public";
const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 60;
const DEFAULT_GZIP_MIN_BYTES: usize = 1024;
const DEFAULT_ASSET_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

/// SHA-256 of the advisor gate password carried over from the original
/// site. Shipping a default hash is an obfuscation gate, not a security
/// boundary; deployments override ADVISOR_PASSWORD_HASH.
const DEFAULT_ADVISOR_PASSWORD_HASH: &str =
    "6b07f7ecaf72ae5acc240e02e23768cf390ab7291d7743c182b1eb701597ba51";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub web_root: PathBuf,
    pub request_timeout: Duration,
    pub gzip_min_bytes: usize,
    pub asset_max_age: Duration,
    pub advisor: AdvisorConfig,
    pub theme: ThemeConfig,
}

#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    pub password_hash: String,
    pub password_hash_is_default: bool,
    pub session_ttl: Duration,
    pub cookie_name: String,
}

#[derive(Clone, Debug)]
pub struct ThemeConfig {
    pub christmas_stylesheet: String,
    pub halloween_stylesheet: String,
}

impl Config {
    pub fn load(logger: &Logger) -> Result<Self> {
        let port = parse_port(env::var("PORT").ok(), DEFAULT_PORT);
        let web_root = PathBuf::from(
            env::var("WEB_ROOT")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WEB_ROOT.to_string()),
        );

        let request_timeout = Duration::from_millis(parse_positive_int(
            env::var("REQUEST_TIMEOUT_MS").ok(),
            10_000,
        ) as u64);

        let gzip_min_bytes = parse_positive_int(
            env::var("GZIP_MIN_BYTES").ok(),
            DEFAULT_GZIP_MIN_BYTES as i64,
        ) as usize;
        let asset_max_age = Duration::from_secs(parse_positive_int(
            env::var("ASSET_MAX_AGE_SECONDS").ok(),
            DEFAULT_ASSET_MAX_AGE_SECONDS,
        ) as u64);

        let (password_hash, password_hash_is_default) = match env::var("ADVISOR_PASSWORD_HASH")
            .ok()
            .map(|raw| raw.trim().to_lowercase())
            .filter(|value| !value.is_empty())
        {
            Some(hash) => {
                if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(anyhow!(
                        "ADVISOR_PASSWORD_HASH must be 64 hex characters (sha-256)"
                    ));
                }
                (hash, false)
            }
            None => (DEFAULT_ADVISOR_PASSWORD_HASH.to_string(), true),
        };
        if password_hash_is_default {
            logger.warn(
                "advisor.default_hash",
                serde_json::json!({
                    "message": "ADVISOR_PASSWORD_HASH not set; using the built-in hash"
                }),
            );
        }

        let session_ttl = Duration::from_secs(parse_positive_int(
            env::var("ADVISOR_SESSION_TTL_SECONDS").ok(),
            DEFAULT_SESSION_TTL_SECONDS,
        ) as u64);
        let cookie_name = env::var("ADVISOR_COOKIE_NAME")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "advisor.sid".to_string());

        let theme = ThemeConfig {
            christmas_stylesheet: env::var("THEME_CHRISTMAS_CSS")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| "/css/christmas.css".to_string()),
            halloween_stylesheet: env::var("THEME_HALLOWEEN_CSS")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| "/css/halloween.css".to_string()),
        };

        Ok(Self {
            port,
            web_root,
            request_timeout,
            gzip_min_bytes,
            asset_max_age,
            advisor: AdvisorConfig {
                password_hash,
                password_hash_is_default,
                session_ttl,
                cookie_name,
            },
            theme,
        })
    }
}

fn parse_port(value: Option<String>, fallback: u16) -> u16 {
    value
        .and_then(|raw| raw.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(fallback)
}

fn parse_positive_int(value: Option<String>, fallback: i64) -> i64 {
    value
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(fallback)
}
