use anyhow::{Result, anyhow};
use std::env;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 2048;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub max_payload_bytes: usize,
    pub motd_path: String,
    pub allowed_origins: Vec<String>,
    pub allow_all_origins: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let port = parse_port("PORT", DEFAULT_PORT)?;
        let max_payload_bytes = parse_positive("MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES)?;
        let motd_path = env::var("MOTD_PATH").unwrap_or_default();

        let allowed_origins = parse_list(&env::var("CORS_ALLOW_ORIGIN").unwrap_or_default());
        let allow_all_origins = env::var("ALLOW_ALL_ORIGINS")
            .unwrap_or_default()
            .eq_ignore_ascii_case("true");
        let allow_all_origins =
            allow_all_origins && allowed_origins.iter().any(|origin| origin == "*");

        if !allow_all_origins && allowed_origins.is_empty() {
            return Err(anyhow!(
                "CORS_ALLOW_ORIGIN must include at least one allowed origin (or set ALLOW_ALL_ORIGINS=true with \"*\")"
            ));
        }

        Ok(Self {
            port,
            max_payload_bytes,
            motd_path,
            allowed_origins,
            allow_all_origins,
        })
    }
}

fn parse_port(name: &str, fallback: u16) -> Result<u16> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value.trim().parse::<u16>().unwrap_or(0);
            if parsed == 0 {
                Err(anyhow!("{name} must be greater than zero"))
            } else {
                Ok(parsed)
            }
        }
        Err(_) => Ok(fallback),
    }
}

fn parse_positive(name: &str, fallback: usize) -> Result<usize> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value.trim().parse::<usize>().unwrap_or(0);
            if parsed == 0 {
                Err(anyhow!("{name} must be greater than zero"))
            } else {
                Ok(parsed)
            }
        }
        Err(_) => Ok(fallback),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}
