use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Structured JSON-lines logger. Warnings and errors go to stderr so the
/// access log on stdout stays machine-parsable on its own.
#[derive(Clone)]
pub struct Logger {
    service: Arc<str>,
    debug_enabled: bool,
}

impl Logger {
    pub fn new(service: &'static str) -> Self {
        let debug_enabled = std::env::var("LOG_LEVEL")
            .map(|value| value.eq_ignore_ascii_case("debug"))
            .unwrap_or(false);
        Self {
            service: Arc::from(service),
            debug_enabled,
        }
    }

    fn emit<T: Serialize>(&self, level: &str, event: &str, context: T) {
        let timestamp = OffsetDateTime::now_utc();
        let serialized = serde_json::to_value(context).unwrap_or(Value::Null);
        let mut payload = serde_json::Map::new();
        payload.insert(
            "timestamp".into(),
            Value::String(
                timestamp
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| timestamp.to_string()),
            ),
        );
        payload.insert("service".into(), Value::String(self.service.to_string()));
        payload.insert("level".into(), Value::String(level.to_string()));
        payload.insert("event".into(), Value::String(event.to_string()));

        match serialized {
            Value::Object(map) => {
                for (key, value) in map {
                    payload.insert(key, value);
                }
            }
            Value::Null => {}
            other => {
                payload.insert("context".into(), other);
            }
        }

        let line = Value::Object(payload).to_string();
        match level {
            "error" | "warn" => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    pub fn debug<T: Serialize>(&self, event: &str, context: T) {
        if self.debug_enabled {
            self.emit("debug", event, context);
        }
    }

    pub fn info<T: Serialize>(&self, event: &str, context: T) {
        self.emit("info", event, context);
    }

    pub fn warn<T: Serialize>(&self, event: &str, context: T) {
        self.emit("warn", event, context);
    }

    pub fn error<T: Serialize>(&self, event: &str, context: T) {
        self.emit("error", event, context);
    }
}
