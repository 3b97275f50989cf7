//! Per-invocation metrics collection.
//!
//! An [`Inspector`] is created when an invocation starts, collects
//! attributes while the stage runs and is consumed by [`Inspector::finish`],
//! which stamps the end time and runtime and hands back the record.

use std::time::Instant;

use chrono::Utc;
use serde_json::{Map, Value};

/// Attribute name to JSON value, as returned to the caller.
pub type MetricsRecord = Map<String, Value>;

/// Attributes never echoed to logs.
const LOG_EXCLUDED: &[&str] = &["image_data"];

const ENV_FUNCTION_NAME: &str = "AWS_LAMBDA_FUNCTION_NAME";
const ENV_FUNCTION_MEMORY: &str = "AWS_LAMBDA_FUNCTION_MEMORY_SIZE";
const ENV_FUNCTION_REGION: &str = "AWS_REGION";

#[derive(Debug)]
pub struct Inspector {
    attributes: MetricsRecord,
    started: Instant,
    start_millis: i64,
}

impl Inspector {
    /// Begin an invocation, recording facts about the runtime environment.
    pub fn start() -> Self {
        Self::start_with_env(|name| std::env::var(name).ok())
    }

    /// Like [`Inspector::start`], reading host variables through `lookup`.
    pub fn start_with_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let start_millis = Utc::now().timestamp_millis();
        let mut inspector = Self {
            attributes: Map::new(),
            started: Instant::now(),
            start_millis,
        };

        inspector.add_attribute("version", env!("CARGO_PKG_VERSION"));
        inspector.add_attribute("lang", "rust");
        inspector.add_attribute("platform", std::env::consts::OS);
        inspector.add_attribute("architecture", std::env::consts::ARCH);
        inspector.add_attribute("processId", std::process::id());
        inspector.add_attribute("startTime", start_millis);

        if let Some(name) = lookup(ENV_FUNCTION_NAME) {
            inspector.add_attribute("functionName", name);
        }
        if let Some(memory) = lookup(ENV_FUNCTION_MEMORY) {
            match memory.parse::<u64>() {
                Ok(mb) => inspector.add_attribute("functionMemory", mb),
                Err(_) => inspector.add_attribute("functionMemory", memory),
            }
        }
        if let Some(region) = lookup(ENV_FUNCTION_REGION) {
            inspector.add_attribute("functionRegion", region);
        }

        inspector
    }

    /// Set `key`, replacing any earlier value.
    pub fn add_attribute(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn start_millis(&self) -> i64 {
        self.start_millis
    }

    /// Stamp `endTime` and `runtime` (milliseconds) and return the record.
    pub fn finish(mut self) -> MetricsRecord {
        let runtime = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.add_attribute("endTime", Utc::now().timestamp_millis());
        self.add_attribute("runtime", runtime);
        self.attributes
    }
}

/// JSON rendering of `record` suitable for a log line.
pub fn log_summary(record: &MetricsRecord) -> String {
    let trimmed: Map<String, Value> = record
        .iter()
        .filter(|(key, _)| !LOG_EXCLUDED.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(trimmed).to_string()
}
