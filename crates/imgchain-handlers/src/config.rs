//! Pipeline configuration.
//!
//! `Default` gives a working local setup; [`PipelineConfig::from_env`]
//! overlays `IMGCHAIN_*` variables. Unparseable values are ignored with a
//! warning so a bad variable never stops an invocation.

use imgchain_core::DEFAULT_JPEG_QUALITY;

use crate::routing::Language;

pub const ENV_JPEG_QUALITY: &str = "IMGCHAIN_JPEG_QUALITY";
pub const ENV_PYTHON_BUCKET: &str = "IMGCHAIN_PYTHON_BUCKET";
pub const ENV_JAVA_BUCKET: &str = "IMGCHAIN_JAVA_BUCKET";
pub const ENV_JAVASCRIPT_BUCKET: &str = "IMGCHAIN_JAVASCRIPT_BUCKET";

/// Target bucket per routing language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageBuckets {
    pub python: String,
    pub java: String,
    pub javascript: String,
}

impl Default for LanguageBuckets {
    fn default() -> Self {
        Self {
            python: "imgchain-python".to_string(),
            java: "imgchain-java".to_string(),
            javascript: "imgchain-javascript".to_string(),
        }
    }
}

impl LanguageBuckets {
    pub fn bucket_for(&self, language: Language) -> &str {
        match language {
            Language::Python => &self.python,
            Language::Java => &self.java,
            Language::Javascript => &self.javascript,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// JPEG quality for stage output, 1-100.
    pub jpeg_quality: u8,
    pub buckets: LanguageBuckets,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            buckets: LanguageBuckets::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_JPEG_QUALITY) {
            match raw.trim().parse::<u8>() {
                Ok(q) if (1..=100).contains(&q) => config.jpeg_quality = q,
                _ => log::warn!(
                    "{ENV_JPEG_QUALITY}={raw:?} is not a quality between 1 and 100, using {}",
                    config.jpeg_quality
                ),
            }
        }

        let buckets = [
            (ENV_PYTHON_BUCKET, &mut config.buckets.python),
            (ENV_JAVA_BUCKET, &mut config.buckets.java),
            (ENV_JAVASCRIPT_BUCKET, &mut config.buckets.javascript),
        ];
        for (name, slot) in buckets {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => *slot = value.trim().to_string(),
                Some(_) => log::warn!("{name} is empty, using {slot:?}"),
                None => {}
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(|_| None);
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.jpeg_quality, 75);
        assert_eq!(config.buckets.bucket_for(Language::Java), "imgchain-java");
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            (ENV_JPEG_QUALITY, "90"),
            (ENV_PYTHON_BUCKET, "py-images"),
            (ENV_JAVASCRIPT_BUCKET, " js-images "),
        ]));
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.buckets.python, "py-images");
        assert_eq!(config.buckets.javascript, "js-images");
        assert_eq!(config.buckets.java, "imgchain-java");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        for raw in ["0", "101", "high", ""] {
            let config = PipelineConfig::from_lookup(lookup_from(&[(ENV_JPEG_QUALITY, raw)]));
            assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY, "{raw:?}");
        }

        let config = PipelineConfig::from_lookup(lookup_from(&[(ENV_JAVA_BUCKET, "  ")]));
        assert_eq!(config.buckets.java, "imgchain-java");
    }
}
