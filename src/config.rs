//! Extraction and normalization parameters
//!
//! Parameters are plain immutable values. An external loader builds them,
//! usually from TOML through [`PipelineConfig::from_toml_str`], and hands
//! them to the extractor and normalizer. Missing keys take the defaults
//! documented on each field.
//!
//! ```toml
//! [extract]
//! body_specificity_bias = 0.75
//! custom_selectors = ["div.handbook-body"]
//!
//! [normalize]
//! hash_algorithm = "blake3"
//! allowed_path_prefixes = ["/docs"]
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::HashAlgorithm;

/// Crawler identity written into every frontmatter block
pub const DEFAULT_CRAWLER_VERSION: &str = concat!("rag-markdown-normalizer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Thresholds of the meaningfulness predicate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meaningfulness {
    pub min_non_whitespace: usize,
    pub max_link_density: f64,
}

impl Default for Meaningfulness {
    fn default() -> Self {
        Self {
            min_non_whitespace: 50,
            max_link_density: 0.8,
        }
    }
}

/// Scoring and threshold configuration for content extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractParam {
    /// Fraction of the body score a descendant must reach to replace `body`
    pub body_specificity_bias: f64,
    /// Link density above which the density score is penalized
    pub link_density_threshold: f64,
    /// Non-whitespace characters per score point
    pub chars_per_point: f64,
    pub paragraph_weight: f64,
    /// Weight of h1..h3 headings
    pub heading_weight: f64,
    pub code_block_weight: f64,
    pub list_item_weight: f64,
    /// Meaningfulness: minimum non-whitespace characters
    pub min_non_whitespace: usize,
    /// Meaningfulness: maximum link density when more than two links exist
    pub max_link_density: f64,
    /// Extra template selectors, tried after the curated list
    pub custom_selectors: Vec<String>,
}

impl Default for ExtractParam {
    fn default() -> Self {
        let thresholds = Meaningfulness::default();
        Self {
            body_specificity_bias: 0.75,
            link_density_threshold: 0.80,
            chars_per_point: 50.0,
            paragraph_weight: 5.0,
            heading_weight: 10.0,
            code_block_weight: 15.0,
            list_item_weight: 2.0,
            min_non_whitespace: thresholds.min_non_whitespace,
            max_link_density: thresholds.max_link_density,
            custom_selectors: Vec::new(),
        }
    }
}

impl ExtractParam {
    pub fn meaningfulness(&self) -> Meaningfulness {
        Meaningfulness {
            min_non_whitespace: self.min_non_whitespace,
            max_link_density: self.max_link_density,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            ("body_specificity_bias", self.body_specificity_bias),
            ("link_density_threshold", self.link_density_threshold),
            ("max_link_density", self.max_link_density),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.chars_per_point.is_nan() || self.chars_per_point <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "chars_per_point must be positive, got {}",
                self.chars_per_point
            )));
        }

        let weights = [
            ("paragraph_weight", self.paragraph_weight),
            ("heading_weight", self.heading_weight),
            ("code_block_weight", self.code_block_weight),
            ("list_item_weight", self.list_item_weight),
        ];
        for (name, value) in weights {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        Ok(())
    }
}

/// Crawl-wide normalization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub crawler_version: String,
    pub hash_algorithm: HashAlgorithm,
    /// Path prefixes stripped before section derivation, tried in order
    pub allowed_path_prefixes: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            crawler_version: DEFAULT_CRAWLER_VERSION.to_string(),
            hash_algorithm: HashAlgorithm::Sha256,
            allowed_path_prefixes: Vec::new(),
        }
    }
}

impl NormalizeConfig {
    /// Per-page parameters for a page fetched at `fetched_at`
    pub fn for_page(&self, fetched_at: DateTime<Utc>, crawl_depth: u32) -> NormalizeParam {
        NormalizeParam {
            crawler_version: self.crawler_version.clone(),
            fetched_at,
            hash_algorithm: self.hash_algorithm,
            crawl_depth,
            allowed_path_prefixes: self.allowed_path_prefixes.clone(),
        }
    }
}

/// Per-call normalization parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeParam {
    pub crawler_version: String,
    pub fetched_at: DateTime<Utc>,
    pub hash_algorithm: HashAlgorithm,
    pub crawl_depth: u32,
    pub allowed_path_prefixes: Vec<String>,
}

impl NormalizeParam {
    /// Default settings for a page fetched at `fetched_at`
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        NormalizeConfig::default().for_page(fetched_at, 0)
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn with_crawl_depth(mut self, depth: u32) -> Self {
        self.crawl_depth = depth;
        self
    }

    pub fn with_allowed_path_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_path_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_crawler_version(mut self, version: impl Into<String>) -> Self {
        self.crawler_version = version.into();
        self
    }
}

/// Complete configuration as loaded from a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extract: ExtractParam,
    pub normalize: NormalizeConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.extract.validate()?;
        if self.normalize.crawler_version.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "crawler_version must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_defaults() {
        let param = ExtractParam::default();
        assert_eq!(param.body_specificity_bias, 0.75);
        assert_eq!(param.link_density_threshold, 0.80);
        assert_eq!(param.chars_per_point, 50.0);
        assert_eq!(param.paragraph_weight, 5.0);
        assert_eq!(param.heading_weight, 10.0);
        assert_eq!(param.code_block_weight, 15.0);
        assert_eq!(param.list_item_weight, 2.0);
        assert_eq!(param.meaningfulness(), Meaningfulness::default());
        assert!(param.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [extract]
            body_specificity_bias = 0.6
            custom_selectors = ["div.handbook"]

            [normalize]
            hash_algorithm = "blake3"
            allowed_path_prefixes = ["/docs", "/guide"]
            "#,
        )
        .unwrap();

        assert_eq!(config.extract.body_specificity_bias, 0.6);
        assert_eq!(config.extract.paragraph_weight, 5.0);
        assert_eq!(config.extract.custom_selectors, vec!["div.handbook"]);
        assert_eq!(config.normalize.hash_algorithm, HashAlgorithm::Blake3);
        assert_eq!(config.normalize.allowed_path_prefixes, vec!["/docs", "/guide"]);
        assert_eq!(config.normalize.crawler_version, DEFAULT_CRAWLER_VERSION);
    }

    #[test]
    fn test_from_toml_empty_is_default() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_unknown_algorithm() {
        let err = PipelineConfig::from_toml_str("[normalize]\nhash_algorithm = \"md5\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let param = ExtractParam {
            link_density_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(param.validate(), Err(ConfigError::Invalid(_))));

        let param = ExtractParam {
            chars_per_point: 0.0,
            ..Default::default()
        };
        assert!(param.validate().is_err());

        let param = ExtractParam {
            code_block_weight: -1.0,
            ..Default::default()
        };
        assert!(param.validate().is_err());
    }

    #[test]
    fn test_for_page_carries_settings() {
        let fetched_at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let config = NormalizeConfig {
            allowed_path_prefixes: vec!["/docs".to_string()],
            ..Default::default()
        };
        let param = config.for_page(fetched_at, 3);
        assert_eq!(param.crawl_depth, 3);
        assert_eq!(param.fetched_at, fetched_at);
        assert_eq!(param.allowed_path_prefixes, vec!["/docs"]);
        assert_eq!(param.hash_algorithm, HashAlgorithm::Sha256);
    }
}
