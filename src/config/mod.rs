//! Configuration management for hybridrank
//!
//! Loads the TOML configuration, applies `HYBRIDRANK_SECTION__KEY` environment
//! overrides and validates the result before it reaches the searcher.

use crate::error::{HybridError, Result};
use crate::retrieval::MissingKeyPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Per-query defaults and ranker behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned when the request omits `match_count`
    pub match_count: i64,
    pub full_text_weight: f64,
    pub semantic_weight: f64,
    /// RRF smoothing constant
    pub rrf_k: f64,
    /// Each ranker fetches `match_count * candidate_multiplier` candidates
    pub candidate_multiplier: usize,
    /// Language used when `lang` is absent and both variants match equally
    pub default_language: String,
    /// Conjunctive (all terms) vs disjunctive lexical matching
    pub require_all_terms: bool,
    /// Per-ranker deadline in milliseconds
    pub ranker_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            match_count: 10,
            full_text_weight: 1.0,
            semantic_weight: 1.0,
            rrf_k: 50.0,
            candidate_multiplier: 2,
            default_language: "en".to_string(),
            require_all_terms: true,
            ranker_timeout_ms: 5_000,
        }
    }
}

/// Configuration for the in-memory corpus indexes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Embedding dimension every stored vector and query must match
    pub vector_dim: usize,
    /// HNSW M parameter (number of connections per layer)
    pub hnsw_m: usize,
    /// HNSW construction parameter (higher = better recall, slower build)
    pub hnsw_ef_construction: usize,
    /// HNSW search breadth; raised to the requested depth when smaller
    pub hnsw_ef_search: usize,
    /// Capacity hint for the HNSW graph
    pub max_elements: usize,
    /// Tantivy writer heap budget
    pub writer_memory_bytes: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            vector_dim: 384,
            hnsw_m: 16,
            hnsw_ef_construction: 200,
            hnsw_ef_search: 64,
            max_elements: 100_000,
            writer_memory_bytes: 50_000_000,
        }
    }
}

/// Metadata filter behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub missing_key_policy: MissingKeyPolicy,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HybridError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HybridError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| HybridError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: HYBRIDRANK_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("HYBRIDRANK_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SEARCH__MATCH_COUNT" => self.search.match_count = parse_env(path, value)?,
            "SEARCH__RRF_K" => self.search.rrf_k = parse_env(path, value)?,
            "SEARCH__FULL_TEXT_WEIGHT" => self.search.full_text_weight = parse_env(path, value)?,
            "SEARCH__SEMANTIC_WEIGHT" => self.search.semantic_weight = parse_env(path, value)?,
            "SEARCH__DEFAULT_LANGUAGE" => self.search.default_language = value.to_string(),
            "SEARCH__RANKER_TIMEOUT_MS" => {
                self.search.ranker_timeout_ms = parse_env(path, value)?
            }
            "INDEX__HNSW_EF_SEARCH" => self.index.hnsw_ef_search = parse_env(path, value)?,
            "FILTER__MISSING_KEY_POLICY" => {
                self.filter.missing_key_policy = match value {
                    "exclude" => MissingKeyPolicy::Exclude,
                    "ignore" => MissingKeyPolicy::Ignore,
                    _ => {
                        return Err(HybridError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Expected 'exclude' or 'ignore', got '{}'", value),
                        })
                    }
                };
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HybridError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("hybridrank").join("config.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| HybridError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            search: SearchConfig::default(),
            index: IndexConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}
