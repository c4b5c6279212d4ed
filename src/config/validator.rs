use crate::config::Config;
use crate::error::{HybridError, Result, ValidationError};
use crate::retrieval::Language;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_search(config, &mut errors);
        Self::validate_index(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HybridError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        let search = &config.search;

        if !(search.rrf_k.is_finite() && search.rrf_k > 0.0) {
            errors.push(ValidationError::new(
                "search.rrf_k",
                format!("RRF k must be a positive number, got {}", search.rrf_k),
            ));
        }

        for (path, weight) in [
            ("search.full_text_weight", search.full_text_weight),
            ("search.semantic_weight", search.semantic_weight),
        ] {
            if !(weight.is_finite() && weight >= 0.0) {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must be a non-negative number, got {}", weight),
                ));
            }
        }

        if search.match_count <= 0 {
            errors.push(ValidationError::new(
                "search.match_count",
                "Default match count must be greater than 0",
            ));
        }

        if search.candidate_multiplier == 0 {
            errors.push(ValidationError::new(
                "search.candidate_multiplier",
                "Candidate multiplier must be greater than 0",
            ));
        }

        if search.ranker_timeout_ms == 0 {
            errors.push(ValidationError::new(
                "search.ranker_timeout_ms",
                "Ranker timeout must be greater than 0",
            ));
        }

        if search.default_language.parse::<Language>().is_err() {
            errors.push(ValidationError::new(
                "search.default_language",
                format!(
                    "Default language must be 'en' or 'es', got '{}'",
                    search.default_language
                ),
            ));
        }
    }

    fn validate_index(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.index.vector_dim == 0 {
            errors.push(ValidationError::new(
                "index.vector_dim",
                "Vector dimension must be greater than 0",
            ));
        }

        if config.index.hnsw_ef_construction == 0 {
            errors.push(ValidationError::new(
                "index.hnsw_ef_construction",
                "HNSW ef_construction must be greater than 0",
            ));
        }

        if config.index.hnsw_m == 0 {
            errors.push(ValidationError::new(
                "index.hnsw_m",
                "HNSW M must be greater than 0",
            ));
        }

        if config.index.hnsw_ef_search == 0 {
            errors.push(ValidationError::new(
                "index.hnsw_ef_search",
                "HNSW ef_search must be greater than 0",
            ));
        }

        // tantivy refuses writer budgets below 15MB
        if config.index.writer_memory_bytes < 15_000_000 {
            errors.push(ValidationError::new(
                "index.writer_memory_bytes",
                "Writer memory must be at least 15000000 bytes",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_non_positive_rrf_k() {
        let mut config = Config::default();
        config.search.rrf_k = 0.0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_unsupported_default_language() {
        let mut config = Config::default();
        config.search.default_language = "fr".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.search.semantic_weight = -1.0;
        config.index.vector_dim = 0;

        match ConfigValidator::validate(&config) {
            Err(HybridError::ConfigValidation { errors }) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].path, "search.semantic_weight");
                assert_eq!(errors[1].path, "index.vector_dim");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
