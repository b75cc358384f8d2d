//! Configuration for retrieval and answer generation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Settings passed to the completion collaborator on every `ask`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Chat model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { model: "gpt-4o-mini".to_string(), temperature: 0.7, max_tokens: 500 }
    }
}

/// Configuration parameters for the recommendation engine.
///
/// The multipliers size the similarity candidate pool relative to `top_k`
/// before hard filters run. Filters that discard many items (dietary labels)
/// or goals that correlate weakly with the text embedding (fiber,
/// post-workout) need a wider pool to still fill `top_k` slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Number of recommendations to return per turn.
    pub top_k: usize,
    /// Pool multiplier while a dietary requirement is active.
    pub dietary_multiplier: usize,
    /// Pool multiplier for the fiber and post-workout goals.
    pub wide_goal_multiplier: usize,
    /// Pool multiplier otherwise.
    pub default_multiplier: usize,
    /// Pool multiplier for the relaxed fallback phase.
    pub fallback_multiplier: usize,
    /// Whether `ask` sends and records conversation history.
    pub use_history: bool,
    /// Completion settings.
    pub generation: GenerationConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            dietary_multiplier: 10,
            wide_goal_multiplier: 8,
            default_multiplier: 4,
            fallback_multiplier: 2,
            use_history: true,
            generation: GenerationConfig::default(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Load a config from a TOML file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file cannot be read and
    /// [`RagError::ConfigError`] if it does not parse or fails validation.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: RagConfig = toml::from_str(raw)
            .map_err(|e| RagError::ConfigError(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `top_k == 0`
    /// - any pool multiplier is zero
    /// - `generation.temperature` is outside `[0, 2]`
    /// - `generation.max_tokens == 0`
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        let multipliers = [
            ("dietary_multiplier", self.dietary_multiplier),
            ("wide_goal_multiplier", self.wide_goal_multiplier),
            ("default_multiplier", self.default_multiplier),
            ("fallback_multiplier", self.fallback_multiplier),
        ];
        for (name, value) in multipliers {
            if value == 0 {
                return Err(RagError::ConfigError(format!("{name} must be at least 1")));
            }
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be within [0, 2]",
                self.generation.temperature
            )));
        }
        if self.generation.max_tokens == 0 {
            return Err(RagError::ConfigError("max_tokens must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of recommendations per turn.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the pool multiplier used while a dietary requirement is active.
    pub fn dietary_multiplier(mut self, multiplier: usize) -> Self {
        self.config.dietary_multiplier = multiplier;
        self
    }

    /// Set the pool multiplier used for the fiber and post-workout goals.
    pub fn wide_goal_multiplier(mut self, multiplier: usize) -> Self {
        self.config.wide_goal_multiplier = multiplier;
        self
    }

    /// Set the default pool multiplier.
    pub fn default_multiplier(mut self, multiplier: usize) -> Self {
        self.config.default_multiplier = multiplier;
        self
    }

    /// Set the pool multiplier for the fallback phase.
    pub fn fallback_multiplier(mut self, multiplier: usize) -> Self {
        self.config.fallback_multiplier = multiplier;
        self
    }

    /// Enable or disable conversation history in `ask`.
    pub fn use_history(mut self, enabled: bool) -> Self {
        self.config.use_history = enabled;
        self
    }

    /// Set the completion settings.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
        assert_eq!(config.generation.model, "gpt-4o-mini");
    }

    #[test]
    fn rejects_zero_top_k() {
        let err = RagConfig::builder().top_k(0).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_multiplier() {
        let err = RagConfig::builder().fallback_multiplier(0).build().unwrap_err();
        assert!(err.to_string().contains("fallback_multiplier"));
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let generation = GenerationConfig { temperature: 3.5, ..GenerationConfig::default() };
        assert!(RagConfig::builder().generation(generation).build().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml_str(
            "top_k = 3\nuse_history = false\n\n[generation]\nmodel = \"gpt-4o\"\n",
        )
        .unwrap();
        assert_eq!(config.top_k, 3);
        assert!(!config.use_history);
        assert_eq!(config.generation.model, "gpt-4o");
        assert_eq!(config.generation.max_tokens, 500);
        assert_eq!(config.dietary_multiplier, 10);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = RagConfig::from_toml_str("top_k = \"three\"").unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu-rag.toml");
        std::fs::write(&path, "top_k = 7\n").unwrap();
        let config = RagConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.top_k, 7);
    }
}
