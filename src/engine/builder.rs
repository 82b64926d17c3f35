//! Engine construction.
//!
//! Engine selection is explicit: a typed [`EngineOptions`] value names
//! the variant and carries its credentials, and construction fails fast
//! on missing required fields rather than deferring to the first call.
//! No environment variables are consulted.

use std::sync::Arc;

use crate::error::{ForsetiError, Result};
use crate::types::EngineConfig;

use super::http::HttpBackend;
use super::lexical::LexicalEngine;
use super::remote::RemoteEngine;
use super::StanceEngine;

/// Which engine variant to construct, with its required credentials.
#[derive(Debug, Clone)]
pub enum EngineKind {
    /// Deterministic offline engine; no credentials.
    Lexical,
    /// Model-backed engine over an OpenAI-compatible endpoint.
    Remote {
        api_key: String,
        model: String,
        base_url: String,
    },
}

/// Typed construction options: variant tag plus shared engine config.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub kind: EngineKind,
    pub config: EngineConfig,
}

/// Build an engine from options.
///
/// # Errors
///
/// `Configuration` when a required field is empty or the config record
/// violates its invariants.
pub fn build_engine(options: EngineOptions) -> Result<Box<dyn StanceEngine>> {
    options.config.validate()?;
    match options.kind {
        EngineKind::Lexical => Ok(Box::new(LexicalEngine::new(options.config))),
        EngineKind::Remote {
            api_key,
            model,
            base_url,
        } => {
            if api_key.is_empty() {
                return Err(ForsetiError::Configuration(
                    "remote engine requires an API key".into(),
                ));
            }
            if model.is_empty() {
                return Err(ForsetiError::Configuration(
                    "remote engine requires a model name".into(),
                ));
            }
            if base_url.is_empty() {
                return Err(ForsetiError::Configuration(
                    "remote engine requires a base URL".into(),
                ));
            }
            let mut backend = HttpBackend::new(base_url, api_key, model);
            if let Some(ms) = options.config.timeout_ms {
                backend = backend.timeout_ms(ms);
            }
            Ok(Box::new(RemoteEngine::new(
                Arc::new(backend),
                options.config,
            )))
        }
    }
}

/// Main entry point for creating engine instances.
pub struct Forseti;

impl Forseti {
    /// Create a new builder for configuring an engine.
    pub fn builder() -> ForsetiBuilder {
        ForsetiBuilder::new()
    }
}

/// Builder for configuring engine instances.
pub struct ForsetiBuilder {
    kind: Option<EngineKind>,
    config: EngineConfig,
}

impl ForsetiBuilder {
    pub fn new() -> Self {
        Self {
            kind: None,
            config: EngineConfig::default(),
        }
    }

    /// Use the deterministic offline engine.
    pub fn lexical(mut self) -> Self {
        self.kind = Some(EngineKind::Lexical);
        self
    }

    /// Use a remote model over an OpenAI-compatible endpoint.
    pub fn remote(
        mut self,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        self.kind = Some(EngineKind::Remote {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        });
        self
    }

    /// Set the engine configuration record.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set comments per backend call.
    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n;
        self
    }

    /// Cap total comments accepted per analysis run.
    pub fn max_comments(mut self, n: usize) -> Self {
        self.config.max_comments = Some(n);
        self
    }

    /// Advisory transport timeout in milliseconds.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = Some(ms);
        self
    }

    /// Build the engine.
    ///
    /// Defaults to the lexical engine when no variant was selected.
    pub fn build(self) -> Result<Box<dyn StanceEngine>> {
        build_engine(EngineOptions {
            kind: self.kind.unwrap_or(EngineKind::Lexical),
            config: self.config,
        })
    }
}

impl Default for ForsetiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_build_is_lexical() {
        let engine = Forseti::builder().build().unwrap();
        assert_eq!(engine.name(), "lexical");
    }

    #[test]
    fn remote_requires_credentials() {
        let err = Forseti::builder()
            .remote("https://api.example.com/v1", "", "gpt-4o-mini")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn remote_requires_model() {
        let err = build_engine(EngineOptions {
            kind: EngineKind::Remote {
                api_key: "sk-test".into(),
                model: String::new(),
                base_url: "https://api.example.com/v1".into(),
            },
            config: EngineConfig::default(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn remote_builds_with_full_credentials() {
        let engine = Forseti::builder()
            .remote("https://api.example.com/v1", "sk-test", "gpt-4o-mini")
            .batch_size(10)
            .timeout_ms(30_000)
            .build()
            .unwrap();
        assert_eq!(engine.name(), "remote");
        assert_eq!(engine.config().batch_size, 10);
    }

    #[test]
    fn invalid_config_fails_construction() {
        let err = Forseti::builder().lexical().batch_size(0).build().unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }
}
