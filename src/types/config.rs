//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ForsetiError, Result};

/// Engine configuration record.
///
/// Values are read at the start of each call; updates install a new
/// record rather than mutating one a call might be reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Comments per backend call.
    pub batch_size: usize,
    /// Hard cap on comments accepted per analysis run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_comments: Option<usize>,
    /// Advisory transport timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            max_comments: None,
            timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Validate invariants: all set values must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ForsetiError::Configuration(
                "batchSize must be positive".into(),
            ));
        }
        if self.max_comments == Some(0) {
            return Err(ForsetiError::Configuration(
                "maxComments must be positive when set".into(),
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(ForsetiError::Configuration(
                "timeoutMs must be positive when set".into(),
            ));
        }
        Ok(())
    }

    /// Return a new config with the update's set fields applied.
    ///
    /// Unset fields retain their prior values.
    pub fn merged(&self, update: &EngineConfigUpdate) -> EngineConfig {
        EngineConfig {
            batch_size: update.batch_size.unwrap_or(self.batch_size),
            max_comments: update.max_comments.or(self.max_comments),
            timeout_ms: update.timeout_ms.or(self.timeout_ms),
        }
    }
}

/// Partial configuration update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfigUpdate {
    pub batch_size: Option<usize>,
    pub max_comments: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl EngineConfigUpdate {
    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = Some(n);
        self
    }

    pub fn max_comments(mut self, n: usize) -> Self {
        self.max_comments = Some(n);
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unset_fields() {
        let base = EngineConfig {
            batch_size: 20,
            max_comments: Some(100),
            timeout_ms: None,
        };
        let merged = base.merged(&EngineConfigUpdate::default().batch_size(5));
        assert_eq!(merged.batch_size, 5);
        assert_eq!(merged.max_comments, Some(100));
        assert_eq!(merged.timeout_ms, None);
        // base untouched
        assert_eq!(base.batch_size, 20);
    }

    #[test]
    fn zero_batch_size_rejected() {
        let cfg = EngineConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }
}
