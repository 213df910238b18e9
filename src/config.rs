// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::errors::EngineError;
use crate::types::VulnClass;

fn default_concurrency() -> usize {
    100
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Engine configuration consumed by the orchestrator.
///
/// Validated once before any task starts; an invalid configuration is a
/// caller contract violation and never a partial run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of targets processed concurrently.
    pub concurrency_limit: usize,

    /// Deadline for one target's full pipeline. A target past the deadline
    /// yields an abandoned finding, not an engine failure.
    pub per_target_timeout: Duration,

    /// Vulnerability classes evaluated during detection. Defaults to all.
    pub enabled_classes: BTreeSet<VulnClass>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency(),
            per_target_timeout: default_timeout(),
            enabled_classes: VulnClass::ALL.iter().copied().collect(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.concurrency_limit == 0 {
            return Err(EngineError::Configuration(
                "concurrency_limit must be > 0".to_string(),
            ));
        }
        if self.per_target_timeout.is_zero() {
            return Err(EngineError::Configuration(
                "per_target_timeout must be > 0".to_string(),
            ));
        }
        if self.enabled_classes.is_empty() {
            return Err(EngineError::Configuration(
                "at least one vulnerability class must be enabled".to_string(),
            ));
        }
        Ok(())
    }
}
