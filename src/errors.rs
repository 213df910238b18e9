// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Engine Error Types
 * Production-ready error handling with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Engine error taxonomy.
///
/// Only `Configuration` is fatal, and only before a run starts. Every other
/// variant is recovered in place: a failed rule is skipped, a timed-out or
/// failed target still yields its finding, and the run continues.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A single signature predicate failed on a single target.
    #[error("rule {rule_id} failed on {url}: {reason}")]
    RuleEvaluation {
        rule_id: String,
        url: String,
        reason: String,
    },

    /// A target's pipeline did not finish within the per-target deadline.
    #[error("target {url} timed out after {timeout:?}")]
    TargetTimeout { url: String, timeout: Duration },

    /// Unexpected failure anywhere in one target's pipeline.
    #[error("target {url} task failed: {reason}")]
    TargetTask { url: String, reason: String },

    /// Caller contract violation; raised before any task starts.
    #[error("invalid engine configuration: {0}")]
    Configuration(String),
}
