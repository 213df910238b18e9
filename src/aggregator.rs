// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Risk Aggregator
 * Folds per-target findings into the report model
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::types::{Finding, Severity};

/// Qualitative summary of aggregate severity across a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Critical => write!(f, "CRITICAL"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::Low => write!(f, "LOW"),
        }
    }
}

/// Immutable aggregate handed to report rendering. Built once after all
/// findings settle; one finding per scanned target, matched or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportModel {
    pub findings: Vec<Finding>,
    /// Count of vulnerability matches per severity rating, every rating
    /// present even when zero.
    pub severity_counts: BTreeMap<Severity, usize>,
    pub total_vulnerabilities: usize,
    pub risk_level: RiskLevel,
    pub generated_at: String,
}

pub struct RiskAggregator;

impl RiskAggregator {
    /// Reduce the findings into severity counts and an overall risk level.
    ///
    /// Counts are per match, not per target. The reduction is a fold over
    /// unordered counts, so permuting the findings never changes the result.
    pub fn aggregate(findings: Vec<Finding>) -> ReportModel {
        let mut severity_counts: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();

        for finding in &findings {
            for m in &finding.matches {
                *severity_counts.entry(m.severity).or_insert(0) += 1;
            }
        }

        let total_vulnerabilities: usize = severity_counts.values().sum();
        let risk_level = risk_level(&severity_counts, total_vulnerabilities);

        info!(
            "Aggregated {} findings: {} vulnerabilities, overall risk {}",
            findings.len(),
            total_vulnerabilities,
            risk_level
        );

        ReportModel {
            findings,
            severity_counts,
            total_vulnerabilities,
            risk_level,
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Weighted mean of the severity counts (Critical 4, High 3, Medium 2,
/// Low 1), bucketed at fixed thresholds. An empty run is LOW, never a
/// division error.
fn risk_level(counts: &BTreeMap<Severity, usize>, total: usize) -> RiskLevel {
    if total == 0 {
        return RiskLevel::Low;
    }

    let count = |s: Severity| *counts.get(&s).unwrap_or(&0) as f64;
    let weighted = count(Severity::Critical) * 4.0
        + count(Severity::High) * 3.0
        + count(Severity::Medium) * 2.0
        + count(Severity::Low);
    let mean = weighted / total as f64;

    if mean >= 3.0 {
        RiskLevel::Critical
    } else if mean >= 2.0 {
        RiskLevel::High
    } else if mean >= 1.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
