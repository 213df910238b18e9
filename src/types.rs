// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vulnerability class covered by the detection catalog.
///
/// Rules are data keyed by class; adding a detection does not add a code path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VulnClass {
    Sqli,
    Xss,
    Rce,
    Lfi,
    Xxe,
    Ssti,
    Other,
}

impl VulnClass {
    pub const ALL: [VulnClass; 7] = [
        VulnClass::Sqli,
        VulnClass::Xss,
        VulnClass::Rce,
        VulnClass::Lfi,
        VulnClass::Xxe,
        VulnClass::Ssti,
        VulnClass::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnClass::Sqli => "SQLI",
            VulnClass::Xss => "XSS",
            VulnClass::Rce => "RCE",
            VulnClass::Lfi => "LFI",
            VulnClass::Xxe => "XXE",
            VulnClass::Ssti => "SSTI",
            VulnClass::Other => "OTHER",
        }
    }

    /// Parse a class name as it appears in config files and CLI flags.
    pub fn parse(s: &str) -> Option<VulnClass> {
        match s.trim().to_uppercase().as_str() {
            "SQLI" | "SQL" => Some(VulnClass::Sqli),
            "XSS" => Some(VulnClass::Xss),
            "RCE" => Some(VulnClass::Rce),
            "LFI" | "RFI" => Some(VulnClass::Lfi),
            "XXE" => Some(VulnClass::Xxe),
            "SSTI" => Some(VulnClass::Ssti),
            "OTHER" => Some(VulnClass::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for VulnClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One scanned endpoint plus the observable data the intake layer collected
/// for it. Immutable once built; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub url: String,
    pub status_code: u16,
    #[serde(default)]
    pub server_banner: Option<String>,
    /// Free-text observable fields (headers, body fragment, error text),
    /// keyed by field name. Ordered map so detection evidence is stable.
    #[serde(default)]
    pub observables: BTreeMap<String, String>,
}

impl Target {
    pub fn new(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
            server_banner: None,
            observables: BTreeMap::new(),
        }
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.server_banner = Some(banner.into());
        self
    }

    pub fn with_observable(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.observables.insert(field.into(), value.into());
        self
    }
}

/// Severity rating, ordered Critical > High > Medium > Low > Info.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Bucket a CVSS-equivalent score into a rating.
    ///
    /// Total over [0.0, 10.0] with no overlap: >=9.0 Critical, >=7.0 High,
    /// >=4.0 Medium, >=0.1 Low, else Info. Monotonic in the score.
    pub fn from_cvss(score: f32) -> Severity {
        if score >= 9.0 {
            Severity::Critical
        } else if score >= 7.0 {
            Severity::High
        } else if score >= 4.0 {
            Severity::Medium
        } else if score >= 0.1 {
            Severity::Low
        } else {
            Severity::Info
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// A known CVE entry from the correlation index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CveRecord {
    pub cve_id: String,
    pub description: String,
    pub severity: Severity,
    pub cvss_score: f32,
    #[serde(default)]
    pub affected_systems: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// One detection rule hit on one target.
///
/// Produced by the detector with evidence and a proof-of-concept string;
/// the correlator fills `cves` and the scorer fills `severity`/`cvss`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityMatch {
    pub id: String,
    pub rule_id: String,
    pub class: VulnClass,
    pub description: String,
    /// Structured evidence extracted from the target: matched field name and
    /// a bounded snippet, never a full response body.
    pub details: BTreeMap<String, String>,
    pub poc: String,
    /// Contextual tags (detected server technology) used for CVE correlation.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cves: Vec<CveRecord>,
    pub severity: Severity,
    pub cvss: f32,
    pub base_weight: f32,
    pub remediation: Vec<String>,
}

impl VulnerabilityMatch {
    /// Key identifying duplicate hits of the same rule on one target.
    /// The engine never collapses duplicates; renderers may.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.class, self.rule_id)
    }
}

/// Per-target scan outcome. Exactly one finding exists per input target,
/// whether or not the pipeline completed for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub target: Target,
    pub matches: Vec<VulnerabilityMatch>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl Finding {
    pub fn completed(target: Target, matches: Vec<VulnerabilityMatch>, duration_ms: u64) -> Self {
        Self {
            target,
            matches,
            timed_out: false,
            error: None,
            duration_ms,
        }
    }

    /// A target whose pipeline was abandoned (deadline hit, or the run was
    /// cancelled while the target was in flight).
    pub fn abandoned(target: Target, duration_ms: u64) -> Self {
        Self {
            target,
            matches: Vec::new(),
            timed_out: true,
            error: None,
            duration_ms,
        }
    }

    pub fn failed(target: Target, reason: String, duration_ms: u64) -> Self {
        Self {
            target,
            matches: Vec::new(),
            timed_out: false,
            error: Some(reason),
            duration_ms,
        }
    }
}
