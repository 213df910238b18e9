// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Signature Detector
 * Applies the signature catalog to one target's observable data
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::{MatchEvidence, SignatureCatalog, SignatureRule};
use crate::errors::EngineError;
use crate::payloads;
use crate::types::{Severity, Target, VulnClass, VulnerabilityMatch};

/// Technologies recognized in server banners, used as CVE correlation tags.
const KNOWN_TECHNOLOGIES: &[&str] = &[
    "apache", "nginx", "iis", "tomcat", "php", "python", "java", "node", "express",
    "mysql", "postgresql", "wordpress", "react",
];

#[derive(Clone)]
pub struct Detector {
    catalog: Arc<SignatureCatalog>,
    enabled_classes: BTreeSet<VulnClass>,
}

impl Detector {
    pub fn new(catalog: Arc<SignatureCatalog>, enabled_classes: BTreeSet<VulnClass>) -> Self {
        Self {
            catalog,
            enabled_classes,
        }
    }

    /// Evaluate every enabled rule against the target.
    ///
    /// Output order is catalog rule order, so repeated calls on identical
    /// input produce identical sequences. Rules of the same class may each
    /// hit independently; duplicates are not collapsed here. A predicate
    /// failure is logged and skipped without affecting the other rules.
    pub fn detect(&self, target: &Target) -> Vec<VulnerabilityMatch> {
        let tags = technology_tags(target);
        let mut matches = Vec::new();

        for rule in &self.catalog.rules {
            if !self.enabled_classes.contains(&rule.class) {
                continue;
            }

            match rule.predicate.evaluate(target) {
                Ok(Some(evidence)) => {
                    debug!(
                        "Rule {} hit on {} (field: {})",
                        rule.id, target.url, evidence.field
                    );
                    matches.push(build_match(rule, target, evidence, &tags));
                }
                Ok(None) => {}
                Err(reason) => {
                    warn!(
                        "{}",
                        EngineError::RuleEvaluation {
                            rule_id: rule.id.clone(),
                            url: target.url.clone(),
                            reason,
                        }
                    );
                }
            }
        }

        matches
    }
}

fn build_match(
    rule: &SignatureRule,
    target: &Target,
    evidence: MatchEvidence,
    tags: &[String],
) -> VulnerabilityMatch {
    let mut details = BTreeMap::new();
    details.insert("matched_field".to_string(), evidence.field);
    details.insert("matched_content".to_string(), evidence.snippet);
    details.insert("status_code".to_string(), target.status_code.to_string());
    if let Some(banner) = &target.server_banner {
        details.insert("server_banner".to_string(), banner.clone());
    }

    VulnerabilityMatch {
        id: format!("{}_{}", rule.id, Uuid::new_v4()),
        rule_id: rule.id.clone(),
        class: rule.class,
        description: rule.description.clone(),
        details,
        poc: build_poc(rule.class, &target.url),
        tags: tags.to_vec(),
        cves: Vec::new(),
        // Placeholder until the scorer runs; INFO keeps unscored matches
        // at the bottom of any ordering.
        severity: Severity::Info,
        cvss: 0.0,
        base_weight: rule.weight,
        remediation: rule.remediation.clone(),
    }
}

/// Reproduction string for a match: the class's reference payload injected
/// into the target URL's query string.
fn build_poc(class: VulnClass, url: &str) -> String {
    match payloads::poc_payload(class) {
        Some(payload) => {
            let encoded = urlencoding::encode(payload);
            if url.contains('?') {
                format!("{}&vanguard={}", url, encoded)
            } else {
                format!("{}?vanguard={}", url, encoded)
            }
        }
        None => url.to_string(),
    }
}

/// Extract technology tags from the server banner.
fn technology_tags(target: &Target) -> Vec<String> {
    let Some(banner) = &target.server_banner else {
        return Vec::new();
    };
    let banner = banner.to_lowercase();
    KNOWN_TECHNOLOGIES
        .iter()
        .filter(|tech| banner.contains(*tech))
        .map(|tech| tech.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MatchPredicate;

    fn test_rule(id: &str, class: VulnClass, predicate: MatchPredicate, weight: f32) -> SignatureRule {
        SignatureRule {
            id: id.to_string(),
            class,
            description: format!("test rule {}", id),
            predicate,
            weight,
            remediation: vec!["fix it".to_string()],
        }
    }

    fn contains(needle: &str) -> MatchPredicate {
        MatchPredicate::ObservableContains {
            needle: needle.to_string(),
            case_sensitive: false,
        }
    }

    fn all_classes() -> BTreeSet<VulnClass> {
        VulnClass::ALL.iter().copied().collect()
    }

    fn sqli_target() -> Target {
        Target::new("https://example.com/item?id=1", 500)
            .with_banner("Apache/2.4.41 (Ubuntu) PHP/7.4.3")
            .with_observable("error", "syntax error near 'id'")
    }

    #[test]
    fn test_detect_output_follows_catalog_order() {
        let catalog = Arc::new(SignatureCatalog::new(vec![
            test_rule("zeta", VulnClass::Sqli, contains("syntax error"), 8.0),
            test_rule("alpha", VulnClass::Sqli, contains("syntax"), 7.0),
        ]));
        let detector = Detector::new(catalog, all_classes());

        let matches = detector.detect(&sqli_target());
        // Catalog order, not alphabetical, not severity order.
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].rule_id, "zeta");
        assert_eq!(matches[1].rule_id, "alpha");
    }

    #[test]
    fn test_detect_is_deterministic() {
        let detector = Detector::new(Arc::new(SignatureCatalog::builtin()), all_classes());
        let target = sqli_target();

        let first = detector.detect(&target);
        let second = detector.detect(&target);
        assert_eq!(
            first.iter().map(|m| &m.rule_id).collect::<Vec<_>>(),
            second.iter().map(|m| &m.rule_id).collect::<Vec<_>>()
        );
        assert_eq!(
            first.iter().map(|m| &m.details).collect::<Vec<_>>(),
            second.iter().map(|m| &m.details).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_disabled_classes_are_skipped() {
        let catalog = Arc::new(SignatureCatalog::new(vec![
            test_rule("sqli-rule", VulnClass::Sqli, contains("syntax error"), 8.0),
            test_rule("xss-rule", VulnClass::Xss, contains("syntax error"), 6.0),
        ]));
        let enabled: BTreeSet<VulnClass> = [VulnClass::Xss].into_iter().collect();
        let detector = Detector::new(catalog, enabled);

        let matches = detector.detect(&sqli_target());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].class, VulnClass::Xss);
    }

    #[test]
    fn test_failing_rule_does_not_abort_others() {
        let catalog = Arc::new(SignatureCatalog::new(vec![
            test_rule(
                "broken",
                VulnClass::Sqli,
                MatchPredicate::ObservableRegex {
                    pattern: "(unclosed".to_string(),
                },
                8.0,
            ),
            test_rule("working", VulnClass::Sqli, contains("syntax error"), 8.0),
        ]));
        let detector = Detector::new(catalog, all_classes());

        let matches = detector.detect(&sqli_target());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].rule_id, "working");
    }

    #[test]
    fn test_evidence_fields_populated() {
        let detector = Detector::new(Arc::new(SignatureCatalog::builtin()), all_classes());
        let matches = detector.detect(&sqli_target());
        assert!(!matches.is_empty());

        let m = &matches[0];
        assert_eq!(m.details.get("matched_field").map(String::as_str), Some("error"));
        assert!(m.details.get("matched_content").unwrap().contains("syntax error"));
        assert_eq!(m.details.get("status_code").map(String::as_str), Some("500"));
        assert!(m.poc.contains("vanguard="));
        assert_eq!(m.base_weight, 8.0);
        assert!(m.cves.is_empty(), "correlation is a later stage");
    }

    #[test]
    fn test_technology_tags_from_banner() {
        let detector = Detector::new(Arc::new(SignatureCatalog::builtin()), all_classes());
        let matches = detector.detect(&sqli_target());
        let tags = &matches[0].tags;
        assert!(tags.contains(&"apache".to_string()));
        assert!(tags.contains(&"php".to_string()));

        let bare = Target::new("https://example.com", 500)
            .with_observable("error", "syntax error");
        let matches = detector.detect(&bare);
        assert!(matches[0].tags.is_empty());
    }

    #[test]
    fn test_no_matches_on_clean_target() {
        let detector = Detector::new(Arc::new(SignatureCatalog::builtin()), all_classes());
        let clean = Target::new("https://example.com/", 200)
            .with_observable("body", "<html><body>Welcome</body></html>");
        assert!(detector.detect(&clean).is_empty());
    }
}
