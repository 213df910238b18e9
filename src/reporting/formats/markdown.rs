// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;

use crate::aggregator::ReportModel;
use crate::types::Severity;

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, model: &ReportModel, title: &str) -> Result<Vec<u8>> {
        Ok(self.generate_markdown(model, title).into_bytes())
    }

    fn generate_markdown(&self, model: &ReportModel, title: &str) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", title));
        md.push_str(&format!("**Generated:** {}\n\n", model.generated_at));
        md.push_str(&format!("**Targets Scanned:** {}\n\n", model.findings.len()));
        md.push_str(&format!(
            "**Overall Risk Level:** {}\n\n",
            model.risk_level
        ));
        md.push_str("---\n\n");

        md.push_str("## Executive Summary\n\n");
        md.push_str("| Severity | Count |\n");
        md.push_str("|----------|-------|\n");
        for severity in Severity::ALL {
            md.push_str(&format!(
                "| {} | {} |\n",
                severity,
                model.severity_counts.get(&severity).copied().unwrap_or(0)
            ));
        }
        md.push_str(&format!(
            "| **Total** | **{}** |\n\n",
            model.total_vulnerabilities
        ));

        let timed_out = model.findings.iter().filter(|f| f.timed_out).count();
        let failed = model.findings.iter().filter(|f| f.error.is_some()).count();
        if timed_out > 0 || failed > 0 {
            md.push_str(&format!(
                "> {} target(s) timed out and {} failed during scanning; \
                 their findings contain no matches.\n\n",
                timed_out, failed
            ));
        }

        md.push_str("## Findings\n\n");
        for finding in &model.findings {
            md.push_str(&format!("### {}\n\n", finding.target.url));
            if finding.timed_out {
                md.push_str("_Scan timed out before completion._\n\n");
                continue;
            }
            if let Some(error) = &finding.error {
                md.push_str(&format!("_Scan failed: {}_\n\n", error));
                continue;
            }
            if finding.matches.is_empty() {
                md.push_str("No vulnerabilities detected.\n\n");
                continue;
            }

            for m in &finding.matches {
                md.push_str(&format!(
                    "#### {} - {} (CVSS: {:.1})\n\n",
                    m.class, m.severity, m.cvss
                ));
                md.push_str(&format!("{}\n\n", m.description));

                if !m.details.is_empty() {
                    md.push_str("**Technical Details:**\n\n");
                    for (key, value) in &m.details {
                        md.push_str(&format!("- `{}`: {}\n", key, value));
                    }
                    md.push('\n');
                }

                md.push_str(&format!("**Proof of Concept:** `{}`\n\n", m.poc));

                if !m.cves.is_empty() {
                    md.push_str("**Related CVEs:**\n\n");
                    for cve in &m.cves {
                        md.push_str(&format!(
                            "- **{}** ({}, CVSS {:.1}): {}\n",
                            cve.cve_id, cve.severity, cve.cvss_score, cve.description
                        ));
                    }
                    md.push('\n');
                }

                if !m.remediation.is_empty() {
                    md.push_str("**Remediation:**\n\n");
                    for (i, step) in m.remediation.iter().enumerate() {
                        md.push_str(&format!("{}. {}\n", i + 1, step));
                    }
                    md.push('\n');
                }
            }
        }

        md
    }
}

impl Default for MarkdownReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::RiskAggregator;
    use crate::catalog::SignatureCatalog;
    use crate::correlator::Correlator;
    use crate::cve_index::CveIndex;
    use crate::detector::Detector;
    use crate::scorer;
    use crate::types::{Finding, Target, VulnClass};
    use std::sync::Arc;

    fn vulnerable_model() -> ReportModel {
        let detector = Detector::new(
            Arc::new(SignatureCatalog::builtin()),
            VulnClass::ALL.iter().copied().collect(),
        );
        let correlator = Correlator::new(Arc::new(CveIndex::builtin()));

        let target = Target::new("https://db.example.com/item?id=1", 500)
            .with_banner("Apache/2.4.41 PHP/7.4")
            .with_observable("error", "syntax error near 'id'");
        let mut matches = detector.detect(&target);
        for m in &mut matches {
            correlator.correlate(m);
            scorer::apply(m);
        }
        RiskAggregator::aggregate(vec![Finding::completed(target, matches, 3)])
    }

    #[test]
    fn test_markdown_contains_summary_and_findings() {
        let model = vulnerable_model();
        let bytes = MarkdownReportGenerator::new()
            .generate(&model, "Security Assessment")
            .unwrap();
        let md = String::from_utf8(bytes).unwrap();

        assert!(md.starts_with("# Security Assessment"));
        assert!(md.contains("| **Total** |"));
        assert!(md.contains("https://db.example.com/item?id=1"));
        assert!(md.contains("SQLI"));
        assert!(md.contains("**Remediation:**"));
        assert!(md.contains("CVE-"));
    }

    #[test]
    fn test_markdown_marks_timed_out_targets() {
        let model = RiskAggregator::aggregate(vec![Finding::abandoned(
            Target::new("https://slow.example.com", 0),
            5000,
        )]);
        let bytes = MarkdownReportGenerator::new()
            .generate(&model, "Report")
            .unwrap();
        let md = String::from_utf8(bytes).unwrap();
        assert!(md.contains("timed out"));
    }
}
