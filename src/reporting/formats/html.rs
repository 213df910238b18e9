// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;

use crate::aggregator::ReportModel;
use crate::types::Severity;

pub struct HtmlReportGenerator;

impl HtmlReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, model: &ReportModel, title: &str) -> Result<Vec<u8>> {
        Ok(self.generate_html(model, title).into_bytes())
    }

    fn generate_html(&self, model: &ReportModel, title: &str) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str(&format!("<title>{}</title>\n", escape(title)));
        html.push_str("<meta charset=\"utf-8\">\n<style>\n");
        html.push_str(
            "body { font-family: Arial, sans-serif; margin: 40px; color: #1f2937; }\n\
             h1 { border-bottom: 3px solid #2563eb; padding-bottom: 10px; }\n\
             table { border-collapse: collapse; margin: 20px 0; }\n\
             th, td { border: 1px solid #d1d5db; padding: 8px 16px; text-align: left; }\n\
             th { background: #f3f4f6; }\n\
             .finding { border: 1px solid #d1d5db; border-radius: 6px; padding: 16px; margin: 16px 0; }\n\
             .severity-critical { border-left: 6px solid #dc2626; }\n\
             .severity-high { border-left: 6px solid #ea580c; }\n\
             .severity-medium { border-left: 6px solid #ca8a04; }\n\
             .severity-low { border-left: 6px solid #16a34a; }\n\
             .severity-info { border-left: 6px solid #6b7280; }\n\
             .badge { display: inline-block; padding: 2px 10px; border-radius: 10px; color: #fff; font-size: 12px; }\n\
             .badge-critical { background: #dc2626; }\n\
             .badge-high { background: #ea580c; }\n\
             .badge-medium { background: #ca8a04; }\n\
             .badge-low { background: #16a34a; }\n\
             .badge-info { background: #6b7280; }\n\
             .remediation { background: #f0fdf4; padding: 12px; border-radius: 6px; }\n\
             code { background: #f3f4f6; padding: 2px 4px; border-radius: 3px; }\n",
        );
        html.push_str("</style>\n</head>\n<body>\n");

        html.push_str(&format!("<h1>{}</h1>\n", escape(title)));
        html.push_str(&format!(
            "<p>Generated: {} &mdash; Targets scanned: {} &mdash; Overall risk: \
             <span class=\"badge badge-{}\">{}</span></p>\n",
            escape(&model.generated_at),
            model.findings.len(),
            model.risk_level.to_string().to_lowercase(),
            model.risk_level
        ));

        html.push_str("<h2>Summary</h2>\n<table>\n<tr><th>Severity</th><th>Count</th></tr>\n");
        for severity in Severity::ALL {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                severity,
                model.severity_counts.get(&severity).copied().unwrap_or(0)
            ));
        }
        html.push_str(&format!(
            "<tr><th>Total</th><th>{}</th></tr>\n</table>\n",
            model.total_vulnerabilities
        ));

        html.push_str("<h2>Findings</h2>\n");
        for finding in &model.findings {
            html.push_str(&format!("<h3>{}</h3>\n", escape(&finding.target.url)));

            if finding.timed_out {
                html.push_str("<p><em>Scan timed out before completion.</em></p>\n");
                continue;
            }
            if let Some(error) = &finding.error {
                html.push_str(&format!("<p><em>Scan failed: {}</em></p>\n", escape(error)));
                continue;
            }
            if finding.matches.is_empty() {
                html.push_str("<p>No vulnerabilities detected.</p>\n");
                continue;
            }

            for m in &finding.matches {
                let class = m.severity.to_string().to_lowercase();
                html.push_str(&format!("<div class=\"finding severity-{}\">\n", class));
                html.push_str(&format!(
                    "<h4>{} <span class=\"badge badge-{}\">{}</span> (CVSS: {:.1})</h4>\n",
                    m.class, class, m.severity, m.cvss
                ));
                html.push_str(&format!("<p>{}</p>\n", escape(&m.description)));

                if !m.details.is_empty() {
                    html.push_str("<ul>\n");
                    for (key, value) in &m.details {
                        html.push_str(&format!(
                            "<li><strong>{}</strong>: {}</li>\n",
                            escape(key),
                            escape(value)
                        ));
                    }
                    html.push_str("</ul>\n");
                }

                html.push_str(&format!(
                    "<p><strong>Proof of concept:</strong> <code>{}</code></p>\n",
                    escape(&m.poc)
                ));

                for cve in &m.cves {
                    html.push_str(&format!(
                        "<p><strong>{}</strong> ({}, CVSS {:.1}): {}</p>\n",
                        escape(&cve.cve_id),
                        cve.severity,
                        cve.cvss_score,
                        escape(&cve.description)
                    ));
                }

                if !m.remediation.is_empty() {
                    html.push_str("<div class=\"remediation\"><strong>Remediation</strong><ol>\n");
                    for step in &m.remediation {
                        html.push_str(&format!("<li>{}</li>\n", escape(step)));
                    }
                    html.push_str("</ol></div>\n");
                }

                html.push_str("</div>\n");
            }
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

impl Default for HtmlReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
