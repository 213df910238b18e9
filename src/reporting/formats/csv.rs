// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;
use csv::Writer;

use crate::aggregator::ReportModel;

pub struct CsvReportGenerator;

impl CsvReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// One row per vulnerability match. Targets without matches (including
    /// timed-out and failed ones) still get a row so the export covers every
    /// scanned target.
    pub fn generate(&self, model: &ReportModel) -> Result<Vec<u8>> {
        let mut wtr = Writer::from_writer(vec![]);

        wtr.write_record([
            "URL",
            "Class",
            "Rule",
            "Severity",
            "CVSS",
            "Description",
            "Matched Field",
            "CVEs",
            "Proof of Concept",
            "Status",
        ])?;

        for finding in &model.findings {
            let status = if finding.timed_out {
                "TIMED_OUT"
            } else if finding.error.is_some() {
                "ERROR"
            } else {
                "SCANNED"
            };

            if finding.matches.is_empty() {
                wtr.write_record([
                    finding.target.url.as_str(),
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    status,
                ])?;
                continue;
            }

            for m in &finding.matches {
                let cves = m
                    .cves
                    .iter()
                    .map(|c| c.cve_id.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let matched_field = m
                    .details
                    .get("matched_field")
                    .map(String::as_str)
                    .unwrap_or("");
                wtr.write_record([
                    finding.target.url.as_str(),
                    m.class.as_str(),
                    m.rule_id.as_str(),
                    m.severity.to_string().as_str(),
                    format!("{:.1}", m.cvss).as_str(),
                    m.description.as_str(),
                    matched_field,
                    cves.as_str(),
                    m.poc.as_str(),
                    status,
                ])?;
            }
        }

        Ok(wtr.into_inner()?)
    }
}

impl Default for CsvReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
