// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Report Rendering
 * Renders the aggregated report model into deliverable formats
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod formats;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aggregator::ReportModel;
use self::formats::{
    csv::CsvReportGenerator, html::HtmlReportGenerator, json::JsonReportGenerator,
    markdown::MarkdownReportGenerator,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
    Html,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
            ReportFormat::Html => "html",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Markdown => "text/markdown",
            ReportFormat::Html => "text/html",
            ReportFormat::Csv => "text/csv",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub format: ReportFormat,
    pub data: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

pub struct ReportEngine;

impl ReportEngine {
    pub fn new() -> Self {
        Self
    }

    /// Render the report model into the requested format. The model is
    /// consumed read-only; rendering never mutates counts or ordering.
    pub fn generate_report(
        &self,
        model: &ReportModel,
        format: ReportFormat,
        title: &str,
    ) -> Result<ReportOutput> {
        let data = match format {
            ReportFormat::Json => JsonReportGenerator::new().generate(model)?,
            ReportFormat::Markdown => MarkdownReportGenerator::new().generate(model, title)?,
            ReportFormat::Html => HtmlReportGenerator::new().generate(model, title)?,
            ReportFormat::Csv => CsvReportGenerator::new().generate(model)?,
        };

        let filename = format!(
            "vanguard_report_{}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            format.extension()
        );

        Ok(ReportOutput {
            format,
            data,
            filename,
            mime_type: format.mime_type().to_string(),
        })
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::RiskAggregator;
    use crate::types::{Finding, Target};

    fn empty_model() -> ReportModel {
        RiskAggregator::aggregate(vec![Finding::completed(
            Target::new("https://example.com", 200),
            Vec::new(),
            1,
        )])
    }

    #[test]
    fn test_every_format_renders() {
        let engine = ReportEngine::new();
        let model = empty_model();
        for format in [
            ReportFormat::Json,
            ReportFormat::Markdown,
            ReportFormat::Html,
            ReportFormat::Csv,
        ] {
            let output = engine.generate_report(&model, format, "Test Report").unwrap();
            assert!(!output.data.is_empty(), "{:?}", format);
            assert!(output.filename.ends_with(format.extension()));
        }
    }

    #[test]
    fn test_json_report_roundtrips_to_model() {
        let engine = ReportEngine::new();
        let model = empty_model();
        let output = engine
            .generate_report(&model, ReportFormat::Json, "Test")
            .unwrap();
        let parsed: ReportModel = serde_json::from_slice(&output.data).unwrap();
        assert_eq!(parsed.total_vulnerabilities, model.total_vulnerabilities);
        assert_eq!(parsed.findings.len(), model.findings.len());
    }
}
