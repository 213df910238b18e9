// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Record Intake
 * Parses CSV, JSON and plain-text scan result files into targets
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::types::Target;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static STATUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{3})\b").unwrap());
static SERVER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Server:\s*(\S+)").unwrap());

/// Parser for the scan result formats the engine accepts.
pub struct ScanDataParser;

impl ScanDataParser {
    /// Parse a scan results file based on its extension.
    pub fn parse_file(path: &Path) -> Result<Vec<Target>> {
        if !path.exists() {
            bail!("scan file not found: {}", path.display());
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let targets = match extension.as_str() {
            "csv" => Self::parse_csv(&raw)?,
            "json" => Self::parse_json(&raw)?,
            "txt" => Self::parse_txt(&raw),
            other => bail!("unsupported scan file format: .{}", other),
        };

        info!(
            "Parsed {} scan entries from {}",
            targets.len(),
            path.display()
        );
        Ok(targets)
    }

    /// CSV with a header row. Column names are matched case-insensitively;
    /// unrecognized columns become observable fields.
    pub fn parse_csv(raw: &str) -> Result<Vec<Target>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .context("failed to read CSV header row")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut targets = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed CSV row {}: {}", line + 2, e);
                    continue;
                }
            };

            let fields: BTreeMap<String, String> = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect();

            match target_from_fields(fields) {
                Some(target) => targets.push(target),
                None => warn!("Skipping CSV row {} without a URL", line + 2),
            }
        }
        Ok(targets)
    }

    /// JSON: an array of records, a `{"results": [...]}` wrapper, or a
    /// single record object.
    pub fn parse_json(raw: &str) -> Result<Vec<Target>> {
        let value: Value = serde_json::from_str(raw).context("invalid JSON scan file")?;

        let records: Vec<Value> = match value {
            Value::Array(items) => items,
            Value::Object(ref obj) if obj.contains_key("results") => match &obj["results"] {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            },
            other @ Value::Object(_) => vec![other],
            _ => bail!("JSON scan file must be an object or an array of objects"),
        };

        let mut targets = Vec::new();
        for (i, record) in records.into_iter().enumerate() {
            let Value::Object(obj) = record else {
                warn!("Skipping non-object JSON record {}", i);
                continue;
            };

            let fields: BTreeMap<String, String> = obj
                .into_iter()
                .filter_map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((k, text))
                })
                .collect();

            match target_from_fields(fields) {
                Some(target) => targets.push(target),
                None => warn!("Skipping JSON record {} without a URL", i),
            }
        }
        Ok(targets)
    }

    /// Free-form text: one record per line carrying a URL, optionally a
    /// status code and a `Server:` banner; the whole line is kept as the raw
    /// observable. Lines without a URL (headers, separators) are skipped.
    pub fn parse_txt(raw: &str) -> Vec<Target> {
        let mut targets = Vec::new();

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some(url_match) = URL_RE.find(line) else {
                continue;
            };
            let url = url_match.as_str().trim_end_matches(&[',', ';'][..]);

            let after_url = &line[url_match.end()..];
            let status = STATUS_RE
                .captures(after_url)
                .and_then(|c| c[1].parse::<u16>().ok())
                .unwrap_or(0);

            let mut target = Target::new(url, status).with_observable("raw", line);
            if let Some(caps) = SERVER_RE.captures(line) {
                target = target.with_banner(&caps[1]);
            }
            targets.push(target);
        }

        targets
    }
}

/// Build a target out of a flat field map. Returns None when no URL column
/// is present; such records are the intake layer's to reject.
fn target_from_fields(fields: BTreeMap<String, String>) -> Option<Target> {
    let mut url = None;
    let mut status = 0u16;
    let mut banner = None;
    let mut observables = BTreeMap::new();

    for (key, value) in fields {
        if value.is_empty() {
            continue;
        }
        match key.to_lowercase().as_str() {
            "url" | "target" => url = Some(value),
            "status" | "status_code" | "statuscode" => {
                status = value.parse().unwrap_or(0);
            }
            "server" | "server_banner" | "banner" => banner = Some(value),
            _ => {
                observables.insert(key, value);
            }
        }
    }

    let mut target = Target::new(url?, status);
    target.server_banner = banner;
    target.observables = observables;
    Some(target)
}
