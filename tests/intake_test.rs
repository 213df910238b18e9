// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Intake Integration Tests
 * Scan record files through the parser and into the engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

use vanguard_scanner::aggregator::RiskAggregator;
use vanguard_scanner::catalog::SignatureCatalog;
use vanguard_scanner::config::EngineConfig;
use vanguard_scanner::cve_index::CveIndex;
use vanguard_scanner::intake::ScanDataParser;
use vanguard_scanner::orchestrator::{CancellationFlag, ScanOrchestrator};
use vanguard_scanner::types::VulnClass;

fn temp_file_with(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_parse_csv_file() {
    let file = temp_file_with(
        ".csv",
        "URL,Status,Server,Error\n\
         https://a.example.com/?id=1,500,Apache/2.4 PHP/7.4,syntax error near 'id'\n\
         https://b.example.com/,200,nginx/1.18,\n",
    );

    let targets = ScanDataParser::parse_file(file.path()).unwrap();
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].url, "https://a.example.com/?id=1");
    assert_eq!(targets[0].status_code, 500);
    assert_eq!(
        targets[0].server_banner.as_deref(),
        Some("Apache/2.4 PHP/7.4")
    );
}

#[test]
fn test_parse_json_file() {
    let file = temp_file_with(
        ".json",
        r#"{"results": [
            {"url": "https://a.example.com", "status": 500, "error": "syntax error"},
            {"url": "https://b.example.com", "status": 200}
        ]}"#,
    );

    let targets = ScanDataParser::parse_file(file.path()).unwrap();
    assert_eq!(targets.len(), 2);
    assert_eq!(
        targets[0].observables.get("error").map(String::as_str),
        Some("syntax error")
    );
}

#[test]
fn test_parse_txt_file() {
    let file = temp_file_with(
        ".txt",
        "URL Status Response\n\
         https://a.example.com/login 500 Server: Apache/2.4.41 syntax error\n\
         https://b.example.com/ 200 ok\n",
    );

    let targets = ScanDataParser::parse_file(file.path()).unwrap();
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].server_banner.as_deref(), Some("Apache/2.4.41"));
}

#[test]
fn test_unsupported_extension_rejected() {
    let file = temp_file_with(".xml", "<scan/>");
    let err = ScanDataParser::parse_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("unsupported scan file format"));
}

#[test]
fn test_missing_file_rejected() {
    let err = ScanDataParser::parse_file(std::path::Path::new("/nonexistent/scan.csv"))
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_csv_file_through_full_engine() {
    let file = temp_file_with(
        ".csv",
        "URL,Status,Server,Error\n\
         https://db.example.com/item?id=1,500,Apache/2.4 PHP/7.4,syntax error near 'id'\n\
         https://static.example.com/,200,nginx/1.18,\n",
    );

    let targets = ScanDataParser::parse_file(file.path()).unwrap();
    let orchestrator = ScanOrchestrator::new(
        Arc::new(SignatureCatalog::builtin()),
        Arc::new(CveIndex::builtin()),
        EngineConfig::default(),
    )
    .unwrap();

    let findings = orchestrator.run(targets, &CancellationFlag::new()).await;
    assert_eq!(findings.len(), 2);

    let sqli_hits: Vec<_> = findings[0]
        .matches
        .iter()
        .filter(|m| m.class == VulnClass::Sqli)
        .collect();
    assert!(!sqli_hits.is_empty());
    // The banner technology tags restrict correlation to Apache/PHP CVEs.
    for m in &sqli_hits {
        for cve in &m.cves {
            assert!(cve
                .affected_systems
                .iter()
                .any(|s| ["apache", "php"].contains(&s.to_lowercase().as_str())));
        }
    }
    assert!(findings[1].matches.is_empty());

    let model = RiskAggregator::aggregate(findings);
    assert!(model.total_vulnerabilities >= 1);
}
