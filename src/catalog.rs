// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Signature Catalog
 * Detection rule definitions and predicate evaluation
 *
 * Rules are data: a closed predicate grammar evaluated against a target's
 * observable fields. New detections are new rule entries, not new code paths.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::{Target, VulnClass};

/// Evidence snippets are clipped to this many characters so findings stay
/// reproducible without carrying whole response bodies.
const MAX_SNIPPET_LEN: usize = 120;

/// Compiled regex cache shared across rule evaluations. The catalog is
/// read-only during a run, so entries are only ever added, never invalidated.
static REGEX_CACHE: Lazy<RwLock<HashMap<String, Regex>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Where a predicate matched and what it matched on.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEvidence {
    pub field: String,
    pub snippet: String,
}

/// Match predicate over a target's observable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "snake_case")]
pub enum MatchPredicate {
    /// Any observable field contains the needle (case-insensitive by default).
    ObservableContains {
        needle: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    /// Any observable field matches the regex pattern.
    ObservableRegex { pattern: String },
    /// The server banner contains the needle (case-insensitive).
    BannerContains { needle: String },
    /// The HTTP status code equals the given value.
    StatusEquals { status: u16 },
    /// The URL contains the needle (case-insensitive).
    UrlContains { needle: String },
    /// At least one sub-predicate matches.
    AnyOf { conditions: Vec<MatchPredicate> },
    /// Every sub-predicate matches; evidence comes from the first.
    AllOf { conditions: Vec<MatchPredicate> },
}

impl MatchPredicate {
    /// Evaluate against a target. `Ok(Some(_))` is a hit with evidence,
    /// `Ok(None)` is a clean miss, `Err` is a predicate failure (for example
    /// an invalid pattern) that the caller recovers from per rule.
    pub fn evaluate(&self, target: &Target) -> Result<Option<MatchEvidence>, String> {
        match self {
            MatchPredicate::ObservableContains {
                needle,
                case_sensitive,
            } => {
                for (field, value) in &target.observables {
                    let pos = if *case_sensitive {
                        value.find(needle.as_str())
                    } else {
                        value.to_lowercase().find(&needle.to_lowercase())
                    };
                    if let Some(pos) = pos {
                        return Ok(Some(MatchEvidence {
                            field: field.clone(),
                            snippet: clip_snippet(value, pos, needle.len()),
                        }));
                    }
                }
                Ok(None)
            }
            MatchPredicate::ObservableRegex { pattern } => {
                let regex = get_or_compile_regex(pattern)?;
                for (field, value) in &target.observables {
                    if let Some(m) = regex.find(value) {
                        return Ok(Some(MatchEvidence {
                            field: field.clone(),
                            snippet: clip_snippet(value, m.start(), m.end() - m.start()),
                        }));
                    }
                }
                Ok(None)
            }
            MatchPredicate::BannerContains { needle } => {
                if let Some(banner) = &target.server_banner {
                    if banner.to_lowercase().contains(&needle.to_lowercase()) {
                        return Ok(Some(MatchEvidence {
                            field: "server_banner".to_string(),
                            snippet: clip_snippet(banner, 0, banner.len()),
                        }));
                    }
                }
                Ok(None)
            }
            MatchPredicate::StatusEquals { status } => {
                if target.status_code == *status {
                    Ok(Some(MatchEvidence {
                        field: "status_code".to_string(),
                        snippet: target.status_code.to_string(),
                    }))
                } else {
                    Ok(None)
                }
            }
            MatchPredicate::UrlContains { needle } => {
                if target.url.to_lowercase().contains(&needle.to_lowercase()) {
                    Ok(Some(MatchEvidence {
                        field: "url".to_string(),
                        snippet: clip_snippet(&target.url, 0, target.url.len()),
                    }))
                } else {
                    Ok(None)
                }
            }
            MatchPredicate::AnyOf { conditions } => {
                for condition in conditions {
                    if let Some(evidence) = condition.evaluate(target)? {
                        return Ok(Some(evidence));
                    }
                }
                Ok(None)
            }
            MatchPredicate::AllOf { conditions } => {
                let mut first = None;
                for condition in conditions {
                    match condition.evaluate(target)? {
                        Some(evidence) => {
                            if first.is_none() {
                                first = Some(evidence);
                            }
                        }
                        None => return Ok(None),
                    }
                }
                Ok(first)
            }
        }
    }
}

/// Clip a bounded snippet around a match position.
fn clip_snippet(text: &str, start: usize, len: usize) -> String {
    let context = MAX_SNIPPET_LEN.saturating_sub(len) / 2;
    let from = start.saturating_sub(context);
    let to = (start + len + context).min(text.len());
    // Re-align to char boundaries so multi-byte input never panics.
    let from = (0..=from).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
    let to = (to..=text.len()).find(|i| text.is_char_boundary(*i)).unwrap_or(text.len());
    let mut snippet: String = text[from..to].chars().take(MAX_SNIPPET_LEN).collect();
    snippet = snippet.replace(['\r', '\n'], " ");
    snippet.trim().to_string()
}

fn get_or_compile_regex(pattern: &str) -> Result<Regex, String> {
    {
        let cache = REGEX_CACHE
            .read()
            .map_err(|e| format!("regex cache lock poisoned: {}", e))?;
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.clone());
        }
    }

    match Regex::new(&format!("(?i){}", pattern)) {
        Ok(regex) => {
            let mut cache = REGEX_CACHE
                .write()
                .map_err(|e| format!("regex cache lock poisoned: {}", e))?;
            cache.insert(pattern.to_string(), regex.clone());
            Ok(regex)
        }
        Err(e) => Err(format!("invalid regex pattern '{}': {}", pattern, e)),
    }
}

/// One detection rule: predicate plus scoring and remediation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureRule {
    pub id: String,
    pub class: VulnClass,
    pub description: String,
    pub predicate: MatchPredicate,
    /// Base severity weight, 0.0-10.0.
    pub weight: f32,
    pub remediation: Vec<String>,
}

/// Immutable rule set, loaded once before any scan and shared read-only
/// across tasks. Rule order is the detection output order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureCatalog {
    pub rules: Vec<SignatureRule>,
}

impl SignatureCatalog {
    pub fn new(rules: Vec<SignatureRule>) -> Self {
        Self { rules }
    }

    /// Parse a catalog from its JSON representation.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let catalog: SignatureCatalog = serde_json::from_str(json)?;
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The built-in detection rule set.
    pub fn builtin() -> Self {
        Self::new(builtin_rules())
    }
}

fn rule(
    id: &str,
    class: VulnClass,
    description: &str,
    predicate: MatchPredicate,
    weight: f32,
    remediation: &[&str],
) -> SignatureRule {
    SignatureRule {
        id: id.to_string(),
        class,
        description: description.to_string(),
        predicate,
        weight,
        remediation: remediation.iter().map(|s| s.to_string()).collect(),
    }
}

fn builtin_rules() -> Vec<SignatureRule> {
    vec![
        rule(
            "sqli-error-generic",
            VulnClass::Sqli,
            "Database error message disclosed in response",
            MatchPredicate::ObservableContains {
                needle: "syntax error".to_string(),
                case_sensitive: false,
            },
            8.0,
            &[
                "Use parameterized queries or prepared statements for all database access",
                "Disable verbose database error messages in production",
                "Validate and sanitize all user-supplied input server-side",
            ],
        ),
        rule(
            "sqli-error-mysql",
            VulnClass::Sqli,
            "MySQL error signature in response body",
            MatchPredicate::ObservableRegex {
                pattern: r"(mysql_fetch|you have an error in your sql|mysql_num_rows|mysqli?_error)".to_string(),
            },
            8.0,
            &[
                "Use parameterized queries or prepared statements for all database access",
                "Disable verbose database error messages in production",
            ],
        ),
        rule(
            "sqli-error-oracle-pg",
            VulnClass::Sqli,
            "Oracle or PostgreSQL error signature in response body",
            MatchPredicate::ObservableRegex {
                pattern: r"(ora-\d{5}|pg_query|pg_exec|unterminated quoted string)".to_string(),
            },
            7.5,
            &[
                "Use parameterized queries or prepared statements for all database access",
                "Disable verbose database error messages in production",
            ],
        ),
        rule(
            "xss-reflected-script",
            VulnClass::Xss,
            "Unencoded script tag reflected in response",
            MatchPredicate::ObservableContains {
                needle: "<script>alert(".to_string(),
                case_sensitive: false,
            },
            6.5,
            &[
                "Encode output contextually (HTML, attribute, JavaScript) before rendering",
                "Deploy a Content-Security-Policy header",
                "Sanitize rich-text input with an allowlist",
            ],
        ),
        rule(
            "xss-event-handler",
            VulnClass::Xss,
            "Injected event handler reflected in response",
            MatchPredicate::ObservableRegex {
                pattern: r"(onerror\s*=|onload\s*=|<svg[^>]*onload)".to_string(),
            },
            6.0,
            &[
                "Encode output contextually (HTML, attribute, JavaScript) before rendering",
                "Deploy a Content-Security-Policy header",
            ],
        ),
        rule(
            "rce-command-output",
            VulnClass::Rce,
            "Command execution output present in response",
            MatchPredicate::ObservableRegex {
                pattern: r"(uid=\d+\(\w+\) gid=\d+|volume serial number|directory of c:\\)".to_string(),
            },
            9.5,
            &[
                "Never pass user input to system shells or command interpreters",
                "Use safe process APIs with argument arrays instead of shell strings",
                "Run services with minimal operating system privileges",
            ],
        ),
        rule(
            "rce-eval-error",
            VulnClass::Rce,
            "Code evaluation error disclosed in response",
            MatchPredicate::ObservableRegex {
                pattern: r"(eval\(\)'d code|call to undefined function|java\.lang\.runtime)".to_string(),
            },
            8.5,
            &[
                "Never pass user input to eval-style interpreters",
                "Run services with minimal operating system privileges",
            ],
        ),
        rule(
            "lfi-passwd-disclosure",
            VulnClass::Lfi,
            "Unix password file contents in response",
            MatchPredicate::ObservableContains {
                needle: "root:x:0:0".to_string(),
                case_sensitive: false,
            },
            8.0,
            &[
                "Resolve file paths against an allowlist; reject traversal sequences",
                "Serve static content from a dedicated, chrooted location",
            ],
        ),
        rule(
            "lfi-windows-ini",
            VulnClass::Lfi,
            "Windows system file contents in response",
            MatchPredicate::ObservableContains {
                needle: "[boot loader]".to_string(),
                case_sensitive: false,
            },
            7.5,
            &[
                "Resolve file paths against an allowlist; reject traversal sequences",
            ],
        ),
        rule(
            "xxe-entity-resolution",
            VulnClass::Xxe,
            "External entity resolution evidence in response",
            MatchPredicate::AllOf {
                conditions: vec![
                    MatchPredicate::ObservableContains {
                        needle: "<!ENTITY".to_string(),
                        case_sensitive: false,
                    },
                    MatchPredicate::ObservableRegex {
                        pattern: r"(root:x:0:0|file:///)".to_string(),
                    },
                ],
            },
            8.5,
            &[
                "Disable DTD processing and external entity resolution in the XML parser",
                "Prefer JSON or other entity-free formats for untrusted input",
            ],
        ),
        rule(
            "ssti-template-error",
            VulnClass::Ssti,
            "Template engine error disclosed in response",
            MatchPredicate::ObservableRegex {
                pattern: r"(templatesyntaxerror|jinja2\.exceptions|twig_error|freemarker\.template)".to_string(),
            },
            7.0,
            &[
                "Never render user input as a template; pass it as data only",
                "Use a sandboxed template environment with logic-less templates",
            ],
        ),
        rule(
            "ssti-expression-result",
            VulnClass::Ssti,
            "Template expression arithmetic evaluated in response",
            MatchPredicate::AllOf {
                conditions: vec![
                    MatchPredicate::UrlContains {
                        needle: "7*7".to_string(),
                    },
                    MatchPredicate::ObservableContains {
                        needle: "49".to_string(),
                        case_sensitive: true,
                    },
                ],
            },
            7.5,
            &[
                "Never render user input as a template; pass it as data only",
            ],
        ),
        rule(
            "info-server-version",
            VulnClass::Other,
            "Server banner discloses software version",
            MatchPredicate::ObservableRegex {
                pattern: r"(apache/\d|nginx/\d|iis/\d|php/\d)".to_string(),
            },
            2.0,
            &[
                "Suppress version strings in Server and X-Powered-By headers",
            ],
        ),
        rule(
            "info-directory-listing",
            VulnClass::Other,
            "Directory listing enabled",
            MatchPredicate::AllOf {
                conditions: vec![
                    MatchPredicate::StatusEquals { status: 200 },
                    MatchPredicate::ObservableContains {
                        needle: "Index of /".to_string(),
                        case_sensitive: true,
                    },
                ],
            },
            3.5,
            &[
                "Disable automatic directory indexes on the web server",
                "Place an index document in every served directory",
            ],
        ),
        rule(
            "info-stack-trace",
            VulnClass::Other,
            "Application stack trace disclosed in response",
            MatchPredicate::ObservableRegex {
                pattern: r"(traceback \(most recent call last\)|at [\w.$]+\(\w+\.java:\d+\)|stack trace:)".to_string(),
            },
            4.0,
            &[
                "Return generic error pages; log stack traces server-side only",
            ],
        ),
    ]
}
