// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Orchestrator
 * Fans the detection pipeline out across targets under bounded concurrency
 *
 * One logical task per target, at most `concurrency_limit` in flight. Tasks
 * past their deadline are abandoned, failed tasks are isolated, and the
 * finding sequence always matches the input target order.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::catalog::SignatureCatalog;
use crate::config::EngineConfig;
use crate::correlator::Correlator;
use crate::cve_index::CveIndex;
use crate::detector::Detector;
use crate::errors::EngineError;
use crate::scorer;
use crate::types::{Finding, Target};

/// Cooperative cancellation handle shared between the caller and in-flight
/// tasks. Tasks observe it between pipeline stages; a cancelled run starts
/// no further tasks.
#[derive(Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct ScanOrchestrator {
    detector: Detector,
    correlator: Correlator,
    config: EngineConfig,
}

impl ScanOrchestrator {
    /// Build an orchestrator over a frozen catalog and CVE index.
    ///
    /// The configuration is validated here, before any task can start; an
    /// invalid limit or timeout is a caller contract violation.
    pub fn new(
        catalog: Arc<SignatureCatalog>,
        index: Arc<CveIndex>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let detector = Detector::new(catalog, config.enabled_classes.clone());
        let correlator = Correlator::new(index);
        Ok(Self {
            detector,
            correlator,
            config,
        })
    }

    /// Scan every target and return one finding per target, in input order.
    ///
    /// No per-target outcome aborts the run: timeouts and task failures are
    /// recorded on the affected finding and the remaining targets proceed.
    pub async fn run(&self, targets: Vec<Target>, cancel: &CancellationFlag) -> Vec<Finding> {
        let detector = self.detector.clone();
        let correlator = self.correlator.clone();
        self.run_with(targets, cancel, move |target, cancel| {
            let detector = detector.clone();
            let correlator = correlator.clone();
            async move { scan_pipeline(&detector, &correlator, target, &cancel) }
        })
        .await
    }

    /// Fan `pipeline` out across the targets under the configured limits.
    /// Split from `run` so tests can drive scheduling with injected delays.
    pub(crate) async fn run_with<F, Fut>(
        &self,
        targets: Vec<Target>,
        cancel: &CancellationFlag,
        pipeline: F,
    ) -> Vec<Finding>
    where
        F: Fn(Target, CancellationFlag) -> Fut,
        Fut: Future<Output = Finding> + Send + 'static,
    {
        let total = targets.len();
        let per_target_timeout = self.config.per_target_timeout;
        info!(
            "Scan run starting: {} targets, concurrency={}, per-target timeout={:?}",
            total, self.config.concurrency_limit, per_target_timeout
        );

        let results: Vec<(usize, Finding)> = stream::iter(targets.into_iter().enumerate())
            .map(|(index, target)| {
                let cancel = cancel.clone();
                let task = if cancel.is_cancelled() {
                    None
                } else {
                    Some(pipeline(target.clone(), cancel.clone()))
                };
                async move {
                    let started = Instant::now();
                    let Some(task) = task else {
                        // Cancelled before this task started.
                        return (index, Finding::abandoned(target, 0));
                    };

                    let mut handle = tokio::spawn(task);
                    match timeout(per_target_timeout, &mut handle).await {
                        Ok(Ok(finding)) => (index, finding),
                        Ok(Err(join_err)) => {
                            let err = EngineError::TargetTask {
                                url: target.url.clone(),
                                reason: join_err.to_string(),
                            };
                            error!("{}", err);
                            (
                                index,
                                Finding::failed(
                                    target,
                                    join_err.to_string(),
                                    started.elapsed().as_millis() as u64,
                                ),
                            )
                        }
                        Err(_) => {
                            warn!(
                                "{}",
                                EngineError::TargetTimeout {
                                    url: target.url.clone(),
                                    timeout: per_target_timeout,
                                }
                            );
                            handle.abort();
                            (
                                index,
                                Finding::abandoned(target, started.elapsed().as_millis() as u64),
                            )
                        }
                    }
                }
            })
            .buffer_unordered(self.config.concurrency_limit)
            .collect()
            .await;

        // Completion order is scheduler-dependent; rebuild input order by
        // the original index.
        let mut slots: Vec<Option<Finding>> = (0..total).map(|_| None).collect();
        for (index, finding) in results {
            slots[index] = Some(finding);
        }
        let findings: Vec<Finding> = slots.into_iter().flatten().collect();

        let timed_out = findings.iter().filter(|f| f.timed_out).count();
        let failed = findings.iter().filter(|f| f.error.is_some()).count();
        let matches: usize = findings.iter().map(|f| f.matches.len()).sum();
        info!(
            "Scan run finished: {} findings, {} matches, {} timed out, {} failed",
            findings.len(),
            matches,
            timed_out,
            failed
        );
        findings
    }
}

/// One target's pipeline: detect, then correlate and score each match.
///
/// Pure computation over materialized target data. Cancellation is observed
/// between stages only, so a finding never carries half-written evidence.
fn scan_pipeline(
    detector: &Detector,
    correlator: &Correlator,
    target: Target,
    cancel: &CancellationFlag,
) -> Finding {
    let started = Instant::now();

    let mut matches = detector.detect(&target);

    if cancel.is_cancelled() {
        return Finding::abandoned(target, started.elapsed().as_millis() as u64);
    }

    for m in &mut matches {
        correlator.correlate(m);
        scorer::apply(m);
    }

    Finding::completed(target, matches, started.elapsed().as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::time::Duration;

    use crate::types::VulnClass;

    fn orchestrator(config: EngineConfig) -> ScanOrchestrator {
        ScanOrchestrator::new(
            Arc::new(SignatureCatalog::builtin()),
            Arc::new(CveIndex::builtin()),
            config,
        )
        .unwrap()
    }

    fn targets(n: usize) -> Vec<Target> {
        (0..n)
            .map(|i| Target::new(format!("https://host{}.example.com/", i), 200))
            .collect()
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let config = EngineConfig {
            concurrency_limit: 0,
            ..EngineConfig::default()
        };
        let result = ScanOrchestrator::new(
            Arc::new(SignatureCatalog::builtin()),
            Arc::new(CveIndex::builtin()),
            config,
        );
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_output_length_and_order_match_input() {
        let orch = orchestrator(EngineConfig {
            concurrency_limit: 4,
            ..EngineConfig::default()
        });
        let cancel = CancellationFlag::new();
        let input = targets(10);
        let urls: Vec<String> = input.iter().map(|t| t.url.clone()).collect();

        let findings = orch.run(input, &cancel).await;
        assert_eq!(findings.len(), 10);
        let out_urls: Vec<String> = findings.iter().map(|f| f.target.url.clone()).collect();
        assert_eq!(out_urls, urls);
    }

    #[tokio::test]
    async fn test_order_preserved_under_injected_jitter() {
        let orch = orchestrator(EngineConfig::default());
        let cancel = CancellationFlag::new();
        let input = targets(8);
        let urls: Vec<String> = input.iter().map(|t| t.url.clone()).collect();

        // Earlier targets sleep longer, so completion order is roughly the
        // reverse of input order.
        let findings = orch
            .run_with(input, &cancel, |target, _cancel| async move {
                let index: u64 = target
                    .url
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .collect::<String>()
                    .parse()
                    .unwrap();
                tokio::time::sleep(Duration::from_millis(10 * (8 - index))).await;
                Finding::completed(target, Vec::new(), 0)
            })
            .await;

        let out_urls: Vec<String> = findings.iter().map(|f| f.target.url.clone()).collect();
        assert_eq!(out_urls, urls);
    }

    #[tokio::test]
    async fn test_slow_target_times_out_without_blocking_others() {
        let config = EngineConfig {
            concurrency_limit: 4,
            per_target_timeout: Duration::from_millis(100),
            ..EngineConfig::default()
        };
        let orch = orchestrator(config);
        let cancel = CancellationFlag::new();
        let input = targets(3);

        let findings = orch
            .run_with(input, &cancel, |target, _cancel| async move {
                if target.url.contains("host1") {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                Finding::completed(target, Vec::new(), 0)
            })
            .await;

        assert_eq!(findings.len(), 3);
        assert!(!findings[0].timed_out);
        assert!(findings[1].timed_out);
        assert!(findings[1].matches.is_empty());
        assert!(findings[1].error.is_none());
        assert!(!findings[2].timed_out);
    }

    #[tokio::test]
    async fn test_panicking_task_is_isolated() {
        let orch = orchestrator(EngineConfig::default());
        let cancel = CancellationFlag::new();
        let input = targets(3);

        let findings = orch
            .run_with(input, &cancel, |target, _cancel| async move {
                if target.url.contains("host1") {
                    panic!("synthetic pipeline failure");
                }
                Finding::completed(target, Vec::new(), 0)
            })
            .await;

        assert_eq!(findings.len(), 3);
        assert!(findings[1].error.is_some());
        assert!(findings[1].matches.is_empty());
        assert!(findings[0].error.is_none());
        assert!(findings[2].error.is_none());
    }

    #[tokio::test]
    async fn test_cancellation_stops_further_tasks() {
        let config = EngineConfig {
            concurrency_limit: 1,
            ..EngineConfig::default()
        };
        let orch = orchestrator(config);
        let cancel = CancellationFlag::new();
        let input = targets(3);

        // The first task requests cancellation; with a single worker slot the
        // remaining targets must never start.
        let findings = orch
            .run_with(input, &cancel, |target, cancel| async move {
                if target.url.contains("host0") {
                    cancel.cancel();
                }
                Finding::completed(target, Vec::new(), 0)
            })
            .await;

        assert_eq!(findings.len(), 3);
        assert!(!findings[0].timed_out);
        assert!(findings[1].timed_out, "queued target should be abandoned");
        assert!(findings[2].timed_out, "queued target should be abandoned");
    }

    #[tokio::test]
    async fn test_cancelled_before_start_abandons_everything() {
        let orch = orchestrator(EngineConfig::default());
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let findings = orch.run(targets(4), &cancel).await;
        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| f.timed_out && f.matches.is_empty()));
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let orch = orchestrator(EngineConfig::default());
        let cancel = CancellationFlag::new();
        let findings = orch.run(Vec::new(), &cancel).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_detection_through_run() {
        let orch = orchestrator(EngineConfig::default());
        let cancel = CancellationFlag::new();

        let vulnerable = Target::new("https://db.example.com/item?id=1", 500)
            .with_banner("nginx/1.18.0")
            .with_observable("error", "syntax error at or near \"'\"");
        let clean = Target::new("https://static.example.com/", 200)
            .with_observable("body", "<html>hello</html>");

        let findings = orch.run(vec![vulnerable, clean], &cancel).await;
        assert_eq!(findings.len(), 2);
        assert!(!findings[0].matches.is_empty());
        assert!(findings[1].matches.is_empty());

        let m = &findings[0].matches[0];
        assert_eq!(m.class, VulnClass::Sqli);
        assert!(m.cvss >= m.base_weight, "scorer ran");
        assert_ne!(m.severity, crate::types::Severity::Info);
    }

    #[tokio::test]
    async fn test_enabled_classes_restrict_detection() {
        let config = EngineConfig {
            enabled_classes: [VulnClass::Xss].into_iter().collect::<BTreeSet<_>>(),
            ..EngineConfig::default()
        };
        let orch = orchestrator(config);
        let cancel = CancellationFlag::new();

        let sqli_only = Target::new("https://db.example.com/item?id=1", 500)
            .with_observable("error", "syntax error near 'id'");
        let findings = orch.run(vec![sqli_only], &cancel).await;
        assert!(findings[0].matches.is_empty());
    }
}
