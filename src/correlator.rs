// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::sync::Arc;
use tracing::debug;

use crate::cve_index::CveIndex;
use crate::types::VulnerabilityMatch;

/// Attaches known CVE records to raw detection matches.
#[derive(Clone)]
pub struct Correlator {
    index: Arc<CveIndex>,
}

impl Correlator {
    pub fn new(index: Arc<CveIndex>) -> Self {
        Self { index }
    }

    /// Fill the match's CVE list from the index, keyed by class and the
    /// technology tags detection extracted. An empty result is normal for
    /// classes or stacks with no indexed CVEs.
    pub fn correlate(&self, m: &mut VulnerabilityMatch) {
        m.cves = self.index.lookup(m.class, &m.tags);
        if !m.cves.is_empty() {
            debug!(
                "Correlated {} CVE(s) to {} ({})",
                m.cves.len(),
                m.rule_id,
                m.cves
                    .iter()
                    .map(|c| c.cve_id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
}
