// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Severity Scorer
 * Combines rule weight and correlated CVE severity into a rating
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::{Severity, VulnerabilityMatch};

/// Added to the base weight when any correlated CVE is rated Critical or
/// High. Fixed so repeated scoring of the same match is identical.
pub const CVE_SEVERITY_BONUS: f32 = 1.5;

/// Ceiling for the CVSS-equivalent score.
pub const MAX_SCORE: f32 = 10.0;

/// Score one match. Pure: reads only the match, returns the rating and the
/// numeric score without touching any state.
pub fn score(m: &VulnerabilityMatch) -> (Severity, f32) {
    let mut cvss = m.base_weight;

    if m.cves
        .iter()
        .any(|cve| matches!(cve.severity, Severity::Critical | Severity::High))
    {
        cvss += CVE_SEVERITY_BONUS;
    }

    let cvss = cvss.clamp(0.0, MAX_SCORE);
    (Severity::from_cvss(cvss), cvss)
}

/// Apply the score to the match in place.
pub fn apply(m: &mut VulnerabilityMatch) {
    let (severity, cvss) = score(m);
    m.severity = severity;
    m.cvss = cvss;
}
