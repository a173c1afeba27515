//! Synthetic scan-report payloads.

use rand::Rng;
use serde::{Deserialize, Serialize};

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()";
const SET_ID_TYPES: [&str; 2] = ["setgid", "setuid"];

/// A leaked-credential finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Secret {
    #[serde(rename = "Type")]
    pub kind: String,
    pub text: String,
    pub file: String,
    pub rule_desc: String,
    pub suggestion: String,
}

/// A setuid/setgid finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetId {
    #[serde(rename = "Type")]
    pub kind: String,
    pub file: String,
    pub evidence: String,
}

/// Report body that gets hashed and cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub secrets: Vec<Secret>,
    pub set_ids: Vec<SetId>,
}

impl ScanReport {
    /// Builds a report with two secrets and three set-id findings.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let secrets = (0..2)
            .map(|i| Secret {
                kind: "regular".to_string(),
                text: random_string(rng, 20),
                file: format!("/Credential{}.yaml", i),
                rule_desc: "Credential".to_string(),
                suggestion: "Please cloak your password and secret key".to_string(),
            })
            .collect();

        let set_ids = (0..3)
            .map(|i| SetId {
                kind: SET_ID_TYPES[rng.gen_range(0..SET_ID_TYPES.len())].to_string(),
                file: format!("/var/log/apache{}", i + 1),
                evidence: random_string(rng, 10),
            })
            .collect();

        Self { secrets, set_ids }
    }
}

/// Random string over the report charset.
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Renders a fresh random report as pretty JSON.
pub fn generate_payload<R: Rng + ?Sized>(rng: &mut R) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ScanReport::random(rng))
}
