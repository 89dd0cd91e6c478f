//! Runtime family classification and target validation.

use crate::error::{Result, UpgradeError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Coarse runtime classification, independent of the exact version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeFamily {
    Python,
    Nodejs,
    Unsupported,
}

impl fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeFamily::Python => write!(f, "python"),
            RuntimeFamily::Nodejs => write!(f, "nodejs"),
            RuntimeFamily::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl std::str::FromStr for RuntimeFamily {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "python" => Ok(RuntimeFamily::Python),
            "nodejs" | "node" => Ok(RuntimeFamily::Nodejs),
            _ => anyhow::bail!("Unsupported runtime family: {}. Supported: python, nodejs", s),
        }
    }
}

struct FamilyRule {
    family: RuntimeFamily,
    pattern: Regex,
    example: &'static str,
}

// Checked in order. A target must match its family's pattern exactly.
static FAMILY_RULES: Lazy<Vec<FamilyRule>> = Lazy::new(|| {
    vec![
        FamilyRule {
            family: RuntimeFamily::Python,
            pattern: Regex::new(r"^python3\.\d+$").expect("valid python runtime pattern"),
            example: "python3.12",
        },
        FamilyRule {
            family: RuntimeFamily::Nodejs,
            pattern: Regex::new(r"^nodejs\d+\.x$").expect("valid nodejs runtime pattern"),
            example: "nodejs20.x",
        },
    ]
});

/// Family name part of a runtime identifier: the literal `python`/`nodejs`
/// prefix, otherwise everything before the first digit, `.` or `-`.
pub fn coarse_prefix(runtime: &str) -> &str {
    for known in ["python", "nodejs"] {
        if runtime.starts_with(known) {
            return known;
        }
    }
    let end = runtime
        .find(|c: char| c.is_ascii_digit() || c == '.' || c == '-')
        .unwrap_or(runtime.len());
    &runtime[..end]
}

/// Classify any runtime string. Never fails; used for fleet runtimes that may
/// not be in canonical form.
pub fn derive_family(runtime: &str) -> RuntimeFamily {
    match coarse_prefix(runtime) {
        "python" => RuntimeFamily::Python,
        "nodejs" => RuntimeFamily::Nodejs,
        _ => RuntimeFamily::Unsupported,
    }
}

/// Validate a requested target runtime and return its family.
///
/// Pure and network-free, so a bad invocation fails before any AWS call.
pub fn validate_target(runtime: &str) -> Result<RuntimeFamily> {
    let family = derive_family(runtime);

    let Some(rule) = FAMILY_RULES.iter().find(|rule| rule.family == family) else {
        return Err(UpgradeError::UnsupportedRuntimeFamily {
            runtime: runtime.to_string(),
            family: coarse_prefix(runtime).to_string(),
            supported: supported_families(),
        });
    };

    if !rule.pattern.is_match(runtime) {
        return Err(UpgradeError::InvalidRuntimeFormat {
            runtime: runtime.to_string(),
            expected: rule.example.to_string(),
        });
    }

    Ok(rule.family)
}

fn supported_families() -> String {
    FAMILY_RULES
        .iter()
        .map(|rule| rule.family.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
