//! Hygiene prefixes for synthesized identifiers.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{CompilerError, CompilerResult};

lazy_static! {
    static ref PREFIX_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

static PREFIX_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Token namespacing every identifier the synthesizer introduces.
///
/// A fresh one is made for each synthesis pass; nothing requires it to be
/// stable across rebuilds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HygienePrefix(String);

impl HygienePrefix {
    pub fn new(token: impl Into<String>) -> CompilerResult<Self> {
        let token = token.into();
        if PREFIX_RE.is_match(&token) {
            Ok(Self(token))
        } else {
            Err(CompilerError::InvalidPrefix(token))
        }
    }

    /// `_w` + 8 hex digits + `_`, unique within the process.
    pub fn generate() -> Self {
        let count = PREFIX_COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(count.to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        let digest = hasher.finalize();
        let hex: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();

        Self(format!("_w{}_", hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `prefix + suffix`.
    pub fn ident(&self, suffix: &str) -> String {
        format!("{}{}", self.0, suffix)
    }
}

impl fmt::Display for HygienePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HygienePrefix {
    type Error = CompilerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HygienePrefix> for String {
    fn from(prefix: HygienePrefix) -> Self {
        prefix.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_prefixes_are_valid_and_distinct() {
        let prefixes: HashSet<_> = (0..64).map(|_| HygienePrefix::generate()).collect();
        assert_eq!(prefixes.len(), 64);
        for p in &prefixes {
            assert!(HygienePrefix::new(p.as_str()).is_ok(), "invalid: {}", p);
            assert_eq!(p.as_str().len(), 11);
        }
    }

    #[test]
    fn test_rejects_non_identifier_tokens() {
        assert!(matches!(
            HygienePrefix::new("9abc"),
            Err(CompilerError::InvalidPrefix(_))
        ));
        assert!(HygienePrefix::new("a-b").is_err());
        assert!(HygienePrefix::new("").is_err());
        assert!(HygienePrefix::new("$x_").is_ok());
    }

    #[test]
    fn test_ident_concatenates() {
        let p = HygienePrefix::new("_q_").unwrap();
        assert_eq!(p.ident("dataPlane"), "_q_dataPlane");
    }
}
