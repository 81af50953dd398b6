//! Sync code model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::util::normalize_text_option;

/// Obscure a code for display: everything but the final two characters
/// is hidden. Codes shorter than two characters are fully hidden.
pub fn mask_code(code: &str) -> String {
    let chars = code.chars().count();
    if chars < 2 {
        return "****".to_string();
    }
    let suffix: String = code.chars().skip(chars - 2).collect();
    format!("****{suffix}")
}

/// The user-chosen code selecting which remote document receives
/// forwarded notification fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncCode(String);

impl SyncCode {
    /// Create a sync code, trimming surrounding whitespace.
    /// Empty codes are rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self, Error> {
        normalize_text_option(Some(raw.into()))
            .map(Self)
            .ok_or_else(|| Error::InvalidInput("sync code must not be empty".to_string()))
    }

    /// The raw code, used as the remote document id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The obscured form shown to users.
    pub fn masked(&self) -> String {
        mask_code(&self.0)
    }
}

impl FromStr for SyncCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// Codes are quasi-secrets; Display prints the masked form so they never
// leak into logs.
impl fmt::Display for SyncCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_code_hides_short_codes_entirely() {
        assert_eq!(mask_code(""), "****");
        assert_eq!(mask_code("a"), "****");
    }

    #[test]
    fn mask_code_keeps_final_two_characters() {
        assert_eq!(mask_code("ab"), "****ab");
        assert_eq!(mask_code("ABCDE"), "****DE");
    }

    #[test]
    fn mask_code_counts_characters_not_bytes() {
        assert_eq!(mask_code("xe-máy"), "****áy");
    }

    #[test]
    fn new_trims_and_rejects_empty() {
        assert_eq!(SyncCode::new("  abc42  ").unwrap().as_str(), "abc42");
        assert!(SyncCode::new("   ").is_err());
        assert!("".parse::<SyncCode>().is_err());
    }

    #[test]
    fn display_is_masked() {
        let code: SyncCode = "ABCDE".parse().unwrap();
        assert_eq!(code.to_string(), "****DE");
        assert_eq!(format!("{code}"), code.masked());
    }
}
