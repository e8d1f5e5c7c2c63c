//! Asset fingerprints.

use serde::{Deserialize, Serialize};

/// Content fingerprint naming a staged asset (64 hex characters of SHA-256).
///
/// Staged assets live in `asset.<fingerprint>` directories below the
/// staging root, so two requests over the same manifest inputs land in the
/// same place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Create a validated `Fingerprint`.
    ///
    /// # Errors
    ///
    /// Returns an error string if `s` is not exactly 64 ASCII hex characters.
    pub fn validated(s: &str) -> Result<Self, String> {
        if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(format!(
                "Invalid fingerprint: expected 64 hex chars, got '{s}'"
            ))
        }
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory name of the staged asset (`asset.<fingerprint>`).
    pub fn asset_dir_name(&self) -> String {
        format!("asset.{}", self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
