//! Perpetual symbol naming.
//!
//! The exchange names perps by bare coin (`BTC`), while everything shown to the
//! user carries a `-PERP` suffix (`BTC-PERP`). Spot names (`@107`, `PURR/USDC`)
//! never get the suffix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix marking a perpetual contract symbol.
pub const PERP_SUFFIX: &str = "-PERP";

/// Whether `name` ends with `-PERP`, ignoring ASCII case.
pub fn has_perp_suffix(name: &str) -> bool {
    let bytes = name.as_bytes();
    let suffix = PERP_SUFFIX.as_bytes();
    bytes.len() >= suffix.len() && bytes[bytes.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Display name for an exchange coin name.
///
/// Perp coins gain the suffix; spot identifiers pass through unchanged.
pub fn display_symbol(coin: &str) -> String {
    if coin.starts_with('@') || coin.contains('/') || has_perp_suffix(coin) {
        coin.to_string()
    } else {
        format!("{coin}{PERP_SUFFIX}")
    }
}

/// Canonical trading-pair symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Build a perpetual symbol, appending `-PERP` unless already present.
    pub fn perp(name: impl Into<String>) -> Self {
        let name = name.into();
        if has_perp_suffix(&name) {
            Self(name)
        } else {
            Self(format!("{name}{PERP_SUFFIX}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_perp(&self) -> bool {
        has_perp_suffix(&self.0)
    }

    /// Exchange coin name used in API requests (`BTC-PERP` -> `BTC`).
    pub fn coin(&self) -> &str {
        if self.is_perp() {
            // The suffix is ASCII, so this is always a char boundary.
            &self.0[..self.0.len() - PERP_SUFFIX.len()]
        } else {
            &self.0
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
