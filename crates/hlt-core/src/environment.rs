//! Testnet-only environment guard.
//!
//! Every network call in this workspace is preceded by a successful guard
//! check. The guard reads a snapshot of environment variables (`EnvSource`)
//! and refuses to produce an `EnvironmentConfig` unless `HL_IS_TESTNET` is
//! exactly `"true"` and every override URL mentions `testnet`.

use crate::error::ConfigError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Default REST root for the testnet API.
pub const DEFAULT_API_ROOT: &str = "https://api.hyperliquid-testnet.xyz";
/// Default testnet WebSocket endpoint.
pub const DEFAULT_WS_URL: &str = "wss://api.hyperliquid-testnet.xyz/ws";
/// Placeholder address used when no test address is configured.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

const KEY_IS_TESTNET: &str = "HL_IS_TESTNET";
const KEY_API_BASE_URL: &str = "HL_API_BASE_URL";
const KEY_WS_URL: &str = "HL_WS_URL";
const KEY_PRIVATE_KEY: &str = "WALLET_PRIVATE_KEY";
const KEY_USER_ADDRESS: &str = "TEST_USER_ADDRESS";
const KEY_MARKET_ID: &str = "DEFAULT_MARKET_ID";
const KEY_PRICE: &str = "DEFAULT_PRICE";
const KEY_SIZE: &str = "DEFAULT_SIZE";
const KEY_DRY_RUN: &str = "DRY_RUN";

/// Browser builds expose the same settings with this prefix.
const BROWSER_PREFIX: &str = "VITE_";

/// Snapshot of configuration variables.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Capture the current process environment.
    ///
    /// Call after `dotenvy` has loaded `.env` so file values are included.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build a source from explicit pairs (tests, embedding).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up `key`, falling back to its `VITE_` variant. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .filter(|v| !v.is_empty())
            .or_else(|| {
                self.vars
                    .get(&format!("{BROWSER_PREFIX}{key}"))
                    .filter(|v| !v.is_empty())
            })
            .map(String::as_str)
    }
}

/// Private key material used to sign exchange actions.
///
/// Never printed; zeroized on drop.
#[derive(Clone)]
pub struct SigningCredential(Zeroizing<String>);

impl SigningCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Raw secret. Only the signer should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningCredential(***)")
    }
}

/// Values used to prefill forms and CLI demo requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefaults {
    pub user_address: String,
    pub market_id: String,
    pub price: String,
    pub size: String,
}

/// Validated testnet configuration.
///
/// Only obtainable through [`EnvironmentConfig::load`], so holding one proves
/// the guard passed.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    api_base_url: Option<String>,
    ws_url: Option<String>,
    signing_credential: Option<SigningCredential>,
    defaults: FormDefaults,
    dry_run: bool,
}

impl EnvironmentConfig {
    /// Validate `source` and build the configuration.
    pub fn load(source: &EnvSource) -> Result<Self, ConfigError> {
        require_testnet(source.get(KEY_IS_TESTNET))?;

        let api_base_url = source.get(KEY_API_BASE_URL).map(str::to_string);
        let ws_url = source.get(KEY_WS_URL).map(str::to_string);
        assert_url_is_testnet(KEY_API_BASE_URL, api_base_url.as_deref())?;
        assert_url_is_testnet(KEY_WS_URL, ws_url.as_deref())?;

        let signing_credential = source
            .get(KEY_PRIVATE_KEY)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(SigningCredential::new);

        let defaults = FormDefaults {
            user_address: source.get(KEY_USER_ADDRESS).unwrap_or(ZERO_ADDRESS).to_string(),
            market_id: source.get(KEY_MARKET_ID).unwrap_or("0").to_string(),
            price: source.get(KEY_PRICE).unwrap_or("1000").to_string(),
            size: source.get(KEY_SIZE).unwrap_or("0.001").to_string(),
        };

        // Only an explicit "false" turns dry-run off.
        let dry_run = source.get(KEY_DRY_RUN) != Some("false");

        Ok(Self {
            api_base_url,
            ws_url,
            signing_credential,
            defaults,
            dry_run,
        })
    }

    /// Always true; kept so callers can assert it at the transport boundary.
    pub fn is_testnet(&self) -> bool {
        true
    }

    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }

    pub fn ws_url(&self) -> Option<&str> {
        self.ws_url.as_deref()
    }

    /// REST root without a trailing `/info`.
    fn api_root(&self) -> &str {
        match self.api_base_url.as_deref() {
            Some(url) => {
                let url = url.trim_end_matches('/');
                url.strip_suffix("/info").unwrap_or(url)
            }
            None => DEFAULT_API_ROOT,
        }
    }

    pub fn info_url(&self) -> String {
        format!("{}/info", self.api_root())
    }

    pub fn exchange_url(&self) -> String {
        format!("{}/exchange", self.api_root())
    }

    pub fn ws_endpoint(&self) -> &str {
        self.ws_url.as_deref().unwrap_or(DEFAULT_WS_URL)
    }

    pub fn signing_credential(&self) -> Option<&SigningCredential> {
        self.signing_credential.as_ref()
    }

    pub fn has_signing_credential(&self) -> bool {
        self.signing_credential.is_some()
    }

    pub fn defaults(&self) -> &FormDefaults {
        &self.defaults
    }

    /// CLI dry-run setting (`DRY_RUN`, default on).
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Secret-free view for display.
    pub fn summary(&self) -> EnvironmentSummary {
        EnvironmentSummary {
            is_testnet: self.is_testnet(),
            info_url: self.info_url(),
            exchange_url: self.exchange_url(),
            ws_url: self.ws_endpoint().to_string(),
            has_signing_credential: self.has_signing_credential(),
            dry_run: self.dry_run,
            defaults: self.defaults.clone(),
        }
    }
}

/// Display-safe configuration summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSummary {
    pub is_testnet: bool,
    pub info_url: String,
    pub exchange_url: String,
    pub ws_url: String,
    pub has_signing_credential: bool,
    pub dry_run: bool,
    pub defaults: FormDefaults,
}

fn require_testnet(flag: Option<&str>) -> Result<(), ConfigError> {
    match flag {
        Some("true") => Ok(()),
        other => Err(ConfigError::NotTestnet {
            found: other.map(str::to_string),
        }),
    }
}

fn assert_url_is_testnet(name: &'static str, url: Option<&str>) -> Result<(), ConfigError> {
    match url {
        Some(url) if !url.to_ascii_lowercase().contains("testnet") => {
            Err(ConfigError::NonTestnetUrl {
                name,
                url: url.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Re-validating guard.
///
/// Each `check()` runs the full validation again instead of caching the
/// first result, so every action is gated on its own check. The source is
/// the snapshot captured at construction; later process env changes are not
/// seen.
#[derive(Debug, Clone)]
pub struct EnvironmentGuard {
    source: Arc<EnvSource>,
}

impl EnvironmentGuard {
    pub fn new(source: EnvSource) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn check(&self) -> Result<EnvironmentConfig, ConfigError> {
        EnvironmentConfig::load(&self.source)
    }
}
