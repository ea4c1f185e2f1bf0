//! Market id resolution.
//!
//! Users enter a small numeric market id (the index into the perp universe).
//! The resolver turns it into a `-PERP` symbol using the `meta` document.
//!
//! Two paths exist:
//! - [`MarketResolver::resolve_symbol`] builds the full directory once and
//!   answers every later request from it.
//! - [`MarketResolver::lookup_symbol`] fetches and resolves a single id,
//!   leaving the directory untouched.
//!
//! Failures never propagate: they are logged and reported as `None`.

use hlt_core::{InfoApi, Symbol};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Instrument list field names, in lookup order.
const UNIVERSE_FIELDS: [&str; 2] = ["universe", "perpMeta"];

/// Market id (stringified universe index) -> symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketDirectory {
    entries: HashMap<String, Symbol>,
}

impl MarketDirectory {
    /// Build from a `meta` document. `None` if it has no instrument list.
    pub fn from_meta(meta: &Value) -> Option<Self> {
        let universe = universe(meta)?;
        let entries = universe
            .iter()
            .enumerate()
            .map(|(idx, instrument)| {
                let name = first_name(instrument, &["name", "symbol", "coin"])
                    .unwrap_or_else(|| idx.to_string());
                (idx.to_string(), Symbol::perp(name))
            })
            .collect();
        Some(Self { entries })
    }

    pub fn get(&self, market_id: &str) -> Option<&Symbol> {
        self.entries.get(market_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// First non-empty instrument array.
fn universe(meta: &Value) -> Option<&Vec<Value>> {
    UNIVERSE_FIELDS
        .iter()
        .filter_map(|field| meta.get(field).and_then(Value::as_array))
        .find(|list| !list.is_empty())
}

/// First present, non-empty name field, stringified.
fn first_name(instrument: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match instrument.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Resolver owned by one panel or executor.
pub struct MarketResolver {
    info: Arc<dyn InfoApi>,
    directory: RwLock<Option<MarketDirectory>>,
}

impl MarketResolver {
    pub fn new(info: Arc<dyn InfoApi>) -> Self {
        Self {
            info,
            directory: RwLock::new(None),
        }
    }

    /// Whether the directory has been built.
    pub fn is_cached(&self) -> bool {
        self.directory.read().is_some()
    }

    /// Resolve through the cached directory, building it on first use.
    ///
    /// Only a directory hit skips the network. A miss fetches meta once and
    /// resolves from that document. The lock is not held across the fetch, so
    /// concurrent misses each fetch and the first completed build is kept.
    /// Once built, the directory is never rebuilt.
    pub async fn resolve_symbol(&self, market_id: &str) -> Option<Symbol> {
        let cached = self
            .directory
            .read()
            .as_ref()
            .and_then(|directory| directory.get(market_id).cloned());
        if let Some(symbol) = cached {
            debug!(market_id, "Market directory hit");
            return Some(symbol);
        }

        let meta = self.fetch_meta().await?;
        let Some(directory) = MarketDirectory::from_meta(&meta) else {
            error!("meta response has no instrument list");
            return None;
        };

        let symbol = directory.get(market_id).cloned();
        debug!(market_id, found = symbol.is_some(), "Resolved from fresh meta");

        let mut slot = self.directory.write();
        if slot.is_none() {
            info!(markets = directory.len(), "Built market directory");
            *slot = Some(directory);
        }
        symbol
    }

    /// Resolve a single id without reading or writing the directory.
    pub async fn lookup_symbol(&self, market_id: &str) -> Option<Symbol> {
        let index: usize = market_id.trim().parse().ok()?;
        let meta = self.fetch_meta().await?;
        let instrument = universe(&meta)?.get(index)?;
        first_name(instrument, &["name", "symbol"]).map(Symbol::perp)
    }

    async fn fetch_meta(&self) -> Option<Value> {
        match self.info.meta().await {
            Ok(meta) => Some(meta),
            Err(e) => {
                error!(error = %e, "Failed to load market meta");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hlt_core::{SdkError, SdkResult};
    use mockall::{mock, Sequence};
    use serde_json::json;

    mock! {
        pub Info {}

        #[async_trait]
        impl InfoApi for Info {
            async fn meta(&self) -> SdkResult<Value>;
            async fn open_orders(&self, user: &str) -> SdkResult<Value>;
            async fn l2_book(&self, symbol: &Symbol) -> SdkResult<Value>;
            async fn all_mids(&self) -> SdkResult<Value>;
        }
    }

    fn sample_meta() -> Value {
        json!({
            "universe": [
                {"name": "BTC", "szDecimals": 5},
                {"name": "ETH-PERP"},
                {"symbol": "SOL"},
                {"coin": "HYPE"},
                {}
            ]
        })
    }

    fn resolver_with_meta(times: usize, meta: Value) -> MarketResolver {
        let mut info = MockInfo::new();
        info.expect_meta()
            .times(times)
            .returning(move || Ok(meta.clone()));
        MarketResolver::new(Arc::new(info))
    }

    #[test]
    fn test_directory_from_meta() {
        let directory = MarketDirectory::from_meta(&sample_meta()).unwrap();
        assert_eq!(directory.len(), 5);
        assert_eq!(directory.get("0").unwrap().as_str(), "BTC-PERP");
        assert_eq!(directory.get("1").unwrap().as_str(), "ETH-PERP");
        assert_eq!(directory.get("2").unwrap().as_str(), "SOL-PERP");
        assert_eq!(directory.get("3").unwrap().as_str(), "HYPE-PERP");
        assert_eq!(directory.get("4").unwrap().as_str(), "4-PERP");
    }

    #[test]
    fn test_directory_falls_back_to_perp_meta() {
        let meta = json!({"universe": [], "perpMeta": [{"name": "DOGE"}]});
        let directory = MarketDirectory::from_meta(&meta).unwrap();
        assert_eq!(directory.get("0").unwrap().as_str(), "DOGE-PERP");
    }

    #[test]
    fn test_directory_requires_instruments() {
        assert!(MarketDirectory::from_meta(&json!({})).is_none());
        assert!(MarketDirectory::from_meta(&json!({"universe": []})).is_none());
        assert!(MarketDirectory::from_meta(&json!({"universe": "BTC"})).is_none());
    }

    #[tokio::test]
    async fn test_cached_ids_skip_network() {
        let resolver = resolver_with_meta(1, sample_meta());

        assert_eq!(resolver.resolve_symbol("0").await.unwrap().as_str(), "BTC-PERP");
        assert!(resolver.is_cached());
        // Served from the directory; a second meta call would fail the mock.
        assert_eq!(resolver.resolve_symbol("2").await.unwrap().as_str(), "SOL-PERP");
        assert_eq!(resolver.resolve_symbol("0").await.unwrap().as_str(), "BTC-PERP");
    }

    #[tokio::test]
    async fn test_unknown_id_in_built_directory_fetches_once() {
        let mut seq = Sequence::new();
        let mut info = MockInfo::new();
        info.expect_meta()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(sample_meta()));
        info.expect_meta()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(SdkError::Http("connection reset".to_string())));
        let resolver = MarketResolver::new(Arc::new(info));

        assert_eq!(resolver.resolve_symbol("0").await.unwrap().as_str(), "BTC-PERP");
        assert!(resolver.resolve_symbol("99").await.is_none());
        // The directory built by the first call survives the failed fetch.
        assert!(resolver.is_cached());
        assert_eq!(resolver.resolve_symbol("1").await.unwrap().as_str(), "ETH-PERP");
    }

    #[tokio::test]
    async fn test_miss_resolves_from_fresh_meta() {
        let mut seq = Sequence::new();
        let mut info = MockInfo::new();
        info.expect_meta()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(json!({"universe": [{"name": "BTC"}]})));
        info.expect_meta()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(json!({"universe": [{"name": "BTC"}, {"name": "ARB"}]})));
        let resolver = MarketResolver::new(Arc::new(info));

        assert_eq!(resolver.resolve_symbol("0").await.unwrap().as_str(), "BTC-PERP");
        assert_eq!(resolver.resolve_symbol("1").await.unwrap().as_str(), "ARB-PERP");
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_none_once() {
        let mut info = MockInfo::new();
        info.expect_meta()
            .times(1)
            .returning(|| Err(SdkError::Http("connection refused".to_string())));
        let resolver = MarketResolver::new(Arc::new(info));

        assert!(resolver.resolve_symbol("0").await.is_none());
        assert!(!resolver.is_cached());
    }

    #[tokio::test]
    async fn test_empty_meta_not_cached() {
        let resolver = resolver_with_meta(2, json!({"universe": []}));
        assert!(resolver.resolve_symbol("0").await.is_none());
        assert!(resolver.resolve_symbol("0").await.is_none());
        assert!(!resolver.is_cached());
    }

    #[tokio::test]
    async fn test_lookup_leaves_directory_alone() {
        let resolver = resolver_with_meta(2, sample_meta());

        assert_eq!(resolver.lookup_symbol("0").await.unwrap().as_str(), "BTC-PERP");
        assert_eq!(resolver.lookup_symbol("2").await.unwrap().as_str(), "SOL-PERP");
        assert!(!resolver.is_cached());
    }

    #[tokio::test]
    async fn test_lookup_only_reads_name_and_symbol() {
        let resolver = resolver_with_meta(2, sample_meta());
        // "coin" is not consulted on this path.
        assert!(resolver.lookup_symbol("3").await.is_none());
        assert!(resolver.lookup_symbol("17").await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_rejects_non_numeric_without_fetch() {
        let resolver = resolver_with_meta(0, sample_meta());
        assert!(resolver.lookup_symbol("btc").await.is_none());
    }
}
