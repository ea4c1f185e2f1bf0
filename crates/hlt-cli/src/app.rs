//! CLI modes.

use std::process::ExitCode;
use std::sync::Arc;

use hlt_core::{
    EnvSource, EnvironmentConfig, EnvironmentGuard, ExchangeApi, InfoApi, Subscription,
};
use hlt_dashboard::{run_server, Clients, DashboardState};
use hlt_executor::{DryRunReason, ExchangeClient, Executor, OrderForm, OrderStatus};
use hlt_registry::InfoClient;
use hlt_ws::{AllMidsSubscriber, SubscriberConfig};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

pub const USAGE: &str = "usage: hl-testnet (info|order|subs|serve)";

const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Info,
    Order,
    Subs,
    Serve,
}

impl Mode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "info" => Some(Self::Info),
            "order" => Some(Self::Order),
            "subs" => Some(Self::Subs),
            "serve" => Some(Self::Serve),
            _ => None,
        }
    }
}

/// Positional argument, else `CMD`, else `info`.
pub fn select_mode(arg: Option<String>, cmd: Option<String>) -> String {
    arg.or(cmd).unwrap_or_else(|| "info".to_string())
}

fn pretty<T: Serialize>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub struct Application {
    config: AppConfig,
    guard: EnvironmentGuard,
    env: EnvironmentConfig,
}

impl Application {
    /// Runs the testnet guard; an error here must stop the process.
    pub fn new(config: AppConfig, source: EnvSource) -> AppResult<Self> {
        let guard = EnvironmentGuard::new(source);
        let env = guard.check()?;
        info!(
            info_url = %env.info_url(),
            ws_url = %env.ws_endpoint(),
            has_signing_credential = env.has_signing_credential(),
            dry_run = env.dry_run(),
            "Testnet environment verified"
        );
        Ok(Self { config, guard, env })
    }

    pub async fn run(&self, mode: Mode) -> AppResult<ExitCode> {
        debug!(?mode, "Running mode");
        match mode {
            Mode::Info => self.info().await,
            Mode::Order => self.order().await,
            Mode::Subs => self.subs().await,
            Mode::Serve => self.serve().await,
        }
    }

    fn info_client(&self) -> AppResult<Arc<dyn InfoApi>> {
        Ok(Arc::new(InfoClient::from_config(
            &self.env,
            self.config.http_timeout(),
        )?))
    }

    fn exchange_client(&self) -> AppResult<Option<Arc<dyn ExchangeApi>>> {
        let client = ExchangeClient::from_config(&self.env, self.config.http_timeout())?;
        Ok(client.map(|c| Arc::new(c) as Arc<dyn ExchangeApi>))
    }

    fn subscriber(&self) -> AllMidsSubscriber {
        AllMidsSubscriber::new(SubscriberConfig {
            url: self.env.ws_endpoint().to_string(),
            ping_interval: self.config.ping_interval(),
        })
    }

    async fn info(&self) -> AppResult<ExitCode> {
        let executor = Executor::new(self.guard.clone(), self.info_client()?);
        let address = &self.env.defaults().user_address;

        println!("Fetching open orders for: {address}");
        match executor.open_orders(address).await {
            Ok(orders) => {
                println!("{}", pretty(&orders)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Info query failed: {e}");
                Ok(ExitCode::FAILURE)
            }
        }
    }

    async fn order(&self) -> AppResult<ExitCode> {
        if !self.env.has_signing_credential() {
            println!("No WALLET_PRIVATE_KEY set, running in build-only mode (dry-run).");
        } else {
            println!("WALLET_PRIVATE_KEY provided. Ensure this is a testnet key.");
            if self.env.dry_run() {
                println!("DRY_RUN is enabled: the order will be built but not sent.");
            }
        }

        let mut executor = Executor::new(self.guard.clone(), self.info_client()?);
        if let Some(exchange) = self.exchange_client()? {
            executor = executor.with_exchange(exchange);
        }
        let form = OrderForm::from_defaults(self.env.defaults(), self.env.dry_run());

        let payload = match executor.prepare_order(&form).await {
            Ok(payload) => payload,
            Err(e) => {
                eprintln!("Order build failed: {e}");
                return Ok(ExitCode::FAILURE);
            }
        };
        println!("Prepared order payload:");
        println!("{}", pretty(&payload)?);

        if self.env.has_signing_credential() && !self.env.dry_run() {
            println!("Sending order to testnet...");
        }
        match executor.place_order(&form).await {
            Ok(outcome) => {
                match outcome.status {
                    OrderStatus::DryRun {
                        reason: DryRunReason::NoCredential,
                        ..
                    } => println!("Dry-run: no key provided, not signing/sending."),
                    OrderStatus::DryRun {
                        reason: DryRunReason::Toggle,
                        ..
                    } => println!(
                        "Dry-run mode enabled: constructed payload but not broadcasting. Set DRY_RUN=false to actually send."
                    ),
                    OrderStatus::Submitted { response } => {
                        println!("Order response:");
                        println!("{}", pretty(&response)?);
                    }
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Send failed: {e}");
                Ok(ExitCode::FAILURE)
            }
        }
    }

    /// Print allMids updates for the configured window, then unsubscribe.
    async fn subs(&self) -> AppResult<ExitCode> {
        println!("Subscribing to all market mid updates (testnet)...");
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let mut subscription = self.subscriber().subscribe(tx).await?;

        let window = tokio::time::sleep(self.config.window());
        tokio::pin!(window);
        let mut open = true;

        loop {
            tokio::select! {
                _ = &mut window => break,
                event = rx.recv(), if open => match event {
                    Some(data) => println!("Event: {}", pretty(&data)?),
                    None => {
                        warn!("Subscription ended before the window closed");
                        open = false;
                    }
                },
            }
        }

        println!("Unsubscribing and closing WS...");
        if let Err(e) = subscription.unsubscribe().await {
            debug!(error = %e, "Ignoring unsubscribe error");
        }
        Ok(ExitCode::SUCCESS)
    }

    async fn serve(&self) -> AppResult<ExitCode> {
        let clients = Clients {
            info: self.info_client()?,
            exchange: self.exchange_client()?,
            subscriptions: Arc::new(self.subscriber()),
        };
        let state =
            DashboardState::with_poll_interval(self.guard.clone(), clients, self.config.poll_interval());

        println!("Dashboard listening on http://{}", self.config.dashboard.addr());
        run_server(state, self.config.dashboard.clone(), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
            }
        })
        .await?;
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection_precedence() {
        assert_eq!(select_mode(Some("subs".into()), Some("order".into())), "subs");
        assert_eq!(select_mode(None, Some("order".into())), "order");
        assert_eq!(select_mode(None, None), "info");
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("info"), Some(Mode::Info));
        assert_eq!(Mode::parse("serve"), Some(Mode::Serve));
        assert_eq!(Mode::parse("INFO"), None);
        assert_eq!(Mode::parse("trade"), None);
    }

    #[test]
    fn test_guard_failure_stops_startup() {
        let result = Application::new(AppConfig::default(), EnvSource::default());
        let err = result.err().unwrap();
        assert!(err.to_string().contains("HL_IS_TESTNET"));
    }

    #[test]
    fn test_mainnet_url_rejected() {
        let source = EnvSource::from_pairs([
            ("HL_IS_TESTNET", "true"),
            ("HL_API_BASE_URL", "https://api.hyperliquid.xyz"),
        ]);
        assert!(Application::new(AppConfig::default(), source).is_err());
    }

    #[test]
    fn test_testnet_startup() {
        let source = EnvSource::from_pairs([("HL_IS_TESTNET", "true")]);
        assert!(Application::new(AppConfig::default(), source).is_ok());
    }
}
