//! Dashboard state.
//!
//! Every panel gets its own `Executor` and therefore its own market resolver
//! cache. The SDK clients behind them are shared.

use std::sync::Arc;
use std::time::Duration;

use hlt_core::{EnvironmentGuard, ExchangeApi, InfoApi, SubscriptionApi};
use hlt_executor::{Executor, LiveSession, DEFAULT_POLL_INTERVAL};

/// SDK clients the dashboard is built from.
#[derive(Clone)]
pub struct Clients {
    pub info: Arc<dyn InfoApi>,
    pub exchange: Option<Arc<dyn ExchangeApi>>,
    pub subscriptions: Arc<dyn SubscriptionApi>,
}

#[derive(Clone)]
pub struct DashboardState {
    guard: EnvironmentGuard,
    open_orders: Arc<Executor>,
    positions: Arc<Executor>,
    orderbook: Arc<Executor>,
    order: Arc<Executor>,
    live: Arc<LiveSession>,
}

impl DashboardState {
    pub fn new(guard: EnvironmentGuard, clients: Clients) -> Self {
        Self::with_poll_interval(guard, clients, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        guard: EnvironmentGuard,
        clients: Clients,
        poll_interval: Duration,
    ) -> Self {
        let panel = || Arc::new(Executor::new(guard.clone(), Arc::clone(&clients.info)));

        let mut order = Executor::new(guard.clone(), Arc::clone(&clients.info));
        if let Some(exchange) = &clients.exchange {
            order = order.with_exchange(Arc::clone(exchange));
        }

        let live = LiveSession::new(
            guard.clone(),
            Arc::clone(&clients.info),
            Arc::clone(&clients.subscriptions),
        )
        .with_poll_interval(poll_interval);

        Self {
            open_orders: panel(),
            positions: panel(),
            orderbook: panel(),
            order: Arc::new(order),
            live: Arc::new(live),
            guard,
        }
    }

    pub fn guard(&self) -> &EnvironmentGuard {
        &self.guard
    }

    pub fn open_orders(&self) -> &Executor {
        &self.open_orders
    }

    pub fn positions(&self) -> &Executor {
        &self.positions
    }

    pub fn orderbook(&self) -> &Executor {
        &self.orderbook
    }

    pub fn order(&self) -> &Executor {
        &self.order
    }

    pub fn live(&self) -> &LiveSession {
        &self.live
    }
}
