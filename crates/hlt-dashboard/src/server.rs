//! HTTP server implementation using axum.

use std::future::Future;

use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use hlt_executor::{ActionResult, OrderForm};
use hlt_telemetry::Metrics;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::state::DashboardState;
use crate::types::{
    AddressRequest, ApiResponse, EventsQuery, LiveEventsView, MarketRequest, SnapshotView,
};

/// Create the axum router.
pub fn create_router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/environment", get(get_environment))
        .route("/api/info/open-orders", post(post_open_orders))
        .route("/api/positions", post(post_positions))
        .route("/api/orderbook", post(post_orderbook))
        .route("/api/order", post(post_order))
        .route("/api/live/connect", post(post_live_connect))
        .route("/api/live/disconnect", post(post_live_disconnect))
        .route("/api/live/clear", post(post_live_clear))
        .route("/api/live/events", get(get_live_events))
        .route("/api/live/polling/start", post(post_polling_start))
        .route("/api/live/polling/stop", post(post_polling_stop))
        .route("/api/live/snapshot", get(get_live_snapshot))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn respond<T: Serialize>(result: ActionResult<T>) -> Json<ApiResponse> {
    Json(match result {
        Ok(value) => ApiResponse::success(&value),
        Err(e) => ApiResponse::failure(e.to_string()),
    })
}

/// Guard result. Only credential presence is reported, never the key.
async fn get_environment(State(state): State<DashboardState>) -> Json<ApiResponse> {
    Json(match state.guard().check() {
        Ok(config) => ApiResponse::success(&config.summary()),
        Err(e) => ApiResponse::failure(e.to_string()),
    })
}

async fn post_open_orders(
    State(state): State<DashboardState>,
    Json(req): Json<AddressRequest>,
) -> Json<ApiResponse> {
    respond(state.open_orders().open_orders(&req.address).await)
}

async fn post_positions(
    State(state): State<DashboardState>,
    Json(req): Json<AddressRequest>,
) -> Json<ApiResponse> {
    respond(state.positions().positions(&req.address).await)
}

async fn post_orderbook(
    State(state): State<DashboardState>,
    Json(req): Json<MarketRequest>,
) -> Json<ApiResponse> {
    respond(state.orderbook().orderbook(&req.market_id).await)
}

async fn post_order(
    State(state): State<DashboardState>,
    Json(form): Json<OrderForm>,
) -> Json<ApiResponse> {
    respond(state.order().place_order(&form).await)
}

async fn post_live_connect(State(state): State<DashboardState>) -> Json<ApiResponse> {
    let result = state.live().connect().await;
    respond(match result {
        Ok(()) => Ok(state.live().status().await),
        Err(e) => Err(e),
    })
}

async fn post_live_disconnect(State(state): State<DashboardState>) -> Json<ApiResponse> {
    let result = state.live().disconnect().await;
    respond(match result {
        Ok(()) => Ok(state.live().status().await),
        Err(e) => Err(e),
    })
}

async fn post_live_clear(State(state): State<DashboardState>) -> Json<ApiResponse> {
    state.live().clear_events();
    Json(ApiResponse::success(&state.live().status().await))
}

async fn get_live_events(
    State(state): State<DashboardState>,
    Query(query): Query<EventsQuery>,
) -> Json<ApiResponse> {
    let view = LiveEventsView {
        page: state.live().events_page(query.page),
        status: state.live().status().await,
    };
    Json(ApiResponse::success(&view))
}

async fn post_polling_start(State(state): State<DashboardState>) -> Json<ApiResponse> {
    let result = state.live().start_polling().await;
    respond(result.map(|()| snapshot_view(&state)))
}

async fn post_polling_stop(State(state): State<DashboardState>) -> Json<ApiResponse> {
    state.live().stop_polling();
    Json(ApiResponse::success(&snapshot_view(&state)))
}

async fn get_live_snapshot(State(state): State<DashboardState>) -> Json<ApiResponse> {
    Json(ApiResponse::success(&snapshot_view(&state)))
}

fn snapshot_view(state: &DashboardState) -> SnapshotView {
    SnapshotView {
        snapshot: state.live().snapshot(),
        polling: state.live().is_polling(),
        last_error: state.live().last_error(),
    }
}

async fn get_metrics() -> Response {
    match Metrics::gather_text() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Run the dashboard until `shutdown` resolves, then tear down the live session.
pub async fn run_server<F>(
    state: DashboardState,
    config: DashboardConfig,
    shutdown: F,
) -> DashboardResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| DashboardError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(addr = %addr, "Starting dashboard server");

    let app = create_router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Dashboard server stopped");
    state.live().shutdown().await;
    Ok(())
}
