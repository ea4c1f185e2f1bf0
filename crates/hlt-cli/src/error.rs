//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Environment(#[from] hlt_core::ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] hlt_registry::RegistryError),

    #[error("Executor error: {0}")]
    Executor(#[from] hlt_executor::ExecutorError),

    #[error(transparent)]
    Action(#[from] hlt_executor::ActionError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] hlt_ws::WsError),

    #[error("Dashboard error: {0}")]
    Dashboard(#[from] hlt_dashboard::DashboardError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] hlt_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
