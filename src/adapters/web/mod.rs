//! Web server adapter.
//!
//! Axum server with an HTMX-enhanced form for configuring a pool backtest
//! and viewing its report in the browser.

mod error;
mod handlers;
mod templates;

pub use error::{WebError, status_from_error};
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::adapters::chart_svg::Visualizer;
use crate::domain::catalog::Catalog;
use crate::domain::settings::AppSettings;
use crate::ports::engine_port::BacktestEngine;

/// Read-only state shared by every request.
pub struct AppState {
    pub catalog: Catalog,
    pub settings: AppSettings,
    pub visualizer: Visualizer,
    pub engine: Arc<dyn BacktestEngine + Send + Sync>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::backtest_form))
        .route("/backtest", get(handlers::backtest_form))
        .route("/backtest/params", get(handlers::strategy_params))
        .route("/backtest/run", post(handlers::run_backtest))
        .route("/backtest/download", post(handlers::download_summary))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
