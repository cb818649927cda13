//! HTTP server for the txflow page API.
//!
//! Every page control maps to one endpoint under `/api`. The session lives in
//! the engine; this module only holds the presenter and the cached live
//! overlay next to it.

use crate::apis::{session, transaction, wallet};
use axum::{
	routing::{delete, get, post},
	Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use txflow_config::ApiConfig;
use txflow_core::TxflowEngine;
use txflow_presentation::{LiveData, LiveDataFetcher, Presenter};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Engine owning the session.
	pub engine: TxflowEngine,
	/// Renders the data panel.
	pub presenter: Presenter,
	/// Fetches the live overlay.
	pub live: LiveDataFetcher,
	/// Last overlay, keyed by transaction hash.
	live_cache: Arc<RwLock<Option<(String, LiveData)>>>,
}

impl AppState {
	pub fn new(engine: TxflowEngine) -> Self {
		let presenter =
			Presenter::new(engine.config().network.symbol.clone()).with_live_overlay(true);
		let live = LiveDataFetcher::new(engine.gateway().clone());
		Self {
			engine,
			presenter,
			live,
			live_cache: Arc::new(RwLock::new(None)),
		}
	}

	/// Cached overlay for `hash`, if the cache holds that transaction.
	pub async fn cached_live(&self, hash: Option<&str>) -> Option<LiveData> {
		let hash = hash?;
		self.live_cache
			.read()
			.await
			.as_ref()
			.filter(|(cached, _)| cached == hash)
			.map(|(_, data)| data.clone())
	}

	pub async fn store_live(&self, hash: String, data: LiveData) {
		*self.live_cache.write().await = Some((hash, data));
	}

	pub async fn clear_live(&self) {
		*self.live_cache.write().await = None;
	}

	#[cfg(test)]
	pub async fn wait_for_idle_run(&self) {
		while self.engine.session().await.is_run_active() {
			tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		}
	}
}

/// Builds the router with all page endpoints.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.nest(
			"/api",
			Router::new()
				.route("/state", get(session::get_state))
				.route("/reset", post(session::reset))
				.route("/error", delete(session::dismiss_error))
				.route("/wallet", post(wallet::create_wallet))
				.route("/wallet/refresh", post(wallet::refresh_balance))
				.route("/faucet", post(wallet::request_faucet))
				.route("/transactions", post(transaction::send_transaction))
				.route("/live", get(transaction::get_live)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	engine: TxflowEngine,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(AppState::new(engine));

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("txflow API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}
