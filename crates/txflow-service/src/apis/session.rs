//! Page state, reset and error banner endpoints.

use super::{explorer_link, wallet::WalletView, ApiError};
use crate::server::AppState;
use axum::{
	extract::{Query, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use txflow_presentation::{raw_json, DisplayMode, PanelView};
use txflow_types::Stage;

/// Query parameters for GET /api/state.
#[derive(Debug, Default, Deserialize)]
pub struct StateQuery {
	#[serde(default)]
	pub mode: DisplayMode,
	/// Raw JSON view, honoured in technical mode only.
	#[serde(default)]
	pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkView {
	pub name: String,
	pub symbol: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<u64>,
}

/// Which controls the page should enable.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsView {
	pub can_send: bool,
	pub can_reset: bool,
	pub can_refresh: bool,
	pub faucet_visible: bool,
	pub faucet_pending: bool,
	pub running: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetLink {
	pub hash: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub explorer_url: Option<String>,
}

/// Everything the page shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
	pub network: NetworkView,
	pub stage: Stage,
	pub panel: PanelView,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub raw_json: Option<Value>,
	pub wallet: Option<WalletView>,
	pub controls: ControlsView,
	pub error_banner: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_faucet: Option<FaucetLink>,
}

#[derive(Debug, Serialize)]
pub struct StageResponse {
	pub stage: Stage,
}

/// Handles GET /api/state requests.
pub async fn get_state(
	State(state): State<AppState>,
	Query(query): Query<StateQuery>,
) -> Result<Json<StateResponse>, ApiError> {
	let session = state.engine.session().await;
	let config = state.engine.config();
	let data = session.data();

	let live = state.cached_live(data.hash.as_deref()).await;
	let panel = state
		.presenter
		.render(session.stage(), data, query.mode, live.as_ref());

	let raw_json = if query.json && query.mode == DisplayMode::Technical {
		Some(raw_json(data).map_err(|e| ApiError::InternalServerError {
			error_type: "SERIALIZATION_ERROR",
			message: e.to_string(),
		})?)
	} else {
		None
	};

	Ok(Json(StateResponse {
		network: NetworkView {
			name: config.network.name.clone(),
			symbol: config.network.symbol.clone(),
			chain_id: config.network.chain_id,
		},
		stage: session.stage(),
		panel,
		raw_json,
		wallet: session.wallet().map(|w| WalletView::new(w, &state)),
		controls: ControlsView {
			can_send: session.can_send(),
			can_reset: session.can_reset(),
			can_refresh: session.can_refresh(),
			faucet_visible: state.engine.faucet_enabled() && session.faucet_visible(),
			faucet_pending: session.is_faucet_pending(),
			running: session.is_run_active(),
		},
		error_banner: session.error_banner().map(str::to_string),
		last_faucet: session.last_faucet_hash().map(|hash| FaucetLink {
			hash: hash.to_string(),
			explorer_url: explorer_link(config.network.explorer_url.as_deref(), "tx", hash),
		}),
	}))
}

/// Handles POST /api/reset requests.
pub async fn reset(State(state): State<AppState>) -> Result<Json<StageResponse>, ApiError> {
	state.engine.reset().await?;
	state.clear_live().await;
	Ok(Json(StageResponse { stage: Stage::Idle }))
}

/// Handles DELETE /api/error requests.
pub async fn dismiss_error(State(state): State<AppState>) -> StatusCode {
	state.engine.dismiss_error().await;
	StatusCode::NO_CONTENT
}
