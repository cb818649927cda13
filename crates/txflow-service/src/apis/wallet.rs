//! Wallet, balance refresh and faucet endpoints.

use super::{explorer_link, ApiError};
use crate::server::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use txflow_types::Wallet;

/// Wallet as shown on the page.
///
/// The private key is revealed on purpose: the whole point of the page is to
/// show what a key pair looks like.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
	pub address: String,
	pub private_key: String,
	pub balance: String,
	pub symbol: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub explorer_url: Option<String>,
}

impl WalletView {
	pub fn new(wallet: &Wallet, state: &AppState) -> Self {
		let network = &state.engine.config().network;
		Self {
			address: wallet.address.clone(),
			private_key: wallet.private_key.reveal().to_string(),
			balance: wallet.balance.clone(),
			symbol: network.symbol.clone(),
			explorer_url: explorer_link(network.explorer_url.as_deref(), "address", &wallet.address),
		}
	}
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
	pub balance: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetResponse {
	pub hash: String,
	pub amount: String,
	/// False when the receipt was not observed within the polling budget.
	pub confirmed: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub balance: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub explorer_url: Option<String>,
}

/// Handles POST /api/wallet requests.
pub async fn create_wallet(State(state): State<AppState>) -> Result<Json<WalletView>, ApiError> {
	let wallet = state.engine.generate_wallet().await?;
	Ok(Json(WalletView::new(&wallet, &state)))
}

/// Handles POST /api/wallet/refresh requests.
pub async fn refresh_balance(
	State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
	let balance = state.engine.refresh_balance().await?;
	Ok(Json(BalanceResponse { balance }))
}

/// Handles POST /api/faucet requests.
pub async fn request_faucet(
	State(state): State<AppState>,
) -> Result<Json<FaucetResponse>, ApiError> {
	let receipt = state.engine.request_faucet().await?;
	let config = state.engine.config();
	Ok(Json(FaucetResponse {
		explorer_url: explorer_link(config.network.explorer_url.as_deref(), "tx", &receipt.hash),
		amount: config
			.faucet
			.as_ref()
			.map(|f| f.amount.clone())
			.unwrap_or_default(),
		confirmed: !receipt.confirmation.is_assumed(),
		balance: receipt.balance,
		hash: receipt.hash,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::apis::testing::app_state;
	use axum::http::StatusCode;
	use txflow_gateway::implementations::mock::{MockCall, MockGateway};

	#[tokio::test]
	async fn test_create_wallet_reveals_key() {
		let (state, _mock) = app_state(MockGateway::new());

		let Json(view) = create_wallet(State(state.clone())).await.unwrap();

		assert!(txflow_types::is_valid_address(&view.address));
		assert!(txflow_types::is_valid_private_key(&view.private_key));
		assert_eq!(view.balance, "0.0000");
		assert_eq!(view.symbol, "CFX");
		let body = serde_json::to_value(&view).unwrap();
		assert_eq!(body["privateKey"], view.private_key.as_str());
	}

	#[tokio::test]
	async fn test_faucet_then_refresh() {
		let (state, mock) = app_state(MockGateway::new());
		create_wallet(State(state.clone())).await.unwrap();

		let Json(faucet) = request_faucet(State(state.clone())).await.unwrap();
		assert!(faucet.confirmed);
		assert_eq!(faucet.amount, "0.5");
		assert_eq!(faucet.balance.as_deref(), Some("0.5000"));

		// Funded wallets no longer see the faucet
		let err = request_faucet(State(state.clone())).await.unwrap_err();
		assert_eq!(err.status_code(), StatusCode::CONFLICT);

		let Json(balance) = refresh_balance(State(state.clone())).await.unwrap();
		assert_eq!(balance.balance, "0.5000");

		mock.fail_on(MockCall::Balance, "rpc down").await;
		let err = refresh_balance(State(state)).await.unwrap_err();
		assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
	}

	#[tokio::test]
	async fn test_refresh_without_wallet() {
		let (state, _mock) = app_state(MockGateway::new());
		let err = refresh_balance(State(state)).await.unwrap_err();
		assert_eq!(err.status_code(), StatusCode::CONFLICT);
	}
}
