//! Transfer and live overlay endpoints.

use super::ApiError;
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use txflow_presentation::LiveData;
use txflow_types::{truncate_id, Stage};

/// Body of POST /api/transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
	pub recipient: String,
	/// Amount in native units, as typed.
	pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
	pub accepted: bool,
	pub stage: Stage,
}

/// Handles POST /api/transactions requests.
///
/// Returns once the transfer is validated and started; progress is read
/// through GET /api/state.
pub async fn send_transaction(
	State(state): State<AppState>,
	Json(request): Json<SendRequest>,
) -> Result<(StatusCode, Json<SendResponse>), ApiError> {
	match state
		.engine
		.send(&request.recipient, &request.amount)
		.await
	{
		Ok(_run) => {
			state.clear_live().await;
			let stage = state.engine.session().await.stage();
			Ok((
				StatusCode::ACCEPTED,
				Json(SendResponse {
					accepted: true,
					stage,
				}),
			))
		}
		Err(e) => {
			tracing::warn!("Transfer request rejected: {}", e);
			Err(e.into())
		}
	}
}

/// Handles GET /api/live requests.
///
/// Refreshes the live overlay for the current transaction. Returns `null`
/// while there is nothing to look up.
pub async fn get_live(State(state): State<AppState>) -> Json<Option<LiveData>> {
	let session = state.engine.session().await;
	let hash = match session.data().hash.as_deref() {
		Some(hash) if session.stage() != Stage::Idle => hash.to_string(),
		_ => return Json(None),
	};

	let previous = state.cached_live(Some(&hash)).await.unwrap_or_default();
	let live = state.live.refresh(&hash, &previous).await;
	tracing::debug!(
		tx_hash = %truncate_id(&hash),
		confirmations = ?live.confirmations(),
		"Live data refreshed"
	);
	state.store_live(hash, live.clone()).await;
	Json(Some(live))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::apis::testing::app_state;
	use crate::apis::wallet::{create_wallet, request_faucet};
	use txflow_gateway::implementations::mock::{MockCall, MockGateway};

	const RECIPIENT: &str = "0xb7fcfe251ca336841d019a731fed59658d150909";

	fn send_request(amount: &str) -> Json<SendRequest> {
		Json(SendRequest {
			recipient: RECIPIENT.into(),
			amount: amount.into(),
		})
	}

	#[tokio::test]
	async fn test_send_requires_wallet() {
		let (state, _mock) = app_state(MockGateway::new());
		let err = send_transaction(State(state), send_request("0.1"))
			.await
			.unwrap_err();
		assert_eq!(err.status_code(), StatusCode::CONFLICT);
	}

	#[tokio::test]
	async fn test_send_rejects_overdraft_without_network() {
		let (state, mock) = app_state(MockGateway::new());
		create_wallet(State(state.clone())).await.unwrap();
		request_faucet(State(state.clone())).await.unwrap();
		let sends = mock.calls(MockCall::Send).await;

		let err = send_transaction(State(state.clone()), send_request("0.5"))
			.await
			.unwrap_err();

		assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(err.to_error_response().error, "INSUFFICIENT_BALANCE");
		assert_eq!(mock.calls(MockCall::Send).await, sends);
	}

	#[tokio::test]
	async fn test_send_and_live_overlay() {
		let (state, _mock) = app_state(MockGateway::new());
		create_wallet(State(state.clone())).await.unwrap();
		request_faucet(State(state.clone())).await.unwrap();

		assert!(get_live(State(state.clone())).await.0.is_none());

		let (status, Json(response)) = send_transaction(State(state.clone()), send_request("0.1"))
			.await
			.unwrap();
		assert_eq!(status, StatusCode::ACCEPTED);
		assert!(response.accepted);

		let err = send_transaction(State(state.clone()), send_request("0.1"))
			.await
			.unwrap_err();
		assert_eq!(err.status_code(), StatusCode::CONFLICT);

		state.wait_for_idle_run().await;
		let Json(live) = get_live(State(state.clone())).await;
		let live = live.unwrap();
		assert!(live.error.is_none());
		assert!(live.receipt.is_some());
		assert!(live.confirmations().is_some());

		let hash = state.engine.session().await.data().hash.clone();
		assert_eq!(state.cached_live(hash.as_deref()).await, Some(live));
	}
}
