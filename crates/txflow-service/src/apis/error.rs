//! API error type and its JSON representation.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use txflow_core::{EngineError, LifecycleError};

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug, Error)]
pub enum ApiError {
	/// Input that fails local validation (400)
	#[error("Bad Request: {message}")]
	BadRequest {
		error_type: &'static str,
		message: String,
	},
	/// Control used while unavailable in the current session state (409)
	#[error("Conflict: {message}")]
	Conflict {
		error_type: &'static str,
		message: String,
	},
	/// Business rule failure (422)
	#[error("Unprocessable Entity: {message}")]
	UnprocessableEntity {
		error_type: &'static str,
		message: String,
	},
	/// The chain could not be reached or rejected the request (502)
	#[error("Bad Gateway: {message}")]
	BadGateway {
		error_type: &'static str,
		message: String,
	},
	/// Feature not configured (503)
	#[error("Service Unavailable: {message}")]
	ServiceUnavailable {
		error_type: &'static str,
		message: String,
	},
	/// Internal server error (500)
	#[error("Internal Server Error: {message}")]
	InternalServerError {
		error_type: &'static str,
		message: String,
	},
}

impl ApiError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			ApiError::Conflict { .. } => StatusCode::CONFLICT,
			ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
			ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
			ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
			ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			ApiError::BadRequest {
				error_type,
				message,
			}
			| ApiError::Conflict {
				error_type,
				message,
			}
			| ApiError::UnprocessableEntity {
				error_type,
				message,
			}
			| ApiError::BadGateway {
				error_type,
				message,
			}
			| ApiError::ServiceUnavailable {
				error_type,
				message,
			}
			| ApiError::InternalServerError {
				error_type,
				message,
			} => (error_type, message),
		};
		ErrorResponse {
			error: error_type.to_string(),
			message: message.clone(),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status_code(), Json(self.to_error_response())).into_response()
	}
}

impl From<EngineError> for ApiError {
	fn from(err: EngineError) -> Self {
		match err {
			EngineError::Session(e) => ApiError::Conflict {
				error_type: "SESSION_CONFLICT",
				message: e.to_string(),
			},
			EngineError::Lifecycle(e) => e.into(),
			e @ EngineError::FaucetNotConfigured => ApiError::ServiceUnavailable {
				error_type: "FAUCET_NOT_CONFIGURED",
				message: e.to_string(),
			},
			EngineError::Task(message) => ApiError::InternalServerError {
				error_type: "INTERNAL_ERROR",
				message,
			},
		}
	}
}

impl From<LifecycleError> for ApiError {
	fn from(err: LifecycleError) -> Self {
		let message = err.user_message();
		match err {
			LifecycleError::InvalidRecipient(_) => ApiError::BadRequest {
				error_type: "INVALID_RECIPIENT",
				message,
			},
			LifecycleError::InvalidAmount(_) => ApiError::BadRequest {
				error_type: "INVALID_AMOUNT",
				message,
			},
			LifecycleError::InsufficientBalance { .. } => ApiError::UnprocessableEntity {
				error_type: "INSUFFICIENT_BALANCE",
				message,
			},
			LifecycleError::AccountMismatch { .. } => ApiError::UnprocessableEntity {
				error_type: "ACCOUNT_MISMATCH",
				message,
			},
			LifecycleError::FaucetDepleted { .. } => ApiError::UnprocessableEntity {
				error_type: "FAUCET_DEPLETED",
				message,
			},
			LifecycleError::WalletAlreadyFunded(_) => ApiError::UnprocessableEntity {
				error_type: "WALLET_ALREADY_FUNDED",
				message,
			},
			LifecycleError::Gateway(_) => ApiError::BadGateway {
				error_type: "GATEWAY_ERROR",
				message,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use txflow_core::SessionError;
	use txflow_gateway::GatewayError;

	#[test]
	fn test_status_mapping() {
		let cases: Vec<(EngineError, StatusCode, &str)> = vec![
			(
				LifecycleError::InvalidRecipient("0x12".into()).into(),
				StatusCode::BAD_REQUEST,
				"INVALID_RECIPIENT",
			),
			(
				LifecycleError::InvalidAmount("zero".into()).into(),
				StatusCode::BAD_REQUEST,
				"INVALID_AMOUNT",
			),
			(
				SessionError::NoWallet.into(),
				StatusCode::CONFLICT,
				"SESSION_CONFLICT",
			),
			(
				LifecycleError::InsufficientBalance {
					required: "1.0020".into(),
					available: "1.0000".into(),
				}
				.into(),
				StatusCode::UNPROCESSABLE_ENTITY,
				"INSUFFICIENT_BALANCE",
			),
			(
				LifecycleError::Gateway(GatewayError::Network("timeout".into())).into(),
				StatusCode::BAD_GATEWAY,
				"GATEWAY_ERROR",
			),
			(
				EngineError::FaucetNotConfigured,
				StatusCode::SERVICE_UNAVAILABLE,
				"FAUCET_NOT_CONFIGURED",
			),
		];

		for (err, status, error_type) in cases {
			let api: ApiError = err.into();
			assert_eq!(api.status_code(), status);
			assert_eq!(api.to_error_response().error, error_type);
		}
	}

	#[test]
	fn test_messages_are_user_facing() {
		let api: ApiError = LifecycleError::Gateway(GatewayError::Network(
			"insufficient funds for gas * price + value".into(),
		))
		.into();
		assert_eq!(
			api.to_error_response().message,
			"Insufficient funds for transaction. Please use the faucet to get test tokens."
		);
	}
}
