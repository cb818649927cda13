//! Configuration module for the txflow lifecycle visualizer.
//!
//! This module provides the configuration structures read at startup. The
//! values here are immutable for the lifetime of the process: the lifecycle
//! controller and the faucet dispenser receive their section at construction
//! instead of reading ambient globals, so tests can substitute their own.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use txflow_types::{is_valid_address, is_valid_private_key, to_base_units, SecretKey};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// The network the visualizer talks to.
	pub network: NetworkConfig,
	/// Lifecycle pacing, fee estimate and polling budget.
	#[serde(default)]
	pub lifecycle: LifecycleConfig,
	/// Pre-funded account used to fund new wallets.
	pub faucet: Option<FaucetConfig>,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Network endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// Display name of the network.
	#[serde(default = "default_network_name")]
	pub name: String,
	/// JSON-RPC endpoint.
	pub rpc_url: String,
	/// Chain ID used for signing. Fetched from the endpoint when absent.
	pub chain_id: Option<u64>,
	/// Symbol of the native unit.
	#[serde(default = "default_symbol")]
	pub symbol: String,
	/// Block explorer base URL, used for links in the page.
	pub explorer_url: Option<String>,
}

fn default_network_name() -> String {
	"Conflux eSpace Testnet".to_string()
}

fn default_symbol() -> String {
	"CFX".to_string()
}

/// Settings of the transaction lifecycle controller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleConfig {
	/// Fee reserved on top of the amount in the client-side balance check.
	#[serde(default = "default_estimated_fee")]
	pub estimated_fee: Decimal,
	/// Gas limit of a plain transfer.
	#[serde(default = "default_gas_limit")]
	pub gas_limit: u64,
	/// Delay between receipt polls in milliseconds.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Number of receipt polls before assuming success.
	#[serde(default = "default_max_poll_attempts")]
	pub max_poll_attempts: u32,
	/// Pause between the created, signed and broadcasted emissions.
	#[serde(default = "default_stage_delay_ms")]
	pub stage_delay_ms: u64,
}

fn default_estimated_fee() -> Decimal {
	Decimal::new(2, 3) // 0.002
}

fn default_gas_limit() -> u64 {
	txflow_types::TRANSFER_GAS_LIMIT
}

fn default_poll_interval_ms() -> u64 {
	1000
}

fn default_max_poll_attempts() -> u32 {
	30
}

fn default_stage_delay_ms() -> u64 {
	500
}

impl Default for LifecycleConfig {
	fn default() -> Self {
		Self {
			estimated_fee: default_estimated_fee(),
			gas_limit: default_gas_limit(),
			poll_interval_ms: default_poll_interval_ms(),
			max_poll_attempts: default_max_poll_attempts(),
			stage_delay_ms: default_stage_delay_ms(),
		}
	}
}

impl LifecycleConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn stage_delay(&self) -> Duration {
		Duration::from_millis(self.stage_delay_ms)
	}
}

/// Faucet account configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FaucetConfig {
	/// Address of the funded account.
	pub address: String,
	/// Private key of the funded account.
	pub private_key: SecretKey,
	/// Amount disbursed per request, in native units.
	#[serde(default = "default_faucet_amount")]
	pub amount: String,
	/// Send even when the faucet balance looks too low. Operator override
	/// for networks where balance queries lag behind.
	#[serde(default)]
	pub bypass_balance_check: bool,
}

fn default_faucet_amount() -> String {
	"0.5".to_string()
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			host: default_api_host(),
			port: default_api_port(),
		}
	}
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables and
	/// `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration.
	///
	/// - The RPC URL must be an http(s) URL
	/// - Polling needs a non-zero interval and a budget between 1 and 600 attempts
	/// - The fee estimate cannot be negative and the gas limit covers a transfer
	/// - The faucet address and key must be well formed and its amount positive
	fn validate(&self) -> Result<(), ConfigError> {
		let rpc_url = self.network.rpc_url.trim();
		if rpc_url.is_empty() {
			return Err(ConfigError::Validation("RPC URL cannot be empty".into()));
		}
		if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
			return Err(ConfigError::Validation(format!(
				"RPC URL must use http or https: {}",
				rpc_url
			)));
		}

		let lifecycle = &self.lifecycle;
		if lifecycle.poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"poll_interval_ms must be greater than 0".into(),
			));
		}
		if lifecycle.max_poll_attempts == 0 {
			return Err(ConfigError::Validation(
				"max_poll_attempts must be at least 1".into(),
			));
		}
		if lifecycle.max_poll_attempts > 600 {
			return Err(ConfigError::Validation(
				"max_poll_attempts cannot exceed 600".into(),
			));
		}
		if lifecycle.estimated_fee.is_sign_negative() {
			return Err(ConfigError::Validation(
				"estimated_fee cannot be negative".into(),
			));
		}
		if lifecycle.gas_limit < txflow_types::TRANSFER_GAS_LIMIT {
			return Err(ConfigError::Validation(format!(
				"gas_limit must be at least {}",
				txflow_types::TRANSFER_GAS_LIMIT
			)));
		}

		if let Some(ref faucet) = self.faucet {
			if !is_valid_address(&faucet.address) {
				return Err(ConfigError::Validation(format!(
					"Faucet address is not a valid address: {}",
					faucet.address
				)));
			}
			if !faucet.private_key.with_exposed(is_valid_private_key) {
				return Err(ConfigError::Validation(
					"Faucet private key must be 0x followed by 64 hex characters".into(),
				));
			}
			match to_base_units(&faucet.amount) {
				Ok(value) if !value.is_zero() => {}
				_ => {
					return Err(ConfigError::Validation(format!(
						"Faucet amount must be a positive decimal: {}",
						faucet.amount
					)));
				}
			}
		}

		if let Some(ref api) = self.api {
			if api.enabled && api.port == 0 {
				return Err(ConfigError::Validation("API port cannot be 0".into()));
			}
		}

		Ok(())
	}

	/// Configuration pointing at a local endpoint with fast pacing, for tests.
	#[cfg(any(test, feature = "testing"))]
	pub fn for_tests() -> Self {
		Config {
			network: NetworkConfig {
				name: "Test Network".to_string(),
				rpc_url: "http://localhost:8545".to_string(),
				chain_id: Some(71),
				symbol: default_symbol(),
				explorer_url: None,
			},
			lifecycle: LifecycleConfig {
				stage_delay_ms: 0,
				..LifecycleConfig::default()
			},
			faucet: Some(FaucetConfig {
				address: "0xc3E894473BB51b5e5453042420A1d465E69cbCB9".to_string(),
				private_key: SecretKey::from(
					"0x5753e65f56865a161fbf41932a0d855139a4ce9dc20d82fb655bff393fc41702",
				),
				amount: default_faucet_amount(),
				bypass_balance_check: false,
			}),
			api: None,
		}
	}
}

/// Parses configuration from a TOML string. Environment variables are
/// resolved and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
