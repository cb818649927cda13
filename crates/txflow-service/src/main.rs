//! Main entry point for the txflow service.
//!
//! Serves the transaction lifecycle visualizer API: one session wallet, an
//! optional faucet and a step-by-step view of each transfer as it moves from
//! creation to confirmation.

use alloy_primitives::U256;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use txflow_config::{ApiConfig, Config};
use txflow_core::TxflowEngine;
use txflow_gateway::implementations::evm::alloy::AlloyGateway;
use txflow_gateway::implementations::mock::MockGateway;
use txflow_gateway::GatewayInterface;

mod apis;
mod server;

/// Faucet float of the offline chain, in base units (1000 native units).
const OFFLINE_FAUCET_FLOAT: u128 = 1_000_000_000_000_000_000_000;

/// Command-line arguments for the txflow service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Run against an in-memory chain instead of the configured RPC endpoint
	#[arg(long)]
	offline: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started txflow");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!(
		"Loaded configuration [{} via {}]",
		config.network.name,
		config.network.rpc_url
	);

	let api_config = match config.api.clone() {
		Some(api) if !api.enabled => {
			tracing::info!("API server disabled in configuration, nothing to serve");
			return Ok(());
		}
		Some(api) => api,
		None => ApiConfig::default(),
	};

	let gateway = build_gateway(&config, args.offline)?;
	let engine = TxflowEngine::new(config, gateway);

	server::start_server(api_config, engine).await?;

	tracing::info!("Stopped txflow");
	Ok(())
}

/// Picks the chain gateway: the configured RPC endpoint, or an in-memory
/// chain with a funded faucet when running offline.
fn build_gateway(
	config: &Config,
	offline: bool,
) -> Result<Arc<dyn GatewayInterface>, Box<dyn std::error::Error>> {
	if !offline {
		return Ok(Arc::new(AlloyGateway::new(&config.network)?));
	}

	tracing::warn!("Running offline against an in-memory chain");
	let mut mock = MockGateway::new();
	if let Some(faucet) = &config.faucet {
		mock = mock.with_balance(faucet.address.parse()?, U256::from(OFFLINE_FAUCET_FLOAT));
	}
	Ok(Arc::new(mock))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;
	use txflow_gateway::GatewayService;

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["txflow"]);

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(!args.offline);
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from([
			"txflow",
			"--config",
			"custom.toml",
			"--log-level",
			"debug",
			"--offline",
		]);

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
		assert!(args.offline);
	}

	#[tokio::test]
	async fn test_offline_gateway_funds_faucet() {
		let config = Config::for_tests();
		let gateway = GatewayService::new(build_gateway(&config, true).unwrap());

		let faucet = config.faucet.as_ref().unwrap();
		let balance = gateway.get_balance(&faucet.address).await.unwrap();
		assert_eq!(balance, U256::from(OFFLINE_FAUCET_FLOAT));
	}

	#[tokio::test]
	async fn test_online_gateway_uses_rpc_url() {
		let mut config = Config::for_tests();
		assert!(build_gateway(&config, false).is_ok());

		config.network.rpc_url = "not a url".to_string();
		assert!(build_gateway(&config, false).is_err());
	}

	#[tokio::test]
	async fn test_load_config_file() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("txflow.toml");

		let config_content = r#"
[network]
rpc_url = "http://localhost:8545"
chain_id = 71

[lifecycle]
stage_delay_ms = 0

[api]
enabled = true
port = 3100
"#;
		std::fs::write(&config_path, config_content).expect("Failed to write config");

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.expect("Failed to load config");

		assert_eq!(config.network.symbol, "CFX");
		assert_eq!(config.lifecycle.max_poll_attempts, 30);
		assert!(config.faucet.is_none());
		assert_eq!(config.api.unwrap().port, 3100);
	}
}
