use allocator_config::{AllocatorConfig, ConfigLoader, StorageBackend};
use allocator_core::{AllocationRunner, ThreadRngSelector};
use allocator_storage::{FileStore, MemoryStore, PaymentStore};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod scheduler;

#[derive(Parser)]
#[command(name = "mint-allocator")]
#[command(about = "Token mint slot allocator", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/allocator.toml")]
	config: PathBuf,

	#[arg(long, env = "ALLOCATOR_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the allocator service
	Start,
	/// Run a single allocation pass and exit
	RunOnce,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// Initialize tracing
	setup_tracing(&cli.log_level)?;

	// Handle commands
	match cli.command {
		Some(Commands::Start) | None => start_service(cli).await,
		Some(Commands::RunOnce) => run_once(cli).await,
		Some(Commands::Validate) => validate_config(cli).await,
	}
}

async fn start_service(cli: Cli) -> Result<()> {
	info!("Starting mint allocator service");

	let config = load_config(&cli).await?;
	let runner = build_runner(&config).await?;

	let scheduler = scheduler::PassScheduler::new(
		runner,
		Duration::from_secs(config.allocator.pass_interval_secs),
	);

	info!("Mint allocator service started");
	scheduler.run(shutdown_signal()).await;
	info!("Mint allocator service stopped");

	Ok(())
}

async fn run_once(cli: Cli) -> Result<()> {
	let config = load_config(&cli).await?;
	let runner = build_runner(&config).await?;

	let totals = runner.run_pass().await;
	info!("Single pass finished: {}", totals);

	Ok(())
}

async fn validate_config(cli: Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = load_config(&cli).await?;

	info!("Configuration is valid");
	info!("Network: {}", config.allocator.network);
	info!("Pass interval: {}s", config.allocator.pass_interval_secs);
	info!("Storage backend: {:?}", config.storage.backend);

	Ok(())
}

async fn load_config(cli: &Cli) -> Result<AllocatorConfig> {
	info!("Loading configuration from: {:?}", cli.config);

	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")
}

async fn build_runner(config: &AllocatorConfig) -> Result<AllocationRunner> {
	let store = build_store(config).await?;
	Ok(AllocationRunner::new(
		store,
		Arc::new(ThreadRngSelector),
		config.allocator.network,
	))
}

async fn build_store(config: &AllocatorConfig) -> Result<Arc<dyn PaymentStore>> {
	match config.storage.backend {
		StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
		StorageBackend::File => {
			let path = config
				.storage
				.path
				.clone()
				.context("storage.path is required for the file backend")?;
			let store = FileStore::new(path)
				.await
				.context("Failed to open file store")?;
			Ok(Arc::new(store))
		}
	}
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
