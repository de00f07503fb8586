//! Configuration loading for the mint allocator service.
//!
//! Configuration is read from a TOML file, optionally overridden by
//! `ALLOCATOR_*` environment variables, and validated before use.

use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub mod types;

pub use types::{AllocatorConfig, AllocatorSection, StorageBackend, StorageSection};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable overrides.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "ALLOCATOR_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<AllocatorConfig, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		self.apply_env_overrides(&mut config)?;
		Self::validate(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<AllocatorConfig, ConfigError> {
		let content = tokio::fs::read_to_string(file_path).await?;
		Self::from_toml(&content)
	}

	/// Parses a configuration from a TOML string without validation.
	pub fn from_toml(content: &str) -> Result<AllocatorConfig, ConfigError> {
		toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	fn apply_env_overrides(&self, config: &mut AllocatorConfig) -> Result<(), ConfigError> {
		if let Ok(network) = env::var(format!("{}NETWORK", self.env_prefix)) {
			debug!("Overriding network from environment");
			config.allocator.network = network
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid network: {}", e)))?;
		}

		if let Ok(interval) = env::var(format!("{}PASS_INTERVAL_SECS", self.env_prefix)) {
			debug!("Overriding pass interval from environment");
			config.allocator.pass_interval_secs = interval.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid pass interval: {}", e))
			})?;
		}

		if let Ok(backend) = env::var(format!("{}STORAGE_BACKEND", self.env_prefix)) {
			debug!("Overriding storage backend from environment");
			config.storage.backend = match backend.as_str() {
				"memory" => StorageBackend::Memory,
				"file" => StorageBackend::File,
				other => {
					return Err(ConfigError::ValidationError(format!(
						"Invalid storage backend: {}",
						other
					)))
				}
			};
		}

		if let Ok(path) = env::var(format!("{}STORAGE_PATH", self.env_prefix)) {
			debug!("Overriding storage path from environment");
			config.storage.path = Some(path.into());
		}

		Ok(())
	}

	/// Validates a configuration, rejecting settings the service cannot run
	/// with.
	pub fn validate(config: &AllocatorConfig) -> Result<(), ConfigError> {
		if config.allocator.pass_interval_secs == 0 {
			return Err(ConfigError::ValidationError(
				"pass_interval_secs must be greater than zero".to_string(),
			));
		}

		if config.storage.backend == StorageBackend::File && config.storage.path.is_none() {
			return Err(ConfigError::ValidationError(
				"storage.path is required for the file backend".to_string(),
			));
		}

		Ok(())
	}
}
