//! Configuration types for the mint allocator service.

use allocator_types::Network;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
	pub allocator: AllocatorSection,
	#[serde(default)]
	pub storage: StorageSection,
}

/// Allocation pass settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorSection {
	/// Network whose pending requests this instance allocates.
	pub network: Network,
	/// Seconds between scheduled allocation passes.
	#[serde(default = "default_pass_interval_secs")]
	pub pass_interval_secs: u64,
}

/// Storage backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
	/// Backend kind.
	#[serde(default)]
	pub backend: StorageBackend,
	/// Snapshot path, required for the file backend.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<PathBuf>,
}

/// Supported storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	/// In-memory storage (lost on restart).
	#[default]
	Memory,
	/// File-based storage (persisted).
	File,
}

fn default_pass_interval_secs() -> u64 {
	60
}

impl Default for StorageSection {
	fn default() -> Self {
		Self {
			backend: StorageBackend::Memory,
			path: None,
		}
	}
}

impl Default for AllocatorConfig {
	fn default() -> Self {
		Self {
			allocator: AllocatorSection {
				network: Network::BaseSepolia,
				pass_interval_secs: default_pass_interval_secs(),
			},
			storage: StorageSection::default(),
		}
	}
}
