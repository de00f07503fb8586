//! File-based store implementation.
//!
//! Persists the full record set as a single JSON snapshot, with a dashmap
//! cache serving every read. Each mutation rewrites the snapshot; writes are
//! serialized through a mutex so concurrent mutations cannot interleave
//! half-written files.

use crate::{PaymentStore, RequestFilter, StoreError};
use allocator_types::{PaymentRequest, PaymentStatus, Token};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// On-disk representation of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
	tokens: Vec<Token>,
	requests: Vec<PaymentRequest>,
}

/// File-based store implementation (persisted across restarts).
#[derive(Clone)]
pub struct FileStore {
	path: PathBuf,
	requests: Arc<DashMap<String, PaymentRequest>>,
	tokens: Arc<DashMap<String, Token>>,
	write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl FileStore {
	/// Opens the store at the given snapshot path, loading existing data
	/// into the cache. The parent directory is created if missing.
	pub async fn new(path: PathBuf) -> Result<Self, StoreError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StoreError::Backend(e.to_string()))?;
		}

		let store = Self {
			path,
			requests: Arc::new(DashMap::new()),
			tokens: Arc::new(DashMap::new()),
			write_lock: Arc::new(tokio::sync::Mutex::new(())),
		};

		store.load().await?;
		Ok(store)
	}

	/// Loads the snapshot from disk into the cache, if one exists.
	async fn load(&self) -> Result<(), StoreError> {
		let content = match fs::read_to_string(&self.path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
			Err(e) => return Err(StoreError::Backend(e.to_string())),
		};

		let snapshot: Snapshot =
			serde_json::from_str(&content).map_err(|e| StoreError::Serialization(e.to_string()))?;

		for token in snapshot.tokens {
			self.tokens.insert(token.address.to_lowercase(), token);
		}
		for request in snapshot.requests {
			self.requests.insert(request.tx.clone(), request);
		}

		debug!(
			"Loaded {} request(s) and {} token(s) from {:?}",
			self.requests.len(),
			self.tokens.len(),
			self.path
		);
		Ok(())
	}

	/// Writes the current cache contents to disk as one snapshot.
	async fn persist(&self) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;

		let mut snapshot = Snapshot {
			tokens: self.tokens.iter().map(|entry| entry.clone()).collect(),
			requests: self.requests.iter().map(|entry| entry.clone()).collect(),
		};
		// Stable file contents regardless of cache iteration order.
		snapshot.tokens.sort_by(|a, b| a.address.cmp(&b.address));
		snapshot.requests.sort_by(|a, b| a.tx.cmp(&b.tx));

		let content = serde_json::to_string_pretty(&snapshot)
			.map_err(|e| StoreError::Serialization(e.to_string()))?;

		fs::write(&self.path, content)
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?;

		Ok(())
	}
}

#[async_trait]
impl PaymentStore for FileStore {
	async fn find_token(&self, address: &str) -> Result<Option<Token>, StoreError> {
		Ok(self
			.tokens
			.get(&address.to_lowercase())
			.map(|entry| entry.clone()))
	}

	async fn find_request(&self, tx: &str) -> Result<Option<PaymentRequest>, StoreError> {
		Ok(self.requests.get(tx).map(|entry| entry.clone()))
	}

	async fn count_requests(&self, filter: &RequestFilter) -> Result<u64, StoreError> {
		Ok(self
			.requests
			.iter()
			.filter(|entry| filter.matches(entry.value()))
			.count() as u64)
	}

	async fn find_requests(&self, filter: &RequestFilter) -> Result<Vec<PaymentRequest>, StoreError> {
		let mut requests: Vec<PaymentRequest> = self
			.requests
			.iter()
			.filter(|entry| filter.matches(entry.value()))
			.map(|entry| entry.clone())
			.collect();
		requests.sort_by(|a, b| a.tx.cmp(&b.tx));
		Ok(requests)
	}

	async fn distinct_block_numbers(&self, filter: &RequestFilter) -> Result<Vec<u64>, StoreError> {
		let blocks: BTreeSet<u64> = self
			.requests
			.iter()
			.filter(|entry| filter.matches(entry.value()))
			.map(|entry| entry.block_number)
			.collect();
		Ok(blocks.into_iter().collect())
	}

	async fn distinct_token_addresses(
		&self,
		block_number: u64,
		filter: &RequestFilter,
	) -> Result<Vec<String>, StoreError> {
		let tokens: BTreeSet<String> = self
			.requests
			.iter()
			.filter(|entry| entry.block_number == block_number && filter.matches(entry.value()))
			.map(|entry| entry.to.to_lowercase())
			.collect();
		Ok(tokens.into_iter().collect())
	}

	async fn update_status(
		&self,
		txs: &[String],
		status: PaymentStatus,
		error: Option<String>,
	) -> Result<u64, StoreError> {
		let mut updated = 0;
		for tx in txs {
			if let Some(mut entry) = self.requests.get_mut(tx) {
				entry.status = status;
				entry.error = error.clone();
				updated += 1;
			}
		}
		if updated > 0 {
			self.persist().await?;
		}
		Ok(updated)
	}

	async fn insert_request(&self, request: PaymentRequest) -> Result<(), StoreError> {
		self.requests.insert(request.tx.clone(), request);
		self.persist().await
	}

	async fn upsert_token(&self, token: Token) -> Result<(), StoreError> {
		self.tokens.insert(token.address.to_lowercase(), token);
		self.persist().await
	}
}
