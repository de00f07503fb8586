//! Storage module for the mint allocator.
//!
//! This module provides the persistence abstraction the allocation pipeline
//! runs against, supporting different backend implementations such as
//! in-memory or file-based stores.

use allocator_types::{Network, PaymentRequest, PaymentStatus, Token};
use async_trait::async_trait;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::{file::FileStore, memory::MemoryStore};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
}

/// Query filter over payment requests.
///
/// Every field is conjunctive; unset fields match everything. An empty
/// `statuses` list matches any status.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
	pub network: Option<Network>,
	pub block_number: Option<u64>,
	pub token: Option<String>,
	pub statuses: Vec<PaymentStatus>,
}

impl RequestFilter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Filter for PENDING requests on one network, the allocator's most
	/// common query shape.
	pub fn pending(network: Network) -> Self {
		Self {
			network: Some(network),
			statuses: vec![PaymentStatus::Pending],
			..Self::default()
		}
	}

	pub fn with_network(mut self, network: Network) -> Self {
		self.network = Some(network);
		self
	}

	pub fn with_block(mut self, block_number: u64) -> Self {
		self.block_number = Some(block_number);
		self
	}

	pub fn with_token(mut self, token: impl Into<String>) -> Self {
		self.token = Some(token.into());
		self
	}

	pub fn with_statuses(mut self, statuses: Vec<PaymentStatus>) -> Self {
		self.statuses = statuses;
		self
	}

	/// Whether a request satisfies every set field of this filter.
	pub fn matches(&self, request: &PaymentRequest) -> bool {
		if let Some(network) = self.network {
			if request.network != network {
				return false;
			}
		}
		if let Some(block_number) = self.block_number {
			if request.block_number != block_number {
				return false;
			}
		}
		if let Some(token) = &self.token {
			if !request.to.eq_ignore_ascii_case(token) {
				return false;
			}
		}
		if !self.statuses.is_empty() && !self.statuses.contains(&request.status) {
			return false;
		}
		true
	}
}

/// Trait defining the persistence interface for payment requests and tokens.
///
/// The allocation pipeline only ever touches the store through this trait,
/// so backends can be swapped and tests can inject failing implementations.
#[async_trait]
pub trait PaymentStore: Send + Sync {
	/// Looks up the capacity configuration for a token address.
	async fn find_token(&self, address: &str) -> Result<Option<Token>, StoreError>;

	/// Looks up a single request by its transaction identifier.
	async fn find_request(&self, tx: &str) -> Result<Option<PaymentRequest>, StoreError>;

	/// Counts requests matching the filter.
	async fn count_requests(&self, filter: &RequestFilter) -> Result<u64, StoreError>;

	/// Fetches all requests matching the filter.
	async fn find_requests(&self, filter: &RequestFilter) -> Result<Vec<PaymentRequest>, StoreError>;

	/// Distinct block numbers with at least one matching request, ascending.
	async fn distinct_block_numbers(&self, filter: &RequestFilter) -> Result<Vec<u64>, StoreError>;

	/// Distinct token addresses with at least one matching request in the
	/// given block.
	async fn distinct_token_addresses(
		&self,
		block_number: u64,
		filter: &RequestFilter,
	) -> Result<Vec<String>, StoreError>;

	/// Bulk status transition over a set of transactions. Returns the number
	/// of requests actually updated; unknown transactions are skipped.
	async fn update_status(
		&self,
		txs: &[String],
		status: PaymentStatus,
		error: Option<String>,
	) -> Result<u64, StoreError>;

	/// Inserts a new request. Ingestion-side operation, also used to populate
	/// test fixtures.
	async fn insert_request(&self, request: PaymentRequest) -> Result<(), StoreError>;

	/// Inserts or replaces a token record.
	async fn upsert_token(&self, token: Token) -> Result<(), StoreError>;
}
