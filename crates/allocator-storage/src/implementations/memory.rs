//! In-memory store implementation.

use crate::{PaymentStore, RequestFilter, StoreError};
use allocator_types::{PaymentRequest, PaymentStatus, Token};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;

/// In-memory store implementation (lost on restart).
#[derive(Clone, Default)]
pub struct MemoryStore {
	requests: DashMap<String, PaymentRequest>,
	tokens: DashMap<String, Token>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl PaymentStore for MemoryStore {
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
		// Stable order so repeated queries see the same sequence.
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
		Ok(updated)
	}

	async fn insert_request(&self, request: PaymentRequest) -> Result<(), StoreError> {
		self.requests.insert(request.tx.clone(), request);
		Ok(())
	}

	async fn upsert_token(&self, token: Token) -> Result<(), StoreError> {
		self.tokens.insert(token.address.to_lowercase(), token);
		Ok(())
	}
}
