//! Allocation pass entry point.

use crate::processor::BlockProcessor;
use crate::selector::RandomSelector;
use allocator_storage::{PaymentStore, RequestFilter};
use allocator_types::{AllocationTotals, Network};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Runs one allocation pass across all pending blocks of a network.
///
/// Blocks are processed oldest-first so earlier blocks are never starved by
/// newer ones. Each block is its own failure domain: an error from one block
/// is logged and the pass continues with the next. The capacity snapshot and
/// the status writes are not wrapped in one transaction, so an external
/// writer bumping a token's mint count mid-pass can in rare races push a
/// token past its cap; the next pass observes the corrected counts.
pub struct AllocationRunner {
	store: Arc<dyn PaymentStore>,
	processor: BlockProcessor,
	network: Network,
}

impl AllocationRunner {
	pub fn new(
		store: Arc<dyn PaymentStore>,
		selector: Arc<dyn RandomSelector>,
		network: Network,
	) -> Self {
		let processor = BlockProcessor::new(store.clone(), selector, network);
		Self {
			store,
			processor,
			network,
		}
	}

	/// Runs one full pass and returns the aggregate totals.
	///
	/// Never returns an error: failures are logged and the pass either skips
	/// the failing block or, for the initial block query, ends early.
	/// Unprocessed requests stay PENDING, so the next scheduled pass retries
	/// naturally.
	pub async fn run_pass(&self) -> AllocationTotals {
		let mut totals = AllocationTotals::default();

		let filter = RequestFilter::pending(self.network);
		let blocks = match self.store.distinct_block_numbers(&filter).await {
			Ok(blocks) => blocks,
			Err(e) => {
				error!("Allocation pass aborted, block query failed: {}", e);
				return totals;
			}
		};

		if blocks.is_empty() {
			debug!("No pending blocks on {}", self.network);
			return totals;
		}

		info!(
			"Allocation pass on {}: {} pending block(s), {}..={}",
			self.network,
			blocks.len(),
			blocks[0],
			blocks[blocks.len() - 1]
		);

		for block_number in blocks {
			match self.processor.process(block_number).await {
				Ok(block_totals) => totals.merge(block_totals),
				Err(e) => {
					error!(
						"Block {} failed, continuing with next block: {}",
						block_number, e
					);
				}
			}
		}

		info!("Allocation pass complete: {}", totals);
		totals
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::selector::SeededSelector;
	use allocator_storage::{MemoryStore, StoreError};
	use allocator_types::{PaymentRequest, PaymentStatus, Token};
	use async_trait::async_trait;

	fn request(tx: &str, token: &str, block: u64) -> PaymentRequest {
		PaymentRequest {
			tx: tx.to_string(),
			from: format!("0xaddr-{}", tx),
			to: token.to_string(),
			block_number: block,
			network: Network::BaseSepolia,
			status: PaymentStatus::Pending,
			error: None,
		}
	}

	fn token(address: &str, max_mint_count: u64) -> Token {
		Token {
			address: address.to_string(),
			max_mint_count,
			pool_created: false,
			mint_count: 0,
		}
	}

	fn runner(store: Arc<dyn PaymentStore>) -> AllocationRunner {
		AllocationRunner::new(store, Arc::new(SeededSelector::new(21)), Network::BaseSepolia)
	}

	// Store wrapper that fails every operation touching one poisoned block.
	struct FailingStore {
		inner: Arc<MemoryStore>,
		poisoned_block: u64,
	}

	#[async_trait]
	impl PaymentStore for FailingStore {
		async fn find_token(&self, address: &str) -> Result<Option<Token>, StoreError> {
			self.inner.find_token(address).await
		}

		async fn find_request(&self, tx: &str) -> Result<Option<PaymentRequest>, StoreError> {
			self.inner.find_request(tx).await
		}

		async fn count_requests(&self, filter: &RequestFilter) -> Result<u64, StoreError> {
			self.inner.count_requests(filter).await
		}

		async fn find_requests(
			&self,
			filter: &RequestFilter,
		) -> Result<Vec<PaymentRequest>, StoreError> {
			self.inner.find_requests(filter).await
		}

		async fn distinct_block_numbers(
			&self,
			filter: &RequestFilter,
		) -> Result<Vec<u64>, StoreError> {
			self.inner.distinct_block_numbers(filter).await
		}

		async fn distinct_token_addresses(
			&self,
			block_number: u64,
			filter: &RequestFilter,
		) -> Result<Vec<String>, StoreError> {
			if block_number == self.poisoned_block {
				return Err(StoreError::Backend("connection reset".to_string()));
			}
			self.inner.distinct_token_addresses(block_number, filter).await
		}

		async fn update_status(
			&self,
			txs: &[String],
			status: PaymentStatus,
			error: Option<String>,
		) -> Result<u64, StoreError> {
			self.inner.update_status(txs, status, error).await
		}

		async fn insert_request(&self, request: PaymentRequest) -> Result<(), StoreError> {
			self.inner.insert_request(request).await
		}

		async fn upsert_token(&self, token: Token) -> Result<(), StoreError> {
			self.inner.upsert_token(token).await
		}
	}

	// Store whose block query always fails.
	struct BrokenStore;

	#[async_trait]
	impl PaymentStore for BrokenStore {
		async fn find_token(&self, _: &str) -> Result<Option<Token>, StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}

		async fn find_request(&self, _: &str) -> Result<Option<PaymentRequest>, StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}

		async fn count_requests(&self, _: &RequestFilter) -> Result<u64, StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}

		async fn find_requests(
			&self,
			_: &RequestFilter,
		) -> Result<Vec<PaymentRequest>, StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}

		async fn distinct_block_numbers(
			&self,
			_: &RequestFilter,
		) -> Result<Vec<u64>, StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}

		async fn distinct_token_addresses(
			&self,
			_: u64,
			_: &RequestFilter,
		) -> Result<Vec<String>, StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}

		async fn update_status(
			&self,
			_: &[String],
			_: PaymentStatus,
			_: Option<String>,
		) -> Result<u64, StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}

		async fn insert_request(&self, _: PaymentRequest) -> Result<(), StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}

		async fn upsert_token(&self, _: Token) -> Result<(), StoreError> {
			Err(StoreError::Backend("down".to_string()))
		}
	}

	#[tokio::test]
	async fn test_blocks_processed_oldest_first() {
		// A 3-slot token contested across blocks 101, 103, 105: the oldest
		// blocks must win the capacity.
		let store = Arc::new(MemoryStore::new());
		store.upsert_token(token("0xtok", 3)).await.unwrap();
		for (tx, block) in [
			("0xe", 105u64),
			("0xa", 101),
			("0xc", 103),
			("0xb", 101),
			("0xd", 103),
		] {
			store.insert_request(request(tx, "0xtok", block)).await.unwrap();
		}

		let totals = runner(store.clone()).run_pass().await;
		assert_eq!(totals.selected, 3);
		assert_eq!(totals.refunded, 2);

		// Block 101 wins both its slots.
		for tx in ["0xa", "0xb"] {
			let found = store.find_request(tx).await.unwrap().unwrap();
			assert_eq!(found.status, PaymentStatus::Allocated, "tx {}", tx);
		}

		// Block 103 gets the last slot, contested between its two requests.
		let mut allocated_in_103 = 0;
		for tx in ["0xc", "0xd"] {
			let found = store.find_request(tx).await.unwrap().unwrap();
			if found.status == PaymentStatus::Allocated {
				allocated_in_103 += 1;
			}
		}
		assert_eq!(allocated_in_103, 1);

		// Block 105 arrives after the cap is consumed.
		let last = store.find_request("0xe").await.unwrap().unwrap();
		assert_eq!(last.status, PaymentStatus::Rejected);
		assert_eq!(
			last.error.unwrap(),
			"REJECTED: Token has reached maximum mint count"
		);
	}

	#[tokio::test]
	async fn test_empty_store_is_noop() {
		let totals = runner(Arc::new(MemoryStore::new())).run_pass().await;
		assert_eq!(totals, AllocationTotals::default());
	}

	#[tokio::test]
	async fn test_failed_block_does_not_abort_pass() {
		let inner = Arc::new(MemoryStore::new());
		inner.upsert_token(token("0xtok", 100)).await.unwrap();
		inner
			.insert_request(request("0xbad", "0xtok", 101))
			.await
			.unwrap();
		inner
			.insert_request(request("0xgood", "0xtok", 102))
			.await
			.unwrap();
		let store = Arc::new(FailingStore {
			inner: inner.clone(),
			poisoned_block: 101,
		});

		let totals = runner(store).run_pass().await;
		assert_eq!(totals.selected, 1);

		// The poisoned block's request stays PENDING for the next pass.
		let bad = inner.find_request("0xbad").await.unwrap().unwrap();
		assert_eq!(bad.status, PaymentStatus::Pending);
		let good = inner.find_request("0xgood").await.unwrap().unwrap();
		assert_eq!(good.status, PaymentStatus::Allocated);
	}

	#[tokio::test]
	async fn test_block_query_failure_is_contained() {
		let totals = runner(Arc::new(BrokenStore)).run_pass().await;
		assert_eq!(totals, AllocationTotals::default());
	}

	#[tokio::test]
	async fn test_second_pass_is_noop() {
		let store = Arc::new(MemoryStore::new());
		store.upsert_token(token("0xtok", 10)).await.unwrap();
		for i in 0..4 {
			store
				.insert_request(request(&format!("0x{}", i), "0xtok", 101))
				.await
				.unwrap();
		}

		let runner = runner(store);
		let first = runner.run_pass().await;
		assert_eq!(first.selected, 4);

		let second = runner.run_pass().await;
		assert_eq!(second, AllocationTotals::default());
	}
}
