//! Per-block allocation driver.

use crate::allocator::BlockTokenAllocator;
use crate::selector::RandomSelector;
use allocator_storage::{PaymentStore, RequestFilter, StoreError};
use allocator_types::{AllocationTotals, Network};
use std::sync::Arc;
use tracing::debug;

/// Processes all tokens with pending requests in one block.
///
/// Tokens are handled strictly sequentially. A failure from one token's
/// allocator is not caught here: it aborts the rest of the block and bubbles
/// to the runner, which isolates failures at block granularity.
pub struct BlockProcessor {
	store: Arc<dyn PaymentStore>,
	allocator: BlockTokenAllocator,
	network: Network,
}

impl BlockProcessor {
	pub fn new(
		store: Arc<dyn PaymentStore>,
		selector: Arc<dyn RandomSelector>,
		network: Network,
	) -> Self {
		let allocator = BlockTokenAllocator::new(store.clone(), selector, network);
		Self {
			store,
			allocator,
			network,
		}
	}

	/// Runs the allocator for every token with pending requests in the
	/// block, summing the totals.
	pub async fn process(&self, block_number: u64) -> Result<AllocationTotals, StoreError> {
		let filter = RequestFilter::pending(self.network);
		let tokens = self
			.store
			.distinct_token_addresses(block_number, &filter)
			.await?;
		if tokens.is_empty() {
			debug!("No pending tokens in block {}", block_number);
			return Ok(AllocationTotals::default());
		}

		debug!(
			"Processing block {} with {} pending token(s)",
			block_number,
			tokens.len()
		);

		let mut totals = AllocationTotals::default();
		for token_address in tokens {
			totals.merge(self.allocator.allocate(block_number, &token_address).await?);
		}
		Ok(totals)
	}
}
