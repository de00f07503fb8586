//! Allocation of one (block, token) pair.

use crate::capacity::{evaluate_capacity, CloseReason};
use crate::selection::{select_transactions, MAX_ADDRESSES_PER_BLOCK};
use crate::selector::RandomSelector;
use allocator_storage::{PaymentStore, RequestFilter, StoreError};
use allocator_types::{AllocationTotals, Network, PaymentStatus, RejectionReason};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Allocates mint slots for one (block, token) pair.
///
/// Reads the capacity snapshot and the pending set, runs the pure selection,
/// and applies the terminal statuses. Admissions are written before
/// rejections in two independent bulk updates: if the admission write fails
/// nothing has been touched, and if only the rejection write fails a re-run
/// sees the remaining PENDING rows and re-examines just those.
pub struct BlockTokenAllocator {
	store: Arc<dyn PaymentStore>,
	selector: Arc<dyn RandomSelector>,
	network: Network,
}

impl BlockTokenAllocator {
	pub fn new(
		store: Arc<dyn PaymentStore>,
		selector: Arc<dyn RandomSelector>,
		network: Network,
	) -> Self {
		Self {
			store,
			selector,
			network,
		}
	}

	/// Decides admission or rejection for every pending request of the pair.
	///
	/// Requests whose token has no capacity record are left PENDING for
	/// manual correction; everything else ends ALLOCATED or REJECTED.
	pub async fn allocate(
		&self,
		block_number: u64,
		token_address: &str,
	) -> Result<AllocationTotals, StoreError> {
		let token = match self.store.find_token(token_address).await? {
			Some(token) => token,
			None => {
				warn!(
					"No token record for {}, leaving its pending requests in block {} untouched",
					token_address, block_number
				);
				return Ok(AllocationTotals::default());
			}
		};

		let pending_filter = RequestFilter::pending(self.network)
			.with_block(block_number)
			.with_token(token_address);
		let pending = self.store.find_requests(&pending_filter).await?;
		if pending.is_empty() {
			debug!(
				"No pending requests for token {} in block {}",
				token_address, block_number
			);
			return Ok(AllocationTotals::default());
		}

		// Committed count spans all blocks: every admission ever made for
		// this token occupies a slot.
		let committed_filter = RequestFilter::new()
			.with_network(self.network)
			.with_token(token_address)
			.with_statuses(PaymentStatus::COMMITTED.to_vec());
		let allocated_count = self.store.count_requests(&committed_filter).await?;

		let capacity = evaluate_capacity(&token, allocated_count);
		if let Some(reason) = capacity.close_reason {
			return self.reject_all(&pending, reason, block_number).await;
		}

		let cap = MAX_ADDRESSES_PER_BLOCK.min(capacity.remaining_slots as usize);
		if cap == 0 {
			// Unreachable with a single capacity snapshot, guarded anyway.
			return self
				.reject_all(&pending, CloseReason::CapReached, block_number)
				.await;
		}

		let selection = select_transactions(&pending, cap, self.selector.as_ref());

		let rejection_reason = if capacity.committed + selection.admitted.len() as u64
			>= token.max_mint_count
		{
			RejectionReason::CapFilled {
				max: token.max_mint_count,
			}
		} else {
			RejectionReason::BlockLimit
		};

		if !selection.admitted.is_empty() {
			self.store
				.update_status(&selection.admitted, PaymentStatus::Allocated, None)
				.await?;
		}
		if !selection.rejected.is_empty() {
			self.store
				.update_status(
					&selection.rejected,
					PaymentStatus::Rejected,
					Some(rejection_reason.message()),
				)
				.await?;
		}

		let totals = AllocationTotals {
			selected: selection.admitted.len() as u64,
			refunded: selection.rejected.len() as u64,
		};
		info!(
			"Block {} token {}: {} (cap {}, committed {})",
			block_number, token_address, totals, cap, capacity.committed
		);
		Ok(totals)
	}

	/// Rejects the whole pending set of a closed token.
	async fn reject_all(
		&self,
		pending: &[allocator_types::PaymentRequest],
		reason: CloseReason,
		block_number: u64,
	) -> Result<AllocationTotals, StoreError> {
		let rejection = match reason {
			CloseReason::PoolCreated => RejectionReason::PoolCreated,
			CloseReason::CapReached => RejectionReason::CapReached,
		};
		let txs: Vec<String> = pending.iter().map(|request| request.tx.clone()).collect();
		self.store
			.update_status(&txs, PaymentStatus::Rejected, Some(rejection.message()))
			.await?;

		let totals = AllocationTotals {
			selected: 0,
			refunded: txs.len() as u64,
		};
		info!(
			"Block {} token {}: closed ({:?}), {} request(s) rejected",
			block_number,
			pending[0].to,
			reason,
			txs.len()
		);
		Ok(totals)
	}
}
