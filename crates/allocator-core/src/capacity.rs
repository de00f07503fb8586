//! Token admission capacity evaluation.

use allocator_types::Token;

/// Why a token is closed to new admissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
	/// The token's pool was already created.
	PoolCreated,
	/// The committed count has reached the admission cap.
	CapReached,
}

/// Remaining admission capacity for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCapacity {
	/// Slots already consumed: the higher of the internally tracked
	/// committed-request count and the externally reported mint count,
	/// since either source can lag the other.
	pub committed: u64,
	/// Admissions still available, 0 when closed.
	pub remaining_slots: u64,
	/// Set when the token accepts no further admissions.
	pub close_reason: Option<CloseReason>,
}

impl TokenCapacity {
	pub fn is_closed(&self) -> bool {
		self.close_reason.is_some()
	}
}

/// Computes the remaining admission capacity for a token.
///
/// `allocated_count` is the number of requests in a committed status
/// (ALLOCATED or any MINT_* state) for this token, counted across all
/// blocks. Pure function of its inputs.
pub fn evaluate_capacity(token: &Token, allocated_count: u64) -> TokenCapacity {
	if token.pool_created {
		return TokenCapacity {
			committed: allocated_count.max(token.mint_count),
			remaining_slots: 0,
			close_reason: Some(CloseReason::PoolCreated),
		};
	}

	let committed = allocated_count.max(token.mint_count);
	let remaining_slots = token.max_mint_count.saturating_sub(committed);

	TokenCapacity {
		committed,
		remaining_slots,
		close_reason: if remaining_slots == 0 {
			Some(CloseReason::CapReached)
		} else {
			None
		},
	}
}
