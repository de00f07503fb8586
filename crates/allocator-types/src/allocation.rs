//! Allocation outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate counts returned by an allocation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTotals {
	/// Requests admitted to a mint slot.
	pub selected: u64,
	/// Requests rejected and flagged for refund.
	pub refunded: u64,
}

impl AllocationTotals {
	/// Folds another set of totals into this one.
	pub fn merge(&mut self, other: AllocationTotals) {
		self.selected += other.selected;
		self.refunded += other.refunded;
	}
}

impl fmt::Display for AllocationTotals {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} selected, {} refunded", self.selected, self.refunded)
	}
}

/// Why a pending request was rejected.
///
/// The allocator's decision functions return this structured reason; the IO
/// layer renders it into the stored error string via [`message`].
///
/// [`message`]: RejectionReason::message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
	/// The token's pool was already created; no further admissions.
	PoolCreated,
	/// The token had no remaining capacity before selection ran.
	CapReached,
	/// This block's admissions consumed the token's last remaining slots.
	CapFilled { max: u64 },
	/// The request lost the per-block selection lottery.
	BlockLimit,
}

impl RejectionReason {
	/// The error string persisted on rejected requests.
	pub fn message(&self) -> String {
		match self {
			RejectionReason::PoolCreated => "REJECTED: Token pool already created".to_string(),
			RejectionReason::CapReached => {
				"REJECTED: Token has reached maximum mint count".to_string()
			}
			RejectionReason::CapFilled { max } => {
				format!("REJECTED: Token max mint count reached ({})", max)
			}
			RejectionReason::BlockLimit => "REJECTED: Block allocation limit exceeded".to_string(),
		}
	}
}
