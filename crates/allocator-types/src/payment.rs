//! Payment request types for the mint allocator.
//!
//! A payment request is created by the upstream ingestion process in the
//! PENDING state; the allocator transitions it exactly once to ALLOCATED or
//! REJECTED, and the downstream mint pipeline owns every transition after
//! that.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The network a payment request was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
	/// Base mainnet.
	#[serde(rename = "base")]
	Base,
	/// Base Sepolia testnet.
	#[serde(rename = "base-sepolia")]
	BaseSepolia,
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Network::Base => write!(f, "base"),
			Network::BaseSepolia => write!(f, "base-sepolia"),
		}
	}
}

impl FromStr for Network {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"base" => Ok(Network::Base),
			"base-sepolia" => Ok(Network::BaseSepolia),
			other => Err(format!("Unknown network: {}", other)),
		}
	}
}

/// Lifecycle status of a payment request.
///
/// The allocator only ever performs the PENDING → {ALLOCATED, REJECTED}
/// transitions; the MINT_* states belong to the downstream mint pipeline and
/// are only read here when counting committed admissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
	/// Awaiting an allocation decision.
	Pending,
	/// Admitted to a mint slot.
	Allocated,
	/// Refused a mint slot; `error` carries the reason.
	Rejected,
	/// Picked up by the mint pipeline.
	MintProcessing,
	/// Mint finalized on-chain.
	MintCompleted,
	/// Mint attempt failed downstream.
	MintError,
}

impl PaymentStatus {
	/// Statuses that count against a token's admission cap.
	pub const COMMITTED: [PaymentStatus; 4] = [
		PaymentStatus::Allocated,
		PaymentStatus::MintProcessing,
		PaymentStatus::MintCompleted,
		PaymentStatus::MintError,
	];

	/// Whether this status occupies a mint slot.
	pub fn is_committed(&self) -> bool {
		Self::COMMITTED.contains(self)
	}
}

/// One pending transfer awaiting a mint slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
	/// Unique transaction identifier, the primary correlation key.
	pub tx: String,
	/// Sender address. Grouping normalizes to lowercase; the stored value
	/// keeps its original casing.
	pub from: String,
	/// Target token address.
	pub to: String,
	/// Block in which the request became eligible.
	pub block_number: u64,
	/// Network the request was observed on.
	pub network: Network,
	/// Current lifecycle status.
	pub status: PaymentStatus,
	/// Human-readable rejection reason, set only on REJECTED.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl PaymentRequest {
	/// Sender address normalized for grouping.
	pub fn sender(&self) -> String {
		self.from.to_lowercase()
	}
}
