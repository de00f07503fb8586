//! Shared domain types for the mint allocator.
//!
//! This crate defines the payment request and token records that flow through
//! the allocation pipeline, the allocation outcome types, and the serde
//! helpers used at the persistence edge.

pub mod allocation;
pub mod payment;
pub mod serde_helpers;
pub mod token;

pub use allocation::{AllocationTotals, RejectionReason};
pub use payment::{Network, PaymentRequest, PaymentStatus};
pub use token::Token;
