//! Core allocation engine for the mint allocator.
//!
//! Decides which pending payment requests are admitted to mint slots and
//! which are rejected, honoring a per-token admission cap and a per-block
//! address cap. One allocation pass walks pending blocks oldest-first,
//! processes each block's tokens sequentially, and applies terminal statuses
//! through the storage layer.

pub mod allocator;
pub mod capacity;
pub mod processor;
pub mod runner;
pub mod selection;
pub mod selector;

pub use allocator::BlockTokenAllocator;
pub use capacity::{evaluate_capacity, CloseReason, TokenCapacity};
pub use processor::BlockProcessor;
pub use runner::AllocationRunner;
pub use selection::{select_transactions, Selection, MAX_ADDRESSES_PER_BLOCK};
pub use selector::{RandomSelector, SeededSelector, ThreadRngSelector};
