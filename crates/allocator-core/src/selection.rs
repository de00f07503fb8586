//! Randomized fair selection within one (block, token) pair.
//!
//! Pure partition logic: given the pending set and the admission budget, it
//! decides which transactions are admitted without touching storage or logs.
//! The IO layer around it applies the resulting statuses.

use crate::selector::RandomSelector;
use allocator_types::PaymentRequest;
use std::collections::{BTreeMap, HashSet};

/// Per-block ceiling on distinct admitted senders.
pub const MAX_ADDRESSES_PER_BLOCK: usize = 80;

/// Outcome of partitioning one pending set.
///
/// `admitted` and `rejected` are disjoint and together cover every pending
/// transaction exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
	pub admitted: Vec<String>,
	pub rejected: Vec<String>,
}

/// Partitions a pending set into admitted and rejected transactions.
///
/// Selection runs in two phases. The address-fairness pass groups requests
/// by normalized sender and grants each selected address exactly one of its
/// transactions, shuffling the addresses when there are more than `cap`.
/// The fill-up pass then tops up to `cap` from the still-unselected
/// transactions, so an address holding several requests is guaranteed at
/// most one admission but may win more through the fill-up lottery.
pub fn select_transactions(
	pending: &[PaymentRequest],
	cap: usize,
	selector: &dyn RandomSelector,
) -> Selection {
	// BTreeMap keeps the grouping order deterministic under a seeded
	// selector.
	let mut by_sender: BTreeMap<String, Vec<&str>> = BTreeMap::new();
	for request in pending {
		by_sender
			.entry(request.sender())
			.or_default()
			.push(&request.tx);
	}
	let groups: Vec<&Vec<&str>> = by_sender.values().collect();

	// Address-fairness pass: every address when they fit the budget, a
	// random subset otherwise.
	let selected_groups: Vec<usize> = if groups.len() <= cap {
		(0..groups.len()).collect()
	} else {
		selector
			.permutation(groups.len())
			.into_iter()
			.take(cap)
			.collect()
	};

	// One uniformly chosen transaction per selected address.
	let mut admitted: Vec<String> = Vec::with_capacity(cap.min(pending.len()));
	let mut admitted_set: HashSet<&str> = HashSet::new();
	for group_idx in selected_groups {
		let txs = groups[group_idx];
		let tx = txs[selector.pick(txs.len())];
		admitted.push(tx.to_string());
		admitted_set.insert(tx);
	}

	// Fill-up pass: top up to the budget from every transaction not yet
	// selected, extras from multi-transaction addresses included.
	if admitted.len() < cap {
		let remaining: Vec<&str> = pending
			.iter()
			.map(|request| request.tx.as_str())
			.filter(|tx| !admitted_set.contains(tx))
			.collect();
		let need = cap - admitted.len();
		for idx in selector.permutation(remaining.len()).into_iter().take(need) {
			admitted_set.insert(remaining[idx]);
			admitted.push(remaining[idx].to_string());
		}
	}

	let rejected: Vec<String> = pending
		.iter()
		.map(|request| request.tx.as_str())
		.filter(|tx| !admitted_set.contains(tx))
		.map(str::to_string)
		.collect();

	Selection { admitted, rejected }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::selector::{SeededSelector, ThreadRngSelector};
	use allocator_types::{Network, PaymentStatus};
	use std::collections::HashMap;

	fn request(tx: &str, from: &str) -> PaymentRequest {
		PaymentRequest {
			tx: tx.to_string(),
			from: from.to_string(),
			to: "0xtok".to_string(),
			block_number: 100,
			network: Network::BaseSepolia,
			status: PaymentStatus::Pending,
			error: None,
		}
	}

	fn sender_of<'a>(pending: &'a [PaymentRequest], tx: &str) -> &'a str {
		&pending.iter().find(|r| r.tx == tx).unwrap().from
	}

	#[test]
	fn test_partition_is_exhaustive_and_disjoint() {
		let pending: Vec<PaymentRequest> = (0..25)
			.map(|i| request(&format!("0x{}", i), &format!("0xaddr{}", i % 10)))
			.collect();
		let selector = SeededSelector::new(7);

		let selection = select_transactions(&pending, 5, &selector);
		assert_eq!(selection.admitted.len(), 5);
		assert_eq!(selection.rejected.len(), 20);

		let mut all: Vec<&String> = selection
			.admitted
			.iter()
			.chain(selection.rejected.iter())
			.collect();
		all.sort();
		all.dedup();
		assert_eq!(all.len(), 25);
	}

	#[test]
	fn test_under_cap_admits_one_per_address() {
		// 5 unique addresses with 1 tx each and room for all of them.
		let pending: Vec<PaymentRequest> = (0..5)
			.map(|i| request(&format!("0x{}", i), &format!("0xaddr{}", i)))
			.collect();
		let selector = SeededSelector::new(1);

		let selection = select_transactions(&pending, 80, &selector);
		assert_eq!(selection.admitted.len(), 5);
		assert!(selection.rejected.is_empty());
	}

	#[test]
	fn test_over_cap_admits_distinct_addresses() {
		// 100 unique addresses, budget 80: exactly 80 admitted, one tx per
		// address, all senders distinct.
		let pending: Vec<PaymentRequest> = (0..100)
			.map(|i| request(&format!("0x{}", i), &format!("0xaddr{}", i)))
			.collect();
		let selector = SeededSelector::new(3);

		let selection = select_transactions(&pending, MAX_ADDRESSES_PER_BLOCK, &selector);
		assert_eq!(selection.admitted.len(), 80);
		assert_eq!(selection.rejected.len(), 20);

		let senders: HashSet<&str> = selection
			.admitted
			.iter()
			.map(|tx| sender_of(&pending, tx))
			.collect();
		assert_eq!(senders.len(), 80);
	}

	#[test]
	fn test_heavy_address_guaranteed_at_most_one_in_fairness_pass() {
		// One address holds 3 txs, 79 others hold 1 each. All 80 addresses
		// fit the budget, so each contributes exactly one tx and the heavy
		// address's extras are rejected.
		let mut pending: Vec<PaymentRequest> = (0..79)
			.map(|i| request(&format!("0x{}", i), &format!("0xaddr{}", i)))
			.collect();
		pending.push(request("0xheavy1", "0xWhale"));
		pending.push(request("0xheavy2", "0xwhale"));
		pending.push(request("0xheavy3", "0xWHALE"));

		let selector = SeededSelector::new(11);
		let selection = select_transactions(&pending, 80, &selector);
		assert_eq!(selection.admitted.len(), 80);
		assert_eq!(selection.rejected.len(), 2);

		let heavy_admitted = selection
			.admitted
			.iter()
			.filter(|tx| tx.starts_with("0xheavy"))
			.count();
		assert_eq!(heavy_admitted, 1);
	}

	#[test]
	fn test_fill_up_draws_from_multi_tx_extras() {
		// 3 addresses, one with 5 txs, budget 4: the fairness pass yields 3,
		// the fill-up pass tops up to 4 from the heavy address's extras.
		let mut pending = vec![request("0xa1", "0xalice"), request("0xb1", "0xbob")];
		for i in 0..5 {
			pending.push(request(&format!("0xc{}", i), "0xcarol"));
		}

		let selector = SeededSelector::new(5);
		let selection = select_transactions(&pending, 4, &selector);
		assert_eq!(selection.admitted.len(), 4);
		assert_eq!(selection.rejected.len(), 3);

		// Every address won its guaranteed slot; the fourth admission must
		// come from carol's extras.
		let carol_admitted = selection
			.admitted
			.iter()
			.filter(|tx| tx.starts_with("0xc"))
			.count();
		assert_eq!(carol_admitted, 2);
	}

	#[test]
	fn test_cap_exceeding_pending_admits_everything() {
		let pending = vec![request("0x1", "0xa"), request("0x2", "0xb")];
		let selector = SeededSelector::new(2);

		let selection = select_transactions(&pending, 80, &selector);
		assert_eq!(selection.admitted.len(), 2);
		assert!(selection.rejected.is_empty());
	}

	#[test]
	fn test_empty_pending_set() {
		let selector = SeededSelector::new(0);
		let selection = select_transactions(&[], 80, &selector);
		assert!(selection.admitted.is_empty());
		assert!(selection.rejected.is_empty());
	}

	#[test]
	fn test_seeded_selection_is_reproducible() {
		let pending: Vec<PaymentRequest> = (0..30)
			.map(|i| request(&format!("0x{}", i), &format!("0xaddr{}", i % 12)))
			.collect();

		let first = select_transactions(&pending, 6, &SeededSelector::new(99));
		let second = select_transactions(&pending, 6, &SeededSelector::new(99));
		assert_eq!(first, second);
	}

	#[test]
	fn test_contested_selection_is_roughly_fair() {
		// 5 addresses competing for 2 slots: over many trials each address
		// should win roughly 2/5 of the time.
		let pending: Vec<PaymentRequest> = (0..5)
			.map(|i| request(&format!("0x{}", i), &format!("0xaddr{}", i)))
			.collect();
		let selector = ThreadRngSelector;

		let trials = 5_000;
		let mut wins: HashMap<String, u32> = HashMap::new();
		for _ in 0..trials {
			let selection = select_transactions(&pending, 2, &selector);
			assert_eq!(selection.admitted.len(), 2);
			for tx in selection.admitted {
				*wins.entry(tx).or_insert(0) += 1;
			}
		}

		let expected = trials as f64 * 2.0 / 5.0;
		for (tx, count) in &wins {
			let deviation = (*count as f64 - expected).abs() / expected;
			assert!(deviation < 0.15, "tx {} won {} of {}", tx, count, trials);
		}
	}
}
