//! Randomized sampling behind an injectable trait.
//!
//! Selection fairness depends on uniform randomness, but tests need
//! reproducible outcomes, so the source of randomness is a trait object the
//! pipeline receives at construction.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of randomness for the selection algorithm.
///
/// Both operations are uniform: `permutation` returns each of the `len!`
/// orderings with equal probability, `pick` returns each index with equal
/// probability.
pub trait RandomSelector: Send + Sync {
	/// Uniformly random permutation of the indices `0..len`.
	fn permutation(&self, len: usize) -> Vec<usize>;

	/// Uniformly random index in `0..len`. Panics if `len` is zero; callers
	/// only sample non-empty sequences.
	fn pick(&self, len: usize) -> usize;
}

/// Production selector backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSelector;

impl RandomSelector for ThreadRngSelector {
	fn permutation(&self, len: usize) -> Vec<usize> {
		let mut indices: Vec<usize> = (0..len).collect();
		indices.shuffle(&mut rand::thread_rng());
		indices
	}

	fn pick(&self, len: usize) -> usize {
		rand::thread_rng().gen_range(0..len)
	}
}

/// Deterministic selector for reproducible selection in tests.
pub struct SeededSelector {
	rng: Mutex<StdRng>,
}

impl SeededSelector {
	pub fn new(seed: u64) -> Self {
		Self {
			rng: Mutex::new(StdRng::seed_from_u64(seed)),
		}
	}
}

impl RandomSelector for SeededSelector {
	fn permutation(&self, len: usize) -> Vec<usize> {
		let mut indices: Vec<usize> = (0..len).collect();
		indices.shuffle(&mut *self.rng.lock().unwrap());
		indices
	}

	fn pick(&self, len: usize) -> usize {
		self.rng.lock().unwrap().gen_range(0..len)
	}
}
