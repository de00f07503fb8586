//! Interval scheduler driving allocation passes.

use allocator_core::AllocationRunner;
use chrono::Utc;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::info;

/// Runs allocation passes on a fixed interval from a single task.
///
/// Each tick runs one pass to completion before the next tick is honored,
/// so passes never overlap.
pub struct PassScheduler {
	runner: AllocationRunner,
	pass_interval: Duration,
}

impl PassScheduler {
	pub fn new(runner: AllocationRunner, pass_interval: Duration) -> Self {
		Self {
			runner,
			pass_interval,
		}
	}

	/// Ticks until the shutdown future resolves.
	pub async fn run(self, shutdown: impl Future<Output = ()>) {
		info!(
			"Scheduler started, running a pass every {:?}",
			self.pass_interval
		);

		tokio::pin!(shutdown);
		let mut ticker = interval(self.pass_interval);

		loop {
			tokio::select! {
				_ = ticker.tick() => {
					let started_at = Utc::now();
					let started = Instant::now();
					let totals = self.runner.run_pass().await;
					info!(
						"Pass started {} took {:?}: {}",
						started_at.to_rfc3339(),
						started.elapsed(),
						totals
					);
				}
				_ = &mut shutdown => {
					info!("Shutdown signal received, stopping scheduler");
					break;
				}
			}
		}
	}
}
