//! In-process counters for refresh-token upkeep, readable without a metrics recorder.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Point-in-time copy of [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefreshCounts {
	/// Token-endpoint exchanges started.
	pub attempts: u64,
	/// Exchanges whose rotated credential was persisted.
	pub successes: u64,
	/// Exchanges the token endpoint rejected or whose result could not be persisted.
	pub failures: u64,
	/// Stale access tokens handed back because no refresh happened.
	pub fallbacks: u64,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum RefreshTally {
	Attempt,
	Success,
	Failure,
	Fallback,
}

/// Counters shared by every clone of an explorer.
#[derive(Debug, Default)]
pub struct RefreshMetrics([AtomicU64; 4]);
impl RefreshMetrics {
	/// Copies all counters at once.
	pub fn snapshot(&self) -> RefreshCounts {
		RefreshCounts {
			attempts: self.load(RefreshTally::Attempt),
			successes: self.load(RefreshTally::Success),
			failures: self.load(RefreshTally::Failure),
			fallbacks: self.load(RefreshTally::Fallback),
		}
	}

	/// Token-endpoint exchanges started.
	pub fn attempts(&self) -> u64 {
		self.load(RefreshTally::Attempt)
	}

	/// Exchanges whose rotated credential was persisted.
	pub fn successes(&self) -> u64 {
		self.load(RefreshTally::Success)
	}

	/// Exchanges the token endpoint rejected or whose result could not be persisted.
	pub fn failures(&self) -> u64 {
		self.load(RefreshTally::Failure)
	}

	/// Stale access tokens handed back because no refresh happened.
	pub fn fallbacks(&self) -> u64 {
		self.load(RefreshTally::Fallback)
	}

	pub(crate) fn tally(&self, tally: RefreshTally) {
		self.0[tally as usize].fetch_add(1, Ordering::Relaxed);
	}

	fn load(&self, tally: RefreshTally) -> u64 {
		self.0[tally as usize].load(Ordering::Relaxed)
	}
}
