// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a client's [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
	/// Refresh exchanges sent to the API.
	pub started: u64,
	/// Callers that waited on an exchange another caller had already started.
	pub joined: u64,
	/// Exchanges that stored a new access token.
	pub succeeded: u64,
	/// Exchanges that ended with the session cleared or a store failure.
	pub failed: u64,
}
impl RefreshStats {
	/// Callers served by refresh exchanges, including the ones that started them.
	pub fn callers(&self) -> u64 {
		self.started + self.joined
	}
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum RefreshEvent {
	Started,
	Joined,
	Succeeded,
	Failed,
}

/// Counters describing how 401 recoveries were coalesced into refresh exchanges.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	counters: [AtomicU64; 4],
}
impl RefreshMetrics {
	/// Reads every counter.
	pub fn snapshot(&self) -> RefreshStats {
		let [started, joined, succeeded, failed] =
			self.counters.each_ref().map(|counter| counter.load(Ordering::Relaxed));

		RefreshStats { started, joined, succeeded, failed }
	}

	pub(crate) fn record(&self, event: RefreshEvent) {
		self.counters[event as usize].fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn snapshot_tracks_each_event_separately() {
		let metrics = RefreshMetrics::default();

		metrics.record(RefreshEvent::Started);
		metrics.record(RefreshEvent::Joined);
		metrics.record(RefreshEvent::Joined);
		metrics.record(RefreshEvent::Succeeded);

		let stats = metrics.snapshot();

		assert_eq!(stats, RefreshStats { started: 1, joined: 2, succeeded: 1, failed: 0 });
		assert_eq!(stats.callers(), 3);
	}
}
