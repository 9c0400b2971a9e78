//! Single-flight coordination: concurrent callers share one in-progress operation.
//!
//! The operation is boxed into a [`Shared`] future that every caller drives. The slot only keeps a
//! weak handle, so an operation lives exactly as long as someone is still waiting on it: the
//! caller that started it may go away while the others carry it to completion. A release guard
//! inside the shared future empties the slot once the operation settles, or once the last waiter
//! is gone and the future is dropped.

// crates.io
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
// self
use crate::_prelude::*;

/// Future handed to every caller of one flight.
pub type Flight<T> = Shared<BoxFuture<'static, T>>;

/// How a caller took part in a flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightRole {
	/// Started a new operation.
	Leader,
	/// Joined an operation another caller started.
	Follower,
}

/// Shares the outcome of one in-flight operation with every concurrent caller.
pub struct SingleFlight<T> {
	state: Arc<Mutex<FlightState<T>>>,
}
impl<T> SingleFlight<T>
where
	T: 'static + Clone + Send + Sync,
{
	/// Creates an idle coordinator.
	pub fn new() -> Self {
		Self { state: Arc::new(Mutex::new(FlightState { generation: 0, flight: None })) }
	}

	/// Whether an operation is currently in flight.
	pub fn is_in_flight(&self) -> bool {
		self.state.lock().flight.is_some()
	}

	/// Returns the flight in progress, or starts `operation` as a new one.
	///
	/// `operation` is only invoked by the leader. Nothing runs until one of the returned
	/// [`Flight`] handles is polled.
	pub fn join<F, Fut>(&self, operation: F) -> (Flight<T>, FlightRole)
	where
		F: FnOnce() -> Fut,
		Fut: 'static + Send + Future<Output = T>,
	{
		let mut state = self.state.lock();

		if let Some(flight) = state.flight.as_ref().and_then(WeakShared::upgrade) {
			return (flight, FlightRole::Follower);
		}

		let operation = operation();

		state.generation = state.generation.wrapping_add(1);

		let release = ReleaseGuard { state: self.state.clone(), generation: state.generation };
		let flight = async move {
			let _release = release;

			operation.await
		}
		.boxed()
		.shared();

		state.flight = flight.downgrade();

		(flight, FlightRole::Leader)
	}

	/// Joins or starts a flight and waits for its outcome.
	pub async fn run<F, Fut>(&self, operation: F) -> T
	where
		F: FnOnce() -> Fut,
		Fut: 'static + Send + Future<Output = T>,
	{
		let (flight, _) = self.join(operation);

		flight.await
	}
}
impl<T> Default for SingleFlight<T>
where
	T: 'static + Clone + Send + Sync,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<T> Debug for SingleFlight<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SingleFlight").field("in_flight", &self.state.lock().flight.is_some()).finish()
	}
}

struct FlightState<T> {
	generation: u64,
	flight: Option<WeakShared<BoxFuture<'static, T>>>,
}

struct ReleaseGuard<T> {
	state: Arc<Mutex<FlightState<T>>>,
	generation: u64,
}
impl<T> Drop for ReleaseGuard<T> {
	fn drop(&mut self) {
		let mut state = self.state.lock();

		if state.generation == self.generation {
			state.flight = None;
		}
	}
}
