//! Shared helpers for flow implementations (single-flight guards).

// crates.io
use async_lock::MutexGuardArc;
// self
use crate::_prelude::*;

type GuardMap<K, T> = Arc<Mutex<HashMap<K, Arc<AsyncMutex<Option<T>>>>>>;

/// Keyed single-flight guards: callers sharing a key run one at a time, and a lease holder may
/// settle an outcome that every caller queued behind it can read instead of redoing the work.
///
/// Entries are pruned once the last lease for a key is released, so a settled outcome is only
/// visible to callers that overlapped with the lease holder.
#[derive(Debug)]
pub(crate) struct FlowGuards<K, T = ()>(GuardMap<K, T>);
impl<K, T> FlowGuards<K, T>
where
	K: Clone + Eq + Hash,
{
	/// Waits until no other lease for `key` is alive, then returns one.
	pub(crate) async fn acquire(&self, key: &K) -> FlowLease<K, T> {
		let guard = {
			let mut guards = self.0.lock();

			guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(None))).clone()
		};
		let held = guard.lock_arc().await;

		FlowLease { map: self.0.clone(), key: key.clone(), held: Some(held) }
	}

	/// Number of keys with a live lease or waiter.
	#[cfg(test)]
	pub(crate) fn in_flight(&self) -> usize {
		self.0.lock().len()
	}
}
impl<K, T> Clone for FlowGuards<K, T> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}
impl<K, T> Default for FlowGuards<K, T> {
	fn default() -> Self {
		Self(Default::default())
	}
}

/// Exclusive hold on one key of a [`FlowGuards`] map.
pub(crate) struct FlowLease<K, T = ()>
where
	K: Eq + Hash,
{
	map: GuardMap<K, T>,
	key: K,
	held: Option<MutexGuardArc<Option<T>>>,
}
impl<K, T> FlowLease<K, T>
where
	K: Eq + Hash,
{
	/// Outcome settled by an earlier holder of this key, if any.
	pub(crate) fn settled(&self) -> Option<&T> {
		self.held.as_deref().and_then(Option::as_ref)
	}

	/// Publishes `outcome` to the callers still queued on this key.
	pub(crate) fn settle(&mut self, outcome: T) {
		if let Some(held) = self.held.as_deref_mut() {
			*held = Some(outcome);
		}
	}
}
impl<K, T> Drop for FlowLease<K, T>
where
	K: Eq + Hash,
{
	fn drop(&mut self) {
		self.held.take();

		let mut guards = self.map.lock();

		if guards.get(&self.key).is_some_and(|guard| Arc::strong_count(guard) == 1) {
			guards.remove(&self.key);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn leases_serialize_per_key_and_prune_on_release() {
		let guards = FlowGuards::<String>::default();
		let first = guards.acquire(&"a".to_owned()).await;
		let other = guards.acquire(&"b".to_owned()).await;

		assert_eq!(guards.in_flight(), 2);

		let key = "a".to_owned();
		let mut waiter = Box::pin(guards.acquire(&key));
		let pending =
			tokio::time::timeout(std::time::Duration::from_millis(20), &mut waiter).await;

		assert!(pending.is_err(), "Second lease on the same key must wait.");

		drop(waiter);
		drop(first);
		drop(other);

		assert_eq!(guards.in_flight(), 0);

		let _again = guards.acquire(&"a".to_owned()).await;

		assert_eq!(guards.in_flight(), 1);
	}

	#[tokio::test]
	async fn settled_outcome_reaches_queued_callers_only() {
		let guards = FlowGuards::<&str, u16>::default();
		let mut leader = guards.acquire(&"k").await;

		assert!(leader.settled().is_none());

		let waiter = tokio::spawn({
			let guards = guards.clone();

			async move { guards.acquire(&"k").await.settled().copied() }
		});

		// Let the waiter queue up behind the leader.
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		leader.settle(429);
		drop(leader);

		assert_eq!(waiter.await.expect("Waiter task should not panic."), Some(429));
		assert_eq!(guards.in_flight(), 0);

		let late = guards.acquire(&"k").await;

		assert!(late.settled().is_none(), "Pruned keys must not replay old outcomes.");
	}
}
