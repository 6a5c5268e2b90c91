//! Thread-safe in-memory [`LoginStateStore`] with TTL eviction.

// self
use crate::{
	_prelude::*,
	auth::Nonce,
	store::{LoginRequestState, LoginStateStore, StoreError, StoreFuture},
};

type StateMap = Arc<Mutex<StateTable>>;

#[derive(Debug)]
struct StateTable {
	entries: HashMap<Nonce, LoginRequestState>,
	last_sweep: OffsetDateTime,
}

/// In-process store for single-instance deployments and tests.
///
/// Every operation runs under one mutex, which makes `consume` exactly-once. Expired
/// entries are swept during `put` at most once per sweep interval, so abandoned logins do
/// not accumulate.
#[derive(Clone, Debug)]
pub struct MemoryStateStore {
	map: StateMap,
	sweep_interval: Duration,
}
impl MemoryStateStore {
	const DEFAULT_SWEEP_INTERVAL: Duration = Duration::seconds(30);

	/// Overrides how often `put` sweeps expired entries (defaults to 30 seconds).
	pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
		self.sweep_interval = if interval.is_negative() { Duration::ZERO } else { interval };

		self
	}

	/// Number of stored entries, expired or not.
	pub fn len(&self) -> usize {
		self.map.lock().entries.len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn put_now(map: StateMap, sweep_interval: Duration, state: LoginRequestState) {
		let now = OffsetDateTime::now_utc();
		let mut guard = map.lock();

		if now - guard.last_sweep >= sweep_interval {
			guard.entries.retain(|_, entry| !entry.is_expired_at(now));
			guard.last_sweep = now;
		}

		guard.entries.insert(state.nonce.clone(), state);
	}

	fn consume_now(map: StateMap, nonce: Nonce) -> Option<LoginRequestState> {
		map.lock().entries.remove(&nonce)
	}

	fn purge_now(map: StateMap, now: OffsetDateTime) -> usize {
		let mut guard = map.lock();
		let before = guard.entries.len();

		guard.entries.retain(|_, entry| !entry.is_expired_at(now));
		guard.last_sweep = now;

		before - guard.entries.len()
	}
}
impl Default for MemoryStateStore {
	fn default() -> Self {
		Self {
			map: Arc::new(Mutex::new(StateTable {
				entries: HashMap::new(),
				last_sweep: OffsetDateTime::now_utc(),
			})),
			sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
		}
	}
}
impl LoginStateStore for MemoryStateStore {
	fn put(&self, state: LoginRequestState) -> StoreFuture<'_, ()> {
		let map = self.map.clone();
		let sweep_interval = self.sweep_interval;

		Box::pin(async move {
			Self::put_now(map, sweep_interval, state);

			Ok::<_, StoreError>(())
		})
	}

	fn consume<'a>(&'a self, nonce: &'a Nonce) -> StoreFuture<'a, Option<LoginRequestState>> {
		let map = self.map.clone();
		let nonce = nonce.to_owned();

		Box::pin(async move { Ok(Self::consume_now(map, nonce)) })
	}

	fn purge_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, usize> {
		let map = self.map.clone();

		Box::pin(async move { Ok(Self::purge_now(map, now)) })
	}
}
