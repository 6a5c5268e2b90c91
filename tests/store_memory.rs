mod common;

// self
use common::*;

fn state(nonce: &str, created_at: OffsetDateTime, ttl: Duration) -> LoginRequestState {
	let mut return_to = url(RETURN_URL);

	return_to.query_pairs_mut().append_pair("nonce", nonce);

	LoginRequestState {
		nonce: Nonce::new(nonce).expect("Nonce fixture should be valid."),
		return_to,
		binding: None,
		created_at,
		expires_at: created_at + ttl,
	}
}

#[tokio::test]
async fn consume_returns_the_state_exactly_once() {
	let store = MemoryStateStore::default();
	let stored = seed_state(&store, "n1", Duration::minutes(10), Some("session-1")).await;
	let first = store
		.consume(&stored.nonce)
		.await
		.expect("Consuming from the memory store should succeed.");

	assert_eq!(first, Some(stored.clone()));

	let second = store
		.consume(&stored.nonce)
		.await
		.expect("Consuming from the memory store should succeed.");

	assert!(second.is_none());
	assert!(store.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumers_see_one_winner() {
	let store = Arc::new(MemoryStateStore::default());
	let stored = seed_state(&store, "race", Duration::minutes(10), None).await;
	let tasks = (0..16)
		.map(|_| {
			let store = store.clone();
			let nonce = stored.nonce.clone();

			tokio::spawn(async move {
				store.consume(&nonce).await.expect("Consuming should succeed.").is_some()
			})
		})
		.collect::<Vec<_>>();
	let mut winners = 0;

	for task in tasks {
		if task.await.expect("Consumer task should not panic.") {
			winners += 1;
		}
	}

	assert_eq!(winners, 1);
}

#[tokio::test]
async fn expired_entries_are_still_returned_for_classification() {
	let store = MemoryStateStore::default();
	let created_at = OffsetDateTime::now_utc() - Duration::minutes(20);
	let stale = state("stale", created_at, Duration::minutes(10));

	store.put(stale.clone()).await.expect("Putting a state should succeed.");

	let consumed = store
		.consume(&stale.nonce)
		.await
		.expect("Consuming should succeed.")
		.expect("Expired entries should remain until swept.");

	assert!(consumed.is_expired_at(OffsetDateTime::now_utc()));
}

#[tokio::test]
async fn purge_expired_counts_removed_entries() {
	let store = MemoryStateStore::default();
	let now = OffsetDateTime::now_utc();

	for (nonce, ttl) in [("a", Duration::minutes(1)), ("b", Duration::minutes(2)), ("c", Duration::hours(1))]
	{
		store.put(state(nonce, now, ttl)).await.expect("Putting a state should succeed.");
	}

	let removed = store
		.purge_expired(now + Duration::minutes(5))
		.await
		.expect("Purging the memory store should succeed.");

	assert_eq!(removed, 2);
	assert_eq!(store.len(), 1);

	let survivor = Nonce::new("c").expect("Nonce fixture should be valid.");

	assert!(store.consume(&survivor).await.expect("Consuming should succeed.").is_some());
}

#[tokio::test]
async fn put_sweeps_abandoned_entries() {
	let store = MemoryStateStore::default().with_sweep_interval(Duration::ZERO);
	let created_at = OffsetDateTime::now_utc() - Duration::hours(1);

	store
		.put(state("abandoned", created_at, Duration::minutes(10)))
		.await
		.expect("Putting a state should succeed.");
	seed_state(&store, "fresh", Duration::minutes(10), None).await;

	assert_eq!(store.len(), 1);

	let abandoned = Nonce::new("abandoned").expect("Nonce fixture should be valid.");

	assert!(store.consume(&abandoned).await.expect("Consuming should succeed.").is_none());
}

#[tokio::test]
async fn stores_are_usable_as_trait_objects() {
	let store: Arc<dyn LoginStateStore> = Arc::new(MemoryStateStore::default());
	let now = OffsetDateTime::now_utc();
	let pending = state("dyn", now, Duration::minutes(10));

	store.put(pending.clone()).await.expect("Putting a state should succeed.");

	assert_eq!(
		store.consume(&pending.nonce).await.expect("Consuming should succeed."),
		Some(pending)
	);
}
