//! Storage contract and built-in store for one-time login states.

pub mod memory;

pub use memory::MemoryStateStore;

// self
use crate::{_prelude::*, auth::Nonce};

/// Future returned by [`LoginStateStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value contract for pending login states, keyed by nonce.
///
/// `consume` must be atomic: under concurrent callers presenting the same nonce, at most one
/// may receive the state. Expired entries may be returned by `consume` (the adapter checks
/// [`LoginRequestState::is_expired_at`]) but must eventually be discarded even if never
/// consumed.
pub trait LoginStateStore
where
	Self: Send + Sync,
{
	/// Persists a state until `state.expires_at`.
	fn put(&self, state: LoginRequestState) -> StoreFuture<'_, ()>;

	/// Removes and returns the state for `nonce`, if present.
	fn consume<'a>(&'a self, nonce: &'a Nonce) -> StoreFuture<'a, Option<LoginRequestState>>;

	/// Drops every state that expired at or before `now`, returning how many were removed.
	fn purge_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, usize>;
}

/// Pending login attempt created by `begin_login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequestState {
	/// Anti-replay value embedded in the return URL.
	pub nonce: Nonce,
	/// Full `openid.return_to` value sent to the identity service.
	pub return_to: Url,
	/// Host session the login is bound to, if the host supplied one.
	pub binding: Option<String>,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Instant after which the state is no longer accepted.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl LoginRequestState {
	/// Returns `true` once `now` reaches the expiry instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

/// Error type produced by [`LoginStateStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_adapter_error_with_source() {
		let store_error = StoreError::Backend { message: "cache unreachable".into() };
		let adapter_error: Error = store_error.clone().into();

		assert!(matches!(adapter_error, Error::Storage(_)));
		assert!(adapter_error.to_string().contains("cache unreachable"));

		let source = StdError::source(&adapter_error)
			.expect("Adapter error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn expiry_is_inclusive() {
		let created_at = time::macros::datetime!(2026-03-01 10:00 UTC);
		let state = LoginRequestState {
			nonce: Nonce::new("n1").expect("Nonce fixture should be valid."),
			return_to: Url::parse("https://app.example/cb?nonce=n1")
				.expect("Return URL fixture should parse."),
			binding: None,
			created_at,
			expires_at: created_at + Duration::minutes(10),
		};

		assert!(!state.is_expired_at(created_at + Duration::minutes(9)));
		assert!(state.is_expired_at(created_at + Duration::minutes(10)));
	}
}
