//! Verified identity produced by the assertion verifier.

// self
use crate::{_prelude::*, auth::SteamId};

/// Steam account confirmed by a positive `check_authentication` answer.
///
/// Only [`AssertionVerifier`](crate::openid::AssertionVerifier) can construct values of this
/// type, so holding one proves the service vouched for the identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedIdentity {
	steam_id: SteamId,
	claimed_id: String,
	#[serde(with = "time::serde::rfc3339")]
	verified_at: OffsetDateTime,
}
impl VerifiedIdentity {
	pub(crate) fn new(steam_id: SteamId, claimed_id: String, verified_at: OffsetDateTime) -> Self {
		Self { steam_id, claimed_id, verified_at }
	}

	/// Stable external identifier.
	pub fn steam_id(&self) -> SteamId {
		self.steam_id
	}

	/// Claimed-identifier URL exactly as Steam signed it.
	pub fn claimed_id(&self) -> &str {
		&self.claimed_id
	}

	/// Instant the service confirmed the assertion.
	pub fn verified_at(&self) -> OffsetDateTime {
		self.verified_at
	}
}
