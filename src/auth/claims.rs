//! Normalized claims handed to the host session framework.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, SteamId, VerifiedIdentity},
};

/// Claim names the adapter always sets and enrichment can never override.
pub const RESERVED_CLAIMS: [&str; 3] = ["provider", "external_id", "verified_at"];

/// Free-form claim map produced by enrichment hooks.
pub type ClaimMap = BTreeMap<String, serde_json::Value>;

/// Outcome of the optional profile lookup for a completed login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProfileStatus {
	/// Player summary was fetched and offered to the enrichment hook.
	Fetched,
	/// No API key is configured, so no lookup was attempted.
	Skipped,
	/// The lookup failed; login proceeded with what was available.
	Unavailable {
		/// Failure summary.
		reason: String,
	},
}

/// Identity claims for one completed login.
///
/// Always carries the provider and the SteamID64; everything else comes from enrichment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedClaims {
	provider: ProviderId,
	external_id: SteamId,
	#[serde(with = "time::serde::rfc3339")]
	verified_at: OffsetDateTime,
	#[serde(flatten)]
	extra: ClaimMap,
	#[serde(skip)]
	profile: ProfileStatus,
}
impl NormalizedClaims {
	pub(crate) fn new(provider: ProviderId, identity: &VerifiedIdentity) -> Self {
		Self {
			provider,
			external_id: identity.steam_id(),
			verified_at: identity.verified_at(),
			extra: ClaimMap::new(),
			profile: ProfileStatus::Skipped,
		}
	}

	/// Merges hook output, skipping reserved claim names. Returns the skipped names.
	pub(crate) fn merge(&mut self, claims: ClaimMap) -> Vec<String> {
		let mut skipped = Vec::new();

		for (name, value) in claims {
			if RESERVED_CLAIMS.contains(&name.as_str()) {
				skipped.push(name);

				continue;
			}

			self.extra.insert(name, value);
		}

		skipped
	}

	pub(crate) fn set_profile_status(&mut self, status: ProfileStatus) {
		self.profile = status;
	}

	/// Provider the claims were issued for.
	pub fn provider(&self) -> &ProviderId {
		&self.provider
	}

	/// Stable external identifier.
	pub fn external_id(&self) -> SteamId {
		self.external_id
	}

	/// Instant the assertion was confirmed.
	pub fn verified_at(&self) -> OffsetDateTime {
		self.verified_at
	}

	/// What happened to the profile lookup.
	pub fn profile_status(&self) -> &ProfileStatus {
		&self.profile
	}

	/// Looks up a single claim, including the reserved ones.
	pub fn get(&self, name: &str) -> Option<serde_json::Value> {
		match name {
			"provider" => Some(self.provider.to_string().into()),
			"external_id" => Some(self.external_id.to_string().into()),
			"verified_at" => self.verified_at_rfc3339().map(Into::into),
			_ => self.extra.get(name).cloned(),
		}
	}

	/// Claims added by enrichment.
	pub fn extra(&self) -> &ClaimMap {
		&self.extra
	}

	/// Flattens everything into one claim-name to value mapping.
	pub fn to_map(&self) -> ClaimMap {
		let mut map = self.extra.clone();

		map.insert("provider".into(), self.provider.to_string().into());
		map.insert("external_id".into(), self.external_id.to_string().into());

		if let Some(verified_at) = self.verified_at_rfc3339() {
			map.insert("verified_at".into(), verified_at.into());
		}

		map
	}

	fn verified_at_rfc3339(&self) -> Option<String> {
		self.verified_at.format(&time::format_description::well_known::Rfc3339).ok()
	}
}
