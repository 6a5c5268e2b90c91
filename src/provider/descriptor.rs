//! Provider descriptor data structures shared by the codec, verifier, and profile fetcher.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// Public Steam OpenID login endpoint.
pub const STEAM_LOGIN_ENDPOINT: &str = "https://steamcommunity.com/openid/login";
/// Public Steam Web API player summaries endpoint.
pub const STEAM_PLAYER_SUMMARIES_ENDPOINT: &str =
	"https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002/";
/// Prefix of every claimed identifier Steam signs.
pub const STEAM_CLAIMED_ID_PREFIX: &str = "https://steamcommunity.com/openid/id/";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// OpenID endpoint receiving both `checkid_setup` and `check_authentication`.
	pub login: Url,
	/// Profile endpoint queried with the API key and SteamID64.
	pub player_summaries: Url,
}

/// Immutable provider descriptor consumed by the adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier reported to the host framework.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Claimed identifiers must be this prefix followed by a SteamID64.
	pub claimed_id_prefix: String,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Descriptor for the public Steam endpoints.
	pub fn steam() -> Result<Self, ProviderDescriptorError> {
		let id = ProviderId::new("steam").map_err(|_| ProviderDescriptorError::InvalidId)?;

		Self::builder(id)
			.login_endpoint(parse_constant(STEAM_LOGIN_ENDPOINT)?)
			.player_summaries_endpoint(parse_constant(STEAM_PLAYER_SUMMARIES_ENDPOINT)?)
			.build()
	}
}

fn parse_constant(value: &'static str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(value).map_err(|_| ProviderDescriptorError::InvalidUrl { url: value.to_owned() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn steam_descriptor_uses_public_endpoints() {
		let descriptor = ProviderDescriptor::steam().expect("Steam descriptor should build.");

		assert_eq!(descriptor.id.as_ref(), "steam");
		assert_eq!(descriptor.endpoints.login.as_str(), STEAM_LOGIN_ENDPOINT);
		assert_eq!(
			descriptor.endpoints.player_summaries.as_str(),
			STEAM_PLAYER_SUMMARIES_ENDPOINT
		);
		assert_eq!(descriptor.claimed_id_prefix, STEAM_CLAIMED_ID_PREFIX);
	}
}
