//! Player summary returned by `ISteamUser/GetPlayerSummaries`.

// self
use crate::{_prelude::*, auth::SteamId};

/// Public profile visibility as reported by `communityvisibilitystate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ProfileVisibility {
	/// Only the owner can see the profile (`1`).
	Private,
	/// Visible to friends only (`2`).
	FriendsOnly,
	/// Publicly visible (`3`).
	Public,
	/// Value this crate does not know about.
	Other(u8),
}
impl From<u8> for ProfileVisibility {
	fn from(value: u8) -> Self {
		match value {
			1 => Self::Private,
			2 => Self::FriendsOnly,
			3 => Self::Public,
			other => Self::Other(other),
		}
	}
}
impl From<ProfileVisibility> for u8 {
	fn from(value: ProfileVisibility) -> Self {
		match value {
			ProfileVisibility::Private => 1,
			ProfileVisibility::FriendsOnly => 2,
			ProfileVisibility::Public => 3,
			ProfileVisibility::Other(other) => other,
		}
	}
}

/// Profile attributes for a single Steam account.
///
/// Fields Steam returns but this struct does not model are kept in [`Profile::extra`] so
/// enrichment hooks can still reach them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	/// SteamID64 the summary belongs to.
	#[serde(rename = "steamid")]
	pub steam_id: SteamId,
	/// Display name.
	#[serde(rename = "personaname")]
	pub persona_name: String,
	/// Community profile URL.
	#[serde(rename = "profileurl", default)]
	pub profile_url: Option<String>,
	/// 32x32 avatar URL.
	#[serde(default)]
	pub avatar: Option<String>,
	/// 64x64 avatar URL.
	#[serde(rename = "avatarmedium", default)]
	pub avatar_medium: Option<String>,
	/// 184x184 avatar URL.
	#[serde(rename = "avatarfull", default)]
	pub avatar_full: Option<String>,
	/// Real name, when the user made it public.
	#[serde(rename = "realname", default)]
	pub real_name: Option<String>,
	/// ISO country code, when the user made it public.
	#[serde(rename = "loccountrycode", default)]
	pub country_code: Option<String>,
	/// Profile visibility.
	#[serde(rename = "communityvisibilitystate", default)]
	pub visibility: Option<ProfileVisibility>,
	/// Remaining fields exactly as returned.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn summary_payload_deserializes_with_extras() {
		let payload = r#"{
			"steamid": "76561198000000000",
			"communityvisibilitystate": 3,
			"profilestate": 1,
			"personaname": "gaben",
			"profileurl": "https://steamcommunity.com/id/gaben/",
			"avatarfull": "https://avatars.example/full.jpg",
			"timecreated": 1063407589
		}"#;
		let profile: Profile =
			serde_json::from_str(payload).expect("Player summary fixture should deserialize.");

		assert_eq!(profile.steam_id.to_string(), "76561198000000000");
		assert_eq!(profile.persona_name, "gaben");
		assert_eq!(profile.visibility, Some(ProfileVisibility::Public));
		assert_eq!(profile.avatar_full.as_deref(), Some("https://avatars.example/full.jpg"));
		assert!(profile.real_name.is_none());
		assert_eq!(profile.extra.get("timecreated"), Some(&serde_json::json!(1063407589)));
		assert_eq!(profile.extra.get("profilestate"), Some(&serde_json::json!(1)));
	}
}
