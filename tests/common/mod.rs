//! Fixtures shared by the integration suites.

#![allow(dead_code, unused_imports)]

pub use std::{
	collections::BTreeMap,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::Arc,
};

pub use parking_lot::Mutex;
pub use steam_openid_adapter::{
	auth::{ApiKey, Nonce, ProviderId},
	error::{BoxError, Error, Result},
	flows::{AdapterSettings, RetryPolicy},
	openid::OPENID_NS,
	provider::{ProviderDescriptor, STEAM_CLAIMED_ID_PREFIX},
	store::{LoginRequestState, LoginStateStore, MemoryStateStore},
};
pub use time::{Duration, OffsetDateTime};
pub use url::Url;

pub const STEAM_ID: &str = "76561198000000000";
pub const API_KEY: &str = "TESTKEY0123456789";
pub const LOGIN_PATH: &str = "/openid/login";
pub const SUMMARIES_PATH: &str = "/ISteamUser/GetPlayerSummaries/v0002/";
pub const RETURN_URL: &str = "https://app.example/cb";
pub const VALID_ANSWER: &str = "ns:http://specs.openid.net/auth/2.0\nis_valid:true\n";
pub const INVALID_ANSWER: &str = "ns:http://specs.openid.net/auth/2.0\nis_valid:false\n";

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("URL fixture should parse.")
}

pub fn claimed_id() -> String {
	format!("{STEAM_CLAIMED_ID_PREFIX}{STEAM_ID}")
}

/// Descriptor whose endpoints live on `base` (an httpmock server URL or the public Steam host).
pub fn descriptor_at(base: &str) -> ProviderDescriptor {
	let id = ProviderId::new("steam").expect("Provider identifier fixture should be valid.");

	ProviderDescriptor::builder(id)
		.login_endpoint(url(&format!("{base}{LOGIN_PATH}")))
		.player_summaries_endpoint(url(&format!("{base}{SUMMARIES_PATH}")))
		.build()
		.expect("Descriptor fixture should build.")
}

/// Retry policy small enough to keep retry scenarios fast.
pub fn fast_retry() -> RetryPolicy {
	RetryPolicy::default()
		.with_max_attempts(3)
		.with_request_timeout(Duration::milliseconds(200))
		.with_backoff(Duration::milliseconds(5), Duration::milliseconds(20))
}

pub fn settings() -> AdapterSettings {
	AdapterSettings::new(url(RETURN_URL)).with_retry(fast_retry())
}

/// Callback Steam would send for a positive assertion about [`STEAM_ID`].
pub fn positive_callback(descriptor: &ProviderDescriptor, return_to: &Url) -> Vec<(String, String)> {
	let claimed = claimed_id();
	let mut params: Vec<(String, String)> = return_to.query_pairs().into_owned().collect();

	params.extend(
		[
			("openid.ns", OPENID_NS),
			("openid.mode", "id_res"),
			("openid.op_endpoint", descriptor.endpoints.login.as_str()),
			("openid.claimed_id", claimed.as_str()),
			("openid.identity", claimed.as_str()),
			("openid.return_to", return_to.as_str()),
			("openid.response_nonce", "2026-10-18T08:00:00Z0123456789abcdef"),
			("openid.assoc_handle", "1234567890"),
			(
				"openid.signed",
				"signed,op_endpoint,claimed_id,identity,return_to,response_nonce,assoc_handle",
			),
			("openid.sig", "W0u5DRbtHE1GG0ZKXjerUZDUGmc="),
		]
		.into_iter()
		.map(|(key, value)| (key.to_owned(), value.to_owned())),
	);

	params
}

/// Callback Steam sends when the user backs out.
pub fn cancel_callback(return_to: &Url) -> Vec<(String, String)> {
	let mut params: Vec<(String, String)> = return_to.query_pairs().into_owned().collect();

	params.push(("openid.ns".into(), OPENID_NS.into()));
	params.push(("openid.mode".into(), "cancel".into()));

	params
}

pub fn summaries_body() -> String {
	serde_json::json!({
		"response": {
			"players": [{
				"steamid": STEAM_ID,
				"communityvisibilitystate": 3,
				"profilestate": 1,
				"personaname": "gaben",
				"profileurl": "https://steamcommunity.com/id/gaben/",
				"avatar": "https://avatars.example/small.jpg",
				"avatarmedium": "https://avatars.example/medium.jpg",
				"avatarfull": "https://avatars.example/full.jpg"
			}]
		}
	})
	.to_string()
}

/// Persists a pending state for `nonce` directly, bypassing `begin_login`.
pub async fn seed_state(
	store: &MemoryStateStore,
	nonce: &str,
	ttl: Duration,
	binding: Option<&str>,
) -> LoginRequestState {
	let nonce = Nonce::new(nonce).expect("Nonce fixture should be valid.");
	let mut return_to = url(RETURN_URL);

	return_to.query_pairs_mut().append_pair("nonce", &nonce);

	let created_at = OffsetDateTime::now_utc();
	let state = LoginRequestState {
		nonce,
		return_to,
		binding: binding.map(str::to_owned),
		created_at,
		expires_at: created_at + ttl,
	};

	store.put(state.clone()).await.expect("Seeding the state store should succeed.");

	state
}
