//! Player summary lookup against the Steam Web API.
//!
//! The API key travels only as the `key` query parameter; it never appears in errors,
//! spans, or `Debug` output.

// crates.io
use oauth2::http::{Method, Request, header::ACCEPT};
// self
use crate::{
	_prelude::*,
	auth::{ApiKey, Profile, SteamId},
	flows::common::{self, RetryPolicy},
	http::{IdentityHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
};

/// Fetches player summaries for verified accounts.
pub struct ProfileFetcher<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	mapper: Arc<M>,
	endpoint: Url,
	api_key: ApiKey,
	retry: RetryPolicy,
}
impl<C, M> ProfileFetcher<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a fetcher for `descriptor`'s player summaries endpoint.
	pub fn new(
		descriptor: &ProviderDescriptor,
		api_key: ApiKey,
		http_client: Arc<C>,
		mapper: Arc<M>,
		retry: RetryPolicy,
	) -> Self {
		Self {
			http_client,
			mapper,
			endpoint: descriptor.endpoints.player_summaries.clone(),
			api_key,
			retry,
		}
	}

	/// Fetches the summary for `steam_id`.
	///
	/// Transport failures, non-2xx answers, undecodable bodies, and an empty player list all
	/// yield [`Error::ProfileUnavailable`].
	pub async fn fetch(&self, steam_id: SteamId) -> Result<Profile> {
		const KIND: FlowKind = FlowKind::ProfileFetch;

		let span = FlowSpan::new(KIND, "player_summaries");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.fetch_inner(steam_id)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn fetch_inner(&self, steam_id: SteamId) -> Result<Profile> {
		let url = self.request_url(steam_id);
		let response = common::send_with_retry(
			self.http_client.as_ref(),
			self.mapper.as_ref(),
			&self.retry,
			"player_summaries",
			|| {
				Request::builder()
					.method(Method::GET)
					.uri(url.as_str())
					.header(ACCEPT, "application/json")
					.body(Vec::new())
			},
		)
		.await
		.map_err(|e| Error::ProfileUnavailable {
			reason: format!("player summaries unreachable after {} attempt(s)", e.attempts),
			source: Some(e.source),
		})?;

		parse_player_summaries(response.body(), steam_id)
	}

	fn request_url(&self, steam_id: SteamId) -> Url {
		let mut url = self.endpoint.clone();

		url.query_pairs_mut()
			.append_pair("key", self.api_key.expose())
			.append_pair("steamids", &steam_id.to_string());

		url
	}
}
impl<C, M> Debug for ProfileFetcher<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProfileFetcher")
			.field("endpoint", &self.endpoint.as_str())
			.field("api_key", &self.api_key)
			.field("retry", &self.retry)
			.finish()
	}
}

#[derive(Deserialize)]
struct SummariesEnvelope {
	response: SummariesBody,
}

#[derive(Deserialize)]
struct SummariesBody {
	#[serde(default)]
	players: Vec<Profile>,
}

/// Decodes a `GetPlayerSummaries` body and picks the entry for `steam_id`.
pub fn parse_player_summaries(body: &[u8], steam_id: SteamId) -> Result<Profile> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let envelope: SummariesEnvelope = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| Error::ProfileUnavailable {
			reason: format!("undecodable player summaries at `{}`", e.path()),
			source: None,
		})?;

	envelope.response.players.into_iter().find(|player| player.steam_id == steam_id).ok_or_else(
		|| Error::ProfileUnavailable {
			reason: format!("no player summary for {steam_id}"),
			source: None,
		},
	)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn steam_id() -> SteamId {
		SteamId::parse("76561198000000000").expect("SteamID64 fixture should parse.")
	}

	#[test]
	fn matching_player_is_selected() {
		let body = br#"{"response":{"players":[
			{"steamid":"76561198000000001","personaname":"other"},
			{"steamid":"76561198000000000","personaname":"gaben"}
		]}}"#;
		let profile =
			parse_player_summaries(body, steam_id()).expect("Matching player should be found.");

		assert_eq!(profile.persona_name, "gaben");
	}

	#[test]
	fn empty_player_list_is_unavailable() {
		let err = parse_player_summaries(br#"{"response":{"players":[]}}"#, steam_id())
			.expect_err("Empty list should not yield a profile.");

		assert!(matches!(err, Error::ProfileUnavailable { source: None, .. }));
	}

	#[test]
	fn decode_errors_report_the_path() {
		let err = parse_player_summaries(
			br#"{"response":{"players":[{"steamid":"76561198000000000","personaname":7}]}}"#,
			steam_id(),
		)
		.expect_err("Wrong field type should fail to decode.");

		match err {
			Error::ProfileUnavailable { reason, .. } => assert!(reason.contains("players")),
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
