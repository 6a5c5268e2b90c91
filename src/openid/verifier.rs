// crates.io
use oauth2::http::{
	Method, Request,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{SteamId, VerifiedIdentity},
	flows::common::{self, RetryPolicy},
	http::{IdentityHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	openid::{InboundAssertion, OPENID_NS},
	provider::ProviderDescriptor,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Confirms inbound assertions with a direct `check_authentication` request.
///
/// Transport failures are retried per [`RetryPolicy`]; any answer other than
/// `is_valid:true` is final and never retried.
pub struct AssertionVerifier<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	mapper: Arc<M>,
	login_endpoint: Url,
	claimed_id_prefix: String,
	retry: RetryPolicy,
}
impl<C, M> AssertionVerifier<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a verifier for `descriptor`'s login endpoint.
	pub fn new(
		descriptor: &ProviderDescriptor,
		http_client: Arc<C>,
		mapper: Arc<M>,
		retry: RetryPolicy,
	) -> Self {
		Self {
			http_client,
			mapper,
			login_endpoint: descriptor.endpoints.login.clone(),
			claimed_id_prefix: descriptor.claimed_id_prefix.clone(),
			retry,
		}
	}

	/// Replays `assertion` to the service and returns the confirmed identity.
	pub async fn verify(&self, assertion: &InboundAssertion) -> Result<VerifiedIdentity> {
		const KIND: FlowKind = FlowKind::Verification;

		let span = FlowSpan::new(KIND, "check_authentication");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.verify_inner(assertion)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn verify_inner(&self, assertion: &InboundAssertion) -> Result<VerifiedIdentity> {
		// Reject unusable identifiers before spending a round trip on them.
		let steam_id = extract_steam_id(assertion.claimed_id(), &self.claimed_id_prefix)?;
		let body = url::form_urlencoded::Serializer::new(String::new())
			.extend_pairs(assertion.check_authentication_form())
			.finish();
		let response = common::send_with_retry(
			self.http_client.as_ref(),
			self.mapper.as_ref(),
			&self.retry,
			"check_authentication",
			|| {
				Request::builder()
					.method(Method::POST)
					.uri(self.login_endpoint.as_str())
					.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
					.header(ACCEPT, "text/plain")
					.body(body.clone().into_bytes())
			},
		)
		.await
		.map_err(|e| Error::VerificationUnreachable { attempts: e.attempts, source: e.source })?;
		let text = String::from_utf8_lossy(response.body());
		let answer = parse_key_values(&text);

		if let Some(ns) = answer.get("ns").filter(|ns| *ns != OPENID_NS) {
			return Err(Error::VerificationRejected {
				reason: format!("unexpected namespace `{ns}`"),
			});
		}

		match answer.get("is_valid").map(String::as_str) {
			Some("true") => Ok(VerifiedIdentity::new(
				steam_id,
				assertion.claimed_id().to_owned(),
				OffsetDateTime::now_utc(),
			)),
			Some(other) => Err(Error::VerificationRejected { reason: format!("is_valid:{other}") }),
			None => Err(Error::VerificationRejected {
				reason: "answer carried no `is_valid` line".into(),
			}),
		}
	}
}
impl<C, M> Clone for AssertionVerifier<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			mapper: Arc::clone(&self.mapper),
			login_endpoint: self.login_endpoint.clone(),
			claimed_id_prefix: self.claimed_id_prefix.clone(),
			retry: self.retry.clone(),
		}
	}
}
impl<C, M> Debug for AssertionVerifier<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AssertionVerifier")
			.field("login_endpoint", &self.login_endpoint.as_str())
			.field("retry", &self.retry)
			.finish()
	}
}

/// Extracts the SteamID64 from a claimed identifier of the form `<prefix><17 digits>`.
pub fn extract_steam_id(claimed_id: &str, prefix: &str) -> Result<SteamId> {
	let digits = claimed_id
		.strip_prefix(prefix)
		.ok_or_else(|| Error::malformed("claimed identifier is not a Steam account URL"))?;

	SteamId::parse(digits).map_err(|e| Error::malformed(e.to_string()))
}

/// Parses an OpenID key-value form body (`key:value` per line).
///
/// Lines without a colon are skipped; the first occurrence of a key wins.
pub fn parse_key_values(body: &str) -> BTreeMap<String, String> {
	let mut out = BTreeMap::new();

	for line in body.lines() {
		let Some((key, value)) = line.split_once(':') else { continue };

		out.entry(key.trim().to_owned()).or_insert_with(|| value.trim().to_owned());
	}

	out
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::STEAM_CLAIMED_ID_PREFIX;

	#[test]
	fn key_values_are_parsed_line_by_line() {
		let parsed = parse_key_values(
			"ns:http://specs.openid.net/auth/2.0\nis_valid:true\r\ngarbage\nis_valid:false\n",
		);

		assert_eq!(parsed.get("ns").map(String::as_str), Some(OPENID_NS));
		assert_eq!(parsed.get("is_valid").map(String::as_str), Some("true"));
		assert_eq!(parsed.len(), 2);
	}

	#[test]
	fn steam_id_requires_exact_prefix_and_digits() {
		let id = extract_steam_id(
			"https://steamcommunity.com/openid/id/76561198000000000",
			STEAM_CLAIMED_ID_PREFIX,
		)
		.expect("Canonical claimed id should yield a SteamID64.");

		assert_eq!(id.as_u64(), 76_561_198_000_000_000);

		for bad in [
			"https://evil.example/openid/id/76561198000000000",
			"http://steamcommunity.com/openid/id/76561198000000000",
			"https://steamcommunity.com/openid/id/7656119800000000",
			"https://steamcommunity.com/openid/id/76561198000000000/",
			"https://steamcommunity.com/openid/id/",
		] {
			let err = extract_steam_id(bad, STEAM_CLAIMED_ID_PREFIX)
				.expect_err("Non-canonical claimed id should be rejected.");

			assert!(matches!(err, Error::MalformedAssertion { .. }), "{bad} gave {err:?}");
		}
	}
}
