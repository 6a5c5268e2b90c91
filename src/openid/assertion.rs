// self
use crate::{
	_prelude::*,
	auth::Nonce,
	openid::{NONCE_PARAM, mode},
};

/// Positive OpenID assertion exactly as received on the callback.
///
/// Values are immutable once parsed; [`InboundAssertion::check_authentication_form`] replays
/// them verbatim with only `openid.mode` swapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundAssertion {
	fields: BTreeMap<String, String>,
	return_to: Url,
	nonce: Nonce,
}
impl InboundAssertion {
	pub(super) fn new(fields: BTreeMap<String, String>, return_to: Url, nonce: Nonce) -> Self {
		Self { fields, return_to, nonce }
	}

	/// Returns a received `openid.*` field by full name.
	pub fn field(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}

	/// Every `openid.*` field as received.
	pub fn fields(&self) -> &BTreeMap<String, String> {
		&self.fields
	}

	/// Claimed identifier URL (`openid.claimed_id`).
	pub fn claimed_id(&self) -> &str {
		self.field("openid.claimed_id").unwrap_or_default()
	}

	/// Signed `openid.return_to`.
	pub fn return_to(&self) -> &Url {
		&self.return_to
	}

	/// Nonce embedded in the signed return URL.
	pub fn nonce(&self) -> &Nonce {
		&self.nonce
	}

	/// Form body for the `check_authentication` request.
	pub fn check_authentication_form(&self) -> Vec<(String, String)> {
		self.fields
			.iter()
			.map(|(key, value)| {
				if key == "openid.mode" {
					(key.clone(), mode::CHECK_AUTHENTICATION.to_owned())
				} else {
					(key.clone(), value.clone())
				}
			})
			.collect()
	}
}

/// Splits a raw callback query string into decoded pairs, keeping duplicates.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
	url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()).into_owned().collect()
}

/// Reads the `nonce` query parameter embedded in a return URL.
pub fn nonce_from_return_to(return_to: &Url) -> Option<String> {
	return_to
		.query_pairs()
		.find(|(key, _)| key == NONCE_PARAM)
		.map(|(_, value)| value.into_owned())
}
