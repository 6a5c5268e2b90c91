// self
use crate::{_prelude::*, auth::Nonce};

/// Outbound login redirect produced by [`AssertionCodec::build_redirect`](super::AssertionCodec::build_redirect).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedirectDescriptor {
	/// Fully-formed login URL the browser should be sent to.
	pub url: Url,
	/// Nonce bound to this login attempt.
	pub nonce: Nonce,
	/// `openid.return_to` value embedding the nonce.
	pub return_to: Url,
	/// OpenID parameters in the order they were appended to [`RedirectDescriptor::url`].
	pub params: Vec<(String, String)>,
	/// Instant the pending login state expires, once persisted by the adapter.
	#[serde(with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl RedirectDescriptor {
	/// Looks up a single OpenID parameter by its full name (`openid.mode`, ...).
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
	}
}
