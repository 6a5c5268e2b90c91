// std
use std::collections::BTreeSet;
// self
use crate::{
	_prelude::*,
	auth::Nonce,
	error::ConfigError,
	openid::{
		IDENTIFIER_SELECT, InboundAssertion, NONCE_PARAM, OPENID_NS, REQUIRED_SIGNED_FIELDS,
		RedirectDescriptor, mode, nonce_from_return_to,
	},
	provider::ProviderDescriptor,
};

/// Encodes outbound login redirects and decodes inbound callbacks.
///
/// The codec holds no per-login state; both operations are pure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssertionCodec {
	login_endpoint: Url,
	realm: Url,
}
impl AssertionCodec {
	/// Creates a codec for `descriptor`'s login endpoint and the given realm.
	pub fn new(descriptor: &ProviderDescriptor, realm: Url) -> Self {
		Self { login_endpoint: descriptor.endpoints.login.clone(), realm }
	}

	/// Realm announced in `openid.realm`.
	pub fn realm(&self) -> &Url {
		&self.realm
	}

	/// Default realm for a return URL: its origin with a `/` path.
	pub fn default_realm(return_url: &Url) -> Result<Url, ConfigError> {
		let origin = return_url.origin();

		if !origin.is_tuple() {
			return Err(ConfigError::InvalidReturnUrl {
				reason: format!("`{return_url}` has no origin"),
			});
		}

		Url::parse(&format!("{}/", origin.ascii_serialization()))
			.map_err(|e| ConfigError::InvalidReturnUrl { reason: e.to_string() })
	}

	/// Checks that `return_url` is usable with `realm` (same origin, path under the realm).
	pub fn validate_return_url(return_url: &Url, realm: &Url) -> Result<(), ConfigError> {
		if return_url.fragment().is_some() {
			return Err(ConfigError::InvalidReturnUrl {
				reason: "fragments are not allowed".into(),
			});
		}
		if return_url.query_pairs().any(|(key, _)| key == NONCE_PARAM) {
			return Err(ConfigError::InvalidReturnUrl {
				reason: format!("the `{NONCE_PARAM}` query parameter is reserved"),
			});
		}
		if return_url.origin() != realm.origin() || !path_within(return_url.path(), realm.path()) {
			return Err(ConfigError::RealmMismatch {
				return_url: return_url.to_string(),
				realm: realm.to_string(),
			});
		}

		Ok(())
	}

	/// Return URL with the nonce appended as the `nonce` query parameter.
	pub fn return_to_for(return_url: &Url, nonce: &Nonce) -> Url {
		let mut return_to = return_url.clone();

		return_to.query_pairs_mut().append_pair(NONCE_PARAM, nonce);

		return_to
	}

	/// Builds the `checkid_setup` redirect for one login attempt.
	pub fn build_redirect(&self, return_url: &Url, nonce: &Nonce) -> RedirectDescriptor {
		let return_to = Self::return_to_for(return_url, nonce);
		let params: Vec<(String, String)> = [
			("openid.ns", OPENID_NS),
			("openid.mode", mode::CHECKID_SETUP),
			("openid.return_to", return_to.as_str()),
			("openid.realm", self.realm.as_str()),
			("openid.identity", IDENTIFIER_SELECT),
			("openid.claimed_id", IDENTIFIER_SELECT),
		]
		.into_iter()
		.map(|(key, value)| (key.to_owned(), value.to_owned()))
		.collect();
		let mut url = self.login_endpoint.clone();

		url.query_pairs_mut().extend_pairs(params.iter());

		RedirectDescriptor { url, nonce: nonce.clone(), return_to, params, expires_at: None }
	}

	/// Validates callback parameters and extracts the positive assertion.
	///
	/// Non-`openid.*` parameters are ignored. Negative modes yield
	/// [`Error::LoginCancelled`]; every other protocol violation yields
	/// [`Error::MalformedAssertion`].
	pub fn parse_callback<I, K, V>(&self, params: I) -> Result<InboundAssertion>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut fields = BTreeMap::new();

		for (key, value) in params {
			let key = key.into();

			if !key.starts_with("openid.") {
				continue;
			}
			if fields.contains_key(&key) {
				return Err(Error::malformed(format!("duplicate parameter `{key}`")));
			}

			fields.insert(key, value.into());
		}

		if required(&fields, "openid.ns")? != OPENID_NS {
			return Err(Error::malformed("unexpected `openid.ns`"));
		}

		match required(&fields, "openid.mode")? {
			mode::ID_RES => {},
			negative @ (mode::CANCEL | mode::SETUP_NEEDED) =>
				return Err(Error::LoginCancelled { mode: negative.to_owned() }),
			mode::ERROR => {
				let detail = fields.get("openid.error").map(String::as_str).unwrap_or("unspecified");

				return Err(Error::malformed(format!("identity service reported `{detail}`")));
			},
			other => return Err(Error::malformed(format!("unexpected mode `{other}`"))),
		}

		let op_endpoint = required(&fields, "openid.op_endpoint")?;

		if Url::parse(op_endpoint).ok().as_ref() != Some(&self.login_endpoint) {
			return Err(Error::malformed("`openid.op_endpoint` is not the configured endpoint"));
		}

		let claimed_id = required(&fields, "openid.claimed_id")?;

		if required(&fields, "openid.identity")? != claimed_id {
			return Err(Error::malformed("`openid.identity` differs from `openid.claimed_id`"));
		}

		for name in ["openid.response_nonce", "openid.assoc_handle", "openid.sig"] {
			required(&fields, name)?;
		}

		let signed: BTreeSet<&str> = required(&fields, "openid.signed")?.split(',').collect();

		if let Some(missing) = REQUIRED_SIGNED_FIELDS.iter().find(|name| !signed.contains(*name)) {
			return Err(Error::malformed(format!("`{missing}` is not covered by the signature")));
		}
		if let Some(absent) = signed.iter().find(|name| !fields.contains_key(&format!("openid.{name}")))
		{
			return Err(Error::malformed(format!("signed field `{absent}` is missing")));
		}

		let return_to = Url::parse(required(&fields, "openid.return_to")?)
			.map_err(|_| Error::malformed("`openid.return_to` is not a URL"))?;
		let nonce = nonce_from_return_to(&return_to)
			.ok_or_else(|| Error::malformed("`openid.return_to` carries no nonce"))
			.and_then(|raw| {
				Nonce::new(raw).map_err(|_| Error::malformed("`openid.return_to` nonce is invalid"))
			})?;

		Ok(InboundAssertion::new(fields, return_to, nonce))
	}
}

fn required<'a>(fields: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str> {
	match fields.get(name) {
		Some(value) if !value.is_empty() => Ok(value),
		_ => Err(Error::malformed(format!("missing `{name}`"))),
	}
}

// The return path must equal the realm path or sit below it on a segment boundary.
fn path_within(path: &str, realm_path: &str) -> bool {
	match path.strip_prefix(realm_path) {
		Some(rest) => realm_path.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
		None => false,
	}
}
