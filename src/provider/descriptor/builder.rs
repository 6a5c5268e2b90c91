// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{ProviderDescriptor, ProviderEndpoints, STEAM_CLAIMED_ID_PREFIX},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// The OpenID login endpoint is mandatory.
	#[error("Missing login endpoint.")]
	MissingLoginEndpoint,
	/// The player summaries endpoint is mandatory.
	#[error("Missing player summaries endpoint.")]
	MissingPlayerSummariesEndpoint,
	/// Endpoints must use HTTPS outside loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Claimed-identifier prefix must be an absolute HTTPS URL ending in `/`.
	#[error("Claimed identifier prefix `{prefix}` must be an HTTPS URL ending in `/`.")]
	InvalidClaimedIdPrefix {
		/// Rejected prefix.
		prefix: String,
	},
	/// A built-in URL failed to parse.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL.
		url: String,
	},
	/// A built-in identifier failed validation.
	#[error("Provider identifier is invalid.")]
	InvalidId,
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// OpenID login endpoint.
	pub login_endpoint: Option<Url>,
	/// Player summaries endpoint.
	pub player_summaries_endpoint: Option<Url>,
	/// Claimed-identifier prefix (defaults to Steam's).
	pub claimed_id_prefix: String,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			login_endpoint: None,
			player_summaries_endpoint: None,
			claimed_id_prefix: STEAM_CLAIMED_ID_PREFIX.into(),
		}
	}

	/// Sets the OpenID login endpoint.
	pub fn login_endpoint(mut self, url: Url) -> Self {
		self.login_endpoint = Some(url);

		self
	}

	/// Sets the player summaries endpoint.
	pub fn player_summaries_endpoint(mut self, url: Url) -> Self {
		self.player_summaries_endpoint = Some(url);

		self
	}

	/// Overrides the claimed-identifier prefix.
	pub fn claimed_id_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.claimed_id_prefix = prefix.into();

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let login = self.login_endpoint.ok_or(ProviderDescriptorError::MissingLoginEndpoint)?;
		let player_summaries = self
			.player_summaries_endpoint
			.ok_or(ProviderDescriptorError::MissingPlayerSummariesEndpoint)?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			endpoints: ProviderEndpoints { login, player_summaries },
			claimed_id_prefix: self.claimed_id_prefix,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("login", &self.endpoints.login)?;
		validate_endpoint("player_summaries", &self.endpoints.player_summaries)?;

		let prefix_ok = self.claimed_id_prefix.ends_with('/')
			&& Url::parse(&self.claimed_id_prefix).is_ok_and(|url| url.scheme() == "https");

		if !prefix_ok {
			return Err(ProviderDescriptorError::InvalidClaimedIdPrefix {
				prefix: self.claimed_id_prefix.clone(),
			});
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
