//! Login orchestration behind the host capability contract.
//!
//! [`SteamAdapter`] owns the codec, verifier, optional profile fetcher, enrichment hook, and
//! state store so a host only has to call [`SteamAdapter::begin_login`] and
//! [`SteamAdapter::handle_callback`]. The same pair is exposed as the object-safe
//! [`IdentityProvider`] trait for frameworks that hold providers behind `dyn`.

pub mod common;

mod callback;
mod login;
mod metrics;
mod phase;

pub use common::*;
pub use metrics::LoginMetrics;
pub use phase::*;

// self
use crate::{
	_prelude::*,
	auth::{ApiKey, NormalizedClaims, ProviderId},
	error::ConfigError,
	ext::{EnrichmentHook, ProfileMerge},
	http::{IdentityHttpClient, TransportErrorMapper},
	openid::{AssertionCodec, AssertionVerifier, RedirectDescriptor, parse_query},
	profile::ProfileFetcher,
	provider::ProviderDescriptor,
	store::LoginStateStore,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Adapter specialized for the crate's default reqwest transport stack.
pub type ReqwestAdapter = SteamAdapter<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Boxed future returned by [`IdentityProvider`] operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Capability contract a generic host session framework expects from an identity provider.
pub trait IdentityProvider
where
	Self: Send + Sync,
{
	/// Identifier the provider is registered under.
	fn id(&self) -> &ProviderId;

	/// Starts a login and returns where to send the browser.
	fn begin_login(&self, context: LoginContext) -> ProviderFuture<'_, RedirectDescriptor>;

	/// Completes a login from the callback parameters.
	fn handle_callback(&self, request: CallbackRequest) -> ProviderFuture<'_, NormalizedClaims>;
}

/// What happens when the player summary cannot be fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilePolicy {
	/// Complete the login and report [`ProfileStatus::Unavailable`](crate::auth::ProfileStatus).
	#[default]
	Optional,
	/// Abort the login with [`Error::ProfileUnavailable`].
	Required,
}

/// What happens when the enrichment hook fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentFailurePolicy {
	/// Abort the login with [`Error::EnrichmentFailed`].
	#[default]
	Abort,
	/// Log the failure and return the base claims.
	ProceedWithBaseClaims,
}

/// Host-facing adapter configuration.
///
/// ```
/// # use steam_openid_adapter::flows::AdapterSettings;
/// let settings: AdapterSettings = serde_json::from_str(
/// 	r#"{"return_url":"https://app.example/cb","state_ttl_ms":300000}"#,
/// )
/// .unwrap();
///
/// assert_eq!(settings.state_ttl.whole_minutes(), 5);
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct AdapterSettings {
	/// Callback URL Steam redirects back to. The nonce is appended as a query parameter.
	pub return_url: Url,
	/// Realm announced to Steam; defaults to the return URL's origin.
	#[serde(default)]
	pub realm: Option<Url>,
	/// Steam Web API key. Player summaries are skipped when unset.
	#[serde(default)]
	pub api_key: Option<ApiKey>,
	/// Lifetime of a pending login state.
	#[serde(rename = "state_ttl_ms", with = "common::duration_ms", default = "default_state_ttl")]
	pub state_ttl: Duration,
	/// Timeout and retry budget for outbound calls.
	#[serde(default)]
	pub retry: RetryPolicy,
	/// Player summary failure handling.
	#[serde(default)]
	pub profile_policy: ProfilePolicy,
	/// Enrichment hook failure handling.
	#[serde(default)]
	pub enrichment_failure: EnrichmentFailurePolicy,
}
impl AdapterSettings {
	/// Settings with defaults for everything but the return URL.
	pub fn new(return_url: Url) -> Self {
		Self {
			return_url,
			realm: None,
			api_key: None,
			state_ttl: default_state_ttl(),
			retry: RetryPolicy::default(),
			profile_policy: ProfilePolicy::default(),
			enrichment_failure: EnrichmentFailurePolicy::default(),
		}
	}

	/// Sets the realm.
	pub fn with_realm(mut self, realm: Url) -> Self {
		self.realm = Some(realm);

		self
	}

	/// Sets the Web API key, enabling player summaries.
	pub fn with_api_key(mut self, api_key: ApiKey) -> Self {
		self.api_key = Some(api_key);

		self
	}

	/// Sets the pending state lifetime.
	pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
		self.state_ttl = ttl;

		self
	}

	/// Sets the retry policy.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Sets the profile failure policy.
	pub fn with_profile_policy(mut self, policy: ProfilePolicy) -> Self {
		self.profile_policy = policy;

		self
	}

	/// Sets the enrichment failure policy.
	pub fn with_enrichment_failure(mut self, policy: EnrichmentFailurePolicy) -> Self {
		self.enrichment_failure = policy;

		self
	}

	/// Validates the settings and resolves the effective realm.
	pub fn resolve_realm(&self) -> Result<Url, ConfigError> {
		if !matches!(self.return_url.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidReturnUrl {
				reason: format!("unsupported scheme `{}`", self.return_url.scheme()),
			});
		}
		if !self.state_ttl.is_positive() {
			return Err(ConfigError::NonPositiveStateTtl);
		}

		self.retry.validate()?;

		let realm = match &self.realm {
			Some(realm) => realm.clone(),
			None => AssertionCodec::default_realm(&self.return_url)?,
		};

		AssertionCodec::validate_return_url(&self.return_url, &realm)?;

		Ok(realm)
	}
}

fn default_state_ttl() -> Duration {
	Duration::minutes(10)
}

/// Host context for [`SteamAdapter::begin_login`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginContext {
	/// Opaque host session identifier the callback must present again.
	pub binding: Option<String>,
}
impl LoginContext {
	/// Context without a session binding.
	pub fn new() -> Self {
		Self::default()
	}

	/// Binds the login to a host session.
	pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
		self.binding = Some(binding.into());

		self
	}
}

/// Host context for [`SteamAdapter::handle_callback`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackRequest {
	/// Decoded callback query parameters, duplicates preserved.
	pub params: Vec<(String, String)>,
	/// Host session presenting the callback.
	pub binding: Option<String>,
}
impl CallbackRequest {
	/// Builds a request from already decoded pairs.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			params: pairs.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
			binding: None,
		}
	}

	/// Builds a request from a raw query string (a leading `?` is ignored).
	pub fn from_query(query: &str) -> Self {
		Self { params: parse_query(query), binding: None }
	}

	/// Attaches the host session presenting the callback.
	pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
		self.binding = Some(binding.into());

		self
	}
}

/// Steam OpenID identity provider.
///
/// Holds no per-login state apart from the [`LoginStateStore`]; clone it freely.
pub struct SteamAdapter<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Provider descriptor that defines the Steam endpoints.
	pub descriptor: ProviderDescriptor,
	/// Store holding pending login states.
	pub store: Arc<dyn LoginStateStore>,
	/// Shared counters for login outcomes.
	pub login_metrics: Arc<LoginMetrics>,
	codec: AssertionCodec,
	verifier: AssertionVerifier<C, M>,
	profiles: Option<Arc<ProfileFetcher<C, M>>>,
	enrichment: Arc<dyn EnrichmentHook>,
	return_url: Url,
	state_ttl: Duration,
	profile_policy: ProfilePolicy,
	enrichment_failure: EnrichmentFailurePolicy,
}
impl<C, M> SteamAdapter<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an adapter that reuses the caller-provided transport + mapper pair.
	///
	/// The enrichment hook defaults to [`ProfileMerge`].
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		settings: AdapterSettings,
		store: Arc<dyn LoginStateStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self, ConfigError> {
		let realm = settings.resolve_realm()?;
		let http_client = http_client.into();
		let mapper = mapper.into();
		let verifier = AssertionVerifier::new(
			&descriptor,
			Arc::clone(&http_client),
			Arc::clone(&mapper),
			settings.retry.clone(),
		);
		let profiles = settings.api_key.map(|api_key| {
			Arc::new(ProfileFetcher::new(
				&descriptor,
				api_key,
				http_client,
				mapper,
				settings.retry.clone(),
			))
		});

		Ok(Self {
			codec: AssertionCodec::new(&descriptor, realm),
			descriptor,
			store,
			login_metrics: Default::default(),
			verifier,
			profiles,
			enrichment: Arc::new(ProfileMerge),
			return_url: settings.return_url,
			state_ttl: settings.state_ttl,
			profile_policy: settings.profile_policy,
			enrichment_failure: settings.enrichment_failure,
		})
	}

	/// Replaces the enrichment hook.
	pub fn with_enrichment(mut self, hook: impl EnrichmentHook + 'static) -> Self {
		self.enrichment = Arc::new(hook);

		self
	}

	/// Replaces the enrichment hook with a shared one.
	pub fn with_shared_enrichment(mut self, hook: Arc<dyn EnrichmentHook>) -> Self {
		self.enrichment = hook;

		self
	}

	/// Codec used for redirects and callbacks.
	pub fn codec(&self) -> &AssertionCodec {
		&self.codec
	}
}
#[cfg(feature = "reqwest")]
impl SteamAdapter<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new adapter with its own reqwest-backed transport.
	pub fn new(
		descriptor: ProviderDescriptor,
		settings: AdapterSettings,
		store: Arc<dyn LoginStateStore>,
	) -> Result<Self, ConfigError> {
		Self::with_http_client(
			descriptor,
			settings,
			store,
			ReqwestHttpClient::new()?,
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Clone for SteamAdapter<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			descriptor: self.descriptor.clone(),
			store: Arc::clone(&self.store),
			login_metrics: Arc::clone(&self.login_metrics),
			codec: self.codec.clone(),
			verifier: self.verifier.clone(),
			profiles: self.profiles.clone(),
			enrichment: Arc::clone(&self.enrichment),
			return_url: self.return_url.clone(),
			state_ttl: self.state_ttl,
			profile_policy: self.profile_policy,
			enrichment_failure: self.enrichment_failure,
		}
	}
}
impl<C, M> Debug for SteamAdapter<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SteamAdapter")
			.field("descriptor", &self.descriptor)
			.field("return_url", &self.return_url.as_str())
			.field("realm", &self.codec.realm().as_str())
			.field("profile_lookup", &self.profiles.is_some())
			.field("state_ttl", &self.state_ttl)
			.field("profile_policy", &self.profile_policy)
			.field("enrichment_failure", &self.enrichment_failure)
			.finish()
	}
}
impl<C, M> IdentityProvider for SteamAdapter<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn id(&self) -> &ProviderId {
		&self.descriptor.id
	}

	fn begin_login(&self, context: LoginContext) -> ProviderFuture<'_, RedirectDescriptor> {
		Box::pin(SteamAdapter::begin_login(self, context))
	}

	fn handle_callback(&self, request: CallbackRequest) -> ProviderFuture<'_, NormalizedClaims> {
		Box::pin(SteamAdapter::handle_callback(self, request))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse.")
	}

	#[test]
	fn realm_defaults_to_return_url_origin() {
		let settings = AdapterSettings::new(url("https://app.example/auth/cb?x=1"));

		assert_eq!(
			settings.resolve_realm().expect("Default realm should resolve.").as_str(),
			"https://app.example/"
		);
	}

	#[test]
	fn invalid_settings_are_refused() {
		let foreign = AdapterSettings::new(url("https://app.example/cb"))
			.with_realm(url("https://other.example/"));
		let zero_ttl =
			AdapterSettings::new(url("https://app.example/cb")).with_state_ttl(Duration::ZERO);
		let no_attempts = AdapterSettings::new(url("https://app.example/cb"))
			.with_retry(RetryPolicy::default().with_max_attempts(0));
		let zero_timeout = AdapterSettings::new(url("https://app.example/cb"))
			.with_retry(RetryPolicy::default().with_request_timeout(Duration::ZERO));
		let negative_timeout = AdapterSettings::new(url("https://app.example/cb"))
			.with_retry(RetryPolicy::default().with_request_timeout(Duration::seconds(-5)));
		let negative_backoff = AdapterSettings::new(url("https://app.example/cb")).with_retry(
			RetryPolicy::default().with_backoff(Duration::milliseconds(-10), Duration::seconds(1)),
		);

		assert!(matches!(foreign.resolve_realm(), Err(ConfigError::RealmMismatch { .. })));
		assert!(matches!(zero_ttl.resolve_realm(), Err(ConfigError::NonPositiveStateTtl)));
		assert!(matches!(no_attempts.resolve_realm(), Err(ConfigError::ZeroAttempts)));
		assert!(matches!(
			zero_timeout.resolve_realm(),
			Err(ConfigError::NonPositiveRequestTimeout)
		));
		assert!(matches!(
			negative_timeout.resolve_realm(),
			Err(ConfigError::NonPositiveRequestTimeout)
		));
		assert!(matches!(negative_backoff.resolve_realm(), Err(ConfigError::NegativeBackoff)));
	}

	#[test]
	fn settings_deserialize_with_defaults() {
		let settings: AdapterSettings = serde_json::from_str(
			r#"{"return_url":"https://app.example/cb","api_key":"K","enrichment_failure":"proceed_with_base_claims"}"#,
		)
		.expect("Settings should deserialize.");

		assert_eq!(settings.state_ttl, Duration::minutes(10));
		assert_eq!(settings.profile_policy, ProfilePolicy::Optional);
		assert_eq!(settings.enrichment_failure, EnrichmentFailurePolicy::ProceedWithBaseClaims);
		assert_eq!(settings.api_key.as_ref().map(ApiKey::expose), Some("K"));
		assert_eq!(settings.retry, RetryPolicy::default());
	}

	#[test]
	fn callback_request_parses_raw_query() {
		let request = CallbackRequest::from_query("?nonce=n1&openid.mode=cancel").with_binding("s1");

		assert_eq!(request.params, vec![
			("nonce".to_owned(), "n1".to_owned()),
			("openid.mode".to_owned(), "cancel".to_owned())
		]);
		assert_eq!(request.binding.as_deref(), Some("s1"));
	}
}
