//! Claim enrichment contract invoked after verification.

// self
use crate::{
	_prelude::*,
	auth::{ClaimMap, Profile, ProviderId, SteamId, VerifiedIdentity},
};

/// Boxed future returned by [`EnrichmentHook::enrich`].
pub type EnrichmentFuture<'a> = Pin<Box<dyn Future<Output = Result<ClaimMap, BoxError>> + 'a + Send>>;

/// Host capability that turns a verified identity into additional claims.
///
/// Returned claims are merged into the base claims; `provider`, `external_id`, and
/// `verified_at` can never be overridden. Errors are handled per
/// [`EnrichmentFailurePolicy`](crate::flows::EnrichmentFailurePolicy).
pub trait EnrichmentHook
where
	Self: Send + Sync,
{
	/// Produces claims for a single verified login.
	fn enrich<'a>(&'a self, context: &'a EnrichmentContext) -> EnrichmentFuture<'a>;
}

/// Inputs handed to an [`EnrichmentHook`].
#[derive(Clone, Debug)]
pub struct EnrichmentContext {
	/// Provider the login went through.
	pub provider: ProviderId,
	/// Identity confirmed by the service.
	pub identity: VerifiedIdentity,
	/// Player summary, when an API key is configured and the lookup succeeded.
	pub profile: Option<Profile>,
	/// Raw `openid.*` callback fields.
	pub assertion_fields: BTreeMap<String, String>,
}
impl EnrichmentContext {
	/// SteamID64 of the verified account.
	pub fn steam_id(&self) -> SteamId {
		self.identity.steam_id()
	}
}

/// Hook that adds nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEnrichment;
impl EnrichmentHook for NoEnrichment {
	fn enrich<'a>(&'a self, _: &'a EnrichmentContext) -> EnrichmentFuture<'a> {
		Box::pin(async { Ok(ClaimMap::new()) })
	}
}

/// Default hook: maps the fetched player summary onto common claim names.
///
/// Emits `name`, `image`, `profile_url`, and, when public, `real_name` and `country`.
/// Adds nothing when no profile is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProfileMerge;
impl ProfileMerge {
	/// Claims derived from `profile`.
	pub fn claims_for(profile: &Profile) -> ClaimMap {
		let mut claims = ClaimMap::new();

		claims.insert("name".into(), profile.persona_name.clone().into());

		let image = profile
			.avatar_full
			.as_ref()
			.or(profile.avatar_medium.as_ref())
			.or(profile.avatar.as_ref());
		let optional = [
			("image", image),
			("profile_url", profile.profile_url.as_ref()),
			("real_name", profile.real_name.as_ref()),
			("country", profile.country_code.as_ref()),
		];

		for (name, value) in optional.into_iter().filter_map(|(name, value)| Some((name, value?))) {
			claims.insert(name.into(), value.clone().into());
		}

		claims
	}
}
impl EnrichmentHook for ProfileMerge {
	fn enrich<'a>(&'a self, context: &'a EnrichmentContext) -> EnrichmentFuture<'a> {
		let claims = context.profile.as_ref().map(Self::claims_for).unwrap_or_default();

		Box::pin(async move { Ok(claims) })
	}
}

/// Hook backed by an async closure.
pub struct FnEnrichment<F>(F);
impl<F, Fut> FnEnrichment<F>
where
	F: Fn(EnrichmentContext) -> Fut + Send + Sync,
	Fut: Future<Output = Result<ClaimMap, BoxError>> + Send + 'static,
{
	/// Wraps `f`; it receives an owned copy of the context.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F, Fut> EnrichmentHook for FnEnrichment<F>
where
	F: Fn(EnrichmentContext) -> Fut + Send + Sync,
	Fut: Future<Output = Result<ClaimMap, BoxError>> + Send + 'static,
{
	fn enrich<'a>(&'a self, context: &'a EnrichmentContext) -> EnrichmentFuture<'a> {
		Box::pin((self.0)(context.clone()))
	}
}
impl<F> Debug for FnEnrichment<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnEnrichment(..)")
	}
}
