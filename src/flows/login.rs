//! Login start: nonce generation, state persistence, and redirect construction.

// self
use crate::{
	_prelude::*,
	auth::Nonce,
	flows::{LoginContext, SteamAdapter},
	http::{IdentityHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	openid::RedirectDescriptor,
	store::LoginRequestState,
};

impl<C, M> SteamAdapter<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts a login attempt.
	///
	/// Generates a fresh nonce, persists the pending state for the configured TTL, and returns
	/// the `checkid_setup` redirect. The state is stored before the redirect is returned, so a
	/// fast callback always finds it.
	pub async fn begin_login(&self, context: LoginContext) -> Result<RedirectDescriptor> {
		const KIND: FlowKind = FlowKind::BeginLogin;

		let span = FlowSpan::new(KIND, "begin_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let nonce = Nonce::generate();
				let mut redirect = self.codec.build_redirect(&self.return_url, &nonce);
				let created_at = OffsetDateTime::now_utc();
				let expires_at = created_at + self.state_ttl;
				let state = LoginRequestState {
					nonce,
					return_to: redirect.return_to.clone(),
					binding: context.binding,
					created_at,
					expires_at,
				};

				self.store.put(state).await?;

				redirect.expires_at = Some(expires_at);

				Ok::<_, Error>(redirect)
			})
			.await;

		match &result {
			Ok(_) => {
				self.login_metrics.record_started();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
