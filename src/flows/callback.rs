//! Callback handling: state consumption, assertion checks, verification, and enrichment.

// self
use crate::{
	_prelude::*,
	auth::{NormalizedClaims, Nonce, Profile, ProfileStatus, SteamId},
	error::StateMismatchCause,
	ext::EnrichmentContext,
	flows::{
		CallbackRequest, EnrichmentFailurePolicy, LoginAttempt, LoginPhase, ProfilePolicy,
		SteamAdapter,
	},
	http::{IdentityHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	openid::{NONCE_PARAM, nonce_from_return_to},
	store::LoginRequestState,
};

impl<C, M> SteamAdapter<C, M>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Completes a login from the callback parameters.
	///
	/// The pending state is consumed before anything else, so a callback can be processed at
	/// most once whatever its outcome. Claims are returned only after the service confirmed
	/// the assertion.
	pub async fn handle_callback(&self, request: CallbackRequest) -> Result<NormalizedClaims> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "handle_callback");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let mut attempt = LoginAttempt::resumed();
		let result = span.instrument(self.process_callback(&mut attempt, request)).await;
		let phase = attempt.finish(&result);

		self.login_metrics.record_terminal(phase);

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				if let Some(cause) = rejection_cause(e) {
					obs::record_security_rejection(cause, e);
				}

				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn process_callback(
		&self,
		attempt: &mut LoginAttempt,
		request: CallbackRequest,
	) -> Result<NormalizedClaims> {
		attempt.step(LoginPhase::CallbackReceived);

		let nonce = callback_nonce(&request.params)?;
		let state = self.consume_state(&nonce, request.binding.as_deref()).await?;
		let assertion = {
			let _guard = FlowSpan::new(FlowKind::Callback, "parse_callback").entered();

			self.codec.parse_callback(request.params)?
		};

		if assertion.return_to() != &state.return_to {
			return Err(Error::StateMismatch { cause: StateMismatchCause::ReturnToMismatch });
		}

		let identity = self.verifier.verify(&assertion).await?;

		attempt.step(LoginPhase::Verified);

		let (profile, status) = self.lookup_profile(identity.steam_id()).await?;
		let mut claims = NormalizedClaims::new(self.descriptor.id.clone(), &identity);

		claims.set_profile_status(status);

		let context = EnrichmentContext {
			provider: self.descriptor.id.clone(),
			identity,
			profile,
			assertion_fields: assertion.fields().clone(),
		};

		self.enrich(&mut claims, &context).await?;
		attempt.step(LoginPhase::Enriched);

		Ok(claims)
	}

	async fn consume_state(
		&self,
		nonce: &Nonce,
		binding: Option<&str>,
	) -> Result<LoginRequestState> {
		let state = self
			.store
			.consume(nonce)
			.await?
			.ok_or(Error::StateMismatch { cause: StateMismatchCause::Unknown })?;

		if state.is_expired_at(OffsetDateTime::now_utc()) {
			return Err(Error::StateMismatch { cause: StateMismatchCause::Expired });
		}
		if state.binding.is_some() && state.binding.as_deref() != binding {
			return Err(Error::StateMismatch { cause: StateMismatchCause::BindingMismatch });
		}

		Ok(state)
	}

	async fn lookup_profile(&self, steam_id: SteamId) -> Result<(Option<Profile>, ProfileStatus)> {
		let Some(fetcher) = &self.profiles else {
			return Ok((None, ProfileStatus::Skipped));
		};

		match fetcher.fetch(steam_id).await {
			Ok(profile) => Ok((Some(profile), ProfileStatus::Fetched)),
			Err(e) if self.profile_policy == ProfilePolicy::Optional => {
				obs::record_degraded("profile_fetch", &e);

				Ok((None, ProfileStatus::Unavailable { reason: e.to_string() }))
			},
			Err(e) => Err(e),
		}
	}

	async fn enrich(&self, claims: &mut NormalizedClaims, context: &EnrichmentContext) -> Result<()> {
		const KIND: FlowKind = FlowKind::Enrichment;

		let span = FlowSpan::new(KIND, "enrich");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		match span.instrument(self.enrichment.enrich(context)).await {
			Ok(extra) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				let skipped = claims.merge(extra);

				if !skipped.is_empty() {
					obs::record_reserved_claims_skipped(&skipped);
				}

				Ok(())
			},
			Err(source) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				match self.enrichment_failure {
					EnrichmentFailurePolicy::Abort => Err(Error::EnrichmentFailed { source }),
					EnrichmentFailurePolicy::ProceedWithBaseClaims => {
						obs::record_degraded("enrichment", &source);

						Ok(())
					},
				}
			},
		}
	}
}

/// Nonce from the top-level `nonce` parameter, else from the one inside `openid.return_to`.
fn callback_nonce(params: &[(String, String)]) -> Result<Nonce> {
	let unknown = || Error::StateMismatch { cause: StateMismatchCause::Unknown };
	let raw = params
		.iter()
		.find(|(key, _)| key == NONCE_PARAM)
		.map(|(_, value)| value.clone())
		.or_else(|| {
			params
				.iter()
				.find(|(key, _)| key == "openid.return_to")
				.and_then(|(_, value)| Url::parse(value).ok())
				.and_then(|return_to| nonce_from_return_to(&return_to))
		})
		.ok_or_else(unknown)?;

	Nonce::new(raw).map_err(|_| unknown())
}

fn rejection_cause(error: &Error) -> Option<&'static str> {
	match error {
		Error::MalformedAssertion { .. } => Some("malformed_assertion"),
		Error::StateMismatch { cause } => Some(cause.as_str()),
		Error::VerificationRejected { .. } => Some("verification_rejected"),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
		raw.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())).collect()
	}

	#[test]
	fn nonce_prefers_top_level_parameter() {
		let params = pairs(&[
			("nonce", "top"),
			("openid.return_to", "https://app.example/cb?nonce=inner"),
		]);

		assert_eq!(callback_nonce(&params).expect("Nonce should be found.").as_ref(), "top");
	}

	#[test]
	fn nonce_falls_back_to_return_to() {
		let params = pairs(&[("openid.return_to", "https://app.example/cb?nonce=inner")]);

		assert_eq!(callback_nonce(&params).expect("Nonce should be found.").as_ref(), "inner");
	}

	#[test]
	fn missing_or_garbled_nonce_is_unknown_state() {
		for params in [pairs(&[("openid.mode", "id_res")]), pairs(&[("nonce", "a b")])] {
			let err = callback_nonce(&params).expect_err("Callback without nonce must be refused.");

			assert!(matches!(err, Error::StateMismatch { cause: StateMismatchCause::Unknown }));
		}
	}

	#[test]
	fn only_security_failures_carry_a_rejection_cause() {
		assert_eq!(
			rejection_cause(&Error::StateMismatch { cause: StateMismatchCause::Expired }),
			Some("expired")
		);
		assert_eq!(rejection_cause(&Error::LoginCancelled { mode: "cancel".into() }), None);
	}
}
