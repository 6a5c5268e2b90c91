// self
use crate::{
	_prelude::*,
	error::TransportError,
	obs::{self, FlowKind},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by login flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("steam_openid.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> FlowSpanGuard {
		#[cfg(feature = "tracing")]
		{
			FlowSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			FlowSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`FlowSpan::entered`].
pub struct FlowSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}

/// Emits a retry event for an outbound call.
pub fn record_retry(endpoint: &'static str, attempt: u32, failure: &TransportError, delay: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			endpoint,
			attempt,
			delay_ms = i64::try_from(delay.whole_milliseconds()).unwrap_or(i64::MAX),
			error = %failure,
			"retrying identity service call"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (endpoint, attempt, failure, delay);
	}
}

/// Logs and counts a callback refused for security reasons.
///
/// `cause` is a stable label; `detail` must never carry signatures or secrets.
pub fn record_security_rejection(cause: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(cause, detail = %detail, "login callback rejected");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = detail;
	}

	obs::record_rejection_total(cause);
}

/// Logs a non-fatal failure the login continued past.
pub fn record_degraded(stage: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage, detail = %detail, "login continued without optional data");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, detail);
	}
}

/// Logs hook claims dropped because they collide with reserved names.
pub fn record_reserved_claims_skipped(names: &[String]) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(?names, "enrichment tried to override reserved claims");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = names;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn flow_span_noop_without_tracing() {
		let _guard = FlowSpan::new(FlowKind::BeginLogin, "test").entered();

		record_retry(
			"check_authentication",
			1,
			&TransportError::Timeout { after: Duration::seconds(1) },
			Duration::milliseconds(250),
		);
		record_security_rejection("state_mismatch", &"unknown");
		record_degraded("profile_fetch", &"HTTP 500");
		record_reserved_claims_skipped(&["provider".to_owned()]);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Callback, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
