//! Shared helpers for flow implementations (retry policy, bounded dispatch).

// crates.io
use oauth2::http::{Error as HttpError, StatusCode};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	http::{
		AsyncHttpClient, HttpRequest, HttpResponse, IdentityHttpClient, ResponseMetadataSlot,
		TransportErrorMapper,
	},
	obs,
};

/// Timeout and retry budget applied to each outbound call.
///
/// Only transport-class failures (timeouts, network errors, 429/5xx) are retried. A
/// negative verification answer is a definitive security rejection and never reaches the
/// retry loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Total attempts per call, including the first one.
	pub max_attempts: u32,
	/// Per-attempt deadline.
	#[serde(rename = "request_timeout_ms", with = "duration_ms")]
	pub request_timeout: Duration,
	/// Delay before the second attempt; doubles afterwards.
	#[serde(rename = "initial_backoff_ms", with = "duration_ms")]
	pub initial_backoff: Duration,
	/// Upper bound for any single delay, including upstream Retry-After hints.
	#[serde(rename = "max_backoff_ms", with = "duration_ms")]
	pub max_backoff: Duration,
}
impl RetryPolicy {
	/// Policy that performs exactly one attempt.
	pub fn no_retry(request_timeout: Duration) -> Self {
		Self { max_attempts: 1, request_timeout, ..Self::default() }
	}

	/// Overrides the attempt budget.
	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts;

		self
	}

	/// Overrides the per-attempt deadline.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the backoff bounds.
	pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
		self.initial_backoff = initial;
		self.max_backoff = max;

		self
	}

	pub(crate) fn validate(&self) -> Result<(), ConfigError> {
		if self.max_attempts == 0 {
			return Err(ConfigError::ZeroAttempts);
		}
		if !self.request_timeout.is_positive() {
			return Err(ConfigError::NonPositiveRequestTimeout);
		}
		if self.initial_backoff.is_negative() || self.max_backoff.is_negative() {
			return Err(ConfigError::NegativeBackoff);
		}

		Ok(())
	}

	/// Delay before attempt `attempt + 1`, given the failure of attempt `attempt` (1-based).
	pub fn backoff_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
		let exponent = attempt.saturating_sub(1).min(16);
		let factor = i32::try_from(1_u32 << exponent).unwrap_or(i32::MAX);
		let computed = self.initial_backoff.checked_mul(factor).unwrap_or(self.max_backoff);
		let wanted = match hint {
			Some(hint) if hint > computed => hint,
			_ => computed,
		};

		wanted.clamp(Duration::ZERO, self.max_backoff.max(Duration::ZERO))
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			request_timeout: Duration::seconds(10),
			initial_backoff: Duration::milliseconds(250),
			max_backoff: Duration::seconds(2),
		}
	}
}

/// Final transport failure after the retry budget was spent or a non-retryable error hit.
#[derive(Debug)]
pub(crate) struct Exhausted {
	pub(crate) attempts: u32,
	pub(crate) source: TransportError,
}

/// Sends a request built by `build`, retrying transport failures per `policy`.
///
/// Only 2xx responses are returned. Each attempt is bounded by the policy timeout; dropping
/// the returned future abandons the in-flight request.
pub(crate) async fn send_with_retry<C, M, F>(
	http_client: &C,
	mapper: &M,
	policy: &RetryPolicy,
	endpoint: &'static str,
	build: F,
) -> Result<HttpResponse, Exhausted>
where
	C: ?Sized + IdentityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	F: Fn() -> Result<HttpRequest, HttpError>,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut attempt = 0;

	loop {
		attempt += 1;

		let request = build().map_err(|e| Exhausted {
			attempts: attempt,
			source: TransportError::Request { message: e.to_string() },
		})?;
		let slot = ResponseMetadataSlot::default();
		let handle = http_client.with_metadata(slot.clone());
		let outcome =
			tokio::time::timeout(policy.request_timeout.unsigned_abs(), handle.call(request)).await;
		let failure = match outcome {
			Err(_) => TransportError::Timeout { after: policy.request_timeout },
			Ok(Err(e)) => mapper.map_transport_error(slot.take().as_ref(), e),
			Ok(Ok(response)) if response.status().is_success() => return Ok(response),
			Ok(Ok(response)) => status_failure(&response, slot.take().and_then(|m| m.retry_after)),
		};

		if attempt >= max_attempts || !failure.is_retryable() {
			return Err(Exhausted { attempts: attempt, source: failure });
		}

		let delay = policy.backoff_for(attempt, failure.retry_after());

		obs::record_retry(endpoint, attempt, &failure, delay);

		if delay.is_positive() {
			tokio::time::sleep(delay.unsigned_abs()).await;
		}
	}
}

fn status_failure(response: &HttpResponse, retry_after: Option<Duration>) -> TransportError {
	let status: StatusCode = response.status();

	TransportError::Status { status: status.as_u16(), retry_after }
}

/// Serde helpers for durations expressed in whole milliseconds.
pub(crate) mod duration_ms {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub(crate) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let millis = i64::try_from(value.whole_milliseconds()).unwrap_or(i64::MAX);

		serializer.serialize_i64(millis)
	}

	pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let millis = i64::deserialize(deserializer)?;

		Ok(Duration::milliseconds(millis))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn backoff_doubles_and_caps() {
		let policy = RetryPolicy::default()
			.with_backoff(Duration::milliseconds(100), Duration::milliseconds(350));

		assert_eq!(policy.backoff_for(1, None), Duration::milliseconds(100));
		assert_eq!(policy.backoff_for(2, None), Duration::milliseconds(200));
		assert_eq!(policy.backoff_for(3, None), Duration::milliseconds(350));
		assert_eq!(policy.backoff_for(40, None), Duration::milliseconds(350));
	}

	#[test]
	fn retry_after_hint_is_honored_up_to_cap() {
		let policy = RetryPolicy::default()
			.with_backoff(Duration::milliseconds(100), Duration::seconds(2));

		assert_eq!(policy.backoff_for(1, Some(Duration::seconds(1))), Duration::seconds(1));
		assert_eq!(policy.backoff_for(1, Some(Duration::seconds(30))), Duration::seconds(2));
	}

	#[test]
	fn policy_deserializes_from_millis() {
		let policy: RetryPolicy =
			serde_json::from_str(r#"{"max_attempts":5,"request_timeout_ms":1500}"#)
				.expect("Retry policy should deserialize.");

		assert_eq!(policy.max_attempts, 5);
		assert_eq!(policy.request_timeout, Duration::milliseconds(1500));
		assert_eq!(policy.initial_backoff, RetryPolicy::default().initial_backoff);
		assert!(RetryPolicy::default().with_max_attempts(0).validate().is_err());
	}

	#[test]
	fn validation_requires_positive_timeout_and_backoff() {
		assert!(RetryPolicy::default().validate().is_ok());
		assert!(matches!(
			RetryPolicy::default().with_request_timeout(Duration::ZERO).validate(),
			Err(ConfigError::NonPositiveRequestTimeout)
		));
		assert!(matches!(
			RetryPolicy::default().with_request_timeout(Duration::seconds(-5)).validate(),
			Err(ConfigError::NonPositiveRequestTimeout)
		));
		assert!(matches!(
			RetryPolicy::default()
				.with_backoff(Duration::milliseconds(-1), Duration::seconds(1))
				.validate(),
			Err(ConfigError::NegativeBackoff)
		));
		assert!(matches!(
			RetryPolicy::default().with_backoff(Duration::ZERO, Duration::seconds(-1)).validate(),
			Err(ConfigError::NegativeBackoff)
		));
	}
}
