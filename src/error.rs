//! Adapter-level error types shared across the codec, verifier, profile fetcher, and stores.

// self
use crate::{_prelude::*, flows::LoginPhase};

/// Adapter-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for host-supplied and transport-specific failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical adapter error exposed by public APIs.
///
/// Security-definitive failures ([`Error::MalformedAssertion`], [`Error::StateMismatch`],
/// [`Error::VerificationRejected`]) are never retried and never downgraded.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Callback parameters violate the OpenID protocol shape.
	#[error("Malformed OpenID assertion: {reason}.")]
	MalformedAssertion {
		/// Which protocol rule was violated.
		reason: String,
	},
	/// The user cancelled or denied the login at Steam.
	#[error("Login was cancelled at the identity service (mode `{mode}`).")]
	LoginCancelled {
		/// Negative `openid.mode` value returned by the service.
		mode: String,
	},
	/// No unexpired, unconsumed login state matches the callback.
	#[error("Login state does not match the callback: {cause}.")]
	StateMismatch {
		/// Why the callback could not be matched.
		cause: StateMismatchCause,
	},
	/// Steam did not confirm the assertion during `check_authentication`.
	#[error("Identity service rejected the assertion: {reason}.")]
	VerificationRejected {
		/// Summary of the negative confirmation.
		reason: String,
	},
	/// The verification endpoint could not be reached within the retry budget.
	#[error("Verification endpoint unreachable after {attempts} attempt(s).")]
	VerificationUnreachable {
		/// Number of attempts performed before giving up.
		attempts: u32,
		/// Last transport failure observed.
		#[source]
		source: TransportError,
	},
	/// Player summary could not be fetched or decoded.
	#[error("Profile unavailable: {reason}.")]
	ProfileUnavailable {
		/// Summary of the failure.
		reason: String,
		/// Transport failure, when the request never produced a usable response.
		#[source]
		source: Option<TransportError>,
	},
	/// The host-supplied enrichment hook failed.
	#[error("Enrichment hook failed.")]
	EnrichmentFailed {
		/// Error returned by the hook.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// HTTP status class a host should answer with when surfacing this error.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::MalformedAssertion { .. }
			| Self::LoginCancelled { .. }
			| Self::StateMismatch { .. } => 400,
			Self::VerificationRejected { .. } => 401,
			Self::VerificationUnreachable { .. } | Self::ProfileUnavailable { .. } => 502,
			Self::EnrichmentFailed { .. } | Self::Config(_) | Self::Storage(_) => 500,
		}
	}

	/// Returns `true` for failures that indicate a forged, replayed, or tampered callback.
	pub fn is_security_rejection(&self) -> bool {
		matches!(
			self,
			Self::MalformedAssertion { .. }
				| Self::StateMismatch { .. }
				| Self::VerificationRejected { .. }
		)
	}

	/// Terminal login phase reached when an attempt fails with this error.
	pub fn terminal_phase(&self) -> LoginPhase {
		match self {
			Self::LoginCancelled { .. } => LoginPhase::Cancelled,
			Self::StateMismatch { cause: StateMismatchCause::Expired } => LoginPhase::Expired,
			Self::MalformedAssertion { .. }
			| Self::StateMismatch { .. }
			| Self::VerificationRejected { .. } => LoginPhase::Rejected,
			Self::VerificationUnreachable { .. }
			| Self::ProfileUnavailable { .. }
			| Self::EnrichmentFailed { .. }
			| Self::Config(_)
			| Self::Storage(_) => LoginPhase::Failed,
		}
	}

	pub(crate) fn malformed(reason: impl Into<String>) -> Self {
		Self::MalformedAssertion { reason: reason.into() }
	}
}

/// Reasons a callback fails to match a stored login state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMismatchCause {
	/// No state exists for the nonce (never issued or already consumed).
	Unknown,
	/// The state existed but its TTL elapsed.
	Expired,
	/// The callback came from a different host session than the one that started the login.
	BindingMismatch,
	/// The signed `openid.return_to` differs from the stored return URL.
	ReturnToMismatch,
}
impl StateMismatchCause {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unknown => "unknown",
			Self::Expired => "expired",
			Self::BindingMismatch => "binding_mismatch",
			Self::ReturnToMismatch => "return_to_mismatch",
		}
	}
}
impl Display for StateMismatchCause {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the adapter.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Return URL cannot be parsed or is not usable.
	#[error("Return URL is invalid: {reason}.")]
	InvalidReturnUrl {
		/// Why the URL was refused.
		reason: String,
	},
	/// The return URL does not live under the configured realm.
	#[error("Return URL `{return_url}` is outside the realm `{realm}`.")]
	RealmMismatch {
		/// Offending return URL.
		return_url: String,
		/// Configured realm.
		realm: String,
	},
	/// A required secret is missing from the environment.
	#[error("Secret `{name}` is not set.")]
	MissingSecret {
		/// Environment variable name.
		name: String,
	},
	/// Login state TTL must be positive.
	#[error("Login state TTL must be positive.")]
	NonPositiveStateTtl,
	/// Retry policy must allow at least one attempt.
	#[error("Retry policy must allow at least one attempt.")]
	ZeroAttempts,
	/// Per-attempt request timeout must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveRequestTimeout,
	/// Backoff bounds must not be negative.
	#[error("Retry backoff must not be negative.")]
	NegativeBackoff,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures talking to the identity service.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request did not finish within the configured timeout.
	#[error("Request timed out after {after}.")]
	Timeout {
		/// Timeout that elapsed.
		after: Duration,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the identity service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The service answered with a non-success HTTP status.
	#[error("Identity service answered with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity service.")]
	Io(#[from] std::io::Error),
	/// The request could not be built or sent at all.
	#[error("Request could not be dispatched: {message}.")]
	Request {
		/// Human-readable error payload.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Whether another attempt may succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Timeout { .. } | Self::Network { .. } | Self::Io(_) => true,
			Self::Status { status, .. } => *status == 429 || *status >= 500,
			Self::Request { .. } => false,
		}
	}

	/// Retry-After hint carried by the failure, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Status { retry_after, .. } => *retry_after,
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		// Request URLs may carry the Web API key.
		Self::network(e.without_url())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn security_failures_map_to_client_errors() {
		let malformed = Error::malformed("missing openid.sig");
		let mismatch = Error::StateMismatch { cause: StateMismatchCause::Unknown };
		let rejected = Error::VerificationRejected { reason: "is_valid:false".into() };

		assert_eq!(malformed.status_code(), 400);
		assert_eq!(mismatch.status_code(), 400);
		assert_eq!(rejected.status_code(), 401);
		assert!(malformed.is_security_rejection());
		assert!(mismatch.is_security_rejection());
		assert!(rejected.is_security_rejection());
		assert!(!Error::LoginCancelled { mode: "cancel".into() }.is_security_rejection());
	}

	#[test]
	fn terminal_phases_follow_error_kind() {
		let expired = Error::StateMismatch { cause: StateMismatchCause::Expired };
		let unknown = Error::StateMismatch { cause: StateMismatchCause::Unknown };
		let unreachable = Error::VerificationUnreachable {
			attempts: 3,
			source: TransportError::Timeout { after: Duration::seconds(1) },
		};

		assert_eq!(expired.terminal_phase(), LoginPhase::Expired);
		assert_eq!(unknown.terminal_phase(), LoginPhase::Rejected);
		assert_eq!(unreachable.terminal_phase(), LoginPhase::Failed);
		assert_eq!(unreachable.status_code(), 502);
		assert_eq!(
			Error::LoginCancelled { mode: "cancel".into() }.terminal_phase(),
			LoginPhase::Cancelled
		);
	}

	#[test]
	fn transport_retry_classification() {
		assert!(TransportError::Timeout { after: Duration::seconds(2) }.is_retryable());
		assert!(TransportError::Status { status: 503, retry_after: None }.is_retryable());
		assert!(TransportError::Status { status: 429, retry_after: None }.is_retryable());
		assert!(!TransportError::Status { status: 403, retry_after: None }.is_retryable());
		assert!(!TransportError::Request { message: "bad uri".into() }.is_retryable());
	}

	#[test]
	fn unreachable_exposes_transport_source() {
		let err = Error::VerificationUnreachable {
			attempts: 2,
			source: TransportError::Status { status: 502, retry_after: None },
		};
		let source =
			StdError::source(&err).expect("Unreachable errors should expose the transport source.");

		assert_eq!(source.to_string(), "Identity service answered with HTTP 502.");
	}
}
