//! Optional observability helpers for login flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `steam_openid.flow` with the `flow` and
//!   `stage` fields, plus warn-level events for retries and rejected callbacks.
//! - Enable `metrics` to increment the `steam_openid_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `steam_openid_rejection_total` counter labeled by `cause`.
//!
//! Nothing recorded here ever includes assertion signatures or the Web API key.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow stages observed by the adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Redirect construction and state persistence.
	BeginLogin,
	/// End-to-end callback handling.
	Callback,
	/// `check_authentication` round trip.
	Verification,
	/// Player summary lookup.
	ProfileFetch,
	/// Host enrichment hook.
	Enrichment,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::BeginLogin => "begin_login",
			FlowKind::Callback => "callback",
			FlowKind::Verification => "verification",
			FlowKind::ProfileFetch => "profile_fetch",
			FlowKind::Enrichment => "enrichment",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an adapter operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
