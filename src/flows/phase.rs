//! Per-attempt login state machine.

// self
use crate::_prelude::*;

/// Phase of a single login attempt.
///
/// `Started → RedirectSent → CallbackReceived → Verified → Enriched → Completed`, with
/// `Cancelled`, `Rejected`, `Expired`, and `Failed` as the other terminal phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginPhase {
	/// `begin_login` was called.
	Started,
	/// The redirect was produced and its state persisted.
	RedirectSent,
	/// The browser came back with callback parameters.
	CallbackReceived,
	/// The service confirmed the assertion.
	Verified,
	/// The enrichment hook ran (or was skipped by policy).
	Enriched,
	/// Claims were handed to the host.
	Completed,
	/// The user backed out at the service.
	Cancelled,
	/// The callback was malformed, replayed, or not confirmed.
	Rejected,
	/// The login state lapsed before the callback arrived.
	Expired,
	/// A transport, profile, enrichment, storage, or configuration failure.
	Failed,
}
impl LoginPhase {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Started => "started",
			Self::RedirectSent => "redirect_sent",
			Self::CallbackReceived => "callback_received",
			Self::Verified => "verified",
			Self::Enriched => "enriched",
			Self::Completed => "completed",
			Self::Cancelled => "cancelled",
			Self::Rejected => "rejected",
			Self::Expired => "expired",
			Self::Failed => "failed",
		}
	}

	/// Terminal phases never transition again.
	pub const fn is_terminal(self) -> bool {
		matches!(
			self,
			Self::Completed | Self::Cancelled | Self::Rejected | Self::Expired | Self::Failed
		)
	}

	/// Whether `self → next` is a legal step.
	pub const fn can_transition_to(self, next: Self) -> bool {
		use LoginPhase::*;

		match (self, next) {
			(Started, RedirectSent | Failed) => true,
			(RedirectSent, CallbackReceived | Expired) => true,
			(CallbackReceived, Verified | Cancelled | Rejected | Expired | Failed) => true,
			(Verified, Enriched | Failed) => true,
			(Enriched, Completed | Failed) => true,
			_ => false,
		}
	}
}
impl Display for LoginPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Rejected phase change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Login phase cannot move from {from} to {to}.")]
pub struct InvalidTransition {
	/// Current phase.
	pub from: LoginPhase,
	/// Requested phase.
	pub to: LoginPhase,
}

/// Tracks the phase history of one login attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginAttempt {
	history: Vec<LoginPhase>,
}
impl LoginAttempt {
	/// Starts a new attempt in [`LoginPhase::Started`].
	pub fn new() -> Self {
		Self { history: vec![LoginPhase::Started] }
	}

	/// Resumes an attempt whose redirect was already sent, as seen by the callback handler.
	pub fn resumed() -> Self {
		Self { history: vec![LoginPhase::Started, LoginPhase::RedirectSent] }
	}

	/// Current phase.
	pub fn phase(&self) -> LoginPhase {
		self.history.last().copied().unwrap_or(LoginPhase::Started)
	}

	/// Every phase visited so far, oldest first.
	pub fn history(&self) -> &[LoginPhase] {
		&self.history
	}

	/// Moves to `next` when the transition is legal.
	pub fn advance(&mut self, next: LoginPhase) -> Result<(), InvalidTransition> {
		let from = self.phase();

		if !from.can_transition_to(next) {
			return Err(InvalidTransition { from, to: next });
		}

		self.history.push(next);

		Ok(())
	}

	pub(crate) fn step(&mut self, next: LoginPhase) {
		let advanced = self.advance(next);

		debug_assert!(advanced.is_ok(), "{advanced:?}");
	}

	/// Moves to the terminal phase for `result`, stepping through `Completed` on success.
	pub(crate) fn finish<T>(&mut self, result: &Result<T>) -> LoginPhase {
		let next = match result {
			Ok(_) => LoginPhase::Completed,
			Err(e) => e.terminal_phase(),
		};

		if self.advance(next).is_err() && !self.phase().is_terminal() {
			self.history.push(LoginPhase::Failed);
		}

		self.phase()
	}
}
impl Default for LoginAttempt {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::StateMismatchCause;

	const ALL: [LoginPhase; 10] = [
		LoginPhase::Started,
		LoginPhase::RedirectSent,
		LoginPhase::CallbackReceived,
		LoginPhase::Verified,
		LoginPhase::Enriched,
		LoginPhase::Completed,
		LoginPhase::Cancelled,
		LoginPhase::Rejected,
		LoginPhase::Expired,
		LoginPhase::Failed,
	];

	#[test]
	fn terminal_phases_never_transition() {
		for from in ALL.into_iter().filter(|phase| phase.is_terminal()) {
			for to in ALL {
				assert!(!from.can_transition_to(to), "{from} must not move to {to}");
			}
		}
	}

	#[test]
	fn happy_path_reaches_completed() {
		let mut attempt = LoginAttempt::new();

		for next in [
			LoginPhase::RedirectSent,
			LoginPhase::CallbackReceived,
			LoginPhase::Verified,
			LoginPhase::Enriched,
		] {
			attempt.advance(next).expect("Happy-path transition should be legal.");
		}

		assert_eq!(attempt.finish(&Ok(())), LoginPhase::Completed);
		assert_eq!(attempt.history().len(), 6);
	}

	#[test]
	fn skipping_verification_is_refused() {
		let mut attempt = LoginAttempt::resumed();

		attempt.advance(LoginPhase::CallbackReceived).expect("Callback should be accepted.");

		let err = attempt
			.advance(LoginPhase::Completed)
			.expect_err("Completing without verification must be refused.");

		assert_eq!(err, InvalidTransition {
			from: LoginPhase::CallbackReceived,
			to: LoginPhase::Completed
		});
	}

	#[test]
	fn errors_finish_in_their_terminal_phase() {
		let mut attempt = LoginAttempt::resumed();

		attempt.advance(LoginPhase::CallbackReceived).expect("Callback should be accepted.");

		let result: Result<()> =
			Err(Error::StateMismatch { cause: StateMismatchCause::Expired });

		assert_eq!(attempt.finish(&result), LoginPhase::Expired);
		assert!(attempt.phase().is_terminal());
	}
}
