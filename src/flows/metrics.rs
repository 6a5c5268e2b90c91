// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::flows::LoginPhase;

/// Thread-safe counters for login attempts.
#[derive(Debug, Default)]
pub struct LoginMetrics {
	started: AtomicU64,
	completed: AtomicU64,
	cancelled: AtomicU64,
	rejected: AtomicU64,
	expired: AtomicU64,
	failed: AtomicU64,
}
impl LoginMetrics {
	/// Returns the number of redirects handed out.
	pub fn started(&self) -> u64 {
		self.started.load(Ordering::Relaxed)
	}

	/// Returns the number of callbacks that produced claims.
	pub fn completed(&self) -> u64 {
		self.completed.load(Ordering::Relaxed)
	}

	/// Returns the number of logins the user cancelled.
	pub fn cancelled(&self) -> u64 {
		self.cancelled.load(Ordering::Relaxed)
	}

	/// Returns the number of callbacks refused for security reasons.
	pub fn rejected(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Returns the number of callbacks that arrived after their state lapsed.
	pub fn expired(&self) -> u64 {
		self.expired.load(Ordering::Relaxed)
	}

	/// Returns the number of callbacks that failed for operational reasons.
	pub fn failed(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	pub(crate) fn record_started(&self) {
		self.started.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_terminal(&self, phase: LoginPhase) {
		let counter = match phase {
			LoginPhase::Completed => &self.completed,
			LoginPhase::Cancelled => &self.cancelled,
			LoginPhase::Rejected => &self.rejected,
			LoginPhase::Expired => &self.expired,
			LoginPhase::Failed => &self.failed,
			_ => return,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
