//! Redacted Steam Web API key wrapper.

// self
use crate::{_prelude::*, error::ConfigError};

/// Server-held Steam Web API key. Never rendered by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);
impl ApiKey {
	/// Wraps a new key.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Reads the key from the named environment variable.
	pub fn from_env(name: &str) -> Result<Self, ConfigError> {
		match std::env::var(name) {
			Ok(value) if !value.trim().is_empty() => Ok(Self(value.trim().to_owned())),
			_ => Err(ConfigError::MissingSecret { name: name.to_owned() }),
		}
	}

	/// Returns the inner key. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for ApiKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ApiKey").field(&"<redacted>").finish()
	}
}
impl Display for ApiKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn key_formatters_redact() {
		let key = ApiKey::new("ABCDEF0123456789");

		assert_eq!(format!("{key:?}"), "ApiKey(\"<redacted>\")");
		assert_eq!(format!("{key}"), "<redacted>");
		assert_eq!(key.expose(), "ABCDEF0123456789");
	}

	#[test]
	fn missing_env_key_is_reported_by_name() {
		let err = ApiKey::from_env("STEAM_OPENID_ADAPTER_TEST_UNSET_KEY")
			.expect_err("Unset variables should be reported.");

		assert!(matches!(err, ConfigError::MissingSecret { ref name } if name == "STEAM_OPENID_ADAPTER_TEST_UNSET_KEY"));
	}
}
