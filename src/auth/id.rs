//! Strongly typed identifiers used across the adapter.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const NONCE_LEN: usize = 32;
const STEAM_ID_DIGITS: usize = 17;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (provider, nonce, steam).
		kind: &'static str,
	},
	/// The identifier contains characters outside the allowed set.
	#[error("{kind} identifier contains invalid characters.")]
	InvalidCharacters {
		/// Kind of identifier (provider, nonce, steam).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (provider, nonce, steam).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// SteamID64 values are exactly 17 decimal digits.
	#[error("Steam identifier must be {expected} decimal digits.")]
	InvalidSteamId {
		/// Expected digit count.
		expected: usize,
	},
}

def_id! { ProviderId, "Identifier under which the adapter registers with the host framework.", "Provider" }
def_id! { Nonce, "Per-login anti-replay value embedded in the OpenID return URL.", "Nonce" }
impl Nonce {
	/// Generates a fresh 32-character alphanumeric nonce.
	pub fn generate() -> Self {
		Self(rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect())
	}
}

/// 64-bit Steam account identifier (SteamID64) extracted from a verified claimed id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SteamId(u64);
impl SteamId {
	/// Parses a SteamID64 from its 17-digit decimal form.
	pub fn parse(value: &str) -> Result<Self, IdentifierError> {
		if value.len() != STEAM_ID_DIGITS || !value.bytes().all(|b| b.is_ascii_digit()) {
			return Err(IdentifierError::InvalidSteamId { expected: STEAM_ID_DIGITS });
		}

		value
			.parse::<u64>()
			.map(Self)
			.map_err(|_| IdentifierError::InvalidSteamId { expected: STEAM_ID_DIGITS })
	}

	/// Raw 64-bit value.
	pub fn as_u64(self) -> u64 {
		self.0
	}

	/// 32-bit account number (the low half of the SteamID64).
	pub fn account_id(self) -> u32 {
		(self.0 & 0xFFFF_FFFF) as u32
	}
}
impl From<SteamId> for String {
	fn from(value: SteamId) -> Self {
		value.0.to_string()
	}
}
impl TryFrom<String> for SteamId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}
impl FromStr for SteamId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Debug for SteamId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "SteamId({})", self.0)
	}
}
impl Display for SteamId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.0)
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if !view.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
		return Err(IdentifierError::InvalidCharacters { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_symbols() {
		assert!(Nonce::new(" n1").is_err(), "Leading whitespace must be rejected.");
		assert!(Nonce::new("n1&mode=x").is_err(), "Query metacharacters must be rejected.");
		assert!(ProviderId::new("").is_err());

		let nonce = Nonce::new("n1").expect("Nonce fixture should be considered valid.");

		assert_eq!(nonce.as_ref(), "n1");
		assert_eq!(format!("{nonce:?}"), "Nonce(n1)");
	}

	#[test]
	fn generated_nonces_are_unique_and_valid() {
		let a = Nonce::generate();
		let b = Nonce::generate();

		assert_eq!(a.len(), NONCE_LEN);
		assert!(Nonce::new(a.as_ref()).is_ok());
		assert_ne!(a, b);
	}

	#[test]
	fn length_limit_is_enforced() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		Nonce::new(&exact).expect("Exact length should succeed.");

		assert!(Nonce::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn steam_id_requires_seventeen_digits() {
		let id = SteamId::parse("76561198000000000").expect("SteamID64 fixture should parse.");

		assert_eq!(id.as_u64(), 76_561_198_000_000_000);
		assert_eq!(id.to_string(), "76561198000000000");
		assert_eq!(id.account_id(), 39_734_272);
		assert!(SteamId::parse("7656119800000000").is_err());
		assert!(SteamId::parse("765611980000000001").is_err());
		assert!(SteamId::parse("7656119800000000a").is_err());
		assert!(SteamId::parse("+7656119800000000").is_err());
	}

	#[test]
	fn steam_id_serializes_as_string() {
		let id = SteamId::parse("76561198000000000").expect("SteamID64 fixture should parse.");
		let payload = serde_json::to_string(&id).expect("SteamId should serialize.");

		assert_eq!(payload, "\"76561198000000000\"");
		assert!(serde_json::from_str::<SteamId>("\"123\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<Nonce, u8> =
			HashMap::from_iter([(Nonce::new("abc").expect("Nonce should be valid."), 7_u8)]);

		assert_eq!(map.get("abc"), Some(&7));
	}
}
