//! OpenID 2.0 wire surface used by Steam sign-in.
//!
//! [`AssertionCodec`] builds the `checkid_setup` redirect and parses the `id_res` callback into
//! an [`InboundAssertion`]. [`AssertionVerifier`] replays that assertion to the service with
//! `openid.mode=check_authentication` and only then yields a
//! [`VerifiedIdentity`](crate::auth::VerifiedIdentity).
//!
//! Field names and constant values below are part of the protocol and must match byte for
//! byte.

/// Parsed callback assertions.
pub mod assertion;
/// Redirect encoding and callback decoding.
pub mod codec;
/// Outbound redirect descriptor.
pub mod redirect;
/// `check_authentication` round trip.
pub mod verifier;

pub use assertion::*;
pub use codec::*;
pub use redirect::*;
pub use verifier::*;

/// OpenID 2.0 namespace (`openid.ns`).
pub const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";
/// Identifier-select placeholder for `openid.identity` and `openid.claimed_id`.
pub const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";
/// Query parameter carrying the login nonce inside `openid.return_to`.
pub const NONCE_PARAM: &str = "nonce";

/// `openid.mode` values exchanged with the service.
pub mod mode {
	/// Outbound interactive login request.
	pub const CHECKID_SETUP: &str = "checkid_setup";
	/// Positive assertion.
	pub const ID_RES: &str = "id_res";
	/// The user declined or backed out.
	pub const CANCEL: &str = "cancel";
	/// Immediate-mode negative answer.
	pub const SETUP_NEEDED: &str = "setup_needed";
	/// Indirect error response.
	pub const ERROR: &str = "error";
	/// Direct verification request.
	pub const CHECK_AUTHENTICATION: &str = "check_authentication";
}

/// Fields Steam must cover with `openid.sig` for an assertion to be usable.
pub const REQUIRED_SIGNED_FIELDS: [&str; 6] =
	["op_endpoint", "claimed_id", "identity", "return_to", "response_nonce", "assoc_handle"];
