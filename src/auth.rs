//! Auth-domain identifiers, secrets, verified identities, profiles, and claims.

pub mod claims;
pub mod id;
pub mod identity;
pub mod profile;
pub mod secret;

pub use claims::*;
pub use id::*;
pub use identity::*;
pub use profile::*;
pub use secret::*;
