//! Identity-service descriptors.
//!
//! `descriptor` exposes validated endpoint metadata ([`ProviderDescriptor`]): the OpenID login
//! endpoint, the player-summaries endpoint, and the claimed-identifier prefix Steam uses for
//! account URLs. Endpoints must use HTTPS unless they point at a loopback host.

pub mod descriptor;

pub use descriptor::*;
