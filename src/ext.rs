//! Host extension contracts.
//!
//! The adapter calls exactly one host capability per login: the [`EnrichmentHook`], invoked
//! once after a successful verification to merge extra claims.

pub mod enrichment;

pub use enrichment::*;
