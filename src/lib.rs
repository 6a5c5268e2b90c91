//! Steam OpenID 2.0 sign-in adapter: build the login redirect, verify the returned assertion
//! with `check_authentication`, fetch the player summary, and hand normalized claims to the
//! host session framework.
//!
//! The crate never issues sessions itself. Hosts call [`flows::SteamAdapter::begin_login`]
//! when a user asks to sign in, send the browser to the returned URL, and pass the callback
//! query string to [`flows::SteamAdapter::handle_callback`]. Claims only come back once Steam
//! has confirmed the assertion server-to-server and the one-time login state was consumed.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod obs;
pub mod openid;
pub mod profile;
pub mod provider;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{BoxError, Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
