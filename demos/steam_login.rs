//! Starts a Steam sign-in against the public endpoints, then waits on stdin for the callback
//! query string Steam appends to the return URL and completes the login.
//!
//! ```sh
//! STEAM_API_KEY=... cargo run --example steam_login
//! ```
//!
//! The pending login lives in a [`MemoryStateStore`], so the callback must be pasted into the
//! same process.

// std
use std::{env, io, sync::Arc};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use steam_openid_adapter::{
	auth::ApiKey,
	flows::{AdapterSettings, CallbackRequest, LoginContext, ReqwestAdapter},
	provider::ProviderDescriptor,
	store::{LoginStateStore, MemoryStateStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store: Arc<dyn LoginStateStore> = Arc::new(MemoryStateStore::default());
	let mut settings = AdapterSettings::new(Url::parse("http://localhost:3000/auth/steam/callback")?);

	if let Ok(key) = env::var("STEAM_API_KEY") {
		settings = settings.with_api_key(ApiKey::new(key));
	}

	let adapter = ReqwestAdapter::new(ProviderDescriptor::steam()?, settings, store)?;
	let redirect = adapter.begin_login(LoginContext::new().with_binding("demo-session")).await?;

	println!("Send your user to {}.", redirect.url);
	println!("Pending nonce {} expires at {:?}.", redirect.nonce.as_ref(), redirect.expires_at);
	println!("Paste the callback URL or query string (empty line to quit):");

	let mut line = String::new();

	io::stdin().read_line(&mut line)?;

	let line = line.trim();

	if line.is_empty() {
		return Ok(());
	}

	let query = line.split_once('?').map_or(line, |(_, query)| query);
	let request = CallbackRequest::from_query(query).with_binding("demo-session");

	match adapter.handle_callback(request).await {
		Ok(claims) => println!("Signed in: {}.", serde_json::to_string_pretty(&claims.to_map())?),
		Err(e) => eprintln!("Login failed ({}): {e}.", e.status_code()),
	}

	Ok(())
}
