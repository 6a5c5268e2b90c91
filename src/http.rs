//! Transport primitives for calls to the identity service.
//!
//! The module exposes [`IdentityHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can integrate custom HTTP clients
//! without losing the adapter's retry classification. Implementations call
//! [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once an HTTP status or retry hint is known, enabling
//! [`TransportErrorMapper`] to classify failures with consistent metadata.

pub use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Abstraction over HTTP transports capable of reaching the identity service while
/// publishing response metadata to the adapter's retry classification.
///
/// The trait acts as the adapter's only dependency on an HTTP stack. Callers provide an
/// implementation and the adapter requests short-lived [`AsyncHttpClient`] handles that each
/// carry a clone of a [`ResponseMetadataSlot`]. Implementations must be
/// `Send + Sync + 'static`, and the handles they return must own whatever state is required
/// so their request futures remain `Send` for the lifetime of the in-flight operation.
pub trait IdentityHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across retries.
	/// - Once an HTTP response provides status headers, save them with
	///   [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Maps HTTP transport failures into adapter [`TransportError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a transport error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> TransportError;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the service, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Verification answers come back directly from the login endpoint, so any custom
/// [`ReqwestClient`] should disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds the default client: no redirect following, rustls.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client =
			ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Per-call handle produced by [`ReqwestHttpClient::with_metadata`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl ReqwestHandle {
	async fn send(
		client: ReqwestClient,
		slot: ResponseMetadataSlot,
		request: HttpRequest,
	) -> Result<HttpResponse, HttpClientError<ReqwestError>> {
		slot.take();

		let request = reqwest::Request::try_from(request).map_err(Box::new)?;
		let upstream = client.execute(request).await.map_err(Box::new)?;
		let status = upstream.status();
		let headers = upstream.headers().clone();

		slot.store(ResponseMetadata {
			status: Some(status.as_u16()),
			retry_after: parse_retry_after(&headers),
		});

		let body = upstream.bytes().await.map_err(Box::new)?;
		let mut response = HttpResponse::new(body.to_vec());

		*response.status_mut() = status;
		*response.headers_mut() = headers;

		Ok(response)
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(Self::send(self.client.clone(), self.slot.clone(), request))
	}
}
#[cfg(feature = "reqwest")]
impl IdentityHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ReqwestHandle { client: self.0.clone(), slot }
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> TransportError {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => TransportError::Request { message: inner.to_string() },
			HttpClientError::Io(inner) => TransportError::Io(inner),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unknown HTTP client failure"),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> TransportError {
	if err.is_builder() {
		return TransportError::Request { message: err.without_url().to_string() };
	}
	// Client-level deadlines carry no duration; report them as network failures.
	if err.is_timeout() {
		return TransportError::from(err);
	}
	let status = meta
		.and_then(|value| value.status)
		.or_else(|| err.status().map(|code| code.as_u16()))
		.filter(|status| !(200..300).contains(status));

	if let Some(status) = status {
		return TransportError::Status {
			status,
			retry_after: meta.and_then(|value| value.retry_after),
		};
	}

	TransportError::from(err)
}

/// Classifies transport failures that carry only a message.
pub fn map_generic_transport_error(
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> TransportError {
	match meta.and_then(|value| value.status) {
		Some(status) if !(200..300).contains(&status) =>
			TransportError::Status { status, retry_after: meta.and_then(|value| value.retry_after) },
		_ => TransportError::Request { message: message.to_string() },
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
