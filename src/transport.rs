//! Transport seam between the dispatcher and an HTTP stack.
//!
//! The module exposes the [`Transport`] trait so downstream crates can plug in any
//! HTTP client: implementations receive a [`PreparedRequest`] (the logical request
//! plus the bearer secret the dispatcher attached) and answer with the raw status
//! and body, or a [`TransportError`] that keeps connectivity failures
//! distinguishable from upstream ones. The default [`ReqwestTransport`] adapter
//! lives behind the `reqwest` feature.

// self
use crate::{_prelude::*, auth::TokenSecret, error::TransportError, request::ApiRequest};
#[cfg(feature = "reqwest")]
use crate::request::Method;

/// Raw transport response prior to status classification.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// Numeric HTTP status.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}

/// Request handed to the transport: the logical request plus attached credential.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	/// Logical request definition.
	pub request: ApiRequest,
	/// Bearer secret attached when the request requires auth.
	pub bearer: Option<TokenSecret>,
}

/// Boxed future returned by [`Transport`] implementations.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Contract implemented by HTTP stacks executing prepared requests.
///
/// Implementations must be `Send + Sync` so one transport instance can serve
/// concurrent dispatches without additional wrappers. The returned future must be
/// `Send` for the lifetime of the in-flight call so dispatcher futures can hop
/// executors freely.
pub trait Transport
where
	Self: Send + Sync,
{
	/// Executes the prepared request, returning the raw status and body.
	fn execute(&self, prepared: PreparedRequest) -> TransportFuture<'_>;
}

#[cfg(feature = "reqwest")]
/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The adapter applies per-request timeout overrides, attaches the bearer header,
/// and serializes JSON bodies itself so the wrapped client needs no extra features.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl std::ops::Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(&self, prepared: PreparedRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = &prepared.request;
			let mut builder = client.request(request.method.into(), request.target.clone());

			if !request.query.is_empty() {
				builder = builder.query(&request.query);
			}

			for (name, value) in &request.headers {
				builder = builder.header(name, value);
			}

			if let Some(bearer) = &prepared.bearer {
				builder = builder.bearer_auth(bearer.expose());
			}
			if let Some(timeout) = request.timeout {
				builder = builder.timeout(timeout);
			}
			if let Some(body) = &request.body {
				let payload = serde_json::to_vec(body).map_err(TransportError::other)?;

				builder = builder
					.header(reqwest::header::CONTENT_TYPE, "application/json")
					.body(payload);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(RawResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}
