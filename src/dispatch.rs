//! Request dispatch: credential attachment, execution, and status classification.
//!
//! [`ApiClient`] is the protocol boundary described by the crate docs: it validates
//! and prepares a logical request, executes it over the transport, and classifies
//! the numeric status into the crate's error taxonomy. Auth-required requests that
//! come back unauthorized are handed to the client's [`RefreshCoordinator`] for one
//! refresh-and-replay cycle; everything else propagates to the caller untouched.

// self
use crate::{
	_prelude::*,
	auth::AuthProvider,
	obs::{self, CallKind, CallOutcome, CallSpan},
	refresh::{RefreshCoordinator, RefreshMetrics, ReplayDispatch, ReplayFuture},
	request::{ApiRequest, ApiResponse},
	transport::{PreparedRequest, RawResponse, Transport},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Dispatches typed API requests over a transport with coordinated token refresh.
///
/// The client owns the transport, the credential source handle, and one
/// [`RefreshCoordinator`] instance, so concurrent unauthorized responses
/// de-duplicate into a single refresh cycle per client rather than per process.
pub struct ApiClient<T>
where
	T: ?Sized + Transport,
{
	/// Transport executing every outbound request.
	pub transport: Arc<T>,
	/// Credential source consulted before each auth-required call.
	pub provider: Arc<dyn AuthProvider>,
	coordinator: RefreshCoordinator,
}
impl<T> ApiClient<T>
where
	T: ?Sized + Transport,
{
	/// Creates a client that reuses the caller-provided transport + provider pair.
	pub fn with_transport(transport: impl Into<Arc<T>>, provider: Arc<dyn AuthProvider>) -> Self {
		let coordinator = RefreshCoordinator::new(provider.clone());

		Self { transport: transport.into(), provider, coordinator }
	}

	/// Returns the refresh counters recorded by the client's coordinator.
	pub fn refresh_metrics(&self) -> Arc<RefreshMetrics> {
		self.coordinator.metrics()
	}

	/// Resolves every call queued behind an in-flight refresh with a shutdown error
	/// and rejects requests that would queue afterwards.
	pub fn shutdown(&self) {
		self.coordinator.shutdown();
	}

	/// Dispatches a logical request and classifies the outcome.
	///
	/// Auth-required requests fail fast with [`Error::Unauthorized`] when the
	/// provider has no token (no transport round-trip for a request that cannot
	/// succeed), and route a wire 401 through the refresh coordinator for exactly
	/// one refresh-and-replay cycle. All other errors surface immediately; the
	/// dispatcher never retries on its own.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Dispatch;

		let span = CallSpan::new(KIND, "send");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				request.validate()?;

				if request.requires_auth && self.provider.token().is_none() {
					return Err(Error::Unauthorized);
				}

				match self.dispatch_once(&request).await {
					// Only a wire 401 reaches this arm; the tokenless case returned
					// above without touching the transport.
					Err(Error::Unauthorized) if request.requires_auth =>
						self.coordinator.handle_unauthorized(request, self).await,
					other => other,
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Prepares, executes, and classifies one transport call.
	///
	/// Reads the token fresh on every invocation so replays pick up the secret
	/// installed by the refresh cycle.
	async fn dispatch_once(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let bearer = if request.requires_auth {
			Some(self.provider.token().ok_or(Error::Unauthorized)?.secret)
		} else {
			None
		};
		let prepared = PreparedRequest { request: request.clone(), bearer };
		let raw = self.transport.execute(prepared).await?;

		classify(raw)
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client with the crate's default reqwest transport.
	pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
		Self::with_transport(ReqwestTransport::default(), provider)
	}
}
impl<T> ReplayDispatch for ApiClient<T>
where
	T: ?Sized + Transport,
{
	fn replay(&self, request: ApiRequest) -> ReplayFuture<'_> {
		Box::pin(async move {
			const KIND: CallKind = CallKind::Replay;

			let span = CallSpan::new(KIND, "replay");

			obs::record_call_outcome(KIND, CallOutcome::Attempt);

			// A second unauthorized response surfaces as-is; the request never
			// re-enters the refresh cycle.
			let result = span.instrument(self.dispatch_once(&request)).await;

			match &result {
				Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
				Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
			}

			result
		})
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient").field("coordinator", &self.coordinator).finish()
	}
}

/// Classifies the numeric status into the crate's taxonomy.
fn classify(raw: RawResponse) -> Result<ApiResponse> {
	match raw.status {
		200..=299 => Ok(ApiResponse { status: raw.status, body: raw.body }),
		401 => Err(Error::Unauthorized),
		400..=599 => Err(Error::Server {
			status: raw.status,
			message: parse_server_message(&raw.body),
		}),
		status => Err(Error::UnknownStatus { status }),
	}
}

/// Best-effort extraction of a human-readable message from JSON error bodies.
fn parse_server_message(body: &[u8]) -> Option<String> {
	let value = serde_json::from_slice::<serde_json::Value>(body).ok()?;

	["message", "error_description", "error"].into_iter().find_map(|field| {
		value.get(field).and_then(serde_json::Value::as_str).map(str::to_owned)
	})
}
