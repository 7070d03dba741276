//! Scripted in-process doubles shared by the integration tests.
//!
//! [`MockTransport`] answers by comparing the attached bearer against an accepted
//! secret (401 otherwise), with an optional script queue for explicit statuses and
//! transport failures. [`ScriptedAuthProvider`] serves a current token, counts
//! refresh calls, and can delay or hang refresh cycles to hold a window open for
//! concurrent callers.

#![allow(dead_code)] // Not every test crate exercises every helper.

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
// self
use token_relay::{
	auth::{AuthProvider, BearerToken, RefreshError, RefreshFuture},
	error::TransportError,
	request::{ApiRequest, Method},
	transport::{PreparedRequest, RawResponse, Transport, TransportFuture},
	url::Url,
};

/// Token-gated transport double with an optional response script.
#[derive(Default)]
pub struct MockTransport {
	accepted: Mutex<Option<String>>,
	script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
	calls: Mutex<Vec<PreparedRequest>>,
}
impl MockTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks a bearer secret as authorized; every other bearer receives a 401.
	pub fn accept_bearer(&self, token: impl Into<String>) {
		*self.accepted.lock() = Some(token.into());
	}

	/// Queues an explicit response consumed before the token gate applies.
	pub fn push_response(&self, status: u16, body: &str) {
		self.script
			.lock()
			.push_back(Ok(RawResponse { status, body: body.as_bytes().to_vec() }));
	}

	/// Queues an explicit transport failure.
	pub fn push_failure(&self, failure: TransportError) {
		self.script.lock().push_back(Err(failure));
	}

	pub fn total_calls(&self) -> usize {
		self.calls.lock().len()
	}

	pub fn calls_with_bearer(&self, token: &str) -> usize {
		self.calls
			.lock()
			.iter()
			.filter(|prepared| {
				prepared.bearer.as_ref().is_some_and(|bearer| bearer.expose() == token)
			})
			.count()
	}

	pub fn bearer_of(&self, index: usize) -> Option<String> {
		self.calls
			.lock()
			.get(index)
			.and_then(|prepared| prepared.bearer.as_ref().map(|bearer| bearer.expose().to_string()))
	}
}
impl Transport for MockTransport {
	fn execute(&self, prepared: PreparedRequest) -> TransportFuture<'_> {
		self.calls.lock().push(prepared.clone());

		let outcome = match self.script.lock().pop_front() {
			Some(outcome) => outcome,
			None => {
				let accepted = self.accepted.lock().clone();
				let authorized = match (&prepared.bearer, &accepted) {
					(Some(bearer), Some(token)) => bearer.expose() == token,
					_ => false,
				};

				if authorized {
					Ok(RawResponse { status: 200, body: b"{\"ok\":true}".to_vec() })
				} else {
					Ok(RawResponse { status: 401, body: b"{\"error\":\"invalid_token\"}".to_vec() })
				}
			},
		};

		Box::pin(async move { outcome })
	}
}

/// Credential-source double with scripted refresh outcomes.
#[derive(Default)]
pub struct ScriptedAuthProvider {
	current: Mutex<Option<BearerToken>>,
	rotation: Mutex<VecDeque<Result<BearerToken, RefreshError>>>,
	refresh_calls: AtomicUsize,
	refresh_delay: Mutex<Option<Duration>>,
	hang: AtomicBool,
}
impl ScriptedAuthProvider {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_current(token: &str) -> Arc<Self> {
		let provider = Self::new();

		provider.install(token);

		Arc::new(provider)
	}

	pub fn install(&self, token: &str) {
		*self.current.lock() = Some(BearerToken::new(token));
	}

	pub fn push_refresh(&self, outcome: Result<BearerToken, RefreshError>) {
		self.rotation.lock().push_back(outcome);
	}

	/// Delays every refresh so concurrent callers pile into the pending queue.
	pub fn set_refresh_delay(&self, delay: Duration) {
		*self.refresh_delay.lock() = Some(delay);
	}

	/// Makes every refresh pend forever, for teardown scenarios.
	pub fn hang_refreshes(&self) {
		self.hang.store(true, Ordering::SeqCst);
	}

	pub fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}
}
impl AuthProvider for ScriptedAuthProvider {
	fn token(&self) -> Option<BearerToken> {
		self.current.lock().clone()
	}

	fn refresh(&self) -> RefreshFuture<'_> {
		self.refresh_calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			if self.hang.load(Ordering::SeqCst) {
				futures::future::pending::<()>().await;
			}

			let delay = *self.refresh_delay.lock();

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			let next = self.rotation.lock().pop_front().unwrap_or(Err(RefreshError::Exhausted))?;

			*self.current.lock() = Some(next.clone());

			Ok(next)
		})
	}
}

/// Auth-required GET fixture targeting a placeholder endpoint.
pub fn authorized_request() -> ApiRequest {
	ApiRequest::get(parse_url("https://api.example.com/widgets")).require_auth()
}

/// Anonymous request fixture for passthrough scenarios.
pub fn anonymous_request() -> ApiRequest {
	ApiRequest::new(parse_url("https://api.example.com/status"), Method::Get)
}

pub fn parse_url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse test URL.")
}
