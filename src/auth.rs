//! Bearer-token contracts: redacted secrets, token records, and the pluggable
//! [`AuthProvider`] consumed by the dispatcher and the refresh coordinator.

pub mod memory;
pub mod secret;

pub use memory::MemoryAuthProvider;
pub use secret::TokenSecret;

// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`AuthProvider::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<BearerToken, RefreshError>> + 'a + Send>>;

/// Credential source contract consumed by the dispatcher and refresh coordinator.
///
/// The provider owns its token storage outright; the rest of the crate only reads
/// the current token and requests refresh cycles through this contract.
pub trait AuthProvider
where
	Self: Send + Sync,
{
	/// Returns the current bearer token, if one is installed.
	fn token(&self) -> Option<BearerToken>;

	/// Performs one refresh cycle against the upstream credential source.
	///
	/// Implementations must tolerate concurrent [`AuthProvider::token`] reads while
	/// a refresh is outstanding. The refresh coordinator guarantees at most one
	/// refresh call is in flight per client.
	fn refresh(&self) -> RefreshFuture<'_>;
}

/// Bearer credential with an optional expiry instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
	/// Redacted secret attached to authorized requests.
	pub secret: TokenSecret,
	/// Instant after which the token is no longer valid, when known.
	pub expires_at: Option<OffsetDateTime>,
}
impl BearerToken {
	/// Creates a token without expiry metadata.
	pub fn new(secret: impl Into<String>) -> Self {
		Self { secret: TokenSecret::new(secret), expires_at: None }
	}

	/// Attaches an expiry instant.
	pub fn with_expires_at(mut self, expires_at: OffsetDateTime) -> Self {
		self.expires_at = Some(expires_at);

		self
	}

	/// Returns whether the token is expired at the provided instant.
	///
	/// Tokens without expiry metadata never report as expired; the upstream
	/// endpoint remains the authority via its unauthorized responses.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expiry| expiry <= now)
	}
}

/// Failure produced by [`AuthProvider::refresh`].
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Credential source rejected the refresh (revoked or invalid grant material).
	#[error("Credential source rejected the refresh: {reason}.")]
	Rejected {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Credential source has no further tokens to issue.
	#[error("Credential source has no further tokens to issue.")]
	Exhausted,
	/// Transport failure while contacting the credential source.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
