//! Error taxonomy shared across dispatch, transport, and refresh coordination.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every dispatched request resolves to either a response or exactly one of the
/// variants below; nothing in the crate surfaces an unclassified failure.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Transport failure (connectivity, timeout, protocol plumbing).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Request was rejected locally before reaching the transport.
	#[error("Request is invalid: {reason}.")]
	InvalidRequest {
		/// Human-readable validation failure.
		reason: String,
	},
	/// Authorization failed and will not recover without new credentials.
	///
	/// Surfaced when an auth-required request has no token to attach, or when a
	/// replay after a completed refresh cycle is rejected again.
	#[error("Request was not authorized.")]
	Unauthorized,
	/// Upstream endpoint reported a client or server failure.
	#[error("Endpoint returned status {status}.")]
	Server {
		/// HTTP status code outside the success range.
		status: u16,
		/// Best-effort message extracted from the error body.
		message: Option<String>,
	},
	/// Token refresh cycle failed; retry policy belongs to the caller.
	#[error("Token refresh failed: {reason}")]
	RefreshFailed {
		/// Provider-supplied failure summary.
		reason: String,
	},
	/// Client was torn down while the request was queued behind a refresh.
	#[error("Client was shut down while the request awaited a token refresh.")]
	ShutdownDuringRefresh,
	/// Endpoint returned a status outside every classified range.
	#[error("Endpoint returned unclassifiable status {status}.")]
	UnknownStatus {
		/// The unclassifiable status code.
		status: u16,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	ResponseDecode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
}

/// Transport-level failures distinguishing connectivity faults from upstream ones.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Network is unreachable or the connection could not be established.
	#[error("Network is unreachable.")]
	Offline,
	/// Transport call exceeded its deadline.
	#[error("Request timed out before a response arrived.")]
	TimedOut,
	/// Any other transport-layer failure.
	#[error("Transport error occurred while executing the request.")]
	Other {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific failure.
	pub fn other(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Other { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::TimedOut
		} else if e.is_connect() {
			Self::Offline
		} else {
			Self::other(e)
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transport_error_converts_into_error_with_source() {
		let io = std::io::Error::other("socket closed");
		let error: Error = TransportError::other(io).into();

		assert!(matches!(error, Error::Transport(TransportError::Other { .. })));
		assert!(
			std::error::Error::source(&error)
				.expect("Transport error should expose the underlying failure as its source.")
				.to_string()
				.contains("socket closed")
		);
	}

	#[test]
	fn error_messages_are_classified() {
		let server = Error::Server { status: 503, message: Some("upstream down".into()) };

		assert_eq!(server.to_string(), "Endpoint returned status 503.");
		assert_eq!(Error::Unauthorized.to_string(), "Request was not authorized.");
	}
}
