//! Thread-safe in-memory [`AuthProvider`] implementation for local development and tests.

// std
use std::collections::VecDeque;
// self
use crate::{
	_prelude::*,
	auth::{AuthProvider, BearerToken, RefreshError, RefreshFuture},
};

/// In-process provider that serves one current token and refreshes by rotating
/// through a pre-loaded queue of replacements.
///
/// A refresh cycle pops the next queued token, installs it as the current one, and
/// returns it; an empty queue fails the cycle with [`RefreshError::Exhausted`].
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
	current: RwLock<Option<BearerToken>>,
	rotation: Mutex<VecDeque<BearerToken>>,
}
impl MemoryAuthProvider {
	/// Creates an empty provider with no current token and no rotation material.
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs the current token, replacing any previous one.
	pub fn install(&self, token: BearerToken) {
		*self.current.write() = Some(token);
	}

	/// Clears the current token without touching the rotation queue.
	pub fn clear(&self) {
		*self.current.write() = None;
	}

	/// Appends a token to the rotation queue consumed by refresh cycles.
	pub fn push_rotation(&self, token: BearerToken) {
		self.rotation.lock().push_back(token);
	}

	fn rotate_now(&self) -> Result<BearerToken, RefreshError> {
		let next = self.rotation.lock().pop_front().ok_or(RefreshError::Exhausted)?;

		*self.current.write() = Some(next.clone());

		Ok(next)
	}
}
impl AuthProvider for MemoryAuthProvider {
	fn token(&self) -> Option<BearerToken> {
		self.current.read().clone()
	}

	fn refresh(&self) -> RefreshFuture<'_> {
		Box::pin(async move { self.rotate_now() })
	}
}
