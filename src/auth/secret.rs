//! Bearer secret wrapper whose formatters redact the inner value.

// self
use crate::_prelude::*;

/// Opaque bearer secret; `Debug` and `Display` both print a redaction marker so
/// the raw token never lands in logs or error chains by accident.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_never_leak_the_inner_value() {
		let secret = TokenSecret::new("tr-9f2c01");

		assert!(!format!("{secret:?}").contains("9f2c01"));
		assert!(!format!("{secret}").contains("9f2c01"));
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn expose_and_as_ref_hand_back_the_wrapped_value() {
		let secret = TokenSecret::new("tr-9f2c01");

		assert_eq!(secret.expose(), "tr-9f2c01");
		assert_eq!(secret.as_ref(), "tr-9f2c01");
	}
}
