//! Typed request and response models consumed by the dispatcher.
//!
//! [`ApiRequest`] is the logical request definition: it carries everything needed to
//! prepare a transport call and is replayed verbatim by the refresh coordinator after
//! a successful token refresh. Headers and query parameters are key-ordered
//! association lists, so the request stays fully typed while preserving whatever
//! ordering the caller established.

// self
use crate::_prelude::*;

/// HTTP method subset supported by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the canonical uppercase wire name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Logical API request dispatched by the client and replayed by the coordinator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiRequest {
	/// Fully resolved target URL.
	pub target: Url,
	/// HTTP method used for the call.
	pub method: Method,
	/// Marks the request as needing a bearer token.
	pub requires_auth: bool,
	/// Optional per-request timeout overriding the transport default.
	pub timeout: Option<Duration>,
	/// Key-ordered header list appended to transport defaults.
	pub headers: Vec<(String, String)>,
	/// Key-ordered query parameters appended to the target.
	pub query: Vec<(String, String)>,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
}
impl ApiRequest {
	/// Creates a request with the provided target and method.
	pub fn new(target: Url, method: Method) -> Self {
		Self {
			target,
			method,
			requires_auth: false,
			timeout: None,
			headers: Vec::new(),
			query: Vec::new(),
			body: None,
		}
	}

	/// Creates a `GET` request for the provided target.
	pub fn get(target: Url) -> Self {
		Self::new(target, Method::Get)
	}

	/// Creates a `POST` request for the provided target.
	pub fn post(target: Url) -> Self {
		Self::new(target, Method::Post)
	}

	/// Marks the request as requiring a bearer token.
	pub fn require_auth(mut self) -> Self {
		self.requires_auth = true;

		self
	}

	/// Overrides the requires-auth flag.
	pub fn with_requires_auth(mut self, requires_auth: bool) -> Self {
		self.requires_auth = requires_auth;

		self
	}

	/// Overrides the transport timeout for this request only.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Appends a header pair, preserving insertion order.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Appends a query pair, preserving insertion order.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Attaches a JSON body.
	pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Validates the request before it is handed to the transport.
	///
	/// Bearer credentials must never travel over plaintext HTTP, so auth-required
	/// requests are limited to `https` targets plus loopback hosts for local
	/// development.
	pub fn validate(&self) -> Result<()> {
		match self.target.scheme() {
			"https" => Ok(()),
			"http" if !self.requires_auth || is_loopback(&self.target) => Ok(()),
			"http" => Err(Error::InvalidRequest {
				reason: "bearer credentials require an https or loopback target".into(),
			}),
			scheme => Err(Error::InvalidRequest { reason: format!("unsupported scheme `{scheme}`") }),
		}
	}
}

/// Successful response surfaced to callers: classified status plus raw body bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
	/// HTTP status code within the success range.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Decodes the body as JSON into the requested type.
	pub fn json<T>(&self) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::ResponseDecode { source })
	}

	/// Returns the body as UTF-8 text, if valid.
	pub fn text(&self) -> Option<&str> {
		std::str::from_utf8(&self.body).ok()
	}
}

fn is_loopback(target: &Url) -> bool {
	match target.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn builders_preserve_association_order() {
		let request = ApiRequest::get(url("https://api.example.com/widgets"))
			.with_query("page", "2")
			.with_query("per_page", "50")
			.with_header("x-trace", "abc");

		assert_eq!(request.query, vec![
			("page".to_string(), "2".to_string()),
			("per_page".to_string(), "50".to_string()),
		]);
		assert_eq!(request.headers, vec![("x-trace".to_string(), "abc".to_string())]);
		assert!(!request.requires_auth);
	}

	#[test]
	fn validation_rejects_plaintext_bearer_targets() {
		let request = ApiRequest::get(url("http://api.example.com/widgets")).require_auth();
		let err = request.validate().expect_err("Plaintext bearer targets should be rejected.");

		assert!(matches!(err, Error::InvalidRequest { .. }));

		let loopback = ApiRequest::get(url("http://127.0.0.1:8080/widgets")).require_auth();

		assert!(loopback.validate().is_ok());

		let anonymous = ApiRequest::get(url("http://api.example.com/widgets"));

		assert!(anonymous.validate().is_ok());
	}

	#[test]
	fn validation_rejects_unsupported_schemes() {
		let err = ApiRequest::get(url("ftp://api.example.com/widgets"))
			.validate()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, Error::InvalidRequest { reason } if reason.contains("ftp")));
	}

	#[test]
	fn response_json_decodes_typed_payloads() {
		#[derive(Debug, PartialEq, Deserialize)]
		struct Widget {
			id: u32,
		}

		let response = ApiResponse { status: 200, body: b"{\"id\":7}".to_vec() };

		assert_eq!(
			response.json::<Widget>().expect("Valid JSON body should decode."),
			Widget { id: 7 }
		);

		let malformed = ApiResponse { status: 200, body: b"{\"id\":".to_vec() };

		assert!(matches!(
			malformed.json::<Widget>().expect_err("Truncated JSON should fail to decode."),
			Error::ResponseDecode { .. }
		));
	}
}
