//! Reconciler-level error types shared across resources, the admin API, and configuration.

// self
use crate::{_prelude::*, condition::ConditionError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// An enumerated attribute holds a value outside its allowed set.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Desired state could not be coerced into the typed resource shape.
	#[error(transparent)]
	Attribute(#[from] AttributeError),
	/// A condition could not be converted between its typed and generic forms.
	#[error(transparent)]
	Condition(#[from] ConditionError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A remote call failed; `operation` names what the reconciler was doing.
	#[error("Failed {operation}: {source}")]
	Remote {
		/// Operation label such as `creating client`.
		operation: Operation,
		/// Underlying remote failure.
		#[source]
		source: RemoteError,
	},
}
impl Error {
	/// Wraps a remote failure with operation context.
	pub fn remote(operation: Operation, source: impl Into<RemoteError>) -> Self {
		Self::Remote { operation, source: source.into() }
	}

	/// HTTP status returned by the server, when the failure carries one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Remote { source: RemoteError::Status(e), .. } => Some(e.status),
			Self::Remote { source: RemoteError::Decode { status, .. }, .. }
			| Self::Remote { source: RemoteError::MissingBody { status }, .. }
			| Self::Remote { source: RemoteError::MissingId { status }, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` when the server reported that the resource does not exist.
	///
	/// Hosts use this to drop a resource from their state after a read; every other
	/// error keeps the resource and is surfaced to the operator.
	pub fn is_not_found(&self) -> bool {
		self.status() == Some(404)
	}
}

/// Remote operations performed by the reconcilers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// `POST /clients`.
	CreateClient,
	/// `GET /clients/{id}`.
	ReadClient,
	/// `PUT /clients/{id}`.
	UpdateClient,
	/// `DELETE /clients/{id}`.
	DeleteClient,
	/// `POST /policies`.
	CreatePolicy,
	/// `GET /policies/{id}`.
	ReadPolicy,
	/// `PUT /policies/{id}`.
	UpdatePolicy,
	/// `DELETE /policies/{id}`.
	DeletePolicy,
}
impl Operation {
	/// Returns the human-readable label used in error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::CreateClient => "creating client",
			Operation::ReadClient => "reading client",
			Operation::UpdateClient => "updating client",
			Operation::DeleteClient => "deleting client",
			Operation::CreatePolicy => "creating policy",
			Operation::ReadPolicy => "reading policy",
			Operation::UpdatePolicy => "updating policy",
			Operation::DeletePolicy => "deleting policy",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Declaration-time validation failure for enumerated attributes.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("\"{attribute}\" contains an invalid value \"{value}\". Valid values are: {}.", .allowed.join(", "))]
pub struct ValidationError {
	/// Attribute key that failed validation.
	pub attribute: String,
	/// Offending value.
	pub value: String,
	/// Allowed values, in declaration order.
	pub allowed: Vec<String>,
}

/// Failures raised while reading typed values out of a desired-state store.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AttributeError {
	/// A required attribute is absent or empty.
	#[error("Attribute \"{attribute}\" is required.")]
	Missing {
		/// Attribute key.
		attribute: &'static str,
	},
	/// The attribute (or one of its elements) holds an unexpected kind of value.
	#[error("Attribute \"{attribute}\" expected {expected} but found {found}.")]
	UnexpectedKind {
		/// Attribute key.
		attribute: String,
		/// Expected value kind.
		expected: &'static str,
		/// Kind actually stored.
		found: &'static str,
	},
	/// A scope token is empty or contains whitespace.
	#[error("Attribute \"{attribute}\" contains an invalid scope token \"{token}\".")]
	InvalidScope {
		/// Attribute key.
		attribute: &'static str,
		/// Offending token.
		token: String,
	},
	/// Two condition declarations share the same name.
	#[error("Condition \"{name}\" is declared more than once.")]
	DuplicateCondition {
		/// Condition name.
		name: String,
	},
}

/// Configuration failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL cannot be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Configuration field that held the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured URL is syntactically valid but unusable.
	#[error("The {field} URL `{url}` is unsupported: {reason}.")]
	UnsupportedUrl {
		/// Configuration field that held the URL.
		field: &'static str,
		/// Offending URL.
		url: String,
		/// Why it was rejected.
		reason: &'static str,
	},
	/// A required environment variable is absent.
	#[error("Environment variable {name} is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// A boolean environment variable could not be parsed.
	#[error("Environment variable {name} must be `true` or `false`, found `{value}`.")]
	InvalidBool {
		/// Variable name.
		name: &'static str,
		/// Raw value.
		value: String,
	},
	/// Client credentials were only partially configured.
	#[error("Admin credentials require {missing}.")]
	IncompleteCredentials {
		/// Missing piece of the credentials.
		missing: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures produced while talking to the admin API.
#[derive(Debug, ThisError)]
pub enum RemoteError {
	/// The call could not complete.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The call completed with a non-2xx status.
	#[error(transparent)]
	Status(#[from] StatusError),
	/// The response body could not be decoded.
	#[error("Response body with status {status} is malformed.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// The request payload could not be serialized.
	#[error("Request payload could not be encoded.")]
	Encode(#[source] serde_json::Error),
	/// A successful response omitted the body the operation needs.
	#[error("Response with status {status} has no body.")]
	MissingBody {
		/// HTTP status code.
		status: u16,
	},
	/// A successful create response carried no identifier and none was declared.
	#[error("Response with status {status} did not carry a resource identifier.")]
	MissingId {
		/// HTTP status code.
		status: u16,
	},
	/// The admin bearer token could not be obtained.
	#[error("Token endpoint rejected the request: {reason}.")]
	Token {
		/// Server- or client-supplied reason string.
		reason: String,
	},
}

/// Non-2xx response from the admin API.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unexpected HTTP status code {status}{}.", .body.as_deref().map(|b| format!(" ({b})")).unwrap_or_default())]
pub struct StatusError {
	/// Literal status code.
	pub status: u16,
	/// Truncated response body, when one was returned.
	pub body: Option<String>,
}
impl StatusError {
	/// Creates a status error without a body preview.
	pub fn new(status: u16) -> Self {
		Self { status, body: None }
	}

	/// Attaches a response body preview.
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());

		self
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the admin API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the admin API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn remote_error_includes_operation_and_status() {
		let err = Error::remote(Operation::CreateClient, StatusError::new(409));

		assert_eq!(err.to_string(), "Failed creating client: Unexpected HTTP status code 409.");
		assert_eq!(err.status(), Some(409));
		assert!(!err.is_not_found());

		let source = StdError::source(&err).expect("Remote errors should expose their source.");

		assert_eq!(source.to_string(), "Unexpected HTTP status code 409.");
	}

	#[test]
	fn not_found_is_detected_from_status() {
		let err = Error::remote(
			Operation::ReadPolicy,
			StatusError::new(404).with_body("{\"error\":\"not_found\"}"),
		);

		assert!(err.is_not_found());
		assert!(err.to_string().contains("404"));
		assert!(err.to_string().contains("not_found"));
	}

	#[test]
	fn validation_error_lists_allowed_values() {
		let err = ValidationError {
			attribute: "effect".into(),
			value: "maybe".into(),
			allowed: vec!["allow".into(), "deny".into()],
		};

		assert_eq!(
			err.to_string(),
			"\"effect\" contains an invalid value \"maybe\". Valid values are: allow, deny."
		);
	}
}
