//! Error types shared by the runtime and object layers.

use thiserror::Error;

/// Result alias used throughout the runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while locating, driving, or talking to the driver process.
#[derive(Debug, Error)]
pub enum Error {
	/// No usable Node.js runtime or driver script could be located.
	#[error("driver not found: {0}")]
	DriverNotFound(String),

	/// The driver process could not be spawned or died during startup.
	#[error("failed to launch driver: {0}")]
	LaunchFailed(String),

	/// Reading from or writing to the driver's stdio pipes failed.
	#[error("transport error: {0}")]
	TransportError(String),

	/// A message violated the expected protocol shape.
	#[error("protocol error: {0}")]
	ProtocolError(String),

	/// An error reported by the driver in a response message.
	#[error("{name}: {message}")]
	Remote {
		/// Error class name, e.g. "TimeoutError".
		name: String,
		/// Human-readable message.
		message: String,
		/// Driver-side stack trace, when provided.
		stack: Option<String>,
	},

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	/// A client-side wait exceeded its deadline.
	#[error("timeout: {0}")]
	Timeout(String),

	/// The page, context, or browser was closed while an operation was in flight.
	#[error("{target_type} was closed: {context}")]
	TargetClosed {
		/// What closed, e.g. "Page" or "Browser".
		target_type: String,
		/// The operation that observed the closure.
		context: String,
	},

	/// A guid lookup failed or resolved to an object of the wrong type.
	#[error("object not found: {guid}{}", expected.map(|t| format!(" (expected {t})")).unwrap_or_default())]
	ObjectNotFound {
		/// The guid that was requested.
		guid: String,
		/// The concrete type the caller wanted, when known.
		expected: Option<&'static str>,
	},

	/// The connection was shut down while a request was pending.
	#[error("channel closed")]
	ChannelClosed,

	/// A caller-supplied value was rejected before reaching the wire.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
}

impl Error {
	/// Short machine-readable name for this error variant.
	pub fn error_name(&self) -> &str {
		match self {
			Error::DriverNotFound(_) => "DriverNotFound",
			Error::LaunchFailed(_) => "LaunchFailed",
			Error::TransportError(_) => "TransportError",
			Error::ProtocolError(_) => "ProtocolError",
			Error::Remote { name, .. } => name,
			Error::Io(_) => "Io",
			Error::Json(_) => "Json",
			Error::Timeout(_) => "Timeout",
			Error::TargetClosed { .. } => "TargetClosed",
			Error::ObjectNotFound { .. } => "ObjectNotFound",
			Error::ChannelClosed => "ChannelClosed",
			Error::InvalidArgument(_) => "InvalidArgument",
		}
	}

	/// Driver-side stack trace, when this error carries one.
	pub fn stack_trace(&self) -> Option<&str> {
		match self {
			Error::Remote { stack, .. } => stack.as_deref(),
			_ => None,
		}
	}

	/// True for deadline-style failures, local or reported by the driver.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::Timeout(_) => true,
			Error::Remote { name, .. } => name == "TimeoutError",
			_ => false,
		}
	}

	/// True when the underlying page, context, or browser is gone.
	pub fn is_target_closed(&self) -> bool {
		match self {
			Error::TargetClosed { .. } => true,
			Error::Remote { name, .. } => name == "TargetClosedError",
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn remote_display_includes_name_and_message() {
		let error = Error::Remote {
			name: "TimeoutError".to_string(),
			message: "waiting for selector".to_string(),
			stack: None,
		};
		assert_eq!(error.to_string(), "TimeoutError: waiting for selector");
		assert!(error.is_timeout());
	}

	#[test]
	fn object_not_found_display_mentions_expected_type() {
		let error = Error::ObjectNotFound {
			guid: "page@abc".to_string(),
			expected: Some("Page"),
		};
		assert_eq!(error.to_string(), "object not found: page@abc (expected Page)");
	}

	#[test]
	fn target_closed_detection_covers_remote_form() {
		let error = Error::Remote {
			name: "TargetClosedError".to_string(),
			message: "page closed".to_string(),
			stack: None,
		};
		assert!(error.is_target_closed());
		assert!(!error.is_timeout());
	}
}
