//! Error types for the word-game client.
//!
//! # Design
//! Every failure a call can produce is a `ClientError`. Errors the server
//! reports are rebuilt on this side of the wire: kinds that belong to the
//! client's own family become `GameError`, kinds from outside the family
//! become `ForeignError`. Both keep the wire name of the server-side kind so
//! callers can match on it.

use serde_json::Value;

/// Kind name of the family's generic base error. Unknown server kinds
/// degrade to this.
pub const BASE_KIND: &str = "WordGameException";

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by `WordGameClient` calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection failure, malformed URL, or any other I/O problem while
    /// talking to the server.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request could not be signed. It is never sent unsigned instead.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A 200 response body did not match the expected target type.
    #[error("deserialization failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// A non-200 response whose body is not an error-details record.
    #[error("Unable to parse error details (HTTP {status})")]
    UnparsableErrorDetails {
        status: u16,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A server-reported error of the client's own family.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A server-reported unchecked error from outside the family, raised as-is.
    #[error(transparent)]
    Foreign(#[from] ForeignError),

    /// The server named a kind the client cannot turn into an error value.
    #[error("{0}")]
    Configuration(String),
}

impl ClientError {
    pub(crate) fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ClientError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wire name of the server-side kind, when the error came from the server.
    pub fn kind(&self) -> Option<&str> {
        match self {
            ClientError::Game(e) => Some(&e.kind),
            ClientError::Foreign(e) => Some(&e.class),
            _ => None,
        }
    }
}

/// An error of the word-game family, rebuilt from a server payload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct GameError {
    pub kind: String,
    pub message: String,
    /// Constructor arguments the server sent along. Empty when the kind was
    /// built from its message alone.
    pub params: Vec<Value>,
    #[source]
    pub cause: Option<Box<ForeignError>>,
}

impl GameError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            params: Vec::new(),
            cause: None,
        }
    }

    /// The family's generic base error.
    pub fn base(message: impl Into<String>) -> Self {
        Self::new(BASE_KIND, message)
    }

    pub fn with_params(kind: impl Into<String>, message: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            params,
            ..Self::new(kind, message)
        }
    }

    pub fn caused_by(mut self, cause: ForeignError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_base(&self) -> bool {
        self.kind == BASE_KIND
    }
}

/// A server-side error type that lives outside the word-game family.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{class}: {message}")]
pub struct ForeignError {
    pub class: String,
    pub message: String,
}

/// Failures of the OAuth signing step.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The request or credentials are not in a signable shape.
    #[error("OAuth expectation failed: {0}")]
    ExpectationFailed(String),

    /// Computing the signature itself failed.
    #[error("OAuth message signing failed: {0}")]
    MessageSigner(String),
}
