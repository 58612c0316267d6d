use aws_sdk_dynamodb::error::BuildError;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

use crate::client::Operation;

/// Boxed source error handed over by a [`StoreClient`](crate::StoreClient).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Store error code reported when a conditional write is rejected
const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailedException";

/// Mapping and orchestration error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input detected before any request was issued
    #[error("validation failed: {0}")]
    Validation(String),
    /// A native value could not be encoded for the wire
    #[error("cannot encode field `{field}`: {reason}")]
    Encoding {
        /// Field being encoded
        field: String,
        /// What went wrong
        reason: String,
    },
    /// A wire attribute could not be decoded into a native value
    #[error("cannot decode field `{field}`: {reason}")]
    Decoding {
        /// Field being decoded
        field: String,
        /// What went wrong
        reason: String,
    },
    /// A wire attribute had no recognised populated variant
    #[error("unknown wire type: {0}")]
    UnknownWireType(String),
    /// Error raised by the store client, passed through unchanged
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The store answered with a payload of unexpected shape
    #[error("malformed {operation} response: {source}")]
    Response {
        /// Operation whose response was malformed
        operation: Operation,
        /// Parse failure
        source: serde_json::Error,
    },
    /// Unprocessed keys or items were still reported after the retry ceiling
    #[error("{operation} still reported unprocessed requests after {retries} retries")]
    RetryLimitExceeded {
        /// Batch operation being retried
        operation: Operation,
        /// Number of resubmissions made
        retries: usize,
    },
    /// A paginated read returned more pages than allowed
    #[error("{operation} exceeded the page limit of {max_pages}")]
    PageLimitExceeded {
        /// List operation being paginated
        operation: Operation,
        /// Configured page ceiling
        max_pages: usize,
    },
    /// A request payload could not be serialized
    #[error("request serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// DynamoDB request builder error
    #[error("DynamoDB request builder error: {0}")]
    Build(#[from] BuildError),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create an encoding error for `field`
    ///
    /// Custom transforms use this to reject values they cannot handle.
    pub fn encoding(field: &str, reason: impl Into<String>) -> Self {
        Error::Encoding {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a decoding error for `field`
    pub fn decoding(field: &str, reason: impl Into<String>) -> Self {
        Error::Decoding {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if the error was raised before any request was sent
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if the error is a codec error
    ///
    /// Returns `true` for encoding, decoding and unknown wire type errors.
    pub fn is_encoding_error(&self) -> bool {
        matches!(
            self,
            Error::Encoding { .. } | Error::Decoding { .. } | Error::UnknownWireType(_)
        )
    }

    /// Check if the error came from the store client
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if the store rejected a conditional write
    ///
    /// This is useful for detecting optimistic locking failures when using
    /// `expected` conditions on put, delete or update.
    ///
    /// # Example
    /// ```no_run
    /// # use dynamo_mapper::Error;
    /// # fn example(error: Error) {
    /// if error.is_conditional_check_failed() {
    ///     // Handle optimistic locking failure
    ///     println!("Item was modified by another process");
    /// }
    /// # }
    /// ```
    pub fn is_conditional_check_failed(&self) -> bool {
        matches!(self, Error::Transport(e) if e.code() == Some(CONDITIONAL_CHECK_FAILED))
    }
}

/// Opaque error returned by a store client
///
/// Carries the operation that failed and, when the store reported one, its error code.
#[derive(Debug)]
pub struct TransportError {
    operation: Operation,
    code: Option<String>,
    source: BoxError,
}

impl TransportError {
    /// Wrap a client error for `operation`
    pub fn new(operation: Operation, source: impl Into<BoxError>) -> Self {
        Self {
            operation,
            code: None,
            source: source.into(),
        }
    }

    /// Attach the store's error code (e.g. `ProvisionedThroughputExceededException`)
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Operation that failed
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Store error code, if any
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} request failed ({}): {}", self.operation, code, self.source),
            None => write!(f, "{} request failed: {}", self.operation, self.source),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}
