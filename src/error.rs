//! Error handling for the evicache library
//!
//! Every public cache operation reports failure through [`CacheError`]. Argument
//! errors are returned without side effects; resource exhaustion and internal
//! failures are logged with the operation name before being returned.

use thiserror::Error;

/// Main error type for the evicache library
#[derive(Error, Debug)]
pub enum CacheError {
    /// Empty key, missing value or an out-of-range parameter
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument
        message: String,
    },

    /// Memory could not be reserved while mutating the cache
    #[error("Resource exhausted in {operation}: could not reserve {requested} additional slots")]
    ResourceExhaustion {
        /// Operation that attempted the reservation
        operation: &'static str,
        /// Number of additional slots requested
        requested: usize,
    },

    /// Broken internal invariant; indicates a bug
    #[error("Internal error in {operation}: {message}")]
    Internal {
        /// Operation that detected the failure
        operation: &'static str,
        /// Description of the violated invariant
        message: String,
    },

    /// An eviction callback panicked; contained by the notifier
    #[error("Eviction callback failed for key '{key}': {message}")]
    CallbackFailure {
        /// Evicted key the callback was invoked with
        key: String,
        /// Panic payload rendered as text
        message: String,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a resource exhaustion error
    pub fn resource_exhaustion(operation: &'static str, requested: usize) -> Self {
        Self::ResourceExhaustion {
            operation,
            requested,
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(operation: &'static str, message: S) -> Self {
        Self::Internal {
            operation,
            message: message.into(),
        }
    }

    /// Create a callback failure error
    pub fn callback_failure<K: Into<String>, S: Into<String>>(key: K, message: S) -> Self {
        Self::CallbackFailure {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// After a resource exhaustion or internal error the cache structures can no
    /// longer be trusted, so neither is recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidArgument { .. } => true,
            Self::CallbackFailure { .. } => true,
            Self::Io(_) => true,
            Self::ResourceExhaustion { .. } => false,
            Self::Internal { .. } => false,
            Self::Configuration { .. } => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "argument",
            Self::ResourceExhaustion { .. } => "memory",
            Self::Internal { .. } => "internal",
            Self::CallbackFailure { .. } => "callback",
            Self::Configuration { .. } => "config",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CacheError>;

/// Reject keys that are empty after trimming whitespace
#[inline]
pub fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        Err(CacheError::invalid_argument("key must not be empty or whitespace"))
    } else {
        Ok(())
    }
}
