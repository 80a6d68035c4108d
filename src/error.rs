//! Crate-level error types.
//!
//! [`RsiwatchError`] unifies every error source (configuration, candle
//! fetches, notification delivery, JSON) behind a single enum so callers can
//! match on the variant they care about while still using the `?` operator
//! for easy propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RsiwatchError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum RsiwatchError {
    /// Configuration is missing, unparsable, or violates the threshold ordering.
    #[error("configuration error: {0}")]
    Config(String),

    /// Not enough (or no) candle data for a market this cycle.
    #[error("data unavailable for {market}: {reason}")]
    DataUnavailable { market: String, reason: String },

    /// A notification could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// An HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a local file failed.
    #[error("io error: {0}")]
    Io(String),

    /// A response did not have the expected shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
}
