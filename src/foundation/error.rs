/// Convenience result type used across pixelgrab.
pub type GrabResult<T> = Result<T, GrabError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum GrabError {
    /// Invalid user-provided coordinates, dates or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failures and unexpected HTTP statuses.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Tile payloads or images that could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Canvas metadata or time-list responses that are unusable.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// A retry budget was spent without a successful attempt.
    #[error("could not get {what} in {attempts} attempts: {last}")]
    Exhausted {
        /// Resource that was being fetched.
        what: String,
        /// Number of attempts made.
        attempts: u32,
        /// Error of the final attempt.
        #[source]
        last: Box<GrabError>,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GrabError {
    /// Build a [`GrabError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GrabError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`GrabError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`GrabError::Metadata`] value.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    /// Build a [`GrabError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
