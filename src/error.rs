/// Error type for darwin-memwatch operations
///
/// Source errors (`SourceUnavailable`, `ExternalToolFailure`, `ParseAnomaly`, `PowerQueryFailure`) are handled
/// inside the sampler and only surface through the component APIs that produce them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A kernel or OS query returned a non-success status
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// An external utility failed to launch, timed out or produced no usable output
    #[error("External tool failure: {0}")]
    ExternalToolFailure(String),

    /// Output from an external utility did not have the expected shape
    #[error("Parse anomaly: {0}")]
    ParseAnomaly(String),

    /// Power-source descriptors could not be read
    #[error("Power query failure: {0}")]
    PowerQueryFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sampler stopped")]
    SamplerStopped,
}

impl Error {
    pub(crate) fn source_unavailable<S: Into<String>>(msg: S) -> Self {
        Error::SourceUnavailable(msg.into())
    }

    pub(crate) fn external_tool<S: Into<String>>(msg: S) -> Self {
        Error::ExternalToolFailure(msg.into())
    }

    pub(crate) fn parse_anomaly<S: Into<String>>(msg: S) -> Self {
        Error::ParseAnomaly(msg.into())
    }

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub(crate) fn power_query<S: Into<String>>(msg: S) -> Self {
        Error::PowerQueryFailure(msg.into())
    }

    pub(crate) fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Error::InvalidConfig(msg.into())
    }
}

/// Result type for darwin-memwatch operations
pub type Result<T> = std::result::Result<T, Error>;
