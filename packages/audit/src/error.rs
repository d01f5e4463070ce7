use thiserror::Error;

/// Failure modes of a single audit run.
///
/// A membership with a missing user reference is not an error; the detector
/// skips it silently.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to connect to the document store")]
    Connect(#[source] anyhow::Error),

    #[error("failed to read clubs from the store")]
    Query(#[source] anyhow::Error),

    #[error("failed to write report")]
    Report(#[from] std::io::Error),
}
