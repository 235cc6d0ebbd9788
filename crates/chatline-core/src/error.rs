use std::time::Duration;

/// Why a submission produced no message. Neither case is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("message is empty")]
    Empty,
    #[error("a request is already in flight")]
    Busy,
}

/// A theme name that is neither `light` nor `somber`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme '{0}', use light or somber")]
pub struct UnknownMode(pub String);

/// Transport failure detail. Only ever logged; the conversation shows a
/// single generic notice for all of these.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build http client: {0}")]
    ClientBuild(String),
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("request ended without a result: {0}")]
    Aborted(String),
}
