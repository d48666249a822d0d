use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The resource exists but is not a firehose.
    #[error("resource kind `{0}` is not a firehose")]
    WrongKind(String),

    #[error("resource has no spec")]
    MissingSpec,

    #[error("failed to encode structured value: {0}")]
    Encode(String),

    #[error("failed to decode structured value: {0}")]
    Decode(String),

    #[error("invalid action params: {0}")]
    InvalidParams(String),

    #[error("unable to parse firehose name")]
    ReleaseName,
}
