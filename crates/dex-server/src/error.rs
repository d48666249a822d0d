//! API error kinds and their HTTP rendering.
//!
//! Backend gRPC codes are translated here and nowhere else.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::siren::AlertError;

pub const FIREHOSE_NOT_FOUND: &str = "no firehose with given URN";

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Invalid,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable tag rendered as `code` in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Invalid => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal_error",
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::Invalid => "Request is not valid",
            ErrorKind::NotFound => "Requested entity not found",
            ErrorKind::Conflict => "An entity with conflicting identifier exists",
            ErrorKind::Internal => "Some unexpected error occurred",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    cause: Option<String>,
}

impl ApiError {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            cause: None,
        }
    }

    pub fn invalid() -> Self {
        Self::new(ErrorKind::Invalid)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    pub fn conflict() -> Self {
        Self::new(ErrorKind::Conflict)
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    pub fn firehose_not_found() -> Self {
        Self::not_found().with_message(FIREHOSE_NOT_FOUND)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Any backend failure without a dedicated mapping.
    pub fn from_status(status: tonic::Status) -> Self {
        tracing::warn!(code = ?status.code(), message = status.message(), "backend call failed");
        Self::internal().with_cause(status.message())
    }

    /// Project lookups: a missing project is `NotFound`.
    pub fn from_project_status(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::NotFound => Self::not_found(),
            _ => Self::from_status(status),
        }
    }

    /// Mutations on an existing firehose (update, delete, actions).
    pub fn from_action_status(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::InvalidArgument => Self::invalid().with_cause(status.message()),
            tonic::Code::NotFound => Self::firehose_not_found().with_cause(status.message()),
            _ => Self::from_status(status),
        }
    }

    pub fn from_create_status(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::AlreadyExists => Self::conflict().with_cause(status.message()),
            _ => Self::from_status(status),
        }
    }

    /// Log streams, both when opening and mid-stream. Only `NotFound` keeps
    /// its meaning; everything else is an internal error.
    pub fn from_log_status(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::NotFound => Self::not_found(),
            _ => Self::from_status(status),
        }
    }

    /// Rejects a request body that is not valid JSON for the expected shape.
    pub fn invalid_body(err: impl std::fmt::Display) -> Self {
        Self::invalid()
            .with_message("json body is not valid")
            .with_cause(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {} ({cause})", self.kind.code(), self.message),
            None => write!(f, "{}: {}", self.kind.code(), self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<dex_firehose::Error> for ApiError {
    fn from(err: dex_firehose::Error) -> Self {
        use dex_firehose::Error;

        match err {
            Error::WrongKind(_) => Self::firehose_not_found(),
            Error::InvalidParams(msg) => Self::invalid().with_cause(msg),
            Error::ReleaseName => Self::internal().with_message(err.to_string()),
            Error::MissingSpec | Error::Encode(_) | Error::Decode(_) => {
                Self::internal().with_cause(err.to_string())
            }
        }
    }
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        match err {
            AlertError::NotFound(cause) => Self::not_found().with_cause(cause),
            other => {
                tracing::warn!(error = %other, "alert service call failed");
                Self::internal().with_cause(other.to_string())
            }
        }
    }
}

impl ApiError {
    fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            code: self.kind.code(),
            message: &self.message,
            cause: self.cause.as_deref(),
        }
    }

    /// The rendered error body as one JSON line, for streaming responses
    /// whose status line has already been sent.
    pub fn to_json_line(&self) -> String {
        let mut line = serde_json::to_string(&self.body()).unwrap_or_default();
        line.push('\n');
        line
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.kind.status(), Json(self.body())).into_response()
    }
}
