//! Error types for the document Q&A service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Document Q&A errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed request input
    #[error("{0}")]
    BadRequest(String),

    /// Named document was never uploaded
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Embedding backend error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Generation backend error
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status this error maps to at the request boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "bad_request",
            Error::DocumentNotFound(_) => "not_found",
            Error::Config(_) => "config_error",
            Error::FileParse { .. } => "parse_error",
            Error::Embedding(_) => "embedding_error",
            Error::Llm(_) => "llm_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

/// Lets one build outcome be handed to every waiting caller. IO errors are rebuilt
/// from their kind and message.
impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Error::BadRequest(m) => Error::BadRequest(m.clone()),
            Error::DocumentNotFound(m) => Error::DocumentNotFound(m.clone()),
            Error::Config(m) => Error::Config(m.clone()),
            Error::FileParse { filename, message } => Error::FileParse {
                filename: filename.clone(),
                message: message.clone(),
            },
            Error::Embedding(m) => Error::Embedding(m.clone()),
            Error::Llm(m) => Error::Llm(m.clone()),
            Error::Io(e) => Error::Io(std::io::Error::new(e.kind(), e.to_string())),
            Error::Internal(m) => Error::Internal(m.clone()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_client_errors() {
        assert_eq!(
            Error::bad_request("missing").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::DocumentNotFound("a.pdf".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_backend_errors_are_server_errors() {
        assert_eq!(
            Error::embedding("rate limited").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::llm("model not found").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::file_parse("x.pdf", "bad xref").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_clone_keeps_status_and_message() {
        let missing = Error::DocumentNotFound("uploads/a.pdf".into());
        assert_eq!(missing.clone().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.clone().to_string(), missing.to_string());

        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        match io.clone() {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied),
            other => panic!("unexpected clone: {:?}", other),
        }
        assert_eq!(io.clone().to_string(), io.to_string());
    }

    #[test]
    fn test_bad_request_message_is_verbatim() {
        let err = Error::bad_request("'filename' and 'question' are required");
        assert_eq!(err.to_string(), "'filename' and 'question' are required");
    }
}
