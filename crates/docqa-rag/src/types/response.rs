//! Response bodies

use serde::{Deserialize, Serialize};

/// Body returned by `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

impl UploadResponse {
    /// The file was stored and its index is ready
    pub fn indexed(filename: impl Into<String>) -> Self {
        Self {
            message: "File uploaded and indexed".to_string(),
            filename: filename.into(),
        }
    }

    /// The file was stored; indexing happens on the first question
    pub fn stored(filename: impl Into<String>) -> Self {
        Self {
            message: "File uploaded".to_string(),
            filename: filename.into(),
        }
    }
}

/// Body returned by `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// The generated answer
    pub message: String,
}
