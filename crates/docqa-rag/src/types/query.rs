//! Request bodies

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Body of `POST /ask`
///
/// Both fields are optional at the serde level so a missing field is reported
/// as a 400 with a readable message instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    /// Name of a previously uploaded file
    #[serde(default)]
    pub filename: Option<String>,
    /// Natural-language question
    #[serde(default)]
    pub question: Option<String>,
}

impl AskRequest {
    /// Return `(filename, question)` or a bad request error if either is missing or blank
    pub fn required_fields(&self) -> Result<(&str, &str)> {
        let filename = self.filename.as_deref().map(str::trim).unwrap_or_default();
        let question = self.question.as_deref().map(str::trim).unwrap_or_default();

        if filename.is_empty() || question.is_empty() {
            return Err(Error::bad_request("'filename' and 'question' are required"));
        }
        Ok((filename, question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_question_rejected() {
        let req: AskRequest = serde_json::from_str(r#"{"filename": "a.pdf"}"#).unwrap();
        assert!(matches!(req.required_fields(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_blank_filename_rejected() {
        let req: AskRequest =
            serde_json::from_str(r#"{"filename": "  ", "question": "why?"}"#).unwrap();
        assert!(req.required_fields().is_err());
    }

    #[test]
    fn test_fields_trimmed() {
        let req: AskRequest =
            serde_json::from_str(r#"{"filename": "a.pdf ", "question": " What is Beta? "}"#)
                .unwrap();
        assert_eq!(req.required_fields().unwrap(), ("a.pdf", "What is Beta?"));
    }
}
