//! JSON rendering of extraction results and HTTP envelopes.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ExtractionResult;

/// Message sent with every successful upload.
pub const MSG_PROCESSED: &str = "File processed successfully";

/// Prefix of the message sent when extraction fails.
pub const MSG_PROCESSING_FAILED: &str = "An error occurred during processing";

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any value in the requested format.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Body of a successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub data: ExtractionResult,
}

impl UploadResponse {
    pub fn new(data: ExtractionResult) -> Self {
        Self {
            message: MSG_PROCESSED.to_string(),
            data,
        }
    }
}

/// Body of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Body for an error: client errors verbatim, anything else behind the
    /// processing-failure prefix.
    pub fn from_error(err: &Error) -> Self {
        if err.is_client_error() {
            Self::new(err.to_string())
        } else {
            Self::new(format!("{}: {}", MSG_PROCESSING_FAILED, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableRecord;

    fn sample() -> ExtractionResult {
        ExtractionResult::new(
            "Invoice 42".to_string(),
            4,
            1,
            vec![TableRecord::new(1, vec![vec!["Item".into(), "Qty".into()]])],
            vec![],
        )
    }

    #[test]
    fn test_to_json_formats() {
        let pretty = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(pretty.contains('\n'));
        assert!(pretty.contains("\"tokenCount\": 4"));

        let compact = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!compact.contains('\n'));
        assert!(compact.contains("\"pageCount\":1"));
    }

    #[test]
    fn test_upload_envelope() {
        let value = serde_json::to_value(UploadResponse::new(sample())).unwrap();
        assert_eq!(value["message"], "File processed successfully");
        assert_eq!(value["data"]["text"], "Invoice 42");
        assert_eq!(value["data"]["tables"][0]["data"][0][0], "Item");
    }

    #[test]
    fn test_error_body() {
        let body = ErrorBody::from_error(&Error::InvalidInput("No file selected".into()));
        assert_eq!(body.error, "No file selected");

        let body = ErrorBody::from_error(&Error::Extraction("bad xref".into()));
        assert_eq!(
            body.error,
            "An error occurred during processing: Extraction failed: bad xref"
        );

        let json = to_json(&body, JsonFormat::Compact).unwrap();
        assert!(json.starts_with("{\"error\":"));
    }
}
