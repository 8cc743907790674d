//! Rendering module for serializing extraction results.

mod json;

pub use json::{to_json, ErrorBody, JsonFormat, UploadResponse, MSG_PROCESSED, MSG_PROCESSING_FAILED};
