//! Form state, validation, and multipart assembly.
//!
//! [`FormInput`] is the raw state of the form as the user left it. Validation turns it into a
//! [`FormSnapshot`], the only value that can be sent. The two actions validate differently:
//! the primary upload requires a numeric `app_id`, the debug echo only requires a file.

use std::path::Path;

use bytes::Bytes;
use reqwest::Body;
use reqwest::multipart::{Form, Part};

use crate::errors::{Result, ValidationError};

/// Multipart field names. These are part of the contract with the service.
pub const FIELD_PRODUCT: &str = "product";
pub const FIELD_VERSION: &str = "version";
pub const FIELD_APP_ID: &str = "app_id";
pub const FIELD_FILE: &str = "file";

/// A file chosen by the user, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    /// Wrap in-memory content, guessing the content type from the filename's extension.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename).first_or_octet_stream().to_string();
        Self {
            filename,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. Only the final path component is kept as the filename.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{} is not a file", path.display())))?;

        tracing::debug!(filename = %filename, size = bytes.len(), "Loaded selected file");
        Ok(Self::new(filename, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Everything the user has entered, valid or not.
#[derive(Debug, Clone, Default)]
pub struct FormInput {
    pub product: String,
    pub version: String,
    pub app_id: String,
    pub file: Option<SelectedFile>,
}

impl FormInput {
    /// Validate for the primary upload: a file must be selected and `app_id` must be numeric.
    pub fn validate_for_upload(&self) -> std::result::Result<FormSnapshot, ValidationError> {
        let file = self.file.clone().ok_or(ValidationError::MissingFile)?;
        if !is_valid_app_id(&self.app_id) {
            return Err(ValidationError::InvalidAppId);
        }
        Ok(self.snapshot(file))
    }

    /// Validate for the debug echo: only the file is required.
    pub fn validate_for_debug(&self) -> std::result::Result<FormSnapshot, ValidationError> {
        let file = self.file.clone().ok_or(ValidationError::MissingFile)?;
        Ok(self.snapshot(file))
    }

    fn snapshot(&self, file: SelectedFile) -> FormSnapshot {
        FormSnapshot {
            product: self.product.clone(),
            version: self.version.clone(),
            app_id: self.app_id.clone(),
            file,
        }
    }
}

/// Returns true when `app_id` is non-empty and made only of ASCII decimal digits.
pub fn is_valid_app_id(app_id: &str) -> bool {
    !app_id.is_empty() && app_id.bytes().all(|b| b.is_ascii_digit())
}

/// Validated form contents, captured at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub product: String,
    pub version: String,
    pub app_id: String,
    pub file: SelectedFile,
}

impl FormSnapshot {
    /// Build the multipart body: three text fields followed by the file part.
    pub fn to_multipart(&self) -> Result<Form> {
        // Bytes clones share the buffer
        let body = Body::from(self.file.bytes.clone());
        let part = Part::stream_with_length(body, self.file.len() as u64)
            .file_name(self.file.filename.clone())
            .mime_str(&self.file.content_type)?;

        Ok(Form::new()
            .text(FIELD_PRODUCT, self.product.clone())
            .text(FIELD_VERSION, self.version.clone())
            .text(FIELD_APP_ID, self.app_id.clone())
            .part(FIELD_FILE, part))
    }
}
