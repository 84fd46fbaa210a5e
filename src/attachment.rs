//! Attachment validation
//!
//! A single file may be staged onto the next outgoing user message. The
//! declared MIME type decides whether it is accepted; file extensions are
//! only used to pre-filter what a picker offers.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Extensions offered by the file picker. Advisory only.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "txt", "doc", "docx"];

const PDF_MIME: &str = "application/pdf";
const TEXT_MIME_PREFIX: &str = "text/";

/// A file reference staged for the next user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    /// Build a candidate whose MIME type is guessed from the file name.
    /// Unknown extensions get `application/octet-stream`.
    pub fn guess(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self::new(name, mime_type, size)
    }

    /// Text appended to the user message that carries this attachment
    pub fn annotation(&self) -> String {
        format!(" [Document: {}]", self.name)
    }
}

/// Why an attachment was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("Unsupported attachment type {mime_type} for {name}")]
    UnsupportedType { name: String, mime_type: String },
}

impl AttachmentError {
    /// Short notice shown to the user
    pub fn hint(&self) -> &'static str {
        match self {
            AttachmentError::UnsupportedType { .. } => "Please select a PDF or text file",
        }
    }
}

/// Accept PDFs and any `text/*` type, reject everything else.
///
/// `None` means nothing was selected, which is not a rejection.
pub fn validate(file: Option<Attachment>) -> Result<Option<Attachment>, AttachmentError> {
    let Some(file) = file else {
        return Ok(None);
    };

    if is_supported_mime(&file.mime_type) {
        Ok(Some(file))
    } else {
        Err(AttachmentError::UnsupportedType {
            name: file.name,
            mime_type: file.mime_type,
        })
    }
}

fn is_supported_mime(mime_type: &str) -> bool {
    mime_type == PDF_MIME || mime_type.starts_with(TEXT_MIME_PREFIX)
}

/// Whether a file name carries one of the picker's extensions
pub fn has_accepted_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
}
