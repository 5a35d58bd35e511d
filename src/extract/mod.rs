//! Upload Extraction
//!
//! Turns uploaded files into drafting context: text for PDF and Word
//! documents, decoded images for image uploads.
//!
//! Extraction is best-effort. Callers receive a typed [`ExtractError`] and
//! decide how to degrade; nothing here aborts a request.

mod docx;
mod image;
mod pdf;

pub use docx::extract_docx_text;
pub use self::image::decode_image;
pub use pdf::{extract_pdf_text, parser_panic_contained};

use std::fmt;

use thiserror::Error;

use crate::ai::ImageInput;

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const DOC_MIME: &str = "application/msword";

/// A file received with a request
#[derive(Clone)]
pub struct Upload {
    /// Client-supplied file name (may be empty)
    pub filename: String,
    /// Declared content type (may be empty)
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl Upload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::detect(&self.filename, &self.content_type)
    }
}

/// Supported upload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    Image,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Word => write!(f, "word"),
            Self::Image => write!(f, "image"),
        }
    }
}

impl DocumentKind {
    /// Detect the kind from the file name first, then the declared type.
    ///
    /// Extensions win: a `.pdf` declared as `image/png` is still a PDF.
    pub fn detect(filename: &str, content_type: &str) -> Option<Self> {
        let name = filename.to_lowercase();
        if name.ends_with(".pdf") {
            return Some(Self::Pdf);
        }
        if name.ends_with(".docx") || name.ends_with(".doc") {
            return Some(Self::Word);
        }

        let content_type = content_type.trim().to_lowercase();
        if content_type.starts_with("image/") {
            return Some(Self::Image);
        }

        // Only consulted when the name carries no known extension
        match essence(&content_type) {
            PDF_MIME => Some(Self::Pdf),
            DOCX_MIME | DOC_MIME => Some(Self::Word),
            _ => None,
        }
    }
}

/// Strip parameters such as `; charset=binary`
fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

/// Extraction output for one upload
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Text { kind: DocumentKind, text: String },
    Image(ImageInput),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to parse {kind} document: {message}")]
    Parse { kind: DocumentKind, message: String },

    #[error("Unsupported upload '{filename}' ({content_type})")]
    UnsupportedFormat {
        filename: String,
        content_type: String,
    },

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),
}

impl ExtractError {
    pub fn parse(kind: DocumentKind, message: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            message: message.into(),
        }
    }
}

/// Extract drafting context from a single upload.
///
/// CPU-bound; async callers should run it on a blocking thread.
pub fn extract(upload: &Upload) -> Result<Extracted, ExtractError> {
    let kind = upload
        .kind()
        .ok_or_else(|| ExtractError::UnsupportedFormat {
            filename: upload.filename.clone(),
            content_type: upload.content_type.clone(),
        })?;

    match kind {
        DocumentKind::Pdf => Ok(Extracted::Text {
            kind,
            text: extract_pdf_text(&upload.bytes)?,
        }),
        DocumentKind::Word => Ok(Extracted::Text {
            kind,
            text: extract_docx_text(&upload.bytes)?,
        }),
        DocumentKind::Image => decode_image(&upload.bytes).map(Extracted::Image),
    }
}
