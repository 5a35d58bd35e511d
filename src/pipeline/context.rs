//! Per-request context assembled from uploads.
//!
//! Two views are kept side by side: a labelled text blob (later truncated for
//! the refiner) and the ordered model inputs for the drafting call.

use tracing::{debug, warn};

use crate::ai::ContentPart;
use crate::config::LimitsConfig;
use crate::extract::{self, DocumentKind, ExtractError, Extracted, Upload};
use crate::types::truncate_chars;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContext {
    text: String,
    inputs: Vec<ContentPart>,
}

impl ExtractedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every upload in arrival order
    pub fn from_uploads(uploads: &[Upload], limits: &LimitsConfig) -> Self {
        let mut context = Self::new();
        for upload in uploads {
            context.record(&upload.filename, extract::extract(upload), limits);
        }
        context
    }

    /// Fold one extraction outcome into the context.
    ///
    /// Parse failures still contribute a labelled, empty entry; unsupported
    /// uploads and undecodable images contribute nothing.
    pub fn record(
        &mut self,
        filename: &str,
        outcome: Result<Extracted, ExtractError>,
        limits: &LimitsConfig,
    ) {
        match outcome {
            Ok(Extracted::Text { kind, text }) => {
                debug!(filename, %kind, chars = text.chars().count(), "Extracted document text");
                self.push_text(kind, filename, &text, limits.file_excerpt_chars);
            }
            Ok(Extracted::Image(image)) => {
                debug!(filename, ?image, "Decoded image upload");
                self.text
                    .push_str(&format!("\n[{}: {}]", blob_label(DocumentKind::Image), filename));
                self.inputs.push(ContentPart::Image(image));
            }
            Err(ExtractError::Parse { kind, message }) => {
                warn!(filename, %kind, "Extraction failed, using empty text: {}", message);
                self.push_text(kind, filename, "", limits.file_excerpt_chars);
            }
            Err(e @ ExtractError::UnsupportedFormat { .. }) => {
                debug!("Skipping upload: {}", e);
            }
            Err(e @ ExtractError::ImageDecode(_)) => {
                warn!(filename, "Skipping image upload: {}", e);
            }
        }
    }

    fn push_text(&mut self, kind: DocumentKind, filename: &str, text: &str, max_chars: usize) {
        let excerpt = truncate_chars(text, max_chars);

        self.text
            .push_str(&format!("\n[{}: {}]\n{}", blob_label(kind), filename, excerpt));
        if let Some(label) = input_label(kind) {
            self.inputs
                .push(ContentPart::text(format!("\n[{}]\n{}", label, excerpt)));
        }
    }

    /// Labelled text of every upload
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Ordered drafting inputs (text excerpts and images)
    pub fn inputs(&self) -> &[ContentPart] {
        &self.inputs
    }

    /// Context forwarded to the refiner, capped at `max_chars`
    pub fn refine_context(&self, max_chars: usize) -> &str {
        truncate_chars(&self.text, max_chars)
    }
}

/// Label used in the refiner's text blob
fn blob_label(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Pdf => "PDF",
        DocumentKind::Word => "Word Doc",
        DocumentKind::Image => "Image",
    }
}

/// Header of a drafting text input; images are sent inline instead
fn input_label(kind: DocumentKind) -> Option<&'static str> {
    match kind {
        DocumentKind::Pdf => Some("PDF Content"),
        DocumentKind::Word => Some("Doc Content"),
        DocumentKind::Image => None,
    }
}
