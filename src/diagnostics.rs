// Structured warnings: non-fatal findings are values, not log side effects.

use std::fmt;
use std::path::PathBuf;

/// A non-fatal finding made while reading layout documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A text line carries more than one transcription for the selected index.
    DuplicateTranscription {
        page_id: String,
        line_id: String,
        count: usize,
    },
    /// The image filename declared in the layout does not match the image path.
    ImageFilenameMismatch {
        image_path: PathBuf,
        declared: String,
    },
    /// The layout document paired with an image does not exist and was skipped.
    MissingDocument { path: PathBuf },
    /// A line was dropped because it has no usable transcription.
    SkippedLine {
        page_id: String,
        line_id: String,
        reason: SkipReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Commented,
    TextMissing,
    EmptyText,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateTranscription {
                page_id,
                line_id,
                count,
            } => write!(
                f,
                "PageXML is invalid: line '{line_id}' on page '{page_id}' has {count} transcriptions for the same index"
            ),
            Diagnostic::ImageFilenameMismatch {
                image_path,
                declared,
            } => write!(
                f,
                "Mapping of image file to xml file invalid: {} vs {declared}",
                image_path.display()
            ),
            Diagnostic::MissingDocument { path } => {
                write!(f, "File '{}' does not exist, skipping", path.display())
            }
            Diagnostic::SkippedLine {
                page_id,
                line_id,
                reason,
            } => write!(f, "Skipping line '{line_id}' on page '{page_id}': {reason:?}"),
        }
    }
}

/// Receiver of [`Diagnostic`] records.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards every diagnostic to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::SkippedLine { .. } => tracing::debug!("{diagnostic}"),
            _ => tracing::warn!("{diagnostic}"),
        }
    }
}
