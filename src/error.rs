//! Error types for rcpreview operations.

use thiserror::Error;

/// Errors that can occur while rendering a preview.
///
/// Per-row and per-quote problems never surface here: malformed TSV rows are
/// dropped and alignment misses leave an empty gateway quote. Only failures
/// that make a whole resource untrustworthy, or that leave nothing to render,
/// become an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Malformed TSV: {0}")]
    MalformedTsv(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("This resource does not support the rendering of the book `{0}`.")]
    BookNotSupported(String),

    #[error("There are no books in this resource to render.")]
    NoBooks,

    #[error("Nothing to render: {0}")]
    NoContent(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl Error {
    /// Message suitable for a status line in the UI.
    ///
    /// Input-absent errors are phrased for end users; everything else is
    /// reported generically so internal details do not leak into the page.
    pub fn user_message(&self) -> String {
        match self {
            Error::BookNotSupported(_) | Error::NoBooks | Error::NoContent(_) => self.to_string(),
            Error::MalformedTsv(_) => format!("Unable to read this resource: {self}"),
            _ => "An error occurred while generating the preview.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
