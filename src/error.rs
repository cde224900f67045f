use thiserror::Error;

/// Coarse classification of failures, as seen by callers of [`crate::run`].
///
/// Everything except a missing sheet is an I/O problem: the file is absent,
/// unreadable, not a zip package, or its workbook parts are malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    NotFound,
}

#[derive(Debug, Error)]
pub enum Xlsx2TsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error in '{part}': {message}")]
    Xml { part: String, message: String },

    #[error("workbook part '{0}' is missing")]
    MissingPart(String),

    #[error("sheet '{0}' not found")]
    SheetNotFound(String),
}

impl Xlsx2TsvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Xlsx2TsvError::SheetNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Io,
        }
    }

    pub(crate) fn xml(part: &str, e: impl std::fmt::Display) -> Self {
        Xlsx2TsvError::Xml {
            part: part.to_string(),
            message: e.to_string(),
        }
    }

    /// True when stdout was closed by the consumer (`xlsx2tsv ... | head`).
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Xlsx2TsvError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}
