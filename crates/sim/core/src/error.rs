//! Error type for decoding SIM elementary files
//!
//! Every decoder in this crate reports failures through [`Error`]. The session
//! layer treats all of them the same way: the file is skipped and bring-up
//! continues as if the read had failed.

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Decoder error
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The file or record is shorter than the layout requires
    #[error("Invalid length: expected at least {expected}, got {actual}")]
    InvalidLength {
        /// Minimum length required
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// The content does not follow the expected layout
    #[error("Invalid data: {0}")]
    InvalidData(&'static str),

    /// The content is well formed but uses an encoding this crate does not handle
    #[error("Unsupported: {0}")]
    Unsupported(&'static str),

    /// Context error with message and source error
    #[error("{context}: {source}")]
    Context {
        /// Contextual message
        context: String,
        /// Source error
        source: Box<Self>,
    },
}

impl Error {
    /// Create a new error with context information
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Fail unless `actual` is at least `expected`
    pub const fn ensure_len(actual: usize, expected: usize) -> Result<()> {
        if actual < expected {
            Err(Self::InvalidLength { expected, actual })
        } else {
            Ok(())
        }
    }
}

/// Extension trait for decoder results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<S: Into<String>>(self, context: S) -> Self {
        self.map_err(|e| e.with_context(context))
    }
}
