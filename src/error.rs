//! Error types and the accumulated failure state of a chain.
//!
//! Transform chains never unwind. The first error poisons the owning
//! [`Image`](crate::Image) and every later operation becomes a no-op that may
//! only *append* to the failure, so the full causal history is still there
//! when the caller inspects the chain once, at the end.

use std::fmt;
use thiserror::Error;

/// Result type alias for fallible operations outside the fluent chain.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, transforming or exporting an image.
#[derive(Debug, Error)]
pub enum Error {
    /// A string or byte source was empty.
    #[error("source is empty")]
    EmptySource,

    /// The source could not be resolved into an image.
    #[error("source not supported")]
    UnsupportedSource,

    /// Magic-number sniffing found no known format (or fewer than 2 bytes).
    #[error("image format not supported")]
    UnsupportedFormat,

    /// The source carried no pixels (zero-sized buffer).
    #[error("source image has no pixels")]
    NilImage,

    /// Save/export was asked for a format outside {png, jpg, jpeg, tiff, bmp}.
    #[error("save format not supported: {0:?}")]
    UnsupportedSaveFormat(String),

    /// A convolution kernel that cannot be normalized or applied.
    #[error("invalid kernel: {0}")]
    InvalidKernel(&'static str),

    /// Filesystem read/write failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote fetch failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Decode or encode failed inside the codec.
    #[error("codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// Inline payload was not valid base64.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Accumulated failure state of a fluent chain.
///
/// Created from the first [`Error`] and extended — never replaced, never
/// cleared — by every subsequent one. [`Failure::first`] is the error that
/// broke the chain; `Display` renders every cause on its own line.
#[derive(Debug)]
pub struct Failure {
    errors: Vec<Error>,
}

impl Failure {
    pub(crate) fn new(error: Error) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Append a later error without disturbing the existing history.
    pub(crate) fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Merge another failure's history onto this one, oldest first.
    pub(crate) fn absorb(&mut self, other: Failure) {
        self.errors.extend(other.errors);
    }

    /// The error that started the failure.
    pub fn first(&self) -> &Error {
        &self.errors[0]
    }

    /// Every recorded error, oldest first.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Number of recorded errors (always at least one).
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// A `Failure` always holds at least one error.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.first())
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_first_error() {
        let mut failure = Failure::new(Error::EmptySource);
        failure.push(Error::NilImage);
        assert!(matches!(failure.first(), Error::EmptySource));
        assert_eq!(failure.len(), 2);
    }

    #[test]
    fn display_joins_causes_line_by_line() {
        let mut failure = Failure::new(Error::UnsupportedFormat);
        failure.push(Error::UnsupportedSaveFormat("gif".into()));
        let rendered = failure.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "image format not supported");
        assert!(lines[1].contains("gif"));
    }

    #[test]
    fn absorb_appends_in_order() {
        let mut failure = Failure::new(Error::EmptySource);
        let mut other = Failure::new(Error::NilImage);
        other.push(Error::UnsupportedSource);
        failure.absorb(other);
        assert_eq!(failure.len(), 3);
        assert!(matches!(failure.errors()[1], Error::NilImage));
        assert!(matches!(failure.errors()[2], Error::UnsupportedSource));
    }
}
