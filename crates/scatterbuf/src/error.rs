// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::ErrorKind;

use thiserror::Error;

/// An error signaled by a [`Buffer`][crate::Buffer] operation.
///
/// Descriptor failures are forwarded exactly as the descriptor reported them, so the platform
/// error code remains available via [`raw_os_error()`][Self::raw_os_error].
///
/// Misuse of the buffer API (e.g. retrieving more bytes than are readable) is not represented
/// here - such contract violations panic instead.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The descriptor returned an error from a read or write call.
    ///
    /// The buffer state is exactly as it was before the failed call.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The drained contents of the buffer were not valid UTF-8.
    ///
    /// The buffer has already been emptied. The drained bytes are returned here so that nothing
    /// is lost.
    #[error("buffer contents are not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidText {
        /// Number of leading bytes that form valid UTF-8.
        valid_up_to: usize,

        /// The bytes that were drained from the buffer.
        bytes: Vec<u8>,
    },
}

impl Error {
    /// Returns the platform error code (`errno` on Unix) reported by the descriptor, if any.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Io(error) => error.raw_os_error(),
            Self::InvalidText { .. } => None,
        }
    }

    /// Returns the standard I/O error category that best describes this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(error) => error.kind(),
            Self::InvalidText { .. } => ErrorKind::InvalidData,
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Self::InvalidText {
            valid_up_to: value.utf8_error().valid_up_to(),
            bytes: value.into_bytes(),
        }
    }
}

/// A specialized `Result` for use with [`Buffer`][crate::Buffer] operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents the buffer error as a standard I/O error.
/// This is often used when interoperating with code that expects standard I/O errors.
impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io(error) => error,
            other @ Error::InvalidText { .. } => Self::new(ErrorKind::InvalidData, other),
        }
    }
}
