// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::num::NonZero;

/// A [`Write`] that collects all written data into itself.
///
/// A single write call may be limited to a maximum number of bytes to simulate a descriptor that
/// only accepts partial writes. Scripted errors are returned by the next write calls, one error
/// per call, before any further data is accepted.
///
/// This is for test and example purposes only and is not optimized for performance.
#[derive(Debug)]
pub struct FakeWrite {
    contents: Vec<u8>,

    errors: VecDeque<io::Error>,

    max_write_size: Option<NonZero<usize>>,
}

impl FakeWrite {
    /// Starts building a new `FakeWrite`.
    #[must_use]
    pub fn builder() -> FakeWriteBuilder {
        FakeWriteBuilder {
            errors: VecDeque::new(),
            max_write_size: None,
        }
    }

    /// Creates a new `FakeWrite` that accepts everything written to it.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// References the contents written so far.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Consumes the instance and returns the contents that were written to it.
    #[must_use]
    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }
}

impl Default for FakeWrite {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for FakeWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(error) = self.errors.pop_front() {
            return Err(error);
        }

        let len = buf.len().min(self.max_write_size.map_or(usize::MAX, NonZero::get));
        self.contents.extend_from_slice(&buf[..len]);

        Ok(len)
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Creates an instance of [`FakeWrite`].
///
/// Access through [`FakeWrite::builder()`][FakeWrite::builder].
#[derive(Debug)]
pub struct FakeWriteBuilder {
    errors: VecDeque<io::Error>,
    max_write_size: Option<NonZero<usize>>,
}

impl FakeWriteBuilder {
    /// Queues an error to be returned by a write call. Errors are returned in the order queued.
    #[must_use]
    pub fn error(mut self, error: io::Error) -> Self {
        self.errors.push_back(error);
        self
    }

    /// Restricts a single write operation to accept at most `max_write_size` bytes.
    ///
    /// Optional. Defaults to no limit.
    #[must_use]
    pub fn max_write_size(mut self, max_write_size: NonZero<usize>) -> Self {
        self.max_write_size = Some(max_write_size);
        self
    }

    /// Builds the `FakeWrite` with the provided configuration.
    #[must_use]
    pub fn build(self) -> FakeWrite {
        FakeWrite {
            contents: Vec::new(),
            errors: self.errors,
            max_write_size: self.max_write_size,
        }
    }
}
