// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;
use std::io::{self, IoSliceMut, Read};
use std::num::NonZero;

/// A [`Read`] that plays back a script of data chunks and errors.
///
/// Each read call returns bytes from at most one data chunk, the way a socket returns at most
/// one segment of what the peer sent, or fails with the next scripted error. Vectored reads fill
/// all destinations in order, like `readv()` does. Once the script is exhausted, reads return 0
/// (end of stream).
///
/// This is for test and example purposes only and is not optimized for performance.
///
/// # Example
///
/// ```
/// use std::io::ErrorKind;
///
/// use scatterbuf::Buffer;
/// use scatterbuf::testing::FakeRead;
///
/// let mut source = FakeRead::builder()
///     .data(b"first")
///     .error(ErrorKind::WouldBlock.into())
///     .data(b"second")
///     .build();
///
/// let mut buf = Buffer::new();
///
/// assert_eq!(buf.read_from(&mut source).unwrap(), 5);
/// assert_eq!(buf.read_from(&mut source).unwrap_err().kind(), ErrorKind::WouldBlock);
/// assert_eq!(buf.read_from(&mut source).unwrap(), 6);
/// assert_eq!(buf.read_from(&mut source).unwrap(), 0);
///
/// assert_eq!(buf.peek(), b"firstsecond");
/// ```
#[derive(Debug)]
pub struct FakeRead {
    script: VecDeque<Step>,

    // For testing purposes, we may choose to limit the read size and
    // thereby force the caller to do multiple read operations.
    max_read_size: Option<NonZero<usize>>,
}

#[derive(Debug)]
enum Step {
    Data(VecDeque<u8>),
    Error(io::Error),
}

impl FakeRead {
    /// Starts building a new `FakeRead`.
    #[must_use]
    pub fn builder() -> FakeReadBuilder {
        FakeReadBuilder {
            script: VecDeque::new(),
            max_read_size: None,
        }
    }

    /// Creates a new `FakeRead` that returns `contents` and then reaches end of stream.
    #[must_use]
    pub fn new(contents: impl AsRef<[u8]>) -> Self {
        Self::builder().data(contents).build()
    }

    /// Number of scripted bytes that have not been read yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script
            .iter()
            .map(|step| match step {
                Step::Data(data) => data.len(),
                Step::Error(_) => 0,
            })
            .sum()
    }
}

impl Read for FakeRead {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_vectored(&mut [IoSliceMut::new(buf)])
    }

    #[cfg_attr(test, mutants::skip)] // Mutations easily lead to infinite loops, not worth the effort.
    fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize> {
        if matches!(self.script.front(), Some(Step::Error(_))) {
            if let Some(Step::Error(error)) = self.script.pop_front() {
                return Err(error);
            }
        }

        let Some(Step::Data(data)) = self.script.front_mut() else {
            return Ok(0);
        };

        let mut budget = data
            .len()
            .min(self.max_read_size.map_or(usize::MAX, NonZero::get));
        let mut bytes_read = 0;

        for dst in bufs.iter_mut() {
            if budget == 0 {
                break;
            }

            let len = dst.len().min(budget);

            for (target, source) in dst[..len].iter_mut().zip(data.drain(..len)) {
                *target = source;
            }

            budget -= len;
            bytes_read += len;
        }

        if data.is_empty() {
            self.script.pop_front();
        }

        Ok(bytes_read)
    }
}

/// Creates an instance of [`FakeRead`].
///
/// Access through [`FakeRead::builder()`][FakeRead::builder].
#[derive(Debug)]
pub struct FakeReadBuilder {
    script: VecDeque<Step>,
    max_read_size: Option<NonZero<usize>>,
}

impl FakeReadBuilder {
    /// Appends a chunk of data to the script. Empty chunks are ignored.
    #[must_use]
    pub fn data(mut self, data: impl AsRef<[u8]>) -> Self {
        let data = data.as_ref();

        if !data.is_empty() {
            self.script.push_back(Step::Data(data.iter().copied().collect()));
        }

        self
    }

    /// Appends an error to the script. The error is returned by exactly one read call.
    #[must_use]
    pub fn error(mut self, error: io::Error) -> Self {
        self.script.push_back(Step::Error(error));
        self
    }

    /// Restricts the result of a single read operation to at most `max_read_size` bytes.
    ///
    /// Optional. Defaults to no limit.
    #[must_use]
    pub fn max_read_size(mut self, max_read_size: NonZero<usize>) -> Self {
        self.max_read_size = Some(max_read_size);
        self
    }

    /// Builds the `FakeRead` with the provided configuration.
    #[must_use]
    pub fn build(self) -> FakeRead {
        FakeRead {
            script: self.script,
            max_read_size: self.max_read_size,
        }
    }
}
