// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, BufRead, Read, Write};

use crate::Buffer;

/// Copies readable bytes out of the buffer, consuming them.
///
/// Because [`Buffer`] is already buffered, it implements [`BufRead`] directly. Prefer that over
/// wrapping it in [`std::io::BufReader`].
impl Read for Buffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.readable_bytes());

        buf[..len].copy_from_slice(&self.peek()[..len]);
        self.retrieve(len);

        Ok(len)
    }
}

impl BufRead for Buffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(self.peek())
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn consume(&mut self, amount: usize) {
        self.retrieve(amount);
    }
}

/// Appends written bytes to the buffer. Writes always accept every byte.
///
/// # Example
///
/// ```
/// use std::io::Write;
///
/// use scatterbuf::Buffer;
///
/// let mut buf = Buffer::new();
/// write!(buf, "HTTP/1.1 {} {}\r\n", 200, "OK").unwrap();
///
/// assert_eq!(buf.peek(), b"HTTP/1.1 200 OK\r\n");
/// ```
impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
