// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{IoSliceMut, Read, Write};

use tracing::{Level, event};

use crate::{Buffer, Result, SPILL_CAPACITY};

impl Buffer {
    /// Reads from a descriptor into the buffer with a single vectored read.
    ///
    /// The read targets two destinations at once: the writable region of the buffer and a
    /// [`SPILL_CAPACITY`] byte scratch area on the stack. Bytes that do not fit into the writable
    /// region land in the scratch area and are then appended, growing the buffer. This allows one
    /// system call to receive more data than the buffer currently has room for, without first
    /// reserving worst-case capacity.
    ///
    /// On Unix, for sockets, pipes and files this is a single `readv()` call. The call is not
    /// retried, not even when interrupted or when it would block.
    ///
    /// Returns the number of bytes read. Zero means the descriptor has reached end of stream.
    ///
    /// # Example
    ///
    /// ```
    /// use scatterbuf::Buffer;
    ///
    /// let mut source: &[u8] = b"hello from the other side";
    ///
    /// let mut buf = Buffer::with_capacity(8);
    /// let n = buf.read_from(&mut source).unwrap();
    ///
    /// assert_eq!(n, 25);
    /// assert_eq!(buf.peek(), b"hello from the other side");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] with the descriptor's error if the read fails.
    /// The buffer is left exactly as it was before the call.
    pub fn read_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<usize> {
        let mut spill = [0_u8; SPILL_CAPACITY];
        let writable = self.writable_bytes();

        let result = {
            let mut destinations = [IoSliceMut::new(self.begin_write()), IoSliceMut::new(&mut spill)];
            reader.read_vectored(&mut destinations)
        };

        let bytes_read = match result {
            Ok(bytes_read) => bytes_read,
            Err(error) => {
                event!(
                    Level::TRACE,
                    message = "read failed",
                    os_error = error.raw_os_error(),
                    error = %error
                );

                return Err(error.into());
            }
        };

        if bytes_read <= writable {
            self.has_written(bytes_read);
        } else {
            // The writable region is full. Everything past it went into the scratch area.
            let spilled = bytes_read - writable;

            self.fill_to_capacity();
            self.append(&spill[..spilled]);
        }

        event!(
            Level::TRACE,
            message = "read",
            bytes_read,
            spilled = bytes_read.saturating_sub(writable),
            readable = self.readable_bytes()
        );

        Ok(bytes_read)
    }

    /// Writes the readable bytes to a descriptor with a single write call.
    ///
    /// The written bytes are consumed from the buffer. The descriptor may accept fewer bytes than
    /// are readable - the remainder stays in the buffer and it is up to the caller to call this
    /// again (e.g. once the descriptor is writable again). The call is never retried internally.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Example
    ///
    /// ```
    /// use scatterbuf::Buffer;
    ///
    /// let mut buf = Buffer::new();
    /// buf.append("response");
    ///
    /// let mut sink = Vec::new();
    /// let n = buf.write_to(&mut sink).unwrap();
    ///
    /// assert_eq!(n, 8);
    /// assert_eq!(sink, b"response");
    /// assert!(buf.is_empty());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] with the descriptor's error if the write fails.
    /// The buffer is left exactly as it was before the call.
    pub fn write_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<usize> {
        let readable = self.readable_bytes();

        let bytes_written = match writer.write(self.peek()) {
            Ok(bytes_written) => bytes_written,
            Err(error) => {
                event!(
                    Level::TRACE,
                    message = "write failed",
                    os_error = error.raw_os_error(),
                    error = %error
                );

                return Err(error.into());
            }
        };

        // A writer claiming to have written more than it was given is broken; retrieve() refuses it.
        self.retrieve(bytes_written);

        event!(
            Level::TRACE,
            message = "write",
            bytes_written,
            remaining = readable - bytes_written
        );

        Ok(bytes_written)
    }
}
