// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::{Level, event};

use crate::{DEFAULT_CAPACITY, Result};

/// Growable byte storage with a read cursor and a write cursor.
///
/// The buffer sits between a descriptor (typically a socket) and code that consumes or produces
/// the bytes that flow through it. Bytes are appended at the write cursor and consumed from the
/// read cursor, so the storage is at any time made up of three regions:
///
/// ```text
/// +-------------------+------------------+------------------+
/// | prependable bytes |  readable bytes  |  writable bytes  |
/// |   (consumed)      |    (content)     |   (free space)   |
/// +-------------------+------------------+------------------+
/// 0       <=      read_pos     <=     write_pos    <=    capacity
/// ```
///
/// When more writable space is requested than is available, the buffer first tries to reclaim
/// the prependable region by moving the readable bytes to the front of the storage. Only when
/// that is not enough does it grow the storage.
///
/// This is not a ring buffer. Consumed space is only reused after such a compaction, which happens
/// on demand when writing.
///
/// # Ownership
///
/// A `Buffer` owns its storage exclusively and cannot be cloned. Views returned by [`peek()`] and
/// [`begin_write()`] borrow the buffer and therefore cannot outlive the next mutating call.
///
/// # Example
///
/// ```
/// use scatterbuf::Buffer;
///
/// let mut buf = Buffer::with_capacity(16);
///
/// buf.append(b"GET / HTTP/1.1\r\n");
/// let line_end = buf.peek().windows(2).position(|w| w == b"\r\n").unwrap();
///
/// assert_eq!(&buf.peek()[..line_end], b"GET / HTTP/1.1");
/// buf.retrieve_until(line_end + 2);
///
/// assert!(buf.is_empty());
/// ```
///
/// [`peek()`]: Self::peek
/// [`begin_write()`]: Self::begin_write
#[derive(Debug)]
pub struct Buffer {
    // Always fully initialized. The length of the vector is the capacity of the buffer.
    storage: Vec<u8>,

    read_pos: usize,
    write_pos: usize,
}

impl Buffer {
    /// Creates an empty buffer with [`DEFAULT_CAPACITY`] bytes of capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty buffer with exactly `capacity` bytes of capacity.
    ///
    /// A capacity of zero is valid - the storage is allocated on the first write.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Total size of the storage, covering all three regions.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of bytes that can be appended without compacting or growing the storage.
    #[must_use]
    pub fn writable_bytes(&self) -> usize {
        self.storage.len() - self.write_pos
    }

    /// Number of bytes that have been written but not yet consumed.
    #[must_use]
    pub fn readable_bytes(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Number of consumed bytes in front of the readable bytes.
    ///
    /// This space can be reclaimed by compaction when more writable space is needed.
    #[must_use]
    pub fn prependable_bytes(&self) -> usize {
        self.read_pos
    }

    /// Whether there are no readable bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_pos == self.write_pos
    }

    /// Returns the readable bytes without consuming them.
    #[must_use]
    pub fn peek(&self) -> &[u8] {
        &self.storage[self.read_pos..self.write_pos]
    }

    /// Marks `len` readable bytes as consumed.
    ///
    /// # Panics
    ///
    /// Panics if `len` is greater than [`readable_bytes()`][Self::readable_bytes].
    pub fn retrieve(&mut self, len: usize) {
        assert!(
            len <= self.readable_bytes(),
            "attempted to retrieve {len} bytes from a buffer with only {} readable bytes",
            self.readable_bytes()
        );

        self.read_pos += len;
    }

    /// Consumes the readable bytes up to (not including) offset `end` of the [`peek()`] view.
    ///
    /// The offset is typically obtained by searching the view for a delimiter.
    ///
    /// # Example
    ///
    /// ```
    /// use scatterbuf::Buffer;
    ///
    /// let mut buf = Buffer::new();
    /// buf.append("key=value;rest");
    ///
    /// let end = buf.peek().iter().position(|b| *b == b';').unwrap();
    /// buf.retrieve_until(end + 1);
    ///
    /// assert_eq!(buf.peek(), b"rest");
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `end` lies beyond the end of the readable bytes.
    ///
    /// [`peek()`]: Self::peek
    pub fn retrieve_until(&mut self, end: usize) {
        assert!(
            end <= self.readable_bytes(),
            "retrieve marker at offset {end} lies beyond the {} readable bytes",
            self.readable_bytes()
        );

        self.retrieve(end);
    }

    /// Consumes all readable bytes and resets the buffer to its freshly constructed state.
    ///
    /// The entire storage is overwritten with zeros so that stale data does not linger in
    /// memory that is later handed out for writing. The capacity is retained.
    pub fn retrieve_all(&mut self) {
        self.storage.fill(0);
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Consumes all readable bytes, returning a copy of them.
    ///
    /// The buffer is reset as by [`retrieve_all()`][Self::retrieve_all].
    #[must_use]
    pub fn retrieve_all_as_bytes(&mut self) -> Vec<u8> {
        let bytes = self.peek().to_vec();
        self.retrieve_all();
        bytes
    }

    /// Consumes all readable bytes, returning them as a string.
    ///
    /// The buffer is reset as by [`retrieve_all()`][Self::retrieve_all], whether or not the
    /// contents are valid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidText`][crate::Error::InvalidText] if the readable bytes are not
    /// valid UTF-8. The error carries the drained bytes.
    pub fn retrieve_all_as_text(&mut self) -> Result<String> {
        Ok(String::from_utf8(self.retrieve_all_as_bytes())?)
    }

    /// Ensures that at least `len` bytes can be appended without further reallocation.
    ///
    /// Space consumed by earlier reads is reclaimed first. The storage only grows if that is not
    /// enough. The capacity never shrinks.
    pub fn ensure_writable(&mut self, len: usize) {
        if self.writable_bytes() < len {
            self.make_space(len);
        }

        debug_assert!(self.writable_bytes() >= len);
    }

    /// Returns the writable region for the caller to fill in place.
    ///
    /// Follow up with [`has_written()`][Self::has_written] to make the filled bytes readable.
    ///
    /// # Example
    ///
    /// ```
    /// use scatterbuf::Buffer;
    ///
    /// let mut buf = Buffer::with_capacity(8);
    ///
    /// let dst = buf.begin_write();
    /// dst[..4].copy_from_slice(&0x0102_0304_u32.to_be_bytes());
    /// buf.has_written(4);
    ///
    /// assert_eq!(buf.peek(), &[1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn begin_write(&mut self) -> &mut [u8] {
        &mut self.storage[self.write_pos..]
    }

    /// Returns the writable region without permitting modification.
    #[must_use]
    pub fn begin_write_const(&self) -> &[u8] {
        &self.storage[self.write_pos..]
    }

    /// Marks `len` bytes at the start of the writable region as written, making them readable.
    ///
    /// # Panics
    ///
    /// Panics if `len` is greater than [`writable_bytes()`][Self::writable_bytes].
    pub fn has_written(&mut self, len: usize) {
        assert!(
            len <= self.writable_bytes(),
            "attempted to commit {len} written bytes to a buffer with only {} writable bytes",
            self.writable_bytes()
        );

        self.write_pos += len;
    }

    /// Appends a copy of `bytes`, growing or compacting the storage as needed.
    ///
    /// Accepts anything that can be viewed as a byte slice: `&str`, `String`, `&[u8]`,
    /// byte arrays and `Vec<u8>`.
    pub fn append(&mut self, bytes: impl AsRef<[u8]>) {
        let bytes = bytes.as_ref();

        self.ensure_writable(bytes.len());

        let end = self.write_pos + bytes.len();
        self.storage[self.write_pos..end].copy_from_slice(bytes);
        self.write_pos = end;
    }

    /// Appends a copy of the readable bytes of `other`.
    ///
    /// `other` is not modified. Only its readable bytes are copied, not its whole storage.
    pub fn append_buffer(&mut self, other: &Self) {
        self.append(other.peek());
    }

    /// Sets the write cursor to the end of the storage without touching its contents.
    ///
    /// Used when a descriptor read has filled the entire writable region.
    pub(crate) fn fill_to_capacity(&mut self) {
        self.write_pos = self.storage.len();
    }

    fn make_space(&mut self, len: usize) {
        if self.writable_bytes() + self.prependable_bytes() < len {
            let new_capacity = self.write_pos + len + 1;

            event!(
                Level::TRACE,
                message = "grow",
                old_capacity = self.storage.len(),
                new_capacity,
                readable = self.readable_bytes()
            );

            self.storage.resize(new_capacity, 0);
        } else {
            let readable = self.readable_bytes();

            event!(
                Level::TRACE,
                message = "compact",
                reclaimed = self.read_pos,
                readable
            );

            self.storage.copy_within(self.read_pos..self.write_pos, 0);
            self.read_pos = 0;
            self.write_pos = readable;
        }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use tracing_test::traced_test;

    use super::*;

    assert_impl_all!(Buffer: Send, Sync);
    assert_not_impl_any!(Buffer: Clone, Copy);

    fn assert_invariant(buf: &Buffer) {
        assert!(buf.read_pos <= buf.write_pos);
        assert!(buf.write_pos <= buf.capacity());
        assert_eq!(
            buf.prependable_bytes() + buf.readable_bytes() + buf.writable_bytes(),
            buf.capacity()
        );
    }

    #[test]
    fn smoke_test() {
        let mut buf = Buffer::new();

        assert_eq!(buf.capacity(), DEFAULT_CAPACITY);
        assert_eq!(buf.writable_bytes(), DEFAULT_CAPACITY);
        assert_eq!(buf.readable_bytes(), 0);
        assert_eq!(buf.prependable_bytes(), 0);
        assert!(buf.is_empty());
        assert!(buf.peek().is_empty());

        buf.append("Hello, ");
        buf.append(b"world");
        buf.append(vec![b'!']);

        assert_eq!(buf.readable_bytes(), 13);
        assert_eq!(buf.writable_bytes(), DEFAULT_CAPACITY - 13);
        assert_eq!(buf.peek(), b"Hello, world!");

        buf.retrieve(7);

        assert_eq!(buf.prependable_bytes(), 7);
        assert_eq!(buf.peek(), b"world!");

        assert_eq!(buf.retrieve_all_as_bytes(), b"world!");
        assert!(buf.is_empty());
        assert_invariant(&buf);
    }

    #[test]
    fn default_is_new() {
        let buf = Buffer::default();

        assert_eq!(buf.capacity(), DEFAULT_CAPACITY);
        assert!(buf.is_empty());
    }

    #[test]
    fn round_trip() {
        let cases: [&[u8]; 4] = [b"", b"x", b"\x00\xFF\x00", &[7_u8; 5000]];

        for data in cases {
            let mut buf = Buffer::with_capacity(16);
            buf.append(data);

            assert_eq!(buf.retrieve_all_as_bytes(), data);
        }
    }

    #[test]
    fn peek_does_not_consume() {
        let mut buf = Buffer::with_capacity(8);
        buf.append(b"abc");

        assert_eq!(buf.peek(), b"abc");
        assert_eq!(buf.peek(), b"abc");
        assert_eq!(buf.readable_bytes(), 3);
    }

    #[test]
    fn invariant_holds_across_mixed_operations() {
        let mut buf = Buffer::with_capacity(3);
        let mut expected = Vec::new();

        for round in 0_u8..50 {
            let chunk = vec![round; usize::from(round % 7)];
            buf.append(&chunk);
            expected.extend_from_slice(&chunk);
            assert_invariant(&buf);

            let take = usize::from(round % 5).min(buf.readable_bytes());
            buf.retrieve(take);
            expected = expected.split_off(take);
            assert_invariant(&buf);

            assert_eq!(buf.peek(), expected.as_slice());
        }
    }

    #[test]
    fn retrieve_too_much_panics() {
        let mut buf = Buffer::with_capacity(8);
        buf.append(b"abc");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| buf.retrieve(4)));
        assert!(result.is_err());

        // Nothing was clamped or consumed.
        assert_eq!(buf.peek(), b"abc");
    }

    #[test]
    fn retrieve_until_marker() {
        let mut buf = Buffer::new();
        buf.append(b"one\ntwo\n");

        let end = buf.peek().iter().position(|b| *b == b'\n').unwrap();
        buf.retrieve_until(end + 1);
        assert_eq!(buf.peek(), b"two\n");

        // The end of the readable bytes is a valid marker.
        buf.retrieve_until(buf.readable_bytes());
        assert!(buf.is_empty());
    }

    #[test]
    #[should_panic]
    fn retrieve_until_beyond_end_panics() {
        let mut buf = Buffer::new();
        buf.append(b"abc");

        buf.retrieve_until(4);
    }

    #[test]
    fn retrieve_all_resets_and_wipes() {
        let mut buf = Buffer::with_capacity(8);
        buf.append(b"secret");
        buf.retrieve(2);

        buf.retrieve_all();

        assert_eq!(buf.readable_bytes(), 0);
        assert_eq!(buf.prependable_bytes(), 0);
        assert_eq!(buf.writable_bytes(), buf.capacity());
        assert_eq!(buf.capacity(), 8);
        assert!(buf.begin_write_const().iter().all(|b| *b == 0));
    }

    #[test]
    fn retrieve_all_as_text() {
        let mut buf = Buffer::new();
        buf.append("héllo");

        assert_eq!(buf.retrieve_all_as_text().unwrap(), "héllo");
        assert!(buf.is_empty());
    }

    #[test]
    fn retrieve_all_as_text_invalid_drains_anyway() {
        let mut buf = Buffer::new();
        buf.append([b'a', 0xC3]);

        let error = buf.retrieve_all_as_text().unwrap_err();

        assert!(buf.is_empty());
        match error {
            crate::Error::InvalidText { valid_up_to, bytes } => {
                assert_eq!(valid_up_to, 1);
                assert_eq!(bytes, [b'a', 0xC3]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn ensure_writable_noop_when_enough_space() {
        let mut buf = Buffer::with_capacity(16);
        buf.append(b"abcd");
        buf.retrieve(2);

        buf.ensure_writable(12);

        // Neither compacted nor grown.
        assert_eq!(buf.prependable_bytes(), 2);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.peek(), b"cd");
    }

    #[test]
    #[traced_test]
    fn compaction_reuses_prependable_space() {
        let mut buf = Buffer::with_capacity(10);
        buf.append(b"0123456789");
        buf.retrieve(6);

        let before = buf.peek().to_vec();

        // writable = 0, prependable = 6 - enough to hold 5 more bytes.
        buf.ensure_writable(5);

        assert_eq!(buf.capacity(), 10);
        assert_eq!(buf.prependable_bytes(), 0);
        assert_eq!(buf.peek(), before.as_slice());
        assert!(buf.writable_bytes() >= 5);

        buf.append(b"abcde");

        assert_eq!(buf.capacity(), 10);
        assert_eq!(buf.peek(), b"6789abcde");
        assert_invariant(&buf);
        assert!(logs_contain("reclaimed=6 readable=4"));
        assert!(!logs_contain("new_capacity"));
    }

    #[test]
    #[traced_test]
    fn growth_preserves_readable_bytes() {
        let mut buf = Buffer::with_capacity(8);
        buf.append(b"abcdefgh");
        buf.retrieve(3);

        buf.ensure_writable(20);

        assert!(buf.writable_bytes() >= 20);
        assert_eq!(buf.capacity(), 8 + 20 + 1);
        assert_eq!(buf.peek(), b"defgh");
        assert_invariant(&buf);
        assert!(logs_contain("old_capacity=8 new_capacity=29 readable=5"));
    }

    #[test]
    fn append_that_must_grow() {
        let mut buf = Buffer::with_capacity(4);

        buf.append(b"ab");
        assert_eq!(buf.write_pos, 2);

        buf.retrieve(1);
        assert_eq!(buf.read_pos, 1);

        // writable 2 + prependable 1 < 4, so the storage must grow.
        buf.append(b"cdef");

        assert_eq!(buf.peek(), b"bcdef");
        assert!(buf.capacity() > 4);
        assert_invariant(&buf);
    }

    #[test]
    fn zero_capacity_grows_on_first_write() {
        let mut buf = Buffer::with_capacity(0);
        assert_eq!(buf.writable_bytes(), 0);

        buf.append(b"xyz");

        assert_eq!(buf.peek(), b"xyz");
        assert_invariant(&buf);
    }

    #[test]
    fn append_buffer_copies_only_readable_window() {
        let mut source = Buffer::with_capacity(32);
        source.append(b"skip-keep");
        source.retrieve(5);

        let mut target = Buffer::with_capacity(4);
        target.append_buffer(&source);

        assert_eq!(target.peek(), b"keep");
        assert_eq!(source.peek(), b"keep");
    }

    #[test]
    fn begin_write_and_has_written() {
        let mut buf = Buffer::with_capacity(8);
        buf.append(b"ab");

        assert_eq!(buf.begin_write().len(), 6);
        assert_eq!(buf.begin_write_const().len(), 6);

        buf.begin_write()[..3].copy_from_slice(b"cde");
        buf.has_written(3);

        assert_eq!(buf.peek(), b"abcde");
        assert_eq!(buf.writable_bytes(), 3);
    }

    #[test]
    #[should_panic]
    fn has_written_beyond_capacity_panics() {
        let mut buf = Buffer::with_capacity(4);

        buf.has_written(5);
    }
}
