// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A growable byte buffer for moving bytes between descriptors and application code.
//!
//! [`Buffer`] keeps its content in one contiguous allocation with a read cursor and a write
//! cursor. Application code appends bytes at the write cursor and consumes them at the read
//! cursor, while the two descriptor operations move bytes between the buffer and a socket, pipe
//! or file:
//!
//! * [`Buffer::read_from()`] receives bytes with a single vectored read. Data that does not fit
//!   into the free space of the buffer spills into a [`SPILL_CAPACITY`] byte scratch area on the
//!   stack and is then appended, so a single system call can receive large bursts without the
//!   buffer reserving worst-case capacity up front.
//! * [`Buffer::write_to()`] sends the readable bytes with a single write and consumes however many
//!   bytes the descriptor accepted. Partial writes are normal and are left for the caller to
//!   continue.
//!
//! Failed descriptor calls leave the buffer untouched and return the error exactly as the
//! descriptor reported it, including the platform error code.
//!
//! ```
//! use std::io::pipe;
//!
//! use scatterbuf::Buffer;
//!
//! let (mut reader, mut writer) = pipe().unwrap();
//!
//! let mut outbound = Buffer::new();
//! outbound.append("PING\r\n");
//! outbound.write_to(&mut writer).unwrap();
//!
//! let mut inbound = Buffer::new();
//! inbound.read_from(&mut reader).unwrap();
//!
//! assert_eq!(inbound.retrieve_all_as_text().unwrap(), "PING\r\n");
//! ```
//!
//! # Space management
//!
//! Consumed bytes at the front of the storage are reclaimed lazily. When an append needs more
//! room than is free at the end of the storage, the readable bytes are first moved to the front.
//! Only if that still does not make enough room is the storage grown. The capacity never shrinks.
//!
//! # Thread safety
//!
//! A [`Buffer`] has exactly one owner and all mutation goes through `&mut self`. Sharing one
//! between threads requires external synchronization.
//!
//! # Features
//!
//! The `bytes-compat` feature implements `bytes::Buf` and `bytes::BufMut` for [`Buffer`].
//!
//! The `test-util` feature enables the `testing` module with scripted fake descriptors for
//! testing code that drives a [`Buffer`].

mod buffer;
mod buffer_io;
#[cfg(feature = "bytes-compat")]
mod bytes_compat;
mod error;
mod io_adapters;

pub use buffer::Buffer;
pub use error::{Error, Result};

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

/// Capacity of a [`Buffer`] created via [`Buffer::new()`] or [`Buffer::default()`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Size of the stack scratch area that receives bytes beyond the free space of the buffer
/// during [`Buffer::read_from()`].
///
/// A single read can return at most the free space of the buffer plus this many bytes.
pub const SPILL_CAPACITY: usize = 64 * 1024;
