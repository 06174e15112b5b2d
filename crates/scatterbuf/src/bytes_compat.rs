// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compatibility with traits from the `bytes` crate.

use bytes::buf::UninitSlice;
use bytes::{Buf, BufMut};

use crate::Buffer;

// Smallest writable region exposed via `chunk_mut()`. `BufMut` requires a non-empty chunk
// whenever `remaining_mut()` is non-zero, and tiny chunks would make `put_*` calls slow.
const MIN_CHUNK_MUT: usize = 64;

impl Buf for Buffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    #[inline]
    fn remaining(&self) -> usize {
        self.readable_bytes()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    #[inline]
    fn chunk(&self) -> &[u8] {
        self.peek()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    #[inline]
    fn advance(&mut self, cnt: usize) {
        self.retrieve(cnt);
    }
}

// SAFETY: The trait documentation does not define any safety requirements we need to fulfill.
// The storage is always initialized, so any bytes the caller does not overwrite are still valid.
unsafe impl BufMut for Buffer {
    #[inline]
    fn remaining_mut(&self) -> usize {
        // The buffer grows on demand, so it is only limited by the address space.
        usize::MAX - self.capacity() + self.writable_bytes()
    }

    #[inline]
    unsafe fn advance_mut(&mut self, cnt: usize) {
        self.has_written(cnt);
    }

    #[inline]
    fn chunk_mut(&mut self) -> &mut UninitSlice {
        if self.writable_bytes() == 0 {
            self.ensure_writable(MIN_CHUNK_MUT);
        }

        UninitSlice::new(self.begin_write())
    }
}
