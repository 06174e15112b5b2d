// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Scripted descriptors for testing code that moves bytes through a [`Buffer`][crate::Buffer].

mod fake_read;
mod fake_write;

pub use fake_read::*;
pub use fake_write::*;
