/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Host-owned bytes of a known size, which Rust never reads or writes.
///
/// Mirrors the `uint8_t _dont_touch_that[N]` members of the GDNative headers, so alignment is 1 like a C byte array.
/// The pointer marker keeps the type `!Send` and `!Sync`; values belong to the host thread that produced them.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct Opaque<const N: usize> {
    #[allow(dead_code)] // only ever touched by the host
    storage: [u8; N],
    marker: std::marker::PhantomData<*const u8>,
}

impl<const N: usize> std::fmt::Debug for Opaque<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Opaque<{N}>")
    }
}
