/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_void;
use std::ptr::NonNull;

use crate::godot_object;

/// Token identifying this loaded library to the host (`gd_native_library` in the init options).
///
/// Owned by the host; the extension keeps it between `gdnative_init` and `gdnative_terminate` and never dereferences it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LibraryHandle(NonNull<godot_object>);

impl LibraryHandle {
    /// Returns `None` for a null pointer.
    pub fn from_sys(ptr: *mut godot_object) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_sys(self) -> *mut godot_object {
        self.0.as_ptr()
    }
}

/// Token passed to `nativescript_init`, identifying this extension in class registration calls.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RegistrationHandle(NonNull<c_void>);

impl RegistrationHandle {
    /// Returns `None` for a null pointer.
    pub fn from_sys(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_sys(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

// SAFETY: both handles are opaque tokens; the extension only stores and compares them, and hands them back to the host.
// Any dereferencing happens inside the host, which is responsible for its own synchronization.
unsafe impl Send for LibraryHandle {}
// SAFETY: see above.
unsafe impl Sync for LibraryHandle {}
// SAFETY: see above.
unsafe impl Send for RegistrationHandle {}
// SAFETY: see above.
unsafe impl Sync for RegistrationHandle {}
