/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Errors of the handshake and registration layer.
//!
//! None of them crosses the C ABI. At the boundary they are either reported to the host or turned into a debug panic.

use crate::sys::ApiKind;

pub use crate::sys::ApiError;

/// A handshake entry point was called in a phase where the host contract does not allow it.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("GDNative API is not bound; `gdnative_init` has not been called or was already terminated")]
    NotBound,

    #[error("GDNative API is already bound; `gdnative_init` was called twice")]
    AlreadyBound,

    #[error("extension is not registered; `nativescript_init` has not been called or was already terminated")]
    NotRegistered,

    #[error("extension is already registered; `nativescript_init` was called twice")]
    AlreadyRegistered,

    #[error("host passed a null pointer for `{what}`")]
    NullPointer { what: &'static str },

    #[error("entry point `{entry}` was called while another entry point of the same extension is still running")]
    Reentrant { entry: &'static str },
}

/// Class registration did not reach the host.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("host does not provide the `{api}` API needed for registration")]
    MissingApi { api: ApiKind },

    #[error("class name {name:?} cannot be passed to the host (contains a NUL byte)")]
    InvalidName { name: String },
}
