/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Registration handshake of a GDNative extension with its host: binding the API structs in `gdnative_init`,
//! registering classes in `nativescript_init`, releasing both on terminate. Also printing and profiling through the
//! bound host.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod global;
pub mod host;
pub mod init;
pub mod profiling;
pub mod registry;

pub use error::{ApiError, HandshakeError, RegistrationError};
pub use gdnative_ffi as sys;
#[doc(hidden)]
pub use gdnative_ffi::out;

#[doc(hidden)]
pub mod private;
