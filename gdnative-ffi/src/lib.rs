/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Low level bindings to the GDNative 3.x C API.
//!
//! Contains the `#[repr(C)]` declarations the registration handshake needs, typed discovery of the host's API structs,
//! and the per-extension storage slot. Not intended for direct use; see the `gdnative` crate.

#![cfg_attr(test, allow(unused))]
#![deny(unsafe_op_in_unsafe_fn)]

#[allow(
    non_camel_case_types,
    non_upper_case_globals,
    non_snake_case,
    clippy::upper_case_acronyms
)]
mod gdnative_api;

mod api_table;
mod global;
mod handles;
mod opaque;
mod toolbox;

pub use api_table::{ApiError, ApiKind, ApiRequirements, ApiTable, ApiVersion};
pub use gdnative_api::*;
pub use global::{Global, GlobalGuard};
pub use handles::{LibraryHandle, RegistrationHandle};
pub use opaque::Opaque;
pub use toolbox::*;
