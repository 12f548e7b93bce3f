/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Rust bindings for the GDNative 3.x registration handshake
//!
//! A GDNative library is a shared object the engine loads through a `.gdnlib` resource. The engine then calls a fixed
//! set of C entry points in a fixed order:
//!
//! 1. `<prefix>gdnative_init`: hands over the versioned API structs and the library handle.
//! 2. `<prefix>nativescript_init`: hands over the handle under which script classes are registered.
//! 3. `<prefix>nativescript_terminate` and `<prefix>gdnative_terminate`: take both away again, in reverse order.
//!
//! This crate implements the Rust side of that handshake. Implement [`NativeExtension`][init::NativeExtension] for a
//! marker type and annotate the impl with [`#[gdnative]`][init::gdnative]; the macro exports the entry points and wires
//! them to a per-extension [`Handshake`][init::Handshake].
//!
//! ```ignore
//! use gdnative::prelude::*;
//!
//! struct Player;
//!
//! impl NativeClass for Player {
//!     fn class_name() -> &'static str {
//!         "Player"
//!     }
//!
//!     fn init(_owner: OwnerHandle) -> Self {
//!         Player
//!     }
//! }
//!
//! struct MyExtension;
//!
//! #[gdnative]
//! unsafe impl NativeExtension for MyExtension {
//!     fn register(registrar: &mut Registrar) {
//!         if let Err(err) = registrar.register_class::<Player>() {
//!             gdn_error!(registrar, "cannot register Player: {err}");
//!         }
//!     }
//! }
//! ```
//!
//! ## Cargo features
//!
//! * **`serde`**: `Serialize`/`Deserialize` for [`ExtensionConfig`][init::ExtensionConfig] and the API version types.

#[doc(inline)]
pub use gdnative_core::{error, global, host, profiling, registry};

#[doc(hidden)]
pub use gdnative_core::sys;

pub use gdnative_core::{gdn_error, gdn_print, gdn_warn, profile_scope};

/// Entry points and the registration handshake.
pub mod init {
    pub use gdnative_core::init::*;

    // Re-exports
    pub use gdnative_macros::gdnative;
}

#[doc(hidden)]
pub use gdnative_core::private;

pub mod prelude;
