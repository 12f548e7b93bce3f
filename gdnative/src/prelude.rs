/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Often-imported symbols.

pub use super::error::{HandshakeError, RegistrationError};
pub use super::global::{interpolate, FormatArg};
pub use super::host::HostAccess as _;
pub use super::init::{gdnative, ExtensionConfig, HookContext, NativeExtension};
pub use super::registry::{NativeClass, OwnerHandle, Registrar};
pub use super::sys::{ApiKind, ApiRequirements, ApiVersion};

// Re-export macros.
pub use super::{gdn_error, gdn_print, gdn_warn, profile_scope};
