/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Printing to the host and engine-style string formatting.
//!
//! All functions take the host as `Option`: before `gdnative_init` (or after `gdnative_terminate`) there is none, and
//! messages go to stderr instead.

mod format;
mod print;

pub use crate::{gdn_error, gdn_print, gdn_warn};
pub use format::{interpolate, interpolate_with, FormatArg, FormatValue, DEFAULT_PLACEHOLDER};
pub use print::{print, print_error, print_fmt, print_warning, CallSite};
