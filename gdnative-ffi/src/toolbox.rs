/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Functions and macros that are not very specific to GDNative, but come in handy.

use std::ffi::CString;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros

/// Verifies a condition at compile time.
#[macro_export]
macro_rules! static_assert {
    ($cond:expr) => {
        const _: () = assert!($cond);
    };
    ($cond:expr, $msg:literal) => {
        const _: () = assert!($cond, $msg);
    };
}

/// Debug output of the binding layer itself, to stderr.
#[cfg(feature = "debug-log")]
#[macro_export]
macro_rules! out {
    ()                          => (eprintln!());
    ($fmt:literal)              => (eprintln!("[gdnative] {}", format_args!($fmt)));
    ($fmt:literal, $($arg:tt)*) => (eprintln!("[gdnative] {}", format_args!($fmt, $($arg)*)));
}

/// Debug output of the binding layer itself, to stderr.
#[cfg(not(feature = "debug-log"))]
// Sink-writing keeps arguments "used" without evaluating any output.
#[macro_export]
macro_rules! out {
    ()                          => ({});
    ($fmt:literal)              => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt); });
    ($fmt:literal, $($arg:tt)*) => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt, $($arg)*); };)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Utility functions

/// Explicitly cast away `const` from a pointer, similar to C++ `const_cast`.
///
/// The `as` conversion simultaneously doing 10 other things, potentially causing unintended transmutations.
pub fn force_mut_ptr<T>(ptr: *const T) -> *mut T {
    ptr as *mut T
}

/// Add `const` to a mut ptr.
pub fn to_const_ptr<T>(ptr: *mut T) -> *const T {
    ptr as *const T
}

/// Converts a Rust string for the host, replacing interior NUL bytes instead of failing.
///
/// Used for fire-and-forget messages, where dropping the whole text would be worse than a visible substitute.
pub fn to_c_string_lossy(s: &str) -> CString {
    match CString::new(s) {
        Ok(c) => c,
        Err(_) => {
            let replaced = s.replace('\0', "\u{FFFD}");
            CString::new(replaced).unwrap_or_default()
        }
    }
}

/// Converts a Rust string to the `wchar_t` units the engine's string constructor expects.
///
/// UTF-16 where `wchar_t` is 16 bits wide (Windows), UTF-32 elsewhere.
pub fn to_wide_string(s: &str) -> Vec<libc::wchar_t> {
    #[cfg(windows)]
    let wide = s.encode_utf16().map(|unit| unit as libc::wchar_t).collect();

    #[cfg(not(windows))]
    let wide = s.chars().map(|c| u32::from(c) as libc::wchar_t).collect();

    wide
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
