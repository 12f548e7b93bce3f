/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The seam between the handshake and the process hosting the extension.
//!
//! [`HostApi`] is everything the handshake ever asks of the host. [`EngineHost`] implements it on top of the API structs
//! a real engine hands over in `gdnative_init`; tests implement it with a recording mock.

use std::ffi::{c_void, CString};
use std::mem::MaybeUninit;

use crate::error::RegistrationError;
use crate::global::CallSite;
use crate::registry::ClassDescriptor;
use crate::sys;
use crate::sys::{ApiKind, ApiTable, RegistrationHandle};

/// Services the host offers to a bound extension.
///
/// Only the print functions are mandatory; every host can print somewhere. The other methods default to "not offered
/// by this host", which the handshake treats like a missing API struct.
pub trait HostApi {
    fn print(&self, message: &str);

    fn print_warning(&self, message: &str, site: &CallSite<'_>);

    fn print_error(&self, message: &str, site: &CallSite<'_>);

    /// Adds one timing sample (microseconds) to the host's script profiler.
    #[allow(unused_variables)]
    fn profiling_add_data(&self, signature: &str, time_usec: u64) {}

    /// Registers one class under the given registration handle.
    #[allow(unused_variables)]
    fn register_class(&self, handle: RegistrationHandle, class: &ClassDescriptor) -> Result<(), RegistrationError> {
        Err(RegistrationError::MissingApi {
            api: ApiKind::NativeScript,
        })
    }

    /// Registers instance binding functions, returning the host's language index for them.
    ///
    /// `None` if the host has no NativeScript 1.1 support.
    #[allow(unused_variables)]
    fn register_instance_binding(&self, functions: sys::godot_instance_binding_functions) -> Option<i32> {
        None
    }

    #[allow(unused_variables)]
    fn unregister_instance_binding(&self, language_index: i32) {}
}

/// Anything that can reach the host for printing, if it is bound.
///
/// Implemented by the handshake and the contexts it hands to hooks. Used by the `gdn_*!` print macros.
pub trait HostAccess {
    fn host_api(&self) -> Option<&dyn HostApi>;
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Real engine

/// Host backed by the API structs discovered in `gdnative_init`.
///
/// Printing goes through the core struct, so messages show up in the editor's output panel and the engine log. Class
/// and instance-binding registration and profiling go through the NativeScript structs.
#[derive(Copy, Clone, Debug)]
pub struct EngineHost {
    table: ApiTable,
}

impl EngineHost {
    /// # Safety
    /// The `EngineHost` and all its copies must only be used between the `gdnative_init` call that produced `table` and
    /// the matching `gdnative_terminate`.
    pub unsafe fn new(table: ApiTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ApiTable {
        &self.table
    }

    fn core(&self) -> &sys::godot_gdnative_core_api_struct {
        // SAFETY: `EngineHost` is only used inside the table's validity window (see `new`).
        unsafe { self.table.core() }
    }
}

impl HostApi for EngineHost {
    fn print(&self, message: &str) {
        let core = self.core();
        let (Some(new_string), Some(print), Some(destroy)) = (
            core.godot_string_new_with_wide_string,
            core.godot_print,
            core.godot_string_destroy,
        ) else {
            crate::out!("core struct without print functions");
            println!("{message}");
            return;
        };

        let wide = sys::to_wide_string(message);
        let len = i32::try_from(wide.len()).unwrap_or(i32::MAX);
        let mut string = MaybeUninit::<sys::godot_string>::uninit();

        // SAFETY: function pointers provided by the host. The string is initialized by the constructor, only read by
        // `godot_print`, and destroyed exactly once.
        unsafe {
            new_string(string.as_mut_ptr(), wide.as_ptr(), len);
            print(string.as_ptr());
            destroy(string.as_mut_ptr());
        }
    }

    fn print_warning(&self, message: &str, site: &CallSite<'_>) {
        if !print_message(self.core().godot_print_warning, message, site) {
            eprintln!("WARNING: {}: {message}\n   At: {}:{}", site.function, site.file, site.line);
        }
    }

    fn print_error(&self, message: &str, site: &CallSite<'_>) {
        if !print_message(self.core().godot_print_error, message, site) {
            eprintln!("ERROR: {}: {message}\n   At: {}:{}", site.function, site.file, site.line);
        }
    }

    fn profiling_add_data(&self, signature: &str, time_usec: u64) {
        // SAFETY: `EngineHost` is only used inside the table's validity window (see `new`).
        let Some(add_data) = unsafe { self.table.nativescript_1_1() }.and_then(|ns| ns.godot_nativescript_profiling_add_data)
        else {
            crate::out!("profiling sample `{signature}` dropped: no NativeScript 1.1");
            return;
        };

        let signature = sys::to_c_string_lossy(signature);

        // SAFETY: function pointer provided by the host; the string outlives the call.
        unsafe { add_data(signature.as_ptr(), time_usec) };
    }

    fn register_class(&self, handle: RegistrationHandle, class: &ClassDescriptor) -> Result<(), RegistrationError> {
        let missing = || RegistrationError::MissingApi {
            api: ApiKind::NativeScript,
        };

        // SAFETY: `EngineHost` is only used inside the table's validity window (see `new`).
        let nativescript = unsafe { self.table.nativescript() }.ok_or_else(missing)?;

        let register = if class.is_tool() {
            nativescript.godot_nativescript_register_tool_class
        } else {
            nativescript.godot_nativescript_register_class
        };
        let register = register.ok_or_else(missing)?;

        // `create_instance` reports a missing owner through the core struct; the engine keeps it alive past every instance.
        let mut create = class.create_func();
        create.method_data = self.core() as *const sys::godot_gdnative_core_api_struct as *mut c_void;

        // SAFETY: function pointer provided by the host; handle and strings are valid for the call. The host copies the
        // names and takes ownership of the create/destroy function data.
        unsafe {
            register(
                handle.as_sys(),
                class.name().as_ptr(),
                class.base().as_ptr(),
                create,
                class.destroy_func(),
            )
        };

        Ok(())
    }

    fn register_instance_binding(&self, functions: sys::godot_instance_binding_functions) -> Option<i32> {
        // SAFETY: `EngineHost` is only used inside the table's validity window (see `new`).
        let register = unsafe { self.table.nativescript_1_1() }?
            .godot_nativescript_register_instance_binding_data_functions?;

        // SAFETY: function pointer provided by the host, which takes ownership of `functions`.
        let index = unsafe { register(functions) };
        Some(index)
    }

    fn unregister_instance_binding(&self, language_index: i32) {
        // SAFETY: `EngineHost` is only used inside the table's validity window (see `new`).
        let unregister = unsafe { self.table.nativescript_1_1() }
            .and_then(|ns| ns.godot_nativescript_unregister_instance_binding_data_functions);

        match unregister {
            // SAFETY: function pointer provided by the host; the index was returned by the matching register call.
            Some(unregister) => unsafe { unregister(language_index) },
            None => crate::out!("cannot unregister instance binding {language_index}: no NativeScript 1.1"),
        }
    }
}

/// Reports an error through the core struct behind `core`, or to stderr if there is none.
///
/// # Safety
/// `core` must be null or point to a live core API struct.
pub(crate) unsafe fn print_error_via_core(
    core: *const sys::godot_gdnative_core_api_struct,
    message: &str,
    site: &CallSite<'_>,
) {
    // SAFETY: upheld by the caller.
    let print_fn = unsafe { core.as_ref() }.and_then(|core| core.godot_print_error);
    if !print_message(print_fn, message, site) {
        crate::global::print_error(None, message, site);
    }
}

/// Calls one of the core `godot_print_*` functions; `false` if the host left it out.
fn print_message(print_fn: sys::godot_print_message_fn, message: &str, site: &CallSite<'_>) -> bool {
    let Some(print_fn) = print_fn else {
        return false;
    };

    let description = sys::to_c_string_lossy(message);
    let function = sys::to_c_string_lossy(site.function);
    let file = sys::to_c_string_lossy(site.file);
    let line = i32::try_from(site.line).unwrap_or(i32::MAX);

    // SAFETY: function pointer provided by the host; the strings outlive the call.
    unsafe { print_fn(description.as_ptr(), function.as_ptr(), file.as_ptr(), line) };
    true
}

/// Converts a host-facing name, failing on interior NUL bytes.
pub(crate) fn class_name_to_c(name: &str) -> Result<CString, RegistrationError> {
    CString::new(name).map_err(|_| RegistrationError::InvalidName {
        name: name.to_string(),
    })
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
