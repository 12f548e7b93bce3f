/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Instance binding functions, registered with NativeScript 1.1 during `nativescript_init`.
//!
//! The host calls them to attach per-language data to engine objects. The index it returns for the registration is the
//! extension's `language_index`.

use std::ffi::c_void;
use std::ptr;

use crate::sys;

/// Per-object data the host keeps for this extension's language.
#[derive(Debug)]
pub struct InstanceBinding {
    instance: *mut sys::godot_object,
    type_tag: *const c_void,
}

impl InstanceBinding {
    pub fn instance(&self) -> *mut sys::godot_object {
        self.instance
    }

    pub fn type_tag(&self) -> *const c_void {
        self.type_tag
    }
}

/// The function table handed to the host. The host owns it after registration.
pub fn instance_binding_functions() -> sys::godot_instance_binding_functions {
    sys::godot_instance_binding_functions {
        alloc_instance_binding_data: Some(alloc_instance_binding_data),
        free_instance_binding_data: Some(free_instance_binding_data),
        refcount_incremented_instance_binding: Some(refcount_incremented_instance_binding),
        refcount_decremented_instance_binding: Some(refcount_decremented_instance_binding),
        data: ptr::null_mut(),
        free_func: None,
    }
}

unsafe extern "C" fn alloc_instance_binding_data(
    _data: *mut c_void,
    type_tag: *const c_void,
    instance: *mut sys::godot_object,
) -> *mut c_void {
    let binding = Box::new(InstanceBinding { instance, type_tag });
    Box::into_raw(binding) as *mut c_void
}

unsafe extern "C" fn free_instance_binding_data(_data: *mut c_void, binding: *mut c_void) {
    if binding.is_null() {
        return;
    }

    // SAFETY: `binding` was returned by `alloc_instance_binding_data`, and the host frees it once.
    drop(unsafe { Box::from_raw(binding as *mut InstanceBinding) });
}

unsafe extern "C" fn refcount_incremented_instance_binding(_data: *mut c_void, _instance: *mut sys::godot_object) {}

// The binding holds no strong reference, so it never keeps the object alive.
unsafe extern "C" fn refcount_decremented_instance_binding(
    _data: *mut c_void,
    _instance: *mut sys::godot_object,
) -> bool {
    true
}
