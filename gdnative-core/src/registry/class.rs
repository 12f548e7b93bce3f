/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::{c_void, CStr, CString};
use std::ptr;
use std::ptr::NonNull;

use crate::error::RegistrationError;
use crate::host::{class_name_to_c, print_error_via_core};
use crate::private::handle_panic;
use crate::sys;

/// Rust type whose instances back a script class in the host.
///
/// The host creates one instance per object the script is attached to, and destroys it when the object goes away.
pub trait NativeClass: Sized + 'static {
    /// Name under which the class is visible to scripts.
    fn class_name() -> &'static str;

    /// Engine class the script extends.
    fn base_class_name() -> &'static str {
        "Reference"
    }

    /// Creates the Rust state for a freshly attached script instance.
    fn init(owner: OwnerHandle) -> Self;
}

/// The host object a script instance is attached to. Never dereferenced by this crate.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct OwnerHandle(NonNull<sys::godot_object>);

impl OwnerHandle {
    pub fn from_sys(ptr: *mut sys::godot_object) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_sys(self) -> *mut sys::godot_object {
        self.0.as_ptr()
    }
}

type CreateFn = unsafe extern "C" fn(*mut sys::godot_object, *mut c_void) -> *mut c_void;
type DestroyFn = unsafe extern "C" fn(*mut sys::godot_object, *mut c_void, *mut c_void);

/// Everything the host needs to register one class: names and the create/destroy callbacks bound to a Rust type.
#[derive(Clone, Debug)]
pub struct ClassDescriptor {
    name: CString,
    base: CString,
    is_tool: bool,
    create: CreateFn,
    destroy: DestroyFn,
}

impl ClassDescriptor {
    /// Describes `T`. Fails if one of its names contains a NUL byte.
    pub fn of<T: NativeClass>(is_tool: bool) -> Result<Self, RegistrationError> {
        Ok(Self {
            name: class_name_to_c(T::class_name())?,
            base: class_name_to_c(T::base_class_name())?,
            is_tool,
            create: create_instance::<T>,
            destroy: destroy_instance::<T>,
        })
    }

    pub fn name(&self) -> &CStr {
        &self.name
    }

    pub fn base(&self) -> &CStr {
        &self.base
    }

    /// Whether the class also runs inside the editor.
    pub fn is_tool(&self) -> bool {
        self.is_tool
    }

    pub fn create_func(&self) -> sys::godot_instance_create_func {
        sys::godot_instance_create_func {
            create_func: Some(self.create),
            method_data: ptr::null_mut(),
            free_func: None,
        }
    }

    pub fn destroy_func(&self) -> sys::godot_instance_destroy_func {
        sys::godot_instance_destroy_func {
            destroy_func: Some(self.destroy),
            method_data: ptr::null_mut(),
            free_func: None,
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Callbacks invoked by the host

unsafe extern "C" fn create_instance<T: NativeClass>(
    instance: *mut sys::godot_object,
    method_data: *mut c_void,
) -> *mut c_void {
    let ctx = || format!("failed to create instance of `{}`", T::class_name());

    let result = handle_panic(ctx, || {
        let Some(owner) = OwnerHandle::from_sys(instance) else {
            let site = crate::global::CallSite {
                function: "create_instance",
                file: file!(),
                line: line!(),
            };
            let message = format!("host created `{}` without an owner object", T::class_name());

            // SAFETY: `method_data` is null or the core struct set by `EngineHost::register_class`.
            unsafe { print_error_via_core(method_data as *const sys::godot_gdnative_core_api_struct, &message, &site) };
            return ptr::null_mut();
        };

        let user_data = Box::new(T::init(owner));
        Box::into_raw(user_data) as *mut c_void
    });

    result.unwrap_or_else(|msg| {
        crate::private::report_panic(None, &msg);
        ptr::null_mut()
    })
}

unsafe extern "C" fn destroy_instance<T: NativeClass>(
    _instance: *mut sys::godot_object,
    _method_data: *mut c_void,
    user_data: *mut c_void,
) {
    if user_data.is_null() {
        return;
    }

    let ctx = || format!("failed to destroy instance of `{}`", T::class_name());

    let result = handle_panic(ctx, || {
        // SAFETY: `user_data` was produced by `create_instance::<T>` and the host destroys each instance once.
        drop(unsafe { Box::from_raw(user_data as *mut T) });
    });

    if let Err(msg) = result {
        crate::private::report_panic(None, &msg);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
