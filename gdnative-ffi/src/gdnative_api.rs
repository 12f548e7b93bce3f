/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! C declarations of the GDNative 3.x handshake ABI.
//!
//! Names and field order follow `gdnative/gdnative.h`, `nativescript/godot_nativescript.h` and
//! `gdnative_api_struct.gen.h`. Only the parts touched by the registration handshake are declared with signatures. The
//! function section of the core API struct is laid out slot by slot, but entries this crate never calls are untyped.

use std::ffi::c_void;

use libc::{c_char, c_int, c_uint, wchar_t};

use crate::opaque::Opaque;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Basic types

/// `godot_bool` is a C99 `bool`.
pub type godot_bool = bool;

/// `typedef void godot_object;`
pub type godot_object = c_void;

/// `godot_string`: one pointer, opaque to extensions.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct godot_string {
    _dont_touch_that: Opaque<{ std::mem::size_of::<*const c_void>() }>,
}

/// `godot_variant`: 16 bytes payload plus the `int64_t` type tag.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct godot_variant {
    _dont_touch_that: Opaque<{ 16 + std::mem::size_of::<i64>() }>,
}

/// Only ever used behind a pointer.
#[repr(C)]
pub struct godot_property_attributes {
    _private: [u8; 0],
}

/// Only ever used behind a pointer.
#[repr(C)]
pub struct godot_signal {
    _private: [u8; 0],
}

/// Only ever used behind a pointer.
#[repr(C)]
pub struct godot_method_arg {
    _private: [u8; 0],
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// API struct headers

#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct godot_gdnative_api_version {
    pub major: c_uint,
    pub minor: c_uint,
}

/// Common header of every API struct. Extension structs start with exactly these fields.
#[repr(C)]
#[derive(Debug)]
pub struct godot_gdnative_api_struct {
    pub type_: c_uint,
    pub version: godot_gdnative_api_version,
    pub next: *const godot_gdnative_api_struct,
}

pub type GDNATIVE_API_TYPES = c_uint;
pub const GDNATIVE_CORE: GDNATIVE_API_TYPES = 0;
pub const GDNATIVE_EXT_NATIVESCRIPT: GDNATIVE_API_TYPES = 1;
pub const GDNATIVE_EXT_PLUGINSCRIPT: GDNATIVE_API_TYPES = 2;
pub const GDNATIVE_EXT_ANDROID: GDNATIVE_API_TYPES = 3;
pub const GDNATIVE_EXT_ARVR: GDNATIVE_API_TYPES = 4;
pub const GDNATIVE_EXT_VIDEODECODER: GDNATIVE_API_TYPES = 5;
pub const GDNATIVE_EXT_NET: GDNATIVE_API_TYPES = 6;

/// Entry of the core function table that is never called from Rust.
pub type godot_untyped_fn = Option<unsafe extern "C" fn()>;

pub type godot_print_message_fn = Option<
    unsafe extern "C" fn(p_description: *const c_char, p_function: *const c_char, p_file: *const c_char, p_line: c_int),
>;

/// `godot_gdnative_core_api_struct`, the core 1.0 function table.
///
/// Untyped slots are grouped by the header declaring them, in the order of `gdnative_api_struct.gen.h`. The typed
/// entries therefore sit at the header's offsets; see the layout checks at the end of this file.
#[repr(C)]
pub struct godot_gdnative_core_api_struct {
    pub type_: c_uint,
    pub version: godot_gdnative_api_version,
    pub next: *const godot_gdnative_api_struct,
    pub num_extensions: c_uint,
    pub extensions: *const *const godot_gdnative_api_struct,

    _color: [godot_untyped_fn; 24],
    _vector2: [godot_untyped_fn; 37],
    _quat: [godot_untyped_fn; 27],
    _basis: [godot_untyped_fn; 30],
    _vector3: [godot_untyped_fn; 37],
    // 7 element types, 14 functions each.
    _pool_arrays: [godot_untyped_fn; 98],
    _array: [godot_untyped_fn; 38],
    _dictionary: [godot_untyped_fn; 18],
    _node_path: [godot_untyped_fn; 12],
    _plane: [godot_untyped_fn; 20],
    _rect2: [godot_untyped_fn; 17],
    _aabb: [godot_untyped_fn; 27],
    _rid: [godot_untyped_fn; 5],
    _transform: [godot_untyped_fn; 23],
    _transform2d: [godot_untyped_fn; 22],
    _variant: [godot_untyped_fn; 64],
    _char_string: [godot_untyped_fn; 3],
    // godot_string_new, godot_string_new_copy
    _string_new: [godot_untyped_fn; 2],
    pub godot_string_new_with_wide_string:
        Option<unsafe extern "C" fn(r_dest: *mut godot_string, p_contents: *const wchar_t, p_size: c_int)>,
    // godot_string_operator_index .. godot_string_is_valid_ip_address
    _string: [godot_untyped_fn; 144],
    pub godot_string_destroy: Option<unsafe extern "C" fn(p_self: *mut godot_string)>,
    _string_name: [godot_untyped_fn; 8],
    // godot_object_destroy .. godot_register_native_call_type
    _object: [godot_untyped_fn; 8],
    // godot_alloc, godot_realloc, godot_free
    _memory: [godot_untyped_fn; 3],
    pub godot_print_error: godot_print_message_fn,
    pub godot_print_warning: godot_print_message_fn,
    pub godot_print: Option<unsafe extern "C" fn(p_message: *const godot_string)>,
}

/// Number of function slots in the core 1.0 table.
pub const CORE_API_1_0_FUNCTION_COUNT: usize = 672;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Init/terminate options

pub type godot_report_version_mismatch_fn = Option<
    unsafe extern "C" fn(
        p_library: *const godot_object,
        p_what: *const c_char,
        p_want: godot_gdnative_api_version,
        p_have: godot_gdnative_api_version,
    ),
>;

pub type godot_report_loading_error_fn =
    Option<unsafe extern "C" fn(p_library: *const godot_object, p_what: *const c_char)>;

#[repr(C)]
pub struct godot_gdnative_init_options {
    pub in_editor: godot_bool,
    pub core_api_hash: u64,
    pub editor_api_hash: u64,
    pub no_api_hash: u64,
    pub report_version_mismatch: godot_report_version_mismatch_fn,
    pub report_loading_error: godot_report_loading_error_fn,
    pub gd_native_library: *mut godot_object,
    pub api_struct: *const godot_gdnative_core_api_struct,
    pub active_library_path: *const godot_string,
}

#[repr(C)]
pub struct godot_gdnative_terminate_options {
    pub in_editor: godot_bool,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// NativeScript 1.0

#[repr(C)]
pub struct godot_instance_create_func {
    pub create_func:
        Option<unsafe extern "C" fn(p_instance: *mut godot_object, p_method_data: *mut c_void) -> *mut c_void>,
    pub method_data: *mut c_void,
    pub free_func: Option<unsafe extern "C" fn(p_method_data: *mut c_void)>,
}

#[repr(C)]
pub struct godot_instance_destroy_func {
    pub destroy_func: Option<
        unsafe extern "C" fn(p_instance: *mut godot_object, p_method_data: *mut c_void, p_user_data: *mut c_void),
    >,
    pub method_data: *mut c_void,
    pub free_func: Option<unsafe extern "C" fn(p_method_data: *mut c_void)>,
}

pub type godot_method_rpc_mode = c_int;
pub const GODOT_METHOD_RPC_MODE_DISABLED: godot_method_rpc_mode = 0;

#[repr(C)]
#[derive(Copy, Clone)]
pub struct godot_method_attributes {
    pub rpc_type: godot_method_rpc_mode,
}

#[repr(C)]
pub struct godot_instance_method {
    pub method: Option<
        unsafe extern "C" fn(
            p_instance: *mut godot_object,
            p_method_data: *mut c_void,
            p_user_data: *mut c_void,
            p_num_args: c_int,
            p_args: *mut *mut godot_variant,
        ) -> godot_variant,
    >,
    pub method_data: *mut c_void,
    pub free_func: Option<unsafe extern "C" fn(p_method_data: *mut c_void)>,
}

#[repr(C)]
pub struct godot_property_set_func {
    pub set_func: Option<
        unsafe extern "C" fn(
            p_instance: *mut godot_object,
            p_method_data: *mut c_void,
            p_user_data: *mut c_void,
            p_value: *mut godot_variant,
        ),
    >,
    pub method_data: *mut c_void,
    pub free_func: Option<unsafe extern "C" fn(p_method_data: *mut c_void)>,
}

#[repr(C)]
pub struct godot_property_get_func {
    pub get_func: Option<
        unsafe extern "C" fn(
            p_instance: *mut godot_object,
            p_method_data: *mut c_void,
            p_user_data: *mut c_void,
        ) -> godot_variant,
    >,
    pub method_data: *mut c_void,
    pub free_func: Option<unsafe extern "C" fn(p_method_data: *mut c_void)>,
}

pub type godot_register_class_fn = Option<
    unsafe extern "C" fn(
        p_gdnative_handle: *mut c_void,
        p_name: *const c_char,
        p_base: *const c_char,
        p_create_func: godot_instance_create_func,
        p_destroy_func: godot_instance_destroy_func,
    ),
>;

#[repr(C)]
pub struct godot_gdnative_ext_nativescript_api_struct {
    pub type_: c_uint,
    pub version: godot_gdnative_api_version,
    pub next: *const godot_gdnative_api_struct,
    pub godot_nativescript_register_class: godot_register_class_fn,
    pub godot_nativescript_register_tool_class: godot_register_class_fn,
    pub godot_nativescript_register_method: Option<
        unsafe extern "C" fn(
            p_gdnative_handle: *mut c_void,
            p_name: *const c_char,
            p_function_name: *const c_char,
            p_attr: godot_method_attributes,
            p_method: godot_instance_method,
        ),
    >,
    pub godot_nativescript_register_property: Option<
        unsafe extern "C" fn(
            p_gdnative_handle: *mut c_void,
            p_name: *const c_char,
            p_path: *const c_char,
            p_attr: *mut godot_property_attributes,
            p_set_func: godot_property_set_func,
            p_get_func: godot_property_get_func,
        ),
    >,
    pub godot_nativescript_register_signal: Option<
        unsafe extern "C" fn(p_gdnative_handle: *mut c_void, p_name: *const c_char, p_signal: *const godot_signal),
    >,
    pub godot_nativescript_get_userdata: Option<unsafe extern "C" fn(p_instance: *mut godot_object) -> *mut c_void>,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// NativeScript 1.1

#[repr(C)]
pub struct godot_instance_binding_functions {
    pub alloc_instance_binding_data: Option<
        unsafe extern "C" fn(p_data: *mut c_void, p_type_tag: *const c_void, p_instance: *mut godot_object) -> *mut c_void,
    >,
    pub free_instance_binding_data: Option<unsafe extern "C" fn(p_data: *mut c_void, p_binding: *mut c_void)>,
    pub refcount_incremented_instance_binding:
        Option<unsafe extern "C" fn(p_data: *mut c_void, p_instance: *mut godot_object)>,
    pub refcount_decremented_instance_binding:
        Option<unsafe extern "C" fn(p_data: *mut c_void, p_instance: *mut godot_object) -> bool>,
    pub data: *mut c_void,
    pub free_func: Option<unsafe extern "C" fn(p_data: *mut c_void)>,
}

#[repr(C)]
pub struct godot_gdnative_ext_nativescript_1_1_api_struct {
    pub type_: c_uint,
    pub version: godot_gdnative_api_version,
    pub next: *const godot_gdnative_api_struct,
    pub godot_nativescript_set_method_argument_information: Option<
        unsafe extern "C" fn(
            p_gdnative_handle: *mut c_void,
            p_name: *const c_char,
            p_function_name: *const c_char,
            p_num_args: c_int,
            p_args: *const godot_method_arg,
        ),
    >,
    pub godot_nativescript_set_class_documentation: Option<
        unsafe extern "C" fn(p_gdnative_handle: *mut c_void, p_name: *const c_char, p_documentation: godot_string),
    >,
    pub godot_nativescript_set_method_documentation: Option<
        unsafe extern "C" fn(
            p_gdnative_handle: *mut c_void,
            p_name: *const c_char,
            p_function_name: *const c_char,
            p_documentation: godot_string,
        ),
    >,
    pub godot_nativescript_set_property_documentation: Option<
        unsafe extern "C" fn(
            p_gdnative_handle: *mut c_void,
            p_name: *const c_char,
            p_path: *const c_char,
            p_documentation: godot_string,
        ),
    >,
    pub godot_nativescript_set_signal_documentation: Option<
        unsafe extern "C" fn(
            p_gdnative_handle: *mut c_void,
            p_name: *const c_char,
            p_signal_name: *const c_char,
            p_documentation: godot_string,
        ),
    >,
    pub godot_nativescript_set_global_type_tag:
        Option<unsafe extern "C" fn(p_idx: c_int, p_name: *const c_char, p_type_tag: *const c_void)>,
    pub godot_nativescript_get_global_type_tag:
        Option<unsafe extern "C" fn(p_idx: c_int, p_name: *const c_char) -> *const c_void>,
    pub godot_nativescript_set_type_tag: Option<
        unsafe extern "C" fn(p_gdnative_handle: *mut c_void, p_name: *const c_char, p_type_tag: *const c_void),
    >,
    pub godot_nativescript_get_type_tag: Option<unsafe extern "C" fn(p_object: *const godot_object) -> *const c_void>,
    pub godot_nativescript_register_instance_binding_data_functions:
        Option<unsafe extern "C" fn(p_binding_functions: godot_instance_binding_functions) -> c_int>,
    pub godot_nativescript_unregister_instance_binding_data_functions: Option<unsafe extern "C" fn(p_idx: c_int)>,
    pub godot_nativescript_get_instance_binding_data:
        Option<unsafe extern "C" fn(p_idx: c_int, p_object: *mut godot_object) -> *mut c_void>,
    pub godot_nativescript_profiling_add_data: Option<unsafe extern "C" fn(p_signature: *const c_char, p_time: u64)>,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Entry point signatures

pub type godot_gdnative_init_fn = unsafe extern "C" fn(p_options: *mut godot_gdnative_init_options);
pub type godot_gdnative_terminate_fn = unsafe extern "C" fn(p_options: *mut godot_gdnative_terminate_options);
pub type godot_nativescript_init_fn = unsafe extern "C" fn(p_handle: *mut c_void);
pub type godot_nativescript_terminate_fn = unsafe extern "C" fn(p_handle: *mut c_void);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Layout checks against the C headers (LP64 and LLP64)

#[cfg(target_pointer_width = "64")]
mod layout {
    use super::*;

    crate::static_assert!(std::mem::size_of::<godot_gdnative_api_version>() == 8);
    crate::static_assert!(std::mem::size_of::<godot_gdnative_api_struct>() == 24);
    crate::static_assert!(std::mem::size_of::<godot_gdnative_core_api_struct>() == 40 + CORE_API_1_0_FUNCTION_COUNT * 8);
    crate::static_assert!(std::mem::size_of::<godot_gdnative_init_options>() == 72);
    crate::static_assert!(std::mem::size_of::<godot_gdnative_terminate_options>() == 1);
    crate::static_assert!(std::mem::size_of::<godot_string>() == 8);
    crate::static_assert!(std::mem::size_of::<godot_variant>() == 24);
    crate::static_assert!(std::mem::size_of::<godot_instance_create_func>() == 24);
    crate::static_assert!(std::mem::size_of::<godot_instance_binding_functions>() == 48);
    crate::static_assert!(std::mem::size_of::<godot_gdnative_ext_nativescript_api_struct>() == 24 + 6 * 8);
    crate::static_assert!(std::mem::size_of::<godot_gdnative_ext_nativescript_1_1_api_struct>() == 24 + 13 * 8);

    // Slot indices of the typed core entries.
    crate::static_assert!(std::mem::offset_of!(godot_gdnative_core_api_struct, godot_string_new_with_wide_string) == 40 + 504 * 8);
    crate::static_assert!(std::mem::offset_of!(godot_gdnative_core_api_struct, godot_string_destroy) == 40 + 649 * 8);
    crate::static_assert!(std::mem::offset_of!(godot_gdnative_core_api_struct, godot_print_error) == 40 + 669 * 8);
    crate::static_assert!(std::mem::offset_of!(godot_gdnative_core_api_struct, godot_print) == 40 + 671 * 8);
}
