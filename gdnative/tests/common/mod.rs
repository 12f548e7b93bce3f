/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Test doubles for the host side of the handshake.
//!
//! [`MockHost`] implements `HostApi` directly; [`FakeEngine`] builds the C API structs a real engine would pass to
//! `gdnative_init`, with callbacks that record into a process-wide log.

#![allow(dead_code)] // Not every test binary uses every helper.

use std::cell::RefCell;
use std::ffi::{c_void, CStr};
use std::ptr;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};

use gdnative::global::CallSite;
use gdnative::host::HostApi;
use gdnative::sys;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Mock host

#[derive(Clone, Default)]
pub struct MockHost {
    pub log: Rc<RefCell<Vec<String>>>,
}

impl MockHost {
    pub fn lines(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn push(&self, line: String) {
        self.log.borrow_mut().push(line);
    }
}

impl HostApi for MockHost {
    fn print(&self, message: &str) {
        self.push(format!("print:{message}"));
    }

    fn print_warning(&self, message: &str, site: &CallSite<'_>) {
        self.push(format!("warning:{message}@{}", site.function));
    }

    fn print_error(&self, message: &str, site: &CallSite<'_>) {
        self.push(format!("error:{message}@{}", site.function));
    }

    fn profiling_add_data(&self, signature: &str, _time_usec: u64) {
        self.push(format!("profile:{signature}"));
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Fake engine

static ENGINE_LOG: Mutex<Vec<String>> = Mutex::new(Vec::new());
static SERIAL: Mutex<()> = Mutex::new(());

/// Language index the fake engine hands out for instance binding functions.
pub const LANGUAGE_INDEX: i32 = 5;

/// Serializes tests that share the engine log or an extension's storage slot.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record(line: String) {
    ENGINE_LOG.lock().unwrap_or_else(PoisonError::into_inner).push(line);
}

/// Returns and clears everything the fake engine recorded.
pub fn take_engine_log() -> Vec<String> {
    std::mem::take(&mut *ENGINE_LOG.lock().unwrap_or_else(PoisonError::into_inner))
}

/// API structs of a GDNative 3.x engine, with a single NativeScript extension.
///
/// Engine printing is recorded as `engine_print:<message>`, `engine_warning:<message>@<function>` and
/// `engine_error:<message>@<function>`.
///
/// Everything is boxed so that the pointers handed out stay valid when the `FakeEngine` moves.
pub struct FakeEngine {
    core: Box<sys::godot_gdnative_core_api_struct>,
    extensions: Box<[*const sys::godot_gdnative_api_struct; 1]>,
    nativescript: Box<sys::godot_gdnative_ext_nativescript_api_struct>,
    nativescript_1_1: Option<Box<sys::godot_gdnative_ext_nativescript_1_1_api_struct>>,
    library: Box<u64>,
    registration: Box<u64>,
}

impl FakeEngine {
    /// Engine with NativeScript 1.0, plus 1.1 if `with_nativescript_1_1`.
    pub fn new(with_nativescript_1_1: bool) -> Self {
        let nativescript_1_1 = with_nativescript_1_1.then(|| Box::new(nativescript_1_1_struct()));
        let next = match &nativescript_1_1 {
            Some(ns) => &**ns as *const _ as *const sys::godot_gdnative_api_struct,
            None => ptr::null(),
        };

        let nativescript = Box::new(nativescript_struct(next));
        let extensions = Box::new([&*nativescript as *const _ as *const sys::godot_gdnative_api_struct]);

        // SAFETY: all-zero is valid for the struct: null pointers and `None` function slots.
        let mut core: Box<sys::godot_gdnative_core_api_struct> = Box::new(unsafe { std::mem::zeroed() });
        core.type_ = sys::GDNATIVE_CORE;
        core.version = sys::godot_gdnative_api_version { major: 1, minor: 0 };
        core.num_extensions = 1;
        core.extensions = extensions.as_ptr();
        core.godot_string_new_with_wide_string = Some(string_new_with_wide_string);
        core.godot_string_destroy = Some(string_destroy);
        core.godot_print = Some(print);
        core.godot_print_warning = Some(print_warning);
        core.godot_print_error = Some(print_error);

        Self {
            core,
            extensions,
            nativescript,
            nativescript_1_1,
            library: Box::new(0x11),
            registration: Box::new(0x22),
        }
    }

    pub fn init_options(&mut self, in_editor: bool) -> sys::godot_gdnative_init_options {
        sys::godot_gdnative_init_options {
            in_editor,
            core_api_hash: 0,
            editor_api_hash: 0,
            no_api_hash: 0,
            report_version_mismatch: Some(report_version_mismatch),
            report_loading_error: Some(report_loading_error),
            gd_native_library: self.library_ptr(),
            api_struct: &*self.core,
            active_library_path: ptr::null(),
        }
    }

    pub fn library_ptr(&mut self) -> *mut c_void {
        &mut *self.library as *mut u64 as *mut c_void
    }

    pub fn registration_handle(&mut self) -> *mut c_void {
        &mut *self.registration as *mut u64 as *mut c_void
    }
}

fn nativescript_struct(next: *const sys::godot_gdnative_api_struct) -> sys::godot_gdnative_ext_nativescript_api_struct {
    sys::godot_gdnative_ext_nativescript_api_struct {
        type_: sys::GDNATIVE_EXT_NATIVESCRIPT,
        version: sys::godot_gdnative_api_version { major: 1, minor: 0 },
        next,
        godot_nativescript_register_class: Some(register_class),
        godot_nativescript_register_tool_class: Some(register_tool_class),
        godot_nativescript_register_method: None,
        godot_nativescript_register_property: None,
        godot_nativescript_register_signal: None,
        godot_nativescript_get_userdata: None,
    }
}

fn nativescript_1_1_struct() -> sys::godot_gdnative_ext_nativescript_1_1_api_struct {
    sys::godot_gdnative_ext_nativescript_1_1_api_struct {
        type_: sys::GDNATIVE_EXT_NATIVESCRIPT,
        version: sys::godot_gdnative_api_version { major: 1, minor: 1 },
        next: ptr::null(),
        godot_nativescript_set_method_argument_information: None,
        godot_nativescript_set_class_documentation: None,
        godot_nativescript_set_method_documentation: None,
        godot_nativescript_set_property_documentation: None,
        godot_nativescript_set_signal_documentation: None,
        godot_nativescript_set_global_type_tag: None,
        godot_nativescript_get_global_type_tag: None,
        godot_nativescript_set_type_tag: None,
        godot_nativescript_get_type_tag: None,
        godot_nativescript_register_instance_binding_data_functions: Some(register_instance_binding),
        godot_nativescript_unregister_instance_binding_data_functions: Some(unregister_instance_binding),
        godot_nativescript_get_instance_binding_data: None,
        godot_nativescript_profiling_add_data: Some(profiling_add_data),
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Engine callbacks

unsafe fn string(ptr: *const std::ffi::c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

// The fake `godot_string` owns a leaked `Box<String>`.
unsafe extern "C" fn string_new_with_wide_string(
    dest: *mut sys::godot_string,
    contents: *const libc::wchar_t,
    size: libc::c_int,
) {
    let units = unsafe { std::slice::from_raw_parts(contents, size as usize) };

    #[cfg(not(windows))]
    let text: String = units
        .iter()
        .map(|&unit| char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    #[cfg(windows)]
    let text = String::from_utf16_lossy(units);

    unsafe { ptr::write(dest as *mut *mut String, Box::into_raw(Box::new(text))) };
}

unsafe extern "C" fn string_destroy(string: *mut sys::godot_string) {
    drop(unsafe { Box::from_raw(*(string as *mut *mut String)) });
}

unsafe extern "C" fn print(message: *const sys::godot_string) {
    let text = unsafe { &**(message as *const *mut String) };
    record(format!("engine_print:{text}"));
}

unsafe extern "C" fn print_warning(
    description: *const std::ffi::c_char,
    function: *const std::ffi::c_char,
    _file: *const std::ffi::c_char,
    _line: libc::c_int,
) {
    let (description, function) = unsafe { (string(description), string(function)) };
    record(format!("engine_warning:{description}@{function}"));
}

unsafe extern "C" fn print_error(
    description: *const std::ffi::c_char,
    function: *const std::ffi::c_char,
    _file: *const std::ffi::c_char,
    _line: libc::c_int,
) {
    let (description, function) = unsafe { (string(description), string(function)) };
    record(format!("engine_error:{description}@{function}"));
}

unsafe extern "C" fn report_version_mismatch(
    _library: *const sys::godot_object,
    what: *const std::ffi::c_char,
    want: sys::godot_gdnative_api_version,
    have: sys::godot_gdnative_api_version,
) {
    let what = unsafe { string(what) };
    record(format!(
        "version_mismatch:{what}:{}.{}:{}.{}",
        want.major, want.minor, have.major, have.minor
    ));
}

unsafe extern "C" fn report_loading_error(_library: *const sys::godot_object, what: *const std::ffi::c_char) {
    record(format!("loading_error:{}", unsafe { string(what) }));
}

/// Registers the class, then creates and destroys one instance of it, like attaching and detaching a script.
unsafe fn register(
    kind: &str,
    name: *const std::ffi::c_char,
    base: *const std::ffi::c_char,
    create: sys::godot_instance_create_func,
    destroy: sys::godot_instance_destroy_func,
) {
    let (name, base) = unsafe { (string(name), string(base)) };
    record(format!("{kind}:{name}:{base}"));

    let mut owner = 0u64;
    let owner = &mut owner as *mut u64 as *mut sys::godot_object;

    let create_fn = create.create_func.expect("create_func set");
    let destroy_fn = destroy.destroy_func.expect("destroy_func set");
    unsafe {
        let user_data = create_fn(owner, create.method_data);
        assert!(!user_data.is_null(), "instance of {name} created");
        destroy_fn(owner, destroy.method_data, user_data);
    }
}

unsafe extern "C" fn register_class(
    _handle: *mut c_void,
    name: *const std::ffi::c_char,
    base: *const std::ffi::c_char,
    create: sys::godot_instance_create_func,
    destroy: sys::godot_instance_destroy_func,
) {
    unsafe { register("class", name, base, create, destroy) }
}

unsafe extern "C" fn register_tool_class(
    _handle: *mut c_void,
    name: *const std::ffi::c_char,
    base: *const std::ffi::c_char,
    create: sys::godot_instance_create_func,
    destroy: sys::godot_instance_destroy_func,
) {
    unsafe { register("tool_class", name, base, create, destroy) }
}

unsafe extern "C" fn register_instance_binding(functions: sys::godot_instance_binding_functions) -> i32 {
    // Exercise the table once, as the engine does for each object that gets a binding.
    let alloc = functions.alloc_instance_binding_data.expect("alloc set");
    let free = functions.free_instance_binding_data.expect("free set");
    let mut object = 0u64;
    unsafe {
        let binding = alloc(functions.data, ptr::null(), &mut object as *mut u64 as *mut sys::godot_object);
        free(functions.data, binding);
    }

    record("bind".to_string());
    LANGUAGE_INDEX
}

unsafe extern "C" fn unregister_instance_binding(index: i32) {
    record(format!("unbind:{index}"));
}

unsafe extern "C" fn profiling_add_data(signature: *const std::ffi::c_char, _time: u64) {
    record(format!("profile:{}", unsafe { string(signature) }));
}
