/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;

use crate::error::HandshakeError;
use crate::host::{EngineHost, HostAccess};
use crate::private::{handle_panic, report_panic, ExtensionSlot};
use crate::registry::Registrar;
use crate::sys;
use crate::sys::{ApiError, ApiRequirements, ApiTable, LibraryHandle, RegistrationHandle};

mod config;
mod handshake;

pub use config::{ExtensionConfig, DEFAULT_PREFIX};
pub use handshake::{Handshake, HandshakeHooks, HookContext, LoadInfo, Phase};

pub(crate) use handshake::contract_violation;

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Defines the entry points of a GDNative Rust library.
///
/// Every library should have exactly one implementation of this trait per symbol prefix. It is always used in
/// combination with the [`#[gdnative]`][gdnative] proc-macro attribute, which exports `<prefix>gdnative_init`,
/// `<prefix>gdnative_terminate`, `<prefix>nativescript_init` and `<prefix>nativescript_terminate`.
///
/// ```ignore
/// struct MyExtension;
///
/// #[gdnative]
/// unsafe impl NativeExtension for MyExtension {
///     fn register(registrar: &mut Registrar) {
///         registrar.register_class::<Player>().expect("register Player");
///     }
/// }
/// ```
///
/// # Safety
/// The library cannot enforce any safety guarantees outside Rust code, which means that **you as a user** are
/// responsible to uphold them: namely that the host calls the entry points in the documented order and from one thread,
/// and that other native libraries loaded by the host do not corrupt its API structs.
///
/// [gdnative]: attr.gdnative.html
pub unsafe trait NativeExtension {
    /// Minimum API versions this extension needs (core 1.0 by default).
    ///
    /// Unmet requirements are reported to the host through its loading-error callbacks; the extension is still bound.
    fn api_requirements() -> ApiRequirements {
        ApiRequirements::default()
    }

    /// Whether profiling scopes record samples. Enabled in debug builds by default.
    fn profiling_enabled() -> bool {
        cfg!(debug_assertions)
    }

    /// Custom logic right after the API structs and library handle are bound.
    #[allow(unused_variables)]
    fn on_gdnative_init(ctx: &HookContext) {
        // Nothing by default.
    }

    /// Registers this extension's classes. Runs once per `nativescript_init`, after the registration handle is stored.
    #[allow(unused_variables)]
    fn register(registrar: &mut Registrar) {
        // Nothing by default.
    }

    /// Custom logic before the registration handle is released.
    #[allow(unused_variables)]
    fn on_nativescript_terminate(ctx: &HookContext) {
        // Nothing by default.
    }

    /// Custom logic before the API structs and library handle are released.
    #[allow(unused_variables)]
    fn on_gdnative_terminate(ctx: &HookContext) {
        // Nothing by default.
    }
}

/// Runs the static hooks of `E`.
pub struct ExtensionHooks<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E: NativeExtension> ExtensionHooks<E> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<E: NativeExtension> Default for ExtensionHooks<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: NativeExtension> HandshakeHooks for ExtensionHooks<E> {
    fn on_gdnative_init(&mut self, ctx: &HookContext<'_>) {
        E::on_gdnative_init(ctx);
    }

    fn register(&mut self, registrar: &mut Registrar<'_>) {
        E::register(registrar);
    }

    fn on_nativescript_terminate(&mut self, ctx: &HookContext<'_>) {
        E::on_nativescript_terminate(ctx);
    }

    fn on_gdnative_terminate(&mut self, ctx: &HookContext<'_>) {
        E::on_gdnative_terminate(ctx);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Entry glue, called by the symbols `#[gdnative]` exports

#[doc(hidden)]
pub unsafe fn __gdnative_init<E: NativeExtension>(slot: &ExtensionSlot, options: *mut sys::godot_gdnative_init_options) {
    let init_code = || {
        let Some(mut handshake) = slot.try_lock() else {
            return Err(HandshakeError::Reentrant {
                entry: "gdnative_init",
            });
        };

        // SAFETY: the host passes valid options or null.
        let Some(options) = (unsafe { options.as_ref() }) else {
            return Err(HandshakeError::NullPointer { what: "options" });
        };
        let library = LibraryHandle::from_sys(options.gd_native_library).ok_or(HandshakeError::NullPointer {
            what: "gd_native_library",
        })?;
        // SAFETY: `api_struct` is null or the root of the host's API structs, valid until `gdnative_terminate`.
        let table = unsafe { ApiTable::discover(options.api_struct) }.ok_or(HandshakeError::NullPointer {
            what: "api_struct",
        })?;

        // SAFETY: inside the validity window that just started.
        if let Err(err) = unsafe { table.check(handshake.config().requirements()) } {
            report_api_error(options, handshake.config().name(), &err);
        }

        let info = LoadInfo {
            library,
            in_editor: options.in_editor,
        };
        // SAFETY: the handshake drops the host in `gdnative_terminate`, which ends the validity window.
        let host = unsafe { EngineHost::new(table) };
        handshake.gdnative_init(host, info, &mut ExtensionHooks::<E>::new());
        Ok(())
    };

    run_entry(slot, "gdnative_init", init_code);
}

#[doc(hidden)]
pub unsafe fn __gdnative_terminate<E: NativeExtension>(
    slot: &ExtensionSlot,
    _options: *mut sys::godot_gdnative_terminate_options,
) {
    run_entry(slot, "gdnative_terminate", || {
        let mut handshake = slot.try_lock().ok_or(HandshakeError::Reentrant {
            entry: "gdnative_terminate",
        })?;

        handshake.gdnative_terminate(&mut ExtensionHooks::<E>::new());
        Ok(())
    });
}

#[doc(hidden)]
pub unsafe fn __nativescript_init<E: NativeExtension>(slot: &ExtensionSlot, handle: *mut c_void) {
    run_entry(slot, "nativescript_init", || {
        let mut handshake = slot.try_lock().ok_or(HandshakeError::Reentrant {
            entry: "nativescript_init",
        })?;
        let handle = RegistrationHandle::from_sys(handle).ok_or(HandshakeError::NullPointer { what: "handle" })?;

        handshake.nativescript_init(handle, &mut ExtensionHooks::<E>::new());
        Ok(())
    });
}

#[doc(hidden)]
pub unsafe fn __nativescript_terminate<E: NativeExtension>(slot: &ExtensionSlot, handle: *mut c_void) {
    run_entry(slot, "nativescript_terminate", || {
        let mut handshake = slot.try_lock().ok_or(HandshakeError::Reentrant {
            entry: "nativescript_terminate",
        })?;
        let handle = RegistrationHandle::from_sys(handle).ok_or(HandshakeError::NullPointer { what: "handle" })?;

        handshake.nativescript_terminate(handle, &mut ExtensionHooks::<E>::new());
        Ok(())
    });
}

/// Runs one entry point, so that neither a panic nor a contract violation unwinds into the host.
fn run_entry<F>(slot: &ExtensionSlot, entry: &'static str, code: F)
where
    F: FnOnce() -> Result<(), HandshakeError>,
{
    let ctx = || format!("error in `{entry}`");

    // Violations panic in debug builds, so they are raised inside the guarded closure.
    let outcome = handle_panic(
        ctx,
        AssertUnwindSafe(|| {
            if let Err(err) = code() {
                let guard = slot.try_lock();
                let host = guard.as_ref().and_then(|handshake| handshake.host_api());
                contract_violation(host, err);
            }
        }),
    );

    if let Err(msg) = outcome {
        let guard = slot.try_lock();
        report_panic(guard.as_ref().and_then(|handshake| handshake.host_api()), &msg);
    }
}

/// Forwards an unmet API requirement to the host's loading-error callbacks.
fn report_api_error(options: &sys::godot_gdnative_init_options, name: &str, err: &ApiError) {
    crate::out!("{name}: {err}");

    match *err {
        ApiError::VersionMismatch { api, want, have } => {
            if let Some(report) = options.report_version_mismatch {
                let library = sys::to_const_ptr(options.gd_native_library);
                let what = sys::to_c_string_lossy(api.name());
                // SAFETY: callback provided by the host, valid during `gdnative_init`; the string outlives the call.
                unsafe { report(library, what.as_ptr(), want.to_sys(), have.to_sys()) };
            }
        }
        ApiError::Missing { .. } => {
            if let Some(report) = options.report_loading_error {
                let library = sys::to_const_ptr(options.gd_native_library);
                let what: CString = sys::to_c_string_lossy(&format!("{name}: {err}"));
                // SAFETY: as above.
                unsafe { report(library, what.as_ptr()) };
            }
        }
    }
}
