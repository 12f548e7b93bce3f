/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Class registration during `nativescript_init`.

mod binding;
mod class;

pub use binding::{instance_binding_functions, InstanceBinding};
pub use class::{ClassDescriptor, NativeClass, OwnerHandle};

use crate::error::RegistrationError;
use crate::host::{HostAccess, HostApi};
use crate::init::ExtensionConfig;
use crate::profiling::ProfilingScope;
use crate::sys::{LibraryHandle, RegistrationHandle};

/// State of the nativescript phase, alive between `nativescript_init` and `nativescript_terminate`.
#[derive(Debug)]
pub(crate) struct Registration {
    pub handle: RegistrationHandle,
    pub language_index: Option<i32>,
    pub classes: Vec<String>,
}

impl Registration {
    pub fn new(handle: RegistrationHandle) -> Self {
        Self {
            handle,
            language_index: None,
            classes: Vec::new(),
        }
    }
}

/// Passed to the registration hook; registers classes with the host under this extension's handle.
pub struct Registrar<'a> {
    host: &'a dyn HostApi,
    config: &'a ExtensionConfig,
    library: LibraryHandle,
    registration: &'a mut Registration,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(
        host: &'a dyn HostApi,
        config: &'a ExtensionConfig,
        library: LibraryHandle,
        registration: &'a mut Registration,
    ) -> Self {
        Self {
            host,
            config,
            library,
            registration,
        }
    }

    /// Registers `T` as a runtime class.
    pub fn register_class<T: NativeClass>(&mut self) -> Result<(), RegistrationError> {
        self.register(ClassDescriptor::of::<T>(false)?)
    }

    /// Registers `T` as a tool class, which also runs inside the editor.
    pub fn register_tool_class<T: NativeClass>(&mut self) -> Result<(), RegistrationError> {
        self.register(ClassDescriptor::of::<T>(true)?)
    }

    fn register(&mut self, class: ClassDescriptor) -> Result<(), RegistrationError> {
        self.host.register_class(self.registration.handle, &class)?;

        let name = class.name().to_string_lossy().into_owned();
        crate::out!("registered class `{name}`");
        self.registration.classes.push(name);

        Ok(())
    }

    pub fn handle(&self) -> RegistrationHandle {
        self.registration.handle
    }

    pub fn library(&self) -> LibraryHandle {
        self.library
    }

    /// Index returned by the host for this extension's instance binding functions, if NativeScript 1.1 is present.
    pub fn language_index(&self) -> Option<i32> {
        self.registration.language_index
    }

    /// Names of the classes registered so far, in registration order.
    pub fn registered_classes(&self) -> &[String] {
        &self.registration.classes
    }

    pub fn config(&self) -> &ExtensionConfig {
        self.config
    }

    /// Starts a profiling scope; see [`ProfilingScope`].
    pub fn profile(&self, signature: impl Into<String>) -> ProfilingScope<'a> {
        ProfilingScope::new(Some(self.host), self.config.profiling(), signature)
    }
}

impl HostAccess for Registrar<'_> {
    fn host_api(&self) -> Option<&dyn HostApi> {
        Some(self.host)
    }
}
