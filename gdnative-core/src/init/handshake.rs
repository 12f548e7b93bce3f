/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! State machine of one extension instance:
//!
//! ```text
//! Unloaded --gdnative_init--> ApiBound --nativescript_init--> Registered
//!    ^                          |  ^                              |
//!    +---gdnative_terminate-----+  +----nativescript_terminate----+
//! ```

use crate::error::HandshakeError;
use crate::global::{self, CallSite, FormatArg};
use crate::host::{HostAccess, HostApi};
use crate::init::ExtensionConfig;
use crate::profiling::ProfilingScope;
use crate::registry::{instance_binding_functions, Registrar, Registration};
use crate::sys::{LibraryHandle, RegistrationHandle};

/// Where an extension instance is in its lifecycle.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Phase {
    Unloaded,
    ApiBound,
    Registered,
}

/// What the host tells the extension in `gdnative_init`, besides the API structs.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct LoadInfo {
    pub library: LibraryHandle,
    pub in_editor: bool,
}

impl LoadInfo {
    pub fn new(library: LibraryHandle) -> Self {
        Self {
            library,
            in_editor: false,
        }
    }
}

/// Extension code run by the handshake at its transitions.
///
/// Every hook runs while the handles it can observe are valid: `on_gdnative_init` right after binding, `register` right
/// after the registration handle is stored, and the terminate hooks before the matching teardown.
#[allow(unused_variables)]
pub trait HandshakeHooks {
    fn on_gdnative_init(&mut self, ctx: &HookContext<'_>) {}

    fn register(&mut self, registrar: &mut Registrar<'_>) {}

    fn on_nativescript_terminate(&mut self, ctx: &HookContext<'_>) {}

    fn on_gdnative_terminate(&mut self, ctx: &HookContext<'_>) {}
}

/// No hooks.
impl HandshakeHooks for () {}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Context passed to hooks

/// View of a bound extension, handed to hooks.
pub struct HookContext<'a> {
    host: &'a dyn HostApi,
    config: &'a ExtensionConfig,
    library: LibraryHandle,
    in_editor: bool,
    registration: Option<&'a Registration>,
}

impl<'a> HookContext<'a> {
    fn new<H: HostApi>(bound: &'a Bound<H>, config: &'a ExtensionConfig) -> Self {
        Self {
            host: &bound.host,
            config,
            library: bound.library,
            in_editor: bound.in_editor,
            registration: bound.registration.as_ref(),
        }
    }

    pub fn library(&self) -> LibraryHandle {
        self.library
    }

    pub fn in_editor(&self) -> bool {
        self.in_editor
    }

    pub fn registration_handle(&self) -> Option<RegistrationHandle> {
        self.registration.map(|r| r.handle)
    }

    pub fn language_index(&self) -> Option<i32> {
        self.registration.and_then(|r| r.language_index)
    }

    pub fn registered_classes(&self) -> &[String] {
        match self.registration {
            Some(registration) => &registration.classes,
            None => &[],
        }
    }

    pub fn config(&self) -> &ExtensionConfig {
        self.config
    }

    pub fn print(&self, message: &str) {
        self.host.print(message);
    }

    pub fn print_fmt(&self, fmt: &str, args: &[FormatArg]) {
        global::print_fmt(Some(self.host), fmt, args);
    }

    pub fn profiling_add_data(&self, signature: &str, time_usec: u64) {
        self.host.profiling_add_data(signature, time_usec);
    }

    /// Starts a profiling scope; see [`ProfilingScope`].
    pub fn profile(&self, signature: impl Into<String>) -> ProfilingScope<'_> {
        ProfilingScope::new(Some(self.host), self.config.profiling(), signature)
    }
}

impl HostAccess for HookContext<'_> {
    fn host_api(&self) -> Option<&dyn HostApi> {
        Some(self.host)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Handshake

struct Bound<H> {
    host: H,
    library: LibraryHandle,
    in_editor: bool,
    registration: Option<Registration>,
}

/// Registration handshake of one extension instance with its host.
///
/// Owns everything the host hands over (API access, library and registration handles, the language index) for exactly
/// the window in which it is valid. Each transition has a checked `try_*` form; the plain form treats a wrong phase as a
/// host contract violation, which panics in debug builds and is reported and ignored in release builds.
pub struct Handshake<H> {
    config: ExtensionConfig,
    bound: Option<Bound<H>>,
}

impl<H: HostApi> Handshake<H> {
    pub fn new(config: ExtensionConfig) -> Self {
        Self { config, bound: None }
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        match &self.bound {
            None => Phase::Unloaded,
            Some(Bound {
                registration: None, ..
            }) => Phase::ApiBound,
            Some(Bound {
                registration: Some(_),
                ..
            }) => Phase::Registered,
        }
    }

    /// The bound host, between `gdnative_init` and `gdnative_terminate`.
    pub fn host(&self) -> Option<&H> {
        self.bound.as_ref().map(|b| &b.host)
    }

    pub fn library(&self) -> Option<LibraryHandle> {
        self.bound.as_ref().map(|b| b.library)
    }

    pub fn in_editor(&self) -> bool {
        self.bound.as_ref().is_some_and(|b| b.in_editor)
    }

    pub fn registration_handle(&self) -> Option<RegistrationHandle> {
        self.registration().map(|r| r.handle)
    }

    pub fn language_index(&self) -> Option<i32> {
        self.registration().and_then(|r| r.language_index)
    }

    pub fn registered_classes(&self) -> &[String] {
        match self.registration() {
            Some(registration) => &registration.classes,
            None => &[],
        }
    }

    /// Context as passed to hooks, if the API is bound.
    pub fn context(&self) -> Option<HookContext<'_>> {
        self.bound.as_ref().map(|b| HookContext::new(b, &self.config))
    }

    fn registration(&self) -> Option<&Registration> {
        self.bound.as_ref().and_then(|b| b.registration.as_ref())
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Transitions

    /// Binds the host API and library handle, then runs the post-init hook.
    pub fn try_gdnative_init(
        &mut self,
        host: H,
        info: LoadInfo,
        hooks: &mut impl HandshakeHooks,
    ) -> Result<(), HandshakeError> {
        if self.bound.is_some() {
            return Err(HandshakeError::AlreadyBound);
        }

        let bound = self.bound.insert(Bound {
            host,
            library: info.library,
            in_editor: info.in_editor,
            registration: None,
        });
        crate::out!("{}: API bound (in_editor={})", self.config.name(), info.in_editor);

        hooks.on_gdnative_init(&HookContext::new(bound, &self.config));
        Ok(())
    }

    #[track_caller]
    pub fn gdnative_init(&mut self, host: H, info: LoadInfo, hooks: &mut impl HandshakeHooks) {
        if let Err(err) = self.try_gdnative_init(host, info, hooks) {
            self.contract_violation(err);
        }
    }

    /// Stores the registration handle, registers instance binding functions if the host supports them, then runs the
    /// registration hook exactly once.
    pub fn try_nativescript_init(
        &mut self,
        handle: RegistrationHandle,
        hooks: &mut impl HandshakeHooks,
    ) -> Result<(), HandshakeError> {
        let Some(bound) = self.bound.as_mut() else {
            return Err(HandshakeError::NotBound);
        };
        if bound.registration.is_some() {
            return Err(HandshakeError::AlreadyRegistered);
        }

        let registration = bound.registration.insert(Registration::new(handle));
        registration.language_index = bound.host.register_instance_binding(instance_binding_functions());
        crate::out!(
            "{}: registration handle stored, language index {:?}",
            self.config.name(),
            registration.language_index
        );

        let mut registrar = Registrar::new(&bound.host, &self.config, bound.library, registration);
        hooks.register(&mut registrar);
        Ok(())
    }

    #[track_caller]
    pub fn nativescript_init(&mut self, handle: RegistrationHandle, hooks: &mut impl HandshakeHooks) {
        if let Err(err) = self.try_nativescript_init(handle, hooks) {
            self.contract_violation(err);
        }
    }

    /// Runs the terminate hook, unregisters the instance binding functions and forgets the registration handle.
    pub fn try_nativescript_terminate(
        &mut self,
        handle: RegistrationHandle,
        hooks: &mut impl HandshakeHooks,
    ) -> Result<(), HandshakeError> {
        let Some(bound) = self.bound.as_mut() else {
            return Err(HandshakeError::NotBound);
        };
        let Some(registration) = &bound.registration else {
            return Err(HandshakeError::NotRegistered);
        };

        if registration.handle != handle {
            crate::out!(
                "{}: nativescript_terminate with handle {:?}, registered with {:?}",
                self.config.name(),
                handle,
                registration.handle
            );
        }

        unregister(bound, &self.config, hooks);
        Ok(())
    }

    #[track_caller]
    pub fn nativescript_terminate(&mut self, handle: RegistrationHandle, hooks: &mut impl HandshakeHooks) {
        if let Err(err) = self.try_nativescript_terminate(handle, hooks) {
            self.contract_violation(err);
        }
    }

    /// Runs the terminate hook and releases the host API and library handle.
    ///
    /// A registration the host did not terminate explicitly is torn down first, including its hook.
    pub fn try_gdnative_terminate(&mut self, hooks: &mut impl HandshakeHooks) -> Result<(), HandshakeError> {
        let Some(bound) = self.bound.as_mut() else {
            return Err(HandshakeError::NotBound);
        };

        if bound.registration.is_some() {
            crate::out!("{}: gdnative_terminate while still registered", self.config.name());
            unregister(bound, &self.config, hooks);
        }

        hooks.on_gdnative_terminate(&HookContext::new(bound, &self.config));

        self.bound = None;
        crate::out!("{}: API released", self.config.name());
        Ok(())
    }

    #[track_caller]
    pub fn gdnative_terminate(&mut self, hooks: &mut impl HandshakeHooks) {
        if let Err(err) = self.try_gdnative_terminate(hooks) {
            self.contract_violation(err);
        }
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Host services

    /// Prints through the host, or to stderr while unbound.
    pub fn print(&self, message: &str) {
        global::print(self.host_api(), message);
    }

    /// Interpolates `fmt` like the engine's `String.format()` and prints the result.
    pub fn print_fmt(&self, fmt: &str, args: &[FormatArg]) {
        global::print_fmt(self.host_api(), fmt, args);
    }

    pub fn print_warning(&self, message: &str, site: &CallSite<'_>) {
        global::print_warning(self.host_api(), message, site);
    }

    pub fn print_error(&self, message: &str, site: &CallSite<'_>) {
        global::print_error(self.host_api(), message, site);
    }

    /// Adds one timing sample to the host's profiler.
    pub fn try_profiling_add_data(&self, signature: &str, time_usec: u64) -> Result<(), HandshakeError> {
        let host = self.host().ok_or(HandshakeError::NotBound)?;
        host.profiling_add_data(signature, time_usec);
        Ok(())
    }

    #[track_caller]
    pub fn profiling_add_data(&self, signature: &str, time_usec: u64) {
        if let Err(err) = self.try_profiling_add_data(signature, time_usec) {
            self.contract_violation(err);
        }
    }

    /// Starts a profiling scope; records nothing while unbound or with profiling disabled.
    pub fn profile(&self, signature: impl Into<String>) -> ProfilingScope<'_> {
        ProfilingScope::new(self.host_api(), self.config.profiling(), signature)
    }

    #[track_caller]
    fn contract_violation(&self, err: HandshakeError) {
        contract_violation(self.host_api(), err);
    }
}

impl<H: HostApi> HostAccess for Handshake<H> {
    fn host_api(&self) -> Option<&dyn HostApi> {
        self.bound.as_ref().map(|b| &b.host as &dyn HostApi)
    }
}

fn unregister<H: HostApi>(bound: &mut Bound<H>, config: &ExtensionConfig, hooks: &mut impl HandshakeHooks) {
    hooks.on_nativescript_terminate(&HookContext::new(bound, config));

    if let Some(registration) = bound.registration.take() {
        if let Some(index) = registration.language_index {
            bound.host.unregister_instance_binding(index);
        }
        crate::out!("{}: unregistered {} classes", config.name(), registration.classes.len());
    }
}

/// A host call arrived in a phase where it is not allowed.
///
/// Panics in debug builds; in release builds, the call is reported through `host` (or stderr) and otherwise ignored.
#[track_caller]
pub(crate) fn contract_violation(host: Option<&dyn HostApi>, err: HandshakeError) {
    if cfg!(debug_assertions) {
        panic!("GDNative contract violation: {err}");
    }

    let location = std::panic::Location::caller();
    let site = CallSite {
        function: "contract_violation",
        file: location.file(),
        line: location.line(),
    };
    global::print_error(host, &format!("ignoring call: {err}"), &site);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::ffi::c_void;
    use std::rc::Rc;

    use super::*;
    use crate::error::RegistrationError;
    use crate::registry::{ClassDescriptor, NativeClass, OwnerHandle};
    use crate::sys;

    type Log = Rc<RefCell<Vec<String>>>;

    #[derive(Clone, Default)]
    struct MockHost {
        log: Log,
        nativescript_1_1: bool,
    }

    impl HostApi for MockHost {
        fn print(&self, message: &str) {
            self.log.borrow_mut().push(format!("print:{message}"));
        }

        fn print_warning(&self, message: &str, _site: &CallSite<'_>) {
            self.log.borrow_mut().push(format!("warning:{message}"));
        }

        fn print_error(&self, message: &str, _site: &CallSite<'_>) {
            self.log.borrow_mut().push(format!("error:{message}"));
        }

        fn profiling_add_data(&self, signature: &str, time_usec: u64) {
            self.log.borrow_mut().push(format!("profile:{signature}:{time_usec}"));
        }

        fn register_class(&self, _handle: RegistrationHandle, class: &ClassDescriptor) -> Result<(), RegistrationError> {
            self.log
                .borrow_mut()
                .push(format!("class:{}", class.name().to_string_lossy()));
            Ok(())
        }

        fn register_instance_binding(&self, _functions: sys::godot_instance_binding_functions) -> Option<i32> {
            self.nativescript_1_1.then(|| {
                self.log.borrow_mut().push("bind".to_string());
                3
            })
        }

        fn unregister_instance_binding(&self, language_index: i32) {
            self.log.borrow_mut().push(format!("unbind:{language_index}"));
        }
    }

    struct Node2D;

    impl NativeClass for Node2D {
        fn class_name() -> &'static str {
            "Node2D"
        }

        fn init(_owner: OwnerHandle) -> Self {
            Self
        }
    }

    /// Records what each hook observes.
    #[derive(Default)]
    struct Observer {
        seen: Vec<String>,
    }

    impl HandshakeHooks for Observer {
        fn on_gdnative_init(&mut self, ctx: &HookContext<'_>) {
            self.seen
                .push(format!("init lib={:?} reg={:?}", ctx.library(), ctx.registration_handle()));
        }

        fn register(&mut self, registrar: &mut Registrar<'_>) {
            self.seen.push(format!(
                "register handle={:?} index={:?}",
                registrar.handle(),
                registrar.language_index()
            ));
            registrar.register_class::<Node2D>().expect("mock accepts classes");
        }

        fn on_nativescript_terminate(&mut self, ctx: &HookContext<'_>) {
            self.seen.push(format!("ns_terminate classes={:?}", ctx.registered_classes()));
        }

        fn on_gdnative_terminate(&mut self, ctx: &HookContext<'_>) {
            self.seen.push(format!("terminate reg={:?}", ctx.registration_handle()));
        }
    }

    fn token(value: &mut u64) -> *mut c_void {
        value as *mut u64 as *mut c_void
    }

    #[test]
    fn full_lifecycle() {
        let (mut lib_token, mut reg_token) = (1u64, 2u64);
        let library = LibraryHandle::from_sys(token(&mut lib_token)).unwrap();
        let handle = RegistrationHandle::from_sys(token(&mut reg_token)).unwrap();

        let host = MockHost {
            nativescript_1_1: true,
            ..MockHost::default()
        };
        let log = host.log.clone();
        let mut hooks = Observer::default();
        let mut handshake = Handshake::new(ExtensionConfig::new("test_"));
        assert_eq!(handshake.phase(), Phase::Unloaded);

        handshake.gdnative_init(host, LoadInfo::new(library), &mut hooks);
        assert_eq!(handshake.phase(), Phase::ApiBound);
        assert_eq!(handshake.library(), Some(library));
        assert_eq!(handshake.language_index(), None);

        handshake.nativescript_init(handle, &mut hooks);
        assert_eq!(handshake.phase(), Phase::Registered);
        assert_eq!(handshake.registration_handle(), Some(handle));
        assert_eq!(handshake.language_index(), Some(3));
        assert_eq!(handshake.registered_classes(), ["Node2D"]);

        handshake.nativescript_terminate(handle, &mut hooks);
        assert_eq!(handshake.phase(), Phase::ApiBound);
        assert_eq!(handshake.registration_handle(), None);
        assert!(handshake.registered_classes().is_empty());

        handshake.gdnative_terminate(&mut hooks);
        assert_eq!(handshake.phase(), Phase::Unloaded);
        assert!(handshake.host().is_none());
        assert_eq!(handshake.library(), None);

        assert_eq!(
            hooks.seen,
            [
                format!("init lib={library:?} reg=None"),
                format!("register handle={handle:?} index=Some(3)"),
                "ns_terminate classes=[\"Node2D\"]".to_string(),
                "terminate reg=None".to_string(),
            ]
        );
        assert_eq!(*log.borrow(), ["bind", "class:Node2D", "unbind:3"]);
    }

    #[test]
    fn without_nativescript_1_1_no_language_index() {
        let (mut lib_token, mut reg_token) = (1u64, 2u64);
        let library = LibraryHandle::from_sys(token(&mut lib_token)).unwrap();
        let handle = RegistrationHandle::from_sys(token(&mut reg_token)).unwrap();

        let host = MockHost::default();
        let log = host.log.clone();
        let mut handshake = Handshake::new(ExtensionConfig::default());

        handshake.try_gdnative_init(host, LoadInfo::new(library), &mut ()).unwrap();
        handshake.try_nativescript_init(handle, &mut ()).unwrap();
        assert_eq!(handshake.language_index(), None);

        handshake.try_nativescript_terminate(handle, &mut ()).unwrap();
        assert!(log.borrow().is_empty(), "{:?}", log.borrow());
    }

    #[test]
    fn checked_transitions_report_wrong_phase() {
        let (mut lib_token, mut reg_token) = (1u64, 2u64);
        let library = LibraryHandle::from_sys(token(&mut lib_token)).unwrap();
        let handle = RegistrationHandle::from_sys(token(&mut reg_token)).unwrap();
        let mut handshake = Handshake::new(ExtensionConfig::default());

        assert_eq!(handshake.try_nativescript_init(handle, &mut ()), Err(HandshakeError::NotBound));
        assert_eq!(handshake.try_gdnative_terminate(&mut ()), Err(HandshakeError::NotBound));
        assert_eq!(handshake.try_profiling_add_data("x", 1), Err(HandshakeError::NotBound));

        handshake
            .try_gdnative_init(MockHost::default(), LoadInfo::new(library), &mut ())
            .unwrap();
        assert_eq!(
            handshake.try_gdnative_init(MockHost::default(), LoadInfo::new(library), &mut ()),
            Err(HandshakeError::AlreadyBound)
        );
        assert_eq!(
            handshake.try_nativescript_terminate(handle, &mut ()),
            Err(HandshakeError::NotRegistered)
        );

        handshake.try_nativescript_init(handle, &mut ()).unwrap();
        assert_eq!(
            handshake.try_nativescript_init(handle, &mut ()),
            Err(HandshakeError::AlreadyRegistered)
        );
        assert_eq!(handshake.phase(), Phase::Registered);
    }

    #[test]
    fn gdnative_terminate_tears_down_pending_registration() {
        let (mut lib_token, mut reg_token) = (1u64, 2u64);
        let library = LibraryHandle::from_sys(token(&mut lib_token)).unwrap();
        let handle = RegistrationHandle::from_sys(token(&mut reg_token)).unwrap();

        let host = MockHost {
            nativescript_1_1: true,
            ..MockHost::default()
        };
        let log = host.log.clone();
        let mut hooks = Observer::default();
        let mut handshake = Handshake::new(ExtensionConfig::default());

        handshake.gdnative_init(host, LoadInfo::new(library), &mut hooks);
        handshake.nativescript_init(handle, &mut hooks);
        handshake.gdnative_terminate(&mut hooks);

        assert_eq!(handshake.phase(), Phase::Unloaded);
        assert_eq!(hooks.seen.len(), 4);
        assert!(hooks.seen[2].starts_with("ns_terminate"));
        assert_eq!(log.borrow().last().map(String::as_str), Some("unbind:3"));
    }

    #[test]
    fn printing_before_init_uses_no_host() {
        let handshake: Handshake<MockHost> = Handshake::new(ExtensionConfig::default());

        assert!(handshake.host_api().is_none());
        handshake.print("early");
        handshake.print_fmt("{0}", &["early".into()]);
        drop(handshake.profile("nothing"));
    }

    #[test]
    fn print_and_profile_reach_bound_host() {
        let mut lib_token = 1u64;
        let library = LibraryHandle::from_sys(token(&mut lib_token)).unwrap();
        let host = MockHost::default();
        let log = host.log.clone();

        let mut handshake = Handshake::new(ExtensionConfig::default());
        handshake.gdnative_init(host, LoadInfo::new(library), &mut ());

        handshake.print_fmt("{0}-{1}", &["x".into(), "y".into()]);
        handshake.print("x-y");
        crate::gdn_warn!(handshake, "low {}", "memory");
        handshake.profiling_add_data("sig", 42);

        assert_eq!(
            *log.borrow(),
            ["print:x-y", "print:x-y", "warning:low memory", "profile:sig:42"]
        );
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "GDNative contract violation")]
    fn unchecked_transition_panics_in_debug() {
        let mut reg_token = 2u64;
        let handle = RegistrationHandle::from_sys(token(&mut reg_token)).unwrap();
        let mut handshake: Handshake<MockHost> = Handshake::new(ExtensionConfig::default());

        handshake.nativescript_init(handle, &mut ());
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn unchecked_transition_is_ignored_in_release() {
        let mut reg_token = 2u64;
        let handle = RegistrationHandle::from_sys(token(&mut reg_token)).unwrap();
        let mut handshake: Handshake<MockHost> = Handshake::new(ExtensionConfig::default());

        handshake.nativescript_init(handle, &mut ());
        assert_eq!(handshake.phase(), Phase::Unloaded);
    }
}
