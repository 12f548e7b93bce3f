/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Discovery of the host's versioned API structs.
//!
//! The host passes one pointer, the core API struct. Newer core revisions hang off its `next` chain, and each GDNative
//! extension (NativeScript, PluginScript, ...) is listed in its `extensions` array, again with newer revisions chained
//! through `next`. [`ApiTable`] walks this graph once and keeps typed pointers to every struct it recognizes.

use std::fmt;
use std::ptr::NonNull;

use crate as sys;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Versions and kinds

/// Version of one GDNative API struct, compared lexicographically.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn from_sys(version: sys::godot_gdnative_api_version) -> Self {
        Self::new(version.major, version.minor)
    }

    pub fn to_sys(self) -> sys::godot_gdnative_api_version {
        sys::godot_gdnative_api_version {
            major: self.major,
            minor: self.minor,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Family of an API struct, as stored in its `type` field.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApiKind {
    Core,
    NativeScript,
    PluginScript,
    Android,
    Arvr,
    VideoDecoder,
    Net,
}

impl ApiKind {
    #[doc(hidden)]
    pub fn from_sys(type_: sys::GDNATIVE_API_TYPES) -> Option<Self> {
        let kind = match type_ {
            sys::GDNATIVE_CORE => Self::Core,
            sys::GDNATIVE_EXT_NATIVESCRIPT => Self::NativeScript,
            sys::GDNATIVE_EXT_PLUGINSCRIPT => Self::PluginScript,
            sys::GDNATIVE_EXT_ANDROID => Self::Android,
            sys::GDNATIVE_EXT_ARVR => Self::Arvr,
            sys::GDNATIVE_EXT_VIDEODECODER => Self::VideoDecoder,
            sys::GDNATIVE_EXT_NET => Self::Net,
            _ => return None,
        };

        Some(kind)
    }

    #[doc(hidden)]
    pub fn to_sys(self) -> sys::GDNATIVE_API_TYPES {
        match self {
            Self::Core => sys::GDNATIVE_CORE,
            Self::NativeScript => sys::GDNATIVE_EXT_NATIVESCRIPT,
            Self::PluginScript => sys::GDNATIVE_EXT_PLUGINSCRIPT,
            Self::Android => sys::GDNATIVE_EXT_ANDROID,
            Self::Arvr => sys::GDNATIVE_EXT_ARVR,
            Self::VideoDecoder => sys::GDNATIVE_EXT_VIDEODECODER,
            Self::Net => sys::GDNATIVE_EXT_NET,
        }
    }

    /// Name used in host-facing reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::NativeScript => "nativescript",
            Self::PluginScript => "pluginscript",
            Self::Android => "android",
            Self::Arvr => "arvr",
            Self::VideoDecoder => "videodecoder",
            Self::Net => "net",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Requirements

/// Minimum API versions an extension needs from the host.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApiRequirements {
    entries: Vec<(ApiKind, ApiVersion)>,
}

impl ApiRequirements {
    /// No requirements at all, not even core.
    pub fn none() -> Self {
        Self { entries: vec![] }
    }

    /// Adds (or tightens) the minimum version for `kind`.
    pub fn require(mut self, kind: ApiKind, min: ApiVersion) -> Self {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, existing)) => *existing = (*existing).max(min),
            None => self.entries.push((kind, min)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (ApiKind, ApiVersion)> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for ApiRequirements {
    /// Core 1.0, which every GDNative host provides.
    fn default() -> Self {
        Self::none().require(ApiKind::Core, ApiVersion::new(1, 0))
    }
}

/// Host does not provide an API the extension asked for.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum ApiError {
    #[error("host does not provide the `{api}` API")]
    Missing { api: ApiKind },

    #[error("host provides `{api}` API {have}, but {want} is required")]
    VersionMismatch {
        api: ApiKind,
        want: ApiVersion,
        have: ApiVersion,
    },
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Table

type Header = sys::godot_gdnative_api_struct;

/// Typed view of all API structs the host handed over in `gdnative_init`.
///
/// All pointers are owned by the host and valid between `gdnative_init` and `gdnative_terminate`. The table itself is
/// `Copy`; copies must not be used outside that window either.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ApiTable {
    core: NonNull<sys::godot_gdnative_core_api_struct>,
    core_1_1: Option<NonNull<Header>>,
    core_1_2: Option<NonNull<Header>>,
    nativescript: Option<NonNull<sys::godot_gdnative_ext_nativescript_api_struct>>,
    nativescript_1_1: Option<NonNull<sys::godot_gdnative_ext_nativescript_1_1_api_struct>>,
    pluginscript: Option<NonNull<Header>>,
    android: Option<NonNull<Header>>,
    arvr: Option<NonNull<Header>>,
    videodecoder: Option<NonNull<Header>>,
    net: Option<NonNull<Header>>,
    net_3_2: Option<NonNull<Header>>,
}

impl ApiTable {
    /// Walks the API struct graph rooted at `core`. Returns `None` if `core` is null.
    ///
    /// # Safety
    /// `core` must be null or point to a valid core API struct, whose `next` chains and `extensions` array (of
    /// `num_extensions` entries) consist of valid API struct headers. Null entries are skipped.
    pub unsafe fn discover(core: *const sys::godot_gdnative_core_api_struct) -> Option<Self> {
        let core = NonNull::new(sys::force_mut_ptr(core))?;

        let mut table = Self {
            core,
            core_1_1: None,
            core_1_2: None,
            nativescript: None,
            nativescript_1_1: None,
            pluginscript: None,
            android: None,
            arvr: None,
            videodecoder: None,
            net: None,
            net_3_2: None,
        };

        // SAFETY: `core` is valid per precondition.
        let core_ref = unsafe { core.as_ref() };

        // SAFETY: chains consist of valid headers per precondition.
        unsafe {
            table.core_1_1 = find_in_chain(core_ref.next, ApiVersion::new(1, 1));
            table.core_1_2 = find_in_chain(core_ref.next, ApiVersion::new(1, 2));
        }

        let extensions: &[*const Header] = if core_ref.extensions.is_null() || core_ref.num_extensions == 0 {
            &[]
        } else {
            // SAFETY: `extensions` points to `num_extensions` header pointers per precondition.
            unsafe { std::slice::from_raw_parts(core_ref.extensions, core_ref.num_extensions as usize) }
        };

        for &ext in extensions {
            let Some(header) = NonNull::new(sys::force_mut_ptr(ext)) else {
                continue;
            };

            // SAFETY: non-null entries are valid headers per precondition.
            let header_ref = unsafe { header.as_ref() };

            match ApiKind::from_sys(header_ref.type_) {
                Some(ApiKind::NativeScript) => {
                    table.nativescript = Some(header.cast());
                    // SAFETY: see above.
                    table.nativescript_1_1 =
                        unsafe { find_in_chain(header_ref.next, ApiVersion::new(1, 1)) }.map(NonNull::cast);
                }
                Some(ApiKind::PluginScript) => table.pluginscript = Some(header),
                Some(ApiKind::Android) => table.android = Some(header),
                Some(ApiKind::Arvr) => table.arvr = Some(header),
                Some(ApiKind::VideoDecoder) => table.videodecoder = Some(header),
                Some(ApiKind::Net) => {
                    table.net = Some(header);
                    // SAFETY: see above.
                    table.net_3_2 = unsafe { find_in_chain(header_ref.next, ApiVersion::new(3, 2)) };
                }
                Some(ApiKind::Core) | None => {
                    crate::out!("ignoring GDNative extension struct of type {}", header_ref.type_);
                }
            }
        }

        Some(table)
    }

    /// The pointer the host passed as `api_struct`.
    pub fn core_ptr(&self) -> *const sys::godot_gdnative_core_api_struct {
        self.core.as_ptr()
    }

    pub fn core_1_1_ptr(&self) -> Option<*const Header> {
        self.core_1_1.map(|p| p.as_ptr() as *const _)
    }

    pub fn core_1_2_ptr(&self) -> Option<*const Header> {
        self.core_1_2.map(|p| p.as_ptr() as *const _)
    }

    pub fn pluginscript_ptr(&self) -> Option<*const Header> {
        self.pluginscript.map(|p| p.as_ptr() as *const _)
    }

    pub fn android_ptr(&self) -> Option<*const Header> {
        self.android.map(|p| p.as_ptr() as *const _)
    }

    pub fn arvr_ptr(&self) -> Option<*const Header> {
        self.arvr.map(|p| p.as_ptr() as *const _)
    }

    pub fn videodecoder_ptr(&self) -> Option<*const Header> {
        self.videodecoder.map(|p| p.as_ptr() as *const _)
    }

    pub fn net_ptr(&self) -> Option<*const Header> {
        self.net.map(|p| p.as_ptr() as *const _)
    }

    pub fn net_3_2_ptr(&self) -> Option<*const Header> {
        self.net_3_2.map(|p| p.as_ptr() as *const _)
    }

    /// Core 1.0 struct, with the engine's print functions.
    ///
    /// # Safety
    /// Must only be called inside the validity window of the table (see type docs).
    pub unsafe fn core(&self) -> &sys::godot_gdnative_core_api_struct {
        // SAFETY: valid per precondition.
        unsafe { self.core.as_ref() }
    }

    /// NativeScript 1.0 struct, with class registration functions.
    ///
    /// # Safety
    /// Must only be called inside the validity window of the table (see type docs).
    pub unsafe fn nativescript(&self) -> Option<&sys::godot_gdnative_ext_nativescript_api_struct> {
        // SAFETY: valid per precondition.
        self.nativescript.map(|p| unsafe { p.as_ref() })
    }

    /// NativeScript 1.1 struct, with instance binding and profiling functions.
    ///
    /// # Safety
    /// Must only be called inside the validity window of the table (see type docs).
    pub unsafe fn nativescript_1_1(&self) -> Option<&sys::godot_gdnative_ext_nativescript_1_1_api_struct> {
        // SAFETY: valid per precondition.
        self.nativescript_1_1.map(|p| unsafe { p.as_ref() })
    }

    /// Highest version of `kind` the host provides.
    ///
    /// # Safety
    /// Must only be called inside the validity window of the table (see type docs).
    pub unsafe fn highest_version(&self, kind: ApiKind) -> Option<ApiVersion> {
        let chain: [Option<NonNull<Header>>; 2] = match kind {
            ApiKind::Core => {
                let core = self.core.cast::<Header>();
                return [self.core_1_2, self.core_1_1, Some(core)]
                    .into_iter()
                    .flatten()
                    // SAFETY: valid per precondition.
                    .map(|p| unsafe { version_of(p) })
                    .max();
            }
            ApiKind::NativeScript => [self.nativescript.map(NonNull::cast), self.nativescript_1_1.map(NonNull::cast)],
            ApiKind::PluginScript => [self.pluginscript, None],
            ApiKind::Android => [self.android, None],
            ApiKind::Arvr => [self.arvr, None],
            ApiKind::VideoDecoder => [self.videodecoder, None],
            ApiKind::Net => [self.net, self.net_3_2],
        };

        chain
            .into_iter()
            .flatten()
            // SAFETY: valid per precondition.
            .map(|p| unsafe { version_of(p) })
            .max()
    }

    /// Checks every requirement, returning the first one the host cannot satisfy.
    ///
    /// # Safety
    /// Must only be called inside the validity window of the table (see type docs).
    pub unsafe fn check(&self, requirements: &ApiRequirements) -> Result<(), ApiError> {
        for (api, want) in requirements.iter() {
            // SAFETY: forwarded precondition.
            match unsafe { self.highest_version(api) } {
                None => return Err(ApiError::Missing { api }),
                Some(have) if have < want => return Err(ApiError::VersionMismatch { api, want, have }),
                Some(_) => {}
            }
        }

        Ok(())
    }
}

// SAFETY: the table only holds pointers to host-owned, read-only structs. It never writes through them, and the host
// guarantees they stay valid for the whole init/terminate window, regardless of the thread reading them.
unsafe impl Send for ApiTable {}
// SAFETY: see above.
unsafe impl Sync for ApiTable {}

/// Follows `next` pointers starting at `head`, returning the first struct with exactly `version`.
///
/// # Safety
/// Every pointer in the chain must be null or a valid header.
unsafe fn find_in_chain(head: *const Header, version: ApiVersion) -> Option<NonNull<Header>> {
    let mut cursor = head;
    while let Some(current) = NonNull::new(sys::force_mut_ptr(cursor)) {
        // SAFETY: valid per precondition.
        let header = unsafe { current.as_ref() };
        if ApiVersion::from_sys(header.version) == version {
            return Some(current);
        }
        cursor = header.next;
    }

    None
}

/// # Safety
/// `header` must be valid.
unsafe fn version_of(header: NonNull<Header>) -> ApiVersion {
    // SAFETY: valid per precondition.
    ApiVersion::from_sys(unsafe { header.as_ref() }.version)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn header(type_: sys::GDNATIVE_API_TYPES, major: u32, minor: u32, next: *const Header) -> Header {
        Header {
            type_,
            version: ApiVersion::new(major, minor).to_sys(),
            next,
        }
    }

    fn core_struct(next: *const Header, extensions: &[*const Header]) -> sys::godot_gdnative_core_api_struct {
        // SAFETY: all-zero is valid for the struct: null pointers and `None` function slots.
        let mut core: sys::godot_gdnative_core_api_struct = unsafe { std::mem::zeroed() };
        core.type_ = sys::GDNATIVE_CORE;
        core.version = ApiVersion::new(1, 0).to_sys();
        core.next = next;
        core.num_extensions = extensions.len() as u32;
        core.extensions = extensions.as_ptr();
        core
    }

    #[test]
    fn null_core_is_rejected() {
        assert!(unsafe { ApiTable::discover(ptr::null()) }.is_none());
    }

    #[test]
    fn core_chain_is_followed() {
        let core_1_2 = header(sys::GDNATIVE_CORE, 1, 2, ptr::null());
        let core_1_1 = header(sys::GDNATIVE_CORE, 1, 1, &core_1_2);
        let core = core_struct(&core_1_1, &[]);

        let table = unsafe { ApiTable::discover(&core) }.expect("non-null core");

        assert_eq!(table.core_ptr(), &core as *const _);
        assert!(unsafe { table.core() }.godot_print.is_none());
        assert_eq!(table.core_1_1_ptr(), Some(&core_1_1 as *const _));
        assert_eq!(table.core_1_2_ptr(), Some(&core_1_2 as *const _));
        assert_eq!(table.net_ptr(), None);
        assert_eq!(unsafe { table.highest_version(ApiKind::Core) }, Some(ApiVersion::new(1, 2)));
        assert_eq!(unsafe { table.highest_version(ApiKind::NativeScript) }, None);
    }

    #[test]
    fn extensions_are_sorted_by_type() {
        let net_3_2 = header(sys::GDNATIVE_EXT_NET, 3, 2, ptr::null());
        let net = header(sys::GDNATIVE_EXT_NET, 3, 1, &net_3_2);
        let arvr = header(sys::GDNATIVE_EXT_ARVR, 1, 1, ptr::null());
        let android = header(sys::GDNATIVE_EXT_ANDROID, 1, 0, ptr::null());
        let unknown = header(42, 1, 0, ptr::null());

        let extensions: [*const Header; 5] = [&net, ptr::null(), &arvr, &unknown, &android];
        let core = core_struct(ptr::null(), &extensions);

        let table = unsafe { ApiTable::discover(&core) }.expect("non-null core");

        assert_eq!(table.net_ptr(), Some(&net as *const _));
        assert_eq!(table.net_3_2_ptr(), Some(&net_3_2 as *const _));
        assert_eq!(table.arvr_ptr(), Some(&arvr as *const _));
        assert_eq!(table.android_ptr(), Some(&android as *const _));
        assert_eq!(table.pluginscript_ptr(), None);
        assert_eq!(table.videodecoder_ptr(), None);
        assert_eq!(table.core_1_1_ptr(), None);
        assert_eq!(unsafe { table.highest_version(ApiKind::Net) }, Some(ApiVersion::new(3, 2)));
    }

    #[test]
    fn requirements_report_missing_and_outdated() {
        let net = header(sys::GDNATIVE_EXT_NET, 3, 1, ptr::null());
        let extensions: [*const Header; 1] = [&net];
        let core = core_struct(ptr::null(), &extensions);
        let table = unsafe { ApiTable::discover(&core) }.expect("non-null core");

        assert_eq!(unsafe { table.check(&ApiRequirements::default()) }, Ok(()));

        let needs_script = ApiRequirements::default().require(ApiKind::NativeScript, ApiVersion::new(1, 1));
        assert_eq!(
            unsafe { table.check(&needs_script) },
            Err(ApiError::Missing {
                api: ApiKind::NativeScript
            })
        );

        let needs_net = ApiRequirements::none().require(ApiKind::Net, ApiVersion::new(3, 2));
        assert_eq!(
            unsafe { table.check(&needs_net) },
            Err(ApiError::VersionMismatch {
                api: ApiKind::Net,
                want: ApiVersion::new(3, 2),
                have: ApiVersion::new(3, 1),
            })
        );
    }

    #[test]
    fn require_keeps_the_stricter_version() {
        let reqs = ApiRequirements::none()
            .require(ApiKind::Core, ApiVersion::new(1, 2))
            .require(ApiKind::Core, ApiVersion::new(1, 1));

        assert_eq!(reqs.iter().collect::<Vec<_>>(), vec![(ApiKind::Core, ApiVersion::new(1, 2))]);
    }

    #[test]
    fn kinds_round_trip_through_sys() {
        for type_ in sys::GDNATIVE_CORE..=sys::GDNATIVE_EXT_NET {
            let kind = ApiKind::from_sys(type_).expect("known type");
            assert_eq!(kind.to_sys(), type_);
        }
        assert_eq!(ApiKind::from_sys(sys::GDNATIVE_EXT_NET + 1), None);
    }

    #[test]
    fn version_display() {
        assert_eq!(ApiVersion::new(1, 2).to_string(), "1.2");
        assert!(ApiVersion::new(1, 10) > ApiVersion::new(1, 2));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn version_serde() {
        let json = serde_json::to_string(&ApiVersion::new(3, 2)).unwrap();
        assert_eq!(json, r#"{"major":3,"minor":2}"#);

        let back: ApiVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ApiVersion::new(3, 2));
    }
}
