/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Timing samples for the host's script profiler.

use std::time::{Duration, Instant};

use crate::host::HostApi;

/// Measures wall time from creation to drop, then adds one sample to the host's profiler.
///
/// Does nothing if profiling is disabled in the extension's config. Usually created through [`profile_scope!`], which
/// names the sample after the calling function.
///
/// [`profile_scope!`]: crate::profile_scope
#[must_use = "the sample is recorded when the scope is dropped"]
pub struct ProfilingScope<'a> {
    host: Option<&'a dyn HostApi>,
    signature: String,
    start: Instant,
}

impl<'a> ProfilingScope<'a> {
    /// Scope reporting to `host`. Without a host, or with `enabled == false`, nothing is recorded.
    pub fn new(host: Option<&'a dyn HostApi>, enabled: bool, signature: impl Into<String>) -> Self {
        Self {
            host: host.filter(|_| enabled),
            signature: signature.into(),
            start: Instant::now(),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn is_enabled(&self) -> bool {
        self.host.is_some()
    }
}

impl Drop for ProfilingScope<'_> {
    fn drop(&mut self) {
        if let Some(host) = self.host {
            host.profiling_add_data(&self.signature, duration_usec(self.start.elapsed()));
        }
    }
}

/// Signature in the `file::line::function` form the host's profiler groups samples by.
pub fn signature(file: &str, line: u32, function: &str) -> String {
    format!("{file}::{line}::{function}")
}

pub(crate) fn duration_usec(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Starts a [`ProfilingScope`] named after the calling function.
///
/// The argument is anything with a `profile()` method, usually the context passed to a hook:
/// ```ignore
/// let _scope = profile_scope!(ctx);
/// ```
#[macro_export]
macro_rules! profile_scope {
    ($ctx:expr) => {
        ($ctx).profile($crate::profiling::signature(
            file!(),
            line!(),
            $crate::inner_function!(),
        ))
    };
}
