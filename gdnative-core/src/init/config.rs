/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::init::NativeExtension;
use crate::sys::ApiRequirements;

/// Symbol prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "godot_";

/// Identity and settings of one extension instance.
///
/// The name is the prefix of the exported entry points (`<name>gdnative_init`, ...). Two extensions linked into the
/// same binary need different names.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtensionConfig {
    name: String,
    requirements: ApiRequirements,
    profiling: bool,
}

impl ExtensionConfig {
    /// Config with default requirements (core 1.0) and profiling enabled in debug builds.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: ApiRequirements::default(),
            profiling: cfg!(debug_assertions),
        }
    }

    /// Config as declared by the extension's [`NativeExtension`] implementation.
    pub fn of<E: NativeExtension>(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_requirements(E::api_requirements())
            .with_profiling(E::profiling_enabled())
    }

    pub fn with_requirements(mut self, requirements: ApiRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of an exported entry point, e.g. `entry_symbol("gdnative_init")`.
    pub fn entry_symbol(&self, entry: &str) -> String {
        format!("{}{entry}", self.name)
    }

    pub fn requirements(&self) -> &ApiRequirements {
        &self.requirements
    }

    /// Whether profiling scopes record samples.
    pub fn profiling(&self) -> bool {
        self.profiling
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
