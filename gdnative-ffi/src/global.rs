/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

/// Lazily initialized global, used as the per-extension storage slot behind the exported entry points.
///
/// Each `#[gdnative]` invocation declares its own `static` of this type, so two extensions linked into one binary never
/// share state. Features:
/// - A `const` constructor, allowing use in `static` variables without `Option`.
/// - Initialization function provided in constructor, not at each use site.
/// - Guards giving both `&T` and `&mut T`.
/// - Non-blocking [`try_lock()`](Self::try_lock) to detect re-entrant access from inside a hook.
///
/// A panic in user code while the guard is held does not render the slot unusable; the host can still deliver the
/// terminate calls.
pub struct Global<T> {
    value: Mutex<InitState<T>>,
}

impl<T> Global<T> {
    /// Create `Global<T>`, providing a lazy initialization function.
    ///
    /// The initialization function is only called once, when the global is first accessed.
    pub const fn new(init_fn: fn() -> T) -> Self {
        Self {
            value: Mutex::new(InitState::Pending(init_fn)),
        }
    }

    /// Returns a guard that gives shared or mutable access to the value.
    ///
    /// Blocks until the internal mutex is available. Calling this again on the same thread while a guard is alive
    /// deadlocks; use [`try_lock()`](Self::try_lock) where that can happen.
    pub fn lock(&self) -> GlobalGuard<'_, T> {
        let guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);

        GlobalGuard {
            guard: Self::ensure_init(guard),
        }
    }

    /// Like [`lock()`](Self::lock), but returns `None` instead of blocking if the value is currently in use.
    pub fn try_lock(&self) -> Option<GlobalGuard<'_, T>> {
        let guard = match self.value.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };

        Some(GlobalGuard {
            guard: Self::ensure_init(guard),
        })
    }

    fn ensure_init(mut guard: MutexGuard<'_, InitState<T>>) -> MutexGuard<'_, InitState<T>> {
        if let InitState::Pending(init_fn) = *guard {
            *guard = InitState::Initialized(init_fn());
        }

        guard
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Guards

/// Guard that temporarily gives access to a `Global<T>`'s inner value.
pub struct GlobalGuard<'a, T> {
    guard: MutexGuard<'a, InitState<T>>,
}

impl<T> Deref for GlobalGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.guard.unwrap_ref()
    }
}

impl<T> DerefMut for GlobalGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard.unwrap_mut()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Internals

enum InitState<T> {
    Initialized(T),
    Pending(fn() -> T),
}

impl<T> InitState<T> {
    fn unwrap_ref(&self) -> &T {
        match self {
            InitState::Initialized(t) => t,
            InitState::Pending(_) => unreachable!("guard obtained before initialization"),
        }
    }

    fn unwrap_mut(&mut self) -> &mut T {
        match self {
            InitState::Initialized(t) => t,
            InitState::Pending(_) => unreachable!("guard obtained before initialization"),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests
