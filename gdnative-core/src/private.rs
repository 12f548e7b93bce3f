/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub use crate::init::{__gdnative_init, __gdnative_terminate, __nativescript_init, __nativescript_terminate};
pub use sys::out;

use std::cell::RefCell;

use crate::global::{self, CallSite};
use crate::host::{EngineHost, HostApi};
use crate::init::Handshake;
use crate::sys;

/// Storage slot of one extension instance. `#[gdnative]` declares one `static` of this type per invocation.
pub type ExtensionSlot = sys::Global<Handshake<EngineHost>>;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Panic handling

#[derive(Debug)]
struct PanicLocation {
    line: u32,
    file: String,
}

thread_local! {
    static PANIC_LOCATION: RefCell<Option<PanicLocation>> = const { RefCell::new(None) };
}

pub fn extract_panic_message(err: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = err.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("(panic of type ID {:?})", err.type_id())
    }
}

fn format_panic_message(msg: String) -> String {
    // If the message contains newlines, print all of the lines after a line break, and indent them.
    let lbegin = "\n  ";
    let indented = msg.replace('\n', lbegin);

    if indented.len() != msg.len() {
        format!("[panic]{lbegin}{indented}")
    } else {
        format!("[panic]  {msg}")
    }
}

pub fn flush_stdout() {
    use std::io::Write;
    // Best effort; there is nowhere to report a failed flush to.
    let _ = std::io::stdout().flush();
}

/// Executes `code`. If a panic is thrown, it is caught and described.
///
/// Returns `Err(report)` if a panic occurred, with location, `error_context` and the panic message; `Ok(result)` with
/// the result of `code` otherwise. Callers decide where the report goes; see [`report_panic`].
pub fn handle_panic<E, F, R, S>(error_context: E, code: F) -> Result<R, String>
where
    E: FnOnce() -> S,
    F: FnOnce() -> R + std::panic::UnwindSafe,
    S: std::fmt::Display,
{
    // Back up previous hook, set new one. The hook runs on the panicking thread, so the location lands in that thread's
    // slot even if other threads swap hooks concurrently.
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|panic_info| {
        if let Some(location) = panic_info.location() {
            let _ = PANIC_LOCATION.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(PanicLocation {
                        file: location.file().to_string(),
                        line: location.line(),
                    });
                }
            });
        }
    }));

    // Run code that should panic, restore hook
    let panic = std::panic::catch_unwind(code);
    std::panic::set_hook(prev_hook);

    match panic {
        Ok(result) => Ok(result),
        Err(err) => {
            // Flush, to make sure previous Rust output has been printed before the report.
            flush_stdout();

            let location = PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
            let msg = format_panic_message(extract_panic_message(err));

            let report = match location {
                Some(location) => format!(
                    "Rust function panicked at {}:{}.\n  Context: {}\n{msg}",
                    location.file,
                    location.line,
                    error_context()
                ),
                None => format!("Rust function panicked.\n  Context: {}\n{msg}", error_context()),
            };

            Err(report)
        }
    }
}

/// Reports a caught panic through `host`, or to stderr without one.
pub fn report_panic(host: Option<&dyn HostApi>, report: &str) {
    let site = CallSite {
        function: "handle_panic",
        file: file!(),
        line: line!(),
    };
    global::print_error(host, report, &site);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
