/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Printing and logging functionality.

use crate::global::format::{interpolate, FormatArg};
use crate::host::HostApi;

/// Location a warning or error is reported from.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CallSite<'a> {
    pub function: &'a str,
    pub file: &'a str,
    pub line: u32,
}

/// Prints `message` through the host, or to stderr if no host is bound.
pub fn print(host: Option<&dyn HostApi>, message: &str) {
    match host {
        Some(host) => host.print(message),
        None => eprintln!("[print] {message}"),
    }
}

/// Interpolates `fmt` like the engine's `String.format()`, then prints the result.
pub fn print_fmt(host: Option<&dyn HostApi>, fmt: &str, args: &[FormatArg]) {
    print(host, &interpolate(fmt, args));
}

/// Pushes a warning through the host, or to stderr if no host is bound.
pub fn print_warning(host: Option<&dyn HostApi>, message: &str, site: &CallSite<'_>) {
    match host {
        Some(host) => host.print_warning(message, site),
        None => eprintln!("[print_warning] {message}"),
    }
}

/// Pushes an error through the host, or to stderr if no host is bound.
pub fn print_error(host: Option<&dyn HostApi>, message: &str, site: &CallSite<'_>) {
    match host {
        Some(host) => host.print_error(message, site),
        None => eprintln!("[print_error] {message}"),
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros

// https://stackoverflow.com/a/40234666
#[macro_export]
#[doc(hidden)]
macro_rules! inner_function {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! inner_gdn_msg {
    ($print_fn:ident; $sink:expr, $fmt:literal $(, $args:expr)* $(,)?) => {{
        use $crate::host::HostAccess as _;

        let msg = format!($fmt $(, $args)*);
        let site = $crate::global::CallSite {
            function: $crate::inner_function!(),
            file: file!(),
            line: line!(),
        };
        $crate::global::$print_fn(($sink).host_api(), &msg, &site);
    }};
}

/// Prints to the host console.
///
/// The first argument is anything giving access to the host, usually the context passed to a hook:
/// ```ignore
/// gdn_print!(ctx, "loaded {} classes", count);
/// ```
#[macro_export]
macro_rules! gdn_print {
    ($sink:expr, $fmt:literal $(, $args:expr)* $(,)?) => {{
        use $crate::host::HostAccess as _;

        let msg = format!($fmt $(, $args)*);
        $crate::global::print(($sink).host_api(), &msg);
    }};
}

/// Pushes a warning to the host, with the calling function, file and line.
#[macro_export]
macro_rules! gdn_warn {
    ($sink:expr, $fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_gdn_msg!(print_warning; $sink, $fmt $(, $args)*)
    };
}

/// Pushes an error to the host, with the calling function, file and line.
#[macro_export]
macro_rules! gdn_error {
    ($sink:expr, $fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_gdn_msg!(print_error; $sink, $fmt $(, $args)*)
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Capture {
        lines: RefCell<Vec<String>>,
    }

    impl HostApi for Capture {
        fn print(&self, message: &str) {
            self.lines.borrow_mut().push(format!("print {message}"));
        }

        fn print_warning(&self, message: &str, site: &CallSite<'_>) {
            self.lines
                .borrow_mut()
                .push(format!("warning {message} @{}:{}", site.function, site.line));
        }

        fn print_error(&self, message: &str, site: &CallSite<'_>) {
            self.lines
                .borrow_mut()
                .push(format!("error {message} @{}", site.file));
        }
    }

    struct Sink<'a>(Option<&'a Capture>);

    impl crate::host::HostAccess for Sink<'_> {
        fn host_api(&self) -> Option<&dyn HostApi> {
            self.0.map(|c| c as &dyn HostApi)
        }
    }

    #[test]
    fn formatted_print_matches_interpolated_print() {
        let host = Capture::default();
        let args = [FormatArg::from("x"), FormatArg::from("y")];

        print_fmt(Some(&host), "{0}-{1}", &args);
        print(Some(&host), &interpolate("{0}-{1}", &args));

        let lines = host.lines.borrow();
        assert_eq!(*lines, ["print x-y", "print x-y"]);
    }

    #[test]
    fn macros_capture_call_site() {
        let host = Capture::default();
        let sink = Sink(Some(&host));

        crate::gdn_print!(sink, "{} + {}", 1, 2);
        crate::gdn_warn!(&sink, "careful");
        crate::gdn_error!(sink, "broken {}", "pipe");

        let lines = host.lines.borrow();
        assert_eq!(lines[0], "print 1 + 2");
        assert!(lines[1].starts_with("warning careful @"), "{}", lines[1]);
        assert!(lines[1].contains("macros_capture_call_site"), "{}", lines[1]);
        assert!(lines[2].starts_with("error broken pipe @"), "{}", lines[2]);
        assert!(lines[2].ends_with("print.rs"), "{}", lines[2]);
    }

    #[test]
    fn unbound_sink_falls_back_to_stderr() {
        // Nothing to observe except that no host is touched.
        let sink = Sink(None);
        crate::gdn_warn!(sink, "no host yet");
        crate::gdn_print!(sink, "still fine");
    }

    #[test]
    fn inner_function_names_enclosing_fn() {
        let name = crate::inner_function!();
        assert!(name.ends_with("inner_function_names_enclosing_fn"), "{name}");
    }
}
