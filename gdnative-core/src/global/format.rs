/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Placeholder interpolation with the semantics of the engine's `String.format()`.
//!
//! Arguments are applied one after another, each one rewriting the whole string:
//! - a positional argument at index `i` replaces every `{i}` (the template with `_` substituted by `i`);
//! - a named argument `(key, value)` replaces every `{key}`;
//! - if the template contains no `_`, a positional argument replaces only the first remaining occurrence of it.
//!
//! Values (and keys) wrapped in double quotes are unquoted first. Because replacement is sequential, text inserted by an
//! earlier argument can be matched by a later one, exactly as in the engine.

use std::fmt;

/// Template used by [`interpolate`].
pub const DEFAULT_PLACEHOLDER: &str = "{_}";

/// One argument of [`interpolate`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FormatArg {
    Positional(String),
    Named { key: String, value: String },
}

impl FormatArg {
    pub fn named(key: impl FormatValue, value: impl FormatValue) -> Self {
        Self::Named {
            key: key.format_value(),
            value: value.format_value(),
        }
    }
}

impl<T: FormatValue> From<T> for FormatArg {
    fn from(value: T) -> Self {
        Self::Positional(value.format_value())
    }
}

/// Conversion to the text an engine value would produce when converted to a string.
pub trait FormatValue {
    fn format_value(&self) -> String;
}

impl<T: FormatValue + ?Sized> FormatValue for &T {
    fn format_value(&self) -> String {
        (**self).format_value()
    }
}

impl FormatValue for str {
    fn format_value(&self) -> String {
        self.to_string()
    }
}

impl FormatValue for String {
    fn format_value(&self) -> String {
        self.clone()
    }
}

impl FormatValue for char {
    fn format_value(&self) -> String {
        self.to_string()
    }
}

impl FormatValue for bool {
    fn format_value(&self) -> String {
        // Engine spelling.
        let text = if *self { "True" } else { "False" };
        text.to_string()
    }
}

macro_rules! impl_format_value_display {
    ($($T:ty),* $(,)?) => {
        $(
            impl FormatValue for $T {
                fn format_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_format_value_display!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_format_value_float {
    ($($T:ty),* $(,)?) => {
        $(
            impl FormatValue for $T {
                fn format_value(&self) -> String {
                    if self.is_nan() {
                        "nan".to_string()
                    } else {
                        self.to_string()
                    }
                }
            }
        )*
    };
}

impl_format_value_float!(f32, f64);

/// Replaces placeholders in `fmt` with `args`, using the default `{_}` template.
///
/// `interpolate("{0}-{1}", &["x".into(), "y".into()])` yields `"x-y"`.
pub fn interpolate(fmt: &str, args: &[FormatArg]) -> String {
    interpolate_with(fmt, args, DEFAULT_PLACEHOLDER)
}

/// Like [`interpolate`], with a custom placeholder template such as `"$_"` or `"{}"`.
pub fn interpolate_with(fmt: &str, args: &[FormatArg], placeholder: &str) -> String {
    let mut result = fmt.to_string();
    let indexed_template = placeholder.contains('_');

    for (i, arg) in args.iter().enumerate() {
        result = match arg {
            FormatArg::Named { key, value } => {
                let pattern = placeholder.replace('_', unquote(key));
                replace_all(&result, &pattern, unquote(value))
            }
            FormatArg::Positional(value) if indexed_template => {
                let pattern = placeholder.replace('_', &i.to_string());
                replace_all(&result, &pattern, unquote(value))
            }
            FormatArg::Positional(value) => replace_first(&result, placeholder, unquote(value)),
        };
    }

    result
}

/// Strips one pair of surrounding double quotes.
///
/// A lone `"` counts as both the opening and the closing quote, and becomes empty.
fn unquote(s: &str) -> &str {
    if s == "\"" {
        ""
    } else if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

// An empty pattern never matches in the engine.
fn replace_all(s: &str, pattern: &str, with: &str) -> String {
    if pattern.is_empty() {
        return s.to_string();
    }
    s.replace(pattern, with)
}

fn replace_first(s: &str, pattern: &str, with: &str) -> String {
    if pattern.is_empty() {
        return s.to_string();
    }
    s.replacen(pattern, with, 1)
}

impl fmt::Display for FormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional(value) => f.write_str(value),
            Self::Named { key, value } => write!(f, "{key}={value}"),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
