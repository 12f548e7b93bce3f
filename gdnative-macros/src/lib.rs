/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Internal crate of the GDNative Rust bindings.
//!
//! Do not depend on this crate directly, instead use the `gdnative` crate.
//! No SemVer or other guarantees are provided.

mod gdnative;
mod util;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;

use crate::util::ident;

/// Proc-macro attribute to be used in combination with the [`NativeExtension`] trait.
///
/// Exports the four entry points the host looks up when loading the library, each named `<prefix><entry>`:
/// `gdnative_init`, `gdnative_terminate`, `nativescript_init` and `nativescript_terminate`. The prefix defaults to
/// `godot_`, which is what a `.gdnlib` file expects unless it sets `symbol_prefix`.
///
/// ```ignore
/// struct Tools;
///
/// #[gdnative(prefix = "tools_")]
/// unsafe impl NativeExtension for Tools {}
/// ```
///
/// Every invocation gets its own storage slot, so several extensions with distinct prefixes can live in one binary.
///
/// [`NativeExtension`]: ../init/trait.NativeExtension.html
#[proc_macro_attribute]
pub fn gdnative(meta: TokenStream, input: TokenStream) -> TokenStream {
    translate_meta("gdnative", meta, input, gdnative::attribute_gdnative)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation

type ParseResult<T> = Result<T, venial::Error>;

/// For `#[proc_macro_attribute]` procedural macros.
fn translate_meta<F>(self_name: &str, meta: TokenStream, input: TokenStream, transform: F) -> TokenStream
where
    F: FnOnce(venial::Item) -> ParseResult<TokenStream2>,
{
    let self_name = ident(self_name);
    let input2 = TokenStream2::from(input);
    let meta2 = TokenStream2::from(meta);

    let result2 = util::venial_parse_meta(&meta2, self_name, &input2)
        .and_then(transform)
        .unwrap_or_else(|e| e.to_compile_error());

    TokenStream::from(result2)
}
