/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod kv_parser;

pub(crate) use kv_parser::KvParser;

use proc_macro2::{Ident, TokenStream, TokenTree};
use quote::spanned::Spanned;
use quote::{format_ident, quote};
use venial::Error;

use crate::ParseResult;

pub fn ident(s: &str) -> Ident {
    format_ident!("{}", s)
}

pub fn bail<R, T>(msg: impl AsRef<str>, tokens: T) -> ParseResult<R>
where
    T: Spanned,
{
    Err(error(msg, tokens))
}

pub fn error<T>(msg: impl AsRef<str>, tokens: T) -> Error
where
    T: Spanned,
{
    Error::new_at_span(tokens.__span(), msg.as_ref())
}

/// Re-attaches the attribute's own arguments to the item, so that they can be read back like any other attribute.
pub fn venial_parse_meta(meta: &TokenStream, self_name: Ident, input: &TokenStream) -> ParseResult<venial::Item> {
    let input = quote! {
        #[#self_name(#meta)]
        #input
    };

    venial::parse_item(input)
}

pub(crate) fn is_punct(tt: &TokenTree, c: char) -> bool {
    match tt {
        TokenTree::Punct(punct) => punct.as_char() == c,
        _ => false,
    }
}

pub(crate) fn path_is_single(path: &[TokenTree], expected: &str) -> bool {
    path.len() == 1 && path[0].to_string() == expected
}

pub(crate) fn path_ends_with(path: &[TokenTree], expected: &str) -> bool {
    path.last().is_some_and(|last| last.to_string() == expected)
}

/// Whether `s` can appear inside a Rust identifier (and thus a C symbol name).
pub(crate) fn is_symbol_part(s: &str) -> bool {
    let starts_ok = s.chars().next().is_none_or(|c| !c.is_ascii_digit());
    starts_ok && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
