/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::util::{bail, is_symbol_part, path_ends_with, KvParser};
use crate::ParseResult;

const DEFAULT_PREFIX: &str = "godot_";

pub fn attribute_gdnative(item: venial::Item) -> ParseResult<TokenStream> {
    let mut impl_decl = match item {
        venial::Item::Impl(item) => item,
        _ => return bail("#[gdnative] can only be applied to trait impls", item),
    };

    match &impl_decl.trait_ty {
        Some(trait_ty) if path_ends_with(&trait_ty.tokens, "NativeExtension") => {}
        _ => {
            return bail(
                "#[gdnative] for trait impls requires trait to be `NativeExtension`",
                &impl_decl,
            )
        }
    }
    if impl_decl.tk_unsafe.is_none() {
        return bail(
            "`impl NativeExtension` must be marked unsafe, to confirm your opt-in to the host's calling contract",
            &impl_decl.tk_impl,
        );
    }
    if let Some(generics) = &impl_decl.impl_generic_params {
        return bail("#[gdnative] does not support generic impls", generics);
    }

    let drained_attributes = std::mem::take(&mut impl_decl.attributes);
    let mut parser = KvParser::parse_required(&drained_attributes, "gdnative", &impl_decl)?;
    let prefix = parser.handle_string("prefix")?;
    parser.finish()?;

    let prefix = match prefix {
        Some((key, prefix)) if !is_symbol_part(&prefix) => {
            return bail(
                format!("prefix {prefix:?} must consist of ASCII letters, digits and `_`, and not start with a digit"),
                key,
            );
        }
        Some((_, prefix)) => prefix,
        None => DEFAULT_PREFIX.to_string(),
    };

    Ok(generate_entry_points(&impl_decl, &prefix))
}

fn generate_entry_points(impl_decl: &venial::Impl, prefix: &str) -> TokenStream {
    let impl_ty = &impl_decl.self_ty;

    let gdnative_init = format_ident!("{}gdnative_init", prefix);
    let gdnative_terminate = format_ident!("{}gdnative_terminate", prefix);
    let nativescript_init = format_ident!("{}nativescript_init", prefix);
    let nativescript_terminate = format_ident!("{}nativescript_terminate", prefix);

    // Anonymous const scope: each invocation owns its slot, and several invocations can share a module.
    quote! {
        #impl_decl

        const _: () = {
            fn __make_handshake() -> ::gdnative::init::Handshake<::gdnative::host::EngineHost> {
                ::gdnative::init::Handshake::new(::gdnative::init::ExtensionConfig::of::<#impl_ty>(#prefix))
            }

            static __GDNATIVE_SLOT: ::gdnative::private::ExtensionSlot =
                ::gdnative::private::ExtensionSlot::new(__make_handshake);

            #[no_mangle]
            unsafe extern "C" fn #gdnative_init(options: *mut ::gdnative::sys::godot_gdnative_init_options) {
                ::gdnative::private::__gdnative_init::<#impl_ty>(&__GDNATIVE_SLOT, options)
            }

            #[no_mangle]
            unsafe extern "C" fn #gdnative_terminate(options: *mut ::gdnative::sys::godot_gdnative_terminate_options) {
                ::gdnative::private::__gdnative_terminate::<#impl_ty>(&__GDNATIVE_SLOT, options)
            }

            #[no_mangle]
            unsafe extern "C" fn #nativescript_init(handle: *mut ::std::ffi::c_void) {
                ::gdnative::private::__nativescript_init::<#impl_ty>(&__GDNATIVE_SLOT, handle)
            }

            #[no_mangle]
            unsafe extern "C" fn #nativescript_terminate(handle: *mut ::std::ffi::c_void) {
                ::gdnative::private::__nativescript_terminate::<#impl_ty>(&__GDNATIVE_SLOT, handle)
            }

            // Ensures that the entry points match the signatures the host expects.
            let _: ::gdnative::sys::godot_gdnative_init_fn = #gdnative_init;
            let _: ::gdnative::sys::godot_gdnative_terminate_fn = #gdnative_terminate;
            let _: ::gdnative::sys::godot_nativescript_init_fn = #nativescript_init;
            let _: ::gdnative::sys::godot_nativescript_terminate_fn = #nativescript_terminate;
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{ident, venial_parse_meta};

    fn expand(meta: TokenStream, input: TokenStream) -> ParseResult<String> {
        let item = venial_parse_meta(&meta, ident("gdnative"), &input)?;
        attribute_gdnative(item).map(|tokens| tokens.to_string())
    }

    fn error_message(meta: TokenStream, input: TokenStream) -> String {
        match expand(meta, input) {
            Ok(tokens) => panic!("expected error, got: {tokens}"),
            Err(err) => err.to_compile_error().to_string(),
        }
    }

    #[test]
    fn default_prefix() {
        let out = expand(quote!(), quote!(unsafe impl NativeExtension for MyExt {})).expect("expands");

        for entry in ["gdnative_init", "gdnative_terminate", "nativescript_init", "nativescript_terminate"] {
            assert!(out.contains(&format!("fn godot_{entry}")), "missing {entry} in {out}");
        }
        assert!(out.contains("ExtensionConfig"), "{out}");
        assert!(out.contains("\"godot_\""), "{out}");
        assert!(!out.contains("# [gdnative"), "attribute must be consumed: {out}");
    }

    #[test]
    fn custom_prefix() {
        let out = expand(
            quote!(prefix = "tools_"),
            quote!(unsafe impl gdnative::init::NativeExtension for Tools {}),
        )
        .expect("expands");

        assert!(out.contains("fn tools_gdnative_init"), "{out}");
        assert!(out.contains("fn tools_nativescript_terminate"), "{out}");
        assert!(!out.contains("godot_gdnative_init ("), "{out}");
    }

    #[test]
    fn rejects_wrong_items() {
        let msg = error_message(quote!(), quote!(struct NotAnImpl;));
        assert!(msg.contains("can only be applied to trait impls"), "{msg}");

        let msg = error_message(quote!(), quote!(unsafe impl Drop for MyExt {}));
        assert!(msg.contains("requires trait to be `NativeExtension`"), "{msg}");

        let msg = error_message(quote!(), quote!(impl NativeExtension for MyExt {}));
        assert!(msg.contains("must be marked unsafe"), "{msg}");

        let msg = error_message(quote!(), quote!(unsafe impl<T> NativeExtension for Wrapper<T> {}));
        assert!(msg.contains("generic impls"), "{msg}");
    }

    #[test]
    fn rejects_bad_arguments() {
        let item = quote!(unsafe impl NativeExtension for MyExt {});

        let msg = error_message(quote!(prefix = "my-lib_"), item.clone());
        assert!(msg.contains("ASCII letters"), "{msg}");

        let msg = error_message(quote!(prefix = tools_), item.clone());
        assert!(msg.contains("string literal"), "{msg}");

        let msg = error_message(quote!(entry_point = "x"), item);
        assert!(msg.contains("unrecognized key `entry_point`"), "{msg}");
    }
}
