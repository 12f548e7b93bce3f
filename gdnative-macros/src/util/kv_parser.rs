/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use proc_macro2::{Ident, Span, TokenStream, TokenTree};
use quote::ToTokens;

use super::{bail, error, ident, is_punct, path_is_single};
use crate::ParseResult;

pub(crate) type KvMap = HashMap<Ident, Option<KvValue>>;

/// Struct to parse attributes like `#[attr(key, key2="value", key3=123)]` in a very user-friendly way.
pub(crate) struct KvParser {
    map: KvMap,
    span: Span,
}

impl KvParser {
    /// Create a new parser which requires a `#[expected]` attribute.
    ///
    /// `context` is used for the span in error messages.
    pub fn parse_required(
        attributes: &[venial::Attribute],
        expected: &str,
        context: impl ToTokens,
    ) -> ParseResult<Self> {
        match Self::parse(attributes, expected) {
            Ok(Some(result)) => Ok(result),
            Ok(None) => bail(
                format!("expected attribute #[{expected}], but not present"),
                context.into_token_stream(),
            ),
            Err(e) => Err(e),
        }
    }

    /// Create a new parser which checks for presence of an `#[expected]` attribute.
    ///
    /// Returns `Ok(None)` if the attribute is not present.
    pub fn parse(attributes: &[venial::Attribute], expected: &str) -> ParseResult<Option<Self>> {
        let mut found_attr: Option<Self> = None;

        for attr in attributes.iter() {
            if path_is_single(&attr.path, expected) {
                if found_attr.is_some() {
                    return bail(format!("only a single #[{expected}] attribute allowed"), attr);
                }

                found_attr = Some(Self {
                    span: attr.tk_brackets.span,
                    map: ParserState::parse(expected.to_string(), &attr.value)?,
                });
            }
        }

        Ok(found_attr)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Handles an optional key that can only occur with a string literal as the value, e.g. `#[attr(key = "text")]`.
    ///
    /// Returns the unescaped string, together with the key for error spans.
    pub fn handle_string(&mut self, key: &str) -> ParseResult<Option<(Ident, String)>> {
        let Some((key, value)) = self.map.remove_entry(&ident(key)) else {
            return Ok(None);
        };
        let Some(value) = value else {
            return bail(format!("expected `{key}` to be followed by `= \"string\"`"), &key);
        };

        let token = value.single()?;
        let TokenTree::Literal(lit) = &token else {
            return bail(format!("value for `{key}` must be a string literal"), &token);
        };
        match litrs::StringLit::try_from(lit) {
            Ok(string) => Ok(Some((key, string.value().to_string()))),
            Err(_) => bail(format!("value for `{key}` must be a string literal"), lit),
        }
    }

    /// Explicit "pre-destructor" that must be called, and checks that all map entries have been consumed.
    pub fn finish(self) -> ParseResult<()> {
        let mut errors = self
            .map
            .keys()
            .map(|key| error(format!("unrecognized key `{key}`"), key));

        match errors.next() {
            None => Ok(()),
            Some(first) => Err(errors.fold(first, |mut acc, e| {
                acc.combine(e);
                acc
            })),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct KvValue {
    /// Tokens comprising this value. Guaranteed to be nonempty.
    tokens: Vec<TokenTree>,
}

impl KvValue {
    fn new(tokens: Vec<TokenTree>) -> Self {
        debug_assert!(!tokens.is_empty());
        Self { tokens }
    }

    #[allow(dead_code)] // Used in tests.
    pub fn expr(self) -> TokenStream {
        self.tokens.into_iter().collect()
    }

    pub fn single(mut self) -> ParseResult<TokenTree> {
        if self.tokens.len() > 1 {
            return bail("expected a single item", &self.tokens[1]);
        }

        Ok(self.tokens.remove(0))
    }
}

struct ParserState<'a> {
    attr_name: String,
    tokens: std::slice::Iter<'a, TokenTree>,
    prev: Option<&'a TokenTree>,
    cur: Option<&'a TokenTree>,
}

impl<'a> ParserState<'a> {
    pub fn parse(attr_name: String, attr_value: &'a venial::AttributeValue) -> ParseResult<KvMap> {
        let mut tokens = match attr_value {
            venial::AttributeValue::Equals(punct, _tokens) => {
                return bail("expected `(` or `]`", punct);
            }
            _ => attr_value.get_value_tokens().iter(),
        };
        let cur = tokens.next();

        let parser = Self {
            attr_name,
            tokens,
            prev: None,
            cur,
        };

        parser.parse_map()
    }

    fn parse_map(mut self) -> ParseResult<KvMap> {
        let mut map: KvMap = HashMap::new();

        while let Some(cur) = self.cur {
            match cur {
                TokenTree::Ident(key) => {
                    self.next();
                    let value = self.parse_opt_value(key)?;
                    if map.contains_key(key) {
                        return bail(format!("duplicate key `{key}`"), key);
                    }
                    map.insert(key.clone(), value);
                }
                _ => {
                    let attr = &self.attr_name;
                    return bail(format!("expected identifier as argument to `#[{attr}]`"), cur);
                }
            }
        }

        Ok(map)
    }

    fn parse_opt_value(&mut self, key: &Ident) -> ParseResult<Option<KvValue>> {
        let value = match self.cur {
            // End of input directly after a key
            None => None,
            // Comma following key
            Some(tt) if is_punct(tt, ',') => {
                self.next();
                None
            }
            // Equals sign following key
            Some(tt) if is_punct(tt, '=') => {
                self.next();
                Some(self.parse_value()?)
            }
            Some(tt) => {
                return bail(format!("expected next argument, or `= value` following `{key}`"), tt);
            }
        };
        Ok(value)
    }

    fn parse_value(&mut self) -> ParseResult<KvValue> {
        let mut tokens = Vec::new();
        while let Some(cur) = self.cur {
            if is_punct(cur, ',') {
                self.next();
                break;
            }
            tokens.push(cur.clone());
            self.next();
        }

        match self.prev {
            // `cur` might be `None` at this point, so we point at the previous token instead.
            // This could be the `=` sign or a `,` directly after `=`.
            Some(prev) if tokens.is_empty() => bail("expected value after `=`", prev),
            _ => Ok(KvValue::new(tokens)),
        }
    }

    fn next(&mut self) {
        self.prev = self.cur;
        self.cur = self.tokens.next();
    }
}
