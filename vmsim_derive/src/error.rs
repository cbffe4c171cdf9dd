//! Derive macro for error types.
//!
//! Generates `std::fmt::Display`, `std::error::Error` and, for `#[from]`
//! fields, `From` implementations.
//!
//! # Usage
//!
//! ```ignore
//! use vmsim_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum LoadError {
//!     #[error("unknown instruction: {0}")]
//!     UnknownInstruction(String),
//!
//!     #[error("line {line}: {message}")]
//!     Located { line: usize, column: usize, message: String },
//!
//!     #[error("io error")]
//!     Io(#[from] std::io::Error),
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `#[error("error: {0}")]`
//! - Struct variants with named args: `#[error("expected {expected}")]`
//! - Fields not referenced by the message are ignored
//! - `#[source]` marks the field returned by `Error::source`
//! - `#[from]` implies `#[source]` and also generates `From<FieldType>`

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use std::collections::HashSet;
use syn::{Data, DeriveInput, Field, Fields, Ident, Lit, Meta, parse_macro_input};

/// Derives `Display` and `Error` for an enum or struct.
///
/// Each variant (or the struct itself) must carry an `#[error("...")]`
/// attribute. Supports field interpolation using `{0}`, `{1}` for tuple
/// fields or `{field_name}` for named fields.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Field marked as the error source, with its binding and `From` eligibility.
struct SourceField<'a> {
    member: syn::Member,
    field: &'a Field,
    from: bool,
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (display_body, source_body, from_impls) = match &input.data {
        Data::Enum(data_enum) => {
            let mut display_arms = Vec::new();
            let mut source_arms = Vec::new();
            let mut from_impls = Vec::new();

            for variant in &data_enum.variants {
                let variant_name = &variant.ident;
                let message = extract_error_message_from_attrs(
                    &variant.attrs,
                    &variant.ident,
                    &format!("variant `{}`", variant_name),
                )?;
                let (pattern, format_str, args) =
                    display_binding(quote!(Self::#variant_name), &variant.fields, &message);
                display_arms.push(quote! {
                    #pattern => write!(f, #format_str #(, #args)*),
                });

                if let Some(source) = find_source_field(&variant.fields)? {
                    let member = &source.member;
                    source_arms.push(quote! {
                        Self::#variant_name { #member: __source, .. } => {
                            ::std::option::Option::Some(__source as &(dyn ::std::error::Error + 'static))
                        }
                    });
                    if source.from {
                        from_impls.push(from_impl(
                            name,
                            quote!(Self::#variant_name),
                            &variant.fields,
                            &source,
                        )?);
                    }
                }
            }

            let source_body = if source_arms.is_empty() {
                quote!(::std::option::Option::None)
            } else {
                quote! {
                    match self {
                        #(#source_arms)*
                        _ => ::std::option::Option::None,
                    }
                }
            };

            let display_body = if display_arms.is_empty() {
                quote!(match *self {})
            } else {
                quote! {
                    match self {
                        #(#display_arms)*
                    }
                }
            };

            (display_body, source_body, from_impls)
        }
        Data::Struct(data_struct) => {
            let message = extract_error_message_from_attrs(
                &input.attrs,
                &input.ident,
                &format!("type `{}`", input.ident),
            )?;
            let (pattern, format_str, args) =
                display_binding(quote!(Self), &data_struct.fields, &message);
            let display_body = quote! {
                let #pattern = self;
                write!(f, #format_str #(, #args)*)
            };

            let mut from_impls = Vec::new();
            let source_body = match find_source_field(&data_struct.fields)? {
                Some(source) => {
                    let member = &source.member;
                    if source.from {
                        from_impls.push(from_impl(
                            name,
                            quote!(Self),
                            &data_struct.fields,
                            &source,
                        )?);
                    }
                    quote! {
                        ::std::option::Option::Some(&self.#member as &(dyn ::std::error::Error + 'static))
                    }
                }
                None => quote!(::std::option::Option::None),
            };

            (display_body, source_body, from_impls)
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display_body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            #[allow(unreachable_patterns)]
            fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                #source_body
            }
        }

        #(#from_impls)*
    })
}

/// Builds the destructuring pattern, rewritten format string and named
/// arguments for one variant or struct.
///
/// Fields the message never mentions are bound to `_` so that `write!` does
/// not reject them as unused arguments.
fn display_binding(
    path: TokenStream2,
    fields: &Fields,
    message: &str,
) -> (TokenStream2, String, Vec<TokenStream2>) {
    let referenced = referenced_args(message);

    match fields {
        Fields::Unit => (path, message.to_string(), Vec::new()),
        Fields::Unnamed(unnamed) => {
            let count = unnamed.unnamed.len();
            let format_str = convert_positional_to_named(message, count);
            let mut bindings = Vec::with_capacity(count);
            let mut args = Vec::new();
            for i in 0..count {
                if referenced.contains(&i.to_string()) {
                    let ident = format_ident!("f{}", i);
                    bindings.push(quote!(#ident));
                    args.push(quote!(#ident = #ident));
                } else {
                    bindings.push(quote!(_));
                }
            }
            (quote!(#path(#(#bindings),*)), format_str, args)
        }
        Fields::Named(named) => {
            let mut bindings = Vec::with_capacity(named.named.len());
            let mut args = Vec::new();
            for field in &named.named {
                let Some(ident) = &field.ident else { continue };
                if referenced.contains(&ident.to_string()) {
                    bindings.push(quote!(#ident));
                    args.push(quote!(#ident = #ident));
                } else {
                    bindings.push(quote!(#ident: _));
                }
            }
            (quote!(#path { #(#bindings),* }), message.to_string(), args)
        }
    }
}

/// Returns the argument names (`0`, `line`, ...) referenced by a format string.
fn referenced_args(format_str: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut chars = format_str.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
            }
            '{' => {
                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == '}' || c == ':' {
                        break;
                    }
                    name.push(c);
                }
                let name = name.trim();
                if !name.is_empty() {
                    out.insert(name.to_string());
                }
            }
            _ => {}
        }
    }
    out
}

/// Finds the field tagged `#[from]` or `#[source]`, if any.
fn find_source_field(fields: &Fields) -> syn::Result<Option<SourceField<'_>>> {
    let mut found: Option<SourceField<'_>> = None;
    for (i, field) in fields.iter().enumerate() {
        let from = has_attr(field, "from");
        let source = has_attr(field, "source");
        if !from && !source {
            continue;
        }
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "only one field may be marked #[from] or #[source]",
            ));
        }
        let member = match &field.ident {
            Some(ident) => syn::Member::Named(ident.clone()),
            None => syn::Member::Unnamed(syn::Index::from(i)),
        };
        found = Some(SourceField {
            member,
            field,
            from,
        });
    }
    Ok(found)
}

fn has_attr(field: &Field, name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Generates `impl From<SourceType> for Target`.
///
/// `#[from]` is only accepted on single-field variants, since there is no
/// value to put in the remaining fields.
fn from_impl(
    target: &Ident,
    constructor: TokenStream2,
    fields: &Fields,
    source: &SourceField<'_>,
) -> syn::Result<TokenStream2> {
    if fields.len() != 1 {
        return Err(syn::Error::new_spanned(
            source.field,
            "#[from] requires the variant to have exactly one field",
        ));
    }
    let ty = &source.field.ty;
    let member = &source.member;
    Ok(quote! {
        impl ::std::convert::From<#ty> for #target {
            fn from(source: #ty) -> Self {
                #constructor { #member: source }
            }
        }
    })
}

/// Extracts the error message from attributes.
fn extract_error_message_from_attrs<T: ToTokens>(
    attrs: &[syn::Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<String> {
    for attr in attrs {
        if !attr.path().is_ident("error") {
            continue;
        }
        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] to describe the error",
            ));
        };
        let lit = syn::parse2::<Lit>(meta_list.tokens.clone()).map_err(|_| {
            syn::Error::new_spanned(
                &attr.meta,
                "failed to parse #[error] attribute; expected a string literal like #[error(\"empty stack\")]",
            )
        })?;
        return match lit {
            Lit::Str(lit_str) => Ok(lit_str.value()),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute: message must be a string literal",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        target,
        format!(
            "missing #[error(\"...\")] attribute on {}; every error variant must declare a display message",
            target_desc
        ),
    ))
}

/// Converts positional format args `{0}`, `{1:?}` to named args `{f0}`, `{f1:?}`.
fn convert_positional_to_named(format_str: &str, field_count: usize) -> String {
    let mut result = format_str.to_string();
    for i in (0..field_count).rev() {
        result = result
            .replace(&format!("{{{}}}", i), &format!("{{f{}}}", i))
            .replace(&format!("{{{}:", i), &format!("{{f{}:", i));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_args_named_and_positional() {
        let args = referenced_args("line {line}: {0} ({column:>3})");
        assert!(args.contains("line"));
        assert!(args.contains("0"));
        assert!(args.contains("column"));
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn referenced_args_skips_escaped_braces() {
        let args = referenced_args("address {{{name}}}");
        assert_eq!(args.len(), 1);
        assert!(args.contains("name"));
    }

    #[test]
    fn positional_rewrite_keeps_format_spec() {
        assert_eq!(convert_positional_to_named("{0} and {1:?}", 2), "{f0} and {f1:?}");
    }
}
