//! Derive macros for the vmsim crate.
//!
//! Provides `#[derive(Error)]`, an in-tree replacement for `thiserror` used by
//! every error type of the simulator.

mod error;

use proc_macro::TokenStream;

/// Implements `Display`, `Error` and `#[from]` conversions for error types.
#[proc_macro_derive(Error, attributes(error, from, source))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
