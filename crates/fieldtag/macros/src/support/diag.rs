use std::fmt::Display;

use proc_macro::TokenStream;
use quote::ToTokens;

/// Emits `err` as `compile_error!` at its spans.
pub fn emit(err: syn::Error) -> TokenStream {
    err.into_compile_error().into()
}

/// An error pointing at `tokens`.
pub fn spanned(tokens: &impl ToTokens, message: impl Display) -> syn::Error {
    syn::Error::new_spanned(tokens, message)
}
