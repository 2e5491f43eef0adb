//! # fieldtag-macros
//!
//! `#[derive(Reflect)]` for the `fieldtag` crate. Use it through
//! `fieldtag::Reflect` with the `derive` feature rather than depending on
//! this crate directly.
//!
//! ```ignore
//! use fieldtag::Reflect;
//!
//! #[derive(Reflect)]
//! #[reflect(self_validate)]
//! pub struct Account {
//!     #[tag(r#"validate:"min==3 && max==32" json:"name""#)]
//!     pub name: String,
//!     #[tag(r#"validate:"email""#)]
//!     pub email: String,
//!     #[reflect(skip)]
//!     pub session: Option<Session>,
//!     retries: u32,
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate proc_macro;

use proc_macro::TokenStream;

mod reflect;
mod support;

/// Derives `fieldtag::Reflect` and `fieldtag::Struct`.
///
/// # Field attributes
///
/// - `#[tag("...")]`: the annotation string, e.g.
///   `#[tag(r#"validate:"min(1)" default:"1""#)]`. Several `tag` attributes
///   are joined with a space.
/// - `#[reflect(skip)]`: leave the field out of reflection entirely. Its
///   type does not need to implement `Reflect`.
///
/// Only `pub` fields are exported; handlers never run on the others.
///
/// # Container attributes
///
/// - `#[reflect(self_validate)]`: the type implements
///   `fieldtag::SelfValidate`, which runs after its fields pass.
///
/// Every generic type parameter gets a `fieldtag::Reflect` bound.
#[proc_macro_derive(Reflect, attributes(tag, reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    reflect::derive(input)
}
