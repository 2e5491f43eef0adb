//! Common imports.
//!
//! ```rust,ignore
//! use fieldtag::prelude::*;
//! ```

pub use crate::engine::Engine;
pub use crate::error::{Error, TagError};
pub use crate::handler::Handler;
pub use crate::reflect::{Literal, Reflect, Value};
pub use crate::validation::{
    Context, Function, NamedErrors, SelfValidate, Validate, ValidationError, Validator, and, or,
};
pub use crate::walk::{Field, Walk, WalkContext};

#[cfg(feature = "derive")]
pub use fieldtag_macros::Reflect;
