//! Rule-based validation
//!
//! - [`Validator`] and the combinators [`and`], [`or`], [`array`],
//!   [`map_key`], [`map_value`], [`map_key_value`]
//! - [`builtin`] rule functions (`min`, `max`, `oneof`, `email`, ...)
//! - [`RuleBuilder`], which compiles and caches rule text
//! - [`ValidateHandler`], the `validate` annotation handler
//! - [`ValidationError`] and [`NamedErrors`]

pub mod builtin;
mod driver;
mod error;
mod function;
mod rule;
mod validator;

pub use driver::ValidateHandler;
pub use error::{NamedErrors, SelfValidate, ValidationError};
pub use function::{
    Argument, Function, check_arity, check_min_arity, float_arg, int_arg, str_arg, validator_arg,
};
pub use rule::{BuildContext, RuleBuilder};
pub use validator::{
    Context, Validate, Validator, and, array, map_key, map_key_value, map_value, or,
};
