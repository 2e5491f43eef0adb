//! # fieldtag
//!
//! Tag-driven struct reflection and rule-based validation.
//!
//! Fields carry annotation strings of `name:"value"` pairs. A walker visits
//! every exported field, hands each annotation to the handler registered
//! under its name, and descends into nested structures. The `validate`
//! handler compiles boolean rule expressions into cached validators.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fieldtag::Reflect;
//!
//! #[derive(Reflect, Default)]
//! struct Server {
//!     #[tag(r#"validate:"zero || (min==3 && max==10)" json:"host""#)]
//!     pub host: String,
//!     #[tag(r#"validate:"min(1) && max(65535)" default:"8080""#)]
//!     pub port: u16,
//!     #[tag(r#"validate:"oneof(\"tcp\", \"udp\")""#)]
//!     pub proto: String,
//! }
//!
//! let mut server = Server { host: "ab".into(), proto: "tcp".into(), ..Default::default() };
//! fieldtag::engine::global().walk_mut(&mut server)?; // port = 8080
//!
//! let err = fieldtag::validate_struct(&server).unwrap_err();
//! assert_eq!(err.to_string(), "host: the length is less than 3");
//! ```
//!
//! ## Rules
//!
//! Rules combine functions with `&&`, `||` and parentheses. `min==3` is
//! the same as `min(3)`. See [`validation::builtin`] for the functions
//! every engine starts with; [`register_function`] and [`register_symbol`]
//! add more.
//!
//! ## Handlers
//!
//! Implement [`Handler`] and [`register`] it under an annotation name.
//! Unknown annotation names are ignored.

// `derive(Reflect)` expands to `::fieldtag::...` paths, including in this crate's tests.
extern crate self as fieldtag;

mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod prelude;
pub mod reflect;
pub mod tag;
pub mod validation;
pub mod walk;

pub use config::Config;
pub use engine::Engine;
pub use error::{BuildError, Error, Result, TagError};
pub use handler::{Handler, Registry};
pub use reflect::{FieldInfo, Kind, Literal, Map, Reflect, Seq, SetError, Struct, Value, ValueMut};
pub use validation::{NamedErrors, SelfValidate, ValidationError, Validator};
pub use walk::{Field, Walk, WalkContext};

#[cfg(feature = "derive")]
pub use fieldtag_macros::Reflect;

use validation::{Argument, Function};

/// Registers `handler` for annotation `name` on the global engine.
pub fn register(name: &str, handler: impl Handler) {
    engine::global().register(name, handler);
}

/// Removes the global handler for `name`.
pub fn unregister(name: &str) -> bool {
    engine::global().unregister(name)
}

/// Adds a rule function to the global engine.
pub fn register_function(function: Function) {
    engine::global().register_function(function);
}

/// Adds a rule symbol to the global engine.
pub fn register_symbol(name: &str, value: impl Into<Argument>) {
    engine::global().register_symbol(name, value);
}

/// Checks `value` against `rule` on the global engine.
pub fn validate(value: &dyn Reflect, rule: &str) -> Result<()> {
    engine::global().validate(value, rule)
}

/// Validates every annotated field of `value` on the global engine.
pub fn validate_struct(value: &dyn Reflect) -> Result<()> {
    engine::global().validate_struct(value)
}
