//! # fieldtag-expression
//!
//! Parser for boolean rule expressions such as
//! `zero || (min==3 && max==10)` or `array(oneof("a", "b"))`.
//!
//! The crate carries no semantics of its own. [`parse`] replays the
//! expression into a [`Builder`], which decides what each identifier and call
//! means and how `&&`/`||` groups combine.
//!
//! ```rust,ignore
//! use fieldtag_expression::{Arg, Builder, ParseError, parse};
//!
//! struct Names;
//!
//! impl Builder for Names {
//!     type Context = Vec<String>;
//!     type Error = ParseError;
//!
//!     fn new_context(&self) -> Vec<String> { Vec::new() }
//!     fn and(&self, ctx: &mut Vec<String>, sub: Vec<String>) -> Result<(), ParseError> {
//!         ctx.push(sub.join(" and "));
//!         Ok(())
//!     }
//!     // ...
//! }
//!
//! let names = parse("a && b", &Names)?;
//! ```

pub mod ast;
mod builder;
mod error;
mod lexer;
mod parser;
mod token;

pub use builder::{Arg, Builder, parse};
pub use error::{ParseError, ParseResult};
pub use parser::parse_expr;
