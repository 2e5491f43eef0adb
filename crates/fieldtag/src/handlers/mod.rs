//! Stock annotation handlers
//!
//! | Annotation | Handler | Effect |
//! |------------|---------|--------|
//! | `walk:"-"` | [`WalkControl`] | stops descent into the field |
//! | `default:"8080"` | [`DefaultHandler`] | sets the field when it is zero |
//! | `set:".Server.Port"` | [`SetHandler`] | always sets the field |
//! | `inject:"hostname"` | [`InjectHandler`] | sets the field from a named provider |
//!
//! `validate` lives in [`crate::validation::ValidateHandler`].

mod assign;
mod inject;
mod walk;

pub use assign::{DefaultHandler, SetHandler, Source};
pub use inject::InjectHandler;
pub use walk::WalkControl;
