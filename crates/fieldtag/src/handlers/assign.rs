//! `default` and `set`
//!
//! Both take either a literal (`default:"8080"`), coerced to the field's
//! type, or an absolute path from the root (`default:".Server.Port"`) whose
//! scalar value is copied. Path segments are Rust field names.

use crate::error::TagError;
use crate::handler::Handler;
use crate::reflect::{Literal, Value};
use crate::walk::{Field, Walk, WalkContext};

/// Where an assigned value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Literal(String),
    /// Field names from the root, e.g. `["Server", "Port"]`.
    Path(Vec<String>),
}

impl Source {
    pub fn parse(value: &str) -> Result<Self, TagError> {
        let Some(path) = value.strip_prefix('.') else {
            return Ok(Self::Literal(value.to_string()));
        };
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(TagError::custom(format!("malformed field path {value:?}")));
        }
        Ok(Self::Path(segments))
    }

    /// The literal to assign, reading paths from `root`.
    pub fn resolve(&self, root: Value<'_>) -> Result<Literal, TagError> {
        match self {
            Self::Literal(text) => Ok(Literal::Str(text.clone())),
            Self::Path(segments) => lookup(root, segments).ok_or_else(|| {
                TagError::custom(format!(
                    "path .{} does not lead to a scalar",
                    segments.join(".")
                ))
            }),
        }
    }
}

fn lookup(root: Value<'_>, segments: &[String]) -> Option<Literal> {
    let mut current = root;
    for segment in segments {
        let Value::Struct(s) = current.indirect() else {
            return None;
        };
        let index = s.fields().iter().position(|info| info.name == segment.as_str())?;
        current = s.field(index)?.value();
    }
    Literal::from_value(current)
}

fn assign(field: &mut Field<'_, '_>, source: &Source) -> Result<(), TagError> {
    let literal = source.resolve(field.root())?;
    field.set(literal)
}

/// Sets the field when it holds its zero value.
pub struct DefaultHandler;

impl Handler for DefaultHandler {
    type Arg = Source;

    fn parse(&self, value: &str) -> Result<Source, TagError> {
        Source::parse(value)
    }

    fn run(&self, _: &mut WalkContext<'_>, field: &mut Field<'_, '_>, source: &Source) -> Result<Walk, TagError> {
        if field.value()?.is_zero() {
            assign(field, source)?;
        }
        Ok(Walk::Continue)
    }
}

/// Sets the field unconditionally.
pub struct SetHandler;

impl Handler for SetHandler {
    type Arg = Source;

    fn parse(&self, value: &str) -> Result<Source, TagError> {
        Source::parse(value)
    }

    fn run(&self, _: &mut WalkContext<'_>, field: &mut Field<'_, '_>, source: &Source) -> Result<Walk, TagError> {
        assign(field, source)?;
        Ok(Walk::Continue)
    }
}
