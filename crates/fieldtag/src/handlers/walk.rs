//! `walk` recursion control

use crate::error::TagError;
use crate::handler::Handler;
use crate::reflect::parse_bool;
use crate::walk::{Field, Walk, WalkContext};

/// Recursion control: `-` or a false boolean keeps the walker out of the
/// field; a true boolean is a no-op.
pub struct WalkControl;

impl Handler for WalkControl {
    type Arg = Walk;

    fn parse(&self, value: &str) -> Result<Walk, TagError> {
        if value == "-" {
            return Ok(Walk::Skip);
        }
        match parse_bool(value) {
            Some(true) => Ok(Walk::Continue),
            Some(false) => Ok(Walk::Skip),
            None => Err(TagError::custom(format!(
                "expected `-` or a boolean, got {value:?}"
            ))),
        }
    }

    fn run(&self, _: &mut WalkContext<'_>, _: &mut Field<'_, '_>, verdict: &Walk) -> Result<Walk, TagError> {
        Ok(*verdict)
    }
}
