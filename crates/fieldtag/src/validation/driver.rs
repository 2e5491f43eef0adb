//! Struct validation driver
//!
//! [`ValidateHandler`] is the handler behind the `validate` annotation: it
//! compiles the rule once (through the tag cache) and evaluates it against
//! the field on every walk, recording failures under the field's path.

use std::sync::Arc;

use crate::engine::Engine;
use crate::error::{Error, TagError};
use crate::handler::Handler;
use crate::reflect::{Reflect, Value};
use crate::validation::{Context, RuleBuilder, ValidationError, Validator};
use crate::walk::{Field, Walk, WalkContext};

/// Runs the rule in a `validate:"..."` annotation.
pub struct ValidateHandler {
    rules: Arc<RuleBuilder>,
}

impl ValidateHandler {
    pub fn new(rules: Arc<RuleBuilder>) -> Self {
        Self { rules }
    }
}

impl Handler for ValidateHandler {
    type Arg = Validator;

    fn parse(&self, value: &str) -> Result<Validator, TagError> {
        Ok(self.rules.build(value)?)
    }

    fn run(
        &self,
        ctx: &mut WalkContext<'_>,
        field: &mut Field<'_, '_>,
        validator: &Validator,
    ) -> Result<Walk, TagError> {
        let value = field.value()?;
        let root = ctx.root().unwrap_or(field.root());
        let vctx = Context::new(ctx.engine()).with_root(root);
        if let Err(error) = validator.validate(&vctx, value) {
            ctx.record(field.path(), error);
        }

        // `structure` has already walked the nested fields.
        Ok(if validator.descends() {
            Walk::Skip
        } else {
            Walk::Continue
        })
    }
}

impl Engine {
    /// Checks `value` against `rule`, compiling the rule on first use.
    pub fn validate(&self, value: &dyn Reflect, rule: &str) -> Result<(), Error> {
        let validator = self.rules().build(rule)?;
        let ctx = Context::new(self).with_root(value.value());
        validator.validate(&ctx, value.value())?;
        Ok(())
    }

    /// Validates every `validate`-annotated field of `value`.
    ///
    /// Fails with [`Error::Fields`] listing each failing field path, or with
    /// [`Error::Tag`] when an annotation or rule is malformed.
    pub fn validate_struct(&self, value: &dyn Reflect) -> Result<(), Error> {
        self.collect_failures(value.value(), None)?.into_result()?;
        Ok(())
    }

    /// Validates a nested structure: its annotated fields, then, when those
    /// pass, its own validation method.
    ///
    /// Validators below it see `root` (the outermost value being validated)
    /// as their context root. Field failures come back as one error carrying
    /// them in `fields`. Absent pointers pass.
    pub fn validate_nested(
        &self,
        root: Option<Value<'_>>,
        value: Value<'_>,
    ) -> Result<(), ValidationError> {
        let s = match value.indirect() {
            Value::Struct(s) => s,
            Value::Null => return Ok(()),
            other => return Err(ValidationError::unsupported("structure", other.kind())),
        };

        let failures = self
            .collect_failures(Value::Struct(s), root)
            .map_err(|err| ValidationError::new(err.code(), err.to_string()))?;
        if !failures.is_empty() {
            return Err(ValidationError::nested(failures));
        }
        s.self_validate().unwrap_or(Ok(()))
    }

    fn collect_failures(
        &self,
        value: Value<'_>,
        root: Option<Value<'_>>,
    ) -> Result<crate::validation::NamedErrors, TagError> {
        let mut ctx = WalkContext::new(self).with_self_validation(self.config().self_validate);
        if let Some(root) = root {
            ctx = ctx.with_root(root);
        }
        self.validation_registry().walk_value(&mut ctx, value)?;
        Ok(ctx.into_failures())
    }
}
