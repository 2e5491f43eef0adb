//! Validators and their combinators
//!
//! A [`Validator`] is a shared, immutable check over a reflected [`Value`].
//! Built-in rules, user functions and the combinators below all produce
//! the same type, so they nest freely:
//!
//! ```rust,ignore
//! use fieldtag::validation::{and, array, builtin, or};
//!
//! let v = array(or([builtin::zero(), and([builtin::min(3.0), builtin::max(10.0)])]));
//! assert_eq!(v.rule(), "array((zero || min(3) && max(10)))");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::engine::{self, Engine};
use crate::reflect::{Literal, Reflect, Value};
use crate::validation::ValidationError;

// ============================================================================
// CORE TRAIT
// ============================================================================

/// A check over one value.
pub trait Validate: Send + Sync {
    /// Checks `value`, returning why it fails.
    fn validate(&self, ctx: &Context<'_>, value: Value<'_>) -> Result<(), ValidationError>;

    /// Canonical rule text, e.g. `min(3) && max(10)`.
    fn rule(&self) -> &str;

    /// Whether this check walks the fields of a nested structure itself.
    ///
    /// The struct walker does not descend into a field whose validator
    /// descends, so nested failures are reported once.
    fn descends(&self) -> bool {
        false
    }
}

/// What a validator can see besides the value itself.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    engine: &'a Engine,
    root: Option<Value<'a>>,
}

impl<'a> Context<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine, root: None }
    }

    /// Sets the top-level value being walked, for cross-field checks.
    #[must_use]
    pub fn with_root(mut self, root: Value<'a>) -> Self {
        self.root = Some(root);
        self
    }

    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    pub fn root(&self) -> Option<Value<'a>> {
        self.root
    }
}

impl Default for Context<'static> {
    /// A context over the process-wide engine.
    fn default() -> Self {
        Self::new(engine::global())
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// A shared validator handle. Cloning is cheap.
#[derive(Clone)]
pub struct Validator(Arc<dyn Validate>);

impl Validator {
    pub fn new(validate: impl Validate + 'static) -> Self {
        Self(Arc::new(validate))
    }

    /// Wraps a closure under the given rule text.
    pub fn from_fn<F>(rule: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Context<'_>, Value<'_>) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        Self::new(FnValidator {
            rule: rule.into(),
            check,
            descends: false,
        })
    }

    /// Like [`Validator::from_fn`], for checks that walk nested structures.
    pub fn descending_fn<F>(rule: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Context<'_>, Value<'_>) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        Self::new(FnValidator {
            rule: rule.into(),
            check,
            descends: true,
        })
    }

    pub fn validate(&self, ctx: &Context<'_>, value: Value<'_>) -> Result<(), ValidationError> {
        self.0.validate(ctx, value)
    }

    pub fn rule(&self) -> &str {
        self.0.rule()
    }

    pub fn descends(&self) -> bool {
        self.0.descends()
    }

    /// Whether both handles share one instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Checks any reflected value against the process-wide engine.
    pub fn check<T: Reflect>(&self, value: &T) -> Result<(), ValidationError> {
        let ctx = Context::default().with_root(value.value());
        self.0.validate(&ctx, value.value())
    }
}

impl Validate for Validator {
    fn validate(&self, ctx: &Context<'_>, value: Value<'_>) -> Result<(), ValidationError> {
        self.0.validate(ctx, value)
    }

    fn rule(&self) -> &str {
        self.0.rule()
    }

    fn descends(&self) -> bool {
        self.0.descends()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.rule()).finish()
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule())
    }
}

struct FnValidator<F> {
    rule: String,
    check: F,
    descends: bool,
}

impl<F> Validate for FnValidator<F>
where
    F: Fn(&Context<'_>, Value<'_>) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, ctx: &Context<'_>, value: Value<'_>) -> Result<(), ValidationError> {
        (self.check)(ctx, value)
    }

    fn rule(&self) -> &str {
        &self.rule
    }

    fn descends(&self) -> bool {
        self.descends
    }
}

// ============================================================================
// AND / OR
// ============================================================================

struct And {
    validators: Vec<Validator>,
    rule: String,
}

impl Validate for And {
    fn validate(&self, ctx: &Context<'_>, value: Value<'_>) -> Result<(), ValidationError> {
        for validator in &self.validators {
            validator.validate(ctx, value)?;
        }
        Ok(())
    }

    fn rule(&self) -> &str {
        &self.rule
    }

    fn descends(&self) -> bool {
        self.validators.iter().any(Validator::descends)
    }
}

/// Passes when every validator passes; stops at the first failure.
///
/// A single validator is returned as is.
pub fn and(validators: impl IntoIterator<Item = Validator>) -> Validator {
    let mut validators: Vec<Validator> = validators.into_iter().collect();
    if validators.len() == 1
        && let Some(only) = validators.pop()
    {
        return only;
    }
    let rule = join_rules(&validators, " && ");
    Validator::new(And { validators, rule })
}

struct Or {
    validators: Vec<Validator>,
    rule: String,
}

impl Validate for Or {
    fn validate(&self, ctx: &Context<'_>, value: Value<'_>) -> Result<(), ValidationError> {
        let mut last = None;
        for validator in &self.validators {
            match validator.validate(ctx, value) {
                Ok(()) => return Ok(()),
                Err(err) => last = Some(err),
            }
        }
        last.map_or(Ok(()), Err)
    }

    fn rule(&self) -> &str {
        &self.rule
    }

    fn descends(&self) -> bool {
        self.validators.iter().any(Validator::descends)
    }
}

/// Passes at the first validator that passes; otherwise fails with the
/// last validator's error.
pub fn or(validators: impl IntoIterator<Item = Validator>) -> Validator {
    let validators: Vec<Validator> = validators.into_iter().collect();
    let rule = format!("({})", join_rules(&validators, " || "));
    Validator::new(Or { validators, rule })
}

fn join_rules(validators: &[Validator], separator: &str) -> String {
    validators
        .iter()
        .map(Validator::rule)
        .collect::<Vec<_>>()
        .join(separator)
}

// ============================================================================
// CONTAINERS
// ============================================================================

struct Array {
    inner: Validator,
    rule: String,
}

impl Validate for Array {
    fn validate(&self, ctx: &Context<'_>, value: Value<'_>) -> Result<(), ValidationError> {
        match value.indirect() {
            Value::Seq(seq) => {
                for index in 0..seq.len() {
                    let Some(item) = seq.get(index) else { continue };
                    self.inner
                        .validate(ctx, item.value())
                        .map_err(|err| err.at(format_args!("index {index}"), &format!("[{index}]")))?;
                }
                Ok(())
            }
            Value::Null => Ok(()),
            other => Err(ValidationError::unsupported("array", other.kind())),
        }
    }

    fn rule(&self) -> &str {
        &self.rule
    }

    fn descends(&self) -> bool {
        self.inner.descends()
    }
}

/// Applies `inner` to every element of a sequence.
pub fn array(inner: Validator) -> Validator {
    let rule = format!("array({})", inner.rule());
    Validator::new(Array { inner, rule })
}

#[derive(Clone, Copy)]
enum MapPart {
    Key,
    Value,
    Entry,
}

struct MapEach {
    part: MapPart,
    inner: Validator,
    rule: String,
}

impl Validate for MapEach {
    fn validate(&self, ctx: &Context<'_>, value: Value<'_>) -> Result<(), ValidationError> {
        let map = match value.indirect() {
            Value::Map(map) => map,
            Value::Null => return Ok(()),
            other => return Err(ValidationError::unsupported(self.code(), other.kind())),
        };

        for (key, item) in map.entries() {
            let target = match self.part {
                MapPart::Key => key.value(),
                MapPart::Value => item.value(),
                MapPart::Entry => Value::Entry(key, item),
            };
            self.inner.validate(ctx, target).map_err(|err| {
                let key = describe_key(key);
                let label = match self.part {
                    MapPart::Key => format!("key {key}"),
                    MapPart::Value => format!("value of key {key}"),
                    MapPart::Entry => format!("entry {key}"),
                };
                err.at(label, &format!("[{key}]"))
            })?;
        }
        Ok(())
    }

    fn rule(&self) -> &str {
        &self.rule
    }

    fn descends(&self) -> bool {
        self.inner.descends()
    }
}

impl MapEach {
    fn code(&self) -> &'static str {
        match self.part {
            MapPart::Key => "mapk",
            MapPart::Value => "mapv",
            MapPart::Entry => "mapkv",
        }
    }

    fn build(part: MapPart, inner: Validator) -> Validator {
        let mut each = Self {
            part,
            inner,
            rule: String::new(),
        };
        each.rule = format!("{}({})", each.code(), each.inner.rule());
        Validator::new(each)
    }
}

fn describe_key(key: &dyn Reflect) -> String {
    Literal::from_value(key.value()).map_or_else(|| format!("{:?}", key.value()), |lit| lit.to_string())
}

/// Applies `inner` to every key of a map.
pub fn map_key(inner: Validator) -> Validator {
    MapEach::build(MapPart::Key, inner)
}

/// Applies `inner` to every value of a map.
pub fn map_value(inner: Validator) -> Validator {
    MapEach::build(MapPart::Value, inner)
}

/// Applies `inner` to every key/value pair of a map, seen as [`Value::Entry`].
pub fn map_key_value(inner: Validator) -> Validator {
    MapEach::build(MapPart::Entry, inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(rule: &str, pass: bool, calls: &Arc<AtomicUsize>) -> Validator {
        let calls = Arc::clone(calls);
        Validator::from_fn(rule, move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            if pass {
                Ok(())
            } else {
                Err(ValidationError::new("probe", "probe failed"))
            }
        })
    }

    fn below(limit: i64) -> Validator {
        Validator::from_fn(format!("below({limit})"), move |_, value| match value.as_f64() {
            Some(n) if n < limit as f64 => Ok(()),
            _ => Err(ValidationError::greater_than("below", "value", limit)),
        })
    }

    #[test]
    fn test_and_stops_at_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let v = and([counting("a", false, &calls), counting("b", true, &calls)]);
        assert!(v.check(&1).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(v.rule(), "a && b");
    }

    #[test]
    fn test_or_stops_at_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let v = or([counting("a", true, &calls), counting("b", false, &calls)]);
        assert!(v.check(&1).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(v.rule(), "(a || b)");
    }

    #[test]
    fn test_or_reports_last_error() {
        let v = or([below(1), below(2)]);
        let err = v.check(&5).unwrap_err();
        assert_eq!(err.message, "the value is greater than 2");
    }

    #[test]
    fn test_single_and_is_unwrapped() {
        let inner = below(3);
        assert!(Validator::ptr_eq(&and([inner.clone()]), &inner));
    }

    #[test]
    fn test_array_names_failing_index() {
        let v = array(below(3));
        assert!(v.check(&vec![1, 2]).is_ok());
        let err = v.check(&vec![1, 5, 9]).unwrap_err();
        assert_eq!(err.message, "index 1: the value is greater than 3");
        assert_eq!(v.rule(), "array(below(3))");
    }

    #[test]
    fn test_map_parts() {
        let map: BTreeMap<String, i32> = [("a".into(), 1), ("bb".into(), 7)].into();

        let short_keys = map_key(Validator::from_fn("short", |_, v| match v.len() {
            Some(1) => Ok(()),
            _ => Err(ValidationError::new("short", "too long")),
        }));
        assert_eq!(short_keys.check(&map).unwrap_err().message, "key bb: too long");

        let err = map_value(below(5)).check(&map).unwrap_err();
        assert_eq!(err.message, "value of key bb: the value is greater than 5");

        let lengths_match = map_key_value(Validator::from_fn("match", |_, v| match v {
            Value::Entry(k, v) if k.value().len().map(|n| n as f64) == v.value().as_f64() => Ok(()),
            _ => Err(ValidationError::new("match", "length mismatch")),
        }));
        assert_eq!(
            lengths_match.check(&map).unwrap_err().message,
            "entry bb: length mismatch"
        );
        assert_eq!(lengths_match.rule(), "mapkv(match)");
    }

    #[test]
    fn test_container_on_wrong_kind() {
        let err = array(below(1)).check(&5).unwrap_err();
        assert_eq!(err.code, "array");
    }
}
