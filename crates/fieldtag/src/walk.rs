//! Structure walker
//!
//! The walker visits every exported field of a structure in declaration
//! order, dispatches the field's annotations to the registered handlers,
//! then descends into nested structures, pointers to structures, and
//! sequence elements that are structures.
//!
//! Fields are addressed by a [`FieldPath`] of steps from the root rather
//! than by long-lived references. A handler gets a [`Field`] cursor and
//! resolves the path when it reads or writes, so it can look at any other
//! part of the root in between.

use std::fmt::Write as _;

use tracing::trace;

use crate::engine::Engine;
use crate::error::TagError;
use crate::handler::Registry;
use crate::reflect::{FieldInfo, Literal, Reflect, Value, ValueMut};
use crate::tag;
use crate::validation::{NamedErrors, ValidationError};

/// A handler's verdict on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Descend into the field's contents.
    Continue,
    /// Leave the field's contents alone.
    Skip,
}

// ============================================================================
// PATHS
// ============================================================================

/// One step from a value to a value inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Field(usize),
    Index(usize),
    Deref,
}

/// Location of a field below the root: steps plus display name.
///
/// The display name is dotted, with sequence elements as `Items[3]`;
/// pointer steps add nothing to it.
#[derive(Debug, Clone, Default)]
pub struct FieldPath {
    steps: Vec<Step>,
    name: String,
    marks: Vec<usize>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Display name, e.g. `Server.Listeners[0].Port`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push_field(&mut self, index: usize, segment: &str) {
        self.marks.push(self.name.len());
        if !self.name.is_empty() {
            self.name.push('.');
        }
        self.name.push_str(segment);
        self.steps.push(Step::Field(index));
    }

    pub fn push_index(&mut self, index: usize) {
        self.marks.push(self.name.len());
        let _ = write!(self.name, "[{index}]");
        self.steps.push(Step::Index(index));
    }

    pub fn push_deref(&mut self) {
        self.marks.push(self.name.len());
        self.steps.push(Step::Deref);
    }

    pub fn pop(&mut self) {
        self.steps.pop();
        if let Some(mark) = self.marks.pop() {
            self.name.truncate(mark);
        }
    }
}

/// Follows `steps` from `root`.
pub fn resolve<'v>(root: Value<'v>, steps: &[Step]) -> Option<Value<'v>> {
    let mut current = root;
    for step in steps {
        current = match (*step, current) {
            (Step::Field(index), Value::Struct(s)) => s.field(index)?.value(),
            (Step::Index(index), Value::Seq(seq)) => seq.get(index)?.value(),
            (Step::Deref, Value::Pointer(inner)) => inner.value(),
            _ => return None,
        };
    }
    Some(current)
}

/// Follows `steps` from `root`, mutably.
pub fn resolve_mut<'v>(root: &'v mut dyn Reflect, steps: &[Step]) -> Option<&'v mut dyn Reflect> {
    let mut current = root;
    for step in steps {
        current = match (*step, current.value_mut()) {
            (Step::Field(index), ValueMut::Struct(s)) => s.field_mut(index)?,
            (Step::Index(index), ValueMut::Seq(seq)) => seq.get_mut(index)?,
            (Step::Deref, ValueMut::Pointer(inner)) => inner,
            _ => return None,
        };
    }
    Some(current)
}

// ============================================================================
// ROOT AND FIELD CURSOR
// ============================================================================

/// The top-level value of a walk.
pub enum Root<'a> {
    /// Walked through a shared reference; handlers can read but not set.
    Shared(Value<'a>),
    /// Walked through an exclusive reference; handlers can set fields.
    Exclusive(&'a mut dyn Reflect),
}

impl Root<'_> {
    pub fn value(&self) -> Value<'_> {
        match self {
            Self::Shared(value) => *value,
            Self::Exclusive(value) => value.value(),
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut dyn Reflect> {
        match self {
            Self::Shared(_) => None,
            Self::Exclusive(value) => Some(&mut **value),
        }
    }
}

/// A handler's handle on the field it runs against.
pub struct Field<'w, 'r> {
    root: &'w mut Root<'r>,
    path: &'w FieldPath,
    info: &'static FieldInfo,
}

impl<'w, 'r> Field<'w, 'r> {
    pub(crate) fn new(root: &'w mut Root<'r>, path: &'w FieldPath, info: &'static FieldInfo) -> Self {
        Self { root, path, info }
    }

    pub fn info(&self) -> &'static FieldInfo {
        self.info
    }

    /// Display path of the field, e.g. `Server.Port`.
    pub fn path(&self) -> &str {
        self.path.name()
    }

    /// The value this walk started from.
    pub fn root(&self) -> Value<'_> {
        self.root.value()
    }

    /// Whether the walk can modify this field.
    pub fn is_settable(&self) -> bool {
        matches!(self.root, Root::Exclusive(_))
    }

    pub fn value(&self) -> Result<Value<'_>, TagError> {
        resolve(self.root.value(), self.path.steps()).ok_or_else(|| TagError::Unresolved {
            path: self.path.name().to_string(),
        })
    }

    pub fn value_mut(&mut self) -> Result<&mut dyn Reflect, TagError> {
        let path = self.path;
        let root = self.root.value_mut().ok_or_else(|| TagError::Unsettable {
            path: path.name().to_string(),
        })?;
        resolve_mut(root, path.steps()).ok_or_else(|| TagError::Unresolved {
            path: path.name().to_string(),
        })
    }

    /// Assigns `literal`, coercing it to the field's type.
    pub fn set(&mut self, literal: Literal) -> Result<(), TagError> {
        let path = self.path;
        self.value_mut()?.set(literal).map_err(|source| TagError::Set {
            path: path.name().to_string(),
            source,
        })
    }
}

// ============================================================================
// WALK CONTEXT
// ============================================================================

/// State shared by all handlers during one walk.
pub struct WalkContext<'e> {
    engine: &'e Engine,
    root: Option<Value<'e>>,
    failures: NamedErrors,
    recorded: usize,
    self_validate: bool,
}

impl<'e> WalkContext<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            root: None,
            failures: NamedErrors::new(),
            recorded: 0,
            self_validate: false,
        }
    }

    /// Runs each nested structure's own validation after its fields pass.
    #[must_use]
    pub fn with_self_validation(mut self, enabled: bool) -> Self {
        self.self_validate = enabled;
        self
    }

    /// Walks below `root`, the outermost value of an enclosing validation.
    #[must_use]
    pub fn with_root(mut self, root: Value<'e>) -> Self {
        self.root = Some(root);
        self
    }

    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// The outermost value of an enclosing validation, when this walk
    /// covers a structure nested inside it.
    ///
    /// [`Field::root`] is the value this walk started from.
    pub fn root(&self) -> Option<Value<'e>> {
        self.root
    }

    /// Records a non-fatal failure at `path`, flattening nested failures.
    pub fn record(&mut self, path: &str, error: ValidationError) {
        self.recorded += 1;
        self.failures.record(path, error);
    }

    pub fn failures(&self) -> &NamedErrors {
        &self.failures
    }

    pub fn into_failures(self) -> NamedErrors {
        self.failures
    }

    fn display_segment(&self, info: &FieldInfo) -> String {
        self.engine
            .config()
            .name_tag
            .as_deref()
            .and_then(|name_tag| info.lookup(name_tag))
            .and_then(|value| tag::display_name(&value).map(str::to_string))
            .unwrap_or_else(|| info.name.to_string())
    }
}

// ============================================================================
// WALKER
// ============================================================================

#[derive(Clone, Copy)]
enum Shape {
    Struct,
    Pointer,
    Seq(usize),
}

impl Registry {
    /// Walks `value` with every registered handler. Handlers cannot set fields.
    pub fn walk(&self, ctx: &mut WalkContext<'_>, value: &dyn Reflect) -> Result<(), TagError> {
        self.walk_value(ctx, value.value())
    }

    /// Walks an already-borrowed view.
    pub fn walk_value(&self, ctx: &mut WalkContext<'_>, value: Value<'_>) -> Result<(), TagError> {
        self.descend(ctx, &mut Root::Shared(value), &mut FieldPath::new())
    }

    /// Walks `value` with every registered handler, letting them set fields.
    pub fn walk_mut(&self, ctx: &mut WalkContext<'_>, value: &mut dyn Reflect) -> Result<(), TagError> {
        self.descend(ctx, &mut Root::Exclusive(value), &mut FieldPath::new())
    }

    fn descend(
        &self,
        ctx: &mut WalkContext<'_>,
        root: &mut Root<'_>,
        path: &mut FieldPath,
    ) -> Result<(), TagError> {
        let shape = match resolve(root.value(), path.steps()) {
            Some(Value::Struct(_)) => Shape::Struct,
            Some(Value::Pointer(_)) => Shape::Pointer,
            Some(Value::Seq(seq)) => Shape::Seq(seq.len()),
            _ => return Ok(()),
        };

        match shape {
            Shape::Struct => {
                let before = ctx.recorded;
                self.walk_fields(ctx, root, path)?;
                if ctx.self_validate && !path.name().is_empty() && ctx.recorded == before {
                    self_validate(ctx, root, path);
                }
            }
            Shape::Pointer => {
                path.push_deref();
                self.descend(ctx, root, path)?;
                path.pop();
            }
            Shape::Seq(len) => {
                for index in 0..len {
                    path.push_index(index);
                    let is_struct = matches!(
                        resolve(root.value(), path.steps()).map(Value::indirect),
                        Some(Value::Struct(_))
                    );
                    if is_struct {
                        self.descend(ctx, root, path)?;
                    }
                    path.pop();
                }
            }
        }
        Ok(())
    }

    fn walk_fields(
        &self,
        ctx: &mut WalkContext<'_>,
        root: &mut Root<'_>,
        path: &mut FieldPath,
    ) -> Result<(), TagError> {
        let fields = match resolve(root.value(), path.steps()) {
            Some(Value::Struct(s)) => s.fields(),
            _ => return Ok(()),
        };

        for (index, info) in fields.iter().enumerate() {
            if !info.exported {
                trace!(field = info.name, "unexported field skipped");
                continue;
            }

            path.push_field(index, &ctx.display_segment(info));
            if self.dispatch(ctx, root, path, info)? == Walk::Continue {
                self.descend(ctx, root, path)?;
            }
            path.pop();
        }
        Ok(())
    }
}

fn self_validate(ctx: &mut WalkContext<'_>, root: &Root<'_>, path: &FieldPath) {
    if let Some(Value::Struct(s)) = resolve(root.value(), path.steps())
        && let Some(Err(error)) = s.self_validate()
    {
        ctx.record(path.name(), error);
    }
}
