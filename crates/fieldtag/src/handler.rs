//! Annotation handlers and their registry
//!
//! A [`Handler`] owns one annotation name. The registry parses each distinct
//! annotation value once per handler, caches the parsed argument, and hands
//! it back on every later visit of a field carrying the same annotation.
//!
//! Both the handler table and the argument cache are snapshots behind
//! [`ArcSwap`]: dispatch only loads a pointer, registration publishes a new
//! table.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, trace};

use crate::cache::SnapshotCache;
use crate::error::TagError;
use crate::reflect::FieldInfo;
use crate::tag;
use crate::walk::{Field, FieldPath, Root, Walk, WalkContext};

/// Behavior attached to one annotation name.
///
/// ```rust,ignore
/// use fieldtag::{Field, Handler, TagError, Walk, WalkContext};
///
/// struct Trace;
///
/// impl Handler for Trace {
///     type Arg = String;
///
///     fn parse(&self, value: &str) -> Result<String, TagError> {
///         Ok(value.to_uppercase())
///     }
///
///     fn run(&self, _: &mut WalkContext<'_>, field: &mut Field<'_, '_>, arg: &String)
///         -> Result<Walk, TagError>
///     {
///         tracing::info!(path = field.path(), label = %arg, "visited");
///         Ok(Walk::Continue)
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Parsed form of the annotation value, cached per distinct value.
    type Arg: Send + Sync + 'static;

    /// Parses the unquoted annotation value.
    fn parse(&self, value: &str) -> Result<Self::Arg, TagError>;

    /// Runs against one field. Returning [`Walk::Skip`] keeps the walker out
    /// of the field's contents.
    fn run(
        &self,
        ctx: &mut WalkContext<'_>,
        field: &mut Field<'_, '_>,
        arg: &Self::Arg,
    ) -> Result<Walk, TagError>;
}

type AnyArg = Arc<dyn Any + Send + Sync>;

/// Object-safe face of [`Handler`].
trait DynHandler: Send + Sync {
    fn parse_any(&self, value: &str) -> Result<AnyArg, TagError>;

    fn run_any(
        &self,
        ctx: &mut WalkContext<'_>,
        field: &mut Field<'_, '_>,
        arg: &(dyn Any + Send + Sync),
    ) -> Result<Walk, TagError>;
}

impl<H: Handler> DynHandler for H {
    fn parse_any(&self, value: &str) -> Result<AnyArg, TagError> {
        Ok(Arc::new(self.parse(value)?))
    }

    fn run_any(
        &self,
        ctx: &mut WalkContext<'_>,
        field: &mut Field<'_, '_>,
        arg: &(dyn Any + Send + Sync),
    ) -> Result<Walk, TagError> {
        let arg = arg.downcast_ref::<H::Arg>().ok_or_else(|| {
            TagError::custom(format!(
                "cached argument for `{}` does not match its handler",
                field.info().name
            ))
        })?;
        self.run(ctx, field, arg)
    }
}

/// A parsed annotation value.
#[derive(Clone)]
struct CachedArg {
    unquoted: Arc<str>,
    arg: AnyArg,
}

/// Cache key: annotation name and quoted value. Both point into the static
/// annotation strings of [`FieldInfo`].
type TagKey = (&'static str, &'static str);

/// Maps annotation names to handlers and walks structures with them.
pub struct Registry {
    handlers: ArcSwap<HashMap<String, Arc<dyn DynHandler>>>,
    args: SnapshotCache<TagKey, CachedArg>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            handlers: ArcSwap::from_pointee(HashMap::new()),
            args: SnapshotCache::new(),
        }
    }

    /// Registers `handler` for annotation `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, handler: impl Handler) {
        let name = name.into();
        let handler: Arc<dyn DynHandler> = Arc::new(handler);
        self.handlers.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(name.clone(), Arc::clone(&handler));
            next
        });
        self.forget(&name);
        debug!(name = %name, "registered annotation handler");
    }

    /// Removes the handler for `name`. Returns whether one was registered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut removed = false;
        self.handlers.rcu(|current| {
            let mut next = HashMap::clone(current);
            removed = next.remove(name).is_some();
            next
        });
        self.forget(name);
        debug!(name, removed, "unregistered annotation handler");
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.load().contains_key(name)
    }

    /// Number of cached parsed annotation values.
    pub fn cached_args(&self) -> usize {
        self.args.len()
    }

    /// Drops parsed arguments that belonged to `name`'s previous handler.
    fn forget(&self, name: &str) {
        self.args.retain(|(tag_name, _)| *tag_name != name);
    }

    /// Runs every registered handler named in `info`'s annotation, left to
    /// right. Any handler answering [`Walk::Skip`] makes the verdict `Skip`.
    pub(crate) fn dispatch(
        &self,
        ctx: &mut WalkContext<'_>,
        root: &mut Root<'_>,
        path: &FieldPath,
        info: &'static FieldInfo,
    ) -> Result<Walk, TagError> {
        let handlers = self.handlers.load();
        let mut verdict = Walk::Continue;

        for pair in tag::pairs(info.tag) {
            let Some(handler) = handlers.get(pair.name) else {
                trace!(tag = pair.name, field = info.name, "no handler; ignored");
                continue;
            };

            let cached = self.args.get_or_try_insert_with(&(pair.name, pair.quoted), || {
                let arg = handler.parse_any(&pair.value).map_err(|source| TagError::Parse {
                    tag: pair.name.to_string(),
                    value: pair.value.clone(),
                    source: Box::new(source),
                })?;
                trace!(tag = pair.name, value = %pair.value, "parsed annotation");
                Ok::<_, TagError>(CachedArg {
                    unquoted: pair.value.as_str().into(),
                    arg,
                })
            })?;

            trace!(tag = pair.name, value = %cached.unquoted, path = path.name(), "dispatch");
            let mut field = Field::new(root, path, info);
            if handler.run_any(ctx, &mut field, cached.arg.as_ref())? == Walk::Skip {
                verdict = Walk::Skip;
            }
        }

        Ok(verdict)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.load();
        let mut names: Vec<_> = handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Registry")
            .field("handlers", &names)
            .field("cached_args", &self.args.len())
            .finish()
    }
}
