//! `inject`
//!
//! Fills fields from providers registered by name on the handler.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::TagError;
use crate::handler::Handler;
use crate::reflect::Literal;
use crate::walk::{Field, Walk, WalkContext};

type Provider = Arc<dyn Fn() -> Literal + Send + Sync>;

/// Sets fields from named providers: `inject:"hostname"`.
///
/// ```rust,ignore
/// let inject = InjectHandler::new().provide("hostname", || Literal::Str(hostname()));
/// fieldtag::register("inject", inject);
/// ```
///
/// An annotation naming an unknown provider fails to parse.
#[derive(Clone, Default)]
pub struct InjectHandler {
    providers: HashMap<String, Provider>,
}

impl InjectHandler {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn provide<F>(mut self, key: impl Into<String>, provider: F) -> Self
    where
        F: Fn() -> Literal + Send + Sync + 'static,
    {
        self.providers.insert(key.into(), Arc::new(provider));
        self
    }
}

impl fmt::Debug for InjectHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.providers.keys().collect();
        keys.sort_unstable();
        f.debug_struct("InjectHandler").field("providers", &keys).finish()
    }
}

impl Handler for InjectHandler {
    type Arg = Provider;

    fn parse(&self, value: &str) -> Result<Provider, TagError> {
        self.providers
            .get(value)
            .cloned()
            .ok_or_else(|| TagError::custom(format!("no provider named {value:?}")))
    }

    fn run(&self, _: &mut WalkContext<'_>, field: &mut Field<'_, '_>, provider: &Provider) -> Result<Walk, TagError> {
        field.set(provider())?;
        Ok(Walk::Continue)
    }
}
