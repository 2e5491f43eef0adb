//! The engine and its process-wide instance
//!
//! An [`Engine`] bundles a [`Config`], a [`RuleBuilder`] and two handler
//! registries:
//!
//! - the full registry (`validate`, `walk`, `default`, `set` and anything
//!   registered later), used by [`Engine::walk`] and [`Engine::walk_mut`];
//! - the validation registry (`validate` and `walk` only), used by
//!   [`Engine::validate_struct`].
//!
//! The free functions at the crate root operate on [`global()`].
//! Registration is meant for start-up, before validation traffic begins.

use std::sync::{Arc, LazyLock};

use tracing::debug;

use crate::config::Config;
use crate::error::TagError;
use crate::handler::{Handler, Registry};
use crate::handlers::{DefaultHandler, SetHandler, WalkControl};
use crate::reflect::Reflect;
use crate::validation::{Argument, Function, NamedErrors, RuleBuilder, ValidateHandler};
use crate::walk::WalkContext;

static GLOBAL: LazyLock<Engine> = LazyLock::new(Engine::default);

/// The process-wide engine behind the crate-level functions.
pub fn global() -> &'static Engine {
    &GLOBAL
}

/// Handler registries, rule builder and configuration.
pub struct Engine {
    config: Config,
    rules: Arc<RuleBuilder>,
    registry: Registry,
    validation: Registry,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let rules = Arc::new(RuleBuilder::new());

        let registry = Registry::new();
        registry.register(&config.validate_tag, ValidateHandler::new(Arc::clone(&rules)));
        registry.register(&config.walk_tag, WalkControl);
        registry.register("default", DefaultHandler);
        registry.register("set", SetHandler);

        let validation = Registry::new();
        validation.register(&config.validate_tag, ValidateHandler::new(Arc::clone(&rules)));
        validation.register(&config.walk_tag, WalkControl);

        debug!(?config, "engine initialized");
        Self {
            config,
            rules,
            registry,
            validation,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleBuilder {
        &self.rules
    }

    /// The registry used by [`Engine::walk`] and [`Engine::walk_mut`].
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn validation_registry(&self) -> &Registry {
        &self.validation
    }

    /// Registers `handler` for annotation `name`; the last registration wins.
    pub fn register(&self, name: &str, handler: impl Handler) {
        self.registry.register(name, handler);
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.registry.unregister(name)
    }

    pub fn register_function(&self, function: Function) {
        self.rules.register_function(function);
    }

    pub fn register_symbol(&self, name: &str, value: impl Into<Argument>) {
        self.rules.register_symbol(name, value);
    }

    /// Walks `value` with every handler of the full registry.
    ///
    /// Returns the validation failures recorded on the way. Handlers that
    /// need to set a field fail with [`TagError::Unsettable`].
    pub fn walk(&self, value: &dyn Reflect) -> Result<NamedErrors, TagError> {
        let mut ctx = WalkContext::new(self).with_self_validation(self.config.self_validate);
        self.registry.walk(&mut ctx, value)?;
        Ok(ctx.into_failures())
    }

    /// Walks `value` with every handler of the full registry, letting
    /// `default`, `set` and custom handlers assign fields.
    pub fn walk_mut(&self, value: &mut dyn Reflect) -> Result<NamedErrors, TagError> {
        let mut ctx = WalkContext::new(self).with_self_validation(self.config.self_validate);
        self.registry.walk_mut(&mut ctx, value)?;
        Ok(ctx.into_failures())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
