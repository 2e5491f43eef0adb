//! Rule compilation and caching
//!
//! [`RuleBuilder`] turns rule text such as `zero || (min==3 && max==10)`
//! into a [`Validator`] by replaying the parsed expression through
//! [`fieldtag_expression::Builder`]. Identifiers resolve against a function
//! table first, then a symbol table. Every distinct rule string is compiled
//! once; later builds return the same shared validator.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use fieldtag_expression::{Arg, Builder};
use tracing::{debug, trace};

use crate::cache::SnapshotCache;
use crate::error::BuildError;
use crate::validation::builtin;
use crate::validation::function::{Argument, Function};
use crate::validation::{Validator, and, or};

/// Validators collected at one level of a rule expression.
#[derive(Debug, Default)]
pub struct BuildContext {
    validators: Vec<Validator>,
}

impl BuildContext {
    /// One validator for everything collected: the single item, or their
    /// conjunction.
    pub fn into_validator(self) -> Validator {
        and(self.validators)
    }
}

/// Compiles rule text into validators, with a per-rule cache.
pub struct RuleBuilder {
    functions: ArcSwap<HashMap<String, Function>>,
    symbols: ArcSwap<HashMap<String, Argument>>,
    rules: SnapshotCache<String, Validator>,
    parses: AtomicUsize,
}

impl RuleBuilder {
    /// A builder with no functions or symbols.
    pub fn empty() -> Self {
        Self {
            functions: ArcSwap::from_pointee(HashMap::new()),
            symbols: ArcSwap::from_pointee(HashMap::new()),
            rules: SnapshotCache::new(),
            parses: AtomicUsize::new(0),
        }
    }

    /// A builder with every built-in function registered.
    pub fn new() -> Self {
        let builder = Self::empty();
        builder.functions.store(Arc::new(
            builtin::functions()
                .into_iter()
                .map(|f| (f.name().to_string(), f))
                .collect(),
        ));
        builder
    }

    /// Registers `function` under its name, replacing any previous one.
    ///
    /// Rules already compiled keep the function they were built with.
    pub fn register_function(&self, function: Function) {
        let name = function.name().to_string();
        self.functions.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(name.clone(), function.clone());
            next
        });
        debug!(name = %name, "registered rule function");
    }

    /// Registers a named constant usable as an argument, or as a rule when
    /// it holds a validator.
    pub fn register_symbol(&self, name: impl Into<String>, value: impl Into<Argument>) {
        let name = name.into();
        let value = value.into();
        self.symbols.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(name.clone(), value.clone());
            next
        });
        debug!(name = %name, "registered rule symbol");
    }

    pub fn function(&self, name: &str) -> Option<Function> {
        self.functions.load().get(name).cloned()
    }

    pub fn symbol(&self, name: &str) -> Option<Argument> {
        self.symbols.load().get(name).cloned()
    }

    /// Compiles `rule`, or returns the validator compiled for it before.
    pub fn build(&self, rule: &str) -> Result<Validator, BuildError> {
        if let Some(validator) = self.rules.get(rule) {
            return Ok(validator);
        }
        self.rules
            .get_or_try_insert_with(&rule.to_string(), || self.compile(rule))
    }

    /// Number of times rule text has been parsed, for cache diagnostics.
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::Relaxed)
    }

    /// Number of cached rules.
    pub fn cached_rules(&self) -> usize {
        self.rules.len()
    }

    fn compile(&self, rule: &str) -> Result<Validator, BuildError> {
        self.parses.fetch_add(1, Ordering::Relaxed);
        let ctx = fieldtag_expression::parse(rule, self)?;
        let validator = ctx.into_validator();
        trace!(rule, compiled = validator.rule(), "compiled rule");
        Ok(validator)
    }

    /// A bare identifier: a function called with no arguments, else a symbol.
    fn resolve_ident(&self, name: &str) -> Result<Argument, BuildError> {
        if let Some(function) = self.function(name) {
            return function.build(&[]).map(Argument::Validator);
        }
        self.symbol(name).ok_or_else(|| BuildError::Unknown {
            name: name.to_string(),
        })
    }

    fn lower(&self, arg: Arg<BuildContext>) -> Result<Argument, BuildError> {
        Ok(match arg {
            Arg::Integer(n) => Argument::Int(n),
            Arg::Float(n) => Argument::Float(n),
            Arg::String(s) => Argument::Str(s),
            Arg::Boolean(b) => Argument::Bool(b),
            Arg::Ident(name) => self.resolve_ident(&name)?,
            Arg::Context(ctx) => Argument::Validator(ctx.into_validator()),
        })
    }
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("functions", &self.functions.load().len())
            .field("symbols", &self.symbols.load().len())
            .field("cached_rules", &self.rules.len())
            .finish()
    }
}

impl Builder for RuleBuilder {
    type Context = BuildContext;
    type Error = BuildError;

    fn new_context(&self) -> BuildContext {
        BuildContext::default()
    }

    fn and(&self, ctx: &mut BuildContext, sub: BuildContext) -> Result<(), BuildError> {
        ctx.validators.push(and(sub.validators));
        Ok(())
    }

    fn or(&self, ctx: &mut BuildContext, sub: BuildContext) -> Result<(), BuildError> {
        ctx.validators.push(or(sub.validators));
        Ok(())
    }

    fn ident(&self, ctx: &mut BuildContext, name: &str) -> Result<(), BuildError> {
        match self.resolve_ident(name)? {
            Argument::Validator(validator) => {
                ctx.validators.push(validator);
                Ok(())
            }
            _ => Err(BuildError::NotAValidator {
                name: name.to_string(),
            }),
        }
    }

    fn call(
        &self,
        ctx: &mut BuildContext,
        name: &str,
        args: Vec<Arg<BuildContext>>,
    ) -> Result<(), BuildError> {
        let function = self.function(name).ok_or_else(|| BuildError::Unknown {
            name: name.to_string(),
        })?;
        let args = args
            .into_iter()
            .map(|arg| self.lower(arg))
            .collect::<Result<Vec<_>, _>>()?;
        ctx.validators.push(function.build(&args)?);
        Ok(())
    }
}
