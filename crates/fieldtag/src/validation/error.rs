//! Validation failures
//!
//! A [`ValidationError`] describes why one value failed one rule.
//! [`NamedErrors`] collects the failures of a whole structure walk, keyed by
//! the dotted path of the offending field.
//!
//! All codes use `Cow<'static, str>` so the built-in validators never
//! allocate for them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// Why a value failed a rule.
///
/// ```rust,ignore
/// use fieldtag::validation::ValidationError;
///
/// let error = ValidationError::new("min", "the length is less than 3")
///     .with_param("min", "3");
/// assert_eq!(error.to_string(), "the length is less than 3");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Stable code for programmatic handling, e.g. `"min"` or `"oneof"`.
    pub code: Cow<'static, str>,

    /// Human-readable message.
    pub message: String,

    /// Parameters the message was rendered from (typically 0-2).
    pub params: SmallVec<[(Cow<'static, str>, String); 2]>,

    /// Failures of a nested structure, keyed by path relative to the value.
    pub fields: Option<Box<NamedErrors>>,
}

impl ValidationError {
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            params: SmallVec::new(),
            fields: None,
        }
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_param(mut self, key: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Wraps the failures found inside a nested structure.
    pub fn nested(fields: NamedErrors) -> Self {
        Self {
            code: Cow::Borrowed("structure"),
            message: fields.to_string(),
            params: SmallVec::new(),
            fields: Some(Box::new(fields)),
        }
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_str())
    }

    /// Prefixes the message (and every nested path) with a location.
    ///
    /// `at("index 2")` turns `"the value is less than 3"` into
    /// `"index 2: the value is less than 3"`. Nested fields are re-keyed
    /// under `segment` instead, so they still flatten into field paths.
    #[must_use]
    pub fn at(mut self, label: impl fmt::Display, segment: &str) -> Self {
        match self.fields.take() {
            Some(fields) => {
                let fields = (*fields).prefixed(segment);
                self.message = fields.to_string();
                self.fields = Some(Box::new(fields));
            }
            None => self.message = format!("{label}: {}", self.message),
        }
        self
    }

    /// Value below a lower bound. `measure` is `"length"` or `"value"`.
    pub fn less_than(code: &'static str, measure: &str, bound: impl fmt::Display) -> Self {
        Self::new(code, format!("the {measure} is less than {bound}")).with_param(code, bound)
    }

    /// Value above an upper bound. `measure` is `"length"` or `"value"`.
    pub fn greater_than(code: &'static str, measure: &str, bound: impl fmt::Display) -> Self {
        Self::new(code, format!("the {measure} is greater than {bound}")).with_param(code, bound)
    }

    /// The validator does not apply to this kind of value.
    pub fn unsupported(code: &'static str, kind: impl fmt::Display) -> Self {
        Self::new(code, format!("{code} does not apply to a value of kind {kind}"))
            .with_param("kind", kind)
    }

    pub fn invalid_format(code: &'static str, expected: &str) -> Self {
        Self::new(code, format!("the value is not a valid {expected}"))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// NAMED ERRORS
// ============================================================================

/// Validation failures keyed by field path, in path order.
///
/// Inserting a second failure for the same path replaces the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedErrors {
    errors: BTreeMap<String, ValidationError>,
}

impl NamedErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, error: ValidationError) {
        self.errors.insert(path.into(), error);
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ValidationError> {
        self.errors.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.errors.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationError)> {
        self.errors.iter().map(|(path, error)| (path.as_str(), error))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Re-keys every entry under `prefix`.
    #[must_use]
    pub fn prefixed(self, prefix: &str) -> Self {
        Self {
            errors: self
                .errors
                .into_iter()
                .map(|(path, error)| (join_path(prefix, &path), error))
                .collect(),
        }
    }

    /// Records `error` at `path`, flattening any nested structure failures
    /// into paths below it.
    pub fn record(&mut self, path: &str, error: ValidationError) {
        match error.fields {
            Some(fields) => {
                for (nested, error) in fields.errors {
                    self.errors.insert(join_path(path, &nested), error);
                }
            }
            None => {
                self.errors.insert(path.to_string(), error);
            }
        }
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl IntoIterator for NamedErrors {
    type Item = (String, ValidationError);
    type IntoIter = std::collections::btree_map::IntoIter<String, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for NamedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, error)) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{path}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for NamedErrors {}

/// Joins a field path and a relative path, omitting the dot before `[`.
fn join_path(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        prefix.to_string()
    } else if rest.starts_with('[') {
        format!("{prefix}{rest}")
    } else {
        format!("{prefix}.{rest}")
    }
}

// ============================================================================
// SELF VALIDATION
// ============================================================================

/// A structure's own validation method, run after its fields pass.
///
/// Derived structures opt in with `#[reflect(self_validate)]`.
pub trait SelfValidate {
    fn validate(&self) -> Result<(), ValidationError>;
}
