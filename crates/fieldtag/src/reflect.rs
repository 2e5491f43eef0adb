//! Runtime reflection over structured values
//!
//! Every walkable value implements [`Reflect`], which exposes a tagged view
//! ([`Value`]) over scalars, structures, pointers, sequences and maps. Structures
//! are usually reflected by `#[derive(Reflect)]`, which records each field's
//! name, annotation string and visibility in a static [`FieldInfo`] table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tag;
use crate::validation::ValidationError;

// ============================================================================
// CORE TRAITS
// ============================================================================

/// A value the engine can inspect and, through an exclusive borrow, modify.
pub trait Reflect: std::any::Any + Send + Sync {
    /// Returns a read-only view of this value.
    fn value(&self) -> Value<'_>;

    /// Returns a mutable view used to reach nested values.
    ///
    /// Scalars have nothing to descend into and return [`ValueMut::Leaf`].
    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Leaf
    }

    /// Assigns a literal, coercing it to this value's type.
    fn set(&mut self, literal: Literal) -> Result<(), SetError> {
        let _ = literal;
        Err(SetError::Unsupported {
            kind: self.value().kind(),
        })
    }
}

/// A structure with a fixed, statically described list of fields.
pub trait Struct: Send + Sync {
    /// The Rust type name, used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Static metadata for every field, in declaration order.
    fn fields(&self) -> &'static [FieldInfo];

    /// The field at `index`.
    fn field(&self, index: usize) -> Option<&dyn Reflect>;

    /// The field at `index`, mutably.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Runs the type's own validation method, if it exposes one.
    fn self_validate(&self) -> Option<Result<(), ValidationError>> {
        None
    }
}

/// An indexable sequence of values.
pub trait Seq: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect>;

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;
}

/// An associative container. Iteration order is unspecified.
pub trait Map: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;
}

/// Static metadata for one structure field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    /// The Rust field name.
    pub name: &'static str,
    /// The raw annotation string, e.g. `validate:"min(1)" default:"1"`.
    pub tag: &'static str,
    /// Whether the field is `pub`; other fields are never dispatched.
    pub exported: bool,
}

impl FieldInfo {
    pub const fn new(name: &'static str, tag: &'static str, exported: bool) -> Self {
        Self {
            name,
            tag,
            exported,
        }
    }

    /// Looks up the unquoted value of annotation `key`.
    ///
    /// Returns `None` when the key is absent or sits after a malformed entry.
    pub fn lookup(&self, key: &str) -> Option<String> {
        tag::pairs(self.tag)
            .find(|pair| pair.name == key)
            .map(|pair| pair.value)
    }
}

// ============================================================================
// VIEWS
// ============================================================================

/// Read-only view of a reflected value.
#[derive(Clone, Copy)]
pub enum Value<'a> {
    /// An absent pointer (`None`).
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'a str),
    Struct(&'a dyn Struct),
    Seq(&'a dyn Seq),
    Map(&'a dyn Map),
    /// A present pointer (`Some`, `Box`) to another value.
    Pointer(&'a dyn Reflect),
    /// One key/value pair of a map, as seen by entry validators.
    Entry(&'a dyn Reflect, &'a dyn Reflect),
}

/// Mutable view used to navigate into nested values.
pub enum ValueMut<'a> {
    Struct(&'a mut dyn Struct),
    Seq(&'a mut dyn Seq),
    Pointer(&'a mut dyn Reflect),
    /// Nothing to descend into.
    Leaf,
}

/// The shape of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Struct,
    Seq,
    Map,
    Pointer,
    Entry,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Str => "string",
            Self::Struct => "struct",
            Self::Seq => "sequence",
            Self::Map => "map",
            Self::Pointer => "pointer",
            Self::Entry => "entry",
        })
    }
}

impl<'a> Value<'a> {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Uint(_) => Kind::Uint,
            Self::Float(_) => Kind::Float,
            Self::Str(_) => Kind::Str,
            Self::Struct(_) => Kind::Struct,
            Self::Seq(_) => Kind::Seq,
            Self::Map(_) => Kind::Map,
            Self::Pointer(_) => Kind::Pointer,
            Self::Entry(..) => Kind::Entry,
        }
    }

    /// Follows pointers until reaching a non-pointer value.
    pub fn indirect(self) -> Value<'a> {
        let mut current = self;
        while let Value::Pointer(inner) = current {
            current = inner.value();
        }
        current
    }

    /// Whether this is the zero value of its type.
    pub fn is_zero(&self) -> bool {
        match *self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(n) => n == 0,
            Self::Uint(n) => n == 0,
            Self::Float(n) => n == 0.0,
            Self::Str(s) => s.is_empty(),
            Self::Seq(seq) => seq.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::Pointer(_) | Self::Entry(..) => false,
            Self::Struct(s) => (0..s.fields().len())
                .all(|index| s.field(index).is_none_or(|field| field.value().is_zero())),
        }
    }

    /// Length of a string (in chars), sequence or map, after following pointers.
    pub fn len(&self) -> Option<usize> {
        match self.indirect() {
            Self::Str(s) => Some(s.chars().count()),
            Self::Seq(seq) => Some(seq.len()),
            Self::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Numeric value as `f64`, after following pointers.
    pub fn as_f64(&self) -> Option<f64> {
        match self.indirect() {
            Self::Int(n) => Some(n as f64),
            Self::Uint(n) => Some(n as f64),
            Self::Float(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self.indirect() {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(n) => write!(f, "Int({n})"),
            Self::Uint(n) => write!(f, "Uint({n})"),
            Self::Float(n) => write!(f, "Float({n})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Struct(s) => write!(f, "Struct({})", s.type_name()),
            Self::Seq(seq) => write!(f, "Seq(len={})", seq.len()),
            Self::Map(map) => write!(f, "Map(len={})", map.len()),
            Self::Pointer(inner) => f.debug_tuple("Pointer").field(&inner.value()).finish(),
            Self::Entry(key, value) => f
                .debug_tuple("Entry")
                .field(&key.value())
                .field(&value.value())
                .finish(),
        }
    }
}

// ============================================================================
// LITERALS
// ============================================================================

/// An owned scalar, used for assignment and for rule arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
}

impl Literal {
    /// Copies a scalar out of a view, following pointers.
    ///
    /// Returns `None` for structures, sequences and maps.
    pub fn from_value(value: Value<'_>) -> Option<Self> {
        Some(match value.indirect() {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Int(n) => Self::Int(n),
            Value::Uint(n) => Self::Uint(n),
            Value::Float(n) => Self::Float(n),
            Value::Str(s) => Self::Str(s.to_string()),
            Value::Struct(_)
            | Value::Seq(_)
            | Value::Map(_)
            | Value::Pointer(_)
            | Value::Entry(..) => return None,
        })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Failure to assign a [`Literal`] to a reflected value.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetError {
    #[error("cannot assign to a value of kind {kind}")]
    Unsupported { kind: Kind },

    #[error("cannot convert {literal:?} to {target}")]
    Mismatch { literal: Literal, target: &'static str },

    #[error("{literal} overflows {target}")]
    Overflow { literal: Literal, target: &'static str },
}

/// Parses a boolean the way annotation values spell them.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

// ============================================================================
// SCALAR IMPLEMENTATIONS
// ============================================================================

impl Reflect for bool {
    fn value(&self) -> Value<'_> {
        Value::Bool(*self)
    }

    fn set(&mut self, literal: Literal) -> Result<(), SetError> {
        *self = match &literal {
            Literal::Bool(b) => *b,
            Literal::Int(n) => *n != 0,
            Literal::Uint(n) => *n != 0,
            Literal::Str(s) => parse_bool(s).ok_or_else(|| mismatch(&literal, "bool"))?,
            _ => return Err(mismatch(&literal, "bool")),
        };
        Ok(())
    }
}

fn mismatch(literal: &Literal, target: &'static str) -> SetError {
    SetError::Mismatch {
        literal: literal.clone(),
        target,
    }
}

fn overflow(literal: &Literal, target: &'static str) -> SetError {
    SetError::Overflow {
        literal: literal.clone(),
        target,
    }
}

/// Converts a literal into an integer type, rejecting lossy conversions.
fn literal_to_int<T>(literal: &Literal, target: &'static str) -> Result<T, SetError>
where
    T: TryFrom<i64> + TryFrom<u64> + std::str::FromStr,
{
    match literal {
        Literal::Int(n) => T::try_from(*n).map_err(|_| overflow(literal, target)),
        Literal::Uint(n) => T::try_from(*n).map_err(|_| overflow(literal, target)),
        Literal::Float(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
            T::try_from(*n as i64).map_err(|_| overflow(literal, target))
        }
        Literal::Str(s) => s.trim().parse().map_err(|_| mismatch(literal, target)),
        _ => Err(mismatch(literal, target)),
    }
}

macro_rules! impl_reflect_int {
    ($variant:ident as $wide:ty: $($ty:ty),+) => {$(
        impl Reflect for $ty {
            fn value(&self) -> Value<'_> {
                Value::$variant(*self as $wide)
            }

            fn set(&mut self, literal: Literal) -> Result<(), SetError> {
                *self = literal_to_int(&literal, stringify!($ty))?;
                Ok(())
            }
        }
    )+};
}

impl_reflect_int!(Int as i64: i8, i16, i32, i64, isize);
impl_reflect_int!(Uint as u64: u8, u16, u32, u64, usize);

macro_rules! impl_reflect_float {
    ($($ty:ty),+) => {$(
        impl Reflect for $ty {
            fn value(&self) -> Value<'_> {
                Value::Float(*self as f64)
            }

            fn set(&mut self, literal: Literal) -> Result<(), SetError> {
                *self = match &literal {
                    Literal::Int(n) => *n as $ty,
                    Literal::Uint(n) => *n as $ty,
                    Literal::Float(n) => *n as $ty,
                    Literal::Str(s) => s
                        .trim()
                        .parse()
                        .map_err(|_| mismatch(&literal, stringify!($ty)))?,
                    _ => return Err(mismatch(&literal, stringify!($ty))),
                };
                Ok(())
            }
        }
    )+};
}

impl_reflect_float!(f32, f64);

impl Reflect for String {
    fn value(&self) -> Value<'_> {
        Value::Str(self)
    }

    fn set(&mut self, literal: Literal) -> Result<(), SetError> {
        match literal {
            Literal::Null => Err(mismatch(&literal, "String")),
            Literal::Str(s) => {
                *self = s;
                Ok(())
            }
            other => {
                *self = other.to_string();
                Ok(())
            }
        }
    }
}

impl Reflect for &'static str {
    fn value(&self) -> Value<'_> {
        Value::Str(self)
    }
}

// ============================================================================
// POINTERS
// ============================================================================

impl<T: Reflect + Default> Reflect for Option<T> {
    fn value(&self) -> Value<'_> {
        match self {
            Some(inner) => Value::Pointer(inner),
            None => Value::Null,
        }
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        match self {
            Some(inner) => ValueMut::Pointer(inner),
            None => ValueMut::Leaf,
        }
    }

    fn set(&mut self, literal: Literal) -> Result<(), SetError> {
        if literal == Literal::Null {
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).set(literal)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn value(&self) -> Value<'_> {
        Value::Pointer(&**self)
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Pointer(&mut **self)
    }

    fn set(&mut self, literal: Literal) -> Result<(), SetError> {
        (**self).set(literal)
    }
}

// ============================================================================
// SEQUENCES
// ============================================================================

impl<T: Reflect> Seq for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|item| item as &dyn Reflect)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|item| item as &mut dyn Reflect)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn value(&self) -> Value<'_> {
        Value::Seq(self)
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Seq(self)
    }
}

impl<T: Reflect, const N: usize> Seq for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|item| item as &dyn Reflect)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|item| item as &mut dyn Reflect)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn value(&self) -> Value<'_> {
        Value::Seq(self)
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Seq(self)
    }
}

// ============================================================================
// MAPS
// ============================================================================

impl<K: Reflect + Eq + Hash, V: Reflect> Map for HashMap<K, V> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)),
        )
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn value(&self) -> Value<'_> {
        Value::Map(self)
    }
}

impl<K: Reflect + Ord, V: Reflect> Map for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)),
        )
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn value(&self) -> Value<'_> {
        Value::Map(self)
    }
}

// ============================================================================
// JSON
// ============================================================================

#[cfg(feature = "json")]
mod json {
    use super::{Literal, Map, Reflect, SetError, Value, ValueMut};
    use serde_json::Value as Json;

    impl Map for serde_json::Map<String, Json> {
        fn len(&self) -> usize {
            serde_json::Map::len(self)
        }

        fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
            Box::new(
                self.iter()
                    .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)),
            )
        }
    }

    impl Reflect for Json {
        fn value(&self) -> Value<'_> {
            match self {
                Json::Null => Value::Null,
                Json::Bool(b) => Value::Bool(*b),
                Json::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Value::Int(i)
                    } else if let Some(u) = n.as_u64() {
                        Value::Uint(u)
                    } else {
                        Value::Float(n.as_f64().unwrap_or(f64::NAN))
                    }
                }
                Json::String(s) => Value::Str(s),
                Json::Array(items) => Value::Seq(items),
                Json::Object(map) => Value::Map(map),
            }
        }

        fn value_mut(&mut self) -> ValueMut<'_> {
            match self {
                Json::Array(items) => ValueMut::Seq(items),
                _ => ValueMut::Leaf,
            }
        }

        fn set(&mut self, literal: Literal) -> Result<(), SetError> {
            *self = match literal {
                Literal::Null => Json::Null,
                Literal::Bool(b) => Json::Bool(b),
                Literal::Int(n) => Json::from(n),
                Literal::Uint(n) => Json::from(n),
                Literal::Float(n) => Json::from(n),
                Literal::Str(s) => Json::String(s),
            };
            Ok(())
        }
    }
}
