//! Rule functions and their arguments
//!
//! A [`Function`] turns the arguments of a rule call such as `min(3)` or
//! `oneof("a", "b")` into a [`Validator`]. The typed constructors check
//! arity and argument types, so a builder error names the function and
//! the offending argument instead of failing at validation time.

use std::fmt;
use std::sync::Arc;

use crate::error::BuildError;
use crate::validation::Validator;

/// A resolved rule argument.
#[derive(Debug, Clone)]
pub enum Argument {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Validator(Validator),
}

impl Argument {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "an integer",
            Self::Float(_) => "a float",
            Self::Str(_) => "a string",
            Self::Bool(_) => "a boolean",
            Self::Validator(_) => "a validator",
        }
    }

    /// Integers and floats both read as floats.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(n) => Some(n as f64),
            Self::Float(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_validator(&self) -> Option<&Validator> {
        match self {
            Self::Validator(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Argument {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Argument {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Validator> for Argument {
    fn from(v: Validator) -> Self {
        Self::Validator(v)
    }
}

type BuildFn = dyn Fn(&[Argument]) -> Result<Validator, BuildError> + Send + Sync;

/// A named validator constructor callable from rules.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    build: Arc<BuildFn>,
}

impl Function {
    /// A function taking raw arguments; `build` does its own checking.
    pub fn new<F>(name: &str, build: F) -> Self
    where
        F: Fn(&[Argument]) -> Result<Validator, BuildError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            build: Arc::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self, args: &[Argument]) -> Result<Validator, BuildError> {
        (self.build)(args)
    }

    /// `name` with no arguments, also usable as a bare identifier.
    pub fn nullary<F>(name: &str, make: F) -> Self
    where
        F: Fn() -> Validator + Send + Sync + 'static,
    {
        let function = name.to_string();
        Self::new(name, move |args| {
            check_arity(&function, args, 0)?;
            Ok(make())
        })
    }

    /// `name(n)` with one numeric argument.
    pub fn float<F>(name: &str, make: F) -> Self
    where
        F: Fn(f64) -> Validator + Send + Sync + 'static,
    {
        let function = name.to_string();
        Self::new(name, move |args| {
            check_arity(&function, args, 1)?;
            Ok(make(float_arg(&function, args, 0)?))
        })
    }

    /// `name(a, b)` with two numeric arguments.
    pub fn float2<F>(name: &str, make: F) -> Self
    where
        F: Fn(f64, f64) -> Validator + Send + Sync + 'static,
    {
        let function = name.to_string();
        Self::new(name, move |args| {
            check_arity(&function, args, 2)?;
            Ok(make(float_arg(&function, args, 0)?, float_arg(&function, args, 1)?))
        })
    }

    /// `name(n)` with one integer argument.
    pub fn int<F>(name: &str, make: F) -> Self
    where
        F: Fn(i64) -> Validator + Send + Sync + 'static,
    {
        let function = name.to_string();
        Self::new(name, move |args| {
            check_arity(&function, args, 1)?;
            Ok(make(int_arg(&function, args, 0)?))
        })
    }

    /// `name(a, b, c)` with three integer arguments.
    pub fn int3<F>(name: &str, make: F) -> Self
    where
        F: Fn(i64, i64, i64) -> Validator + Send + Sync + 'static,
    {
        let function = name.to_string();
        Self::new(name, move |args| {
            check_arity(&function, args, 3)?;
            Ok(make(
                int_arg(&function, args, 0)?,
                int_arg(&function, args, 1)?,
                int_arg(&function, args, 2)?,
            ))
        })
    }

    /// `name("s")` with one string argument; `make` may reject it.
    pub fn string<F>(name: &str, make: F) -> Self
    where
        F: Fn(&str) -> Result<Validator, String> + Send + Sync + 'static,
    {
        let function = name.to_string();
        Self::new(name, move |args| {
            check_arity(&function, args, 1)?;
            make(str_arg(&function, args, 0)?).map_err(|message| BuildError::InvalidArgument {
                function: function.clone(),
                message,
            })
        })
    }

    /// `name("a", "b", ...)` with one or more string arguments.
    pub fn strings<F>(name: &str, make: F) -> Self
    where
        F: Fn(Vec<String>) -> Validator + Send + Sync + 'static,
    {
        let function = name.to_string();
        Self::new(name, move |args| {
            check_min_arity(&function, args, 1)?;
            let values = (0..args.len())
                .map(|i| str_arg(&function, args, i).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(make(values))
        })
    }

    /// `name(v, ...)` with one or more validator arguments.
    pub fn validators<F>(name: &str, make: F) -> Self
    where
        F: Fn(Vec<Validator>) -> Validator + Send + Sync + 'static,
    {
        let function = name.to_string();
        Self::new(name, move |args| {
            check_min_arity(&function, args, 1)?;
            let validators = (0..args.len())
                .map(|i| validator_arg(&function, args, i).cloned())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(make(validators))
        })
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}

// ============================================================================
// ARGUMENT CHECKS
// ============================================================================

pub fn check_arity(function: &str, args: &[Argument], expected: usize) -> Result<(), BuildError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(BuildError::Arity {
            function: function.to_string(),
            expected: expected.to_string(),
            found: args.len(),
        })
    }
}

pub fn check_min_arity(function: &str, args: &[Argument], min: usize) -> Result<(), BuildError> {
    if args.len() >= min {
        Ok(())
    } else {
        Err(BuildError::Arity {
            function: function.to_string(),
            expected: format!("at least {min}"),
            found: args.len(),
        })
    }
}

/// The argument at `index`, or an arity error when there are fewer.
fn arg_at<'a>(function: &str, args: &'a [Argument], index: usize) -> Result<&'a Argument, BuildError> {
    args.get(index).ok_or_else(|| BuildError::Arity {
        function: function.to_string(),
        expected: format!("at least {}", index + 1),
        found: args.len(),
    })
}

fn type_error(function: &str, index: usize, expected: &'static str, arg: &Argument) -> BuildError {
    BuildError::ArgumentType {
        function: function.to_string(),
        index,
        expected,
        found: arg.type_name(),
    }
}

pub fn float_arg(function: &str, args: &[Argument], index: usize) -> Result<f64, BuildError> {
    let arg = arg_at(function, args, index)?;
    arg.as_f64().ok_or_else(|| type_error(function, index, "a number", arg))
}

pub fn int_arg(function: &str, args: &[Argument], index: usize) -> Result<i64, BuildError> {
    let arg = arg_at(function, args, index)?;
    arg.as_i64().ok_or_else(|| type_error(function, index, "an integer", arg))
}

pub fn str_arg<'a>(function: &str, args: &'a [Argument], index: usize) -> Result<&'a str, BuildError> {
    let arg = arg_at(function, args, index)?;
    arg.as_str().ok_or_else(|| type_error(function, index, "a string", arg))
}

pub fn validator_arg<'a>(
    function: &str,
    args: &'a [Argument],
    index: usize,
) -> Result<&'a Validator, BuildError> {
    let arg = arg_at(function, args, index)?;
    arg.as_validator().ok_or_else(|| type_error(function, index, "a validator", arg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::builtin;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_float_accepts_integers() {
        let min = Function::float("min", builtin::min);
        assert_eq!(min.build(&[Argument::Int(3)]).unwrap().rule(), "min(3)");
        assert_eq!(min.build(&[Argument::Float(2.5)]).unwrap().rule(), "min(2.5)");
    }

    #[test]
    fn test_type_and_arity_errors() {
        let min = Function::float("min", builtin::min);
        let err = min.build(&[Argument::Str("3".into())]).unwrap_err();
        assert_eq!(
            err,
            BuildError::ArgumentType {
                function: "min".into(),
                index: 0,
                expected: "a number",
                found: "a string",
            }
        );
        assert_eq!(min.build(&[]).unwrap_err().code(), "RULE:ARITY");

        let len = Function::int("len", builtin::len);
        assert_eq!(
            len.build(&[Argument::Float(1.5)]).unwrap_err().code(),
            "RULE:ARG_TYPE"
        );
    }

    #[test]
    fn test_missing_argument_is_an_arity_error() {
        let between = Function::new("between", |args| {
            let lo = float_arg("between", args, 0)?;
            let hi = float_arg("between", args, 1)?;
            Ok(crate::validation::and([builtin::min(lo), builtin::max(hi)]))
        });
        assert_eq!(
            between.build(&[Argument::Int(1)]).unwrap_err(),
            BuildError::Arity {
                function: "between".into(),
                expected: "at least 2".into(),
                found: 1,
            }
        );
        assert_eq!(str_arg("label", &[], 0).unwrap_err().code(), "RULE:ARITY");
        assert_eq!(validator_arg("not", &[], 0).unwrap_err().code(), "RULE:ARITY");
    }

    #[test]
    fn test_strings_are_variadic() {
        let oneof = Function::strings("oneof", builtin::oneof);
        let v = oneof.build(&["a".into(), "b".into()]).unwrap();
        assert_eq!(v.rule(), r#"oneof("a", "b")"#);
        assert_eq!(oneof.build(&[]).unwrap_err().code(), "RULE:ARITY");
    }
}
