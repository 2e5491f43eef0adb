//! Built-in rule functions
//!
//! | Rule | Checks |
//! |------|--------|
//! | `zero` / `required` | the value is / is not the zero value of its type |
//! | `min(n)` / `max(n)` | length of strings, sequences and maps; otherwise the number |
//! | `ranger(a, b)` | `a <= x <= b`, measured like `min`/`max` |
//! | `len(n)` | exact length |
//! | `oneof("a", ...)` | scalar is one of the listed values |
//! | `exp(base, start, end)` | integer is `base^k` for some `start <= k <= end` |
//! | `ip`, `ipv4`, `ipv6`, `cidr`, `mac` | network address formats |
//! | `email`, `url`, `duration`, `regexp("re")` | string formats |
//! | `structure` | validates the fields of a nested structure |
//! | `array(v)`, `mapk(v)`, `mapv(v)`, `mapkv(v)` | apply `v` to elements, keys, values, entries |

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;

use crate::reflect::{Literal, Value};
use crate::validation::function::Function;
use crate::validation::{ValidationError, Validator, and, array, map_key, map_key_value, map_value};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

static MAC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[0-9A-Fa-f]{2}(?:[:-][0-9A-Fa-f]{2}){5}|[0-9A-Fa-f]{2}(?:[:-][0-9A-Fa-f]{2}){7}|[0-9A-Fa-f]{4}(?:\.[0-9A-Fa-f]{4}){2,3})$",
    )
    .expect("mac pattern compiles")
});

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:0|(?:(?:\d+\.?\d*|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+)$")
        .expect("duration pattern compiles")
});

/// Every built-in function, as registered by a new rule builder.
pub fn functions() -> Vec<Function> {
    vec![
        Function::nullary("zero", zero),
        Function::nullary("required", required),
        Function::float("min", min),
        Function::float("max", max),
        Function::float2("ranger", ranger),
        Function::int("len", len),
        Function::strings("oneof", oneof),
        Function::int3("exp", exp),
        Function::nullary("ip", ip),
        Function::nullary("ipv4", ipv4),
        Function::nullary("ipv6", ipv6),
        Function::nullary("cidr", cidr),
        Function::nullary("mac", mac),
        Function::nullary("email", email),
        Function::nullary("url", url),
        Function::nullary("duration", duration),
        Function::string("regexp", |pattern| regexp(pattern).map_err(|err| err.to_string())),
        Function::nullary("structure", structure),
        Function::validators("array", |vs| array(and(vs))),
        Function::validators("mapk", |vs| map_key(and(vs))),
        Function::validators("mapv", |vs| map_value(and(vs))),
        Function::validators("mapkv", |vs| map_key_value(and(vs))),
    ]
}

// ============================================================================
// PRESENCE
// ============================================================================

pub fn zero() -> Validator {
    Validator::from_fn("zero", |_, value| {
        if value.is_zero() {
            Ok(())
        } else {
            Err(ValidationError::new("zero", "the value is not zero"))
        }
    })
}

pub fn required() -> Validator {
    Validator::from_fn("required", |_, value| {
        if value.is_zero() {
            Err(ValidationError::new("required", "the value is required"))
        } else {
            Ok(())
        }
    })
}

// ============================================================================
// BOUNDS
// ============================================================================

/// What `min`/`max` compare: a length for strings and containers,
/// the number itself otherwise.
fn measure(code: &'static str, value: Value<'_>) -> Result<(f64, &'static str), ValidationError> {
    if let Some(len) = value.len() {
        return Ok((len as f64, "length"));
    }
    value
        .as_f64()
        .map(|n| (n, "value"))
        .ok_or_else(|| ValidationError::unsupported(code, value.indirect().kind()))
}

pub fn min(bound: f64) -> Validator {
    Validator::from_fn(format!("min({bound})"), move |_, value| {
        let (actual, measured) = measure("min", value)?;
        if actual < bound {
            return Err(ValidationError::less_than("min", measured, bound));
        }
        Ok(())
    })
}

pub fn max(bound: f64) -> Validator {
    Validator::from_fn(format!("max({bound})"), move |_, value| {
        let (actual, measured) = measure("max", value)?;
        if actual > bound {
            return Err(ValidationError::greater_than("max", measured, bound));
        }
        Ok(())
    })
}

/// Inclusive range, measured like `min`/`max`.
pub fn ranger(low: f64, high: f64) -> Validator {
    Validator::from_fn(format!("ranger({low}, {high})"), move |_, value| {
        let (actual, measured) = measure("ranger", value)?;
        if actual < low {
            return Err(ValidationError::less_than("ranger", measured, low));
        }
        if actual > high {
            return Err(ValidationError::greater_than("ranger", measured, high));
        }
        Ok(())
    })
}

pub fn len(expected: i64) -> Validator {
    Validator::from_fn(format!("len({expected})"), move |_, value| {
        let actual = value
            .len()
            .ok_or_else(|| ValidationError::unsupported("len", value.indirect().kind()))?;
        if i64::try_from(actual).ok() != Some(expected) {
            return Err(
                ValidationError::new("len", format!("the length is not equal to {expected}"))
                    .with_param("len", expected)
                    .with_param("actual", actual),
            );
        }
        Ok(())
    })
}

// ============================================================================
// ENUMERATION
// ============================================================================

pub fn oneof(allowed: Vec<String>) -> Validator {
    let quoted: Vec<String> = allowed.iter().map(|s| format!("{s:?}")).collect();
    let rule = format!("oneof({})", quoted.join(", "));
    let listing = format!("[{}]", allowed.join(" "));

    Validator::from_fn(rule, move |_, value| {
        let literal = Literal::from_value(value)
            .ok_or_else(|| ValidationError::unsupported("oneof", value.indirect().kind()))?;
        let text = literal.to_string();
        if allowed.iter().any(|candidate| *candidate == text) {
            return Ok(());
        }
        Err(
            ValidationError::new("oneof", format!("the value is not one of {listing}"))
                .with_param("oneof", &listing),
        )
    })
}

/// Integer equal to `base^k` for some `start <= k <= end`.
pub fn exp(base: i64, start: i64, end: i64) -> Validator {
    Validator::from_fn(format!("exp({base}, {start}, {end})"), move |_, value| {
        let fail = || {
            ValidationError::new(
                "exp",
                format!("the value is not a power of {base} between {base}^{start} and {base}^{end}"),
            )
            .with_param("base", base)
        };
        let actual = match value.indirect() {
            Value::Int(n) => i128::from(n),
            Value::Uint(n) => i128::from(n),
            other => return Err(ValidationError::unsupported("exp", other.kind())),
        };
        let found = (start.max(0)..=end.min(128)).any(|k| {
            u32::try_from(k)
                .ok()
                .and_then(|k| i128::from(base).checked_pow(k))
                .is_some_and(|power| power == actual)
        });
        if found { Ok(()) } else { Err(fail()) }
    })
}

// ============================================================================
// STRING FORMATS
// ============================================================================

/// A string check; other kinds fail as unsupported.
fn string_check(code: &'static str, expected: &'static str, is_valid: fn(&str) -> bool) -> Validator {
    Validator::from_fn(code, move |_, value| {
        let text = value
            .as_str()
            .ok_or_else(|| ValidationError::unsupported(code, value.indirect().kind()))?;
        if is_valid(text) {
            Ok(())
        } else {
            Err(ValidationError::invalid_format(code, expected))
        }
    })
}

pub fn ip() -> Validator {
    string_check("ip", "IP address", |s| s.parse::<IpAddr>().is_ok())
}

pub fn ipv4() -> Validator {
    string_check("ipv4", "IPv4 address", |s| s.parse::<Ipv4Addr>().is_ok())
}

pub fn ipv6() -> Validator {
    string_check("ipv6", "IPv6 address", |s| s.parse::<Ipv6Addr>().is_ok())
}

pub fn cidr() -> Validator {
    string_check("cidr", "CIDR block", is_cidr)
}

fn is_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}

pub fn mac() -> Validator {
    string_check("mac", "MAC address", |s| MAC_REGEX.is_match(s))
}

pub fn email() -> Validator {
    string_check("email", "email address", |s| EMAIL_REGEX.is_match(s))
}

/// An absolute URL with a host.
pub fn url() -> Validator {
    string_check("url", "URL", |s| url::Url::parse(s).is_ok_and(|u| u.has_host()))
}

/// A duration such as `300ms`, `1.5h` or `2h45m`.
pub fn duration() -> Validator {
    string_check("duration", "duration", |s| DURATION_REGEX.is_match(s))
}

pub fn regexp(pattern: &str) -> Result<Validator, regex::Error> {
    let regex = Regex::new(pattern)?;
    let rule = format!("regexp({pattern:?})");
    Ok(Validator::from_fn(rule, move |_, value| {
        let text = value
            .as_str()
            .ok_or_else(|| ValidationError::unsupported("regexp", value.indirect().kind()))?;
        if regex.is_match(text) {
            Ok(())
        } else {
            Err(
                ValidationError::new("regexp", format!("the value does not match {}", regex.as_str()))
                    .with_param("regexp", regex.as_str()),
            )
        }
    }))
}

// ============================================================================
// NESTED STRUCTURES
// ============================================================================

/// Validates the annotated fields of a nested structure.
///
/// Failures come back as one error carrying the nested [`NamedErrors`],
/// which the struct driver flattens into paths below the field.
///
/// [`NamedErrors`]: crate::validation::NamedErrors
pub fn structure() -> Validator {
    Validator::descending_fn("structure", |ctx, value| {
        ctx.engine().validate_nested(ctx.root(), value)
    })
}
