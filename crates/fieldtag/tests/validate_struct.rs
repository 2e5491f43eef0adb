//! Struct validation through `#[derive(Reflect)]` types.

use std::collections::BTreeMap;

use fieldtag::{
    BuildError, Config, Engine, Error, Reflect, SelfValidate, Struct, TagError, ValidationError,
    Validator, Value,
};
use fieldtag::validation::{Context, Function};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[derive(Reflect, Default)]
struct Profile {
    #[tag(r#"validate:"zero || (min==3 && max==10)""#)]
    pub nick: String,
    #[tag(r#"validate:"oneof(\"a\", \"b\")""#)]
    pub grade: String,
    #[tag(r#"doc:"free text" validate:"min(0)""#)]
    pub age: i32,
}

fn profile(nick: &str, grade: &str) -> Profile {
    Profile {
        nick: nick.into(),
        grade: grade.into(),
        age: 1,
    }
}

fn failures(err: &Error) -> Vec<(String, String)> {
    err.as_fields()
        .expect("field failures")
        .iter()
        .map(|(path, error)| (path.to_string(), error.message.clone()))
        .collect()
}

#[rstest]
#[case("", None)]
#[case("abc", None)]
#[case("abcdefghij", None)]
#[case("ab", Some("the length is less than 3"))]
#[case("abcdefghijk", Some("the length is greater than 10"))]
fn test_zero_or_bounded_length(#[case] nick: &str, #[case] expected: Option<&str>) {
    let result = fieldtag::validate_struct(&profile(nick, "a"));
    match expected {
        None => assert!(result.is_ok(), "{nick:?}: {result:?}"),
        Some(message) => {
            let err = result.unwrap_err();
            assert_eq!(failures(&err), vec![("nick".to_string(), message.to_string())]);
        }
    }
}

#[test]
fn test_oneof_lists_allowed_values() {
    let err = fieldtag::validate_struct(&profile("", "c")).unwrap_err();
    assert_eq!(err.to_string(), "grade: the value is not one of [a b]");
    assert!(err.is_validation());
}

#[test]
fn test_failures_are_path_ordered() {
    let mut p = profile("ab", "z");
    p.age = -4;
    let err = fieldtag::validate_struct(&p).unwrap_err();
    let paths: Vec<String> = failures(&err).into_iter().map(|(path, _)| path).collect();
    assert_eq!(paths, vec!["age", "grade", "nick"]);
}

// ----------------------------------------------------------------------------
// Nesting
// ----------------------------------------------------------------------------

#[derive(Reflect, Default)]
struct Inner {
    #[tag(r#"validate:"min(1)""#)]
    pub f: i32,
}

#[derive(Reflect, Default)]
struct Outer {
    pub f2: Inner,
    pub boxed: Option<Box<Inner>>,
    #[tag(r#"walk:"-""#)]
    pub hidden: Inner,
    #[allow(dead_code)]
    private: Inner,
}

fn good_inner() -> Inner {
    Inner { f: 1 }
}

#[test]
fn test_nested_path_is_dotted() {
    let outer = Outer {
        f2: Inner { f: 0 },
        boxed: Some(Box::new(Inner { f: 0 })),
        hidden: good_inner(),
        private: good_inner(),
    };
    let err = fieldtag::validate_struct(&outer).unwrap_err();
    assert_eq!(
        failures(&err),
        vec![
            ("boxed.f".to_string(), "the value is less than 1".to_string()),
            ("f2.f".to_string(), "the value is less than 1".to_string()),
        ]
    );
}

#[test]
fn test_walk_dash_and_unexported_fields_are_skipped() {
    let outer = Outer {
        f2: good_inner(),
        boxed: None,
        hidden: Inner { f: 0 },
        private: Inner { f: 0 },
    };
    assert!(fieldtag::validate_struct(&outer).is_ok());
}

#[derive(Reflect, Default)]
struct Listener {
    #[tag(r#"json:"port,omitempty" validate:"min(1) && max(65535)""#)]
    pub port: u32,
    #[tag(r#"json:"-" validate:"required""#)]
    pub host: String,
}

#[derive(Reflect, Default)]
struct Server {
    #[tag(r#"json:"listeners""#)]
    pub items: Vec<Listener>,
}

#[test]
fn test_sequence_elements_use_json_names() {
    let server = Server {
        items: vec![
            Listener {
                port: 80,
                host: "a".into(),
            },
            Listener {
                port: 70000,
                host: String::new(),
            },
        ],
    };
    let err = fieldtag::validate_struct(&server).unwrap_err();
    assert_eq!(
        failures(&err),
        vec![
            ("listeners[1].host".to_string(), "the value is required".to_string()),
            ("listeners[1].port".to_string(), "the value is greater than 65535".to_string()),
        ]
    );
}

#[test]
fn test_name_tag_can_be_disabled() {
    let engine = Engine::new(Config {
        name_tag: None,
        ..Config::default()
    });
    let server = Server {
        items: vec![Listener {
            port: 0,
            host: "a".into(),
        }],
    };
    let err = engine.validate_struct(&server).unwrap_err();
    assert!(err.as_fields().unwrap().contains("items[0].port"));
}

// ----------------------------------------------------------------------------
// Self-validation and `structure`
// ----------------------------------------------------------------------------

#[derive(Reflect)]
#[reflect(self_validate)]
struct Range {
    #[tag(r#"validate:"min(0)""#)]
    pub lo: i32,
    pub hi: i32,
}

impl SelfValidate for Range {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.lo > self.hi {
            return Err(ValidationError::new("range", "lo exceeds hi"));
        }
        Ok(())
    }
}

#[derive(Reflect)]
struct Window {
    pub range: Range,
}

#[derive(Reflect)]
struct Checked {
    #[tag(r#"validate:"structure""#)]
    pub range: Range,
    #[tag(r#"validate:"array(structure)""#)]
    pub more: Vec<Range>,
}

#[test]
fn test_nested_self_validation_runs_after_fields_pass() {
    let err = fieldtag::validate_struct(&Window {
        range: Range { lo: 5, hi: 1 },
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "range: lo exceeds hi");

    let err = fieldtag::validate_struct(&Window {
        range: Range { lo: -1, hi: -5 },
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "range.lo: the value is less than 0");
}

#[test]
fn test_root_is_not_self_validated() {
    assert!(fieldtag::validate_struct(&Range { lo: 5, hi: 1 }).is_ok());
}

#[test]
fn test_self_validation_can_be_disabled() {
    let engine = Engine::new(Config {
        self_validate: false,
        ..Config::default()
    });
    let window = Window {
        range: Range { lo: 5, hi: 1 },
    };
    assert!(engine.validate_struct(&window).is_ok());
}

#[test]
fn test_structure_rule_flattens_nested_failures() {
    let checked = Checked {
        range: Range { lo: -1, hi: 0 },
        more: vec![Range { lo: 0, hi: 1 }, Range { lo: 3, hi: 2 }],
    };
    let err = fieldtag::validate_struct(&checked).unwrap_err();
    assert_eq!(
        failures(&err),
        vec![
            ("more".to_string(), "index 1: lo exceeds hi".to_string()),
            ("range.lo".to_string(), "the value is less than 0".to_string()),
        ]
    );
}

#[derive(Reflect, Default)]
#[allow(non_snake_case)]
struct Tens {
    #[tag(r#"validate:"min(10)""#)]
    pub F: i64,
}

#[derive(Reflect, Default)]
#[allow(non_snake_case)]
struct Pair {
    pub F1: String,
    #[tag(r#"validate:"structure""#)]
    pub F2: Tens,
}

#[test]
fn test_structure_reports_leaf_path() {
    let err = fieldtag::validate_struct(&Pair::default()).unwrap_err();
    assert_eq!(
        failures(&err),
        vec![("F2.F".to_string(), "the value is less than 10".to_string())]
    );
}

// ----------------------------------------------------------------------------
// Maps and custom functions
// ----------------------------------------------------------------------------

#[derive(Reflect)]
struct Quotas {
    #[tag(r#"validate:"mapk(min(2)) && mapv(min(1))""#)]
    pub limits: BTreeMap<String, i64>,
}

#[test]
fn test_map_rules_name_the_key() {
    let quotas = Quotas {
        limits: BTreeMap::from([("cpu".to_string(), 4), ("mem".to_string(), 0)]),
    };
    let err = fieldtag::validate_struct(&quotas).unwrap_err();
    assert_eq!(err.to_string(), "limits: value of key mem: the value is less than 1");

    let quotas = Quotas {
        limits: BTreeMap::from([("x".to_string(), 4)]),
    };
    let err = fieldtag::validate_struct(&quotas).unwrap_err();
    assert_eq!(err.to_string(), "limits: key x: the length is less than 2");
}

#[derive(Reflect)]
struct Batch {
    #[tag(r#"validate:"even && max(limit)""#)]
    pub size: u32,
}

#[test]
fn test_registered_functions_and_symbols() {
    let engine = Engine::default();
    engine.register_function(Function::nullary("even", || {
        Validator::from_fn("even", |_, value| match value.as_f64() {
            Some(n) if n % 2.0 == 0.0 => Ok(()),
            _ => Err(ValidationError::new("even", "the value is odd")),
        })
    }));
    engine.register_symbol("limit", 10i64);

    assert!(engine.validate_struct(&Batch { size: 4 }).is_ok());
    assert_eq!(
        engine.validate_struct(&Batch { size: 3 }).unwrap_err().to_string(),
        "size: the value is odd"
    );
    assert_eq!(
        engine.validate_struct(&Batch { size: 12 }).unwrap_err().to_string(),
        "size: the value is greater than 10"
    );
}

#[derive(Reflect)]
struct Usage {
    #[tag(r#"validate:"within_limit""#)]
    pub used: i64,
}

#[derive(Reflect)]
struct Account {
    pub limit: i64,
    #[tag(r#"validate:"structure""#)]
    pub usage: Usage,
    #[tag(r#"validate:"array(structure)""#)]
    pub history: Vec<Usage>,
}

/// Reads `limit` from the outermost structure being validated.
fn root_limit(ctx: &Context<'_>) -> Option<f64> {
    let Some(Value::Struct(s)) = ctx.root() else {
        return None;
    };
    let index = s.fields().iter().position(|info| info.name == "limit")?;
    s.field(index)?.value().as_f64()
}

#[test]
fn test_structure_keeps_the_outer_root() {
    let engine = Engine::default();
    engine.register_function(Function::nullary("within_limit", || {
        Validator::from_fn("within_limit", |ctx, value| match (root_limit(ctx), value.as_f64()) {
            (Some(limit), Some(n)) if n <= limit => Ok(()),
            (Some(_), Some(_)) => Err(ValidationError::new("within_limit", "over the limit")),
            _ => Err(ValidationError::new("within_limit", "no limit in scope")),
        })
    }));

    let account = Account {
        limit: 5,
        usage: Usage { used: 3 },
        history: vec![Usage { used: 5 }, Usage { used: 6 }],
    };
    assert_eq!(
        failures(&engine.validate_struct(&account).unwrap_err()),
        vec![("history[1].used".to_string(), "over the limit".to_string())]
    );

    let account = Account {
        limit: 2,
        usage: Usage { used: 3 },
        history: Vec::new(),
    };
    assert_eq!(
        failures(&engine.validate_struct(&account).unwrap_err()),
        vec![("usage.used".to_string(), "over the limit".to_string())]
    );
}

// ----------------------------------------------------------------------------
// Fatal errors and caching
// ----------------------------------------------------------------------------

#[derive(Reflect, Default)]
struct BadRule {
    #[tag(r#"validate:"len(\"three\")""#)]
    pub name: String,
}

#[derive(Reflect, Default)]
struct BadQuote {
    #[tag(r#"validate:"min(1)"#)]
    pub name: String,
}

#[test]
fn test_string_for_int_argument_is_fatal() {
    let err = fieldtag::validate_struct(&BadRule::default()).unwrap_err();
    assert!(!err.is_validation());
    let Error::Tag(tag) = &err else {
        panic!("expected a tag error, got {err:?}");
    };
    assert_eq!(tag.code(), "TAG:PARSE");
    assert!(matches!(
        tag.root_cause(),
        TagError::Rule(BuildError::ArgumentType { index: 0, .. })
    ));
}

#[derive(Reflect, Default)]
struct BadEscape {
    #[tag(r#"note:"a\qb" validate:"min(1)""#)]
    pub n: i32,
}

#[test]
fn test_bad_escape_ends_the_annotation() {
    // `n` is 0, so `min(1)` would fail if it were still dispatched.
    let engine = Engine::default();
    assert!(engine.validate_struct(&BadEscape::default()).is_ok());
    assert_eq!(engine.registry().cached_args(), 0);
    assert_eq!(Struct::fields(&BadEscape::default())[0].lookup("validate"), None);
}

#[test]
fn test_unterminated_annotation_is_not_dispatched() {
    // The pair parser stops at the malformed value, so no handler runs.
    assert!(fieldtag::validate_struct(&BadQuote::default()).is_ok());
}

#[test]
fn test_rules_and_annotations_are_cached() {
    let engine = Engine::default();
    let first = engine.rules().build("min(1) && max(5)").unwrap();
    let second = engine.rules().build("min(1) && max(5)").unwrap();
    assert!(Validator::ptr_eq(&first, &second));
    assert_eq!(engine.rules().parse_count(), 1);

    let p = profile("abc", "a");
    assert!(engine.walk(&p).unwrap().is_empty());
    let parses = engine.rules().parse_count();
    let cached = engine.registry().cached_args();
    assert_eq!(cached, 3);

    engine.walk(&p).unwrap();
    engine.validate_struct(&profile("", "b")).unwrap();
    assert_eq!(engine.rules().parse_count(), parses);
    assert_eq!(engine.registry().cached_args(), cached);
}

#[test]
fn test_validate_single_value() {
    assert!(fieldtag::validate(&"user@example.com", "email").is_ok());
    let err = fieldtag::validate(&7u8, "min(10)").unwrap_err();
    assert_eq!(err.as_invalid().unwrap().message, "the value is less than 10");
    assert!(matches!(
        fieldtag::validate(&7u8, "min(").unwrap_err(),
        Error::Tag(TagError::Rule(BuildError::Syntax(_)))
    ));
}
