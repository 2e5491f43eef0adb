//! Assignment and custom handlers.

use std::sync::Arc;
use std::thread;

use fieldtag::handlers::InjectHandler;
use fieldtag::{Engine, Field, Handler, Literal, Reflect, SetError, TagError, Walk, WalkContext};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

#[derive(Reflect, Default, Debug, PartialEq)]
struct Limits {
    #[tag(r#"default:"8080""#)]
    pub port: u16,
    #[tag(r#"default:".primary""#)]
    pub fallback: u16,
    #[tag(r#"set:"true""#)]
    pub enabled: bool,
    #[tag(r#"default:"0.5""#)]
    pub ratio: Option<f64>,
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Settings {
    pub primary: u16,
    pub limits: Limits,
    #[tag(r#"default:"info""#)]
    pub level: String,
}

#[test]
fn test_defaults_fill_zero_fields() {
    let engine = Engine::default();
    let mut settings = Settings {
        primary: 9000,
        ..Settings::default()
    };
    let failures = engine.walk_mut(&mut settings).unwrap();
    assert!(failures.is_empty());
    assert_eq!(
        settings,
        Settings {
            primary: 9000,
            limits: Limits {
                port: 8080,
                fallback: 9000,
                enabled: true,
                ratio: Some(0.5),
            },
            level: "info".into(),
        }
    );
}

#[test]
fn test_defaults_keep_non_zero_fields() {
    let engine = Engine::default();
    let mut settings = Settings {
        primary: 1,
        limits: Limits {
            port: 7,
            fallback: 2,
            enabled: false,
            ratio: Some(0.0),
        },
        level: "debug".into(),
    };
    engine.walk_mut(&mut settings).unwrap();
    assert_eq!(settings.limits.port, 7);
    assert_eq!(settings.limits.fallback, 2);
    assert_eq!(settings.limits.ratio, Some(0.0));
    assert_eq!(settings.level, "debug");
    // `set` is unconditional.
    assert!(settings.limits.enabled);
}

#[test]
fn test_shared_walk_cannot_set() {
    let engine = Engine::default();
    let settings = Settings::default();
    let err = engine.walk(&settings).unwrap_err();
    assert!(matches!(&err, TagError::Unsettable { path } if path == "limits.port"));
}

#[derive(Reflect, Default)]
struct Narrow {
    #[tag(r#"default:"300""#)]
    pub small: u8,
}

#[test]
fn test_unrepresentable_default_is_fatal() {
    let engine = Engine::default();
    let err = engine.walk_mut(&mut Narrow::default()).unwrap_err();
    match err {
        TagError::Set { path, source } => {
            assert_eq!(path, "small");
            assert!(matches!(source, SetError::Mismatch { target: "u8", .. }));
        }
        other => panic!("expected a set error, got {other:?}"),
    }
}

#[derive(Reflect, Default)]
struct Host {
    #[tag(r#"inject:"hostname" validate:"min(1)""#)]
    pub name: String,
    #[tag(r#"inject:"cores""#)]
    pub cores: u32,
}

#[test]
fn test_inject_runs_before_validate() {
    let engine = Engine::default();
    engine.register(
        "inject",
        InjectHandler::new()
            .provide("hostname", || Literal::Str("node-1".into()))
            .provide("cores", || Literal::Uint(8)),
    );

    let mut host = Host::default();
    let failures = engine.walk_mut(&mut host).unwrap();
    assert!(failures.is_empty());
    assert_eq!(host.name, "node-1");
    assert_eq!(host.cores, 8);
}

#[test]
fn test_inject_unknown_provider_is_fatal() {
    let engine = Engine::default();
    engine.register("inject", InjectHandler::new().provide("hostname", || Literal::Str("node-1".into())));

    let err = engine.walk_mut(&mut Host::default()).unwrap_err();
    assert_eq!(err.code(), "TAG:PARSE");
    assert_eq!(err.root_cause().to_string(), "no provider named \"cores\"");
}

// ----------------------------------------------------------------------------
// Custom handlers
// ----------------------------------------------------------------------------

/// Records `label@path` for every visited field.
struct Audit {
    seen: Arc<Mutex<Vec<String>>>,
    skip: bool,
}

impl Handler for Audit {
    type Arg = String;

    fn parse(&self, value: &str) -> Result<String, TagError> {
        if value.is_empty() {
            return Err(TagError::custom("empty audit label"));
        }
        Ok(value.to_uppercase())
    }

    fn run(
        &self,
        _: &mut WalkContext<'_>,
        field: &mut Field<'_, '_>,
        label: &String,
    ) -> Result<Walk, TagError> {
        self.seen.lock().push(format!("{label}@{}", field.path()));
        Ok(if self.skip { Walk::Skip } else { Walk::Continue })
    }
}

#[derive(Reflect, Default)]
struct Leaf {
    #[tag(r#"audit:"leaf" validate:"min(1)""#)]
    pub n: i32,
}

#[derive(Reflect, Default)]
struct Tree {
    #[tag(r#"audit:"branch""#)]
    pub left: Leaf,
    pub right: Vec<Leaf>,
}

fn tree() -> Tree {
    Tree {
        left: Leaf { n: 0 },
        right: vec![Leaf { n: 1 }, Leaf { n: 2 }],
    }
}

#[test]
fn test_custom_handler_visits_in_order() {
    let engine = Engine::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    engine.register("audit", Audit {
        seen: Arc::clone(&seen),
        skip: false,
    });

    let failures = engine.walk(&tree()).unwrap();
    assert_eq!(
        *seen.lock(),
        vec!["BRANCH@left", "LEAF@left.n", "LEAF@right[0].n", "LEAF@right[1].n"]
    );
    assert_eq!(failures.to_string(), "left.n: the value is less than 1");
}

#[test]
fn test_skip_verdict_and_reregistration() {
    let engine = Engine::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    engine.register("audit", Audit {
        seen: Arc::clone(&seen),
        skip: false,
    });
    engine.walk(&tree()).unwrap();
    assert!(engine.registry().cached_args() > 0);

    seen.lock().clear();
    engine.register("audit", Audit {
        seen: Arc::clone(&seen),
        skip: true,
    });
    let failures = engine.walk(&tree()).unwrap();
    // `left` is skipped, so its leaf never runs and never fails.
    assert_eq!(*seen.lock(), vec!["BRANCH@left", "LEAF@right[0].n", "LEAF@right[1].n"]);
    assert!(failures.is_empty());

    assert!(engine.unregister("audit"));
    assert!(!engine.unregister("audit"));
    seen.lock().clear();
    engine.walk(&tree()).unwrap();
    assert!(seen.lock().is_empty());
}

#[derive(Reflect, Default)]
struct EmptyAudit {
    #[tag(r#"audit:"""#)]
    pub n: i32,
}

#[test]
fn test_handler_parse_error_names_annotation() {
    let engine = Engine::default();
    engine.register("audit", Audit {
        seen: Arc::default(),
        skip: false,
    });
    let err = engine.walk(&EmptyAudit::default()).unwrap_err();
    assert_eq!(err.to_string(), "annotation `audit:\"\"`: empty audit label");
}

#[test]
fn test_concurrent_validation_shares_caches() {
    let engine = &Engine::default();
    let trees: Vec<Tree> = (0..8).map(|_| tree()).collect();

    let results: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = trees
            .iter()
            .map(|t| scope.spawn(move || engine.validate_struct(t).unwrap_err().to_string()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|r| r == "left.n: the value is less than 1"));
    assert_eq!(engine.rules().parse_count(), 1);
}
