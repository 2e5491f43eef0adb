//! Replays rules into a builder that renders what it receives.

use fieldtag_expression::{Arg, Builder, ParseError, parse};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Renders every event as text so the call sequence is observable.
struct Render;

impl Render {
    fn arg(arg: Arg<Vec<String>>) -> String {
        match arg {
            Arg::Integer(n) => n.to_string(),
            Arg::Float(n) => format!("{n:?}"),
            Arg::String(s) => format!("{s:?}"),
            Arg::Boolean(b) => b.to_string(),
            Arg::Ident(name) => format!("${name}"),
            Arg::Context(items) => items.join(" "),
        }
    }
}

impl Builder for Render {
    type Context = Vec<String>;
    type Error = ParseError;

    fn new_context(&self) -> Vec<String> {
        Vec::new()
    }

    fn and(&self, ctx: &mut Vec<String>, sub: Vec<String>) -> Result<(), ParseError> {
        ctx.push(format!("and[{}]", sub.join(", ")));
        Ok(())
    }

    fn or(&self, ctx: &mut Vec<String>, sub: Vec<String>) -> Result<(), ParseError> {
        ctx.push(format!("or[{}]", sub.join(", ")));
        Ok(())
    }

    fn ident(&self, ctx: &mut Vec<String>, name: &str) -> Result<(), ParseError> {
        ctx.push(name.to_string());
        Ok(())
    }

    fn call(
        &self,
        ctx: &mut Vec<String>,
        name: &str,
        args: Vec<Arg<Vec<String>>>,
    ) -> Result<(), ParseError> {
        let args: Vec<String> = args.into_iter().map(Render::arg).collect();
        ctx.push(format!("{name}({})", args.join(", ")));
        Ok(())
    }
}

#[rstest]
#[case("zero", "zero")]
#[case("min(1)", "min(1)")]
#[case("min==1", "min(1)")]
#[case("min == 1.5", "min(1.5)")]
#[case("min(1) && max(10)", "and[min(1), max(10)]")]
#[case("zero || (min==3 && max==10)", "or[zero, and[min(3), max(10)]]")]
#[case(r#"oneof("a", "b")"#, r#"oneof("a", "b")"#)]
#[case("array(min(1) && max(2))", "array(and[min(1), max(2)])")]
#[case("mapv(zero, limit)", "mapv($zero, $limit)")]
fn test_replay(#[case] rule: &str, #[case] expected: &str) {
    let rendered = parse(rule, &Render).unwrap();
    assert_eq!(rendered.join(" "), expected);
}

#[test]
fn test_syntax_error_surfaces_through_builder_error() {
    let err = parse("min(1) &&", &Render).unwrap_err();
    assert_eq!(err.code(), "RULE:SYNTAX");
}
