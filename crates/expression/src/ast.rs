//! Abstract syntax tree for rule expressions

/// A boolean rule expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All operands must hold; chains of `&&` are flattened
    And(Vec<Expr>),
    /// Any operand must hold; chains of `||` are flattened
    Or(Vec<Expr>),
    /// A bare identifier such as `zero`
    Ident(String),
    /// A function call such as `min(3)` or `oneof("a", "b")`
    Call { name: String, args: Vec<ArgExpr> },
    /// An equality such as `min == 3`
    Eq { name: String, value: Box<ArgExpr> },
}

/// An argument inside a call or on the right of `==`
#[derive(Debug, Clone, PartialEq)]
pub enum ArgExpr {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    /// Any nested rule expression, including bare identifiers
    Expr(Box<Expr>),
}
