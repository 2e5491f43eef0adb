pub mod attrs;
pub mod diag;
