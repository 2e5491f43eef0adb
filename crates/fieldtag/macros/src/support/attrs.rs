use syn::{Attribute, Ident, LitStr, Meta, Result, Token, punctuated::Punctuated};

use crate::support::diag;

/// Flags collected from every `#[reflect(...)]` attribute on an item.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub items: Vec<Ident>,
}

impl Flags {
    pub fn has(&self, flag: &str) -> bool {
        self.items.iter().any(|item| item == flag)
    }

    /// Rejects any flag not in `allowed`.
    pub fn only(&self, allowed: &[&str]) -> Result<()> {
        match self.items.iter().find(|item| !allowed.iter().any(|a| *item == a)) {
            Some(unknown) => Err(diag::spanned(
                unknown,
                format!("unknown flag `{unknown}`, expected one of: {}", allowed.join(", ")),
            )),
            None => Ok(()),
        }
    }
}

/// Parses and merges every `#[name(flag, ...)]` attribute.
pub fn parse_flags(attrs: &[Attribute], name: &str) -> Result<Flags> {
    let mut flags = Flags::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(name)) {
        match &attr.meta {
            Meta::List(list) => {
                let items = list.parse_args_with(Punctuated::<Ident, Token![,]>::parse_terminated)?;
                flags.items.extend(items);
            }
            other => {
                return Err(diag::spanned(
                    other,
                    format!("expected #[{name}(...)]"),
                ));
            }
        }
    }

    Ok(flags)
}

/// Joins the string of every `#[name("...")]` attribute with a space.
pub fn parse_tags(attrs: &[Attribute], name: &str) -> Result<String> {
    let mut parts = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(name)) {
        let lit: LitStr = attr
            .parse_args()
            .map_err(|_| diag::spanned(attr, format!("expected #[{name}(\"...\")]")))?;
        let value = lit.value();
        if !value.trim().is_empty() {
            parts.push(value.trim().to_string());
        }
    }

    Ok(parts.join(" "))
}
