//! Field annotation parsing
//!
//! An annotation string holds `name:"value"` pairs separated by spaces:
//!
//! ```text
//! validate:"min(1) && max(10)" default:"1" json:"count,omitempty"
//! ```
//!
//! Scanning is permissive. The first malformed segment (a missing colon, an
//! unterminated quote, a value that does not unquote) ends the scan, and
//! every pair read before it stays in effect.

use thiserror::Error;

/// One `name:"value"` entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair<'a> {
    pub name: &'a str,
    /// The value including its surrounding double quotes.
    pub quoted: &'a str,
    /// The value with quotes removed and escapes resolved.
    pub value: String,
}

/// Iterator over the pairs of an annotation string.
#[derive(Debug, Clone)]
pub struct Pairs<'a> {
    source: &'a str,
    offset: usize,
    done: bool,
}

/// Scans `source` into its `name:"value"` pairs, left to right.
pub fn pairs(source: &str) -> Pairs<'_> {
    Pairs {
        source,
        offset: 0,
        done: false,
    }
}

impl<'a> Pairs<'a> {
    /// Byte length of the prefix consumed by the pairs yielded so far.
    pub fn consumed(&self) -> usize {
        self.offset
    }

    fn next_pair(&self) -> Option<(Pair<'a>, usize)> {
        let bytes = self.source.as_bytes();
        let mut i = self.offset;

        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }

        let name_start = i;
        while i < bytes.len() && bytes[i] > b' ' && bytes[i] != b':' && bytes[i] != b'"' && bytes[i] != 0x7f
        {
            i += 1;
        }
        if i == name_start || i + 1 >= bytes.len() || bytes[i] != b':' || bytes[i + 1] != b'"' {
            return None;
        }
        let name = &self.source[name_start..i];

        let value_start = i + 1;
        i = value_start + 1;
        while i < bytes.len() && bytes[i] != b'"' {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        let end = i + 1;
        let quoted = &self.source[value_start..end];
        let value = unquote(quoted).ok()?;

        Some((
            Pair {
                name,
                quoted,
                value,
            },
            end,
        ))
    }
}

impl<'a> Iterator for Pairs<'a> {
    type Item = Pair<'a>;

    fn next(&mut self) -> Option<Pair<'a>> {
        if self.done {
            return None;
        }
        match self.next_pair() {
            Some((pair, end)) => {
                self.offset = end;
                Some(pair)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// A quoted value that is not a valid double-quoted string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quoted value {quoted}")]
pub struct UnquoteError {
    pub quoted: String,
}

/// Removes the surrounding quotes of `quoted` and resolves its escapes.
///
/// Accepts `\a \b \f \n \r \t \v \\ \' \"`, octal `\NNN`, and hex
/// `\xHH`, `\uHHHH`, `\UHHHHHHHH` escapes.
pub fn unquote(quoted: &str) -> Result<String, UnquoteError> {
    let error = || UnquoteError {
        quoted: quoted.to_string(),
    };

    let inner = quoted
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(error)?;

    if !inner.contains(['\\', '"', '\n']) {
        return Ok(inner.to_string());
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\n' => return Err(error()),
            '\\' => {
                let escaped = chars.next().ok_or_else(error)?;
                let resolved = match escaped {
                    'a' => '\u{07}',
                    'b' => '\u{08}',
                    'f' => '\u{0c}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'v' => '\u{0b}',
                    '\\' | '\'' | '"' => escaped,
                    'x' => hex_escape(&mut chars, 2).ok_or_else(error)?,
                    'u' => hex_escape(&mut chars, 4).ok_or_else(error)?,
                    'U' => hex_escape(&mut chars, 8).ok_or_else(error)?,
                    '0'..='7' => octal_escape(escaped, &mut chars).ok_or_else(error)?,
                    _ => return Err(error()),
                };
                out.push(resolved);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(code)
}

fn octal_escape(first: char, chars: &mut std::str::Chars<'_>) -> Option<char> {
    let mut code = first.to_digit(8)?;
    for _ in 0..2 {
        code = code * 8 + chars.next()?.to_digit(8)?;
    }
    if code > 0xff {
        return None;
    }
    char::from_u32(code)
}

/// Extracts the display name from a `json`-style annotation value.
///
/// Takes the segment before the first comma; `-` and empty mean "no name".
pub fn display_name(value: &str) -> Option<&str> {
    let name = value.split(',').next().unwrap_or_default();
    if name.is_empty() || name == "-" {
        None
    } else {
        Some(name)
    }
}
