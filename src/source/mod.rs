//! Logical source items and the item-source abstraction.
//!
//! The reader turns physical source lines into [`Item`]s: one logical,
//! continuation-joined, comment-stripped statement with string literals
//! masked behind placeholders. Everything downstream (classification, block
//! building) consumes items through the [`ItemSource`] trait, which also
//! provides the one-item pushback used for prefix splitting and
//! function-typed-declaration disambiguation.

pub mod masker;
pub mod reader;

use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

pub use reader::FortranReader;

use crate::error::Result;

/// Source dialect of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Fixed-form FORTRAN 77 (column rules, legacy statements).
    Fixed77,
    /// Fixed-form layout with Fortran 90 statement set.
    Fixed90,
    /// Free-form Fortran 90/95.
    Free90,
    /// Signature files describing native-binding interfaces.
    Signature,
}

impl Dialect {
    #[must_use]
    pub fn is_fixed(self) -> bool {
        matches!(self, Dialect::Fixed77 | Dialect::Fixed90)
    }

    #[must_use]
    pub fn is_free(self) -> bool {
        !self.is_fixed()
    }

    /// Guess the dialect from a file extension. `None` for unknown
    /// extensions.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Dialect> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "f" | "for" | "ftn" | "f77" => Some(Dialect::Fixed77),
            "f90" | "f95" | "f03" | "f08" => Some(Dialect::Free90),
            "pyf" => Some(Dialect::Signature),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Fixed77 => "fixed77",
            Dialect::Fixed90 => "fixed90",
            Dialect::Free90 => "free90",
            Dialect::Signature => "signature",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed77" | "f77" | "fixed" => Ok(Dialect::Fixed77),
            "fixed90" => Ok(Dialect::Fixed90),
            "free90" | "free" | "f90" => Ok(Dialect::Free90),
            "signature" | "pyf" => Ok(Dialect::Signature),
            other => Err(format!("unknown dialect `{other}`")),
        }
    }
}

/// Physical line range of an item or node (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn line(n: usize) -> Self {
        Self { start: n, end: n }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__str_(\d+)__").expect("placeholder pattern"));

/// One logical source line.
///
/// `text` is the normalized statement text: continuations joined, comments
/// stripped, code lowercased, string literals replaced by `__str_N__`
/// placeholders. `apply_map` restores the literals for payload fields that
/// must keep them (format strings, stop codes, bind names).
#[derive(Debug, Clone)]
pub struct Item {
    pub text: String,
    /// Legacy numeric statement label.
    pub label: Option<u32>,
    /// Construct name (`loop: do ...`), without the colon.
    pub name: Option<String>,
    pub span: Span,
    map: Rc<Vec<String>>,
}

impl Item {
    #[must_use]
    pub fn new(text: String, span: Span, map: Rc<Vec<String>>) -> Self {
        Self {
            text,
            label: None,
            name: None,
            span,
            map,
        }
    }

    /// A derived item sharing this item's span and placeholder map. Used
    /// when an extractor re-shapes a line and requeues the pieces.
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Item {
        Item {
            text: text.into(),
            label: None,
            name: None,
            span: self.span,
            map: Rc::clone(&self.map),
        }
    }

    /// Restore masked string literals in `s`.
    #[must_use]
    pub fn apply_map(&self, s: &str) -> String {
        if self.map.is_empty() || !s.contains("__str_") {
            return s.to_string();
        }
        PLACEHOLDER_RE
            .replace_all(s, |caps: &regex::Captures<'_>| {
                let idx: usize = caps[1].parse().unwrap_or(usize::MAX);
                self.map.get(idx).cloned().unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Pull-based cursor over the logical lines of one source file.
///
/// `push_back` returns an item to the front of the stream; the next
/// `next_item` call yields it. Extractors use this for controlled lookahead:
/// at most one pushback per failed attempt, and pushed items are always
/// strictly smaller or re-shaped from the original, so classification
/// terminates.
pub trait ItemSource {
    fn dialect(&self) -> Dialect;

    fn next_item(&mut self) -> Result<Option<Item>>;

    fn push_back(&mut self, item: Item);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(
            Dialect::from_path(Path::new("a/b/x.f90")),
            Some(Dialect::Free90)
        );
        assert_eq!(Dialect::from_path(Path::new("x.f")), Some(Dialect::Fixed77));
        assert_eq!(
            Dialect::from_path(Path::new("x.pyf")),
            Some(Dialect::Signature)
        );
        assert_eq!(Dialect::from_path(Path::new("x.c")), None);
        assert_eq!(Dialect::from_path(Path::new("x")), None);
    }

    #[test]
    fn test_apply_map() {
        let map = Rc::new(vec!["'hello'".to_string(), "\"b\"".to_string()]);
        let item = Item::new("print *, __str_0__, __str_1__".into(), Span::line(1), map);
        assert_eq!(
            item.apply_map("__str_0__, __str_1__"),
            "'hello', \"b\""
        );
        // Text without placeholders passes through untouched.
        assert_eq!(item.apply_map("x + 1"), "x + 1");
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::line(4).to_string(), "4");
        assert_eq!(Span::new(4, 7).to_string(), "4-7");
    }
}
