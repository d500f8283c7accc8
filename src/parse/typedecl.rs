//! Intrinsic-type declaration parsing: kind/length selectors, attribute and
//! entity lists, and `IMPLICIT`.
//!
//! This grammar is shared by every type-declaration statement and by the
//! implicit-rule statement, which embeds a declaration-type-spec before its
//! letter ranges. It also owns the one genuinely tricky disambiguation in
//! the statement grammar: a line like `integer function f(x)` is not a
//! declaration at all but a typed function header, and is re-split into a
//! bare declaration plus a synthesized header item.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::catalog::{Ctx, Extract};
use crate::parse::patterns;
use crate::parse::stmt::{
    is_name, leading_name, matching_paren, split_comma, find_str_depth0, Stmt,
};
use crate::source::Item;

/// Base type of a declaration-type-spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Integer,
    Real,
    DoublePrecision,
    Complex,
    DoubleComplex,
    Character,
    Logical,
    Byte,
    /// `TYPE ( <derived-type-name> )`
    Derived,
    /// `CLASS ( <derived-type-name> | * )`
    Class,
}

impl BaseType {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Integer => "INTEGER",
            BaseType::Real => "REAL",
            BaseType::DoublePrecision => "DOUBLE PRECISION",
            BaseType::Complex => "COMPLEX",
            BaseType::DoubleComplex => "DOUBLE COMPLEX",
            BaseType::Character => "CHARACTER",
            BaseType::Logical => "LOGICAL",
            BaseType::Byte => "BYTE",
            BaseType::Derived => "TYPE",
            BaseType::Class => "CLASS",
        }
    }

    fn keyword_re(self) -> &'static Regex {
        match self {
            BaseType::Integer => &patterns::INTEGER_RE,
            BaseType::Real => &patterns::REAL_RE,
            BaseType::DoublePrecision => &patterns::DOUBLE_PRECISION_RE,
            BaseType::Complex => &patterns::COMPLEX_RE,
            BaseType::DoubleComplex => &patterns::DOUBLE_COMPLEX_RE,
            BaseType::Character => &patterns::CHARACTER_RE,
            BaseType::Logical => &patterns::LOGICAL_RE,
            BaseType::Byte => &patterns::BYTE_RE,
            BaseType::Derived => &patterns::TYPE_STMT_RE,
            BaseType::Class => &patterns::CLASS_RE,
        }
    }
}

/// Parsed declaration-type-spec. Absent kind/length means the language
/// default size, never an error value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub base: BaseType,
    /// Kind expression text (`8`, `dp`, `selected_real_kind(15)`).
    pub kind: Option<String>,
    /// Character length expression text.
    pub len: Option<String>,
    /// Derived/class type name.
    pub type_name: Option<String>,
}

impl TypeSpec {
    #[must_use]
    pub fn plain(base: BaseType) -> Self {
        Self {
            base,
            kind: None,
            len: None,
            type_name: None,
        }
    }

    #[must_use]
    pub fn default_integer() -> Self {
        Self::plain(BaseType::Integer)
    }

    #[must_use]
    pub fn default_real() -> Self {
        Self::plain(BaseType::Real)
    }

    #[must_use]
    pub fn render(&self) -> String {
        match self.base {
            BaseType::Derived | BaseType::Class => {
                let name = self.type_name.as_deref().unwrap_or("");
                format!("{}({})", self.base.keyword(), name)
            }
            BaseType::Character => {
                let mut sel = String::new();
                match (&self.len, &self.kind) {
                    (Some(l), Some(k)) => sel = format!("(LEN={l}, KIND={k})"),
                    (Some(l), None) => sel = format!("(LEN={l})"),
                    (None, Some(k)) => sel = format!("(KIND={k})"),
                    (None, None) => {}
                }
                format!("{}{sel}", self.base.keyword())
            }
            _ => match &self.kind {
                Some(k) => format!("{}(KIND={k})", self.base.keyword()),
                None => self.base.keyword().to_string(),
            },
        }
    }
}

/// `<declaration-type-spec> [ [, <attr-spec>] :: ] <entity-decl-list>`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclStmt {
    pub spec: TypeSpec,
    pub attrs: Vec<String>,
    pub entities: Vec<String>,
}

impl TypeDeclStmt {
    #[must_use]
    pub fn render(&self) -> String {
        let mut s = self.spec.render();
        if !self.attrs.is_empty() {
            s.push_str(", ");
            s.push_str(&self.attrs.join(", "));
            s.push_str(" ::");
        }
        if !self.entities.is_empty() {
            s.push(' ');
            s.push_str(&self.entities.join(", "));
        }
        s
    }

    /// The declared object names, stripped of array specs and initializers.
    #[must_use]
    pub fn entity_names(&self) -> Vec<String> {
        self.entities
            .iter()
            .filter_map(|e| leading_name(e).map(str::to_string))
            .collect()
    }
}

/// One `<declaration-type-spec> ( <letter-spec-list> )` of an IMPLICIT
/// statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplicitItem {
    pub spec: TypeSpec,
    pub ranges: Vec<(char, char)>,
}

impl ImplicitItem {
    #[must_use]
    pub fn render(&self) -> String {
        let ranges: Vec<String> = self
            .ranges
            .iter()
            .map(|&(s, e)| {
                if s == e {
                    s.to_string()
                } else {
                    format!("{s}-{e}")
                }
            })
            .collect();
        format!("{} ( {} )", self.spec.render(), ranges.join(", "))
    }
}

static FUNCTION_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*$").expect("function-name pattern"));

static STAR_WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(_\w+)?|^\*").expect("star-width pattern"));

/// Consume the selector following a base-type keyword. Returns the raw
/// selector text and the remainder.
fn take_selector(rest: &str) -> Option<(String, &str)> {
    if rest.starts_with('(') {
        let end = matching_paren(rest)?;
        Some((rest[..=end].to_string(), rest[end + 1..].trim_start()))
    } else if let Some(after) = rest.strip_prefix('*') {
        let after_trim = after.trim_start();
        if after_trim.starts_with('(') {
            let end = matching_paren(after_trim)?;
            Some((
                format!("*{}", &after_trim[..=end]),
                after_trim[end + 1..].trim_start(),
            ))
        } else {
            let m = STAR_WIDTH_RE.find(after_trim)?;
            Some((
                format!("*{}", &after_trim[..m.end()]),
                after_trim[m.end()..].trim_start(),
            ))
        }
    } else {
        Some((String::new(), rest))
    }
}

fn parse_kind_selector(sel: &str) -> Option<String> {
    if sel.is_empty() {
        return None;
    }
    if let Some(width) = sel.strip_prefix('*') {
        let width = width.trim();
        let width = width
            .strip_prefix('(')
            .and_then(|w| w.strip_suffix(')'))
            .unwrap_or(width);
        return Some(width.trim().to_string());
    }
    let inner = sel
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))?
        .trim();
    let value = match inner.strip_prefix("kind") {
        Some(rest) => rest.trim_start().strip_prefix('=')?.trim_start(),
        None => inner,
    };
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_char_selector(sel: &str) -> Option<(Option<String>, Option<String>)> {
    if sel.is_empty() {
        return Some((None, None));
    }
    if let Some(rest) = sel.strip_prefix('*') {
        let rest = rest.trim().trim_end_matches(',').trim_end();
        let len = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(rest)
            .trim();
        let len = match len.strip_prefix("len") {
            Some(l) => l.trim_start().strip_prefix('=')?.trim_start(),
            None => len,
        };
        return Some((Some(len.to_string()), None));
    }
    let inner = sel
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))?
        .trim();
    let keyed = |piece: &str, kw: &str| -> Option<String> {
        piece
            .strip_prefix(kw)
            .map(|r| r.trim_start())
            .and_then(|r| r.strip_prefix('='))
            .map(|r| r.trim_start().to_string())
    };
    let pieces = split_comma(inner);
    match pieces.as_slice() {
        [one] => {
            if let Some(l) = keyed(one, "len") {
                Some((Some(l), None))
            } else if let Some(k) = keyed(one, "kind") {
                Some((None, Some(k)))
            } else {
                Some((Some(one.clone()), None))
            }
        }
        [a, b] => {
            if let (Some(l), Some(k)) = (keyed(a, "len"), keyed(b, "kind")) {
                Some((Some(l), Some(k)))
            } else if let (Some(k), Some(l)) = (keyed(a, "kind"), keyed(b, "len")) {
                Some((Some(l), Some(k)))
            } else if let Some(k) = keyed(b, "kind") {
                Some((Some(a.clone()), Some(k)))
            } else {
                Some((Some(a.clone()), Some(b.clone())))
            }
        }
        _ => None,
    }
}

/// Parse `text` as a bare declaration-type-spec (no entities). Used by
/// IMPLICIT and by ALLOCATE's optional type-spec prefix.
#[must_use]
pub fn parse_declaration_type_spec(text: &str) -> Option<TypeSpec> {
    const ORDER: &[BaseType] = &[
        BaseType::Integer,
        BaseType::Real,
        BaseType::DoublePrecision,
        BaseType::Complex,
        BaseType::DoubleComplex,
        BaseType::Character,
        BaseType::Logical,
        BaseType::Byte,
        BaseType::Derived,
        BaseType::Class,
    ];
    let text = text.trim();
    for &base in ORDER {
        let Some(m) = base.keyword_re().find(text) else {
            continue;
        };
        // `real` must not claim `double precision`'s tail and vice versa.
        if m.start() != 0 {
            continue;
        }
        let rest = text[m.end()..].trim_start();
        if matches!(base, BaseType::Derived | BaseType::Class) {
            let rest = text[text.find('(')?..].trim();
            let end = matching_paren(rest)?;
            if !rest[end + 1..].trim().is_empty() {
                continue;
            }
            let name = rest[1..end].trim().to_string();
            return Some(TypeSpec {
                base,
                kind: None,
                len: None,
                type_name: Some(name),
            });
        }
        let Some((selector, tail)) = take_selector(rest) else {
            continue;
        };
        if !tail.trim().is_empty() {
            continue;
        }
        let spec = if base == BaseType::Character {
            let (len, kind) = parse_char_selector(&selector)?;
            TypeSpec { base, kind, len, type_name: None }
        } else {
            TypeSpec {
                base,
                kind: parse_kind_selector(&selector),
                len: None,
                type_name: None,
            }
        };
        return Some(spec);
    }
    None
}

/// Extractor for type-declaration statements.
pub(crate) fn extract_type_decl(base: BaseType, item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let text = item.text.as_str();
    let Some(m) = base.keyword_re().find(text) else {
        return Extract::Invalid;
    };
    if m.start() != 0 {
        return Extract::Invalid;
    }

    let (raw_selector, mut rest) = if matches!(base, BaseType::Derived | BaseType::Class) {
        // The keyword pattern ends on the opening paren; the selector *is*
        // the parenthesized type name.
        let paren = &text[m.end() - 1..];
        let Some(end) = matching_paren(paren) else {
            return Extract::Invalid;
        };
        (paren[..=end].to_string(), paren[end + 1..].trim_start())
    } else {
        match take_selector(text[m.end()..].trim_start()) {
            Some(pair) => pair,
            None => return Extract::Invalid,
        }
    };

    // `integer function f(x)` is a typed function header: requeue a bare
    // declaration for the result, then the header itself. The synthesized
    // items cannot match this path again, so the split never recurses.
    if let Some(fm) = patterns::FUNCTION_RE.find(rest) {
        if fm.start() == 0 {
            let Some(name_caps) = FUNCTION_NAME_RE.captures(&rest[..fm.end()]) else {
                return Extract::Invalid;
            };
            let fname = name_caps.get(1).expect("name group").as_str();
            let kw_end = if matches!(base, BaseType::Derived | BaseType::Class) {
                m.end() - 1
            } else {
                m.end()
            };
            let decl = format!(
                "{}{} :: {}",
                text[..kw_end].trim_end(),
                raw_selector,
                fname
            );
            ctx.source.push_back(item.with_text(rest));
            ctx.source.push_back(item.with_text(decl));
            return Extract::Requeued;
        }
    }

    let spec = if matches!(base, BaseType::Derived | BaseType::Class) {
        let name = raw_selector[1..raw_selector.len() - 1].trim().to_string();
        if name != "*" && !is_name(&name) {
            return Extract::Invalid;
        }
        TypeSpec {
            base,
            kind: None,
            len: None,
            type_name: Some(name),
        }
    } else if base == BaseType::Character {
        let Some((len, kind)) = parse_char_selector(&raw_selector) else {
            return Extract::Invalid;
        };
        TypeSpec { base, kind, len, type_name: None }
    } else {
        TypeSpec {
            base,
            kind: parse_kind_selector(&raw_selector),
            len: None,
            type_name: None,
        }
    };

    // `character*10, x` keeps a legacy comma after the width.
    if raw_selector.starts_with('*') {
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }

    let (attrs, entity_text) = match find_str_depth0(rest, "::") {
        Some(i) => {
            let attr_text = rest[..i].trim().trim_start_matches(',');
            (split_comma(attr_text), rest[i + 2..].trim_start())
        }
        None => {
            let rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
            (Vec::new(), rest)
        }
    };

    let entities: Vec<String> = split_comma(entity_text)
        .into_iter()
        .map(|e| item.apply_map(&e))
        .collect();
    if entities.is_empty() || entities.iter().any(|e| leading_name(e).is_none()) {
        return Extract::Invalid;
    }

    Extract::Node(Stmt::TypeDecl(TypeDeclStmt { spec, attrs, entities }))
}

/// Extractor for `IMPLICIT <implicit-spec-list>` and `IMPLICIT NONE`.
pub(crate) fn extract_implicit(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["implicit".len()..].trim();
    if rest.eq_ignore_ascii_case("none") {
        return Extract::Node(Stmt::Implicit { items: Vec::new() });
    }
    let mut items = Vec::new();
    for piece in split_comma(rest) {
        if !piece.ends_with(')') {
            return Extract::Invalid;
        }
        let Some(open) = last_paren_group(&piece) else {
            return Extract::Invalid;
        };
        let spec_text = piece[..open].trim();
        let Some(spec) = parse_declaration_type_spec(spec_text) else {
            return Extract::Invalid;
        };
        let mut ranges = Vec::new();
        for range in split_comma(&piece[open + 1..piece.len() - 1]) {
            let (s, e) = match range.split_once('-') {
                Some((a, b)) => (a.trim(), b.trim()),
                None => (range.trim(), range.trim()),
            };
            let (sc, ec) = match (single_letter(s), single_letter(e)) {
                (Some(a), Some(b)) => (a, b),
                _ => return Extract::Invalid,
            };
            ranges.push((sc, ec));
        }
        if ranges.is_empty() {
            return Extract::Invalid;
        }
        items.push(ImplicitItem { spec, ranges });
    }
    if items.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Implicit { items })
}

fn single_letter(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    if chars.next().is_none() && c.is_ascii_lowercase() {
        Some(c)
    } else {
        None
    }
}

/// Byte index of the `(` opening the final parenthesized group of `s`
/// (which must end with `)`).
fn last_paren_group(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_selector_forms() {
        assert_eq!(parse_kind_selector(""), None);
        assert_eq!(parse_kind_selector("(8)"), Some("8".into()));
        assert_eq!(parse_kind_selector("(kind=8)"), Some("8".into()));
        assert_eq!(parse_kind_selector("*4"), Some("4".into()));
        assert_eq!(parse_kind_selector("*(4)"), Some("4".into()));
        assert_eq!(
            parse_kind_selector("(selected_real_kind(15))"),
            Some("selected_real_kind(15)".into())
        );
    }

    #[test]
    fn test_char_selector_forms() {
        assert_eq!(parse_char_selector(""), Some((None, None)));
        assert_eq!(parse_char_selector("(10)"), Some((Some("10".into()), None)));
        assert_eq!(
            parse_char_selector("(len=10)"),
            Some((Some("10".into()), None))
        );
        assert_eq!(
            parse_char_selector("(kind=1)"),
            Some((None, Some("1".into())))
        );
        assert_eq!(
            parse_char_selector("(len=10, kind=1)"),
            Some((Some("10".into()), Some("1".into())))
        );
        assert_eq!(
            parse_char_selector("(kind=1, len=10)"),
            Some((Some("10".into()), Some("1".into())))
        );
        assert_eq!(parse_char_selector("*10"), Some((Some("10".into()), None)));
        assert_eq!(parse_char_selector("*(*)"), Some((Some("*".into()), None)));
    }

    #[test]
    fn test_declaration_type_spec() {
        let spec = parse_declaration_type_spec("integer(kind=8)").unwrap();
        assert_eq!(spec.base, BaseType::Integer);
        assert_eq!(spec.kind.as_deref(), Some("8"));

        let spec = parse_declaration_type_spec("double precision").unwrap();
        assert_eq!(spec.base, BaseType::DoublePrecision);

        let spec = parse_declaration_type_spec("type(point)").unwrap();
        assert_eq!(spec.base, BaseType::Derived);
        assert_eq!(spec.type_name.as_deref(), Some("point"));

        assert!(parse_declaration_type_spec("integer x").is_none());
        assert!(parse_declaration_type_spec("not_a_type").is_none());
    }

    #[test]
    fn test_typespec_render_round() {
        let spec = TypeSpec {
            base: BaseType::Character,
            kind: Some("1".into()),
            len: Some("10".into()),
            type_name: None,
        };
        assert_eq!(spec.render(), "CHARACTER(LEN=10, KIND=1)");
        let reparsed = parse_declaration_type_spec(&spec.render().to_lowercase()).unwrap();
        assert_eq!(reparsed, spec);
    }

    #[test]
    fn test_entity_names() {
        let decl = TypeDeclStmt {
            spec: TypeSpec::default_integer(),
            attrs: vec![],
            entities: vec!["a(2,3)".into(), "b = 1".into(), "c*4".into()],
        };
        assert_eq!(decl.entity_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_last_paren_group() {
        assert_eq!(last_paren_group("integer(8) (i-k)"), Some(11));
        assert_eq!(last_paren_group("double precision (d)"), Some(17));
    }
}
