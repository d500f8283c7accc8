//! Statement nodes: the tagged variant over all statement kinds, plus the
//! canonical renderers and the text-splitting helpers shared by the
//! extractors.
//!
//! Expressions are retained as opaque text (placeholder maps already
//! applied); no expression evaluation happens here.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::parse::block::BlockNode;
use crate::parse::typedecl::{ImplicitItem, TypeDeclStmt, TypeSpec};
use crate::source::Span;

/// One classified statement with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct StmtNode {
    pub span: Span,
    pub label: Option<u32>,
    pub stmt: Stmt,
}

impl StmtNode {
    #[must_use]
    pub fn new(span: Span, label: Option<u32>, stmt: Stmt) -> Self {
        Self { span, label, stmt }
    }
}

/// The two READ forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadForm {
    /// `READ ( <io-control-spec-list> ) [ <input-item-list> ]`
    Ctrl {
        specs: Vec<String>,
        items: Vec<String>,
    },
    /// `READ <format> [, <input-item-list>]`
    Fmt {
        format: String,
        items: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePosOp {
    Rewind,
    Backspace,
    Endfile,
}

impl FilePosOp {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            FilePosOp::Rewind => "REWIND",
            FilePosOp::Backspace => "BACKSPACE",
            FilePosOp::Endfile => "ENDFILE",
        }
    }
}

/// Statements of the shape `<keyword> [ :: ] <name-list>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamesKind {
    External,
    Intrinsic,
    Optional,
    Protected,
    Volatile,
    Value,
    Asynchronous,
    Import,
    Allocatable,
    Pointer,
    Target,
    Dimension,
    Final,
    ModuleProcedure,
}

impl NamesKind {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            NamesKind::External => "EXTERNAL",
            NamesKind::Intrinsic => "INTRINSIC",
            NamesKind::Optional => "OPTIONAL",
            NamesKind::Protected => "PROTECTED",
            NamesKind::Volatile => "VOLATILE",
            NamesKind::Value => "VALUE",
            NamesKind::Asynchronous => "ASYNCHRONOUS",
            NamesKind::Import => "IMPORT",
            NamesKind::Allocatable => "ALLOCATABLE",
            NamesKind::Pointer => "POINTER",
            NamesKind::Target => "TARGET",
            NamesKind::Dimension => "DIMENSION",
            NamesKind::Final => "FINAL",
            NamesKind::ModuleProcedure => "MODULE PROCEDURE",
        }
    }
}

/// Tagged variant over all statement kinds. Block constructs carry their
/// own node with owned children.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment { target: String, expr: String },
    PointerAssignment { target: String, expr: String },
    Assign { label: String, var: String },
    Call { designator: String, args: Vec<String> },
    Goto { label: String },
    ComputedGoto { labels: Vec<String>, expr: String },
    AssignedGoto { var: String, labels: Vec<String> },
    Continue,
    Return { expr: String },
    Stop { code: String },
    Pause { code: String },
    Cycle { name: String },
    Exit { name: String },
    Print { format: String, items: Vec<String> },
    Read(ReadForm),
    Write { specs: Vec<String>, items: Vec<String> },
    Open { specs: Vec<String> },
    Close { specs: Vec<String> },
    Flush { specs: Vec<String> },
    Wait { specs: Vec<String> },
    FilePos { op: FilePosOp, specs: Vec<String> },
    Inquire { specs: Vec<String>, items: Vec<String> },
    Allocate { type_spec: Option<TypeSpec>, items: Vec<String> },
    Deallocate { items: Vec<String> },
    Nullify { items: Vec<String> },
    ArithmeticIf { expr: String, labels: [String; 3] },
    ActionIf { expr: String, action: Box<StmtNode> },
    WhereStmt { mask: String, assignment: Box<StmtNode> },
    ForallStmt { header: String, assignment: Box<StmtNode> },
    Else { name: String },
    ElseIf { expr: String, name: String },
    ElseWhere { expr: Option<String>, name: String },

    Use { nature: String, module: String, only: bool, items: Vec<String> },
    /// Empty `items` means `IMPLICIT NONE`.
    Implicit { items: Vec<ImplicitItem> },
    Parameter { items: Vec<String> },
    Common { blocks: Vec<(String, Vec<String>)> },
    Data { sets: Vec<(Vec<String>, Vec<String>)> },
    Namelist { groups: Vec<(String, String)> },
    Equivalence { items: Vec<String> },
    Save { items: Vec<String> },
    Intent { specs: Vec<String>, items: Vec<String> },
    Access { private: bool, items: Vec<String> },
    Names { kind: NamesKind, items: Vec<String> },
    Sequence,
    Entry { name: String, args: Vec<String>, result: String, binds: Vec<String> },
    Format { specs: Vec<String> },
    Contains,
    SubprogramPrefix { prefix: String },
    Bind { specs: Vec<String>, items: Vec<String> },
    Enumerator { items: String },
    ProcBinding { iname: String, attrs: Vec<String>, name: String, target: String },
    GenericBinding { access: String, spec: String, targets: Vec<String> },
    TypeDecl(TypeDeclStmt),

    FortranName { value: String },
    Threadsafe,
    Depend { depends: Vec<String>, items: Vec<String> },
    Check { expr: String, items: Vec<String> },
    CallStatement { expr: String },
    CallProtoArgument { specs: String },

    Block(BlockNode),
    /// Best-effort leaf for text no candidate kind matched.
    Unparsed { text: String },
}

impl Stmt {
    /// Canonical text form: uppercase keywords, normalized separators.
    /// Re-parsing the rendered text yields an equal statement.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Stmt::Assignment { target, expr } => format!("{target} = {expr}"),
            Stmt::PointerAssignment { target, expr } => format!("{target} => {expr}"),
            Stmt::Assign { label, var } => format!("ASSIGN {label} TO {var}"),
            Stmt::Call { designator, args } => {
                if args.is_empty() {
                    format!("CALL {designator}")
                } else {
                    format!("CALL {designator}({})", args.join(", "))
                }
            }
            Stmt::Goto { label } => format!("GO TO {label}"),
            Stmt::ComputedGoto { labels, expr } => {
                format!("GO TO ({}) {}", labels.join(", "), expr)
            }
            Stmt::AssignedGoto { var, labels } => {
                if labels.is_empty() {
                    format!("GO TO {var}")
                } else {
                    format!("GO TO {var} ({})", labels.join(", "))
                }
            }
            Stmt::Continue => "CONTINUE".to_string(),
            Stmt::Return { expr } => {
                if expr.is_empty() {
                    "RETURN".to_string()
                } else {
                    format!("RETURN {expr}")
                }
            }
            Stmt::Stop { code } => {
                if code.is_empty() {
                    "STOP".to_string()
                } else {
                    format!("STOP {code}")
                }
            }
            Stmt::Pause { code } => {
                if code.is_empty() {
                    "PAUSE".to_string()
                } else {
                    format!("PAUSE {code}")
                }
            }
            Stmt::Cycle { name } => {
                if name.is_empty() {
                    "CYCLE".to_string()
                } else {
                    format!("CYCLE {name}")
                }
            }
            Stmt::Exit { name } => {
                if name.is_empty() {
                    "EXIT".to_string()
                } else {
                    format!("EXIT {name}")
                }
            }
            Stmt::Print { format, items } => {
                let mut all = vec![format.clone()];
                all.extend(items.iter().cloned());
                format!("PRINT {}", all.join(", "))
            }
            Stmt::Read(ReadForm::Ctrl { specs, items }) => {
                let mut s = format!("READ ({})", specs.join(", "));
                if !items.is_empty() {
                    s.push(' ');
                    s.push_str(&items.join(", "));
                }
                s
            }
            Stmt::Read(ReadForm::Fmt { format, items }) => {
                let mut all = vec![format.clone()];
                all.extend(items.iter().cloned());
                format!("READ {}", all.join(", "))
            }
            Stmt::Write { specs, items } => {
                let mut s = format!("WRITE ({})", specs.join(", "));
                if !items.is_empty() {
                    s.push(' ');
                    s.push_str(&items.join(", "));
                }
                s
            }
            Stmt::Open { specs } => format!("OPEN ({})", specs.join(", ")),
            Stmt::Close { specs } => format!("CLOSE ({})", specs.join(", ")),
            Stmt::Flush { specs } => format!("FLUSH ({})", specs.join(", ")),
            Stmt::Wait { specs } => format!("WAIT ({})", specs.join(", ")),
            Stmt::FilePos { op, specs } => {
                format!("{} ({})", op.keyword(), specs.join(", "))
            }
            Stmt::Inquire { specs, items } => {
                let mut s = format!("INQUIRE ({})", specs.join(", "));
                if !items.is_empty() {
                    s.push(' ');
                    s.push_str(&items.join(", "));
                }
                s
            }
            Stmt::Allocate { type_spec, items } => {
                let prefix = type_spec
                    .as_ref()
                    .map(|t| format!("{} :: ", t.render()))
                    .unwrap_or_default();
                format!("ALLOCATE ({prefix}{})", items.join(", "))
            }
            Stmt::Deallocate { items } => format!("DEALLOCATE ({})", items.join(", ")),
            Stmt::Nullify { items } => format!("NULLIFY ({})", items.join(", ")),
            Stmt::ArithmeticIf { expr, labels } => {
                format!("IF ({expr}) {}", labels.join(", "))
            }
            Stmt::ActionIf { expr, action } => {
                format!("IF ({expr}) {}", action.stmt.render())
            }
            Stmt::WhereStmt { mask, assignment } => {
                format!("WHERE ({mask}) {}", assignment.stmt.render())
            }
            Stmt::ForallStmt { header, assignment } => {
                format!("FORALL ({header}) {}", assignment.stmt.render())
            }
            Stmt::Else { name } => {
                if name.is_empty() {
                    "ELSE".to_string()
                } else {
                    format!("ELSE {name}")
                }
            }
            Stmt::ElseIf { expr, name } => {
                let suffix = if name.is_empty() {
                    String::new()
                } else {
                    format!(" {name}")
                };
                format!("ELSE IF ({expr}) THEN{suffix}")
            }
            Stmt::ElseWhere { expr, name } => {
                let mut s = "ELSE WHERE".to_string();
                if let Some(e) = expr {
                    s.push_str(&format!(" ({e})"));
                }
                if !name.is_empty() {
                    s.push(' ');
                    s.push_str(name);
                }
                s
            }
            Stmt::Use { nature, module, only, items } => {
                let mut s = "USE".to_string();
                if !nature.is_empty() {
                    s.push_str(&format!(", {nature} ::"));
                }
                s.push(' ');
                s.push_str(module);
                if *only {
                    s.push_str(", ONLY:");
                } else if !items.is_empty() {
                    s.push(',');
                }
                if !items.is_empty() {
                    s.push(' ');
                    s.push_str(&items.join(", "));
                }
                s
            }
            Stmt::Implicit { items } => {
                if items.is_empty() {
                    "IMPLICIT NONE".to_string()
                } else {
                    let rendered: Vec<String> =
                        items.iter().map(ImplicitItem::render).collect();
                    format!("IMPLICIT {}", rendered.join(", "))
                }
            }
            Stmt::Parameter { items } => format!("PARAMETER ({})", items.join(", ")),
            Stmt::Common { blocks } => {
                let mut parts = Vec::new();
                for (name, objs) in blocks {
                    if name.is_empty() {
                        parts.push(objs.join(", "));
                    } else {
                        parts.push(format!("/ {} / {}", name, objs.join(", ")));
                    }
                }
                format!("COMMON {}", parts.join(" "))
            }
            Stmt::Data { sets } => {
                let parts: Vec<String> = sets
                    .iter()
                    .map(|(objs, vals)| {
                        format!("{} / {} /", objs.join(", "), vals.join(", "))
                    })
                    .collect();
                format!("DATA {}", parts.join(" "))
            }
            Stmt::Namelist { groups } => {
                let parts: Vec<String> = groups
                    .iter()
                    .map(|(name, objs)| format!("{name} {objs}"))
                    .collect();
                format!("NAMELIST {}", parts.join(", "))
            }
            Stmt::Equivalence { items } => {
                format!("EQUIVALENCE {}", items.join(", "))
            }
            Stmt::Save { items } => {
                if items.is_empty() {
                    "SAVE".to_string()
                } else {
                    format!("SAVE {}", items.join(", "))
                }
            }
            Stmt::Intent { specs, items } => {
                format!("INTENT ({}) {}", specs.join(", "), items.join(", "))
            }
            Stmt::Access { private, items } => {
                let kw = if *private { "PRIVATE" } else { "PUBLIC" };
                if items.is_empty() {
                    kw.to_string()
                } else {
                    format!("{kw} {}", items.join(", "))
                }
            }
            Stmt::Names { kind, items } => {
                if items.is_empty() {
                    kind.keyword().to_string()
                } else {
                    format!("{} {}", kind.keyword(), items.join(", "))
                }
            }
            Stmt::Sequence => "SEQUENCE".to_string(),
            Stmt::Entry { name, args, result, binds } => {
                let mut s = format!("ENTRY {name}");
                if !args.is_empty() {
                    s.push_str(&format!(" ({})", args.join(", ")));
                }
                if !result.is_empty() {
                    s.push_str(&format!(" RESULT ({result})"));
                }
                if !binds.is_empty() {
                    s.push_str(&format!(" BIND ({})", binds.join(", ")));
                }
                s
            }
            Stmt::Format { specs } => format!("FORMAT ({})", specs.join(", ")),
            Stmt::Contains => "CONTAINS".to_string(),
            Stmt::SubprogramPrefix { prefix } => prefix.to_uppercase(),
            Stmt::Bind { specs, items } => {
                format!("BIND ({}) {}", specs.join(", "), items.join(", "))
            }
            Stmt::Enumerator { items } => format!("ENUMERATOR {items}"),
            Stmt::ProcBinding { iname, attrs, name, target } => {
                let mut s = "PROCEDURE ".to_string();
                if !iname.is_empty() {
                    s.push_str(&format!("({iname}) "));
                }
                if !attrs.is_empty() {
                    s.push_str(&format!(", {} :: ", attrs.join(", ")));
                }
                if target.is_empty() {
                    s.push_str(name);
                } else {
                    s.push_str(&format!("{name} => {target}"));
                }
                s
            }
            Stmt::GenericBinding { access, spec, targets } => {
                let mut s = "GENERIC".to_string();
                if !access.is_empty() {
                    s.push_str(&format!(", {access}"));
                }
                s.push_str(&format!(" :: {spec} => {}", targets.join(", ")));
                s
            }
            Stmt::TypeDecl(decl) => decl.render(),
            Stmt::FortranName { value } => format!("FORTRANNAME {value}"),
            Stmt::Threadsafe => "THREADSAFE".to_string(),
            Stmt::Depend { depends, items } => {
                format!("DEPEND ({}) {}", depends.join(", "), items.join(", "))
            }
            Stmt::Check { expr, items } => {
                format!("CHECK ({expr}) {}", items.join(", "))
            }
            Stmt::CallStatement { expr } => format!("CALLSTATEMENT {expr}"),
            Stmt::CallProtoArgument { specs } => format!("CALLPROTOARGUMENT {specs}"),
            Stmt::Block(block) => block.render_header(),
            Stmt::Unparsed { text } => text.clone(),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ===== Splitting helpers shared by the extractors =====

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_]\w*$").expect("name pattern"));

static LEADING_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_]\w*").expect("leading-name pattern"));

#[must_use]
pub fn is_name(s: &str) -> bool {
    NAME_RE.is_match(s)
}

/// Leading identifier of an entity declaration (`a(2,3)*4 = 0` -> `a`).
#[must_use]
pub fn leading_name(s: &str) -> Option<&str> {
    LEADING_NAME_RE.find(s).map(|m| m.as_str())
}

/// Split on top-level commas, respecting paren/bracket nesting. Empty
/// pieces are dropped.
#[must_use]
pub fn split_comma(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                let piece = s[start..i].trim();
                if !piece.is_empty() {
                    out.push(piece.to_string());
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let piece = s[start..].trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
    out
}

/// Like [`split_comma`], additionally normalizing `keyword = value` specs
/// to an uppercase keyword with single spaces around `=`.
#[must_use]
pub fn specs_split_comma(s: &str) -> Vec<String> {
    split_comma(s)
        .into_iter()
        .map(|spec| match find_depth0(&spec, '=') {
            Some(i) if !spec[i..].starts_with("==") && !spec[i..].starts_with("=>") => {
                let kw = spec[..i].trim().to_uppercase();
                let v = spec[i + 1..].trim();
                format!("{kw} = {v}")
            }
            _ => spec,
        })
        .collect()
}

/// Byte index of the first `target` character at paren/bracket depth 0.
#[must_use]
pub fn find_depth0(s: &str, target: char) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c == target && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Byte index of the first depth-0 occurrence of `pat` (ASCII, multi-char).
#[must_use]
pub fn find_str_depth0(s: &str, pat: &str) -> Option<usize> {
    let mut depth = 0i32;
    let bytes = s.as_bytes();
    let pat_bytes = pat.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            _ => {}
        }
        if depth == 0 && bytes[i..].starts_with(pat_bytes) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// For `s` starting with `(`, the byte index of the matching `)`.
#[must_use]
pub fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
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

/// True when every paren/bracket in `s` is balanced.
#[must_use]
pub fn is_balanced(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_comma_respects_parens() {
        assert_eq!(
            split_comma("a(1,2), b, c(3)"),
            vec!["a(1,2)", "b", "c(3)"]
        );
        assert_eq!(split_comma("x"), vec!["x"]);
        assert!(split_comma("  ").is_empty());
        assert_eq!(split_comma("a, , b"), vec!["a", "b"]);
    }

    #[test]
    fn test_specs_split_comma_uppercases_keywords() {
        assert_eq!(
            specs_split_comma("unit=5, file='x.dat', err=99"),
            vec!["UNIT = 5", "FILE = 'x.dat'", "ERR = 99"]
        );
        // Plain values and comparisons are left alone.
        assert_eq!(specs_split_comma("5, *"), vec!["5", "*"]);
        assert_eq!(specs_split_comma("a == b"), vec!["a == b"]);
    }

    #[test]
    fn test_find_depth0() {
        assert_eq!(find_depth0("a(b=1) = 2", '='), Some(7));
        assert_eq!(find_depth0("a(b=1)", '='), None);
        assert_eq!(find_str_depth0("x(a::b) :: y", "::"), Some(8));
    }

    #[test]
    fn test_matching_paren() {
        assert_eq!(matching_paren("(a(b), c) d"), Some(8));
        assert_eq!(matching_paren("(unclosed"), None);
    }

    #[test]
    fn test_render_call() {
        let s = Stmt::Call {
            designator: "f".into(),
            args: vec!["a".into(), "b + 1".into()],
        };
        assert_eq!(s.render(), "CALL f(a, b + 1)");
        let bare = Stmt::Call {
            designator: "init".into(),
            args: vec![],
        };
        assert_eq!(bare.render(), "CALL init");
    }

    #[test]
    fn test_render_use() {
        let s = Stmt::Use {
            nature: String::new(),
            module: "m".into(),
            only: true,
            items: vec!["a".into(), "b => c".into()],
        };
        assert_eq!(s.render(), "USE m, ONLY: a, b => c");
    }
}
