//! Block constructs: kinds, headers, nodes, and the begin/end grammar.
//!
//! A block node owns its children in source order and remembers the end
//! statement that closed it. Scope-bearing blocks get a symbol scope
//! attached during semantic analysis.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::diag::DiagKind;
use crate::parse::catalog::{Ctx, Extract};
use crate::parse::patterns;
use crate::parse::stmt::{
    is_name, leading_name, matching_paren, split_comma, specs_split_comma, StmtNode, Stmt,
};
use crate::parse::typedecl::TypeSpec;
use crate::sema::scope::Scope;
use crate::source::{Item, Span};

/// Block construct types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// File-level container; parent of the top-level program units.
    Unit,
    Program,
    Module,
    /// Signature-file binding module (`python module m`).
    SigModule,
    BlockData,
    Subroutine,
    Function,
    Interface,
    /// Derived-type definition.
    DerivedType,
    IfThen,
    Do,
    Select,
    /// One CASE arm of a SELECT block.
    Case,
    Where,
    Forall,
    Associate,
    Enum,
}

impl BlockKind {
    /// Whether this block introduces a name space of its own.
    #[must_use]
    pub fn is_scope_unit(self) -> bool {
        matches!(
            self,
            BlockKind::Unit
                | BlockKind::Program
                | BlockKind::Module
                | BlockKind::SigModule
                | BlockKind::BlockData
                | BlockKind::Subroutine
                | BlockKind::Function
                | BlockKind::Interface
                | BlockKind::DerivedType
        )
    }

    /// Whether this is a top-level program unit.
    #[must_use]
    pub fn is_program_unit(self) -> bool {
        matches!(
            self,
            BlockKind::Program
                | BlockKind::Module
                | BlockKind::SigModule
                | BlockKind::BlockData
                | BlockKind::Subroutine
                | BlockKind::Function
        )
    }

    /// The end-statement pattern closing this block. `None` for the file
    /// container and for CASE arms, which close on their select's
    /// boundaries instead.
    #[must_use]
    pub fn end_re(self) -> Option<&'static Regex> {
        match self {
            BlockKind::Unit | BlockKind::Case => None,
            BlockKind::Program => Some(&patterns::END_PROGRAM_RE),
            BlockKind::Module => Some(&patterns::END_MODULE_RE),
            BlockKind::SigModule => Some(&patterns::END_SIG_MODULE_RE),
            BlockKind::BlockData => Some(&patterns::END_BLOCK_DATA_RE),
            BlockKind::Subroutine => Some(&patterns::END_SUBROUTINE_RE),
            BlockKind::Function => Some(&patterns::END_FUNCTION_RE),
            BlockKind::Interface => Some(&patterns::END_INTERFACE_RE),
            BlockKind::DerivedType => Some(&patterns::END_TYPE_RE),
            BlockKind::IfThen => Some(&patterns::END_IF_RE),
            BlockKind::Do => Some(&patterns::END_DO_RE),
            BlockKind::Select => Some(&patterns::END_SELECT_RE),
            BlockKind::Where => Some(&patterns::END_WHERE_RE),
            BlockKind::Forall => Some(&patterns::END_FORALL_RE),
            BlockKind::Associate => Some(&patterns::END_ASSOCIATE_RE),
            BlockKind::Enum => Some(&patterns::END_ENUM_RE),
        }
    }

    /// Keyword words stripped from an end statement when extracting the
    /// trailing name (`end block data foo` -> `foo`).
    fn end_keyword_words(self) -> &'static [&'static str] {
        match self {
            BlockKind::Unit | BlockKind::Case => &[],
            BlockKind::Program => &["program"],
            BlockKind::Module => &["module"],
            BlockKind::SigModule => &["python", "module"],
            BlockKind::BlockData => &["block", "data"],
            BlockKind::Subroutine => &["subroutine"],
            BlockKind::Function => &["function"],
            BlockKind::Interface => &["interface"],
            BlockKind::DerivedType => &["type"],
            BlockKind::IfThen => &["if"],
            BlockKind::Do => &["do"],
            BlockKind::Select => &["select"],
            BlockKind::Where => &["where"],
            BlockKind::Forall => &["forall"],
            BlockKind::Associate => &["associate"],
            BlockKind::Enum => &["enum"],
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Unit => "UNIT",
            BlockKind::Program => "PROGRAM",
            BlockKind::Module => "MODULE",
            BlockKind::SigModule => "PYTHON MODULE",
            BlockKind::BlockData => "BLOCK DATA",
            BlockKind::Subroutine => "SUBROUTINE",
            BlockKind::Function => "FUNCTION",
            BlockKind::Interface => "INTERFACE",
            BlockKind::DerivedType => "TYPE",
            BlockKind::IfThen => "IF",
            BlockKind::Do => "DO",
            BlockKind::Select => "SELECT",
            BlockKind::Case => "CASE",
            BlockKind::Where => "WHERE",
            BlockKind::Forall => "FORALL",
            BlockKind::Associate => "ASSOCIATE",
            BlockKind::Enum => "ENUM",
        };
        f.write_str(name)
    }
}

/// Shared header of SUBROUTINE and FUNCTION blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubprogramHeader {
    pub prefix: String,
    pub args: Vec<String>,
    /// Function result name when given via `RESULT(..)`.
    pub result: Option<String>,
    pub bind: Option<Vec<String>>,
    /// Return type captured from a typed function header
    /// (`integer function f(..)`).
    pub return_type: Option<TypeSpec>,
}

/// Kind-specific header payload of a block node.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    Unit,
    Program,
    Module,
    SigModule,
    BlockData,
    Subprogram(SubprogramHeader),
    Interface { is_abstract: bool, generic: String },
    DerivedType { attrs: Vec<String>, params: String },
    IfThen { cond: String },
    Do { endlabel: Option<u32>, control: String },
    Select { expr: String },
    Case { values: Vec<Vec<String>>, default: bool },
    Where { mask: String },
    Forall { header: String },
    Associate { assocs: String },
    Enum,
}

/// The end statement consumed into closing a block.
#[derive(Debug, Clone, PartialEq)]
pub struct EndInfo {
    pub name: Option<String>,
    pub span: Span,
}

/// A block construct with its owned children.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub kind: BlockKind,
    /// Unit name or construct name; empty when anonymous.
    pub name: String,
    pub header: Header,
    pub children: Vec<StmtNode>,
    pub end: Option<EndInfo>,
    pub scope: Option<Box<Scope>>,
    pub span: Span,
}

impl BlockNode {
    #[must_use]
    pub fn new(kind: BlockKind, name: impl Into<String>, header: Header, span: Span) -> Self {
        Self {
            kind,
            name: name.into(),
            header,
            children: Vec::new(),
            end: None,
            scope: None,
            span,
        }
    }

    /// Child blocks, in source order.
    pub fn child_blocks(&self) -> impl Iterator<Item = &BlockNode> {
        self.children.iter().filter_map(|c| match &c.stmt {
            Stmt::Block(b) => Some(b),
            _ => None,
        })
    }

    /// Named child block (module lookup at the file level, derived-type and
    /// subprogram lookup inside scopes).
    #[must_use]
    pub fn child_block(&self, name: &str) -> Option<&BlockNode> {
        self.child_blocks().find(|b| b.name == name)
    }

    /// Subprograms recorded in this block's nested-subprogram table, in
    /// source order. Empty before semantic analysis.
    #[must_use]
    pub fn nested_subprograms(&self) -> Vec<&BlockNode> {
        let Some(scope) = &self.scope else {
            return Vec::new();
        };
        scope
            .subprograms
            .iter()
            .filter_map(|name| self.child_block(name))
            .collect()
    }

    /// Canonical text of the begin statement.
    #[must_use]
    pub fn render_header(&self) -> String {
        let body = match &self.header {
            Header::Unit => format!("! UNIT {}", self.name),
            Header::Program => {
                if self.name.is_empty() {
                    "PROGRAM".to_string()
                } else {
                    format!("PROGRAM {}", self.name)
                }
            }
            Header::Module => format!("MODULE {}", self.name),
            Header::SigModule => format!("PYTHON MODULE {}", self.name),
            Header::BlockData => {
                if self.name.is_empty() {
                    "BLOCK DATA".to_string()
                } else {
                    format!("BLOCK DATA {}", self.name)
                }
            }
            Header::Subprogram(h) => {
                let kw = match self.kind {
                    BlockKind::Function => "FUNCTION",
                    _ => "SUBROUTINE",
                };
                let mut s = String::new();
                if !h.prefix.is_empty() {
                    s.push_str(&h.prefix.to_uppercase());
                    s.push(' ');
                }
                if let Some(t) = &h.return_type {
                    s.push_str(&t.render());
                    s.push(' ');
                }
                s.push_str(kw);
                s.push(' ');
                s.push_str(&self.name);
                s.push_str(&format!("({})", h.args.join(", ")));
                if let Some(r) = &h.result {
                    if r != &self.name {
                        s.push_str(&format!(" RESULT ( {r} )"));
                    }
                }
                if let Some(b) = &h.bind {
                    s.push_str(&format!(" BIND ( {} )", b.join(", ")));
                }
                s
            }
            Header::Interface { is_abstract, generic } => {
                if *is_abstract {
                    "ABSTRACT INTERFACE".to_string()
                } else if generic.is_empty() {
                    "INTERFACE".to_string()
                } else {
                    format!("INTERFACE {generic}")
                }
            }
            Header::DerivedType { attrs, params } => {
                let mut s = "TYPE".to_string();
                if !attrs.is_empty() {
                    s.push_str(&format!(", {} ::", attrs.join(", ")));
                }
                s.push(' ');
                s.push_str(&self.name);
                if !params.is_empty() {
                    s.push_str(&format!(" ({params})"));
                }
                s
            }
            Header::IfThen { cond } => format!("IF ({cond}) THEN"),
            Header::Do { endlabel, control } => {
                let mut s = "DO".to_string();
                if let Some(l) = endlabel {
                    s.push_str(&format!(" {l}"));
                }
                if !control.is_empty() {
                    s.push(' ');
                    s.push_str(control);
                }
                s
            }
            Header::Select { expr } => format!("SELECT CASE ( {expr} )"),
            Header::Case { values, default } => {
                let mut s = "CASE".to_string();
                if *default {
                    s.push_str(" DEFAULT");
                } else {
                    let ranges: Vec<String> = values
                        .iter()
                        .map(|v| v.join(" : "))
                        .collect();
                    s.push_str(&format!(" ( {} )", ranges.join(", ")));
                }
                s
            }
            Header::Where { mask } => format!("WHERE ( {mask} )"),
            Header::Forall { header } => format!("FORALL ({header})"),
            Header::Associate { assocs } => format!("ASSOCIATE ({assocs})"),
            Header::Enum => "ENUM, BIND(C)".to_string(),
        };
        // Construct names render back as a statement prefix.
        let named_construct = matches!(
            self.kind,
            BlockKind::IfThen
                | BlockKind::Do
                | BlockKind::Select
                | BlockKind::Where
                | BlockKind::Forall
                | BlockKind::Associate
        );
        if named_construct && !self.name.is_empty() {
            format!("{}: {body}", self.name)
        } else {
            body
        }
    }
}

/// Parse the trailing name of an end statement for `kind`.
pub(crate) fn parse_end(kind: BlockKind, item: &Item) -> EndInfo {
    let mut rest = item.text.trim_start()[3..].trim_start();
    for word in kind.end_keyword_words() {
        if let Some(tail) = rest.strip_prefix(word) {
            rest = tail.trim_start();
        }
    }
    let name = if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    };
    EndInfo {
        name,
        span: item.span,
    }
}

// ===== Begin-statement extractors =====

static SIG_MODULE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^python\s*module\s+(\w+)").expect("sig-module pattern"));

static BLOCK_DATA_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^block\s*data\s*(\w*)").expect("block-data pattern"));

static DO_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^do\b\s*(\d*)\s*,?\s*(.*)$").expect("do pattern"));

pub(crate) fn begin_program(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let name = item.text["program".len()..].trim().to_string();
    Extract::Begin(BlockNode::new(
        BlockKind::Program,
        name,
        Header::Program,
        item.span,
    ))
}

pub(crate) fn begin_module(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let name = item.text["module".len()..].trim().to_string();
    if !is_name(&name) {
        return Extract::Invalid;
    }
    Extract::Begin(BlockNode::new(
        BlockKind::Module,
        name,
        Header::Module,
        item.span,
    ))
}

pub(crate) fn begin_sig_module(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let Some(caps) = SIG_MODULE_NAME_RE.captures(&item.text) else {
        return Extract::Invalid;
    };
    Extract::Begin(BlockNode::new(
        BlockKind::SigModule,
        caps[1].to_string(),
        Header::SigModule,
        item.span,
    ))
}

pub(crate) fn begin_block_data(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let Some(caps) = BLOCK_DATA_NAME_RE.captures(&item.text) else {
        return Extract::Invalid;
    };
    Extract::Begin(BlockNode::new(
        BlockKind::BlockData,
        caps[1].to_string(),
        Header::BlockData,
        item.span,
    ))
}

/// `( <bind-spec-list> )` suffix starting with `bind`; returns the specs
/// and the remaining suffix.
fn parse_bind(suffix: &str) -> (Option<Vec<String>>, String) {
    let t = suffix.trim_start();
    if !t.starts_with("bind") {
        return (None, suffix.to_string());
    }
    let after = t["bind".len()..].trim_start();
    if !after.starts_with('(') {
        return (None, suffix.to_string());
    }
    match matching_paren(after) {
        Some(end) => (
            Some(specs_split_comma(&after[1..end])),
            after[end + 1..].trim_start().to_string(),
        ),
        None => (None, suffix.to_string()),
    }
}

fn parse_result(suffix: &str) -> (Option<String>, String) {
    let t = suffix.trim_start();
    if !t.starts_with("result") {
        return (None, suffix.to_string());
    }
    let after = t["result".len()..].trim_start();
    if !after.starts_with('(') {
        return (None, suffix.to_string());
    }
    match matching_paren(after) {
        Some(end) => {
            let name = after[1..end].trim().to_string();
            if is_name(&name) {
                (Some(name), after[end + 1..].trim_start().to_string())
            } else {
                (None, suffix.to_string())
            }
        }
        None => (None, suffix.to_string()),
    }
}

pub(crate) fn begin_subprogram(kind: BlockKind, item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let kw = match kind {
        BlockKind::Function => "function",
        _ => "subroutine",
    };
    let text = item.text.as_str();
    let Some(pos) = text.find(kw) else {
        return Extract::Invalid;
    };
    let prefix = text[..pos].trim().to_string();
    let after = text[pos + kw.len()..].trim_start();
    let Some(name) = leading_name(after) else {
        return Extract::Invalid;
    };
    let name = name.to_string();
    let mut rest = after[name.len()..].trim_start();

    let mut args = Vec::new();
    if rest.starts_with('(') {
        let Some(end) = matching_paren(rest) else {
            return Extract::Invalid;
        };
        for a in split_comma(&item.apply_map(&rest[1..end])) {
            args.push(a);
        }
        rest = rest[end + 1..].trim_start();
    }

    let suffix = item.apply_map(rest);
    let (mut bind, suffix) = parse_bind(&suffix);
    let mut result = None;
    let mut suffix = suffix;
    if kind == BlockKind::Function {
        let (r, s) = parse_result(&suffix);
        result = r;
        suffix = s;
        if !suffix.trim().is_empty() && bind.is_none() {
            let (b, s) = parse_bind(&suffix);
            bind = b;
            suffix = s;
        }
    }
    if !suffix.trim().is_empty() {
        return Extract::Invalid;
    }

    Extract::Begin(BlockNode::new(
        kind,
        name,
        Header::Subprogram(SubprogramHeader {
            prefix,
            args,
            result,
            bind,
            return_type: None,
        }),
        item.span,
    ))
}

pub(crate) fn begin_interface(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let text = item.text.as_str();
    let (is_abstract, generic) = if let Some(rest) = text.strip_prefix("abstract") {
        let rest = rest.trim_start();
        if !rest.starts_with("interface") {
            return Extract::Invalid;
        }
        (true, String::new())
    } else {
        let generic = item.apply_map(text["interface".len()..].trim());
        (false, generic)
    };
    // The generic spec doubles as the block name; operator specs are not
    // identifiers, so the name stays informational.
    Extract::Begin(BlockNode::new(
        BlockKind::Interface,
        generic.clone(),
        Header::Interface { is_abstract, generic },
        item.span,
    ))
}

pub(crate) fn begin_derived_type(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut rest = item.text["type".len()..].trim_start();
    if rest.starts_with('(') {
        // `type (name) :: v` is a declaration, not a definition.
        return Extract::Invalid;
    }
    let mut attrs = Vec::new();
    if let Some(i) = rest.find("::") {
        attrs = split_comma(rest[..i].trim_start_matches(','));
        rest = rest[i + 2..].trim_start();
    }
    let (name, params) = match rest.find('(') {
        Some(i) => {
            if !rest.ends_with(')') {
                return Extract::Invalid;
            }
            (rest[..i].trim(), rest[i + 1..rest.len() - 1].trim())
        }
        None => (rest, ""),
    };
    if !is_name(name) {
        return Extract::Invalid;
    }
    Extract::Begin(BlockNode::new(
        BlockKind::DerivedType,
        name,
        Header::DerivedType {
            attrs,
            params: params.to_string(),
        },
        item.span,
    ))
}

pub(crate) fn begin_if_then(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["if".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    if rest[end + 1..].trim() != "then" {
        return Extract::Invalid;
    }
    let cond = item.apply_map(rest[1..end].trim());
    Extract::Begin(BlockNode::new(
        BlockKind::IfThen,
        item.name.clone().unwrap_or_default(),
        Header::IfThen { cond },
        item.span,
    ))
}

pub(crate) fn begin_do(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let Some(caps) = DO_ITEM_RE.captures(&item.text) else {
        return Extract::Invalid;
    };
    let endlabel = caps[1].parse::<u32>().ok();
    let control = item.apply_map(caps[2].trim());
    Extract::Begin(BlockNode::new(
        BlockKind::Do,
        item.name.clone().unwrap_or_default(),
        Header::Do { endlabel, control },
        item.span,
    ))
}

pub(crate) fn begin_select(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let text = item.text.as_str();
    let Some(open) = text.find('(') else {
        return Extract::Invalid;
    };
    let rest = &text[open..];
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let expr = item.apply_map(rest[1..end].trim());
    Extract::Begin(BlockNode::new(
        BlockKind::Select,
        item.name.clone().unwrap_or_default(),
        Header::Select { expr },
        item.span,
    ))
}

pub(crate) fn begin_case(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut rest = item.text["case".len()..].trim_start();
    let (values, default) = if rest.starts_with('(') {
        let Some(end) = matching_paren(rest) else {
            return Extract::Invalid;
        };
        let inner = rest[1..end].to_string();
        rest = rest[end + 1..].trim_start();
        let values: Vec<Vec<String>> = split_comma(&inner)
            .into_iter()
            .map(|range| {
                range
                    .split(':')
                    .map(|v| item.apply_map(v.trim()))
                    .collect()
            })
            .collect();
        (values, false)
    } else if let Some(after) = rest.strip_prefix("default") {
        rest = after.trim_start();
        (Vec::new(), true)
    } else {
        return Extract::Invalid;
    };

    let trailing = rest.trim();
    if !trailing.is_empty() && trailing != ctx.block_name {
        ctx.diags.warn(
            DiagKind::StructuralMismatch,
            item.span,
            format!(
                "expected case construct name `{}` but got `{trailing}`",
                ctx.block_name
            ),
        );
    }
    Extract::Begin(BlockNode::new(
        BlockKind::Case,
        trailing,
        Header::Case { values, default },
        item.span,
    ))
}

pub(crate) fn begin_where(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["where".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    if !rest[end + 1..].trim().is_empty() {
        return Extract::Invalid;
    }
    let mask = item.apply_map(rest[1..end].trim());
    Extract::Begin(BlockNode::new(
        BlockKind::Where,
        item.name.clone().unwrap_or_default(),
        Header::Where { mask },
        item.span,
    ))
}

pub(crate) fn begin_forall(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["forall".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    if !rest[end + 1..].trim().is_empty() {
        return Extract::Invalid;
    }
    let header = item.apply_map(rest[1..end].trim());
    Extract::Begin(BlockNode::new(
        BlockKind::Forall,
        item.name.clone().unwrap_or_default(),
        Header::Forall { header },
        item.span,
    ))
}

pub(crate) fn begin_associate(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["associate".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let assocs = item.apply_map(rest[1..end].trim());
    Extract::Begin(BlockNode::new(
        BlockKind::Associate,
        item.name.clone().unwrap_or_default(),
        Header::Associate { assocs },
        item.span,
    ))
}

pub(crate) fn begin_enum(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    Extract::Begin(BlockNode::new(
        BlockKind::Enum,
        String::new(),
        Header::Enum,
        item.span,
    ))
}
