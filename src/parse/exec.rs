//! Extractors for executable statements.
//!
//! Each extractor receives one classified item and either produces a
//! statement payload or declares the attempt invalid so the trial-match
//! engine can move on to the next candidate kind. Expression text is kept
//! opaque; placeholder maps are applied before payloads are stored.

use std::sync::LazyLock;

use regex::Regex;

use crate::diag::DiagKind;
use crate::parse::catalog::{classify, Classified, Ctx, Extract, ACTION_STMTS};
use crate::parse::stmt::{
    find_str_depth0, is_balanced, matching_paren, split_comma, specs_split_comma, FilePosOp,
    ReadForm, Stmt, StmtNode,
};
use crate::parse::typedecl::parse_declaration_type_spec;
use crate::source::Item;

static GOTO_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^go\s*to\s*").expect("goto prefix"));

static ASSIGN_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^assign\s+(\d+)\s+to\s+(\w+)\s*$").expect("assign pattern"));

/// Locate the assignment sign at paren depth 0. Returns the byte index and
/// whether it is a pointer assignment (`=>`).
fn find_assign_sign(text: &str) -> Option<(usize, bool)> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            b'=' if depth == 0 => {
                let prev = if i > 0 { bytes[i - 1] } else { b' ' };
                let next = bytes.get(i + 1).copied().unwrap_or(b' ');
                if matches!(prev, b'<' | b'>' | b'/' | b'=') {
                    // tail of a relational operator
                } else if next == b'=' {
                    i += 1; // `==`
                } else {
                    return Some((i, next == b'>'));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

static CONSTRUCT_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(if|where|forall)\(").expect("construct keyword"));

fn is_assignable_target(target: &str) -> bool {
    let squeezed: String = target.chars().filter(|c| !c.is_whitespace()).collect();
    if squeezed.is_empty() || !squeezed.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
    {
        return false;
    }
    if CONSTRUCT_KEYWORD_RE.is_match(&squeezed) {
        return false;
    }
    if !is_balanced(&squeezed) {
        return false;
    }
    // A top-level comma means this is not a single designator.
    crate::parse::stmt::find_depth0(&squeezed, ',').is_none()
}

pub(crate) fn extract_assignment(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let Some((idx, pointer)) = find_assign_sign(&item.text) else {
        return Extract::Invalid;
    };
    let target = item.text[..idx].trim();
    if !is_assignable_target(target) {
        return Extract::Invalid;
    }
    let skip = if pointer { 2 } else { 1 };
    let expr = item.text[idx + skip..].trim();
    let target: String = target.chars().filter(|c| !c.is_whitespace()).collect();
    let target = item.apply_map(&target);
    let expr = item.apply_map(expr);
    if pointer {
        Extract::Node(Stmt::PointerAssignment { target, expr })
    } else {
        Extract::Node(Stmt::Assignment { target, expr })
    }
}

pub(crate) fn extract_assign(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let Some(caps) = ASSIGN_ITEM_RE.captures(&item.text) else {
        return Extract::Invalid;
    };
    Extract::Node(Stmt::Assign {
        label: caps[1].to_string(),
        var: caps[2].to_string(),
    })
}

pub(crate) fn extract_call(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["call".len()..].trim();
    match rest.find('(') {
        None => {
            if rest.is_empty() {
                return Extract::Invalid;
            }
            Extract::Node(Stmt::Call {
                designator: item.apply_map(rest),
                args: Vec::new(),
            })
        }
        Some(i) => {
            let paren = &rest[i..];
            let Some(end) = matching_paren(paren) else {
                return Extract::Invalid;
            };
            if !paren[end + 1..].trim().is_empty() {
                return Extract::Invalid;
            }
            let args = split_comma(paren[1..end].trim())
                .into_iter()
                .map(|a| item.apply_map(&a))
                .collect();
            Extract::Node(Stmt::Call {
                designator: item.apply_map(rest[..i].trim()),
                args,
            })
        }
    }
}

pub(crate) fn extract_goto(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = GOTO_PREFIX_RE.replace(&item.text, "");
    Extract::Node(Stmt::Goto {
        label: rest.trim().to_string(),
    })
}

pub(crate) fn extract_computed_goto(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = GOTO_PREFIX_RE.replace(&item.text, "").into_owned();
    let Some(end) = matching_paren(&rest) else {
        return Extract::Invalid;
    };
    let labels = split_comma(&rest[1..end]);
    let mut expr = rest[end + 1..].trim_start();
    expr = expr.strip_prefix(',').unwrap_or(expr).trim_start();
    if expr.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::ComputedGoto {
        labels,
        expr: item.apply_map(expr),
    })
}

pub(crate) fn extract_assigned_goto(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = GOTO_PREFIX_RE.replace(&item.text, "").into_owned();
    match rest.find('(') {
        None => {
            let var = rest.trim();
            if !crate::parse::stmt::is_name(var) {
                return Extract::Invalid;
            }
            Extract::Node(Stmt::AssignedGoto {
                var: var.to_string(),
                labels: Vec::new(),
            })
        }
        Some(i) => {
            let var = rest[..i].trim();
            if !crate::parse::stmt::is_name(var) || !rest.ends_with(')') {
                return Extract::Invalid;
            }
            Extract::Node(Stmt::AssignedGoto {
                var: var.to_string(),
                labels: split_comma(&rest[i + 1..rest.len() - 1]),
            })
        }
    }
}

pub(crate) fn extract_continue(_item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    Extract::Node(Stmt::Continue)
}

pub(crate) fn extract_return(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let expr = item.apply_map(item.text["return".len()..].trim());
    Extract::Node(Stmt::Return { expr })
}

pub(crate) fn extract_stop(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let code = item.apply_map(item.text["stop".len()..].trim());
    Extract::Node(Stmt::Stop { code })
}

pub(crate) fn extract_pause(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let code = item.apply_map(item.text["pause".len()..].trim());
    Extract::Node(Stmt::Pause { code })
}

pub(crate) fn extract_cycle(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    Extract::Node(Stmt::Cycle {
        name: item.text["cycle".len()..].trim().to_string(),
    })
}

pub(crate) fn extract_exit(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    Extract::Node(Stmt::Exit {
        name: item.text["exit".len()..].trim().to_string(),
    })
}

pub(crate) fn extract_print(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["print".len()..].trim_start();
    let mut parts = split_comma(rest).into_iter().map(|p| item.apply_map(&p));
    let Some(format) = parts.next() else {
        return Extract::Invalid;
    };
    Extract::Node(Stmt::Print {
        format,
        items: parts.collect(),
    })
}

pub(crate) fn extract_read(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["read".len()..].trim_start();
    if rest.starts_with('(') {
        let Some(end) = matching_paren(rest) else {
            return Extract::Invalid;
        };
        let specs = specs_split_comma(&item.apply_map(rest[1..end].trim()));
        let items = split_comma(rest[end + 1..].trim())
            .into_iter()
            .map(|p| item.apply_map(&p))
            .collect();
        Extract::Node(Stmt::Read(ReadForm::Ctrl { specs, items }))
    } else {
        let mut parts = split_comma(rest).into_iter().map(|p| item.apply_map(&p));
        let Some(format) = parts.next() else {
            return Extract::Invalid;
        };
        Extract::Node(Stmt::Read(ReadForm::Fmt {
            format,
            items: parts.collect(),
        }))
    }
}

pub(crate) fn extract_write(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["write".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let specs = specs_split_comma(&item.apply_map(rest[1..end].trim()));
    let items = split_comma(rest[end + 1..].trim())
        .into_iter()
        .map(|p| item.apply_map(&p))
        .collect();
    Extract::Node(Stmt::Write { specs, items })
}

fn paren_specs(item: &Item, keyword_len: usize) -> Option<Vec<String>> {
    let rest = item.text[keyword_len..].trim();
    let inner = if rest.starts_with('(') {
        let end = matching_paren(rest)?;
        if !rest[end + 1..].trim().is_empty() {
            return None;
        }
        rest[1..end].trim()
    } else {
        rest
    };
    Some(specs_split_comma(&item.apply_map(inner)))
}

pub(crate) fn extract_open(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    match paren_specs(item, "open".len()) {
        Some(specs) => Extract::Node(Stmt::Open { specs }),
        None => Extract::Invalid,
    }
}

pub(crate) fn extract_close(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    match paren_specs(item, "close".len()) {
        Some(specs) => Extract::Node(Stmt::Close { specs }),
        None => Extract::Invalid,
    }
}

pub(crate) fn extract_flush(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    if item.text["flush".len()..].trim().is_empty() {
        return Extract::Invalid;
    }
    match paren_specs(item, "flush".len()) {
        Some(specs) => Extract::Node(Stmt::Flush { specs }),
        None => Extract::Invalid,
    }
}

pub(crate) fn extract_wait(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    match paren_specs(item, "wait".len()) {
        Some(specs) => Extract::Node(Stmt::Wait { specs }),
        None => Extract::Invalid,
    }
}

pub(crate) fn extract_file_pos(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let (op, kw_len) = if item.text.starts_with("rewind") {
        (FilePosOp::Rewind, "rewind".len())
    } else if item.text.starts_with("backspace") {
        (FilePosOp::Backspace, "backspace".len())
    } else {
        (FilePosOp::Endfile, "endfile".len())
    };
    match paren_specs(item, kw_len) {
        Some(specs) if !specs.is_empty() => Extract::Node(Stmt::FilePos { op, specs }),
        _ => Extract::Invalid,
    }
}

pub(crate) fn extract_inquire(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["inquire".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let specs = specs_split_comma(&item.apply_map(rest[1..end].trim()));
    let items = split_comma(rest[end + 1..].trim())
        .into_iter()
        .map(|p| item.apply_map(&p))
        .collect();
    Extract::Node(Stmt::Inquire { specs, items })
}

pub(crate) fn extract_allocate(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["allocate".len()..].trim();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let inner = rest[1..end].trim();
    let (type_spec, list) = match find_str_depth0(inner, "::") {
        Some(i) => (
            parse_declaration_type_spec(&item.apply_map(inner[..i].trim())),
            inner[i + 2..].trim_start(),
        ),
        None => (None, inner),
    };
    Extract::Node(Stmt::Allocate {
        type_spec,
        items: specs_split_comma(&item.apply_map(list)),
    })
}

pub(crate) fn extract_deallocate(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["deallocate".len()..].trim();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    Extract::Node(Stmt::Deallocate {
        items: specs_split_comma(&item.apply_map(rest[1..end].trim())),
    })
}

pub(crate) fn extract_nullify(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["nullify".len()..].trim();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    Extract::Node(Stmt::Nullify {
        items: split_comma(&item.apply_map(rest[1..end].trim())),
    })
}

pub(crate) fn extract_arithmetic_if(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["if".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let expr = item.apply_map(rest[1..end].trim());
    let labels: Vec<&str> = rest[end + 1..].split(',').map(str::trim).collect();
    let [l1, l2, l3] = labels.as_slice() else {
        return Extract::Invalid;
    };
    if [l1, l2, l3].iter().any(|l| l.parse::<u32>().is_err()) {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::ArithmeticIf {
        expr,
        labels: [l1.to_string(), l2.to_string(), l3.to_string()],
    })
}

/// `IF ( <expr> ) action-stmt`. The remainder is classified against the
/// action-statement kinds; if none match, the whole attempt is invalid.
pub(crate) fn extract_action_if(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["if".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let after = rest[end + 1..].trim();
    if after.is_empty() || after == "then" {
        return Extract::Invalid;
    }
    let expr = item.apply_map(rest[1..end].trim());
    let sub = item.with_text(after);
    match classify(&sub, &ACTION_STMTS[..], ctx) {
        Classified::Stmt(node) => Extract::Node(Stmt::ActionIf {
            expr,
            action: Box::new(node),
        }),
        _ => Extract::Invalid,
    }
}

/// Single-statement `WHERE ( <mask> ) <assignment>`.
pub(crate) fn extract_where_stmt(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["where".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let after = rest[end + 1..].trim();
    if after.is_empty() {
        return Extract::Invalid;
    }
    let sub = item.with_text(after);
    match extract_assignment(&sub, ctx) {
        Extract::Node(stmt @ Stmt::Assignment { .. }) => Extract::Node(Stmt::WhereStmt {
            mask: item.apply_map(rest[1..end].trim()),
            assignment: Box::new(StmtNode::new(item.span, None, stmt)),
        }),
        _ => Extract::Invalid,
    }
}

/// Single-statement `FORALL <header> <assignment>`.
pub(crate) fn extract_forall_stmt(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["forall".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let after = rest[end + 1..].trim();
    if after.is_empty() {
        return Extract::Invalid;
    }
    let sub = item.with_text(after);
    match extract_assignment(&sub, ctx) {
        Extract::Node(stmt @ (Stmt::Assignment { .. } | Stmt::PointerAssignment { .. })) => {
            Extract::Node(Stmt::ForallStmt {
                header: item.apply_map(rest[1..end].trim()),
                assignment: Box::new(StmtNode::new(item.span, None, stmt)),
            })
        }
        _ => Extract::Invalid,
    }
}

pub(crate) fn extract_else(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let name = item.text["else".len()..].trim().to_string();
    warn_construct_name(&name, item, ctx, "if");
    Extract::Node(Stmt::Else { name })
}

pub(crate) fn extract_else_if(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["else".len()..].trim_start();
    let rest = rest["if".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let after = rest[end + 1..].trim_start();
    let Some(name) = after.strip_prefix("then") else {
        return Extract::Invalid;
    };
    let name = name.trim().to_string();
    warn_construct_name(&name, item, ctx, "if");
    Extract::Node(Stmt::ElseIf {
        expr: item.apply_map(rest[1..end].trim()),
        name,
    })
}

pub(crate) fn extract_else_where(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["else".len()..].trim_start();
    let mut rest = rest["where".len()..].trim_start();
    let mut expr = None;
    if rest.starts_with('(') {
        let Some(end) = matching_paren(rest) else {
            return Extract::Invalid;
        };
        expr = Some(item.apply_map(rest[1..end].trim()));
        rest = rest[end + 1..].trim_start();
    }
    let name = rest.trim().to_string();
    warn_construct_name(&name, item, ctx, "where");
    Extract::Node(Stmt::ElseWhere { expr, name })
}

fn warn_construct_name(name: &str, item: &Item, ctx: &mut Ctx<'_, '_>, what: &str) {
    if !name.is_empty() && name != ctx.block_name {
        ctx.diags.warn(
            DiagKind::StructuralMismatch,
            item.span,
            format!(
                "expected {what} construct name `{}` but got `{name}`",
                ctx.block_name
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_assign_sign() {
        assert_eq!(find_assign_sign("x = 1"), Some((2, false)));
        assert_eq!(find_assign_sign("p => q"), Some((2, true)));
        assert_eq!(find_assign_sign("a(i=1)"), None);
        assert_eq!(find_assign_sign("a == b"), None);
        assert_eq!(find_assign_sign("a <= b"), None);
        // The relational is consumed, the real assignment found.
        assert_eq!(find_assign_sign("mask = a == b"), Some((5, false)));
    }

    #[test]
    fn test_assignable_target() {
        assert!(is_assignable_target("x"));
        assert!(is_assignable_target("a(1,2)"));
        assert!(is_assignable_target("obj % field"));
        assert!(!is_assignable_target("if (x) y"));
        assert!(!is_assignable_target("where (m) v"));
        assert!(!is_assignable_target("1x"));
        assert!(!is_assignable_target("a, b"));
    }
}
