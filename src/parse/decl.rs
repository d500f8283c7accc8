//! Extractors for specification statements and signature-file directives.

use std::sync::LazyLock;

use regex::Regex;

use crate::diag::DiagKind;
use crate::parse::catalog::{Ctx, Extract};
use crate::parse::patterns;
use crate::parse::stmt::{
    find_depth0, is_name, matching_paren, split_comma, specs_split_comma, NamesKind, Stmt,
};
use crate::source::Item;

static PREFIX_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((pure|elemental|recursive)\b\s*)+").expect("prefix words pattern")
});

static ENTRY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)").expect("entry name pattern"));

/// `<keyword> [ :: ] <name-list>` statements.
pub(crate) fn extract_names(
    kind: NamesKind,
    kw_len: usize,
    item: &Item,
    _ctx: &mut Ctx<'_, '_>,
) -> Extract {
    let mut rest = item.text[kw_len..].trim_start();
    rest = rest.strip_prefix("::").unwrap_or(rest).trim_start();
    Extract::Node(Stmt::Names {
        kind,
        items: split_comma(rest),
    })
}

pub(crate) fn extract_use(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut rest = item.text["use".len()..].trim_start();
    let mut nature = String::new();
    if rest.starts_with(',') {
        let Some(i) = rest.find("::") else {
            return Extract::Invalid;
        };
        nature = rest[1..i].trim().to_string();
        rest = rest[i + 2..].trim_start();
    }
    rest = rest.strip_prefix("::").unwrap_or(rest).trim_start();
    if !nature.is_empty() && !is_name(&nature) {
        return Extract::Invalid;
    }

    let (module, only, items) = match find_depth0(rest, ',') {
        None => (rest.to_string(), false, Vec::new()),
        Some(i) => {
            let module = rest[..i].trim().to_string();
            let tail = rest[i + 1..].trim_start();
            if let Some(after) = tail.strip_prefix("only") {
                let after = after.trim_start();
                let Some(list) = after.strip_prefix(':') else {
                    return Extract::Invalid;
                };
                (module, true, split_comma(list))
            } else {
                (module, false, split_comma(tail))
            }
        }
    };
    if !is_name(&module) {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Use {
        nature,
        module,
        only,
        items,
    })
}

pub(crate) fn extract_parameter(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["parameter".len()..].trim();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    Extract::Node(Stmt::Parameter {
        items: split_comma(&item.apply_map(rest[1..end].trim())),
    })
}

pub(crate) fn extract_common(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut line = item.text["common".len()..].trim_start();
    let mut blocks = Vec::new();
    while !line.is_empty() {
        let name = if line.starts_with('/') {
            let Some(i) = line[1..].find('/') else {
                return Extract::Invalid;
            };
            let name = line[1..=i].trim().to_string();
            line = line[i + 2..].trim_start();
            name
        } else {
            if !blocks.is_empty() {
                return Extract::Invalid;
            }
            String::new()
        };
        match line.find('/') {
            None => {
                blocks.push((name, split_comma(line)));
                line = "";
            }
            Some(i) => {
                let objs = line[..i].trim_end().trim_end_matches(',').trim_end();
                blocks.push((name, split_comma(objs)));
                line = line[i..].trim_start();
            }
        }
    }
    if blocks.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Common { blocks })
}

pub(crate) fn extract_data(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut line = item.text["data".len()..].trim_start();
    let mut sets = Vec::new();
    while !line.is_empty() {
        let Some(i) = line.find('/') else {
            return Extract::Invalid;
        };
        let Some(j) = line[i + 1..].find('/').map(|j| i + 1 + j) else {
            return Extract::Invalid;
        };
        let objs = split_comma(line[..i].trim_end());
        let vals: Vec<String> = split_comma(line[i + 1..j].trim())
            .into_iter()
            .map(|v| item.apply_map(&v))
            .collect();
        sets.push((objs, vals));
        line = line[j + 1..].trim_start();
        line = line.strip_prefix(',').unwrap_or(line).trim_start();
    }
    if sets.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Data { sets })
}

pub(crate) fn extract_namelist(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut line = item.text["namelist".len()..].trim_start();
    let mut groups = Vec::new();
    while !line.is_empty() {
        if !line.starts_with('/') {
            return Extract::Invalid;
        }
        let Some(i) = line[1..].find('/').map(|i| i + 1) else {
            return Extract::Invalid;
        };
        let name = line[..=i].to_string();
        line = line[i + 1..].trim_start();
        match line.find('/') {
            None => {
                groups.push((name, line.trim().to_string()));
                line = "";
            }
            Some(j) => {
                let objs = line[..j].trim_end().trim_end_matches(',').trim_end();
                groups.push((name, objs.to_string()));
                line = &line[j..];
            }
        }
    }
    if groups.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Namelist { groups })
}

pub(crate) fn extract_equivalence(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["equivalence".len()..].trim();
    let mut items = Vec::new();
    for group in split_comma(rest) {
        if !group.starts_with('(') || !group.ends_with(')') {
            return Extract::Invalid;
        }
        let inner = split_comma(&group[1..group.len() - 1]).join(", ");
        items.push(format!("({inner})"));
    }
    if items.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Equivalence { items })
}

pub(crate) fn extract_save(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut rest = item.text["save".len()..].trim_start();
    rest = rest.strip_prefix("::").unwrap_or(rest).trim_start();
    let mut items = Vec::new();
    for s in split_comma(rest) {
        if let Some(inner) = s.strip_prefix('/').and_then(|s| s.strip_suffix('/')) {
            let inner = inner.trim();
            if !is_name(inner) {
                return Extract::Invalid;
            }
            items.push(format!("/{inner}/"));
        } else if is_name(&s) {
            items.push(s);
        } else {
            return Extract::Invalid;
        }
    }
    Extract::Node(Stmt::Save { items })
}

pub(crate) fn extract_intent(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["intent".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let specs = specs_split_comma(&item.apply_map(rest[1..end].trim()));
    let mut tail = rest[end + 1..].trim_start();
    tail = tail.strip_prefix("::").unwrap_or(tail).trim_start();
    let items = split_comma(tail);
    if items.iter().any(|n| !is_name(n)) {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Intent { specs, items })
}

pub(crate) fn extract_access(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let (private, kw_len) = if item.text.starts_with("private") {
        (true, "private".len())
    } else {
        (false, "public".len())
    };
    let mut rest = item.text[kw_len..].trim_start();
    rest = rest.strip_prefix("::").unwrap_or(rest).trim_start();
    Extract::Node(Stmt::Access {
        private,
        items: split_comma(rest),
    })
}

pub(crate) fn extract_sequence(_item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    Extract::Node(Stmt::Sequence)
}

pub(crate) fn extract_entry(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["entry".len()..].trim_start();
    let Some(caps) = ENTRY_NAME_RE.captures(rest) else {
        return Extract::Invalid;
    };
    let name = caps[1].to_string();
    let mut line = rest[name.len()..].trim_start();

    let mut args = Vec::new();
    if line.starts_with('(') {
        let Some(end) = matching_paren(line) else {
            return Extract::Invalid;
        };
        args = split_comma(&line[1..end]);
        line = line[end + 1..].trim_start();
    }

    let mut binds = Vec::new();
    let mut result = String::new();
    for _ in 0..2 {
        if let Some(after) = line.strip_prefix("bind") {
            let after = after.trim_start();
            let Some(end) = matching_paren(after) else {
                return Extract::Invalid;
            };
            if !binds.is_empty() {
                return Extract::Invalid;
            }
            binds = split_comma(&item.apply_map(&after[1..end]));
            line = after[end + 1..].trim_start();
        } else if let Some(after) = line.strip_prefix("result") {
            let after = after.trim_start();
            let Some(end) = matching_paren(after) else {
                return Extract::Invalid;
            };
            let r = after[1..end].trim();
            if !is_name(r) || !result.is_empty() {
                return Extract::Invalid;
            }
            result = r.to_string();
            line = after[end + 1..].trim_start();
        }
    }
    if !line.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Entry {
        name,
        args,
        result,
        binds,
    })
}

pub(crate) fn extract_format(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    if item.label.is_none() {
        ctx.diags.warn(
            DiagKind::StructuralMismatch,
            item.span,
            "format statement should carry a statement label",
        );
    }
    let rest = item.text["format".len()..].trim();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    Extract::Node(Stmt::Format {
        specs: split_comma(&item.apply_map(rest[1..end].trim())),
    })
}

pub(crate) fn extract_module_procedure(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let Some(m) = patterns::MODULE_PROCEDURE_RE.find(&item.text) else {
        return Extract::Invalid;
    };
    let items = split_comma(item.text[m.end()..].trim());
    if items.is_empty() || items.iter().any(|n| !is_name(n)) {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Names {
        kind: NamesKind::ModuleProcedure,
        items,
    })
}

pub(crate) fn extract_contains(_item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    Extract::Node(Stmt::Contains)
}

/// `recursive integer function f(x)` and friends: split the prefix words
/// off and requeue the remainder. When the remainder is already a plain
/// subprogram header the attempt is invalid instead, leaving the line for
/// the subprogram begin-kinds (whose patterns accept the prefix in place).
pub(crate) fn extract_subprogram_prefix(item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
    let Some(m) = PREFIX_WORDS_RE.find(&item.text) else {
        return Extract::Invalid;
    };
    let prefix = item.text[..m.end()].trim().to_string();
    let rest = item.text[m.end()..].trim_start();
    if rest.is_empty() {
        return Extract::Invalid;
    }
    if patterns::SUBROUTINE_RE.is_match(rest) || patterns::FUNCTION_RE.is_match(rest) {
        return Extract::Invalid;
    }
    if !rest.contains("function") && !rest.contains("subroutine") {
        return Extract::Invalid;
    }
    ctx.source.push_back(item.with_text(rest));
    Extract::Node(Stmt::SubprogramPrefix { prefix })
}

pub(crate) fn extract_bind(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["bind".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let specs = specs_split_comma(&item.apply_map(rest[1..end].trim()));
    let mut tail = rest[end + 1..].trim_start();
    tail = tail.strip_prefix("::").unwrap_or(tail).trim_start();
    let mut items = Vec::new();
    for entity in split_comma(tail) {
        if let Some(inner) = entity.strip_prefix('/').and_then(|e| e.strip_suffix('/')) {
            items.push(format!("/ {} /", inner.trim()));
        } else {
            items.push(entity);
        }
    }
    Extract::Node(Stmt::Bind { specs, items })
}

pub(crate) fn extract_enumerator(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut rest = item.text["enumerator".len()..].trim_start();
    rest = rest.strip_prefix("::").unwrap_or(rest).trim_start();
    if rest.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Enumerator {
        items: item.apply_map(rest),
    })
}

pub(crate) fn extract_proc_binding(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut rest = item.text["procedure".len()..].trim_start();
    let mut iname = String::new();
    if rest.starts_with('(') {
        let Some(end) = matching_paren(rest) else {
            return Extract::Invalid;
        };
        iname = rest[1..end].trim().to_string();
        rest = rest[end + 1..].trim_start();
    }
    rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    let mut attrs = Vec::new();
    if let Some(i) = rest.find("::") {
        attrs = split_comma(rest[..i].trim())
            .into_iter()
            .map(|a| a.to_uppercase())
            .collect();
        rest = rest[i + 2..].trim_start();
    }
    let (name, target) = match rest.find("=>") {
        None => (rest.trim().to_string(), String::new()),
        Some(i) => (
            rest[..i].trim().to_string(),
            rest[i + 2..].trim().to_string(),
        ),
    };
    if !is_name(&name) {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::ProcBinding {
        iname,
        attrs,
        name,
        target,
    })
}

pub(crate) fn extract_generic_binding(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let mut rest = item.text["generic".len()..].trim_start();
    let mut access = String::new();
    if rest.starts_with(',') {
        let Some(i) = rest.find("::") else {
            return Extract::Invalid;
        };
        access = rest[1..i].trim().to_uppercase();
        rest = &rest[i..];
    }
    let Some(rest2) = rest.strip_prefix("::") else {
        return Extract::Invalid;
    };
    let rest2 = rest2.trim_start();
    let Some(i) = rest2.find("=>") else {
        return Extract::Invalid;
    };
    Extract::Node(Stmt::GenericBinding {
        access,
        spec: item.apply_map(rest2[..i].trim()),
        targets: split_comma(rest2[i + 2..].trim()),
    })
}

// ===== Signature-file directives =====

pub(crate) fn extract_fortran_name(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    Extract::Node(Stmt::FortranName {
        value: item.apply_map(item.text["fortranname".len()..].trim()),
    })
}

pub(crate) fn extract_threadsafe(_item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    Extract::Node(Stmt::Threadsafe)
}

pub(crate) fn extract_depend(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["depend".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let depends = split_comma(&rest[1..end]);
    let mut tail = rest[end + 1..].trim_start();
    tail = tail.strip_prefix("::").unwrap_or(tail).trim_start();
    let items = split_comma(tail);
    if depends.is_empty() || items.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Depend { depends, items })
}

pub(crate) fn extract_check(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let rest = item.text["check".len()..].trim_start();
    let Some(end) = matching_paren(rest) else {
        return Extract::Invalid;
    };
    let expr = item.apply_map(rest[1..end].trim());
    let mut tail = rest[end + 1..].trim_start();
    tail = tail.strip_prefix("::").unwrap_or(tail).trim_start();
    let items = split_comma(tail);
    if items.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::Check { expr, items })
}

pub(crate) fn extract_call_statement(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let expr = item.apply_map(item.text["callstatement".len()..].trim());
    if expr.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::CallStatement { expr })
}

pub(crate) fn extract_call_proto_argument(item: &Item, _ctx: &mut Ctx<'_, '_>) -> Extract {
    let specs = item.apply_map(item.text["callprotoargument".len()..].trim());
    if specs.is_empty() {
        return Extract::Invalid;
    }
    Extract::Node(Stmt::CallProtoArgument { specs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Span;
    use std::rc::Rc;

    fn item(text: &str) -> Item {
        Item::new(text.to_string(), Span::line(1), Rc::new(vec![]))
    }

    // A throwaway context for extractors that never touch the source.
    struct NullSource;
    impl crate::source::ItemSource for NullSource {
        fn dialect(&self) -> crate::source::Dialect {
            crate::source::Dialect::Free90
        }
        fn next_item(&mut self) -> crate::error::Result<Option<Item>> {
            Ok(None)
        }
        fn push_back(&mut self, _item: Item) {}
    }

    fn with_ctx<F: FnOnce(&mut Ctx<'_, '_>) -> Extract>(f: F) -> Extract {
        let mut source = NullSource;
        let mut diags = crate::diag::Diagnostics::new();
        let mut ctx = Ctx {
            source: &mut source,
            diags: &mut diags,
            block_kind: crate::parse::block::BlockKind::Unit,
            block_name: "",
        };
        f(&mut ctx)
    }

    #[test]
    fn test_use_only() {
        let it = item("use mod_a, only: x, y => z");
        let Extract::Node(Stmt::Use { module, only, items, .. }) =
            with_ctx(|ctx| extract_use(&it, ctx))
        else {
            panic!("expected use");
        };
        assert_eq!(module, "mod_a");
        assert!(only);
        assert_eq!(items, vec!["x", "y => z"]);
    }

    #[test]
    fn test_use_plain() {
        let it = item("use iso_c_binding");
        let Extract::Node(Stmt::Use { module, only, items, .. }) =
            with_ctx(|ctx| extract_use(&it, ctx))
        else {
            panic!("expected use");
        };
        assert_eq!(module, "iso_c_binding");
        assert!(!only);
        assert!(items.is_empty());
    }

    #[test]
    fn test_common_blocks() {
        let it = item("common /blk/ a, b /blk2/ c");
        let Extract::Node(Stmt::Common { blocks }) = with_ctx(|ctx| extract_common(&it, ctx))
        else {
            panic!("expected common");
        };
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].0, "blk");
        assert_eq!(blocks[0].1, vec!["a", "b"]);
        assert_eq!(blocks[1].0, "blk2");
    }

    #[test]
    fn test_data_sets() {
        let it = item("data a, b /1, 2/ c /3/");
        let Extract::Node(Stmt::Data { sets }) = with_ctx(|ctx| extract_data(&it, ctx)) else {
            panic!("expected data");
        };
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].0, vec!["a", "b"]);
        assert_eq!(sets[0].1, vec!["1", "2"]);
    }

    #[test]
    fn test_intent_names_validated() {
        let it = item("intent(in) a, b");
        assert!(matches!(
            with_ctx(|ctx| extract_intent(&it, ctx)),
            Extract::Node(Stmt::Intent { .. })
        ));
        let bad = item("intent(in) a + b");
        assert!(matches!(
            with_ctx(|ctx| extract_intent(&bad, ctx)),
            Extract::Invalid
        ));
    }

    #[test]
    fn test_module_procedure_requires_names() {
        let it = item("module procedure interp_1d, interp_2d");
        assert!(matches!(
            with_ctx(|ctx| extract_module_procedure(&it, ctx)),
            Extract::Node(Stmt::Names {
                kind: NamesKind::ModuleProcedure,
                ..
            })
        ));
        // `procedure :: foo` is a type-bound binding, not a procedure list.
        let bound = item("procedure :: foo");
        assert!(matches!(
            with_ctx(|ctx| extract_module_procedure(&bound, ctx)),
            Extract::Invalid
        ));
    }

    #[test]
    fn test_prefix_leaves_plain_headers_alone() {
        let plain = item("recursive subroutine f(x)");
        assert!(matches!(
            with_ctx(|ctx| extract_subprogram_prefix(&plain, ctx)),
            Extract::Invalid
        ));
        let typed = item("recursive integer function f(x)");
        assert!(matches!(
            with_ctx(|ctx| extract_subprogram_prefix(&typed, ctx)),
            Extract::Node(Stmt::SubprogramPrefix { .. })
        ));
    }
}
