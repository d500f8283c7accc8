//! The semantic analysis pass.
//!
//! Runs once per scope after that scope's block is fully parsed, in a fixed
//! order: USE statements first (imported names are referenceable before
//! local declarations), then IMPLICIT resolution (defaults synthesized when
//! no statement overrides them), then the remaining children in source
//! order. Subprogram dummy arguments and function result names are
//! pre-seeded so declarations refine rather than redeclare them.

pub mod scope;

use crate::diag::{DiagKind, Diagnostics};
use crate::parse::block::{BlockKind, BlockNode, Header};
use crate::parse::stmt::{NamesKind, Stmt};
use crate::parse::typedecl::TypeDeclStmt;
use crate::parse::Parsed;
use crate::source::Span;

use self::scope::{entity_parts, Scope, UseInfo, VarInfo};

/// Analyze a parsed tree in place, attaching scopes to scope-bearing
/// blocks and appending findings to the parse diagnostics.
pub fn analyze(parsed: &mut Parsed) {
    analyze_scope(&mut parsed.root, &mut parsed.diagnostics);
}

/// Whether subprogram definitions are recorded directly in this block,
/// without a CONTAINS marker.
fn records_subprograms_directly(kind: BlockKind) -> bool {
    matches!(
        kind,
        BlockKind::Unit | BlockKind::Interface | BlockKind::SigModule
    )
}

pub(crate) fn analyze_scope(block: &mut BlockNode, diags: &mut Diagnostics) {
    let mut scope = Scope::new();
    let block_kind = block.kind;

    // Dummy arguments and the function result are referenceable before any
    // declaration names them.
    if let Header::Subprogram(h) = &block.header {
        for arg in &h.args {
            if arg == "*" {
                continue;
            }
            let mut var = VarInfo::new(arg.clone());
            var.is_dummy = true;
            scope.variables.entry(arg.clone()).or_insert(var);
        }
        if block.kind == BlockKind::Function {
            let result = h.result.clone().unwrap_or_else(|| block.name.clone());
            let mut var = VarInfo::new(result.clone());
            var.is_result = true;
            var.typespec = h.return_type.clone();
            scope.variables.entry(result).or_insert(var);
        }
    }

    // Pass 1: USE statements.
    for child in &block.children {
        if let Stmt::Use { module, only, items, .. } = &child.stmt {
            scope.uses.push(UseInfo {
                module: module.clone(),
                only: only.then(|| items.clone()),
                renames: if *only { Vec::new() } else { items.clone() },
            });
        }
    }

    // Pass 2: IMPLICIT resolution.
    for child in &block.children {
        let Stmt::Implicit { items } = &child.stmt else {
            continue;
        };
        if items.is_empty() {
            if scope.implicit.has_explicit_rules() {
                diags.error(
                    DiagKind::ImplicitConflict,
                    child.span,
                    "IMPLICIT NONE cannot follow explicit implicit ranges",
                );
            }
            scope.implicit.set_none();
        } else if scope.implicit.is_none_rule() {
            diags.error(
                DiagKind::ImplicitConflict,
                child.span,
                "explicit implicit ranges cannot be combined with IMPLICIT NONE",
            );
        } else {
            for imp in items {
                for &(start, end) in &imp.ranges {
                    scope.implicit.add_range(start, end, &imp.spec);
                }
            }
        }
    }
    scope.implicit.initialize();

    // Pass 3: remaining children in source order.
    let mut contains_seen = false;
    for idx in 0..block.children.len() {
        let child_span = block.children[idx].span;
        match &mut block.children[idx].stmt {
            Stmt::TypeDecl(decl) => {
                if contains_seen {
                    diags.error(
                        DiagKind::ScopeOrder,
                        child_span,
                        "declaration after CONTAINS is ignored",
                    );
                } else {
                    apply_decl(&mut scope, decl, child_span, diags);
                }
            }
            Stmt::Contains => {
                if contains_seen {
                    diags.error(
                        DiagKind::ScopeOrder,
                        child_span,
                        "duplicate CONTAINS statement",
                    );
                }
                contains_seen = true;
            }
            Stmt::Names { kind: NamesKind::ModuleProcedure, items } => {
                scope.module_procedures.extend(items.iter().cloned());
            }
            Stmt::Block(b) => match b.kind {
                BlockKind::Subroutine | BlockKind::Function => {
                    analyze_scope(b, diags);
                    if contains_seen || records_subprograms_directly(block_kind) {
                        scope.subprograms.push(b.name.clone());
                    } else {
                        diags.error(
                            DiagKind::ScopeOrder,
                            b.span,
                            format!(
                                "subprogram `{}` defined before CONTAINS is not recorded",
                                b.name
                            ),
                        );
                    }
                }
                BlockKind::DerivedType => {
                    let name = b.name.clone();
                    analyze_scope(b, diags);
                    if scope.type_decls.contains_key(&name) {
                        diags.error(
                            DiagKind::Redeclaration,
                            child_span,
                            format!("derived type `{name}` is already defined in this scope"),
                        );
                    } else {
                        scope.type_decls.insert(name, idx);
                    }
                }
                BlockKind::Module => {
                    analyze_scope(b, diags);
                    scope.modules.push(b.name.clone());
                }
                BlockKind::SigModule
                | BlockKind::Program
                | BlockKind::BlockData
                | BlockKind::Interface => {
                    analyze_scope(b, diags);
                }
                _ => {}
            },
            _ => {}
        }
    }

    block.scope = Some(Box::new(scope));
}

fn apply_decl(scope: &mut Scope, decl: &TypeDeclStmt, span: Span, diags: &mut Diagnostics) {
    for entity in &decl.entities {
        let Some((name, dims, init)) = entity_parts(entity) else {
            continue;
        };
        match scope.variables.get_mut(&name) {
            None => {
                let mut var = VarInfo::new(name.clone());
                var.typespec = Some(decl.spec.clone());
                var.attrs = decl.attrs.clone();
                var.dims = dims;
                var.init = init;
                scope.variables.insert(name, var);
            }
            Some(var) if var.typespec.is_none() => {
                // A pre-seeded dummy or result entry: the declaration
                // refines it.
                var.typespec = Some(decl.spec.clone());
                var.attrs.extend(decl.attrs.iter().cloned());
                if dims.is_some() {
                    var.dims = dims;
                }
                if init.is_some() {
                    var.init = init;
                }
            }
            Some(_) => {
                diags.error(
                    DiagKind::Redeclaration,
                    span,
                    format!("`{name}` is already declared in this scope; keeping the first declaration"),
                );
            }
        }
    }
}
