//! Integration tests for the semantic analysis pass: implicit typing,
//! symbol tables, USE/CONTAINS handling, and the diagnostics they produce.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use fparse::parse::block::{BlockKind, BlockNode};
use fparse::parse::stmt::Stmt;
use fparse::parse::typedecl::BaseType;
use fparse::parse::{parse_source, Parsed};
use fparse::sema::analyze;
use fparse::{Config, DiagKind, Dialect};

fn analyzed(src: &str, dialect: Dialect) -> Parsed {
    let mut parsed = parse_source(src, dialect, &Config::default()).expect("parse");
    analyze(&mut parsed);
    parsed
}

fn unit_block(parsed: &Parsed, n: usize) -> &BlockNode {
    parsed
        .root
        .children
        .iter()
        .filter_map(|c| match &c.stmt {
            Stmt::Block(b) => Some(b),
            _ => None,
        })
        .nth(n)
        .expect("program unit")
}

#[test]
fn test_default_implicit_typing() {
    let parsed = analyzed("program p\nend program p\n", Dialect::Free90);
    let scope = unit_block(&parsed, 0).scope.as_ref().expect("scope");
    assert_eq!(scope.implicit_type("i").unwrap().base, BaseType::Integer);
    assert_eq!(scope.implicit_type("n").unwrap().base, BaseType::Integer);
    assert_eq!(scope.implicit_type("x").unwrap().base, BaseType::Real);
    assert_eq!(scope.implicit_type("a").unwrap().base, BaseType::Real);
}

#[test]
fn test_implicit_double_precision_range() {
    let parsed = analyzed(
        "program p\nimplicit double precision (d)\nend program p\n",
        Dialect::Free90,
    );
    let scope = unit_block(&parsed, 0).scope.as_ref().expect("scope");
    assert_eq!(
        scope.implicit_type("d").unwrap().base,
        BaseType::DoublePrecision
    );
    // All other letters keep their standard default.
    assert_eq!(scope.implicit_type("e").unwrap().base, BaseType::Real);
    assert_eq!(scope.implicit_type("i").unwrap().base, BaseType::Integer);
}

#[test]
fn test_implicit_none() {
    let parsed = analyzed(
        "program p\nimplicit none\ninteger :: i\nend program p\n",
        Dialect::Free90,
    );
    let scope = unit_block(&parsed, 0).scope.as_ref().expect("scope");
    assert!(scope.implicit_type("x").is_none());
    assert!(scope.variable("i").is_some());
}

#[test]
fn test_implicit_conflict() {
    let parsed = analyzed(
        "program p\nimplicit none\nimplicit integer (q)\nend program p\n",
        Dialect::Free90,
    );
    assert_eq!(
        parsed
            .diagnostics
            .of_kind(DiagKind::ImplicitConflict)
            .count(),
        1
    );
    // IMPLICIT NONE wins; the later range is dropped.
    let scope = unit_block(&parsed, 0).scope.as_ref().expect("scope");
    assert!(scope.implicit_type("q").is_none());
}

#[test]
fn test_redeclaration_reports_and_keeps_first() {
    let parsed = analyzed(
        "program p\ninteger :: a\ninteger :: a\nend program p\n",
        Dialect::Free90,
    );
    assert_eq!(
        parsed.diagnostics.of_kind(DiagKind::Redeclaration).count(),
        1
    );
    let scope = unit_block(&parsed, 0).scope.as_ref().expect("scope");
    assert!(scope.variable("a").is_some());
    assert_eq!(scope.variables.len(), 1);
}

#[test]
fn test_dummy_arguments_are_preseeded_and_refined() {
    let parsed = analyzed(
        "subroutine f(x, y)\ninteger x\nend subroutine f\n",
        Dialect::Free90,
    );
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let scope = unit_block(&parsed, 0).scope.as_ref().expect("scope");

    let x = scope.variable("x").expect("x");
    assert!(x.is_dummy);
    assert_eq!(x.typespec.as_ref().unwrap().base, BaseType::Integer);

    // Undeclared dummy stays implicit-typed.
    let y = scope.variable("y").expect("y");
    assert!(y.is_dummy);
    assert!(y.typespec.is_none());
    assert_eq!(scope.implicit_type("y").unwrap().base, BaseType::Real);
}

#[test]
fn test_function_result_type() {
    let parsed = analyzed(
        "module m\ncontains\ninteger function f(x)\nf = x\nend function f\nend module m\n",
        Dialect::Free90,
    );
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let module = unit_block(&parsed, 0);
    let f = module.nested_subprograms()[0];
    let scope = f.scope.as_ref().expect("function scope");
    let result = scope.variable("f").expect("result var");
    assert!(result.is_result);
    assert_eq!(result.typespec.as_ref().unwrap().base, BaseType::Integer);
}

#[test]
fn test_function_result_clause() {
    let parsed = analyzed(
        "function g(x) result(r)\nreal :: r\nr = x\nend function g\n",
        Dialect::Free90,
    );
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let g = unit_block(&parsed, 0);
    let scope = g.scope.as_ref().expect("scope");
    let r = scope.variable("r").expect("result var");
    assert!(r.is_result);
    assert_eq!(r.typespec.as_ref().unwrap().base, BaseType::Real);
}

#[test]
fn test_contains_gates_subprogram_table() {
    let parsed = analyzed(
        "\
module m
integer :: shared
contains
subroutine a()
end subroutine a
subroutine b()
end subroutine b
end module m
",
        Dialect::Free90,
    );
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let module = unit_block(&parsed, 0);
    let scope = module.scope.as_ref().expect("scope");
    assert_eq!(scope.subprograms, vec!["a", "b"]);
    let nested = module.nested_subprograms();
    assert_eq!(nested.len(), 2);
    assert_eq!(nested[0].kind, BlockKind::Subroutine);
}

#[test]
fn test_subprogram_before_contains_is_an_error() {
    let parsed = analyzed(
        "\
module m
subroutine early()
end subroutine early
contains
subroutine late()
end subroutine late
end module m
",
        Dialect::Free90,
    );
    assert_eq!(parsed.diagnostics.of_kind(DiagKind::ScopeOrder).count(), 1);
    let module = unit_block(&parsed, 0);
    let scope = module.scope.as_ref().expect("scope");
    // The offender is not recorded; the legal one is.
    assert_eq!(scope.subprograms, vec!["late"]);
}

#[test]
fn test_duplicate_contains_and_decl_after_contains() {
    let parsed = analyzed(
        "\
module m
contains
contains
integer :: x
end module m
",
        Dialect::Free90,
    );
    assert_eq!(parsed.diagnostics.of_kind(DiagKind::ScopeOrder).count(), 2);
    let scope = unit_block(&parsed, 0).scope.as_ref().expect("scope");
    assert!(scope.variable("x").is_none());
}

#[test]
fn test_use_table() {
    let parsed = analyzed(
        "\
module m
use iso_c_binding
use helpers, only: interp, extrap
end module m
",
        Dialect::Free90,
    );
    let scope = unit_block(&parsed, 0).scope.as_ref().expect("scope");
    let uses = scope.used_modules();
    assert_eq!(uses.len(), 2);
    assert_eq!(uses[0].module, "iso_c_binding");
    assert!(uses[0].only.is_none());
    assert_eq!(uses[1].module, "helpers");
    assert_eq!(
        uses[1].only.as_deref(),
        Some(["interp".to_string(), "extrap".into()].as_slice())
    );
}

#[test]
fn test_derived_type_table_and_components() {
    let parsed = analyzed(
        "\
module m
type point
  real :: x
  real :: y
end type point
type(point) :: origin
end module m
",
        Dialect::Free90,
    );
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let module = unit_block(&parsed, 0);
    let scope = module.scope.as_ref().expect("scope");
    assert!(scope.type_decls.contains_key("point"));

    let point = module.child_block("point").expect("type block");
    assert_eq!(point.kind, BlockKind::DerivedType);
    let type_scope = point.scope.as_ref().expect("type scope");
    assert!(type_scope.variable("x").is_some());
    assert!(type_scope.variable("y").is_some());

    // The variable of the derived type landed in the module scope.
    let origin = scope.variable("origin").expect("origin");
    assert_eq!(origin.typespec.as_ref().unwrap().base, BaseType::Derived);
    assert_eq!(
        origin.typespec.as_ref().unwrap().type_name.as_deref(),
        Some("point")
    );
}

#[test]
fn test_file_level_tables() {
    let parsed = analyzed(
        "\
module alpha
end module alpha
subroutine ext()
end subroutine ext
",
        Dialect::Free90,
    );
    let scope = parsed.root.scope.as_ref().expect("file scope");
    assert_eq!(scope.modules, vec!["alpha"]);
    assert_eq!(scope.subprograms, vec!["ext"]);
    assert!(parsed.root.child_block("alpha").is_some());
}

#[test]
fn test_cross_module_lookup_is_read_only() {
    let parsed = analyzed(
        "\
module defs
integer :: answer
end module defs
program p
use defs
end program p
",
        Dialect::Free90,
    );
    // Looking up an entity defined in another module reads its completed
    // scope.
    let program = unit_block(&parsed, 1);
    let use_info = &program.scope.as_ref().unwrap().used_modules()[0];
    let defs = parsed.root.child_block(&use_info.module).expect("module");
    let answer = defs.scope.as_ref().unwrap().variable("answer");
    assert!(answer.is_some());
}
