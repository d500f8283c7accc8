//! Integration tests for the parse engine
//!
//! These tests drive full sources through the reader, the classification
//! engine, and the block builder.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use fparse::parse::block::{BlockKind, BlockNode, Header};
use fparse::parse::stmt::{ReadForm, Stmt};
use fparse::parse::{parse_source, Parsed};
use fparse::{Config, DiagKind, Dialect};

fn parse(src: &str, dialect: Dialect) -> Parsed {
    parse_source(src, dialect, &Config::default()).expect("parse should not abort")
}

/// The n-th block child of a node.
fn block_child(node: &BlockNode, n: usize) -> &BlockNode {
    node.children
        .iter()
        .filter_map(|c| match &c.stmt {
            Stmt::Block(b) => Some(b),
            _ => None,
        })
        .nth(n)
        .unwrap_or_else(|| panic!("no block child #{n} in {}", node.kind))
}

#[test]
fn test_subroutine_end_to_end() {
    let src = "subroutine f(x)\ninteger x\nx = x + 1\nend subroutine f\n";
    let parsed = parse(src, Dialect::Free90);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

    let sub = block_child(&parsed.root, 0);
    assert_eq!(sub.kind, BlockKind::Subroutine);
    assert_eq!(sub.name, "f");
    let Header::Subprogram(h) = &sub.header else {
        panic!("expected subprogram header");
    };
    assert_eq!(h.args, vec!["x"]);

    assert_eq!(sub.children.len(), 2);
    let Stmt::TypeDecl(decl) = &sub.children[0].stmt else {
        panic!("expected declaration, got {:?}", sub.children[0].stmt);
    };
    assert_eq!(decl.entity_names(), vec!["x"]);
    let Stmt::Assignment { target, expr } = &sub.children[1].stmt else {
        panic!("expected assignment, got {:?}", sub.children[1].stmt);
    };
    assert_eq!(target, "x");
    assert_eq!(expr, "x + 1");

    assert_eq!(sub.end.as_ref().unwrap().name.as_deref(), Some("f"));
}

#[test]
fn test_unterminated_if_is_reported_not_fatal() {
    let src = "program p\nif (a > 0) then\nx = 1\n";
    let parsed = parse(src, Dialect::Free90);
    assert!(
        parsed
            .diagnostics
            .of_kind(DiagKind::StructuralMismatch)
            .count()
            >= 1,
        "expected an unterminated-block diagnostic"
    );
    // The partial tree is still there.
    let program = block_child(&parsed.root, 0);
    let if_block = block_child(program, 0);
    assert_eq!(if_block.kind, BlockKind::IfThen);
    assert_eq!(if_block.children.len(), 1);
    assert!(if_block.end.is_none());
}

#[test]
fn test_do_nesting_preserved() {
    let src = "\
program p
do i = 1, 3
  do j = 1, 3
    x = i + j
  end do
end do
end program p
";
    let parsed = parse(src, Dialect::Free90);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let program = block_child(&parsed.root, 0);
    let outer = block_child(program, 0);
    assert_eq!(outer.kind, BlockKind::Do);
    let inner = block_child(outer, 0);
    assert_eq!(inner.kind, BlockKind::Do);
    assert!(matches!(inner.children[0].stmt, Stmt::Assignment { .. }));
    // The assignment is attached to the innermost loop only.
    assert_eq!(outer.children.len(), 1);
}

#[test]
fn shared_label_closes_two_nested_dos() {
    let src = "\
      do 10 i = 1, 3
      do 10 j = 1, 3
      y = i * j
   10 continue
      end
";
    let parsed = parse(src, Dialect::Fixed77);
    let program = block_child(&parsed.root, 0);
    assert_eq!(program.kind, BlockKind::Program);
    let outer = block_child(program, 0);
    let inner = block_child(outer, 0);
    assert_eq!(outer.header, Header::Do { endlabel: Some(10), control: "i = 1, 3".into() });
    // The labelled terminator is consumed once, as the innermost loop's
    // final child.
    let last = inner.children.last().unwrap();
    assert_eq!(last.label, Some(10));
    assert!(matches!(last.stmt, Stmt::Continue));
    // The outer loop closed off the same item without re-consuming it.
    assert_eq!(outer.children.len(), 1);
}

#[test]
fn shared_label_closes_three_nested_dos() {
    // Three loops sharing one terminating label close innermost to
    // outermost off a single item.
    let src = "\
      do 10 i = 1, 3
      do 10 j = 1, 3
      do 10 k = 1, 3
   10 continue
      end
";
    let parsed = parse(src, Dialect::Fixed77);
    let program = block_child(&parsed.root, 0);
    let do1 = block_child(program, 0);
    let do2 = block_child(do1, 0);
    let do3 = block_child(do2, 0);
    for b in [do1, do2, do3] {
        assert_eq!(b.kind, BlockKind::Do);
    }
    assert_eq!(do3.children.len(), 1);
    assert!(matches!(do3.children[0].stmt, Stmt::Continue));
    assert_eq!(do3.children[0].label, Some(10));
    // No duplicated terminator in the enclosing loops.
    assert_eq!(do2.children.len(), 1);
    assert_eq!(do1.children.len(), 1);
}

#[test]
fn test_select_case_children_are_case_blocks() {
    let src = "\
program p
select case (i)
case (1, 2)
  x = 1
case default
  x = 2
end select
end program p
";
    let parsed = parse(src, Dialect::Free90);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let program = block_child(&parsed.root, 0);
    let select = block_child(program, 0);
    assert_eq!(select.kind, BlockKind::Select);
    // Every child is a CASE arm; the assignments live inside the arms.
    assert_eq!(select.children.len(), 2);
    for child in &select.children {
        let Stmt::Block(case) = &child.stmt else {
            panic!("statement outside a case arm: {:?}", child.stmt);
        };
        assert_eq!(case.kind, BlockKind::Case);
        assert_eq!(case.children.len(), 1);
    }
    let first = block_child(select, 0);
    assert_eq!(
        first.header,
        Header::Case {
            values: vec![vec!["1".to_string()], vec!["2".to_string()]],
            default: false
        }
    );
    let second = block_child(select, 1);
    assert_eq!(second.header, Header::Case { values: vec![], default: true });
}

#[test]
fn test_unwrapped_main_program_fixed77() {
    let src = "      x = 1\n      call f(x)\n      end\n";
    let parsed = parse(src, Dialect::Fixed77);
    let program = block_child(&parsed.root, 0);
    assert_eq!(program.kind, BlockKind::Program);
    assert!(program.name.is_empty());
    assert_eq!(program.children.len(), 2);
    assert!(matches!(program.children[0].stmt, Stmt::Assignment { .. }));
    assert!(matches!(program.children[1].stmt, Stmt::Call { .. }));
    assert_eq!(
        parsed
            .diagnostics
            .of_kind(DiagKind::StructuralMismatch)
            .count(),
        1
    );
}

#[test]
fn test_typed_function_header_split() {
    let src = "\
module m
contains
integer function f(x)
f = x
end function f
end module m
";
    let parsed = parse(src, Dialect::Free90);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let module = block_child(&parsed.root, 0);
    let f = block_child(module, 0);
    assert_eq!(f.kind, BlockKind::Function);
    assert_eq!(f.name, "f");
    let Header::Subprogram(h) = &f.header else {
        panic!("expected subprogram header");
    };
    let rt = h.return_type.as_ref().expect("return type captured");
    assert_eq!(rt.render(), "INTEGER");
    // The synthesized declaration was absorbed, not left as a module
    // child.
    assert!(!module
        .children
        .iter()
        .any(|c| matches!(c.stmt, Stmt::TypeDecl(_))));
}

#[test]
fn test_prefixed_typed_function_header() {
    let src = "\
module m
contains
recursive integer function f(n)
f = n
end function f
end module m
";
    let parsed = parse(src, Dialect::Free90);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let module = block_child(&parsed.root, 0);
    let f = block_child(module, 0);
    let Header::Subprogram(h) = &f.header else {
        panic!("expected subprogram header");
    };
    assert_eq!(h.prefix, "recursive");
    assert!(h.return_type.is_some());
}

#[test]
fn test_construct_name_mismatch_warns_but_closes() {
    let src = "\
program p
outer: do i = 1, 3
x = i
end do wrong
end program p
";
    let parsed = parse(src, Dialect::Free90);
    let program = block_child(&parsed.root, 0);
    let do_block = block_child(program, 0);
    assert_eq!(do_block.name, "outer");
    assert!(do_block.end.is_some());
    assert_eq!(
        parsed
            .diagnostics
            .of_kind(DiagKind::StructuralMismatch)
            .count(),
        1
    );
}

#[test]
fn test_action_if_and_arithmetic_if() {
    let src = "\
program p
if (x > 0) call doit(x)
if (x - 1) 10, 20, 30
end program p
";
    let parsed = parse(src, Dialect::Free90);
    let program = block_child(&parsed.root, 0);
    let Stmt::ActionIf { expr, action } = &program.children[0].stmt else {
        panic!("expected action if, got {:?}", program.children[0].stmt);
    };
    assert_eq!(expr, "x > 0");
    assert!(matches!(action.stmt, Stmt::Call { .. }));
    let Stmt::ArithmeticIf { labels, .. } = &program.children[1].stmt else {
        panic!("expected arithmetic if, got {:?}", program.children[1].stmt);
    };
    assert_eq!(labels, &["10".to_string(), "20".into(), "30".into()]);
}

#[test]
fn test_where_construct_with_elsewhere() {
    let src = "\
program p
where (a > 0)
b = 1
elsewhere
b = 0
end where
end program p
";
    let parsed = parse(src, Dialect::Free90);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let program = block_child(&parsed.root, 0);
    let where_block = block_child(program, 0);
    assert_eq!(where_block.kind, BlockKind::Where);
    assert_eq!(where_block.children.len(), 3);
    assert!(matches!(where_block.children[1].stmt, Stmt::ElseWhere { .. }));
}

#[test]
fn test_unclassifiable_line_becomes_opaque_leaf() {
    let src = "program p\n) this is not fortran (\nx = 1\nend program p\n";
    let parsed = parse(src, Dialect::Free90);
    let program = block_child(&parsed.root, 0);
    assert!(matches!(program.children[0].stmt, Stmt::Unparsed { .. }));
    // The parse continued past the bad line.
    assert!(matches!(program.children[1].stmt, Stmt::Assignment { .. }));
    assert_eq!(
        parsed.diagnostics.of_kind(DiagKind::SyntaxMismatch).count(),
        1
    );
}

#[test]
fn test_signature_file_dialect() {
    let src = "\
python module mymod
interface
subroutine zadd(a, b, c, n)
fortranname c_zadd
integer intent(hide), depend(a) :: n = len(a)
double precision dimension(n) :: a
threadsafe
end subroutine zadd
end interface
end python module mymod
";
    let parsed = parse(src, Dialect::Signature);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let sig = block_child(&parsed.root, 0);
    assert_eq!(sig.kind, BlockKind::SigModule);
    assert_eq!(sig.name, "mymod");
    let interface = block_child(sig, 0);
    assert_eq!(interface.kind, BlockKind::Interface);
    let sub = block_child(interface, 0);
    assert_eq!(sub.kind, BlockKind::Subroutine);
    assert!(sub
        .children
        .iter()
        .any(|c| matches!(c.stmt, Stmt::FortranName { .. })));
    assert!(sub
        .children
        .iter()
        .any(|c| matches!(c.stmt, Stmt::Threadsafe)));
    // Binding directives are signature-only: the same text in free form
    // does not classify.
    let free = parse("program p\nthreadsafe\nend program p\n", Dialect::Free90);
    assert_eq!(
        free.diagnostics.of_kind(DiagKind::SyntaxMismatch).count(),
        1
    );
}

#[test]
fn test_fixed_form_continuation_and_label() {
    let src = "\
C     compute
   10 x = 1 +
     &    2
      if (x .gt. 0) go to 10
      end
";
    let parsed = parse(src, Dialect::Fixed77);
    let program = block_child(&parsed.root, 0);
    assert_eq!(program.children[0].label, Some(10));
    let Stmt::Assignment { expr, .. } = &program.children[0].stmt else {
        panic!("expected assignment");
    };
    assert_eq!(expr, "1 +    2");
    let Stmt::ActionIf { action, .. } = &program.children[1].stmt else {
        panic!("expected logical if, got {:?}", program.children[1].stmt);
    };
    assert!(matches!(action.stmt, Stmt::Goto { .. }));
}

#[test]
fn test_interface_block_with_headers() {
    let src = "\
module m
interface swap
module procedure swap_i, swap_r
end interface swap
end module m
";
    let parsed = parse(src, Dialect::Free90);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let module = block_child(&parsed.root, 0);
    let interface = block_child(module, 0);
    assert_eq!(interface.kind, BlockKind::Interface);
    assert_eq!(interface.name, "swap");
    assert!(matches!(
        interface.children[0].stmt,
        Stmt::Names { .. }
    ));
}

// ===== Render/parse round-trips =====

/// Parse one statement inside a subroutine body and return it.
fn parse_stmt(text: &str) -> Stmt {
    let src = format!("subroutine t(a, b, p, q, x, y)\n{text}\nend subroutine t\n");
    let parsed = parse(&src, Dialect::Free90);
    assert!(
        parsed.diagnostics.is_empty(),
        "diags for `{text}`: {:?}",
        parsed.diagnostics
    );
    let sub = block_child(&parsed.root, 0);
    assert_eq!(sub.children.len(), 1, "one statement for `{text}`");
    sub.children[0].stmt.clone()
}

#[test]
fn test_render_round_trip() {
    for text in [
        "x = y * 2",
        "p => q",
        "call f(a, b + 1)",
        "call init",
        "integer a, b",
        "integer(kind=8) :: big",
        "real, pointer :: a(10), b",
        "character(len=10) :: name",
        "double precision d",
        "write (unit = 6, fmt = *) x, y",
        "read (5) a",
        "print *, 'hello', x",
        "open (unit = 1, file = 'x.dat')",
        "go to 100",
        "use mod_a, only: a, b => c",
        "implicit double precision (d)",
        "allocate (a(10), stat = ierr)",
        "stop 'done'",
    ] {
        let first = parse_stmt(text);
        let rendered = first.render();
        let second = parse_stmt(&rendered.to_lowercase());
        assert_eq!(first, second, "round trip failed via `{rendered}`");
    }
}

#[test]
fn test_read_forms() {
    let Stmt::Read(ReadForm::Ctrl { specs, items }) = parse_stmt("read (5, *) a, b") else {
        panic!("expected control-list read");
    };
    assert_eq!(specs, vec!["5", "*"]);
    assert_eq!(items, vec!["a", "b"]);

    let Stmt::Read(ReadForm::Fmt { format, items }) = parse_stmt("read *, a") else {
        panic!("expected format read");
    };
    assert_eq!(format, "*");
    assert_eq!(items, vec!["a"]);
}

#[test]
fn test_nesting_depth_guard() {
    let mut src = String::from("program p\n");
    for _ in 0..40 {
        src.push_str("do i = 1, 2\n");
    }
    let cfg = Config {
        max_nesting_depth: 8,
        ..Config::default()
    };
    let err = parse_source(&src, Dialect::Free90, &cfg).unwrap_err();
    assert!(err.to_string().contains("nesting depth"));
}
