/// Regex pre-filters for statement classification
///
/// All patterns are compiled once at startup using `LazyLock`.
///
/// Item text is normalized (lowercase, trimmed, literals masked behind
/// `__str_N__` placeholders) before these run, so the patterns can assume
/// word-shaped placeholders wherever a string literal may appear.
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Build a case-insensitive regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. This is acceptable because all patterns
/// in this module are compile-time constants that are verified by tests.
/// The panic occurs at first access of the `LazyLock` static.
fn build_re(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .unicode(true)
        .build()
        .unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

const EOL: &str = r"\s*$";

// ===== PROGRAM UNITS =====

pub static PROGRAM_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^program\b(\s*\w+)?{EOL}")));
pub static MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^module\s+\w+{EOL}")));
pub static SIG_MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^python\s*module\s+\w+{EOL}")));
pub static BLOCK_DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^block\s*data(\s*\w+)?{EOL}")));
pub static SUBROUTINE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^((recursive|pure|elemental)\s+)*subroutine\s+\w+"));
pub static FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^((recursive|pure|elemental)\s+)*function\s+\w+"));
pub static INTERFACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(&format!(
        r"^(abstract\s+interface|interface(\s+\w+\s*\(.*\)|\s+\w+|)){EOL}"
    ))
});
pub static TYPE_BEGIN_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^type\b"));
pub static ENUM_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^enum\s*,\s*bind\s*\(\s*c\s*\){EOL}")));

// ===== EXECUTABLE CONSTRUCTS =====

pub static IF_THEN_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^if\s*\(.*\)\s*then{EOL}")));
pub static IF_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^if\s*\("));
pub static DO_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^do\b\s*\d*"));
pub static SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^select\s*case\s*\(.*\){EOL}")));
pub static CASE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^case\b\s*(\(.*\)|default)\s*\w*{EOL}")));
pub static WHERE_CONSTRUCT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^where\s*\(.*\){EOL}")));
pub static WHERE_STMT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^where\s*\(.*\)\s*\w"));
pub static FORALL_CONSTRUCT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^forall\s*\(.*\){EOL}")));
pub static FORALL_STMT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^forall\s*\(.*\).*="));
pub static ASSOCIATE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^associate\s*\(.*\){EOL}")));

pub static ELSE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^else(\s+\w+)?{EOL}")));
pub static ELSE_IF_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^else\s*if\s*\(.*\)\s*then(\s+\w+)?{EOL}")));
pub static ELSE_WHERE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^else\s*where\b"));

// ===== END STATEMENTS =====

pub static END_PROGRAM_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end(\s*program(\s+\w+)?)?{EOL}")));
pub static END_MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end(\s*module(\s+\w+)?)?{EOL}")));
pub static END_SIG_MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end(\s*python\s*module(\s+\w+)?)?{EOL}")));
pub static END_BLOCK_DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end(\s*block\s*data(\s+\w+)?)?{EOL}")));
pub static END_SUBROUTINE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end(\s*subroutine(\s+\w+)?)?{EOL}")));
pub static END_FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end(\s*function(\s+\w+)?)?{EOL}")));
pub static END_INTERFACE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*interface(\s+\S.*)?{EOL}")));
pub static END_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*type(\s+\w+)?{EOL}")));
pub static END_IF_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*if(\s+\w+)?{EOL}")));
pub static END_DO_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*do(\s+\w+)?{EOL}")));
pub static END_SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*select(\s+\w+)?{EOL}")));
pub static END_WHERE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*where(\s+\w+)?{EOL}")));
pub static END_FORALL_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*forall(\s+\w+)?{EOL}")));
pub static END_ASSOCIATE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*associate(\s+\w+)?{EOL}")));
pub static END_ENUM_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^end\s*enum{EOL}")));

// ===== ACTION STATEMENTS =====

pub static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^\w[^=]*=>?"));
pub static ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^assign\s+\d+\s+to\s+\w+{EOL}")));
pub static CALL_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^call\b"));
pub static GOTO_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^go\s*to\s*\d+{EOL}")));
pub static COMPUTED_GOTO_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^go\s*to\s*\("));
pub static ASSIGNED_GOTO_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^go\s*to\s*\w+\s*\(?"));
pub static CONTINUE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^continue{EOL}")));
pub static RETURN_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^return\b"));
pub static STOP_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^stop\b\s*\w*{EOL}")));
pub static PAUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^pause\b\s*\w*{EOL}")));
pub static CYCLE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^cycle(\s+\w+)?{EOL}")));
pub static EXIT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^exit(\s+\w+)?{EOL}")));
pub static PRINT_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^print\s*[\w*]"));
pub static READ_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^read\b\s*[\w(*]"));
pub static WRITE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^write\s*\("));
pub static OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^open\s*\(.*\){EOL}")));
pub static CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^close\s*\(.*\){EOL}")));
pub static FLUSH_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^flush\b"));
pub static WAIT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^wait\s*\(.*\){EOL}")));
pub static FILE_POS_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(rewind|backspace|endfile)\b"));
pub static INQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^inquire\s*\("));
pub static ALLOCATE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^allocate\s*\(.*\){EOL}")));
pub static DEALLOCATE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^deallocate\s*\(.*\){EOL}")));
pub static NULLIFY_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^nullify\s*\(.*\){EOL}")));
pub static ARITHMETIC_IF_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^if\s*\(.*\)\s*\d+\s*,\s*\d+\s*,\s*\d+{EOL}")));

// ===== SPECIFICATION STATEMENTS =====

pub static USE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^use\b"));
pub static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^import(\b|$)"));
pub static IMPLICIT_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^implicit\b"));
pub static PARAMETER_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^parameter\s*\(.*\){EOL}")));
pub static DIMENSION_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^dimension\b"));
pub static COMMON_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^common\b"));
pub static DATA_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^data\b"));
pub static NAMELIST_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^namelist\b"));
pub static EQUIVALENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^equivalence\s*\(.*\){EOL}")));
pub static SAVE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^save\b"));
pub static INTENT_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^intent\s*\("));
pub static ACCESS_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^(public|private)\b"));
pub static EXTERNAL_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^external\b"));
pub static INTRINSIC_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^intrinsic\b"));
pub static OPTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^optional\b"));
pub static PROTECTED_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^protected\b"));
pub static VOLATILE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^volatile\b"));
pub static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^value\b"));
pub static ASYNCHRONOUS_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^asynchronous\b"));
pub static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^target\b"));
pub static POINTER_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^pointer\b"));
pub static ALLOCATABLE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^allocatable\b"));
pub static SEQUENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^sequence{EOL}")));
pub static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^entry\b"));
pub static FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^format\s*\(.*\){EOL}")));
pub static MODULE_PROCEDURE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(module\s+)?procedure\b"));
pub static CONTAINS_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^contains{EOL}")));
pub static SUBPROGRAM_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(pure|elemental|recursive)\b"));
pub static BIND_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^bind\s*\("));
pub static ENUMERATOR_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^enumerator\b"));
pub static PROC_BINDING_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^procedure\b"));
pub static GENERIC_BINDING_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^generic\b.*::.*=>"));
pub static FINAL_BINDING_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^final\b"));

// ===== TYPE DECLARATIONS =====

pub static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^integer\b"));
pub static REAL_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^real\b"));
pub static DOUBLE_PRECISION_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^double\s*precision\b"));
pub static COMPLEX_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^complex\b"));
pub static DOUBLE_COMPLEX_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^double\s*complex\b"));
pub static CHARACTER_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^character\b"));
pub static LOGICAL_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^logical\b"));
pub static BYTE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^byte\b"));
pub static TYPE_STMT_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^type\s*\("));
pub static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^class\s*\("));

// ===== SIGNATURE-FILE DIRECTIVES =====

pub static FORTRAN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^fortranname\s+\S+{EOL}")));
pub static THREADSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(&format!(r"^threadsafe{EOL}")));
pub static DEPEND_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^depend\s*\("));
pub static CHECK_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^check\s*\("));
pub static CALL_STATEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^callstatement\b"));
pub static CALL_PROTO_ARGUMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^callprotoargument\b"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_then_requires_then() {
        assert!(IF_THEN_RE.is_match("if (x > 0) then"));
        assert!(IF_THEN_RE.is_match("if ((a) .and. (b)) then"));
        assert!(!IF_THEN_RE.is_match("if (x > 0) y = 1"));
    }

    #[test]
    fn test_do_forms() {
        assert!(DO_RE.is_match("do"));
        assert!(DO_RE.is_match("do i = 1, 10"));
        assert!(DO_RE.is_match("do 10 i = 1, 10"));
        assert!(DO_RE.is_match("do while (x < 5)"));
        assert!(!DO_RE.is_match("double precision x"));
    }

    #[test]
    fn test_subprogram_headers() {
        assert!(SUBROUTINE_RE.is_match("subroutine foo(x, y)"));
        assert!(SUBROUTINE_RE.is_match("recursive subroutine bar"));
        assert!(FUNCTION_RE.is_match("function f(x)"));
        assert!(FUNCTION_RE.is_match("pure elemental function g(x)"));
        // A typed function header does not match directly; the declaration
        // sub-parser splits it first.
        assert!(!FUNCTION_RE.is_match("integer function f(x)"));
    }

    #[test]
    fn test_unit_ends_allow_bare_end() {
        assert!(END_PROGRAM_RE.is_match("end"));
        assert!(END_PROGRAM_RE.is_match("end program"));
        assert!(END_PROGRAM_RE.is_match("end program main"));
        assert!(END_SUBROUTINE_RE.is_match("end"));
        assert!(END_SUBROUTINE_RE.is_match("end subroutine f"));
        assert!(!END_SUBROUTINE_RE.is_match("end function f"));
    }

    #[test]
    fn test_construct_ends_require_keyword() {
        assert!(END_IF_RE.is_match("end if"));
        assert!(END_IF_RE.is_match("endif"));
        assert!(END_IF_RE.is_match("end if check"));
        assert!(!END_IF_RE.is_match("end"));
        assert!(END_DO_RE.is_match("end do"));
        assert!(!END_DO_RE.is_match("end"));
    }

    #[test]
    fn test_select_and_case() {
        assert!(SELECT_RE.is_match("select case (i)"));
        assert!(SELECT_RE.is_match("select case(i + 1)"));
        assert!(CASE_RE.is_match("case (1, 2)"));
        assert!(CASE_RE.is_match("case default"));
        assert!(!CASE_RE.is_match("case"));
    }

    #[test]
    fn test_where_construct_vs_stmt() {
        assert!(WHERE_CONSTRUCT_RE.is_match("where (a > 0)"));
        assert!(!WHERE_CONSTRUCT_RE.is_match("where (a > 0) b = 1"));
        assert!(WHERE_STMT_RE.is_match("where (a > 0) b = 1"));
    }

    #[test]
    fn test_goto_variants() {
        assert!(GOTO_RE.is_match("go to 100"));
        assert!(GOTO_RE.is_match("goto 100"));
        assert!(!GOTO_RE.is_match("go to (10, 20), i"));
        assert!(COMPUTED_GOTO_RE.is_match("go to (10, 20), i"));
        assert!(ASSIGNED_GOTO_RE.is_match("go to target (10, 20)"));
    }

    #[test]
    fn test_arithmetic_if() {
        assert!(ARITHMETIC_IF_RE.is_match("if (x - 1) 10, 20, 30"));
        assert!(!ARITHMETIC_IF_RE.is_match("if (x) y = 1"));
    }

    #[test]
    fn test_type_begin_vs_type_stmt() {
        assert!(TYPE_BEGIN_RE.is_match("type point"));
        assert!(TYPE_BEGIN_RE.is_match("type, extends(base) :: derived"));
        // `type (point) :: p` passes the cheap pre-filter; the extractor
        // rejects it so the declaration kind can claim it.
        assert!(TYPE_STMT_RE.is_match("type (point) :: p"));
        assert!(TYPE_STMT_RE.is_match("type(point) :: p"));
    }

    #[test]
    fn test_signature_directives() {
        assert!(SIG_MODULE_RE.is_match("python module m"));
        assert!(SIG_MODULE_RE.is_match("pythonmodule m"));
        assert!(END_SIG_MODULE_RE.is_match("end python module m"));
        assert!(FORTRAN_NAME_RE.is_match("fortranname c_func"));
        assert!(DEPEND_RE.is_match("depend(n) a"));
        assert!(CALL_STATEMENT_RE.is_match("callstatement (*wrapped)(&n)"));
    }

    #[test]
    fn test_double_precision_spacing() {
        assert!(DOUBLE_PRECISION_RE.is_match("double precision x"));
        assert!(DOUBLE_PRECISION_RE.is_match("doubleprecision x"));
        assert!(!DOUBLE_PRECISION_RE.is_match("double complex x"));
        assert!(DOUBLE_COMPLEX_RE.is_match("double complex x"));
    }
}
