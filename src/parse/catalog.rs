//! The statement-kind catalog and the trial-match engine.
//!
//! Every statement kind is an immutable descriptor: a dialect-applicability
//! set, a cheap regex pre-filter, and a field extractor. Classification
//! walks an ordered candidate list and takes the first kind whose
//! pre-filter and extractor both succeed; extraction failure after a
//! passing pre-filter just moves on to the next candidate. A kind is never
//! tried twice on the same item (candidate lists are deduplicated when
//! composed).

use std::sync::LazyLock;

use regex::Regex;

use crate::diag::Diagnostics;
use crate::parse::block::{self, BlockKind, BlockNode};
use crate::parse::typedecl::{self, BaseType};
use crate::parse::{decl, exec, patterns};
use crate::parse::stmt::{NamesKind, Stmt, StmtNode};
use crate::source::{Dialect, Item, ItemSource};

/// Statement kind identifiers, one per grammar descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindId {
    // Action statements
    Assignment,
    Assign,
    Call,
    Goto,
    ComputedGoto,
    AssignedGoto,
    Continue,
    Return,
    Stop,
    Pause,
    Cycle,
    Exit,
    Print,
    Read,
    Write,
    Open,
    Close,
    Flush,
    Wait,
    FilePos,
    Inquire,
    Allocate,
    Deallocate,
    Nullify,
    ArithmeticIf,
    IfStmt,
    WhereStmt,
    ForallStmt,
    Else,
    ElseIf,
    ElseWhere,

    // Specification statements
    Use,
    Import,
    Implicit,
    Parameter,
    Dimension,
    Common,
    Data,
    Namelist,
    Equivalence,
    Save,
    Intent,
    Access,
    External,
    Intrinsic,
    Optional,
    Protected,
    Volatile,
    Value,
    Asynchronous,
    Allocatable,
    Pointer,
    Target,
    Sequence,
    Entry,
    Format,
    ModuleProcedure,
    Contains,
    SubprogramPrefix,
    Bind,
    Enumerator,
    ProcBinding,
    GenericBinding,
    FinalBinding,

    // Type-declaration statements
    Integer,
    Real,
    DoublePrecision,
    Complex,
    DoubleComplex,
    Character,
    Logical,
    Byte,
    TypeStmt,
    Class,

    // Signature-file directives
    FortranName,
    Threadsafe,
    Depend,
    Check,
    CallStatement,
    CallProtoArgument,

    // Block openers
    ProgramBegin,
    ModuleBegin,
    SigModuleBegin,
    BlockDataBegin,
    SubroutineBegin,
    FunctionBegin,
    InterfaceBegin,
    TypeBegin,
    IfThenBegin,
    DoBegin,
    SelectBegin,
    CaseBegin,
    WhereBegin,
    ForallBegin,
    AssociateBegin,
    EnumBegin,
}

impl KindId {
    /// Dialect applicability of this kind.
    #[must_use]
    pub fn applies(self, dialect: Dialect) -> bool {
        match self {
            KindId::Assign | KindId::AssignedGoto | KindId::Pause => dialect == Dialect::Fixed77,
            KindId::InterfaceBegin => {
                matches!(dialect, Dialect::Fixed90 | Dialect::Free90 | Dialect::Signature)
            }
            KindId::SigModuleBegin
            | KindId::FortranName
            | KindId::Threadsafe
            | KindId::Depend
            | KindId::Check
            | KindId::CallStatement
            | KindId::CallProtoArgument => dialect == Dialect::Signature,
            _ => true,
        }
    }

    /// Cheap syntactic pre-filter; avoids running extraction on obviously
    /// non-matching kinds.
    #[must_use]
    pub fn prefilter(self) -> &'static Regex {
        match self {
            KindId::Assignment => &patterns::ASSIGNMENT_RE,
            KindId::Assign => &patterns::ASSIGN_RE,
            KindId::Call => &patterns::CALL_RE,
            KindId::Goto => &patterns::GOTO_RE,
            KindId::ComputedGoto => &patterns::COMPUTED_GOTO_RE,
            KindId::AssignedGoto => &patterns::ASSIGNED_GOTO_RE,
            KindId::Continue => &patterns::CONTINUE_RE,
            KindId::Return => &patterns::RETURN_RE,
            KindId::Stop => &patterns::STOP_RE,
            KindId::Pause => &patterns::PAUSE_RE,
            KindId::Cycle => &patterns::CYCLE_RE,
            KindId::Exit => &patterns::EXIT_RE,
            KindId::Print => &patterns::PRINT_RE,
            KindId::Read => &patterns::READ_RE,
            KindId::Write => &patterns::WRITE_RE,
            KindId::Open => &patterns::OPEN_RE,
            KindId::Close => &patterns::CLOSE_RE,
            KindId::Flush => &patterns::FLUSH_RE,
            KindId::Wait => &patterns::WAIT_RE,
            KindId::FilePos => &patterns::FILE_POS_RE,
            KindId::Inquire => &patterns::INQUIRE_RE,
            KindId::Allocate => &patterns::ALLOCATE_RE,
            KindId::Deallocate => &patterns::DEALLOCATE_RE,
            KindId::Nullify => &patterns::NULLIFY_RE,
            KindId::ArithmeticIf => &patterns::ARITHMETIC_IF_RE,
            KindId::IfStmt => &patterns::IF_RE,
            KindId::WhereStmt => &patterns::WHERE_STMT_RE,
            KindId::ForallStmt => &patterns::FORALL_STMT_RE,
            KindId::Else => &patterns::ELSE_RE,
            KindId::ElseIf => &patterns::ELSE_IF_RE,
            KindId::ElseWhere => &patterns::ELSE_WHERE_RE,
            KindId::Use => &patterns::USE_RE,
            KindId::Import => &patterns::IMPORT_RE,
            KindId::Implicit => &patterns::IMPLICIT_RE,
            KindId::Parameter => &patterns::PARAMETER_RE,
            KindId::Dimension => &patterns::DIMENSION_RE,
            KindId::Common => &patterns::COMMON_RE,
            KindId::Data => &patterns::DATA_RE,
            KindId::Namelist => &patterns::NAMELIST_RE,
            KindId::Equivalence => &patterns::EQUIVALENCE_RE,
            KindId::Save => &patterns::SAVE_RE,
            KindId::Intent => &patterns::INTENT_RE,
            KindId::Access => &patterns::ACCESS_RE,
            KindId::External => &patterns::EXTERNAL_RE,
            KindId::Intrinsic => &patterns::INTRINSIC_RE,
            KindId::Optional => &patterns::OPTIONAL_RE,
            KindId::Protected => &patterns::PROTECTED_RE,
            KindId::Volatile => &patterns::VOLATILE_RE,
            KindId::Value => &patterns::VALUE_RE,
            KindId::Asynchronous => &patterns::ASYNCHRONOUS_RE,
            KindId::Allocatable => &patterns::ALLOCATABLE_RE,
            KindId::Pointer => &patterns::POINTER_RE,
            KindId::Target => &patterns::TARGET_RE,
            KindId::Sequence => &patterns::SEQUENCE_RE,
            KindId::Entry => &patterns::ENTRY_RE,
            KindId::Format => &patterns::FORMAT_RE,
            KindId::ModuleProcedure => &patterns::MODULE_PROCEDURE_RE,
            KindId::Contains => &patterns::CONTAINS_RE,
            KindId::SubprogramPrefix => &patterns::SUBPROGRAM_PREFIX_RE,
            KindId::Bind => &patterns::BIND_RE,
            KindId::Enumerator => &patterns::ENUMERATOR_RE,
            KindId::ProcBinding => &patterns::PROC_BINDING_RE,
            KindId::GenericBinding => &patterns::GENERIC_BINDING_RE,
            KindId::FinalBinding => &patterns::FINAL_BINDING_RE,
            KindId::Integer => &patterns::INTEGER_RE,
            KindId::Real => &patterns::REAL_RE,
            KindId::DoublePrecision => &patterns::DOUBLE_PRECISION_RE,
            KindId::Complex => &patterns::COMPLEX_RE,
            KindId::DoubleComplex => &patterns::DOUBLE_COMPLEX_RE,
            KindId::Character => &patterns::CHARACTER_RE,
            KindId::Logical => &patterns::LOGICAL_RE,
            KindId::Byte => &patterns::BYTE_RE,
            KindId::TypeStmt => &patterns::TYPE_STMT_RE,
            KindId::Class => &patterns::CLASS_RE,
            KindId::FortranName => &patterns::FORTRAN_NAME_RE,
            KindId::Threadsafe => &patterns::THREADSAFE_RE,
            KindId::Depend => &patterns::DEPEND_RE,
            KindId::Check => &patterns::CHECK_RE,
            KindId::CallStatement => &patterns::CALL_STATEMENT_RE,
            KindId::CallProtoArgument => &patterns::CALL_PROTO_ARGUMENT_RE,
            KindId::ProgramBegin => &patterns::PROGRAM_RE,
            KindId::ModuleBegin => &patterns::MODULE_RE,
            KindId::SigModuleBegin => &patterns::SIG_MODULE_RE,
            KindId::BlockDataBegin => &patterns::BLOCK_DATA_RE,
            KindId::SubroutineBegin => &patterns::SUBROUTINE_RE,
            KindId::FunctionBegin => &patterns::FUNCTION_RE,
            KindId::InterfaceBegin => &patterns::INTERFACE_RE,
            KindId::TypeBegin => &patterns::TYPE_BEGIN_RE,
            KindId::IfThenBegin => &patterns::IF_THEN_RE,
            KindId::DoBegin => &patterns::DO_RE,
            KindId::SelectBegin => &patterns::SELECT_RE,
            KindId::CaseBegin => &patterns::CASE_RE,
            KindId::WhereBegin => &patterns::WHERE_CONSTRUCT_RE,
            KindId::ForallBegin => &patterns::FORALL_CONSTRUCT_RE,
            KindId::AssociateBegin => &patterns::ASSOCIATE_RE,
            KindId::EnumBegin => &patterns::ENUM_RE,
        }
    }

    /// Run this kind's extractor on an item.
    pub(crate) fn extract(self, item: &Item, ctx: &mut Ctx<'_, '_>) -> Extract {
        match self {
            KindId::Assignment => exec::extract_assignment(item, ctx),
            KindId::Assign => exec::extract_assign(item, ctx),
            KindId::Call => exec::extract_call(item, ctx),
            KindId::Goto => exec::extract_goto(item, ctx),
            KindId::ComputedGoto => exec::extract_computed_goto(item, ctx),
            KindId::AssignedGoto => exec::extract_assigned_goto(item, ctx),
            KindId::Continue => exec::extract_continue(item, ctx),
            KindId::Return => exec::extract_return(item, ctx),
            KindId::Stop => exec::extract_stop(item, ctx),
            KindId::Pause => exec::extract_pause(item, ctx),
            KindId::Cycle => exec::extract_cycle(item, ctx),
            KindId::Exit => exec::extract_exit(item, ctx),
            KindId::Print => exec::extract_print(item, ctx),
            KindId::Read => exec::extract_read(item, ctx),
            KindId::Write => exec::extract_write(item, ctx),
            KindId::Open => exec::extract_open(item, ctx),
            KindId::Close => exec::extract_close(item, ctx),
            KindId::Flush => exec::extract_flush(item, ctx),
            KindId::Wait => exec::extract_wait(item, ctx),
            KindId::FilePos => exec::extract_file_pos(item, ctx),
            KindId::Inquire => exec::extract_inquire(item, ctx),
            KindId::Allocate => exec::extract_allocate(item, ctx),
            KindId::Deallocate => exec::extract_deallocate(item, ctx),
            KindId::Nullify => exec::extract_nullify(item, ctx),
            KindId::ArithmeticIf => exec::extract_arithmetic_if(item, ctx),
            KindId::IfStmt => exec::extract_action_if(item, ctx),
            KindId::WhereStmt => exec::extract_where_stmt(item, ctx),
            KindId::ForallStmt => exec::extract_forall_stmt(item, ctx),
            KindId::Else => exec::extract_else(item, ctx),
            KindId::ElseIf => exec::extract_else_if(item, ctx),
            KindId::ElseWhere => exec::extract_else_where(item, ctx),
            KindId::Use => decl::extract_use(item, ctx),
            KindId::Import => decl::extract_names(NamesKind::Import, "import".len(), item, ctx),
            KindId::Implicit => typedecl::extract_implicit(item, ctx),
            KindId::Parameter => decl::extract_parameter(item, ctx),
            KindId::Dimension => {
                decl::extract_names(NamesKind::Dimension, "dimension".len(), item, ctx)
            }
            KindId::Common => decl::extract_common(item, ctx),
            KindId::Data => decl::extract_data(item, ctx),
            KindId::Namelist => decl::extract_namelist(item, ctx),
            KindId::Equivalence => decl::extract_equivalence(item, ctx),
            KindId::Save => decl::extract_save(item, ctx),
            KindId::Intent => decl::extract_intent(item, ctx),
            KindId::Access => decl::extract_access(item, ctx),
            KindId::External => {
                decl::extract_names(NamesKind::External, "external".len(), item, ctx)
            }
            KindId::Intrinsic => {
                decl::extract_names(NamesKind::Intrinsic, "intrinsic".len(), item, ctx)
            }
            KindId::Optional => {
                decl::extract_names(NamesKind::Optional, "optional".len(), item, ctx)
            }
            KindId::Protected => {
                decl::extract_names(NamesKind::Protected, "protected".len(), item, ctx)
            }
            KindId::Volatile => {
                decl::extract_names(NamesKind::Volatile, "volatile".len(), item, ctx)
            }
            KindId::Value => decl::extract_names(NamesKind::Value, "value".len(), item, ctx),
            KindId::Asynchronous => {
                decl::extract_names(NamesKind::Asynchronous, "asynchronous".len(), item, ctx)
            }
            KindId::Allocatable => {
                decl::extract_names(NamesKind::Allocatable, "allocatable".len(), item, ctx)
            }
            KindId::Pointer => {
                decl::extract_names(NamesKind::Pointer, "pointer".len(), item, ctx)
            }
            KindId::Target => decl::extract_names(NamesKind::Target, "target".len(), item, ctx),
            KindId::Sequence => decl::extract_sequence(item, ctx),
            KindId::Entry => decl::extract_entry(item, ctx),
            KindId::Format => decl::extract_format(item, ctx),
            KindId::ModuleProcedure => decl::extract_module_procedure(item, ctx),
            KindId::Contains => decl::extract_contains(item, ctx),
            KindId::SubprogramPrefix => decl::extract_subprogram_prefix(item, ctx),
            KindId::Bind => decl::extract_bind(item, ctx),
            KindId::Enumerator => decl::extract_enumerator(item, ctx),
            KindId::ProcBinding => decl::extract_proc_binding(item, ctx),
            KindId::GenericBinding => decl::extract_generic_binding(item, ctx),
            KindId::FinalBinding => {
                decl::extract_names(NamesKind::Final, "final".len(), item, ctx)
            }
            KindId::Integer => typedecl::extract_type_decl(BaseType::Integer, item, ctx),
            KindId::Real => typedecl::extract_type_decl(BaseType::Real, item, ctx),
            KindId::DoublePrecision => {
                typedecl::extract_type_decl(BaseType::DoublePrecision, item, ctx)
            }
            KindId::Complex => typedecl::extract_type_decl(BaseType::Complex, item, ctx),
            KindId::DoubleComplex => {
                typedecl::extract_type_decl(BaseType::DoubleComplex, item, ctx)
            }
            KindId::Character => typedecl::extract_type_decl(BaseType::Character, item, ctx),
            KindId::Logical => typedecl::extract_type_decl(BaseType::Logical, item, ctx),
            KindId::Byte => typedecl::extract_type_decl(BaseType::Byte, item, ctx),
            KindId::TypeStmt => typedecl::extract_type_decl(BaseType::Derived, item, ctx),
            KindId::Class => typedecl::extract_type_decl(BaseType::Class, item, ctx),
            KindId::FortranName => decl::extract_fortran_name(item, ctx),
            KindId::Threadsafe => decl::extract_threadsafe(item, ctx),
            KindId::Depend => decl::extract_depend(item, ctx),
            KindId::Check => decl::extract_check(item, ctx),
            KindId::CallStatement => decl::extract_call_statement(item, ctx),
            KindId::CallProtoArgument => decl::extract_call_proto_argument(item, ctx),
            KindId::ProgramBegin => block::begin_program(item, ctx),
            KindId::ModuleBegin => block::begin_module(item, ctx),
            KindId::SigModuleBegin => block::begin_sig_module(item, ctx),
            KindId::BlockDataBegin => block::begin_block_data(item, ctx),
            KindId::SubroutineBegin => {
                block::begin_subprogram(BlockKind::Subroutine, item, ctx)
            }
            KindId::FunctionBegin => block::begin_subprogram(BlockKind::Function, item, ctx),
            KindId::InterfaceBegin => block::begin_interface(item, ctx),
            KindId::TypeBegin => block::begin_derived_type(item, ctx),
            KindId::IfThenBegin => block::begin_if_then(item, ctx),
            KindId::DoBegin => block::begin_do(item, ctx),
            KindId::SelectBegin => block::begin_select(item, ctx),
            KindId::CaseBegin => block::begin_case(item, ctx),
            KindId::WhereBegin => block::begin_where(item, ctx),
            KindId::ForallBegin => block::begin_forall(item, ctx),
            KindId::AssociateBegin => block::begin_associate(item, ctx),
            KindId::EnumBegin => block::begin_enum(item, ctx),
        }
    }
}

/// Extraction outcome of one kind on one item.
pub enum Extract {
    /// A completed simple statement.
    Node(Stmt),
    /// A completed block opener.
    Begin(BlockNode),
    /// The extractor declared itself invalid; try the next candidate.
    Invalid,
    /// The extractor consumed the item by requeuing transformed pieces.
    Requeued,
}

/// Classification result of the trial-match engine.
pub enum Classified {
    Stmt(StmtNode),
    Begin(BlockNode),
    Requeued,
    NoMatch,
}

/// Mutable context handed to extractors: pushback access, diagnostics, and
/// the enclosing block (for construct-name checks).
pub struct Ctx<'a, 's> {
    pub source: &'a mut (dyn ItemSource + 's),
    pub diags: &'a mut Diagnostics,
    pub block_kind: BlockKind,
    pub block_name: &'a str,
}

/// Try each candidate kind in order; the first kind whose pre-filter and
/// extractor both succeed wins.
pub(crate) fn classify(item: &Item, candidates: &[KindId], ctx: &mut Ctx<'_, '_>) -> Classified {
    let dialect = ctx.source.dialect();
    for &kind in candidates {
        if !kind.applies(dialect) {
            continue;
        }
        if !kind.prefilter().is_match(&item.text) {
            continue;
        }
        match kind.extract(item, ctx) {
            Extract::Invalid => {}
            Extract::Node(stmt) => {
                return Classified::Stmt(StmtNode::new(item.span, item.label, stmt))
            }
            Extract::Begin(node) => return Classified::Begin(node),
            Extract::Requeued => return Classified::Requeued,
        }
    }
    Classified::NoMatch
}

// ===== Candidate-list composition =====
//
// Per-context candidate lists are composed from shared groups; composition
// deduplicates while preserving first-occurrence order, so a kind is tried
// at most once per item.

fn compose(groups: &[&[KindId]]) -> Vec<KindId> {
    let mut out = Vec::new();
    for group in groups {
        for &kind in *group {
            if !out.contains(&kind) {
                out.push(kind);
            }
        }
    }
    out
}

pub(crate) static ACTION_STMTS: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    vec![
        KindId::Allocate,
        KindId::Assignment,
        KindId::Assign,
        KindId::FilePos,
        KindId::Call,
        KindId::Close,
        KindId::Continue,
        KindId::Cycle,
        KindId::Deallocate,
        KindId::Exit,
        KindId::Flush,
        KindId::ForallStmt,
        KindId::Goto,
        KindId::IfStmt,
        KindId::Inquire,
        KindId::Nullify,
        KindId::Open,
        KindId::Print,
        KindId::Read,
        KindId::Return,
        KindId::Stop,
        KindId::Wait,
        KindId::WhereStmt,
        KindId::Write,
        KindId::ArithmeticIf,
        KindId::ComputedGoto,
        KindId::AssignedGoto,
        KindId::Pause,
    ]
});

static EXECUTABLE_CONSTRUCTS: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        &[
            KindId::AssociateBegin,
            KindId::DoBegin,
            KindId::ForallBegin,
            KindId::IfThenBegin,
            KindId::SelectBegin,
            KindId::WhereBegin,
        ],
        &ACTION_STMTS[..],
    ])
});

static EXECUTION_PART: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        &EXECUTABLE_CONSTRUCTS[..],
        &[KindId::Format, KindId::Entry, KindId::Data],
    ])
});

static SPECIFICATION_STMTS: &[KindId] = &[
    KindId::Access,
    KindId::Allocatable,
    KindId::Asynchronous,
    KindId::Bind,
    KindId::Common,
    KindId::Data,
    KindId::Dimension,
    KindId::Equivalence,
    KindId::External,
    KindId::Intent,
    KindId::Intrinsic,
    KindId::Namelist,
    KindId::Optional,
    KindId::Pointer,
    KindId::Protected,
    KindId::Save,
    KindId::Target,
    KindId::Volatile,
    KindId::Value,
];

static INTRINSIC_TYPES: &[KindId] = &[
    KindId::SubprogramPrefix,
    KindId::Integer,
    KindId::Real,
    KindId::DoublePrecision,
    KindId::Complex,
    KindId::DoubleComplex,
    KindId::Character,
    KindId::Logical,
    KindId::Byte,
];

static DECLARATION_TYPES: LazyLock<Vec<KindId>> =
    LazyLock::new(|| compose(&[INTRINSIC_TYPES, &[KindId::TypeStmt, KindId::Class]]));

static DECLARATION_CONSTRUCTS: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        &[
            KindId::TypeBegin,
            KindId::Entry,
            KindId::EnumBegin,
            KindId::Format,
            KindId::InterfaceBegin,
            KindId::Parameter,
            KindId::ModuleProcedure,
        ],
        SPECIFICATION_STMTS,
        &DECLARATION_TYPES[..],
    ])
});

static IMPLICIT_PART: &[KindId] = &[
    KindId::Implicit,
    KindId::Parameter,
    KindId::Format,
    KindId::Entry,
];

static SPECIFICATION_PART: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        &[KindId::Use, KindId::Import],
        IMPLICIT_PART,
        &DECLARATION_CONSTRUCTS[..],
    ])
});

static SIG_DIRECTIVES: &[KindId] = &[
    KindId::Threadsafe,
    KindId::FortranName,
    KindId::Depend,
    KindId::Check,
    KindId::CallStatement,
    KindId::CallProtoArgument,
];

static INTERNAL_SUBPROGRAMS: &[KindId] = &[
    KindId::Contains,
    KindId::FunctionBegin,
    KindId::SubroutineBegin,
];

static UNIT_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        &[
            KindId::ProgramBegin,
            KindId::ModuleBegin,
            KindId::SigModuleBegin,
            KindId::BlockDataBegin,
            KindId::FunctionBegin,
            KindId::SubroutineBegin,
        ],
        &SPECIFICATION_PART[..],
        &EXECUTION_PART[..],
        &[KindId::Contains],
    ])
});

static PROGRAM_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[&SPECIFICATION_PART[..], &EXECUTION_PART[..], INTERNAL_SUBPROGRAMS])
});

static MODULE_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        &[KindId::Access],
        &SPECIFICATION_PART[..],
        INTERNAL_SUBPROGRAMS,
    ])
});

static SIG_MODULE_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[&[
        KindId::InterfaceBegin,
        KindId::FunctionBegin,
        KindId::SubroutineBegin,
        KindId::ModuleBegin,
        KindId::Use,
    ]])
});

static BLOCK_DATA_BODY: LazyLock<Vec<KindId>> =
    LazyLock::new(|| compose(&[&SPECIFICATION_PART[..]]));

static SUBPROGRAM_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        SIG_DIRECTIVES,
        &SPECIFICATION_PART[..],
        &EXECUTION_PART[..],
        INTERNAL_SUBPROGRAMS,
    ])
});

static INTERFACE_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        INTRINSIC_TYPES,
        &[
            KindId::FunctionBegin,
            KindId::SubroutineBegin,
            KindId::ModuleProcedure,
        ],
    ])
});

static DERIVED_TYPE_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    compose(&[
        &[KindId::Integer, KindId::Access, KindId::Sequence],
        &DECLARATION_TYPES[..],
        &[
            KindId::ModuleProcedure,
            KindId::Contains,
            KindId::ProcBinding,
            KindId::GenericBinding,
            KindId::FinalBinding,
        ],
    ])
});

static IF_THEN_BODY: LazyLock<Vec<KindId>> =
    LazyLock::new(|| compose(&[&[KindId::Else, KindId::ElseIf], &EXECUTION_PART[..]]));

static SELECT_BODY: LazyLock<Vec<KindId>> =
    LazyLock::new(|| compose(&[&[KindId::CaseBegin], &EXECUTION_PART[..]]));

static WHERE_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    vec![
        KindId::ElseWhere,
        KindId::Assignment,
        KindId::WhereStmt,
        KindId::WhereBegin,
    ]
});

static FORALL_BODY: LazyLock<Vec<KindId>> = LazyLock::new(|| {
    vec![
        KindId::Assignment,
        KindId::WhereStmt,
        KindId::WhereBegin,
        KindId::ForallBegin,
        KindId::ForallStmt,
    ]
});

static ENUM_BODY: &[KindId] = &[KindId::Enumerator];

/// The candidate kind list for classifying children of a block.
#[must_use]
pub fn candidates_for(kind: BlockKind) -> &'static [KindId] {
    match kind {
        BlockKind::Unit => &UNIT_BODY[..],
        BlockKind::Program => &PROGRAM_BODY[..],
        BlockKind::Module => &MODULE_BODY[..],
        BlockKind::SigModule => &SIG_MODULE_BODY[..],
        BlockKind::BlockData => &BLOCK_DATA_BODY[..],
        BlockKind::Subroutine | BlockKind::Function => &SUBPROGRAM_BODY[..],
        BlockKind::Interface => &INTERFACE_BODY[..],
        BlockKind::DerivedType => &DERIVED_TYPE_BODY[..],
        BlockKind::IfThen => &IF_THEN_BODY[..],
        BlockKind::Do | BlockKind::Associate | BlockKind::Case => &EXECUTION_PART[..],
        BlockKind::Select => &SELECT_BODY[..],
        BlockKind::Where => &WHERE_BODY[..],
        BlockKind::Forall => &FORALL_BODY[..],
        BlockKind::Enum => ENUM_BODY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_dedups_preserving_order() {
        let a = [KindId::Use, KindId::Format];
        let b = [KindId::Format, KindId::Entry];
        assert_eq!(
            compose(&[&a, &b]),
            vec![KindId::Use, KindId::Format, KindId::Entry]
        );
    }

    #[test]
    fn test_candidate_lists_have_no_duplicates() {
        for kind in [
            BlockKind::Unit,
            BlockKind::Program,
            BlockKind::Module,
            BlockKind::Subroutine,
            BlockKind::Interface,
            BlockKind::DerivedType,
            BlockKind::IfThen,
            BlockKind::Do,
            BlockKind::Select,
        ] {
            let list = candidates_for(kind);
            for (i, k) in list.iter().enumerate() {
                assert!(
                    !list[i + 1..].contains(k),
                    "duplicate {k:?} in {kind} candidates"
                );
            }
        }
    }

    #[test]
    fn test_if_then_precedes_action_if() {
        let list = candidates_for(BlockKind::Do);
        let if_then = list.iter().position(|&k| k == KindId::IfThenBegin).unwrap();
        let action_if = list.iter().position(|&k| k == KindId::IfStmt).unwrap();
        assert!(if_then < action_if);
    }

    #[test]
    fn test_dialect_restrictions() {
        assert!(KindId::Pause.applies(Dialect::Fixed77));
        assert!(!KindId::Pause.applies(Dialect::Free90));
        assert!(KindId::Depend.applies(Dialect::Signature));
        assert!(!KindId::Depend.applies(Dialect::Free90));
        assert!(!KindId::InterfaceBegin.applies(Dialect::Fixed77));
        assert!(KindId::InterfaceBegin.applies(Dialect::Free90));
        assert!(KindId::Call.applies(Dialect::Fixed77));
    }
}
