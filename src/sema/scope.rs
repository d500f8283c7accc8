//! Per-scope symbol tables.
//!
//! The capability mix of a scope (variables, implicit rules, use table,
//! nested subprograms, derived-type table) is one struct of owned tables;
//! blocks that do not use a capability simply leave its table empty. Scopes
//! are created during semantic analysis and owned by their block node.

use std::collections::HashMap;

use crate::parse::stmt::{leading_name, matching_paren};
use crate::parse::typedecl::TypeSpec;

/// One entry of a scope's variable table.
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub name: String,
    /// Declared type; `None` until a declaration refines this entry
    /// (dummy arguments are pre-seeded untyped).
    pub typespec: Option<TypeSpec>,
    pub attrs: Vec<String>,
    /// Array spec text from the entity declaration.
    pub dims: Option<String>,
    /// Initializer text (`= expr` or `=> null()`).
    pub init: Option<String>,
    pub is_dummy: bool,
    pub is_result: bool,
}

impl VarInfo {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typespec: None,
            attrs: Vec::new(),
            dims: None,
            init: None,
            is_dummy: false,
            is_result: false,
        }
    }
}

/// One resolved USE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UseInfo {
    pub module: String,
    /// `Some` when an ONLY list restricts the import.
    pub only: Option<Vec<String>>,
    /// Rename list for a plain USE.
    pub renames: Vec<String>,
}

/// First-letter implicit-typing rules.
///
/// Uninitialized until the analyzer has processed the scope's IMPLICIT
/// statements; `initialize` then synthesizes the two standard defaults so
/// lookup is well-defined for every letter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImplicitRules {
    none: bool,
    map: HashMap<char, TypeSpec>,
    defaults: Option<(TypeSpec, TypeSpec)>,
}

impl ImplicitRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize the standard `default_integer`/`default_real` entries
    /// unless IMPLICIT NONE is in effect. Idempotent.
    pub fn initialize(&mut self) {
        if !self.none && self.defaults.is_none() {
            self.defaults = Some((TypeSpec::default_integer(), TypeSpec::default_real()));
        }
    }

    pub fn set_none(&mut self) {
        self.none = true;
        self.defaults = None;
    }

    #[must_use]
    pub fn is_none_rule(&self) -> bool {
        self.none
    }

    #[must_use]
    pub fn has_explicit_rules(&self) -> bool {
        !self.map.is_empty()
    }

    pub fn add_range(&mut self, start: char, end: char, spec: &TypeSpec) {
        for l in start..=end {
            self.map.insert(l, spec.clone());
        }
    }

    /// The type an undeclared name of this first letter resolves to.
    /// `None` under IMPLICIT NONE.
    #[must_use]
    pub fn lookup(&self, letter: char) -> Option<&TypeSpec> {
        if let Some(spec) = self.map.get(&letter) {
            return Some(spec);
        }
        if self.none {
            return None;
        }
        let (default_integer, default_real) = self.defaults.as_ref()?;
        if ('i'..='n').contains(&letter) {
            Some(default_integer)
        } else {
            Some(default_real)
        }
    }
}

/// Symbol tables attached to a scope-bearing block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    pub variables: HashMap<String, VarInfo>,
    pub implicit: ImplicitRules,
    /// Derived-type name -> child index of the defining block.
    pub type_decls: HashMap<String, usize>,
    pub uses: Vec<UseInfo>,
    /// Nested subprogram names in source order (populated only after a
    /// CONTAINS marker, or directly for file-level and interface scopes).
    pub subprograms: Vec<String>,
    /// Module names defined in this scope (file level).
    pub modules: Vec<String>,
    pub module_procedures: Vec<String>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&VarInfo> {
        self.variables.get(name)
    }

    /// Implicit type of a name by its first letter. `None` under
    /// IMPLICIT NONE.
    #[must_use]
    pub fn implicit_type(&self, name: &str) -> Option<&TypeSpec> {
        let letter = name.chars().next()?.to_ascii_lowercase();
        self.implicit.lookup(letter)
    }

    #[must_use]
    pub fn used_modules(&self) -> &[UseInfo] {
        &self.uses
    }
}

/// Split an entity declaration into its name, array spec, and initializer
/// (`a(2,3) = 0` -> `("a", Some("(2,3)"), Some("0"))`).
#[must_use]
pub fn entity_parts(entity: &str) -> Option<(String, Option<String>, Option<String>)> {
    let name = leading_name(entity)?.to_string();
    let mut rest = entity[name.len()..].trim_start();
    let mut dims = None;
    if rest.starts_with('(') {
        let end = matching_paren(rest)?;
        dims = Some(rest[..=end].to_string());
        rest = rest[end + 1..].trim_start();
    }
    // Legacy char-length suffix is folded into the remainder before any
    // initializer.
    let init = rest
        .find('=')
        .map(|i| rest[i + 1..].trim_start_matches('>').trim().to_string());
    Some((name, dims, init))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::typedecl::BaseType;

    #[test]
    fn test_default_implicit_rules() {
        let mut rules = ImplicitRules::new();
        rules.initialize();
        assert_eq!(rules.lookup('i').unwrap().base, BaseType::Integer);
        assert_eq!(rules.lookup('n').unwrap().base, BaseType::Integer);
        assert_eq!(rules.lookup('x').unwrap().base, BaseType::Real);
        assert_eq!(rules.lookup('a').unwrap().base, BaseType::Real);
    }

    #[test]
    fn test_explicit_range_overrides_default() {
        let mut rules = ImplicitRules::new();
        rules.add_range('d', 'd', &TypeSpec::plain(BaseType::DoublePrecision));
        rules.initialize();
        assert_eq!(rules.lookup('d').unwrap().base, BaseType::DoublePrecision);
        assert_eq!(rules.lookup('e').unwrap().base, BaseType::Real);
        assert_eq!(rules.lookup('i').unwrap().base, BaseType::Integer);
    }

    #[test]
    fn test_implicit_none() {
        let mut rules = ImplicitRules::new();
        rules.set_none();
        rules.initialize();
        assert_eq!(rules.lookup('i'), None);
        assert_eq!(rules.lookup('x'), None);
    }

    #[test]
    fn test_entity_parts() {
        assert_eq!(
            entity_parts("a(2,3)").unwrap(),
            ("a".into(), Some("(2,3)".into()), None)
        );
        assert_eq!(
            entity_parts("b = 1").unwrap(),
            ("b".into(), None, Some("1".into()))
        );
        assert_eq!(
            entity_parts("p => null()").unwrap(),
            ("p".into(), None, Some("null()".into()))
        );
        assert_eq!(entity_parts("plain").unwrap(), ("plain".into(), None, None));
    }
}
