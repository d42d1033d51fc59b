//! Type system for Ember
//!
//! Types are structural: two types are equal iff their names match and
//! their parameter lists are pairwise equal.

use std::fmt;

/// The names the analyzer accepts as `for`-loop iterables
const ITERABLE_TYPES: &[&str] = &["List", "str", "tuple", "set", "dict"];

/// Per-type pattern domains for exhaustiveness checking, keyed by type
/// name. A `match` over a type listed here must either carry a wildcard
/// case or cover every key. Extend by adding rows.
const PATTERN_DOMAINS: &[(&str, &[&str])] = &[("bool", &["literal:True", "literal:False"])];

/// Look up the full pattern domain for a scrutinee type, if one is known
pub fn pattern_domain(ty: &Type) -> Option<&'static [&'static str]> {
    PATTERN_DOMAINS
        .iter()
        .find(|(name, _)| *name == ty.name)
        .map(|(_, domain)| *domain)
}

/// A named type with ordered type parameters (`int`, `List[str]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub name: String,
    pub params: Vec<Type>,
}

impl Type {
    /// A type with no parameters
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(name: impl Into<String>, params: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// The unconstrained type given to everything unannotated
    pub fn any() -> Self {
        Self::simple("Any")
    }

    pub fn int() -> Self {
        Self::simple("int")
    }

    pub fn float() -> Self {
        Self::simple("float")
    }

    pub fn str_() -> Self {
        Self::simple("str")
    }

    pub fn bool_() -> Self {
        Self::simple("bool")
    }

    /// The type of expressions that produce no value
    pub fn none() -> Self {
        Self::simple("None")
    }

    pub fn is_any(&self) -> bool {
        self.name == "Any" && self.params.is_empty()
    }

    pub fn is_int(&self) -> bool {
        self.name == "int" && self.params.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        self.params.is_empty() && matches!(self.name.as_str(), "int" | "float")
    }

    pub fn is_future(&self) -> bool {
        self.name == "Future"
    }

    pub fn is_iterable(&self) -> bool {
        ITERABLE_TYPES.contains(&self.name.as_str())
    }

    /// Element type produced by iterating this type.
    ///
    /// `List[T]` yields `T`, `str` yields `str`, the remaining iterables
    /// yield `Any`.
    pub fn element_type(&self) -> Type {
        match self.name.as_str() {
            "List" => self.params.first().cloned().unwrap_or_else(Type::any),
            "str" => Type::str_(),
            _ => Type::any(),
        }
    }

    /// Subtype check.
    ///
    /// Placeholder for a real subtyping lattice: currently reflexive only.
    /// Callers treat `Any` on either side as compatible before asking.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        self == other
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
            write!(f, "[{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// Static signature of a declared function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
    pub is_async: bool,
    /// Generic parameter names (`T` in `def first<T>(...)`)
    pub generic_params: Vec<String>,
}
