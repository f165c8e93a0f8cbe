//! Data types used throughout phpintel.
//!
//! This module contains the "model" structs and enums that represent
//! extracted PHP symbols (the persisted [`Declaration`] record) as well as
//! the query-side types (access operator, resolved target, candidate).

use serde::{Deserialize, Serialize};

/// Sentinel class name for declarations that are not owned by a class
/// (top-level functions and variables).
pub const GLOBAL_SCOPE: &str = "__global__";

/// Visibility of a declaration.
///
/// In PHP, members without an explicit visibility modifier default to `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// What a declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A property or a global variable.  The name keeps its `$` sigil.
    Variable,
    /// A method or a standalone function.
    Function,
}

/// One function/method parameter as stored in the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// The parameter name including the `$` prefix (e.g. "$text").
    pub name: String,
    /// Declared type hint, or the empty string when there is none.
    #[serde(rename = "type", default)]
    pub type_hint: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: type_hint.into(),
        }
    }
}

/// One extracted symbol.
///
/// Every field is present on every record; variables simply carry an empty
/// `args` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Declaration {
    /// Owning class name, or [`GLOBAL_SCOPE`].
    pub class: String,
    /// Symbol name.  Variables keep the leading `$`.
    pub name: String,
    pub kind: Kind,
    #[serde(default)]
    pub visibility: Visibility,
    /// Whether the symbol is accessed on the class rather than an instance.
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(default)]
    pub args: Vec<Parameter>,
    /// Declared or inferred type.  Empty when unknown.
    #[serde(default)]
    pub returns: String,
    /// Absolute path of the file the declaration came from.
    #[serde(default)]
    pub path: String,
}

impl Declaration {
    /// Create a public, non-static declaration with no args and no type.
    pub fn new(class: impl Into<String>, name: impl Into<String>, kind: Kind) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            is_static: false,
            args: Vec::new(),
            returns: String::new(),
            path: String::new(),
        }
    }

    /// The name without a leading `$`.
    pub fn bare_name(&self) -> &str {
        self.name.strip_prefix('$').unwrap_or(&self.name)
    }

    pub fn is_global(&self) -> bool {
        self.class == GLOBAL_SCOPE
    }
}

/// The member-access operator in front of the partial name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOperator {
    /// `->` or `?->` (instance access).
    Arrow,
    /// `::` (static access).
    DoubleColon,
    /// No operator directly before the partial name.
    Other,
}

/// The result of resolving a context chain against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Class whose members should be offered (may be [`GLOBAL_SCOPE`]).
    pub class: String,
    /// The name fragment being typed.
    pub partial: String,
}

impl ResolvedTarget {
    pub fn new(class: impl Into<String>, partial: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            partial: partial.into(),
        }
    }
}

/// One completion candidate produced by the filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Display name (variables have their `$` stripped).
    pub name: String,
    /// The `returns` type of the declaration (may be empty).
    pub returns: String,
    /// Editor-insertable text.  Functions use snippet placeholders.
    pub snippet: String,
    pub kind: Kind,
    /// Whether the candidate belongs to the global scope.
    pub global: bool,
}

impl Candidate {
    /// The label shown in the popup: name and type separated by a tab.
    pub fn label(&self) -> String {
        format!("{}\t{}", self.name, self.returns)
    }
}
