//! The persisted per-project symbol index.
//!
//! One hidden file per project root holds every [`Declaration`] scanned
//! from that root as a JSON array of records.  The file is always rewritten
//! whole; merging a rescanned file into the existing set happens in memory
//! (see [`merge`]) before calling [`save`].
//!
//! Reading never fails: a missing or corrupt file is simply an empty index,
//! which the query path treats as "no intelligence available".

use std::io::{self, Write};
use std::path::Path;

use crate::types::{Declaration, GLOBAL_SCOPE, Kind};

/// Default name of the index file inside a project root.
pub const INDEX_FILE_NAME: &str = ".phpintel";

/// Load every declaration from `index_path`.
///
/// Returns an empty list when the file is missing, unreadable or not a
/// valid index.
pub fn load(index_path: &Path) -> Vec<Declaration> {
    let content = match std::fs::read_to_string(index_path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    match serde_json::from_str(&content) {
        Ok(declarations) => declarations,
        Err(e) => {
            tracing::warn!("phpintel: ignoring corrupt index {}: {}", index_path.display(), e);
            Vec::new()
        }
    }
}

/// Overwrite `index_path` with `declarations`.
///
/// The data is written to a temporary file next to the target and then
/// renamed over it, so readers see either the old or the new index.
pub fn save(declarations: &[Declaration], index_path: &Path) -> io::Result<()> {
    let dir = match index_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let data = serde_json::to_vec(declarations).map_err(io::Error::other)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&data)?;
    tmp.flush()?;
    tmp.persist(index_path).map_err(|e| e.error)?;
    Ok(())
}

/// Replace every declaration that came from `rescanned_path` with `fresh`.
///
/// Declarations from other files keep their relative order and come first;
/// the fresh set is appended in its own (source) order.
pub fn merge(old: Vec<Declaration>, rescanned_path: &str, fresh: Vec<Declaration>) -> Vec<Declaration> {
    let mut merged: Vec<Declaration> = old
        .into_iter()
        .filter(|d| d.path != rescanned_path)
        .collect();
    merged.extend(fresh);
    merged
}

/// An in-memory view over a loaded index with the lookups the resolver and
/// the completion filter need.  Lookups scan in index order so that the
/// first structurally matching declaration always wins.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    declarations: Vec<Declaration>,
}

impl SymbolIndex {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    /// Load from disk with the same "never fails" contract as [`load`].
    pub fn load(index_path: &Path) -> Self {
        Self::new(load(index_path))
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether any declaration is owned by `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.declarations.iter().any(|d| d.class == class)
    }

    /// The first member of `class` named `name`, with or without the `$`
    /// sigil.
    pub fn find_member(&self, class: &str, name: &str) -> Option<&Declaration> {
        let bare = name.strip_prefix('$').unwrap_or(name);
        self.declarations.iter().find(|d| {
            d.class == class && (d.name == name || d.name.strip_prefix('$') == Some(bare))
        })
    }

    /// The first global variable named `name` (with `$`) that carries a type.
    pub fn global_variable_type(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| {
                d.class == GLOBAL_SCOPE
                    && d.kind == Kind::Variable
                    && d.name == name
                    && !d.returns.is_empty()
            })
            .map(|d| d.returns.as_str())
    }
}
