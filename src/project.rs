//! The set of open project roots.
//!
//! A [`ProjectContext`] is passed explicitly into every scan and query.  It
//! lists the root folders in the order the editor reported them and knows
//! which hidden index file backs each one.

use std::path::{Path, PathBuf};

use crate::index::INDEX_FILE_NAME;

/// One project root folder and the index file that backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    pub path: PathBuf,
    pub index_path: PathBuf,
}

impl ProjectRoot {
    pub fn new(path: impl Into<PathBuf>, index_file: &str) -> Self {
        let path = path.into();
        let index_path = path.join(index_file);
        Self { path, index_path }
    }

    /// Whether a previous scan left an index file in this root.
    pub fn has_index(&self) -> bool {
        self.index_path.is_file()
    }

    pub fn contains(&self, file: &Path) -> bool {
        file.starts_with(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct ProjectContext {
    roots: Vec<ProjectRoot>,
    index_file: String,
}

impl Default for ProjectContext {
    fn default() -> Self {
        Self::new(INDEX_FILE_NAME)
    }
}

impl ProjectContext {
    /// An empty context whose roots will use `index_file` as their index
    /// file name.
    pub fn new(index_file: impl Into<String>) -> Self {
        Self {
            roots: Vec::new(),
            index_file: index_file.into(),
        }
    }

    pub fn with_roots<I, P>(index_file: impl Into<String>, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut ctx = Self::new(index_file);
        for root in roots {
            ctx.add_root(root);
        }
        ctx
    }

    pub fn roots(&self) -> &[ProjectRoot] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Add a root unless it is already present.  Existing directories are
    /// canonicalised so that later `starts_with` checks on canonical file
    /// paths succeed.
    pub fn add_root(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        if self.roots.iter().any(|r| r.path == path) {
            return;
        }
        self.roots.push(ProjectRoot::new(path, &self.index_file));
    }

    pub fn remove_root(&mut self, path: &Path) {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.roots.retain(|r| r.path != canonical && r.path != path);
    }

    /// Roots whose index file exists, in configuration order.
    pub fn roots_with_index(&self) -> impl Iterator<Item = &ProjectRoot> {
        self.roots.iter().filter(|r| r.has_index())
    }

    /// The first indexed root containing `file`.
    pub fn indexed_root_for(&self, file: &Path) -> Option<&ProjectRoot> {
        self.roots_with_index().find(|r| r.contains(file))
    }

    /// The index a completion query should read: the indexed root that
    /// contains `file` if there is one, otherwise the first indexed root.
    pub fn index_for_query(&self, file: Option<&Path>) -> Option<&Path> {
        file.and_then(|f| self.indexed_root_for(f))
            .or_else(|| self.roots_with_index().next())
            .map(|r| r.index_path.as_path())
    }
}
