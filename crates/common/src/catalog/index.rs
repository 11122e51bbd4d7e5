use std::collections::BTreeMap;

use crate::model::Directory;
use crate::path::{self, StorePath};

/// Directory records keyed by path.
///
/// Longest-prefix lookups walk the ancestors of the requested path, so a
/// lookup costs one map probe per path segment regardless of how many
/// directories exist.
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    by_path: BTreeMap<String, Directory>,
}

impl DirectoryIndex {
    pub fn new(directories: impl IntoIterator<Item = Directory>) -> Self {
        let mut by_path = BTreeMap::new();
        for directory in directories {
            let key = directory.path().as_str().to_string();
            if let Some(previous) = by_path.insert(key, directory) {
                tracing::warn!(
                    path = %previous.path(),
                    "duplicate directory record, keeping the last one"
                );
            }
        }
        Self { by_path }
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// The directory recorded at exactly `path`.
    pub fn get(&self, path: &str) -> Option<&Directory> {
        self.by_path.get(path)
    }

    /// The deepest directory whose path is a segment-aligned prefix of `path`.
    pub fn governing(&self, path: &str) -> Option<&Directory> {
        path::ancestors(path).find_map(|ancestor| self.by_path.get(ancestor))
    }

    /// Directories lying strictly below `path`, in path order.
    pub fn descendants<'a>(&'a self, path: &StorePath) -> impl Iterator<Item = &'a Directory> + 'a {
        let prefix = if path.is_root() {
            path::ROOT.to_string()
        } else {
            format!("{}/", path)
        };
        self.by_path
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| key.as_str() != path::ROOT)
            .map(|(_, directory)| directory)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directory> {
        self.by_path.values()
    }
}
