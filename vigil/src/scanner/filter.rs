use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use crate::file::normalize_root;
use super::ScannerSetupError;

/// Compiled exclusion rules of a scanner.
///
/// A path is excluded when
/// - it, or its file name, matches one of the glob patterns,
/// - it lies under one of the excluded absolute prefixes, or
/// - (directories only) its name is one of the excluded directory names.
///
/// Excluded directories are pruned, so nothing below them is visited.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    globs: GlobSet,
    dir_names: HashSet<OsString>,
    path_prefixes: Vec<PathBuf>,
}

impl ExclusionRules {
    pub fn new(
        patterns: &[String],
        dir_names: &[String],
        path_prefixes: &[PathBuf],
    ) -> Result<Self, ScannerSetupError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| ScannerSetupError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let globs = builder.build().map_err(|source| ScannerSetupError::InvalidGlob {
            pattern: patterns.join(","),
            source,
        })?;

        let path_prefixes = path_prefixes
            .iter()
            .map(|p| {
                normalize_root(p).map_err(|source| ScannerSetupError::InvalidPrefix {
                    path: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            globs,
            dir_names: dir_names.iter().map(OsString::from).collect(),
            path_prefixes,
        })
    }

    /// Rules that exclude nothing.
    pub fn none() -> Self {
        Self {
            globs: GlobSet::empty(),
            dir_names: HashSet::new(),
            path_prefixes: Vec::new(),
        }
    }

    fn matches_glob(&self, path: &Path) -> bool {
        if self.globs.is_empty() {
            return false;
        }
        self.globs.is_match(path)
            || path.file_name().is_some_and(|name| self.globs.is_match(name))
    }

    fn under_prefix(&self, path: &Path) -> bool {
        self.path_prefixes.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Whether a directory below the scan root should be pruned.
    pub fn is_excluded_dir(&self, path: &Path, name: &OsStr) -> bool {
        self.dir_names.contains(name) || self.under_prefix(path) || self.matches_glob(path)
    }

    /// Whether a file should be left out of the scan.
    pub fn is_excluded_file(&self, path: &Path) -> bool {
        self.under_prefix(path) || self.matches_glob(path)
    }
}
