//! Expansion of path arguments into the list of files to format.
//!
//! Supported argument forms:
//! - `dir/...` walks the whole subtree below `dir` (`...` alone means `.`)
//! - `dir` lists the regular files directly inside `dir`
//! - `file` is taken as-is
//!
//! Directories named in the [`SkipSet`] are pruned from recursive walks.
//! Only regular files are returned. Symlinks, sockets and devices found while
//! listing a directory are skipped silently, and so are entries that cannot be
//! read. Arguments that do not exist, and `...` roots lying inside a skipped
//! directory, produce a [`PathResolutionWarning`] and resolution carries on
//! with the next argument.
//!
//! The final list is deduplicated by canonical path, keeping the first
//! occurrence and its original spelling.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::PathResolutionWarning;

/// Suffix that turns a path argument into a recursive one
pub const RECURSION_MARKER: &str = "...";

/// Directory names excluded from recursive expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipSet(HashSet<String>);

impl SkipSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn contains_os(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|name| self.contains(name))
    }

    /// Whether any normal component of `path` is a skipped name
    #[must_use]
    pub fn matches_path(&self, path: &Path) -> bool {
        !self.is_empty()
            && path.components().any(|component| match component {
                Component::Normal(name) => self.contains_os(name),
                _ => false,
            })
    }
}

impl<S: Into<String>> FromIterator<S> for SkipSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for SkipSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Outcome of resolving a set of path arguments
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Files to process, in traversal order
    pub files: Vec<PathBuf>,
    /// Arguments that could not be resolved
    pub warnings: Vec<PathResolutionWarning>,
}

/// A path argument split into its root and whether it recurses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathArg {
    pub root: PathBuf,
    pub recursive: bool,
}

impl PathArg {
    #[must_use]
    pub fn parse(argument: &str) -> Self {
        let Some(rest) = argument.strip_suffix(RECURSION_MARKER) else {
            return Self::plain(argument);
        };
        if rest.is_empty() {
            return Self {
                root: PathBuf::from("."),
                recursive: true,
            };
        }
        if !rest.ends_with(std::path::is_separator) {
            // `foo...` is an ordinary name
            return Self::plain(argument);
        }
        let trimmed = rest.trim_end_matches(std::path::is_separator);
        let root = if trimmed.is_empty() {
            // `/...`
            PathBuf::from(&rest[..1])
        } else {
            PathBuf::from(trimmed)
        };
        Self {
            root,
            recursive: true,
        }
    }

    fn plain(argument: &str) -> Self {
        Self {
            root: PathBuf::from(argument),
            recursive: false,
        }
    }
}

/// Resolve path arguments into a deduplicated list of regular files.
///
/// An empty argument list behaves like `["."]`.
pub fn resolve<S: AsRef<str>>(arguments: &[S], skip: &SkipSet) -> Resolution {
    let mut resolution = Resolution::default();

    if arguments.is_empty() {
        collect_argument(".", skip, &mut resolution);
    } else {
        for argument in arguments {
            collect_argument(argument.as_ref(), skip, &mut resolution);
        }
    }

    resolution.files = dedup_canonical(resolution.files);
    resolution
}

fn collect_argument(argument: &str, skip: &SkipSet, resolution: &mut Resolution) {
    let arg = PathArg::parse(argument);

    let metadata = match fs::metadata(&arg.root) {
        Ok(metadata) => metadata,
        Err(e) => {
            let warning = PathResolutionWarning::new(argument, e);
            warn!("{warning}");
            resolution.warnings.push(warning);
            return;
        }
    };

    if arg.recursive {
        if skip.matches_path(&arg.root) {
            let warning =
                PathResolutionWarning::new(argument, "path is inside a skipped directory");
            warn!("{warning}");
            resolution.warnings.push(warning);
            return;
        }
        walk_recursive(&arg.root, skip, &mut resolution.files);
    } else if metadata.is_file() {
        resolution.files.push(arg.root);
    } else if metadata.is_dir() {
        match list_directory(&arg.root) {
            Ok(files) => resolution.files.extend(files),
            Err(e) => {
                let warning = PathResolutionWarning::new(argument, e);
                warn!("{warning}");
                resolution.warnings.push(warning);
            }
        }
    } else {
        let warning = PathResolutionWarning::new(argument, "not a regular file or directory");
        warn!("{warning}");
        resolution.warnings.push(warning);
    }
}

/// Walk the subtree under `root`, pruning skipped directory names
fn walk_recursive(root: &Path, skip: &SkipSet, files: &mut Vec<PathBuf>) {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0 && entry.file_type().is_dir() && skip.contains_os(entry.file_name()))
        });

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            Err(e) => debug!("Skipping unreadable entry: {e}"),
        }
    }
}

/// Regular files directly inside `dir`, sorted by name
fn list_directory(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {e}", dir.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}

fn dedup_canonical(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::with_capacity(files.len());
    files
        .into_iter()
        .filter(|path| {
            let key = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                true
            } else {
                debug!("Dropping duplicate path {}", path.display());
                false
            }
        })
        .collect()
}
