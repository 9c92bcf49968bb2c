use crate::error::SessionError;
use glob::Pattern;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound on files materialized as classes for one library.
pub const MAX_CLASSES_PER_LIBRARY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerSettings {
    pub env_prefix: String,
    pub file_pattern: String,
    pub skip_dirs: Vec<String>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            env_prefix: "SIMPLE_".to_string(),
            file_pattern: "*.e".to_string(),
            skip_dirs: ["EIFGENs", "target", "node_modules", "build", "dist"]
                .iter()
                .map(|dir| dir.to_string())
                .collect(),
        }
    }
}

/// A library root found through an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryScan {
    pub name: String,
    pub root: PathBuf,
    /// Every matching file under the root.
    pub file_count: usize,
    /// At most [`MAX_CLASSES_PER_LIBRARY`] of those files, in walk order.
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Count every file, keep only the first few.
    CountAll,
    /// Stop walking as soon as the materialization cap is reached.
    StopAtCap,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    pub file_count: usize,
    pub files: Vec<PathBuf>,
}

/// Heuristic fallback that discovers library roots from `<PREFIX>NAME=/path`
/// environment variables and counts their source files.
#[derive(Debug, Clone)]
pub struct EnvironmentScanner {
    vars: Vec<(String, String)>,
    prefix: String,
    pattern: Pattern,
    skip_dirs: Vec<String>,
}

impl EnvironmentScanner {
    pub fn new(settings: &ScannerSettings) -> Result<Self, SessionError> {
        let pattern =
            Pattern::new(&settings.file_pattern).map_err(|e| SessionError::FilePattern {
                pattern: settings.file_pattern.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            vars: Vec::new(),
            prefix: settings.env_prefix.to_uppercase(),
            pattern,
            skip_dirs: settings.skip_dirs.clone(),
        })
    }

    /// Capture the current process environment.
    pub fn with_process_env(self) -> Self {
        self.with_vars(std::env::vars())
    }

    pub fn with_vars<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.vars = vars.into_iter().collect();
        self.vars.sort();
        self
    }

    /// Scan every candidate root. Roots that do not exist are skipped.
    pub fn scan(&self) -> Vec<LibraryScan> {
        self.candidate_roots()
            .into_iter()
            .map(|(name, root)| {
                let outcome = self.walk(&root, WalkMode::CountAll);
                log::debug!(
                    "Scanned {} at {}: {} matching files",
                    name,
                    root.display(),
                    outcome.file_count
                );
                LibraryScan {
                    name,
                    root,
                    file_count: outcome.file_count,
                    files: outcome.files,
                }
            })
            .collect()
    }

    /// Resolve a library by name through its environment key
    /// (`simple-json` → `SIMPLE_JSON`). Every matching file is counted; only
    /// the first [`MAX_CLASSES_PER_LIBRARY`] are kept.
    pub fn lookup(&self, library_name: &str) -> Option<LibraryScan> {
        let key = env_key(library_name);
        if !key.starts_with(&self.prefix) {
            return None;
        }

        let (_, value) = self.vars.iter().find(|(name, _)| *name == key)?;
        let root = PathBuf::from(value);
        if !root.is_dir() {
            return None;
        }

        let outcome = self.walk(&root, WalkMode::CountAll);
        Some(LibraryScan {
            name: library_name.to_string(),
            root,
            file_count: outcome.file_count,
            files: outcome.files,
        })
    }

    pub fn walk(&self, root: &Path, mode: WalkMode) -> WalkOutcome {
        walk_sources(root, &self.pattern, &self.skip_dirs, mode)
    }

    fn candidate_roots(&self) -> Vec<(String, PathBuf)> {
        self.vars
            .iter()
            .filter(|(name, _)| name.starts_with(&self.prefix) && name.len() > self.prefix.len())
            .filter_map(|(name, value)| {
                let root = PathBuf::from(value);
                root.is_dir().then(|| (name.to_lowercase(), root))
            })
            .collect()
    }
}

/// Environment key a library name maps to.
pub fn env_key(library_name: &str) -> String {
    library_name.trim().to_uppercase().replace('-', "_")
}

/// Iterative depth-first walk collecting files whose name matches `pattern`.
///
/// Hidden directories and `skip_dirs` are pruned. Directories are tracked by
/// canonical path so symlink cycles are visited once.
pub fn walk_sources(
    root: &Path,
    pattern: &Pattern,
    skip_dirs: &[String],
    mode: WalkMode,
) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let key = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if !visited.insert(key) {
            continue;
        }

        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        let mut entries: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
        entries.sort();

        let mut subdirs = Vec::new();
        for path in entries {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if name.starts_with('.') {
                continue;
            }

            if path.is_dir() {
                if !skip_dirs.iter().any(|skip| skip.eq_ignore_ascii_case(&name)) {
                    subdirs.push(path);
                }
            } else if pattern.matches(&name) {
                outcome.file_count += 1;
                if outcome.files.len() < MAX_CLASSES_PER_LIBRARY {
                    outcome.files.push(path);
                }
                if mode == WalkMode::StopAtCap && outcome.files.len() >= MAX_CLASSES_PER_LIBRARY {
                    return outcome;
                }
            }
        }

        stack.extend(subdirs.into_iter().rev());
    }

    outcome
}
