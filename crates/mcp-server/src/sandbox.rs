//! Path confinement to the administrator-approved data roots.
//!
//! Every filesystem touch goes through [`RootSet::resolve`] first. Decisions are made on fully
//! resolved paths (symlinks, `.` and `..` collapsed), never on the raw strings callers send.

use crate::error::{ToolError, ToolResult};
use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Ordered, de-duplicated set of canonical root directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSet {
    roots: Vec<PathBuf>,
}

impl RootSet {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut out: Vec<PathBuf> = Vec::new();
        for root in roots {
            let root = root.as_ref();
            match canonicalize_lenient(root) {
                Ok(canonical) => {
                    if !out.contains(&canonical) {
                        out.push(canonical);
                    }
                }
                Err(err) => {
                    log::warn!("Ignoring data root {}: {err}", root.display());
                }
            }
        }
        Self { roots: out }
    }

    /// Parse a `DATA_ROOTS`-style list; both `,` and `;` separate entries.
    pub fn from_delimited(raw: &str) -> Self {
        Self::new(split_roots(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    /// Resolve `path` and require it to be one of the roots or nested under one.
    pub fn resolve(&self, path: &str) -> ToolResult<PathBuf> {
        resolve(path, self)
    }
}

pub fn split_roots(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn resolve(path: &str, roots: &RootSet) -> ToolResult<PathBuf> {
    if path.trim().is_empty() {
        return Err(ToolError::invalid_argument("Path is empty"));
    }
    let resolved = canonicalize_lenient(Path::new(path)).map_err(|err| {
        ToolError::invalid_argument("Invalid path")
            .with_detail("path", path)
            .with_detail("hint", err.to_string())
    })?;

    if roots.is_empty() {
        return Err(ToolError::security_violation("DATA_ROOTS is not configured")
            .with_detail("path", resolved.display().to_string()));
    }

    let candidate = comparison_key(&resolved);
    if roots
        .iter()
        .any(|root| candidate.starts_with(comparison_key(root)))
    {
        return Ok(resolved);
    }

    Err(
        ToolError::security_violation("Path is outside allowed DATA_ROOTS")
            .with_detail("path", resolved.display().to_string()),
    )
}

/// `realpath`-style resolution that tolerates a missing tail.
///
/// Existing prefixes are canonicalized (following symlinks); once a component does not exist
/// the remainder is applied lexically, so `..` after a missing directory still pops.
pub fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                let candidate = resolved.join(name);
                resolved = candidate.canonicalize().unwrap_or(candidate);
            }
        }
    }
    Ok(resolved)
}

// Case-insensitive filesystems compare folded paths; `Path::starts_with` is component-wise,
// so `/data2` never matches a `/data` root.
#[cfg(any(windows, target_os = "macos"))]
fn comparison_key(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().to_lowercase())
}

#[cfg(not(any(windows, target_os = "macos")))]
fn comparison_key(path: &Path) -> PathBuf {
    path.to_path_buf()
}
