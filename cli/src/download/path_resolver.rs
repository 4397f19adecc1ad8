// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Result Path Resolver
//!
//! Maps a server-declared relative path onto a local output directory and
//! rejects anything that would land outside it.
//!
//! Containment is checked lexically on absolute paths. Symlinks inside the
//! output directory are not followed and can still escape it.

use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathResolveError {
    #[error("path must not be empty")]
    Empty,

    #[error("path must be relative")]
    Absolute,

    #[error("path must not escape output directory")]
    Escape,

    #[error("resolve output directory: {0}")]
    OutputDir(String),
}

/// Lexically clean a path: drop `.` components and fold `..` into the
/// preceding normal component. Leading `..` on a relative path is kept,
/// `..` directly under the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => parts.push(component),
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            Component::Normal(_) => parts.push(component),
        }
    }
    parts.iter().collect()
}

/// Resolve `server_path` under `output_dir`.
///
/// Validation runs against the absolute form of `output_dir`; the returned
/// path stays relative for a relative `output_dir` and is lexically clean,
/// e.g. `out/a.txt` for `./out` and `a.txt` for `.`.
pub fn resolve(output_dir: &Path, server_path: &str) -> Result<PathBuf, PathResolveError> {
    let cleaned = normalize(Path::new(server_path));
    if cleaned.as_os_str().is_empty() || is_bare_root(&cleaned) {
        return Err(PathResolveError::Empty);
    }
    if cleaned.has_root() || cleaned.is_absolute() {
        tracing::warn!(path = %server_path, "Rejected absolute result path");
        return Err(PathResolveError::Absolute);
    }

    let absolute_output = std::path::absolute(output_dir)
        .map(|p| normalize(&p))
        .map_err(|e| PathResolveError::OutputDir(e.to_string()))?;
    let joined = normalize(&absolute_output.join(&cleaned));

    let mut root = absolute_output.to_string_lossy().into_owned();
    if !root.ends_with(MAIN_SEPARATOR) {
        root.push(MAIN_SEPARATOR);
    }
    if !joined.to_string_lossy().starts_with(&root) {
        tracing::warn!(
            path = %server_path,
            output_dir = %output_dir.display(),
            "Rejected result path escaping output directory"
        );
        return Err(PathResolveError::Escape);
    }

    Ok(normalize(&output_dir.join(cleaned)))
}

fn is_bare_root(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}
