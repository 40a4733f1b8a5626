use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::callgraph::CallGraph;
use crate::types::FileStructure;

pub const STRUCTURE_SUFFIX: &str = "structure.json";

/// `<out_dir>/<path relative to repo_root>` with the source extension
/// replaced by `.structure.json`.
pub fn structure_path(out_dir: &Path, repo_root: &Path, file: &Path) -> PathBuf {
    let rel = file
        .strip_prefix(repo_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| file.file_name().map(PathBuf::from).unwrap_or_default());
    out_dir.join(rel).with_extension(STRUCTURE_SUFFIX)
}

pub fn write_structures(
    out_dir: &Path,
    repo_root: &Path,
    structures: &[FileStructure],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(structures.len());
    for structure in structures {
        let dst = structure_path(out_dir, repo_root, Path::new(&structure.file));
        write_json(&dst, structure)?;
        debug!(dst = %dst.display(), "wrote structure");
        written.push(dst);
    }
    Ok(written)
}

pub fn write_callgraph(path: &Path, graph: &CallGraph) -> Result<()> {
    write_json(path, graph)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_path_mirrors_layout() {
        let out = structure_path(
            Path::new("/out"),
            Path::new("/repo"),
            Path::new("/repo/batch/PAYROLL.cbl"),
        );
        assert_eq!(out, PathBuf::from("/out/batch/PAYROLL.structure.json"));
    }

    #[test]
    fn test_structure_path_outside_root_uses_file_name() {
        let out = structure_path(
            Path::new("out"),
            Path::new("/repo"),
            Path::new("/elsewhere/x.cob"),
        );
        assert_eq!(out, PathBuf::from("out/x.structure.json"));
    }
}
