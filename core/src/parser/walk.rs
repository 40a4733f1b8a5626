use ignore::WalkBuilder;
use log::warn;
use std::path::{Path, PathBuf};

pub struct DirectoryWalker<'a> {
    root_path: &'a Path,
    extensions: &'a [String],
    ignore_patterns: Vec<&'static str>,
}

impl<'a> DirectoryWalker<'a> {
    pub fn new(root_path: &'a Path, extensions: &'a [String]) -> Self {
        Self {
            root_path,
            extensions,
            ignore_patterns: vec![
                ".git",
                ".svn",
                "target",
                "node_modules",
                ".venv",
                "venv",
                "dist",
                "build",
                "cobol_structures",
            ],
        }
    }

    /// Every COBOL source below the root, sorted by path.
    pub fn collect_sources(&self) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(self.root_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        let mut sources = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if path == self.root_path {
                continue;
            }

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() || self.should_ignore(path) {
                continue;
            }
            if self.is_source(path) {
                sources.push(path.to_path_buf());
            }
        }

        sources.sort();
        sources
    }

    fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// True when any directory between the root and `path` is a skipped one.
    fn should_ignore(&self, path: &Path) -> bool {
        let rel = path.strip_prefix(self.root_path).unwrap_or(path);
        let Some(parent) = rel.parent() else {
            return false;
        };
        parent.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            self.ignore_patterns.iter().any(|p| name == *p)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collects_sorted_sources_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("batch/sub")).unwrap();
        fs::write(root.join("zeta.cbl"), "").unwrap();
        fs::write(root.join("batch/ALPHA.CBL"), "").unwrap();
        fs::write(root.join("batch/sub/beta.cbl"), "").unwrap();
        fs::write(root.join("batch/copy.cpy"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();

        let exts = vec!["cbl".to_string()];
        let sources = DirectoryWalker::new(root, &exts).collect_sources();
        let rel: Vec<String> = sources
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(rel, vec!["batch/ALPHA.CBL", "batch/sub/beta.cbl", "zeta.cbl"]);
    }

    #[test]
    fn test_skips_build_and_vcs_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join("build/gen.cbl"), "").unwrap();
        fs::write(root.join(".git/objects/x.cbl"), "").unwrap();
        fs::write(root.join("main.cbl"), "").unwrap();

        let exts = vec!["cbl".to_string()];
        let sources = DirectoryWalker::new(root, &exts).collect_sources();
        assert_eq!(sources, vec![root.join("main.cbl")]);
    }
}
