use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Backend — which extractor turns source text into a FileStructure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// Tree-sitter when a grammar can be loaded, heuristic scanner otherwise
    #[default]
    Auto,
    TreeSitter,
    Heuristic,
}

// ---------------------------------------------------------------------------
// GrammarConfig — where the external COBOL grammar lives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GrammarConfig {
    /// Explicit path to a compiled grammar shared library
    pub library: Option<PathBuf>,
    /// Grammar checkout (containing `src/parser.c`) to build from when no artifact exists
    pub source_dir: Option<PathBuf>,
    /// Directory searched for, and receiving, built artifacts
    pub build_dir: PathBuf,
    /// Exported language function, e.g. `tree_sitter_cobol`
    pub symbol: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            library: None,
            source_dir: None,
            build_dir: PathBuf::from("build"),
            symbol: "tree_sitter_cobol".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// NodeKinds — grammar node kinds the tree walker reacts to
// ---------------------------------------------------------------------------

/// Defaults follow the public tree-sitter COBOL grammar. A JSON file with any
/// subset of these fields can override them for other grammar revisions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeKinds {
    pub program_name: Vec<String>,
    /// node kind -> division name
    pub divisions: HashMap<String, String>,
    /// node kind -> DATA DIVISION section name
    pub data_sections: HashMap<String, String>,
    pub data_item: Vec<String>,
    pub level_number: Vec<String>,
    pub data_name: Vec<String>,
    pub picture: Vec<String>,
    pub section_header: Vec<String>,
    pub paragraph_header: Vec<String>,
    pub call: Vec<String>,
    pub perform: Vec<String>,
    pub goto: Vec<String>,
}

fn owned(kinds: &[&str]) -> Vec<String> {
    kinds.iter().map(|k| k.to_string()).collect()
}

fn owned_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for NodeKinds {
    fn default() -> Self {
        Self {
            program_name: owned(&["program_name"]),
            divisions: owned_map(&[
                ("identification_division", "IDENTIFICATION"),
                ("environment_division", "ENVIRONMENT"),
                ("data_division", "DATA"),
                ("procedure_division", "PROCEDURE"),
            ]),
            data_sections: owned_map(&[
                ("file_section", "FILE"),
                ("working_storage_section", "WORKING-STORAGE"),
                ("local_storage_section", "LOCAL-STORAGE"),
                ("linkage_section", "LINKAGE"),
                ("report_section", "REPORT"),
                ("screen_section", "SCREEN"),
            ]),
            data_item: owned(&["data_description"]),
            level_number: owned(&["level_number"]),
            data_name: owned(&["entry_name"]),
            picture: owned(&["picture_clause"]),
            section_header: owned(&["section_header"]),
            paragraph_header: owned(&["paragraph_header"]),
            call: owned(&["call_statement"]),
            perform: owned(&["perform_statement_call_proc", "perform_statement_loop"]),
            goto: owned(&["goto_statement"]),
        }
    }
}

impl NodeKinds {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading node-kind profile {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing node-kind profile {}", path.display()))
    }

    pub(crate) fn matches(list: &[String], kind: &str) -> bool {
        list.iter().any(|k| k == kind)
    }
}

// ---------------------------------------------------------------------------
// Config — everything a repository run needs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub repo_root: PathBuf,
    /// Per-file `.structure.json` files land here, mirroring the repo layout
    pub out_dir: PathBuf,
    /// Aggregated call-graph JSON
    pub callgraph: PathBuf,
    /// Source extensions to pick up, compared case-insensitively
    pub extensions: Vec<String>,
    pub backend: Backend,
    pub grammar: GrammarConfig,
    pub node_kinds: NodeKinds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            out_dir: PathBuf::from("cobol_structures"),
            callgraph: PathBuf::from("filecall_graph.json"),
            extensions: vec!["cbl".to_string()],
            backend: Backend::Auto,
            grammar: GrammarConfig::default(),
            node_kinds: NodeKinds::default(),
        }
    }
}

impl Config {
    /// Check the repository root and return it in canonical form.
    pub fn validate(&self) -> Result<PathBuf> {
        if !self.repo_root.exists() {
            bail!("Repo root '{}' does not exist.", self.repo_root.display());
        }
        if !self.repo_root.is_dir() {
            bail!("Repo root '{}' is not a directory.", self.repo_root.display());
        }
        if self.extensions.is_empty() {
            bail!("No source extensions configured");
        }
        self.repo_root
            .canonicalize()
            .with_context(|| format!("resolving {}", self.repo_root.display()))
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}
