//! Repository runs: walk, parse every COBOL file once, resolve the call
//! graph, and write the per-file structures plus the aggregated edge list.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::callgraph::{self, CallGraph, CallGraphSummary, ProgramIndex};
use crate::config::Config;
use crate::emit;
use crate::parser::backends::{self, CobolBackend};
use crate::parser::structure::StructureBuilder;
use crate::parser::walk::DirectoryWalker;
use crate::types::FileStructure;

/// Everything learned about a repository, before anything is written.
pub struct RepoScan {
    pub root: PathBuf,
    pub backend: &'static str,
    pub structures: Vec<FileStructure>,
    pub index: ProgramIndex,
    pub graph: CallGraph,
}

#[derive(Debug)]
pub struct RepoReport {
    pub programs: usize,
    pub backend: &'static str,
    pub calls: CallGraphSummary,
    pub out_dir: PathBuf,
    pub callgraph: PathBuf,
    pub structure_files: Vec<PathBuf>,
}

pub fn scan_repo(config: &Config) -> Result<RepoScan> {
    let root = config.validate()?;
    let backend = backends::select(config)?;

    let sources = DirectoryWalker::new(&root, &config.extensions).collect_sources();
    info!(root = %root.display(), files = sources.len(), backend = backend.name(), "scanning repository");

    let structures: Vec<FileStructure> = sources
        .iter()
        .map(|path| parse_or_empty(path, backend.as_ref()))
        .collect();

    let index = ProgramIndex::build(&structures);
    let graph = callgraph::resolve(&structures, &index);

    Ok(RepoScan {
        root,
        backend: backend.name(),
        structures,
        index,
        graph,
    })
}

/// Parse the whole repository and write `<out_dir>/**/*.structure.json`
/// plus the call-graph file.
pub fn parse_repo(config: &Config) -> Result<RepoReport> {
    let scan = scan_repo(config)?;

    let structure_files = emit::write_structures(&config.out_dir, &scan.root, &scan.structures)?;
    emit::write_callgraph(&config.callgraph, &scan.graph)?;

    let calls = scan.graph.summary();
    info!(
        programs = scan.structures.len(),
        indexed = scan.index.len(),
        edges = calls.edges,
        resolved = calls.resolved,
        "repository parsed"
    );

    Ok(RepoReport {
        programs: scan.structures.len(),
        backend: scan.backend,
        calls,
        out_dir: config.out_dir.clone(),
        callgraph: config.callgraph.clone(),
        structure_files,
    })
}

/// Parse one file in memory. Undecodable bytes are replaced, not rejected.
pub fn parse_single(path: &Path, backend: &dyn CobolBackend) -> Result<FileStructure> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(backend.parse_file(&content, path))
}

fn parse_or_empty(path: &Path, backend: &dyn CobolBackend) -> FileStructure {
    match parse_single(path, backend) {
        Ok(structure) => structure,
        Err(e) => {
            warn!("Failed to read file {}: {:#}", path.display(), e);
            StructureBuilder::new(path, backend.name()).finish()
        }
    }
}
