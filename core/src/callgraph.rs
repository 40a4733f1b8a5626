//! Repository-level call graph: maps PROGRAM-IDs to the files declaring them
//! and merges every file's CALL edges into one list, resolving targets to
//! files where the callee is part of the scanned repository.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::warn;

use crate::types::{CallEdge, FileStructure};

#[derive(Debug, Default)]
pub struct ProgramIndex {
    by_program: BTreeMap<String, String>,
}

impl ProgramIndex {
    /// Declared PROGRAM-IDs win over file-stem fallbacks; among declared ids
    /// the first file (in walk order) wins.
    pub fn build(structures: &[FileStructure]) -> Self {
        let mut by_program: BTreeMap<String, String> = BTreeMap::new();
        let mut fallback: BTreeMap<String, String> = BTreeMap::new();

        for structure in structures {
            let key = structure.program_id.to_lowercase();
            if key.is_empty() {
                continue;
            }
            if !structure.declared_program_id {
                fallback.entry(key).or_insert_with(|| structure.file.clone());
                continue;
            }
            match by_program.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(structure.file.clone());
                }
                Entry::Occupied(existing) => {
                    warn!(
                        program = %structure.program_id,
                        kept = %existing.get(),
                        ignored = %structure.file,
                        "duplicate PROGRAM-ID"
                    );
                }
            }
        }

        for (key, file) in fallback {
            by_program.entry(key).or_insert(file);
        }

        Self { by_program }
    }

    pub fn lookup(&self, program: &str) -> Option<&str> {
        self.by_program
            .get(&program.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_program.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CallGraph {
    pub edges: Vec<CallEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallGraphSummary {
    pub edges: usize,
    pub resolved: usize,
    pub dynamic: usize,
    /// Distinct callee names with no source file in the repository
    pub unresolved_targets: Vec<String>,
}

/// Concatenate per-file edges in file order and fill in `to_file`.
pub fn resolve(structures: &[FileStructure], index: &ProgramIndex) -> CallGraph {
    let edges = structures
        .iter()
        .flat_map(|s| s.calls.iter())
        .map(|edge| CallEdge {
            to_file: index.lookup(&edge.to_program).map(str::to_string),
            ..edge.clone()
        })
        .collect();
    CallGraph { edges }
}

impl CallGraph {
    pub fn summary(&self) -> CallGraphSummary {
        let resolved = self.edges.iter().filter(|e| e.to_file.is_some()).count();
        let dynamic = self.edges.iter().filter(|e| e.dynamic).count();
        let unresolved_targets: BTreeSet<String> = self
            .edges
            .iter()
            .filter(|e| e.to_file.is_none())
            .map(|e| e.to_program.to_uppercase())
            .collect();

        CallGraphSummary {
            edges: self.edges.len(),
            resolved,
            dynamic,
            unresolved_targets: unresolved_targets.into_iter().collect(),
        }
    }

    /// Edges leaving `file`.
    pub fn calls_from<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a CallEdge> + 'a {
        self.edges.iter().filter(move |e| e.from_file == file)
    }
}
