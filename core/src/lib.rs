//! Structural summaries and call graphs for COBOL repositories.
//!
//! Sources are parsed with an external tree-sitter COBOL grammar when one is
//! available (see [`parser::grammar`]), or with a line-oriented scanner
//! otherwise. Each file becomes a [`types::FileStructure`]; CALL edges from
//! all files are merged into a repository-level [`callgraph::CallGraph`].

pub mod callgraph;
pub mod config;
pub mod emit;
pub mod parser;
pub mod pipeline;
pub mod types;
