pub mod heuristic;
pub mod syntax_tree;

use std::path::Path;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::config::{Backend, Config};
use crate::parser::grammar::{self, Grammar};
use crate::types::FileStructure;

use heuristic::HeuristicBackend;
use syntax_tree::SyntaxTreeBackend;

/// Turns one source file into a [`FileStructure`]. Which files reach a
/// backend is decided by `Config::extensions` alone.
pub trait CobolBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse_file(&self, content: &str, path: &Path) -> FileStructure;
}

/// Pick the extractor for a run according to `config.backend`.
pub fn select(config: &Config) -> Result<Box<dyn CobolBackend>> {
    match config.backend {
        Backend::Heuristic => Ok(Box::new(HeuristicBackend::new())),
        Backend::TreeSitter => {
            let Some(path) = grammar::ensure(&config.grammar)? else {
                bail!(
                    "no COBOL grammar found in {} (set --grammar or --grammar-src)",
                    config.grammar.build_dir.display()
                );
            };
            let grammar = Grammar::load(&path, &config.grammar.symbol)?;
            Ok(Box::new(SyntaxTreeBackend::new(
                grammar,
                config.node_kinds.clone(),
            )?))
        }
        Backend::Auto => {
            let loaded = grammar::ensure(&config.grammar).and_then(|found| match found {
                Some(path) => Grammar::load(&path, &config.grammar.symbol)
                    .and_then(|g| SyntaxTreeBackend::new(g, config.node_kinds.clone()))
                    .map(Some),
                None => Ok(None),
            });
            match loaded {
                Ok(Some(backend)) => {
                    info!(grammar = %backend.grammar_path().display(), "using tree-sitter backend");
                    Ok(Box::new(backend))
                }
                Ok(None) => {
                    warn!("no COBOL grammar available; falling back to heuristic scanner");
                    Ok(Box::new(HeuristicBackend::new()))
                }
                Err(e) => {
                    warn!("COBOL grammar unusable ({e:#}); falling back to heuristic scanner");
                    Ok(Box::new(HeuristicBackend::new()))
                }
            }
        }
    }
}
