//! cobol-graph binary
//!
//! Usage:
//!   cobol-graph parse [--root PATH] [--out-dir DIR] [--callgraph FILE] [--backend auto|tree-sitter|heuristic]
//!   cobol-graph file <PATH>
//!   cobol-graph outline [--root PATH]
//!   cobol-graph build-grammar --src DIR [--out FILE]
//!
//! Logging goes to stderr and follows RUST_LOG; JSON and the run summary go
//! to stdout.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cobol_graph::config::{Backend, Config, GrammarConfig, NodeKinds};
use cobol_graph::parser::backends;
use cobol_graph::parser::grammar;
use cobol_graph::parser::tree::OutlineTree;
use cobol_graph::pipeline;

#[derive(Parser)]
#[command(name = "cobol-graph", version, about = "COBOL structure and call-graph extractor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse every COBOL file under a root, write per-file structures and the call graph
    Parse {
        #[command(flatten)]
        scan: ScanArgs,
        /// Directory receiving `<file>.structure.json`, mirroring the repo layout
        #[arg(long, default_value = "cobol_structures")]
        out_dir: PathBuf,
        /// Aggregated call-graph output
        #[arg(long, default_value = "filecall_graph.json")]
        callgraph: PathBuf,
    },
    /// Print the structure of a single file
    File {
        path: PathBuf,
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Print a nested folder/file/section/paragraph outline of a repository
    Outline {
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Compile a tree-sitter COBOL grammar checkout into a loadable library
    BuildGrammar {
        /// Grammar checkout containing src/parser.c
        #[arg(long)]
        src: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Exported language function to check after building
        #[arg(long, default_value = "tree_sitter_cobol")]
        symbol: String,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Repository root to scan
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Source extensions, comma separated
    #[arg(long = "ext", value_delimiter = ',', default_value = "cbl")]
    extensions: Vec<String>,
    #[command(flatten)]
    backend: BackendArgs,
}

#[derive(Args)]
struct BackendArgs {
    #[arg(long, value_enum, default_value_t = Backend::Auto)]
    backend: Backend,
    /// Compiled grammar library
    #[arg(long, env = "COBOL_GRAMMAR_PATH")]
    grammar: Option<PathBuf>,
    /// Grammar checkout to build the library from when needed
    #[arg(long, env = "COBOL_GRAMMAR_SRC")]
    grammar_src: Option<PathBuf>,
    /// Where built grammar libraries are looked up and written
    #[arg(long, default_value = "build")]
    grammar_dir: PathBuf,
    /// Exported language function of the grammar library
    #[arg(long, default_value = "tree_sitter_cobol")]
    grammar_symbol: String,
    /// JSON file overriding the grammar node kinds the walker looks for
    #[arg(long)]
    node_kinds: Option<PathBuf>,
}

impl BackendArgs {
    fn apply(self, config: &mut Config) -> Result<()> {
        config.backend = self.backend;
        config.grammar = GrammarConfig {
            library: self.grammar,
            source_dir: self.grammar_src,
            build_dir: self.grammar_dir,
            symbol: self.grammar_symbol,
        };
        if let Some(path) = self.node_kinds {
            config.node_kinds = NodeKinds::load(&path)?;
        }
        Ok(())
    }
}

impl ScanArgs {
    fn into_config(self) -> Result<Config> {
        let mut config = Config {
            repo_root: self.root,
            extensions: self.extensions,
            ..Config::default()
        };
        self.backend.apply(&mut config)?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Parse {
            scan,
            out_dir,
            callgraph,
        } => {
            let mut config = scan.into_config()?;
            config.out_dir = out_dir;
            config.callgraph = callgraph;

            let report = pipeline::parse_repo(&config)?;
            println!(
                "✔ Parsed {} COBOL program(s) with the {} backend.",
                report.programs, report.backend
            );
            println!(
                "  • Structures  → {}/<file>.structure.json (mirrors repo layout)",
                report.out_dir.display()
            );
            println!(
                "  • Call-graph  → {} ({} edge(s), {} resolved)",
                report.callgraph.display(),
                report.calls.edges,
                report.calls.resolved
            );
            if !report.calls.unresolved_targets.is_empty() {
                println!(
                    "  • External    → {}",
                    report.calls.unresolved_targets.join(", ")
                );
            }
        }
        Command::File { path, backend } => {
            let mut config = Config::default();
            backend.apply(&mut config)?;
            let backend = backends::select(&config)?;
            let structure = pipeline::parse_single(&path, backend.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&structure)?);
        }
        Command::Outline { scan } => {
            let config = scan.into_config()?;
            let scan = pipeline::scan_repo(&config)?;
            let tree = OutlineTree::build(&scan.root, &scan.structures);
            println!("{}", serde_json::to_string_pretty(&tree.to_nested_json())?);
        }
        Command::BuildGrammar { src, out, symbol } => {
            let out = out.unwrap_or_else(|| {
                GrammarConfig::default()
                    .build_dir
                    .join(&grammar::library_names()[0])
            });
            let built = grammar::build(&src, &out)?;
            grammar::Grammar::load(&built, &symbol)?;
            println!("✔ Grammar library → {}", built.display());
        }
    }

    Ok(())
}
