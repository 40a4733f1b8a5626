use cobol_graph::config::{Backend, Config};
use cobol_graph::parser::tree::OutlineTree;
use cobol_graph::pipeline;
use std::path::PathBuf;

fn main() {
    // Outline a directory with the line scanner, no grammar needed
    let args: Vec<String> = std::env::args().collect();
    let root_path = args.get(1).map(|s| s.as_str()).unwrap_or(".");

    println!("Parsing directory: {}", root_path);

    let config = Config {
        repo_root: PathBuf::from(root_path),
        backend: Backend::Heuristic,
        ..Config::default()
    };

    match pipeline::scan_repo(&config) {
        Ok(scan) => {
            println!(
                "{} program(s), {} call edge(s)",
                scan.structures.len(),
                scan.graph.edges.len()
            );

            let json = OutlineTree::build(&scan.root, &scan.structures).to_nested_json();
            match serde_json::to_string_pretty(&json) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Failed to serialize: {}", e),
            }
        }
        Err(e) => {
            eprintln!("Error parsing directory: {:#}", e);
            std::process::exit(1);
        }
    }
}
