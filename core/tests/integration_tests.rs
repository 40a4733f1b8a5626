use cobol_graph::config::{Backend, Config};
use cobol_graph::parser::backends::{self, CobolBackend};
use cobol_graph::parser::tree::OutlineTree;
use cobol_graph::pipeline;
use cobol_graph::types::FileStructure;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_repo(root: &Path) {
    fs::create_dir_all(root.join("batch")).unwrap();
    fs::create_dir_all(root.join("common/util")).unwrap();

    fs::write(
        root.join("batch/ORDERS.cbl"),
        r#"       IDENTIFICATION DIVISION.
       PROGRAM-ID. ORDERS.
       DATA DIVISION.
       WORKING-STORAGE SECTION.
       01  WS-ORDER-ID       PIC 9(8).
       01  WS-DYN            PIC X(8) VALUE 'AUDITLOG'.
       PROCEDURE DIVISION.
       MAIN-PARA.
           PERFORM LOAD-ORDERS
           CALL 'PRICING' USING WS-ORDER-ID
           CALL WS-DYN
           STOP RUN.
       LOAD-ORDERS.
           CALL "DATEUTIL".
           CALL 'MQSERIES'.
"#,
    )
    .unwrap();

    fs::write(
        root.join("batch/pricing.cbl"),
        r#"       IDENTIFICATION DIVISION.
       PROGRAM-ID. PRICING.
       PROCEDURE DIVISION.
       CALC.
           CALL 'DATEUTIL'
           GOBACK.
"#,
    )
    .unwrap();

    // No PROGRAM-ID: indexed under its file stem
    fs::write(
        root.join("common/util/dateutil.cbl"),
        r#"       PROCEDURE DIVISION.
       TODAY.
           EXIT PROGRAM.
"#,
    )
    .unwrap();

    fs::write(root.join("common/util/DATEREC.cpy"), "       01 DATE-REC PIC X(8).\n").unwrap();
    fs::write(root.join("README.md"), "# legacy batch\n").unwrap();
}

fn heuristic_config(root: &Path, out: &Path) -> Config {
    Config {
        repo_root: root.to_path_buf(),
        out_dir: out.join("structures"),
        callgraph: out.join("filecall_graph.json"),
        backend: Backend::Heuristic,
        ..Config::default()
    }
}

#[test]
fn integration_full_workflow() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_repo(repo.path());

    let config = heuristic_config(repo.path(), out.path());
    let report = pipeline::parse_repo(&config).unwrap();

    assert_eq!(report.programs, 3);
    assert_eq!(report.backend, "heuristic");
    assert_eq!(report.structure_files.len(), 3);
    assert_eq!(report.calls.edges, 5);
    assert_eq!(report.calls.resolved, 3);
    assert_eq!(report.calls.dynamic, 1);
    assert_eq!(
        report.calls.unresolved_targets,
        vec!["MQSERIES".to_string(), "WS-DYN".to_string()]
    );

    // Structure files mirror the repository layout
    let structures = out.path().join("structures");
    assert!(structures.join("batch/ORDERS.structure.json").is_file());
    assert!(structures.join("batch/pricing.structure.json").is_file());
    assert!(structures.join("common/util/dateutil.structure.json").is_file());
    assert!(!structures.join("common/util/DATEREC.structure.json").exists());
}

#[test]
fn integration_structure_file_contents() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_repo(repo.path());

    let config = heuristic_config(repo.path(), out.path());
    pipeline::parse_repo(&config).unwrap();

    let raw = fs::read_to_string(out.path().join("structures/batch/ORDERS.structure.json")).unwrap();
    let structure: FileStructure = serde_json::from_str(&raw).unwrap();

    assert_eq!(structure.program_id, "ORDERS");
    assert_eq!(structure.divisions, vec!["IDENTIFICATION", "DATA", "PROCEDURE"]);
    assert_eq!(structure.paragraphs.len(), 2);
    assert_eq!(structure.paragraphs[0].name, "MAIN-PARA");
    assert_eq!(structure.paragraphs[0].statements.len(), 3);
    assert_eq!(structure.paragraphs[1].name, "LOAD-ORDERS");

    let ws = structure.data_section("WORKING-STORAGE").unwrap();
    assert_eq!(ws.items.len(), 2);
    assert_eq!(ws.items[1].pic.as_deref(), Some("X(8)"));
}

#[test]
fn integration_callgraph_file() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_repo(repo.path());

    let config = heuristic_config(repo.path(), out.path());
    pipeline::parse_repo(&config).unwrap();

    let raw = fs::read_to_string(out.path().join("filecall_graph.json")).unwrap();
    let edges: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let edges = edges.as_array().unwrap();
    assert_eq!(edges.len(), 5);

    // Files are visited in sorted order: batch/ORDERS.cbl, batch/pricing.cbl, common/...
    let first = &edges[0];
    assert_eq!(first["from_paragraph"], "MAIN-PARA");
    assert_eq!(first["to_program"], "PRICING");
    assert_eq!(first["line"], 10);
    assert!(first["to_file"]
        .as_str()
        .unwrap()
        .ends_with("pricing.cbl"));

    let dynamic = &edges[1];
    assert_eq!(dynamic["to_program"], "WS-DYN");
    assert_eq!(dynamic["dynamic"], true);
    assert!(dynamic["to_file"].is_null());

    // DATEUTIL has no PROGRAM-ID and resolves through its file stem
    let dateutil = &edges[2];
    assert_eq!(dateutil["from_paragraph"], "LOAD-ORDERS");
    assert!(dateutil["to_file"]
        .as_str()
        .unwrap()
        .ends_with("dateutil.cbl"));

    let external = &edges[3];
    assert_eq!(external["to_program"], "MQSERIES");
    assert!(external["to_file"].is_null());

    let from_pricing = &edges[4];
    assert!(from_pricing["from_file"]
        .as_str()
        .unwrap()
        .ends_with("pricing.cbl"));
}

#[test]
fn integration_missing_root_is_an_error() {
    let out = TempDir::new().unwrap();
    let config = heuristic_config(&out.path().join("nope"), out.path());
    let err = pipeline::parse_repo(&config).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn integration_empty_repo_writes_empty_callgraph() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let config = heuristic_config(repo.path(), out.path());
    let report = pipeline::parse_repo(&config).unwrap();

    assert_eq!(report.programs, 0);
    let raw = fs::read_to_string(out.path().join("filecall_graph.json")).unwrap();
    assert_eq!(raw.trim(), "[]");
    assert!(out.path().join("structures").is_dir());
}

#[test]
fn integration_extra_extensions() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_repo(repo.path());
    fs::write(
        repo.path().join("legacy.COB"),
        "       PROCEDURE DIVISION.\n       P1.\n           CALL 'ORDERS'.\n",
    )
    .unwrap();

    // Any extension in the list is parsed, not only the usual COBOL ones
    fs::write(
        repo.path().join("batch/embedded.pco"),
        "       PROCEDURE DIVISION.\n       P1.\n           CALL 'PRICING'.\n",
    )
    .unwrap();

    let config = Config {
        extensions: vec!["cbl".to_string(), "cob".to_string(), "pco".to_string()],
        ..heuristic_config(repo.path(), out.path())
    };
    let report = pipeline::parse_repo(&config).unwrap();

    assert_eq!(report.programs, 5);
    assert!(out.path().join("structures/legacy.structure.json").is_file());
    assert!(out.path().join("structures/batch/embedded.structure.json").is_file());
}

#[test]
fn integration_non_utf8_source() {
    let repo = TempDir::new().unwrap();
    let mut bytes = b"       PROGRAM-ID. LATIN1.\n       PROCEDURE DIVISION.\n       P1.\n".to_vec();
    bytes.extend_from_slice(b"           DISPLAY 'Gr\xfc\xdfe'.\n           CALL 'NEXTPGM'.\n");
    fs::write(repo.path().join("latin.cbl"), bytes).unwrap();

    let backend = backends::select(&Config {
        backend: Backend::Heuristic,
        ..Config::default()
    })
    .unwrap();
    let s = pipeline::parse_single(&repo.path().join("latin.cbl"), backend.as_ref()).unwrap();

    assert_eq!(s.program_id, "LATIN1");
    assert_eq!(s.calls.len(), 1);
    assert_eq!(s.calls[0].to_program, "NEXTPGM");
}

#[test]
fn integration_outline() {
    let repo = TempDir::new().unwrap();
    write_repo(repo.path());

    let config = Config {
        repo_root: repo.path().to_path_buf(),
        backend: Backend::Heuristic,
        ..Config::default()
    };
    let scan = pipeline::scan_repo(&config).unwrap();
    let json = OutlineTree::build(&scan.root, &scan.structures).to_nested_json();

    assert_eq!(json["kind"], "folder");
    let top: Vec<&str> = json["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(top, vec!["batch", "common"]);

    let util = &json["children"][1]["children"][0];
    assert_eq!(util["name"], "util");
    assert_eq!(util["children"][0]["program"], "dateutil");
}

#[test]
fn integration_tree_sitter_required_without_grammar() {
    let dir = TempDir::new().unwrap();
    let mut config = Config {
        backend: Backend::TreeSitter,
        ..Config::default()
    };
    config.grammar.build_dir = dir.path().join("build");

    let err = backends::select(&config).err().unwrap();
    assert!(err.to_string().contains("no COBOL grammar found"));
}

#[test]
fn integration_auto_falls_back_to_heuristic() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.grammar.build_dir = dir.path().join("build");

    let backend = backends::select(&config).unwrap();
    assert_eq!(backend.name(), "heuristic");
}

/// Runs only when a compiled grammar is provided through COBOL_GRAMMAR_PATH.
#[test]
fn integration_tree_sitter_backend_with_real_grammar() {
    let Ok(grammar) = std::env::var("COBOL_GRAMMAR_PATH") else {
        return;
    };

    let repo = TempDir::new().unwrap();
    write_repo(repo.path());

    let mut config = Config {
        repo_root: repo.path().to_path_buf(),
        backend: Backend::TreeSitter,
        ..Config::default()
    };
    config.grammar.library = Some(grammar.into());

    let backend = backends::select(&config).unwrap();
    assert_eq!(backend.name(), "tree-sitter");

    let s = pipeline::parse_single(&repo.path().join("batch/pricing.cbl"), backend.as_ref()).unwrap();
    assert_eq!(s.program_id, "PRICING");
    assert!(s.divisions.contains(&"PROCEDURE".to_string()));
    assert!(s.syntax_errors.is_some());
}
