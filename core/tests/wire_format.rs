//! Output format checks: field names and optional-field rules of the
//! `.structure.json` files and the call-graph edge list.

use cobol_graph::config::{Backend, Config};
use cobol_graph::parser::backends;
use cobol_graph::pipeline;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const PROGRAM: &str = r#"       IDENTIFICATION DIVISION.
       PROGRAM-ID. BILLING.
       DATA DIVISION.
       WORKING-STORAGE SECTION.
       01  WS-TOTAL          PIC S9(7)V99 COMP-3.
       01  WS-NAME           PIC X(30).
       PROCEDURE DIVISION.
           PERFORM INIT.
       MAIN-LOGIC SECTION.
       INIT.
           PERFORM CALC THRU CALC-EXIT
           CALL 'TAXCALC' USING WS-TOTAL.
       CALC.
           GO TO CALC-EXIT.
       CALC-EXIT.
           EXIT.
"#;

fn structure_json() -> Value {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("BILLING.cbl");
    fs::write(&path, PROGRAM).unwrap();

    let backend = backends::select(&Config {
        backend: Backend::Heuristic,
        ..Config::default()
    })
    .unwrap();
    let structure = pipeline::parse_single(&path, backend.as_ref()).unwrap();
    serde_json::to_value(&structure).unwrap()
}

// -----------------------------------------------------------------------
// Structure file
// -----------------------------------------------------------------------

#[test]
fn wire_structure_top_level_fields() {
    let json = structure_json();
    let obj = json.as_object().unwrap();

    for key in ["file", "program_id", "backend", "divisions", "data_sections", "sections", "paragraphs"] {
        assert!(obj.contains_key(key), "missing {key}");
    }
    // Internal bookkeeping never reaches the file
    assert!(!obj.contains_key("calls"));
    assert!(!obj.contains_key("declared_program_id"));
    // Heuristic runs carry no parser error count
    assert!(!obj.contains_key("syntax_errors"));

    assert_eq!(json["program_id"], "BILLING");
    assert_eq!(json["backend"], "heuristic");
    assert!(json["file"].as_str().unwrap().ends_with("BILLING.cbl"));
}

#[test]
fn wire_data_items() {
    let json = structure_json();
    let ws = &json["data_sections"][0];
    assert_eq!(ws["name"], "WORKING-STORAGE");

    let total = &ws["items"][0];
    assert_eq!(total["level"], 1);
    assert_eq!(total["name"], "WS-TOTAL");
    assert_eq!(total["pic"], "S9(7)V99");
    assert_eq!(total["line"], 5);
}

#[test]
fn wire_sections_and_paragraphs() {
    let json = structure_json();

    let section = &json["sections"][0];
    assert_eq!(section["name"], "MAIN-LOGIC");
    assert_eq!(section["line"], 9);
    assert_eq!(
        section["paragraphs"],
        serde_json::json!(["INIT", "CALC", "CALC-EXIT"])
    );

    let paragraphs = json["paragraphs"].as_array().unwrap();
    let names: Vec<&str> = paragraphs
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["(entry)", "INIT", "CALC", "CALC-EXIT"]);

    // The entry paragraph belongs to no section
    assert!(paragraphs[0]["section"].is_null());
    assert_eq!(paragraphs[1]["section"], "MAIN-LOGIC");
    assert_eq!(paragraphs[1]["line"], 10);
    assert_eq!(paragraphs[1]["end_line"], 12);
}

#[test]
fn wire_statement_shapes() {
    let json = structure_json();
    let init = &json["paragraphs"][1]["statements"];

    let perform = &init[0];
    assert_eq!(perform["type"], "PERFORM");
    assert_eq!(perform["target"], "CALC");
    assert_eq!(perform["thru"], "CALC-EXIT");
    assert!(perform.get("dynamic").is_none());

    let call = &init[1];
    assert_eq!(call["type"], "CALL");
    assert_eq!(call["target"], "TAXCALC");
    assert_eq!(call["line"], 12);
    assert!(call.get("thru").is_none());

    let goto = &json["paragraphs"][2]["statements"][0];
    assert_eq!(goto["type"], "GO TO");
    assert_eq!(goto["target"], "CALC-EXIT");
}

// -----------------------------------------------------------------------
// Call graph
// -----------------------------------------------------------------------

#[test]
fn wire_callgraph_edge_fields() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(repo.path().join("BILLING.cbl"), PROGRAM).unwrap();

    let config = Config {
        repo_root: repo.path().to_path_buf(),
        out_dir: out.path().join("s"),
        callgraph: out.path().join("graph.json"),
        backend: Backend::Heuristic,
        ..Config::default()
    };
    pipeline::parse_repo(&config).unwrap();

    let raw = fs::read_to_string(out.path().join("graph.json")).unwrap();
    let edges: Value = serde_json::from_str(&raw).unwrap();
    let edge = edges[0].as_object().unwrap();

    let mut keys: Vec<&str> = edge.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["dynamic", "from_file", "from_paragraph", "line", "to_file", "to_program"]
    );
    assert_eq!(edge["from_paragraph"], "INIT");
    assert_eq!(edge["to_program"], "TAXCALC");
    assert_eq!(edge["dynamic"], false);
    assert!(edge["to_file"].is_null());
}
