use serde::{Deserialize, Serialize};

/// Name of the synthetic paragraph that owns PROCEDURE DIVISION statements
/// appearing before the first paragraph header.
pub const ENTRY_PARAGRAPH: &str = "(entry)";

// ---------------------------------------------------------------------------
// StatementKind — the control-transfer statements we record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "PERFORM")]
    Perform,
    #[serde(rename = "GO TO")]
    GoTo,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Call => "CALL",
            StatementKind::Perform => "PERFORM",
            StatementKind::GoTo => "GO TO",
        }
    }
}

// ---------------------------------------------------------------------------
// Statement — one CALL / PERFORM / GO TO inside a paragraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "type")]
    pub kind: StatementKind,
    pub target: String,
    /// End of a `PERFORM a THRU b` range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thru: Option<String>,
    pub line: u32,
    /// Only meaningful for CALL: the target is a data name, not a literal
    #[serde(default, skip_serializing_if = "is_false")]
    pub dynamic: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ---------------------------------------------------------------------------
// Paragraph / Section — PROCEDURE DIVISION structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub line: u32,
    pub end_line: u32,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub line: u32,
    /// Paragraph names in declaration order
    pub paragraphs: Vec<String>,
}

// ---------------------------------------------------------------------------
// DataSection / DataItem — DATA DIVISION entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub level: u32,
    pub name: String,
    pub pic: Option<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    pub name: String,
    pub items: Vec<DataItem>,
}

// ---------------------------------------------------------------------------
// CallEdge — a CALL from one paragraph to another program
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    pub from_file: String,
    pub from_paragraph: String,
    pub line: u32,
    pub to_program: String,
    /// Source file declaring `to_program`, filled in during resolution
    pub to_file: Option<String>,
    #[serde(default)]
    pub dynamic: bool,
}

// ---------------------------------------------------------------------------
// FileStructure — the per-file summary written as `<name>.structure.json`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStructure {
    pub file: String,
    pub program_id: String,
    /// Which extractor produced this record ("tree-sitter" or "heuristic")
    pub backend: String,
    pub divisions: Vec<String>,
    pub data_sections: Vec<DataSection>,
    pub sections: Vec<Section>,
    pub paragraphs: Vec<Paragraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_errors: Option<u32>,
    /// Whether `program_id` came from a PROGRAM-ID paragraph rather than the file stem
    #[serde(skip)]
    pub declared_program_id: bool,
    /// Outgoing CALL edges; emitted through the call graph, not the structure file
    #[serde(skip)]
    pub calls: Vec<CallEdge>,
}

impl FileStructure {
    pub fn paragraph(&self, name: &str) -> Option<&Paragraph> {
        self.paragraphs
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn data_section(&self, name: &str) -> Option<&DataSection> {
        self.data_sections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Last line covered by any recorded construct, 0 for an empty program.
    pub fn last_line(&self) -> u32 {
        let para = self.paragraphs.iter().map(|p| p.end_line).max();
        let data = self
            .data_sections
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.line))
            .max();
        para.into_iter().chain(data).max().unwrap_or(0)
    }
}
