use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum NodeKind {
    Folder,
    File(String),
    Division,
    Section,
    Paragraph,
}

impl Serialize for NodeKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::File(_) => "file",
            NodeKind::Division => "division",
            NodeKind::Section => "section",
            NodeKind::Paragraph => "paragraph",
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub name: String,
    #[serde(rename = "kind")]
    pub kind: NodeKind,
    /// PROGRAM-ID, files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(rename = "startLine")]
    pub start_line: u32,
    #[serde(rename = "endLine")]
    pub end_line: u32,
    pub path: String,
    /// Targets of CALL / PERFORM / GO TO, paragraphs only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<String>,
}

impl NodeData {
    pub fn new(name: String, kind: NodeKind, path: String) -> Self {
        Self {
            name,
            kind,
            program: None,
            start_line: 0,
            end_line: 0,
            path,
            calls: Vec::new(),
        }
    }

    pub fn with_lines(mut self, start: u32, end: u32) -> Self {
        self.start_line = start;
        self.end_line = end;
        self
    }

    pub fn with_calls(mut self, calls: Vec<String>) -> Self {
        self.calls = calls;
        self
    }

    pub fn with_program(mut self, program: String) -> Self {
        self.program = Some(program);
        self
    }
}
