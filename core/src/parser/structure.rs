//! Incremental assembly of a [`FileStructure`].
//!
//! Both extraction backends report what they see (division headers, section
//! headers, paragraph headers, data items, control-transfer statements) in
//! document order; `StructureBuilder` tracks the current division, section
//! and paragraph and files each event under the right owner.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{
    CallEdge, DataItem, DataSection, FileStructure, Paragraph, Section, Statement, StatementKind,
    ENTRY_PARAGRAPH,
};

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|[^\w-])CALL\s+(?:'([^']+)'|"([^"]+)"|([A-Za-z0-9][\w-]*))"#)
        .expect("valid CALL regex")
});

static PERFORM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^\w-])PERFORM(\s+)([\w-]+)(?:\s+([\w-]+)(?:\s+([\w-]+))?)?")
        .expect("valid PERFORM regex")
});

static GOTO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^\w-])GO\s+(?:TO\s+)?([\w-]+)").expect("valid GO TO regex")
});

static PIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^\w-])PIC(?:TURE)?(?:\s+IS)?\s+([A-Za-z0-9()$,.+*/-]+)")
        .expect("valid PIC regex")
});

/// Words that can follow PERFORM without naming a procedure.
const PERFORM_LOOP_WORDS: &[&str] = &["UNTIL", "VARYING", "WITH", "TEST", "FOREVER", "TIMES"];

/// Statement verbs that open the body of an inline PERFORM.
const STATEMENT_VERBS: &[&str] = &[
    "ACCEPT", "ADD", "ALLOCATE", "CALL", "CANCEL", "CLOSE", "COMPUTE", "CONTINUE", "DELETE",
    "DISPLAY", "DIVIDE", "EVALUATE", "EXEC", "EXIT", "FREE", "GO", "GOBACK", "IF", "INITIALIZE",
    "INSPECT", "INVOKE", "MERGE", "MOVE", "MULTIPLY", "OPEN", "PERFORM", "READ", "RELEASE",
    "RETURN", "REWRITE", "SEARCH", "SET", "SORT", "START", "STOP", "STRING", "SUBTRACT",
    "UNSTRING", "WRITE",
];

pub struct StructureBuilder {
    file: String,
    backend: &'static str,
    program_id: String,
    declared_program_id: bool,
    divisions: Vec<String>,
    division: Option<String>,
    data_sections: Vec<DataSection>,
    data_section: Option<usize>,
    sections: Vec<Section>,
    section: Option<usize>,
    paragraphs: Vec<Paragraph>,
    paragraph: Option<usize>,
    calls: Vec<CallEdge>,
    syntax_errors: Option<u32>,
    last_line: u32,
}

impl StructureBuilder {
    pub fn new(path: &Path, backend: &'static str) -> Self {
        let program_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            file: path.to_string_lossy().to_string(),
            backend,
            program_id,
            declared_program_id: false,
            divisions: Vec::new(),
            division: None,
            data_sections: Vec::new(),
            data_section: None,
            sections: Vec::new(),
            section: None,
            paragraphs: Vec::new(),
            paragraph: None,
            calls: Vec::new(),
            syntax_errors: None,
            last_line: 0,
        }
    }

    /// Record a PROGRAM-ID. Only the first one counts; nested programs keep
    /// the outer program's identity.
    pub fn program_id(&mut self, id: &str) {
        let id = clean_name(id);
        if self.declared_program_id || id.is_empty() {
            return;
        }
        self.program_id = id;
        self.declared_program_id = true;
    }

    pub fn current_division(&self) -> Option<&str> {
        self.division.as_deref()
    }

    pub fn in_procedure_division(&self) -> bool {
        self.division.as_deref() == Some("PROCEDURE")
    }

    pub fn enter_division(&mut self, name: &str, line: u32) {
        self.close_paragraph();
        let mut name = name.trim().to_uppercase();
        if name == "ID" {
            name = "IDENTIFICATION".to_string();
        }
        if !self.divisions.contains(&name) {
            self.divisions.push(name.clone());
        }
        self.division = Some(name);
        self.data_section = None;
        self.section = None;
        self.last_line = line;
    }

    /// A `<name> SECTION.` header: a data section inside the DATA DIVISION,
    /// a procedure section inside the PROCEDURE DIVISION, ignored elsewhere.
    pub fn enter_section(&mut self, name: &str, line: u32) {
        match self.division.as_deref() {
            Some("DATA") => self.enter_data_section(name),
            Some("PROCEDURE") => self.enter_procedure_section(name, line),
            _ => {}
        }
    }

    pub fn enter_data_section(&mut self, name: &str) {
        let name = clean_name(name).to_uppercase();
        let idx = match self.data_sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.data_sections.push(DataSection {
                    name,
                    items: Vec::new(),
                });
                self.data_sections.len() - 1
            }
        };
        self.data_section = Some(idx);
    }

    pub fn enter_procedure_section(&mut self, name: &str, line: u32) {
        self.close_paragraph();
        self.sections.push(Section {
            name: clean_name(name).to_uppercase(),
            line,
            paragraphs: Vec::new(),
        });
        self.section = Some(self.sections.len() - 1);
        self.last_line = line;
    }

    pub fn data_item(&mut self, level: u32, name: &str, pic: Option<String>, line: u32) {
        let Some(idx) = self.data_section else {
            return;
        };
        self.data_sections[idx].items.push(DataItem {
            level,
            name: clean_name(name),
            pic,
            line,
        });
        self.observe(line);
    }

    pub fn enter_paragraph(&mut self, name: &str, line: u32) {
        self.close_paragraph();
        let name = clean_name(name);
        let section = self.section.map(|idx| {
            self.sections[idx].paragraphs.push(name.clone());
            self.sections[idx].name.clone()
        });
        self.paragraphs.push(Paragraph {
            name,
            section,
            line,
            end_line: line,
            statements: Vec::new(),
        });
        self.paragraph = Some(self.paragraphs.len() - 1);
        self.last_line = line;
    }

    pub fn statement(
        &mut self,
        kind: StatementKind,
        target: String,
        thru: Option<String>,
        line: u32,
        dynamic: bool,
    ) {
        if self.paragraph.is_none() {
            if !self.in_procedure_division() {
                return;
            }
            self.enter_paragraph(ENTRY_PARAGRAPH, line);
        }
        let Some(idx) = self.paragraph else {
            return;
        };

        if kind == StatementKind::Call {
            self.calls.push(CallEdge {
                from_file: self.file.clone(),
                from_paragraph: self.paragraphs[idx].name.clone(),
                line,
                to_program: target.clone(),
                to_file: None,
                dynamic,
            });
        }
        self.paragraphs[idx].statements.push(Statement {
            kind,
            target,
            thru,
            line,
            dynamic,
        });
        self.observe(line);
    }

    /// Note that source content extends to `line`; used for paragraph extents.
    pub fn observe(&mut self, line: u32) {
        self.last_line = self.last_line.max(line);
    }

    pub fn set_syntax_errors(&mut self, count: u32) {
        self.syntax_errors = Some(count);
    }

    pub fn finish(mut self) -> FileStructure {
        self.close_paragraph();
        FileStructure {
            file: self.file,
            program_id: self.program_id,
            backend: self.backend.to_string(),
            divisions: self.divisions,
            data_sections: self.data_sections,
            sections: self.sections,
            paragraphs: self.paragraphs,
            syntax_errors: self.syntax_errors,
            declared_program_id: self.declared_program_id,
            calls: self.calls,
        }
    }

    fn close_paragraph(&mut self) {
        if let Some(idx) = self.paragraph.take() {
            let para = &mut self.paragraphs[idx];
            para.end_line = para.end_line.max(self.last_line);
        }
    }
}

/// Trim whitespace, a trailing separator period and surrounding quotes.
pub fn clean_name(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('.')
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// First whitespace-delimited word of a header such as `MAIN-LOGIC SECTION.`
pub fn header_name(text: &str) -> String {
    clean_name(text.split_whitespace().next().unwrap_or(""))
}

/// Target of a CALL and whether it is dynamic (a data name rather than a literal).
pub fn parse_call_target(text: &str) -> Option<(String, bool)> {
    let masked = mask_literals(text);
    let caps = CALL_RE.captures(&masked)?;
    if let Some(lit) = caps.get(1).or_else(|| caps.get(2)) {
        let name = text[lit.range()].trim();
        return (!name.is_empty()).then(|| (name.to_string(), false));
    }
    caps.get(3).map(|m| (m.as_str().to_string(), true))
}

/// Procedure named by an out-of-line PERFORM, with the optional THRU bound.
/// Inline and loop forms (`PERFORM UNTIL ...`, `PERFORM 3 TIMES`, a bare
/// `PERFORM` followed by statements) yield `None`.
pub fn parse_perform_target(text: &str) -> Option<(String, Option<String>)> {
    let masked = mask_literals(text);
    let caps = PERFORM_RE.captures(&masked)?;
    if caps.get(1)?.as_str().contains('\n') {
        return None;
    }
    let target = caps.get(2)?.as_str();
    if is_perform_keyword(target)
        || is_statement_verb(target)
        || target.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let next = caps.get(3).map(|m| m.as_str());
    if next.is_some_and(|w| w.eq_ignore_ascii_case("TIMES")) {
        return None;
    }
    let thru = match next {
        Some(w) if w.eq_ignore_ascii_case("THRU") || w.eq_ignore_ascii_case("THROUGH") => {
            caps.get(4).map(|m| m.as_str().to_string())
        }
        _ => None,
    };
    Some((target.to_string(), thru))
}

pub fn parse_goto_target(text: &str) -> Option<String> {
    let masked = mask_literals(text);
    let caps = GOTO_RE.captures(&masked)?;
    let target = caps.get(1)?.as_str();
    // Bare `GO TO.` names its target through ALTER
    if target.eq_ignore_ascii_case("DEPENDING") || target.eq_ignore_ascii_case("TO") {
        return None;
    }
    Some(target.to_string())
}

/// Picture string out of a `PIC`/`PICTURE [IS]` clause, without the keyword.
pub fn strip_picture_keyword(text: &str) -> Option<String> {
    let caps = PIC_RE.captures(text)?;
    let pic = caps.get(1)?.as_str().trim_end_matches('.');
    (!pic.is_empty()).then(|| pic.to_string())
}

fn is_perform_keyword(word: &str) -> bool {
    PERFORM_LOOP_WORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(word))
}

fn is_statement_verb(word: &str) -> bool {
    STATEMENT_VERBS.iter().any(|v| v.eq_ignore_ascii_case(word))
}

/// Blank the contents of `'...'` and `"..."` literals, keeping the quotes
/// and every byte offset, so keywords inside literals are not matched.
/// An unterminated literal ends with its line.
pub(crate) fn mask_literals(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    for c in text.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                masked.push(c);
            }
            Some(_) if c == '\n' => {
                quote = None;
                masked.push(c);
            }
            Some(_) => masked.extend(std::iter::repeat(' ').take(c.len_utf8())),
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                masked.push(c);
            }
        }
    }
    masked
}
