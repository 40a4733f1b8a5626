use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::backends::CobolBackend;
use crate::parser::structure::{
    parse_call_target, parse_goto_target, parse_perform_target, strip_picture_keyword,
    StructureBuilder,
};
use crate::types::{FileStructure, StatementKind};

static DIVISION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\w[\w-]*)\s+DIVISION\b").expect("valid regex"));
static SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\w[\w-]*)\s+SECTION\s*\.").expect("valid regex"));
static PROGRAM_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^PROGRAM-ID\s*\.?\s+["']?([\w-]+)["']?"#).expect("valid regex")
});
static DATA_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})\s+([\w-]+)\b").expect("valid regex"));
static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w-]+)\s*\.\s*$").expect("valid regex"));

/// Single-word sentences that look like paragraph headers but are statements.
const SENTENCE_VERBS: &[&str] = &["EXIT", "GOBACK", "CONTINUE", "ELSE", "DECLARATIVES"];

/// Line-oriented scanner used when no grammar is available.
pub struct HeuristicBackend;

impl HeuristicBackend {
    pub fn new() -> Self {
        Self
    }

    /// `sentence_start` is false while the previous code line left a
    /// sentence open, so a lone `NAME.` there is its last operand.
    fn scan_line(
        &self,
        builder: &mut StructureBuilder,
        code: &str,
        line: u32,
        sentence_start: bool,
    ) {
        if let Some(m) = DIVISION_RE.captures(code) {
            builder.enter_division(&m[1], line);
            return;
        }
        if let Some(m) = SECTION_RE.captures(code) {
            builder.enter_section(&m[1], line);
            return;
        }
        if let Some(m) = PROGRAM_ID_RE.captures(code) {
            builder.program_id(&m[1]);
            return;
        }

        match builder.current_division() {
            Some("DATA") => {
                if let Some(m) = DATA_ITEM_RE.captures(code) {
                    if let (Ok(level), Some(pic)) = (m[1].parse(), strip_picture_keyword(code)) {
                        builder.data_item(level, &m[2], Some(pic), line);
                    }
                }
            }
            Some("PROCEDURE") => {
                if let Some(m) = PARAGRAPH_RE.captures(code).filter(|_| sentence_start) {
                    if !is_sentence_verb(&m[1]) {
                        builder.enter_paragraph(&m[1], line);
                        return;
                    }
                }
                if let Some((target, dynamic)) = parse_call_target(code) {
                    builder.statement(StatementKind::Call, target, None, line, dynamic);
                }
                if let Some((target, thru)) = parse_perform_target(code) {
                    builder.statement(StatementKind::Perform, target, thru, line, false);
                }
                if let Some(target) = parse_goto_target(code) {
                    builder.statement(StatementKind::GoTo, target, None, line, false);
                }
                builder.observe(line);
            }
            _ => {}
        }
    }
}

impl Default for HeuristicBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CobolBackend for HeuristicBackend {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn parse_file(&self, content: &str, path: &Path) -> FileStructure {
        let mut builder = StructureBuilder::new(path, self.name());
        let mut sentence_start = true;

        for (idx, raw) in content.lines().enumerate() {
            let Some(code) = code_area(raw) else {
                continue;
            };
            let code = code.trim();
            if code.is_empty() {
                continue;
            }
            self.scan_line(&mut builder, code, (idx + 1) as u32, sentence_start);
            sentence_start = code.ends_with('.');
        }

        builder.finish()
    }
}

/// Program text of a source line, or `None` for comment lines.
///
/// Lines are treated as fixed format when the first six columns are a
/// numeric sequence area, or are blank with a blank, comment, page or
/// continuation indicator in column 7. In fixed format column 7 is the
/// indicator and text past column 72 is the identification area.
/// Everything else is treated as free format.
fn code_area(raw: &str) -> Option<&str> {
    let fixed = raw.len() >= 7
        && raw.is_char_boundary(6)
        && {
            let seq = &raw.as_bytes()[..6];
            let indicator = raw.as_bytes()[6];
            seq.iter().all(u8::is_ascii_digit)
                || (seq.iter().all(|&b| b == b' ')
                    && matches!(indicator, b' ' | b'*' | b'/' | b'-'))
        };

    let code = if fixed {
        if matches!(raw.as_bytes()[6], b'*' | b'/') {
            return None;
        }
        let end = if raw.len() > 72 && raw.is_char_boundary(72) {
            72
        } else {
            raw.len()
        };
        raw.get(7..end).unwrap_or("")
    } else {
        raw
    };

    let trimmed = code.trim_start();
    if trimmed.starts_with('*') || (!fixed && trimmed.starts_with('/')) {
        return None;
    }
    let code = match code.find("*>") {
        Some(pos) => &code[..pos],
        None => code,
    };
    Some(code)
}

fn is_sentence_verb(word: &str) -> bool {
    word.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("END-")) && word.len() > 4
        || SENTENCE_VERBS.iter().any(|v| v.eq_ignore_ascii_case(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_area_free_format() {
        assert_eq!(code_area("       MOVE A TO B.").map(str::trim), Some("MOVE A TO B."));
        assert_eq!(code_area("  MOVE A TO B."), Some("  MOVE A TO B."));
        assert_eq!(code_area("      * comment"), None);
        assert_eq!(code_area("*> free comment"), None);
        assert_eq!(code_area("MOVE A TO B. *> trailing"), Some("MOVE A TO B. "));
    }

    #[test]
    fn test_code_area_fixed_format() {
        assert_eq!(code_area("000100* old comment"), None);
        assert_eq!(code_area("000200/ page eject"), None);
        let line = format!("000300 {:<65}PAYROLL1", "    MOVE A TO B.");
        assert_eq!(code_area(&line).map(str::trim), Some("MOVE A TO B."));
    }

    #[test]
    fn test_sentence_verbs_are_not_paragraphs() {
        assert!(is_sentence_verb("EXIT"));
        assert!(is_sentence_verb("end-if"));
        assert!(is_sentence_verb("GOBACK"));
        assert!(!is_sentence_verb("MAIN-PARA"));
        assert!(!is_sentence_verb("ENDING"));
    }
}
