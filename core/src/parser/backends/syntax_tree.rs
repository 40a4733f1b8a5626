use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;
use tree_sitter::Parser;

use crate::config::NodeKinds;
use crate::parser::backends::CobolBackend;
use crate::parser::grammar::Grammar;
use crate::parser::structure::{
    clean_name, header_name, parse_call_target, parse_goto_target, parse_perform_target,
    strip_picture_keyword, StructureBuilder,
};
use crate::parser::syntax::{SyntaxNode, TsNode};
use crate::types::{FileStructure, StatementKind};

/// Extractor backed by the external tree-sitter COBOL grammar.
pub struct SyntaxTreeBackend {
    parser: Mutex<Parser>,
    kinds: NodeKinds,
    grammar: Grammar,
}

impl SyntaxTreeBackend {
    pub fn new(grammar: Grammar, kinds: NodeKinds) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(grammar.language())
            .with_context(|| format!("incompatible grammar {}", grammar.path().display()))?;
        Ok(Self {
            parser: Mutex::new(parser),
            kinds,
            grammar,
        })
    }

    pub fn grammar_path(&self) -> &Path {
        self.grammar.path()
    }
}

impl CobolBackend for SyntaxTreeBackend {
    fn name(&self) -> &'static str {
        "tree-sitter"
    }

    fn parse_file(&self, content: &str, path: &Path) -> FileStructure {
        let mut builder = StructureBuilder::new(path, self.name());

        let tree = match self.parser.lock() {
            Ok(mut parser) => parser.parse(content, None),
            Err(_) => None,
        };
        let Some(tree) = tree else {
            warn!("tree-sitter produced no tree for {}", path.display());
            builder.set_syntax_errors(1);
            return builder.finish();
        };

        let errors = walk_tree(TsNode::new(tree.root_node(), content), &self.kinds, &mut builder);
        if errors > 0 {
            warn!(errors, "syntax errors in {}", path.display());
        }
        builder.set_syntax_errors(errors);
        builder.finish()
    }
}

/// Walk a COBOL syntax tree in document order, reporting every construct
/// named in `kinds` to `builder`. Returns the number of error nodes seen.
pub fn walk_tree<N: SyntaxNode>(root: N, kinds: &NodeKinds, builder: &mut StructureBuilder) -> u32 {
    let mut errors = 0;
    visit(&root, kinds, builder, &mut errors);
    errors
}

fn visit<N: SyntaxNode>(
    node: &N,
    kinds: &NodeKinds,
    builder: &mut StructureBuilder,
    errors: &mut u32,
) {
    let kind = node.kind();
    if node.is_error() {
        *errors += 1;
    }

    if NodeKinds::matches(&kinds.program_name, kind) {
        builder.program_id(node.text());
        return;
    }
    if let Some(division) = kinds.divisions.get(kind) {
        builder.enter_division(division, node.start_line());
    } else if let Some(section) = kinds.data_sections.get(kind) {
        builder.enter_data_section(section);
    } else if NodeKinds::matches(&kinds.data_item, kind) {
        record_data_item(node, kinds, builder);
    } else if NodeKinds::matches(&kinds.section_header, kind) {
        builder.enter_procedure_section(&header_name(node.text()), node.start_line());
        return;
    } else if NodeKinds::matches(&kinds.paragraph_header, kind) {
        builder.enter_paragraph(&header_name(node.text()), node.start_line());
        return;
    } else if NodeKinds::matches(&kinds.call, kind) {
        if let Some((target, dynamic)) = parse_call_target(node.text()) {
            builder.statement(StatementKind::Call, target, None, node.start_line(), dynamic);
        }
    } else if NodeKinds::matches(&kinds.perform, kind) {
        if let Some((target, thru)) = parse_perform_target(node.text()) {
            builder.statement(StatementKind::Perform, target, thru, node.start_line(), false);
        }
    } else if NodeKinds::matches(&kinds.goto, kind) {
        if let Some(target) = parse_goto_target(node.text()) {
            builder.statement(StatementKind::GoTo, target, None, node.start_line(), false);
        }
    }

    let children = node.children();
    if children.is_empty() {
        builder.observe(node.end_line());
        return;
    }
    for child in &children {
        visit(child, kinds, builder, errors);
    }
}

fn record_data_item<N: SyntaxNode>(node: &N, kinds: &NodeKinds, builder: &mut StructureBuilder) {
    let mut fields = DataFields::default();
    collect_data_fields(node, kinds, &mut fields);

    if let Some(level) = fields.level {
        let name = fields.name.unwrap_or_else(|| "FILLER".to_string());
        builder.data_item(level, &name, fields.pic, node.start_line());
    }
}

#[derive(Default)]
struct DataFields {
    level: Option<u32>,
    name: Option<String>,
    pic: Option<String>,
}

/// Gather level, name and picture below one data description, without
/// descending into subordinate descriptions.
fn collect_data_fields<N: SyntaxNode>(node: &N, kinds: &NodeKinds, fields: &mut DataFields) {
    for child in node.children() {
        let kind = child.kind();
        if NodeKinds::matches(&kinds.data_item, kind) {
            continue;
        }
        if NodeKinds::matches(&kinds.level_number, kind) {
            if fields.level.is_none() {
                fields.level = child.text().trim().parse().ok();
            }
        } else if NodeKinds::matches(&kinds.data_name, kind) {
            if fields.name.is_none() {
                fields.name = Some(clean_name(child.text()));
            }
        } else if NodeKinds::matches(&kinds.picture, kind) {
            if fields.pic.is_none() {
                fields.pic = strip_picture_keyword(child.text());
            }
        } else {
            collect_data_fields(&child, kinds, fields);
        }
    }
}
