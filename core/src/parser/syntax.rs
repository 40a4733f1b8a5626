//! Minimal view of a concrete syntax tree node.
//!
//! The tree walker only needs kinds, text, line ranges and children, so it
//! is written against this trait instead of `tree_sitter::Node` directly.

pub trait SyntaxNode: Sized {
    fn kind(&self) -> &str;
    fn text(&self) -> &str;
    /// 1-based
    fn start_line(&self) -> u32;
    /// 1-based, inclusive
    fn end_line(&self) -> u32;
    fn children(&self) -> Vec<Self>;
    fn is_error(&self) -> bool {
        false
    }
}

/// A tree-sitter node paired with the source it was parsed from.
#[derive(Clone, Copy)]
pub struct TsNode<'a> {
    node: tree_sitter::Node<'a>,
    source: &'a str,
}

impl<'a> TsNode<'a> {
    pub fn new(node: tree_sitter::Node<'a>, source: &'a str) -> Self {
        Self { node, source }
    }
}

impl<'a> SyntaxNode for TsNode<'a> {
    fn kind(&self) -> &str {
        self.node.kind()
    }

    fn text(&self) -> &str {
        self.node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn start_line(&self) -> u32 {
        (self.node.start_position().row + 1) as u32
    }

    fn end_line(&self) -> u32 {
        (self.node.end_position().row + 1) as u32
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|child| TsNode::new(child, self.source))
            .collect()
    }

    fn is_error(&self) -> bool {
        self.node.is_error() || self.node.is_missing()
    }
}
