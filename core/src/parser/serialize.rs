use indextree::NodeId;
use serde_json::Value;

use crate::parser::tree::OutlineTree;

#[derive(Debug, Clone, serde::Serialize)]
struct SerializableNode {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    program: Option<String>,
    #[serde(rename = "startLine")]
    start_line: u32,
    #[serde(rename = "endLine")]
    end_line: u32,
    path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    calls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<SerializableNode>>,
}

impl OutlineTree {
    pub fn to_nested_json(&self) -> Value {
        match self.root().and_then(|root_id| self.node_to_serializable(root_id)) {
            Some(serializable) => serde_json::to_value(serializable).unwrap_or(Value::Null),
            None => Value::Null,
        }
    }

    fn node_to_serializable(&self, node_id: NodeId) -> Option<SerializableNode> {
        let data = self.get_node(node_id)?;

        let child_ids = self.get_children(node_id);
        let children: Option<Vec<SerializableNode>> = if child_ids.is_empty() {
            None
        } else {
            Some(
                child_ids
                    .into_iter()
                    .filter_map(|child_id| self.node_to_serializable(child_id))
                    .collect(),
            )
        };

        let language = if data.kind.is_file() {
            Some("cobol".to_string())
        } else {
            None
        };

        Some(SerializableNode {
            name: data.name.clone(),
            kind: data.kind.as_str().to_string(),
            language,
            program: data.program.clone(),
            start_line: data.start_line,
            end_line: data.end_line,
            path: data.path.clone(),
            calls: data.calls.clone(),
            children,
        })
    }
}
