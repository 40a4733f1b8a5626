use indextree::{Arena, NodeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::parser::types::{NodeData, NodeKind};
use crate::types::FileStructure;

/// Folder / file / division / section / paragraph hierarchy of a repository.
pub struct OutlineTree {
    arena: Arena<NodeData>,
    root: Option<NodeId>,
}

impl OutlineTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn build(root_path: &Path, structures: &[FileStructure]) -> Self {
        let mut tree = Self::new();
        let root_name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "root".to_string());
        let root_id = tree.add_node(
            None,
            NodeData::new(
                root_name,
                NodeKind::Folder,
                root_path.to_string_lossy().to_string(),
            ),
        );

        let mut path_to_node: HashMap<PathBuf, NodeId> = HashMap::new();
        path_to_node.insert(root_path.to_path_buf(), root_id);

        for structure in structures {
            let file_path = Path::new(&structure.file);
            let parent_path = file_path.parent().unwrap_or(root_path);
            let parent_id = tree.ensure_folder(root_path, parent_path, &mut path_to_node);
            tree.add_file(parent_id, file_path, structure);
        }

        tree
    }

    fn ensure_folder(
        &mut self,
        root_path: &Path,
        folder: &Path,
        path_to_node: &mut HashMap<PathBuf, NodeId>,
    ) -> NodeId {
        if let Some(&id) = path_to_node.get(folder) {
            return id;
        }
        let root_id = path_to_node[root_path];
        if !folder.starts_with(root_path) {
            return root_id;
        }
        let parent_id = match folder.parent() {
            Some(parent) => self.ensure_folder(root_path, parent, path_to_node),
            None => root_id,
        };
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let data = NodeData::new(name, NodeKind::Folder, folder.to_string_lossy().to_string());
        let id = self.add_node(Some(parent_id), data);
        path_to_node.insert(folder.to_path_buf(), id);
        id
    }

    fn add_file(&mut self, parent_id: NodeId, file_path: &Path, structure: &FileStructure) {
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let path_str = structure.file.clone();

        let file_data = NodeData::new(name, NodeKind::File(ext), path_str.clone())
            .with_lines(1, structure.last_line().max(1))
            .with_program(structure.program_id.clone());
        let file_id = self.add_node(Some(parent_id), file_data);

        for division in &structure.divisions {
            let div_data = NodeData::new(division.clone(), NodeKind::Division, path_str.clone());
            let div_id = self.add_node(Some(file_id), div_data);

            match division.as_str() {
                "DATA" => {
                    for section in &structure.data_sections {
                        let start = section.items.first().map(|i| i.line).unwrap_or(0);
                        let end = section.items.last().map(|i| i.line).unwrap_or(0);
                        let data =
                            NodeData::new(section.name.clone(), NodeKind::Section, path_str.clone())
                                .with_lines(start, end);
                        self.add_node(Some(div_id), data);
                    }
                }
                "PROCEDURE" => self.add_procedure(div_id, &path_str, structure),
                _ => {}
            }
        }
    }

    fn add_procedure(&mut self, div_id: NodeId, path_str: &str, structure: &FileStructure) {
        let mut section_nodes: HashMap<&str, NodeId> = HashMap::new();
        for section in &structure.sections {
            let end = structure
                .paragraphs
                .iter()
                .filter(|p| p.section.as_deref() == Some(section.name.as_str()))
                .map(|p| p.end_line)
                .max()
                .unwrap_or(section.line);
            let data = NodeData::new(section.name.clone(), NodeKind::Section, path_str.to_string())
                .with_lines(section.line, end);
            let id = self.add_node(Some(div_id), data);
            section_nodes.insert(section.name.as_str(), id);
        }

        for para in &structure.paragraphs {
            let calls = para.statements.iter().map(|s| s.target.clone()).collect();
            let data = NodeData::new(para.name.clone(), NodeKind::Paragraph, path_str.to_string())
                .with_lines(para.line, para.end_line)
                .with_calls(calls);
            let parent = para
                .section
                .as_deref()
                .and_then(|s| section_nodes.get(s).copied())
                .unwrap_or(div_id);
            self.add_node(Some(parent), data);
        }
    }

    pub fn add_node(&mut self, parent_id: Option<NodeId>, data: NodeData) -> NodeId {
        let node_id = self.arena.new_node(data);

        if let Some(parent) = parent_id {
            parent.append(node_id, &mut self.arena);
        } else if self.root.is_none() {
            self.root = Some(node_id);
        }

        node_id
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&NodeData> {
        self.arena.get(node_id).map(|n| n.get())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        let root_id = self.root?;
        root_id
            .descendants(&self.arena)
            .find(|id| self.get_node(*id).is_some_and(|d| d.path == path))
    }

    pub fn get_children(&self, node_id: NodeId) -> Vec<NodeId> {
        node_id.children(&self.arena).collect()
    }
}

impl Default for OutlineTree {
    fn default() -> Self {
        Self::new()
    }
}
