//! Presentation of the decoded tree: indented text or JSON.

use serde::Serialize;

use crate::fat32::TreeNode;

/// Line-oriented output device
pub trait Output {
    fn write_str(&mut self, s: &str);

    fn write_line(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\n");
    }
}

/// Collects output in memory
#[derive(Debug, Default)]
pub struct StringOutput {
    pub buffer: String,
}

impl StringOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Output for StringOutput {
    fn write_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }
}

/// `|__name`, indented two spaces per level.
pub fn tree_line(node: &TreeNode) -> String {
    format!("{}|__{}", "  ".repeat(node.depth), node.entry.display_name())
}

pub fn render_tree<O: Output>(nodes: &[TreeNode], out: &mut O) {
    for node in nodes {
        out.write_line(&tree_line(node));
    }
}

/// JSON view of one node
#[derive(Debug, Serialize)]
pub struct JsonNode {
    pub depth: usize,
    pub name: String,
    pub short_name: String,
    pub is_directory: bool,
    pub size: u32,
    pub cluster: u32,
}

impl From<&TreeNode> for JsonNode {
    fn from(node: &TreeNode) -> Self {
        JsonNode {
            depth: node.depth,
            name: node.entry.display_name(),
            short_name: node.entry.short_display_name(),
            is_directory: node.entry.is_directory(),
            size: node.entry.size,
            cluster: node.entry.cluster(),
        }
    }
}

pub fn render_json(nodes: &[TreeNode]) -> serde_json::Result<String> {
    let view: Vec<JsonNode> = nodes.iter().map(JsonNode::from).collect();
    serde_json::to_string_pretty(&view)
}
