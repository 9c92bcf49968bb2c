use serde::{Deserialize, Serialize};

/// The two zoom levels the graph can be drawn at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewScale {
    Universe,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Library,
    Class,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub score: u8,
    pub color: String,
    pub radius: f64,
    /// Width of the score bar in percent; always equal to `score`.
    pub score_bar: u8,
    pub tooltip: Vec<String>,
    pub path: Option<String>,
    pub line: Option<u32>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

/// Everything the surface needs to draw one view.
///
/// `nodes[0]` is always the root; node positions are the deterministic
/// seed placement, later frames arrive as `layoutTick` messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView {
    pub scale: ViewScale,
    pub breadcrumb: Vec<String>,
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}
