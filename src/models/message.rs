use crate::error::ProtocolError;
use crate::models::graph::{GraphView, NodePosition};
use crate::models::snapshot::{Class, Library, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Messages sent by the rendering surface to the controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", deny_unknown_fields)]
pub enum SurfaceMessage {
    RequestData,
    #[serde(rename_all = "camelCase")]
    DrillDown { library_name: String },
    ShowUniverse,
    #[serde(rename_all = "camelCase")]
    OpenFile {
        file_path: String,
        #[serde(default = "default_line")]
        line: u32,
    },
    #[serde(rename_all = "camelCase")]
    DragStart { node_id: String, x: f64, y: f64 },
    #[serde(rename_all = "camelCase")]
    DragMove { node_id: String, x: f64, y: f64 },
    #[serde(rename_all = "camelCase")]
    DragEnd { node_id: String },
    Resize { width: f64, height: f64 },
}

impl SurfaceMessage {
    /// Decode a raw IPC payload, rejecting unknown commands and invalid fields.
    pub fn parse(raw: Value) -> Result<Self, ProtocolError> {
        let message: SurfaceMessage =
            serde_json::from_value(raw).map_err(|e| ProtocolError::Invalid(e.to_string()))?;
        message.validate()
    }

    fn validate(self) -> Result<Self, ProtocolError> {
        match self {
            SurfaceMessage::DrillDown { ref library_name } if library_name.trim().is_empty() => {
                Err(ProtocolError::EmptyField("libraryName"))
            }
            SurfaceMessage::OpenFile { file_path, .. } if file_path.trim().is_empty() => {
                Err(ProtocolError::EmptyField("filePath"))
            }
            SurfaceMessage::OpenFile { file_path, line } => Ok(SurfaceMessage::OpenFile {
                file_path,
                line: line.max(1),
            }),
            SurfaceMessage::DragStart { ref node_id, .. }
            | SurfaceMessage::DragMove { ref node_id, .. }
            | SurfaceMessage::DragEnd { ref node_id }
                if node_id.is_empty() =>
            {
                Err(ProtocolError::EmptyField("nodeId"))
            }
            SurfaceMessage::DragStart { x, y, .. } | SurfaceMessage::DragMove { x, y, .. }
                if !x.is_finite() || !y.is_finite() =>
            {
                Err(ProtocolError::NonFinite("x/y"))
            }
            SurfaceMessage::Resize { width, height }
                if !width.is_finite() || !height.is_finite() =>
            {
                Err(ProtocolError::NonFinite("width/height"))
            }
            SurfaceMessage::Resize { width, height } if width <= 0.0 || height <= 0.0 => {
                Err(ProtocolError::NotPositive("width/height"))
            }
            other => Ok(other),
        }
    }
}

/// Messages pushed from the controller to the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostMessage {
    UpdateData {
        data: Arc<Snapshot>,
        graph: GraphView,
    },
    ShowLibrary {
        data: Option<LibraryDetail>,
        graph: Option<GraphView>,
    },
    LayoutTick {
        positions: Vec<NodePosition>,
    },
    Notice(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDetail {
    pub name: String,
    pub path: String,
    pub score: u8,
    pub feature_count: u32,
    pub require_count: u32,
    pub ensure_count: u32,
    pub invariant_count: u32,
    pub classes: Vec<Class>,
}

impl From<&Library> for LibraryDetail {
    fn from(library: &Library) -> Self {
        Self {
            name: library.name.clone(),
            path: library.path.clone(),
            score: library.score,
            feature_count: library.feature_count,
            require_count: library.require_count,
            ensure_count: library.ensure_count,
            invariant_count: library.invariant_count,
            classes: library.classes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

fn default_line() -> u32 {
    1
}
