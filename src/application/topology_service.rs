// Topology service - Positioned flow elements and in-memory station edits
use crate::application::dashboard_api::DashboardApi;
use crate::application::error::TopologyError;
use crate::application::layered_layout::{LayoutNode, LayoutSettings, layout};
use crate::domain::topology::{NodeColor, NodeEdit, TopologyGraph};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod palette {
    pub const NODE_RED: &str = "#dc3545";
    pub const NODE_BLUE: &str = "#007bff";
    pub const NODE_WHITE: &str = "#ffffff";
    pub const FONT_WHITE: &str = "#ffffff";
    pub const FONT_BLACK: &str = "#4b4b4b";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNodeData {
    pub name: String,
    pub station_number: String,
    pub machine_id: i64,
    pub color: NodeColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNodeStyle {
    pub background: &'static str,
    pub color: &'static str,
    pub border_radius: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub id: String,
    /// Top-left corner.
    pub position: Position,
    pub data: FlowNodeData,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub style: FlowNodeStyle,
    pub draggable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowElements {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

/// Body of a station edit; the machine id comes from the route.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeEditRequest {
    pub name: String,
    pub station_number: String,
    pub color: NodeColor,
}

fn node_style(color: NodeColor) -> FlowNodeStyle {
    let (background, font) = match color {
        NodeColor::Red => (palette::NODE_RED, palette::FONT_WHITE),
        NodeColor::Blue => (palette::NODE_BLUE, palette::FONT_WHITE),
        NodeColor::White => (palette::NODE_WHITE, palette::FONT_BLACK),
    };
    FlowNodeStyle {
        background,
        color: font,
        border_radius: 10,
    }
}

/// Positioned nodes and edges for a topology; `None` when there is none.
pub fn flow_elements(graph: Option<&TopologyGraph>, settings: &LayoutSettings) -> Option<FlowElements> {
    let graph = graph?;

    let layout_nodes: Vec<LayoutNode> = graph
        .prod_machine_map
        .iter()
        .map(|node| LayoutNode {
            key: node.id.to_string(),
            width: settings.node_width,
            height: settings.node_height,
        })
        .collect();

    let edges: Vec<FlowEdge> = graph
        .edges()
        .map(|(source, target)| FlowEdge {
            id: format!("{}->{}", source, target),
            source: source.to_string(),
            target: target.to_string(),
            kind: "step",
        })
        .collect();

    let pairs: Vec<(String, String)> = edges.iter().map(|e| (e.source.clone(), e.target.clone())).collect();
    let placed = layout(&layout_nodes, &pairs, settings);

    let nodes = graph
        .prod_machine_map
        .iter()
        .map(|node| {
            let key = node.id.to_string();
            let (x, y) = placed
                .position(&key)
                .map(|p| (p.x - p.width / 2.0, p.y - p.height / 2.0))
                .unwrap_or((0.0, 0.0));
            let color = graph.classify(node.machine_id);

            FlowNode {
                id: key,
                position: Position { x, y },
                data: FlowNodeData {
                    name: node.name.clone(),
                    station_number: node.station_number.clone(),
                    machine_id: node.machine_id,
                    color,
                },
                kind: "node",
                style: node_style(color),
                draggable: false,
            }
        })
        .collect();

    Some(FlowElements { nodes, edges })
}

#[derive(Clone)]
pub struct TopologyService {
    api: Arc<dyn DashboardApi>,
    settings: LayoutSettings,
    graph: Arc<RwLock<Option<TopologyGraph>>>,
}

impl TopologyService {
    pub fn new(api: Arc<dyn DashboardApi>, settings: LayoutSettings) -> Self {
        Self {
            api,
            settings,
            graph: Arc::new(RwLock::new(None)),
        }
    }

    /// Fetch the topology on first use; later calls see the edited copy.
    async fn ensure_loaded(&self) -> Result<(), TopologyError> {
        if self.graph.read().await.is_some() {
            return Ok(());
        }

        let fetched = self.api.tree_visual().await?;
        let mut guard = self.graph.write().await;
        if guard.is_none() {
            tracing::info!("Loaded topology with {} stations", fetched.prod_machine_map.len());
            *guard = Some(fetched);
        }
        Ok(())
    }

    pub async fn flow_elements(&self) -> Result<FlowElements, TopologyError> {
        self.ensure_loaded().await?;
        let guard = self.graph.read().await;
        flow_elements(guard.as_ref(), &self.settings).ok_or(TopologyError::NotLoaded)
    }

    pub async fn apply_edit(&self, edit: NodeEdit) -> Result<FlowElements, TopologyError> {
        self.ensure_loaded().await?;
        let mut guard = self.graph.write().await;
        let current = guard.as_ref().ok_or(TopologyError::NotLoaded)?;
        if !current.contains_machine(edit.machine_id) {
            return Err(TopologyError::UnknownMachine(edit.machine_id));
        }

        let updated = current.apply_edit(&edit);
        tracing::info!("Station {} set to {:?}", edit.machine_id, edit.color);
        *guard = Some(updated);

        flow_elements(guard.as_ref(), &self.settings).ok_or(TopologyError::NotLoaded)
    }
}
