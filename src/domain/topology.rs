// Production line topology domain model
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineNode {
    pub id: i64,
    pub name: String,
    pub station_number: String,
    pub machine_id: i64,
    /// Node ids feeding this station.
    #[serde(default)]
    pub input_stations: Vec<i64>,
}

/// Visual classification of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColor {
    /// Not allowed.
    Red,
    /// Bypassed.
    Blue,
    White,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopologyGraph {
    #[serde(default)]
    pub bypass_list: Vec<i64>,
    #[serde(default)]
    pub not_allowed_list: Vec<i64>,
    #[serde(default)]
    pub prod_machine_map: Vec<MachineNode>,
}

/// A user edit to one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEdit {
    pub machine_id: i64,
    pub name: String,
    pub station_number: String,
    pub color: NodeColor,
}

impl TopologyGraph {
    /// Not-allowed wins when a machine is (invalidly) on both lists.
    pub fn classify(&self, machine_id: i64) -> NodeColor {
        if self.not_allowed_list.contains(&machine_id) {
            NodeColor::Red
        } else if self.bypass_list.contains(&machine_id) {
            NodeColor::Blue
        } else {
            NodeColor::White
        }
    }

    pub fn contains_machine(&self, machine_id: i64) -> bool {
        self.prod_machine_map.iter().any(|n| n.machine_id == machine_id)
    }

    /// Directed edges `(source, target)`, one per input station entry.
    pub fn edges(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.prod_machine_map
            .iter()
            .flat_map(|node| node.input_stations.iter().map(move |&source| (source, node.id)))
    }

    /// Returns the graph with `edit` applied. A machine ends up on at most one
    /// membership list; applying the same edit twice changes nothing more.
    pub fn apply_edit(&self, edit: &NodeEdit) -> TopologyGraph {
        let id = edit.machine_id;
        let mut bypass_list: Vec<i64> = self.bypass_list.iter().copied().filter(|&m| m != id).collect();
        let mut not_allowed_list: Vec<i64> =
            self.not_allowed_list.iter().copied().filter(|&m| m != id).collect();

        match edit.color {
            NodeColor::Blue => bypass_list.push(id),
            NodeColor::Red => not_allowed_list.push(id),
            NodeColor::White => {}
        }

        let prod_machine_map = self
            .prod_machine_map
            .iter()
            .map(|node| {
                if node.machine_id == id {
                    MachineNode {
                        name: edit.name.clone(),
                        station_number: edit.station_number.clone(),
                        ..node.clone()
                    }
                } else {
                    node.clone()
                }
            })
            .collect();

        TopologyGraph {
            bypass_list,
            not_allowed_list,
            prod_machine_map,
        }
    }
}
