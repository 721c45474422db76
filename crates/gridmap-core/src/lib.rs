//! # gridmap-core: Network Equipment Model
//!
//! Provides the equipment records the map layout engine consumes: substations,
//! their voltage levels, and the branches (AC lines, tie lines, HVDC links)
//! that connect voltage levels.
//!
//! ## Design Philosophy
//!
//! The network is modeled as an **undirected multigraph** of substations:
//! - **Nodes**: [`Substation`]s, each owning its [`VoltageLevel`]s
//! - **Edges**: [`Line`]s, attached to the substations owning their two
//!   endpoint voltage levels
//!
//! Parallel lines between the same two substations are simply parallel edges,
//! and a line whose two voltage levels sit in the same substation is a
//! self-loop. Geometry is never stored on these records: positions and every
//! derived layout quantity live in the layout engine's own side tables.
//!
//! ## Quick Start
//!
//! ```rust
//! use gridmap_core::*;
//!
//! let mut network = Network::new();
//! network
//!     .add_substation(Substation::new("S1").with_voltage_level("VL1", 400.0))
//!     .unwrap();
//! network
//!     .add_substation(Substation::new("S2").with_voltage_level("VL2", 400.0))
//!     .unwrap();
//! network.add_line(Line::new("L1", "VL1", "VL2")).unwrap();
//!
//! assert_eq!(network.line_count(), 1);
//! assert_eq!(network.voltage_level("VL2").unwrap().substation_id, "S2");
//! ```
//!
//! ## Modules
//!
//! - [`units`] - unit newtypes (kV, MW, A, m, degrees, radians)
//! - [`error`] - unified [`GridError`]
//! - [`diagnostics`] - issue collection for best-effort operations

use petgraph::graph::{EdgeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod diagnostics;
pub mod error;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GridError, GridResult};
pub use petgraph::graph::NodeIndex;
pub use units::{Amperes, Degrees, Kilovolts, Megawatts, Meters, Radians};

/// One of the two terminals of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "ONE")]
    One,
    #[serde(rename = "TWO")]
    Two,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageLevel {
    pub id: String,
    /// Nominal voltage (strictly positive)
    pub nominal_v: Kilovolts,
    /// Owning substation; filled in by [`Network::add_substation`] when omitted
    #[serde(default)]
    pub substation_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Sorted ascending by nominal voltage once added to a [`Network`]
    #[serde(default)]
    pub voltage_levels: Vec<VoltageLevel>,
}

impl Substation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            voltage_levels: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_voltage_level(mut self, id: impl Into<String>, nominal_kv: f64) -> Self {
        self.voltage_levels.push(VoltageLevel {
            id: id.into(),
            nominal_v: Kilovolts(nominal_kv),
            substation_id: self.id.clone(),
        });
        self
    }

    /// Distinct nominal voltages present in the substation, ascending.
    pub fn nominal_voltages(&self) -> Vec<Kilovolts> {
        let mut voltages: Vec<Kilovolts> =
            self.voltage_levels.iter().map(|vl| vl.nominal_v).collect();
        voltages.sort_by(|a, b| a.0.total_cmp(&b.0));
        voltages.dedup();
        voltages
    }
}

/// Branch flavour. All three are laid out the same way on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    #[default]
    AcLine,
    TieLine,
    HvdcLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingStatus {
    InOperation,
    PlannedOutage,
    ForcedOutage,
}

impl OperatingStatus {
    /// Whether the renderer should draw a status icon for this line.
    pub fn is_outage(self) -> bool {
        matches!(
            self,
            OperatingStatus::PlannedOutage | OperatingStatus::ForcedOutage
        )
    }
}

fn default_connected() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    #[serde(default)]
    pub kind: LineKind,
    pub voltage_level_id1: String,
    pub voltage_level_id2: String,
    #[serde(default = "default_connected")]
    pub terminal1_connected: bool,
    #[serde(default = "default_connected")]
    pub terminal2_connected: bool,
    #[serde(default)]
    pub p1: Option<Megawatts>,
    #[serde(default)]
    pub p2: Option<Megawatts>,
    #[serde(default)]
    pub i1: Option<Amperes>,
    #[serde(default)]
    pub i2: Option<Amperes>,
    #[serde(default)]
    pub current_limit1: Option<Amperes>,
    #[serde(default)]
    pub current_limit2: Option<Amperes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_status: Option<OperatingStatus>,
}

impl Line {
    pub fn new(
        id: impl Into<String>,
        voltage_level_id1: impl Into<String>,
        voltage_level_id2: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: LineKind::AcLine,
            voltage_level_id1: voltage_level_id1.into(),
            voltage_level_id2: voltage_level_id2.into(),
            terminal1_connected: true,
            terminal2_connected: true,
            p1: None,
            p2: None,
            i1: None,
            i2: None,
            current_limit1: None,
            current_limit2: None,
            operating_status: None,
        }
    }

    pub fn with_kind(mut self, kind: LineKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach measured active power on both sides (MW).
    pub fn with_flows(mut self, p1: f64, p2: f64) -> Self {
        self.p1 = Some(Megawatts(p1));
        self.p2 = Some(Megawatts(p2));
        self
    }

    /// Attach measured currents and permanent limits on both sides (A).
    pub fn with_currents(mut self, i1: f64, i2: f64, limit1: f64, limit2: f64) -> Self {
        self.i1 = Some(Amperes(i1));
        self.i2 = Some(Amperes(i2));
        self.current_limit1 = Some(Amperes(limit1));
        self.current_limit2 = Some(Amperes(limit2));
        self
    }

    pub fn with_status(mut self, status: OperatingStatus) -> Self {
        self.operating_status = Some(status);
        self
    }

    pub fn voltage_level_id(&self, side: Side) -> &str {
        match side {
            Side::One => &self.voltage_level_id1,
            Side::Two => &self.voltage_level_id2,
        }
    }

    pub fn is_connected(&self, side: Side) -> bool {
        match side {
            Side::One => self.terminal1_connected,
            Side::Two => self.terminal2_connected,
        }
    }

    pub fn p(&self, side: Side) -> Option<Megawatts> {
        match side {
            Side::One => self.p1,
            Side::Two => self.p2,
        }
    }

    pub fn i(&self, side: Side) -> Option<Amperes> {
        match side {
            Side::One => self.i1,
            Side::Two => self.i2,
        }
    }

    pub fn current_limit(&self, side: Side) -> Option<Amperes> {
        match side {
            Side::One => self.current_limit1,
            Side::Two => self.current_limit2,
        }
    }

    /// Highest loading over both sides, in percent of the current limit.
    ///
    /// `None` when no side has both a measured current and a positive limit.
    pub fn loading_percent(&self) -> Option<f64> {
        [Side::One, Side::Two]
            .into_iter()
            .filter_map(|side| {
                let current = self.i(side)?;
                let limit = self.current_limit(side)?;
                current.loading_percent(limit)
            })
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

/// Equipment lookups consumed by the layout engine.
///
/// Every lookup may miss: the engine degrades the affected line to
/// "undrawable" instead of failing the pass.
pub trait NetworkIndex {
    fn voltage_level(&self, id: &str) -> Option<&VoltageLevel>;
    fn substation(&self, id: &str) -> Option<&Substation>;
    /// All lines, in a stable order.
    fn lines(&self) -> Vec<&Line>;
}

/// Serialized network exchange shape (`{"substations": [...], "lines": [...]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkData {
    #[serde(default)]
    pub substations: Vec<Substation>,
    #[serde(default)]
    pub lines: Vec<Line>,
}

/// Substation multigraph with id indices.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: UnGraph<Substation, Line>,
    substation_nodes: HashMap<String, NodeIndex>,
    voltage_levels: HashMap<String, (NodeIndex, usize)>,
    line_edges: HashMap<String, EdgeIndex>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a network from its exchange shape, in input order.
    pub fn from_data(data: NetworkData) -> GridResult<Self> {
        let mut network = Self::new();
        for substation in data.substations {
            network.add_substation(substation)?;
        }
        for line in data.lines {
            network.add_line(line)?;
        }
        Ok(network)
    }

    pub fn from_json(text: &str) -> GridResult<Self> {
        let data: NetworkData = serde_json::from_str(text)?;
        Self::from_data(data)
    }

    /// Export the network back to its exchange shape.
    pub fn to_data(&self) -> NetworkData {
        NetworkData {
            substations: self
                .graph
                .node_indices()
                .map(|n| self.graph[n].clone())
                .collect(),
            lines: self.lines().into_iter().cloned().collect(),
        }
    }

    /// Add a substation, sorting its voltage levels ascending by nominal voltage.
    pub fn add_substation(&mut self, mut substation: Substation) -> GridResult<NodeIndex> {
        if self.substation_nodes.contains_key(&substation.id) {
            return Err(GridError::Network(format!(
                "duplicate substation id {}",
                substation.id
            )));
        }
        for vl in &mut substation.voltage_levels {
            if !(vl.nominal_v.value() > 0.0) {
                return Err(GridError::Validation(format!(
                    "voltage level {} has non-positive nominal voltage {}",
                    vl.id,
                    vl.nominal_v.value()
                )));
            }
            if vl.substation_id.is_empty() {
                vl.substation_id = substation.id.clone();
            } else if vl.substation_id != substation.id {
                return Err(GridError::Validation(format!(
                    "voltage level {} claims substation {} but is nested in {}",
                    vl.id, vl.substation_id, substation.id
                )));
            }
            if self.voltage_levels.contains_key(&vl.id) {
                return Err(GridError::Network(format!(
                    "duplicate voltage level id {}",
                    vl.id
                )));
            }
        }
        substation
            .voltage_levels
            .sort_by(|a, b| a.nominal_v.0.total_cmp(&b.nominal_v.0));

        let id = substation.id.clone();
        let vl_ids: Vec<String> = substation
            .voltage_levels
            .iter()
            .map(|vl| vl.id.clone())
            .collect();
        let node = self.graph.add_node(substation);
        self.substation_nodes.insert(id, node);
        for (pos, vl_id) in vl_ids.into_iter().enumerate() {
            self.voltage_levels.insert(vl_id, (node, pos));
        }
        Ok(node)
    }

    /// Attach a line between the substations owning its two voltage levels.
    pub fn add_line(&mut self, line: Line) -> GridResult<EdgeIndex> {
        if self.line_edges.contains_key(&line.id) {
            return Err(GridError::Network(format!("duplicate line id {}", line.id)));
        }
        let node1 = self.voltage_level_node(&line.voltage_level_id1, &line.id)?;
        let node2 = self.voltage_level_node(&line.voltage_level_id2, &line.id)?;
        let id = line.id.clone();
        let edge = self.graph.add_edge(node1, node2, line);
        self.line_edges.insert(id, edge);
        Ok(edge)
    }

    fn voltage_level_node(&self, vl_id: &str, line_id: &str) -> GridResult<NodeIndex> {
        self.voltage_levels
            .get(vl_id)
            .map(|(node, _)| *node)
            .ok_or_else(|| {
                GridError::Network(format!(
                    "line {} references unknown voltage level {}",
                    line_id, vl_id
                ))
            })
    }

    pub fn line(&self, id: &str) -> Option<&Line> {
        self.line_edges.get(id).map(|e| &self.graph[*e])
    }

    /// Mutable access to a line's electrical values (flows, status).
    ///
    /// Endpoints are not meant to change through this handle.
    pub fn line_mut(&mut self, id: &str) -> Option<&mut Line> {
        let edge = *self.line_edges.get(id)?;
        self.graph.edge_weight_mut(edge)
    }

    pub fn substation_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn line_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn substations(&self) -> impl Iterator<Item = &Substation> {
        self.graph.node_indices().map(move |n| &self.graph[n])
    }
}

impl NetworkIndex for Network {
    fn voltage_level(&self, id: &str) -> Option<&VoltageLevel> {
        let (node, pos) = self.voltage_levels.get(id)?;
        self.graph[*node].voltage_levels.get(*pos)
    }

    fn substation(&self, id: &str) -> Option<&Substation> {
        self.substation_nodes.get(id).map(|n| &self.graph[*n])
    }

    fn lines(&self) -> Vec<&Line> {
        // Edge indices are insertion-ordered because lines are never removed.
        self.graph.edge_indices().map(|e| &self.graph[e]).collect()
    }
}
