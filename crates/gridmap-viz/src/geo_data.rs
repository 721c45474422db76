//! Geographic positions of substations and detailed line paths.
//!
//! [`GeoData`] is filled by whatever fetches positions from the server, either
//! in bulk (`set_*`) or incrementally (`update_*`). An incremental update
//! carries the ids that were *requested*: a requested id missing from the
//! fetched batch means the server can no longer place it (for example after a
//! topology change), and its stale position is dropped.
//!
//! Coordinates outside the longitude/latitude ranges are rejected on the way
//! in, as if they had not been fetched.

use std::collections::{HashMap, HashSet};

use gridmap_core::{Line, NetworkIndex, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geodesy::{planar_distance, Coordinate};
use crate::segment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstationPosition {
    pub id: String,
    pub coordinate: Coordinate,
}

impl SubstationPosition {
    pub fn new(id: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            id: id.into(),
            coordinate: Coordinate::new(lon, lat),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePosition {
    pub id: String,
    pub coordinates: Vec<Coordinate>,
}

impl LinePosition {
    pub fn new(id: impl Into<String>, coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            id: id.into(),
            coordinates: coordinates.into_iter().map(Coordinate::from).collect(),
        }
    }
}

/// Exchange shape of a geo data file (`{"substations": [...], "lines": [...]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoDataSet {
    #[serde(default)]
    pub substations: Vec<SubstationPosition>,
    #[serde(default)]
    pub lines: Vec<LinePosition>,
}

#[derive(Debug, Clone, Default)]
pub struct GeoData {
    substation_positions: HashMap<String, Coordinate>,
    line_positions: HashMap<String, Vec<Coordinate>>,
}

impl GeoData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_set(set: GeoDataSet) -> Self {
        let mut geo = Self::new();
        geo.set_substation_positions(set.substations);
        geo.set_line_positions(set.lines);
        geo
    }

    pub fn substation_count(&self) -> usize {
        self.substation_positions.len()
    }

    pub fn line_count(&self) -> usize {
        self.line_positions.len()
    }

    /// Replace every substation position.
    pub fn set_substation_positions(&mut self, positions: Vec<SubstationPosition>) {
        self.substation_positions = positions
            .into_iter()
            .filter(valid_substation)
            .map(|p| (p.id, p.coordinate))
            .collect();
    }

    /// Merge fetched positions; ids in `requested` but absent from `fetched` are forgotten.
    pub fn update_substation_positions(
        &mut self,
        requested: &[String],
        fetched: Vec<SubstationPosition>,
    ) {
        let fetched: Vec<SubstationPosition> = fetched.into_iter().filter(valid_substation).collect();
        let fetched_ids: HashSet<&str> = fetched.iter().map(|p| p.id.as_str()).collect();
        for id in requested {
            if !fetched_ids.contains(id.as_str()) {
                self.substation_positions.remove(id);
            }
        }
        for p in fetched {
            self.substation_positions.insert(p.id, p.coordinate);
        }
    }

    /// Replace every detailed line path.
    pub fn set_line_positions(&mut self, positions: Vec<LinePosition>) {
        self.line_positions = positions
            .into_iter()
            .filter(valid_line)
            .map(|p| (p.id, p.coordinates))
            .collect();
    }

    /// Merge fetched paths; ids in `requested` but absent from `fetched` are forgotten.
    pub fn update_line_positions(&mut self, requested: &[String], fetched: Vec<LinePosition>) {
        let fetched: Vec<LinePosition> = fetched.into_iter().filter(valid_line).collect();
        let fetched_ids: HashSet<&str> = fetched.iter().map(|p| p.id.as_str()).collect();
        for id in requested {
            if !fetched_ids.contains(id.as_str()) {
                self.line_positions.remove(id);
            }
        }
        for p in fetched {
            self.line_positions.insert(p.id, p.coordinates);
        }
    }

    /// Position of a substation, or [`Coordinate::UNKNOWN`] when it has none.
    pub fn substation_position(&self, id: &str) -> Coordinate {
        match self.substation_positions.get(id) {
            Some(position) => *position,
            None => {
                debug!(substation = id, "position not found");
                Coordinate::UNKNOWN
            }
        }
    }

    pub fn has_substation_position(&self, id: &str) -> bool {
        self.substation_positions.contains_key(id)
    }

    /// Stored detailed path of a line, as received.
    pub fn stored_line_path(&self, id: &str) -> Option<&[Coordinate]> {
        self.line_positions.get(id).map(Vec::as_slice)
    }

    /// Known substation positions, sorted by id.
    pub fn substation_positions(&self) -> Vec<(&str, Coordinate)> {
        let mut all: Vec<(&str, Coordinate)> = self
            .substation_positions
            .iter()
            .map(|(id, c)| (id.as_str(), *c))
            .collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }

    /// Substation owning the voltage level at `side` of `line`.
    pub fn endpoint_substation<'n, N: NetworkIndex>(
        network: &'n N,
        line: &Line,
        side: Side,
    ) -> Result<&'n str> {
        let vl_id = line.voltage_level_id(side);
        let vl = network
            .voltage_level(vl_id)
            .ok_or_else(|| Error::VoltageLevelNotFound {
                line_id: line.id.clone(),
                voltage_level_id: vl_id.to_string(),
            })?;
        if network.substation(&vl.substation_id).is_none() {
            return Err(Error::SubstationNotFound {
                line_id: line.id.clone(),
                substation_id: vl.substation_id.clone(),
            });
        }
        Ok(vl.substation_id.as_str())
    }

    /// Ordered positions of `line` from side 1 to side 2 (at least two points).
    ///
    /// When either endpoint substation has no known position the result is
    /// `[UNKNOWN, UNKNOWN]`, so nothing is ever drawn across the map towards
    /// `(0, 0)`. With `detailed`, a stored path of at least two points is
    /// returned as stored, reversed if it was stored side 2 first.
    pub fn line_positions<N: NetworkIndex>(
        &self,
        network: &N,
        line: &Line,
        detailed: bool,
    ) -> Result<Vec<Coordinate>> {
        let substation1 = Self::endpoint_substation(network, line, Side::One)?;
        let substation2 = Self::endpoint_substation(network, line, Side::Two)?;
        let position1 = self.substation_position(substation1);
        let position2 = self.substation_position(substation2);

        if position1.is_unknown() || position2.is_unknown() {
            return Ok(vec![Coordinate::UNKNOWN, Coordinate::UNKNOWN]);
        }

        let stored = if detailed {
            self.line_positions.get(&line.id).filter(|p| p.len() >= 2)
        } else {
            None
        };
        let Some(stored) = stored else {
            return Ok(vec![position1, position2]);
        };

        let mut path = stored.clone();
        if is_reversed(&path, position1, position2) {
            path.reverse();
        }
        Ok(path)
    }

    /// Cumulative distance table of a path; `None` below two positions.
    pub fn line_distances(positions: &[Coordinate]) -> Option<Vec<f64>> {
        segment::line_distances(positions)
    }
}

/// Whether a stored path runs from side 2 to side 1.
fn valid_substation(position: &SubstationPosition) -> bool {
    let valid = position.coordinate.is_valid();
    if !valid {
        warn!(substation = %position.id, coordinate = %position.coordinate, "coordinate out of range, ignored");
    }
    valid
}

fn valid_line(position: &LinePosition) -> bool {
    let valid = position.coordinates.iter().all(|c| c.is_valid());
    if !valid {
        warn!(line = %position.id, "path has a coordinate out of range, ignored");
    }
    valid
}

fn is_reversed(path: &[Coordinate], side1: Coordinate, side2: Coordinate) -> bool {
    let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
        return false;
    };
    let straight = planar_distance(side1, first).value() + planar_distance(last, side2).value();
    let swapped = planar_distance(side1, last).value() + planar_distance(first, side2).value();
    swapped < straight
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmap_core::{Network, Substation};

    fn network() -> Network {
        let mut network = Network::new();
        network
            .add_substation(Substation::new("SUB1").with_voltage_level("VL1_1", 380.0))
            .unwrap();
        network
            .add_substation(Substation::new("SUB2").with_voltage_level("VL2_3", 380.0))
            .unwrap();
        network
            .add_substation(Substation::new("SUB3").with_voltage_level("VL3_1", 225.0))
            .unwrap();
        network.add_line(Line::new("L1", "VL2_3", "VL1_1")).unwrap();
        network.add_line(Line::new("L2", "VL2_3", "VL3_1")).unwrap();
        network
    }

    fn geo() -> GeoData {
        let mut geo = GeoData::new();
        geo.set_substation_positions(vec![
            SubstationPosition::new("SUB1", 9.49322, 45.31267),
            SubstationPosition::new("SUB2", 9.15484, 45.18608),
        ]);
        geo
    }

    fn line<'a>(network: &'a Network, id: &str) -> &'a Line {
        network.line(id).unwrap()
    }

    #[test]
    fn substation_position_round_trip() {
        let mut geo = GeoData::new();
        geo.set_substation_positions(vec![SubstationPosition::new("S1", 9.49, 45.31)]);
        assert_eq!(geo.substation_position("S1").to_array(), [9.49, 45.31]);
    }

    #[test]
    fn unknown_substation_is_sentinel() {
        let geo = GeoData::new();
        assert_eq!(geo.substation_position("NOPE").to_array(), [0.0, 0.0]);
    }

    #[test]
    fn update_forgets_requested_but_missing() {
        let mut geo = geo();
        geo.update_substation_positions(
            &["SUB1".to_string(), "SUB3".to_string()],
            vec![SubstationPosition::new("SUB3", 9.0, 45.0)],
        );
        assert!(!geo.has_substation_position("SUB1"));
        assert!(geo.has_substation_position("SUB2"));
        assert_eq!(geo.substation_position("SUB3"), Coordinate::new(9.0, 45.0));
    }

    #[test]
    fn update_line_positions_same_semantics() {
        let mut geo = GeoData::new();
        geo.set_line_positions(vec![
            LinePosition::new("L1", vec![[1.0, 1.0]]),
            LinePosition::new("L2", vec![[2.0, 2.0]]),
        ]);
        geo.update_line_positions(
            &["L1".to_string()],
            vec![LinePosition::new("L3", vec![[3.0, 3.0]])],
        );
        assert!(geo.stored_line_path("L1").is_none());
        assert!(geo.stored_line_path("L2").is_some());
        assert!(geo.stored_line_path("L3").is_some());
        assert_eq!(geo.line_count(), 2);
    }

    #[test]
    fn direct_positions_are_substation_endpoints() {
        let network = network();
        let positions = geo().line_positions(&network, line(&network, "L1"), false).unwrap();
        assert_eq!(
            positions,
            vec![Coordinate::new(9.15484, 45.18608), Coordinate::new(9.49322, 45.31267)]
        );
    }

    #[test]
    fn unpositioned_endpoint_degenerates() {
        let network = network();
        let mut geo = geo();
        geo.set_line_positions(vec![LinePosition::new(
            "L2",
            vec![[9.15484, 45.18608], [9.2, 45.2], [9.3, 45.3]],
        )]);
        let positions = geo.line_positions(&network, line(&network, "L2"), true).unwrap();
        assert_eq!(positions, vec![Coordinate::UNKNOWN, Coordinate::UNKNOWN]);
    }

    #[test]
    fn detailed_path_is_oriented_side1_to_side2() {
        let network = network();
        let mut geo = geo();
        // stored from SUB1 (side 2 of L1) to SUB2 (side 1)
        geo.set_line_positions(vec![LinePosition::new(
            "L1",
            vec![[9.49322, 45.31267], [9.35453, 45.249375], [9.15484, 45.18608]],
        )]);
        let positions = geo.line_positions(&network, line(&network, "L1"), true).unwrap();
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0], Coordinate::new(9.15484, 45.18608));
        assert_eq!(positions[2], Coordinate::new(9.49322, 45.31267));
    }

    #[test]
    fn single_point_path_falls_back_to_endpoints() {
        let network = network();
        let mut geo = geo();
        geo.set_line_positions(vec![LinePosition::new("L1", vec![[9.35453, 45.249375]])]);
        let positions = geo.line_positions(&network, line(&network, "L1"), true).unwrap();
        assert_eq!(
            positions,
            vec![Coordinate::new(9.15484, 45.18608), Coordinate::new(9.49322, 45.31267)]
        );
    }

    #[test]
    fn stored_path_is_returned_as_stored() {
        let network = network();
        let mut geo = geo();
        // stored side 2 first, its SUB2 end a hair off the marker
        let stored = vec![[9.49322, 45.31267], [9.35453, 45.249375], [9.154841, 45.18608]];
        geo.set_line_positions(vec![LinePosition::new("L1", stored)]);
        let positions = geo.line_positions(&network, line(&network, "L1"), true).unwrap();
        assert_eq!(
            positions,
            vec![
                Coordinate::new(9.154841, 45.18608),
                Coordinate::new(9.35453, 45.249375),
                Coordinate::new(9.49322, 45.31267),
            ]
        );
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut geo = geo();
        geo.update_substation_positions(
            &["SUB1".to_string()],
            vec![SubstationPosition::new("SUB1", 9.49, 95.0)],
        );
        assert!(!geo.has_substation_position("SUB1"));

        geo.set_substation_positions(vec![
            SubstationPosition::new("SUB1", 9.49322, 45.31267),
            SubstationPosition::new("SUB9", 200.0, 45.0),
        ]);
        assert_eq!(geo.substation_count(), 1);

        geo.set_line_positions(vec![
            LinePosition::new("L1", vec![[9.2, 45.2], [9.3, -91.0]]),
            LinePosition::new("L2", vec![[9.2, 45.2], [9.3, 45.3]]),
        ]);
        assert!(geo.stored_line_path("L1").is_none());
        assert!(geo.stored_line_path("L2").is_some());
    }

    #[test]
    fn missing_voltage_level_fails() {
        let network = network();
        let ghost = Line::new("LX", "VL2_3", "VL_GHOST");
        let err = geo().line_positions(&network, &ghost, true).unwrap_err();
        assert!(matches!(
            err,
            Error::VoltageLevelNotFound { ref voltage_level_id, .. } if voltage_level_id == "VL_GHOST"
        ));
    }
}
