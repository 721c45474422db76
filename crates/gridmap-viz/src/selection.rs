//! Polygon selection of substations and lines on the map.
//!
//! The drawing state lives in a [`SelectionHandle`] owned by the caller's
//! session. [`select_in_polygon`] takes the handle by value and hands it back
//! with drawing finished, next to what the polygon selected.

use gridmap_core::{NetworkIndex, Side};
use serde::{Deserialize, Serialize};

use crate::engine::GeoLayoutEngine;
use crate::geo_data::GeoData;
use crate::geodesy::Coordinate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionHandle {
    polygon: Vec<Coordinate>,
    drawing: bool,
}

impl SelectionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle in drawing mode with an already known polygon.
    pub fn with_polygon(polygon: Vec<Coordinate>) -> Self {
        Self {
            polygon,
            drawing: true,
        }
    }

    pub fn start_drawing(&mut self) {
        self.polygon.clear();
        self.drawing = true;
    }

    pub fn push_vertex(&mut self, vertex: Coordinate) {
        if self.drawing {
            self.polygon.push(vertex);
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn polygon(&self) -> &[Coordinate] {
        &self.polygon
    }

    /// At least three vertices.
    pub fn is_closed(&self) -> bool {
        self.polygon.len() >= 3
    }

    /// Even-odd ray casting in (lon, lat) space.
    pub fn contains(&self, point: Coordinate) -> bool {
        if !self.is_closed() {
            return false;
        }
        let mut inside = false;
        let n = self.polygon.len();
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (self.polygon[i], self.polygon[j]);
            if (a.lat > point.lat) != (b.lat > point.lat)
                && point.lon < (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Substations positioned inside the polygon, by id.
    pub substations: Vec<String>,
    /// Lines with both end substations selected, in network order.
    pub lines: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.substations.is_empty() && self.lines.is_empty()
    }
}

/// Select everything inside the handle's polygon and finish drawing.
pub fn select_in_polygon<N: NetworkIndex>(
    mut handle: SelectionHandle,
    engine: &GeoLayoutEngine,
    network: &N,
) -> (SelectionHandle, Selection) {
    let geo = engine.geo_data();
    let substations: Vec<String> = geo
        .substation_positions()
        .into_iter()
        .filter(|(_, position)| !position.is_unknown() && handle.contains(*position))
        .map(|(id, _)| id.to_string())
        .collect();

    let lines = network
        .lines()
        .into_iter()
        .filter(|line| {
            [Side::One, Side::Two].into_iter().all(|side| {
                GeoData::endpoint_substation(network, line, side)
                    .map(|id| substations.iter().any(|s| s == id))
                    .unwrap_or(false)
            })
        })
        .map(|line| line.id.clone())
        .collect();

    handle.drawing = false;
    (handle, Selection { substations, lines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_data::SubstationPosition;
    use gridmap_core::{Line, Network, Substation};

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(4.0, 44.0),
            Coordinate::new(6.0, 44.0),
            Coordinate::new(6.0, 46.0),
            Coordinate::new(4.0, 46.0),
        ]
    }

    #[test]
    fn ray_casting() {
        let handle = SelectionHandle::with_polygon(square());
        assert!(handle.contains(Coordinate::new(5.0, 45.0)));
        assert!(!handle.contains(Coordinate::new(7.0, 45.0)));
        assert!(!handle.contains(Coordinate::new(5.0, 47.0)));
        assert!(!SelectionHandle::new().contains(Coordinate::new(5.0, 45.0)));
    }

    #[test]
    fn vertices_are_ignored_outside_drawing() {
        let mut handle = SelectionHandle::new();
        handle.push_vertex(Coordinate::new(1.0, 1.0));
        assert!(handle.polygon().is_empty());
        handle.start_drawing();
        for v in square() {
            handle.push_vertex(v);
        }
        assert!(handle.is_closed());
    }

    #[test]
    fn selects_substations_and_enclosed_lines() {
        let mut network = Network::new();
        for (s, vl) in [("S1", "VL1"), ("S2", "VL2"), ("S3", "VL3")] {
            network
                .add_substation(Substation::new(s).with_voltage_level(vl, 225.0))
                .unwrap();
        }
        network.add_line(Line::new("IN", "VL1", "VL2")).unwrap();
        network.add_line(Line::new("OUT", "VL2", "VL3")).unwrap();

        let mut engine = GeoLayoutEngine::default();
        engine.set_substation_positions(vec![
            SubstationPosition::new("S1", 4.5, 44.5),
            SubstationPosition::new("S2", 5.5, 45.5),
            SubstationPosition::new("S3", 8.0, 45.0),
        ]);

        let handle = SelectionHandle::with_polygon(square());
        let (handle, selection) = select_in_polygon(handle, &engine, &network);
        assert!(!handle.is_drawing());
        assert_eq!(handle.polygon().len(), 4);
        assert_eq!(selection.substations, vec!["S1", "S2"]);
        assert_eq!(selection.lines, vec!["IN"]);
    }
}
