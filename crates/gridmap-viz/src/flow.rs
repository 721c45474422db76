//! Flow direction, line loading zones and arrow distribution along lines.

use std::str::FromStr;

use gridmap_core::{Line, Megawatts, Meters, Side};
use serde::{Deserialize, Serialize};

use crate::config::LineFlowMode;
use crate::error::{Error, Result};

/// Fractions used for the two feeder arrows, measured from side 1.
pub const FEEDER_ARROW_FRACTIONS: [f64; 2] = [0.1, 0.9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowDirection {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "FROM_SIDE_1_TO_SIDE_2")]
    FromSide1ToSide2,
    #[serde(rename = "FROM_SIDE_2_TO_SIDE_1")]
    FromSide2ToSide1,
}

impl ArrowDirection {
    /// Direction of the flow measured at side 1 (positive power enters the line).
    pub fn from_power(p: Option<Megawatts>) -> Self {
        match p {
            Some(p) if p.value() > 0.0 => ArrowDirection::FromSide1ToSide2,
            Some(p) if p.value() < 0.0 => ArrowDirection::FromSide2ToSide1,
            _ => ArrowDirection::None,
        }
    }

    /// Direction of the flow measured at `side` of `line`.
    pub fn at_side(line: &Line, side: Side) -> Self {
        let direction = Self::from_power(line.p(side));
        match side {
            Side::One => direction,
            Side::Two => direction.reversed(),
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            ArrowDirection::None => ArrowDirection::None,
            ArrowDirection::FromSide1ToSide2 => ArrowDirection::FromSide2ToSide1,
            ArrowDirection::FromSide2ToSide1 => ArrowDirection::FromSide1ToSide2,
        }
    }

    /// Stretch applied to the in-segment distance of a label so that it sits
    /// just behind the arrow tip drawn by the shader.
    pub fn distance_multiplier(self) -> f64 {
        match self {
            ArrowDirection::FromSide1ToSide2 => 0.995,
            ArrowDirection::FromSide2ToSide1 => 1.005,
            ArrowDirection::None => 1.0,
        }
    }

    /// Side on which labels are pushed, relative to the line stroke.
    pub fn offset_sign(self) -> f64 {
        match self {
            ArrowDirection::FromSide1ToSide2 => 1.0,
            ArrowDirection::FromSide2ToSide1 => -1.0,
            ArrowDirection::None => 0.0,
        }
    }
}

impl FromStr for ArrowDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NONE" => Ok(ArrowDirection::None),
            "FROM_SIDE_1_TO_SIDE_2" => Ok(ArrowDirection::FromSide1ToSide2),
            "FROM_SIDE_2_TO_SIDE_1" => Ok(ArrowDirection::FromSide2ToSide1),
            other => Err(Error::unknown_variant("arrow direction", other)),
        }
    }
}

/// Loading band of a line relative to its current limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadZone {
    /// No current or no limit available.
    Unknown,
    Normal,
    /// At or above the alert threshold.
    Warning,
    /// Above 100 % of the limit.
    Overload,
}

impl LoadZone {
    pub fn classify(loading_percent: Option<f64>, alert_threshold: f64) -> Self {
        match loading_percent {
            None => LoadZone::Unknown,
            Some(p) if p > 100.0 => LoadZone::Overload,
            Some(p) if p >= alert_threshold => LoadZone::Warning,
            Some(_) => LoadZone::Normal,
        }
    }

    pub fn of_line(line: &Line, alert_threshold: f64) -> Self {
        Self::classify(line.loading_percent(), alert_threshold)
    }
}

impl FromStr for LoadZone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "UNKNOWN" => Ok(LoadZone::Unknown),
            "NORMAL" => Ok(LoadZone::Normal),
            "WARNING" => Ok(LoadZone::Warning),
            "OVERLOAD" => Ok(LoadZone::Overload),
            other => Err(Error::unknown_variant("load zone", other)),
        }
    }
}

/// An arrow to draw at `fraction` of the line length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArrowSpec {
    pub fraction: f64,
    pub direction: ArrowDirection,
}

/// Evenly spaced fractions for a line of `length`, one arrow per `spacing`
/// meters (at least one), each centred in its slot.
pub fn arrow_fractions(length: Meters, spacing: Meters) -> Vec<f64> {
    let count = if spacing.value() > 0.0 {
        (length.value() / spacing.value()).ceil().max(1.0) as usize
    } else {
        1
    };
    (0..count)
        .map(|i| (i as f64 + 0.5) / count as f64)
        .collect()
}

/// Arrows of `line` for the given flow mode.
pub fn line_arrows(line: &Line, mode: LineFlowMode, length: Meters, spacing: Meters) -> Vec<ArrowSpec> {
    match mode {
        LineFlowMode::Feeders => vec![
            ArrowSpec {
                fraction: FEEDER_ARROW_FRACTIONS[0],
                direction: ArrowDirection::at_side(line, Side::One),
            },
            ArrowSpec {
                fraction: FEEDER_ARROW_FRACTIONS[1],
                direction: ArrowDirection::at_side(line, Side::Two),
            },
        ],
        LineFlowMode::StaticArrows | LineFlowMode::AnimatedArrows => {
            let direction = ArrowDirection::at_side(line, Side::One);
            arrow_fractions(length, spacing)
                .into_iter()
                .map(|fraction| ArrowSpec {
                    fraction,
                    direction,
                })
                .collect()
        }
    }
}
