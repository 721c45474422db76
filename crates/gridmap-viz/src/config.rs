//! Layout configuration.
//!
//! [`GridmapConfig`] groups the layout parameters consumed by the engine and the
//! initial view state. It is stored as TOML and supports partial files where
//! unspecified values use the defaults below.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How power flow is represented along lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineFlowMode {
    /// Evenly spaced arrows, not animated.
    StaticArrows,
    /// Evenly spaced arrows, animated by the renderer.
    AnimatedArrows,
    /// One arrow near each end, showing what each feeder injects.
    #[default]
    Feeders,
}

impl LineFlowMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LineFlowMode::StaticArrows => "static_arrows",
            LineFlowMode::AnimatedArrows => "animated_arrows",
            LineFlowMode::Feeders => "feeders",
        }
    }
}

impl FromStr for LineFlowMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "static_arrows" => Ok(LineFlowMode::StaticArrows),
            "animated_arrows" => Ok(LineFlowMode::AnimatedArrows),
            "feeders" => Ok(LineFlowMode::Feeders),
            other => Err(Error::unknown_variant("line flow mode", other)),
        }
    }
}

/// Smallest accepted arrow spacing, in meters.
pub const MIN_ARROW_SPACING: f64 = 100.0;

/// Parameters of the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Spacing between parallel lines, in meters.
    pub distance_between_lines: f64,

    /// Lower pixel clamp of the parallel spacing.
    pub min_parallel_offset_px: f64,

    /// Upper pixel clamp of the parallel spacing.
    pub max_parallel_offset_px: f64,

    /// Substation marker radius, in meters.
    pub substation_radius: f64,

    /// Lower pixel clamp of the substation radius.
    pub min_substation_radius_px: f64,

    /// Upper pixel clamp of the substation radius.
    pub max_substation_radius_px: f64,

    pub line_flow_mode: LineFlowMode,

    /// Loading (percent of the current limit) from which a line is flagged.
    pub line_flow_alert_threshold: f64,

    /// Draw detailed paths instead of straight substation-to-substation lines.
    pub full_path: bool,

    /// Fan out lines sharing the same pair of substations.
    pub parallel_path: bool,

    /// Spacing between arrows in the arrow modes, in meters.
    pub arrow_spacing: f64,

    /// Distance between a label and the line stroke, in pixels.
    pub label_offset_px: f64,

    /// Minimum zoom at which flow labels are shown.
    pub label_zoom_threshold: f64,

    /// Minimum zoom at which arrows are shown.
    pub arrow_zoom_threshold: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            distance_between_lines: 1000.0,
            min_parallel_offset_px: 3.0,
            max_parallel_offset_px: 30.0,
            substation_radius: 500.0,
            min_substation_radius_px: 1.0,
            max_substation_radius_px: 5.0,
            line_flow_mode: LineFlowMode::Feeders,
            line_flow_alert_threshold: 80.0,
            full_path: true,
            parallel_path: true,
            arrow_spacing: 40_000.0,
            label_offset_px: 20.0,
            label_zoom_threshold: 9.0,
            arrow_zoom_threshold: 7.0,
        }
    }
}

impl LayoutParams {
    /// Reject parameter sets the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.distance_between_lines > 0.0) {
            return Err(Error::Config(format!(
                "distance_between_lines must be positive, got {}",
                self.distance_between_lines
            )));
        }
        if !(self.arrow_spacing >= MIN_ARROW_SPACING) {
            return Err(Error::Config(format!(
                "arrow_spacing must be at least {MIN_ARROW_SPACING} m, got {}",
                self.arrow_spacing
            )));
        }
        if self.min_parallel_offset_px > self.max_parallel_offset_px {
            return Err(Error::Config(
                "min_parallel_offset_px exceeds max_parallel_offset_px".to_string(),
            ));
        }
        if self.min_substation_radius_px > self.max_substation_radius_px {
            return Err(Error::Config(
                "min_substation_radius_px exceeds max_substation_radius_px".to_string(),
            ));
        }
        Ok(())
    }
}

/// View parameters that only affect render-time scaling and visibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub zoom: f64,
    /// Latitude of the view centre, used for the pixel-to-meter scale.
    pub center_latitude: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 6.0,
            center_latitude: 46.0,
        }
    }
}

/// Main configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridmapConfig {
    pub layout: LayoutParams,
    pub view: ViewState,
}

impl GridmapConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.layout.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = GridmapConfig::default();
        assert_eq!(config.layout.distance_between_lines, 1000.0);
        assert_eq!(config.layout.line_flow_mode, LineFlowMode::Feeders);
        assert!(config.layout.parallel_path);
        assert_eq!(config.view.zoom, 6.0);
    }

    #[test]
    fn test_partial_config_parsing() {
        let toml = r#"
            [layout]
            distance_between_lines = 250.0
            line_flow_mode = "animated_arrows"

            [view]
            zoom = 11.5
        "#;

        let config = GridmapConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.layout.distance_between_lines, 250.0);
        assert_eq!(config.layout.line_flow_mode, LineFlowMode::AnimatedArrows);
        assert_eq!(config.view.zoom, 11.5);

        // Defaults for unset values
        assert_eq!(config.layout.line_flow_alert_threshold, 80.0);
        assert_eq!(config.view.center_latitude, 46.0);
    }

    #[test]
    fn test_unknown_flow_mode_is_rejected() {
        let toml = r#"
            [layout]
            line_flow_mode = "sparkles"
        "#;
        assert!(matches!(
            GridmapConfig::from_toml_str(toml),
            Err(Error::Serialization(_))
        ));
        assert!(matches!(
            "sparkles".parse::<LineFlowMode>(),
            Err(Error::UnknownVariant { .. })
        ));
        assert_eq!("feeders".parse::<LineFlowMode>().unwrap(), LineFlowMode::Feeders);
    }

    #[test]
    fn test_tiny_arrow_spacing_is_rejected() {
        let params = LayoutParams {
            arrow_spacing: 1e-6,
            ..LayoutParams::default()
        };
        assert!(matches!(params.validate(), Err(Error::Config(_))));
        let params = LayoutParams {
            arrow_spacing: MIN_ARROW_SPACING,
            ..LayoutParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_spacing_is_rejected() {
        let toml = r#"
            [layout]
            distance_between_lines = 0.0
        "#;
        assert!(matches!(
            GridmapConfig::from_toml_str(toml),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let file = NamedTempFile::new().unwrap();

        let mut config = GridmapConfig::default();
        config.layout.parallel_path = false;
        config.layout.line_flow_mode = LineFlowMode::StaticArrows;
        config.save_to(file.path()).unwrap();

        let loaded = GridmapConfig::load_from(file.path()).unwrap();
        assert!(!loaded.layout.parallel_path);
        assert_eq!(loaded.layout.line_flow_mode, LineFlowMode::StaticArrows);
    }
}
