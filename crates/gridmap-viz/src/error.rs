//! Error types for the layout engine.

use gridmap_core::GridError;
use thiserror::Error;

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from layout operations.
///
/// Data conditions (missing equipment, unknown positions) are reported per
/// line and skipped by the engine; only caller bugs such as an out-of-range
/// fractional position propagate out of a layout pass.
#[derive(Debug, Error)]
pub enum Error {
    /// An endpoint voltage level is absent from the network index.
    #[error("voltage level {voltage_level_id} not found (line {line_id})")]
    VoltageLevelNotFound {
        line_id: String,
        voltage_level_id: String,
    },

    /// A voltage level points at a substation the network does not know.
    #[error("substation {substation_id} not found (line {line_id})")]
    SubstationNotFound {
        line_id: String,
        substation_id: String,
    },

    /// Fractional position along a line outside [0, 1].
    #[error("fractional position {0} is outside [0, 1]")]
    InvalidFraction(f64),

    /// A string did not name any variant of a closed enumeration.
    #[error("impossible {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn unknown_variant(kind: &'static str, value: &str) -> Self {
        Error::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<Error> for GridError {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(io) => GridError::Io(io),
            Error::Config(msg) => GridError::Config(msg),
            Error::Serialization(msg) => GridError::Parse(msg),
            Error::VoltageLevelNotFound { .. } | Error::SubstationNotFound { .. } => {
                GridError::Network(e.to_string())
            }
            other => GridError::Layout(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_errors_map_to_network() {
        let err = Error::VoltageLevelNotFound {
            line_id: "L1".into(),
            voltage_level_id: "VL9".into(),
        };
        assert_eq!(err.to_string(), "voltage level VL9 not found (line L1)");
        assert!(matches!(GridError::from(err), GridError::Network(_)));
    }

    #[test]
    fn fraction_error_maps_to_layout() {
        let err: GridError = Error::InvalidFraction(1.5).into();
        assert!(matches!(err, GridError::Layout(_)));
        assert!(err.to_string().contains("1.5"));
    }
}
