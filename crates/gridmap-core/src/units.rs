//! Unit newtypes for the quantities that flow through the map layout.
//!
//! Geographic layout mixes several easily-confused `f64` quantities: angles
//! in degrees (bearings, as produced by the geodesy helpers) and radians (as
//! stored on derived line geometry), distances in meters, nominal voltages in
//! kV and branch flows in MW / A. Keeping them in newtypes stops a bearing in
//! degrees from being fed to `sin()` or a pixel count from being added to a
//! distance in meters.
//!
//! # Usage
//!
//! ```
//! use gridmap_core::units::{Degrees, Meters};
//!
//! let spacing = Meters(1000.0);
//! let offset = spacing * 1.5;
//! assert_eq!(offset.value(), 1500.0);
//!
//! let bearing = Degrees(90.0);
//! assert!((bearing.to_radians().sin() - 1.0).abs() < 1e-12);
//! ```
//!
//! All types are `#[repr(transparent)]` and serialize as bare numbers.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Mul<$type> for f64 {
            type Output = $type;
            fn mul(self, rhs: $type) -> Self::Output {
                <$type>::new(self * rhs.0)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Absolute value
            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Minimum of two values
            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// Maximum of two values
            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// Clamp value to range
            #[inline]
            pub fn clamp(self, min: Self, max: Self) -> Self {
                Self(self.0.clamp(min.0, max.0))
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

// =============================================================================
// Electrical Units
// =============================================================================

/// Active power in megawatts (MW)
///
/// The sign follows the branch convention: positive when power enters the
/// branch at the measured side.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Current magnitude in amperes (A)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Amperes(pub f64);

impl_unit_ops!(Amperes, "A");

impl Amperes {
    /// Loading of this current against a limit, in percent.
    ///
    /// Returns `None` when the limit is not strictly positive.
    #[inline]
    pub fn loading_percent(self, limit: Amperes) -> Option<f64> {
        if limit.0 > 0.0 {
            Some(self.0.abs() / limit.0 * 100.0)
        } else {
            None
        }
    }
}

/// Voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

// =============================================================================
// Geometric Units
// =============================================================================

/// Ground distance in meters (m)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(pub f64);

impl_unit_ops!(Meters, "m");

impl Meters {
    /// Zero meters
    pub const ZERO: Self = Self(0.0);
}

/// Angle in radians
///
/// The natural unit for mathematical operations (sin, cos, etc.).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Radians(pub f64);

impl_unit_ops!(Radians, "rad");

/// Angle in degrees
///
/// Bearings are expressed in degrees clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl_unit_ops!(Degrees, "°");

impl Radians {
    /// Convert to degrees
    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }

    /// Sine of the angle
    #[inline]
    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    /// Cosine of the angle
    #[inline]
    pub fn cos(self) -> f64 {
        self.0.cos()
    }

    /// Zero radians
    pub const ZERO: Self = Self(0.0);

    /// Pi radians (180°)
    pub const PI: Self = Self(std::f64::consts::PI);
}

impl Degrees {
    /// Convert to radians
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }

    /// Wrap into the half-open range (-180, 180].
    #[inline]
    pub fn normalized(self) -> Self {
        let mut d = self.0 % 360.0;
        if d <= -180.0 {
            d += 360.0;
        } else if d > 180.0 {
            d -= 360.0;
        }
        Self(d)
    }

    /// Zero degrees
    pub const ZERO: Self = Self(0.0);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_arithmetic() {
        let d1 = Meters(100.0);
        let d2 = Meters(50.0);

        assert_eq!((d1 + d2).value(), 150.0);
        assert_eq!((d1 - d2).value(), 50.0);
        assert_eq!((-d1).value(), -100.0);
        assert_eq!((d1 * 2.0).value(), 200.0);
        assert_eq!((2.0 * d1).value(), 200.0);
        assert_eq!((d1 / 2.0).value(), 50.0);
        assert_eq!(d1 / d2, 2.0);
    }

    #[test]
    fn test_angle_conversion() {
        let deg = Degrees(180.0);
        let rad = deg.to_radians();

        assert!((rad.value() - std::f64::consts::PI).abs() < 1e-10);
        assert!((rad.to_degrees().value() - 180.0).abs() < 1e-10);
    }

    #[test]
    fn test_degrees_normalized() {
        assert_eq!(Degrees(190.0).normalized().value(), -170.0);
        assert_eq!(Degrees(-180.0).normalized().value(), 180.0);
        assert_eq!(Degrees(540.0).normalized().value(), 180.0);
        assert_eq!(Degrees(45.0).normalized().value(), 45.0);
    }

    #[test]
    fn test_loading_percent() {
        assert_eq!(Amperes(-50.0).loading_percent(Amperes(200.0)), Some(25.0));
        assert_eq!(Amperes(50.0).loading_percent(Amperes(0.0)), None);
    }

    #[test]
    fn test_sum_iterator() {
        let segments = vec![Meters(10.0), Meters(20.0), Meters(30.0)];
        let total: Meters = segments.into_iter().sum();

        assert_eq!(total.value(), 60.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Megawatts(100.0)), "100.0000 MW");
        assert_eq!(format!("{}", Degrees(45.0)), "45.0000 °");
        assert_eq!(format!("{}", Kilovolts(400.0)), "400.0000 kV");
    }
}
