//! Galaxy parameters and the field table the debug panel binds to.
//!
//! [`GalaxyParams`] is the single record the host owns. Every edit arrives
//! as a [`ParamUpdate`] and is applied in place; ranges live in
//! [`ParamName::range`] so the panel and tests agree on the domain.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::error::ColorParseError;

/// Linear-space RGB color.
///
/// Hex strings are read as sRGB and linearized, so interpolation between two
/// colors happens in linear space and the sRGB surface re-encodes the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    /// Create a color from linear components.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.trim().trim_start_matches('#');
        if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ColorParseError::InvalidDigit(c));
        }

        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).unwrap_or(0);
        let [r, g, b] = match digits.len() {
            6 => {
                let byte = |i: usize| nibble(i) * 16 + nibble(i + 1);
                [byte(0), byte(2), byte(4)]
            }
            3 => [nibble(0) * 17, nibble(1) * 17, nibble(2) * 17],
            n => return Err(ColorParseError::InvalidLength(n)),
        };

        Ok(Self::from_srgb_u8([r, g, b]))
    }

    /// Convert 8-bit sRGB components to a linear color.
    pub fn from_srgb_u8(rgb: [u8; 3]) -> Self {
        let lin = |c: u8| srgb_to_linear(c as f32 / 255.0);
        Self::new(lin(rgb[0]), lin(rgb[1]), lin(rgb[2]))
    }

    /// 8-bit sRGB components, for swatches and hex output.
    pub fn to_srgb_u8(self) -> [u8; 3] {
        let enc = |c: f32| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round() as u8;
        [enc(self.r), enc(self.g), enc(self.b)]
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_srgb_u8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// Linear interpolation towards `other` by `t`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color::from(self.to_vec3().lerp(other.to_vec3(), t))
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

impl From<Vec3> for Color {
    fn from(v: Vec3) -> Self {
        Color::new(v.x, v.y, v.z)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Parameters shaping the generated galaxy.
#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyParams {
    /// Number of points.
    pub count: u32,
    /// Rendered point size in world units.
    pub size: f32,
    /// Maximum galaxy radius.
    pub radius: f32,
    /// Number of spiral arms.
    pub branches: u32,
    /// Radians of twist per unit of radius.
    pub spin: f32,
    /// Jitter scale. Stored and editable, but the placement formula does not
    /// read it: jitter magnitude depends on `power` alone.
    pub randomness: f32,
    /// Exponent pulling jitter towards zero. Higher is tighter arms.
    pub power: f32,
    /// Color at the center.
    pub inside_color: Color,
    /// Color at `radius`.
    pub outside_color: Color,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            count: 20_000,
            size: 0.02,
            radius: 5.0,
            branches: 6,
            spin: 1.0,
            randomness: 0.2,
            power: 5.0,
            inside_color: Color::from_srgb_u8([0xff, 0x60, 0x30]),
            outside_color: Color::from_srgb_u8([0x1b, 0x39, 0x84]),
        }
    }
}

impl GalaxyParams {
    /// Apply a single field edit in place.
    ///
    /// Values are taken as given; range enforcement is the caller's job.
    pub fn apply(&mut self, update: ParamUpdate) {
        match update {
            ParamUpdate::Count(v) => self.count = v,
            ParamUpdate::Size(v) => self.size = v,
            ParamUpdate::Radius(v) => self.radius = v,
            ParamUpdate::Branches(v) => self.branches = v,
            ParamUpdate::Spin(v) => self.spin = v,
            ParamUpdate::Randomness(v) => self.randomness = v,
            ParamUpdate::Power(v) => self.power = v,
            ParamUpdate::InsideColor(c) => self.inside_color = c,
            ParamUpdate::OutsideColor(c) => self.outside_color = c,
        }
    }
}

/// One committed edit to a [`GalaxyParams`] field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamUpdate {
    Count(u32),
    Size(f32),
    Radius(f32),
    Branches(u32),
    Spin(f32),
    Randomness(f32),
    Power(f32),
    InsideColor(Color),
    OutsideColor(Color),
}

impl ParamUpdate {
    /// The field this update targets.
    pub fn name(&self) -> ParamName {
        match self {
            ParamUpdate::Count(_) => ParamName::Count,
            ParamUpdate::Size(_) => ParamName::Size,
            ParamUpdate::Radius(_) => ParamName::Radius,
            ParamUpdate::Branches(_) => ParamName::Branches,
            ParamUpdate::Spin(_) => ParamName::Spin,
            ParamUpdate::Randomness(_) => ParamName::Randomness,
            ParamUpdate::Power(_) => ParamName::Power,
            ParamUpdate::InsideColor(_) => ParamName::InsideColor,
            ParamUpdate::OutsideColor(_) => ParamName::OutsideColor,
        }
    }
}

/// Field identifiers, in panel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamName {
    Count,
    Size,
    Radius,
    Branches,
    Spin,
    Randomness,
    Power,
    InsideColor,
    OutsideColor,
}

impl ParamName {
    pub const ALL: [ParamName; 9] = [
        ParamName::Count,
        ParamName::Size,
        ParamName::Radius,
        ParamName::Branches,
        ParamName::Spin,
        ParamName::Randomness,
        ParamName::Power,
        ParamName::InsideColor,
        ParamName::OutsideColor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Count => "count",
            ParamName::Size => "size",
            ParamName::Radius => "radius",
            ParamName::Branches => "branches",
            ParamName::Spin => "spin",
            ParamName::Randomness => "randomness",
            ParamName::Power => "power",
            ParamName::InsideColor => "inside_color",
            ParamName::OutsideColor => "outside_color",
        }
    }

    /// Numeric range and step for slider fields, `None` for colors.
    pub fn range(self) -> Option<ParamRange> {
        let (min, max, step) = match self {
            ParamName::Count => (100.0, 100_000.0, 100.0),
            ParamName::Size => (0.001, 0.1, 0.001),
            ParamName::Radius => (0.01, 20.0, 0.01),
            ParamName::Branches => (2.0, 20.0, 1.0),
            ParamName::Spin => (-5.0, 5.0, 0.001),
            ParamName::Randomness => (0.0, 2.0, 0.001),
            ParamName::Power => (1.0, 10.0, 0.001),
            ParamName::InsideColor | ParamName::OutsideColor => return None,
        };
        Some(ParamRange { min, max, step })
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive numeric domain of a slider field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamRange {
    /// Round to the nearest step, then clamp into `[min, max]`.
    pub fn snap(&self, value: f64) -> f64 {
        let stepped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        stepped.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_hex() {
        let c = Color::from_hex("#ff0000").unwrap();
        assert_eq!(c, Color::new(1.0, 0.0, 0.0));
        assert_eq!(Color::from_hex("0000ff").unwrap(), Color::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_parse_short_hex_matches_long() {
        assert_eq!(Color::from_hex("#f60").unwrap(), Color::from_hex("#ff6600").unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Color::from_hex("#ff00"), Err(ColorParseError::InvalidLength(4)));
        assert_eq!(Color::from_hex("#gg0000"), Err(ColorParseError::InvalidDigit('g')));
        assert_eq!(Color::from_hex(""), Err(ColorParseError::InvalidLength(0)));
    }

    #[test]
    fn test_hex_survives_linearization() {
        for hex in ["#ff6030", "#1b3984", "#000000", "#ffffff", "#7f7f7f"] {
            let c: Color = hex.parse().unwrap();
            assert_eq!(c.to_hex(), hex);
        }
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Color::new(1.0, 0.0, 0.0);
        let b = Color::new(0.0, 0.0, 1.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        let mid = a.lerp(b, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_defaults_within_ranges() {
        let p = GalaxyParams::default();
        let checks = [
            (ParamName::Count, p.count as f64),
            (ParamName::Size, p.size as f64),
            (ParamName::Radius, p.radius as f64),
            (ParamName::Branches, p.branches as f64),
            (ParamName::Spin, p.spin as f64),
            (ParamName::Randomness, p.randomness as f64),
            (ParamName::Power, p.power as f64),
        ];
        for (name, value) in checks {
            let range = name.range().unwrap();
            assert!(
                value >= range.min && value <= range.max,
                "{} default {} out of range",
                name,
                value
            );
        }
        assert_eq!(p.inside_color.to_hex(), "#ff6030");
        assert_eq!(p.outside_color.to_hex(), "#1b3984");
    }

    #[test]
    fn test_colors_have_no_range() {
        assert!(ParamName::InsideColor.range().is_none());
        assert!(ParamName::OutsideColor.range().is_none());
        assert_eq!(ParamName::ALL.iter().filter(|n| n.range().is_some()).count(), 7);
    }

    #[test]
    fn test_snap_rounds_then_clamps() {
        let count = ParamName::Count.range().unwrap();
        assert_eq!(count.snap(12_345.0), 12_300.0);
        assert_eq!(count.snap(10.0), 100.0);
        assert_eq!(count.snap(1e9), 100_000.0);

        let branches = ParamName::Branches.range().unwrap();
        assert_eq!(branches.snap(3.6), 4.0);
    }

    #[test]
    fn test_apply_touches_only_named_field() {
        let mut p = GalaxyParams::default();
        let before = p.clone();
        p.apply(ParamUpdate::Spin(-2.5));
        assert_eq!(p.spin, -2.5);
        assert_eq!(GalaxyParams { spin: before.spin, ..p.clone() }, before);

        p.apply(ParamUpdate::OutsideColor(Color::WHITE));
        assert_eq!(p.outside_color, Color::WHITE);
    }

    #[test]
    fn test_update_names() {
        assert_eq!(ParamUpdate::Count(5).name(), ParamName::Count);
        assert_eq!(ParamUpdate::InsideColor(Color::BLACK).name().as_str(), "inside_color");
    }
}
