//! Model presets.
//!
//! A preset bundles the per-model scene settings: camera start, backdrop
//! colour, model orientation, point size, the flow program's tunables and
//! snow. Presets are plain JSON; every field is optional and falls back to
//! the defaults below.
//!
//! ```json
//! {
//!     "name": "Polar Bear",
//!     "camera_position": [-10.0, 30.0, 70.0],
//!     "clear_color": "#041615",
//!     "strength": 6.0,
//!     "snow": { "speed": 0.4 }
//! }
//! ```

use std::path::Path;

use glam::{EulerRot, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::PresetError;
use crate::snow::SnowConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPreset {
    pub name: String,
    pub camera_position: [f32; 3],
    /// `#rrggbb`.
    pub clear_color: String,
    /// Euler XYZ, radians.
    pub rotation: [f32; 3],
    pub particle_size: f32,
    pub influence: f32,
    pub strength: f32,
    pub frequency: f32,
    pub snow: SnowConfig,
}

impl Default for ModelPreset {
    fn default() -> Self {
        Self {
            name: "Polar Bear".to_string(),
            camera_position: [-10.0, 30.0, 70.0],
            clear_color: "#041615".to_string(),
            rotation: [0.0, 0.0, 0.0],
            particle_size: 0.4,
            influence: 0.2,
            strength: 4.0,
            frequency: 0.5,
            snow: SnowConfig::default(),
        }
    }
}

impl ModelPreset {
    pub fn from_json_str(json: &str) -> Result<Self, PresetError> {
        let preset: Self = serde_json::from_str(json)?;
        preset.clear_color()?;
        Ok(preset)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PresetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Parsed clear colour, sRGB-encoded `0..1` channels.
    pub fn clear_color(&self) -> Result<Vec3, PresetError> {
        parse_hex_color(&self.clear_color)
    }

    /// Clear colour decoded to linear light, for shading into an sRGB
    /// surface.
    pub fn clear_color_linear(&self) -> Result<Vec3, PresetError> {
        let c = self.clear_color()?;
        Ok(Vec3::new(srgb_to_linear(c.x), srgb_to_linear(c.y), srgb_to_linear(c.z)))
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::from_array(self.camera_position)
    }

    pub fn model_matrix(&self) -> Mat4 {
        let [x, y, z] = self.rotation;
        Mat4::from_euler(EulerRot::XYZ, x, y, z)
    }
}

/// Parse `#rrggbb` (the `#` is optional).
pub fn parse_hex_color(hex: &str) -> Result<Vec3, PresetError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PresetError::Color(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| PresetError::Color(hex.to_string()))
    };
    Ok(Vec3::new(channel(0)?, channel(2)?, channel(4)?))
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_polar_bear() {
        let preset = ModelPreset::default();
        assert_eq!(preset.particle_size, 0.4);
        assert_eq!(preset.snow.count, 20_000);
        assert_eq!(preset.camera_position(), Vec3::new(-10.0, 30.0, 70.0));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let preset = ModelPreset::from_json_str(r#"{ "strength": 6.0, "snow": { "speed": 0.4 } }"#).unwrap();
        assert_eq!(preset.strength, 6.0);
        assert_eq!(preset.influence, 0.2);
        assert_eq!(preset.snow.speed, 0.4);
        assert!(preset.snow.enabled);
    }

    #[test]
    fn test_bad_json_and_color() {
        assert!(matches!(ModelPreset::from_json_str("{"), Err(PresetError::Json(_))));
        assert!(matches!(
            ModelPreset::from_json_str(r#"{ "clear_color": "teal" }"#),
            Err(PresetError::Color(_))
        ));
        assert!(matches!(
            ModelPreset::from_json_file("/nonexistent/preset.json"),
            Err(PresetError::Io(_))
        ));
    }

    #[test]
    fn test_parse_hex_color() {
        let c = parse_hex_color("#ff8000").unwrap();
        assert_eq!(c, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        assert!(parse_hex_color("#ff80").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }
}
