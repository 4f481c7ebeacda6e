/// Unlit surface appearance
use serde::{Deserialize, Serialize};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::from_hex(0xffffff);
    pub const BLACK: Color = Color::from_hex(0x000000);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a `0xRRGGBB` literal
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Channel-wise product, used to tint texture samples by material color
    pub fn modulate(self, other: Color) -> Color {
        let mul = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
        Color::new(mul(self.r, other.r), mul(self.g, other.g), mul(self.b, other.b))
    }

    /// `self` composited over `dst` with coverage `alpha` in `[0, 1]`
    pub fn blend_over(self, dst: Color, alpha: f32) -> Color {
        let alpha = alpha.clamp(0.0, 1.0);
        let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
        Color::new(mix(self.r, dst.r), mix(self.g, dst.g), mix(self.b, dst.b))
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Color::from_hex(hex)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Basic (lighting-independent) material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    /// Draw triangle edges instead of filled faces
    pub wireframe: bool,
    /// Blend with what is already drawn using `opacity`
    pub transparent: bool,
    pub opacity: f32,
    /// Equirectangular color map, resolved by name at render time
    pub map: Option<String>,
}

impl Material {
    pub fn wireframe(color: Color) -> Self {
        Self {
            color,
            wireframe: true,
            ..Self::default()
        }
    }

    pub fn textured(map: impl Into<String>) -> Self {
        Self {
            map: Some(map.into()),
            ..Self::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.transparent = true;
        self.opacity = opacity;
        self
    }

    /// Coverage used when compositing this material
    pub fn alpha(&self) -> f32 {
        if self.transparent {
            self.opacity
        } else {
            1.0
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            wireframe: false,
            transparent: false,
            opacity: 1.0,
            map: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let color = Color::from_hex(0x14bdeb);
        assert_eq!(color, Color::new(0x14, 0xbd, 0xeb));
        assert_eq!(color.to_hex(), 0x14bdeb);
    }

    #[test]
    fn test_blend_half() {
        let blended = Color::WHITE.blend_over(Color::BLACK, 0.5);
        assert_eq!(blended, Color::new(128, 128, 128));
        assert_eq!(Color::WHITE.blend_over(Color::BLACK, 1.0), Color::WHITE);
    }

    #[test]
    fn test_modulate_white_is_identity() {
        let color = Color::from_hex(0x336699);
        assert_eq!(color.modulate(Color::WHITE), color);
        assert_eq!(color.modulate(Color::BLACK), Color::BLACK);
    }

    #[test]
    fn test_opaque_alpha_ignores_opacity() {
        let mut material = Material::wireframe(Color::from_hex(0x00ff00));
        material.opacity = 0.2;
        assert_eq!(material.alpha(), 1.0);
        assert_eq!(material.with_opacity(0.5).alpha(), 0.5);
    }
}
