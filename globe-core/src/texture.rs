/// Color maps and the PPM (netpbm P3/P6) decoder
use std::collections::HashMap;
use std::path::Path;

use nalgebra::Vector2;
use nom::{
    branch::alt,
    bytes::complete::{tag, take},
    character::complete::{char, multispace1, not_line_ending, one_of, u32 as decimal},
    combinator::value,
    multi::{many1_count, many_m_n},
    sequence::{pair, preceded},
    IResult,
};

use crate::error::TextureError;
use crate::material::Color;

/// An RGB image sampled with nearest-neighbour lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Texture {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Dimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::Truncated {
                expected,
                found: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from tightly packed RGBA bytes; alpha is ignored
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureError::BufferSize {
                expected,
                found: rgba.len(),
            });
        }
        let pixels = rgba
            .chunks_exact(4)
            .map(|px| Color::new(px[0], px[1], px[2]))
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        self.pixels[y * self.width as usize + x]
    }

    /// Sample at texture coordinate `uv`, clamped to the edges.
    ///
    /// `v = 1` is the top row of the image.
    pub fn sample(&self, uv: Vector2<f32>) -> Color {
        let u = uv.x.clamp(0.0, 1.0);
        let v = uv.y.clamp(0.0, 1.0);
        let x = (u * self.width as f32) as u32;
        let y = ((1.0 - v) * self.height as f32) as u32;
        self.pixel(x, y)
    }
}

/// Decoded textures keyed by the name materials refer to them by
#[derive(Debug, Clone, Default)]
pub struct TextureStore {
    textures: HashMap<String, Texture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, texture: Texture) {
        self.textures.insert(name.into(), texture);
    }

    pub fn get(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Read and decode a PPM file
pub fn load_ppm(path: impl AsRef<Path>) -> Result<Texture, TextureError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| TextureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_ppm(&data)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PpmFormat {
    Ascii,
    Binary,
}

#[derive(Debug)]
struct PpmHeader {
    format: PpmFormat,
    width: u32,
    height: u32,
    max_value: u32,
}

/// Decode an ASCII (`P3`) or binary (`P6`) PPM image
pub fn parse_ppm(data: &[u8]) -> Result<Texture, TextureError> {
    if !(data.starts_with(b"P3") || data.starts_with(b"P6")) {
        return Err(TextureError::UnsupportedFormat);
    }

    let (body, header) =
        parse_header(data).map_err(|e| TextureError::Header(format!("{:?}", e)))?;

    if header.width == 0 || header.height == 0 {
        return Err(TextureError::Dimensions {
            width: header.width,
            height: header.height,
        });
    }
    if header.max_value == 0 || header.max_value > 65535 {
        return Err(TextureError::Header(format!(
            "max value {} out of range",
            header.max_value
        )));
    }

    let expected = header.width as usize * header.height as usize * 3;
    let samples = match header.format {
        PpmFormat::Ascii => ascii_samples(body, expected)?,
        PpmFormat::Binary => binary_samples(body, expected, header.max_value)?,
    };

    let scale = |s: u32| (s.min(header.max_value) * 255 / header.max_value) as u8;
    let pixels = samples
        .chunks_exact(3)
        .map(|rgb| Color::new(scale(rgb[0]), scale(rgb[1]), scale(rgb[2])))
        .collect();

    Texture::new(header.width, header.height, pixels)
}

/// Reads at most `expected` samples; anything after them is ignored, as
/// with trailing bytes in binary data
fn ascii_samples(body: &[u8], expected: usize) -> Result<Vec<u32>, TextureError> {
    let (_, samples) = many_m_n(0, expected, preceded(separator, decimal))(body)
        .map_err(|e: nom::Err<nom::error::Error<&[u8]>>| TextureError::Header(format!("{:?}", e)))?;
    if samples.len() < expected {
        return Err(TextureError::Truncated {
            expected,
            found: samples.len(),
        });
    }
    Ok(samples)
}

fn binary_samples(body: &[u8], expected: usize, max_value: u32) -> Result<Vec<u32>, TextureError> {
    let width = if max_value > 255 { 2 } else { 1 };
    let found = body.len() / width;
    if found < expected {
        return Err(TextureError::Truncated { expected, found });
    }

    let (_, raw) = take::<_, _, nom::error::Error<&[u8]>>(expected * width)(body)
        .map_err(|e| TextureError::Header(format!("{:?}", e)))?;
    let samples = if width == 2 {
        raw.chunks_exact(2)
            .map(|s| u32::from(u16::from_be_bytes([s[0], s[1]])))
            .collect()
    } else {
        raw.iter().map(|&s| u32::from(s)).collect()
    };
    Ok(samples)
}

fn parse_header(input: &[u8]) -> IResult<&[u8], PpmHeader> {
    let (input, format) = alt((
        value(PpmFormat::Ascii, tag("P3")),
        value(PpmFormat::Binary, tag("P6")),
    ))(input)?;
    let (input, width) = preceded(separator, decimal)(input)?;
    let (input, height) = preceded(separator, decimal)(input)?;
    let (input, max_value) = preceded(separator, decimal)(input)?;

    // Binary data starts right after exactly one whitespace byte
    let input = match format {
        PpmFormat::Binary => one_of(" \t\r\n")(input)?.0,
        PpmFormat::Ascii => input,
    };

    Ok((
        input,
        PpmHeader {
            format,
            width,
            height,
            max_value,
        },
    ))
}

/// Whitespace and `#` comments between header tokens
fn separator(input: &[u8]) -> IResult<&[u8], ()> {
    value(
        (),
        many1_count(alt((
            value((), multispace1),
            value((), pair(char('#'), not_line_ending)),
        ))),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ascii_ppm() {
        let data = b"P3\n# equirect\n2 1\n255\n255 0 0  0 0 255\n";
        let texture = parse_ppm(data).unwrap();
        assert_eq!(texture.width(), 2);
        assert_eq!(texture.height(), 1);
        assert_eq!(texture.pixel(0, 0), Color::new(255, 0, 0));
        assert_eq!(texture.pixel(1, 0), Color::new(0, 0, 255));
    }

    #[test]
    fn test_parse_binary_ppm() {
        let mut data = b"P6 1 2 255\n".to_vec();
        data.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
        let texture = parse_ppm(&data).unwrap();
        assert_eq!(texture.pixel(0, 0), Color::new(10, 20, 30));
        assert_eq!(texture.pixel(0, 1), Color::new(40, 50, 60));
    }

    #[test]
    fn test_binary_data_may_start_with_whitespace_byte() {
        let mut data = b"P6\n1 1\n255\n".to_vec();
        data.extend_from_slice(&[b'\n', b' ', 7]);
        let texture = parse_ppm(&data).unwrap();
        assert_eq!(texture.pixel(0, 0), Color::new(b'\n', b' ', 7));
    }

    #[test]
    fn test_scales_max_value() {
        let data = b"P3 1 1 15 15 0 5";
        let texture = parse_ppm(data).unwrap();
        assert_eq!(texture.pixel(0, 0), Color::new(255, 0, 85));
    }

    #[test]
    fn test_sixteen_bit_samples() {
        let mut data = b"P6 1 1 65535\n".to_vec();
        data.extend_from_slice(&[0xff, 0xff, 0x00, 0x00, 0x80, 0x00]);
        let texture = parse_ppm(&data).unwrap();
        assert_eq!(texture.pixel(0, 0), Color::new(255, 0, 127));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(parse_ppm(b"GIF89a"), Err(TextureError::UnsupportedFormat)));
        assert!(matches!(parse_ppm(b"P3 x 1 255"), Err(TextureError::Header(_))));
        assert!(matches!(
            parse_ppm(b"P3 0 1 255"),
            Err(TextureError::Dimensions { .. })
        ));
        assert!(matches!(
            parse_ppm(b"P3 2 1 255 1 2 3"),
            Err(TextureError::Truncated { expected: 6, found: 3 })
        ));
        assert!(matches!(
            parse_ppm(b"P6 2 2 255\n\x01\x02"),
            Err(TextureError::Truncated { .. })
        ));
    }

    #[test]
    fn test_extra_samples_are_ignored() {
        let texture = parse_ppm(b"P3 1 1 255 10 20 30 40 50 60\n").unwrap();
        assert_eq!(texture.pixel(0, 0), Color::new(10, 20, 30));

        let texture = parse_ppm(b"P6 1 1 255\n\x0a\x14\x1e\xff\xff").unwrap();
        assert_eq!(texture.pixel(0, 0), Color::new(10, 20, 30));
    }

    #[test]
    fn test_sample_orientation() {
        // Top row red, bottom row blue
        let texture = Texture::new(
            1,
            2,
            vec![Color::new(255, 0, 0), Color::new(0, 0, 255)],
        )
        .unwrap();
        assert_eq!(texture.sample(Vector2::new(0.5, 1.0)), Color::new(255, 0, 0));
        assert_eq!(texture.sample(Vector2::new(0.5, 0.0)), Color::new(0, 0, 255));
        assert_eq!(texture.sample(Vector2::new(2.0, -1.0)), Color::new(0, 0, 255));
    }

    #[test]
    fn test_from_rgba() {
        let texture = Texture::from_rgba(1, 1, &[1, 2, 3, 255]).unwrap();
        assert_eq!(texture.pixel(0, 0), Color::new(1, 2, 3));
        assert!(matches!(
            Texture::from_rgba(2, 1, &[0; 4]),
            Err(TextureError::BufferSize { expected: 8, found: 4 })
        ));
    }

    #[test]
    fn test_store_lookup() {
        let mut store = TextureStore::new();
        assert!(store.is_empty());
        store.insert("earth", Texture::new(1, 1, vec![Color::WHITE]).unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.get("earth").is_some());
        assert!(store.get("moon").is_none());
    }
}
