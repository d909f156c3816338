//! Encoded frame texture (.png / .vattex)
//!
//! Width is the vertex count, height is the frame count. Texel `(v, f)`
//! holds the normalized position of vertex `v` at frame `f` in RGB and a
//! constant `1.0` in alpha. Row 0 is frame 0.
//!
//! Two containers are supported:
//! - [`TextureEncoding::Png16`]: standard lossless 16-bit RGBA PNG (unorm16)
//! - [`TextureEncoding::RgbaF16`]: POD half-float file, no magic bytes
//!
//! # `.vattex` layout
//! ```text
//! 0x00: width u32
//! 0x04: height u32
//! 0x08: texel_data (width × height × 4 × f16, little-endian, row-major)
//! ```

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use half::f16;
use serde::{Deserialize, Serialize};

use super::FormatError;
use crate::packing::{pack_texel_f16, pack_texel_unorm16, unpack_texel_f16, unpack_texel_unorm16};

/// Storage encoding of the frame texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureEncoding {
    /// 16-bit unsigned normalized RGBA PNG
    #[default]
    #[serde(rename = "png16")]
    Png16,

    /// Half-float RGBA in a `.vattex` file
    #[serde(rename = "f16")]
    RgbaF16,
}

impl TextureEncoding {
    pub fn extension(&self) -> &'static str {
        match self {
            TextureEncoding::Png16 => "png",
            TextureEncoding::RgbaF16 => "vattex",
        }
    }

    /// Largest absolute error of a normalized channel after encoding
    pub fn precision(&self) -> f32 {
        match self {
            TextureEncoding::Png16 => crate::packing::UNORM16_EPSILON,
            TextureEncoding::RgbaF16 => crate::packing::F16_EPSILON,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextureEncoding::Png16 => "png16",
            TextureEncoding::RgbaF16 => "f16",
        }
    }
}

impl fmt::Display for TextureEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextureEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png16" | "png" => Ok(TextureEncoding::Png16),
            "f16" | "half" | "vattex" => Ok(TextureEncoding::RgbaF16),
            other => Err(format!(
                "unknown texture encoding '{}' (use png16 or f16)",
                other
            )),
        }
    }
}

/// VatTexture header (8 bytes)
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct VatTextureHeader {
    pub width: u32,
    pub height: u32,
}

impl VatTextureHeader {
    pub const SIZE: usize = 8;

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size of the texel data following the header, `None` if it
    /// overflows `usize`
    pub fn data_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(4 * 2)
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.width.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            width: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            height: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

/// Grid of normalized positions, `width = vertex count`, `height = frame count`
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrameTexture {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl EncodedFrameTexture {
    /// Alpha written to every texel
    pub const ALPHA: f32 = 1.0;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![[0.0, 0.0, 0.0, Self::ALPHA]; width as usize * height as usize],
        }
    }

    pub fn from_texels(width: u32, height: u32, texels: Vec<[f32; 4]>) -> Result<Self, FormatError> {
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(FormatError::Invalid(format!(
                "texture: {} texels for {}x{}",
                texels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn vertex_count(&self) -> usize {
        self.width as usize
    }

    pub fn frame_count(&self) -> usize {
        self.height as usize
    }

    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    #[inline]
    fn index(&self, vertex: usize, frame: usize) -> usize {
        debug_assert!(vertex < self.width as usize && frame < self.height as usize);
        frame * self.width as usize + vertex
    }

    /// Store a normalized position at (vertex, frame)
    #[inline]
    pub fn set(&mut self, vertex: usize, frame: usize, normalized: [f32; 3]) {
        let index = self.index(vertex, frame);
        self.texels[index] = [normalized[0], normalized[1], normalized[2], Self::ALPHA];
    }

    #[inline]
    pub fn get(&self, vertex: usize, frame: usize) -> [f32; 4] {
        self.texels[self.index(vertex, frame)]
    }

    /// All texels of one frame, in vertex order
    pub fn row(&self, frame: usize) -> &[[f32; 4]] {
        let start = frame * self.width as usize;
        &self.texels[start..start + self.width as usize]
    }

    pub fn encode(&self, encoding: TextureEncoding) -> Result<Vec<u8>, FormatError> {
        match encoding {
            TextureEncoding::Png16 => self.to_png16(),
            TextureEncoding::RgbaF16 => Ok(self.to_f16_bytes()),
        }
    }

    pub fn decode(encoding: TextureEncoding, bytes: &[u8]) -> Result<Self, FormatError> {
        match encoding {
            TextureEncoding::Png16 => Self::from_png16(bytes),
            TextureEncoding::RgbaF16 => Self::from_f16_bytes(bytes),
        }
    }

    /// Encode as a 16-bit RGBA PNG
    pub fn to_png16(&self) -> Result<Vec<u8>, FormatError> {
        let raw: Vec<u16> = self
            .texels
            .iter()
            .flat_map(|&texel| pack_texel_unorm16(texel))
            .collect();
        let buffer = image::ImageBuffer::<image::Rgba<u16>, Vec<u16>>::from_raw(
            self.width,
            self.height,
            raw,
        )
        .ok_or_else(|| FormatError::Invalid(format!("texture: {}x{}", self.width, self.height)))?;

        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba16(buffer).write_to(&mut out, image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    pub fn from_png16(bytes: &[u8]) -> Result<Self, FormatError> {
        let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?;
        if image.color() != image::ColorType::Rgba16 {
            tracing::warn!(
                "VAT texture is {:?}, expected Rgba16; precision may be reduced",
                image.color()
            );
        }
        let rgba = image.to_rgba16();
        let (width, height) = rgba.dimensions();
        let texels = rgba
            .pixels()
            .map(|pixel| unpack_texel_unorm16(pixel.0))
            .collect();
        Self::from_texels(width, height, texels)
    }

    /// Encode as a `.vattex` half-float file
    pub fn to_f16_bytes(&self) -> Vec<u8> {
        let header = VatTextureHeader::new(self.width, self.height);
        let mut bytes = Vec::with_capacity(VatTextureHeader::SIZE + self.texels.len() * 4 * 2);
        bytes.extend_from_slice(&header.to_bytes());
        for &texel in &self.texels {
            for channel in pack_texel_f16(texel) {
                bytes.extend_from_slice(&channel.to_le_bytes());
            }
        }
        bytes
    }

    pub fn from_f16_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let header = VatTextureHeader::from_bytes(bytes).ok_or(FormatError::Truncated {
            what: "texture header",
            expected: VatTextureHeader::SIZE,
            actual: bytes.len(),
        })?;
        let expected = header
            .data_size()
            .and_then(|size| size.checked_add(VatTextureHeader::SIZE))
            .ok_or_else(|| {
                FormatError::Invalid(format!(
                    "texture: {}x{} header is too large",
                    header.width, header.height
                ))
            })?;
        if bytes.len() < expected {
            return Err(FormatError::Truncated {
                what: "texture",
                expected,
                actual: bytes.len(),
            });
        }

        let texels = bytes[VatTextureHeader::SIZE..expected]
            .chunks_exact(8)
            .map(|c| {
                unpack_texel_f16([
                    f16::from_le_bytes([c[0], c[1]]),
                    f16::from_le_bytes([c[2], c[3]]),
                    f16::from_le_bytes([c[4], c[5]]),
                    f16::from_le_bytes([c[6], c[7]]),
                ])
            })
            .collect();
        Self::from_texels(header.width, header.height, texels)
    }
}
