//! VatMesh binary format (.vatmesh)
//!
//! Static reference-pose mesh shared by every instance playing a baked clip.
//! Vertex `i` of this mesh is column `i` of the frame texture.
//! POD format - no magic bytes.
//!
//! # Layout
//! ```text
//! 0x00: vertex_count u32
//! 0x04: index_count u32
//! 0x08: format u8 (vertex format flags)
//! 0x09: padding (3 bytes)
//! 0x0C: vertex_data (vertex_count * stride, f32 little-endian)
//! var:  index_data (index_count * 4 bytes, u32)
//! ```
//!
//! Vertex layout (in order): Position f32x3 → UV f32x2 → Normal f32x3

use std::io::Write;

use super::FormatError;

/// Vertex format flag: Has UV coordinates (2 floats)
pub const FORMAT_UV: u8 = 1;
/// Vertex format flag: Has normals (3 floats)
pub const FORMAT_NORMAL: u8 = 2;

/// Vertex stride in bytes for a format
#[inline]
pub const fn vertex_stride(format: u8) -> usize {
    let mut stride = 12; // Position: Float32x3

    if format & FORMAT_UV != 0 {
        stride += 8; // UV: Float32x2
    }
    if format & FORMAT_NORMAL != 0 {
        stride += 12; // Normal: Float32x3
    }

    stride
}

/// VatMesh header (12 bytes)
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct VatMeshHeader {
    pub vertex_count: u32,
    pub index_count: u32,
    pub format: u8,
    pub _padding: [u8; 3],
}

impl VatMeshHeader {
    pub const SIZE: usize = 12;

    pub fn new(vertex_count: u32, index_count: u32, format: u8) -> Self {
        Self {
            vertex_count,
            index_count,
            format,
            _padding: [0; 3],
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.index_count.to_le_bytes());
        bytes[8] = self.format;
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            vertex_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            index_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            format: bytes[8],
            _padding: [0; 3],
        })
    }
}

/// Topology of the animated mesh at its reference pose, without skinning data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Vec<u32>,
}

impl StaticMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Format flags for the attributes present on this mesh
    pub fn format(&self) -> u8 {
        let mut format = 0u8;
        if self.uvs.is_some() {
            format |= FORMAT_UV;
        }
        if self.normals.is_some() {
            format |= FORMAT_NORMAL;
        }
        format
    }

    /// Write a complete VatMesh file
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), FormatError> {
        let vertex_count = self.positions.len();
        if let Some(uvs) = self.uvs.as_ref().filter(|uvs| uvs.len() != vertex_count) {
            return Err(FormatError::Invalid(format!(
                "mesh: {} UVs for {} vertices",
                uvs.len(),
                vertex_count
            )));
        }
        if let Some(normals) = self.normals.as_ref().filter(|n| n.len() != vertex_count) {
            return Err(FormatError::Invalid(format!(
                "mesh: {} normals for {} vertices",
                normals.len(),
                vertex_count
            )));
        }
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(FormatError::Invalid(format!(
                "mesh: index {} out of range for {} vertices",
                index, vertex_count
            )));
        }

        let format = self.format();
        let header = VatMeshHeader::new(
            header_count("vertices", vertex_count)?,
            header_count("indices", self.indices.len())?,
            format,
        );
        w.write_all(&header.to_bytes())?;

        let mut data = Vec::with_capacity(vertex_count * vertex_stride(format));
        for i in 0..vertex_count {
            push_floats(&mut data, &self.positions[i]);
            if let Some(uvs) = &self.uvs {
                push_floats(&mut data, &uvs[i]);
            }
            if let Some(normals) = &self.normals {
                push_floats(&mut data, &normals[i]);
            }
        }
        w.write_all(&data)?;

        for index in &self.indices {
            w.write_all(&index.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Parse a complete VatMesh file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let header = VatMeshHeader::from_bytes(bytes).ok_or(FormatError::Truncated {
            what: "mesh header",
            expected: VatMeshHeader::SIZE,
            actual: bytes.len(),
        })?;

        let vertex_count = header.vertex_count as usize;
        let index_count = header.index_count as usize;
        let stride = vertex_stride(header.format);
        let expected = VatMeshHeader::SIZE + vertex_count * stride + index_count * 4;
        if bytes.len() < expected {
            return Err(FormatError::Truncated {
                what: "mesh",
                expected,
                actual: bytes.len(),
            });
        }

        let mut cursor = FloatCursor::new(&bytes[VatMeshHeader::SIZE..]);
        let has_uv = header.format & FORMAT_UV != 0;
        let has_normal = header.format & FORMAT_NORMAL != 0;

        let mut positions = Vec::with_capacity(vertex_count);
        let mut uvs = has_uv.then(|| Vec::with_capacity(vertex_count));
        let mut normals = has_normal.then(|| Vec::with_capacity(vertex_count));
        for _ in 0..vertex_count {
            positions.push([cursor.next(), cursor.next(), cursor.next()]);
            if let Some(uvs) = uvs.as_mut() {
                uvs.push([cursor.next(), cursor.next()]);
            }
            if let Some(normals) = normals.as_mut() {
                normals.push([cursor.next(), cursor.next(), cursor.next()]);
            }
        }

        let index_start = VatMeshHeader::SIZE + vertex_count * stride;
        let indices = bytes[index_start..index_start + index_count * 4]
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self {
            positions,
            uvs,
            normals,
            indices,
        })
    }
}

fn push_floats(data: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        data.extend_from_slice(&value.to_le_bytes());
    }
}

/// Sequential little-endian f32 reader over a length-checked slice
struct FloatCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FloatCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn next(&mut self) -> f32 {
        let b = &self.bytes[self.offset..self.offset + 4];
        self.offset += 4;
        f32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }
}

/// Count stored in a `u32` header field
fn header_count(what: &str, count: usize) -> Result<u32, FormatError> {
    u32::try_from(count)
        .map_err(|_| FormatError::Invalid(format!("mesh: {} {} do not fit a u32 header", count, what)))
}
