//! Texel packing utilities
//!
//! Provides functions to convert normalized f32 texels to storage formats:
//! - f32 → unorm16 (unsigned normalized, 0.0 to 1.0) for 16-bit PNG
//! - f32 → f16 (IEEE 754 half-float) for `.vattex`
//!
//! Used by both `vat-export` (baker) and runtime decoders.

use half::f16;

/// Largest encoding error of a `[0, 1]` value stored as unorm16.
pub const UNORM16_EPSILON: f32 = 0.5 / u16::MAX as f32;

/// Largest encoding error of a `[0, 1]` value stored as f16 (half ULP at 1.0).
pub const F16_EPSILON: f32 = 1.0 / 2048.0;

/// Pack a `[0, 1]` value to unorm16 (values outside are clamped)
#[inline]
pub fn pack_unorm16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

#[inline]
pub fn unpack_unorm16(value: u16) -> f32 {
    value as f32 / u16::MAX as f32
}

/// Pack an RGBA texel to unorm16x4
#[inline]
pub fn pack_texel_unorm16(texel: [f32; 4]) -> [u16; 4] {
    texel.map(pack_unorm16)
}

#[inline]
pub fn unpack_texel_unorm16(texel: [u16; 4]) -> [f32; 4] {
    texel.map(unpack_unorm16)
}

/// Pack an RGBA texel to f16x4
#[inline]
pub fn pack_texel_f16(texel: [f32; 4]) -> [f16; 4] {
    texel.map(f16::from_f32)
}

#[inline]
pub fn unpack_texel_f16(texel: [f16; 4]) -> [f32; 4] {
    texel.map(f16::to_f32)
}
