use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One packed grid-point sample: a 16-bit height split across `r`/`g` and a
/// two-channel tangent-plane normal in `b`/`a`.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct HeightNormalSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Height quantization step: decoded heights land on multiples of 1/128.
pub const HEIGHT_STEP: f32 = 1.0 / 128.0;

/// Decode the 16-bit biased height stored in the two most significant
/// channels.
pub fn decode_height(sample: HeightNormalSample) -> f32 {
    (sample.r as f32 * 256.0 + sample.g as f32 - 32768.0) / 128.0
}

/// Encode a height into the two-byte representation. Values outside the
/// representable range (±256 units around zero) clamp to it.
pub fn encode_height(height: f32) -> (u8, u8) {
    let quantized = (height * 128.0 + 32768.0).round().clamp(0.0, 65535.0) as u32;
    ((quantized >> 8) as u8, (quantized & 0xFF) as u8)
}

/// Decode the unit normal from the two remaining channels. The vertical
/// component is reconstructed assuming it is non-negative.
pub fn decode_normal(sample: HeightNormalSample) -> Vec3 {
    let x = -(sample.b as f32 / 255.0 * 2.0 - 1.0);
    let z = sample.a as f32 / 255.0 * 2.0 - 1.0;
    let y = (1.0 - x * x - z * z).max(0.0).sqrt();
    Vec3::new(x, y, z)
}

/// Encode the horizontal normal components into the `b`/`a` channels.
pub fn encode_normal(normal: Vec3) -> (u8, u8) {
    let b = ((1.0 - normal.x) * 0.5 * 255.0).round().clamp(0.0, 255.0) as u8;
    let a = ((normal.z + 1.0) * 0.5 * 255.0).round().clamp(0.0, 255.0) as u8;
    (b, a)
}

impl HeightNormalSample {
    pub fn encode(height: f32, normal: Vec3) -> Self {
        let (r, g) = encode_height(height);
        let (b, a) = encode_normal(normal);
        Self { r, g, b, a }
    }
}
