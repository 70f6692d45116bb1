use std::collections::BTreeMap;

use glam::Vec4;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, LayerCountError, Result};
use crate::level::reader::ByteReader;
use crate::level::read_lightmap_block;
use crate::terrain::layers::MAX_LAYERS;
use crate::terrain::LandscapeCell;

/// Landscape layer table, keyed by the global layer identifier that cells
/// reference through their `layer_indices`.
pub type LayerTable = BTreeMap<i32, LayerDesc>;

/// Blend-layer description from the landscape layer table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDesc {
    pub tiling: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub specular: f32,
    pub base_map: String,
    pub normal_map: String,
}

/// The landscape section of a level: layer table plus all terrain cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landscape {
    pub name: String,
    pub location: glam::Vec3,
    pub scale: glam::Vec3,
    /// Landscape-level lightmap UV transform derived from the lighting
    /// resolution; cell UV params are pre-composed with it during decode.
    pub lightmap_scale_bias: Vec4,
    /// Grid points per cell side.
    pub grid_size: usize,
    pub layers: LayerTable,
    pub cells: Vec<LandscapeCell>,
}

pub(crate) fn read_landscape(r: &mut ByteReader, grid_size: usize) -> Result<Landscape> {
    let lighting_resolution = r.read_f32("landscape lighting resolution")?;
    let name = r.read_string("landscape name")?;
    let location = r.read_vec3("landscape location")?;
    let scale = r.read_vec3("landscape scale")?;

    let layer_count = r.read_i32("landscape layer count")?.max(0) as usize;
    let mut layers = LayerTable::new();
    for _ in 0..layer_count {
        let index = r.read_i32("layer index")?;
        let desc = LayerDesc {
            tiling: r.read_f32("layer tiling")?,
            yaw: r.read_f32("layer yaw")?,
            pitch: r.read_f32("layer pitch")?,
            specular: r.read_f32("layer specular")?,
            base_map: r.read_string("layer base map")?,
            normal_map: r.read_string("layer normal map")?,
        };
        layers.insert(index, desc);
    }

    let scale_bias = lightmap_scale_bias(lighting_resolution, grid_size);

    let cell_count = r.read_i32("landscape cell count")?.max(0) as usize;
    let mut cells = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        cells.push(read_cell(r, grid_size, scale_bias)?);
    }

    info!(
        "decoded landscape '{}': {} layers, {} cells of {}x{} points",
        name,
        layers.len(),
        cells.len(),
        grid_size,
        grid_size
    );

    Ok(Landscape {
        name,
        location,
        scale,
        lightmap_scale_bias: scale_bias,
        grid_size,
        layers,
        cells,
    })
}

fn read_cell(r: &mut ByteReader, grid_size: usize, scale_bias: Vec4) -> Result<LandscapeCell> {
    let x = r.read_i32("cell x")?;
    let y = r.read_i32("cell y")?;

    let lightmap = if r.read_i32("cell lightmap flag")? != 0 {
        let mut block = read_lightmap_block(r)?;
        // The stored scale/bias is relative to the landscape-level transform.
        let sb = block.uv_scale_bias;
        block.uv_scale_bias = Vec4::new(
            sb.x * scale_bias.x,
            sb.y * scale_bias.y,
            sb.x * scale_bias.z + sb.z,
            sb.y * scale_bias.w + sb.w,
        );
        Some(block)
    } else {
        None
    };

    let penumbra = if r.read_i32("cell shadow flag")? != 0 {
        r.read_vec4("cell shadow penumbra")?
    } else {
        Vec4::ONE
    };

    let mut samples = Vec::with_capacity(grid_size * grid_size);
    for _ in 0..grid_size * grid_size {
        samples.push(r.read_sample("cell height/normal sample")?);
    }

    let layer_count = r.read_i32("cell layer count")?.max(0) as usize;
    if layer_count > MAX_LAYERS {
        return Err(Error::LayerCount(LayerCountError {
            cell: (x, y),
            layer_count,
        }));
    }
    let mut layer_indices = Vec::with_capacity(layer_count);
    for _ in 0..layer_count {
        layer_indices.push(r.read_i32("cell layer index")?);
    }
    let weights = r.read_bytes(grid_size * grid_size * layer_count, "cell weight maps")?;

    Ok(LandscapeCell {
        x,
        y,
        lightmap,
        penumbra,
        grid_size,
        samples,
        layer_indices,
        weights,
    })
}

/// Derive the landscape-level lightmap UV scale/bias from the lighting
/// resolution and the padded patch expansion around each cell.
pub(crate) fn lightmap_scale_bias(lighting_resolution: f32, grid_size: usize) -> Vec4 {
    let grid = grid_size as i32;
    let (ratio, expand_x, expand_y) = expand_patch_count(lighting_resolution, grid - 1, grid, 0);
    if ratio == 0.0 {
        return Vec4::ZERO;
    }
    let scale_x = ratio / (grid + 2 * expand_x) as f32;
    let scale_y = ratio / (grid + 2 * expand_y) as f32;
    let bias_x = expand_x as f32 * scale_x;
    let bias_y = expand_y as f32 * scale_y;
    Vec4::new(-scale_x, scale_y, bias_y, bias_x)
}

/// Lightmap patch expansion: how many border patches each cell grows by for
/// lighting padding, and the resulting usable ratio of the lightmap. Sizes
/// snap to the next power-of-two bucket capped at 4096.
fn expand_patch_count(
    lightmap_res: f32,
    component_size: i32,
    lightmap_size: i32,
    lighting_lod: i32,
) -> (f32, i32, i32) {
    if lightmap_res <= 0.0 {
        return (0.0, 0, 0);
    }
    let pixel_padding = 4;
    let patch_expand = if lightmap_res >= 1.0 {
        (pixel_padding as f32 / lightmap_res) as i32
    } else {
        pixel_padding
    };
    let x = (patch_expand >> lighting_lod).max(1);
    let y = (patch_expand >> lighting_lod).max(1);

    let mut desired = if lightmap_res >= 1.0 {
        (((component_size + 1) as f32 * lightmap_res) as i32).min(4096)
    } else {
        ((lightmap_size as f32 * lightmap_res) as i32).min(4096)
    };
    let current = if lightmap_res >= 1.0 {
        (((2 * (x << lighting_lod) + component_size + 1) as f32 * lightmap_res) as i32).min(4096)
    } else {
        (((2 * (x << lighting_lod) + lightmap_size) as f32 * lightmap_res) as i32).min(4096)
    };

    if current > desired {
        // Strip set bits from the low end until only the top bit remains,
        // then pick between that size and the next one up.
        let mut prior = desired;
        while desired > 0 {
            prior = desired;
            desired &= !(desired & !(desired - 1));
        }
        desired = prior << 1;
        if current * current <= (prior * prior) << 1 {
            desired = prior;
        }
    }

    let dest = (desired as f32 / current as f32 * (component_size as f32 * lightmap_res)) as i32;
    let ratio = dest as f32 / (component_size as f32 * lightmap_res) * current as f32
        / desired as f32;
    (ratio, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_resolution_disables_lightmap_transform() {
        assert_eq!(lightmap_scale_bias(0.0, 65), Vec4::ZERO);
    }

    #[test]
    fn unit_resolution_produces_negative_x_scale() {
        let sb = lightmap_scale_bias(1.0, 65);
        assert!(sb.x < 0.0);
        assert!(sb.y > 0.0);
        // Bias components mirror the expansion on each axis.
        assert!(sb.z > 0.0 && sb.w > 0.0);
    }
}
