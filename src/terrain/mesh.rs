use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::level::landscape::LayerTable;
use crate::terrain::codec::{decode_height, decode_normal};
use crate::terrain::layers::LayerLayout;
use crate::terrain::material::{build_material, SubmeshMaterial};
use crate::terrain::vertices::VertexPlan;
use crate::terrain::LandscapeCell;

/// One triangle list per distinct quad layer-set, with its material binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submesh {
    /// The quad layer-set this submesh covers.
    pub layer_mask: u16,
    pub indices: Vec<u32>,
    pub material: SubmeshMaterial,
}

/// Render-ready output for one cell. Vertex arrays hold the `grid_size²`
/// canonical vertices followed by all duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellMesh {
    pub cell_x: i32,
    pub cell_y: i32,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Per-vertex 4-channel blend weights, one channel per slot of the
    /// channel group the vertex represents.
    pub colors: Vec<[u8; 4]>,
    pub submeshes: Vec<Submesh>,
}

impl CellMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Build the final vertex buffers and per-layer-set triangle lists. Positions
/// use the cell-local convention of the source data: `x = -col`, `z = row`,
/// `y` decoded from the packed sample.
pub fn assemble_mesh(
    cell: &LandscapeCell,
    layout: &LayerLayout,
    plan: &VertexPlan,
    layers: &LayerTable,
) -> Result<CellMesh> {
    let grid = cell.grid_size;
    let layer_count = cell.layer_indices.len();
    let total = grid * grid + plan.duplicate_count;

    let mut positions = vec![Vec3::ZERO; total];
    let mut normals = vec![Vec3::ZERO; total];
    let mut colors = vec![[0u8; 4]; total];

    for row in 0..grid {
        for col in 0..grid {
            let point = row * grid + col;
            let sample = cell.samples[point];
            let position = Vec3::new(-(col as f32), decode_height(sample), row as f32);
            let normal = decode_normal(sample);
            let record = plan.records[point];

            positions[point] = position;
            normals[point] = normal;
            for k in 0..record.copy_count as usize {
                let dup = record.copy_start as usize + k;
                positions[dup] = position;
                normals[dup] = normal;
            }

            // The canonical vertex carries the first required group's weight
            // encoding; each duplicate carries the next required group's.
            let mut ordinal = 0u32;
            for (group_index, group) in layout.groups.iter().enumerate() {
                if record.required_groups & (1 << group_index) == 0 {
                    continue;
                }
                let target = if ordinal == 0 {
                    point
                } else {
                    record.copy_start as usize + ordinal as usize - 1
                };
                let mut color = [0u8; 4];
                for (slot, channel) in color.iter_mut().enumerate() {
                    let layer = group.get(slot) as usize;
                    if layer < layer_count {
                        *channel = cell.weights[point * layer_count + layer];
                    }
                }
                colors[target] = color;
                ordinal += 1;
            }
        }
    }

    let quads = grid - 1;
    let mut submeshes = Vec::with_capacity(layout.types.len());
    for (type_index, entry) in layout.types.iter().enumerate() {
        let mut indices = Vec::new();
        for row in 0..quads {
            for col in 0..quads {
                if layout.quad_types[row * quads + col] as usize != type_index {
                    continue;
                }
                let mut corner = [0u32; 4];
                for dr in 0..2 {
                    for dc in 0..2 {
                        let point = (row + dr) * grid + col + dc;
                        corner[dr * 2 + dc] =
                            plan.records[point].index_for_group(point, entry.group);
                    }
                }
                // Fixed diagonal split: (v00, v01, v10), (v10, v01, v11) in
                // corner order [row][col].
                indices.extend_from_slice(&[
                    corner[0], corner[1], corner[2], corner[2], corner[1], corner[3],
                ]);
            }
        }

        let material = build_material(cell, entry, &layout.groups[entry.group], layers)?;
        submeshes.push(Submesh {
            layer_mask: entry.mask,
            indices,
            material,
        });
    }

    Ok(CellMesh {
        cell_x: cell.x,
        cell_y: cell.y,
        positions,
        normals,
        colors,
        submeshes,
    })
}
