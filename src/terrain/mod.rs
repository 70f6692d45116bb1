use glam::Vec4;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmptyVertexGroupsError, Error, Result};
use crate::level::landscape::{Landscape, LayerTable};
use crate::level::LightmapBinding;

pub mod codec;
pub mod layers;
pub mod material;
pub mod mesh;
pub mod vertices;

pub use codec::HeightNormalSample;
pub use layers::{ChannelGroup, LayerLayout, LayerTypeEntry};
pub use material::{MaterialSlot, SubmeshMaterial};
pub use mesh::{CellMesh, Submesh};
pub use vertices::{VertexPlan, VertexRecord};

/// One rectangular patch of the terrain grid, as decoded from the level
/// container. Immutable input to the compile pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandscapeCell {
    pub x: i32,
    pub y: i32,
    pub lightmap: Option<LightmapBinding>,
    pub penumbra: Vec4,
    /// Grid points per side; the cell has `(grid_size - 1)²` quads.
    pub grid_size: usize,
    /// Packed height/normal samples, `grid_size²` entries, row-major.
    pub samples: Vec<HeightNormalSample>,
    /// The distinct layer identifiers usable in this cell, addressed by the
    /// cell-local bit positions of the layer masks.
    pub layer_indices: Vec<i32>,
    /// Blend weights flattened as `point * layer_indices.len() + layer`.
    pub weights: Vec<u8>,
}

/// Compile one cell: pack quad layer-sets into channel groups, plan vertex
/// duplication, and assemble the final buffers and submeshes. Pure and
/// deterministic; a failure names the offending cell and quad/point.
pub fn compile_cell(cell: &LandscapeCell, layers: &LayerTable) -> Result<CellMesh> {
    if cell.grid_size < 2 {
        return Err(Error::EmptyVertexGroups(EmptyVertexGroupsError {
            cell: (cell.x, cell.y),
            point: (0, 0),
        }));
    }

    let layout = layers::pack_layers(cell)?;
    let plan = vertices::plan_vertices(cell, &layout)?;
    let mesh = mesh::assemble_mesh(cell, &layout, &plan, layers)?;
    debug!(
        "cell ({}, {}): {} vertices ({} duplicates), {} submeshes",
        cell.x,
        cell.y,
        mesh.vertex_count(),
        plan.duplicate_count,
        mesh.submeshes.len()
    );
    Ok(mesh)
}

/// Compile every cell of a landscape. Cells share no mutable state, so they
/// fan out across the rayon pool; results keep the landscape's cell order and
/// the first failing cell aborts the batch.
pub fn compile_landscape(landscape: &Landscape) -> Result<Vec<CellMesh>> {
    landscape
        .cells
        .par_iter()
        .map(|cell| compile_cell(cell, &landscape.layers))
        .collect()
}
