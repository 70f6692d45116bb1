use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::{Error, LayerLookupError, Result};
use crate::level::landscape::LayerTable;
use crate::level::LightmapBinding;
use crate::terrain::layers::{iter_layers, ChannelGroup, LayerTypeEntry};
use crate::terrain::LandscapeCell;

/// Binding data for one occupied channel-group slot of a submesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSlot {
    /// One-hot selector over the four weight channels.
    pub slot_mask: Vec4,
    /// `(tiling, yaw, pitch, specular)` of the bound layer.
    pub layer_params: Vec4,
    pub base_texture: String,
    pub normal_texture: String,
}

/// Consumer-facing material record for one submesh. Handed to the external
/// asset/material collaborator; no texture loading happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmeshMaterial {
    /// Shader variant keyed by the number of bound layers.
    pub shader_variant: String,
    pub slots: Vec<MaterialSlot>,
    pub lightmap: Option<LightmapBinding>,
    pub penumbra: Vec4,
}

/// Resolve the material binding for one layer-set entry: a one-hot slot mask
/// per layer in the set plus the layer's parameters and texture names from
/// the landscape layer table.
pub fn build_material(
    cell: &LandscapeCell,
    entry: &LayerTypeEntry,
    group: &ChannelGroup,
    layers: &LayerTable,
) -> Result<SubmeshMaterial> {
    let mut slots = Vec::new();
    for layer in iter_layers(entry.mask) {
        let mut slot_mask = Vec4::ZERO;
        if let Some(slot) = group.find(layer) {
            slot_mask[slot] = 1.0;
        }

        let layer_index = cell.layer_indices[layer as usize];
        let desc = layers
            .get(&layer_index)
            .ok_or(Error::LayerLookup(LayerLookupError {
                cell: (cell.x, cell.y),
                layer_index,
            }))?;
        slots.push(MaterialSlot {
            slot_mask,
            layer_params: Vec4::new(desc.tiling, desc.yaw, desc.pitch, desc.specular),
            base_texture: desc.base_map.clone(),
            normal_texture: desc.normal_map.clone(),
        });
    }

    Ok(SubmeshMaterial {
        shader_variant: format!("Landscape_{}", slots.len()),
        slots,
        lightmap: cell.lightmap.clone(),
        penumbra: cell.penumbra,
    })
}
