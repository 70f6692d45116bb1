use tracing::debug;

use crate::error::{Error, LayerCountError, LayerOverflowError, Result};
use crate::terrain::LandscapeCell;

/// Sentinel for an unoccupied channel-group slot.
pub const EMPTY_SLOT: u8 = 0xFF;

/// Number of blend layers a single vertex can carry.
pub const SLOTS_PER_GROUP: usize = 4;

/// Distinct blend layers addressable within one cell, bounded by the width
/// of the layer-set masks.
pub const MAX_LAYERS: usize = u16::BITS as usize;

/// A fixed assignment of up to four cell-local layers to the four weight
/// channels of a vertex. Slots holding a layer are never reassigned; only
/// empty slots may be filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelGroup {
    slots: [u8; SLOTS_PER_GROUP],
}

impl Default for ChannelGroup {
    fn default() -> Self {
        Self {
            slots: [EMPTY_SLOT; SLOTS_PER_GROUP],
        }
    }
}

impl ChannelGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> u8 {
        self.slots[slot]
    }

    pub fn set(&mut self, slot: usize, layer: u8) {
        self.slots[slot] = layer;
    }

    /// Slot currently holding `layer`, if any.
    pub fn find(&self, layer: u8) -> Option<usize> {
        self.slots.iter().position(|&l| l == layer)
    }

    /// Attempt to make this group satisfy every layer bit in `mask`. The
    /// candidate assignment is built in a local copy and committed only when
    /// every new layer found an empty slot, so a failed fit leaves the group
    /// untouched.
    pub fn fit(&mut self, mask: u16) -> bool {
        let mut candidate = *self;
        for layer in iter_layers(mask) {
            if candidate.find(layer).is_none() {
                match candidate.find(EMPTY_SLOT) {
                    Some(slot) => candidate.set(slot, layer),
                    None => return false,
                }
            }
        }
        *self = candidate;
        true
    }

    /// Whether every layer bit in `mask` occupies one of the four slots.
    pub fn satisfies(&self, mask: u16) -> bool {
        iter_layers(mask).all(|layer| self.find(layer).is_some())
    }
}

/// Cell-local layer indices set in a quad layer-set mask, in increasing
/// order.
pub fn iter_layers(mask: u16) -> impl Iterator<Item = u8> {
    (0..16u8).filter(move |bit| mask & (1 << bit) != 0)
}

/// One distinct quad layer-set observed in a cell and the channel group
/// assigned to represent it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerTypeEntry {
    pub mask: u16,
    pub group: usize,
}

/// Output of the layer-set packer. All arrays are sized once per cell and
/// never mutated afterwards.
#[derive(Debug)]
pub struct LayerLayout {
    /// Per grid point: bit `j` set iff the point has nonzero weight for the
    /// cell's `j`-th layer.
    pub point_masks: Vec<u16>,
    /// Per quad (row-major, `(grid_size - 1)²` entries): OR of the four
    /// corner point masks.
    pub quad_masks: Vec<u16>,
    /// Per quad: index into `types` for its layer-set mask. Direct lookup so
    /// the vertex planner never consults a map.
    pub quad_types: Vec<u16>,
    /// One entry per distinct quad layer-set, in first-appearance order.
    pub types: Vec<LayerTypeEntry>,
    /// Channel groups allocated for this cell, in allocation order.
    pub groups: Vec<ChannelGroup>,
}

/// Greedy layer-set packer. Distinct quad masks are collected in
/// first-appearance order over a row-major quad scan and fitted into the
/// oldest group that can still absorb them; a new group is allocated only
/// when none fits.
pub fn pack_layers(cell: &LandscapeCell) -> Result<LayerLayout> {
    let grid = cell.grid_size;
    let layer_count = cell.layer_indices.len();
    if layer_count > MAX_LAYERS {
        return Err(Error::LayerCount(LayerCountError {
            cell: (cell.x, cell.y),
            layer_count,
        }));
    }

    let mut point_masks = vec![0u16; grid * grid];
    for (point, mask) in point_masks.iter_mut().enumerate() {
        for layer in 0..layer_count {
            if cell.weights[point * layer_count + layer] != 0 {
                *mask |= 1 << layer;
            }
        }
    }

    let quads = grid - 1;
    let mut quad_masks = vec![0u16; quads * quads];
    let mut quad_types = vec![0u16; quads * quads];
    let mut types: Vec<LayerTypeEntry> = Vec::new();
    let mut groups: Vec<ChannelGroup> = Vec::new();

    for row in 0..quads {
        for col in 0..quads {
            let mask = point_masks[row * grid + col]
                | point_masks[row * grid + col + 1]
                | point_masks[(row + 1) * grid + col]
                | point_masks[(row + 1) * grid + col + 1];
            quad_masks[row * quads + col] = mask;

            if mask.count_ones() as usize > SLOTS_PER_GROUP {
                return Err(Error::LayerOverflow(LayerOverflowError {
                    cell: (cell.x, cell.y),
                    quad: (row, col),
                    mask,
                }));
            }

            let type_index = match types.iter().position(|t| t.mask == mask) {
                Some(existing) => existing,
                None => {
                    let group = assign_group(&mut groups, mask);
                    types.push(LayerTypeEntry { mask, group });
                    types.len() - 1
                }
            };
            quad_types[row * quads + col] = type_index as u16;
        }
    }

    debug!(
        "cell ({}, {}): {} distinct layer sets packed into {} channel groups",
        cell.x,
        cell.y,
        types.len(),
        groups.len()
    );

    Ok(LayerLayout {
        point_masks,
        quad_masks,
        quad_types,
        types,
        groups,
    })
}

fn assign_group(groups: &mut Vec<ChannelGroup>, mask: u16) -> usize {
    for (index, group) in groups.iter_mut().enumerate() {
        if group.fit(mask) {
            return index;
        }
    }
    let mut group = ChannelGroup::new();
    // A mask with at most 4 bits always fits an empty group.
    group.fit(mask);
    groups.push(group);
    groups.len() - 1
}
