use crate::error::{EmptyVertexGroupsError, Error, GroupOverflowError, Result};
use crate::terrain::layers::LayerLayout;
use crate::terrain::LandscapeCell;

/// Channel groups addressable per cell, bounded by the width of
/// [`VertexRecord::required_groups`].
pub const MAX_GROUPS: usize = u32::BITS as usize;

/// Per grid point: the channel groups its neighboring quads require and the
/// duplicate vertex slots allocated for them. The point index itself is the
/// canonical vertex and represents the lowest required group.
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexRecord {
    /// Bit `k` set iff some neighboring quad is assigned channel group `k`.
    pub required_groups: u32,
    /// First duplicate vertex index for this point (meaningful only when
    /// `copy_count > 0`).
    pub copy_start: u32,
    /// Number of duplicate vertices: one per required group beyond the first.
    pub copy_count: u32,
}

impl VertexRecord {
    /// Vertex index representing channel group `group` at this point:
    /// canonical when `group` is the lowest required group, otherwise the
    /// duplicate at the group's ordinal position among the required groups
    /// (excluding the first).
    pub fn index_for_group(&self, point: usize, group: usize) -> u32 {
        let below = (self.required_groups & ((1u32 << group) - 1)).count_ones();
        if below == 0 {
            point as u32
        } else {
            self.copy_start + below - 1
        }
    }
}

/// Output of the vertex duplication planner.
#[derive(Debug)]
pub struct VertexPlan {
    pub records: Vec<VertexRecord>,
    /// Total duplicate vertices in the cell; the final vertex buffer holds
    /// `grid_size² + duplicate_count` entries.
    pub duplicate_count: usize,
}

/// Compute, for every grid point, the set of channel groups required by the
/// up-to-four quads sharing the point, and allocate duplicate slots
/// contiguously after the last grid-point index.
pub fn plan_vertices(cell: &LandscapeCell, layout: &LayerLayout) -> Result<VertexPlan> {
    // The packer may allocate one group per distinct layer-set; a cell
    // needing more groups than the mask can address is a fatal input error.
    if layout.groups.len() > MAX_GROUPS {
        return Err(Error::GroupOverflow(GroupOverflowError {
            cell: (cell.x, cell.y),
            groups: layout.groups.len(),
        }));
    }

    let grid = cell.grid_size;
    let quads = grid - 1;
    let mut records = vec![VertexRecord::default(); grid * grid];

    for row in 0..grid {
        for col in 0..grid {
            let mut required = 0u32;
            for quad_row in row.saturating_sub(1)..=row.min(quads - 1) {
                for quad_col in col.saturating_sub(1)..=col.min(quads - 1) {
                    let type_index = layout.quad_types[quad_row * quads + quad_col] as usize;
                    required |= 1 << layout.types[type_index].group;
                }
            }
            if required == 0 {
                return Err(Error::EmptyVertexGroups(EmptyVertexGroupsError {
                    cell: (cell.x, cell.y),
                    point: (row, col),
                }));
            }
            records[row * grid + col].required_groups = required;
        }
    }

    let mut next = (grid * grid) as u32;
    for record in records.iter_mut() {
        record.copy_start = next;
        record.copy_count = record.required_groups.count_ones() - 1;
        next += record.copy_count;
    }

    Ok(VertexPlan {
        records,
        duplicate_count: next as usize - grid * grid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_resolution_skips_first_required_group() {
        let record = VertexRecord {
            required_groups: 0b1011,
            copy_start: 100,
            copy_count: 2,
        };
        // Group 0 is the lowest required group: canonical vertex.
        assert_eq!(record.index_for_group(7, 0), 7);
        // Group 1 is the second required group: first duplicate.
        assert_eq!(record.index_for_group(7, 1), 100);
        // Group 3 is the third required group (group 2 is not required).
        assert_eq!(record.index_for_group(7, 3), 101);
    }
}
