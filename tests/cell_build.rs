use glam::{Vec3, Vec4};
use landmesh::level::{LayerDesc, LayerTable};
use landmesh::terrain::layers::{self, pack_layers};
use landmesh::terrain::vertices::plan_vertices;
use landmesh::terrain::HeightNormalSample;
use landmesh::{compile_cell, Error, LandscapeCell};

fn layer_table(indices: &[i32]) -> LayerTable {
    let mut table = LayerTable::new();
    for &index in indices {
        table.insert(
            index,
            LayerDesc {
                tiling: 1.0 + index as f32,
                yaw: 0.0,
                pitch: 0.0,
                specular: 0.5,
                base_map: format!("layer_{}_base", index),
                normal_map: format!("layer_{}_normal", index),
            },
        );
    }
    table
}

/// Flat cell at height `h` with the given per-point weights
/// (`weights[point * layers + layer]`).
fn make_cell(grid_size: usize, layer_indices: Vec<i32>, weights: Vec<u8>) -> LandscapeCell {
    assert_eq!(weights.len(), grid_size * grid_size * layer_indices.len());
    let samples = vec![
        HeightNormalSample::encode(8.0, Vec3::new(0.0, 1.0, 0.0));
        grid_size * grid_size
    ];
    LandscapeCell {
        x: 3,
        y: 5,
        lightmap: None,
        penumbra: Vec4::ONE,
        grid_size,
        samples,
        layer_indices,
        weights,
    }
}

#[test]
fn uniform_cell_compiles_to_one_group_one_submesh_no_duplicates() {
    let cell = make_cell(3, vec![2], vec![255; 9]);
    let layout = pack_layers(&cell).unwrap();
    assert_eq!(layout.groups.len(), 1);
    assert_eq!(layout.types.len(), 1);

    let mesh = compile_cell(&cell, &layer_table(&[2])).unwrap();
    assert_eq!(mesh.vertex_count(), 9);
    assert_eq!(mesh.submeshes.len(), 1);
    // 4 quads, 2 triangles each.
    assert_eq!(mesh.submeshes[0].indices.len(), 24);
    // Every vertex carries the full weight in channel 0.
    for color in &mesh.colors {
        assert_eq!(*color, [255, 0, 0, 0]);
    }
}

#[test]
fn decoded_positions_follow_cell_convention() {
    let cell = make_cell(3, vec![0], vec![255; 9]);
    let mesh = compile_cell(&cell, &layer_table(&[0])).unwrap();
    // Point (row, col) maps to (-col, height, row).
    assert_eq!(mesh.positions[0], Vec3::new(0.0, 8.0, 0.0));
    assert_eq!(mesh.positions[5], Vec3::new(-2.0, 8.0, 1.0));
    assert!(mesh.normals.iter().all(|n| n.y > 0.999));
}

#[test]
fn two_disjoint_single_layer_masks_share_one_group_without_duplicates() {
    // 3x3 points: the upper-left corner region uses layer 0, the far corner
    // point uses layer 1, everything else is unweighted. Quad masks come out
    // as {0} (three quads) and {1} (one quad).
    let mut weights = vec![0u8; 9 * 2];
    for point in [0usize, 1, 3] {
        weights[point * 2] = 200;
    }
    weights[8 * 2 + 1] = 150;
    let cell = make_cell(3, vec![0, 1], weights);

    let layout = pack_layers(&cell).unwrap();
    assert_eq!(layout.types.len(), 2);
    assert_eq!(layout.groups.len(), 1);
    assert!(layout.groups[0].satisfies(0b01));
    assert!(layout.groups[0].satisfies(0b10));

    let plan = plan_vertices(&cell, &layout).unwrap();
    assert_eq!(plan.duplicate_count, 0);

    let mesh = compile_cell(&cell, &layer_table(&[0, 1])).unwrap();
    assert_eq!(mesh.vertex_count(), 9);
    assert_eq!(mesh.submeshes.len(), 2);
    assert_eq!(mesh.submeshes[0].indices.len(), 18);
    assert_eq!(mesh.submeshes[1].indices.len(), 6);
}

/// 2x2 quads where each quad uses a distinct 4-layer set with no layer in
/// common: every shared vertex must be duplicated, the center three times.
#[test]
fn four_disjoint_layer_quads_duplicate_every_shared_vertex() {
    let layer_indices: Vec<i32> = (0..16).collect();
    let mut weights = vec![0u8; 9 * 16];
    // Only the four outer corner points carry weights; each owns one quad.
    for (point, first_layer) in [(0usize, 0usize), (2, 4), (6, 8), (8, 12)] {
        for l in 0..4 {
            weights[point * 16 + first_layer + l] = (100 + first_layer + l) as u8;
        }
    }
    let cell = make_cell(3, layer_indices.clone(), weights);

    let layout = pack_layers(&cell).unwrap();
    assert_eq!(layout.types.len(), 4);
    assert_eq!(layout.groups.len(), 4);
    for (i, entry) in layout.types.iter().enumerate() {
        assert_eq!(entry.group, i);
        assert!(layout.groups[entry.group].satisfies(entry.mask));
    }

    let plan = plan_vertices(&cell, &layout).unwrap();
    assert_eq!(plan.duplicate_count, 7);
    // Hand-computed duplicate allocation: point -> (copy_start, copy_count).
    let expected = [
        (9u32, 0u32),
        (9, 1),
        (10, 0),
        (10, 1),
        (11, 3),
        (14, 1),
        (15, 0),
        (15, 1),
        (16, 0),
    ];
    for (point, (start, count)) in expected.iter().enumerate() {
        assert_eq!(plan.records[point].copy_start, *start, "point {}", point);
        assert_eq!(plan.records[point].copy_count, *count, "point {}", point);
    }

    let mesh = compile_cell(&cell, &layer_table(&layer_indices)).unwrap();
    assert_eq!(mesh.vertex_count(), 16);
    assert_eq!(mesh.submeshes.len(), 4);
    // Each submesh covers one quad; corner resolution against the duplicate
    // table, hand-computed.
    assert_eq!(mesh.submeshes[0].indices, vec![0, 1, 3, 3, 1, 4]);
    assert_eq!(mesh.submeshes[1].indices, vec![9, 2, 11, 11, 2, 5]);
    assert_eq!(mesh.submeshes[2].indices, vec![10, 12, 6, 6, 12, 7]);
    assert_eq!(mesh.submeshes[3].indices, vec![13, 14, 15, 15, 14, 8]);

    // Duplicates replicate position and normal of their grid point.
    let center = 4usize;
    for dup in 11..14 {
        assert_eq!(mesh.positions[dup], mesh.positions[center]);
        assert_eq!(mesh.normals[dup], mesh.normals[center]);
    }

    // Weight colors: the canonical corner vertex carries its own layers'
    // weights in group slot order; center duplicates are all-zero since the
    // center point has no weights.
    assert_eq!(mesh.colors[0], [100, 101, 102, 103]);
    assert_eq!(mesh.colors[8], [112, 113, 114, 115]);
    for dup in 11..14 {
        assert_eq!(mesh.colors[dup], [0, 0, 0, 0]);
    }
}

#[test]
fn duplicate_counts_are_conserved() {
    // Mixed cell: a band of layer 3 over a base of layer 0 plus a corner of
    // layers 1+2 produces several distinct masks.
    let mut weights = vec![0u8; 16 * 4];
    for point in 0..16 {
        weights[point * 4] = 64;
    }
    for point in [5usize, 6, 9, 10] {
        weights[point * 4 + 3] = 128;
    }
    weights[15 * 4 + 1] = 30;
    weights[15 * 4 + 2] = 40;
    let cell = make_cell(4, vec![0, 1, 2, 3], weights);

    let layout = pack_layers(&cell).unwrap();
    let plan = plan_vertices(&cell, &layout).unwrap();
    let total: u32 = plan
        .records
        .iter()
        .map(|r| {
            assert_eq!(r.copy_count, r.required_groups.count_ones() - 1);
            r.copy_count
        })
        .sum();
    assert_eq!(total as usize, plan.duplicate_count);

    let mesh = compile_cell(&cell, &layer_table(&[0, 1, 2, 3])).unwrap();
    assert_eq!(mesh.vertex_count(), 16 + plan.duplicate_count);
}

#[test]
fn weight_colors_match_group_slot_sources() {
    let mut weights = vec![0u8; 9 * 3];
    for point in 0..9 {
        weights[point * 3] = 10 + point as u8;
        weights[point * 3 + 1] = 100;
        weights[point * 3 + 2] = 200;
    }
    let cell = make_cell(3, vec![4, 7, 9], weights);
    let layout = pack_layers(&cell).unwrap();
    let mesh = compile_cell(&cell, &layer_table(&[4, 7, 9])).unwrap();

    let group = layout.groups[layout.types[0].group];
    for point in 0..9usize {
        for slot in 0..4 {
            let layer = group.get(slot) as usize;
            let expected = if layer < 3 {
                cell.weights[point * 3 + layer]
            } else {
                0
            };
            assert_eq!(mesh.colors[point][slot], expected);
        }
    }
}

#[test]
fn packing_is_deterministic_across_runs() {
    // Layer bands vary per row so adjacent rows combine into distinct 4-bit
    // quad masks without ever exceeding a channel group.
    let mut weights = vec![0u8; 16 * 6];
    for point in 0..16 {
        let row = point / 4;
        weights[point * 6 + row % 3] = 255;
        weights[point * 6 + 3 + row % 2] = 17;
    }
    let cell = make_cell(4, vec![0, 1, 2, 3, 4, 5], weights);

    let a = pack_layers(&cell).unwrap();
    let b = pack_layers(&cell).unwrap();
    assert_eq!(a.groups, b.groups);
    assert_eq!(a.types, b.types);
    assert_eq!(a.quad_types, b.quad_types);
}

#[test]
fn quad_with_five_layers_is_a_fatal_input_error() {
    let mut weights = vec![0u8; 9 * 5];
    for layer in 0..5 {
        weights[4 * 5 + layer] = 1;
    }
    let cell = make_cell(3, vec![0, 1, 2, 3, 4], weights);

    let err = compile_cell(&cell, &layer_table(&[0, 1, 2, 3, 4])).unwrap_err();
    match err {
        Error::LayerOverflow(overflow) => {
            assert_eq!(overflow.cell, (3, 5));
            // The center point pollutes the first quad scanned.
            assert_eq!(overflow.quad, (0, 0));
            assert_eq!(overflow.mask.count_ones(), 5);
        }
        other => panic!("expected layer overflow, got {:?}", other),
    }
}

#[test]
fn submesh_materials_bind_layers_with_one_hot_slot_masks() {
    let mut weights = vec![0u8; 9 * 2];
    for point in 0..9 {
        weights[point * 2] = 128;
        weights[point * 2 + 1] = 127;
    }
    let cell = make_cell(3, vec![6, 11], weights);
    let mesh = compile_cell(&cell, &layer_table(&[6, 11])).unwrap();

    assert_eq!(mesh.submeshes.len(), 1);
    let material = &mesh.submeshes[0].material;
    assert_eq!(material.shader_variant, "Landscape_2");
    assert_eq!(material.slots.len(), 2);
    assert_eq!(material.slots[0].slot_mask, Vec4::new(1.0, 0.0, 0.0, 0.0));
    assert_eq!(material.slots[1].slot_mask, Vec4::new(0.0, 1.0, 0.0, 0.0));
    assert_eq!(material.slots[0].base_texture, "layer_6_base");
    assert_eq!(material.slots[1].normal_texture, "layer_11_normal");
    assert_eq!(material.slots[0].layer_params.x, 7.0);
    assert_eq!(material.penumbra, Vec4::ONE);
    assert!(material.lightmap.is_none());
}

#[test]
fn missing_layer_table_entry_is_reported() {
    let cell = make_cell(3, vec![9], vec![255; 9]);
    let err = compile_cell(&cell, &layer_table(&[0])).unwrap_err();
    match err {
        Error::LayerLookup(lookup) => {
            assert_eq!(lookup.layer_index, 9);
            assert_eq!(lookup.cell, (3, 5));
        }
        other => panic!("expected layer lookup error, got {:?}", other),
    }
}

#[test]
fn compiled_mesh_serializes() {
    let cell = make_cell(3, vec![0], vec![255; 9]);
    let mesh = compile_cell(&cell, &layer_table(&[0])).unwrap();
    let json = serde_json::to_string(&mesh).unwrap();
    let back: landmesh::CellMesh = serde_json::from_str(&json).unwrap();
    assert_eq!(back.vertex_count(), mesh.vertex_count());
    assert_eq!(back.submeshes.len(), mesh.submeshes.len());
}

/// More distinct 4-layer combinations than the required-groups mask can
/// address. Heavy points sit on every other grid row/column so each quad
/// touches exactly one of them and carries its combination alone.
#[test]
fn more_than_32_channel_groups_is_a_fatal_input_error() {
    let mut combos = Vec::new();
    for a in 0..16usize {
        for b in a + 1..16 {
            for c in b + 1..16 {
                for d in c + 1..16 {
                    combos.push([a, b, c, d]);
                }
            }
        }
    }

    let grid = 13;
    let mut weights = vec![0u8; grid * grid * 16];
    for (k, combo) in combos.iter().take(33).enumerate() {
        let point = (2 * (k / 7)) * grid + 2 * (k % 7);
        for &layer in combo {
            weights[point * 16 + layer] = 255;
        }
    }
    let cell = make_cell(grid, (0..16).collect(), weights);

    // Every quad mask stays within 4 bits, so packing itself succeeds.
    let layout = pack_layers(&cell).unwrap();
    assert_eq!(layout.groups.len(), 33);

    let err = plan_vertices(&cell, &layout).unwrap_err();
    match err {
        Error::GroupOverflow(overflow) => {
            assert_eq!(overflow.cell, (3, 5));
            assert_eq!(overflow.groups, 33);
        }
        other => panic!("expected group overflow, got {:?}", other),
    }
    assert!(matches!(
        compile_cell(&cell, &layer_table(&(0..16).collect::<Vec<_>>())).unwrap_err(),
        Error::GroupOverflow(_)
    ));
}

#[test]
fn more_than_16_layers_is_a_fatal_input_error() {
    let layer_indices: Vec<i32> = (0..20).collect();
    let mut weights = vec![0u8; 4 * 20];
    // A weight beyond the mask width must not be reachable by the packer.
    weights[17] = 1;
    let cell = make_cell(2, layer_indices.clone(), weights);

    let err = compile_cell(&cell, &layer_table(&layer_indices)).unwrap_err();
    match err {
        Error::LayerCount(count) => {
            assert_eq!(count.cell, (3, 5));
            assert_eq!(count.layer_count, 20);
        }
        other => panic!("expected layer count error, got {:?}", other),
    }
}

#[test]
fn channel_group_slots_never_move_once_assigned() {
    let mut group = layers::ChannelGroup::new();
    assert!(group.fit(0b0010));
    assert_eq!(group.find(1), Some(0));
    assert!(group.fit(0b0101));
    // Layer 1 stays put; new layers fill the remaining slots in order.
    assert_eq!(group.find(1), Some(0));
    assert_eq!(group.find(0), Some(1));
    assert_eq!(group.find(2), Some(2));
}
