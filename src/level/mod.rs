use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

pub mod landscape;
pub mod reader;

pub use landscape::{Landscape, LayerDesc, LayerTable};
use landscape::read_landscape;
use reader::ByteReader;

/// Optional directional sun light of a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunLight {
    pub direction: Vec3,
    pub color: Vec3,
}

/// Height fog parameters. HDR inscattering colors are normalized to unit
/// range with the overflow folded into `intensity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FogSettings {
    pub height: f32,
    pub density: f32,
    pub inscattering_color: Vec3,
    pub intensity: f32,
    pub height_falloff: f32,
    pub max_opacity: f32,
    pub start_distance: f32,
    pub cutoff_distance: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSettings {
    pub sun: Option<SunLight>,
    pub fog: Option<FogSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionProbe {
    pub name: String,
    pub position: Vec3,
    pub offset: Vec3,
    pub brightness: f32,
    pub radius: f32,
    pub average_brightness: f32,
}

/// Material classification carried by static mesh placement records. Unknown
/// identifiers are preserved rather than rejected; consumers fall back to a
/// plain shader for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialKind {
    SceneGrass,
    ScenePlain,
    ScenePlainAlpha,
    ScenePbr,
    ScenePbrAlpha,
    ScenePbrGlow,
    TerrainPbr,
    Water,
    Other(i32),
}

impl From<i32> for MaterialKind {
    fn from(value: i32) -> Self {
        match value {
            0 => MaterialKind::SceneGrass,
            1 => MaterialKind::ScenePlain,
            2 => MaterialKind::ScenePlainAlpha,
            3 => MaterialKind::ScenePbr,
            4 => MaterialKind::ScenePbrAlpha,
            5 => MaterialKind::ScenePbrGlow,
            6 => MaterialKind::TerrainPbr,
            7 => MaterialKind::Water,
            other => MaterialKind::Other(other),
        }
    }
}

/// One material entry of a static mesh placement: texture and scalar
/// parameter names/values only, resolved by the external asset collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub name: String,
    pub slot: i32,
    pub kind: MaterialKind,
    pub textures: Vec<String>,
    pub scalars: Vec<f32>,
}

/// Baked lightmap binding: texture name plus the UV transform and the two
/// scale/add decode vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightmapBinding {
    pub name: String,
    pub uv_scale_bias: Vec4,
    pub scale0: Vec4,
    pub add0: Vec4,
    pub scale1: Vec4,
    pub add1: Vec4,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticMeshPlacement {
    pub name: String,
    pub mesh_name: String,
    pub location: Vec3,
    /// Euler angles as stored; axis convention is the consumer's concern.
    pub rotation_euler: Vec3,
    pub scale: Vec3,
    pub materials: Vec<MaterialRecord>,
    pub lightmap: Option<LightmapBinding>,
    pub penumbra: Vec4,
}

/// A fully decoded level container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub scene: SceneSettings,
    pub probes: Vec<ReflectionProbe>,
    pub static_meshes: Vec<StaticMeshPlacement>,
    /// Terrain quads per cell side; zero when the level has no landscape.
    pub terrain_quads: i32,
    pub landscape: Option<Landscape>,
}

impl Level {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Level> {
        let bytes = std::fs::read(path)?;
        decode_level(&bytes)
    }
}

/// Decode a level container from fully materialized bytes. Sections are laid
/// out sequentially: scene settings, reflection probes, static mesh
/// placements, then the optional landscape.
pub fn decode_level(bytes: &[u8]) -> Result<Level> {
    let mut r = ByteReader::new(bytes);

    let scene = read_scene_settings(&mut r)?;

    let probe_count = r.read_i32("reflection probe count")?.max(0) as usize;
    let mut probes = Vec::with_capacity(probe_count);
    for _ in 0..probe_count {
        probes.push(read_reflection_probe(&mut r)?);
    }

    let mesh_count = r.read_i32("static mesh count")?.max(0) as usize;
    let mut static_meshes = Vec::with_capacity(mesh_count);
    for _ in 0..mesh_count {
        static_meshes.push(read_static_mesh(&mut r)?);
    }

    let terrain_quads = r.read_i32("terrain quads per side")?;
    let landscape = if terrain_quads > 0 {
        Some(read_landscape(&mut r, terrain_quads as usize + 1)?)
    } else {
        None
    };

    info!(
        "decoded level: {} probes, {} static meshes, landscape: {}",
        probes.len(),
        static_meshes.len(),
        landscape.is_some()
    );

    Ok(Level {
        scene,
        probes,
        static_meshes,
        terrain_quads,
        landscape,
    })
}

fn read_scene_settings(r: &mut ByteReader) -> Result<SceneSettings> {
    let sun = if r.read_i32("sun light flag")? != 0 {
        Some(SunLight {
            direction: r.read_vec3("sun light direction")?,
            color: r.read_vec3("sun light color")?,
        })
    } else {
        None
    };

    let fog = if r.read_i32("fog flag")? != 0 {
        let height = r.read_f32("fog height")?;
        let density = r.read_f32("fog density")?;
        let color = r.read_vec4("fog inscattering color")?;
        let max = color.x.max(color.y).max(color.z);
        let (inscattering_color, intensity) = if max > 1.0 {
            (Vec3::new(color.x, color.y, color.z) / max, max)
        } else {
            (Vec3::new(color.x, color.y, color.z), 1.0)
        };
        Some(FogSettings {
            height,
            density,
            inscattering_color,
            intensity,
            height_falloff: r.read_f32("fog height falloff")?,
            max_opacity: r.read_f32("fog max opacity")?,
            start_distance: r.read_f32("fog start distance")?,
            cutoff_distance: r.read_f32("fog cutoff distance")?,
        })
    } else {
        None
    };

    Ok(SceneSettings { sun, fog })
}

fn read_reflection_probe(r: &mut ByteReader) -> Result<ReflectionProbe> {
    Ok(ReflectionProbe {
        name: r.read_string("probe name")?,
        position: r.read_vec3("probe position")?,
        offset: r.read_vec3("probe offset")?,
        brightness: r.read_f32("probe brightness")?,
        radius: r.read_f32("probe radius")?,
        average_brightness: r.read_f32("probe average brightness")?,
    })
}

pub(crate) fn read_lightmap_block(r: &mut ByteReader) -> Result<LightmapBinding> {
    Ok(LightmapBinding {
        name: r.read_string("lightmap name")?,
        uv_scale_bias: r.read_vec4("lightmap uv scale/bias")?,
        scale0: r.read_vec4("lightmap scale0")?,
        add0: r.read_vec4("lightmap add0")?,
        scale1: r.read_vec4("lightmap scale1")?,
        add1: r.read_vec4("lightmap add1")?,
    })
}

fn read_static_mesh(r: &mut ByteReader) -> Result<StaticMeshPlacement> {
    let name = r.read_string("static mesh name")?;
    let mesh_name = r.read_string("static mesh source name")?;
    let location = r.read_vec3("static mesh location")?;
    let rotation_euler = r.read_vec3("static mesh rotation")?;
    let scale = r.read_vec3("static mesh scale")?;

    let material_count = r.read_i32("static mesh material count")?.max(0) as usize;
    let mut materials = Vec::with_capacity(material_count);
    for _ in 0..material_count {
        let name = r.read_string("material name")?;
        let slot = r.read_i32("material slot")?;
        let kind = MaterialKind::from(r.read_i32("material kind")?);

        let texture_count = r.read_i32("material texture count")?.max(0) as usize;
        let mut textures = Vec::with_capacity(texture_count);
        for _ in 0..texture_count {
            textures.push(r.read_string("material texture name")?);
        }

        let scalar_count = r.read_i32("material scalar count")?.max(0) as usize;
        let mut scalars = Vec::with_capacity(scalar_count);
        for _ in 0..scalar_count {
            scalars.push(r.read_f32("material scalar")?);
        }

        materials.push(MaterialRecord {
            name,
            slot,
            kind,
            textures,
            scalars,
        });
    }

    let lightmap = if r.read_i32("static mesh lightmap flag")? != 0 {
        Some(read_lightmap_block(r)?)
    } else {
        None
    };

    let penumbra = if r.read_i32("static mesh shadow flag")? != 0 {
        r.read_vec4("static mesh shadow penumbra")?
    } else {
        Vec4::ONE
    };

    Ok(StaticMeshPlacement {
        name,
        mesh_name,
        location,
        rotation_euler,
        scale,
        materials,
        lightmap,
        penumbra,
    })
}
