// records.rs — typed lump records and their per-variant decoders.
//
// Every record is a plain value decoded from a fixed-size slice of its
// lump. Cross-lump references are positional (index, optional count)
// pairs normalized to i64 here, with -1 standing for "no reference"
// regardless of the backing width in the file.

use rayon::prelude::*;

use crate::error::Result;
use crate::format::{
    BrushLayout, BrushSideLayout, FaceLayout, LeafLayout, ModelLayout, NodeLayout, PlaneLayout,
    TexInfoLayout, TexturesLayout, VertexLayout,
};
use crate::reader::Reader;
use unbsp_common::math::{Plane, Vec3};

/// Below this element count, sequential decoding beats the rayon setup cost.
const PARALLEL_LUMP_THRESHOLD: usize = 64;

/// Decode a fixed-width lump: `count = len / stride`, each element decoded
/// independently from its own slice so a malformed element can never read
/// past the lump. A trailing partial element is ignored.
pub fn decode_fixed<T, F>(bytes: &[u8], stride: usize, what: &'static str, decode: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&mut Reader) -> Result<T> + Sync,
{
    let count = bytes.len() / stride;
    if count >= PARALLEL_LUMP_THRESHOLD {
        (0..count)
            .into_par_iter()
            .map(|i| decode(&mut Reader::new(&bytes[i * stride..(i + 1) * stride], what)))
            .collect()
    } else {
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            out.push(decode(&mut Reader::new(&bytes[i * stride..(i + 1) * stride], what))?);
        }
        Ok(out)
    }
}

// =============================================================================
// Planes / vertices / edges
// =============================================================================

pub fn decode_planes(bytes: &[u8], layout: PlaneLayout) -> Result<Vec<Plane>> {
    let stride = match layout {
        PlaneLayout::WithType => 20,
        PlaneLayout::Bare => 16,
    };
    decode_fixed(bytes, stride, "planes", |r| {
        let normal = r.vec3()?;
        let dist = r.f32()?;
        Ok(Plane { normal, dist })
    })
}

pub fn decode_vertices(bytes: &[u8], layout: VertexLayout) -> Result<Vec<Vec3>> {
    let stride = match layout {
        VertexLayout::Plain => 12,
        VertexLayout::DrawVert => 44,
        VertexLayout::RavenDrawVert => 80,
    };
    decode_fixed(bytes, stride, "vertices", |r| r.vec3())
}

/// One edge: two vertex indices. The index width varies per variant.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub v: [i64; 2],
}

pub fn decode_edges(bytes: &[u8], wide: bool) -> Result<Vec<Edge>> {
    let stride = if wide { 8 } else { 4 };
    decode_fixed(bytes, stride, "edges", |r| {
        let (a, b) = if wide {
            (r.u32()? as i64, r.u32()? as i64)
        } else {
            (r.u16()? as i64, r.u16()? as i64)
        };
        Ok(Edge { v: [a, b] })
    })
}

// =============================================================================
// Faces
// =============================================================================

/// A compiled face, normalized across layouts. Fields a layout does not
/// store stay at their "no reference" default.
#[derive(Debug, Clone)]
pub struct Face {
    pub plane: i64,
    pub first_edge: i64,
    pub num_edges: i64,
    pub first_vertex: i64,
    pub num_vertices: i64,
    pub first_index: i64,
    pub num_indices: i64,
    pub tex_info: i64,
    pub texture: i64,
    pub material: i64,
    pub disp_info: i64,
    /// Quake 3 surface type: 1 planar, 2 patch, 3 mesh, 4 flare.
    pub face_type: i64,
    pub patch_size: [i64; 2],
    pub flags: u32,
}

impl Default for Face {
    fn default() -> Face {
        Face {
            plane: -1,
            first_edge: -1,
            num_edges: 0,
            first_vertex: -1,
            num_vertices: 0,
            first_index: -1,
            num_indices: 0,
            tex_info: -1,
            texture: -1,
            material: -1,
            disp_info: -1,
            face_type: 0,
            patch_size: [0, 0],
            flags: 0,
        }
    }
}

pub fn decode_faces(bytes: &[u8], layout: FaceLayout, moh: bool) -> Result<Vec<Face>> {
    match layout {
        FaceLayout::Quake => decode_fixed(bytes, 20, "faces", |r| {
            let mut face = Face {
                plane: r.u16()? as i64,
                ..Face::default()
            };
            r.skip(2)?; // side
            face.first_edge = r.i32()? as i64;
            face.num_edges = r.u16()? as i64;
            face.tex_info = r.u16()? as i64;
            Ok(face)
        }),
        FaceLayout::Quake3 => {
            let stride = if moh { 108 } else { 104 };
            decode_fixed(bytes, stride, "faces", |r| {
                let mut face = Face {
                    texture: r.i32()? as i64,
                    ..Face::default()
                };
                r.skip(4)?; // effect
                face.face_type = r.i32()? as i64;
                face.first_vertex = r.i32()? as i64;
                face.num_vertices = r.i32()? as i64;
                face.first_index = r.i32()? as i64;
                face.num_indices = r.i32()? as i64;
                // Patch dimensions sit at the end of the lightmap block.
                r.seek(96);
                face.patch_size = [r.i32()? as i64, r.i32()? as i64];
                Ok(face)
            })
        }
        FaceLayout::Source => decode_fixed(bytes, 56, "faces", |r| {
            let mut face = Face {
                plane: r.u16()? as i64,
                ..Face::default()
            };
            r.skip(2)?; // side, on_node
            face.first_edge = r.i32()? as i64;
            face.num_edges = r.i16()? as i64;
            face.tex_info = r.i16()? as i64;
            face.disp_info = r.i16()? as i64;
            Ok(face)
        }),
        FaceLayout::SourceWide => decode_fixed(bytes, 72, "faces", |r| {
            let mut face = Face {
                plane: r.u32()? as i64,
                ..Face::default()
            };
            r.skip(4)?; // side, on_node, padding
            face.first_edge = r.i32()? as i64;
            face.num_edges = r.i32()? as i64;
            face.tex_info = r.i32()? as i64;
            face.disp_info = r.i32()? as i64;
            Ok(face)
        }),
        FaceLayout::Nightfire => decode_fixed(bytes, 48, "faces", |r| {
            let mut face = Face {
                plane: r.i32()? as i64,
                ..Face::default()
            };
            face.first_vertex = r.i32()? as i64;
            face.num_vertices = r.i32()? as i64;
            face.first_index = r.i32()? as i64;
            face.num_indices = r.i32()? as i64;
            face.flags = r.u32()?;
            face.texture = r.i32()? as i64;
            face.material = r.i32()? as i64;
            face.tex_info = r.i32()? as i64;
            Ok(face)
        }),
    }
}

// =============================================================================
// Brushes and sides
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct BspBrush {
    /// -1 for dialects that store sides contiguously without a reference.
    pub first_side: i64,
    pub num_sides: i64,
    pub contents: i32,
    /// Texture record index carrying the contents, for dialects that hang
    /// contents off the shader instead of the brush.
    pub texture: i64,
}

pub fn decode_brushes(bytes: &[u8], layout: BrushLayout) -> Result<Vec<BspBrush>> {
    match layout {
        BrushLayout::Quake2 => decode_fixed(bytes, 12, "brushes", |r| {
            Ok(BspBrush {
                first_side: r.i32()? as i64,
                num_sides: r.i32()? as i64,
                contents: r.i32()?,
                texture: -1,
            })
        }),
        BrushLayout::Quake3 => decode_fixed(bytes, 12, "brushes", |r| {
            Ok(BspBrush {
                first_side: r.i32()? as i64,
                num_sides: r.i32()? as i64,
                contents: 0,
                texture: r.i32()? as i64,
            })
        }),
        BrushLayout::Nightfire => decode_fixed(bytes, 12, "brushes", |r| {
            let contents = r.i32()?;
            Ok(BspBrush {
                first_side: r.i32()? as i64,
                num_sides: r.i32()? as i64,
                contents,
                texture: -1,
            })
        }),
        BrushLayout::Stef2 => decode_fixed(bytes, 8, "brushes", |r| {
            Ok(BspBrush {
                first_side: -1,
                num_sides: r.i32()? as i64,
                contents: 0,
                texture: r.i32()? as i64,
            })
        }),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BrushSide {
    pub plane: i64,
    pub tex_info: i64,
    pub texture: i64,
    pub face: i64,
    pub disp_info: i64,
    pub bevel: bool,
}

impl Default for BrushSide {
    fn default() -> BrushSide {
        BrushSide {
            plane: -1,
            tex_info: -1,
            texture: -1,
            face: -1,
            disp_info: -1,
            bevel: false,
        }
    }
}

pub fn decode_brush_sides(bytes: &[u8], layout: BrushSideLayout) -> Result<Vec<BrushSide>> {
    match layout {
        BrushSideLayout::Quake2 => decode_fixed(bytes, 4, "brush sides", |r| {
            Ok(BrushSide {
                plane: r.u16()? as i64,
                tex_info: r.i16()? as i64,
                ..BrushSide::default()
            })
        }),
        BrushSideLayout::Quake3 => decode_fixed(bytes, 8, "brush sides", |r| {
            Ok(BrushSide {
                plane: r.i32()? as i64,
                texture: r.i32()? as i64,
                ..BrushSide::default()
            })
        }),
        BrushSideLayout::Mohaa => decode_fixed(bytes, 12, "brush sides", |r| {
            Ok(BrushSide {
                plane: r.i32()? as i64,
                texture: r.i32()? as i64,
                ..BrushSide::default()
            })
        }),
        BrushSideLayout::Source => decode_fixed(bytes, 8, "brush sides", |r| {
            Ok(BrushSide {
                plane: r.u16()? as i64,
                tex_info: r.i16()? as i64,
                disp_info: r.i16()? as i64,
                bevel: r.i16()? != 0,
                ..BrushSide::default()
            })
        }),
        BrushSideLayout::SourceWide => decode_fixed(bytes, 16, "brush sides", |r| {
            Ok(BrushSide {
                plane: r.i32()? as i64,
                tex_info: r.i32()? as i64,
                disp_info: r.i32()? as i64,
                bevel: r.i32()? != 0,
                ..BrushSide::default()
            })
        }),
        BrushSideLayout::Nightfire => decode_fixed(bytes, 8, "brush sides", |r| {
            Ok(BrushSide {
                face: r.i32()? as i64,
                plane: r.i32()? as i64,
                ..BrushSide::default()
            })
        }),
    }
}

// =============================================================================
// Models / nodes / leaves
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Model {
    pub head_node: i64,
    pub first_face: i64,
    pub num_faces: i64,
    pub first_brush: i64,
    pub num_brushes: i64,
    pub first_leaf: i64,
    pub num_leaves: i64,
}

impl Default for Model {
    fn default() -> Model {
        Model {
            head_node: -1,
            first_face: -1,
            num_faces: 0,
            first_brush: -1,
            num_brushes: 0,
            first_leaf: -1,
            num_leaves: 0,
        }
    }
}

pub fn decode_models(bytes: &[u8], layout: ModelLayout) -> Result<Vec<Model>> {
    match layout {
        ModelLayout::Quake => decode_fixed(bytes, 64, "models", |r| {
            r.skip(36)?; // bounds + origin
            let head_node = r.i32()? as i64;
            r.skip(16)?; // remaining headnodes + visleafs
            Ok(Model {
                head_node,
                first_face: r.i32()? as i64,
                num_faces: r.i32()? as i64,
                ..Model::default()
            })
        }),
        ModelLayout::Quake2 => decode_fixed(bytes, 48, "models", |r| {
            r.skip(36)?; // bounds + origin
            Ok(Model {
                head_node: r.i32()? as i64,
                first_face: r.i32()? as i64,
                num_faces: r.i32()? as i64,
                ..Model::default()
            })
        }),
        ModelLayout::Quake3 => decode_fixed(bytes, 40, "models", |r| {
            r.skip(24)?; // bounds
            Ok(Model {
                first_face: r.i32()? as i64,
                num_faces: r.i32()? as i64,
                first_brush: r.i32()? as i64,
                num_brushes: r.i32()? as i64,
                ..Model::default()
            })
        }),
        ModelLayout::Nightfire => decode_fixed(bytes, 48, "models", |r| {
            r.skip(24)?; // bounds
            Ok(Model {
                first_face: r.i32()? as i64,
                num_faces: r.i32()? as i64,
                first_leaf: r.i32()? as i64,
                num_leaves: r.i32()? as i64,
                ..Model::default()
            })
        }),
    }
}

/// Two child references; a negative child c encodes leaf `-(c)-1`.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub children: [i64; 2],
}

pub fn decode_nodes(bytes: &[u8], layout: NodeLayout) -> Result<Vec<Node>> {
    let (stride, narrow) = match layout {
        NodeLayout::Quake => (24, true),
        NodeLayout::Quake2 => (28, false),
        NodeLayout::Quake3 => (36, false),
        NodeLayout::Source => (32, false),
    };
    decode_fixed(bytes, stride, "nodes", move |r| {
        r.skip(4)?; // plane
        let children = if narrow {
            [r.i16()? as i64, r.i16()? as i64]
        } else {
            [r.i32()? as i64, r.i32()? as i64]
        };
        Ok(Node { children })
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Leaf {
    pub contents: i32,
    pub first_leaf_face: i64,
    pub num_leaf_faces: i64,
    pub first_leaf_brush: i64,
    pub num_leaf_brushes: i64,
}

pub fn decode_leaves(bytes: &[u8], layout: LeafLayout) -> Result<Vec<Leaf>> {
    match layout {
        LeafLayout::Quake => decode_fixed(bytes, 28, "leaves", |r| {
            let contents = r.i32()?;
            r.seek(20);
            Ok(Leaf {
                contents,
                first_leaf_face: r.u16()? as i64,
                num_leaf_faces: r.u16()? as i64,
                first_leaf_brush: -1,
                num_leaf_brushes: 0,
            })
        }),
        LeafLayout::Quake2 => decode_fixed(bytes, 28, "leaves", |r| {
            let contents = r.i32()?;
            r.seek(20);
            Ok(Leaf {
                contents,
                first_leaf_face: r.u16()? as i64,
                num_leaf_faces: r.u16()? as i64,
                first_leaf_brush: r.u16()? as i64,
                num_leaf_brushes: r.u16()? as i64,
            })
        }),
        LeafLayout::Quake3 => decode_fixed(bytes, 48, "leaves", |r| {
            r.seek(32);
            Ok(Leaf {
                contents: 0,
                first_leaf_face: r.i32()? as i64,
                num_leaf_faces: r.i32()? as i64,
                first_leaf_brush: r.i32()? as i64,
                num_leaf_brushes: r.i32()? as i64,
            })
        }),
        LeafLayout::Source | LeafLayout::SourceV17 => {
            let stride = if layout == LeafLayout::SourceV17 { 56 } else { 32 };
            decode_fixed(bytes, stride, "leaves", move |r| {
                let contents = r.i32()?;
                r.seek(20);
                Ok(Leaf {
                    contents,
                    first_leaf_face: r.u16()? as i64,
                    num_leaf_faces: r.u16()? as i64,
                    first_leaf_brush: r.u16()? as i64,
                    num_leaf_brushes: r.u16()? as i64,
                })
            })
        }
    }
}

// =============================================================================
// Texture info / texture records
// =============================================================================

#[derive(Debug, Clone)]
pub struct TexInfo {
    pub u_axis: Vec3,
    pub u_shift: f32,
    pub v_axis: Vec3,
    pub v_shift: f32,
    pub flags: u32,
    /// Miptex (Quake), texdata (Source) or texture-lump reference.
    pub tex_data: i64,
    /// Inline name for the one family that stores it here (Quake 2).
    pub name: String,
}

pub fn decode_tex_infos(bytes: &[u8], layout: TexInfoLayout) -> Result<Vec<TexInfo>> {
    let axes = |r: &mut Reader| -> Result<(Vec3, f32, Vec3, f32)> {
        let u_axis = r.vec3()?;
        let u_shift = r.f32()?;
        let v_axis = r.vec3()?;
        let v_shift = r.f32()?;
        Ok((u_axis, u_shift, v_axis, v_shift))
    };
    match layout {
        TexInfoLayout::Quake => decode_fixed(bytes, 40, "texinfo", |r| {
            let (u_axis, u_shift, v_axis, v_shift) = axes(r)?;
            Ok(TexInfo {
                u_axis,
                u_shift,
                v_axis,
                v_shift,
                tex_data: r.i32()? as i64,
                flags: r.u32()?,
                name: String::new(),
            })
        }),
        TexInfoLayout::Quake2 => decode_fixed(bytes, 76, "texinfo", |r| {
            let (u_axis, u_shift, v_axis, v_shift) = axes(r)?;
            let flags = r.u32()?;
            r.skip(4)?; // value
            Ok(TexInfo {
                u_axis,
                u_shift,
                v_axis,
                v_shift,
                flags,
                tex_data: -1,
                name: r.fixed_string(32)?,
            })
        }),
        TexInfoLayout::Source => decode_fixed(bytes, 72, "texinfo", |r| {
            let (u_axis, u_shift, v_axis, v_shift) = axes(r)?;
            r.skip(32)?; // lightmap vecs
            Ok(TexInfo {
                u_axis,
                u_shift,
                v_axis,
                v_shift,
                flags: r.u32()?,
                tex_data: r.i32()? as i64,
                name: String::new(),
            })
        }),
        TexInfoLayout::Nightfire => decode_fixed(bytes, 32, "texinfo", |r| {
            let (u_axis, u_shift, v_axis, v_shift) = axes(r)?;
            Ok(TexInfo {
                u_axis,
                u_shift,
                v_axis,
                v_shift,
                flags: 0,
                tex_data: -1,
                name: String::new(),
            })
        }),
    }
}

/// A named texture/shader record; flags and contents are zero for dialects
/// that store names alone.
#[derive(Debug, Clone, Default)]
pub struct TextureRec {
    pub name: String,
    pub flags: u32,
    pub contents: i32,
}

pub fn decode_textures(bytes: &[u8], layout: TexturesLayout) -> Result<Vec<TextureRec>> {
    match layout {
        TexturesLayout::Miptex => {
            if bytes.is_empty() {
                return Ok(Vec::new());
            }
            let mut reader = Reader::new(bytes, "miptex directory");
            let count = reader.i32()?.max(0) as usize;
            let mut offsets = Vec::with_capacity(count);
            for _ in 0..count {
                offsets.push(reader.i32()?);
            }
            let mut out = Vec::with_capacity(count);
            for offset in offsets {
                if offset < 0 {
                    out.push(TextureRec::default());
                    continue;
                }
                let mut tex = Reader::new(bytes, "miptex");
                tex.seek(offset as usize);
                out.push(TextureRec {
                    name: tex.fixed_string(16)?,
                    ..TextureRec::default()
                });
            }
            Ok(out)
        }
        TexturesLayout::Records { record_size } => {
            decode_fixed(bytes, record_size, "textures", |r| {
                let name = r.fixed_string(64)?;
                let (flags, contents) = if record_size >= 72 {
                    (r.u32()?, r.i32()?)
                } else {
                    (0, 0)
                };
                Ok(TextureRec { name, flags, contents })
            })
        }
    }
}

/// Source texdata record; only the string-table reference matters for
/// reconstruction.
#[derive(Debug, Clone, Copy)]
pub struct TexData {
    pub name_table_id: i64,
}

pub fn decode_tex_datas(bytes: &[u8]) -> Result<Vec<TexData>> {
    decode_fixed(bytes, 32, "texdata", |r| {
        r.skip(12)?; // reflectivity
        Ok(TexData {
            name_table_id: r.i32()? as i64,
        })
    })
}

// =============================================================================
// Displacements / cubemaps / static props
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct DispInfo {
    pub start: Vec3,
    pub vert_start: i64,
    pub power: i32,
}

pub fn decode_disp_infos(bytes: &[u8]) -> Result<Vec<DispInfo>> {
    decode_fixed(bytes, 176, "dispinfo", |r| {
        let start = r.vec3()?;
        let vert_start = r.i32()? as i64;
        r.skip(4)?; // tri start
        let power = r.i32()?;
        Ok(DispInfo { start, vert_start, power })
    })
}

#[derive(Debug, Clone, Copy)]
pub struct DispVert {
    pub normal: Vec3,
    pub dist: f32,
    pub alpha: f32,
}

pub fn decode_disp_verts(bytes: &[u8]) -> Result<Vec<DispVert>> {
    decode_fixed(bytes, 20, "dispverts", |r| {
        Ok(DispVert {
            normal: r.vec3()?,
            dist: r.f32()?,
            alpha: r.f32()?,
        })
    })
}

#[derive(Debug, Clone, Copy)]
pub struct Cubemap {
    pub origin: Vec3,
    pub size: i32,
}

pub fn decode_cubemaps(bytes: &[u8]) -> Result<Vec<Cubemap>> {
    decode_fixed(bytes, 16, "cubemaps", |r| {
        let origin = Vec3 {
            x: r.i32()? as f32,
            y: r.i32()? as f32,
            z: r.i32()? as f32,
        };
        Ok(Cubemap { origin, size: r.i32()? })
    })
}

#[derive(Debug, Clone)]
pub struct StaticProp {
    pub origin: Vec3,
    pub angles: Vec3,
    pub model: String,
}

/// Decode the `sprp` sub-lump of the Source game lump. Sub-lump offsets
/// are absolute file offsets, so this needs the whole file. Prop record
/// strides grew across game-lump versions; the stride is inferred from
/// the remaining payload, which is how the historical tools coped too.
pub fn decode_static_props(file: &[u8], game_lump: &[u8]) -> Result<Vec<StaticProp>> {
    const SPRP: i32 = 0x7370_7270;

    if game_lump.is_empty() {
        return Ok(Vec::new());
    }
    let mut header = Reader::new(game_lump, "game lump");
    let count = header.i32()?.max(0) as usize;
    for _ in 0..count {
        let id = header.i32()?;
        header.skip(4)?; // flags, version
        let file_ofs = header.i32()?.max(0) as usize;
        let file_len = header.i32()?.max(0) as usize;
        if id != SPRP {
            continue;
        }
        let Some(payload) = file.get(file_ofs..file_ofs + file_len) else {
            return Ok(Vec::new());
        };
        return decode_sprp(payload);
    }
    Ok(Vec::new())
}

fn decode_sprp(payload: &[u8]) -> Result<Vec<StaticProp>> {
    let mut reader = Reader::new(payload, "static props");

    let dict_count = reader.i32()?.max(0) as usize;
    let mut dict = Vec::with_capacity(dict_count);
    for _ in 0..dict_count {
        dict.push(reader.fixed_string(128)?);
    }

    let leaf_count = reader.i32()?.max(0) as usize;
    reader.skip(leaf_count * 2)?;

    let prop_count = reader.i32()?.max(0) as usize;
    if prop_count == 0 {
        return Ok(Vec::new());
    }
    let stride = reader.remaining() / prop_count;
    if stride < 26 {
        return Ok(Vec::new());
    }

    let base = reader.pos();
    let mut props = Vec::with_capacity(prop_count);
    for i in 0..prop_count {
        reader.seek(base + i * stride);
        let origin = reader.vec3()?;
        let angles = reader.vec3()?;
        let prop_type = reader.u16()? as usize;
        props.push(StaticProp {
            origin,
            angles,
            model: dict.get(prop_type).cloned().unwrap_or_default(),
        });
    }
    Ok(props)
}
