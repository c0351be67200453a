// lib.rs — compiled BSP container: detection, lump directory, typed lumps.
//
// `BspFile::open` turns raw bytes into a fully decoded object graph in one
// pass. All variant knowledge is resolved up front into `VariantParams`;
// nothing downstream matches on the variant for layout decisions again.

pub mod entities;
pub mod error;
pub mod format;
pub mod lumps;
pub mod reader;
pub mod records;

use tracing::debug;

use crate::error::{BspError, Result};
use crate::format::{BspVariant, TexturesLayout, VariantParams};
use crate::lumps::{IndexList, LumpDirectory};
use crate::records::{
    BrushSide, BspBrush, Cubemap, DispInfo, DispVert, Edge, Face, Leaf, Model, Node, StaticProp,
    TexData, TexInfo, TextureRec,
};
use unbsp_common::map::Entity;
use unbsp_common::math::{Plane, Vec3};
use unbsp_common::SKIP_TEXTURE;

/// A decoded BSP file. Lumps a variant does not carry are simply empty.
#[derive(Debug)]
pub struct BspFile {
    pub params: VariantParams,
    pub entities: Vec<Entity>,
    pub planes: Vec<Plane>,
    pub textures: Vec<TextureRec>,
    /// Nightfire's parallel material-name lump.
    pub materials: Vec<TextureRec>,
    pub vertices: Vec<Vec3>,
    pub indices: IndexList,
    pub nodes: Vec<Node>,
    pub tex_infos: Vec<TexInfo>,
    pub faces: Vec<Face>,
    pub leaves: Vec<Leaf>,
    pub leaf_faces: IndexList,
    pub leaf_brushes: IndexList,
    pub edges: Vec<Edge>,
    pub surf_edges: IndexList,
    pub models: Vec<Model>,
    pub brushes: Vec<BspBrush>,
    pub brush_sides: Vec<BrushSide>,
    pub tex_datas: Vec<TexData>,
    /// Texdata names resolved through the Source string table at open time.
    pub tex_data_names: Vec<String>,
    pub disp_infos: Vec<DispInfo>,
    pub disp_verts: Vec<DispVert>,
    pub static_props: Vec<StaticProp>,
    pub cubemaps: Vec<Cubemap>,
}

impl BspFile {
    /// Decode a whole file. `hint` overrides header detection, which is the
    /// only way to reach variants whose headers collide with a more common
    /// dialect.
    pub fn open(bytes: &[u8], hint: Option<BspVariant>) -> Result<BspFile> {
        let variant = match hint.or_else(|| format::detect(bytes)) {
            Some(variant) => variant,
            None => return Err(BspError::UnrecognizedFormat),
        };
        let params = VariantParams::resolve(variant);
        let dir = LumpDirectory::parse(bytes, &params)?;
        let slots = params.slots;
        let wide_edges = params.edge_vertex_width.size() == 4;

        let entities = entities::parse_entities(dir.slice(bytes, slots.entities, "entities")?)?;
        let planes = records::decode_planes(dir.slice(bytes, slots.planes, "planes")?, params.plane)?;
        let textures =
            records::decode_textures(dir.slice(bytes, slots.textures, "textures")?, params.textures)?;
        let materials = records::decode_textures(
            dir.slice(bytes, slots.materials, "materials")?,
            TexturesLayout::Records { record_size: 64 },
        )?;
        let vertices =
            records::decode_vertices(dir.slice(bytes, slots.vertices, "vertices")?, params.vertex)?;
        let indices = IndexList::from_bytes(
            dir.slice(bytes, slots.indices, "indices")?,
            params.index_width,
        );
        let nodes = records::decode_nodes(dir.slice(bytes, slots.nodes, "nodes")?, params.node)?;
        let tex_infos =
            records::decode_tex_infos(dir.slice(bytes, slots.tex_info, "texinfo")?, params.tex_info)?;
        let faces = records::decode_faces(
            dir.slice(bytes, slots.faces, "faces")?,
            params.face,
            params.variant.is_moh(),
        )?;
        let leaves = records::decode_leaves(dir.slice(bytes, slots.leaves, "leaves")?, params.leaf)?;
        let leaf_faces = IndexList::from_bytes(
            dir.slice(bytes, slots.leaf_faces, "leaf faces")?,
            params.leaf_face_width,
        );
        let leaf_brushes = IndexList::from_bytes(
            dir.slice(bytes, slots.leaf_brushes, "leaf brushes")?,
            params.leaf_brush_width,
        );
        let edges = records::decode_edges(dir.slice(bytes, slots.edges, "edges")?, wide_edges)?;
        let surf_edges = IndexList::from_bytes(
            dir.slice(bytes, slots.surf_edges, "surfedges")?,
            params.surf_edge_width,
        );
        let models = records::decode_models(dir.slice(bytes, slots.models, "models")?, params.model)?;
        let brushes =
            records::decode_brushes(dir.slice(bytes, slots.brushes, "brushes")?, params.brush)?;
        let brush_sides = records::decode_brush_sides(
            dir.slice(bytes, slots.brush_sides, "brush sides")?,
            params.brush_side,
        )?;
        let tex_datas = records::decode_tex_datas(dir.slice(bytes, slots.tex_data, "texdata")?)?;
        let tex_data_names = resolve_tex_data_names(
            &tex_datas,
            &IndexList::from_bytes(
                dir.slice(bytes, slots.tex_data_string_table, "texdata string table")?,
                format::IntWidth::I32,
            ),
            dir.slice(bytes, slots.tex_data_string_data, "texdata string data")?,
        );
        let disp_infos =
            records::decode_disp_infos(dir.slice(bytes, slots.disp_info, "dispinfo")?)?;
        let disp_verts =
            records::decode_disp_verts(dir.slice(bytes, slots.disp_verts, "dispverts")?)?;
        let static_props =
            records::decode_static_props(bytes, dir.slice(bytes, slots.game_lump, "game lump")?)?;
        let cubemaps = records::decode_cubemaps(dir.slice(bytes, slots.cubemaps, "cubemaps")?)?;

        debug!(
            ?variant,
            entities = entities.len(),
            faces = faces.len(),
            brushes = brushes.len(),
            models = models.len(),
            "decoded bsp"
        );

        Ok(BspFile {
            params,
            entities,
            planes,
            textures,
            materials,
            vertices,
            indices,
            nodes,
            tex_infos,
            faces,
            leaves,
            leaf_faces,
            leaf_brushes,
            edges,
            surf_edges,
            models,
            brushes,
            brush_sides,
            tex_datas,
            tex_data_names,
            disp_infos,
            disp_verts,
            static_props,
            cubemaps,
        })
    }

    pub fn variant(&self) -> BspVariant {
        self.params.variant
    }

    /// Texture-lump name by record index; None when out of range or the
    /// variant has no texture lump.
    pub fn texture_name(&self, index: i64) -> Option<&str> {
        if index < 0 {
            return None;
        }
        self.textures.get(index as usize).map(|t| t.name.as_str())
    }

    pub fn material_name(&self, index: i64) -> Option<&str> {
        if index < 0 {
            return None;
        }
        self.materials.get(index as usize).map(|t| t.name.as_str())
    }

    /// Source texdata name, already string-table resolved. Unresolvable
    /// references map to the skip placeholder instead of failing the file.
    pub fn tex_data_name(&self, tex_data: i64) -> &str {
        if tex_data < 0 {
            return SKIP_TEXTURE;
        }
        self.tex_data_names
            .get(tex_data as usize)
            .map(String::as_str)
            .unwrap_or(SKIP_TEXTURE)
    }
}

fn resolve_tex_data_names(tex_datas: &[TexData], table: &IndexList, data: &[u8]) -> Vec<String> {
    tex_datas
        .iter()
        .map(|td| {
            let offset = match td.name_table_id {
                id if id >= 0 => table.get(id as usize),
                _ => None,
            };
            let Some(offset) = offset.filter(|&o| o >= 0 && (o as usize) < data.len()) else {
                return SKIP_TEXTURE.to_string();
            };
            let tail = &data[offset as usize..];
            let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
            String::from_utf8_lossy(&tail[..end]).into_owned()
        })
        .collect()
}
