// format.rs — format variants, families, and the per-variant parameter table.
//
// Roughly thirty compiler dialects are distinguished here. Instead of
// re-matching on the variant deep inside geometry code, everything that
// differs between dialects (lump directory layout, record strides, index
// widths, content-flag meanings) is resolved once, at open time, into a
// `VariantParams` value that downstream code consumes uniformly.

use bitflags::bitflags;

/// One tag per supported compiler/engine dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BspVariant {
    // Quake lineage (versionless magic, version 29/30)
    Quake,
    GoldSrc,
    /// Half-Life: Blue Shift. Identical to GoldSrc except the entity and
    /// plane lumps trade places; selectable only by explicit override.
    BlueShift,
    Quake64,

    // Quake 2 lineage (IBSP 38..46)
    Quake2,
    Daikatana,
    /// Soldier of Fortune shares IBSP 46 with Quake 3; explicit-only.
    SoldierOfFortune,
    Sin,

    // Quake 3 lineage
    Quake3,
    RtcW,
    WolfEt,
    CoD,
    Raven,
    Stef2,
    Stef2Demo,
    Mohaa,
    MohaaDemo,
    Fakk2,
    Alice,
    /// 007: Nightfire. Version 42 with no magic string.
    Nightfire,

    // Source lineage (VBSP 17..27)
    Source17,
    Source18,
    Source19,
    Source20,
    Source21,
    Source22,
    Source23,
    Source24,
    Source25,
    Source26,
    Source27,
    /// Header-identical to Source20; explicit-only.
    Vindictus,
    /// Dark Messiah of Might and Magic; doubled (id, version) header.
    DMoMaM,
}

/// The coarse family relation: which lineage's conventions a variant
/// follows where they did not diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BspFamily {
    Quake,
    Quake2,
    Quake3,
    Source,
}

impl BspVariant {
    pub fn family(self) -> BspFamily {
        use BspVariant::*;
        match self {
            Quake | GoldSrc | BlueShift | Quake64 => BspFamily::Quake,
            Quake2 | Daikatana | SoldierOfFortune | Sin => BspFamily::Quake2,
            Quake3 | RtcW | WolfEt | CoD | Raven | Stef2 | Stef2Demo | Mohaa | MohaaDemo
            | Fakk2 | Alice | Nightfire => BspFamily::Quake3,
            Source17 | Source18 | Source19 | Source20 | Source21 | Source22 | Source23
            | Source24 | Source25 | Source26 | Source27 | Vindictus | DMoMaM => BspFamily::Source,
        }
    }

    pub fn is_source(self) -> bool {
        self.family() == BspFamily::Source
    }

    pub fn is_moh(self) -> bool {
        matches!(self, BspVariant::Mohaa | BspVariant::MohaaDemo)
    }

    pub fn is_stef(self) -> bool {
        matches!(self, BspVariant::Stef2 | BspVariant::Stef2Demo)
    }

    pub fn is_cod(self) -> bool {
        matches!(self, BspVariant::CoD)
    }

    pub fn is_nightfire(self) -> bool {
        matches!(self, BspVariant::Nightfire)
    }

    /// Dialects whose brush records carry no side reference; sides are
    /// stored contiguously and consumed with a running cursor.
    pub fn sides_are_contiguous(self) -> bool {
        self.is_stef()
    }

    /// Parse a variant name as given on the command line.
    pub fn from_name(name: &str) -> Option<BspVariant> {
        use BspVariant::*;
        let variant = match name.to_ascii_lowercase().as_str() {
            "quake" => Quake,
            "goldsrc" => GoldSrc,
            "blueshift" => BlueShift,
            "quake64" => Quake64,
            "quake2" => Quake2,
            "daikatana" => Daikatana,
            "sof" => SoldierOfFortune,
            "sin" => Sin,
            "quake3" => Quake3,
            "rtcw" => RtcW,
            "wolfet" => WolfEt,
            "cod" => CoD,
            "raven" => Raven,
            "stef2" => Stef2,
            "stef2demo" => Stef2Demo,
            "mohaa" => Mohaa,
            "mohaademo" => MohaaDemo,
            "fakk2" => Fakk2,
            "alice" => Alice,
            "nightfire" => Nightfire,
            "source17" => Source17,
            "source18" => Source18,
            "source19" => Source19,
            "source20" => Source20,
            "source21" => Source21,
            "source22" => Source22,
            "source23" => Source23,
            "source24" => Source24,
            "source25" => Source25,
            "source26" => Source26,
            "source27" => Source27,
            "vindictus" => Vindictus,
            "dmomam" => DMoMaM,
            _ => return None,
        };
        Some(variant)
    }
}

/// Inspect a file's magic signature/header and pick a variant, or None if
/// nothing matches. Variants whose headers collide with a more common one
/// (BlueShift, SoldierOfFortune, WolfEt, Vindictus, Quake64, DMoMaM) are
/// reachable only through an explicit override.
pub fn detect(bytes: &[u8]) -> Option<BspVariant> {
    if bytes.len() < 8 {
        return None;
    }
    let magic = &bytes[0..4];
    let version = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    match magic {
        b"IBSP" => match version {
            38 => Some(BspVariant::Quake2),
            41 => Some(BspVariant::Daikatana),
            46 => Some(BspVariant::Quake3),
            47 => Some(BspVariant::RtcW),
            59 => Some(BspVariant::CoD),
            _ => None,
        },
        b"RBSP" => Some(BspVariant::Raven),
        b"VBSP" => match version {
            17 => Some(BspVariant::Source17),
            18 => Some(BspVariant::Source18),
            19 => Some(BspVariant::Source19),
            20 => Some(BspVariant::Source20),
            21 => Some(BspVariant::Source21),
            22 => Some(BspVariant::Source22),
            23 => Some(BspVariant::Source23),
            24 => Some(BspVariant::Source24),
            25 => Some(BspVariant::Source25),
            26 => Some(BspVariant::Source26),
            27 => Some(BspVariant::Source27),
            _ => None,
        },
        b"EF2!" => match version {
            19 => Some(BspVariant::Stef2Demo),
            20 => Some(BspVariant::Stef2),
            _ => None,
        },
        b"FAKK" => match version {
            12 => Some(BspVariant::Fakk2),
            42 => Some(BspVariant::Alice),
            _ => None,
        },
        b"2015" => match version {
            18 => Some(BspVariant::MohaaDemo),
            19 => Some(BspVariant::Mohaa),
            _ => None,
        },
        b"SiN!" => Some(BspVariant::Sin),
        _ => {
            // Versionless headers: the first i32 is the version itself.
            let version = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            match version {
                29 => Some(BspVariant::Quake),
                30 => Some(BspVariant::GoldSrc),
                42 => Some(BspVariant::Nightfire),
                _ => None,
            }
        }
    }
}

// =============================================================================
// Content and surface flags
// =============================================================================

bitflags! {
    /// Brush content flags as used by the id/Source lineage.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IdContents: u32 {
        const SOLID = 0x1;
        const WATER = 0x20;
        const PLAYER_CLIP = 0x1_0000;
        const DETAIL = 0x800_0000;
    }
}

bitflags! {
    /// Brush content flags in the Nightfire fork, which renumbered them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NightfireContents: u32 {
        const SOLID = 0x1;
        const DETAIL = 0x200;
        const WATER = 0x10_0000;
    }
}

bitflags! {
    /// Surface flags checked by the writer layer (special-texture
    /// replacement, face-flag stripping).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SurfFlags: u32 {
        const SKY = 0x4;
        const NODRAW = 0x80;
        const HINT = 0x100;
        const SKIP = 0x200;
    }
}

/// Which scheme a variant's brush contents follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentsStyle {
    /// Vanilla Quake: leaf contents, where -3 means water. No detail bit.
    Quake,
    /// id lineage and Source.
    Id,
    /// The Nightfire consumer-engine fork.
    Nightfire,
}

impl ContentsStyle {
    pub fn is_detail(self, contents: i32) -> bool {
        match self {
            ContentsStyle::Quake => false,
            ContentsStyle::Id => IdContents::from_bits_retain(contents as u32).contains(IdContents::DETAIL),
            ContentsStyle::Nightfire => {
                NightfireContents::from_bits_retain(contents as u32).contains(NightfireContents::DETAIL)
            }
        }
    }

    pub fn is_water(self, contents: i32) -> bool {
        match self {
            ContentsStyle::Quake => contents == -3,
            ContentsStyle::Id => IdContents::from_bits_retain(contents as u32).contains(IdContents::WATER),
            ContentsStyle::Nightfire => {
                NightfireContents::from_bits_retain(contents as u32).contains(NightfireContents::WATER)
            }
        }
    }
}

// =============================================================================
// Record layout selectors
// =============================================================================

/// Integer width/signedness of a generic index-list lump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    I64,
}

impl IntWidth {
    pub fn size(self) -> usize {
        match self {
            IntWidth::U8 | IntWidth::I8 => 1,
            IntWidth::U16 | IntWidth::I16 => 2,
            IntWidth::U32 | IntWidth::I32 => 4,
            IntWidth::I64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneLayout {
    /// normal, dist, axial-type tag. 20 bytes.
    WithType,
    /// normal, dist. 16 bytes (Quake 3 lineage).
    Bare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayout {
    /// Bare position. 12 bytes.
    Plain,
    /// Quake 3 drawvert: position + st + lightmap st + normal + color. 44 bytes.
    DrawVert,
    /// Raven drawvert with four lightmap channels. 80 bytes.
    RavenDrawVert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLayout {
    /// plane u16, side u16, firstedge i32, numedges u16, texinfo u16,
    /// styles[4], lightofs i32. 20 bytes.
    Quake,
    /// texture, effect, type, firstvert, numverts, firstindex, numindices,
    /// lightmap block, origin/vecs, patch dims. 104 bytes (108 with the
    /// MoH extension).
    Quake3,
    /// Source v17+ face. 56 bytes.
    Source,
    /// All-i32 Source face. 72 bytes (Vindictus).
    SourceWide,
    /// Nightfire: all-i32 record with vertex and index ranges. 48 bytes.
    Nightfire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLayout {
    /// plane i32, children i16 x2, bounds i16 x6, face range u16 x2. 24 bytes.
    Quake,
    /// plane i32, children i32 x2, bounds i16 x6, face range u16 x2. 28 bytes.
    Quake2,
    /// plane i32, children i32 x2, bounds i32 x6. 36 bytes.
    Quake3,
    /// Quake2 shape + area/padding. 32 bytes.
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafLayout {
    /// contents i32, vis i32, bounds i16 x6, marksurface range u16 x2,
    /// ambient[4]. 28 bytes. No brush references.
    Quake,
    /// contents i32, cluster i16, area i16, bounds i16 x6, leafface range
    /// u16 x2, leafbrush range u16 x2. 28 bytes.
    Quake2,
    /// cluster i32, area i32, bounds i32 x6, leafface range i32 x2,
    /// leafbrush range i32 x2. 48 bytes.
    Quake3,
    /// Source v20+: Quake2 shape + water data id + padding. 32 bytes.
    Source,
    /// Source v17-19 with embedded ambient lighting. 56 bytes.
    SourceV17,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushLayout {
    /// firstside i32, numsides i32, contents i32.
    Quake2,
    /// firstside i32, numsides i32, texture i32.
    Quake3,
    /// contents i32, firstside i32, numsides i32.
    Nightfire,
    /// numsides i32, texture i32; no side reference (running cursor).
    Stef2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushSideLayout {
    /// plane u16, texinfo i16. 4 bytes.
    Quake2,
    /// plane i32, texture i32. 8 bytes.
    Quake3,
    /// plane i32, texture i32, face i32. 12 bytes (Raven drops the face).
    Mohaa,
    /// plane u16, texinfo i16, dispinfo i16, bevel i16. 8 bytes.
    Source,
    /// All-i32 Source shape. 16 bytes (Vindictus).
    SourceWide,
    /// face i32, plane i32. 8 bytes.
    Nightfire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelLayout {
    /// bounds f32 x6, origin, headnodes i32 x4, visleafs, face range. 64 bytes.
    Quake,
    /// bounds f32 x6, origin, headnode i32, face range i32 x2. 48 bytes.
    Quake2,
    /// bounds f32 x6, face range i32 x2, brush range i32 x2. 40 bytes.
    Quake3,
    /// bounds f32 x6, face range i32 x2, leaf range i32 x2. 48 bytes.
    Nightfire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexInfoLayout {
    /// axes 32 bytes, miptex i32, flags i32. 40 bytes.
    Quake,
    /// axes 32 bytes, flags i32, value i32, name char[32], next i32. 76 bytes.
    Quake2,
    /// axes, lightmap axes, flags i32, texdata i32. 72 bytes.
    Source,
    /// bare axes. 32 bytes (Nightfire texmatrix).
    Nightfire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexturesLayout {
    /// Miptex directory: count, offsets, 16-char names (Quake/GoldSrc).
    Miptex,
    /// 64-char name records, usually name + flags + contents.
    /// `record_size` distinguishes the variants.
    Records { record_size: usize },
}

// =============================================================================
// Lump slots
// =============================================================================

/// Directory slot for every logical lump a variant may carry. `None` means
/// the dialect has no such lump.
#[derive(Debug, Clone, Copy, Default)]
pub struct LumpSlots {
    pub entities: Option<usize>,
    pub planes: Option<usize>,
    pub textures: Option<usize>,
    pub materials: Option<usize>,
    pub vertices: Option<usize>,
    pub indices: Option<usize>,
    pub nodes: Option<usize>,
    pub tex_info: Option<usize>,
    pub faces: Option<usize>,
    pub leaves: Option<usize>,
    pub leaf_faces: Option<usize>,
    pub leaf_brushes: Option<usize>,
    pub edges: Option<usize>,
    pub surf_edges: Option<usize>,
    pub models: Option<usize>,
    pub brushes: Option<usize>,
    pub brush_sides: Option<usize>,
    pub tex_data: Option<usize>,
    pub tex_data_string_table: Option<usize>,
    pub tex_data_string_data: Option<usize>,
    pub disp_info: Option<usize>,
    pub disp_verts: Option<usize>,
    pub game_lump: Option<usize>,
    pub cubemaps: Option<usize>,
    pub terrain: Option<usize>,
}

/// All layout knowledge for one variant, resolved once at open time.
#[derive(Debug, Clone)]
pub struct VariantParams {
    pub variant: BspVariant,
    pub family: BspFamily,
    /// Byte offset of the first lump directory entry.
    pub dir_offset: usize,
    pub lump_count: usize,
    /// Size of one directory entry; offset and length are always the first
    /// two i32 fields.
    pub dir_entry_size: usize,
    pub slots: LumpSlots,
    pub plane: PlaneLayout,
    pub vertex: VertexLayout,
    pub face: FaceLayout,
    pub node: NodeLayout,
    pub leaf: LeafLayout,
    pub brush: BrushLayout,
    pub brush_side: BrushSideLayout,
    pub model: ModelLayout,
    pub tex_info: TexInfoLayout,
    pub textures: TexturesLayout,
    pub contents: ContentsStyle,
    pub leaf_brush_width: IntWidth,
    pub leaf_face_width: IntWidth,
    pub surf_edge_width: IntWidth,
    pub index_width: IntWidth,
    /// Width of one vertex index inside an edge record.
    pub edge_vertex_width: IntWidth,
}

impl VariantParams {
    pub fn resolve(variant: BspVariant) -> VariantParams {
        match variant.family() {
            BspFamily::Quake => quake_params(variant),
            BspFamily::Quake2 => quake2_params(variant),
            BspFamily::Quake3 => quake3_params(variant),
            BspFamily::Source => source_params(variant),
        }
    }
}

fn quake_params(variant: BspVariant) -> VariantParams {
    let mut slots = LumpSlots {
        entities: Some(0),
        planes: Some(1),
        textures: Some(2),
        vertices: Some(3),
        nodes: Some(5),
        tex_info: Some(6),
        faces: Some(7),
        leaves: Some(10),
        leaf_faces: Some(11),
        edges: Some(12),
        surf_edges: Some(13),
        models: Some(14),
        ..LumpSlots::default()
    };
    if variant == BspVariant::BlueShift {
        // The one thing Blue Shift changed: entities and planes trade slots.
        slots.entities = Some(1);
        slots.planes = Some(0);
    }
    VariantParams {
        variant,
        family: BspFamily::Quake,
        dir_offset: 4,
        lump_count: 15,
        dir_entry_size: 8,
        slots,
        plane: PlaneLayout::WithType,
        vertex: VertexLayout::Plain,
        face: FaceLayout::Quake,
        node: NodeLayout::Quake,
        leaf: LeafLayout::Quake,
        brush: BrushLayout::Quake2,
        brush_side: BrushSideLayout::Quake2,
        model: ModelLayout::Quake,
        tex_info: TexInfoLayout::Quake,
        textures: TexturesLayout::Miptex,
        contents: ContentsStyle::Quake,
        leaf_brush_width: IntWidth::U16,
        leaf_face_width: IntWidth::U16,
        surf_edge_width: IntWidth::I32,
        index_width: IntWidth::U32,
        edge_vertex_width: IntWidth::U16,
    }
}

fn quake2_params(variant: BspVariant) -> VariantParams {
    let slots = LumpSlots {
        entities: Some(0),
        planes: Some(1),
        vertices: Some(2),
        nodes: Some(4),
        tex_info: Some(5),
        faces: Some(6),
        leaves: Some(8),
        leaf_faces: Some(9),
        leaf_brushes: Some(10),
        edges: Some(11),
        surf_edges: Some(12),
        models: Some(13),
        brushes: Some(14),
        brush_sides: Some(15),
        ..LumpSlots::default()
    };
    VariantParams {
        variant,
        family: BspFamily::Quake2,
        dir_offset: 8,
        lump_count: 19,
        dir_entry_size: 8,
        slots,
        plane: PlaneLayout::WithType,
        vertex: VertexLayout::Plain,
        face: FaceLayout::Quake,
        node: NodeLayout::Quake2,
        leaf: LeafLayout::Quake2,
        brush: BrushLayout::Quake2,
        brush_side: BrushSideLayout::Quake2,
        model: ModelLayout::Quake2,
        tex_info: TexInfoLayout::Quake2,
        textures: TexturesLayout::Records { record_size: 64 },
        contents: ContentsStyle::Id,
        leaf_brush_width: IntWidth::U16,
        leaf_face_width: IntWidth::U16,
        surf_edge_width: IntWidth::I32,
        index_width: IntWidth::U32,
        edge_vertex_width: IntWidth::U16,
    }
}

fn quake3_params(variant: BspVariant) -> VariantParams {
    use BspVariant::*;

    if variant == Nightfire {
        return VariantParams {
            variant,
            family: BspFamily::Quake3,
            dir_offset: 4,
            lump_count: 18,
            dir_entry_size: 8,
            slots: LumpSlots {
                entities: Some(0),
                planes: Some(1),
                textures: Some(2),
                materials: Some(3),
                vertices: Some(4),
                indices: Some(6),
                nodes: Some(8),
                faces: Some(9),
                leaves: Some(11),
                leaf_faces: Some(12),
                leaf_brushes: Some(13),
                models: Some(14),
                brushes: Some(15),
                brush_sides: Some(16),
                tex_info: Some(17),
                ..LumpSlots::default()
            },
            plane: PlaneLayout::WithType,
            vertex: VertexLayout::Plain,
            face: FaceLayout::Nightfire,
            node: NodeLayout::Quake2,
            leaf: LeafLayout::Quake2,
            brush: BrushLayout::Nightfire,
            brush_side: BrushSideLayout::Nightfire,
            model: ModelLayout::Nightfire,
            tex_info: TexInfoLayout::Nightfire,
            textures: TexturesLayout::Records { record_size: 64 },
            contents: ContentsStyle::Nightfire,
            leaf_brush_width: IntWidth::U32,
            leaf_face_width: IntWidth::U32,
            surf_edge_width: IntWidth::I32,
            index_width: IntWidth::U32,
            edge_vertex_width: IntWidth::U32,
        };
    }

    // Baseline Quake 3 directory; the offshoots mostly reshuffle slots.
    let slots = if variant.is_moh() {
        LumpSlots {
            textures: Some(0),
            planes: Some(1),
            faces: Some(3),
            vertices: Some(4),
            indices: Some(5),
            leaf_brushes: Some(6),
            leaf_faces: Some(7),
            leaves: Some(8),
            nodes: Some(9),
            brush_sides: Some(11),
            brushes: Some(12),
            models: Some(13),
            entities: Some(14),
            terrain: Some(16),
            ..LumpSlots::default()
        }
    } else if variant.is_stef() {
        LumpSlots {
            textures: Some(0),
            planes: Some(1),
            faces: Some(5),
            vertices: Some(6),
            indices: Some(7),
            leaf_brushes: Some(8),
            leaf_faces: Some(9),
            leaves: Some(10),
            nodes: Some(11),
            brush_sides: Some(12),
            brushes: Some(13),
            models: Some(15),
            entities: Some(16),
            ..LumpSlots::default()
        }
    } else if variant == Fakk2 || variant == Alice {
        LumpSlots {
            textures: Some(0),
            planes: Some(1),
            faces: Some(3),
            vertices: Some(4),
            indices: Some(5),
            leaf_brushes: Some(6),
            leaf_faces: Some(7),
            leaves: Some(8),
            nodes: Some(9),
            brush_sides: Some(10),
            brushes: Some(11),
            models: Some(13),
            entities: Some(14),
            ..LumpSlots::default()
        }
    } else if variant == CoD {
        LumpSlots {
            textures: Some(0),
            planes: Some(2),
            brush_sides: Some(3),
            brushes: Some(4),
            models: Some(27),
            leaves: Some(21),
            leaf_brushes: Some(22),
            nodes: Some(20),
            entities: Some(29),
            ..LumpSlots::default()
        }
    } else {
        // Quake3, RtcW, WolfEt, Raven
        LumpSlots {
            entities: Some(0),
            textures: Some(1),
            planes: Some(2),
            nodes: Some(3),
            leaves: Some(4),
            leaf_faces: Some(5),
            leaf_brushes: Some(6),
            models: Some(7),
            brushes: Some(8),
            brush_sides: Some(9),
            vertices: Some(10),
            indices: Some(11),
            faces: Some(13),
            ..LumpSlots::default()
        }
    };

    let lump_count = match variant {
        Mohaa | MohaaDemo => 28,
        Stef2 | Stef2Demo => 30,
        Fakk2 | Alice => 20,
        CoD => 31,
        Raven => 18,
        _ => 17,
    };

    VariantParams {
        variant,
        family: BspFamily::Quake3,
        dir_offset: 8,
        lump_count,
        dir_entry_size: 8,
        slots,
        plane: PlaneLayout::Bare,
        vertex: if variant == Raven {
            VertexLayout::RavenDrawVert
        } else {
            VertexLayout::DrawVert
        },
        face: FaceLayout::Quake3,
        node: NodeLayout::Quake3,
        leaf: LeafLayout::Quake3,
        brush: if variant.is_stef() {
            BrushLayout::Stef2
        } else {
            BrushLayout::Quake3
        },
        brush_side: if variant.is_moh() {
            BrushSideLayout::Mohaa
        } else {
            BrushSideLayout::Quake3
        },
        model: ModelLayout::Quake3,
        tex_info: TexInfoLayout::Quake,
        textures: TexturesLayout::Records { record_size: 72 },
        contents: ContentsStyle::Id,
        leaf_brush_width: IntWidth::I32,
        leaf_face_width: IntWidth::I32,
        surf_edge_width: IntWidth::I32,
        index_width: IntWidth::I32,
        edge_vertex_width: IntWidth::U32,
    }
}

fn source_params(variant: BspVariant) -> VariantParams {
    use BspVariant::*;
    let slots = LumpSlots {
        entities: Some(0),
        planes: Some(1),
        tex_data: Some(2),
        vertices: Some(3),
        nodes: Some(5),
        tex_info: Some(6),
        faces: Some(7),
        leaves: Some(10),
        edges: Some(12),
        surf_edges: Some(13),
        models: Some(14),
        leaf_faces: Some(16),
        leaf_brushes: Some(17),
        brushes: Some(18),
        brush_sides: Some(19),
        disp_info: Some(26),
        disp_verts: Some(33),
        game_lump: Some(35),
        cubemaps: Some(42),
        tex_data_string_data: Some(43),
        tex_data_string_table: Some(44),
        ..LumpSlots::default()
    };
    let wide = variant == Vindictus;
    VariantParams {
        variant,
        family: BspFamily::Source,
        // VBSP id + version, then 64 entries of (offset, length, version,
        // fourCC). DMoMaM doubles the id/version pair.
        dir_offset: if variant == DMoMaM { 12 } else { 8 },
        lump_count: 64,
        dir_entry_size: 16,
        slots,
        plane: PlaneLayout::WithType,
        vertex: VertexLayout::Plain,
        face: if wide {
            FaceLayout::SourceWide
        } else {
            FaceLayout::Source
        },
        node: NodeLayout::Source,
        leaf: match variant {
            Source17 | Source18 | Source19 => LeafLayout::SourceV17,
            _ => LeafLayout::Source,
        },
        brush: BrushLayout::Quake2,
        brush_side: if wide {
            BrushSideLayout::SourceWide
        } else {
            BrushSideLayout::Source
        },
        model: ModelLayout::Quake2,
        tex_info: TexInfoLayout::Source,
        textures: TexturesLayout::Records { record_size: 32 },
        contents: ContentsStyle::Id,
        leaf_brush_width: if wide { IntWidth::U32 } else { IntWidth::U16 },
        leaf_face_width: if wide { IntWidth::U32 } else { IntWidth::U16 },
        surf_edge_width: IntWidth::I32,
        index_width: IntWidth::U32,
        edge_vertex_width: if wide { IntWidth::U32 } else { IntWidth::U16 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(magic: &[u8; 4], version: i32) -> Vec<u8> {
        let mut bytes = magic.to_vec();
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes
    }

    #[test]
    fn test_detect_magic_variants() {
        assert_eq!(detect(&header(b"IBSP", 38)), Some(BspVariant::Quake2));
        assert_eq!(detect(&header(b"IBSP", 46)), Some(BspVariant::Quake3));
        assert_eq!(detect(&header(b"IBSP", 59)), Some(BspVariant::CoD));
        assert_eq!(detect(&header(b"RBSP", 1)), Some(BspVariant::Raven));
        assert_eq!(detect(&header(b"VBSP", 20)), Some(BspVariant::Source20));
        assert_eq!(detect(&header(b"EF2!", 20)), Some(BspVariant::Stef2));
        assert_eq!(detect(&header(b"2015", 19)), Some(BspVariant::Mohaa));
    }

    #[test]
    fn test_detect_versionless_variants() {
        let mut bytes = 29i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 4]);
        assert_eq!(detect(&bytes), Some(BspVariant::Quake));
        bytes[0] = 30;
        assert_eq!(detect(&bytes), Some(BspVariant::GoldSrc));
        bytes[0] = 42;
        assert_eq!(detect(&bytes), Some(BspVariant::Nightfire));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect(&header(b"IBSP", 99)), None);
        assert_eq!(detect(&header(b"XXXX", 7)), None);
        assert_eq!(detect(&[1, 2]), None);
    }

    #[test]
    fn test_blueshift_swaps_entities_and_planes() {
        let goldsrc = VariantParams::resolve(BspVariant::GoldSrc);
        let blueshift = VariantParams::resolve(BspVariant::BlueShift);
        assert_eq!(goldsrc.slots.entities, Some(0));
        assert_eq!(blueshift.slots.entities, Some(1));
        assert_eq!(blueshift.slots.planes, Some(0));
    }

    #[test]
    fn test_contents_styles() {
        assert!(ContentsStyle::Quake.is_water(-3));
        assert!(!ContentsStyle::Quake.is_detail(0x800_0000));
        assert!(ContentsStyle::Id.is_detail(0x800_0000));
        assert!(ContentsStyle::Id.is_water(0x20));
        assert!(ContentsStyle::Nightfire.is_detail(0x200));
        assert!(ContentsStyle::Nightfire.is_water(0x10_0000));
    }

    #[test]
    fn test_family_predicates() {
        assert_eq!(BspVariant::Vindictus.family(), BspFamily::Source);
        assert!(BspVariant::Mohaa.is_moh());
        assert!(BspVariant::CoD.is_cod());
        assert!(BspVariant::Stef2.sides_are_contiguous());
        assert!(!BspVariant::Quake3.sides_are_contiguous());
    }

    #[test]
    fn test_vindictus_widens_records() {
        let params = VariantParams::resolve(BspVariant::Vindictus);
        assert_eq!(params.face, FaceLayout::SourceWide);
        assert_eq!(params.brush_side, BrushSideLayout::SourceWide);
        assert_eq!(params.leaf_brush_width, IntWidth::U32);

        let stock = VariantParams::resolve(BspVariant::Source20);
        assert_eq!(stock.face, FaceLayout::Source);
    }

    #[test]
    fn test_variant_names_roundtrip() {
        for name in ["quake", "goldsrc", "nightfire", "source20", "vindictus", "mohaa"] {
            assert!(BspVariant::from_name(name).is_some(), "{name}");
        }
        assert!(BspVariant::from_name("doom").is_none());
    }
}
