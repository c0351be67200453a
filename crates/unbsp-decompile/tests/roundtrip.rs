// roundtrip.rs — decode -> reconstruct -> serialize over minimal synthetic
// containers, one per family and brush-resolution strategy.
//
// Each builder assembles a real header, lump directory and just enough lump
// payload to describe one world solid, exercising a different brush-set
// path: Quake 3 resolves a direct brush range, Quake 2 walks a headnode
// tree, Nightfire walks a leaf range, Quake has no brush lump at all and
// extrudes faces, Source adds a displacement on top of the tree walk.

use unbsp_bsp::format::BspVariant;
use unbsp_bsp::BspFile;
use unbsp_common::math::{vec3, Vec3};
use unbsp_decompile::{decompile, NullSink, Settings};
use unbsp_write::Dialect;

// =============================================================================
// Byte building
// =============================================================================

#[derive(Default)]
struct Buf(Vec<u8>);

impl Buf {
    fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    fn vec3(&mut self, v: Vec3) -> &mut Self {
        self.f32(v.x).f32(v.y).f32(v.z)
    }
    fn name(&mut self, s: &str, len: usize) -> &mut Self {
        let mut field = vec![0u8; len];
        field[..s.len()].copy_from_slice(s.as_bytes());
        self.0.extend_from_slice(&field);
        self
    }
    fn pad_to(&mut self, len: usize) -> &mut Self {
        assert!(self.0.len() <= len);
        self.0.resize(len, 0);
        self
    }
    fn zeros(&mut self, count: usize) -> &mut Self {
        self.0.extend(std::iter::repeat(0u8).take(count));
        self
    }
}

/// Assemble header + directory + payloads for one synthetic file.
struct FileBuilder {
    header: Vec<u8>,
    entry_size: usize,
    lumps: Vec<Vec<u8>>,
}

impl FileBuilder {
    fn new(header: Vec<u8>, lump_count: usize, entry_size: usize) -> FileBuilder {
        FileBuilder {
            header,
            entry_size,
            lumps: vec![Vec::new(); lump_count],
        }
    }

    fn lump(&mut self, slot: usize, buf: Buf) -> &mut Self {
        self.lumps[slot] = buf.0;
        self
    }

    fn build(&self) -> Vec<u8> {
        let dir_size = self.lumps.len() * self.entry_size;
        let mut offset = self.header.len() + dir_size;
        let mut out = self.header.clone();
        for lump in &self.lumps {
            let mut entry = Buf::default();
            if lump.is_empty() {
                entry.i32(0).i32(0);
            } else {
                entry.i32(offset as i32).i32(lump.len() as i32);
            }
            entry.pad_to(self.entry_size);
            out.extend_from_slice(&entry.0);
            offset += lump.len();
        }
        for lump in &self.lumps {
            out.extend_from_slice(lump);
        }
        out
    }
}

fn magic_header(magic: &[u8; 4], version: i32) -> Vec<u8> {
    let mut h = magic.to_vec();
    h.extend_from_slice(&version.to_le_bytes());
    h
}

/// Outward planes of the axis-aligned cube 0..64, with or without the
/// axial-type tail field.
fn cube_planes(with_type: bool) -> Buf {
    let planes = [
        (vec3(1.0, 0.0, 0.0), 64.0),
        (vec3(-1.0, 0.0, 0.0), 0.0),
        (vec3(0.0, 1.0, 0.0), 64.0),
        (vec3(0.0, -1.0, 0.0), 0.0),
        (vec3(0.0, 0.0, 1.0), 64.0),
        (vec3(0.0, 0.0, -1.0), 0.0),
    ];
    let mut buf = Buf::default();
    for (normal, dist) in planes {
        buf.vec3(normal).f32(dist);
        if with_type {
            buf.i32(0);
        }
    }
    buf
}

fn worldspawn_lump() -> Buf {
    let mut buf = Buf::default();
    buf.0.extend_from_slice(b"{\n\"classname\" \"worldspawn\"\n}\n\0");
    buf
}

/// Top face of the cube, counter-ordered as a closed quad at z=64.
const QUAD: [Vec3; 4] = [
    Vec3 { x: 0.0, y: 0.0, z: 64.0 },
    Vec3 { x: 0.0, y: 64.0, z: 64.0 },
    Vec3 { x: 64.0, y: 64.0, z: 64.0 },
    Vec3 { x: 64.0, y: 0.0, z: 64.0 },
];

fn quad_vertices() -> Buf {
    let mut buf = Buf::default();
    for v in QUAD {
        buf.vec3(v);
    }
    buf
}

/// Edge 0 is the traditional invalid edge; edges 1..=4 walk the quad.
fn quad_edges() -> Buf {
    let mut buf = Buf::default();
    buf.u16(0).u16(0);
    for i in 0..4u16 {
        buf.u16(i).u16((i + 1) % 4);
    }
    buf
}

fn quad_surf_edges() -> Buf {
    let mut buf = Buf::default();
    for i in 1..=4 {
        buf.i32(i);
    }
    buf
}

/// Count the side lines inside the first `// brush 0` block of a
/// Radiant-shaped map: the serialized text must re-parse as exactly one
/// brush with the expected number of plane-point lines.
fn radiant_first_brush_sides(text: &str) -> usize {
    let brush = text.split("// brush 0").nth(1).expect("brush block");
    brush
        .lines()
        .take_while(|line| !line.starts_with('}'))
        .filter(|line| line.starts_with("( "))
        .count()
}

// =============================================================================
// Quake 3: direct brush range on the model
// =============================================================================

fn quake3_file() -> Vec<u8> {
    let mut file = FileBuilder::new(magic_header(b"IBSP", 46), 17, 8);
    file.lump(0, worldspawn_lump());
    file.lump(1, {
        let mut b = Buf::default();
        b.name("e1u1/wall03", 64).u32(0).i32(1);
        b
    });
    file.lump(2, cube_planes(false));
    file.lump(7, {
        // bounds, face range (none), brush range [0, 1)
        let mut b = Buf::default();
        b.zeros(24).i32(-1).i32(0).i32(0).i32(1);
        b
    });
    file.lump(8, {
        let mut b = Buf::default();
        b.i32(0).i32(6).i32(0);
        b
    });
    file.lump(9, {
        let mut b = Buf::default();
        for plane in 0..6 {
            b.i32(plane).i32(0);
        }
        b
    });
    file.build()
}

#[test]
fn test_quake3_direct_brush_range_roundtrip() {
    let bytes = quake3_file();
    let bsp = BspFile::open(&bytes, None).unwrap();
    assert_eq!(bsp.variant(), BspVariant::Quake3);

    let doc = decompile(&bsp, &Settings::default(), &NullSink).unwrap();
    assert_eq!(doc.brush_count(), 1);
    assert_eq!(doc.world().unwrap().brushes[0].sides().len(), 6);

    let text = unbsp_write::serialize(&doc, Dialect::Radiant, true);
    assert_eq!(radiant_first_brush_sides(&text), 6);
    assert_eq!(text.matches("e1u1/wall03").count(), 6);
}

// =============================================================================
// Quake 2: headnode traversal + mark-brush dedup
// =============================================================================

fn quake2_file() -> Vec<u8> {
    let mut file = FileBuilder::new(magic_header(b"IBSP", 38), 19, 8);
    file.lump(0, worldspawn_lump());
    file.lump(1, cube_planes(true));
    file.lump(4, {
        // node 0 -> (node 1, leaf 2); node 1 -> (leaf 0, leaf 1)
        let mut b = Buf::default();
        b.i32(0).i32(1).i32(-3).pad_to(28);
        let mut tail = Buf::default();
        tail.i32(0).i32(-1).i32(-2).pad_to(28);
        b.0.extend_from_slice(&tail.0);
        b
    });
    file.lump(5, {
        let mut b = Buf::default();
        b.vec3(vec3(1.0, 0.0, 0.0))
            .f32(0.0)
            .vec3(vec3(0.0, -1.0, 0.0))
            .f32(0.0)
            .u32(0)
            .i32(0)
            .name("e1u1/floor1_1", 32)
            .i32(-1);
        b
    });
    file.lump(8, {
        // Three leaves, all marking the same brush.
        let mut b = Buf::default();
        for mark in 0..3u16 {
            let mut leaf = Buf::default();
            leaf.i32(0).zeros(16).u16(0).u16(0).u16(mark).u16(1);
            b.0.extend_from_slice(&leaf.0);
        }
        b
    });
    file.lump(10, {
        let mut b = Buf::default();
        b.u16(0).u16(0).u16(0);
        b
    });
    file.lump(13, {
        let mut b = Buf::default();
        b.zeros(36).i32(0).i32(-1).i32(0);
        b
    });
    file.lump(14, {
        let mut b = Buf::default();
        b.i32(0).i32(6).i32(1);
        b
    });
    file.lump(15, {
        let mut b = Buf::default();
        for plane in 0..6u16 {
            b.u16(plane).i16(0);
        }
        b
    });
    file.build()
}

#[test]
fn test_quake2_tree_walk_dedups_marked_brush() {
    let bytes = quake2_file();
    let bsp = BspFile::open(&bytes, None).unwrap();
    assert_eq!(bsp.variant(), BspVariant::Quake2);

    let doc = decompile(&bsp, &Settings::default(), &NullSink).unwrap();
    // One brush, even though three leaves reference it.
    assert_eq!(doc.brush_count(), 1);
    let brush = &doc.world().unwrap().brushes[0];
    assert_eq!(brush.sides().len(), 6);
    assert!(brush.sides().iter().all(|s| s.texture == "e1u1/floor1_1"));

    let text = unbsp_write::serialize(&doc, Dialect::Radiant, true);
    assert_eq!(radiant_first_brush_sides(&text), 6);
}

// =============================================================================
// Nightfire: leaf range on the model
// =============================================================================

fn nightfire_file() -> Vec<u8> {
    let mut file = FileBuilder::new(42i32.to_le_bytes().to_vec(), 18, 8);
    file.lump(0, worldspawn_lump());
    file.lump(1, cube_planes(true));
    file.lump(2, {
        let mut b = Buf::default();
        b.name("ROCK01", 64);
        b
    });
    file.lump(3, {
        let mut b = Buf::default();
        b.name("wld_rock", 64);
        b
    });
    file.lump(4, quad_vertices());
    file.lump(9, {
        // One face on the +z plane carrying the quad's vertex range.
        let mut b = Buf::default();
        b.i32(4).i32(0).i32(4).i32(-1).i32(0).u32(0).i32(0).i32(0).i32(0).pad_to(48);
        b
    });
    file.lump(11, {
        let mut b = Buf::default();
        b.i32(0).zeros(16).u16(0).u16(0).u16(0).u16(1);
        b
    });
    file.lump(13, {
        let mut b = Buf::default();
        b.u32(0);
        b
    });
    file.lump(14, {
        let mut b = Buf::default();
        b.zeros(24).i32(0).i32(1).i32(0).i32(1).pad_to(48);
        b
    });
    file.lump(15, {
        let mut b = Buf::default();
        b.i32(0x200).i32(0).i32(6);
        b
    });
    file.lump(16, {
        let mut b = Buf::default();
        for plane in 0..6 {
            let face = if plane == 4 { 0 } else { -1 };
            b.i32(face).i32(plane);
        }
        b
    });
    file.lump(17, {
        let mut b = Buf::default();
        b.vec3(vec3(1.0, 0.0, 0.0))
            .f32(0.0)
            .vec3(vec3(0.0, -1.0, 0.0))
            .f32(0.0);
        b
    });
    file.build()
}

#[test]
fn test_nightfire_leaf_range_roundtrip() {
    let bytes = nightfire_file();
    let bsp = BspFile::open(&bytes, None).unwrap();
    assert_eq!(bsp.variant(), BspVariant::Nightfire);

    let doc = decompile(&bsp, &Settings::default(), &NullSink).unwrap();
    assert_eq!(doc.brush_count(), 1);
    let brush = &doc.world().unwrap().brushes[0];
    assert_eq!(brush.sides().len(), 6);
    // Nightfire's renumbered detail bit.
    assert!(brush.is_detail);
    // The one side with a compiled face got its texture, material, and
    // real reference points from that face.
    let top = brush.sides().iter().find(|s| s.texture == "ROCK01").unwrap();
    assert_eq!(top.material, "wld_rock");
    assert!(top.points.is_some());

    let text = unbsp_write::serialize(&doc, Dialect::Gearcraft, true);
    assert!(text.contains("\"mapversion\" \"510\""));
    assert!(text.contains("ROCK01"));
    assert!(text.contains("wld_rock"));
}

// =============================================================================
// Quake: no brush lump, face extrusion
// =============================================================================

fn quake_file() -> Vec<u8> {
    let mut file = FileBuilder::new(29i32.to_le_bytes().to_vec(), 15, 8);
    file.lump(0, worldspawn_lump());
    file.lump(1, {
        let mut b = Buf::default();
        b.vec3(vec3(0.0, 0.0, 1.0)).f32(64.0).i32(0);
        b
    });
    file.lump(2, {
        // Miptex directory: one entry.
        let mut b = Buf::default();
        b.i32(1).i32(8).name("FLOOR1_1", 16);
        b
    });
    file.lump(3, quad_vertices());
    file.lump(6, {
        let mut b = Buf::default();
        b.vec3(vec3(1.0, 0.0, 0.0))
            .f32(0.0)
            .vec3(vec3(0.0, -1.0, 0.0))
            .f32(0.0)
            .i32(0)
            .i32(0);
        b
    });
    file.lump(7, {
        let mut b = Buf::default();
        b.u16(0).u16(0).i32(0).u16(4).u16(0).zeros(8);
        b
    });
    file.lump(12, quad_edges());
    file.lump(13, quad_surf_edges());
    file.lump(14, {
        let mut b = Buf::default();
        b.zeros(36).i32(0).i32(0).i32(0).i32(0).i32(0).i32(0).i32(1);
        b
    });
    file.build()
}

#[test]
fn test_quake_face_extrusion_roundtrip() {
    let bytes = quake_file();
    let bsp = BspFile::open(&bytes, None).unwrap();
    assert_eq!(bsp.variant(), BspVariant::Quake);

    let doc = decompile(&bsp, &Settings::default(), &NullSink).unwrap();
    // One quad face extrudes into one six-sided solid.
    assert_eq!(doc.brush_count(), 1);
    assert_eq!(doc.world().unwrap().brushes[0].sides().len(), 6);

    let text = unbsp_write::serialize(&doc, Dialect::Radiant, true);
    assert_eq!(radiant_first_brush_sides(&text), 6);
    assert_eq!(text.matches("FLOOR1_1").count(), 6);
}

// =============================================================================
// Source 20: tree walk, bevel dropping, displacement, cubemap
// =============================================================================

fn source_file() -> Vec<u8> {
    let mut file = FileBuilder::new(magic_header(b"VBSP", 20), 64, 16);
    file.lump(0, worldspawn_lump());
    file.lump(1, cube_planes(true));
    file.lump(2, {
        let mut b = Buf::default();
        b.zeros(12).i32(0).zeros(16);
        b
    });
    file.lump(3, quad_vertices());
    file.lump(5, {
        let mut b = Buf::default();
        b.i32(0).i32(-1).i32(-2).pad_to(32);
        b
    });
    file.lump(6, {
        let mut b = Buf::default();
        b.vec3(vec3(1.0, 0.0, 0.0))
            .f32(0.0)
            .vec3(vec3(0.0, -1.0, 0.0))
            .f32(0.0)
            .zeros(32)
            .u32(0)
            .i32(0);
        b
    });
    file.lump(7, {
        // One displacement-bearing face over the quad.
        let mut b = Buf::default();
        b.u16(4).zeros(2).i32(0).i16(4).i16(0).i16(0).pad_to(56);
        b
    });
    file.lump(10, {
        let mut b = Buf::default();
        let mut leaf0 = Buf::default();
        leaf0.i32(0).zeros(16).u16(0).u16(0).u16(0).u16(1).pad_to(32);
        let mut leaf1 = Buf::default();
        leaf1.i32(0).zeros(16).u16(0).u16(0).u16(0).u16(0).pad_to(32);
        b.0.extend_from_slice(&leaf0.0);
        b.0.extend_from_slice(&leaf1.0);
        b
    });
    file.lump(12, quad_edges());
    file.lump(13, quad_surf_edges());
    file.lump(14, {
        let mut b = Buf::default();
        b.zeros(36).i32(0).i32(0).i32(1);
        b
    });
    file.lump(17, {
        let mut b = Buf::default();
        b.u16(0);
        b
    });
    file.lump(18, {
        let mut b = Buf::default();
        b.i32(0).i32(7).i32(1);
        b
    });
    file.lump(19, {
        // Six real sides plus one bevel that must be dropped.
        let mut b = Buf::default();
        for plane in 0..6u16 {
            b.u16(plane).i16(0).i16(-1).i16(0);
        }
        b.u16(0).i16(0).i16(-1).i16(1);
        b
    });
    file.lump(26, {
        let mut b = Buf::default();
        b.vec3(QUAD[0]).i32(0).i32(0).i32(2).pad_to(176);
        b
    });
    file.lump(33, {
        let mut b = Buf::default();
        for _ in 0..25 {
            b.vec3(vec3(0.0, 0.0, 1.0)).f32(8.0).f32(0.0);
        }
        b
    });
    file.lump(42, {
        let mut b = Buf::default();
        b.i32(0).i32(0).i32(32).i32(0);
        b
    });
    file.lump(43, {
        let mut b = Buf::default();
        b.name("NATURE/BLENDROCK", 17);
        b
    });
    file.lump(44, {
        let mut b = Buf::default();
        b.i32(0);
        b
    });
    file.build()
}

#[test]
fn test_source_displacement_roundtrip() {
    let bytes = source_file();
    let bsp = BspFile::open(&bytes, None).unwrap();
    assert_eq!(bsp.variant(), BspVariant::Source20);

    let doc = decompile(&bsp, &Settings::default(), &NullSink).unwrap();
    let world = doc.world().unwrap();
    // The tree-walked cube plus the extruded displacement carrier.
    assert_eq!(world.brushes.len(), 2);
    // Bevel side dropped: seven compiled sides, six kept.
    assert_eq!(world.brushes[0].sides().len(), 6);
    assert!(world.brushes[0]
        .sides()
        .iter()
        .all(|s| s.texture == "NATURE/BLENDROCK"));

    let disp_brush = &world.brushes[1];
    assert!(disp_brush.is_detail);
    let front = &disp_brush.sides()[0];
    let disp = front.displacement.as_ref().unwrap();
    assert_eq!(disp.side(), 5);

    // Cubemap synthesized as a point entity.
    assert!(doc.entities.iter().any(|e| e.classname() == "env_cubemap"));

    let text = unbsp_write::serialize(&doc, Dialect::Vmf, true);
    assert!(text.contains("dispinfo"));
    assert!(text.contains("\"power\" \"2\""));
    assert_eq!(text.matches("\"row4\"").count(), 3);
}

// =============================================================================
// Multi-dialect isolation
// =============================================================================

#[test]
fn test_multi_dialect_output_is_isolated() {
    let bytes = quake3_file();
    let bsp = BspFile::open(&bytes, None).unwrap();
    let doc = decompile(&bsp, &Settings::default(), &NullSink).unwrap();

    let before = unbsp_write::serialize(&doc, Dialect::Radiant, true);
    // VMF post-processing runs on a clone; a following Radiant pass must
    // see the untouched document.
    let _vmf = unbsp_write::serialize(&doc, Dialect::Vmf, true);
    let after = unbsp_write::serialize(&doc, Dialect::Radiant, true);
    assert_eq!(before, after);
}

// =============================================================================
// Progress reporting
// =============================================================================

#[test]
fn test_progress_counts_brushes_as_units() {
    struct Recorder(std::cell::RefCell<Vec<f32>>);
    impl unbsp_decompile::ProgressSink for Recorder {
        fn progress(&self, fraction: f32) {
            self.0.borrow_mut().push(fraction);
        }
        fn log(&self, _message: &str, _is_error: bool) {}
    }

    let bytes = quake3_file();
    let bsp = BspFile::open(&bytes, None).unwrap();
    let recorder = Recorder(std::cell::RefCell::new(Vec::new()));
    decompile(&bsp, &Settings::default(), &recorder).unwrap();

    // One entity and one brush: the brush must surface as an intermediate
    // fraction instead of the report jumping straight to completion.
    let emitted = recorder.0.borrow();
    assert!(emitted.iter().any(|f| *f > 0.0 && *f < 1.0));
    assert!((emitted.last().unwrap() - 1.0).abs() < f32::EPSILON);
}
