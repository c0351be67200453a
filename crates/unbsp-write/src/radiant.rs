// radiant.rs — Quake-lineage Radiant .map grammar.
//
// Entities are brace blocks of keyvalues; each solid is a nested block of
// side lines: three plane points, the texture, then shift/rotation/scale.
// Patches use the patchDef2 sub-block.

use std::fmt::Write;

use unbsp_common::map::{Brush, BrushGeometry, Entity, MapDocument, Patch, Side};

use crate::{num, point};

pub fn serialize(doc: &MapDocument) -> String {
    let mut out = String::new();
    for (i, entity) in doc.entities.iter().enumerate() {
        let _ = writeln!(out, "// entity {i}");
        out.push_str("{\n");
        write_pairs(&mut out, entity);
        for (j, brush) in entity.brushes.iter().enumerate() {
            let _ = writeln!(out, "// brush {j}");
            write_brush(&mut out, brush);
        }
        out.push_str("}\n");
    }
    out
}

pub(crate) fn write_pairs(out: &mut String, entity: &Entity) {
    for (key, value) in entity.pairs() {
        let _ = writeln!(out, "\"{key}\" \"{value}\"");
    }
}

pub(crate) fn write_brush(out: &mut String, brush: &Brush) {
    match &brush.geometry {
        BrushGeometry::Sides(sides) => {
            out.push_str("{\n");
            for side in sides {
                write_side(out, side);
            }
            out.push_str("}\n");
        }
        BrushGeometry::Patch(patch) => write_patch(out, patch),
        // Terrain only exists in the MoH grammar; other dialects drop it.
        BrushGeometry::Terrain(_) => {}
    }
}

fn write_side(out: &mut String, side: &Side) {
    let [a, b, c] = side.resolved_points();
    let p = &side.projection;
    let _ = writeln!(
        out,
        "{} {} {} {} {} {} {} {} {}",
        point(a),
        point(b),
        point(c),
        side.texture,
        num(p.u_shift),
        num(p.v_shift),
        num(p.rotation),
        num(p.u_scale),
        num(p.v_scale),
    );
}

fn write_patch(out: &mut String, patch: &Patch) {
    out.push_str("{\npatchDef2\n{\n");
    let _ = writeln!(out, "{}", patch.texture);
    let _ = writeln!(out, "( {} {} 0 0 0 )", patch.width, patch.height);
    out.push_str("(\n");
    for col in 0..patch.width {
        out.push_str("( ");
        for row in 0..patch.height {
            let p = patch.points[row * patch.width + col];
            let _ = write!(out, "( {} {} {} 0 0 ) ", num(p.x), num(p.y), num(p.z));
        }
        out.push_str(")\n");
    }
    out.push_str(")\n}\n}\n");
}
