// doomedit.rs — Doom 3 DoomEdit .map grammar.
//
// Version-2 maps define sides by plane equation rather than point triples:
// `( nx ny nz -dist ) ( ( ... ) ( ... ) ) "texture" 0 0 0`, wrapped in a
// brushDef3 primitive block.

use std::fmt::Write;

use unbsp_common::map::{BrushGeometry, MapDocument, Side};

use crate::{num, radiant};

pub fn serialize(doc: &MapDocument) -> String {
    let mut out = String::from("Version 2\n");
    for (i, entity) in doc.entities.iter().enumerate() {
        let _ = writeln!(out, "// entity {i}");
        out.push_str("{\n");
        radiant::write_pairs(&mut out, entity);
        for (j, brush) in entity.brushes.iter().enumerate() {
            let BrushGeometry::Sides(sides) = &brush.geometry else {
                continue;
            };
            let _ = writeln!(out, "// primitive {j}");
            out.push_str("{\nbrushDef3\n{\n");
            for side in sides {
                write_side(&mut out, side);
            }
            out.push_str("}\n}\n");
        }
        out.push_str("}\n");
    }
    out
}

fn write_side(out: &mut String, side: &Side) {
    let n = side.plane.normal;
    let p = &side.projection;
    let _ = writeln!(
        out,
        "( {} {} {} {} ) ( ( {} {} {} ) ( {} {} {} ) ) \"{}\" 0 0 0",
        num(n.x),
        num(n.y),
        num(n.z),
        num(-side.plane.dist),
        num(p.u_axis.x),
        num(p.u_axis.y),
        num(p.u_shift),
        num(p.v_axis.x),
        num(p.v_axis.y),
        num(p.v_shift),
        side.texture,
    );
}
