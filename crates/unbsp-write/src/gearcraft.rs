// gearcraft.rs — Nightfire Gearcraft .map grammar.
//
// Same entity/brush block structure as Radiant, but each side line carries
// full bracketed texture axes, the material name, and the surface flags the
// Gearcraft editor round-trips.

use std::fmt::Write;

use unbsp_common::map::{BrushGeometry, MapDocument, Side};

use crate::{num, point, radiant};

pub fn serialize(doc: &MapDocument) -> String {
    let mut out = String::new();
    for (i, entity) in doc.entities.iter().enumerate() {
        let _ = writeln!(out, "// entity {i}");
        out.push_str("{\n");
        radiant::write_pairs(&mut out, entity);
        if entity.is_worldspawn() && entity.get("mapversion").is_none() {
            out.push_str("\"mapversion\" \"510\"\n");
        }
        for (j, brush) in entity.brushes.iter().enumerate() {
            let _ = writeln!(out, "// brush {j}");
            if let BrushGeometry::Sides(sides) = &brush.geometry {
                out.push_str("{\n");
                for side in sides {
                    write_side(&mut out, side);
                }
                out.push_str("}\n");
            }
        }
        out.push_str("}\n");
    }
    out
}

fn write_side(out: &mut String, side: &Side) {
    let [a, b, c] = side.resolved_points();
    let p = &side.projection;
    let material = if side.material.is_empty() { "wld_lightmap" } else { &side.material };
    let _ = writeln!(
        out,
        "{} {} {} {} {} [ {} {} {} {} ] [ {} {} {} {} ] {} {} {} {}",
        point(a),
        point(b),
        point(c),
        side.texture,
        material,
        num(p.u_axis.x),
        num(p.u_axis.y),
        num(p.u_axis.z),
        num(p.u_shift),
        num(p.v_axis.x),
        num(p.v_axis.y),
        num(p.v_axis.z),
        num(p.v_shift),
        num(p.rotation),
        num(p.u_scale),
        num(p.v_scale),
        side.flags,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use unbsp_common::map::Entity;
    use unbsp_common::math::vec3;
    use unbsp_common::projection::cube_brush;

    #[test]
    fn test_side_line_has_axes_material_and_flags() {
        let mut world = Entity::with_classname("worldspawn");
        world
            .brushes
            .push(cube_brush(vec3(0.0, 0.0, 0.0), vec3(32.0, 32.0, 32.0), "ROCK01"));
        let doc = MapDocument { entities: vec![world] };
        let text = serialize(&doc);

        assert!(text.contains("\"mapversion\" \"510\""));
        let side_line = text.lines().find(|l| l.contains("ROCK01")).unwrap();
        assert_eq!(side_line.matches('[').count(), 2);
        assert!(side_line.contains("wld_lightmap"));
        assert!(side_line.trim_end().ends_with('0'));
    }
}
