// vmf.rs — Source Hammer VMF grammar.
//
// Keyvalue blocks with tab indentation and a global id counter across
// world/solid/side blocks, matching what Hammer itself writes. Connection
// strings are stored internally as "output\tvalue" and split here.

use std::fmt::Write;

use unbsp_common::map::{Brush, BrushGeometry, Displacement, Entity, MapDocument, Side};
use unbsp_common::math::Vec3;

use crate::num;

pub fn serialize(doc: &MapDocument) -> String {
    let mut out = String::new();
    let mut id = IdCounter(0);

    out.push_str(
        "versioninfo\n{\n\t\"editorversion\" \"400\"\n\t\"editorbuild\" \"6412\"\n\t\"mapversion\" \"1\"\n\t\"formatversion\" \"100\"\n\t\"prefab\" \"0\"\n}\n",
    );

    if let Some(world) = doc.world() {
        out.push_str("world\n{\n");
        let _ = writeln!(out, "\t\"id\" \"{}\"", id.next());
        write_pairs(&mut out, world);
        for brush in &world.brushes {
            write_solid(&mut out, brush, &mut id, 1);
        }
        out.push_str("}\n");
    }

    for entity in doc.entities.iter().filter(|e| !e.is_worldspawn()) {
        out.push_str("entity\n{\n");
        let _ = writeln!(out, "\t\"id\" \"{}\"", id.next());
        write_pairs(&mut out, entity);
        write_connections(&mut out, entity);
        for brush in &entity.brushes {
            write_solid(&mut out, brush, &mut id, 1);
        }
        out.push_str("}\n");
    }
    out
}

struct IdCounter(u64);

impl IdCounter {
    fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_pairs(out: &mut String, entity: &Entity) {
    for (key, value) in entity.pairs() {
        let _ = writeln!(out, "\t\"{key}\" \"{value}\"");
    }
}

fn write_connections(out: &mut String, entity: &Entity) {
    if entity.connections.is_empty() {
        return;
    }
    out.push_str("\tconnections\n\t{\n");
    for connection in &entity.connections {
        let (output, value) = connection.split_once('\t').unwrap_or(("OnTrigger", connection));
        let _ = writeln!(out, "\t\t\"{output}\" \"{value}\"");
    }
    out.push_str("\t}\n");
}

fn write_solid(out: &mut String, brush: &Brush, id: &mut IdCounter, depth: usize) {
    let BrushGeometry::Sides(sides) = &brush.geometry else {
        // Patches and terrain have no VMF representation.
        return;
    };
    indent(out, depth);
    out.push_str("solid\n");
    indent(out, depth);
    out.push_str("{\n");
    indent(out, depth + 1);
    let _ = writeln!(out, "\"id\" \"{}\"", id.next());
    for side in sides {
        write_side(out, side, id, depth + 1);
    }
    indent(out, depth);
    out.push_str("}\n");
}

fn write_side(out: &mut String, side: &Side, id: &mut IdCounter, depth: usize) {
    let [a, b, c] = side.resolved_points();
    let p = &side.projection;
    indent(out, depth);
    out.push_str("side\n");
    indent(out, depth);
    out.push_str("{\n");

    let field = |out: &mut String, key: &str, value: String| {
        indent(out, depth + 1);
        let _ = writeln!(out, "\"{key}\" \"{value}\"");
    };
    field(out, "id", id.next().to_string());
    field(
        out,
        "plane",
        format!("({}) ({}) ({})", bare_point(a), bare_point(b), bare_point(c)),
    );
    field(out, "material", side.texture.clone());
    field(
        out,
        "uaxis",
        format!(
            "[{} {} {} {}] {}",
            num(p.u_axis.x),
            num(p.u_axis.y),
            num(p.u_axis.z),
            num(p.u_shift),
            num(p.u_scale)
        ),
    );
    field(
        out,
        "vaxis",
        format!(
            "[{} {} {} {}] {}",
            num(p.v_axis.x),
            num(p.v_axis.y),
            num(p.v_axis.z),
            num(p.v_shift),
            num(p.v_scale)
        ),
    );
    field(out, "rotation", num(p.rotation));
    field(out, "lightmapscale", num(side.lightmap_scale));
    field(out, "smoothing_groups", "0".to_string());

    if let Some(disp) = &side.displacement {
        write_dispinfo(out, disp, depth + 1);
    }

    indent(out, depth);
    out.push_str("}\n");
}

fn write_dispinfo(out: &mut String, disp: &Displacement, depth: usize) {
    indent(out, depth);
    out.push_str("dispinfo\n");
    indent(out, depth);
    out.push_str("{\n");

    let field = |out: &mut String, key: &str, value: String| {
        indent(out, depth + 1);
        let _ = writeln!(out, "\"{key}\" \"{value}\"");
    };
    field(out, "power", disp.power.to_string());
    field(
        out,
        "startposition",
        format!("[{} {} {}]", num(disp.start.x), num(disp.start.y), num(disp.start.z)),
    );
    field(out, "elevation", "0".to_string());
    field(out, "subdiv", "0".to_string());

    let side = disp.side();
    let grid_block = |out: &mut String, name: &str, cell: &dyn Fn(usize, usize) -> String| {
        indent(out, depth + 1);
        let _ = writeln!(out, "{name}");
        indent(out, depth + 1);
        out.push_str("{\n");
        for row in 0..side {
            let cells: Vec<String> = (0..side).map(|col| cell(row, col)).collect();
            indent(out, depth + 2);
            let _ = writeln!(out, "\"row{row}\" \"{}\"", cells.join(" "));
        }
        indent(out, depth + 1);
        out.push_str("}\n");
    };

    grid_block(out, "normals", &|row, col| {
        let n = disp.normal_at(row, col);
        format!("{} {} {}", num(n.x), num(n.y), num(n.z))
    });
    grid_block(out, "distances", &|row, col| num(disp.distance_at(row, col)));
    grid_block(out, "alphas", &|row, col| num(disp.alpha_at(row, col)));

    indent(out, depth);
    out.push_str("}\n");
}

fn bare_point(p: Vec3) -> String {
    format!("{} {} {}", num(p.x), num(p.y), num(p.z))
}
