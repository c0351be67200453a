// moh.rs — MoH Radiant .map grammar: Radiant blocks plus terrainDef.

use std::fmt::Write;

use unbsp_common::map::{BrushGeometry, MapDocument, Terrain};

use crate::{num, radiant};

pub fn serialize(doc: &MapDocument) -> String {
    let mut out = String::new();
    for (i, entity) in doc.entities.iter().enumerate() {
        let _ = writeln!(out, "// entity {i}");
        out.push_str("{\n");
        radiant::write_pairs(&mut out, entity);
        for (j, brush) in entity.brushes.iter().enumerate() {
            let _ = writeln!(out, "// brush {j}");
            match &brush.geometry {
                BrushGeometry::Terrain(terrain) => write_terrain(&mut out, terrain),
                _ => radiant::write_brush(&mut out, brush),
            }
        }
        out.push_str("}\n");
    }
    out
}

fn write_terrain(out: &mut String, terrain: &Terrain) {
    out.push_str("{\nterrainDef\n{\n");
    let _ = writeln!(out, "{}", terrain.texture);
    let _ = writeln!(out, "{}", terrain.side);
    for row in 0..terrain.side {
        for col in 0..terrain.side {
            let p = terrain.points[row * terrain.side + col];
            let _ = write!(out, "( {} {} {} ) ", num(p.x), num(p.y), num(p.z));
        }
        out.push('\n');
    }
    out.push_str("}\n}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use unbsp_common::map::{Brush, Entity};
    use unbsp_common::math::vec3;

    #[test]
    fn test_terrain_block() {
        let side = 3;
        let terrain = Terrain {
            texture: "terrain/grass".to_string(),
            side,
            points: (0..side * side).map(|i| vec3(i as f32, 0.0, 0.0)).collect(),
        };
        let mut world = Entity::with_classname("worldspawn");
        world.brushes.push(Brush::from_terrain(terrain));
        let doc = MapDocument { entities: vec![world] };

        let text = serialize(&doc);
        assert!(text.contains("terrainDef"));
        assert!(text.contains("terrain/grass"));
        // side^2 point triples.
        assert_eq!(text.matches("( ").count(), 9);
    }

    #[test]
    fn test_plain_brushes_use_radiant_shape() {
        use unbsp_common::projection::cube_brush;
        let mut world = Entity::with_classname("worldspawn");
        world
            .brushes
            .push(cube_brush(vec3(0.0, 0.0, 0.0), vec3(16.0, 16.0, 16.0), "wall"));
        let doc = MapDocument { entities: vec![world] };
        assert_eq!(serialize(&doc).matches("wall").count(), 6);
    }
}
