// map.rs — the editable map data model.
//
// A decompiled level is a flat list of entities; brush-bearing entities own
// their solids. Every type here is a plain value with a structural Clone so
// that emitting several dialects from one decompile can work on independent
// copies (one dialect's post-processing must never leak into another's).

use crate::math::{Plane, Vec3};
use crate::projection::TextureProjection;

// =============================================================================
// Sides and brushes
// =============================================================================

/// One bounding plane of a brush together with its texture projection.
///
/// Invariant: a side either carries real points recovered from compiled
/// geometry, or only a plane (in which case points are synthesized right
/// before serialization). Both are never absent.
#[derive(Debug, Clone)]
pub struct Side {
    pub plane: Plane,
    /// Three non-collinear points on the plane, wound to match `plane`.
    pub points: Option<[Vec3; 3]>,
    pub texture: String,
    pub material: String,
    pub projection: TextureProjection,
    pub lightmap_scale: f32,
    /// Per-side surface flags carried through for dialects that emit them.
    pub flags: u32,
    pub displacement: Option<Displacement>,
}

impl Side {
    pub fn new(plane: Plane, texture: impl Into<String>) -> Side {
        Side {
            plane,
            points: None,
            texture: texture.into(),
            material: String::new(),
            projection: TextureProjection::from_plane(&plane),
            lightmap_scale: 16.0,
            flags: 0,
            displacement: None,
        }
    }

    /// Points for serialization, synthesizing them from the plane when the
    /// compiled geometry supplied none.
    pub fn resolved_points(&self) -> [Vec3; 3] {
        match self.points {
            Some(points) => points,
            None => self.plane.three_points(),
        }
    }
}

/// A per-vertex offset grid laid over a quad face (Source terrain).
#[derive(Debug, Clone)]
pub struct Displacement {
    pub power: i32,
    pub start: Vec3,
    /// Row-major `side() * side()` grids.
    pub normals: Vec<Vec3>,
    pub distances: Vec<f32>,
    pub alphas: Vec<f32>,
}

impl Displacement {
    /// Vertices along one edge of the grid: `2^power + 1`.
    pub fn side(&self) -> usize {
        (1usize << self.power) + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.side() * self.side()
    }

    pub fn normal_at(&self, row: usize, col: usize) -> Vec3 {
        self.normals[row * self.side() + col]
    }

    pub fn distance_at(&self, row: usize, col: usize) -> f32 {
        self.distances[row * self.side() + col]
    }

    pub fn alpha_at(&self, row: usize, col: usize) -> f32 {
        self.alphas[row * self.side() + col]
    }
}

/// A bezier control grid (id Tech 3 lineage curved surfaces).
#[derive(Debug, Clone)]
pub struct Patch {
    pub texture: String,
    pub width: usize,
    pub height: usize,
    /// Row-major `width * height` control points.
    pub points: Vec<Vec3>,
}

/// A square heightmap grid (MoH-lineage terrain).
#[derive(Debug, Clone)]
pub struct Terrain {
    pub texture: String,
    pub side: usize,
    /// Row-major `side * side` grid positions.
    pub points: Vec<Vec3>,
}

/// The geometry payload of one solid.
#[derive(Debug, Clone)]
pub enum BrushGeometry {
    Sides(Vec<Side>),
    Patch(Patch),
    Terrain(Terrain),
}

/// A convex solid: an ordered set of sides, or one special surface.
#[derive(Debug, Clone)]
pub struct Brush {
    pub geometry: BrushGeometry,
    pub is_detail: bool,
    pub is_water: bool,
}

impl Brush {
    pub fn from_sides(sides: Vec<Side>) -> Brush {
        Brush {
            geometry: BrushGeometry::Sides(sides),
            is_detail: false,
            is_water: false,
        }
    }

    pub fn from_patch(patch: Patch) -> Brush {
        Brush {
            geometry: BrushGeometry::Patch(patch),
            is_detail: false,
            is_water: false,
        }
    }

    pub fn from_terrain(terrain: Terrain) -> Brush {
        Brush {
            geometry: BrushGeometry::Terrain(terrain),
            is_detail: false,
            is_water: false,
        }
    }

    pub fn sides(&self) -> &[Side] {
        match &self.geometry {
            BrushGeometry::Sides(sides) => sides,
            _ => &[],
        }
    }

    pub fn sides_mut(&mut self) -> &mut [Side] {
        match &mut self.geometry {
            BrushGeometry::Sides(sides) => sides,
            _ => &mut [],
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A key/value entity with case-insensitive keys, raw I/O connection
/// strings, and the solids it owns.
///
/// Key order is preserved for output stability, but lookups ignore both
/// order and ASCII case (compiled entity blocks are wildly inconsistent
/// about `classname` vs `Classname`).
#[derive(Debug, Clone, Default)]
pub struct Entity {
    pairs: Vec<(String, String)>,
    /// Dialect-specific connection strings, kept opaque until the writer's
    /// post-processing pass.
    pub connections: Vec<String>,
    pub brushes: Vec<Brush>,
}

impl Entity {
    pub fn new() -> Entity {
        Entity::default()
    }

    pub fn with_classname(classname: &str) -> Entity {
        let mut ent = Entity::new();
        ent.set("classname", classname);
        ent
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite, matching the key case-insensitively but keeping
    /// the original spelling on overwrite.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.pairs.iter().position(|(k, _)| k.eq_ignore_ascii_case(key))?;
        Some(self.pairs.remove(pos).1)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn classname(&self) -> &str {
        self.get("classname").unwrap_or("")
    }

    pub fn is_worldspawn(&self) -> bool {
        self.classname().eq_ignore_ascii_case("worldspawn")
    }

    /// Which compiled model this entity's geometry lives in: 0 for the
    /// world, the `*N` index for brush entities, -1 for point entities.
    pub fn model_number(&self) -> i32 {
        if self.is_worldspawn() {
            return 0;
        }
        match self.get("model") {
            Some(value) => match value.strip_prefix('*') {
                Some(digits) => digits.parse().unwrap_or(-1),
                None => -1,
            },
            None => -1,
        }
    }

    pub fn origin(&self) -> Vec3 {
        let Some(value) = self.get("origin") else {
            return Vec3::ZERO;
        };
        let mut it = value.split_whitespace().map(|t| t.parse::<f32>().unwrap_or(0.0));
        Vec3 {
            x: it.next().unwrap_or(0.0),
            y: it.next().unwrap_or(0.0),
            z: it.next().unwrap_or(0.0),
        }
    }
}

/// A fully reconstructed level: the normalized entity list, world first.
#[derive(Debug, Clone, Default)]
pub struct MapDocument {
    pub entities: Vec<Entity>,
}

impl MapDocument {
    pub fn world(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_worldspawn())
    }

    pub fn world_mut(&mut self) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.is_worldspawn())
    }

    pub fn brush_count(&self) -> usize {
        self.entities.iter().map(|e| e.brushes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3;

    #[test]
    fn test_entity_keys_case_insensitive() {
        let mut ent = Entity::new();
        ent.set("Classname", "func_door");
        assert_eq!(ent.get("classname"), Some("func_door"));
        assert_eq!(ent.classname(), "func_door");

        ent.set("CLASSNAME", "func_button");
        assert_eq!(ent.classname(), "func_button");
        assert_eq!(ent.pairs().count(), 1);
    }

    #[test]
    fn test_model_number() {
        let mut world = Entity::with_classname("worldspawn");
        world.set("model", "*999");
        assert_eq!(world.model_number(), 0);

        let mut door = Entity::with_classname("func_door");
        assert_eq!(door.model_number(), -1);
        door.set("model", "*7");
        assert_eq!(door.model_number(), 7);
        door.set("model", "models/crate.mdl");
        assert_eq!(door.model_number(), -1);
    }

    #[test]
    fn test_origin_parsing() {
        let mut ent = Entity::with_classname("info_player_start");
        ent.set("origin", "16 -32 64");
        assert!(ent.origin().approx_eq(vec3(16.0, -32.0, 64.0)));
        assert!(Entity::with_classname("x").origin().approx_eq(Vec3::ZERO));
    }

    #[test]
    fn test_displacement_grid_indexing() {
        let side = 5;
        let disp = Displacement {
            power: 2,
            start: Vec3::ZERO,
            normals: vec![Vec3::ZERO; side * side],
            distances: (0..side * side).map(|i| i as f32).collect(),
            alphas: vec![0.0; side * side],
        };
        assert_eq!(disp.side(), 5);
        assert_eq!(disp.distance_at(2, 3), 13.0);
    }
}
