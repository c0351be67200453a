// projection.rs — texture projection math and procedural brush synthesis.
//
// Editable dialects express a texture placement as two world-space axes plus
// shift/scale/rotation. Compiled formats store the same thing with the scale
// folded into the axis length and the shift baked relative to the level
// origin, so converting back requires unbaking both.

use crate::map::{Brush, Side};
use crate::math::{vec3, Plane, Vec3};

/// Editable-format texture placement: two unit axes, per-axis shift and
/// scale, and a rotation angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureProjection {
    pub u_axis: Vec3,
    pub u_shift: f32,
    pub u_scale: f32,
    pub v_axis: Vec3,
    pub v_shift: f32,
    pub v_scale: f32,
    pub rotation: f32,
}

impl Default for TextureProjection {
    fn default() -> Self {
        TextureProjection {
            u_axis: vec3(1.0, 0.0, 0.0),
            u_shift: 0.0,
            u_scale: 1.0,
            v_axis: vec3(0.0, -1.0, 0.0),
            v_shift: 0.0,
            v_scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl TextureProjection {
    /// Convert a compiled projection into editable form.
    ///
    /// Compiled axes are not unit length: their magnitude encodes the
    /// inverse scale. Compiled shifts are relative to the level origin, but
    /// editable shifts are relative to the owning entity's origin, so the
    /// entity's world position is projected out of the shift.
    pub fn from_bsp(u_axis: Vec3, u_shift: f32, v_axis: Vec3, v_shift: f32, world_pos: Vec3) -> TextureProjection {
        let u_len = u_axis.length();
        let v_len = v_axis.length();
        TextureProjection {
            u_axis: u_axis.normalized(),
            u_shift: u_shift - u_axis.dot(world_pos),
            u_scale: if u_len > 0.0 { 1.0 / u_len } else { 1.0 },
            v_axis: v_axis.normalized(),
            v_shift: v_shift - v_axis.dot(world_pos),
            v_scale: if v_len > 0.0 { 1.0 / v_len } else { 1.0 },
            rotation: 0.0,
        }
    }

    /// Default projection for a side that has no texture-info reference
    /// (procedurally clipped or generated faces).
    pub fn from_plane(plane: &Plane) -> TextureProjection {
        let (u_axis, v_axis) = texture_axes_from_plane(plane.normal);
        TextureProjection {
            u_axis,
            v_axis,
            ..TextureProjection::default()
        }
    }
}

/// The canonical world-axis pairs used when a texture basis must be derived
/// from a plane normal alone. Order matters: the entry whose normal is most
/// parallel to the face normal wins, matching historical compiler output.
const BASE_AXES: [[Vec3; 3]; 6] = [
    [vec3(0.0, 0.0, 1.0), vec3(1.0, 0.0, 0.0), vec3(0.0, -1.0, 0.0)], // floor
    [vec3(0.0, 0.0, -1.0), vec3(1.0, 0.0, 0.0), vec3(0.0, -1.0, 0.0)], // ceiling
    [vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), vec3(0.0, 0.0, -1.0)], // west wall
    [vec3(-1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), vec3(0.0, 0.0, -1.0)], // east wall
    [vec3(0.0, 1.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0)], // south wall
    [vec3(0.0, -1.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0)], // north wall
];

/// Deterministic S/T basis from a bare plane normal: pick the base-axis
/// entry most perpendicular to the surface.
pub fn texture_axes_from_plane(normal: Vec3) -> (Vec3, Vec3) {
    let mut best = 0;
    let mut best_dot = f32::MIN;
    for (i, axes) in BASE_AXES.iter().enumerate() {
        let dot = normal.dot(axes[0]);
        if dot > best_dot {
            best_dot = dot;
            best = i;
        }
    }
    (BASE_AXES[best][1], BASE_AXES[best][2])
}

/// Build a side through three points wound so its plane faces away from
/// `interior`.
fn side_facing_away(mut points: [Vec3; 3], interior: Vec3, texture: &str) -> Side {
    let mut plane = Plane::from_points(points[0], points[1], points[2]);
    if plane.distance_to(interior) > 0.0 {
        points.swap(0, 2);
        plane = Plane::from_points(points[0], points[1], points[2]);
    }
    let mut side = Side::new(plane, texture);
    side.points = Some(points);
    side.projection = TextureProjection::from_plane(&plane);
    side
}

/// Extrude a closed convex edge loop into a solid.
///
/// `froms`/`tos` are parallel arrays: edge i runs from `froms[i]` to
/// `tos[i]`, and the loop is closed (each `tos[i]` equals some `froms[j]`).
/// The front side lies on the loop's plane and keeps the caller's texture
/// projection; the back side sits `depth` units behind it; one side per
/// edge connects the two. Axes for every generated plane are synthesized.
pub fn brush_from_wind(
    froms: &[Vec3],
    tos: &[Vec3],
    texture: &str,
    back_texture: &str,
    projection: TextureProjection,
    depth: f32,
) -> Brush {
    debug_assert_eq!(froms.len(), tos.len());
    debug_assert!(froms.len() >= 3);

    let front_plane = Plane::from_points(froms[0], froms[1], froms[2]);
    let normal = front_plane.normal;
    let offset = -normal * depth;

    let mut center = Vec3::ZERO;
    for &p in froms {
        center = center + p;
    }
    center = center / froms.len() as f32 + offset * 0.5;

    let mut sides = Vec::with_capacity(froms.len() + 2);

    let mut front = side_facing_away([froms[0], froms[1], froms[2]], center, texture);
    front.projection = projection;
    sides.push(front);

    sides.push(side_facing_away(
        [froms[2] + offset, froms[1] + offset, froms[0] + offset],
        center,
        back_texture,
    ));

    for i in 0..froms.len() {
        sides.push(side_facing_away(
            [tos[i], froms[i], froms[i] + offset],
            center,
            back_texture,
        ));
    }

    Brush::from_sides(sides)
}

/// Fixed per-face S/T axes for axis-aligned cube sides. A lookup table, not
/// derived: it must exactly match what the target dialects' editors emit
/// for axis-aligned geometry.
fn cube_face_axes(normal: Vec3) -> (Vec3, Vec3) {
    if normal.z.abs() > 0.5 {
        (vec3(1.0, 0.0, 0.0), vec3(0.0, -1.0, 0.0))
    } else if normal.x.abs() > 0.5 {
        (vec3(0.0, 1.0, 0.0), vec3(0.0, 0.0, -1.0))
    } else {
        (vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0))
    }
}

/// Axis-aligned solid spanning `min`..`max`, six sides, all textured alike.
pub fn cube_brush(min: Vec3, max: Vec3, texture: &str) -> Brush {
    let center = (min + max) * 0.5;
    let faces: [[Vec3; 3]; 6] = [
        // +z / -z
        [vec3(min.x, min.y, max.z), vec3(min.x, max.y, max.z), vec3(max.x, max.y, max.z)],
        [vec3(min.x, min.y, min.z), vec3(max.x, min.y, min.z), vec3(max.x, max.y, min.z)],
        // +x / -x
        [vec3(max.x, min.y, min.z), vec3(max.x, min.y, max.z), vec3(max.x, max.y, max.z)],
        [vec3(min.x, min.y, min.z), vec3(min.x, max.y, min.z), vec3(min.x, max.y, max.z)],
        // +y / -y
        [vec3(min.x, max.y, min.z), vec3(max.x, max.y, min.z), vec3(max.x, max.y, max.z)],
        [vec3(min.x, min.y, min.z), vec3(min.x, min.y, max.z), vec3(max.x, min.y, max.z)],
    ];

    let mut sides = Vec::with_capacity(6);
    for points in faces {
        let mut side = side_facing_away(points, center, texture);
        let (u_axis, v_axis) = cube_face_axes(side.plane.normal);
        side.projection.u_axis = u_axis;
        side.projection.v_axis = v_axis;
        sides.push(side);
    }
    Brush::from_sides(sides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::EQUALITY_EPSILON;

    #[test]
    fn test_from_bsp_unit_axes_identity() {
        // Unit axes with a zero world offset must come through unchanged.
        let proj = TextureProjection::from_bsp(
            vec3(1.0, 0.0, 0.0),
            12.0,
            vec3(0.0, -1.0, 0.0),
            -4.0,
            Vec3::ZERO,
        );
        assert!((proj.u_scale - 1.0).abs() < EQUALITY_EPSILON);
        assert!((proj.v_scale - 1.0).abs() < EQUALITY_EPSILON);
        assert!((proj.u_shift - 12.0).abs() < EQUALITY_EPSILON);
        assert!((proj.v_shift + 4.0).abs() < EQUALITY_EPSILON);
        assert!(proj.u_axis.approx_eq(vec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_from_bsp_scaled_axis_and_offset() {
        // An axis of length 2 encodes a 0.5 scale; a world offset moves the
        // shift by axis . offset.
        let proj = TextureProjection::from_bsp(
            vec3(2.0, 0.0, 0.0),
            100.0,
            vec3(0.0, 0.0, -2.0),
            0.0,
            vec3(8.0, 0.0, 0.0),
        );
        assert!((proj.u_scale - 0.5).abs() < EQUALITY_EPSILON);
        assert!((proj.u_shift - (100.0 - 16.0)).abs() < EQUALITY_EPSILON);
        assert!(proj.u_axis.approx_eq(vec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_axes_from_plane_floor_and_wall() {
        let (u, v) = texture_axes_from_plane(vec3(0.0, 0.0, 1.0));
        assert!(u.approx_eq(vec3(1.0, 0.0, 0.0)));
        assert!(v.approx_eq(vec3(0.0, -1.0, 0.0)));

        let (u, v) = texture_axes_from_plane(vec3(-1.0, 0.0, 0.0));
        assert!(u.approx_eq(vec3(0.0, 1.0, 0.0)));
        assert!(v.approx_eq(vec3(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_axes_from_plane_tilted_picks_dominant() {
        // Mostly-up normal still maps to the floor basis.
        let (u, v) = texture_axes_from_plane(vec3(0.3, 0.1, 0.9).normalized());
        assert!(u.approx_eq(vec3(1.0, 0.0, 0.0)));
        assert!(v.approx_eq(vec3(0.0, -1.0, 0.0)));
    }

    #[test]
    fn test_brush_from_wind_quad() {
        // Square loop on the z=0 plane, extruded 8 units down.
        let froms = [
            vec3(0.0, 0.0, 0.0),
            vec3(0.0, 64.0, 0.0),
            vec3(64.0, 64.0, 0.0),
            vec3(64.0, 0.0, 0.0),
        ];
        let tos = [froms[1], froms[2], froms[3], froms[0]];
        let brush = brush_from_wind(&froms, &tos, "wall", "null", TextureProjection::default(), 8.0);
        let sides = brush.sides();
        assert_eq!(sides.len(), 6);

        // Every side's plane must face away from the brush interior.
        let interior = vec3(32.0, 32.0, -4.0);
        for side in sides {
            assert!(side.plane.distance_to(interior) < 0.0);
            let [a, b, c] = side.resolved_points();
            let rebuilt = Plane::from_points(a, b, c);
            assert!(rebuilt.normal.approx_eq(side.plane.normal));
        }
        assert_eq!(sides[0].texture, "wall");
        assert_eq!(sides[1].texture, "null");
    }

    #[test]
    fn test_cube_brush_planes() {
        let brush = cube_brush(vec3(-16.0, -16.0, 0.0), vec3(16.0, 16.0, 32.0), "caulk");
        let sides = brush.sides();
        assert_eq!(sides.len(), 6);
        let interior = vec3(0.0, 0.0, 16.0);
        for side in sides {
            assert!(side.plane.distance_to(interior) < 0.0);
            // Axis-aligned: exactly one dominant component.
            let n = side.plane.normal;
            let sum = n.x.abs() + n.y.abs() + n.z.abs();
            assert!((sum - 1.0).abs() < EQUALITY_EPSILON);
        }
    }
}
