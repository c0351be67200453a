// specials.rs — special-surface decoding and synthesized point entities.
//
// Displacements, bezier patches and terrain grids all live on world-model
// faces. Each decoder is forgiving: a surface that cannot be decoded is
// skipped by the engine with a warning, never failing the file.

use unbsp_bsp::records::{DispInfo, DispVert, Face};
use unbsp_bsp::BspFile;
use unbsp_common::map::{Brush, Displacement, Entity, Patch, Terrain};
use unbsp_common::math::Vec3;
use unbsp_common::projection::{brush_from_wind, TextureProjection};
use unbsp_common::{DISP_CORNER_EPSILON, NULL_TEXTURE};

use crate::faces::{self, face_vertices};
use crate::{Result, Settings};

/// Extrusion depth for brushes synthesized from bare face windings.
pub const FACE_EXTRUDE_DEPTH: f32 = 32.0;

/// Read one displacement's vertex grid out of the flat dispvert array.
/// Returns None for a power outside the engine's 1..=4 range or a vertex
/// range that does not fit.
pub fn build_displacement(info: &DispInfo, verts: &[DispVert]) -> Option<Displacement> {
    if !(1..=4).contains(&info.power) || info.vert_start < 0 {
        return None;
    }
    let side = (1usize << info.power) + 1;
    let count = side * side;
    let grid = verts.get(info.vert_start as usize..info.vert_start as usize + count)?;
    Some(Displacement {
        power: info.power,
        start: info.start,
        normals: grid.iter().map(|v| v.normal).collect(),
        distances: grid.iter().map(|v| v.dist).collect(),
        alphas: grid.iter().map(|v| v.alpha).collect(),
    })
}

/// Rotate a quad's corners so the one matching the displacement's recorded
/// start position comes first. An exact match inside the corner epsilon is
/// preferred; otherwise the nearest corner wins.
pub fn orient_corners(corners: &[Vec3], start: Vec3) -> Vec<Vec3> {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, &corner) in corners.iter().enumerate() {
        let dist = (corner - start).length();
        if dist < DISP_CORNER_EPSILON {
            best = i;
            break;
        }
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    let mut out = corners.to_vec();
    out.rotate_left(best);
    out
}

/// Build the carrier solid for one displacement face: the quad winding
/// extruded into a detail brush with the grid attached to its front side.
pub fn displacement_brush(bsp: &BspFile, settings: &Settings, face: &Face) -> Result<Option<Brush>> {
    let corners = face_vertices(bsp, face)?;
    if corners.len() != 4 {
        return Ok(None);
    }
    let Some(info) = (face.disp_info >= 0)
        .then(|| bsp.disp_infos.get(face.disp_info as usize))
        .flatten()
    else {
        return Ok(None);
    };
    let Some(displacement) = build_displacement(info, &bsp.disp_verts) else {
        return Ok(None);
    };

    let texture = faces::apply_texture_settings(faces::tex_info_texture(bsp, face.tex_info), settings);
    let projection = match (face.tex_info >= 0)
        .then(|| bsp.tex_infos.get(face.tex_info as usize))
        .flatten()
    {
        Some(i) => TextureProjection::from_bsp(i.u_axis, i.u_shift, i.v_axis, i.v_shift, Vec3::ZERO),
        None => TextureProjection::default(),
    };

    let froms = orient_corners(&corners, info.start);
    let mut tos = froms.clone();
    tos.rotate_left(1);

    let mut brush = brush_from_wind(
        &froms,
        &tos,
        &texture.name,
        NULL_TEXTURE,
        projection,
        FACE_EXTRUDE_DEPTH,
    );
    brush.is_detail = true;
    if let Some(front) = brush.sides_mut().first_mut() {
        front.displacement = Some(displacement);
        front.flags = texture.flags;
    }
    Ok(Some(brush))
}

/// Decode a bezier patch face: the declared control-grid dimensions select
/// a row-major slice of the vertex lump.
pub fn patch_from_face(bsp: &BspFile, face: &Face) -> Result<Option<Brush>> {
    let (width, height) = (face.patch_size[0], face.patch_size[1]);
    if width < 2 || height < 2 || face.first_vertex < 0 {
        return Ok(None);
    }
    let count = (width * height) as usize;
    let Some(points) = bsp
        .vertices
        .get(face.first_vertex as usize..face.first_vertex as usize + count)
    else {
        return Ok(None);
    };
    Ok(Some(Brush::from_patch(Patch {
        texture: bsp.texture_name(face.texture).unwrap_or(NULL_TEXTURE).to_string(),
        width: width as usize,
        height: height as usize,
        points: points.to_vec(),
    })))
}

/// Decode a terrain face: a square grid inferred from the vertex count,
/// with each vertex snapped to its (row, col) cell by planar position.
pub fn terrain_from_face(bsp: &BspFile, face: &Face) -> Result<Option<Brush>> {
    let points = face_vertices(bsp, face)?;
    let Some(grid) = square_grid(&points) else {
        return Ok(None);
    };
    let side = (points.len() as f32).sqrt().round() as usize;
    Ok(Some(Brush::from_terrain(Terrain {
        texture: bsp.texture_name(face.texture).unwrap_or(NULL_TEXTURE).to_string(),
        side,
        points: grid,
    })))
}

/// Arrange a flat vertex list into a row-major square grid by comparing
/// each point's x/y position against the bounding box with a uniform cell
/// size. Non-uniform inputs simply land on the nearest cell.
fn square_grid(points: &[Vec3]) -> Option<Vec<Vec3>> {
    let side = (points.len() as f32).sqrt().round() as usize;
    if side < 2 || side * side != points.len() {
        return None;
    }
    let mut min = points[0];
    let mut max = points[0];
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let cell_x = (max.x - min.x) / (side - 1) as f32;
    let cell_y = (max.y - min.y) / (side - 1) as f32;
    if cell_x <= 0.0 || cell_y <= 0.0 {
        return None;
    }
    let mut grid = vec![Vec3::ZERO; side * side];
    for &p in points {
        let col = (((p.x - min.x) / cell_x).round() as usize).min(side - 1);
        let row = (((p.y - min.y) / cell_y).round() as usize).min(side - 1);
        grid[row * side + col] = p;
    }
    Some(grid)
}

/// One `prop_static` entity per static prop in the game lump.
pub fn static_prop_entities(bsp: &BspFile) -> Vec<Entity> {
    bsp.static_props
        .iter()
        .map(|prop| {
            let mut ent = Entity::with_classname("prop_static");
            ent.set("origin", format_vec(prop.origin));
            ent.set("angles", format_vec(prop.angles));
            ent.set("model", prop.model.clone());
            ent
        })
        .collect()
}

/// One `env_cubemap` entity per cubemap sample point.
pub fn cubemap_entities(bsp: &BspFile) -> Vec<Entity> {
    bsp.cubemaps
        .iter()
        .map(|cubemap| {
            let mut ent = Entity::with_classname("env_cubemap");
            ent.set("origin", format_vec(cubemap.origin));
            if cubemap.size != 0 {
                ent.set("cubemapsize", cubemap.size.to_string());
            }
            ent
        })
        .collect()
}

fn format_vec(v: Vec3) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}
