// faces.rs — face winding recovery, reference-point selection, texture
// name resolution.

use unbsp_bsp::error::{checked_get, checked_range, BspError};
use unbsp_bsp::format::{BspFamily, SurfFlags};
use unbsp_bsp::records::{BrushSide, Face};
use unbsp_bsp::BspFile;
use unbsp_common::math::{triangle_area_squared, Plane, Vec3};
use unbsp_common::{NULL_TEXTURE, TRI_AREA_EPSILON};

use crate::{Result, Settings};

/// Recover a face's boundary loop in winding order.
///
/// Quake and Source store faces as runs of signed surfedge indices: a
/// negative index walks the shared edge backwards. The Quake 3 lineage and
/// Nightfire store an explicit vertex range instead.
pub fn face_vertices(bsp: &BspFile, face: &Face) -> Result<Vec<Vec3>> {
    if face.first_edge >= 0 && face.num_edges > 0 {
        let mut out = Vec::with_capacity(face.num_edges as usize);
        for i in 0..face.num_edges {
            let surf_edge = bsp
                .surf_edges
                .get((face.first_edge + i) as usize)
                .ok_or(BspError::IndexOutOfRange {
                    referrer: "face",
                    lump: "surfedges",
                    index: face.first_edge + i,
                    count: bsp.surf_edges.len(),
                })?;
            let edge = checked_get(&bsp.edges, surf_edge.abs(), "edges", "surfedge")?
                .copied()
                .unwrap_or(unbsp_bsp::records::Edge { v: [0, 0] });
            let vertex = if surf_edge >= 0 { edge.v[0] } else { edge.v[1] };
            let position = checked_get(&bsp.vertices, vertex, "vertices", "edge")?;
            if let Some(&position) = position {
                out.push(position);
            }
        }
        Ok(out)
    } else {
        Ok(checked_range(
            &bsp.vertices,
            face.first_vertex,
            face.num_vertices,
            "vertices",
            "face",
        )?
        .to_vec())
    }
}

/// Pick three reference points from a face's triangle fan: the largest-area
/// triangle wins, first-found on ties. Returns None when every candidate is
/// degenerate (below the squared-area epsilon) so the caller can fall back
/// to plane-derived points.
pub fn best_triangle(points: &[Vec3]) -> Option<[Vec3; 3]> {
    let mut best = None;
    let mut best_area = TRI_AREA_EPSILON;
    for i in 1..points.len().saturating_sub(1) {
        let area = triangle_area_squared(points[0], points[i], points[i + 1]);
        if area > best_area {
            best_area = area;
            best = Some([points[0], points[i], points[i + 1]]);
        }
    }
    best
}

/// Rewind a point triple so that `Plane::from_points` over it recovers
/// `plane`'s orientation rather than its mirror.
pub fn orient_to_plane(mut points: [Vec3; 3], plane: &Plane) -> [Vec3; 3] {
    let wound = Plane::from_points(points[0], points[1], points[2]);
    if wound.normal.dot(plane.normal) < 0.0 {
        points.swap(0, 2);
    }
    points
}

/// A side's resolved texture identity: display name, Nightfire material
/// companion, and surface flags.
#[derive(Debug, Clone, Default)]
pub struct SideTexture {
    pub name: String,
    pub material: String,
    pub flags: u32,
}

/// Resolve the texture of one brush side, following whichever reference
/// chain the variant uses. Unresolvable references substitute the null
/// placeholder rather than failing the file.
pub fn side_texture(bsp: &BspFile, side: &BrushSide) -> SideTexture {
    // Quake 3 lineage: the side references a shader record directly.
    if side.texture >= 0 {
        if let Some(tex) = bsp.textures.get(side.texture as usize) {
            return SideTexture {
                name: tex.name.clone(),
                material: String::new(),
                flags: tex.flags,
            };
        }
        return SideTexture {
            name: NULL_TEXTURE.to_string(),
            ..SideTexture::default()
        };
    }
    // Nightfire: side -> face -> texture/material records.
    if side.face >= 0 {
        if let Some(face) = bsp.faces.get(side.face as usize) {
            return SideTexture {
                name: bsp
                    .texture_name(face.texture)
                    .unwrap_or(NULL_TEXTURE)
                    .to_string(),
                material: bsp.material_name(face.material).unwrap_or("").to_string(),
                flags: face.flags,
            };
        }
    }
    tex_info_texture(bsp, side.tex_info)
}

/// Resolve a texture through the texinfo chain: inline name (Quake 2),
/// miptex reference (Quake), or the texdata string table (Source).
pub fn tex_info_texture(bsp: &BspFile, tex_info: i64) -> SideTexture {
    let Some(info) = (tex_info >= 0)
        .then(|| bsp.tex_infos.get(tex_info as usize))
        .flatten()
    else {
        return SideTexture {
            name: NULL_TEXTURE.to_string(),
            ..SideTexture::default()
        };
    };
    let name = if !info.name.is_empty() {
        info.name.clone()
    } else if bsp.params.family == BspFamily::Source {
        bsp.tex_data_name(info.tex_data).to_string()
    } else {
        bsp.texture_name(info.tex_data)
            .unwrap_or(NULL_TEXTURE)
            .to_string()
    };
    SideTexture {
        name,
        material: String::new(),
        flags: info.flags,
    }
}

/// Names the Source toolset gives to editor-only surfaces.
const SPECIAL_TEXTURE_NAMES: [&str; 6] = [
    "tools/toolsnodraw",
    "tools/toolsskip",
    "tools/toolshint",
    "tools/toolsclip",
    "tools/toolsskybox",
    "tools/toolstrigger",
];

/// Apply the replace-special-textures and strip-face-flags settings to a
/// resolved texture.
pub fn apply_texture_settings(mut texture: SideTexture, settings: &Settings) -> SideTexture {
    if settings.replace_special_textures && is_special(&texture) {
        texture.name = NULL_TEXTURE.to_string();
    }
    if settings.strip_face_flags {
        texture.flags = 0;
    }
    texture
}

fn is_special(texture: &SideTexture) -> bool {
    let flagged = SurfFlags::from_bits_retain(texture.flags)
        .intersects(SurfFlags::SKY | SurfFlags::NODRAW | SurfFlags::HINT | SurfFlags::SKIP);
    flagged
        || SPECIAL_TEXTURE_NAMES
            .iter()
            .any(|name| texture.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use unbsp_common::math::vec3;

    #[test]
    fn test_best_triangle_picks_max_area() {
        // Fan from p0: triangle (p0, p2, p3) is much larger than (p0, p1, p2).
        let points = [
            vec3(0.0, 0.0, 0.0),
            vec3(1.0, 0.0, 0.0),
            vec3(1.0, 1.0, 0.0),
            vec3(0.0, 64.0, 0.0),
        ];
        let tri = best_triangle(&points).unwrap();
        assert!(tri[1].approx_eq(points[2]));
        assert!(tri[2].approx_eq(points[3]));
    }

    #[test]
    fn test_best_triangle_degenerate_falls_back() {
        // Collinear fan: every triangle has ~zero area.
        let points = [
            vec3(0.0, 0.0, 0.0),
            vec3(1.0, 0.0, 0.0),
            vec3(2.0, 0.0, 0.0),
            vec3(3.0, 0.0, 0.0),
        ];
        assert!(best_triangle(&points).is_none());
        assert!(best_triangle(&points[..2]).is_none());
    }

    #[test]
    fn test_orient_to_plane_flips_mirrored_winding() {
        let plane = Plane {
            normal: vec3(0.0, 0.0, 1.0),
            dist: 0.0,
        };
        let mirrored = [
            vec3(0.0, 0.0, 0.0),
            vec3(0.0, 1.0, 0.0),
            vec3(1.0, 0.0, 0.0),
        ];
        let fixed = orient_to_plane(mirrored, &plane);
        let rebuilt = Plane::from_points(fixed[0], fixed[1], fixed[2]);
        assert!(rebuilt.normal.dot(plane.normal) > 0.0);
    }

    #[test]
    fn test_special_texture_replacement() {
        let settings = Settings {
            replace_special_textures: true,
            ..Settings::default()
        };
        let replaced = apply_texture_settings(
            SideTexture {
                name: "TOOLS/TOOLSNODRAW".to_string(),
                ..SideTexture::default()
            },
            &settings,
        );
        assert_eq!(replaced.name, NULL_TEXTURE);

        let kept = apply_texture_settings(
            SideTexture {
                name: "metal/wall01".to_string(),
                ..SideTexture::default()
            },
            &settings,
        );
        assert_eq!(kept.name, "metal/wall01");
    }

    #[test]
    fn test_flag_stripping() {
        let settings = Settings {
            strip_face_flags: true,
            ..Settings::default()
        };
        let stripped = apply_texture_settings(
            SideTexture {
                name: "x".to_string(),
                flags: 0x84,
                ..SideTexture::default()
            },
            &settings,
        );
        assert_eq!(stripped.flags, 0);
    }
}
