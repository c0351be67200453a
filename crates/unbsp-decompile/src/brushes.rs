// brushes.rs — brush-set resolution and brush-to-solid conversion.
//
// Which brushes belong to a model is answered three different ways across
// the dialects, tried in priority order: a direct brush range on the model,
// a leaf range walked through the mark-brush list, or a BSP-tree headnode
// walked down to its leaves. The two leaf-based paths share mark-brush
// deduplication, since many leaves reference the same brush.

use std::collections::HashSet;

use unbsp_bsp::error::{checked_get, checked_range, BspError};
use unbsp_bsp::records::{BspBrush, Leaf, Model, Node};
use unbsp_bsp::BspFile;
use unbsp_common::map::{Brush, Side};
use unbsp_common::math::Vec3;
use unbsp_common::projection::TextureProjection;

use crate::faces::{self, best_triangle, orient_to_plane};
use crate::{Result, Settings};

/// Indices of every brush belonging to `model`, deduplicated, in first-seen
/// order.
pub fn resolve_brush_set(bsp: &BspFile, model: &Model) -> Result<Vec<usize>> {
    if model.first_brush >= 0 && model.num_brushes > 0 {
        let end = model.first_brush + model.num_brushes;
        if end as usize > bsp.brushes.len() {
            return Err(BspError::IndexOutOfRange {
                referrer: "model",
                lump: "brushes",
                index: end - 1,
                count: bsp.brushes.len(),
            }
            .into());
        }
        return Ok((model.first_brush as usize..end as usize).collect());
    }

    if model.first_leaf >= 0 && model.num_leaves > 0 {
        let leaves = checked_range(
            &bsp.leaves,
            model.first_leaf,
            model.num_leaves,
            "leaves",
            "model",
        )?;
        return mark_brushes(bsp, leaves.iter());
    }

    if model.head_node >= 0 && !bsp.nodes.is_empty() {
        let leaf_indices = collect_leaves(&bsp.nodes, model.head_node)?;
        let mut leaves = Vec::with_capacity(leaf_indices.len());
        for index in leaf_indices {
            if let Some(leaf) = checked_get(&bsp.leaves, index as i64, "leaves", "node child")? {
                leaves.push(leaf);
            }
        }
        return mark_brushes(bsp, leaves.into_iter());
    }

    Ok(Vec::new())
}

/// Walk a BSP tree iteratively from `head` and return every leaf index
/// exactly once. Recursion is out: tree depth is unbounded by anything we
/// control. A revisited node means a malformed (cyclic) tree and is skipped.
pub fn collect_leaves(nodes: &[Node], head: i64) -> Result<Vec<usize>> {
    let mut stack = vec![head];
    let mut visited = vec![false; nodes.len()];
    let mut seen_leaves = HashSet::new();
    let mut leaves = Vec::new();

    while let Some(index) = stack.pop() {
        if index < 0 {
            let leaf = (-index - 1) as usize;
            if seen_leaves.insert(leaf) {
                leaves.push(leaf);
            }
            continue;
        }
        let node = checked_get(nodes, index, "nodes", "tree traversal")?
            .ok_or(BspError::IndexOutOfRange {
                referrer: "tree traversal",
                lump: "nodes",
                index,
                count: nodes.len(),
            })?;
        if std::mem::replace(&mut visited[index as usize], true) {
            continue;
        }
        stack.push(node.children[0]);
        stack.push(node.children[1]);
    }
    Ok(leaves)
}

/// Gather the union of the mark-brush lists of `leaves`, deduplicated.
fn mark_brushes<'a>(
    bsp: &BspFile,
    leaves: impl Iterator<Item = &'a Leaf>,
) -> Result<Vec<usize>> {
    let mut seen = HashSet::new();
    let mut brushes = Vec::new();
    for leaf in leaves {
        for i in 0..leaf.num_leaf_brushes {
            let mark = bsp
                .leaf_brushes
                .get((leaf.first_leaf_brush + i) as usize)
                .ok_or(BspError::IndexOutOfRange {
                    referrer: "leaf",
                    lump: "leaf brushes",
                    index: leaf.first_leaf_brush + i,
                    count: bsp.leaf_brushes.len(),
                })?;
            if mark < 0 {
                continue;
            }
            if mark as usize >= bsp.brushes.len() {
                return Err(BspError::IndexOutOfRange {
                    referrer: "mark brush",
                    lump: "brushes",
                    index: mark,
                    count: bsp.brushes.len(),
                }
                .into());
            }
            if seen.insert(mark) {
                brushes.push(mark as usize);
            }
        }
    }
    Ok(brushes)
}

/// Convert one compiled brush into an editable solid. `side_cursor` is the
/// running cursor for the one dialect family whose sides are stored
/// contiguously without a per-brush reference. Returns None for brushes
/// with no renderable sides (all bevels, or empty).
pub fn convert_brush(
    bsp: &BspFile,
    settings: &Settings,
    brush: &BspBrush,
    side_cursor: &mut usize,
    origin: Vec3,
) -> Result<Option<Brush>> {
    let bsp_sides = if bsp.params.variant.sides_are_contiguous() {
        let first = *side_cursor;
        *side_cursor += brush.num_sides.max(0) as usize;
        checked_range(
            &bsp.brush_sides,
            first as i64,
            brush.num_sides,
            "brush sides",
            "brush",
        )?
    } else {
        checked_range(
            &bsp.brush_sides,
            brush.first_side,
            brush.num_sides,
            "brush sides",
            "brush",
        )?
    };

    // Contents live on the brush record, except in the Quake 3 lineage
    // where they hang off the referenced shader.
    let contents = if brush.texture >= 0 {
        bsp.textures
            .get(brush.texture as usize)
            .map(|t| t.contents)
            .unwrap_or(brush.contents)
    } else {
        brush.contents
    };

    let world_pos = if settings.texture_correction { origin } else { Vec3::ZERO };

    let mut sides = Vec::with_capacity(bsp_sides.len());
    for bsp_side in bsp_sides {
        if bsp_side.bevel {
            continue;
        }
        let Some(&plane) = checked_get(&bsp.planes, bsp_side.plane, "planes", "brush side")? else {
            continue;
        };

        let texture = faces::apply_texture_settings(faces::side_texture(bsp, bsp_side), settings);
        let mut side = Side::new(plane, texture.name);
        side.material = texture.material;
        side.flags = texture.flags;

        side.projection = if bsp_side.tex_info >= 0 {
            match bsp.tex_infos.get(bsp_side.tex_info as usize) {
                Some(info) => TextureProjection::from_bsp(
                    info.u_axis,
                    info.u_shift,
                    info.v_axis,
                    info.v_shift,
                    world_pos,
                ),
                None => TextureProjection::from_plane(&plane),
            }
        } else {
            TextureProjection::from_plane(&plane)
        };

        // Nightfire sides link back to a compiled face whose vertices give
        // real reference points; everywhere else points are synthesized
        // from the plane at write time.
        if bsp_side.face >= 0 {
            if let Some(face) = bsp.faces.get(bsp_side.face as usize) {
                let vertices = faces::face_vertices(bsp, face)?;
                if let Some(triangle) = best_triangle(&vertices) {
                    side.points = Some(orient_to_plane(triangle, &plane));
                }
            }
        }
        sides.push(side);
    }

    if sides.is_empty() {
        return Ok(None);
    }
    let mut solid = Brush::from_sides(sides);
    solid.is_detail = bsp.params.contents.is_detail(contents);
    solid.is_water = bsp.params.contents.is_water(contents);
    Ok(Some(solid))
}
