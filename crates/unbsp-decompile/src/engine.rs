// engine.rs — the per-file reconstruction pipeline.
//
// One call, one file: enumerate entities, resolve each entity's brush set,
// convert brushes, decode the world's special surfaces, synthesize point
// entities for static props and cubemaps. All fatal errors abort this file
// only; the job layer reports them without touching other jobs.

use tracing::debug;

use unbsp_bsp::error::{checked_get, checked_range};
use unbsp_bsp::records::Model;
use unbsp_bsp::BspFile;
use unbsp_common::map::{Brush, Entity, MapDocument};

use crate::brushes::{convert_brush, resolve_brush_set};
use crate::faces::{self, face_vertices};
use crate::specials::{self, FACE_EXTRUDE_DEPTH};
use crate::{ProgressSink, Result, Settings};

/// Quake 3 lineage surface types.
const FACE_TYPE_PATCH: i64 = 2;
/// MoH extension: heightmap terrain surface.
const FACE_TYPE_TERRAIN: i64 = 5;

/// Reconstruct an editable map from a decoded container.
pub fn decompile(bsp: &BspFile, settings: &Settings, sink: &dyn ProgressSink) -> Result<MapDocument> {
    // Brushes dominate the work on large single-entity worlds, so each one
    // counts as its own unit; faces stand in when the brush lump is gone.
    let brush_units = if bsp.brushes.is_empty() {
        bsp.faces.len()
    } else {
        bsp.brushes.len()
    };
    let total = bsp.entities.len() + brush_units + bsp.static_props.len() + bsp.cubemaps.len();
    let mut progress = Progress::new(sink, total);
    let mut doc = MapDocument::default();
    let mut deferred = Vec::new();

    for entity in &bsp.entities {
        let mut entity = entity.clone();
        let model_number = entity.model_number();
        if model_number >= 0 {
            let brushes =
                entity_brushes(bsp, settings, &entity, model_number, sink, &mut progress)?;
            if model_number > 0 {
                // Geometry is inline now; the compiled model reference would
                // dangle in the output.
                entity.remove("model");
            }
            if settings.brushes_to_world && model_number != 0 {
                deferred.extend(brushes);
            } else {
                entity.brushes = brushes;
            }
        }
        doc.entities.push(entity);
        progress.step();
    }

    for ent in specials::static_prop_entities(bsp) {
        doc.entities.push(ent);
        progress.step();
    }
    for ent in specials::cubemap_entities(bsp) {
        doc.entities.push(ent);
        progress.step();
    }

    if !deferred.is_empty() {
        match doc.world_mut() {
            Some(world) => world.brushes.extend(deferred),
            None => {
                let mut world = Entity::with_classname("worldspawn");
                world.brushes = deferred;
                doc.entities.insert(0, world);
            }
        }
    }

    debug!(
        entities = doc.entities.len(),
        brushes = doc.brush_count(),
        "reconstruction finished"
    );
    sink.progress(1.0);
    Ok(doc)
}

fn entity_brushes(
    bsp: &BspFile,
    settings: &Settings,
    entity: &Entity,
    model_number: i32,
    sink: &dyn ProgressSink,
    progress: &mut Progress,
) -> Result<Vec<Brush>> {
    let Some(model) = checked_get(&bsp.models, model_number as i64, "models", "entity")? else {
        return Ok(Vec::new());
    };
    let origin = entity.origin();
    let mut out = Vec::new();

    if bsp.brushes.is_empty() {
        // The Quake family compiled its brushes away entirely; the only
        // geometry left is the face list, so each face becomes a thin
        // extruded solid.
        out.extend(extrude_model_faces(bsp, settings, model, progress)?);
    } else {
        let set = resolve_brush_set(bsp, model)?;
        let mut side_cursor = 0;
        if bsp.params.variant.sides_are_contiguous() {
            if let Some(&first) = set.first() {
                side_cursor = bsp.brushes[..first]
                    .iter()
                    .map(|b| b.num_sides.max(0) as usize)
                    .sum();
            }
        }
        for index in set {
            if let Some(solid) =
                convert_brush(bsp, settings, &bsp.brushes[index], &mut side_cursor, origin)?
            {
                out.push(solid);
            }
            progress.step();
        }
    }

    if model_number == 0 {
        out.extend(world_specials(bsp, settings, model, sink)?);
    }
    Ok(out)
}

/// Decode the world model's special surfaces: displacements, bezier
/// patches, terrain grids. Undecodable surfaces are skipped with a
/// warning; bad cross-lump references remain fatal.
fn world_specials(
    bsp: &BspFile,
    settings: &Settings,
    model: &Model,
    sink: &dyn ProgressSink,
) -> Result<Vec<Brush>> {
    let faces = checked_range(&bsp.faces, model.first_face, model.num_faces, "faces", "model")?;
    let mut out = Vec::new();
    for face in faces {
        if face.disp_info >= 0 {
            match specials::displacement_brush(bsp, settings, face)? {
                Some(brush) => out.push(brush),
                None => sink.log("skipping undecodable displacement surface", false),
            }
        } else if face.face_type == FACE_TYPE_PATCH && face.patch_size[0] >= 2 {
            match specials::patch_from_face(bsp, face)? {
                Some(brush) => out.push(brush),
                None => sink.log("skipping undecodable patch surface", false),
            }
        } else if bsp.params.variant.is_moh() && face.face_type == FACE_TYPE_TERRAIN {
            match specials::terrain_from_face(bsp, face)? {
                Some(brush) => out.push(brush),
                None => sink.log("skipping undecodable terrain surface", false),
            }
        }
    }
    Ok(out)
}

/// Quake-family geometry recovery: extrude each of the model's faces into
/// a thin solid along the reversed face normal.
fn extrude_model_faces(
    bsp: &BspFile,
    settings: &Settings,
    model: &Model,
    progress: &mut Progress,
) -> Result<Vec<Brush>> {
    let faces = checked_range(&bsp.faces, model.first_face, model.num_faces, "faces", "model")?;
    let mut out = Vec::with_capacity(faces.len());
    for face in faces {
        progress.step();
        let vertices = face_vertices(bsp, face)?;
        if vertices.len() < 3 {
            continue;
        }
        let texture =
            faces::apply_texture_settings(faces::tex_info_texture(bsp, face.tex_info), settings);
        let projection = match (face.tex_info >= 0)
            .then(|| bsp.tex_infos.get(face.tex_info as usize))
            .flatten()
        {
            Some(info) => unbsp_common::projection::TextureProjection::from_bsp(
                info.u_axis,
                info.u_shift,
                info.v_axis,
                info.v_shift,
                unbsp_common::math::Vec3::ZERO,
            ),
            None => unbsp_common::projection::TextureProjection::default(),
        };
        let mut tos = vertices.clone();
        tos.rotate_left(1);
        let mut brush = unbsp_common::projection::brush_from_wind(
            &vertices,
            &tos,
            &texture.name,
            &texture.name,
            projection,
            FACE_EXTRUDE_DEPTH,
        );
        if let Some(front) = brush.sides_mut().first_mut() {
            front.flags = texture.flags;
        }
        out.push(brush);
    }
    Ok(out)
}

/// Work-unit counter that forwards to the sink only when the fraction
/// crosses a whole-percent step, so observers are not flooded.
struct Progress<'a> {
    sink: &'a dyn ProgressSink,
    done: usize,
    total: usize,
    last_percent: usize,
}

impl<'a> Progress<'a> {
    fn new(sink: &'a dyn ProgressSink, total: usize) -> Progress<'a> {
        Progress {
            sink,
            done: 0,
            total: total.max(1),
            last_percent: 0,
        }
    }

    fn step(&mut self) {
        self.done += 1;
        // Units can overlap across entities, so never report past 100%.
        let percent = (self.done * 100 / self.total).min(100);
        if percent > self.last_percent {
            self.last_percent = percent;
            self.sink
                .progress((self.done as f32 / self.total as f32).min(1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        fractions: RefCell<Vec<f32>>,
    }

    impl ProgressSink for Recorder {
        fn progress(&self, fraction: f32) {
            self.fractions.borrow_mut().push(fraction);
        }
        fn log(&self, _message: &str, _is_error: bool) {}
    }

    #[test]
    fn test_progress_throttled_to_percent_steps() {
        let recorder = Recorder { fractions: RefCell::new(Vec::new()) };
        let mut progress = Progress::new(&recorder, 10_000);
        for _ in 0..10_000 {
            progress.step();
        }
        let emitted = recorder.fractions.borrow();
        // One emission per whole percent, not one per unit.
        assert_eq!(emitted.len(), 100);
        assert!((emitted.last().unwrap() - 1.0).abs() < f32::EPSILON);
        assert!(emitted.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_progress_small_totals_still_complete() {
        let recorder = Recorder { fractions: RefCell::new(Vec::new()) };
        let mut progress = Progress::new(&recorder, 3);
        for _ in 0..3 {
            progress.step();
        }
        let emitted = recorder.fractions.borrow();
        assert_eq!(emitted.len(), 3);
        assert!((emitted.last().unwrap() - 1.0).abs() < f32::EPSILON);
    }
}
