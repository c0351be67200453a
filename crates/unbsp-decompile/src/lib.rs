// lib.rs — geometry reconstruction: compiled lumps back to editable solids.

pub mod brushes;
pub mod engine;
pub mod faces;
pub mod specials;

use thiserror::Error;

pub use engine::decompile;

#[derive(Debug, Error)]
pub enum DecompileError {
    #[error(transparent)]
    Bsp(#[from] unbsp_bsp::error::BspError),
}

pub type Result<T> = std::result::Result<T, DecompileError>;

/// Immutable per-job settings snapshot, fixed at submission time.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Replace sky/nodraw/hint/skip surfaces with the null placeholder.
    pub replace_special_textures: bool,
    /// Zero out per-side surface flags instead of carrying them through.
    pub strip_face_flags: bool,
    /// Attach every reconstructed solid to worldspawn, leaving brush
    /// entities as point entities.
    pub brushes_to_world: bool,
    /// Re-express compiled texture shifts relative to the owning entity's
    /// origin. Off means shifts stay baked to the level origin.
    pub texture_correction: bool,
    /// Writer-side entity post-processing (legacy fire-action remapping).
    pub entity_correction: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            replace_special_textures: false,
            strip_face_flags: false,
            brushes_to_world: false,
            texture_correction: true,
            entity_correction: true,
        }
    }
}

/// Observer for one job's progress fraction and user-facing messages.
/// Implemented by the job layer; the engine never touches global state.
pub trait ProgressSink {
    fn progress(&self, fraction: f32);
    fn log(&self, message: &str, is_error: bool);
}

/// Sink that discards everything, for tests and direct library use.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn progress(&self, _fraction: f32) {}
    fn log(&self, _message: &str, _is_error: bool) {}
}
