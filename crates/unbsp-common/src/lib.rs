// unbsp-common — shared math and the editable map data model.
//
// Everything downstream of the binary decoder works in terms of these types:
// the reconstruction engine produces them, the dialect writers consume them.

pub mod map;
pub mod math;
pub mod projection;

/// Squared-area threshold below which a triangle picked from a face's
/// vertex fan is considered degenerate and plane-derived points are used
/// instead. Empirical value inherited from earlier decompilers.
pub const TRI_AREA_EPSILON: f32 = 0.001;

/// Distance threshold used when matching a displacement's start position
/// against the corners of its base face. Empirical.
pub const DISP_CORNER_EPSILON: f32 = 0.01;

/// Placeholder texture emitted when a face's texture reference cannot be
/// resolved at all.
pub const NULL_TEXTURE: &str = "**nulltexture**";

/// Placeholder texture for the known Source case where a texinfo carries a
/// bogus texdata reference. The upstream cause was never identified; the
/// substitution is kept as-is.
pub const SKIP_TEXTURE: &str = "**skiptexture**";
