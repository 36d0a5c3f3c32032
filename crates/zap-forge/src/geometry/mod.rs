// geometry/mod.rs
//
// Computational geometry used by the collider builder. Everything here is
// pure and works on plain DVec2 slices; no scene or document types leak in
// except through `shapes`.

pub mod path;
pub mod flatten;
pub mod polygon;
pub mod triangulate;
pub mod decompose;
pub mod simplify;
pub mod shapes;

pub use path::{parse_path, PathCommand, PathError};
pub use flatten::{flatten_path, Contour, FlattenOptions};
pub use polygon::{center_on_centroid, centroid, ensure_ccw, ensure_clockwise, is_convex, signed_area};
pub use triangulate::{triangulate, TriangulationError};
pub use decompose::{decompose, DecomposeError};
pub use simplify::{simplify, SimplifyOptions};
