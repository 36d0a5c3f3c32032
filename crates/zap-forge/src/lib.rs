pub mod api;
pub mod core;
pub mod geometry;
pub mod export;

// Re-export key types at crate root for convenience
pub use api::config::ExportConfig;
pub use api::error::{BuildError, ExportError};
pub use api::observer::{ExportEvent, ExportObserver};
pub use core::role::{BodyType, ColliderTag, NodeRole};
pub use core::scene::{NodeId, NodeKind, SceneNode, SceneTree};
pub use core::transform::{Frame, LevelSpace};
pub use export::document::{
    Collider, ColliderShape, ExportDocument, GameObject, Level, Meta, Stats, Units, FORMAT_VERSION,
};
pub use export::diagnostics::Diagnostics;
pub use export::builder::{BuiltObject, EntityBuilder};
pub use export::scanner::{discover_levels, export_document, export_json};
pub use geometry::flatten::{Contour, FlattenOptions};
pub use geometry::simplify::SimplifyOptions;

#[cfg(feature = "physics")]
pub use core::physics::{collider_shape, LevelBodies};
