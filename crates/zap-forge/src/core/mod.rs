pub mod transform;
pub mod role;
pub mod scene;
#[cfg(feature = "physics")]
pub mod physics;
