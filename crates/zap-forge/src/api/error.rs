use thiserror::Error;

use crate::geometry::path::PathError;

/// Failure that aborts a whole export run. No partial document is produced.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("scene JSON is malformed: {0}")]
    Scene(#[source] serde_json::Error),

    #[error("export document is malformed: {0}")]
    Document(#[source] serde_json::Error),

    #[error("export config is malformed: {0}")]
    Config(#[source] serde_json::Error),

    #[error("invalid scene: {0}")]
    InvalidScene(String),

    #[error("no LevelBlock containers found in the document")]
    NoLevels,

    #[error("failed to serialize export document: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Failure while building a single GameObject's collider.
///
/// Contained at the object boundary: the object is still emitted, without a
/// collider, and the error text becomes a warning.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("node '{node}' has no width/height")]
    MissingDimensions { node: String },

    #[error("node '{node}' of type {kind} has no usable geometry")]
    UnsupportedGeometry { node: String, kind: String },

    #[error("node '{node}' produced no contour with enough points")]
    EmptyGeometry { node: String },

    #[error("node '{node}': {source}")]
    Path {
        node: String,
        #[source]
        source: PathError,
    },

    #[error("node '{node}' could not be triangulated")]
    Triangulation { node: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_node() {
        let err = BuildError::MissingDimensions { node: "Collider:Cuboid".into() };
        assert_eq!(err.to_string(), "node 'Collider:Cuboid' has no width/height");

        let err = BuildError::UnsupportedGeometry {
            node: "Label".into(),
            kind: "TEXT".into(),
        };
        assert!(err.to_string().contains("TEXT"));
    }

    #[test]
    fn no_levels_message() {
        assert_eq!(
            ExportError::NoLevels.to_string(),
            "no LevelBlock containers found in the document"
        );
    }
}
