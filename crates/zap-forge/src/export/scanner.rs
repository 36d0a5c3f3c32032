// export/scanner.rs
//
// Level Scanner: the export entry point. Finds LevelBlocks, drives the
// EntityBuilder over every GameObject in document order, stamps metadata and
// applies the global unit scale.

use crate::api::config::ExportConfig;
use crate::api::error::ExportError;
use crate::api::observer::{ExportEvent, ExportObserver};
use crate::core::role::NodeRole;
use crate::core::scene::{NodeId, SceneTree};
use crate::core::transform::LevelSpace;

use super::builder::EntityBuilder;
use super::diagnostics::Diagnostics;
use super::document::{ExportDocument, Level, Meta, Units, FORMAT_VERSION};

/// Export every (or every selected) LevelBlock of `tree`.
///
/// Per-object problems become warnings; anything else aborts the run and
/// is reported to `observer` as [`ExportEvent::Error`] before returning.
pub fn export_document(
    tree: &SceneTree,
    config: &ExportConfig,
    observer: &mut dyn ExportObserver,
) -> Result<ExportDocument, ExportError> {
    let result = run(tree, config, observer);
    if let Err(err) = &result {
        log::error!("export failed: {}", err);
        observer.on_event(&ExportEvent::Error(err.to_string()));
    }
    result
}

/// Parse host JSON (scene and config), export, and serialize the document.
pub fn export_json(
    scene_json: &str,
    config_json: Option<&str>,
    observer: &mut dyn ExportObserver,
) -> Result<String, ExportError> {
    let parsed = SceneTree::from_json(scene_json).and_then(|tree| {
        let config = match config_json {
            Some(json) if !json.trim().is_empty() => ExportConfig::from_json(json)?,
            _ => ExportConfig::default(),
        };
        Ok((tree, config))
    });
    let (tree, config) = match parsed {
        Ok(parsed) => parsed,
        Err(err) => {
            observer.on_event(&ExportEvent::Error(err.to_string()));
            return Err(err);
        }
    };
    export_document(&tree, &config, observer)?.to_json()
}

/// LevelBlocks to export: the selected ones when the selection contains
/// any, otherwise every LevelBlock in the document.
pub fn discover_levels(tree: &SceneTree) -> Vec<NodeId> {
    let selected: Vec<NodeId> = tree
        .selection()
        .iter()
        .copied()
        .filter(|&id| tree.get(id).is_some_and(|n| n.role.is_level()))
        .collect();
    if !selected.is_empty() {
        return selected;
    }
    tree.find_in_document(|n| n.role.is_level())
}

fn run(
    tree: &SceneTree,
    config: &ExportConfig,
    observer: &mut dyn ExportObserver,
) -> Result<ExportDocument, ExportError> {
    observer.on_event(&ExportEvent::Status("Scanning document".to_string()));
    let mut diagnostics = Diagnostics::new();

    let pixels_per_unit = match config.checked_pixels_per_unit() {
        Ok(ppu) => ppu,
        Err(message) => {
            diagnostics.warn(message.clone());
            observer.on_event(&ExportEvent::Warning(message));
            1.0
        }
    };

    let level_ids = discover_levels(tree);
    if level_ids.is_empty() {
        return Err(ExportError::NoLevels);
    }
    log::info!("exporting {} level(s)", level_ids.len());

    let mut levels = Vec::with_capacity(level_ids.len());
    for level_id in level_ids {
        levels.push(scan_level(tree, level_id, config, &mut diagnostics, observer)?);
    }

    let meta = Meta {
        version: FORMAT_VERSION.to_string(),
        timestamp: config.resolve_timestamp(),
        warnings: diagnostics.warnings().to_vec(),
        stats: diagnostics.stats(),
        units: Units { pixels_per_unit },
    };
    let scale = 1.0 / pixels_per_unit;
    for level in &mut levels {
        level.meta = meta.clone();
        level.scale(scale);
    }

    log::info!(
        "export finished: {} object(s), {} warning(s)",
        meta.stats.game_objects,
        meta.warnings.len()
    );
    observer.on_event(&ExportEvent::Status(format!(
        "Exported {} level(s), {} object(s)",
        meta.stats.levels, meta.stats.game_objects
    )));
    Ok(ExportDocument::new(levels))
}

fn scan_level(
    tree: &SceneTree,
    level_id: NodeId,
    config: &ExportConfig,
    diagnostics: &mut Diagnostics,
    observer: &mut dyn ExportObserver,
) -> Result<Level, ExportError> {
    let node = &tree[level_id];
    let name = match &node.role {
        NodeRole::Level { name } => name.clone(),
        _ => node.name.clone(),
    };
    let size = node
        .size
        .ok_or_else(|| ExportError::InvalidScene(format!("LevelBlock '{}' has no width/height", name)))?;
    let space = LevelSpace::new(&node.transform, size.x, size.y).ok_or_else(|| {
        ExportError::InvalidScene(format!("LevelBlock '{}' has a degenerate transform", name))
    })?;
    observer.on_event(&ExportEvent::Status(format!("Processing level '{}'", name)));

    let object_ids = tree.find_descendants(level_id, |n| n.role.is_game_object());
    if object_ids.is_empty() {
        let message = format!("Level '{}' contains no GameObjects", name);
        diagnostics.warn(message.clone());
        observer.on_event(&ExportEvent::Warning(message));
    }

    let builder = EntityBuilder::new(tree, &space, config);
    let total = object_ids.len();
    let mut game_objects = Vec::with_capacity(total);
    for (done, object_id) in object_ids.into_iter().enumerate() {
        let built = builder.build(object_id);
        for warning in built.diagnostics.warnings() {
            observer.on_event(&ExportEvent::Warning(warning.clone()));
        }
        diagnostics.merge(built.diagnostics);
        game_objects.push(built.object);
        observer.on_event(&ExportEvent::Progress {
            level: name.clone(),
            done: done + 1,
            total,
        });
    }
    diagnostics.count_level();

    Ok(Level {
        name,
        width: size.x,
        height: size.y,
        game_objects,
        meta: Meta {
            version: FORMAT_VERSION.to_string(),
            timestamp: String::new(),
            warnings: Vec::new(),
            stats: Default::default(),
            units: Units { pixels_per_unit: 1.0 },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{NodeKind, SceneNode};

    fn two_level_tree() -> (SceneTree, NodeId, NodeId) {
        let mut tree = SceneTree::new();
        let page = tree.add_root(SceneNode::new("Page", NodeKind::Other));
        let a = tree.add_child(page, SceneNode::new("LevelBlock: A", NodeKind::Frame).with_size(100.0, 100.0));
        let deco = tree.add_child(page, SceneNode::new("Decoration", NodeKind::Group));
        let b = tree.add_child(deco, SceneNode::new("LevelBlock:B", NodeKind::Frame).with_size(50.0, 50.0));
        (tree, a, b)
    }

    #[test]
    fn discovers_nested_levels() {
        let (tree, a, b) = two_level_tree();
        assert_eq!(discover_levels(&tree), vec![a, b]);
    }

    #[test]
    fn selection_restricts_levels() {
        let (mut tree, _a, b) = two_level_tree();
        tree.set_selection(vec![b]);
        assert_eq!(discover_levels(&tree), vec![b]);
    }

    #[test]
    fn selection_without_levels_falls_back_to_all() {
        let (mut tree, a, b) = two_level_tree();
        tree.set_selection(vec![NodeId(0)]);
        assert_eq!(discover_levels(&tree), vec![a, b]);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let (mut tree, a, b) = two_level_tree();
        tree.set_selection(vec![NodeId(99), b]);
        assert_eq!(discover_levels(&tree), vec![b]);
        tree.set_selection(vec![NodeId(99)]);
        assert_eq!(discover_levels(&tree), vec![a, b]);
    }

    #[test]
    fn no_levels_is_fatal_and_reported() {
        let mut tree = SceneTree::new();
        tree.add_root(SceneNode::new("Page", NodeKind::Other));
        let mut events = Vec::new();
        let result = export_document(&tree, &ExportConfig::default(), &mut |e: &ExportEvent| {
            events.push(e.clone())
        });
        assert!(matches!(result, Err(ExportError::NoLevels)));
        assert!(matches!(events.last(), Some(ExportEvent::Error(_))));
    }

    #[test]
    fn level_without_size_is_invalid() {
        let mut tree = SceneTree::new();
        tree.add_root(SceneNode::new("LevelBlock:Bad", NodeKind::Frame));
        assert!(matches!(
            export_document(&tree, &ExportConfig::default(), &mut ()),
            Err(ExportError::InvalidScene(_))
        ));
    }

    #[test]
    fn empty_level_warns_and_progress_is_reported() {
        let (mut tree, a, _b) = two_level_tree();
        let obj = tree.add_child(a, SceneNode::new("GameObject:Box", NodeKind::Group));
        tree.add_child(
            obj,
            SceneNode::new("Collider:Cuboid", NodeKind::Rectangle).with_size(10.0, 10.0).at(45.0, 45.0),
        );

        let mut events = Vec::new();
        let config = ExportConfig::default().with_timestamp("t0");
        let doc = export_document(&tree, &config, &mut |e: &ExportEvent| events.push(e.clone())).unwrap();

        assert_eq!(doc.version, FORMAT_VERSION);
        assert_eq!(doc.levels.len(), 2);
        assert_eq!(doc.levels[0].name, "A");
        assert_eq!(doc.levels[0].game_objects.len(), 1);

        let meta = &doc.levels[1].meta;
        assert_eq!(meta, &doc.levels[0].meta);
        assert_eq!(meta.timestamp, "t0");
        assert_eq!(meta.stats.levels, 2);
        assert_eq!(meta.stats.game_objects, 1);
        assert_eq!(meta.warnings, vec!["Level 'B' contains no GameObjects".to_string()]);

        assert!(events.contains(&ExportEvent::Progress { level: "A".into(), done: 1, total: 1 }));
        assert!(events.contains(&ExportEvent::Warning("Level 'B' contains no GameObjects".into())));
    }

    #[test]
    fn invalid_pixels_per_unit_falls_back_to_one() {
        let (tree, _, _) = two_level_tree();
        let config = ExportConfig::default().with_pixels_per_unit(0.0);
        let doc = export_document(&tree, &config, &mut ()).unwrap();
        assert_eq!(doc.levels[0].width, 100.0);
        assert_eq!(doc.levels[0].meta.units.pixels_per_unit, 1.0);
        assert!(doc.levels[0].meta.warnings[0].contains("pixelsPerUnit"));
    }

    #[test]
    fn export_json_reports_bad_config() {
        let scene = r#"{ "nodes": [] }"#;
        assert!(matches!(
            export_json(scene, Some("not json"), &mut ()),
            Err(ExportError::Config(_))
        ));
    }
}
