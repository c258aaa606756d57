//! Scene placement: swap a loaded model root in and out of the host scene.

use std::sync::Arc;

use plinth_core::scene::{SceneNode, Transform};

/// The host's live scene, as seen by the placement controller.
///
/// The controller only ever holds one placed root at a time and identifies
/// it by `Arc` pointer, so `remove` receives the exact handle that was
/// passed to `insert`.
pub trait LiveScene {
    /// Add a model root to the scene at the given world transform.
    fn insert(&mut self, root: Arc<SceneNode>, transform: Transform);

    /// Remove a previously inserted model root.
    fn remove(&mut self, root: &Arc<SceneNode>);

    /// World transform of the placement anchor (e.g. a table surface).
    fn anchor(&self) -> Transform;
}

/// Places one model root at the scene anchor, replacing whatever was placed
/// before.
#[derive(Default)]
pub struct PlacementController {
    placed: Option<Arc<SceneNode>>,
    offset: Transform,
}

impl PlacementController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A controller that places models at anchor composed with `offset`
    /// (e.g. a lift off the surface or a default orientation).
    pub fn with_offset(offset: Transform) -> Self {
        Self {
            placed: None,
            offset,
        }
    }

    /// The currently placed root, if any.
    pub fn placed(&self) -> Option<&Arc<SceneNode>> {
        self.placed.as_ref()
    }

    /// Replace the placed model with `root` (or clear it with `None`).
    ///
    /// Placing the same root again is a no-op. When swapping, the new root
    /// is inserted before the old one is removed so the scene never shows
    /// an empty frame in between.
    pub fn place(&mut self, scene: &mut dyn LiveScene, root: Option<Arc<SceneNode>>) {
        if let (Some(old), Some(new)) = (&self.placed, &root) {
            if Arc::ptr_eq(old, new) {
                return;
            }
        }

        let previous = self.placed.take();

        if let Some(new) = root {
            let transform = scene.anchor().compose(&self.offset);
            log::debug!("placing model '{}' at anchor", new.name);
            scene.insert(Arc::clone(&new), transform);
            self.placed = Some(new);
        }

        if let Some(old) = previous {
            scene.remove(&old);
        }
    }

    /// Remove the placed model, if any.
    pub fn clear(&mut self, scene: &mut dyn LiveScene) {
        self.place(scene, None);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use plinth_math::Vec3;

    /// Test double that records every scene mutation in order.
    #[derive(Debug, PartialEq)]
    pub enum SceneEvent {
        Inserted(String, Transform),
        Removed(String),
    }

    pub struct RecordingScene {
        pub events: Vec<SceneEvent>,
        pub anchor: Transform,
    }

    impl RecordingScene {
        pub fn new() -> Self {
            Self {
                events: Vec::new(),
                anchor: Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)),
            }
        }
    }

    impl LiveScene for RecordingScene {
        fn insert(&mut self, root: Arc<SceneNode>, transform: Transform) {
            self.events
                .push(SceneEvent::Inserted(root.name.clone(), transform));
        }

        fn remove(&mut self, root: &Arc<SceneNode>) {
            self.events.push(SceneEvent::Removed(root.name.clone()));
        }

        fn anchor(&self) -> Transform {
            self.anchor.clone()
        }
    }

    fn model(name: &str) -> Arc<SceneNode> {
        Arc::new(SceneNode::group(name))
    }

    #[test]
    fn test_place_inserts_at_anchor() {
        let mut scene = RecordingScene::new();
        let mut controller = PlacementController::new();

        controller.place(&mut scene, Some(model("chair")));

        assert_eq!(
            scene.events,
            vec![SceneEvent::Inserted(
                "chair".into(),
                Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))
            )]
        );
        assert!(controller.placed().is_some());
    }

    #[test]
    fn test_placing_same_root_is_idempotent() {
        let mut scene = RecordingScene::new();
        let mut controller = PlacementController::new();
        let chair = model("chair");

        controller.place(&mut scene, Some(Arc::clone(&chair)));
        controller.place(&mut scene, Some(Arc::clone(&chair)));
        controller.place(&mut scene, Some(chair));

        assert_eq!(scene.events.len(), 1);
    }

    #[test]
    fn test_replacement_inserts_before_removing() {
        let mut scene = RecordingScene::new();
        let mut controller = PlacementController::new();

        controller.place(&mut scene, Some(model("chair")));
        controller.place(&mut scene, Some(model("table")));

        let names: Vec<_> = scene
            .events
            .iter()
            .map(|e| match e {
                SceneEvent::Inserted(name, _) => format!("+{name}"),
                SceneEvent::Removed(name) => format!("-{name}"),
            })
            .collect();
        assert_eq!(names, vec!["+chair", "+table", "-chair"]);
    }

    #[test]
    fn test_clear_removes_placed_model() {
        let mut scene = RecordingScene::new();
        let mut controller = PlacementController::new();

        controller.place(&mut scene, Some(model("chair")));
        controller.clear(&mut scene);
        controller.clear(&mut scene);

        assert_eq!(scene.events.len(), 2);
        assert_eq!(scene.events[1], SceneEvent::Removed("chair".into()));
        assert!(controller.placed().is_none());
    }

    #[test]
    fn test_offset_is_composed_with_anchor() {
        let mut scene = RecordingScene::new();
        let offset = Transform::from_translation(Vec3::new(0.0, 0.5, 0.0));
        let mut controller = PlacementController::with_offset(offset);

        controller.place(&mut scene, Some(model("lamp")));

        let SceneEvent::Inserted(_, transform) = &scene.events[0] else {
            panic!("expected insertion");
        };
        assert!((transform.translation - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-6);
    }
}
