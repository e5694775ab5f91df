use std::sync::Arc;

use mindmap_core::Graph;
use tracing::debug;

use crate::animation::Transition;
use crate::layout::layout;
use crate::scene::{Point, Scene};
use crate::style::Style;
use crate::surface::{DiagramHandle, RenderResult, Surface};

struct Mounted {
    graph: Arc<Graph>,
    handle: DiagramHandle,
    scene: Scene,
}

/// Owns at most one diagram instance on a surface.
///
/// Showing a different graph (by reference, not by value) tears the current
/// instance down and builds a fresh one; there is no incremental diffing.
/// Dropping the view destroys whatever is still mounted.
pub struct DiagramView<S: Surface> {
    surface: S,
    style: Style,
    mounted: Option<Mounted>,
}

impl<S: Surface> DiagramView<S> {
    pub fn new(surface: S, style: Style) -> Self {
        Self {
            surface,
            style,
            mounted: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn handle(&self) -> Option<DiagramHandle> {
        self.mounted.as_ref().map(|m| m.handle)
    }

    /// Final scene of the mounted diagram.
    pub fn scene(&self) -> Option<&Scene> {
        self.mounted.as_ref().map(|m| &m.scene)
    }

    /// Mounts `graph`, replacing any diagram built from a different graph.
    /// Calling again with the same `Arc` is a no-op.
    pub fn show(&mut self, graph: Arc<Graph>) -> RenderResult<&Scene> {
        let mounted = match self.mounted.take() {
            Some(current) if Arc::ptr_eq(&current.graph, &graph) => current,
            previous => {
                if let Some(previous) = previous {
                    self.surface.destroy(previous.handle);
                    debug!(handle = previous.handle.0, "diagram destroyed");
                }
                self.build(graph)?
            }
        };
        Ok(&self.mounted.insert(mounted).scene)
    }

    fn build(&mut self, graph: Arc<Graph>) -> RenderResult<Mounted> {
        let layout = layout(&graph, &self.style);
        let scene = Scene::build(&graph, &layout, &self.style);

        let frames = if self.style.animate {
            Transition::from_center(&graph, &layout, &self.style, self.style.animation_frames)
                .into_frames()
        } else {
            vec![scene.clone()]
        };

        let handle = self.surface.create(&frames[0])?;
        for frame in &frames[1..] {
            if let Err(e) = self.surface.draw(handle, frame) {
                self.surface.destroy(handle);
                return Err(e);
            }
        }
        debug!(
            nodes = scene.nodes.len(),
            edges = scene.edges.len(),
            frames = frames.len(),
            "diagram mounted"
        );

        Ok(Mounted {
            graph,
            handle,
            scene,
        })
    }

    pub fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            self.surface.destroy(mounted.handle);
            debug!(handle = mounted.handle.0, "diagram destroyed");
        }
    }

    /// Id of the node under `p` in the mounted diagram.
    pub fn hit_test(&self, p: Point) -> Option<&str> {
        self.scene()?.hit_test(p).map(|n| n.id.as_str())
    }
}

impl<S: Surface> Drop for DiagramView<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
