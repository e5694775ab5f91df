use mindmap_core::Graph;

use crate::layout::Layout;
use crate::scene::{Point, Scene};
use crate::style::Style;

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(3)
}

/// Intro animation: every node starts at the diagram centre and eases out to
/// its laid-out position. The last frame equals the final scene.
#[derive(Debug, Clone)]
pub struct Transition {
    frames: Vec<Scene>,
}

impl Transition {
    pub fn from_center(graph: &Graph, layout: &Layout, style: &Style, frames: usize) -> Self {
        let frames = frames.max(1);
        let center = Point::new(layout.width() / 2.0, layout.height() / 2.0);
        let targets: Vec<Point> = layout.placements().iter().map(|p| p.center).collect();

        let frames = (1..=frames)
            .map(|step| {
                let t = ease_out_cubic(step as f64 / frames as f64);
                let centers: Vec<Point> = targets.iter().map(|&to| center.lerp(to, t)).collect();
                Scene::with_centers(graph, &centers, layout.width(), layout.height(), style)
            })
            .collect();
        Self { frames }
    }

    pub fn frames(&self) -> &[Scene] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Scene> {
        self.frames
    }
}
