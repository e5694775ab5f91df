use mindmap_core::Graph;
use serde::{Deserialize, Serialize};

use crate::layout::Layout;
use crate::style::Style;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, to: Point, t: f64) -> Point {
        if t >= 1.0 {
            return to;
        }
        Point::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeShape {
    pub id: String,
    pub label: String,
    pub center: Point,
    pub width: f64,
    pub height: f64,
}

impl NodeShape {
    pub fn contains(&self, p: Point) -> bool {
        (p.x - self.center.x).abs() <= self.width / 2.0
            && (p.y - self.center.y).abs() <= self.height / 2.0
    }

    /// Where the ray from the centre towards `toward` leaves the box.
    fn boundary_towards(&self, toward: Point) -> Point {
        let (dx, dy) = (toward.x - self.center.x, toward.y - self.center.y);
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            return self.center;
        }
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let scale = if dx.abs() * hh > dy.abs() * hw {
            hw / dx.abs()
        } else {
            hh / dy.abs()
        };
        Point::new(self.center.x + dx * scale, self.center.y + dy * scale)
    }
}

/// Cubic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeShape {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub curve: Curve,
    /// Triangle head: tip, then the two back corners.
    pub arrow: [Point; 3],
}

/// Positioned shapes for one frame of a diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<NodeShape>,
    pub edges: Vec<EdgeShape>,
}

impl Scene {
    pub fn build(graph: &Graph, layout: &Layout, style: &Style) -> Self {
        let centers: Vec<Point> = layout.placements().iter().map(|p| p.center).collect();
        Self::with_centers(graph, &centers, layout.width(), layout.height(), style)
    }

    /// Builds the scene with node centres given explicitly, one per graph node.
    /// Nodes without a centre are left out, along with their edges.
    pub(crate) fn with_centers(
        graph: &Graph,
        centers: &[Point],
        width: f64,
        height: f64,
        style: &Style,
    ) -> Self {
        let nodes: Vec<NodeShape> = graph
            .nodes()
            .iter()
            .zip(centers)
            .map(|(node, &center)| NodeShape {
                id: node.id.clone(),
                label: node.label.clone(),
                center,
                width: style.node_width,
                height: style.node_height,
            })
            .collect();

        let index = graph.node_index();
        let edges = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let source = nodes.get(*index.get(edge.source.as_str())?)?;
                let target = nodes.get(*index.get(edge.target.as_str())?)?;
                let curve = route(source, target);
                Some(EdgeShape {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    label: edge.label.clone(),
                    curve,
                    arrow: arrow_head(&curve, style.arrow_size),
                })
            })
            .collect();

        Self {
            width,
            height,
            nodes,
            edges,
        }
    }

    /// Topmost node under `p`; later nodes are drawn over earlier ones.
    pub fn hit_test(&self, p: Point) -> Option<&NodeShape> {
        self.nodes.iter().rev().find(|n| n.contains(p))
    }

    pub fn node(&self, id: &str) -> Option<&NodeShape> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Bends along the dominant axis so layered edges leave the bottom of the
/// source and enter the top of the target.
fn route(source: &NodeShape, target: &NodeShape) -> Curve {
    if source.id == target.id {
        return self_loop(source);
    }
    let from = source.boundary_towards(target.center);
    let to = target.boundary_towards(source.center);
    let (dx, dy) = (to.x - from.x, to.y - from.y);

    let (ctrl1, ctrl2) = if dy.abs() >= dx.abs() {
        (
            Point::new(from.x, from.y + dy / 2.0),
            Point::new(to.x, to.y - dy / 2.0),
        )
    } else {
        (
            Point::new(from.x + dx / 2.0, from.y),
            Point::new(to.x - dx / 2.0, to.y),
        )
    };
    Curve {
        from,
        ctrl1,
        ctrl2,
        to,
    }
}

fn self_loop(node: &NodeShape) -> Curve {
    let right = node.center.x + node.width / 2.0;
    let top = node.center.y - node.height / 2.0;
    Curve {
        from: Point::new(right, node.center.y),
        ctrl1: Point::new(right + node.height, node.center.y),
        ctrl2: Point::new(node.center.x, top - node.height),
        to: Point::new(node.center.x, top),
    }
}

fn arrow_head(curve: &Curve, size: f64) -> [Point; 3] {
    let tip = curve.to;
    let (mut dx, mut dy) = (tip.x - curve.ctrl2.x, tip.y - curve.ctrl2.y);
    let mut len = (dx * dx + dy * dy).sqrt();
    if len < 1e-6 {
        (dx, dy) = (tip.x - curve.from.x, tip.y - curve.from.y);
        len = (dx * dx + dy * dy).sqrt().max(1e-6);
    }
    let (ux, uy) = (dx / len, dy / len);
    let back = Point::new(tip.x - ux * size, tip.y - uy * size);
    let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
    [
        tip,
        Point::new(back.x + px, back.y + py),
        Point::new(back.x - px, back.y - py),
    ]
}
