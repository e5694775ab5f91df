//! Deterministic breadth-first layering.
//!
//! Roots are nodes with no incoming edge and no parent hint, taken in node
//! order. Each BFS pass assigns a node to the layer where it is first reached;
//! anything still unplaced afterwards (a cycle nobody points into) seeds a new
//! pass from its first node. Layers become rows, top to bottom.

use std::collections::VecDeque;

use mindmap_core::Graph;

use crate::scene::Point;
use crate::style::Style;

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    layers: Vec<Vec<usize>>,
    placements: Vec<Placement>,
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub layer: usize,
    pub index_in_layer: usize,
    /// Centre of the node box.
    pub center: Point,
}

impl Layout {
    /// Node indices (into `Graph::nodes`) per layer.
    pub fn layers(&self) -> &[Vec<usize>] {
        &self.layers
    }

    /// Placement per node, indexed like `Graph::nodes`.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placement(&self, node_index: usize) -> Option<&Placement> {
        self.placements.get(node_index)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Children of every node: edge targets plus nodes naming it as parent.
fn successors(graph: &Graph) -> (Vec<Vec<usize>>, Vec<bool>) {
    let index = graph.node_index();
    let mut children = vec![Vec::new(); graph.nodes().len()];
    let mut has_incoming = vec![false; graph.nodes().len()];

    for edge in graph.edges() {
        if let (Some(&s), Some(&t)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
        {
            children[s].push(t);
            has_incoming[t] = true;
        }
    }
    for (i, node) in graph.nodes().iter().enumerate() {
        if let Some(&p) = node.parent.as_deref().and_then(|p| index.get(p)) {
            if !children[p].contains(&i) {
                children[p].push(i);
            }
            has_incoming[i] = true;
        }
    }
    (children, has_incoming)
}

fn assign_layers(graph: &Graph) -> Vec<Vec<usize>> {
    let count = graph.nodes().len();
    let (children, has_incoming) = successors(graph);
    let mut depth: Vec<Option<usize>> = vec![None; count];
    let mut layers: Vec<Vec<usize>> = Vec::new();

    let mut bfs = |seeds: Vec<usize>, depth: &mut [Option<usize>]| {
        let mut queue = VecDeque::new();
        for seed in seeds {
            if depth[seed].is_none() {
                depth[seed] = Some(0);
                queue.push_back(seed);
            }
        }
        while let Some(node) = queue.pop_front() {
            let d = depth[node].unwrap_or(0);
            if layers.len() <= d {
                layers.resize_with(d + 1, Vec::new);
            }
            layers[d].push(node);
            for &child in &children[node] {
                if depth[child].is_none() {
                    depth[child] = Some(d + 1);
                    queue.push_back(child);
                }
            }
        }
    };

    let roots: Vec<usize> = (0..count).filter(|&i| !has_incoming[i]).collect();
    bfs(roots, &mut depth);

    while let Some(seed) = depth.iter().position(Option::is_none) {
        bfs(vec![seed], &mut depth);
    }
    layers
}

pub fn layout(graph: &Graph, style: &Style) -> Layout {
    let layers = assign_layers(graph);
    let column = style.column_pitch();
    let row = style.layer_pitch();
    let widest = layers.iter().map(Vec::len).max().unwrap_or(0);

    let width = style.padding * 2.0 + widest as f64 * column;
    let height = style.padding * 2.0 + layers.len() as f64 * row;

    let origin = Point::new(0.0, 0.0);
    let mut placements = vec![
        Placement {
            layer: 0,
            index_in_layer: 0,
            center: origin,
        };
        graph.nodes().len()
    ];

    for (layer, members) in layers.iter().enumerate() {
        // Centre each row under the widest one.
        let offset = (widest - members.len()) as f64 * column / 2.0;
        for (index_in_layer, &node) in members.iter().enumerate() {
            placements[node] = Placement {
                layer,
                index_in_layer,
                center: Point::new(
                    style.padding + offset + (index_in_layer as f64 + 0.5) * column,
                    style.padding + (layer as f64 + 0.5) * row,
                ),
            };
        }
    }

    Layout {
        layers,
        placements,
        width,
        height,
    }
}
