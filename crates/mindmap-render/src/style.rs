use serde::{Deserialize, Serialize};

pub const NODE_FILL: &str = "#4299e1";
pub const NODE_TEXT: &str = "#2d3748";
pub const EDGE_COLOR: &str = "#a0aec0";

/// Visual constants for nodes, edges and the layered layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub node_fill: String,
    pub node_text: String,
    pub font_size: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub corner_radius: f64,
    pub edge_color: String,
    pub edge_width: f64,
    pub arrow_size: f64,
    /// Empty margin around the whole diagram.
    pub padding: f64,
    /// Multiplier applied to the node box to get the layer and column pitch.
    pub spacing_factor: f64,
    pub animate: bool,
    /// Frames sampled for the intro transition, final frame included.
    pub animation_frames: usize,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            node_fill: NODE_FILL.to_string(),
            node_text: NODE_TEXT.to_string(),
            font_size: 12.0,
            node_width: 120.0,
            node_height: 40.0,
            corner_radius: 8.0,
            edge_color: EDGE_COLOR.to_string(),
            edge_width: 2.0,
            arrow_size: 8.0,
            padding: 30.0,
            spacing_factor: 1.5,
            animate: true,
            animation_frames: 12,
        }
    }
}

impl Style {
    pub fn column_pitch(&self) -> f64 {
        self.node_width * self.spacing_factor
    }

    pub fn layer_pitch(&self) -> f64 {
        self.node_height * self.spacing_factor * 2.0
    }
}
