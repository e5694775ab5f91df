//! Turns a [`mindmap_core::Graph`] into positioned shapes and draws them.
//!
//! [`layout`] assigns breadth-first layers, [`Scene`] holds node boxes and
//! curved edges, [`DiagramView`] manages one live diagram on a [`Surface`].

pub mod animation;
pub mod layout;
pub mod scene;
pub mod style;
pub mod surface;
pub mod svg;
pub mod view;

pub use animation::{ease_out_cubic, Transition};
pub use layout::{layout, Layout, Placement};
pub use scene::{Curve, EdgeShape, NodeShape, Point, Scene};
pub use style::Style;
pub use surface::{DiagramHandle, RenderError, RenderResult, Surface};
pub use svg::{render_svg, scene_to_svg, SvgSurface};
pub use view::DiagramView;
