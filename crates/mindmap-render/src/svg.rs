use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use mindmap_core::Graph;
use tracing::debug;

use crate::layout::layout;
use crate::scene::{Curve, Scene};
use crate::style::Style;
use crate::surface::{DiagramHandle, RenderError, RenderResult, Surface};

/// Renders the final (non-animated) diagram for `graph` as a standalone SVG document.
pub fn render_svg(graph: &Graph, style: &Style) -> String {
    let scene = Scene::build(graph, &layout(graph, style), style);
    scene_to_svg(&scene, style)
}

pub fn scene_to_svg(scene: &Scene, style: &Style) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = fmt_num(scene.width),
        h = fmt_num(scene.height),
    );

    let _ = writeln!(
        out,
        r#"  <g class="edges" stroke="{}" stroke-width="{}" fill="none">"#,
        style.edge_color,
        fmt_num(style.edge_width)
    );
    for edge in &scene.edges {
        let _ = writeln!(
            out,
            r#"    <g class="edge" data-id="{}" data-source="{}" data-target="{}">"#,
            escape(&edge.id),
            escape(&edge.source),
            escape(&edge.target)
        );
        let _ = writeln!(out, r#"      <path d="{}"/>"#, path_data(&edge.curve));
        let [tip, left, right] = edge.arrow;
        let _ = writeln!(
            out,
            r#"      <polygon points="{},{} {},{} {},{}" fill="{}" stroke="none"/>"#,
            fmt_num(tip.x),
            fmt_num(tip.y),
            fmt_num(left.x),
            fmt_num(left.y),
            fmt_num(right.x),
            fmt_num(right.y),
            style.edge_color
        );
        if let Some(label) = &edge.label {
            let mid = edge.curve.from.lerp(edge.curve.to, 0.5);
            let _ = writeln!(
                out,
                r#"      <text x="{}" y="{}" font-size="{}" fill="{}" stroke="none" text-anchor="middle">{}</text>"#,
                fmt_num(mid.x),
                fmt_num(mid.y),
                fmt_num(style.font_size),
                style.node_text,
                escape(label)
            );
        }
        out.push_str("    </g>\n");
    }
    out.push_str("  </g>\n");

    out.push_str("  <g class=\"nodes\">\n");
    for node in &scene.nodes {
        let (x, y) = (
            node.center.x - node.width / 2.0,
            node.center.y - node.height / 2.0,
        );
        let _ = writeln!(
            out,
            r#"    <g class="node" data-id="{}">"#,
            escape(&node.id)
        );
        let _ = writeln!(
            out,
            r#"      <rect x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}" fill="{}"/>"#,
            fmt_num(x),
            fmt_num(y),
            fmt_num(node.width),
            fmt_num(node.height),
            style.node_fill,
            r = fmt_num(style.corner_radius),
        );
        let _ = writeln!(
            out,
            r#"      <text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
            fmt_num(node.center.x),
            fmt_num(node.center.y),
            fmt_num(style.font_size),
            style.node_text,
            escape(&node.label)
        );
        out.push_str("    </g>\n");
    }
    out.push_str("  </g>\n</svg>\n");
    out
}

fn path_data(c: &Curve) -> String {
    format!(
        "M {} {} C {} {}, {} {}, {} {}",
        fmt_num(c.from.x),
        fmt_num(c.from.y),
        fmt_num(c.ctrl1.x),
        fmt_num(c.ctrl1.y),
        fmt_num(c.ctrl2.x),
        fmt_num(c.ctrl2.y),
        fmt_num(c.to.x),
        fmt_num(c.to.y)
    )
}

fn fmt_num(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Keeps one SVG document per mounted diagram.
#[derive(Debug, Default)]
pub struct SvgSurface {
    style: Style,
    documents: BTreeMap<DiagramHandle, String>,
    next_id: u64,
}

impl SvgSurface {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            documents: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn document(&self, handle: DiagramHandle) -> Option<&str> {
        self.documents.get(&handle).map(String::as_str)
    }

    pub fn live_diagrams(&self) -> usize {
        self.documents.len()
    }

    pub fn write_to(&self, handle: DiagramHandle, path: &Path) -> RenderResult<()> {
        let document = self
            .document(handle)
            .ok_or(RenderError::UnknownDiagram(handle.0))?;
        std::fs::write(path, document)?;
        debug!(path = ?path, "wrote SVG");
        Ok(())
    }
}

impl Surface for SvgSurface {
    fn create(&mut self, scene: &Scene) -> RenderResult<DiagramHandle> {
        let handle = DiagramHandle(self.next_id);
        self.next_id += 1;
        self.documents
            .insert(handle, scene_to_svg(scene, &self.style));
        Ok(handle)
    }

    fn draw(&mut self, handle: DiagramHandle, scene: &Scene) -> RenderResult<()> {
        let document = self
            .documents
            .get_mut(&handle)
            .ok_or(RenderError::UnknownDiagram(handle.0))?;
        *document = scene_to_svg(scene, &self.style);
        Ok(())
    }

    fn destroy(&mut self, handle: DiagramHandle) {
        self.documents.remove(&handle);
    }
}
