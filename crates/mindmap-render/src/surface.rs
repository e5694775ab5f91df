use thiserror::Error;

use crate::scene::Scene;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("diagram {0} is not mounted on this surface")]
    UnknownDiagram(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Identifies one diagram instance living on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagramHandle(pub u64);

/// Something a diagram can be drawn onto: an SVG document, a canvas, a test recorder.
///
/// A surface owns the instances it creates until [`Surface::destroy`] is called.
pub trait Surface {
    fn create(&mut self, scene: &Scene) -> RenderResult<DiagramHandle>;

    /// Replaces the instance's content with `scene` (one animation frame).
    fn draw(&mut self, handle: DiagramHandle, scene: &Scene) -> RenderResult<()>;

    fn destroy(&mut self, handle: DiagramHandle);
}
