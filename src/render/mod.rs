//! Renderer capabilities.
//!
//! Every visual surface implements `Renderer`: `render` is idempotent for
//! identical input and `destroy` releases the surface's animation loop and
//! backend resources. The concrete chart/scene/graph backends sit behind
//! the `Backend` trait.
//!
//! Variants:
//! - `distribution` - severity doughnut and attack-type bars
//! - `timeline` - time-bucketed history series
//! - `panels` - overview totals, funnel, MITRE matrix
//! - `feed` - AI decision feed
//! - `globe` - persistent animated 3D scene with expiring threat markers
//! - `graph` - force-directed investigation graph

pub mod animation;
pub mod backend;
pub mod distribution;
pub mod feed;
pub mod globe;
pub mod graph;
pub mod panels;
pub mod timeline;

pub use animation::*;
pub use backend::*;
pub use distribution::*;
pub use feed::*;
pub use globe::*;
pub use graph::*;
pub use panels::*;
pub use timeline::*;

use std::fmt;
use std::time::Instant;

use thiserror::Error;

use crate::scheduling::TimerQueue;

/// A visual surface of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Surface {
    Overview,
    SeverityChart,
    TypeChart,
    Timeline,
    Feed,
    Funnel,
    Matrix,
    Globe,
    Graph,
}

impl Surface {
    pub const ALL: [Surface; 9] = [
        Surface::Overview,
        Surface::SeverityChart,
        Surface::TypeChart,
        Surface::Timeline,
        Surface::Feed,
        Surface::Funnel,
        Surface::Matrix,
        Surface::Globe,
        Surface::Graph,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Overview => "overview",
            Surface::SeverityChart => "severity_chart",
            Surface::TypeChart => "type_chart",
            Surface::Timeline => "timeline",
            Surface::Feed => "feed",
            Surface::Funnel => "funnel",
            Surface::Matrix => "matrix",
            Surface::Globe => "globe",
            Surface::Graph => "graph",
        }
    }

    /// Navigation module that hosts this surface.
    pub fn module(&self) -> Module {
        match self {
            Surface::Globe => Module::ThreatMap,
            Surface::Graph => Module::Investigation,
            _ => Module::Overview,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Overview,
    ThreatMap,
    Investigation,
}

impl Module {
    pub fn surfaces(&self) -> impl Iterator<Item = Surface> + '_ {
        Surface::ALL.into_iter().filter(move |s| s.module() == *self)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("container for surface `{0}` is missing")]
    MissingContainer(Surface),

    #[error("backend failure on `{surface}`: {reason}")]
    Backend { surface: Surface, reason: String },
}

/// Everything a renderer may touch while drawing.
pub struct RenderCx<'a> {
    pub backend: &'a mut dyn Backend,
    pub timers: &'a mut TimerQueue,
    pub now: Instant,
}

impl<'a> RenderCx<'a> {
    pub fn new(backend: &'a mut dyn Backend, timers: &'a mut TimerQueue, now: Instant) -> Self {
        Self {
            backend,
            timers,
            now,
        }
    }

    /// Present a frame; a missing container is a no-op, not an error.
    pub fn present(&mut self, surface: Surface, frame: Frame) -> Result<bool, RenderError> {
        match self.backend.present(surface, &frame) {
            Ok(()) => Ok(true),
            Err(RenderError::MissingContainer(_)) => {
                log::debug!("RENDER_SKIPPED surface={} reason=missing_container", surface);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// The redraw contract shared by every surface.
pub trait Renderer {
    type Snapshot: ?Sized;

    fn surface(&self) -> Surface;

    /// Redraw from `snapshot`. Calling again with identical input leaves
    /// the same scene, never duplicated nodes.
    fn render(&mut self, snapshot: &Self::Snapshot, cx: &mut RenderCx<'_>)
        -> Result<(), RenderError>;

    /// Release the animation loop and backend resources.
    fn destroy(&mut self, cx: &mut RenderCx<'_>);
}
