//! Rendering backend seam.
//!
//! Backends are opaque: they accept a fully built frame for a surface and
//! draw it. `RecordingBackend` keeps frames for inspection, `LogBackend`
//! logs a one-line digest of each frame.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{RenderError, Surface};
use crate::render::feed::FeedRow;
use crate::render::globe::GlobeFrame;
use crate::render::graph::GraphFrame;
use crate::render::panels::{FunnelStage, OverviewFrame};

/// One labelled value of a distribution chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: u64,
    pub color: u32,
}

/// One point of a time series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: u64,
}

/// A fully built frame for one surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Distribution(Vec<Slice>),
    Timeline(Vec<SeriesPoint>),
    Overview(OverviewFrame),
    Funnel(Vec<FunnelStage>),
    Matrix(Vec<(String, u64)>),
    Feed(Vec<FeedRow>),
    Globe(GlobeFrame),
    Graph(GraphFrame),
}

impl Frame {
    /// Number of drawable nodes in the frame.
    pub fn node_count(&self) -> usize {
        match self {
            Frame::Distribution(slices) => slices.len(),
            Frame::Timeline(points) => points.len(),
            Frame::Overview(_) => 1,
            Frame::Funnel(stages) => stages.len(),
            Frame::Matrix(rows) => rows.len(),
            Frame::Feed(rows) => rows.len(),
            Frame::Globe(globe) => globe.markers.len(),
            Frame::Graph(graph) => graph.nodes.len() + graph.edges.len(),
        }
    }
}

/// Opaque drawing capability for all surfaces.
pub trait Backend {
    /// Prepare the surface's container. `Ok(true)` means it already holds
    /// rendered content.
    fn mount(&mut self, surface: Surface) -> Result<bool, RenderError>;

    fn present(&mut self, surface: Surface, frame: &Frame) -> Result<(), RenderError>;

    fn release(&mut self, surface: Surface);
}

#[derive(Debug, Default)]
struct Recorded {
    mounted: HashSet<Surface>,
    missing: HashSet<Surface>,
    frames: HashMap<Surface, Vec<Frame>>,
    mounts: HashMap<Surface, usize>,
    releases: HashMap<Surface, usize>,
}

/// Keeps every presented frame. Clones share the same record, so a test or
/// host can keep a handle after giving the backend away.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `surface`'s container absent.
    pub fn remove_container(&self, surface: Surface) {
        self.inner.lock().missing.insert(surface);
    }

    pub fn frames(&self, surface: Surface) -> Vec<Frame> {
        self.inner
            .lock()
            .frames
            .get(&surface)
            .cloned()
            .unwrap_or_default()
    }

    pub fn last_frame(&self, surface: Surface) -> Option<Frame> {
        self.inner
            .lock()
            .frames
            .get(&surface)
            .and_then(|f| f.last().cloned())
    }

    pub fn present_count(&self, surface: Surface) -> usize {
        self.inner
            .lock()
            .frames
            .get(&surface)
            .map(|f| f.len())
            .unwrap_or(0)
    }

    pub fn mount_count(&self, surface: Surface) -> usize {
        self.inner.lock().mounts.get(&surface).copied().unwrap_or(0)
    }

    pub fn release_count(&self, surface: Surface) -> usize {
        self.inner.lock().releases.get(&surface).copied().unwrap_or(0)
    }
}

impl Backend for RecordingBackend {
    fn mount(&mut self, surface: Surface) -> Result<bool, RenderError> {
        let mut inner = self.inner.lock();
        if inner.missing.contains(&surface) {
            return Err(RenderError::MissingContainer(surface));
        }
        *inner.mounts.entry(surface).or_default() += 1;
        Ok(!inner.mounted.insert(surface))
    }

    fn present(&mut self, surface: Surface, frame: &Frame) -> Result<(), RenderError> {
        let mut inner = self.inner.lock();
        if inner.missing.contains(&surface) {
            return Err(RenderError::MissingContainer(surface));
        }
        inner.frames.entry(surface).or_default().push(frame.clone());
        Ok(())
    }

    fn release(&mut self, surface: Surface) {
        let mut inner = self.inner.lock();
        inner.mounted.remove(&surface);
        *inner.releases.entry(surface).or_default() += 1;
    }
}

/// Logs a digest of each frame; for headless runs.
#[derive(Debug, Default)]
pub struct LogBackend {
    mounted: HashSet<Surface>,
}

impl Backend for LogBackend {
    fn mount(&mut self, surface: Surface) -> Result<bool, RenderError> {
        Ok(!self.mounted.insert(surface))
    }

    fn present(&mut self, surface: Surface, frame: &Frame) -> Result<(), RenderError> {
        match frame {
            Frame::Overview(o) => log::info!(
                "FRAME surface={} total={} critical={} active={} pulse={:.0}",
                surface,
                o.total_threats,
                o.critical,
                o.active,
                o.pulse
            ),
            Frame::Globe(_) | Frame::Graph(_) => log::trace!(
                "FRAME surface={} nodes={}",
                surface,
                frame.node_count()
            ),
            _ => log::debug!("FRAME surface={} nodes={}", surface, frame.node_count()),
        }
        Ok(())
    }

    fn release(&mut self, surface: Surface) {
        self.mounted.remove(&surface);
    }
}
