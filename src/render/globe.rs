//! Rotating 3D threat globe.
//!
//! The scene is built once per mount; `render` only adds and removes
//! marker nodes. Markers decay on their own lifetime, independent of how
//! fresh the summary is.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use crate::model::{GeoPoint, Severity, Threat};
use crate::scheduling::{TimerId, TimerKind};

use super::animation::AnimationLoop;
use super::{Frame, RenderCx, RenderError, Renderer, Surface};

/// Globe radius in scene units.
pub const GLOBE_RADIUS: f64 = 5.0;
/// Markers float slightly above the surface.
const MARKER_ALTITUDE: f64 = 0.05;
/// Idle rotation, radians per second.
const ROTATION_SPEED: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Transient annotation for one recently reported threat.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatMarker {
    pub id: MarkerId,
    pub threat_id: String,
    pub position: [f64; 3],
    pub severity: Severity,
    pub color: u32,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl ThreatMarker {
    pub fn new(id: MarkerId, threat: &Threat, now: Instant, lifetime: Duration) -> Self {
        Self {
            id,
            threat_id: threat.threat_id(),
            position: project(threat.geo_point(), GLOBE_RADIUS * (1.0 + MARKER_ALTITUDE)),
            severity: threat.severity,
            color: threat.severity.color(),
            created_at: now,
            expires_at: now + lifetime,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Spherical projection of a lat/lon pair onto a sphere of `radius`.
pub fn project(point: GeoPoint, radius: f64) -> [f64; 3] {
    let phi = (90.0 - point.lat) * PI / 180.0;
    let theta = (point.lon + 180.0) * PI / 180.0;
    [
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    ]
}

/// Drawn marker node.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerNode {
    pub id: MarkerId,
    pub position: [f64; 3],
    pub color: u32,
    /// Remaining life in [0, 1], for fade-out.
    pub life: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobeFrame {
    pub rotation: f64,
    pub markers: Vec<MarkerNode>,
}

#[derive(Debug)]
pub struct GlobeRenderer {
    initialized: bool,
    geometry_builds: u32,
    rotation: f64,
    max_markers: usize,
    markers: Vec<ThreatMarker>,
    sweep_timer: Option<TimerId>,
    animation: AnimationLoop,
}

impl GlobeRenderer {
    pub fn new(max_markers: usize, frame_interval: Duration) -> Self {
        Self {
            initialized: false,
            geometry_builds: 0,
            rotation: 0.0,
            max_markers: max_markers.max(1),
            markers: Vec::new(),
            sweep_timer: None,
            animation: AnimationLoop::new(Surface::Globe, frame_interval),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn geometry_builds(&self) -> u32 {
        self.geometry_builds
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_running()
    }

    pub fn markers(&self) -> &[ThreatMarker] {
        &self.markers
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Build the scene and start the animation loop. A no-op when already
    /// initialized or when the container already holds rendered content;
    /// a missing container is also a no-op.
    pub fn init(&mut self, cx: &mut RenderCx<'_>) -> Result<bool, RenderError> {
        if self.initialized {
            return Ok(false);
        }
        match cx.backend.mount(Surface::Globe) {
            Ok(true) => {
                log::debug!("GLOBE_INIT_SKIPPED reason=container_has_content");
                return Ok(false);
            }
            Ok(false) => {}
            Err(RenderError::MissingContainer(_)) => {
                log::debug!("GLOBE_INIT_SKIPPED reason=missing_container");
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        self.geometry_builds += 1;
        self.initialized = true;
        self.animation.start(cx.timers, cx.now);
        self.sweep(cx.now);
        self.arm_sweep(cx);
        self.present(cx)?;
        Ok(true)
    }

    /// Drop expired markers. Returns how many were removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.markers.len();
        self.markers.retain(|m| !m.is_expired(now));
        before - self.markers.len()
    }

    /// Animation frame: rotate, decay markers, redraw.
    pub fn on_frame(&mut self, id: TimerId, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let Some(elapsed) = self.animation.on_frame(id, cx.timers, cx.now) else {
            return Ok(());
        };
        self.rotation = (self.rotation + ROTATION_SPEED * elapsed.as_secs_f64()) % (2.0 * PI);
        self.sweep(cx.now);
        self.present(cx)
    }

    /// Marker sweep timer fired.
    pub fn on_sweep(&mut self, id: TimerId, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        if self.sweep_timer != Some(id) {
            return Ok(());
        }
        self.sweep_timer = None;
        if self.sweep(cx.now) > 0 && self.initialized {
            self.present(cx)?;
        }
        self.arm_sweep(cx);
        Ok(())
    }

    fn arm_sweep(&mut self, cx: &mut RenderCx<'_>) {
        let Some(next) = self.markers.iter().map(|m| m.expires_at).min() else {
            return;
        };
        if let Some(timer) = self.sweep_timer {
            if cx.timers.deadline(timer) == Some(next) {
                return;
            }
            cx.timers.cancel(timer);
        }
        self.sweep_timer = Some(cx.timers.arm(TimerKind::MarkerSweep, next));
    }

    fn present(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        if !self.initialized {
            return Ok(());
        }
        let now = cx.now;
        let frame = GlobeFrame {
            rotation: self.rotation,
            markers: self
                .markers
                .iter()
                .map(|m| {
                    let total = m.expires_at.duration_since(m.created_at).as_secs_f64();
                    let left = m.expires_at.saturating_duration_since(now).as_secs_f64();
                    MarkerNode {
                        id: m.id,
                        position: m.position,
                        color: m.color,
                        life: if total > 0.0 { left / total } else { 0.0 },
                    }
                })
                .collect(),
        };
        cx.present(Surface::Globe, Frame::Globe(frame))?;
        Ok(())
    }
}

impl Renderer for GlobeRenderer {
    type Snapshot = [ThreatMarker];

    fn surface(&self) -> Surface {
        Surface::Globe
    }

    /// Register markers not already in the scene, then redraw.
    fn render(
        &mut self,
        markers: &[ThreatMarker],
        cx: &mut RenderCx<'_>,
    ) -> Result<(), RenderError> {
        for marker in markers {
            if marker.is_expired(cx.now) || self.markers.iter().any(|m| m.id == marker.id) {
                continue;
            }
            self.markers.push(marker.clone());
        }
        if self.markers.len() > self.max_markers {
            self.markers.sort_by_key(|m| (m.created_at, m.id));
            let excess = self.markers.len() - self.max_markers;
            self.markers.drain(..excess);
        }
        self.sweep(cx.now);
        self.arm_sweep(cx);
        self.present(cx)
    }

    fn destroy(&mut self, cx: &mut RenderCx<'_>) {
        self.animation.stop(cx.timers);
        if let Some(timer) = self.sweep_timer.take() {
            cx.timers.cancel(timer);
        }
        self.markers.clear();
        if self.initialized {
            self.initialized = false;
            cx.backend.release(Surface::Globe);
        }
    }
}
