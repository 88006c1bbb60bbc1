//! Force-directed investigation graph.
//!
//! Nodes are attack sources and attack types; an edge links a source to
//! each attack it was correlated with. Nodes are reconciled by id so a
//! redraw keeps settled positions. The simulation runs a bounded number of
//! steps per animation frame and cools off with `alpha`.

use std::time::Duration;

use crate::model::{CorrelatedAttack, Severity};
use crate::scheduling::TimerId;

use super::animation::AnimationLoop;
use super::{Frame, RenderCx, RenderError, Renderer, Surface};

const REPULSION: f64 = 900.0;
const SPRING_LENGTH: f64 = 60.0;
const SPRING_STRENGTH: f64 = 0.05;
const CENTERING: f64 = 0.01;
const VELOCITY_DECAY: f64 = 0.6;
const ALPHA_DECAY: f64 = 0.98;
const ALPHA_MIN: f64 = 0.005;
/// Alpha after dragging starts, so neighbours follow the pinned node.
const DRAG_ALPHA: f64 = 0.3;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Source,
    Attack,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub severity: Severity,
    pub x: f64,
    pub y: f64,
    vx: f64,
    vy: f64,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// Drawn node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub color: u32,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphFrame {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<GraphEdge>,
}

fn source_node_id(source: &str) -> String {
    format!("src:{}", source)
}

fn attack_node_id(attack: &str) -> String {
    format!("atk:{}", attack)
}

#[derive(Debug)]
pub struct GraphRenderer {
    initialized: bool,
    max_nodes: usize,
    steps_per_tick: usize,
    alpha: f64,
    placed: u64,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    dragging: Option<String>,
    animation: AnimationLoop,
}

impl GraphRenderer {
    pub fn new(max_nodes: usize, steps_per_tick: usize, frame_interval: Duration) -> Self {
        Self {
            initialized: false,
            max_nodes: max_nodes.max(2),
            steps_per_tick: steps_per_tick.max(1),
            alpha: 1.0,
            placed: 0,
            nodes: Vec::new(),
            edges: Vec::new(),
            dragging: None,
            animation: AnimationLoop::new(Surface::Graph, frame_interval),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_running()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN
    }

    /// Mount the graph and start the simulation loop. Same no-op rules as
    /// the globe: already initialized, populated or missing container.
    pub fn init(&mut self, cx: &mut RenderCx<'_>) -> Result<bool, RenderError> {
        if self.initialized {
            return Ok(false);
        }
        match cx.backend.mount(Surface::Graph) {
            Ok(true) => {
                log::debug!("GRAPH_INIT_SKIPPED reason=container_has_content");
                return Ok(false);
            }
            Ok(false) => {}
            Err(RenderError::MissingContainer(_)) => {
                log::debug!("GRAPH_INIT_SKIPPED reason=missing_container");
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
        self.initialized = true;
        self.animation.start(cx.timers, cx.now);
        self.present(cx)?;
        Ok(true)
    }

    /// Replace the node/edge sets, keeping positions of surviving nodes.
    fn reconcile(&mut self, attacks: &[CorrelatedAttack]) -> bool {
        let mut wanted: Vec<(String, NodeKind, String, Severity)> = Vec::new();
        let mut edges: Vec<GraphEdge> = Vec::new();

        for attack in attacks {
            let mut ids = Vec::with_capacity(2);
            let candidates = [
                (NodeKind::Source, attack.source.as_str()),
                (NodeKind::Attack, attack.attack.as_str()),
            ];
            for (kind, label) in candidates {
                if label.is_empty() {
                    continue;
                }
                let id = match kind {
                    NodeKind::Source => source_node_id(label),
                    NodeKind::Attack => attack_node_id(label),
                };
                if let Some(existing) = wanted.iter_mut().find(|w| w.0 == id) {
                    if attack.severity < existing.3 {
                        existing.3 = attack.severity;
                    }
                } else if wanted.len() < self.max_nodes {
                    wanted.push((id.clone(), kind, label.to_string(), attack.severity));
                } else {
                    continue;
                }
                ids.push(id);
            }
            if let [source, target] = ids.as_slice() {
                let edge = GraphEdge {
                    source: source.clone(),
                    target: target.clone(),
                };
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }

        let mut previous = std::mem::take(&mut self.nodes);
        let mut changed = previous.len() != wanted.len();
        for (id, kind, label, severity) in wanted {
            match previous.iter().position(|n| n.id == id) {
                Some(idx) => {
                    let mut node = previous.swap_remove(idx);
                    node.label = label;
                    node.severity = severity;
                    self.nodes.push(node);
                }
                None => {
                    changed = true;
                    let (x, y) = self.seed_position();
                    self.nodes.push(GraphNode {
                        id,
                        kind,
                        label,
                        severity,
                        x,
                        y,
                        vx: 0.0,
                        vy: 0.0,
                        pinned: false,
                    });
                }
            }
        }
        if self
            .dragging
            .as_ref()
            .is_some_and(|d| !self.nodes.iter().any(|n| &n.id == d))
        {
            self.dragging = None;
        }

        changed |= edges != self.edges;
        self.edges = edges;
        if changed {
            self.alpha = 1.0;
        }
        changed
    }

    /// Spiral placement for new nodes, deterministic across runs.
    fn seed_position(&mut self) -> (f64, f64) {
        self.placed += 1;
        let i = self.placed as f64;
        let radius = 20.0 * i.sqrt();
        let angle = i * GOLDEN_ANGLE;
        (radius * angle.cos(), radius * angle.sin())
    }

    /// Advance the simulation by one step.
    pub fn step(&mut self) {
        if self.is_settled() {
            return;
        }
        let n = self.nodes.len();
        let mut force = vec![(0.0f64, 0.0f64); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = self.nodes[j].x - self.nodes[i].x;
                let dy = self.nodes[j].y - self.nodes[i].y;
                let dist_sq = (dx * dx + dy * dy).max(1.0);
                let dist = dist_sq.sqrt();
                let push = REPULSION / dist_sq;
                let (fx, fy) = (dx / dist * push, dy / dist * push);
                force[i].0 -= fx;
                force[i].1 -= fy;
                force[j].0 += fx;
                force[j].1 += fy;
            }
        }

        for edge in &self.edges {
            let (Some(a), Some(b)) = (
                self.nodes.iter().position(|n| n.id == edge.source),
                self.nodes.iter().position(|n| n.id == edge.target),
            ) else {
                continue;
            };
            let dx = self.nodes[b].x - self.nodes[a].x;
            let dy = self.nodes[b].y - self.nodes[a].y;
            let dist = (dx * dx + dy * dy).sqrt().max(1.0);
            let pull = (dist - SPRING_LENGTH) * SPRING_STRENGTH;
            let (fx, fy) = (dx / dist * pull, dy / dist * pull);
            force[a].0 += fx;
            force[a].1 += fy;
            force[b].0 -= fx;
            force[b].1 -= fy;
        }

        for (node, (fx, fy)) in self.nodes.iter_mut().zip(force) {
            if node.pinned {
                node.vx = 0.0;
                node.vy = 0.0;
                continue;
            }
            node.vx = (node.vx + (fx - node.x * CENTERING) * self.alpha) * VELOCITY_DECAY;
            node.vy = (node.vy + (fy - node.y * CENTERING) * self.alpha) * VELOCITY_DECAY;
            node.x += node.vx;
            node.y += node.vy;
        }
        self.alpha *= ALPHA_DECAY;
    }

    /// Animation frame: bounded physics work, then redraw.
    pub fn on_frame(&mut self, id: TimerId, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        if self.animation.on_frame(id, cx.timers, cx.now).is_none() {
            return Ok(());
        }
        if self.is_settled() {
            return Ok(());
        }
        for _ in 0..self.steps_per_tick {
            self.step();
        }
        self.present(cx)
    }

    /// Pin `id` under the pointer. Returns false for an unknown node.
    pub fn drag_start(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        node.pinned = true;
        node.vx = 0.0;
        node.vy = 0.0;
        self.dragging = Some(id.to_string());
        self.alpha = self.alpha.max(DRAG_ALPHA);
        true
    }

    pub fn drag_move(&mut self, x: f64, y: f64) {
        let Some(dragging) = self.dragging.as_deref() else {
            return;
        };
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == dragging) {
            node.x = x;
            node.y = y;
        }
        self.alpha = self.alpha.max(DRAG_ALPHA);
    }

    /// Release the dragged node back to the simulation.
    pub fn drag_end(&mut self) {
        let Some(dragging) = self.dragging.take() else {
            return;
        };
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == dragging) {
            node.pinned = false;
        }
    }

    fn present(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        if !self.initialized {
            return Ok(());
        }
        let frame = GraphFrame {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeView {
                    id: n.id.clone(),
                    kind: n.kind,
                    label: n.label.clone(),
                    x: n.x,
                    y: n.y,
                    color: match n.kind {
                        NodeKind::Source => n.severity.color(),
                        NodeKind::Attack => 0x8b5cf6,
                    },
                    pinned: n.pinned,
                })
                .collect(),
            edges: self.edges.clone(),
        };
        cx.present(Surface::Graph, Frame::Graph(frame))?;
        Ok(())
    }
}

impl Renderer for GraphRenderer {
    type Snapshot = [CorrelatedAttack];

    fn surface(&self) -> Surface {
        Surface::Graph
    }

    fn render(
        &mut self,
        attacks: &[CorrelatedAttack],
        cx: &mut RenderCx<'_>,
    ) -> Result<(), RenderError> {
        if self.reconcile(attacks) {
            log::debug!(
                "GRAPH_RECONCILED nodes={} edges={}",
                self.nodes.len(),
                self.edges.len()
            );
        }
        self.present(cx)
    }

    fn destroy(&mut self, cx: &mut RenderCx<'_>) {
        self.animation.stop(cx.timers);
        self.nodes.clear();
        self.edges.clear();
        self.dragging = None;
        self.alpha = 1.0;
        if self.initialized {
            self.initialized = false;
            cx.backend.release(Surface::Graph);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::render::RecordingBackend;
    use crate::scheduling::TimerQueue;

    fn attack(source: &str, kind: &str) -> CorrelatedAttack {
        CorrelatedAttack {
            attack: kind.to_string(),
            severity: Severity::High,
            source: source.to_string(),
            description: String::new(),
        }
    }

    fn graph() -> GraphRenderer {
        GraphRenderer::new(60, 4, Duration::from_millis(33))
    }

    #[test]
    fn test_nodes_and_edges_from_attacks() {
        let mut backend = RecordingBackend::new();
        let mut timers = TimerQueue::new();
        let mut cx = RenderCx::new(&mut backend, &mut timers, Instant::now());
        let mut g = graph();

        let attacks = vec![
            attack("10.0.0.5", "BRUTE_FORCE"),
            attack("10.0.0.5", "SQL_INJECTION"),
            attack("8.8.8.8", "BRUTE_FORCE"),
        ];
        g.render(&attacks, &mut cx).unwrap();
        g.render(&attacks, &mut cx).unwrap();

        assert_eq!(g.nodes().len(), 4);
        assert_eq!(g.edges().len(), 3);
        assert!(g.node("src:10.0.0.5").is_some());
        assert!(g.node("atk:BRUTE_FORCE").is_some());
    }

    #[test]
    fn test_positions_survive_redraw() {
        let mut backend = RecordingBackend::new();
        let mut timers = TimerQueue::new();
        let mut cx = RenderCx::new(&mut backend, &mut timers, Instant::now());
        let mut g = graph();

        g.render(&[attack("10.0.0.5", "XSS_ATTACK")], &mut cx).unwrap();
        for _ in 0..20 {
            g.step();
        }
        let before = g.node("src:10.0.0.5").map(|n| (n.x, n.y)).unwrap();

        g.render(
            &[attack("10.0.0.5", "XSS_ATTACK"), attack("1.1.1.1", "XSS_ATTACK")],
            &mut cx,
        )
        .unwrap();
        let after = g.node("src:10.0.0.5").map(|n| (n.x, n.y)).unwrap();
        assert_eq!(before, after);
        assert_eq!(g.nodes().len(), 3);
    }

    #[test]
    fn test_node_bound() {
        let mut g = GraphRenderer::new(4, 4, Duration::from_millis(33));
        let attacks: Vec<CorrelatedAttack> = (0..10)
            .map(|i| attack(&format!("10.0.0.{}", i), "BRUTE_FORCE"))
            .collect();
        g.reconcile(&attacks);
        assert_eq!(g.nodes().len(), 4);
        assert!(g
            .edges()
            .iter()
            .all(|e| g.node(&e.source).is_some() && g.node(&e.target).is_some()));
    }

    #[test]
    fn test_simulation_cools_and_stays_finite() {
        let mut g = graph();
        g.reconcile(&[
            attack("10.0.0.5", "BRUTE_FORCE"),
            attack("10.0.0.6", "BRUTE_FORCE"),
            attack("10.0.0.7", "PORT_SCAN"),
        ]);
        for _ in 0..1000 {
            g.step();
        }
        assert!(g.is_settled());
        assert!(g.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
    }

    #[test]
    fn test_drag_pins_then_releases() {
        let mut g = graph();
        g.reconcile(&[attack("10.0.0.5", "BRUTE_FORCE")]);

        assert!(g.drag_start("src:10.0.0.5"));
        g.drag_move(120.0, -40.0);
        for _ in 0..5 {
            g.step();
        }
        let node = g.node("src:10.0.0.5").unwrap();
        assert!(node.pinned);
        assert_eq!((node.x, node.y), (120.0, -40.0));

        g.drag_end();
        assert!(!g.node("src:10.0.0.5").unwrap().pinned);
        assert!(!g.drag_start("src:unknown"));
    }

    #[test]
    fn test_frames_only_after_init() {
        let handle = RecordingBackend::new();
        let mut backend = handle.clone();
        let mut timers = TimerQueue::new();
        let mut cx = RenderCx::new(&mut backend, &mut timers, Instant::now());
        let mut g = graph();

        g.render(&[attack("10.0.0.5", "BRUTE_FORCE")], &mut cx).unwrap();
        assert_eq!(handle.present_count(Surface::Graph), 0);

        assert!(g.init(&mut cx).unwrap());
        assert!(!g.init(&mut cx).unwrap());
        assert!(g.is_animating());
        assert_eq!(handle.present_count(Surface::Graph), 1);

        g.destroy(&mut cx);
        assert!(!g.is_animating());
        assert!(g.nodes().is_empty());
        assert_eq!(handle.release_count(Surface::Graph), 1);
    }
}
