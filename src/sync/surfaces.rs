//! The dashboard's renderers and their module lifecycle.

use crate::config::SyncConfig;
use crate::logging::structured::LogContext;
use crate::reconcile::{RedrawPlan, ViewState};
use crate::render::{
    DistributionRenderer, FeedRenderer, FunnelRenderer, GlobeRenderer, GraphRenderer,
    MatrixRenderer, Module, OverviewRenderer, RenderCx, RenderError, Renderer, Surface,
    ThreatMarker, TimelineRenderer,
};
use crate::scheduling::TimerId;

#[derive(Debug)]
pub struct Surfaces {
    ctx: LogContext,
    pub overview: OverviewRenderer,
    pub severity: DistributionRenderer,
    pub types: DistributionRenderer,
    pub timeline: TimelineRenderer,
    pub feed: FeedRenderer,
    pub funnel: FunnelRenderer,
    pub matrix: MatrixRenderer,
    pub globe: GlobeRenderer,
    pub graph: GraphRenderer,
}

impl Surfaces {
    pub fn new(ctx: &LogContext, config: &SyncConfig) -> Self {
        let frame = config.frame_interval();
        Self {
            ctx: ctx.with_component("render"),
            overview: OverviewRenderer::new(),
            severity: DistributionRenderer::severity(),
            types: DistributionRenderer::attack_types(),
            timeline: TimelineRenderer::new(),
            feed: FeedRenderer::new(ctx),
            funnel: FunnelRenderer::new(),
            matrix: MatrixRenderer::new(),
            globe: GlobeRenderer::new(config.max_markers, frame),
            graph: GraphRenderer::new(config.max_graph_nodes, config.physics_steps_per_tick, frame),
        }
    }

    /// Redraw one surface from the view state.
    fn draw(
        &mut self,
        surface: Surface,
        view: &ViewState,
        cx: &mut RenderCx<'_>,
    ) -> Result<(), RenderError> {
        match surface {
            Surface::Overview => self.overview.render(&view.overview, cx),
            Surface::SeverityChart => self.severity.render(&view.by_severity, cx),
            Surface::TypeChart => self.types.render(&view.by_type, cx),
            Surface::Timeline => self.timeline.render(&view.history, cx),
            Surface::Feed => self.feed.render(&view.feed, cx),
            Surface::Funnel => self.funnel.render(&view.funnel, cx),
            Surface::Matrix => self.matrix.render(&view.tactics, cx),
            Surface::Globe => self.globe.render(&[], cx),
            Surface::Graph => self.graph.render(&view.correlated, cx),
        }
    }

    fn draw_logged(&mut self, surface: Surface, view: &ViewState, cx: &mut RenderCx<'_>) {
        if let Err(e) = self.draw(surface, view, cx) {
            log::warn!("{} RENDER_FAILED surface={} error={}", self.ctx, surface, e);
        }
    }

    /// Apply a redraw plan. Surfaces of inactive 2D modules are skipped;
    /// they redraw from the view state on activation. The graph always
    /// reconciles its data and only presents while mounted.
    pub fn apply_plan(
        &mut self,
        plan: &RedrawPlan,
        view: &ViewState,
        active: Module,
        cx: &mut RenderCx<'_>,
    ) {
        for surface in Surface::ALL {
            if !plan.redraws(surface) {
                continue;
            }
            let mounted_anywhere = matches!(surface, Surface::Globe | Surface::Graph);
            if surface.module() == active || mounted_anywhere {
                self.draw_logged(surface, view, cx);
            }
        }
    }

    pub fn add_markers(&mut self, markers: &[ThreatMarker], cx: &mut RenderCx<'_>) {
        if let Err(e) = self.globe.render(markers, cx) {
            log::warn!("{} RENDER_FAILED surface=globe error={}", self.ctx, e);
        }
    }

    /// Mount a module's surfaces and draw the latest view state.
    pub fn activate(&mut self, module: Module, view: &ViewState, cx: &mut RenderCx<'_>) {
        let mounted = match module {
            Module::ThreatMap => self.globe.init(cx),
            Module::Investigation => self.graph.init(cx),
            Module::Overview => Ok(true),
        };
        if let Err(e) = mounted {
            log::warn!("{} MODULE_INIT_FAILED module={:?} error={}", self.ctx, module, e);
        }
        for surface in module.surfaces() {
            self.draw_logged(surface, view, cx);
        }
        log::debug!("{} MODULE_ACTIVATED module={:?}", self.ctx, module);
    }

    /// Tear down a module's surfaces, stopping their animation loops.
    pub fn deactivate(&mut self, module: Module, cx: &mut RenderCx<'_>) {
        for surface in module.surfaces() {
            match surface {
                Surface::Overview => self.overview.destroy(cx),
                Surface::SeverityChart => self.severity.destroy(cx),
                Surface::TypeChart => self.types.destroy(cx),
                Surface::Timeline => self.timeline.destroy(cx),
                Surface::Feed => self.feed.destroy(cx),
                Surface::Funnel => self.funnel.destroy(cx),
                Surface::Matrix => self.matrix.destroy(cx),
                Surface::Globe => self.globe.destroy(cx),
                Surface::Graph => self.graph.destroy(cx),
            }
        }
        log::debug!("{} MODULE_DEACTIVATED module={:?}", self.ctx, module);
    }

    /// Route an animation frame to its surface.
    pub fn on_frame(&mut self, surface: Surface, id: TimerId, cx: &mut RenderCx<'_>) {
        let result = match surface {
            Surface::Globe => self.globe.on_frame(id, cx),
            Surface::Graph => self.graph.on_frame(id, cx),
            _ => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("{} FRAME_FAILED surface={} error={}", self.ctx, surface, e);
        }
    }

    pub fn on_marker_sweep(&mut self, id: TimerId, cx: &mut RenderCx<'_>) {
        if let Err(e) = self.globe.on_sweep(id, cx) {
            log::warn!("{} SWEEP_FAILED error={}", self.ctx, e);
        }
    }
}
