//! Distribution charts: severity doughnut and attack-type bars.

use crate::model::{CountTable, Severity};

use super::{Frame, RenderCx, RenderError, Renderer, Slice, Surface};

/// Label shown when there is nothing to chart.
pub const PLACEHOLDER_LABEL: &str = "No data";
const PLACEHOLDER_COLOR: u32 = 0x33_3a_44;

const TYPE_PALETTE: [u32; 8] = [
    0x00_f2_ff, 0x7b_61_ff, 0xff_00_55, 0xff_8c_00, 0x00_ff_9d, 0xff_d7_00, 0x00_bf_ff,
    0xc0_c0_c0,
];

/// How slice colors are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Color by severity label.
    Severity,
    /// Cycle a fixed categorical palette.
    Categorical,
}

#[derive(Debug)]
pub struct DistributionRenderer {
    surface: Surface,
    palette: Palette,
    dataset: Vec<Slice>,
    draws: u64,
}

impl DistributionRenderer {
    pub fn severity() -> Self {
        Self::new(Surface::SeverityChart, Palette::Severity)
    }

    pub fn attack_types() -> Self {
        Self::new(Surface::TypeChart, Palette::Categorical)
    }

    pub fn new(surface: Surface, palette: Palette) -> Self {
        Self {
            surface,
            palette,
            dataset: Vec::new(),
            draws: 0,
        }
    }

    pub fn dataset(&self) -> &[Slice] {
        &self.dataset
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    fn build(&self, table: &CountTable) -> Vec<Slice> {
        let slices: Vec<Slice> = table
            .iter()
            .enumerate()
            .map(|(i, (label, value))| Slice {
                label: label.to_string(),
                value,
                color: match self.palette {
                    Palette::Severity => Severity::from_label(label).color(),
                    Palette::Categorical => TYPE_PALETTE[i % TYPE_PALETTE.len()],
                },
            })
            .collect();

        if slices.is_empty() {
            vec![Slice {
                label: PLACEHOLDER_LABEL.to_string(),
                value: 1,
                color: PLACEHOLDER_COLOR,
            }]
        } else {
            slices
        }
    }
}

impl Renderer for DistributionRenderer {
    type Snapshot = CountTable;

    fn surface(&self) -> Surface {
        self.surface
    }

    fn render(&mut self, table: &CountTable, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        // The dataset is rebuilt, never appended to.
        self.dataset = self.build(table);
        if cx.present(self.surface, Frame::Distribution(self.dataset.clone()))? {
            self.draws += 1;
        }
        Ok(())
    }

    fn destroy(&mut self, cx: &mut RenderCx<'_>) {
        self.dataset.clear();
        cx.backend.release(self.surface);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::render::RecordingBackend;
    use crate::scheduling::TimerQueue;

    #[test]
    fn test_empty_input_renders_placeholder() {
        let mut backend = RecordingBackend::new();
        let mut timers = TimerQueue::new();
        let mut cx = RenderCx::new(&mut backend, &mut timers, Instant::now());
        let mut chart = DistributionRenderer::severity();

        chart.render(&CountTable::new(), &mut cx).unwrap();
        assert_eq!(chart.dataset().len(), 1);
        assert_eq!(chart.dataset()[0].label, PLACEHOLDER_LABEL);
    }

    #[test]
    fn test_rerender_is_idempotent() {
        let handle = RecordingBackend::new();
        let mut backend = handle.clone();
        let mut timers = TimerQueue::new();
        let mut cx = RenderCx::new(&mut backend, &mut timers, Instant::now());
        let mut chart = DistributionRenderer::severity();
        let table: CountTable = [("CRITICAL", 2), ("LOW", 5)].into_iter().collect();

        chart.render(&table, &mut cx).unwrap();
        chart.render(&table, &mut cx).unwrap();

        assert_eq!(chart.dataset().len(), 2);
        assert_eq!(chart.dataset()[0].color, Severity::Critical.color());
        let frames = handle.frames(Surface::SeverityChart);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn test_missing_container_is_noop() {
        let handle = RecordingBackend::new();
        handle.remove_container(Surface::TypeChart);
        let mut backend = handle.clone();
        let mut timers = TimerQueue::new();
        let mut cx = RenderCx::new(&mut backend, &mut timers, Instant::now());
        let mut chart = DistributionRenderer::attack_types();

        let table: CountTable = [("SQL_INJECTION", 1)].into_iter().collect();
        assert!(chart.render(&table, &mut cx).is_ok());
        assert_eq!(chart.draws(), 0);
    }
}
