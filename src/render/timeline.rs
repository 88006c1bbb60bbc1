//! Threat history timeline.

use crate::model::HistoryBucket;

use super::{Frame, RenderCx, RenderError, Renderer, SeriesPoint, Surface};

#[derive(Debug, Default)]
pub struct TimelineRenderer {
    series: Vec<SeriesPoint>,
    draws: u64,
}

impl TimelineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(&self) -> &[SeriesPoint] {
        &self.series
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Renderer for TimelineRenderer {
    type Snapshot = [HistoryBucket];

    fn surface(&self) -> Surface {
        Surface::Timeline
    }

    fn render(
        &mut self,
        history: &[HistoryBucket],
        cx: &mut RenderCx<'_>,
    ) -> Result<(), RenderError> {
        let mut buckets: Vec<&HistoryBucket> = history.iter().collect();
        buckets.sort_by_key(|b| b.timestamp);

        self.series = if buckets.is_empty() {
            vec![SeriesPoint {
                label: "--:--".to_string(),
                value: 0,
            }]
        } else {
            buckets
                .into_iter()
                .map(|b| SeriesPoint {
                    label: b.timestamp.format("%H:%M").to_string(),
                    value: b.count,
                })
                .collect()
        };

        if cx.present(Surface::Timeline, Frame::Timeline(self.series.clone()))? {
            self.draws += 1;
        }
        Ok(())
    }

    fn destroy(&mut self, cx: &mut RenderCx<'_>) {
        self.series.clear();
        cx.backend.release(Surface::Timeline);
    }
}
