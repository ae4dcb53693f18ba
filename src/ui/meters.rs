use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    macros::*,
    prelude::*,
    style::Stylize,
    widgets::*,
};
use ratatui::macros::line;

use crate::ui::theme::Theme;

/// One metric line: sparkline of the rolling history on the left, label and
/// current value on the right.
#[derive(Debug)]
pub struct StatMeter<'a> {
    pub name: &'static str,
    pub unit: &'static str,
    pub history: &'a [f32],
    pub max: f32,
    pub theme: &'a Theme,
}

impl Widget for &StatMeter<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [history, _, label, current, _] = horizontal![*=1, ==1, ==5, ==8, ==1].areas(area);
        Text::from(format!("{}:", self.name)).render(label, buf);
        line![
            span![format!("{:.1}", self.history.last().unwrap_or(&0.0))],
            span![format!("{:<2}", self.unit)].fg(self.theme.primary_background)
        ]
        .alignment(Alignment::Right)
        .render(current, buf);
        let resampled: Vec<Option<u64>> =
            crate::resample::resample(self.history, history.width as usize)
                .iter()
                .map(|o| o.map(|v| v.trunc() as u64))
                .collect();
        Sparkline::default()
            .data(&resampled)
            .max(self.max.max(1.0) as u64)
            .absent_value_symbol("_")
            .fg(self.theme.primary)
            .render(history, buf);
    }
}

/// A percentage gauge colored by how hot the metric is running.
pub fn usage_gauge<'a>(label: String, percent: f32, theme: &Theme) -> Gauge<'a> {
    Gauge::default()
        .ratio((f64::from(percent) / 100.0).clamp(0.0, 1.0))
        .label(label)
        .gauge_style(
            Style::default()
                .fg(theme.usage_color(percent))
                .bg(theme.secondary_background),
        )
}
