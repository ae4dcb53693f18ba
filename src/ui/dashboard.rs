use crate::{
    telemetry::HardwareSnapshot,
    ui::{
        Focussable, Mode, Panel, UiState,
        debug::DebugWidget,
        panels::PanelWidget,
    },
};
use ratatui::{buffer::Buffer, layout::Rect, macros::*, prelude::*, widgets::*};
use ratatui::macros::line;
use tui_logger::*;

const HEARTBEAT: [&str; 8] = ["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈"];

pub struct DashboardWidget<'a> {
    pub ui: &'a UiState,
    pub snapshot: Option<&'a HardwareSnapshot>,
    pub paused: bool,
}

impl<'a> Widget for &mut DashboardWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let [header_rect, window_rect, log_rect] = vertical![==1, >=5, ==10].areas(area);

        self.render_header(header_rect, buf);

        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.foreground);

        let main_rect = if self.ui.debug {
            let [main_rect, panel_rect] = horizontal![>=5, >=30].areas(window_rect);
            DebugWidget {
                ui: self.ui,
                snapshot: self.snapshot,
            }
            .render(panel_rect, buf);
            main_rect
        } else {
            window_rect
        };

        let border_color = match self.ui.focus {
            Some(Focussable::Logs) => self.ui.theme.accent,
            _ => self.ui.theme.foreground,
        };
        TuiLoggerSmartWidget::default()
            .style_error(panel_style.fg(self.ui.theme.error))
            .style_debug(panel_style)
            .style_warn(panel_style.fg(self.ui.theme.warning))
            .style_trace(panel_style)
            .style_info(panel_style)
            .style(panel_style)
            .border_style(panel_style.fg(border_color))
            .output_separator(':')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
            .output_target(true)
            .output_file(true)
            .output_line(true)
            .state(&self.ui.logger_state)
            .render(log_rect, buf);

        let main_style = Style::default()
            .bg(self.ui.theme.background)
            .fg(self.ui.theme.foreground);
        Block::new().style(main_style).render(main_rect, buf);

        let Some(snapshot) = self.snapshot else {
            let text = Text::from("No Stats Yet");
            let area = main_rect.centered(
                Constraint::Length(text.width() as u16),
                Constraint::Length(1),
            );
            text.render(area, buf);
            return;
        };

        let columns = self.ui.columns.max(1);
        let rows = Panel::ALL.len().div_ceil(columns);
        let col_constraints = (0..columns).map(|_| Constraint::Fill(1));
        let row_constraints = (0..rows).map(|_| Constraint::Length(6));
        let horizontal = Layout::horizontal(col_constraints)
            .spacing(1)
            .horizontal_margin(1);
        let vertical = Layout::vertical(row_constraints).spacing(1).margin(1);

        let row_rects = vertical.split(main_rect);
        let mut cells = row_rects
            .iter()
            .flat_map(|&row| horizontal.split(row).to_vec());
        for (index, panel) in Panel::ALL.into_iter().enumerate() {
            if let Some(cell) = cells.next() {
                let focussed = matches!(
                    &self.ui.focus,
                    Some(Focussable::Panel(i)) if *i == index
                );
                if focussed && matches!(self.ui.mode, Mode::Spotlight) {
                    continue;
                }
                PanelWidget {
                    panel,
                    snapshot,
                    focussed,
                    ui: self.ui,
                }
                .render(cell, buf);
            }
        }

        if matches!(self.ui.mode, Mode::Spotlight)
            && let Some(Focussable::Panel(i)) = &self.ui.focus
            && let Some(panel) = Panel::ALL.get(*i)
        {
            PanelWidget {
                panel: *panel,
                snapshot,
                focussed: true,
                ui: self.ui,
            }
            .render(main_rect.inner(Margin::new(2, 2)), buf);
        }
    }
}

impl DashboardWidget<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let theme = &self.ui.theme;
        let state = if self.paused {
            Span::from(" ⏸ paused ").fg(theme.warning)
        } else {
            Span::from(format!(" {} ", HEARTBEAT[self.ui.step_of_8_in_2_second()]))
                .fg(theme.secondary)
        };
        let host = self
            .snapshot
            .map(|s| s.host.hostname.clone())
            .unwrap_or_default();
        line![
            span![" vitals"].fg(theme.primary).bold(),
            span![format!("  {host}")].fg(theme.foreground),
            state,
        ]
        .bg(theme.background)
        .render(area, buf);
    }
}
