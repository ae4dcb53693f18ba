use ratatui::{
    buffer::Buffer,
    layout::Rect,
    macros::*,
    prelude::*,
    style::Stylize,
    widgets::*,
};
use ratatui::macros::line;

use crate::telemetry::HardwareSnapshot;
use crate::ui::meters::{StatMeter, usage_gauge};
use crate::ui::{Panel, UiState};

pub struct PanelWidget<'a> {
    pub panel: Panel,
    pub snapshot: &'a HardwareSnapshot,
    pub focussed: bool,
    pub ui: &'a UiState,
}

impl PanelWidget<'_> {
    /// Whether this panel's data came from a live probe this poll cycle.
    /// Memory and CPU never probe through a shell, so they are always live.
    fn probed(&self) -> bool {
        match self.panel {
            Panel::Cpu | Panel::Memory => true,
            Panel::Gpu => self.snapshot.gpu.probed,
            Panel::Network => self.snapshot.network.probed,
            Panel::Storage => self.snapshot.storage.probed,
            Panel::System => self.snapshot.detail.probed,
        }
    }
}

impl Widget for PanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = &self.ui.theme;
        let status = if self.probed() {
            Span::from("●").fg(theme.success)
        } else {
            // Probe failed: the panel shows its documented fallback values.
            Span::from("○ err").fg(theme.error)
        };
        let border_color = match self.focussed {
            true => theme.accent,
            false => theme.foreground,
        };
        let border = Block::bordered()
            .title(Span::from(format!(" {}", self.panel.title())).fg(theme.primary))
            .title(status)
            .border_style(
                Style::default()
                    .bg(theme.surface)
                    .fg(border_color)
                    .add_modifier(Modifier::BOLD),
            )
            .bg(theme.surface)
            .border_type(BorderType::Rounded);
        let inner = border.inner(area);
        border.render(area, buf);

        let snap = self.snapshot;
        match self.panel {
            Panel::Cpu => {
                let [gauge_row, meter_row, rest] = vertical![==1, ==1, *=1].areas(inner);
                let cpu = &snap.cpu;
                usage_gauge(format!("{:.0}%", cpu.usage_percent), cpu.usage_percent, theme)
                    .render(gauge_row, buf);
                StatMeter {
                    name: "cpu",
                    unit: "%",
                    history: &snap.history.cpu,
                    max: 100.0,
                    theme,
                }
                .render(meter_row, buf);
                let temp_suffix = if cpu.temperature_estimated { " (est)" } else { "" };
                Paragraph::new(vec![
                    Line::from(cpu.model.clone()),
                    line![
                        span![format!("{} cores @ {} MHz  ", cpu.cores, cpu.speed_mhz)],
                        span![format!("{:.0}°C{temp_suffix}", cpu.temperature_c)]
                            .fg(theme.usage_color(cpu.temperature_c)),
                    ],
                ])
                .render(rest, buf);
            }
            Panel::Memory => {
                let [gauge_row, meter_row, rest] = vertical![==1, ==1, *=1].areas(inner);
                let mem = &snap.memory;
                usage_gauge(format!("{:.0}%", mem.usage_percent), mem.usage_percent, theme)
                    .render(gauge_row, buf);
                StatMeter {
                    name: "mem",
                    unit: "%",
                    history: &snap.history.memory,
                    max: 100.0,
                    theme,
                }
                .render(meter_row, buf);
                Paragraph::new(vec![Line::from(format!(
                    "{:.1} / {:.1} GB used  ·  {:.1} GB free",
                    mem.used_gb, mem.total_gb, mem.free_gb
                ))])
                .render(rest, buf);
            }
            Panel::Gpu => {
                let [gauge_row, rest] = vertical![==1, *=1].areas(inner);
                let gpu = &snap.gpu;
                let sim = if gpu.simulated { " (sim)" } else { "" };
                usage_gauge(
                    format!("{:.0}%{sim}", gpu.usage_percent),
                    gpu.usage_percent,
                    theme,
                )
                .render(gauge_row, buf);
                Paragraph::new(vec![
                    Line::from(gpu.name.clone()),
                    Line::from(format!("{}  ·  {:.0}°C{sim}", gpu.memory, gpu.temperature_c)),
                ])
                .render(rest, buf);
            }
            Panel::Network => {
                let [gauge_row, rest] = vertical![==1, *=1].areas(inner);
                let net = &snap.network;
                usage_gauge(
                    format!("signal {}%", net.signal_percent),
                    f32::from(net.signal_percent),
                    theme,
                )
                .render(gauge_row, buf);
                let label = if net.connected {
                    line![
                        span![net.label.clone()],
                        span![format!("  ·  {}", net.kind)].fg(theme.primary_background),
                    ]
                } else {
                    line![span![net.label.clone()].fg(theme.error)]
                };
                let sim = if net.rates_simulated { " (sim)" } else { "" };
                Paragraph::new(vec![
                    label,
                    Line::from(format!(
                        "↓ {:.1} Mb/s  ↑ {:.1} Mb/s{sim}",
                        net.rx_mbps, net.tx_mbps
                    )),
                ])
                .render(rest, buf);
            }
            Panel::Storage => {
                let [gauge_row, rest] = vertical![==1, *=1].areas(inner);
                let disk = &snap.storage;
                usage_gauge(format!("{:.0}%", disk.usage_percent), disk.usage_percent, theme)
                    .render(gauge_row, buf);
                Paragraph::new(vec![
                    Line::from(format!(
                        "{}  {:.1} / {:.1} GB",
                        disk.volume, disk.used_gb, disk.total_gb
                    )),
                    Line::from(format!("{:.1} GB free", disk.free_gb)),
                ])
                .render(rest, buf);
            }
            Panel::System => {
                let host = &snap.host;
                let detail = &snap.detail;
                let mut lines = vec![
                    line![
                        span![host.hostname.clone()].fg(theme.primary),
                        span![format!("  {} {}", host.os_type, host.os_release)],
                    ],
                    Line::from(format!(
                        "{}/{}  ·  up {}  ·  load {:.2}",
                        host.platform, host.arch, host.uptime, host.load_average
                    )),
                    Line::from(format!("board {} {}", detail.board_vendor, detail.board_name)),
                    Line::from(format!(
                        "{}  ·  cache {}  ·  max {:.0} MHz",
                        detail.architecture, detail.cpu_cache, detail.max_clock_mhz
                    )),
                ];
                for slot in &detail.memory_slots {
                    lines.push(
                        Line::from(format!("slot  {} {} {}", slot.size, slot.kind, slot.speed))
                            .fg(theme.boost),
                    );
                }
                Paragraph::new(lines).render(inner, buf);
            }
        }
    }
}
