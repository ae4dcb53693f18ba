pub mod dashboard;
pub mod debug;
pub mod meters;
pub mod panels;
pub mod theme;

pub use dashboard::DashboardWidget;

use std::fmt::Debug;

use tui_logger::*;

use crate::event::TICK_FPS;
use crate::ui::theme::Theme;

/// The metric panels on the dashboard grid, in render and focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Cpu,
    Memory,
    Gpu,
    Network,
    Storage,
    System,
}

impl Panel {
    pub const ALL: [Panel; 6] = [
        Panel::Cpu,
        Panel::Memory,
        Panel::Gpu,
        Panel::Network,
        Panel::Storage,
        Panel::System,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Panel::Cpu => "CPU",
            Panel::Memory => "MEM",
            Panel::Gpu => "GPU",
            Panel::Network => "NET",
            Panel::Storage => "DISK",
            Panel::System => "SYS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focussable {
    Panel(usize),
    Logs,
    Debug,
}

/// The main UI mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// All panels and logs
    Dashboard,
    /// Spotlight a single panel
    Spotlight,
}

pub struct UiState {
    pub tick: f64,
    pub columns: usize,
    pub theme: Theme,
    pub focus: Option<Focussable>,
    pub mode: Mode,
    pub debug: bool,
    pub logger_state: TuiWidgetState,
}

impl Debug for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiState")
            .field("tick", &self.tick)
            .field("columns", &self.columns)
            .field("mode", &self.mode)
            .field("focus", &self.focus)
            .finish()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logger_state: TuiWidgetState::new(),
            tick: Default::default(),
            columns: 2,
            theme: Theme::dark(),
            mode: Mode::Dashboard,
            focus: None,
            debug: false,
        }
    }
}

impl UiState {
    pub fn tick(&mut self) {
        self.tick += 1.0;
        if self.tick > 2.0 * TICK_FPS {
            self.tick = 0.0;
        }
    }

    /// Heartbeat animation frame, one cycle every two seconds.
    pub fn step_of_8_in_2_second(&self) -> usize {
        (self.tick * 4.0 / TICK_FPS) as usize % 8
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
        if !self.debug
            && let Some(Focussable::Debug) = &self.focus
        {
            self.focus = Some(Focussable::Panel(0));
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match &self.focus {
            None => Some(Focussable::Panel(0)),
            Some(Focussable::Panel(i)) => {
                if i + 1 < Panel::ALL.len() {
                    Some(Focussable::Panel(i + 1))
                } else {
                    Some(Focussable::Logs)
                }
            }
            Some(Focussable::Logs) => {
                if self.debug {
                    Some(Focussable::Debug)
                } else {
                    Some(Focussable::Panel(0))
                }
            }
            Some(Focussable::Debug) => Some(Focussable::Panel(0)),
        }
    }

    pub fn focus_prev(&mut self) {
        self.focus = match &self.focus {
            None => Some(Focussable::Panel(0)),
            Some(Focussable::Panel(i)) => {
                if *i > 0 {
                    Some(Focussable::Panel(i - 1))
                } else if self.debug {
                    Some(Focussable::Debug)
                } else {
                    Some(Focussable::Logs)
                }
            }
            Some(Focussable::Logs) => Some(Focussable::Panel(Panel::ALL.len() - 1)),
            Some(Focussable::Debug) => Some(Focussable::Logs),
        }
    }

    pub fn toggle_spotlight(&mut self) {
        if self.mode == Mode::Spotlight {
            self.mode = Mode::Dashboard;
        } else {
            self.mode = Mode::Spotlight;
        }
    }
}
