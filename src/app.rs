use std::{fmt::Debug, path::PathBuf};

use crate::{
    config::ConfigManager,
    event::{AppEvent, Event, EventHandler},
    telemetry::{HardwareSnapshot, Sampler, SamplerCommand, ShellProbes, spawn_sampler},
    tools,
    ui::{DashboardWidget, UiState},
};
use color_eyre::eyre::Result;
use log::*;
use ratatui::{
    DefaultTerminal,
    buffer::Buffer,
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
    layout::Rect,
    prelude::*,
};
use tokio::sync::mpsc::UnboundedSender;

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: ConfigManager,
    pub ui_state: UiState,
    sampler: UnboundedSender<SamplerCommand>,
    snapshot: Option<Box<HardwareSnapshot>>,
    paused: bool,
}

impl Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("have_snapshot", &self.snapshot.is_some())
            .finish()
    }
}

impl App {
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let events = EventHandler::new();
        let config = ConfigManager::new(config_path, events.clone_sender())?;
        let cfg = config.current();
        let sampler = Sampler::new(ShellProbes::new(cfg.probe_timeout()), cfg.sampler_settings());
        let control = spawn_sampler(sampler, events.clone_sender());
        Ok(Self {
            running: true,
            events,
            config,
            ui_state: UiState::default(),
            sampler: control,
            snapshot: None,
            paused: false,
        })
    }

    /// Run the application's main loop.
    pub async fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while self.running {
            terminal.draw(|frame| self.render(frame.area(), frame.buffer_mut()))?;
            match self.events.next().await? {
                Event::Tick => self.tick(),
                Event::Crossterm(event) => match event {
                    crossterm::event::Event::Key(key_event)
                        if key_event.kind == crossterm::event::KeyEventKind::Press =>
                    {
                        self.handle_key_events(key_event)?
                    }
                    _ => {}
                },
                Event::App(app_event) => match app_event {
                    AppEvent::Reload => self.reload_config(),
                    AppEvent::Quit => self.quit(),
                    AppEvent::Snapshot(snapshot) => self.snapshot = Some(snapshot),
                    AppEvent::ToolLaunched(outcome) => {
                        if outcome.success {
                            info!(target: "Tools", "{}", outcome.message);
                        } else {
                            warn!(target: "Tools", "{}", outcome.message);
                        }
                    }
                },
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) -> Result<()> {
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Char(' ') => self.toggle_refresh(),
            KeyCode::Char('f') => {
                let _ = self.sampler.send(SamplerCommand::RefreshNow);
            }
            KeyCode::Char('r') => self.events.send(AppEvent::Reload),
            KeyCode::Char('l') => self.launch_tool(),
            KeyCode::Char('d') => self.ui_state.toggle_debug(),
            KeyCode::Tab => self.ui_state.focus_next(),
            KeyCode::BackTab => self.ui_state.focus_prev(),
            KeyCode::Enter => self.ui_state.toggle_spotlight(),
            _ => {}
        }
        Ok(())
    }

    /// Handles the tick event of the terminal: animation state only, the
    /// telemetry poll runs on its own timer in the sampler task.
    fn tick(&mut self) {
        self.ui_state.tick();
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    /// Pause or resume scheduling of telemetry polls. A poll already in
    /// flight is never interrupted.
    fn toggle_refresh(&mut self) {
        self.paused = !self.paused;
        let _ = self.sampler.send(SamplerCommand::SetPaused(self.paused));
    }

    /// Fire-and-forget launch of the configured external tool; the outcome
    /// comes back as an event and lands in the log pane.
    fn launch_tool(&mut self) {
        let tool = self.config.current().tool;
        let sender = self.events.clone_sender();
        tokio::spawn(async move {
            let outcome = tools::launch(&tool).await;
            let _ = sender.send(Event::App(AppEvent::ToolLaunched(outcome)));
        });
    }

    fn reload_config(&mut self) {
        debug!(target: "App", "Reload!");
        match self.config.reload() {
            Ok(config) => {
                info!(target: "App", "Config reloaded; reconfiguring sampler");
                let _ = self
                    .sampler
                    .send(SamplerCommand::Reconfigure(config.sampler_settings()));
            }
            Err(e) => error!(target: "App", "{}", e),
        }
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        DashboardWidget {
            ui: &self.ui_state,
            snapshot: self.snapshot.as_deref(),
            paused: self.paused,
        }
        .render(area, buf);
    }
}
