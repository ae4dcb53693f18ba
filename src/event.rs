//! Terminal, timer and application events, multiplexed onto one channel.

use color_eyre::eyre::{OptionExt, Result};
use crossterm::event::Event as CrosstermEvent;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::telemetry::HardwareSnapshot;
use crate::tools::LaunchOutcome;

/// Frames per second for UI animation ticks.
pub const TICK_FPS: f64 = 30.0;

#[derive(Debug)]
pub enum Event {
    /// Render/animation heartbeat, decoupled from the telemetry poll.
    Tick,
    Crossterm(CrosstermEvent),
    App(AppEvent),
}

#[derive(Debug)]
pub enum AppEvent {
    Quit,
    /// Config file changed on disk or reload was requested by key.
    Reload,
    /// The sampler finished a poll.
    Snapshot(Box<HardwareSnapshot>),
    /// Best-effort external tool launch finished its spawn attempt.
    ToolLaunched(LaunchOutcome),
}

/// Owns the channel and the background task that feeds it.
#[derive(Debug)]
pub struct EventHandler {
    sender: UnboundedSender<Event>,
    receiver: UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = EventTask::new(sender.clone());
        tokio::spawn(async { task.run().await });
        Self { sender, receiver }
    }

    /// Next event, in arrival order across all three sources.
    pub async fn next(&mut self) -> Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_eyre("event channel closed")
    }

    pub fn send(&mut self, app_event: AppEvent) {
        let _ = self.sender.send(Event::App(app_event));
    }

    /// A sender for other tasks (sampler, config watcher, tool launches).
    pub fn clone_sender(&self) -> UnboundedSender<Event> {
        self.sender.clone()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

struct EventTask {
    sender: UnboundedSender<Event>,
}

impl EventTask {
    fn new(sender: UnboundedSender<Event>) -> Self {
        Self { sender }
    }

    async fn run(self) -> Result<()> {
        let tick_rate = std::time::Duration::from_secs_f64(1.0 / TICK_FPS);
        let mut reader = crossterm::event::EventStream::new();
        let mut tick = tokio::time::interval(tick_rate);
        loop {
            let tick_delay = tick.tick();
            let crossterm_event = reader.next().fuse();
            tokio::select! {
                _ = self.sender.closed() => {
                    break;
                }
                _ = tick_delay => {
                    let _ = self.sender.send(Event::Tick);
                }
                Some(Ok(evt)) = crossterm_event => {
                    let _ = self.sender.send(Event::Crossterm(evt));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn app_events_round_trip() {
        let mut events = EventHandler::new();
        events.send(AppEvent::Quit);
        match events.next().await.unwrap() {
            Event::App(AppEvent::Quit) => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cloned_senders_feed_the_same_stream() {
        let mut events = EventHandler::new();
        let sender = events.clone_sender();
        sender.send(Event::App(AppEvent::Reload)).unwrap();
        assert!(matches!(
            events.next().await.unwrap(),
            Event::App(AppEvent::Reload)
        ));
    }
}
