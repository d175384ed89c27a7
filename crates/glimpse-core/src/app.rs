//! Main execution context
//!
//! Window events, hand-off messages from other launches and platform
//! file-open requests all land on one queue. The loop handles one event at a
//! time, so nothing in the manager is ever touched concurrently.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use glimpse_ipc::InstanceMessage;

use crate::dispatcher::MessageDispatcher;
use crate::manager::WindowManager;
use crate::window::{WindowEvent, WindowFactory, WindowId};
use crate::Result;

pub type AppEventSender = mpsc::UnboundedSender<AppEvent>;
pub type AppEventReceiver = mpsc::UnboundedReceiver<AppEvent>;

#[derive(Debug)]
pub enum AppEvent {
    Window { id: WindowId, event: WindowEvent },
    /// Files handed over by a secondary launch
    Message(InstanceMessage),
    /// Platform request to open a file in this process
    FileOpen(PathBuf),
    /// Exit request from outside any window (signal, service manager)
    ExitRequested,
    /// Stop the loop once `Duration` has passed
    QuitAfter(Duration),
    Quit,
}

pub fn channel() -> (AppEventSender, AppEventReceiver) {
    mpsc::unbounded_channel()
}

enum Flow {
    Continue,
    QuitAfter(Duration),
    Quit,
}

pub struct App<F: WindowFactory> {
    manager: WindowManager<F>,
    dispatcher: MessageDispatcher,
}

impl<F: WindowFactory> App<F> {
    pub fn new(manager: WindowManager<F>, dispatcher: MessageDispatcher) -> Self {
        Self {
            manager,
            dispatcher,
        }
    }

    pub fn manager(&self) -> &WindowManager<F> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut WindowManager<F> {
        &mut self.manager
    }

    /// Run until a quit fires or every sender is gone.
    ///
    /// A scheduled quit does not stall the loop: events keep being handled
    /// until the deadline passes.
    pub async fn run(mut self, mut events: AppEventReceiver) {
        let mut deadline: Option<Instant> = None;

        loop {
            let event = match deadline {
                Some(at) => tokio::select! {
                    _ = tokio::time::sleep_until(at) => break,
                    event = events.recv() => event,
                },
                None => events.recv().await,
            };
            let Some(event) = event else { break };

            match self.handle(event) {
                Ok(Flow::Continue) => {}
                Ok(Flow::QuitAfter(delay)) => {
                    deadline.get_or_insert_with(|| Instant::now() + delay);
                }
                Ok(Flow::Quit) => break,
                Err(e) => tracing::error!(error = %e, "Event handling failed"),
            }
        }

        tracing::info!("Event loop finished");
    }

    fn handle(&mut self, event: AppEvent) -> Result<Flow> {
        match event {
            AppEvent::Window { id, event } => self.manager.handle_window_event(id, event)?,
            AppEvent::Message(message) => {
                self.dispatcher.dispatch(message, &mut self.manager);
            }
            AppEvent::FileOpen(path) => {
                tracing::info!(path = %path.display(), "File open request");
                self.manager.load_file_non_interactive(&path)?;
            }
            AppEvent::ExitRequested => self.manager.shutdown(),
            AppEvent::QuitAfter(delay) => return Ok(Flow::QuitAfter(delay)),
            AppEvent::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}
