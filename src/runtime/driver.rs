//! Async driver for the dashboard core.
//!
//! Runs on a single-threaded tokio runtime. The only suspension points are
//! push-channel frames, HTTP responses and the earliest armed timer; every
//! result is fed back into the core as an `Input`.

use std::collections::HashMap;
use std::future::Future;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::client::HttpApi;
use crate::config::SyncConfig;
use crate::connection::ChannelId;
use crate::error::Result;
use crate::logging::structured::LogContext;
use crate::notify::AudioCue;
use crate::render::Backend;
use crate::sync::{Command, Dashboard, Input};

use super::channel::{spawn_channel, ChannelHandle};

/// Sends user intents into a running driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    events: mpsc::UnboundedSender<Input>,
}

impl DriverHandle {
    /// Returns false once the driver has stopped.
    pub fn send(&self, input: Input) -> bool {
        self.events.send(input).is_ok()
    }
}

pub struct Driver {
    ctx: LogContext,
    dashboard: Dashboard,
    api: HttpApi,
    events_tx: mpsc::UnboundedSender<Input>,
    events_rx: mpsc::UnboundedReceiver<Input>,
    channels: HashMap<ChannelId, ChannelHandle>,
}

impl Driver {
    pub fn new(
        config: &SyncConfig,
        backend: Box<dyn Backend>,
        audio: Box<dyn AudioCue>,
    ) -> Result<Self> {
        let dashboard = Dashboard::new(config, backend, audio)?;
        let ctx = dashboard.session().log_context().with_component("driver");
        let api = HttpApi::new(config, &ctx)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            ctx,
            dashboard,
            api,
            events_tx,
            events_rx,
            channels: HashMap::new(),
        })
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            events: self.events_tx.clone(),
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Run the session until `shutdown` resolves.
    pub async fn run<S: Future<Output = ()>>(mut self, shutdown: S) -> Result<Dashboard> {
        tokio::pin!(shutdown);

        let commands = self.dashboard.handle(Input::Start, Instant::now());
        self.execute(commands);

        loop {
            let deadline = self.dashboard.next_deadline();
            let timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                    None => std::future::pending::<()>().await,
                }
            };

            let commands = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                Some(input) = self.events_rx.recv() => {
                    self.dashboard.handle(input, Instant::now())
                }
                _ = timer => self.dashboard.fire_due(Instant::now()),
            };
            self.execute(commands);
        }

        log::info!("{} DRIVER_STOPPING channels={}", self.ctx, self.channels.len());
        let commands = self.dashboard.handle(Input::Shutdown, Instant::now());
        self.execute(commands);
        for (_, channel) in self.channels.drain() {
            channel.close();
        }
        Ok(self.dashboard)
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::OpenChannel { channel, url } => {
                    let handle =
                        spawn_channel(&self.ctx, channel, url.to_string(), self.events_tx.clone());
                    if let Some(previous) = self.channels.insert(channel, handle) {
                        previous.close();
                    }
                }
                Command::CloseChannel(channel) => {
                    if let Some(handle) = self.channels.remove(&channel) {
                        handle.close();
                    }
                }
                Command::FetchSummary => {
                    let api = self.api.clone();
                    self.spawn_request(async move {
                        Input::SummaryFetched(api.fetch_summary().await.map_err(|e| e.to_string()))
                    });
                }
                Command::ListSources => {
                    let api = self.api.clone();
                    self.spawn_request(async move {
                        Input::SourcesListed(api.list_sources().await.map_err(|e| e.to_string()))
                    });
                }
                Command::ToggleSource(source) => {
                    let api = self.api.clone();
                    self.spawn_request(async move {
                        let result = api.toggle_source(&source).await.map_err(|e| e.to_string());
                        Input::ToggleSettled { source, result }
                    });
                }
                Command::Remediate(threat_id) => {
                    let api = self.api.clone();
                    self.spawn_request(async move {
                        let result = api.remediate(&threat_id).await.map_err(|e| e.to_string());
                        Input::RemediationSettled { threat_id, result }
                    });
                }
                Command::Submit(submission) => {
                    let api = self.api.clone();
                    self.spawn_request(async move {
                        let result = api
                            .submit(&submission)
                            .await
                            .map(|_| ())
                            .map_err(|e| e.to_string());
                        Input::SubmissionSettled {
                            label: submission.label(),
                            result,
                        }
                    });
                }
            }
        }
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Input> + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            // The driver may have stopped while the request was in flight.
            let _ = events.send(request.await);
        });
    }
}
