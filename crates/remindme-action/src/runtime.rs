//! Background event loop.
//!
//! Requests, alarm fires, notification clicks and the startup signal are
//! handled one at a time, in arrival order, by a single task.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use remindme_core::types::{HashId, Timestamp};

use crate::command::{Request, Response};
use crate::error::CommandError;
use crate::reconcile::StartupReport;
use crate::service::ReminderService;

const EVENT_QUEUE_DEPTH: usize = 64;

/// Something the background loop reacts to.
#[derive(Debug)]
pub enum Event {
    Message {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
    AlarmFired(HashId),
    NotificationClicked(String),
    Startup {
        reply: oneshot::Sender<Result<StartupReport, CommandError>>,
    },
}

impl Event {
    fn kind(&self) -> &'static str {
        match self {
            Event::Message { .. } => "message",
            Event::AlarmFired(_) => "alarm",
            Event::NotificationClicked(_) => "click",
            Event::Startup { .. } => "startup",
        }
    }
}

/// The background process: owns the service and drains its event sources.
pub struct Background {
    service: Arc<ReminderService>,
    events: mpsc::Receiver<Event>,
    alarms: mpsc::UnboundedReceiver<HashId>,
    shutdown: Arc<Notify>,
}

impl Background {
    /// Create the loop and a handle for feeding it.
    ///
    /// `alarms` is the fire channel of the alarm bridge the service uses.
    pub fn new(
        service: Arc<ReminderService>,
        alarms: mpsc::UnboundedReceiver<HashId>,
    ) -> (Self, BackgroundHandle) {
        let (tx, events) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let shutdown = Arc::new(Notify::new());
        let background = Self {
            service,
            events,
            alarms,
            shutdown: Arc::clone(&shutdown),
        };
        (background, BackgroundHandle { tx, shutdown })
    }

    /// Run until shutdown is signalled or every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.notified() => {
                    info!("Background loop shutting down");
                    return;
                }
                Some(name) = self.alarms.recv() => {
                    self.dispatch(Event::AlarmFired(name)).await;
                }
                event = self.events.recv() => match event {
                    Some(event) => self.dispatch(event).await,
                    None => {
                        info!("All handles dropped, background loop exiting");
                        return;
                    }
                },
            }
        }
    }

    async fn dispatch(&self, event: Event) {
        let span = info_span!("event", request_id = %Uuid::new_v4(), kind = event.kind());
        async {
            match event {
                Event::Message { request, reply } => {
                    let response = self.service.handle(request, Timestamp::now()).await;
                    let _ = reply.send(response);
                }
                Event::AlarmFired(name) => {
                    if let Err(e) = self.service.on_alarm(&name).await {
                        warn!(hash = %name, error = %e, "Alarm handling failed");
                    }
                }
                Event::NotificationClicked(id) => {
                    self.service.on_notification_click(&id).await;
                }
                Event::Startup { reply } => {
                    let report = self.service.startup(Timestamp::now()).await;
                    if let Err(e) = &report {
                        warn!(error = %e, "Startup reconciliation failed");
                    }
                    let _ = reply.send(report);
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Cloneable sender side of the background loop.
#[derive(Clone)]
pub struct BackgroundHandle {
    tx: mpsc::Sender<Event>,
    shutdown: Arc<Notify>,
}

impl BackgroundHandle {
    /// Submit a request and wait for its response.
    pub async fn send(&self, request: Request) -> Response {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Event::Message { request, reply }).await.is_err() {
            return Response::from(CommandError::Unavailable);
        }
        rx.await
            .unwrap_or_else(|_| Response::from(CommandError::Unavailable))
    }

    /// Report a click on the notification called `id`.
    pub async fn click(&self, id: impl Into<String>) -> Result<(), CommandError> {
        self.tx
            .send(Event::NotificationClicked(id.into()))
            .await
            .map_err(|_| CommandError::Unavailable)
    }

    /// Run the startup pass and wait for its report.
    pub async fn startup(&self) -> Result<StartupReport, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Event::Startup { reply })
            .await
            .map_err(|_| CommandError::Unavailable)?;
        rx.await.map_err(|_| CommandError::Unavailable)?
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use remindme_storage::{MemoryBackend, ReminderStore};

    use crate::alarm::{AlarmBridge, TokioAlarmBridge};
    use crate::command::ReminderPayload;
    use crate::notify::{LogNotifier, LogTabOpener};
    use crate::service::ServiceSettings;

    fn background() -> (Background, BackgroundHandle, Arc<ReminderStore>, Arc<TokioAlarmBridge>) {
        let store = Arc::new(ReminderStore::new(Arc::new(MemoryBackend::new())));
        let (bridge, fired) = TokioAlarmBridge::new();
        let bridge = Arc::new(bridge);
        let service = Arc::new(ReminderService::new(
            Arc::clone(&store),
            Arc::clone(&bridge) as Arc<dyn AlarmBridge>,
            Arc::new(LogNotifier),
            Arc::new(LogTabOpener),
            ServiceSettings::default(),
        ));
        let (background, handle) = Background::new(service, fired);
        (background, handle, store, bridge)
    }

    #[tokio::test]
    async fn test_shutdown_before_run() {
        let (background, handle, _store, _bridge) = background();
        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(2), background.run())
            .await
            .expect("loop should stop on shutdown");
    }

    #[tokio::test]
    async fn test_send_after_loop_stopped_is_unavailable() {
        let (background, handle, _store, _bridge) = background();
        drop(background);
        let response = handle.send(Request::Nuke).await;
        assert_eq!(response.message.as_deref(), Some("Background process stopped"));
    }

    #[tokio::test]
    async fn test_due_reminder_fires_through_loop() {
        let (background, handle, store, bridge) = background();
        let task = tokio::spawn(background.run());

        let response = handle
            .send(Request::Set(ReminderPayload {
                text: Some("stand up".to_string()),
                time: Some(Timestamp::now().0 - 1_000),
                ..Default::default()
            }))
            .await;
        assert!(response.is_success());
        let hash = response.hash.unwrap();

        let mut fired = false;
        for _ in 0..50 {
            if let Some((_, record)) = store.find(&hash).await.unwrap() {
                if record.fired {
                    fired = true;
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(fired, "past-due reminder should fire via its alarm");
        assert!(bridge.pending().await.is_empty());

        handle.shutdown();
        task.await.unwrap();
    }
}
