//! Session controller actor.
//!
//! All session commands are processed sequentially through an mpsc
//! channel, interleaved with inbound realtime events and the duration
//! clock via `select!`. Cleanup (close channel, release devices, clear the
//! clock) is one idempotent routine reached from every exit path: explicit
//! stop, server-pushed `stream_ended`, unmount, and unrecoverable failure.

use std::rc::Rc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use broadcast_core::{
    ChatEntry, ChatHistory, CreateSessionRequest, LikeTally, RealtimeEvent, Result, SessionError,
    SessionPhase, SessionRecord, ViewerCount,
};

use crate::api::SessionApi;
use crate::auth::Identity;
use crate::channel::{ChannelConnector, RealtimeChannel};
use crate::config::ClientConfig;
use crate::media::{CaptureConstraints, CaptureSnapshot, MediaDeviceManager, TrackKind};

use super::commands::SessionCommand;
use super::handle::ControllerHandle;
use super::snapshot::SessionSnapshot;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub protocol_error_budget: u32,
    pub chat_history_cap: usize,
    pub chat_max_message_len: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            protocol_error_budget: 8,
            chat_history_cap: 100,
            chat_max_message_len: 500,
        }
    }
}

impl ControllerConfig {
    pub fn from_client(config: &ClientConfig) -> Self {
        Self {
            protocol_error_budget: config.realtime.protocol_error_budget,
            chat_history_cap: config.chat.history_cap,
            chat_max_message_len: config.chat.max_message_len,
        }
    }
}

enum Wake {
    Command(Option<SessionCommand>),
    Inbound(Option<Result<RealtimeEvent>>),
    Tick,
}

/// The broadcaster's session state machine.
pub struct StreamSessionController {
    api: Rc<dyn SessionApi>,
    connector: Rc<dyn ChannelConnector>,
    media: MediaDeviceManager,
    identity: Identity,
    config: ControllerConfig,
    rx: mpsc::Receiver<SessionCommand>,
    watch_tx: watch::Sender<SessionSnapshot>,

    phase: SessionPhase,
    session: Option<SessionRecord>,
    channel: Option<RealtimeChannel>,
    chat: ChatHistory,
    viewers: ViewerCount,
    likes: LikeTally,
    clock: Option<Interval>,
    duration_secs: u64,
    realtime_lost: bool,
    banner: Option<String>,
    failure: Option<String>,
}

impl StreamSessionController {
    /// Create the controller and return it along with its handle. The
    /// caller spawns `run()` on the local task set.
    pub fn new(
        api: Rc<dyn SessionApi>,
        connector: Rc<dyn ChannelConnector>,
        media: MediaDeviceManager,
        identity: Identity,
        config: ControllerConfig,
    ) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::channel(64);
        let (watch_tx, watch_rx) = watch::channel(SessionSnapshot::default());
        let chat = ChatHistory::new(config.chat_history_cap);

        let controller = Self {
            api,
            connector,
            media,
            identity,
            config,
            rx,
            watch_tx,
            phase: SessionPhase::Idle,
            session: None,
            channel: None,
            chat,
            viewers: ViewerCount::new(),
            likes: LikeTally::new(),
            clock: None,
            duration_secs: 0,
            realtime_lost: false,
            banner: None,
            failure: None,
        };
        (controller, ControllerHandle::new(tx, watch_rx))
    }

    /// Create the controller and run it on the local task set.
    pub fn spawn(
        api: Rc<dyn SessionApi>,
        connector: Rc<dyn ChannelConnector>,
        media: MediaDeviceManager,
        identity: Identity,
        config: ControllerConfig,
    ) -> ControllerHandle {
        let (controller, handle) = Self::new(api, connector, media, identity, config);
        actix_rt::spawn(controller.run());
        handle
    }

    /// Run the actor loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        loop {
            let wake = {
                let channel = if self.realtime_lost {
                    None
                } else {
                    self.channel.as_mut()
                };
                tokio::select! {
                    cmd = self.rx.recv() => Wake::Command(cmd),
                    event = next_or_pending(channel) => Wake::Inbound(event),
                    _ = tick_or_pending(self.clock.as_mut()) => Wake::Tick,
                }
            };

            match wake {
                Wake::Command(Some(cmd)) => {
                    if self.process_command(cmd).await {
                        break;
                    }
                }
                Wake::Command(None) => {
                    // Every handle dropped: treat as unmount.
                    self.shutdown().await;
                    break;
                }
                Wake::Inbound(event) => self.process_inbound(event).await,
                Wake::Tick => {
                    self.duration_secs += 1;
                    self.publish();
                }
            }
        }
        tracing::info!("session controller shutting down");
    }

    async fn process_command(&mut self, cmd: SessionCommand) -> bool {
        tracing::debug!(command = cmd.name(), phase = self.phase.as_str(), "command");
        match cmd {
            SessionCommand::AcquireDevices {
                constraints,
                responder,
            } => {
                let result = self.handle_acquire(&constraints).await;
                let _ = responder.send(result);
            }
            SessionCommand::EnumerateDevices { responder } => {
                let _ = responder.send(self.media.enumerate().await);
            }
            SessionCommand::SwitchDevice {
                kind,
                device_id,
                responder,
            } => {
                let result = self.handle_switch(kind, &device_id).await;
                let _ = responder.send(result);
            }
            SessionCommand::ToggleTrack { kind, responder } => {
                let _ = responder.send(self.media.toggle_enabled(kind));
            }
            SessionCommand::AttachSink { label, responder } => {
                let _ = responder.send(self.media.attach_sink(label));
            }
            SessionCommand::DetachSink { label, responder } => {
                self.media.detach_sink(&label);
                let _ = responder.send(());
            }
            SessionCommand::Start { request, responder } => {
                let result = self.handle_start(request).await;
                let _ = responder.send(result);
            }
            SessionCommand::Stop { responder } => {
                let result = self.handle_stop().await;
                let _ = responder.send(result);
            }
            SessionCommand::PostChat { text, responder } => {
                let result = self.handle_post_chat(&text).await;
                let _ = responder.send(result);
            }
            SessionCommand::DismissBanner => {
                self.banner = None;
                self.publish();
            }
            SessionCommand::Shutdown { responder } => {
                self.shutdown().await;
                let _ = responder.send(());
                return true;
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Command handlers
    // ------------------------------------------------------------------

    async fn handle_acquire(
        &mut self,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureSnapshot> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::State(format!(
                "cannot acquire devices while {}",
                self.phase.as_str()
            )));
        }
        match self.media.acquire(constraints).await {
            Ok(snapshot) => {
                self.set_phase(SessionPhase::DeviceReady);
                Ok(snapshot)
            }
            Err(e) => {
                self.banner = Some(e.to_string());
                self.publish();
                Err(e)
            }
        }
    }

    async fn handle_switch(&mut self, kind: TrackKind, device_id: &str) -> Result<()> {
        match self.media.switch_device(kind, device_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_recoverable() {
                    self.banner = Some(e.to_string());
                    self.publish();
                }
                Err(e)
            }
        }
    }

    async fn handle_start(&mut self, request: CreateSessionRequest) -> Result<SessionRecord> {
        let retryable = self.phase == SessionPhase::Failed && self.media.has_handle();
        if self.phase != SessionPhase::DeviceReady && !retryable {
            return Err(SessionError::State(format!(
                "cannot start a session while {}",
                self.phase.as_str()
            )));
        }
        if !self.media.has_handle() {
            return Err(SessionError::State("device handle not ready".into()));
        }
        // Guard validation runs before any network call.
        request.check()?;

        self.failure = None;
        self.set_phase(SessionPhase::Starting);

        let record = match self.api.create_session(&request).await {
            Ok(record) => record,
            Err(e) => {
                // Backend rejected the create: no channel exists, devices
                // stay held so a corrected retry skips re-acquisition.
                self.failure = Some(e.to_string());
                self.set_phase(SessionPhase::Failed);
                return Err(e);
            }
        };
        tracing::info!(session_id = %record.id, title = %record.title, "session created");

        match RealtimeChannel::open(self.connector.as_ref(), record.id, &self.identity).await {
            Ok(channel) => {
                self.channel = Some(channel);
                self.session = Some(record.clone());
                self.duration_secs = 0;
                self.realtime_lost = false;
                self.clock = Some(live_clock());
                self.set_phase(SessionPhase::Live);
                Ok(record)
            }
            Err(e) => {
                // Don't leak the backend record: best-effort stop, then the
                // full cleanup path.
                if let Err(stop_err) = self.api.stop_session(record.id).await {
                    tracing::warn!(session_id = %record.id, "stop after channel failure: {stop_err}");
                }
                self.fail_with_cleanup(format!("realtime channel open failed: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    async fn handle_stop(&mut self) -> Result<()> {
        match self.phase {
            SessionPhase::Live => {}
            SessionPhase::Ending => return Ok(()),
            _ => {
                return Err(SessionError::State(format!(
                    "no live session to stop (state {})",
                    self.phase.as_str()
                )))
            }
        }

        self.set_phase(SessionPhase::Ending);
        if let Some(id) = self.session.as_ref().map(|s| s.id) {
            if let Err(e) = self.api.stop_session(id).await {
                // Cleanup never depends on network success.
                tracing::warn!(session_id = %id, "stop call failed: {e}");
                self.banner = Some(e.to_string());
            }
        }
        self.finish_ended().await;
        Ok(())
    }

    async fn handle_post_chat(&mut self, text: &str) -> Result<()> {
        if self.phase != SessionPhase::Live {
            return Err(SessionError::State("chat requires a live session".into()));
        }
        let chat_enabled = self.session.as_ref().map(|s| s.chat_enabled).unwrap_or(false);
        if !chat_enabled {
            return Err(SessionError::State("chat is disabled for this session".into()));
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::State("chat message is empty".into()));
        }
        if trimmed.len() > self.config.chat_max_message_len {
            return Err(SessionError::State(format!(
                "chat message too long (max {} chars)",
                self.config.chat_max_message_len
            )));
        }
        if self.realtime_lost {
            return Err(SessionError::Channel("realtime connection lost".into()));
        }
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| SessionError::Channel("realtime channel not open".into()))?;

        // The local history fills from the server echo, same as every
        // other participant's copy.
        channel
            .send(&RealtimeEvent::Chat {
                sender: self.identity.display_name.clone(),
                sender_id: self.identity.viewer_id.clone(),
                text: trimmed.to_string(),
            })
            .await
    }

    async fn shutdown(&mut self) {
        tracing::debug!(phase = self.phase.as_str(), "shutdown requested");
        if self.phase == SessionPhase::Live {
            let _ = self.handle_stop().await;
        } else {
            self.cleanup().await;
            if !self.phase.is_terminal() {
                self.set_phase(SessionPhase::Ended);
            } else {
                self.publish();
            }
        }
    }

    // ------------------------------------------------------------------
    // Inbound events
    // ------------------------------------------------------------------

    async fn process_inbound(&mut self, event: Option<Result<RealtimeEvent>>) {
        match event {
            None => {
                // Terminal for realtime features only; the session itself
                // keeps going and the user is informed.
                self.realtime_lost = true;
                self.banner = Some("realtime connection lost".into());
                self.publish();
            }
            Some(Err(SessionError::Protocol(_))) => {
                let errors = self
                    .channel
                    .as_ref()
                    .map(|c| c.protocol_errors())
                    .unwrap_or(0);
                if errors > self.config.protocol_error_budget
                    && self.phase == SessionPhase::Live
                {
                    self.fail_with_cleanup(format!(
                        "realtime protocol error budget exhausted ({errors})"
                    ))
                    .await;
                }
            }
            Some(Err(_)) => {}
            Some(Ok(event)) => self.apply_event(event).await,
        }
    }

    async fn apply_event(&mut self, event: RealtimeEvent) {
        match event {
            RealtimeEvent::ViewerCount { count } => {
                self.viewers.apply(count);
                self.publish();
            }
            RealtimeEvent::Like { by_viewer_id } => {
                tracing::trace!(viewer = %by_viewer_id, "like received");
                self.likes.increment();
                self.publish();
            }
            RealtimeEvent::Chat {
                sender,
                sender_id,
                text,
            } => {
                let chat_enabled =
                    self.session.as_ref().map(|s| s.chat_enabled).unwrap_or(true);
                if chat_enabled {
                    self.chat.push(ChatEntry::new(sender, sender_id, text));
                    self.publish();
                }
            }
            RealtimeEvent::Join { name, .. } => {
                tracing::debug!(viewer = %name, "viewer joined");
            }
            RealtimeEvent::StreamEnded {} => {
                // Server authority wins over local intent: end immediately,
                // no stop call.
                if matches!(self.phase, SessionPhase::Live | SessionPhase::Ending) {
                    tracing::info!("stream ended by server");
                    self.set_phase(SessionPhase::Ending);
                    self.finish_ended().await;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Cleanup
    // ------------------------------------------------------------------

    /// Unconditional resource cleanup; safe to run any number of times.
    async fn cleanup(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
        }
        self.media.release().await;
        self.clock = None;
    }

    async fn finish_ended(&mut self) {
        self.cleanup().await;
        if let Some(session) = self.session.as_mut() {
            session.status = SessionPhase::Ended;
            session.ended_at = Some(Utc::now());
        }
        self.set_phase(SessionPhase::Ended);
    }

    async fn fail_with_cleanup(&mut self, reason: String) {
        tracing::error!("session failed: {reason}");
        self.failure = Some(reason);
        self.cleanup().await;
        self.set_phase(SessionPhase::Failed);
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            tracing::info!(from = self.phase.as_str(), to = phase.as_str(), "session state");
            self.phase = phase;
        }
        self.publish();
    }

    fn publish(&self) {
        let _ = self.watch_tx.send(SessionSnapshot {
            phase: self.phase,
            session: self.session.clone(),
            viewer_count: self.viewers.current(),
            peak_viewers: self.viewers.peak(),
            like_count: self.likes.count(),
            chat: self.chat.to_vec(),
            duration_secs: self.duration_secs,
            realtime_lost: self.realtime_lost,
            banner: self.banner.clone(),
            failure: self.failure.clone(),
        });
    }
}

async fn next_or_pending(
    channel: Option<&mut RealtimeChannel>,
) -> Option<Result<RealtimeEvent>> {
    match channel {
        Some(channel) => channel.next_event().await,
        None => std::future::pending().await,
    }
}

async fn tick_or_pending(clock: Option<&mut Interval>) {
    match clock {
        Some(clock) => {
            clock.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn live_clock() -> Interval {
    let period = Duration::from_secs(1);
    let mut clock = tokio::time::interval_at(Instant::now() + period, period);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    clock
}
