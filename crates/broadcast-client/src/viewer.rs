//! Viewer side of a live session.
//!
//! A viewer resolves the stream over REST, joins the realtime channel and
//! consumes the same event protocol the broadcaster does, read-mostly. The
//! one piece of local state that matters is `has_liked`: the channel does
//! not deduplicate likes, so a viewer latches after its first like and
//! never sends another for the session. Playback runs off `media_url` and
//! is independent of channel health — losing the channel only freezes the
//! counters and chat.

use uuid::Uuid;

use broadcast_core::{
    ChatEntry, ChatHistory, LikeTally, RealtimeEvent, Result, SessionError, SessionPhase,
    SessionRecord, ViewerCount,
};

use crate::api::SessionApi;
use crate::auth::Identity;
use crate::channel::{ChannelConnector, RealtimeChannel};

const MAX_CHAT_MESSAGE_LEN: usize = 500;

pub struct ViewerSession {
    session: SessionRecord,
    identity: Identity,
    channel: Option<RealtimeChannel>,
    chat: ChatHistory,
    viewers: ViewerCount,
    likes: LikeTally,
    has_liked: bool,
    realtime_lost: bool,
    ended: bool,
}

impl std::fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("session", &self.session)
            .field("identity", &self.identity)
            .field("channel_open", &self.channel.is_some())
            .field("chat", &self.chat)
            .field("viewers", &self.viewers)
            .field("likes", &self.likes)
            .field("has_liked", &self.has_liked)
            .field("realtime_lost", &self.realtime_lost)
            .field("ended", &self.ended)
            .finish()
    }
}

impl ViewerSession {
    /// Resolve the stream and join its realtime channel.
    pub async fn connect(
        api: &dyn SessionApi,
        connector: &dyn ChannelConnector,
        session_id: Uuid,
        identity: Identity,
    ) -> Result<Self> {
        let session = api.fetch_session(session_id).await?;
        if session.status != SessionPhase::Live {
            return Err(SessionError::State(format!(
                "stream is not live (status {})",
                session.status.as_str()
            )));
        }

        let channel = RealtimeChannel::open(connector, session.id, &identity).await?;
        tracing::info!(session_id = %session.id, title = %session.title, "joined stream");

        Ok(Self {
            session,
            identity,
            channel: Some(channel),
            chat: ChatHistory::default(),
            viewers: ViewerCount::new(),
            likes: LikeTally::new(),
            has_liked: false,
            realtime_lost: false,
            ended: false,
        })
    }

    /// Apply the next inbound event. Returns `false` once no further
    /// realtime updates will arrive (channel lost or stream ended);
    /// playback is unaffected either way.
    pub async fn pump(&mut self) -> bool {
        if self.ended || self.realtime_lost {
            return false;
        }
        let Some(channel) = self.channel.as_mut() else {
            return false;
        };

        match channel.next_event().await {
            None => {
                self.realtime_lost = true;
                false
            }
            Some(Err(_)) => true, // dropped frame, channel still healthy
            Some(Ok(event)) => {
                self.apply_event(event).await;
                !self.ended
            }
        }
    }

    async fn apply_event(&mut self, event: RealtimeEvent) {
        match event {
            RealtimeEvent::ViewerCount { count } => {
                self.viewers.apply(count);
            }
            RealtimeEvent::Like { .. } => {
                // The tally reflects server-echoed events only, one per
                // viewer key by sender-side dedup.
                self.likes.increment();
            }
            RealtimeEvent::Chat {
                sender,
                sender_id,
                text,
            } => {
                if self.session.chat_enabled {
                    self.chat.push(ChatEntry::new(sender, sender_id, text));
                }
            }
            RealtimeEvent::Join { name, .. } => {
                tracing::trace!(viewer = %name, "participant joined");
            }
            RealtimeEvent::StreamEnded {} => {
                tracing::info!(session_id = %self.session.id, "stream ended");
                self.ended = true;
                self.session.status = SessionPhase::Ended;
                if let Some(mut channel) = self.channel.take() {
                    channel.close().await;
                }
            }
        }
    }

    /// Send one like for this session. Returns `true` if the like was
    /// sent, `false` if this viewer already liked.
    pub async fn like(&mut self) -> Result<bool> {
        if self.has_liked {
            return Ok(false);
        }
        if self.ended {
            return Err(SessionError::State("stream already ended".into()));
        }
        if self.realtime_lost {
            return Err(SessionError::Channel("realtime connection lost".into()));
        }
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| SessionError::Channel("realtime channel not open".into()))?;

        channel
            .send(&RealtimeEvent::Like {
                by_viewer_id: self.identity.viewer_id.clone(),
            })
            .await?;
        self.has_liked = true;
        Ok(true)
    }

    pub async fn send_chat(&mut self, text: &str) -> Result<()> {
        if !self.session.chat_enabled {
            return Err(SessionError::State("chat is disabled for this stream".into()));
        }
        if self.ended {
            return Err(SessionError::State("stream already ended".into()));
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::State("chat message is empty".into()));
        }
        if trimmed.len() > MAX_CHAT_MESSAGE_LEN {
            return Err(SessionError::State(format!(
                "chat message too long (max {MAX_CHAT_MESSAGE_LEN} chars)"
            )));
        }
        if self.realtime_lost {
            return Err(SessionError::Channel("realtime connection lost".into()));
        }
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| SessionError::Channel("realtime channel not open".into()))?;

        channel
            .send(&RealtimeEvent::Chat {
                sender: self.identity.display_name.clone(),
                sender_id: self.identity.viewer_id.clone(),
                text: trimmed.to_string(),
            })
            .await
    }

    /// Leave the stream, closing the channel. Idempotent.
    pub async fn leave(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
        }
    }

    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    /// Playback endpoint; valid regardless of channel health.
    pub fn media_url(&self) -> Option<&str> {
        self.session.media_url.as_deref()
    }

    pub fn viewer_count(&self) -> i64 {
        self.viewers.current()
    }

    pub fn like_count(&self) -> u64 {
        self.likes.count()
    }

    pub fn has_liked(&self) -> bool {
        self.has_liked
    }

    pub fn chat(&self) -> impl Iterator<Item = &ChatEntry> {
        self.chat.iter()
    }

    pub fn realtime_lost(&self) -> bool {
        self.realtime_lost
    }

    pub fn ended(&self) -> bool {
        self.ended
    }
}
