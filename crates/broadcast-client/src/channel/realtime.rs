use uuid::Uuid;

use broadcast_core::{RealtimeEvent, Result, SessionError};

use crate::auth::Identity;

use super::transport::{ChannelConnector, ChannelTransport};

/// Typed event channel for one session.
///
/// Opening the channel sends the `join` event with the participant's
/// identity. Undecodable inbound messages are dropped and logged —
/// the caller sees them only as an incrementing error count, never as a
/// channel failure. Transport errors and peer close both surface as end of
/// stream.
pub struct RealtimeChannel {
    transport: Box<dyn ChannelTransport>,
    session_id: Uuid,
    protocol_errors: u32,
    closed: bool,
}

impl RealtimeChannel {
    pub async fn open(
        connector: &dyn ChannelConnector,
        session_id: Uuid,
        identity: &Identity,
    ) -> Result<Self> {
        let transport = connector.connect(session_id).await?;
        let mut channel = Self {
            transport,
            session_id,
            protocol_errors: 0,
            closed: false,
        };

        channel
            .send(&RealtimeEvent::Join {
                viewer_id: identity.viewer_id.clone(),
                name: identity.display_name.clone(),
            })
            .await?;
        Ok(channel)
    }

    pub async fn send(&mut self, event: &RealtimeEvent) -> Result<()> {
        if self.closed {
            return Err(SessionError::Channel("channel already closed".into()));
        }
        let text = serde_json::to_string(event)
            .map_err(|e| SessionError::Protocol(format!("encode {}: {e}", event.kind())))?;
        self.transport.send_text(text).await
    }

    /// Next inbound event. `None` means the connection is gone for good;
    /// `Some(Err(Protocol))` means one message was dropped and the channel
    /// is still usable.
    pub async fn next_event(&mut self) -> Option<Result<RealtimeEvent>> {
        if self.closed {
            return None;
        }
        match self.transport.next_text().await {
            None => None,
            Some(Err(SessionError::Protocol(msg))) => {
                self.protocol_errors += 1;
                tracing::warn!(session_id = %self.session_id, "dropped channel frame: {msg}");
                Some(Err(SessionError::Protocol(msg)))
            }
            Some(Err(e)) => {
                tracing::warn!(session_id = %self.session_id, "realtime transport failed: {e}");
                None
            }
            Some(Ok(text)) => match serde_json::from_str::<RealtimeEvent>(&text) {
                Ok(event) => {
                    tracing::trace!(session_id = %self.session_id, kind = event.kind(), "event");
                    Some(Ok(event))
                }
                Err(e) => {
                    self.protocol_errors += 1;
                    tracing::warn!(
                        session_id = %self.session_id,
                        "dropped undecodable channel message: {e}"
                    );
                    Some(Err(SessionError::Protocol(e.to_string())))
                }
            },
        }
    }

    pub fn protocol_errors(&self) -> u32 {
        self.protocol_errors
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Close the underlying transport. Idempotent.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.transport.close().await;
        tracing::debug!(session_id = %self.session_id, "realtime channel closed");
    }
}
