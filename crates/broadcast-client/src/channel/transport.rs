use actix_codec::Framed;
use async_trait::async_trait;
use awc::http::header;
use awc::{ws, BoxedSocket};
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use broadcast_core::{Result, SessionError};

/// Raw text-frame transport under the event protocol.
///
/// `next_text` returns `None` once the connection is gone; a
/// `Protocol` error means one undecodable frame was skipped and the
/// connection is still healthy.
#[async_trait(?Send)]
pub trait ChannelTransport {
    async fn send_text(&mut self, text: String) -> Result<()>;

    async fn next_text(&mut self) -> Option<Result<String>>;

    async fn close(&mut self);
}

/// Opens one transport per session id.
#[async_trait(?Send)]
pub trait ChannelConnector {
    async fn connect(&self, session_id: Uuid) -> Result<Box<dyn ChannelTransport>>;
}

/// WebSocket connector carrying the bearer token in the handshake.
pub struct WsChannelConnector {
    ws_base_url: String,
    token: String,
}

impl WsChannelConnector {
    pub fn new(ws_base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            ws_base_url: ws_base_url.into(),
            token: token.into(),
        }
    }

    fn session_url(&self, session_id: Uuid) -> String {
        format!(
            "{}/ws/sessions/{session_id}",
            self.ws_base_url.trim_end_matches('/')
        )
    }
}

#[async_trait(?Send)]
impl ChannelConnector for WsChannelConnector {
    async fn connect(&self, session_id: Uuid) -> Result<Box<dyn ChannelTransport>> {
        let url = self.session_url(session_id);
        let (_response, framed) = awc::Client::new()
            .ws(url.as_str())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .connect()
            .await
            .map_err(|e| SessionError::Channel(format!("connect {url}: {e}")))?;

        tracing::debug!(%session_id, "realtime channel connected");
        Ok(Box::new(WsTransport {
            framed,
            closed: false,
        }))
    }
}

/// awc-backed WebSocket transport.
pub struct WsTransport {
    framed: Framed<BoxedSocket, ws::Codec>,
    closed: bool,
}

#[async_trait(?Send)]
impl ChannelTransport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        if self.closed {
            return Err(SessionError::Channel("transport already closed".into()));
        }
        self.framed
            .send(ws::Message::Text(text.into()))
            .await
            .map_err(|e| SessionError::Channel(e.to_string()))
    }

    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.framed.next().await {
                None => return None,
                Some(Err(e)) => return Some(Err(SessionError::Channel(e.to_string()))),
                Some(Ok(ws::Frame::Text(bytes))) => {
                    return Some(match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => Ok(text),
                        Err(e) => Err(SessionError::Protocol(format!("non-utf8 frame: {e}"))),
                    })
                }
                Some(Ok(ws::Frame::Ping(payload))) => {
                    let _ = self.framed.send(ws::Message::Pong(payload)).await;
                }
                Some(Ok(ws::Frame::Pong(_))) => {}
                Some(Ok(ws::Frame::Close(reason))) => {
                    tracing::debug!(?reason, "realtime channel closed by peer");
                    return None;
                }
                Some(Ok(ws::Frame::Binary(_))) => {
                    return Some(Err(SessionError::Protocol(
                        "binary frame on text protocol".into(),
                    )))
                }
                Some(Ok(ws::Frame::Continuation(_))) => {
                    return Some(Err(SessionError::Protocol(
                        "unexpected continuation frame".into(),
                    )))
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.framed.send(ws::Message::Close(None)).await;
        let _ = self.framed.close().await;
    }
}
