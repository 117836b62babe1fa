//! Chat socket channel.
//!
//! A bidirectional WebSocket carrying named events scoped to conversation
//! rooms. The access credential is supplied at connect time as a `token`
//! query parameter; delivery is scoped by `join` / `leave` frames.
//!
//! Inbound frames that do not decode into a known event are dropped
//! silently, the same tolerance policy the status stream applies.

use std::sync::Mutex;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use atrium_domain::{ChatCommand, ChatEvent, ChatSignal, ClientConfig, StreamError};

/// Handle to one live chat socket connection.
#[derive(Debug)]
pub struct ChatChannel {
    outgoing: mpsc::UnboundedSender<Message>,
    reader: Mutex<Option<JoinHandle<()>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl ChatChannel {
    /// Connect to the chat socket, authenticating with the access token.
    ///
    /// Decoded inbound events are forwarded to `signals`; a transport
    /// failure is forwarded once and the channel goes quiet.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Connect`] if the socket URL is invalid or
    /// the handshake fails.
    pub async fn connect(
        config: &ClientConfig,
        access_token: &str,
        signals: mpsc::UnboundedSender<ChatSignal>,
    ) -> Result<Self, StreamError> {
        let mut url = Url::parse(&config.chat_socket_url)
            .map_err(|e| StreamError::Connect(format!("{e}: {}", config.chat_socket_url)))?;
        let query = serde_urlencoded::to_string([("token", access_token)])
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        url.set_query(Some(&query));

        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        info!(url = %config.chat_socket_url, "chat socket connected");

        let (mut sink, mut source) = socket.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let writer = tokio::spawn(async move {
            while let Some(frame) = outgoing_rx.recv().await {
                if let Err(e) = sink.send(frame).await {
                    warn!(error = %e, "chat socket send failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ChatEvent>(text.as_str()) {
                            Ok(event) => {
                                debug!(conversation = %event.conversation(), "chat event received");
                                if signals.send(ChatSignal::Event(event)).is_err() {
                                    return;
                                }
                            }
                            Err(e) => debug!(error = %e, "unrecognized chat frame dropped"),
                        }
                    }
                    Ok(Message::Close(_)) => {
                        let _ = signals.send(ChatSignal::Error(StreamError::Closed));
                        return;
                    }
                    // Control frames are handled by the transport.
                    Ok(_) => {}
                    Err(e) => {
                        let _ =
                            signals.send(ChatSignal::Error(StreamError::Transport(e.to_string())));
                        return;
                    }
                }
            }
            let _ = signals.send(ChatSignal::Error(StreamError::Closed));
        });

        Ok(Self {
            outgoing,
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Send a chat command frame.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the channel has been closed.
    pub fn send(&self, command: &ChatCommand) -> Result<(), StreamError> {
        let text = serde_json::to_string(command)
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        self.outgoing
            .send(Message::Text(text.into()))
            .map_err(|_| StreamError::Closed)
    }

    /// Join a conversation room.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the channel has been closed.
    pub fn join(&self, conversation: &str) -> Result<(), StreamError> {
        self.send(&ChatCommand::Join {
            conversation: conversation.to_string(),
        })
    }

    /// Leave a conversation room.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the channel has been closed.
    pub fn leave(&self, conversation: &str) -> Result<(), StreamError> {
        self.send(&ChatCommand::Leave {
            conversation: conversation.to_string(),
        })
    }

    /// Close the channel. Closing an already-closed channel is a no-op.
    pub fn close(&self) {
        let reader = Self::take_task(&self.reader);
        let writer = Self::take_task(&self.writer);
        if let Some(task) = reader {
            task.abort();
            debug!("chat socket closed");
        }
        if let Some(task) = writer {
            task.abort();
        }
    }

    /// Whether the channel has been closed or its reader has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.reader
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }

    fn take_task(slot: &Mutex<Option<JoinHandle<()>>>) -> Option<JoinHandle<()>> {
        slot.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }
}

impl Drop for ChatChannel {
    fn drop(&mut self) {
        self.close();
    }
}
