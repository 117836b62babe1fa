//! Integration-status stream subscription.
//!
//! One subscription owns one SSE connection. Frames are decoded by the
//! normalizer and forwarded as [`StreamEvent::Batch`]; a transport failure
//! is forwarded once as [`StreamEvent::Error`] and the pump ends. This
//! layer never reconnects; callers re-subscribe if they want to.

use std::sync::Mutex;

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use atrium_application::decode_status_frame;
use atrium_domain::{ClientConfig, StreamError, StreamEvent};

/// Handle to one live status-stream subscription.
#[derive(Debug)]
pub struct StatusSubscription {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StatusSubscription {
    /// Open the stream and start forwarding decoded batches to `events`.
    ///
    /// The access token, when given, is attached as a bearer header on the
    /// connect request.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Connect`] if the connection cannot be
    /// established or the server refuses it.
    pub async fn open(
        config: &ClientConfig,
        access_token: Option<String>,
        events: mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<Self, StreamError> {
        let client = reqwest::Client::new();
        let mut request = client
            .get(&config.events_url)
            .header(ACCEPT, "text/event-stream");
        if let Some(token) = access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StreamError::Connect(format!(
                "server refused stream: HTTP {}",
                response.status().as_u16()
            )));
        }

        info!(url = %config.events_url, "status stream connected");
        let task = tokio::spawn(async move {
            pump_status_frames(response.bytes_stream(), &events).await;
        });

        Ok(Self {
            task: Mutex::new(Some(task)),
        })
    }

    /// Close the subscription. Closing an already-closed subscription is a
    /// no-op.
    pub fn close(&self) {
        let task = {
            let mut guard = self
                .task
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.take()
        };
        if let Some(task) = task {
            task.abort();
            debug!("status stream subscription closed");
        }
    }

    /// Whether the subscription has been closed or its pump has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drive one SSE byte stream to completion, forwarding decoded frames.
///
/// Unrecognized frames are dropped without a callback; the first transport
/// error (or the server closing the stream) produces one terminal
/// [`StreamEvent::Error`].
async fn pump_status_frames<S, E>(stream: S, events: &mpsc::UnboundedSender<StreamEvent>)
where
    S: Stream<Item = Result<bytes::Bytes, E>>,
    E: std::fmt::Display,
{
    let mut frames = std::pin::pin!(stream.eventsource());

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(frame) => match decode_status_frame(&frame.data) {
                Some(batch) => {
                    debug!(count = batch.len(), "status frame decoded");
                    if events.send(StreamEvent::Batch(batch)).is_err() {
                        // Subscriber went away; nothing left to do.
                        return;
                    }
                }
                None => debug!("unrecognized status frame dropped"),
            },
            Err(e) => {
                let _ = events.send(StreamEvent::Error(StreamError::Transport(e.to_string())));
                return;
            }
        }
    }

    let _ = events.send(StreamEvent::Error(StreamError::Closed));
}
