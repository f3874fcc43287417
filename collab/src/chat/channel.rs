//! Realtime chat socket for one partner.
//!
//! [`ChatChannel::open`] connects to `{ws_base}/chat/{partner}/?token=...`,
//! then spawns a reader task that decodes server frames into
//! [`ChannelEvent`]s and a writer task fed by an unbounded channel. Sending
//! is fire-and-forget: there is no acknowledgement and no retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use collab_proto::codec::{self, CodecError};
use collab_proto::frame::{ClientFrame, ServerFrame};
use collab_proto::models::UserId;

/// Type alias for the read half of a WebSocket connection.
type WsReader =
    futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Type alias for the write half of a WebSocket connection.
type WsSender = futures_util::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

/// How long [`ChatChannel::close`] waits for the close handshake.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors opening or using a chat channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The WebSocket base URL is not a valid URL.
    #[error("invalid chat URL: {0}")]
    Url(#[from] url::ParseError),
    /// The connection did not complete in time.
    #[error("timed out connecting to chat server")]
    Timeout,
    /// The handshake failed or was refused.
    #[error("chat connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
    /// A frame could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The socket has closed.
    #[error("chat connection closed")]
    Closed,
}

/// Something observed on a chat socket, tagged with its partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A decoded server frame.
    Frame {
        /// Partner of the socket the frame arrived on.
        partner: UserId,
        /// The frame.
        frame: ServerFrame,
    },
    /// The socket closed or failed.
    Closed {
        /// Partner of the closed socket.
        partner: UserId,
    },
}

/// Builds the chat socket URL for `partner`.
///
/// # Errors
///
/// Returns [`url::ParseError`] if `ws_base` is not a valid URL.
pub fn chat_url(ws_base: &str, partner: UserId, token: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("{}/chat/{partner}/", ws_base.trim_end_matches('/')))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// An open chat socket.
pub struct ChatChannel {
    partner: UserId,
    outgoing: mpsc::UnboundedSender<Message>,
    connected: Arc<AtomicBool>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl ChatChannel {
    /// Opens the socket for `partner` and starts its reader and writer.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the URL is invalid, the connection times
    /// out, or the server refuses the handshake.
    pub async fn open(
        ws_base: &str,
        token: &str,
        partner: UserId,
        timeout: Duration,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self, ChannelError> {
        let url = chat_url(ws_base, partner, token)?;

        let (ws_stream, _response) = tokio::time::timeout(timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                tracing::warn!(partner = %partner, "chat connect timed out");
                ChannelError::Timeout
            })?
            .map_err(|e| {
                tracing::warn!(partner = %partner, err = %e, "chat connect failed");
                ChannelError::Connect(e)
            })?;

        tracing::info!(partner = %partner, "chat socket open");

        let (ws_sender, ws_reader) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        let writer = tokio::spawn(writer_loop(ws_sender, rx, Arc::clone(&connected)));
        let reader = tokio::spawn(reader_loop(
            ws_reader,
            partner,
            events,
            Arc::clone(&connected),
        ));

        Ok(Self {
            partner,
            outgoing: tx,
            connected,
            writer,
            reader,
        })
    }

    /// The partner this socket talks to.
    #[must_use]
    pub const fn partner(&self) -> UserId {
        self.partner
    }

    /// Whether the socket is still open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Queues `frame` for sending.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the socket is gone, or
    /// [`ChannelError::Codec`] if the frame cannot be encoded. Either way
    /// the frame is dropped.
    pub fn send(&self, frame: &ClientFrame) -> Result<(), ChannelError> {
        if !self.is_connected() {
            tracing::warn!(partner = %self.partner, "dropping frame: chat socket closed");
            return Err(ChannelError::Closed);
        }
        let text = codec::encode_client(frame)?;
        self.outgoing
            .send(Message::Text(text.into()))
            .map_err(|_| ChannelError::Closed)
    }

    /// Closes the socket and waits for the close handshake to be sent.
    pub async fn close(self) {
        let Self {
            partner,
            outgoing,
            connected,
            writer,
            reader,
        } = self;

        // Dropping the sender ends the writer loop, which closes the sink.
        drop(outgoing);
        if tokio::time::timeout(CLOSE_TIMEOUT, writer).await.is_err() {
            tracing::warn!(partner = %partner, "chat socket close timed out");
        }
        reader.abort();
        connected.store(false, Ordering::Relaxed);
        tracing::info!(partner = %partner, "chat socket closed");
    }
}

async fn writer_loop(
    mut ws_sender: WsSender,
    mut rx: mpsc::UnboundedReceiver<Message>,
    connected: Arc<AtomicBool>,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = ws_sender.send(msg).await {
            tracing::warn!(err = %e, "chat send failed");
            connected.store(false, Ordering::Relaxed);
            return;
        }
    }
    let _ = ws_sender.close().await;
}

/// Decodes inbound frames until the socket ends. Malformed frames are
/// logged and skipped.
async fn reader_loop(
    mut ws_reader: WsReader,
    partner: UserId,
    events: mpsc::Sender<ChannelEvent>,
    connected: Arc<AtomicBool>,
) {
    while let Some(msg_result) = ws_reader.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match codec::decode_server(text.as_str()) {
                Ok(frame) => {
                    if events
                        .send(ChannelEvent::Frame { partner, frame })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(partner = %partner, err = %e, "malformed chat frame, skipping");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(partner = %partner, "chat socket closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(partner = %partner, err = %e, "chat socket read error");
                break;
            }
        }
    }
    connected.store(false, Ordering::Relaxed);
    let _ = events.send(ChannelEvent::Closed { partner }).await;
}
