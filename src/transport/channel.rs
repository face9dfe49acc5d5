//! WebSocket session channel and event loop.
//!
//! Carries BiDi command frames to the remote end and routes reply frames
//! back to their callers by command ID. Frames without an ID are events and
//! go to the registered [`EventHandler`].
//!
//! # Event Loop
//!
//! The channel spawns a tokio task that handles:
//!
//! - Incoming frames from the remote end (replies, events)
//! - Outgoing commands from [`WebSocketChannel::send`]
//! - Request/response correlation by [`CommandId`]
//! - Event handler callbacks

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, CommandIdGenerator};
use crate::protocol::{ChannelCall, Event, Request, Response};

use super::SessionChannel;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for one command.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending commands before rejecting new ones.
const MAX_PENDING_REQUESTS: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// Map of command IDs to reply channels.
type CorrelationMap = FxHashMap<CommandId, oneshot::Sender<Result<Response>>>;

/// Client-side WebSocket stream.
type ChannelStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Event handler callback type.
///
/// Called on the event loop task for each event frame.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

// ============================================================================
// ChannelOptions
// ============================================================================

/// Session channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Time to wait for the reply to one command.
    pub command_timeout: Duration,
    /// Commands allowed in flight at once.
    pub max_pending: usize,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelOptions {
    /// Creates options with defaults (30s timeout, 100 pending).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_pending: MAX_PENDING_REQUESTS,
        }
    }

    /// Sets the per-command timeout.
    #[inline]
    #[must_use]
    pub const fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self
    }

    /// Sets the in-flight command limit.
    #[inline]
    #[must_use]
    pub const fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }
}

// ============================================================================
// PendingSlot
// ============================================================================

/// One reserved in-flight command; released on drop.
struct PendingSlot(Arc<AtomicUsize>);

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

// ============================================================================
// ChannelCommand
// ============================================================================

/// Internal commands for the event loop.
enum ChannelCommand {
    /// Send a request and wait for its reply.
    Send {
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(CommandId),
    /// Close the channel.
    Shutdown,
}

// ============================================================================
// WebSocketChannel
// ============================================================================

/// BiDi session channel over a WebSocket.
///
/// Cloning is cheap; clones share one event loop. The loop ends on
/// [`WebSocketChannel::shutdown`] or when the remote end closes.
#[derive(Clone)]
pub struct WebSocketChannel {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ChannelCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Event handler (shared with event loop).
    event_handler: Arc<Mutex<Option<EventHandler>>>,
    /// Command ID source.
    ids: Arc<CommandIdGenerator>,
    /// Commands reserved by callers, queued or awaiting a reply.
    in_flight: Arc<AtomicUsize>,
    options: ChannelOptions,
}

impl WebSocketChannel {
    /// Connects with default options.
    ///
    /// # Errors
    ///
    /// See [`WebSocketChannel::connect_with_options`].
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_options(url, ChannelOptions::new()).await
    }

    /// Connects to a `ws://` or `wss://` endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `url` does not parse
    /// - [`Error::Config`] if the scheme is not `ws` or `wss`
    /// - [`Error::Connection`] if the handshake fails
    pub async fn connect_with_options(url: &str, options: ChannelOptions) -> Result<Self> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "unsupported scheme '{}' for session channel",
                url.scheme()
            )));
        }

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::connection(format!("{url}: {e}")))?;

        debug!(%url, "Session channel connected");
        Ok(Self::new(ws_stream, options))
    }

    /// Creates a channel from an established stream.
    ///
    /// Spawns the event loop task internally.
    fn new(ws_stream: ChannelStream, options: ChannelOptions) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let event_handler: Arc<Mutex<Option<EventHandler>>> = Arc::new(Mutex::new(None));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&event_handler),
        ));

        Self {
            command_tx,
            correlation,
            event_handler,
            ids: Arc::new(CommandIdGenerator::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            options,
        }
    }

    /// Sets the event handler callback.
    pub fn set_event_handler(&self, handler: EventHandler) {
        *self.event_handler.lock() = Some(handler);
    }

    /// Clears the event handler.
    pub fn clear_event_handler(&self) {
        *self.event_handler.lock() = None;
    }

    /// Sends a call and waits for its reply with the configured timeout.
    ///
    /// # Errors
    ///
    /// See [`WebSocketChannel::send_with_timeout`].
    pub async fn send(&self, call: ChannelCall) -> Result<Response> {
        self.send_with_timeout(call, self.options.command_timeout)
            .await
    }

    /// Sends a call and waits for its reply.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the channel is closed
    /// - [`Error::RequestTimeout`] if no reply arrives within `request_timeout`
    /// - [`Error::Connection`] if too many commands are pending
    pub async fn send_with_timeout(
        &self,
        call: ChannelCall,
        request_timeout: Duration,
    ) -> Result<Response> {
        let _slot = self.reserve_slot()?;

        let command_id = self.ids.next_id();
        let request = Request::new(command_id, call);
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ChannelCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(ChannelCommand::RemoveCorrelation(command_id));

                Err(Error::request_timeout(
                    command_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Returns the number of pending commands, including those still queued
    /// for the event loop.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claims an in-flight slot before the command is queued.
    fn reserve_slot(&self) -> Result<PendingSlot> {
        let max = self.options.max_pending;
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .map(|_| PendingSlot(Arc::clone(&self.in_flight)))
            .map_err(|pending| {
                warn!(pending, max, "Too many pending commands");
                Error::connection(format!("too many pending commands: {pending}/{max}"))
            })
    }

    /// Closes the channel.
    ///
    /// Pending callers receive [`Error::ConnectionClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ChannelCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: ChannelStream,
        mut command_rx: mpsc::UnboundedReceiver<ChannelCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        event_handler: Arc<Mutex<Option<EventHandler>>>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation, &event_handler);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ChannelCommand::Send { request, response_tx }) => {
                            Self::handle_send_command(
                                request,
                                response_tx,
                                &mut ws_write,
                                &correlation,
                            ).await;
                        }

                        Some(ChannelCommand::RemoveCorrelation(command_id)) => {
                            correlation.lock().remove(&command_id);
                            debug!(%command_id, "Removed timed-out correlation");
                        }

                        Some(ChannelCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Self::fail_pending_requests(&correlation);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text frame.
    fn handle_incoming_message(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        event_handler: &Arc<Mutex<Option<EventHandler>>>,
    ) {
        if let Ok(response) = from_str::<Response>(text) {
            let Some(command_id) = response.id else {
                warn!(
                    error = response.error.as_deref().unwrap_or_default(),
                    "Error frame without command id"
                );
                return;
            };

            let tx = correlation.lock().remove(&command_id);
            if let Some(tx) = tx {
                let _ = tx.send(Ok(response));
            } else {
                warn!(%command_id, "Reply for unknown command");
            }
            return;
        }

        if let Ok(event) = from_str::<Event>(text) {
            trace!(method = %event.method, "Event received");
            if let Some(ref handler) = *event_handler.lock() {
                handler(event);
            }
            return;
        }

        warn!(text = %text, "Failed to parse incoming frame");
    }

    /// Handles a send command from the public API.
    async fn handle_send_command(
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
        ws_write: &mut SplitSink<ChannelStream, Message>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let command_id = request.id;

        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        // Register before sending so a fast reply finds its entry
        correlation.lock().insert(command_id, response_tx);

        if let Err(e) = ws_write.send(Message::Text(json.into())).await
            && let Some(tx) = correlation.lock().remove(&command_id)
        {
            let _ = tx.send(Err(Error::connection(e.to_string())));
        }

        trace!(%command_id, method = %request.call.method, "Command sent");
    }

    /// Fails all pending commands with [`Error::ConnectionClosed`].
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending commands on shutdown");
        }
    }
}

#[async_trait]
impl SessionChannel for WebSocketChannel {
    async fn call(&self, call: ChannelCall) -> Result<Value> {
        self.send(call).await?.into_result()
    }
}

// ============================================================================
// Tests
// ============================================================================
