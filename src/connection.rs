//! The per-connection façade: owns the socket, framing buffer, negotiated
//! pixel format, client encoding preference, cursor state, and update
//! scheduler, and drives them with a `tokio::select!` loop.
//!
//! One task per connection interleaves `stream.read_buf` with a
//! `tokio::time::interval` tick, running the scheduler from
//! [`crate::scheduler`] against the scene abstraction to decide when to
//! send an update.

use std::time::Instant;

use bytes::BytesMut;
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::encoding::{get_encoder, select_encoding};
use crate::error::{Result, VncError};
use crate::events::ServerEvent;
use crate::message::{self, ClientMessage, RectangleHeader};
use crate::pixel::PixelFormat;
use crate::scene::Scene;
use crate::scheduler::UpdateScheduler;
use crate::session::{self, SessionState};
use crate::buffer::FramingBuffer;

/// One accepted RFB connection, from completed handshake to close.
pub struct Connection<S> {
    id: usize,
    stream: S,
    framing: FramingBuffer,
    state: SessionState,
    format: PixelFormat,
    encodings: Vec<i32>,
    cursor: (u16, u16),
    refresh_pending: bool,
    scheduler: UpdateScheduler,
    refresh_period: std::time::Duration,
    scene: Box<dyn Scene>,
    events: mpsc::UnboundedSender<ServerEvent>,
    frame: u64,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Performs the handshake over `stream` and returns a connection ready
    /// to enter [`Connection::run`].
    ///
    /// # Errors
    ///
    /// Propagates handshake I/O failures from [`session::perform_handshake`].
    pub async fn accept(
        id: usize,
        mut stream: S,
        config: &ServerConfig,
        scene: Box<dyn Scene>,
        events: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<Self> {
        let mut framing = FramingBuffer::new();
        let format = session::perform_handshake(&mut stream, &mut framing, config).await?;
        info!("connection {id}: handshake complete");

        let _ = events.send(ServerEvent::Connected { id });

        Ok(Self {
            id,
            stream,
            framing,
            state: SessionState::Ready,
            format,
            // The reference scene is always rendered as RRE, so RRE leads
            // the default preference list; Raw stays in it because every
            // RFB client is required to support it regardless of what
            // `SetEncodings` later sends.
            encodings: vec![message::ENCODING_RRE, message::ENCODING_RAW],
            cursor: (0, 0),
            refresh_pending: true,
            scheduler: UpdateScheduler::new(config.refresh_period),
            refresh_period: config.refresh_period,
            scene,
            events,
            frame: 0,
        })
    }

    /// Runs the steady-state loop until the peer disconnects or a fatal
    /// protocol error occurs.
    ///
    /// # Errors
    ///
    /// Returns the terminating [`VncError`]; the caller is expected to log
    /// it and drop the connection, never propagate it to other connections.
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.refresh_period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;

                message = session::read_client_message(&mut self.stream, &mut self.framing) => {
                    match message {
                        Ok(msg) => {
                            if let Err(err) = self.handle_message(msg).await {
                                break Err(err);
                            }
                        }
                        Err(err) if err.is_recoverable() => {
                            warn!("connection {}: {err}", self.id);
                            let _ = self.events.send(ServerEvent::UnsupportedRequest {
                                id: self.id,
                                detail: err.to_string(),
                            });
                        }
                        Err(err) => break Err(err),
                    }
                }

                _ = ticker.tick() => {
                    if self.scheduler.poll(Instant::now(), self.refresh_pending) {
                        if let Err(err) = self.send_update().await {
                            break Err(err);
                        }
                        self.refresh_pending = false;
                    }
                }
            }
        };

        self.state = SessionState::Closed;
        if let Err(ref err) = result {
            debug!("connection {}: closing ({err})", self.id);
        }
        let _ = self.events.send(ServerEvent::Disconnected { id: self.id });
        result
    }

    /// The connection's current handshake/dispatch phase.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    async fn handle_message(&mut self, message: ClientMessage) -> Result<()> {
        match message {
            ClientMessage::SetPixelFormat(format) => {
                format.validate()?;
                self.format = format;
            }
            ClientMessage::SetEncodings(encodings) => {
                self.encodings = encodings;
            }
            ClientMessage::FramebufferUpdateRequest { .. } => {
                self.refresh_pending = true;
            }
            ClientMessage::KeyEvent { down, key } => {
                let _ = self.events.send(ServerEvent::KeyEvent { id: self.id, key, down });
            }
            ClientMessage::PointerEvent { button_mask, x, y } => {
                self.cursor = (x, y);
                self.refresh_pending = true;
                let _ = self.events.send(ServerEvent::PointerEvent {
                    id: self.id,
                    x,
                    y,
                    button_mask,
                });
            }
            ClientMessage::ClientCutText(text) => {
                let _ = self.events.send(ServerEvent::ClipboardReceived { id: self.id, text });
            }
        }
        Ok(())
    }

    async fn send_update(&mut self) -> Result<()> {
        let rect = self.scene.render(self.cursor.0, self.cursor.1, self.frame);
        self.frame += 1;

        let tag = select_encoding(&self.encodings);
        let encoder = get_encoder(tag).ok_or_else(|| {
            VncError::ProtocolViolation(format!("no encoder available for negotiated tag {tag}"))
        })?;
        let payload = encoder.encode(&rect.pixels, rect.width, rect.height, &self.format);

        let header = RectangleHeader {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            encoding: tag,
        };

        let mut buf = BytesMut::with_capacity(4 + 12 + payload.len());
        message::write_framebuffer_update_header(&mut buf, 1);
        header.write_to(&mut buf);
        buf.extend_from_slice(&payload);

        self.stream.write_all(&buf).await?;
        Ok(())
    }
}
