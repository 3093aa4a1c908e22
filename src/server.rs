//! The listening-socket acceptor: binds a `TcpListener` and spawns one
//! [`Connection`] task per accepted socket.
//!
//! Scoped to what this core actually does: no framebuffer storage, no
//! password/auth handling, no client registry beyond a monotonically
//! increasing connection id — replacing the reference C's single global
//! socket and blocking `accept` loop with an explicit `TcpListener` plus a
//! `tokio::sync::watch` shutdown signal for cooperative, race-free
//! lifecycle control.

use log::{error, info};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::error::Result;
use crate::events::ServerEvent;
use crate::scene::{DemoScene, Scene};

/// A listening RFB server. Accepts connections and runs each to completion
/// on its own task; input/clipboard/connect-disconnect events surface on
/// the channel returned by [`VncServer::events`].
pub struct VncServer {
    config: ServerConfig,
    scene_factory: Box<dyn Fn() -> Box<dyn Scene> + Send + Sync>,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<ServerEvent>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl VncServer {
    /// Creates a server that will advertise a `width x height` framebuffer
    /// and the reference [`DemoScene`] content.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_config(ServerConfig::new(width, height))
    }

    /// Creates a server from a fully specified [`ServerConfig`].
    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            scene_factory: Box::new(|| Box::new(DemoScene::new())),
            events_tx,
            events_rx: Some(events_rx),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Replaces the per-connection scene factory. Each accepted connection
    /// gets its own scene instance, built by calling `factory`.
    #[must_use]
    pub fn with_scene_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Scene> + Send + Sync + 'static,
    {
        self.scene_factory = Box::new(factory);
        self
    }

    /// Takes ownership of the event receiver. Can only be called once; a
    /// second call returns `None`.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<ServerEvent>> {
        self.events_rx.take()
    }

    /// Signals every connection task and the accept loop to stop. Already
    /// in-flight connections finish their current message before exiting.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Binds the configured port and accepts connections until
    /// [`VncServer::shutdown`] is called or the listener errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind. Per-connection errors
    /// are logged and never propagated here.
    pub async fn listen(&self) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.config.port)).await?;
        info!("listening on port {}", self.config.port);

        let mut next_id = 0usize;
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("shutting down acceptor");
                        return Ok(());
                    }
                }

                accepted = listener.accept() => {
                    let (socket, addr) = accepted?;
                    next_id += 1;
                    let id = next_id;
                    info!("accepted connection {id} from {addr}");

                    let config = self.config.clone();
                    let scene = (self.scene_factory)();
                    let events_tx = self.events_tx.clone();

                    tokio::spawn(async move {
                        match Connection::accept(id, socket, &config, scene, events_tx).await {
                            Ok(connection) => {
                                if let Err(err) = connection.run().await {
                                    error!("connection {id}: {err}");
                                }
                            }
                            Err(err) => error!("connection {id}: handshake failed: {err}"),
                        }
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn shutdown_stops_the_accept_loop() {
        let config = ServerConfig::new(100, 100).with_port(0);
        let server = VncServer::with_config(config);

        server.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(1), server.listen()).await;
        assert!(result.is_ok(), "listen() should return promptly once shutdown is signaled");
    }

    #[tokio::test]
    async fn a_connecting_client_completes_the_handshake() {
        let config = ServerConfig::new(64, 64).with_port(0);
        let mut server = VncServer::with_config(config);
        let mut events = server.events().unwrap();

        // Bind first so we know the ephemeral port before the client connects.
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        server.config.port = port;

        let shutdown = server.shutdown_tx.clone();
        let listen_task = tokio::spawn(async move { server.listen().await });

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut client = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut version = [0u8; 12];
        client.read_exact(&mut version).await.unwrap();
        client.write_all(crate::message::PROTOCOL_VERSION).await.unwrap();
        let mut security = [0u8; 4];
        client.read_exact(&mut security).await.unwrap();
        client.write_all(&[1u8]).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), ServerEvent::Connected { id: 1 });

        let _ = shutdown.send(true);
        let _ = listen_task.await;
    }
}
