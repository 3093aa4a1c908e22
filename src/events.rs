//! Events emitted by a connection towards the embedding application.
//!
//! The framebuffer's content, any real input handling, and authentication
//! beyond "None" are external collaborators this crate does not implement.
//! `ServerEvent` is the channel through which a connection reports what it
//! decoded so the embedder can act on it.

/// Events emitted by a single RFB connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A client connected and completed the handshake.
    Connected {
        /// Unique id assigned to this connection by the acceptor.
        id: usize,
    },

    /// A client connection ended, cleanly or otherwise.
    Disconnected {
        /// Id of the connection that ended.
        id: usize,
    },

    /// A pointer (mouse) event.
    PointerEvent {
        /// Id of the originating connection.
        id: usize,
        /// X coordinate of the pointer.
        x: u16,
        /// Y coordinate of the pointer.
        y: u16,
        /// Bitmask of currently pressed buttons.
        button_mask: u8,
    },

    /// A keyboard event.
    KeyEvent {
        /// Id of the originating connection.
        id: usize,
        /// X Window System keysym of the key.
        key: u32,
        /// `true` if pressed, `false` if released.
        down: bool,
    },

    /// Clipboard text sent by the client.
    ClipboardReceived {
        /// Id of the originating connection.
        id: usize,
        /// Clipboard text content.
        text: String,
    },

    /// The client requested an encoding, option, or feature this core does
    /// not implement. Recorded and ignored; the session continues.
    UnsupportedRequest {
        /// Id of the originating connection.
        id: usize,
        /// Human-readable description of what was requested.
        detail: String,
    },
}
