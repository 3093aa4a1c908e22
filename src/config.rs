//! Server-wide configuration surface.
//!
//! No files, environment variables, or config-parsing crate are needed by
//! the core: the listen port, advertised framebuffer size, desktop name,
//! and refresh period are the entire configuration surface, so a plain
//! struct with sensible defaults is all this is.

use std::time::Duration;

/// Default VNC listen port.
pub const DEFAULT_PORT: u16 = 5900;

/// Default refresh cadence: 50 Hz, i.e. one update at most every 20 ms.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_millis(20);

/// Configuration for a [`crate::server::VncServer`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Advertised framebuffer width, in pixels.
    pub width: u16,
    /// Advertised framebuffer height, in pixels.
    pub height: u16,
    /// Desktop name sent in `ServerInit`.
    pub name: String,
    /// Minimum interval between `FramebufferUpdate` messages on any one
    /// connection.
    pub refresh_period: Duration,
}

impl ServerConfig {
    /// Creates a configuration with the given framebuffer dimensions and
    /// otherwise-default settings.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            port: DEFAULT_PORT,
            width,
            height,
            name: "rfb-core".to_string(),
            refresh_period: DEFAULT_REFRESH_PERIOD,
        }
    }

    /// Sets the listen port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the desktop name advertised in `ServerInit`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the refresh cadence.
    #[must_use]
    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(500, 500)
    }
}
