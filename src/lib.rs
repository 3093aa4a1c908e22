// Copyright 2026 The rfb-core Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # rfb-core
//!
//! A minimal, pure-Rust implementation of an RFB (Remote Framebuffer, the
//! VNC wire protocol) server core, targeting the RFB 3.3 dialect.
//!
//! This crate implements the protocol engine: the version/security/init
//! handshake, a framing buffer over any async byte stream, the
//! `PixelFormat` model and color conversion, the Raw and RRE encodings,
//! and a rate-limited update scheduler. It does not implement a real
//! framebuffer, screen capture, input injection, or authentication beyond
//! "None" — those are external collaborators the embedding application
//! supplies, through the [`Scene`](scene::Scene) trait and the
//! [`ServerEvent`] channel.
//!
//! ## Quick start
//!
//! ```no_run
//! use rfb_core::VncServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     env_logger::init();
//!     let mut server = VncServer::new(640, 480);
//!     let mut events = server.events().unwrap();
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             log::debug!("{event:?}");
//!         }
//!     });
//!
//!     server.listen().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Scope
//!
//! Only Raw and RRE encodings, the RFB 3.3 dialect (no client-selectable
//! security list, no `SecurityResult`), and `None` authentication are
//! implemented. Every other RFB encoding, TLS/VeNCrypt, and full RFB 3.8
//! conformance are out of scope.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod config;
pub mod connection;
pub mod encoding;
pub mod error;
pub mod events;
pub mod message;
pub mod pixel;
pub mod scene;
pub mod scheduler;
pub mod server;
pub mod session;

pub use buffer::FramingBuffer;
pub use config::{ServerConfig, DEFAULT_PORT};
pub use connection::Connection;
pub use encoding::Encoding;
pub use error::{Result, VncError};
pub use events::ServerEvent;
pub use message::PROTOCOL_VERSION;
pub use pixel::PixelFormat;
pub use scene::{DemoScene, Scene, SceneRect};
pub use server::VncServer;
