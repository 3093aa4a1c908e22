//! Demo RFB server.
//!
//! Runs the reference scene (a 20x20 pseudo-random-colored rectangle that
//! follows the client's cursor) and logs every input/connection event.
//!
//! Usage:
//!   cargo run --example demo_server
//!
//! Then connect with a VNC viewer at localhost:5900.

use rfb_core::{ServerConfig, VncServer};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("Starting RFB demo server on port 5900...");
    println!("Connect with: vncviewer localhost:5900");

    let config = ServerConfig::new(640, 480).with_name("rfb-core demo");
    let mut server = VncServer::with_config(config);
    let mut events = server.events().expect("events receiver is only taken once");

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{event:?}");
        }
    });

    println!("Server ready for connections");
    server.listen().await?;

    Ok(())
}
