//! The per-connection RFB state machine: version/security/init handshake,
//! then steady-state message dispatch.
//!
//! The handshake follows the RFB 3.3 dialect: an unconditional
//! `RFB_SEC_NONE` security type and a single-byte `ClientInit`, with no
//! client-selectable security list and no `SecurityResult` message. The
//! handshake and the steady-state dispatch loop are kept as separate
//! functions so each can be driven and tested independently.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::buffer::FramingBuffer;
use crate::config::ServerConfig;
use crate::error::{Result, VncError};
use crate::message::{
    self, ClientMessage, ServerInit, CLIENT_MSG_CLIENT_CUT_TEXT, CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST,
    CLIENT_MSG_KEY_EVENT, CLIENT_MSG_POINTER_EVENT, CLIENT_MSG_SET_ENCODINGS, CLIENT_MSG_SET_PIXEL_FORMAT,
    PROTOCOL_VERSION, SECURITY_TYPE_NONE,
};
use crate::pixel::PixelFormat;

/// Where a connection is in the RFB handshake/steady-state sequence.
///
/// `perform_handshake` walks a connection through the first three states in
/// order and never returns control to the caller until `Ready` or an error;
/// the enum exists so connection-level diagnostics and tests can name the
/// phase a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the client's 12-byte version string.
    AwaitingVersion,
    /// Version exchanged; security type has been sent, waiting for
    /// `ClientInit`. RFB 3.3 never sends a client-selectable security list
    /// or a `SecurityResult`, so this state is brief.
    AwaitingSecurity,
    /// `ClientInit` has been read; `ServerInit` is about to be sent.
    AwaitingClientInit,
    /// Handshake complete; dispatching steady-state messages.
    Ready,
    /// The session has ended, cleanly or via error.
    Closed,
}

/// Runs the version/security/init handshake to completion and returns the
/// pixel format the server advertised in `ServerInit` (always
/// [`PixelFormat::server_default`] — a client only changes this
/// afterwards, via `SetPixelFormat`).
///
/// # Errors
///
/// Returns [`VncError::PeerClosed`]/[`VncError::Io`] if the peer drops
/// mid-handshake.
pub async fn perform_handshake<S>(stream: &mut S, framing: &mut FramingBuffer, config: &ServerConfig) -> Result<PixelFormat>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(PROTOCOL_VERSION).await?;

    let _client_version = framing.wait_for(stream, 12).await?;

    // RFB 3.3: the server unilaterally names a single security type; there
    // is no client-selectable list and, for `None`, no `SecurityResult`.
    let mut security = BytesMut::with_capacity(4);
    security.extend_from_slice(&(u32::from(SECURITY_TYPE_NONE)).to_be_bytes());
    stream.write_all(&security).await?;

    let _shared_flag = framing.wait_for(stream, 1).await?;

    let format = PixelFormat::server_default();
    let init = ServerInit {
        width: config.width,
        height: config.height,
        pixel_format: format,
        name: config.name.clone(),
    };
    let mut buf = BytesMut::new();
    init.write_to(&mut buf);
    stream.write_all(&buf).await?;

    Ok(format)
}

/// Reads and decodes exactly one client-to-server message.
///
/// An unknown message type is a fatal [`VncError::ProtocolViolation`]: once
/// the type byte fails to match a known message, the length of its tail is
/// unknowable and framing cannot be trusted for anything that follows, so
/// the session must close rather than try to resynchronize.
///
/// # Errors
///
/// Propagates [`VncError::PeerClosed`]/[`VncError::Io`] from the framing
/// buffer, and [`VncError::Unsupported`] for an oversized `ClientCutText`
/// (the payload is still drained from the stream before returning so the
/// caller's framing stays intact).
pub async fn read_client_message<S>(stream: &mut S, framing: &mut FramingBuffer) -> Result<ClientMessage>
where
    S: AsyncRead + Unpin,
{
    let msg_type = framing.wait_for(stream, 1).await?[0];

    match msg_type {
        CLIENT_MSG_SET_PIXEL_FORMAT => {
            let tail = framing.wait_for(stream, 19).await?;
            message::decode_set_pixel_format(tail)
        }
        CLIENT_MSG_SET_ENCODINGS => {
            let header = framing.wait_for(stream, 3).await?;
            let count = message::decode_set_encodings_header(header);
            let tail = framing.wait_for(stream, count * 4).await?;
            Ok(message::decode_set_encodings_tail(tail, count))
        }
        CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST => {
            let tail = framing.wait_for(stream, 9).await?;
            Ok(message::decode_framebuffer_update_request(tail))
        }
        CLIENT_MSG_KEY_EVENT => {
            let tail = framing.wait_for(stream, 7).await?;
            Ok(message::decode_key_event(tail))
        }
        CLIENT_MSG_POINTER_EVENT => {
            let tail = framing.wait_for(stream, 5).await?;
            Ok(message::decode_pointer_event(tail))
        }
        CLIENT_MSG_CLIENT_CUT_TEXT => {
            let header = framing.wait_for(stream, 7).await?;
            let length = message::raw_client_cut_text_length(header.clone());
            match message::decode_client_cut_text_header(header) {
                Ok(length) => {
                    let tail = framing.wait_for(stream, length).await?;
                    Ok(message::decode_client_cut_text_tail(tail))
                }
                Err(err @ VncError::Unsupported(_)) => {
                    // Drain the oversized payload so the next message this
                    // connection reads is still aligned on a real boundary.
                    framing.wait_for(stream, length).await?;
                    Err(err)
                }
                Err(other) => Err(other),
            }
        }
        other => Err(VncError::ProtocolViolation(format!(
            "unknown client message type {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ClientMessage;
    use bytes::{BufMut, BytesMut};
    use tokio::io::duplex;

    #[tokio::test]
    async fn handshake_sends_version_security_and_server_init() {
        let (mut client, mut server) = duplex(256);
        let config = ServerConfig::new(640, 480).with_name("Anton's Test Server");

        let handshake = tokio::spawn(async move {
            let mut framing = FramingBuffer::new();
            perform_handshake(&mut server, &mut framing, &config).await
        });

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut version = [0u8; 12];
        client.read_exact(&mut version).await.unwrap();
        assert_eq!(&version, PROTOCOL_VERSION);

        client.write_all(PROTOCOL_VERSION).await.unwrap();

        let mut security = [0u8; 4];
        client.read_exact(&mut security).await.unwrap();
        assert_eq!(u32::from_be_bytes(security), u32::from(SECURITY_TYPE_NONE));

        client.write_all(&[1u8]).await.unwrap(); // ClientInit: shared

        let mut server_init_prefix = [0u8; 4];
        client.read_exact(&mut server_init_prefix).await.unwrap();
        assert_eq!(u16::from_be_bytes([server_init_prefix[0], server_init_prefix[1]]), 640);
        assert_eq!(u16::from_be_bytes([server_init_prefix[2], server_init_prefix[3]]), 480);

        let format = handshake.await.unwrap().unwrap();
        assert_eq!(format, PixelFormat::server_default());
    }

    #[tokio::test]
    async fn reads_pointer_event() {
        let (mut client, mut server) = duplex(64);
        let mut framing = FramingBuffer::new();

        use tokio::io::AsyncWriteExt;
        let mut wire = BytesMut::new();
        wire.put_u8(CLIENT_MSG_POINTER_EVENT);
        wire.put_u8(0b101); // button mask
        wire.put_u16(10);
        wire.put_u16(20);
        client.write_all(&wire).await.unwrap();

        let msg = read_client_message(&mut server, &mut framing).await.unwrap();
        assert_eq!(
            msg,
            ClientMessage::PointerEvent {
                button_mask: 0b101,
                x: 10,
                y: 20
            }
        );
    }

    #[tokio::test]
    async fn unknown_message_type_is_fatal() {
        let (mut client, mut server) = duplex(8);
        let mut framing = FramingBuffer::new();

        use tokio::io::AsyncWriteExt;
        client.write_all(&[0xFF]).await.unwrap();

        let err = read_client_message(&mut server, &mut framing).await.unwrap_err();
        assert!(matches!(err, VncError::ProtocolViolation(_)));
    }

    #[tokio::test]
    async fn oversized_cut_text_is_recoverable_and_drained() {
        let (mut client, mut server) = duplex(1 << 20);
        let mut framing = FramingBuffer::new();

        use tokio::io::AsyncWriteExt;
        let oversized = message::MAX_CUT_TEXT + 16;
        let mut wire = BytesMut::new();
        wire.put_u8(CLIENT_MSG_CLIENT_CUT_TEXT);
        wire.put_bytes(0, 3);
        wire.put_u32(oversized as u32);
        client.write_all(&wire).await.unwrap();
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt as _;
            client.write_all(&vec![0u8; oversized]).await.unwrap();
        });

        let err = read_client_message(&mut server, &mut framing).await.unwrap_err();
        assert!(matches!(err, VncError::Unsupported(_)));

        // Framing should now be aligned on the next message boundary.
        let (mut client2, mut server2) = duplex(64);
        let mut next = BytesMut::new();
        next.put_u8(CLIENT_MSG_POINTER_EVENT);
        next.put_u8(0);
        next.put_u16(1);
        next.put_u16(2);
        client2.write_all(&next).await.unwrap();
        let msg = read_client_message(&mut server2, &mut FramingBuffer::new()).await.unwrap();
        assert_eq!(msg, ClientMessage::PointerEvent { button_mask: 0, x: 1, y: 2 });
    }
}
