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

//! RFB message envelopes: constants, and the client/server message
//! structures that sit above the framing buffer and below the session
//! state machine.
//!
//! Every multi-byte field on the wire is big-endian; structures here are
//! explicit byte-offset read/write routines rather than packed records,
//! per the reference implementation's own design note about avoiding
//! compiler-specific packing.

use crate::error::{Result, VncError};
use crate::pixel::PixelFormat;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// The protocol version banner this server advertises and expects, per
/// the RFB 3.3 dialect this core targets.
pub const PROTOCOL_VERSION: &[u8; 12] = b"RFB 003.003\n";

// Client-to-server message types.
/// `SetPixelFormat`.
pub const CLIENT_MSG_SET_PIXEL_FORMAT: u8 = 0;
/// `SetEncodings`.
pub const CLIENT_MSG_SET_ENCODINGS: u8 = 2;
/// `FramebufferUpdateRequest`.
pub const CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST: u8 = 3;
/// `KeyEvent`.
pub const CLIENT_MSG_KEY_EVENT: u8 = 4;
/// `PointerEvent`.
pub const CLIENT_MSG_POINTER_EVENT: u8 = 5;
/// `ClientCutText`.
pub const CLIENT_MSG_CLIENT_CUT_TEXT: u8 = 6;

// Server-to-client message types.
/// `FramebufferUpdate`.
pub const SERVER_MSG_FRAMEBUFFER_UPDATE: u8 = 0;

// Encodings in scope for this core (Non-goal: all other encodings).
/// Raw pixel data, row-major.
pub const ENCODING_RAW: i32 = 0;
/// Rise-and-Run-length Encoding.
pub const ENCODING_RRE: i32 = 2;

// Security types.
/// No authentication.
pub const SECURITY_TYPE_NONE: u8 = 1;

/// Maximum `ClientCutText` payload this server accepts before treating the
/// request as unsupported rather than allocating unbounded memory for it.
pub const MAX_CUT_TEXT: usize = 10 * 1024 * 1024;

/// Decoded client-to-server messages, scoped to the six types this core
/// handles.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Client requests a new pixel format for subsequent updates.
    SetPixelFormat(PixelFormat),
    /// Client lists supported encodings, in preference order.
    SetEncodings(Vec<i32>),
    /// Client requests a framebuffer update for a region.
    FramebufferUpdateRequest {
        /// Hint that only changes since the last update are wanted. This
        /// core records the hint but always emits full rectangles.
        incremental: bool,
        /// Left edge of the requested region.
        x: u16,
        /// Top edge of the requested region.
        y: u16,
        /// Width of the requested region.
        width: u16,
        /// Height of the requested region.
        height: u16,
    },
    /// A key press or release.
    KeyEvent {
        /// `true` if pressed, `false` if released.
        down: bool,
        /// X Window System keysym.
        key: u32,
    },
    /// A pointer (mouse) movement or button change.
    PointerEvent {
        /// Bitmask of currently pressed buttons.
        button_mask: u8,
        /// X coordinate.
        x: u16,
        /// Y coordinate.
        y: u16,
    },
    /// Clipboard text from the client.
    ClientCutText(String),
}

/// Reads the fixed-length tail of `SetPixelFormat` (19 bytes: 3 padding +
/// 16-byte `PixelFormat`) after the message-type byte has already been
/// consumed.
pub fn decode_set_pixel_format(mut tail: Bytes) -> Result<ClientMessage> {
    tail.advance(3); // padding
    let format = PixelFormat::read_from(&mut tail)?;
    Ok(ClientMessage::SetPixelFormat(format))
}

/// Reads the fixed-length tail of `FramebufferUpdateRequest` (9 bytes).
pub fn decode_framebuffer_update_request(mut tail: Bytes) -> ClientMessage {
    let incremental = tail.get_u8() != 0;
    let x = tail.get_u16();
    let y = tail.get_u16();
    let width = tail.get_u16();
    let height = tail.get_u16();
    ClientMessage::FramebufferUpdateRequest {
        incremental,
        x,
        y,
        width,
        height,
    }
}

/// Reads the fixed-length tail of `KeyEvent` (7 bytes: 1 down + 2 padding +
/// 4-byte key).
pub fn decode_key_event(mut tail: Bytes) -> ClientMessage {
    let down = tail.get_u8() != 0;
    tail.advance(2); // padding
    let key = tail.get_u32();
    ClientMessage::KeyEvent { down, key }
}

/// Reads the fixed-length tail of `PointerEvent` (5 bytes).
pub fn decode_pointer_event(mut tail: Bytes) -> ClientMessage {
    let button_mask = tail.get_u8();
    let x = tail.get_u16();
    let y = tail.get_u16();
    ClientMessage::PointerEvent { button_mask, x, y }
}

/// Reads the length-prefixed `count` field of `SetEncodings`'s header (the
/// 1 padding + `u16` count), to be followed by a second framing step that
/// reads `count * 4` bytes.
pub fn decode_set_encodings_header(mut header: Bytes) -> usize {
    header.advance(1); // padding
    header.get_u16() as usize
}

/// Reads the `count * 4` byte tail of `SetEncodings` once its header has
/// announced `count`.
pub fn decode_set_encodings_tail(mut tail: Bytes, count: usize) -> ClientMessage {
    let mut encodings = Vec::with_capacity(count);
    for _ in 0..count {
        encodings.push(tail.get_i32());
    }
    ClientMessage::SetEncodings(encodings)
}

/// Reads the `length` field of `ClientCutText`'s header (3 padding + `u32`
/// length) without judging it against [`MAX_CUT_TEXT`]. The caller still
/// needs this value to drain the right number of tail bytes even when
/// [`decode_client_cut_text_header`] rejects the request as oversized.
pub fn raw_client_cut_text_length(mut header: Bytes) -> usize {
    header.advance(3); // padding
    header.get_u32() as usize
}

/// Reads the length-prefixed header of `ClientCutText` (3 padding + `u32`
/// length), to be followed by a second framing step reading `length`
/// bytes.
///
/// # Errors
///
/// Returns [`VncError::Unsupported`] if `length` exceeds [`MAX_CUT_TEXT`].
/// The request is recoverable, but its payload must still be drained from
/// the stream with [`raw_client_cut_text_length`] before the session can
/// continue — an oversized request is a policy rejection, not a framing
/// desync.
pub fn decode_client_cut_text_header(header: Bytes) -> Result<usize> {
    let length = raw_client_cut_text_length(header);
    if length > MAX_CUT_TEXT {
        return Err(VncError::Unsupported(format!(
            "ClientCutText length {length} exceeds {MAX_CUT_TEXT}"
        )));
    }
    Ok(length)
}

/// Reads the `length`-byte tail of `ClientCutText` once its header has
/// announced `length`.
pub fn decode_client_cut_text_tail(tail: Bytes) -> ClientMessage {
    ClientMessage::ClientCutText(String::from_utf8_lossy(&tail).into_owned())
}

/// The `ServerInit` message: sent once, after `ClientInit`.
#[derive(Debug, Clone)]
pub struct ServerInit {
    /// Framebuffer width.
    pub width: u16,
    /// Framebuffer height.
    pub height: u16,
    /// The pixel format the server initially advertises.
    pub pixel_format: PixelFormat,
    /// Desktop name, sent as a length-prefixed UTF-8 string.
    pub name: String,
}

impl ServerInit {
    /// Serializes `ServerInit` as `width | height | format | name_len |
    /// name`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.width);
        buf.put_u16(self.height);
        self.pixel_format.write_to(buf);
        let name_bytes = self.name.as_bytes();
        buf.put_u32(name_bytes.len() as u32);
        buf.put_slice(name_bytes);
    }
}

/// A server-generated update region header, as it appears at the start of
/// each rectangle within a `FramebufferUpdate`.
#[derive(Debug, Clone, Copy)]
pub struct RectangleHeader {
    /// Left edge.
    pub x: u16,
    /// Top edge.
    pub y: u16,
    /// Width.
    pub width: u16,
    /// Height.
    pub height: u16,
    /// Encoding tag for the payload that follows.
    pub encoding: i32,
}

impl RectangleHeader {
    /// Writes `x | y | width | height | encoding`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.x);
        buf.put_u16(self.y);
        buf.put_u16(self.width);
        buf.put_u16(self.height);
        buf.put_i32(self.encoding);
    }
}

/// Writes the `FramebufferUpdate` message header: message type, padding,
/// and rectangle count. Callers append each rectangle's header and payload
/// themselves.
pub fn write_framebuffer_update_header(buf: &mut BytesMut, rectangle_count: u16) {
    buf.put_u8(SERVER_MSG_FRAMEBUFFER_UPDATE);
    buf.put_u8(0); // padding
    buf.put_u16(rectangle_count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_pixel_format_round_trips() {
        let format = PixelFormat::server_default();
        let mut buf = BytesMut::new();
        buf.put_bytes(0, 3);
        format.write_to(&mut buf);

        let decoded = decode_set_pixel_format(buf.freeze()).unwrap();
        assert_eq!(decoded, ClientMessage::SetPixelFormat(format));
    }

    #[test]
    fn framebuffer_update_request_round_trips() {
        let mut buf = BytesMut::new();
        buf.put_u8(1);
        buf.put_u16(0);
        buf.put_u16(0);
        buf.put_u16(500);
        buf.put_u16(500);

        let decoded = decode_framebuffer_update_request(buf.freeze());
        assert_eq!(
            decoded,
            ClientMessage::FramebufferUpdateRequest {
                incremental: true,
                x: 0,
                y: 0,
                width: 500,
                height: 500,
            }
        );
    }

    #[test]
    fn set_encodings_header_then_tail() {
        // 02 00 00 03 00 00 00 00 00 00 00 02 00 00 00 05
        let mut header = BytesMut::new();
        header.put_u8(0); // padding
        header.put_u16(3); // count
        let count = decode_set_encodings_header(header.freeze());
        assert_eq!(count, 3);

        let mut tail = BytesMut::new();
        tail.put_i32(0);
        tail.put_i32(2);
        tail.put_i32(5);
        let decoded = decode_set_encodings_tail(tail.freeze(), count);
        assert_eq!(decoded, ClientMessage::SetEncodings(vec![0, 2, 5]));
    }

    #[test]
    fn cut_text_header_rejects_oversized_length() {
        let mut header = BytesMut::new();
        header.put_bytes(0, 3);
        header.put_u32((MAX_CUT_TEXT + 1) as u32);
        let err = decode_client_cut_text_header(header.freeze()).unwrap_err();
        assert!(matches!(err, VncError::Unsupported(_)));
    }

    #[test]
    fn server_init_has_expected_layout() {
        let init = ServerInit {
            width: 500,
            height: 500,
            pixel_format: PixelFormat::server_default(),
            name: "Anton's Test Server".to_string(),
        };
        let mut buf = BytesMut::new();
        init.write_to(&mut buf);

        assert_eq!(&buf[0..2], &500u16.to_be_bytes());
        assert_eq!(&buf[2..4], &500u16.to_be_bytes());
        assert_eq!(buf.len(), 4 + 16 + 4 + "Anton's Test Server".len());
    }
}
