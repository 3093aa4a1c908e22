//! Pixel-rectangle encodings in scope for this core: Raw and RRE.
//!
//! Non-goal: every other RFB encoding (CopyRect, CoRRE, Hextile, Tight,
//! ZRLE, …) — the dispatch table is deliberately narrowed to these two.

pub mod common;
pub mod raw;
pub mod rre;

pub use raw::RawEncoding;
pub use rre::RreEncoding;

use crate::message::{ENCODING_RAW, ENCODING_RRE};
use crate::pixel::PixelFormat;
use bytes::BytesMut;

/// Encodes a rectangle of internal 8-bit-per-channel RGB pixels into a
/// VNC-wire-compatible byte stream.
pub trait Encoding: Send + Sync {
    /// The `i32` encoding tag this implementation writes into the
    /// rectangle header.
    fn tag(&self) -> i32;

    /// Encodes `pixels` (row-major, `width * height` long) using `format`.
    fn encode(&self, pixels: &[(u8, u8, u8)], width: u16, height: u16, format: &PixelFormat) -> BytesMut;
}

/// Looks up the encoder for `tag`, if it is one of the encodings this core
/// supports (Raw, RRE).
#[must_use]
pub fn get_encoder(tag: i32) -> Option<Box<dyn Encoding>> {
    match tag {
        ENCODING_RAW => Some(Box::new(RawEncoding)),
        ENCODING_RRE => Some(Box::new(RreEncoding)),
        _ => None,
    }
}

/// Chooses the best encoding this server supports from a client's
/// preference-ordered list, preferring RRE over Raw (the only two this
/// core implements) and falling back to Raw — which every client
/// advertising any encodings at all is required to support — when the
/// client's list names neither.
#[must_use]
pub fn select_encoding(client_encodings: &[i32]) -> i32 {
    if client_encodings.contains(&ENCODING_RRE) {
        ENCODING_RRE
    } else {
        ENCODING_RAW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_rre_when_offered() {
        assert_eq!(select_encoding(&[0, 2, 5]), ENCODING_RRE);
    }

    #[test]
    fn falls_back_to_raw() {
        assert_eq!(select_encoding(&[5, 16]), ENCODING_RAW);
    }
}
