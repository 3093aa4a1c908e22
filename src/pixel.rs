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

//! The RFB `PixelFormat` record and color conversion.
//!
//! Conversion formula: `channel_out = ((channel_in * (max + 1)) >> 8) <<
//! shift`, then the three channel words are OR'd together. For the server's
//! default format (bpp=32, shifts 16/8/0, max=255) this reduces exactly to
//! `(r << 16) | (g << 8) | b`.

use crate::error::{Result, VncError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Wire size of a `PixelFormat` record, in bytes.
pub const WIRE_LEN: usize = 16;

/// A client-negotiable description of how a pixel value is laid out on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    /// Bits per pixel: 8, 16, or 32.
    pub bits_per_pixel: u8,
    /// Color depth: bits actually used, `<= bits_per_pixel`.
    pub depth: u8,
    /// `true` if multi-byte pixel words are big-endian on the wire.
    pub big_endian: bool,
    /// `true` for true-color (palette mode is not supported by this core).
    pub true_colour: bool,
    /// Maximum red value, i.e. `(1 << red_bits) - 1`.
    pub red_max: u16,
    /// Maximum green value.
    pub green_max: u16,
    /// Maximum blue value.
    pub blue_max: u16,
    /// Left-shift applied to the red channel.
    pub red_shift: u8,
    /// Left-shift applied to the green channel.
    pub green_shift: u8,
    /// Left-shift applied to the blue channel.
    pub blue_shift: u8,
}

impl PixelFormat {
    /// The server's default advertised format: 32bpp, depth 24, big-endian,
    /// true-color, shifts 16/8/0, max 255/255/255.
    #[must_use]
    pub fn server_default() -> Self {
        Self {
            bits_per_pixel: 32,
            depth: 24,
            big_endian: true,
            true_colour: true,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        }
    }

    /// Number of bytes a single pixel word occupies on the wire.
    #[must_use]
    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel as usize / 8
    }

    /// Validates the invariant that `red_shift`, `green_shift`, `blue_shift`
    /// and the `*_max` values fit within `bits_per_pixel` without overlap.
    ///
    /// # Errors
    ///
    /// Returns [`VncError::ProtocolViolation`] if the format is malformed:
    /// an unsupported `bits_per_pixel`, a depth exceeding it, or channel
    /// bit ranges that overlap or spill past `bits_per_pixel`.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.bits_per_pixel, 8 | 16 | 32) {
            return Err(VncError::ProtocolViolation(format!(
                "unsupported bits_per_pixel: {}",
                self.bits_per_pixel
            )));
        }
        if self.depth == 0 || self.depth > self.bits_per_pixel {
            return Err(VncError::ProtocolViolation(format!(
                "depth {} does not fit in {} bpp",
                self.depth, self.bits_per_pixel
            )));
        }
        if !self.true_colour {
            return Err(VncError::ProtocolViolation(
                "palette mode is not supported".to_string(),
            ));
        }

        let channels = [
            (self.red_shift, self.red_max),
            (self.green_shift, self.green_max),
            (self.blue_shift, self.blue_max),
        ];

        let mut occupied: u64 = 0;
        for (shift, max) in channels {
            let bits = bits_needed(max);
            if shift as u32 + bits > self.bits_per_pixel as u32 {
                return Err(VncError::ProtocolViolation(format!(
                    "channel shift {shift} + {bits} bits exceeds {} bpp",
                    self.bits_per_pixel
                )));
            }
            let mask: u64 = if bits == 0 { 0 } else { ((1u64 << bits) - 1) << shift };
            if occupied & mask != 0 {
                return Err(VncError::ProtocolViolation(
                    "channel bit ranges overlap".to_string(),
                ));
            }
            occupied |= mask;
        }

        Ok(())
    }

    /// Converts an internal 8-bit-per-channel RGB triple into the wire
    /// pixel word for this format.
    #[must_use]
    pub fn pixel_word(&self, r: u8, g: u8, b: u8) -> u32 {
        let channel = |value: u8, max: u16, shift: u8| -> u32 {
            (((value as u32) * (max as u32 + 1)) >> 8) << shift
        };
        channel(r, self.red_max, self.red_shift)
            | channel(g, self.green_max, self.green_shift)
            | channel(b, self.blue_max, self.blue_shift)
    }

    /// Writes a previously computed pixel word in this format's byte order.
    /// The 8-bit case ignores endianness.
    pub fn write_pixel(&self, buf: &mut BytesMut, word: u32) {
        match self.bits_per_pixel {
            8 => buf.put_u8(word as u8),
            16 => {
                if self.big_endian {
                    buf.put_u16(word as u16);
                } else {
                    buf.put_u16_le(word as u16);
                }
            }
            32 => {
                if self.big_endian {
                    buf.put_u32(word);
                } else {
                    buf.put_u32_le(word);
                }
            }
            _ => unreachable!("bits_per_pixel validated to be 8, 16, or 32"),
        }
    }

    /// Convenience: converts and writes an RGB triple in one step.
    pub fn write_rgb(&self, buf: &mut BytesMut, r: u8, g: u8, b: u8) {
        let word = self.pixel_word(r, g, b);
        self.write_pixel(buf, word);
    }

    /// Serializes this `PixelFormat` as the 16-byte wire record.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.bits_per_pixel);
        buf.put_u8(self.depth);
        buf.put_u8(u8::from(self.big_endian));
        buf.put_u8(u8::from(self.true_colour));
        buf.put_u16(self.red_max);
        buf.put_u16(self.green_max);
        buf.put_u16(self.blue_max);
        buf.put_u8(self.red_shift);
        buf.put_u8(self.green_shift);
        buf.put_u8(self.blue_shift);
        buf.put_bytes(0, 3); // reserved padding
    }

    /// Parses a 16-byte wire record. Does not validate the invariant;
    /// call [`validate`](Self::validate) separately so callers can choose
    /// how to react to a malformed client-sent format.
    ///
    /// # Errors
    ///
    /// Returns [`VncError::ProtocolViolation`] if fewer than 16 bytes are
    /// available.
    pub fn read_from(buf: &mut Bytes) -> Result<Self> {
        if buf.len() < WIRE_LEN {
            return Err(VncError::ProtocolViolation(
                "truncated PixelFormat".to_string(),
            ));
        }
        let pf = Self {
            bits_per_pixel: buf.get_u8(),
            depth: buf.get_u8(),
            big_endian: buf.get_u8() != 0,
            true_colour: buf.get_u8() != 0,
            red_max: buf.get_u16(),
            green_max: buf.get_u16(),
            blue_max: buf.get_u16(),
            red_shift: buf.get_u8(),
            green_shift: buf.get_u8(),
            blue_shift: buf.get_u8(),
        };
        buf.advance(3); // reserved padding
        Ok(pf)
    }
}

/// Minimum bits needed to represent values `0..=max`.
fn bits_needed(max: u16) -> u32 {
    if max == 0 {
        0
    } else {
        16 - max.leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_all_fields() {
        let pf = PixelFormat::server_default();
        let mut buf = BytesMut::new();
        pf.write_to(&mut buf);
        assert_eq!(buf.len(), WIRE_LEN);

        let mut bytes = buf.freeze();
        let decoded = PixelFormat::read_from(&mut bytes).unwrap();
        assert_eq!(pf, decoded);
    }

    #[test]
    fn server_default_conversion_matches_spec_formula() {
        let pf = PixelFormat::server_default();
        for r in [0u8, 1, 17, 128, 254, 255] {
            for g in [0u8, 33, 200] {
                for b in [0u8, 64, 255] {
                    let word = pf.pixel_word(r, g, b);
                    let expected = ((r as u32) << 16) | ((g as u32) << 8) | (b as u32);
                    assert_eq!(word, expected, "r={r} g={g} b={b}");
                }
            }
        }
    }

    #[test]
    fn fits_in_bpp_for_any_rgb_and_any_valid_format() {
        let formats = [
            PixelFormat::server_default(),
            PixelFormat {
                bits_per_pixel: 16,
                depth: 16,
                big_endian: false,
                true_colour: true,
                red_max: 31,
                green_max: 63,
                blue_max: 31,
                red_shift: 11,
                green_shift: 5,
                blue_shift: 0,
            },
            PixelFormat {
                bits_per_pixel: 8,
                depth: 8,
                big_endian: false,
                true_colour: true,
                red_max: 7,
                green_max: 7,
                blue_max: 3,
                red_shift: 0,
                green_shift: 3,
                blue_shift: 6,
            },
        ];
        for pf in formats {
            pf.validate().unwrap();
            for r in 0..=255u8 {
                let word = pf.pixel_word(r, 255 - r, r / 2);
                assert!(u64::from(word) < (1u64 << pf.bits_per_pixel));
            }
        }
    }

    #[test]
    fn rgb565_white_is_0xffff() {
        let pf = PixelFormat {
            bits_per_pixel: 16,
            depth: 16,
            big_endian: false,
            true_colour: true,
            red_max: 31,
            green_max: 63,
            blue_max: 31,
            red_shift: 11,
            green_shift: 5,
            blue_shift: 0,
        };
        let mut buf = BytesMut::new();
        pf.write_rgb(&mut buf, 0xFF, 0xFF, 0xFF);
        assert_eq!(&buf[..], &[0xFF, 0xFF]); // LSB-first
    }

    #[test]
    fn overlapping_shifts_are_rejected() {
        let pf = PixelFormat {
            bits_per_pixel: 16,
            depth: 16,
            big_endian: false,
            true_colour: true,
            red_max: 255, // needs 8 bits at shift 0 -> occupies bits 0..8
            green_max: 255,
            blue_max: 31,
            red_shift: 0,
            green_shift: 4, // overlaps red's bit range
            blue_shift: 11,
        };
        assert!(pf.validate().is_err());
    }

    #[test]
    fn bpp_not_in_8_16_32_is_rejected() {
        let mut pf = PixelFormat::server_default();
        pf.bits_per_pixel = 24;
        assert!(pf.validate().is_err());
    }
}
