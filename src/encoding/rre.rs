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

//! RRE (Rise-and-Run-length Encoding): a background pixel plus a list of
//! solid-color subrectangles. The degenerate case used by this core's
//! reference scene — a single solid-color rectangle — encodes as zero
//! subrectangles and just the background word.

use super::common::{background_color, find_subrects};
use super::Encoding;
use crate::message::ENCODING_RRE;
use crate::pixel::PixelFormat;
use bytes::{BufMut, BytesMut};

/// Implements the VNC "RRE" encoding.
///
/// Wire layout: `sub-rect-count(u32)` `background pixel word` then, per
/// subrectangle, `pixel word` `x(u16)` `y(u16)` `w(u16)` `h(u16)`.
pub struct RreEncoding;

impl Encoding for RreEncoding {
    fn tag(&self) -> i32 {
        ENCODING_RRE
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode(&self, pixels: &[(u8, u8, u8)], width: u16, height: u16, format: &PixelFormat) -> BytesMut {
        let bg = background_color(pixels);
        let subrects = find_subrects(pixels, width as usize, height as usize, bg);

        let word_size = format.bytes_per_pixel();
        let mut buf = BytesMut::with_capacity(4 + word_size + subrects.len() * (word_size + 8));

        buf.put_u32(subrects.len() as u32);
        format.write_rgb(&mut buf, bg.0, bg.1, bg.2);

        for subrect in &subrects {
            format.write_rgb(&mut buf, subrect.color.0, subrect.color.1, subrect.color.2);
            buf.put_u16(subrect.x);
            buf.put_u16(subrect.y);
            buf.put_u16(subrect.w);
            buf.put_u16(subrect.h);
        }

        buf
    }
}
