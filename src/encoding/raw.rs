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

//! Raw encoding: `width * height` pixel words, row-major, in the
//! connection's negotiated pixel format. Simplest, universally supported,
//! and the highest-bandwidth encoding in scope.

use super::Encoding;
use crate::message::ENCODING_RAW;
use crate::pixel::PixelFormat;
use bytes::BytesMut;

/// Implements the VNC "Raw" encoding.
pub struct RawEncoding;

impl Encoding for RawEncoding {
    fn tag(&self) -> i32 {
        ENCODING_RAW
    }

    fn encode(&self, pixels: &[(u8, u8, u8)], _width: u16, _height: u16, format: &PixelFormat) -> BytesMut {
        let mut buf = BytesMut::with_capacity(pixels.len() * format.bytes_per_pixel());
        for &(r, g, b) in pixels {
            format.write_rgb(&mut buf, r, g, b);
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_width_times_height_pixel_words() {
        let format = PixelFormat::server_default();
        let pixels = vec![(1, 2, 3); 20 * 20];
        let encoded = RawEncoding.encode(&pixels, 20, 20, &format);
        assert_eq!(encoded.len(), 20 * 20 * format.bytes_per_pixel());
    }
}
