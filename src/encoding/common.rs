//! Helpers shared by the encodings in scope (Raw, RRE): grouping a
//! rectangle of internal 8-bit-per-channel RGB pixels into a background
//! color plus same-color subrectangles.

use std::collections::HashMap;

/// A same-color subrectangle found within a larger rectangle, in internal
/// RGB (pre pixel-format-conversion).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subrect {
    /// Color of this subrectangle.
    pub color: (u8, u8, u8),
    /// Left edge, relative to the containing rectangle.
    pub x: u16,
    /// Top edge, relative to the containing rectangle.
    pub y: u16,
    /// Width.
    pub w: u16,
    /// Height.
    pub h: u16,
}

fn pack(color: (u8, u8, u8)) -> u32 {
    (color.0 as u32) << 16 | (color.1 as u32) << 8 | color.2 as u32
}

/// Finds the most common color in `pixels`, used as an RRE background.
/// Returns black for an empty slice.
#[must_use]
pub fn background_color(pixels: &[(u8, u8, u8)]) -> (u8, u8, u8) {
    if pixels.is_empty() {
        return (0, 0, 0);
    }
    let mut counts: HashMap<u32, (usize, (u8, u8, u8))> = HashMap::new();
    for &p in pixels {
        let entry = counts.entry(pack(p)).or_insert((0, p));
        entry.0 += 1;
    }
    counts
        .into_values()
        .max_by_key(|(count, _)| *count)
        .map(|(_, color)| color)
        .unwrap_or(pixels[0])
}

/// Finds maximal same-color rectangles covering every pixel that differs
/// from `bg`. A greedy row-then-column scan, same shape as libvncserver's
/// reference RRE encoder: grow each new run as wide as possible, then as
/// tall as possible at that width.
#[must_use]
pub fn find_subrects(
    pixels: &[(u8, u8, u8)],
    width: usize,
    height: usize,
    bg: (u8, u8, u8),
) -> Vec<Subrect> {
    let mut subrects = Vec::new();
    let mut marked = vec![false; pixels.len()];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if marked[idx] || pixels[idx] == bg {
                continue;
            }
            let color = pixels[idx];

            let mut max_w = 0;
            for tx in x..width {
                let tidx = y * width + tx;
                if marked[tidx] || pixels[tidx] != color {
                    break;
                }
                max_w = tx - x + 1;
            }

            let mut h = 1;
            'grow: for ty in (y + 1)..height {
                for tx in x..(x + max_w) {
                    let tidx = ty * width + tx;
                    if marked[tidx] || pixels[tidx] != color {
                        break 'grow;
                    }
                }
                h = ty - y + 1;
            }

            for dy in 0..h {
                for dx in 0..max_w {
                    marked[(y + dy) * width + (x + dx)] = true;
                }
            }

            subrects.push(Subrect {
                color,
                x: x as u16,
                y: y as u16,
                w: max_w as u16,
                h: h as u16,
            });
        }
    }

    subrects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_color_is_the_most_common_pixel() {
        let pixels = vec![(1, 1, 1), (1, 1, 1), (2, 2, 2)];
        assert_eq!(background_color(&pixels), (1, 1, 1));
    }

    #[test]
    fn solid_rectangle_yields_no_subrects() {
        let pixels = vec![(5, 5, 5); 4 * 4];
        let subrects = find_subrects(&pixels, 4, 4, (5, 5, 5));
        assert!(subrects.is_empty());
    }

    #[test]
    fn single_foreign_pixel_becomes_one_subrect() {
        let mut pixels = vec![(0, 0, 0); 9]; // 3x3
        pixels[4] = (255, 0, 0); // center
        let subrects = find_subrects(&pixels, 3, 3, (0, 0, 0));
        assert_eq!(subrects.len(), 1);
        assert_eq!(
            subrects[0],
            Subrect { color: (255, 0, 0), x: 1, y: 1, w: 1, h: 1 }
        );
    }
}
