//! The framebuffer's actual content is an external collaborator this core
//! does not implement (no real screen capture or rendering source). What
//! it needs from one is narrow: given the client's cursor position and a
//! frame counter, produce the pixels for one small rectangle to send back.
//!
//! [`DemoScene`] is the reference scene: a 20x20 rectangle at the cursor,
//! filled with a pseudo-random color each frame.

/// A source of framebuffer content for the update scheduler to encode and
/// send.
pub trait Scene: Send + Sync {
    /// Renders one rectangle's worth of content for this frame.
    ///
    /// `cursor_x`/`cursor_y` are the connection's last-known pointer
    /// position; `frame` is a monotonically increasing frame counter.
    /// Returns the rectangle's origin, size, and row-major RGB pixels.
    fn render(&mut self, cursor_x: u16, cursor_y: u16, frame: u64) -> SceneRect;
}

/// One rectangle's worth of scene content.
pub struct SceneRect {
    /// Left edge.
    pub x: u16,
    /// Top edge.
    pub y: u16,
    /// Width.
    pub width: u16,
    /// Height.
    pub height: u16,
    /// Row-major internal RGB pixels, `width * height` long.
    pub pixels: Vec<(u8, u8, u8)>,
}

/// Reference scene: a single 20x20 rectangle positioned at the current
/// cursor, filled with a pseudo-random solid color each frame.
pub struct DemoScene {
    size: u16,
}

impl DemoScene {
    /// Creates the reference scene with its default rectangle size
    /// (20x20).
    #[must_use]
    pub fn new() -> Self {
        Self { size: 20 }
    }
}

impl Default for DemoScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for DemoScene {
    fn render(&mut self, cursor_x: u16, cursor_y: u16, _frame: u64) -> SceneRect {
        let color = (rand::random::<u8>(), rand::random::<u8>(), rand::random::<u8>());
        let pixels = vec![color; self.size as usize * self.size as usize];
        SceneRect {
            x: cursor_x,
            y: cursor_y,
            width: self.size,
            height: self.size,
            pixels,
        }
    }
}
