// Core types shared across the editor.

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// All-black buffer of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u32; width * height],
        }
    }
}

/// Active brush mode. Paint writes the opaque overlay value, erase clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Paint,
    Erase,
}

impl Tool {
    pub fn toggled(self) -> Self {
        match self {
            Tool::Paint => Tool::Erase,
            Tool::Erase => Tool::Paint,
        }
    }
}

/// One captured piece of a gesture: the pointer moved from (x0,y0) to (x1,y1)
/// with `tool` active. Zero-length segments are valid (a single tap).
/// Created by the input handlers, consumed exactly once by the render loop's
/// drain; never reordered (later strokes must land on top of earlier ones).
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub tool: Tool,
}
