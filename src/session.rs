// Per-image editing state, gathered in one place instead of module globals.
//
// `EditorSession` owns everything mutable for the image being edited: the
// authoritative overlay, the stroke queue, the active tool and brush radius.
// Input handlers go through `pointer_*` (enqueue only); `apply_pending` is
// the single writer that actually mutates the overlay. That split is what
// makes the ordering guarantee testable: N segments enqueued, one drain,
// same result as N sequential stamp passes.

use log::debug;

use crate::raster::MaskOverlay;
use crate::stroke::{line_points, StrokeQueue};
use crate::types::Tool;

/// Brush radius bounds, in pixels.
pub const MIN_BRUSH: i32 = 2;
pub const MAX_BRUSH: i32 = 25;
/// Radius a fresh session starts with.
pub const DEFAULT_BRUSH: i32 = 5;

pub struct EditorSession {
    overlay: MaskOverlay,
    queue: StrokeQueue,
    tool: Tool,
    brush_radius: i32,
    /// Server-side filename of the mask being edited.
    filename: String,
    /// True when the overlay differs from the last successful save.
    dirty: bool,
    /// Bumped on every overlay mutation; lets an async save tell whether the
    /// buffer moved on while the transfer was in flight.
    revision: u64,
}

impl EditorSession {
    /// Start editing `overlay` (decoded mask, or fully transparent when the
    /// image had no prior mask).
    pub fn new(filename: String, overlay: MaskOverlay) -> Self {
        Self {
            overlay,
            queue: StrokeQueue::new(),
            tool: Tool::Paint,
            brush_radius: DEFAULT_BRUSH,
            filename,
            dirty: false,
            revision: 0,
        }
    }

    pub fn overlay(&self) -> &MaskOverlay {
        &self.overlay
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn toggle_tool(&mut self) {
        self.tool = self.tool.toggled();
        debug!("tool -> {:?}", self.tool);
    }

    pub fn brush_radius(&self) -> i32 {
        self.brush_radius
    }

    /// Set the brush radius, silently clamped to [MIN_BRUSH, MAX_BRUSH].
    /// Takes effect for future stamps only.
    pub fn set_brush_radius(&mut self, radius: i32) {
        self.brush_radius = radius.clamp(MIN_BRUSH, MAX_BRUSH);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current mutation counter. Capture it when snapshotting for a save.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Clear the dirty flag only if nothing was stamped since `revision` was
    /// captured; strokes made during an in-flight save stay marked unsaved.
    pub fn mark_saved_at(&mut self, revision: u64) {
        if self.revision == revision {
            self.dirty = false;
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.queue.is_drawing()
    }

    pub fn pointer_down(&mut self, x: i32, y: i32) {
        self.queue.pointer_down(x, y, self.tool);
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        self.queue.pointer_move(x, y, self.tool);
    }

    pub fn pointer_up(&mut self) {
        self.queue.pointer_up();
    }

    /// Reset the mask to fully unpainted (the "clear" action).
    pub fn clear_mask(&mut self) {
        self.overlay.clear();
        self.dirty = true;
        self.revision += 1;
    }

    /// Drain the queue and rasterize every pending segment, in FIFO order,
    /// interpolating each so the stroke has no gaps. Returns true when
    /// anything was stamped (callers use this to decide whether the display
    /// baseline changed).
    pub fn apply_pending(&mut self) -> bool {
        let radius = self.brush_radius;
        let mut stamped = 0usize;
        for seg in self.queue.drain() {
            for (x, y) in line_points(seg.x0, seg.y0, seg.x1, seg.y1) {
                self.overlay.stamp(x, y, radius, seg.tool);
                stamped += 1;
            }
        }
        if stamped > 0 {
            self.dirty = true;
            self.revision += 1;
            debug!("drained queue: {stamped} stamps");
        }
        stamped > 0
    }
}
