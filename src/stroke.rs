// Stroke interpolation and the input batching queue.
//
// Pointer-move events can fire much faster than the display refreshes, and
// sampled positions can be farther apart than the brush diameter. Both
// problems are solved here: moves are captured as `Segment`s into a FIFO and
// rasterized later in one render-loop drain, and each segment is expanded to
// the full Bresenham line between its endpoints so stamping leaves no gaps.

use std::collections::VecDeque;

use crate::types::{Segment, Tool};

/// Integer grid points on the 8-connected line from (x0,y0) to (x1,y1).
///
/// Classic integer error-accumulation stepping. Both endpoints are included
/// exactly once, the walk is monotonic along the dominant axis, and no cell
/// is skipped. A degenerate segment yields the single point (x0,y0), so a
/// tap still stamps a dot. Pure function: same inputs, same sequence.
pub fn line_points(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let (mut x, mut y) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut pts = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        pts.push((x, y));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    pts
}

/// FIFO of captured stroke segments plus the gesture state machine.
///
/// Pointer handlers only enqueue; the render loop's drain is the only code
/// that rasterizes. A segment's *rendering* may be deferred across skipped
/// frames, its *effect* is never dropped.
pub struct StrokeQueue {
    segments: VecDeque<Segment>,
    /// Some(last sampled point) while a gesture is active.
    anchor: Option<(i32, i32)>,
}

impl StrokeQueue {
    pub fn new() -> Self {
        Self {
            segments: VecDeque::new(),
            anchor: None,
        }
    }

    /// Begin a gesture at (x, y). Enqueues the zero-length segment so a
    /// single tap paints a dot.
    pub fn pointer_down(&mut self, x: i32, y: i32, tool: Tool) {
        self.anchor = Some((x, y));
        self.segments.push_back(Segment {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
            tool,
        });
    }

    /// Continue the active gesture to (x, y). Ignored when no gesture is
    /// active (stray moves with the button up).
    pub fn pointer_move(&mut self, x: i32, y: i32, tool: Tool) {
        let Some((px, py)) = self.anchor else {
            return;
        };
        if (px, py) == (x, y) {
            return; // same cell as the last sample; nothing new to cover
        }
        self.segments.push_back(Segment {
            x0: px,
            y0: py,
            x1: x,
            y1: y,
            tool,
        });
        self.anchor = Some((x, y));
    }

    /// End the gesture. Already-queued segments stay queued.
    pub fn pointer_up(&mut self) {
        self.anchor = None;
    }

    pub fn is_drawing(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Take every pending segment, oldest first. The queue is empty after.
    pub fn drain(&mut self) -> impl Iterator<Item = Segment> + '_ {
        self.segments.drain(..)
    }
}

impl Default for StrokeQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_to_itself_is_one_point() {
        assert_eq!(line_points(7, -3, 7, -3), vec![(7, -3)]);
    }

    #[test]
    fn endpoints_appear_exactly_once() {
        for &(x0, y0, x1, y1) in &[(0, 0, 10, 3), (5, 5, -2, 9), (3, 8, 3, -1), (-4, 2, 6, 2)] {
            let pts = line_points(x0, y0, x1, y1);
            assert_eq!(pts.first(), Some(&(x0, y0)));
            assert_eq!(pts.last(), Some(&(x1, y1)));
            assert_eq!(pts.iter().filter(|&&p| p == (x0, y0)).count(), 1);
            assert_eq!(pts.iter().filter(|&&p| p == (x1, y1)).count(), 1);
        }
    }

    #[test]
    fn consecutive_points_are_8_connected() {
        for &(x0, y0, x1, y1) in &[
            (0, 0, 100, 7),
            (0, 0, 7, 100),
            (50, 50, -30, -90),
            (10, 0, 0, 10),
            (0, 0, 1, 0),
        ] {
            let pts = line_points(x0, y0, x1, y1);
            for w in pts.windows(2) {
                let (ax, ay) = w[0];
                let (bx, by) = w[1];
                assert!((ax - bx).abs() <= 1 && (ay - by).abs() <= 1, "gap in {w:?}");
                assert_ne!(w[0], w[1]);
            }
        }
    }

    #[test]
    fn monotonic_along_dominant_axis() {
        let pts = line_points(0, 0, 40, 13);
        for w in pts.windows(2) {
            assert_eq!(w[1].0 - w[0].0, 1); // x strictly advances
        }
        let pts = line_points(3, 20, 8, -20);
        for w in pts.windows(2) {
            assert_eq!(w[1].1 - w[0].1, -1); // y strictly descends
        }
    }

    #[test]
    fn deterministic_and_restartable() {
        assert_eq!(line_points(2, 3, 31, 17), line_points(2, 3, 31, 17));
    }

    #[test]
    fn gesture_protocol_builds_fifo() {
        let mut q = StrokeQueue::new();
        q.pointer_move(9, 9, Tool::Paint); // no gesture yet: ignored
        assert!(q.is_empty());

        q.pointer_down(1, 1, Tool::Paint);
        q.pointer_move(4, 1, Tool::Paint);
        q.pointer_move(4, 5, Tool::Erase);
        q.pointer_up();
        q.pointer_move(20, 20, Tool::Paint); // after up: ignored

        let segs: Vec<_> = q.drain().collect();
        assert!(q.is_empty());
        assert_eq!(segs.len(), 3);
        // Tap dot first, then chained segments in capture order.
        assert_eq!((segs[0].x0, segs[0].y0, segs[0].x1, segs[0].y1), (1, 1, 1, 1));
        assert_eq!((segs[1].x0, segs[1].y0, segs[1].x1, segs[1].y1), (1, 1, 4, 1));
        assert_eq!((segs[2].x0, segs[2].y0, segs[2].x1, segs[2].y1), (4, 1, 4, 5));
        assert_eq!(segs[2].tool, Tool::Erase);
    }

    #[test]
    fn pointer_up_keeps_queued_segments() {
        let mut q = StrokeQueue::new();
        q.pointer_down(0, 0, Tool::Paint);
        q.pointer_move(5, 0, Tool::Paint);
        q.pointer_up();
        assert!(!q.is_empty());
        assert_eq!(q.drain().count(), 2);
    }
}
