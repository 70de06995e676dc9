// The authoritative mask buffer and the circular brush stamp.
//
// `MaskOverlay` is the ground truth for the segmentation mask, held in its
// color-overlay form (green tint, alpha scaled by OVERLAY_OPACITY). The
// window never displays it directly: each frame it is composited over the
// source image into a throwaway `FrameBuffer`, and display-only decoration
// (brush outline, HUD) is drawn after that copy so it can never end up in
// the persisted mask.

use crate::types::{FrameBuffer, Tool};

/// Fraction of full opacity used for the green overlay tint.
/// Visual: painted areas show the image through a 40% green wash.
pub const OVERLAY_OPACITY: f32 = 0.4;

/// Alpha stored for a mask strength of `v` (0..=255).
#[inline]
pub fn overlay_alpha(v: u8) -> u8 {
    (v as f32 * OVERLAY_OPACITY).round() as u8
}

/// Authoritative mask state for one image, RGBA8, row-major.
///
/// Pixel convention: G carries the mask strength (0 = unpainted, 255 = fully
/// painted, in-between = partial strength from a lossy reload), A is always
/// `overlay_alpha(G)`, R and B stay 0. A freshly painted pixel is exactly the
/// overlay tint (0, 255, 0, overlay_alpha(255)).
#[derive(Clone)]
pub struct MaskOverlay {
    width: usize,
    height: usize,
    data: Vec<u8>, // width * height * 4, RGBA
}

impl MaskOverlay {
    /// Fully unpainted buffer (the "no prior mask" starting state).
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height * 4],
        }
    }

    /// Rebuild the overlay from per-pixel grayscale mask strengths.
    /// `gray` must hold exactly width*height values.
    pub fn from_gray(width: usize, height: usize, gray: &[u8]) -> Self {
        debug_assert_eq!(gray.len(), width * height);
        let mut data = vec![0u8; width * height * 4];
        for (i, &v) in gray.iter().enumerate() {
            data[i * 4 + 1] = v;
            data[i * 4 + 3] = overlay_alpha(v);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Mask strength at (x, y); the green channel.
    #[inline]
    pub fn gray_at(&self, x: usize, y: usize) -> u8 {
        self.data[(y * self.width + x) * 4 + 1]
    }

    /// Overlay alpha at (x, y). 0 means unpainted.
    #[inline]
    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        self.data[(y * self.width + x) * 4 + 3]
    }

    /// Reset every pixel to unpainted.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Stamp a filled circle of `radius` centered at (cx, cy).
    ///
    /// Writes every in-bounds cell with dx²+dy² ≤ r²; offsets falling outside
    /// the buffer are skipped per cell (brush circles routinely hang past the
    /// image edge). Assignment, not accumulation: restamping an already
    /// painted cell with the same tool changes nothing.
    pub fn stamp(&mut self, cx: i32, cy: i32, radius: i32, tool: Tool) {
        let (g, a) = match tool {
            Tool::Paint => (255u8, overlay_alpha(255)),
            Tool::Erase => (0u8, 0u8),
        };
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
                    continue;
                }
                let i = (y as usize * self.width + x as usize) * 4;
                self.data[i] = 0;
                self.data[i + 1] = g;
                self.data[i + 2] = 0;
                self.data[i + 3] = a;
            }
        }
    }

    /// Composite `base` (the source image) under this overlay into `out`.
    /// Plain sRGB alpha blend per channel; all three buffers share one size.
    pub fn composite_over(&self, base: &FrameBuffer, out: &mut FrameBuffer) {
        debug_assert_eq!(base.width, self.width);
        debug_assert_eq!(base.height, self.height);
        debug_assert_eq!(out.pixels.len(), base.pixels.len());

        for (i, px) in base.pixels.iter().enumerate() {
            let a = self.data[i * 4 + 3] as u32;
            if a == 0 {
                out.pixels[i] = *px;
                continue;
            }
            let inv = 255 - a;
            let br = (px >> 16) & 0xFF;
            let bg = (px >> 8) & 0xFF;
            let bb = px & 0xFF;
            // Overlay tint is (R=0, G=strength, B=0).
            let og = self.data[i * 4 + 1] as u32;
            let r = (br * inv + 127) / 255;
            let g = (bg * inv + og * a + 127) / 255;
            let b = (bb * inv + 127) / 255;
            out.pixels[i] = (r << 16) | (g << 8) | b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted_cells(m: &MaskOverlay) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..m.height() {
            for x in 0..m.width() {
                if m.gray_at(x, y) > 0 {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn stamp_matches_circle_membership() {
        for radius in 1..=8 {
            let mut m = MaskOverlay::new(40, 40);
            m.stamp(20, 20, radius, Tool::Paint);
            for y in 0..40i32 {
                for x in 0..40i32 {
                    let dx = x - 20;
                    let dy = y - 20;
                    let inside = dx * dx + dy * dy <= radius * radius;
                    let painted = m.gray_at(x as usize, y as usize) == 255;
                    assert_eq!(painted, inside, "r={radius} at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn stamp_clips_at_edges_without_error() {
        let mut m = MaskOverlay::new(10, 10);
        // Center entirely outside; only the sliver inside may be written.
        m.stamp(-3, 5, 5, Tool::Paint);
        m.stamp(12, 0, 4, Tool::Paint);
        for &(x, y) in &painted_cells(&m) {
            assert!(x < 10 && y < 10);
        }
        // A circle fully off-buffer paints nothing.
        let mut empty = MaskOverlay::new(10, 10);
        empty.stamp(-20, -20, 5, Tool::Paint);
        assert!(painted_cells(&empty).is_empty());
    }

    #[test]
    fn restamping_is_idempotent() {
        let mut once = MaskOverlay::new(30, 30);
        once.stamp(15, 15, 6, Tool::Paint);
        let mut thrice = MaskOverlay::new(30, 30);
        thrice.stamp(15, 15, 6, Tool::Paint);
        thrice.stamp(14, 15, 6, Tool::Paint); // overlapping
        thrice.stamp(15, 15, 6, Tool::Paint);
        for y in 0..30 {
            for x in 0..30 {
                if once.gray_at(x, y) == 255 {
                    assert_eq!(thrice.gray_at(x, y), 255);
                    assert_eq!(thrice.alpha_at(x, y), overlay_alpha(255));
                }
            }
        }
    }

    #[test]
    fn erase_inverts_paint() {
        let mut m = MaskOverlay::new(50, 50);
        m.stamp(25, 25, 10, Tool::Paint);
        m.stamp(10, 40, 4, Tool::Paint);
        m.stamp(25, 25, 10, Tool::Erase);
        m.stamp(10, 40, 4, Tool::Erase);
        for y in 0..50 {
            for x in 0..50 {
                assert_eq!(m.gray_at(x, y), 0);
                assert_eq!(m.alpha_at(x, y), 0);
            }
        }
    }

    #[test]
    fn painted_pixel_is_the_overlay_tint() {
        let mut m = MaskOverlay::new(3, 3);
        m.stamp(1, 1, 1, Tool::Paint);
        assert_eq!(m.gray_at(1, 1), 255);
        assert_eq!(m.alpha_at(1, 1), 102); // round(255 * 0.4)
    }

    #[test]
    fn composite_leaves_unpainted_pixels_untouched() {
        let mut base = FrameBuffer::new(4, 4);
        base.pixels.fill(0x00AA_BB_CC);
        let mut m = MaskOverlay::new(4, 4);
        m.stamp(0, 0, 0, Tool::Paint); // single cell
        let mut out = FrameBuffer::new(4, 4);
        m.composite_over(&base, &mut out);
        assert_ne!(out.pixels[0], base.pixels[0]);
        for i in 1..16 {
            assert_eq!(out.pixels[i], base.pixels[i]);
        }
    }
}
