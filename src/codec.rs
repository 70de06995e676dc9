// Mask codec: authoritative overlay <-> grayscale JPEG bytes.
//
// The server stores one grayscale JPEG per image (same pixel dimensions,
// 0 = unpainted, 255 = painted, quality 95). Encoding projects the overlay's
// green channel out to an R=G=B image; decoding scales the stored gray back
// into the green-tint/alpha overlay form. Lossy compression means reloaded
// masks can hold intermediate values; those are kept as partial strength
// rather than snapped to a boolean.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ExtendedColorType;
use log::warn;

use crate::error::Result;
use crate::raster::MaskOverlay;

/// Matches the quality the server itself re-encodes at.
const JPEG_QUALITY: u8 = 95;

/// Serialize the overlay's mask strengths as a grayscale-equivalent JPEG
/// (gray replicated to R/G/B, fully opaque).
pub fn encode(overlay: &MaskOverlay) -> Result<Vec<u8>> {
    let (w, h) = (overlay.width(), overlay.height());
    let mut rgb = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            let v = overlay.gray_at(x, y);
            rgb.extend_from_slice(&[v, v, v]);
        }
    }
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode(
        &rgb,
        w as u32,
        h as u32,
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Rebuild the overlay from stored mask bytes (any raster format the `image`
/// crate can sniff). A stored mask whose dimensions drifted from the source
/// image is stretched to fit, like the original editor did.
pub fn decode(bytes: &[u8], width: usize, height: usize) -> Result<MaskOverlay> {
    let mut gray = image::load_from_memory(bytes)?.to_luma8();
    if gray.width() as usize != width || gray.height() as usize != height {
        warn!(
            "stored mask is {}x{}, image is {}x{}; resizing mask to fit",
            gray.width(),
            gray.height(),
            width,
            height
        );
        gray = image::imageops::resize(&gray, width as u32, height as u32, FilterType::Triangle);
    }
    Ok(MaskOverlay::from_gray(width, height, gray.as_raw()))
}

/// Decode a mask if we have one, otherwise start fully unpainted.
/// A missing or undecodable mask is "no prior mask", never a fatal error.
pub fn decode_or_blank(bytes: Option<&[u8]>, width: usize, height: usize) -> MaskOverlay {
    match bytes {
        Some(b) => match decode(b, width, height) {
            Ok(overlay) => overlay,
            Err(e) => {
                warn!("could not decode stored mask ({e}); starting from an empty mask");
                MaskOverlay::new(width, height)
            }
        },
        None => MaskOverlay::new(width, height),
    }
}
