// What you SEE:
// • The current dataset image fills the window; painted mask areas show
//   through a 40% green wash.
// • Hold Left Mouse: you paint (or erase) the mask under a circular brush.
// • A thin circle follows the mouse showing the brush size (display-only,
//   never saved). O toggles it.
// • T swaps paint/erase, [ and ] resize the brush, C clears the mask,
//   S saves to the server, N/P save-then-jump to the next/previous image.
//   ESC quits.

mod client;
mod codec;
mod error;
mod raster;
mod session;
mod stroke;
mod types;
mod window;

use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};

use client::{DatasetClient, ImagePair};
use error::Result;
use session::EditorSession;
use types::{FrameBuffer, Tool};
use window::{draw_circle_outline, draw_text_5x7, Drawer};

/// Target display cadence (~60 Hz). Pointer sampling runs much faster; a
/// frame only does raster work when this much time has passed.
const FRAME_INTERVAL: Duration = Duration::from_micros(16_600);
/// Sleep between input polls while waiting for the next due frame.
const POLL_INTERVAL: Duration = Duration::from_millis(2);
/// How long transient HUD notices stay up.
const NOTICE_TTL: Duration = Duration::from_secs(2);

const OUTLINE_COLOR: u32 = 0x00FF_FFFF;
const HUD_COLOR: u32 = 0x00FF_FFFF;
const NOTICE_COLOR: u32 = 0x00FF_CC33;

/// Paint segmentation masks over a labeling server's image pairs.
#[derive(Parser, Debug)]
#[command(name = "mask-painter", version)]
struct Args {
    /// Base URL of the labeling server.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Image filename to open first (defaults to the server's first image).
    #[arg(long)]
    img: Option<String>,
}

/// Everything tied to the image currently on screen.
struct Loaded {
    pair: ImagePair,
    /// The source image, decoded once. Never mutated.
    base: FrameBuffer,
    session: EditorSession,
}

/// Fetch a pair, decode the image, decode (or blank) its stored mask.
fn load_pair(client: &DatasetClient, img: Option<&str>) -> Result<Loaded> {
    let pair = client.fetch_pair(img)?;

    let image_bytes = client.fetch_bytes(&pair.image)?;
    let rgba = image::load_from_memory(&image_bytes)?.to_rgba8();
    let (w, h) = (rgba.width() as usize, rgba.height() as usize);
    let mut base = FrameBuffer::new(w, h);
    for (i, px) in rgba.pixels().enumerate() {
        base.pixels[i] = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
    }

    // A fetch failure here is "no prior mask" (the server may not have
    // created one yet), never fatal.
    let mask_bytes = match client.fetch_bytes(&pair.mask) {
        Ok(b) => Some(b),
        Err(e) => {
            warn!("no stored mask for {} ({e}); starting empty", pair.filename);
            None
        }
    };
    let overlay = codec::decode_or_blank(mask_bytes.as_deref(), w, h);

    info!(
        "loaded {} ({}x{}, pair {}/{})",
        pair.filename,
        w,
        h,
        pair.current_index + 1,
        pair.total_pairs
    );
    let session = EditorSession::new(pair.filename.clone(), overlay);
    Ok(Loaded { pair, base, session })
}

fn window_title(pair: &ImagePair) -> String {
    format!("mask-painter - {}", pair.filename)
}

fn tool_label(tool: Tool) -> &'static str {
    match tool {
        Tool::Paint => "PAINT",
        Tool::Erase => "ERASE",
    }
}

fn set_notice(notice: &mut Option<(String, Instant)>, text: &str) {
    *notice = Some((text.to_string(), Instant::now() + NOTICE_TTL));
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("fatal: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let client = DatasetClient::new(&args.server);
    let mut loaded = load_pair(&client, args.img.as_deref())?;

    let mut drawer = Drawer::new(
        &window_title(&loaded.pair),
        loaded.base.width,
        loaded.base.height,
    )?;
    let mut screen = FrameBuffer::new(loaded.base.width, loaded.base.height);

    let mut outline_enabled = true;

    // Start one interval in the past so the first frame renders immediately.
    let mut last_frame = Instant::now() - FRAME_INTERVAL;

    // In-flight background save, if any, plus the revision it snapshotted.
    let mut save_rx: Option<(mpsc::Receiver<Result<()>>, u64)> = None;
    let mut notice: Option<(String, Instant)> = None;

    // FPS counter for the HUD.
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Sample the pointer. Handlers only enqueue; nothing is stamped
        here, so sampling can safely outrun the display. */
        let down = drawer.left_mouse_down();
        let pos = drawer.mouse_pos();
        match (down, loaded.session.is_drawing(), pos) {
            (true, false, Some((x, y))) => loaded.session.pointer_down(x, y),
            (true, true, Some((x, y))) => loaded.session.pointer_move(x, y),
            (false, true, _) => loaded.session.pointer_up(),
            _ => {}
        }

        /* 2) Edge-triggered keys. Brush/tool changes affect future stamps
        only. */
        if drawer.tool_toggle_pressed() {
            loaded.session.toggle_tool();
        }
        if drawer.brush_grow_pressed() {
            let r = loaded.session.brush_radius();
            loaded.session.set_brush_radius(r + 1);
        }
        if drawer.brush_shrink_pressed() {
            let r = loaded.session.brush_radius();
            loaded.session.set_brush_radius(r - 1);
        }
        if drawer.clear_pressed() {
            loaded.session.clear_mask();
        }
        if drawer.outline_toggle_pressed() {
            outline_enabled = !outline_enabled;
        }

        /* 3) Save (S): encode a snapshot now, transfer on a worker thread.
        The loop keeps running; strokes made meanwhile go into the next
        save. One transfer at a time. */
        if drawer.save_pressed() {
            if save_rx.is_some() {
                set_notice(&mut notice, "SAVE ALREADY RUNNING");
            } else {
                loaded.session.apply_pending(); // include queued strokes
                match codec::encode(loaded.session.overlay()) {
                    Ok(bytes) => {
                        let (tx, rx) = mpsc::channel();
                        let c = client.clone();
                        let name = loaded.session.filename().to_string();
                        let rev = loaded.session.revision();
                        thread::spawn(move || {
                            let _ = tx.send(c.save_mask(&bytes, &name));
                        });
                        save_rx = Some((rx, rev));
                        set_notice(&mut notice, "SAVING");
                    }
                    Err(e) => {
                        warn!("mask encode failed: {e}");
                        set_notice(&mut notice, "SAVE FAILED");
                    }
                }
            }
        }

        /* 4) Did a background save finish? Failure never rolls back local
        edits; it is logged and shown. */
        if let Some((rx, rev)) = save_rx.take() {
            match rx.try_recv() {
                Ok(Ok(())) => {
                    loaded.session.mark_saved_at(rev);
                    set_notice(&mut notice, "SAVED");
                }
                Ok(Err(e)) => {
                    warn!("save failed: {e}");
                    set_notice(&mut notice, "SAVE FAILED");
                }
                Err(TryRecvError::Empty) => save_rx = Some((rx, rev)),
                Err(TryRecvError::Disconnected) => {
                    warn!("save worker vanished without reporting");
                    set_notice(&mut notice, "SAVE FAILED");
                }
            }
        }

        /* 5) Navigation (N/P): the current mask must be persisted before the
        pair swap. The save here is synchronous; if it fails we stay on
        this image so no edit is lost. */
        let nav_target = if drawer.next_pressed() {
            Some(loaded.pair.next_filename.clone())
        } else if drawer.prev_pressed() {
            Some(loaded.pair.prev_filename.clone())
        } else {
            None
        };
        if let Some(target) = nav_target {
            if save_rx.is_some() {
                set_notice(&mut notice, "SAVE ALREADY RUNNING");
            } else {
                loaded.session.apply_pending();
                let saved = codec::encode(loaded.session.overlay())
                    .and_then(|bytes| client.save_mask(&bytes, loaded.session.filename()));
                match saved {
                    Ok(()) => {
                        loaded.session.mark_saved();
                        match load_pair(&client, Some(&target)) {
                            Ok(next) => {
                                if next.base.width != loaded.base.width
                                    || next.base.height != loaded.base.height
                                {
                                    drawer = Drawer::new(
                                        &window_title(&next.pair),
                                        next.base.width,
                                        next.base.height,
                                    )?;
                                } else {
                                    drawer.set_title(&window_title(&next.pair));
                                }
                                screen = FrameBuffer::new(next.base.width, next.base.height);
                                loaded = next;
                            }
                            Err(e) => {
                                warn!("could not load {target}: {e}");
                                set_notice(&mut notice, "LOAD FAILED");
                            }
                        }
                    }
                    Err(e) => {
                        warn!("save before navigation failed, staying put: {e}");
                        set_notice(&mut notice, "SAVE FAILED");
                    }
                }
            }
        }

        /* 6) Cooperative rate limit: not due yet? Keep events flowing and
        try again shortly. Queued segments wait; none are dropped. */
        if last_frame.elapsed() < FRAME_INTERVAL {
            drawer.pump();
            thread::sleep(POLL_INTERVAL);
            continue;
        }
        last_frame = Instant::now();

        /* 7) Drain + rasterize everything queued since the last frame, then
        recomposite the authoritative buffer over the image. All queued
        segments land before the single blit below, so intermediate
        states are never shown. */
        loaded.session.apply_pending();
        loaded.session.overlay().composite_over(&loaded.base, &mut screen);

        /* 8) Display-only decoration, drawn after the authoritative copy:
        brush outline at the pointer, then the HUD line. */
        if outline_enabled {
            if let Some((mx, my)) = pos {
                draw_circle_outline(
                    &mut screen,
                    mx,
                    my,
                    loaded.session.brush_radius(),
                    OUTLINE_COLOR,
                );
            }
        }

        let dirty_mark = if loaded.session.is_dirty() { "*" } else { "" };
        let hud = format!(
            "{} | R:{}{} | {} {}/{} | {}",
            tool_label(loaded.session.tool()),
            loaded.session.brush_radius(),
            dirty_mark,
            loaded.session.filename(),
            loaded.pair.current_index + 1,
            loaded.pair.total_pairs,
            hud_fps_text,
        );
        draw_text_5x7(&mut screen, 8, 8, &hud, HUD_COLOR);
        if notice.as_ref().is_some_and(|(_, until)| Instant::now() >= *until) {
            notice = None;
        }
        if let Some((text, _)) = &notice {
            draw_text_5x7(&mut screen, 8, 18, text, NOTICE_COLOR);
        }

        /* 9) Present to the window. */
        drawer.present(&screen)?;

        /* 10) FPS counter, refreshed once per second. */
        frames_this_second += 1;
        if last_frame.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = last_frame.duration_since(last_fps_time).as_secs_f32();
            hud_fps_text = format!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = last_frame;
        }
    }

    Ok(())
}
