use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

use crate::state::{DotEntry, State};

const DOT_RADIUS: f64 = 10.0;
const RING_RADIUS: f64 = 14.0;
const NOTE_FILL: &str = "#4f46e5";
const DRAFT_FILL: &str = "#c4b5fd";
const HOVER_RING: &str = "rgba(167, 139, 250, 0.8)";
const SPEAKING_RING: &str = "#f59e0b";

/// Matches the canvas backing store to its CSS box at the device pixel
/// ratio so dots stay crisp on high-density screens.
pub fn resize_canvas(window: &Window, canvas: &HtmlCanvasElement, ctx: &CanvasRenderingContext2d) {
    let rect = canvas.get_bounding_client_rect();
    let dpr = window.device_pixel_ratio();
    canvas.set_width((rect.width() * dpr) as u32);
    canvas.set_height((rect.height() * dpr) as u32);
    let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
}

fn dot_screen_position(canvas: &HtmlCanvasElement, entry: &DotEntry) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    let x = entry.x as f64 / 100.0 * rect.width();
    let y = entry.y as f64 / 100.0 * rect.height();
    (x, y)
}

fn fill_circle(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, color: &str) {
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    let _ = ctx.arc(x, y, radius, 0.0, std::f64::consts::PI * 2.0);
    ctx.fill();
}

fn ring(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, color: &str) {
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(3.0);
    ctx.begin_path();
    let _ = ctx.arc(x, y, radius, 0.0, std::f64::consts::PI * 2.0);
    ctx.stroke();
}

/// Full repaint, derived from `State` alone. Dots with a note render solid;
/// drafts render muted so an unsaved marker is visibly different.
pub fn redraw(canvas: &HtmlCanvasElement, ctx: &CanvasRenderingContext2d, state: &State) {
    let rect = canvas.get_bounding_client_rect();
    ctx.clear_rect(0.0, 0.0, rect.width(), rect.height());
    for entry in &state.dots {
        let (x, y) = dot_screen_position(canvas, entry);
        let color = if entry.has_text() { NOTE_FILL } else { DRAFT_FILL };
        fill_circle(ctx, x, y, DOT_RADIUS, color);

        let selected = state.selected() == Some(&entry.key);
        let hovered = state.hovered.as_ref() == Some(&entry.key);
        if selected || hovered {
            ring(ctx, x, y, RING_RADIUS, HOVER_RING);
        }
        if state.speaking.as_ref() == Some(&entry.key) {
            ring(ctx, x, y, RING_RADIUS + 4.0, SPEAKING_RING);
        }
    }
}
