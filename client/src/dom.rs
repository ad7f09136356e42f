use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use crate::geometry::normalize_percent;
use crate::state::{State, ToastKind};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn set_status(status_el: &Element, status_text: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_text.set_text_content(Some(text));
}

pub fn set_hidden(element: &HtmlElement, hidden: bool) {
    if hidden {
        let _ = element.set_attribute("hidden", "");
    } else {
        let _ = element.remove_attribute("hidden");
    }
}

/// Anchors an overlay at a dot position; CSS translates it off the anchor
/// point so it does not cover the dot itself.
pub fn place_overlay(element: &HtmlElement, x: f32, y: f32) {
    let style = element.style();
    let _ = style.set_property("left", &format!("{x}%"));
    let _ = style.set_property("top", &format!("{y}%"));
}

pub fn set_canvas_cursor(canvas: &HtmlCanvasElement, state: &State) {
    let cursor = if state.adding_mode {
        "crosshair"
    } else if state.view_only {
        "default"
    } else {
        "pointer"
    };
    if let Ok(element) = canvas.clone().dyn_into::<HtmlElement>() {
        let _ = element.style().set_property("cursor", cursor);
    }
}

/// Pointer position as percentages of the canvas box, the coordinate space
/// dots live in.
pub fn event_to_percent(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Option<(f32, f32)> {
    let rect = canvas.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let x = (event.client_x() as f64 - rect.left()) / rect.width() * 100.0;
    let y = (event.client_y() as f64 - rect.top()) / rect.height() * 100.0;
    normalize_percent(x as f32, y as f32)
}

/// Transient notification; removes itself after a few seconds.
pub fn show_toast(
    window: &Window,
    document: &Document,
    toasts: &HtmlElement,
    title: &str,
    body: &str,
    kind: ToastKind,
) {
    let Ok(toast) = document.create_element("div") else {
        return;
    };
    let class = match kind {
        ToastKind::Info => "toast toast-info",
        ToastKind::Error => "toast toast-error",
    };
    toast.set_class_name(class);

    if let Ok(heading) = document.create_element("strong") {
        heading.set_text_content(Some(title));
        let _ = toast.append_child(&heading);
    }
    if let Ok(message) = document.create_element("div") {
        message.set_text_content(Some(body));
        let _ = toast.append_child(&message);
    }
    let _ = toasts.append_child(&toast);

    let remove = Closure::once_into_js(move || {
        toast.remove();
    });
    let _ = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(remove.unchecked_ref(), 4000);
}
