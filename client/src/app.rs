use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent, MouseEvent, PointerEvent,
    Window,
};

use dotnotes_shared::ServerMessage;

use crate::actions;
use crate::collection;
use crate::dom::{
    event_to_percent, get_element, place_overlay, set_canvas_cursor, set_hidden, set_status,
    show_toast,
};
use crate::render;
use crate::speech::{self, Player, SpeechOutcome};
use crate::state::{Effect, State, Surface, ToastKind};
use crate::ws::{connect_ws, WsEvent, WsSender};

struct Ui {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    status_el: Element,
    status_text: Element,
    dot_count: Element,
    loading: HtmlElement,
    adding_hint: HtmlElement,
    tooltip: HtmlElement,
    popup: HtmlElement,
    popup_text: HtmlElement,
    popup_speak: HtmlButtonElement,
    popup_edit: HtmlButtonElement,
    popup_close: HtmlButtonElement,
    editor: HtmlElement,
    editor_title: HtmlElement,
    note_text: HtmlTextAreaElement,
    note_save: HtmlButtonElement,
    note_cancel: HtmlButtonElement,
    note_delete: HtmlButtonElement,
    mode_toggle: HtmlButtonElement,
    add_toggle: HtmlButtonElement,
    captions_toggle: HtmlInputElement,
    captions: HtmlElement,
    toasts: HtmlElement,
}

struct Shell {
    window: Window,
    document: Document,
    ui: Ui,
    state: Rc<RefCell<State>>,
    player: Rc<RefCell<Player>>,
}

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    if document_ready_state(&document).as_deref() == Some("complete") {
        return start_app();
    }

    let started = Rc::new(Cell::new(false));
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn grab_ui(document: &Document) -> Result<Ui, JsValue> {
    let canvas: HtmlCanvasElement = get_element(document, "board")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    Ok(Ui {
        canvas,
        ctx,
        status_el: get_element(document, "status")?,
        status_text: get_element(document, "statusText")?,
        dot_count: get_element(document, "dotCount")?,
        loading: get_element(document, "loading")?,
        adding_hint: get_element(document, "addingHint")?,
        tooltip: get_element(document, "tooltip")?,
        popup: get_element(document, "popup")?,
        popup_text: get_element(document, "popupText")?,
        popup_speak: get_element(document, "popupSpeak")?,
        popup_edit: get_element(document, "popupEdit")?,
        popup_close: get_element(document, "popupClose")?,
        editor: get_element(document, "editor")?,
        editor_title: get_element(document, "editorTitle")?,
        note_text: get_element(document, "noteText")?,
        note_save: get_element(document, "noteSave")?,
        note_cancel: get_element(document, "noteCancel")?,
        note_delete: get_element(document, "noteDelete")?,
        mode_toggle: get_element(document, "modeToggle")?,
        add_toggle: get_element(document, "addToggle")?,
        captions_toggle: get_element(document, "captionsToggle")?,
        captions: get_element(document, "captions")?,
        toasts: get_element(document, "toasts")?,
    })
}

fn sync_save_enabled(ui: &Ui, state: &State) {
    let blank = ui.note_text.value().trim().is_empty();
    ui.note_save
        .set_disabled(blank && matches!(state.surface, Surface::NewNote { .. }));
}

/// Pushes the current state into every derived piece of the page. The DOM
/// holds no interaction state of its own apart from the editor text while
/// the user is typing.
fn sync_ui(shell: &Shell) {
    let state = shell.state.borrow();
    let ui = &shell.ui;

    let count_label = match state.dots.len() {
        1 => "1 dot placed".to_string(),
        n => format!("{n} dots placed"),
    };
    ui.dot_count.set_text_content(Some(&count_label));
    set_hidden(&ui.loading, !state.loading);
    set_hidden(&ui.adding_hint, !state.adding_mode);
    set_canvas_cursor(&ui.canvas, &state);

    ui.mode_toggle.set_text_content(Some(if state.view_only {
        "View Mode"
    } else {
        "Edit Mode"
    }));
    let _ = ui.mode_toggle.set_attribute(
        "aria-pressed",
        if state.view_only { "true" } else { "false" },
    );
    ui.add_toggle.set_text_content(Some(if state.adding_mode {
        "Cancel"
    } else {
        "Add Dot"
    }));
    ui.captions_toggle.set_checked(state.captions);

    let tooltip_target = state
        .hovered
        .as_ref()
        .filter(|key| state.surface.key() != Some(key))
        .and_then(|key| state.entry(key))
        .filter(|entry| entry.has_text());
    match tooltip_target {
        Some(entry) => {
            ui.tooltip.set_text_content(Some(&entry.text));
            place_overlay(&ui.tooltip, entry.x, entry.y);
            set_hidden(&ui.tooltip, false);
        }
        None => set_hidden(&ui.tooltip, true),
    }

    match &state.surface {
        Surface::Viewing { key } => {
            let entry = state.entry(key);
            let text = entry.map(|entry| entry.text.trim()).unwrap_or("");
            ui.popup_text
                .set_text_content(Some(if text.is_empty() { "No content" } else { text }));
            if let Some(entry) = entry {
                place_overlay(&ui.popup, entry.x, entry.y);
            }
            ui.popup_speak
                .set_text_content(Some(if state.speaking.as_ref() == Some(key) {
                    "Stop"
                } else {
                    "Speak"
                }));
            set_hidden(&ui.popup, false);
        }
        _ => set_hidden(&ui.popup, true),
    }

    match &state.surface {
        Surface::NewNote { .. } => {
            ui.editor_title.set_text_content(Some("Add New Note"));
            ui.note_delete.set_text_content(Some("Discard Dot"));
            set_hidden(&ui.editor, false);
        }
        Surface::Editing { .. } => {
            ui.editor_title.set_text_content(Some("Your Note"));
            ui.note_delete.set_text_content(Some("Delete Dot"));
            set_hidden(&ui.editor, false);
        }
        _ => set_hidden(&ui.editor, true),
    }
    sync_save_enabled(ui, &state);

    let caption = state
        .captions
        .then(|| state.speaking.as_ref())
        .flatten()
        .and_then(|key| state.entry(key));
    match caption {
        Some(entry) => {
            ui.captions.set_text_content(Some(&entry.text));
            set_hidden(&ui.captions, false);
        }
        None => set_hidden(&ui.captions, true),
    }
}

fn refresh(shell: &Shell) {
    {
        let state = shell.state.borrow();
        render::redraw(&shell.ui.canvas, &shell.ui.ctx, &state);
    }
    sync_ui(shell);
}

/// Fills the editor textarea when a transition just opened it. Refreshes
/// never touch the textarea, so typing is never clobbered.
fn populate_editor(shell: &Shell, previous: &Surface) {
    let state = shell.state.borrow();
    if !state.surface.is_editor() || state.surface == *previous {
        return;
    }
    let text = state
        .surface
        .key()
        .and_then(|key| state.entry(key))
        .map(|entry| entry.text.clone())
        .unwrap_or_default();
    shell.ui.note_text.set_value(&text);
    let _ = shell.ui.note_text.focus();
}

fn run_effects(
    shell: &Rc<Shell>,
    sender: &Rc<WsSender>,
    on_outcome: &speech::OutcomeHandler,
    effects: Vec<Effect>,
) {
    for effect in effects {
        match effect {
            Effect::Send(message) => sender.send(&message),
            Effect::Toast { title, body, kind } => show_toast(
                &shell.window,
                &shell.document,
                &shell.ui.toasts,
                title,
                &body,
                kind,
            ),
            Effect::StopSpeech => shell.player.borrow_mut().stop(),
            Effect::Speak(text) => match speech::api_key(&shell.window) {
                Some(key) => {
                    speech::start(&shell.window, &shell.player, &text, &key, on_outcome.clone())
                }
                None => {
                    shell.state.borrow_mut().speaking = None;
                    show_toast(
                        &shell.window,
                        &shell.document,
                        &shell.ui.toasts,
                        "Speech unavailable",
                        "No speech API key is configured for this deployment.",
                        ToastKind::Error,
                    );
                }
            },
        }
    }
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let ui = grab_ui(&document)?;
    let shell = Rc::new(Shell {
        window: window.clone(),
        document: document.clone(),
        ui,
        state: Rc::new(RefCell::new(State::new())),
        player: Rc::new(RefCell::new(Player::default())),
    });

    set_status(
        &shell.ui.status_el,
        &shell.ui.status_text,
        "connecting",
        "Connecting...",
    );
    render::resize_canvas(&window, &shell.ui.canvas, &shell.ui.ctx);
    refresh(&shell);

    let sender = connect_ws(&window, {
        let shell = shell.clone();
        move |event| match event {
            WsEvent::Open => {
                let label = if shell.state.borrow().loading {
                    "Loading dots..."
                } else {
                    "Live connection"
                };
                set_status(&shell.ui.status_el, &shell.ui.status_text, "open", label);
            }
            WsEvent::Close => {
                set_status(&shell.ui.status_el, &shell.ui.status_text, "closed", "Offline");
            }
            WsEvent::Error => set_status(
                &shell.ui.status_el,
                &shell.ui.status_text,
                "closed",
                "Connection error",
            ),
            WsEvent::Message(message) => {
                let effects = {
                    let mut state = shell.state.borrow_mut();
                    match message {
                        ServerMessage::Sync { dots } => {
                            collection::adopt(&mut state, dots);
                            Vec::new()
                        }
                        ServerMessage::Inserted { dot } => {
                            collection::insert_remote(&mut state, dot);
                            Vec::new()
                        }
                        ServerMessage::Updated { dot } => collection::update_remote(&mut state, dot),
                        ServerMessage::Deleted { id } => collection::delete_remote(&mut state, &id),
                    }
                };
                if !shell.state.borrow().loading {
                    set_status(
                        &shell.ui.status_el,
                        &shell.ui.status_text,
                        "open",
                        "Live connection",
                    );
                }
                // The change stream can retire a dot out from under an
                // active playback; the collection asks us to stop it.
                for effect in effects {
                    if matches!(effect, Effect::StopSpeech) {
                        shell.player.borrow_mut().stop();
                    }
                }
                refresh(&shell);
            }
        }
    })?;

    let on_outcome: speech::OutcomeHandler = Rc::new({
        let shell = shell.clone();
        move |outcome| {
            let effects = {
                let mut state = shell.state.borrow_mut();
                match outcome {
                    SpeechOutcome::Ended => {
                        actions::speech_finished(&mut state);
                        Vec::new()
                    }
                    SpeechOutcome::Failed => actions::speech_failed(&mut state),
                }
            };
            for effect in effects {
                if let Effect::Toast { title, body, kind } = effect {
                    show_toast(&shell.window, &shell.document, &shell.ui.toasts, title, &body, kind);
                }
            }
            refresh(&shell);
        }
    });

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onclick = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let Some((x, y)) = event_to_percent(&shell_cb.ui.canvas, &event) else {
                return;
            };
            let (previous, effects) = {
                let mut state = shell_cb.state.borrow_mut();
                let previous = state.surface.clone();
                let effects = actions::canvas_click(&mut state, x, y);
                (previous, effects)
            };
            populate_editor(&shell_cb, &previous);
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        shell
            .ui
            .canvas
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let Some((x, y)) = event_to_percent(&shell_cb.ui.canvas, &event) else {
                return;
            };
            let changed = actions::hover_at(&mut shell_cb.state.borrow_mut(), x, y);
            if changed {
                refresh(&shell_cb);
            }
        });
        shell
            .ui
            .canvas
            .add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        let shell_cb = shell.clone();
        let onleave = Closure::<dyn FnMut(PointerEvent)>::new(move |_| {
            let changed = {
                let mut state = shell_cb.state.borrow_mut();
                state.hovered.take().is_some()
            };
            if changed {
                refresh(&shell_cb);
            }
        });
        shell
            .ui
            .canvas
            .add_event_listener_with_callback("pointerleave", onleave.as_ref().unchecked_ref())?;
        onleave.forget();
    }

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let effects = actions::toggle_view_only(&mut shell_cb.state.borrow_mut());
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        shell
            .ui
            .mode_toggle
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let effects = actions::toggle_adding(&mut shell_cb.state.borrow_mut());
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        shell
            .ui
            .add_toggle
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            actions::toggle_captions(&mut shell_cb.state.borrow_mut());
            refresh(&shell_cb);
        });
        shell
            .ui
            .captions_toggle
            .add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    {
        let shell_cb = shell.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            let state = shell_cb.state.borrow();
            sync_save_enabled(&shell_cb.ui, &state);
        });
        shell
            .ui
            .note_text
            .add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let text = shell_cb.ui.note_text.value();
            let effects = actions::save_note(&mut shell_cb.state.borrow_mut(), &text);
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        shell
            .ui
            .note_save
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let text = shell_cb.ui.note_text.value();
            let effects = actions::cancel_note(&mut shell_cb.state.borrow_mut(), &text);
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        shell
            .ui
            .note_cancel
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let effects = actions::delete_selected(&mut shell_cb.state.borrow_mut());
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        shell
            .ui
            .note_delete
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let effects = actions::cancel_note(&mut shell_cb.state.borrow_mut(), "");
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        shell
            .ui
            .popup_close
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let previous = {
                let mut state = shell_cb.state.borrow_mut();
                let previous = state.surface.clone();
                actions::begin_edit(&mut state);
                previous
            };
            populate_editor(&shell_cb, &previous);
            refresh(&shell_cb);
        });
        shell
            .ui
            .popup_edit
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let effects = {
                let mut state = shell_cb.state.borrow_mut();
                match state.surface.clone() {
                    Surface::Viewing { key } => {
                        if state.speaking.as_ref() == Some(&key) {
                            actions::stop_speaking(&mut state)
                        } else {
                            actions::speak(&mut state, key)
                        }
                    }
                    _ => Vec::new(),
                }
            };
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        shell
            .ui
            .popup_speak
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let shell_cb = shell.clone();
        let sender_cb = sender.clone();
        let on_outcome_cb = on_outcome.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.key() != "Escape" {
                return;
            }
            let closed = {
                let state = shell_cb.state.borrow();
                matches!(state.surface, Surface::Closed)
            };
            if closed {
                return;
            }
            event.prevent_default();
            let text = shell_cb.ui.note_text.value();
            let effects = actions::cancel_note(&mut shell_cb.state.borrow_mut(), &text);
            run_effects(&shell_cb, &sender_cb, &on_outcome_cb, effects);
            refresh(&shell_cb);
        });
        window.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    {
        let shell_cb = shell.clone();
        let window_cb = window.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            render::resize_canvas(&window_cb, &shell_cb.ui.canvas, &shell_cb.ui.ctx);
            refresh(&shell_cb);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    Ok(())
}
