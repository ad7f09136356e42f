//! Record store proxy, subscription leg. One WebSocket carries both
//! directions: mutations go out as JSON text, the change stream comes back
//! as bincode binary (JSON text is also accepted). Malformed payloads are
//! logged and dropped; they never take the reconciliation logic down.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket, Window};

use dotnotes_shared::{ClientMessage, ServerMessage};

use crate::codec;
use crate::net::websocket_url;

#[derive(Debug)]
pub enum WsEvent {
    Open,
    Close,
    Error,
    Message(ServerMessage),
}

pub struct WsSender {
    socket: WebSocket,
}

impl WsSender {
    pub fn is_open(&self) -> bool {
        self.socket.ready_state() == WebSocket::OPEN
    }

    pub fn send(&self, message: &ClientMessage) {
        if !self.is_open() {
            return;
        }
        if let Ok(payload) = serde_json::to_string(message) {
            let _ = self.socket.send_with_str(&payload);
        }
    }
}

pub fn connect_ws(
    window: &Window,
    on_event: impl 'static + FnMut(WsEvent),
) -> Result<Rc<WsSender>, JsValue> {
    let ws_url = websocket_url(window)?;
    web_sys::console::log_1(&format!("WS connecting url={ws_url}").into());
    let socket = WebSocket::new(&ws_url)?;
    let _ = Reflect::set(
        socket.as_ref(),
        &JsValue::from_str("binaryType"),
        &JsValue::from_str("arraybuffer"),
    );

    let sender = Rc::new(WsSender {
        socket: socket.clone(),
    });

    let on_event = Rc::new(RefCell::new(on_event));
    let open_reported = Rc::new(Cell::new(false));

    {
        let on_event = on_event.clone();
        let open_reported = open_reported.clone();
        let onopen = Closure::<dyn FnMut(Event)>::new(move |_| {
            open_reported.set(true);
            on_event.borrow_mut()(WsEvent::Open);
        });
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();
    }

    {
        let on_event = on_event.clone();
        let open_reported = open_reported.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            web_sys::console::warn_1(
                &format!(
                    "WS close code={} was_clean={} reason={:?}",
                    event.code(),
                    event.was_clean(),
                    event.reason()
                )
                .into(),
            );
            open_reported.set(false);
            on_event.borrow_mut()(WsEvent::Close);
        });
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }

    {
        let on_event = on_event.clone();
        let open_reported = open_reported.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            open_reported.set(false);
            on_event.borrow_mut()(WsEvent::Error);
        });
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    {
        let on_event = on_event.clone();
        let open_reported = open_reported.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            // Some engines deliver the first message before onopen fires.
            if !open_reported.replace(true) {
                on_event.borrow_mut()(WsEvent::Open);
            }

            let message = if let Ok(buffer) = event.data().dyn_into::<js_sys::ArrayBuffer>() {
                let bytes = Uint8Array::new(&buffer).to_vec();
                match codec::decode_binary(&bytes) {
                    Ok(message) => message,
                    Err(error) => {
                        web_sys::console::error_1(&format!("WS message {error}").into());
                        return;
                    }
                }
            } else if let Some(text) = event.data().as_string() {
                match codec::decode_text(&text) {
                    Ok(message) => message,
                    Err(error) => {
                        web_sys::console::error_1(&format!("WS message {error}").into());
                        return;
                    }
                }
            } else {
                web_sys::console::error_2(
                    &"WS message data is not a string or arraybuffer".into(),
                    &event.data(),
                );
                return;
            };

            on_event.borrow_mut()(WsEvent::Message(message));
        });
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();
    }

    {
        let socket = socket.clone();
        let onbeforeunload = Closure::<dyn FnMut(Event)>::new(move |_| {
            let _ = socket.close();
        });
        window.add_event_listener_with_callback(
            "beforeunload",
            onbeforeunload.as_ref().unchecked_ref(),
        )?;
        onbeforeunload.forget();
    }

    Ok(sender)
}
