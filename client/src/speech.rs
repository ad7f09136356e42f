//! Speech player: wraps the external synthesis API behind a single-flight
//! playback. The state machine decides *whether* to speak; this module only
//! fetches audio and plays it, reporting back through one outcome callback
//! so the speaking flag and the active-dot reference always move together.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, Headers, HtmlAudioElement, RequestInit, Response, Url, Window};

const SYNTH_BASE_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const MODEL_ID: &str = "eleven_monolingual_v1";

/// Credential injected by the page at deploy time.
const API_KEY_GLOBAL: &str = "__dotnotes_tts_key";

#[derive(Clone, Copy, Debug)]
pub enum SpeechOutcome {
    /// Playback reached its natural end.
    Ended,
    /// Synthesis or playback failed; no retry is attempted.
    Failed,
}

pub type OutcomeHandler = Rc<dyn Fn(SpeechOutcome)>;

#[derive(Default)]
pub struct Player {
    audio: Option<HtmlAudioElement>,
    object_url: Option<String>,
    onended: Option<Closure<dyn FnMut()>>,
    /// Bumped by every start and stop; stale fetch callbacks compare against
    /// it and bail instead of resurrecting a cancelled playback.
    generation: u32,
}

impl Player {
    pub fn stop(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(audio) = self.audio.take() {
            audio.set_onended(None);
            let _ = audio.pause();
        }
        if let Some(url) = self.object_url.take() {
            let _ = Url::revoke_object_url(&url);
        }
        self.onended = None;
    }

    fn release_media(&mut self) {
        self.audio = None;
        if let Some(url) = self.object_url.take() {
            let _ = Url::revoke_object_url(&url);
        }
    }
}

pub fn api_key(window: &Window) -> Option<String> {
    Reflect::get(window.as_ref(), &JsValue::from_str(API_KEY_GLOBAL))
        .ok()?
        .as_string()
        .filter(|key| !key.is_empty())
}

/// Requests synthesis for `text` and plays the result. Any playback already
/// in flight is stopped first.
pub fn start(
    window: &Window,
    player: &Rc<RefCell<Player>>,
    text: &str,
    api_key: &str,
    on_outcome: OutcomeHandler,
) {
    let generation = {
        let mut player = player.borrow_mut();
        player.stop();
        player.generation
    };

    let body = serde_json::json!({
        "text": text,
        "model_id": MODEL_ID,
        "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 },
    })
    .to_string();

    let Ok(headers) = Headers::new() else {
        on_outcome(SpeechOutcome::Failed);
        return;
    };
    let _ = headers.set("Content-Type", "application/json");
    let _ = headers.set("xi-api-key", api_key);

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(headers.as_ref());
    init.set_body(&JsValue::from_str(&body));

    let url = format!("{SYNTH_BASE_URL}/{VOICE_ID}");
    let promise = window.fetch_with_str_and_init(&url, &init);

    let on_ok = Closure::once_into_js({
        let player = player.clone();
        let on_outcome = on_outcome.clone();
        move |value: JsValue| {
            let Ok(response) = value.dyn_into::<Response>() else {
                on_outcome(SpeechOutcome::Failed);
                return;
            };
            if !response.ok() {
                web_sys::console::error_1(
                    &format!("Speech synthesis failed status={}", response.status()).into(),
                );
                report_if_current(&player, generation, &on_outcome, SpeechOutcome::Failed);
                return;
            }
            let Ok(blob_promise) = response.blob() else {
                report_if_current(&player, generation, &on_outcome, SpeechOutcome::Failed);
                return;
            };

            let on_blob = Closure::once_into_js({
                let player = player.clone();
                let on_outcome = on_outcome.clone();
                move |value: JsValue| {
                    play_blob(&player, generation, value, &on_outcome);
                }
            });
            let on_blob_err = Closure::once_into_js({
                let player = player.clone();
                let on_outcome = on_outcome.clone();
                move |_: JsValue| {
                    report_if_current(&player, generation, &on_outcome, SpeechOutcome::Failed);
                }
            });
            let _ = blob_promise.then2(on_blob.unchecked_ref(), on_blob_err.unchecked_ref());
        }
    });
    let on_err = Closure::once_into_js({
        let player = player.clone();
        let on_outcome = on_outcome.clone();
        move |error: JsValue| {
            web_sys::console::error_2(&"Speech synthesis request error".into(), &error);
            report_if_current(&player, generation, &on_outcome, SpeechOutcome::Failed);
        }
    });
    let _ = promise.then2(on_ok.unchecked_ref(), on_err.unchecked_ref());
}

fn report_if_current(
    player: &Rc<RefCell<Player>>,
    generation: u32,
    on_outcome: &OutcomeHandler,
    outcome: SpeechOutcome,
) {
    if player.borrow().generation != generation {
        // A newer start or an explicit stop superseded this playback.
        return;
    }
    on_outcome(outcome);
}

fn play_blob(
    player: &Rc<RefCell<Player>>,
    generation: u32,
    value: JsValue,
    on_outcome: &OutcomeHandler,
) {
    let Ok(blob) = value.dyn_into::<Blob>() else {
        report_if_current(player, generation, on_outcome, SpeechOutcome::Failed);
        return;
    };
    if player.borrow().generation != generation {
        return;
    }
    let Ok(url) = Url::create_object_url_with_blob(&blob) else {
        report_if_current(player, generation, on_outcome, SpeechOutcome::Failed);
        return;
    };
    let Ok(audio) = HtmlAudioElement::new_with_src(&url) else {
        let _ = Url::revoke_object_url(&url);
        report_if_current(player, generation, on_outcome, SpeechOutcome::Failed);
        return;
    };

    let onended = Closure::<dyn FnMut()>::new({
        let player = player.clone();
        let on_outcome = on_outcome.clone();
        move || {
            {
                let mut player = player.borrow_mut();
                if player.generation != generation {
                    return;
                }
                player.release_media();
            }
            on_outcome(SpeechOutcome::Ended);
        }
    });
    audio.set_onended(Some(onended.as_ref().unchecked_ref()));

    {
        let mut guard = player.borrow_mut();
        guard.audio = Some(audio.clone());
        guard.object_url = Some(url);
        guard.onended = Some(onended);
    }

    match audio.play() {
        Ok(play_promise) => {
            let on_play_err = Closure::once_into_js({
                let player = player.clone();
                let on_outcome = on_outcome.clone();
                move |error: JsValue| {
                    web_sys::console::error_2(&"Audio playback error".into(), &error);
                    {
                        let mut guard = player.borrow_mut();
                        if guard.generation != generation {
                            return;
                        }
                        guard.release_media();
                    }
                    on_outcome(SpeechOutcome::Failed);
                }
            });
            let _ = play_promise.catch(on_play_err.unchecked_ref());
        }
        Err(error) => {
            web_sys::console::error_2(&"Audio playback error".into(), &error);
            player.borrow_mut().release_media();
            on_outcome(SpeechOutcome::Failed);
        }
    }
}
