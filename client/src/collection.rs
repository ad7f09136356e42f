//! Reconciles the local dot collection against three sources: the initial
//! sync, this client's own edits, and the store's change stream. Remote
//! events are the only writer of confirmed state; local mutations either
//! stay draft-only or go out on the wire and come back as an echo.

use dotnotes_shared::{ClientMessage, Dot};

use crate::state::{DotEntry, DotKey, Effect, State, ToastKind};

/// Initial bulk load. The store returns records ordered by creation time;
/// rows whose note was never written (blank text) are dropped here so they
/// never surface.
pub fn adopt(state: &mut State, dots: Vec<Dot>) {
    state.dots = dots
        .into_iter()
        .filter(Dot::has_text)
        .map(DotEntry::from)
        .collect();
    state.loading = false;
}

/// A record inserted by some client (possibly this one). Skips blank rows
/// and duplicate delivery of the same id.
pub fn insert_remote(state: &mut State, dot: Dot) {
    if !dot.has_text() {
        return;
    }
    let key = DotKey::Saved(dot.id.clone());
    if state.entry(&key).is_some() {
        return;
    }
    state.dots.push(DotEntry::from(dot));
}

/// A record updated somewhere. An update that blanks the note is equivalent
/// to deleting the dot. Unknown ids are ignored.
pub fn update_remote(state: &mut State, dot: Dot) -> Vec<Effect> {
    let key = DotKey::Saved(dot.id.clone());
    if !dot.has_text() {
        return delete_remote(state, &dot.id);
    }
    if let Some(entry) = state.dots.iter_mut().find(|entry| entry.key == key) {
        *entry = DotEntry::from(dot);
    }
    Vec::new()
}

pub fn delete_remote(state: &mut State, id: &str) -> Vec<Effect> {
    let key = DotKey::Saved(id.to_string());
    let Some(index) = state.dots.iter().position(|entry| entry.key == key) else {
        return Vec::new();
    };
    state.dots.remove(index);
    state.forget(&key)
}

/// Places an unconfirmed dot locally. Nothing goes on the wire until its
/// note is saved.
pub fn add_draft(state: &mut State, x: f32, y: f32) -> DotKey {
    let key = state.next_draft_key();
    state.dots.push(DotEntry {
        key: key.clone(),
        x,
        y,
        text: String::new(),
    });
    key
}

/// Saves the note on a draft. Blank text discards the draft without any
/// store call; otherwise the draft is dropped locally and the create goes
/// out, with the insert echo supplying the confirmed replacement.
pub fn commit_new(state: &mut State, key: &DotKey, text: &str) -> Vec<Effect> {
    let text = text.trim();
    let Some(index) = state.dots.iter().position(|entry| &entry.key == key) else {
        return Vec::new();
    };
    if text.is_empty() {
        state.dots.remove(index);
        let mut effects = state.forget(key);
        effects.push(Effect::Toast {
            title: "Dot discarded",
            body: "The new dot was discarded.".into(),
            kind: ToastKind::Info,
        });
        return effects;
    }
    let entry = state.dots.remove(index);
    let mut effects = state.forget(key);
    effects.push(Effect::Send(ClientMessage::Create {
        x: entry.x,
        y: entry.y,
        text: text.to_string(),
    }));
    effects.push(Effect::Toast {
        title: "Note saved",
        body: "Your note has been saved to this dot.".into(),
        kind: ToastKind::Info,
    });
    effects
}

/// Saves the note on an existing dot. The collection is not touched here;
/// the update echo is the sole writer, so the optimistic and confirmed
/// views cannot diverge. Blank text asks the store to retire the dot.
pub fn commit_edit(state: &mut State, key: &DotKey, text: &str) -> Vec<Effect> {
    let DotKey::Saved(id) = key else {
        // Drafts have no store record to update.
        return commit_new(state, key, text);
    };
    if state.entry(key).is_none() {
        return Vec::new();
    }
    let text = text.trim();
    vec![
        Effect::Send(ClientMessage::Update {
            id: id.clone(),
            text: text.to_string(),
        }),
        Effect::Toast {
            title: if text.is_empty() { "Note removed" } else { "Note saved" },
            body: if text.is_empty() {
                "This dot has been removed.".into()
            } else {
                "Your note has been saved to this dot.".into()
            },
            kind: ToastKind::Info,
        },
    ]
}

/// Removes a dot: drafts locally, saved dots via the store (the delete echo
/// performs the local removal).
pub fn remove(state: &mut State, key: &DotKey) -> Vec<Effect> {
    match key {
        DotKey::Draft(_) => {
            if let Some(index) = state.dots.iter().position(|entry| &entry.key == key) {
                state.dots.remove(index);
            }
            let mut effects = state.forget(key);
            effects.push(Effect::Toast {
                title: "Dot discarded",
                body: "The new dot was discarded.".into(),
                kind: ToastKind::Info,
            });
            effects
        }
        DotKey::Saved(id) => vec![
            Effect::Send(ClientMessage::Delete { id: id.clone() }),
            Effect::Toast {
                title: "Dot deleted",
                body: "The dot and its note have been removed.".into(),
                kind: ToastKind::Info,
            },
        ],
    }
}
