//! Gesture-level transitions. Every user gesture lands here, mutates the
//! interaction state in one place, and returns the effects the shell has to
//! carry out. Constraints enforced here: one open surface, one selection,
//! one playback.

use crate::collection;
use crate::geometry;
use crate::state::{DotKey, Effect, State, Surface, ToastKind};

/// Click on the canvas, in percent coordinates. A hit on an existing dot
/// wins over everything else; otherwise adding mode places a draft, and a
/// click in the open means "close the viewing popup".
pub fn canvas_click(state: &mut State, x: f32, y: f32) -> Vec<Effect> {
    if state.surface.is_editor() {
        // The editor panel is modal; the canvas underneath is inert.
        return Vec::new();
    }
    if let Some(key) = geometry::hit_test(&state.dots, x, y).cloned() {
        return dot_click(state, key);
    }
    if state.adding_mode {
        let key = collection::add_draft(state, x, y);
        state.surface = Surface::NewNote { key };
        state.adding_mode = false;
        return Vec::new();
    }
    if matches!(state.surface, Surface::Viewing { .. }) {
        state.surface = Surface::Closed;
    }
    Vec::new()
}

/// Selecting a dot. View-only mode opens the read popup; otherwise the
/// editor opens directly. Switching away from a dot that is being read
/// aloud stops the playback.
pub fn dot_click(state: &mut State, key: DotKey) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.speaking.as_ref().is_some_and(|speaking| *speaking != key) {
        state.speaking = None;
        effects.push(Effect::StopSpeech);
    }
    state.surface = if state.view_only {
        Surface::Viewing { key }
    } else if key.is_draft() {
        // A lingering draft has no store record yet; treat it as new so a
        // blank cancel still discards it.
        Surface::NewNote { key }
    } else {
        Surface::Editing { key }
    };
    effects
}

/// Explicit "edit" action on the viewing popup.
pub fn begin_edit(state: &mut State) {
    if let Surface::Viewing { key } = state.surface.clone() {
        state.surface = if key.is_draft() {
            Surface::NewNote { key }
        } else {
            Surface::Editing { key }
        };
    }
}

pub fn save_note(state: &mut State, text: &str) -> Vec<Effect> {
    match state.surface.clone() {
        Surface::NewNote { key } => collection::commit_new(state, &key, text),
        Surface::Editing { key } => {
            state.surface = Surface::Closed;
            collection::commit_edit(state, &key, text)
        }
        Surface::Viewing { .. } | Surface::Closed => Vec::new(),
    }
}

/// Cancel / close on the open surface. A brand-new dot whose note is still
/// blank is discarded; anything else just closes, dropping unsaved text.
pub fn cancel_note(state: &mut State, text: &str) -> Vec<Effect> {
    match state.surface.clone() {
        Surface::NewNote { key } if text.trim().is_empty() => collection::remove(state, &key),
        Surface::Closed => Vec::new(),
        _ => {
            state.surface = Surface::Closed;
            Vec::new()
        }
    }
}

pub fn delete_selected(state: &mut State) -> Vec<Effect> {
    let Some(key) = state.surface.key().cloned() else {
        return Vec::new();
    };
    let effects = collection::remove(state, &key);
    state.surface = Surface::Closed;
    effects
}

pub fn toggle_view_only(state: &mut State) -> Vec<Effect> {
    state.view_only = !state.view_only;
    let (title, body) = if state.view_only {
        (
            "View mode activated",
            "Click dots to view their content without editing.",
        )
    } else {
        ("Edit mode activated", "You can now edit dots by clicking on them.")
    };
    vec![Effect::Toast {
        title,
        body: body.into(),
        kind: ToastKind::Info,
    }]
}

/// The Add Dot / Cancel control. Entering adding mode also leaves view-only
/// mode, so the dot just placed opens straight into its editor.
pub fn toggle_adding(state: &mut State) -> Vec<Effect> {
    if state.adding_mode {
        state.adding_mode = false;
        return Vec::new();
    }
    state.adding_mode = true;
    state.view_only = false;
    vec![Effect::Toast {
        title: "Adding mode activated",
        body: "Click anywhere on the canvas to add a new dot.".into(),
        kind: ToastKind::Info,
    }]
}

pub fn toggle_captions(state: &mut State) {
    state.captions = !state.captions;
}

/// Read a dot's note aloud. Blank notes get a notice instead of a synthesis
/// request; an in-flight playback is stopped first so at most one is ever
/// active.
pub fn speak(state: &mut State, key: DotKey) -> Vec<Effect> {
    let Some(entry) = state.entry(&key) else {
        return Vec::new();
    };
    let text = entry.text.trim().to_string();
    if text.is_empty() {
        return vec![Effect::Toast {
            title: "Nothing to speak",
            body: "This note doesn't contain any text to speak.".into(),
            kind: ToastKind::Error,
        }];
    }
    let mut effects = Vec::new();
    if state.speaking.is_some() {
        effects.push(Effect::StopSpeech);
    }
    state.speaking = Some(key);
    effects.push(Effect::Speak(text));
    effects
}

pub fn stop_speaking(state: &mut State) -> Vec<Effect> {
    if state.speaking.take().is_some() {
        vec![Effect::StopSpeech]
    } else {
        Vec::new()
    }
}

/// Playback ran to its natural end.
pub fn speech_finished(state: &mut State) {
    state.speaking = None;
}

pub fn speech_failed(state: &mut State) -> Vec<Effect> {
    state.speaking = None;
    vec![Effect::Toast {
        title: "Speech error",
        body: "There was an error generating the speech. Please try again later.".into(),
        kind: ToastKind::Error,
    }]
}

/// Pointer moved over the canvas. Returns whether the hovered dot changed,
/// so the shell only redraws when it did.
pub fn hover_at(state: &mut State, x: f32, y: f32) -> bool {
    let hovered = geometry::hit_test(&state.dots, x, y).cloned();
    if hovered == state.hovered {
        return false;
    }
    state.hovered = hovered;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DotEntry;
    use dotnotes_shared::ClientMessage;

    fn saved(id: &str, x: f32, y: f32, text: &str) -> DotEntry {
        DotEntry {
            key: DotKey::Saved(id.into()),
            x,
            y,
            text: text.into(),
        }
    }

    fn sends(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|effect| matches!(effect, Effect::Send(_)))
            .count()
    }

    #[test]
    fn adding_mode_click_places_a_draft_and_opens_the_editor() {
        let mut state = State::new();
        state.adding_mode = true;
        let effects = canvas_click(&mut state, 40.0, 50.0);
        assert!(effects.is_empty());
        assert!(!state.adding_mode, "one dot per arming of the mode");
        assert_eq!(state.dots.len(), 1);
        assert_eq!((state.dots[0].x, state.dots[0].y), (40.0, 50.0));
        match &state.surface {
            Surface::NewNote { key } => assert!(key.is_draft()),
            other => panic!("expected new-note surface, got {other:?}"),
        }
    }

    #[test]
    fn view_only_click_opens_the_read_surface() {
        let mut state = State::new();
        state.dots.push(saved("a", 40.0, 50.0, "hello"));
        state.view_only = true;
        // distance ~1.41 < 3
        let _ = canvas_click(&mut state, 41.0, 51.0);
        assert_eq!(
            state.surface,
            Surface::Viewing {
                key: DotKey::Saved("a".into())
            }
        );
    }

    #[test]
    fn edit_mode_click_opens_the_editor_with_the_existing_note() {
        let mut state = State::new();
        state.dots.push(saved("a", 40.0, 50.0, "hello"));
        state.view_only = false;
        let _ = canvas_click(&mut state, 41.0, 51.0);
        assert_eq!(
            state.surface,
            Surface::Editing {
                key: DotKey::Saved("a".into())
            }
        );
        assert_eq!(state.entry(&DotKey::Saved("a".into())).unwrap().text, "hello");
    }

    #[test]
    fn click_off_any_dot_closes_the_viewing_popup() {
        let mut state = State::new();
        state.dots.push(saved("a", 40.0, 50.0, "hello"));
        state.surface = Surface::Viewing {
            key: DotKey::Saved("a".into()),
        };
        let _ = canvas_click(&mut state, 90.0, 90.0);
        assert_eq!(state.surface, Surface::Closed);
    }

    #[test]
    fn canvas_is_inert_while_the_editor_is_open() {
        let mut state = State::new();
        state.adding_mode = true;
        let _ = canvas_click(&mut state, 40.0, 50.0);
        let before = state.dots.len();
        state.adding_mode = true;
        let _ = canvas_click(&mut state, 10.0, 10.0);
        assert_eq!(state.dots.len(), before);
    }

    #[test]
    fn cancelling_a_blank_draft_discards_it_without_store_calls() {
        let mut state = State::new();
        state.adding_mode = true;
        let _ = canvas_click(&mut state, 40.0, 50.0);
        let effects = cancel_note(&mut state, "  ");
        assert!(state.dots.is_empty());
        assert_eq!(state.surface, Surface::Closed);
        assert_eq!(sends(&effects), 0);
    }

    #[test]
    fn cancelling_with_unsaved_text_just_closes() {
        let mut state = State::new();
        state.adding_mode = true;
        let _ = canvas_click(&mut state, 40.0, 50.0);
        let effects = cancel_note(&mut state, "draft text");
        assert_eq!(state.dots.len(), 1, "dot is kept, unsaved text is not");
        assert_eq!(state.surface, Surface::Closed);
        assert_eq!(sends(&effects), 0);
    }

    #[test]
    fn saving_an_edit_sends_an_update_and_closes() {
        let mut state = State::new();
        state.dots.push(saved("a", 40.0, 50.0, "hello"));
        state.surface = Surface::Editing {
            key: DotKey::Saved("a".into()),
        };
        let effects = save_note(&mut state, "changed");
        assert_eq!(state.surface, Surface::Closed);
        assert!(effects.iter().any(|effect| matches!(
            effect,
            Effect::Send(ClientMessage::Update { id, text }) if id == "a" && text == "changed"
        )));
    }

    #[test]
    fn viewing_surface_promotes_to_editing_on_explicit_edit() {
        let mut state = State::new();
        state.dots.push(saved("a", 40.0, 50.0, "hello"));
        state.surface = Surface::Viewing {
            key: DotKey::Saved("a".into()),
        };
        begin_edit(&mut state);
        assert_eq!(
            state.surface,
            Surface::Editing {
                key: DotKey::Saved("a".into())
            }
        );
    }

    #[test]
    fn speaking_is_single_flight() {
        let mut state = State::new();
        state.dots.push(saved("a", 10.0, 10.0, "first"));
        state.dots.push(saved("b", 90.0, 90.0, "second"));
        let first = speak(&mut state, DotKey::Saved("a".into()));
        assert!(matches!(first.as_slice(), [Effect::Speak(text)] if text == "first"));
        let second = speak(&mut state, DotKey::Saved("b".into()));
        assert!(
            matches!(second.as_slice(), [Effect::StopSpeech, Effect::Speak(text)] if text == "second"),
            "prior playback stops before the new one starts"
        );
        assert_eq!(state.speaking, Some(DotKey::Saved("b".into())));
    }

    #[test]
    fn blank_notes_are_not_synthesized() {
        let mut state = State::new();
        let key = collection::add_draft(&mut state, 10.0, 10.0);
        let effects = speak(&mut state, key);
        assert!(state.speaking.is_none());
        assert!(matches!(effects.as_slice(), [Effect::Toast { .. }]));
    }

    #[test]
    fn selecting_another_dot_stops_playback_for_the_previous_one() {
        let mut state = State::new();
        state.dots.push(saved("a", 10.0, 10.0, "first"));
        state.dots.push(saved("b", 90.0, 90.0, "second"));
        let _ = speak(&mut state, DotKey::Saved("a".into()));
        let effects = dot_click(&mut state, DotKey::Saved("b".into()));
        assert!(effects.iter().any(|effect| matches!(effect, Effect::StopSpeech)));
        assert!(state.speaking.is_none());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut state = State::new();
        assert!(stop_speaking(&mut state).is_empty());
        state.dots.push(saved("a", 10.0, 10.0, "note"));
        let _ = speak(&mut state, DotKey::Saved("a".into()));
        assert_eq!(stop_speaking(&mut state).len(), 1);
        assert!(stop_speaking(&mut state).is_empty());
    }

    #[test]
    fn entering_adding_mode_leaves_view_only() {
        let mut state = State::new();
        assert!(state.view_only);
        let _ = toggle_adding(&mut state);
        assert!(state.adding_mode);
        assert!(!state.view_only);
        let _ = toggle_adding(&mut state);
        assert!(!state.adding_mode);
    }

    #[test]
    fn hover_reports_changes_only() {
        let mut state = State::new();
        state.dots.push(saved("a", 40.0, 50.0, "hello"));
        assert!(hover_at(&mut state, 40.5, 50.0));
        assert!(!hover_at(&mut state, 40.6, 50.0));
        assert!(hover_at(&mut state, 90.0, 90.0));
        assert!(state.hovered.is_none());
    }
}
