use std::time::{SystemTime, UNIX_EPOCH};

use dotnotes_shared::{clamp_coord, ClientMessage, Dot, ServerMessage};
use uuid::Uuid;

use crate::state::{Board, MAX_DOTS, MAX_TEXT_LEN};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

fn sanitize_text(text: String) -> String {
    if text.chars().count() > MAX_TEXT_LEN {
        text.chars().take(MAX_TEXT_LEN).collect()
    } else {
        text
    }
}

fn normalize_coord(value: f32) -> Option<f32> {
    value.is_finite().then(|| clamp_coord(value))
}

/// Applies one mutation to the board and returns the change events to fan
/// out; empty when the mutation is rejected or a no-op. The id and
/// timestamps on a new dot are assigned here, never trusted from the client.
pub fn apply_client_message(board: &mut Board, message: ClientMessage) -> Vec<ServerMessage> {
    match message {
        ClientMessage::Create { x, y, text } => {
            if text.trim().is_empty() {
                return Vec::new();
            }
            let (Some(x), Some(y)) = (normalize_coord(x), normalize_coord(y)) else {
                return Vec::new();
            };
            let now = now_millis();
            let dot = Dot {
                id: Uuid::new_v4().to_string(),
                x,
                y,
                text: sanitize_text(text),
                created_at: now,
                updated_at: now,
            };
            board.dots.push(dot.clone());
            let mut events = vec![ServerMessage::Inserted { dot }];
            let overflow = board.dots.len().saturating_sub(MAX_DOTS);
            if overflow > 0 {
                // Evicted dots have to leave every client too, not just
                // the board, or subscribers keep phantom dots until they
                // reconnect.
                for evicted in board.dots.drain(0..overflow) {
                    events.push(ServerMessage::Deleted { id: evicted.id });
                }
            }
            board.dirty = true;
            events
        }
        ClientMessage::Update { id, text } => {
            // Blank text is allowed here; the row stays and clients treat it
            // as a bare dot.
            let Some(dot) = board.dots.iter_mut().find(|dot| dot.id == id) else {
                return Vec::new();
            };
            dot.text = sanitize_text(text);
            dot.updated_at = now_millis();
            let dot = dot.clone();
            board.dirty = true;
            vec![ServerMessage::Updated { dot }]
        }
        ClientMessage::Delete { id } => {
            let before = board.dots.len();
            board.dots.retain(|dot| dot.id != id);
            if board.dots.len() == before {
                // Duplicate deliveries happen; a second delete is a no-op.
                return Vec::new();
            }
            board.dirty = true;
            vec![ServerMessage::Deleted { id }]
        }
    }
}

pub fn broadcast_all(board: &Board, message: &ServerMessage) {
    for sender in board.peers.values() {
        let _ = sender.send(message.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(x: f32, y: f32, text: &str) -> ClientMessage {
        ClientMessage::Create {
            x,
            y,
            text: text.into(),
        }
    }

    fn create_one(board: &mut Board, x: f32, y: f32, text: &str) -> Dot {
        let events = apply_client_message(board, create(x, y, text));
        match events.as_slice() {
            [ServerMessage::Inserted { dot }] => dot.clone(),
            other => panic!("expected a single insert event, got {other:?}"),
        }
    }

    #[test]
    fn create_assigns_id_and_timestamps() {
        let mut board = Board::default();
        let dot = create_one(&mut board, 40.0, 50.0, "hello");
        assert!(!dot.id.is_empty());
        assert_eq!(dot.created_at, dot.updated_at);
        assert!(dot.created_at > 0);
        assert_eq!(board.dots.len(), 1);
        assert!(board.dirty);
    }

    #[test]
    fn create_rejects_blank_text_and_bad_coordinates() {
        let mut board = Board::default();
        assert!(apply_client_message(&mut board, create(40.0, 50.0, "   ")).is_empty());
        assert!(apply_client_message(&mut board, create(f32::NAN, 50.0, "note")).is_empty());
        assert!(board.dots.is_empty());
        assert!(!board.dirty);
    }

    #[test]
    fn create_clamps_coordinates() {
        let mut board = Board::default();
        let dot = create_one(&mut board, 150.0, -5.0, "note");
        assert_eq!((dot.x, dot.y), (100.0, 0.0));
    }

    #[test]
    fn create_truncates_oversized_text() {
        let mut board = Board::default();
        let long = "x".repeat(MAX_TEXT_LEN + 100);
        let dot = create_one(&mut board, 40.0, 50.0, &long);
        assert_eq!(dot.text.chars().count(), MAX_TEXT_LEN);
    }

    #[test]
    fn update_rewrites_text_and_bumps_updated_at() {
        let mut board = Board::default();
        let dot = create_one(&mut board, 40.0, 50.0, "before");
        let events = apply_client_message(
            &mut board,
            ClientMessage::Update {
                id: dot.id.clone(),
                text: "after".into(),
            },
        );
        let [ServerMessage::Updated { dot: updated }] = events.as_slice() else {
            panic!("expected an update event");
        };
        assert_eq!(updated.id, dot.id);
        assert_eq!(updated.text, "after");
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(board.dots[0].text, "after");
    }

    #[test]
    fn update_of_unknown_id_is_ignored() {
        let mut board = Board::default();
        let events = apply_client_message(
            &mut board,
            ClientMessage::Update {
                id: "missing".into(),
                text: "text".into(),
            },
        );
        assert!(events.is_empty());
        assert!(!board.dirty);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut board = Board::default();
        let dot = create_one(&mut board, 40.0, 50.0, "note");
        let first = apply_client_message(&mut board, ClientMessage::Delete { id: dot.id.clone() });
        assert!(
            matches!(first.as_slice(), [ServerMessage::Deleted { id }] if *id == dot.id)
        );
        assert!(board.dots.is_empty());
        let second = apply_client_message(&mut board, ClientMessage::Delete { id: dot.id });
        assert!(second.is_empty());
    }

    #[test]
    fn overflow_eviction_notifies_subscribers() {
        let mut board = Board::default();
        for index in 0..MAX_DOTS {
            let _ = apply_client_message(&mut board, create(50.0, 50.0, &format!("note {index}")));
        }
        let first_id = board.dots[0].id.clone();
        let events = apply_client_message(&mut board, create(50.0, 50.0, "one too many"));
        assert_eq!(board.dots.len(), MAX_DOTS);
        assert!(board.dots.iter().all(|dot| dot.id != first_id));
        // The insert and the eviction both go out, so subscribers track
        // the board exactly.
        assert!(events
            .iter()
            .any(|event| matches!(event, ServerMessage::Inserted { .. })));
        assert!(events
            .iter()
            .any(|event| matches!(event, ServerMessage::Deleted { id } if *id == first_id)));
    }
}
