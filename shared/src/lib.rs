use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Dot coordinates are percentages of the canvas, so the same record renders
/// at the same relative spot on every client regardless of viewport size.
pub const MAX_COORD: f32 = 100.0;

pub fn clamp_coord(value: f32) -> f32 {
    value.max(0.0).min(MAX_COORD)
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct Dot {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub text: String,
    /// Unix milliseconds, assigned by the store.
    pub created_at: u64,
    pub updated_at: u64,
}

impl Dot {
    /// A dot with blank text is an abandoned note, not a finished annotation.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "dot:create")]
    Create { x: f32, y: f32, text: String },
    #[serde(rename = "dot:update")]
    Update { id: String, text: String },
    #[serde(rename = "dot:delete")]
    Delete { id: String },
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full table snapshot, ordered by `created_at` ascending. Sent once per
    /// subscription; everything after arrives as individual change events.
    #[serde(rename = "sync")]
    Sync { dots: Vec<Dot> },
    #[serde(rename = "dot:inserted")]
    Inserted { dot: Dot },
    #[serde(rename = "dot:updated")]
    Updated { dot: Dot },
    #[serde(rename = "dot:deleted")]
    Deleted { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(text: &str) -> Dot {
        Dot {
            id: "a".into(),
            x: 40.0,
            y: 50.0,
            text: text.into(),
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn blank_text_is_not_a_note() {
        assert!(!dot("").has_text());
        assert!(!dot("  \n\t ").has_text());
        assert!(dot("hello").has_text());
    }

    #[test]
    fn coords_clamp_into_percent_range() {
        assert_eq!(clamp_coord(-3.0), 0.0);
        assert_eq!(clamp_coord(140.0), 100.0);
        assert_eq!(clamp_coord(40.0), 40.0);
    }

    #[test]
    fn change_events_use_tagged_json() {
        let json = serde_json::to_string(&ServerMessage::Deleted { id: "a".into() }).unwrap();
        assert!(json.contains("\"type\":\"dot:deleted\""));
    }
}
