//! Change-stream frame decoding, kept apart from the socket glue so the
//! malformed-payload paths can be exercised without a browser. Errors come
//! back as log-ready strings; the caller drops the frame and moves on.

use dotnotes_shared::ServerMessage;

const SNIPPET_CHARS: usize = 200;

pub fn decode_binary(bytes: &[u8]) -> Result<ServerMessage, String> {
    bincode::decode_from_slice::<ServerMessage, _>(bytes, bincode::config::standard())
        .map(|(message, _)| message)
        .map_err(|error| format!("bincode parse error: {error}"))
}

pub fn decode_text(text: &str) -> Result<ServerMessage, String> {
    serde_json::from_str::<ServerMessage>(text)
        .map_err(|error| format!("JSON parse error: {error} payload={:?}", snippet(text)))
}

/// Prefix of `text` capped at `SNIPPET_CHARS` characters, cut on a char
/// boundary so logging a payload can never panic mid-character.
fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_json_frames_decode() {
        let message = decode_text(r#"{"type":"dot:deleted","id":"a"}"#).unwrap();
        assert!(matches!(message, ServerMessage::Deleted { id } if id == "a"));
    }

    #[test]
    fn binary_garbage_is_an_error_not_a_panic() {
        assert!(decode_binary(&[0xff, 0x00, 0x13, 0x37]).is_err());
    }

    #[test]
    fn malformed_multibyte_payloads_are_reported_safely() {
        // A multibyte character straddling the snippet cutoff must not be
        // split; slicing at a fixed byte offset would panic here.
        let payload = format!("{}\u{e9} and more", "x".repeat(199));
        let error = decode_text(&payload).unwrap_err();
        assert!(error.contains("JSON parse error"));
        assert!(error.contains('\u{e9}'));
    }

    #[test]
    fn short_payloads_are_reported_in_full() {
        let error = decode_text("not json").unwrap_err();
        assert!(error.contains("not json"));
    }

    #[test]
    fn oversized_payloads_are_truncated() {
        let payload = "y".repeat(500);
        let error = decode_text(&payload).unwrap_err();
        assert!(error.contains("..."));
        assert!(!error.contains(&payload));
    }
}
