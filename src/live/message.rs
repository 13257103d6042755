/// Live message categories and the envelope classifier
///
/// Inbound payloads are JSON objects carrying a `type` discriminator.
/// Only that field is ever decoded; the rest of the payload stays an
/// opaque blob that is cached and rebroadcast byte for byte.
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Payload;

// ============================================================================
// CATEGORY
// ============================================================================

/// Snapshot cache slots, one per kind of live state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    LiveStatus,
    Scene,
    State,
    Verse,
    Lyrics,
    Cover,
}

/// Order in which cached state is replayed to a joining client
pub const REPLAY_ORDER: [Category; 6] = [
    Category::LiveStatus,
    Category::Scene,
    Category::State,
    Category::Verse,
    Category::Lyrics,
    Category::Cover,
];

impl Category {
    /// Map an inbound `type` value to its slot
    pub fn from_message_type(kind: &str) -> Option<Self> {
        match kind {
            "liveStatus" => Some(Category::LiveStatus),
            "sceneUpdate" => Some(Category::Scene),
            "stateUpdate" => Some(Category::State),
            "verseUpdate" => Some(Category::Verse),
            "lyricsUpdate" => Some(Category::Lyrics),
            "coverUpdate" => Some(Category::Cover),
            _ => None,
        }
    }

    /// `type` value that populates this slot
    pub fn message_type(&self) -> &'static str {
        match self {
            Category::LiveStatus => "liveStatus",
            Category::Scene => "sceneUpdate",
            Category::State => "stateUpdate",
            Category::Verse => "verseUpdate",
            Category::Lyrics => "lyricsUpdate",
            Category::Cover => "coverUpdate",
        }
    }

    /// Slot name as exposed on the diagnostics endpoint
    pub fn slot_name(&self) -> &'static str {
        match self {
            Category::LiveStatus => "liveStatus",
            Category::Scene => "scene",
            Category::State => "state",
            Category::Verse => "verse",
            Category::Lyrics => "lyrics",
            Category::Cover => "cover",
        }
    }

    /// Position in `REPLAY_ORDER`, also the cache slot index
    pub fn index(&self) -> usize {
        match self {
            Category::LiveStatus => 0,
            Category::Scene => 1,
            Category::State => 2,
            Category::Verse => 3,
            Category::Lyrics => 4,
            Category::Cover => 5,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slot_name())
    }
}

// ============================================================================
// ENVELOPE CLASSIFIER
// ============================================================================

/// Schema-light view of an inbound payload: just the discriminator
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Find the cache slot for a payload, if any
///
/// Payloads that are not JSON objects, lack a string `type`, or carry an
/// unknown one return `None`. That is not an error: such payloads are
/// still broadcast, they just never enter the cache.
pub fn classify(payload: &[u8]) -> Option<Category> {
    // serde would happily read a struct from a JSON array
    let first = payload.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' {
        return None;
    }

    let envelope: Envelope = serde_json::from_slice(payload).ok()?;
    envelope
        .kind
        .as_deref()
        .and_then(Category::from_message_type)
}

// ============================================================================
// SYNTHETIC MESSAGES
// ============================================================================

#[derive(Serialize)]
struct ClientCountMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    count: usize,
}

/// `{"type":"clientCount","count":N}`
pub fn client_count_message(count: usize) -> Payload {
    let message = ClientCountMessage {
        kind: "clientCount",
        count,
    };
    // Serializing a static str and an integer cannot fail
    let bytes = serde_json::to_vec(&message)
        .unwrap_or_else(|_| format!(r#"{{"type":"clientCount","count":{}}}"#, count).into_bytes());
    Payload::from(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_types_map_to_slots() {
        let cases = [
            (r#"{"type":"sceneUpdate","slide":1}"#, Category::Scene),
            (r#"{"type":"liveStatus","live":true}"#, Category::LiveStatus),
            (r#"{"type":"stateUpdate"}"#, Category::State),
            (r#"{"type":"verseUpdate","ref":"Gen 1:1"}"#, Category::Verse),
            (r#"{"type":"lyricsUpdate","line":3}"#, Category::Lyrics),
            (r#"  {"cover":{"id":9},"type":"coverUpdate"}"#, Category::Cover),
        ];
        for (json, expected) in cases {
            assert_eq!(classify(json.as_bytes()), Some(expected), "{}", json);
        }
    }

    #[test]
    fn test_unrecognized_and_malformed_payloads() {
        assert_eq!(classify(br#"{"type":"x"}"#), None);
        assert_eq!(classify(br#"{"slide":1}"#), None);
        assert_eq!(classify(br#"{"type":42}"#), None);
        assert_eq!(classify(br#"["sceneUpdate"]"#), None);
        assert_eq!(classify(b"not json at all"), None);
        assert_eq!(classify(b"{\"type\":\"sceneUpdate\""), None);
        assert_eq!(classify(b""), None);
    }

    #[test]
    fn test_type_mapping_is_consistent() {
        for category in REPLAY_ORDER {
            assert_eq!(Category::from_message_type(category.message_type()), Some(category));
            assert_eq!(REPLAY_ORDER[category.index()], category);
        }
    }

    #[test]
    fn test_client_count_wire_format() {
        let payload = client_count_message(3);
        assert_eq!(&payload[..], br#"{"type":"clientCount","count":3}"#);
    }
}
