use dotnotes_shared::{ClientMessage, Dot};

/// Pointer events within this distance of a dot (percent units) count as a
/// hit. The boundary itself is a miss.
pub const HIT_RADIUS: f32 = 3.0;

/// Identity of a dot in the local collection. Drafts exist only on this
/// client until their note is saved; saved dots carry the store id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DotKey {
    Draft(u64),
    Saved(String),
}

impl DotKey {
    pub fn is_draft(&self) -> bool {
        matches!(self, DotKey::Draft(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DotEntry {
    pub key: DotKey,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl DotEntry {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

impl From<Dot> for DotEntry {
    fn from(dot: Dot) -> Self {
        Self {
            key: DotKey::Saved(dot.id),
            x: dot.x,
            y: dot.y,
            text: dot.text,
        }
    }
}

/// The one note surface. At most one of these is open, and whichever key it
/// holds is the current selection.
#[derive(Clone, Debug, PartialEq)]
pub enum Surface {
    Closed,
    /// Editor over a freshly placed draft.
    NewNote { key: DotKey },
    /// Read-only popup over an existing dot.
    Viewing { key: DotKey },
    /// Editor over an existing dot.
    Editing { key: DotKey },
}

impl Surface {
    pub fn key(&self) -> Option<&DotKey> {
        match self {
            Surface::Closed => None,
            Surface::NewNote { key } | Surface::Viewing { key } | Surface::Editing { key } => {
                Some(key)
            }
        }
    }

    pub fn is_editor(&self) -> bool {
        matches!(self, Surface::NewNote { .. } | Surface::Editing { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToastKind {
    Info,
    Error,
}

/// Side effects a transition asks the shell to perform. Transitions mutate
/// `State` synchronously and hand anything asynchronous (wire messages,
/// playback, notices) back to the caller.
#[derive(Clone, Debug)]
pub enum Effect {
    Send(ClientMessage),
    Toast {
        title: &'static str,
        body: String,
        kind: ToastKind,
    },
    Speak(String),
    StopSpeech,
}

pub struct State {
    pub dots: Vec<DotEntry>,
    pub loading: bool,
    pub adding_mode: bool,
    pub view_only: bool,
    pub captions: bool,
    pub hovered: Option<DotKey>,
    pub surface: Surface,
    /// Dot whose note is currently being read aloud, if any.
    pub speaking: Option<DotKey>,
    next_draft: u64,
}

impl State {
    pub fn new() -> Self {
        Self {
            dots: Vec::new(),
            loading: true,
            adding_mode: false,
            // Sessions start read-first, like a visitor browsing notes.
            view_only: true,
            captions: false,
            hovered: None,
            surface: Surface::Closed,
            speaking: None,
            next_draft: 0,
        }
    }

    pub fn selected(&self) -> Option<&DotKey> {
        self.surface.key()
    }

    pub fn entry(&self, key: &DotKey) -> Option<&DotEntry> {
        self.dots.iter().find(|entry| &entry.key == key)
    }

    pub fn next_draft_key(&mut self) -> DotKey {
        let key = DotKey::Draft(self.next_draft);
        self.next_draft += 1;
        key
    }

    /// Drops every reference the interaction state holds to `key`. Called
    /// whenever a dot leaves the collection; the collection never outlives a
    /// dangling selection or hover.
    pub fn forget(&mut self, key: &DotKey) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.hovered.as_ref() == Some(key) {
            self.hovered = None;
        }
        if self.surface.key() == Some(key) {
            self.surface = Surface::Closed;
        }
        if self.speaking.as_ref() == Some(key) {
            self.speaking = None;
            effects.push(Effect::StopSpeech);
        }
        effects
    }
}
