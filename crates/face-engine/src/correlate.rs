//! Entity-order correlator.
//!
//! Scans raw STEP text for `#id = ADVANCED_FACE('name', ...)` instances in
//! textual order and records where each name literal sits. Position `i` in
//! the resulting table is the assumed counterpart of `FaceId(i)`. The
//! assumption holds for single-part files; past the first instance of a
//! repeated assembly component it is unreliable, and faces beyond the end of
//! the table are simply unmapped.

use std::ops::Range;

use label_types::FaceId;
use tracing::{debug, instrument};

const KEYWORD: &[u8] = b"ADVANCED_FACE";

/// Location of one `ADVANCED_FACE` name field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSlot {
    /// The entity instance number (`#12` gives 12).
    pub entity_id: u64,
    /// Byte range of the literal in the text, quotes included. For an unset
    /// name this covers the `$`.
    pub range: Range<usize>,
    /// Decoded literal (`''` unescaped), or `None` for `$`.
    pub literal: Option<String>,
}

impl NameSlot {
    /// The existing name, or `None` when unset, empty or `NONE`.
    pub fn existing_name(&self) -> Option<&str> {
        match self.literal.as_deref() {
            None | Some("") => None,
            Some(name) if name.eq_ignore_ascii_case("NONE") => None,
            Some(name) => Some(name),
        }
    }
}

/// Correspondence of one face id to the STEP text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correspondence<'a> {
    Mapped(&'a NameSlot),
    Unmapped,
}

/// Ordered name-field locations. Built once per document, never reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrespondenceTable {
    slots: Vec<NameSlot>,
}

impl CorrespondenceTable {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[NameSlot] {
        &self.slots
    }

    pub fn lookup(&self, face: FaceId) -> Correspondence<'_> {
        match self.slots.get(face.index()) {
            Some(slot) => Correspondence::Mapped(slot),
            None => Correspondence::Unmapped,
        }
    }

    /// Existing STEP name of a face, if it is mapped and named.
    pub fn step_name(&self, face: FaceId) -> Option<&str> {
        match self.lookup(face) {
            Correspondence::Mapped(slot) => slot.existing_name(),
            Correspondence::Unmapped => None,
        }
    }

    /// Number of faces in `0..num_faces` with no textual counterpart.
    pub fn unmapped_count(&self, num_faces: usize) -> usize {
        num_faces.saturating_sub(self.slots.len())
    }
}

/// Build the correspondence table for `step_text`.
///
/// Matching is case-insensitive and tolerates whitespace and comments
/// between tokens. Content of string literals and comments never matches.
#[instrument(skip_all, fields(bytes = step_text.len()))]
pub fn correlate(step_text: &str) -> CorrespondenceTable {
    let bytes = step_text.as_bytes();
    let mut slots = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => match string_end(bytes, i) {
                Some(end) => i = end,
                None => break,
            },
            b'/' if bytes.get(i + 1) == Some(&b'*') => match comment_end(bytes, i) {
                Some(end) => i = end,
                None => break,
            },
            b'#' => match face_slot(step_text, i) {
                Some((slot, next)) => {
                    slots.push(slot);
                    i = next;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    debug!(entities = slots.len(), "ADVANCED_FACE name fields located");
    CorrespondenceTable { slots }
}

/// Try to read `#id = ADVANCED_FACE ( <name>` starting at the `#`.
/// Returns the slot and the offset just past the name.
fn face_slot(text: &str, hash: usize) -> Option<(NameSlot, usize)> {
    let bytes = text.as_bytes();
    let digits_start = hash + 1;
    let mut i = digits_start;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    let entity_id: u64 = text[digits_start..i].parse().ok()?;

    i = skip_trivia(bytes, i)?;
    if bytes.get(i) != Some(&b'=') {
        return None;
    }
    i = skip_trivia(bytes, i + 1)?;

    let keyword_end = i + KEYWORD.len();
    if keyword_end > bytes.len() || !bytes[i..keyword_end].eq_ignore_ascii_case(KEYWORD) {
        return None;
    }
    if bytes
        .get(keyword_end)
        .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return None;
    }

    i = skip_trivia(bytes, keyword_end)?;
    if bytes.get(i) != Some(&b'(') {
        return None;
    }
    i = skip_trivia(bytes, i + 1)?;

    match *bytes.get(i)? {
        b'\'' => {
            let end = string_end(bytes, i)?;
            let literal = text[i + 1..end - 1].replace("''", "'");
            Some((
                NameSlot {
                    entity_id,
                    range: i..end,
                    literal: Some(literal),
                },
                end,
            ))
        }
        b'$' => Some((
            NameSlot {
                entity_id,
                range: i..i + 1,
                literal: None,
            },
            i + 1,
        )),
        _ => None,
    }
}

/// Offset just past the closing quote of the literal opening at `start`.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// Offset just past the `*/` closing the comment opening at `start`.
fn comment_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return Some(i + 2);
        }
        i += 1;
    }
    None
}

/// Skip whitespace and comments. `None` on an unterminated comment.
fn skip_trivia(bytes: &[u8], mut i: usize) -> Option<usize> {
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) == Some(&b'/') && bytes.get(i + 1) == Some(&b'*') {
            i = comment_end(bytes, i)?;
        } else {
            return Some(i);
        }
    }
}
