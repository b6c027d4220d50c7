// src/theses/record.rs

// --- Imports ---
use crate::utils::error::ParseError;
use std::fmt;
use std::io::BufRead;
use std::ops::Deref;

// --- Data Structures ---
/// One field value, kept as the exact bytes of its source line.
///
/// Input files are not required to be UTF-8 (Latin-1 lists exist), so
/// nothing is decoded. `Display` is lossy and only meant for logs.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Field(Vec<u8>);

impl Field {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Field {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Field {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Field {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<String> for Field {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl PartialEq<str> for Field {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Field {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

/// One thesis/dissertation entry. Field values are stored exactly as read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub author: Field,      // e.g., "Smith, John A."
    pub year: Field,        // Kept as text, compared as text
    pub title: Field,
    pub advisor: Field,
    pub affiliation: Field,
    pub degree: Field,      // Only "MS" and "PhD" are tallied
    pub url: Field,         // Empty means no link
}

/// The seven line slots of a record, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldSlot {
    #[default]
    Author,
    Year,
    Title,
    Advisor,
    Affiliation,
    Degree,
    Url,
}

impl FieldSlot {
    /// Slot that receives the following line (cyclic, `Url` wraps to `Author`).
    pub fn next(self) -> Self {
        match self {
            FieldSlot::Author => FieldSlot::Year,
            FieldSlot::Year => FieldSlot::Title,
            FieldSlot::Title => FieldSlot::Advisor,
            FieldSlot::Advisor => FieldSlot::Affiliation,
            FieldSlot::Affiliation => FieldSlot::Degree,
            FieldSlot::Degree => FieldSlot::Url,
            FieldSlot::Url => FieldSlot::Author,
        }
    }
}

/// Loader state: the slot awaiting the next line plus the record under construction.
#[derive(Debug, Default)]
pub struct LoaderState {
    slot: FieldSlot,
    pending: Option<Record>,
}

impl LoaderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self) -> FieldSlot {
        self.slot
    }

    /// Feeds one already-stripped line. Returns the next state and, when the
    /// `url` slot was just filled, the completed record.
    pub fn feed(self, line: &[u8]) -> (Self, Option<Record>) {
        // Blank lines between records are separators, not field content
        if self.slot == FieldSlot::Author && line.is_empty() {
            return (self, None);
        }

        let mut record = self.pending.unwrap_or_default();
        let value = Field::from(line);
        match self.slot {
            FieldSlot::Author => record.author = value,
            FieldSlot::Year => record.year = value,
            FieldSlot::Title => record.title = value,
            FieldSlot::Advisor => record.advisor = value,
            FieldSlot::Affiliation => record.affiliation = value,
            FieldSlot::Degree => record.degree = value,
            FieldSlot::Url => record.url = value,
        }

        let next = LoaderState { slot: self.slot.next(), pending: None };
        if self.slot == FieldSlot::Url {
            (next, Some(record))
        } else {
            (LoaderState { pending: Some(record), ..next }, None)
        }
    }

    /// True when a partially filled record would be dropped at end of input.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Strips any trailing `\r`/`\n` bytes.
fn strip_terminator(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

/// Reads every record from `reader` in file order.
///
/// A trailing record that never reaches its `url` line is dropped silently.
/// With `max_records` set, completing more records than the limit fails with
/// `ParseError::CapacityExceeded`.
pub fn load_records<R: BufRead>(mut reader: R, max_records: Option<usize>) -> Result<Vec<Record>, ParseError> {
    let mut records = Vec::new();
    let mut state = LoaderState::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let (next, completed) = state.feed(strip_terminator(&buf));
        state = next;

        if let Some(record) = completed {
            if let Some(limit) = max_records {
                if records.len() >= limit {
                    tracing::error!("Record limit of {} exceeded", limit);
                    return Err(ParseError::CapacityExceeded { limit });
                }
            }
            tracing::trace!("Loaded record for author '{}'", record.author);
            records.push(record);
        }
    }

    if state.has_pending() {
        tracing::warn!("Dropping incomplete trailing record (stopped before {:?})", state.slot());
    }
    tracing::debug!("Loaded {} records", records.len());
    Ok(records)
}
