//! Two-track sequence representation

use crate::error::{FilterError, Result as FilterResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A timed pitch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Onset in seconds
    pub start: f64,
    /// Release in seconds, never before `start`
    pub end: f64,
    /// MIDI note number
    pub pitch: u8,
}

impl NoteEvent {
    pub fn new(start: f64, end: f64, pitch: u8) -> Self {
        debug_assert!(end >= start, "note ends before it starts");
        Self { start, end, pitch }
    }
}

fn onset_order(a: &NoteEvent, b: &NoteEvent) -> Ordering {
    a.start.total_cmp(&b.start).then(a.pitch.cmp(&b.pitch))
}

/// Role of a track inside a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Melody,
    Chords,
}

impl TrackRole {
    pub const ALL: [TrackRole; 2] = [TrackRole::Melody, TrackRole::Chords];

    /// Position of the track in the source file
    pub fn index(&self) -> usize {
        match self {
            TrackRole::Melody => 0,
            TrackRole::Chords => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrackRole::Melody => "melody",
            TrackRole::Chords => "chords",
        }
    }
}

/// Note events of one role, kept sorted by `(start, pitch)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    events: Vec<NoteEvent>,
}

impl Track {
    /// Build a track, sorting the events into onset order
    pub fn new(mut events: Vec<NoteEvent>) -> Self {
        events.sort_by(onset_order);
        Self { events }
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// End time of the last event in onset order.
    ///
    /// This is the track's duration for alignment and ratio purposes.
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(|e| e.end)
    }

    pub fn pitches(&self) -> impl Iterator<Item = u8> + '_ {
        self.events.iter().map(|e| e.pitch)
    }
}

impl FromIterator<NoteEvent> for Track {
    fn from_iter<I: IntoIterator<Item = NoteEvent>>(iter: I) -> Self {
        Track::new(iter.into_iter().collect())
    }
}

/// One corpus item: a melody and its accompanying chords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Source file name, reused for the output file
    pub name: String,
    pub melody: Track,
    pub chords: Track,
}

impl Sequence {
    pub fn new(name: impl Into<String>, melody: Track, chords: Track) -> Self {
        Self {
            name: name.into(),
            melody,
            chords,
        }
    }

    /// Build a sequence from decoded tracks in file order.
    ///
    /// Track 0 is the melody and track 1 the chords; any other count is
    /// rejected before alignment.
    pub fn from_tracks(name: impl Into<String>, tracks: Vec<Track>) -> FilterResult<Self> {
        if tracks.len() != 2 {
            return Err(FilterError::WrongTrackCount(tracks.len()));
        }
        let mut tracks = tracks.into_iter();
        match (tracks.next(), tracks.next()) {
            (Some(melody), Some(chords)) => Ok(Self::new(name, melody, chords)),
            _ => Err(FilterError::WrongTrackCount(0)),
        }
    }

    pub fn track(&self, role: TrackRole) -> &Track {
        match role {
            TrackRole::Melody => &self.melody,
            TrackRole::Chords => &self.chords,
        }
    }

    pub fn track_mut(&mut self, role: TrackRole) -> &mut Track {
        match role {
            TrackRole::Melody => &mut self.melody,
            TrackRole::Chords => &mut self.chords,
        }
    }

    /// Song duration: the melody's end time (0 for an empty melody)
    pub fn duration(&self) -> f64 {
        self.melody.end_time().unwrap_or(0.0)
    }
}
