//! Track alignment: trim the longer track to the shorter one's end time

use crate::error::{FilterError, Result as FilterResult};
use crate::sequence::{NoteEvent, Sequence, Track, TrackRole};
use serde::Serialize;

/// What alignment did to a sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    /// Common end time after trimming
    pub cutoff: f64,
    /// Track that was trimmed (melody on ties)
    pub trimmed: TrackRole,
    /// Events dropped because they start at or after the cutoff
    pub removed: usize,
    /// Events whose release was pulled back to the cutoff
    pub truncated: usize,
}

impl Alignment {
    /// True when the sequence was already aligned
    pub fn is_noop(&self) -> bool {
        self.removed == 0 && self.truncated == 0
    }
}

/// Trim `sequence` so both tracks end at the earlier of their end times.
///
/// Only the track ending later is touched. Fails with `EmptyTrack` when a
/// track has no events to begin with, or when trimming leaves the longer
/// track with none.
pub fn align(sequence: &mut Sequence) -> FilterResult<Alignment> {
    let melody_end = end_time(&sequence.melody, TrackRole::Melody)?;
    let chords_end = end_time(&sequence.chords, TrackRole::Chords)?;

    let cutoff = melody_end.min(chords_end);
    let trimmed = if melody_end >= chords_end {
        TrackRole::Melody
    } else {
        TrackRole::Chords
    };

    let track = sequence.track_mut(trimmed);
    let (kept, removed, truncated) = trim_events(track.events(), cutoff);
    if kept.is_empty() {
        return Err(FilterError::EmptyTrack(trimmed.name().to_string()));
    }
    // Trimming only shortens releases, so the onset order is unchanged.
    *track = Track::new(kept);

    Ok(Alignment {
        cutoff,
        trimmed,
        removed,
        truncated,
    })
}

fn end_time(track: &Track, role: TrackRole) -> FilterResult<f64> {
    track
        .end_time()
        .ok_or_else(|| FilterError::EmptyTrack(role.name().to_string()))
}

/// Build the trimmed event list, returning it with removal and truncation counts
fn trim_events(events: &[NoteEvent], cutoff: f64) -> (Vec<NoteEvent>, usize, usize) {
    let mut removed = 0;
    let mut truncated = 0;
    let kept = events
        .iter()
        .filter_map(|event| {
            if event.start >= cutoff {
                removed += 1;
                None
            } else if event.end > cutoff {
                truncated += 1;
                Some(NoteEvent {
                    end: cutoff,
                    ..*event
                })
            } else {
                Some(*event)
            }
        })
        .collect();
    (kept, removed, truncated)
}
